//! Anthropic Messages API adapter.

use super::{ChatMessage, Completion, TokenUsage, malformed};
use crate::catalog::ProviderFamily;
use crate::error::Result;
use serde::{Deserialize, Serialize};

pub const DEFAULT_BASE_URL: &str = "https://api.anthropic.com";
pub const API_VERSION: &str = "2023-06-01";

const WEB_SEARCH_TOOL: &str = "web_search_20250305";
const WEB_SEARCH_MAX_USES: u32 = 5;
const MODEL_PAGE_LIMIT: u32 = 1000;

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct MessagesRequest {
    pub model: String,
    pub max_tokens: u32,
    pub temperature: f32,
    pub messages: Vec<Message>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tools: Option<Vec<WebSearchTool>>,
}

#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub role: &'static str,
    pub content: String,
}

#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct WebSearchTool {
    #[serde(rename = "type")]
    pub tool_type: &'static str,
    pub name: &'static str,
    pub max_uses: u32,
}

impl WebSearchTool {
    fn standard() -> Self {
        Self {
            tool_type: WEB_SEARCH_TOOL,
            name: "web_search",
            max_uses: WEB_SEARCH_MAX_USES,
        }
    }
}

pub fn build_request(
    model_id: &str,
    max_tokens: u32,
    temperature: f32,
    messages: &[ChatMessage],
    grounding: bool,
) -> MessagesRequest {
    MessagesRequest {
        model: model_id.to_string(),
        max_tokens,
        temperature,
        messages: messages
            .iter()
            .map(|m| Message {
                role: m.role.as_str(),
                content: m.content.clone(),
            })
            .collect(),
        tools: grounding.then(|| vec![WebSearchTool::standard()]),
    }
}

pub(crate) fn messages_url(base: &str) -> String {
    format!("{base}/v1/messages")
}

pub(crate) fn models_url(base: &str) -> String {
    format!("{base}/v1/models?limit={MODEL_PAGE_LIMIT}")
}

pub(crate) fn authorize(builder: reqwest::RequestBuilder, key: &str) -> reqwest::RequestBuilder {
    builder
        .header("x-api-key", key)
        .header("anthropic-version", API_VERSION)
}

// ── Response ──

#[derive(Deserialize, Debug)]
struct MessagesResponse {
    #[serde(default)]
    content: Vec<ContentBlock>,
    usage: Option<Usage>,
}

/// Text blocks carry the answer. Tool-use and search-result blocks
/// produced by grounding are skipped.
#[derive(Deserialize, Debug)]
#[serde(tag = "type")]
enum ContentBlock {
    #[serde(rename = "text")]
    Text { text: String },
    #[serde(other)]
    Other,
}

#[derive(Deserialize, Debug)]
struct Usage {
    #[serde(default)]
    input_tokens: u32,
    #[serde(default)]
    output_tokens: u32,
}

pub fn parse_response(body: &str) -> Result<Completion> {
    let resp: MessagesResponse =
        serde_json::from_str(body).map_err(|e| malformed(ProviderFamily::Anthropic, e))?;
    Ok(Completion {
        segments: resp
            .content
            .into_iter()
            .filter_map(|block| match block {
                ContentBlock::Text { text } => Some(text),
                ContentBlock::Other => None,
            })
            .collect(),
        usage: resp.usage.map(|u| TokenUsage {
            prompt_tokens: u.input_tokens,
            completion_tokens: u.output_tokens,
        }),
    })
}

#[derive(Deserialize)]
struct ModelList {
    data: Vec<ModelEntry>,
}

#[derive(Deserialize)]
struct ModelEntry {
    id: String,
}

pub fn parse_model_list(body: &str) -> Result<Vec<String>> {
    let list: ModelList =
        serde_json::from_str(body).map_err(|e| malformed(ProviderFamily::Anthropic, e))?;
    Ok(list.data.into_iter().map(|m| m.id).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn request_shape_without_grounding() {
        let req = build_request(
            "claude-3-haiku-20240307",
            256,
            0.5,
            &[ChatMessage::user("hi")],
            false,
        );
        assert_eq!(
            serde_json::to_value(&req).unwrap(),
            json!({
                "model": "claude-3-haiku-20240307",
                "max_tokens": 256,
                "temperature": 0.5,
                "messages": [{"role": "user", "content": "hi"}],
            })
        );
    }

    #[test]
    fn grounding_adds_web_search_tool() {
        let req = build_request("claude-sonnet-4-5", 64, 1.0, &[ChatMessage::user("hi")], true);
        let value = serde_json::to_value(&req).unwrap();
        assert_eq!(
            value["tools"],
            json!([{"type": "web_search_20250305", "name": "web_search", "max_uses": 5}])
        );
    }

    #[test]
    fn concatenates_text_blocks_and_skips_others() {
        let body = json!({
            "id": "msg_1",
            "type": "message",
            "content": [
                {"type": "text", "text": "I will "},
                {"type": "server_tool_use", "id": "t1", "name": "web_search", "input": {"query": "ipd"}},
                {"type": "web_search_tool_result", "tool_use_id": "t1", "content": []},
                {"type": "text", "text": "C", "citations": null}
            ],
            "usage": {"input_tokens": 12, "output_tokens": 3}
        })
        .to_string();
        let completion = parse_response(&body).unwrap();
        assert_eq!(completion.text(), "I will C");
        assert_eq!(
            completion.usage,
            Some(TokenUsage {
                prompt_tokens: 12,
                completion_tokens: 3
            })
        );
    }

    #[test]
    fn empty_content_yields_empty_text() {
        let completion = parse_response(r#"{"content": []}"#).unwrap();
        assert_eq!(completion.text(), "");
    }

    #[test]
    fn parses_model_listing() {
        let body = r#"{"data": [{"id": "claude-a", "type": "model"}, {"id": "claude-b", "type": "model"}], "has_more": false}"#;
        assert_eq!(parse_model_list(body).unwrap(), vec!["claude-a", "claude-b"]);
    }
}
