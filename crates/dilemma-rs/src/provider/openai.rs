//! OpenAI Responses API adapter.
//!
//! Input messages use typed content parts: `input_text` for user turns and
//! `output_text` for prior assistant turns. The reply's `output` array mixes
//! message items with tool-call items; only message text is kept.

use super::{ChatMessage, ChatRole, Completion, TokenUsage, malformed};
use crate::catalog::ProviderFamily;
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com";

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct ResponsesRequest {
    pub model: String,
    pub max_output_tokens: u32,
    pub temperature: f32,
    pub input: Vec<InputMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tools: Option<Vec<Tool>>,
}

#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct InputMessage {
    pub role: &'static str,
    pub content: Vec<InputContent>,
}

#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum InputContent {
    InputText { text: String },
    OutputText { text: String },
}

#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct Tool {
    #[serde(rename = "type")]
    pub tool_type: &'static str,
}

pub fn build_request(
    model_id: &str,
    max_output_tokens: u32,
    temperature: f32,
    messages: &[ChatMessage],
    grounding: bool,
) -> ResponsesRequest {
    ResponsesRequest {
        model: model_id.to_string(),
        max_output_tokens,
        temperature,
        input: messages
            .iter()
            .map(|m| {
                let text = m.content.clone();
                InputMessage {
                    role: m.role.as_str(),
                    content: vec![match m.role {
                        ChatRole::User => InputContent::InputText { text },
                        ChatRole::Assistant => InputContent::OutputText { text },
                    }],
                }
            })
            .collect(),
        tools: grounding.then(|| {
            vec![Tool {
                tool_type: "web_search",
            }]
        }),
    }
}

pub(crate) fn responses_url(base: &str) -> String {
    format!("{base}/v1/responses")
}

pub(crate) fn models_url(base: &str) -> String {
    format!("{base}/v1/models")
}

pub(crate) fn authorize(builder: reqwest::RequestBuilder, key: &str) -> reqwest::RequestBuilder {
    builder.bearer_auth(key)
}

// ── Response ──

#[derive(Deserialize, Debug)]
struct ResponsesResponse {
    #[serde(default)]
    output: Vec<OutputItem>,
    usage: Option<Usage>,
    error: Option<ResponseError>,
}

#[derive(Deserialize, Debug)]
#[serde(tag = "type")]
enum OutputItem {
    #[serde(rename = "message")]
    Message {
        #[serde(default)]
        content: Vec<OutputContent>,
    },
    #[serde(other)]
    Other,
}

#[derive(Deserialize, Debug)]
#[serde(tag = "type")]
enum OutputContent {
    #[serde(rename = "output_text")]
    OutputText { text: String },
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

#[derive(Deserialize, Debug)]
struct ResponseError {
    message: String,
}

pub fn parse_response(body: &str) -> Result<Completion> {
    let resp: ResponsesResponse =
        serde_json::from_str(body).map_err(|e| malformed(ProviderFamily::OpenAi, e))?;

    // A 2xx body can still carry a failed response object.
    if let Some(err) = resp.error {
        return Err(Error::provider(ProviderFamily::OpenAi, None, err.message));
    }

    let segments = resp
        .output
        .into_iter()
        .flat_map(|item| match item {
            OutputItem::Message { content } => content,
            OutputItem::Other => Vec::new(),
        })
        .filter_map(|part| match part {
            OutputContent::OutputText { text } => Some(text),
            OutputContent::Other => None,
        })
        .collect();

    Ok(Completion {
        segments,
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
        serde_json::from_str(body).map_err(|e| malformed(ProviderFamily::OpenAi, e))?;
    Ok(list.data.into_iter().map(|m| m.id).collect())
}
