//! Google Gemini `generateContent` adapter.

use super::{ChatMessage, ChatRole, Completion, TokenUsage, malformed};
use crate::catalog::ProviderFamily;
use crate::error::Result;
use serde::{Deserialize, Serialize};

pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";

const MODEL_PREFIX: &str = "models/";
const MODEL_PAGE_SIZE: u32 = 1000;

#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentRequest {
    pub contents: Vec<Content>,
    pub generation_config: GenerationConfig,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tools: Option<Vec<Tool>>,
}

#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct Content {
    pub role: &'static str,
    pub parts: Vec<Part>,
}

#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct Part {
    pub text: String,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GenerationConfig {
    pub max_output_tokens: u32,
    pub temperature: f32,
}

#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct Tool {
    pub google_search: GoogleSearch,
}

#[derive(Serialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct GoogleSearch {}

/// Build the payload. The model id travels in the URL, not the body.
pub fn build_request(
    max_output_tokens: u32,
    temperature: f32,
    messages: &[ChatMessage],
    grounding: bool,
) -> GenerateContentRequest {
    GenerateContentRequest {
        contents: messages
            .iter()
            .map(|m| Content {
                role: match m.role {
                    ChatRole::User => "user",
                    ChatRole::Assistant => "model",
                },
                parts: vec![Part {
                    text: m.content.clone(),
                }],
            })
            .collect(),
        generation_config: GenerationConfig {
            max_output_tokens,
            temperature,
        },
        tools: grounding.then(|| {
            vec![Tool {
                google_search: GoogleSearch::default(),
            }]
        }),
    }
}

pub(crate) fn generate_url(base: &str, model_id: &str) -> String {
    let id = model_id.strip_prefix(MODEL_PREFIX).unwrap_or(model_id);
    format!("{base}/v1beta/models/{id}:generateContent")
}

pub(crate) fn models_url(base: &str) -> String {
    format!("{base}/v1beta/models?pageSize={MODEL_PAGE_SIZE}")
}

pub(crate) fn authorize(builder: reqwest::RequestBuilder, key: &str) -> reqwest::RequestBuilder {
    builder.header("x-goog-api-key", key)
}

// ── Response ──

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    usage_metadata: Option<UsageMetadata>,
}

#[derive(Deserialize, Debug)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Deserialize, Debug)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

/// Parts without a `text` field (function calls, inline data) are skipped.
#[derive(Deserialize, Debug)]
struct ResponsePart {
    text: Option<String>,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
struct UsageMetadata {
    #[serde(default)]
    prompt_token_count: u32,
    #[serde(default)]
    candidates_token_count: u32,
}

/// Text of the first candidate's parts; later candidates are ignored.
pub fn parse_response(body: &str) -> Result<Completion> {
    let resp: GenerateContentResponse =
        serde_json::from_str(body).map_err(|e| malformed(ProviderFamily::Gemini, e))?;

    let segments = resp
        .candidates
        .into_iter()
        .next()
        .and_then(|c| c.content)
        .map(|content| {
            content
                .parts
                .into_iter()
                .filter_map(|part| part.text)
                .collect()
        })
        .unwrap_or_default();

    Ok(Completion {
        segments,
        usage: resp.usage_metadata.map(|u| TokenUsage {
            prompt_tokens: u.prompt_token_count,
            completion_tokens: u.candidates_token_count,
        }),
    })
}

#[derive(Deserialize)]
struct ModelList {
    #[serde(default)]
    models: Vec<ModelEntry>,
}

#[derive(Deserialize)]
struct ModelEntry {
    name: String,
}

/// Listing names come back as `models/<id>`; the prefix is stripped.
pub fn parse_model_list(body: &str) -> Result<Vec<String>> {
    let list: ModelList =
        serde_json::from_str(body).map_err(|e| malformed(ProviderFamily::Gemini, e))?;
    Ok(list
        .models
        .into_iter()
        .map(|m| match m.name.strip_prefix(MODEL_PREFIX) {
            Some(id) => id.to_string(),
            None => m.name,
        })
        .collect())
}
