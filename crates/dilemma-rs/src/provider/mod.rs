//! Model routing and vendor adapters.
//!
//! [`ProviderGateway`] is the single entry point for completions. It resolves
//! a model id to its [`ProviderFamily`] through the [`ModelCatalog`], hands
//! the normalised arguments to that family's adapter, issues exactly one HTTP
//! request, and returns the concatenated text of the reply.
//!
//! - [`anthropic`]: Messages API.
//! - [`openai`]: Responses API.
//! - [`gemini`]: `generateContent`.
//! - [`usage`]: token usage and cost accounting across calls.
//!
//! Each adapter deserialises its vendor's reply into a small tagged type and
//! converts it to a [`Completion`] at the adapter boundary, so nothing above
//! this module branches on vendor response shapes.

pub mod anthropic;
pub mod gemini;
pub mod openai;
pub mod usage;

use crate::catalog::{ModelCatalog, ProviderFamily};
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Mutex;
use std::time::{Duration, Instant};
use tracing::{debug, trace};

pub use usage::{FamilyUsage, ModelPricing, UsageTracker, pricing_for_model};

/// Default per-request timeout for the shared HTTP client.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(120);

const USER_AGENT: &str = concat!("dilemma-rs/", env!("CARGO_PKG_VERSION"));

// ── Messages ───────────────────────────────────────────────────────

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Assistant,
}

impl ChatRole {
    pub fn as_str(self) -> &'static str {
        match self {
            ChatRole::User => "user",
            ChatRole::Assistant => "assistant",
        }
    }
}

/// One vendor-neutral conversation turn.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::Assistant,
            content: content.into(),
        }
    }
}

/// Normalised arguments for one completion call.
#[derive(Clone, Debug, PartialEq)]
pub struct PromptRequest {
    pub model_id: String,
    pub max_output_tokens: u32,
    pub temperature: f32,
    pub messages: Vec<ChatMessage>,
    pub enable_grounding: bool,
}

/// Normalised adapter output: text segments in response order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Completion {
    pub segments: Vec<String>,
    pub usage: Option<TokenUsage>,
}

impl Completion {
    /// All segments joined with no separator. Empty when the reply had no text.
    pub fn text(&self) -> String {
        self.segments.concat()
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TokenUsage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
}

// ── Runner seam ────────────────────────────────────────────────────

/// Boxed future returned by [`PromptRunner::run_prompt`].
pub type PromptFuture<'a> = Pin<Box<dyn Future<Output = Result<String>> + Send + 'a>>;

/// Anything that can turn a [`PromptRequest`] into reply text.
///
/// [`ProviderGateway`] is the production implementation. Agents hold an
/// `Arc<dyn PromptRunner>` so tests can substitute scripted replies.
pub trait PromptRunner: Send + Sync {
    fn run_prompt<'a>(&'a self, request: &'a PromptRequest) -> PromptFuture<'a>;
}

// ── Configuration ──────────────────────────────────────────────────

/// Base URLs per family. Defaults point at the public APIs.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProviderEndpoints {
    pub anthropic: String,
    pub openai: String,
    pub gemini: String,
}

impl Default for ProviderEndpoints {
    fn default() -> Self {
        Self {
            anthropic: anthropic::DEFAULT_BASE_URL.to_string(),
            openai: openai::DEFAULT_BASE_URL.to_string(),
            gemini: gemini::DEFAULT_BASE_URL.to_string(),
        }
    }
}

impl ProviderEndpoints {
    /// Route every family to the same base URL (local mock servers).
    pub fn all(base: impl Into<String>) -> Self {
        let base = base.into();
        Self {
            anthropic: base.clone(),
            openai: base.clone(),
            gemini: base,
        }
    }

    pub fn base(&self, family: ProviderFamily) -> &str {
        let base = match family {
            ProviderFamily::Anthropic => &self.anthropic,
            ProviderFamily::OpenAi => &self.openai,
            ProviderFamily::Gemini => &self.gemini,
        };
        base.trim_end_matches('/')
    }
}

/// API keys per family.
#[derive(Clone, Default)]
pub struct Credentials {
    keys: BTreeMap<ProviderFamily, String>,
}

impl Credentials {
    /// Read every family's key from its environment variable.
    /// Unset or empty variables are skipped.
    pub fn from_env() -> Self {
        let keys = ProviderFamily::PRIORITY
            .into_iter()
            .filter_map(|f| {
                std::env::var(f.api_key_var())
                    .ok()
                    .filter(|k| !k.trim().is_empty())
                    .map(|k| (f, k))
            })
            .collect();
        Self { keys }
    }

    pub fn with_key(mut self, family: ProviderFamily, key: impl Into<String>) -> Self {
        self.keys.insert(family, key.into());
        self
    }

    pub fn has(&self, family: ProviderFamily) -> bool {
        self.keys.contains_key(&family)
    }

    fn get(&self, family: ProviderFamily) -> Result<&str> {
        self.keys.get(&family).map(String::as_str).ok_or_else(|| {
            Error::provider(family, None, format!("{} is not set", family.api_key_var()))
        })
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("families", &self.keys.keys().collect::<Vec<_>>())
            .finish()
    }
}

// ── Requests ───────────────────────────────────────────────────────

/// A fully built vendor payload, before it is sent.
#[derive(Debug, Clone)]
pub enum ProviderRequest {
    Anthropic(anthropic::MessagesRequest),
    OpenAi(openai::ResponsesRequest),
    Gemini(gemini::GenerateContentRequest),
}

impl ProviderRequest {
    pub fn family(&self) -> ProviderFamily {
        match self {
            ProviderRequest::Anthropic(_) => ProviderFamily::Anthropic,
            ProviderRequest::OpenAi(_) => ProviderFamily::OpenAi,
            ProviderRequest::Gemini(_) => ProviderFamily::Gemini,
        }
    }

    /// Whether the family's grounding tool is attached.
    pub fn has_grounding_tool(&self) -> bool {
        match self {
            ProviderRequest::Anthropic(r) => r.tools.is_some(),
            ProviderRequest::OpenAi(r) => r.tools.is_some(),
            ProviderRequest::Gemini(r) => r.tools.is_some(),
        }
    }

    pub fn to_json(&self) -> serde_json::Value {
        let value = match self {
            ProviderRequest::Anthropic(r) => serde_json::to_value(r),
            ProviderRequest::OpenAi(r) => serde_json::to_value(r),
            ProviderRequest::Gemini(r) => serde_json::to_value(r),
        };
        value.unwrap_or(serde_json::Value::Null)
    }
}

// ── Gateway ────────────────────────────────────────────────────────

/// Routes completions to the right vendor and normalises replies.
pub struct ProviderGateway {
    client: reqwest::Client,
    catalog: ModelCatalog,
    endpoints: ProviderEndpoints,
    credentials: Credentials,
    usage: Mutex<UsageTracker>,
}

impl ProviderGateway {
    pub fn new(catalog: ModelCatalog, credentials: Credentials) -> Result<Self> {
        Self::with_timeout(catalog, credentials, DEFAULT_TIMEOUT)
    }

    pub fn with_timeout(
        catalog: ModelCatalog,
        credentials: Credentials,
        timeout: Duration,
    ) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()
            .map_err(|e| Error::HttpClient(e.to_string()))?;
        Ok(Self {
            client,
            catalog,
            endpoints: ProviderEndpoints::default(),
            credentials,
            usage: Mutex::new(UsageTracker::new()),
        })
    }

    pub fn with_endpoints(mut self, endpoints: ProviderEndpoints) -> Self {
        self.endpoints = endpoints;
        self
    }

    pub fn catalog(&self) -> &ModelCatalog {
        &self.catalog
    }

    /// Snapshot of token usage recorded so far.
    pub fn usage(&self) -> UsageTracker {
        self.usage.lock().map(|u| u.clone()).unwrap_or_default()
    }

    pub fn resolve(&self, model_id: &str) -> Result<ProviderFamily> {
        self.catalog
            .resolve(model_id)
            .ok_or_else(|| Error::UnknownModel(model_id.to_string()))
    }

    /// Build the vendor payload for a call without sending it.
    ///
    /// The grounding tool is attached only when `enable_grounding` is set
    /// and the model is in its family's grounding catalog; otherwise the
    /// flag is ignored.
    pub fn build_request(
        &self,
        model_id: &str,
        max_output_tokens: u32,
        temperature: f32,
        messages: &[ChatMessage],
        enable_grounding: bool,
    ) -> Result<ProviderRequest> {
        let family = self.resolve(model_id)?;
        let grounding = enable_grounding && self.catalog.supports_grounding(family, model_id);
        if enable_grounding && !grounding {
            debug!("Grounding requested for {model_id} but not supported; sending without tool");
        }

        Ok(match family {
            ProviderFamily::Anthropic => ProviderRequest::Anthropic(anthropic::build_request(
                model_id,
                max_output_tokens,
                temperature,
                messages,
                grounding,
            )),
            ProviderFamily::OpenAi => ProviderRequest::OpenAi(openai::build_request(
                model_id,
                max_output_tokens,
                temperature,
                messages,
                grounding,
            )),
            ProviderFamily::Gemini => ProviderRequest::Gemini(gemini::build_request(
                max_output_tokens,
                temperature,
                messages,
                grounding,
            )),
        })
    }

    /// Run one completion and return the reply text.
    pub async fn run_prompt(
        &self,
        model_id: &str,
        max_output_tokens: u32,
        temperature: f32,
        messages: &[ChatMessage],
        enable_grounding: bool,
    ) -> Result<String> {
        let request = self.build_request(
            model_id,
            max_output_tokens,
            temperature,
            messages,
            enable_grounding,
        )?;
        let completion = self.send(model_id, &request).await?;

        if let Some(usage) = completion.usage
            && let Ok(mut tracker) = self.usage.lock()
        {
            tracker.record(request.family(), model_id, usage);
        }

        Ok(completion.text())
    }

    async fn send(&self, model_id: &str, request: &ProviderRequest) -> Result<Completion> {
        let family = request.family();
        let key = self.credentials.get(family)?;
        let base = self.endpoints.base(family);

        debug!(
            "LLM request: family={}, model={}, max_tokens={}, grounding={}",
            family,
            model_id,
            match request {
                ProviderRequest::Anthropic(r) => r.max_tokens,
                ProviderRequest::OpenAi(r) => r.max_output_tokens,
                ProviderRequest::Gemini(r) => r.generation_config.max_output_tokens,
            },
            request.has_grounding_tool(),
        );

        let builder = match request {
            ProviderRequest::Anthropic(body) => {
                let url = anthropic::messages_url(base);
                anthropic::authorize(self.client.post(url), key).json(body)
            }
            ProviderRequest::OpenAi(body) => {
                openai::authorize(self.client.post(openai::responses_url(base)), key).json(body)
            }
            ProviderRequest::Gemini(body) => gemini::authorize(
                self.client.post(gemini::generate_url(base, model_id)),
                key,
            )
            .json(body),
        };
        trace!(
            "Request payload size: {} bytes",
            serde_json::to_string(&request.to_json()).map_or(0, |s| s.len())
        );

        let text = self.execute(family, builder).await?;
        match family {
            ProviderFamily::Anthropic => anthropic::parse_response(&text),
            ProviderFamily::OpenAi => openai::parse_response(&text),
            ProviderFamily::Gemini => gemini::parse_response(&text),
        }
    }

    /// Fetch the live model listing for one family.
    pub async fn list_models(&self, family: ProviderFamily) -> Result<Vec<String>> {
        let key = self.credentials.get(family)?;
        let base = self.endpoints.base(family);
        let builder = match family {
            ProviderFamily::Anthropic => {
                anthropic::authorize(self.client.get(anthropic::models_url(base)), key)
            }
            ProviderFamily::OpenAi => {
                openai::authorize(self.client.get(openai::models_url(base)), key)
            }
            ProviderFamily::Gemini => {
                gemini::authorize(self.client.get(gemini::models_url(base)), key)
            }
        };

        let text = self.execute(family, builder).await?;
        let ids = match family {
            ProviderFamily::Anthropic => anthropic::parse_model_list(&text),
            ProviderFamily::OpenAi => openai::parse_model_list(&text),
            ProviderFamily::Gemini => gemini::parse_model_list(&text),
        }?;
        debug!("Listed {} {} model(s)", ids.len(), family);
        Ok(ids)
    }

    /// Build a new catalog whose model lists for `families` come from the
    /// live listings. The gateway's own catalog is left unchanged.
    pub async fn refresh_catalog(&self, families: &[ProviderFamily]) -> Result<ModelCatalog> {
        let mut catalog = self.catalog.clone();
        for family in families {
            let ids = self.list_models(*family).await?;
            catalog = catalog.with_family_models(*family, ids);
        }
        Ok(catalog)
    }

    /// Send a prepared request and return the body of a 2xx reply.
    async fn execute(
        &self,
        family: ProviderFamily,
        builder: reqwest::RequestBuilder,
    ) -> Result<String> {
        let start = Instant::now();
        let resp = builder.send().await.map_err(|e| {
            Error::provider(
                family,
                e.status().map(|s| s.as_u16()),
                format!("request failed: {e}"),
            )
        })?;

        let status = resp.status();
        let text = resp.text().await.map_err(|e| {
            Error::provider(family, Some(status.as_u16()), format!("failed to read response: {e}"))
        })?;

        debug!(
            "LLM response: {} HTTP {} in {:.1}s ({} bytes)",
            family,
            status,
            start.elapsed().as_secs_f64(),
            text.len()
        );

        if !status.is_success() {
            return Err(Error::provider(
                family,
                Some(status.as_u16()),
                vendor_error_message(&text),
            ));
        }
        Ok(text)
    }
}

impl PromptRunner for ProviderGateway {
    fn run_prompt<'a>(&'a self, request: &'a PromptRequest) -> PromptFuture<'a> {
        Box::pin(ProviderGateway::run_prompt(
            self,
            &request.model_id,
            request.max_output_tokens,
            request.temperature,
            &request.messages,
            request.enable_grounding,
        ))
    }
}

impl std::fmt::Debug for ProviderGateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderGateway")
            .field("catalog_version", &self.catalog.version)
            .field("endpoints", &self.endpoints)
            .field("credentials", &self.credentials)
            .finish()
    }
}

/// All three vendors report failures as `{"error": {"message": ...}}`.
#[derive(Deserialize)]
struct VendorErrorBody {
    error: VendorError,
}

#[derive(Deserialize)]
struct VendorError {
    message: String,
}

const MAX_ERROR_BODY_CHARS: usize = 500;

fn vendor_error_message(body: &str) -> String {
    match serde_json::from_str::<VendorErrorBody>(body) {
        Ok(parsed) => parsed.error.message,
        Err(_) => body.chars().take(MAX_ERROR_BODY_CHARS).collect(),
    }
}

/// Map a payload deserialisation failure to a vendor error.
pub(crate) fn malformed(family: ProviderFamily, err: serde_json::Error) -> Error {
    Error::provider(family, None, format!("malformed response: {err}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gateway() -> ProviderGateway {
        ProviderGateway::new(ModelCatalog::builtin(), Credentials::default()).unwrap()
    }

    fn hello() -> Vec<ChatMessage> {
        vec![ChatMessage::user("Respond with C or D.")]
    }

    #[test]
    fn unknown_model_fails_before_building() {
        let err = gateway()
            .build_request("mystery-model", 16, 1.0, &hello(), false)
            .unwrap_err();
        assert!(matches!(err, Error::UnknownModel(ref id) if id == "mystery-model"));
    }

    #[test]
    fn routes_each_family() {
        let gw = gateway();
        for (model, family) in [
            ("claude-3-haiku-20240307", ProviderFamily::Anthropic),
            ("gpt-4o", ProviderFamily::OpenAi),
            ("gemini-2.0-flash", ProviderFamily::Gemini),
        ] {
            let req = gw.build_request(model, 16, 1.0, &hello(), false).unwrap();
            assert_eq!(req.family(), family);
        }
    }

    #[test]
    fn grounding_ignored_for_models_outside_grounding_catalog() {
        let gw = gateway();
        for model in ["claude-3-haiku-20240307", "gpt-4-turbo", "o1-mini"] {
            let req = gw.build_request(model, 16, 1.0, &hello(), true).unwrap();
            assert!(!req.has_grounding_tool(), "{model} should not get a tool");
            assert!(req.to_json().get("tools").is_none());
        }
    }

    #[test]
    fn grounding_attached_for_capable_models() {
        let gw = gateway();
        for model in ["claude-sonnet-4-5", "gpt-4o", "gemini-2.5-flash"] {
            let req = gw.build_request(model, 16, 1.0, &hello(), true).unwrap();
            assert!(req.has_grounding_tool(), "{model} should get a tool");
        }
    }

    #[test]
    fn grounding_never_attached_when_disabled() {
        let req = gateway()
            .build_request("gpt-4o", 16, 1.0, &hello(), false)
            .unwrap();
        assert!(!req.has_grounding_tool());
    }

    #[tokio::test]
    async fn missing_key_is_provider_error() {
        let err = gateway()
            .run_prompt("gpt-4o", 16, 1.0, &hello(), false)
            .await
            .unwrap_err();
        match err {
            Error::Provider { vendor, status, message } => {
                assert_eq!(vendor, ProviderFamily::OpenAi);
                assert_eq!(status, None);
                assert!(message.contains("OPENAI_API_KEY"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn vendor_error_message_prefers_json_message() {
        let body = r#"{"type":"error","error":{"type":"overloaded_error","message":"Overloaded"}}"#;
        assert_eq!(vendor_error_message(body), "Overloaded");
        assert_eq!(vendor_error_message("Bad Gateway"), "Bad Gateway");
        assert_eq!(vendor_error_message(&"x".repeat(2000)).len(), MAX_ERROR_BODY_CHARS);
    }

    #[test]
    fn endpoints_trim_trailing_slash() {
        let endpoints = ProviderEndpoints::all("http://127.0.0.1:9999/");
        assert_eq!(endpoints.base(ProviderFamily::Gemini), "http://127.0.0.1:9999");
    }

    #[test]
    fn credentials_debug_hides_keys() {
        let creds = Credentials::default().with_key(ProviderFamily::Anthropic, "sk-secret");
        let debug = format!("{creds:?}");
        assert!(!debug.contains("sk-secret"));
        assert!(creds.has(ProviderFamily::Anthropic));
        assert!(!creds.has(ProviderFamily::Gemini));
    }
}
