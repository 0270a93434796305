//! Versioned catalog of known model ids per provider family.
//!
//! The catalog is a plain value. It is loaded once at startup (built-in
//! table or a JSON file) and never mutated afterwards; refreshing from a
//! live provider listing produces a new catalog with a higher version.
//!
//! ```json
//! {
//!   "version": 1,
//!   "families": {
//!     "anthropic": { "models": ["claude-3-haiku-20240307"], "grounding": ["claude-sonnet-4-5"] },
//!     "openai":    { "models": ["gpt-4o"], "grounding": ["gpt-4o"] },
//!     "gemini":    { "models": ["gemini-2.5-flash"], "grounding": [] }
//!   }
//! }
//! ```

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

/// One of the supported LLM vendor backends.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderFamily {
    Anthropic,
    OpenAi,
    Gemini,
}

impl ProviderFamily {
    /// Routing priority: the first family claiming a model id wins.
    pub const PRIORITY: [ProviderFamily; 3] = [
        ProviderFamily::Anthropic,
        ProviderFamily::OpenAi,
        ProviderFamily::Gemini,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ProviderFamily::Anthropic => "anthropic",
            ProviderFamily::OpenAi => "openai",
            ProviderFamily::Gemini => "gemini",
        }
    }

    /// Environment variable holding this family's API key.
    pub fn api_key_var(self) -> &'static str {
        match self {
            ProviderFamily::Anthropic => "ANTHROPIC_API_KEY",
            ProviderFamily::OpenAi => "OPENAI_API_KEY",
            ProviderFamily::Gemini => "GEMINI_API_KEY",
        }
    }
}

impl std::fmt::Display for ProviderFamily {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ProviderFamily {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "anthropic" | "claude" => Ok(ProviderFamily::Anthropic),
            "openai" => Ok(ProviderFamily::OpenAi),
            "gemini" | "google" => Ok(ProviderFamily::Gemini),
            other => Err(format!(
                "unknown provider family '{other}' (expected anthropic, openai or gemini)"
            )),
        }
    }
}

/// Identifies the remote model behind a player.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelSpec {
    pub family: ProviderFamily,
    pub model_id: String,
    /// Whether this player runs the model with the family's grounding
    /// (web search) tool enabled.
    pub supports_grounding: bool,
}

impl ModelSpec {
    pub fn new(family: ProviderFamily, model_id: impl Into<String>) -> Self {
        Self {
            family,
            model_id: model_id.into(),
            supports_grounding: false,
        }
    }

    pub fn grounded(family: ProviderFamily, model_id: impl Into<String>) -> Self {
        Self {
            supports_grounding: true,
            ..Self::new(family, model_id)
        }
    }
}

/// Model ids known for a single family.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FamilyCatalog {
    /// Models benchmarked in their plain form.
    #[serde(default)]
    pub models: BTreeSet<String>,
    /// Models that accept the family's grounding tool.
    #[serde(default)]
    pub grounding: BTreeSet<String>,
}

impl FamilyCatalog {
    pub fn claims(&self, model_id: &str) -> bool {
        self.models.contains(model_id) || self.grounding.contains(model_id)
    }

    pub fn supports_grounding(&self, model_id: &str) -> bool {
        self.grounding.contains(model_id)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelCatalog {
    pub version: u32,
    #[serde(default)]
    pub families: BTreeMap<ProviderFamily, FamilyCatalog>,
}

impl ModelCatalog {
    /// The static table shipped with the crate.
    pub fn builtin() -> Self {
        fn set(ids: &[&str]) -> BTreeSet<String> {
            ids.iter().map(|s| (*s).to_string()).collect()
        }

        let mut families = BTreeMap::new();
        families.insert(
            ProviderFamily::Anthropic,
            FamilyCatalog {
                models: set(&[
                    "claude-opus-4-5-20251101",
                    "claude-sonnet-4-5-20250929",
                    "claude-3-7-sonnet-20250219",
                    "claude-3-5-sonnet-20241022",
                    "claude-3-5-sonnet-20240620",
                    "claude-3-opus-20240229",
                    "claude-3-sonnet-20240229",
                    "claude-3-haiku-20240307",
                ]),
                grounding: set(&[
                    "claude-sonnet-4-5",
                    "claude-sonnet-4",
                    "claude-haiku-4-5",
                    "claude-haiku-3-5",
                    "claude-opus-4-5",
                    "claude-opus-4-1",
                    "claude-opus-4",
                ]),
            },
        );
        families.insert(
            ProviderFamily::OpenAi,
            FamilyCatalog {
                models: set(&[
                    "gpt-4o",
                    "gpt-4o-mini",
                    "gpt-4-turbo",
                    "gpt-4",
                    "gpt-3.5-turbo",
                    "o1",
                    "o1-mini",
                    "o1-preview",
                ]),
                grounding: set(&["gpt-4o", "gpt-4o-mini", "gpt-4.1", "o1", "o3"]),
            },
        );
        families.insert(
            ProviderFamily::Gemini,
            FamilyCatalog {
                models: set(&[
                    "gemini-2.5-pro",
                    "gemini-2.5-flash",
                    "gemini-2.5-flash-lite",
                    "gemini-2.0-flash",
                ]),
                grounding: set(&[
                    "gemini-2.5-pro",
                    "gemini-2.5-flash",
                    "gemini-2.5-flash-lite",
                    "gemini-2.0-flash",
                    "gemini-1.5-pro",
                    "gemini-1.5-flash",
                ]),
            },
        );

        Self {
            version: 1,
            families,
        }
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| Error::Catalog(format!("invalid catalog: {e}")))
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::Catalog(format!("failed to read catalog '{}': {e}", path.display()))
        })?;
        Self::from_json_str(&content)
    }

    pub fn family(&self, family: ProviderFamily) -> Option<&FamilyCatalog> {
        self.families.get(&family)
    }

    /// The family that owns `model_id`, checked in [`ProviderFamily::PRIORITY`] order.
    pub fn resolve(&self, model_id: &str) -> Option<ProviderFamily> {
        ProviderFamily::PRIORITY
            .into_iter()
            .find(|f| self.family(*f).is_some_and(|c| c.claims(model_id)))
    }

    /// Whether `model_id` is in `family`'s grounding-capable set.
    pub fn supports_grounding(&self, family: ProviderFamily, model_id: &str) -> bool {
        self.family(family)
            .is_some_and(|c| c.supports_grounding(model_id))
    }

    /// A new catalog with `family`'s plain model list replaced by `ids`.
    ///
    /// The grounding set is kept as-is: provider listings do not report
    /// tool support. The version saturates at `u32::MAX`.
    pub fn with_family_models(
        &self,
        family: ProviderFamily,
        ids: impl IntoIterator<Item = String>,
    ) -> Self {
        let mut next = self.clone();
        next.version = self.version.saturating_add(1);
        next.families.entry(family).or_default().models = ids.into_iter().collect();
        next
    }

    /// One plain (non-grounded) spec per listed model, in priority order.
    pub fn regular_specs(&self) -> Vec<ModelSpec> {
        self.specs(|c| &c.models, ModelSpec::new)
    }

    /// One grounded spec per grounding-capable model, in priority order.
    pub fn grounding_specs(&self) -> Vec<ModelSpec> {
        self.specs(|c| &c.grounding, ModelSpec::grounded)
    }

    fn specs(
        &self,
        ids: impl Fn(&FamilyCatalog) -> &BTreeSet<String>,
        make: impl Fn(ProviderFamily, String) -> ModelSpec,
    ) -> Vec<ModelSpec> {
        ProviderFamily::PRIORITY
            .into_iter()
            .filter_map(|f| self.family(f).map(|c| (f, c)))
            .flat_map(|(f, c)| ids(c).iter().map(move |id| (f, id.clone())))
            .map(|(f, id)| make(f, id))
            .collect()
    }

    pub fn model_count(&self) -> usize {
        self.families
            .values()
            .map(|c| c.models.union(&c.grounding).count())
            .sum()
    }
}

impl Default for ModelCatalog {
    fn default() -> Self {
        Self::builtin()
    }
}
