//! Immutable model table keyed by model identifier

use std::collections::HashMap;

use once_cell::sync::Lazy;
use thiserror::Error;

use super::model::ModelInfo;
use super::provider::ProviderKind;

/// Errors found while validating a catalog
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CatalogError {
    #[error("Unknown model: {0}")]
    UnknownModel(String),

    #[error("Model {model} falls back to unknown model {fallback}")]
    UnknownFallback { model: String, fallback: String },

    #[error("Model {0} falls back to itself")]
    SelfFallback(String),

    #[error("Duplicate model id: {0}")]
    DuplicateModel(String),
}

pub type CatalogResult<T> = Result<T, CatalogError>;

/// Built-in table, loaded once per process
static BUILTIN: Lazy<ModelCatalog> = Lazy::new(|| {
    use ProviderKind::*;

    let models = vec![
        ModelInfo::new("gpt-4o", "GPT-4o", OpenAi).with_fallback("deepseek-chat"),
        ModelInfo::new("gpt-4o-mini", "GPT-4o mini", OpenAi).with_fallback("deepseek-chat"),
        ModelInfo::new("claude-3-5-sonnet-20241022", "Claude 3.5 Sonnet", Anthropic)
            .with_context_length(200_000)
            .with_fallback("deepseek-chat"),
        ModelInfo::new("claude-3-5-haiku-20241022", "Claude 3.5 Haiku", Anthropic)
            .with_context_length(200_000)
            .with_fallback("deepseek-chat"),
        ModelInfo::new("gemini-1.5-pro", "Gemini 1.5 Pro", Gemini)
            .with_context_length(2_000_000)
            .with_fallback("deepseek-chat"),
        ModelInfo::new("gemini-1.5-flash", "Gemini 1.5 Flash", Gemini)
            .with_context_length(1_000_000)
            .with_fallback("deepseek-chat"),
        ModelInfo::new("deepseek-chat", "DeepSeek V3", DeepSeek)
            .with_context_length(64_000)
            .with_fallback("gpt-4o-mini"),
        ModelInfo::new("deepseek-reasoner", "DeepSeek R1", DeepSeek)
            .with_context_length(64_000)
            .with_fallback("gpt-4o-mini"),
        ModelInfo::new("sonar", "Perplexity Sonar", Perplexity)
            .with_icon("perplexity-search")
            .with_fallback("deepseek-chat"),
        ModelInfo::new("sonar-pro", "Perplexity Sonar Pro", Perplexity)
            .with_icon("perplexity-search")
            .with_context_length(200_000)
            .with_fallback("deepseek-chat"),
        ModelInfo::new("meta-llama/llama-3.3-70b-instruct", "Llama 3.3 70B", OpenRouter)
            .with_icon("meta")
            .with_fallback("gpt-4o-mini"),
        ModelInfo::new("mistralai/mistral-large", "Mistral Large", OpenRouter)
            .with_icon("mistral")
            .with_fallback("gpt-4o-mini"),
    ];

    // The table above is static; a failure here is a programming error caught by tests
    ModelCatalog::from_models(models).unwrap_or_default()
});

/// Lookup table of every model the UI can target
///
/// A catalog never changes after construction. `with_overrides` returns
/// a new catalog instead of mutating this one.
#[derive(Debug, Clone, Default)]
pub struct ModelCatalog {
    models: HashMap<String, ModelInfo>,
    order: Vec<String>,
}

impl ModelCatalog {
    /// The process-wide built-in catalog
    pub fn builtin() -> &'static ModelCatalog {
        &BUILTIN
    }

    /// Build and validate a catalog from a list of models
    pub fn from_models(models: Vec<ModelInfo>) -> CatalogResult<Self> {
        let mut map = HashMap::with_capacity(models.len());
        let mut order = Vec::with_capacity(models.len());

        for model in models {
            if map.contains_key(&model.id) {
                return Err(CatalogError::DuplicateModel(model.id));
            }
            order.push(model.id.clone());
            map.insert(model.id.clone(), model);
        }

        let catalog = Self { models: map, order };
        catalog.validate()?;
        Ok(catalog)
    }

    /// Get a model by id
    pub fn get(&self, id: &str) -> Option<&ModelInfo> {
        self.models.get(id)
    }

    /// Get a model by id, or fail
    pub fn require(&self, id: &str) -> CatalogResult<&ModelInfo> {
        self.get(id).ok_or_else(|| CatalogError::UnknownModel(id.to_string()))
    }

    /// Check if a model is known
    pub fn contains(&self, id: &str) -> bool {
        self.models.contains_key(id)
    }

    /// All models in table order
    pub fn models(&self) -> impl Iterator<Item = &ModelInfo> {
        self.order.iter().filter_map(|id| self.models.get(id))
    }

    /// Models served by one provider
    pub fn by_provider(&self, provider: ProviderKind) -> Vec<&ModelInfo> {
        self.models().filter(|m| m.provider == provider).collect()
    }

    /// Number of models
    pub fn len(&self) -> usize {
        self.models.len()
    }

    /// Check if the catalog has no models
    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }

    /// The model to try once after `id` fails
    pub fn fallback_for(&self, id: &str) -> Option<&ModelInfo> {
        self.get(id)
            .and_then(|m| m.fallback.as_deref())
            .and_then(|fallback| self.get(fallback))
    }

    /// Copy of this catalog with some fallback edges replaced
    ///
    /// An empty target string removes the fallback for that model.
    pub fn with_overrides(&self, fallbacks: &HashMap<String, String>) -> CatalogResult<Self> {
        let mut next = self.clone();
        for (model, fallback) in fallbacks {
            let entry = next
                .models
                .get_mut(model)
                .ok_or_else(|| CatalogError::UnknownModel(model.clone()))?;
            entry.fallback = if fallback.is_empty() {
                None
            } else {
                Some(fallback.clone())
            };
        }
        next.validate()?;
        Ok(next)
    }

    /// Every fallback must name a different, known model
    pub fn validate(&self) -> CatalogResult<()> {
        for id in &self.order {
            let Some(model) = self.models.get(id) else {
                continue;
            };
            if let Some(fallback) = &model.fallback {
                if fallback == &model.id {
                    return Err(CatalogError::SelfFallback(model.id.clone()));
                }
                if !self.models.contains_key(fallback) {
                    return Err(CatalogError::UnknownFallback {
                        model: model.id.clone(),
                        fallback: fallback.clone(),
                    });
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_is_valid_and_complete() {
        let catalog = ModelCatalog::builtin();
        assert!(!catalog.is_empty());
        assert!(catalog.validate().is_ok());

        for provider in ProviderKind::ALL {
            assert!(
                !catalog.by_provider(provider).is_empty(),
                "no model for {}",
                provider
            );
        }
    }

    #[test]
    fn test_every_builtin_model_has_a_fallback() {
        let catalog = ModelCatalog::builtin();
        for model in catalog.models() {
            let fallback = catalog.fallback_for(&model.id).expect("fallback");
            assert_ne!(fallback.id, model.id);
        }
    }

    #[test]
    fn test_fallback_policy() {
        let catalog = ModelCatalog::builtin();
        assert_eq!(catalog.fallback_for("gpt-4o").unwrap().id, "deepseek-chat");
        assert_eq!(catalog.fallback_for("deepseek-chat").unwrap().id, "gpt-4o-mini");
        assert!(catalog.fallback_for("no-such-model").is_none());
    }

    #[test]
    fn test_rejects_bad_tables() {
        let self_ref = vec![ModelInfo::new("a", "A", ProviderKind::OpenAi).with_fallback("a")];
        assert_eq!(
            ModelCatalog::from_models(self_ref).unwrap_err(),
            CatalogError::SelfFallback("a".to_string())
        );

        let dangling = vec![ModelInfo::new("a", "A", ProviderKind::OpenAi).with_fallback("b")];
        assert!(matches!(
            ModelCatalog::from_models(dangling),
            Err(CatalogError::UnknownFallback { .. })
        ));

        let dup = vec![
            ModelInfo::new("a", "A", ProviderKind::OpenAi),
            ModelInfo::new("a", "A again", ProviderKind::Gemini),
        ];
        assert!(matches!(
            ModelCatalog::from_models(dup),
            Err(CatalogError::DuplicateModel(_))
        ));
    }

    #[test]
    fn test_overrides_leave_original_untouched() {
        let catalog = ModelCatalog::builtin();
        let mut overrides = HashMap::new();
        overrides.insert("gpt-4o".to_string(), "claude-3-5-sonnet-20241022".to_string());
        overrides.insert("sonar".to_string(), String::new());

        let custom = catalog.with_overrides(&overrides).unwrap();
        assert_eq!(custom.fallback_for("gpt-4o").unwrap().id, "claude-3-5-sonnet-20241022");
        assert!(custom.fallback_for("sonar").is_none());
        assert_eq!(catalog.fallback_for("gpt-4o").unwrap().id, "deepseek-chat");

        overrides.insert("unknown".to_string(), "gpt-4o".to_string());
        assert!(catalog.with_overrides(&overrides).is_err());
    }

    #[test]
    fn test_table_order_is_preserved() {
        let catalog = ModelCatalog::from_models(vec![
            ModelInfo::new("z", "Z", ProviderKind::OpenAi),
            ModelInfo::new("a", "A", ProviderKind::OpenAi).with_fallback("z"),
        ])
        .unwrap();
        let ids: Vec<_> = catalog.models().map(|m| m.id.as_str()).collect();
        assert_eq!(ids, vec!["z", "a"]);
        assert_eq!(catalog.require("a").unwrap().display_name, "A");
        assert!(catalog.require("b").is_err());
    }
}
