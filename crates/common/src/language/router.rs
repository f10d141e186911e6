//! Capability selection by detected language

use super::LanguageTag;
use crate::config::InferenceConfig;
use crate::errors::Result;
use crate::inference::{create_qa, QaCapability};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::info;

/// Maps language tags to capabilities, falling back to a default
pub struct CapabilityRouter<T: ?Sized> {
    routes: HashMap<String, Arc<T>>,
    default: Arc<T>,
}

impl<T: ?Sized> Clone for CapabilityRouter<T> {
    fn clone(&self) -> Self {
        Self {
            routes: self.routes.clone(),
            default: Arc::clone(&self.default),
        }
    }
}

impl<T: ?Sized> CapabilityRouter<T> {
    pub fn new(default: Arc<T>) -> Self {
        Self {
            routes: HashMap::new(),
            default,
        }
    }

    /// Register a capability for one language
    pub fn with_route(mut self, language: &str, capability: Arc<T>) -> Self {
        match LanguageTag::new(language) {
            LanguageTag::Known(code) => {
                self.routes.insert(code, capability);
            }
            LanguageTag::Unknown => self.default = capability,
        }
        self
    }

    /// Capability for `language`; unknown or unmapped tags get the default
    pub fn route(&self, language: &LanguageTag) -> &Arc<T> {
        match language {
            LanguageTag::Known(code) => self.routes.get(code).unwrap_or(&self.default),
            LanguageTag::Unknown => &self.default,
        }
    }

    pub fn default_capability(&self) -> &Arc<T> {
        &self.default
    }

    /// Languages with a dedicated capability, sorted
    pub fn languages(&self) -> Vec<&str> {
        let mut languages: Vec<&str> = self.routes.keys().map(String::as_str).collect();
        languages.sort_unstable();
        languages
    }
}

/// Build the QA router from `qa_language_models` and `qa_default_model`.
///
/// Languages mapped to the same model share one capability instance.
pub fn build_qa_router(config: &InferenceConfig) -> Result<CapabilityRouter<dyn QaCapability>> {
    let mut by_model: HashMap<&str, Arc<dyn QaCapability>> = HashMap::new();

    let default = create_qa(config, &config.qa_default_model)?;
    by_model.insert(config.qa_default_model.as_str(), Arc::clone(&default));

    let mut router = CapabilityRouter::new(default);
    for (language, model) in &config.qa_language_models {
        let capability = match by_model.get(model.as_str()) {
            Some(existing) => Arc::clone(existing),
            None => {
                let created = create_qa(config, model)?;
                by_model.insert(model.as_str(), Arc::clone(&created));
                created
            }
        };
        router = router.with_route(language, capability);
    }

    info!(
        default_model = %config.qa_default_model,
        languages = ?router.languages(),
        "QA router ready"
    );

    Ok(router)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inference::MockQa;

    fn qa(name: &str) -> Arc<dyn QaCapability> {
        Arc::new(MockQa::new(name))
    }

    #[test]
    fn test_route_known_and_fallback() {
        let router = CapabilityRouter::new(qa("multilingual")).with_route("EN", qa("english"));

        assert_eq!(router.route(&LanguageTag::new("en")).model_name(), "english");
        assert_eq!(router.route(&LanguageTag::new("fr")).model_name(), "multilingual");
        assert_eq!(router.route(&LanguageTag::Unknown).model_name(), "multilingual");
        assert_eq!(router.languages(), vec!["en"]);
    }

    #[test]
    fn test_unknown_route_replaces_default() {
        let router = CapabilityRouter::new(qa("a")).with_route("unknown", qa("b"));
        assert_eq!(router.default_capability().model_name(), "b");
        assert!(router.languages().is_empty());
    }

    #[test]
    fn test_build_from_config() {
        let mut config = InferenceConfig::default();
        config
            .qa_language_models
            .insert("de".into(), config.qa_default_model.clone());

        let router = build_qa_router(&config).unwrap();
        assert_eq!(
            router.route(&LanguageTag::new("en")).model_name(),
            "deepset/roberta-base-squad2"
        );
        assert!(Arc::ptr_eq(
            router.route(&LanguageTag::new("de")),
            router.default_capability()
        ));
        assert_eq!(
            router.route(&LanguageTag::new("ja")).model_name(),
            config.qa_default_model
        );
    }
}
