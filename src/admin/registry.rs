//! Admin model registry
//!
//! Maps model names to their admin handlers.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::warn;

use super::model::{AdminEntity, AdminError, AdminModel, AdminResult, ModelAdmin};

/// Registry of admin handlers, keyed by model name.
#[derive(Default, Clone)]
pub struct AdminRegistry {
    models: HashMap<&'static str, Arc<dyn AdminModel>>,
}

impl AdminRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler. An existing handler with the same name is replaced.
    pub fn register(&mut self, model: Arc<dyn AdminModel>) {
        let name = model.name();
        if self.models.insert(name, model).is_some() {
            warn!("Admin model '{}' registered twice, keeping the latest", name);
        }
    }

    /// Register the generic handler for `E`.
    pub fn register_entity<E: AdminEntity>(&mut self) {
        self.register(Arc::new(ModelAdmin::<E>::new()));
    }

    pub fn get(&self, name: &str) -> AdminResult<Arc<dyn AdminModel>> {
        self.models
            .get(name)
            .cloned()
            .ok_or_else(|| AdminError::UnknownModel(name.to_string()))
    }

    /// Registered model names, sorted.
    pub fn names(&self) -> Vec<&'static str> {
        let mut names: Vec<_> = self.models.keys().copied().collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.models.len()
    }

    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::admin::entities::{FeatureAdmin, UserAdmin};

    #[test]
    fn test_register_and_lookup() {
        let mut registry = AdminRegistry::new();
        assert!(registry.is_empty());

        registry.register_entity::<UserAdmin>();
        registry.register_entity::<FeatureAdmin>();

        assert_eq!(registry.names(), vec!["feature", "user"]);
        assert_eq!(registry.get("user").unwrap().verbose_name_plural(), "Users");
    }

    #[test]
    fn test_registering_twice_replaces() {
        let mut registry = AdminRegistry::new();
        registry.register_entity::<FeatureAdmin>();
        registry.register_entity::<FeatureAdmin>();
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_unknown_model() {
        let registry = AdminRegistry::new();
        match registry.get("property") {
            Err(AdminError::UnknownModel(name)) => assert_eq!(name, "property"),
            _ => panic!("expected UnknownModel"),
        }
    }
}
