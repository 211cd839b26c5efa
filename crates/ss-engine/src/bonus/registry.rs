//! Bonus Registry — ordered storage for registered bonuses

use crate::error::{EngineError, EngineResult};

use super::{BonusId, BonusInfo, SharedBonus};

/// Ordered registry of bonuses
///
/// Registration order is invocation order, so storage is a `Vec` rather
/// than a map. Ids are unique.
#[derive(Default, Clone)]
pub struct BonusRegistry {
    bonuses: Vec<SharedBonus>,
}

impl BonusRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a bonus at the end of the hook order
    pub fn register(&mut self, bonus: SharedBonus) -> EngineResult<()> {
        let id = bonus.id();
        if self.has(&id) {
            return Err(EngineError::BonusAlreadyRegistered(id));
        }
        self.bonuses.push(bonus);
        Ok(())
    }

    /// Remove a bonus, returning it
    pub fn unregister(&mut self, id: &BonusId) -> EngineResult<SharedBonus> {
        let idx = self
            .bonuses
            .iter()
            .position(|b| &b.id() == id)
            .ok_or_else(|| EngineError::BonusNotFound(id.clone()))?;
        Ok(self.bonuses.remove(idx))
    }

    /// Get a bonus by id
    pub fn get(&self, id: &BonusId) -> Option<&SharedBonus> {
        self.bonuses.iter().find(|b| &b.id() == id)
    }

    /// Check if a bonus is registered
    pub fn has(&self, id: &BonusId) -> bool {
        self.get(id).is_some()
    }

    /// Number of registered bonuses
    pub fn len(&self) -> usize {
        self.bonuses.len()
    }

    /// No bonuses registered
    pub fn is_empty(&self) -> bool {
        self.bonuses.is_empty()
    }

    /// Ids in registration order
    pub fn ids(&self) -> Vec<BonusId> {
        self.bonuses.iter().map(|b| b.id()).collect()
    }

    pub fn list_all(&self) -> Vec<BonusInfo> {
        self.bonuses.iter().map(|b| b.info()).collect()
    }

    /// Iterate in registration order
    pub fn iter(&self) -> impl Iterator<Item = &SharedBonus> {
        self.bonuses.iter()
    }

    /// Remove every bonus
    pub fn clear(&mut self) {
        self.bonuses.clear();
    }
}

impl std::fmt::Debug for BonusRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BonusRegistry")
            .field("bonuses", &self.ids())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use async_trait::async_trait;

    use super::*;
    use crate::bonus::Bonus;

    struct DummyBonus {
        id: String,
    }

    impl DummyBonus {
        fn shared(id: &str) -> SharedBonus {
            Arc::new(Self { id: id.to_string() })
        }
    }

    #[async_trait]
    impl Bonus for DummyBonus {
        fn id(&self) -> BonusId {
            BonusId::new(&self.id)
        }

        fn name(&self) -> &str {
            &self.id
        }
    }

    #[test]
    fn test_registry_register_keeps_order() {
        let mut registry = BonusRegistry::new();
        registry.register(DummyBonus::shared("b")).unwrap();
        registry.register(DummyBonus::shared("a")).unwrap();
        registry.register(DummyBonus::shared("c")).unwrap();

        let ids: Vec<String> = registry.ids().into_iter().map(|id| id.0).collect();
        assert_eq!(ids, vec!["b", "a", "c"]);
        assert_eq!(registry.len(), 3);
    }

    #[test]
    fn test_registry_rejects_duplicate() {
        let mut registry = BonusRegistry::new();
        registry.register(DummyBonus::shared("fs")).unwrap();
        let err = registry.register(DummyBonus::shared("fs")).unwrap_err();
        assert_eq!(err, EngineError::BonusAlreadyRegistered(BonusId::new("fs")));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_registry_unregister() {
        let mut registry = BonusRegistry::new();
        registry.register(DummyBonus::shared("test")).unwrap();

        let removed = registry.unregister(&BonusId::new("test")).unwrap();
        assert_eq!(removed.name(), "test");
        assert!(registry.is_empty());
        assert!(matches!(
            registry.unregister(&BonusId::new("test")),
            Err(EngineError::BonusNotFound(_))
        ));
    }

    #[test]
    fn test_registry_get() {
        let mut registry = BonusRegistry::new();
        registry.register(DummyBonus::shared("fs")).unwrap();
        assert!(registry.get(&BonusId::new("fs")).is_some());
        assert!(registry.get(&BonusId::new("missing")).is_none());
        assert_eq!(registry.list_all()[0].id, BonusId::new("fs"));
    }
}
