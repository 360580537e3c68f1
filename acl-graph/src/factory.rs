//! Construction indirection for the model types.
//!
//! Code that builds entities and permissions on behalf of callers (for
//! example an id-keyed registry) goes through [`AclFactory`] so the way
//! items are created can be swapped without touching that code.

use serde_json::Value;

use crate::assertion::Assertion;
use crate::config::AclConfig;
use crate::entity::Entity;
use crate::entity_collection::EntityCollection;
use crate::error::AclResult;
use crate::permission::Permission;
use crate::permission_collection::PermissionCollection;

/// Builds entities, permissions and their collections.
pub trait AclFactory {
    /// Create an entity with empty collections.
    fn create_entity(&self, id: &str) -> AclResult<Entity>;

    /// Create a permission.
    fn create_permission(
        &self,
        action: &str,
        resource: &str,
        allow: bool,
        assertion: Option<Assertion>,
        bound_args: Vec<Value>,
    ) -> Permission;

    /// Create an empty permission collection.
    fn create_permission_collection(&self) -> PermissionCollection {
        PermissionCollection::new()
    }

    /// Create an empty entity collection.
    fn create_entity_collection(&self) -> EntityCollection {
        EntityCollection::new()
    }

    /// Build a permission collection from loosely typed values.
    fn permissions_from_values(&self, values: Vec<Value>) -> AclResult<PermissionCollection>;
}

/// Factory producing the crate's own types, configured by [`AclConfig`].
///
/// # Example
///
/// ```
/// use acl_graph::{AclConfig, AclFactory, DefaultAclFactory, Wildcards};
///
/// let factory = DefaultAclFactory::with_config(AclConfig::with_wildcards(Wildcards::new("any", "any")));
/// let perm = factory.create_permission("any", "post", true, None, vec![]);
/// assert!(perm.is_allowed("edit", "post", None, &[]));
/// ```
#[derive(Debug, Clone, Default)]
pub struct DefaultAclFactory {
    config: AclConfig,
}

impl DefaultAclFactory {
    /// Create a factory with the default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a factory with a custom configuration.
    pub fn with_config(config: AclConfig) -> Self {
        Self { config }
    }

    /// The configuration in use.
    pub fn config(&self) -> &AclConfig {
        &self.config
    }
}

impl AclFactory for DefaultAclFactory {
    fn create_entity(&self, id: &str) -> AclResult<Entity> {
        Entity::new(id)
    }

    fn create_permission(
        &self,
        action: &str,
        resource: &str,
        allow: bool,
        assertion: Option<Assertion>,
        bound_args: Vec<Value>,
    ) -> Permission {
        Permission::builder(action, resource)
            .allow(allow)
            .maybe_assertion(assertion)
            .bound_args(bound_args)
            .wildcards(self.config.wildcards.clone())
            .build()
    }

    fn permissions_from_values(&self, values: Vec<Value>) -> AclResult<PermissionCollection> {
        PermissionCollection::try_from_values_with(values, &self.config.wildcards)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Wildcards;
    use serde_json::json;

    #[test]
    fn test_default_factory() {
        let factory = DefaultAclFactory::new();
        let entity = factory.create_entity("Admin").unwrap();
        assert_eq!(entity.id(), "admin");
        assert!(factory.create_entity(" ").is_err());

        let perm = factory.create_permission("edit", "post", false, None, vec![]);
        assert!(!perm.allows());
        assert!(factory.create_permission_collection().is_empty());
        assert!(factory.create_entity_collection().is_empty());
    }

    #[test]
    fn test_factory_applies_configured_wildcards() {
        let config = AclConfig::with_wildcards(Wildcards::new("ALL", "everything"));
        let factory = DefaultAclFactory::with_config(config);

        let perm = factory.create_permission("all", "everything", true, None, vec![]);
        assert!(perm.is_allowed("edit", "post", None, &[]));

        let rules = factory
            .permissions_from_values(vec![json!({"action": "all", "resource": "post"})])
            .unwrap();
        assert!(rules.is_allowed("delete", "post", None, &[]));
        assert!(!rules.is_allowed("delete", "comment", None, &[]));
    }

    #[test]
    fn test_factory_passes_assertion_and_bound_args() {
        let factory = DefaultAclFactory::new();
        let perm = factory.create_permission(
            "edit",
            "post",
            true,
            Some(Assertion::new(|args| args == [json!(7)])),
            vec![json!(7)],
        );
        assert!(perm.is_allowed("edit", "post", None, &[]));
        assert!(!perm.is_allowed("edit", "post", None, &[json!(8)]));
    }

    struct AuditingFactory;

    impl AclFactory for AuditingFactory {
        fn create_entity(&self, id: &str) -> AclResult<Entity> {
            let entity = Entity::new(id)?;
            entity.add_permission(Permission::new("read", "audit-log"));
            Ok(entity)
        }

        fn create_permission(
            &self,
            action: &str,
            resource: &str,
            allow: bool,
            _assertion: Option<Assertion>,
            _bound_args: Vec<Value>,
        ) -> Permission {
            Permission::builder(action, resource).allow(allow).build()
        }

        fn permissions_from_values(&self, values: Vec<Value>) -> AclResult<PermissionCollection> {
            PermissionCollection::try_from_values(values)
        }
    }

    #[test]
    fn test_custom_factory_substitutes_construction() {
        let factory: &dyn AclFactory = &AuditingFactory;
        let entity = factory.create_entity("jdoe").unwrap();
        assert!(entity.is_allowed("read", "audit-log", None, &[]));
    }
}
