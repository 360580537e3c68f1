//! Ordered, value-deduplicated collections of entities.

use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use crate::collection::{Collection, CollectionItem};
use crate::entity::Entity;
use crate::error::{AclError, AclResult};

/// Ordered collection of entities, unique by id.
///
/// Used both for an entity's direct parents and for ancestor sets.
pub type EntityCollection = Collection<Entity>;

impl CollectionItem for Entity {
    const COLLECTION_NAME: &'static str = "EntityCollection";
}

#[derive(Deserialize)]
#[serde(untagged)]
enum EntityValue {
    Id(String),
    Object { id: String },
}

impl Collection<Entity> {
    /// Get the entity whose id matches `id` case-insensitively.
    pub fn get_by_id(&self, id: &str) -> Option<Entity> {
        let id = id.to_lowercase();
        self.items().into_iter().find(|entity| entity.id() == id)
    }

    /// Check whether an entity with `id` is stored.
    pub fn has_id(&self, id: &str) -> bool {
        self.get_by_id(id).is_some()
    }

    /// Ids in iteration order.
    pub fn ids(&self) -> Vec<String> {
        self.items()
            .iter()
            .map(|entity| entity.id().to_string())
            .collect()
    }

    /// Build a collection of fresh entities from ids given either as
    /// strings or as `{"id": ..}` objects.
    ///
    /// Fails with [`AclError::InvalidItemType`] on a value of any other
    /// shape, or [`AclError::EmptyId`] on a blank id.
    pub fn try_from_values<I>(values: I) -> AclResult<Self>
    where
        I: IntoIterator<Item = Value>,
    {
        let collection = Self::new();
        for value in values {
            let rendered = value.to_string();
            let id = match serde_json::from_value::<EntityValue>(value) {
                Ok(EntityValue::Id(id)) | Ok(EntityValue::Object { id }) => id,
                Err(_) => {
                    debug!(item = %rendered, "Rejected entity item");
                    return Err(AclError::InvalidItemType {
                        collection: Entity::COLLECTION_NAME,
                        item: rendered,
                        reason: "expected an id string or an object with an \"id\" field"
                            .to_string(),
                    });
                }
            };
            collection.add(Entity::new(&id)?);
        }
        Ok(collection)
    }

    /// Remove the entity with `id`, if present.
    pub fn remove_id(&self, id: &str) -> Option<Entity> {
        let id = id.to_lowercase();
        let key = self
            .entries()
            .into_iter()
            .find(|(_, entity)| entity.id() == id)
            .map(|(key, _)| key)?;
        self.remove_key(&key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collection::CollectionKey;
    use serde_json::json;

    #[test]
    fn test_add_dedups_by_id() {
        let entities = EntityCollection::new();
        let first = Entity::new("admin").unwrap();
        let second = Entity::new("ADMIN").unwrap();
        entities.add(first.clone());
        let key = entities.add(second.clone());

        assert_eq!(entities.count(), 1);
        assert_eq!(key, CollectionKey::Index(0));
        assert!(entities.get(&key).unwrap().ptr_eq(&second));
    }

    #[test]
    fn test_lookup_by_id() {
        let entities = EntityCollection::from_items(vec![
            Entity::new("admin").unwrap(),
            Entity::new("editor").unwrap(),
        ]);
        assert!(entities.has_id("Editor"));
        assert!(!entities.has_id("guest"));
        assert_eq!(entities.get_by_id("ADMIN").unwrap().id(), "admin");
        assert_eq!(entities.ids(), vec!["admin", "editor"]);
    }

    #[test]
    fn test_remove_id() {
        let entities = EntityCollection::from_items(vec![
            Entity::new("admin").unwrap(),
            Entity::new("editor").unwrap(),
        ]);
        assert!(entities.remove_id("Admin").is_some());
        assert!(entities.remove_id("admin").is_none());
        assert_eq!(entities.ids(), vec!["editor"]);
    }

    #[test]
    fn test_try_from_values() {
        let entities =
            EntityCollection::try_from_values(vec![json!("admin"), json!({"id": "Editor"})]).unwrap();
        assert_eq!(entities.ids(), vec!["admin", "editor"]);
    }

    #[test]
    fn test_try_from_values_rejects_invalid_items() {
        let err = EntityCollection::try_from_values(vec![json!("admin"), json!(42)]).unwrap_err();
        assert_eq!(err.error_code(), "INVALID_ITEM_TYPE");
        assert!(err.to_string().contains("42"));

        let err = EntityCollection::try_from_values(vec![json!("   ")]).unwrap_err();
        assert_eq!(err.error_code(), "EMPTY_ID");
    }
}
