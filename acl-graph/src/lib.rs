//! # ACL Graph
//!
//! An in-memory access-control model: entities, permissions and the
//! inheritance graph through which entities acquire permissions from their
//! ancestors.
//!
//! ## Overview
//!
//! - **Permissions**: one (action, resource, allow) rule each, optionally
//!   refined by an [`Assertion`] evaluated at query time
//! - **Permission collections**: ordered, unique-by-value rule lists with
//!   first-match resolution
//! - **Entities**: users, roles or groups with direct permissions and
//!   direct parents
//! - **Resolution**: ancestor walks, inherited permission aggregation and
//!   cycle prevention
//!
//! ## Architecture
//!
//! ```text
//! Permission            = action + resource + allow [+ assertion]
//! PermissionCollection  = ordered Permission list, unique by (action, resource)
//! Entity                = id + PermissionCollection + EntityCollection (parents)
//! EntityCollection      = ordered Entity list, unique by id
//! ```
//!
//! Items are compared by value ([`ValueEquatable`]), never by identity.
//! Adding a value-equal item to a collection replaces the stored one at the
//! same key.
//!
//! ## Usage
//!
//! ```rust
//! use acl_graph::{Entity, Permission};
//!
//! let super_admin = Entity::new("super-admin").unwrap();
//! super_admin.add_permission(Permission::new("edit", "blog-post"));
//!
//! let admin = Entity::new("admin").unwrap();
//! admin.add_parent(&super_admin).unwrap();
//!
//! let jdoe = Entity::new("jdoe").unwrap();
//! jdoe.add_parent(&admin).unwrap();
//! assert!(jdoe.is_allowed("edit", "blog-post", None, &[]));
//!
//! jdoe.remove_parent_if_exists(&admin);
//! assert!(!jdoe.is_allowed("edit", "blog-post", None, &[]));
//! ```
//!
//! ## Resolution order
//!
//! The first rule that is about the queried action and resource decides,
//! whether it grants or denies:
//!
//! ```rust
//! use acl_graph::{Permission, PermissionCollection};
//!
//! let rules = PermissionCollection::new();
//! rules.add(Permission::deny("edit", "post"));
//! rules.add(Permission::new("*", "*"));
//! assert!(!rules.is_allowed("edit", "post", None, &[]));
//! ```
//!
//! ## Threading
//!
//! All types are single-threaded shared handles (`Rc`). Accessors return
//! live collections; hosts needing concurrent access must serialize it
//! themselves, for example with one lock per graph.

pub mod assertion;
pub mod collection;
pub mod config;
pub mod describe;
pub mod entity;
pub mod entity_collection;
pub mod equality;
pub mod error;
pub mod factory;
pub mod permission;
pub mod permission_collection;

// Re-export main types for convenience
pub use assertion::Assertion;
pub use collection::{Collection, CollectionItem, CollectionKey};
pub use config::{AclConfig, Wildcards, DEFAULT_WILDCARD};
pub use describe::Describe;
pub use entity::Entity;
pub use entity_collection::EntityCollection;
pub use equality::ValueEquatable;
pub use error::{AclError, AclResult};
pub use factory::{AclFactory, DefaultAclFactory};
pub use permission::{Permission, PermissionBuilder, PermissionSpec};
pub use permission_collection::{default_permission_order, PermissionCollection};
