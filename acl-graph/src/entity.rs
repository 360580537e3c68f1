//! # Entities
//!
//! An entity is an actor in the access-control graph: a user, a role, a
//! group. Each entity holds its own direct permissions and a list of direct
//! parents it inherits permissions from.
//!
//! ## Graph invariants
//!
//! Every mutation keeps two properties of the parent graph:
//!
//! - a parent appears at most once among an entity's direct parents
//!   (value-equality on ids), and
//! - the graph is acyclic: an entity can never become its own ancestor.
//!
//! Because the graph is acyclic, every walk over it terminates. Walks and
//! teardown use an explicit stack so deep inheritance chains do not grow the
//! call stack.

use std::collections::HashSet;
use std::fmt;
use std::rc::Rc;

use serde_json::Value;
use tracing::{debug, warn};

use crate::assertion::Assertion;
use crate::collection::CollectionKey;
use crate::describe::{field_line, indent, is_excluded, Describe};
use crate::entity_collection::EntityCollection;
use crate::equality::ValueEquatable;
use crate::error::{AclError, AclResult};
use crate::permission::Permission;
use crate::permission_collection::PermissionCollection;

/// Characters trimmed before checking that an id is non-empty.
const ID_TRIM_CHARS: &[char] = &[' ', '\t', '\n', '\r', '\0', '\x0B'];

/// A node in the access-control graph.
///
/// `Entity` is a shared handle: cloning it yields another reference to the
/// same node. Two entities are value-equal when their ids match
/// case-insensitively, but distinct instances with the same id stay
/// independent objects.
///
/// # Example
///
/// ```
/// use acl_graph::{Entity, Permission};
///
/// let super_admin = Entity::new("super-admin").unwrap();
/// super_admin.add_permission(Permission::new("edit", "blog-post"));
///
/// let admin = Entity::new("admin").unwrap();
/// admin.add_parent(&super_admin).unwrap();
///
/// let jdoe = Entity::new("jdoe").unwrap();
/// jdoe.add_parent(&admin).unwrap();
///
/// assert!(jdoe.is_allowed("edit", "blog-post", None, &[]));
/// assert!(super_admin.add_parent(&jdoe).is_err());
/// ```
#[derive(Clone)]
pub struct Entity {
    inner: Rc<EntityState>,
}

struct EntityState {
    id: String,
    permissions: PermissionCollection,
    parents: EntityCollection,
}

impl Drop for EntityState {
    // Unwinds the parent chain with a worklist. Only parents owned solely by
    // this chain are emptied before they drop, so each drop stays shallow.
    fn drop(&mut self) {
        let mut pending = self.parents.take_if_unaliased();
        while let Some(parent) = pending.pop() {
            if Rc::strong_count(&parent.inner) == 1 {
                pending.extend(parent.inner.parents.take_if_unaliased());
            }
        }
    }
}

impl Entity {
    /// Create an entity with empty permission and parent collections.
    ///
    /// # Errors
    ///
    /// [`AclError::EmptyId`] if `id` is empty once whitespace is trimmed.
    pub fn new(id: &str) -> AclResult<Self> {
        Self::with_collections(id, PermissionCollection::new(), EntityCollection::new())
    }

    /// Create an entity around existing collections.
    ///
    /// The collections are aliased, not copied: anything else holding them
    /// sees this entity's permission and parent changes, and vice versa.
    ///
    /// # Errors
    ///
    /// - [`AclError::EmptyId`] if `id` is empty once whitespace is trimmed.
    /// - [`AclError::ParentCannotBeChild`] if `parents` already contains an
    ///   entity with this id, or one that descends from it.
    pub fn with_collections(
        id: &str,
        permissions: PermissionCollection,
        parents: EntityCollection,
    ) -> AclResult<Self> {
        if id.trim_matches(ID_TRIM_CHARS).is_empty() {
            return Err(AclError::EmptyId { id: id.to_string() });
        }
        let id = id.to_lowercase();

        for parent in &parents {
            if parent.id() == id || parent.is_child_of_entity_with_id(&id) {
                warn!(entity = %id, parent = %parent.id(), "Rejected injected parent: would create a cycle");
                return Err(AclError::ParentCannotBeChild {
                    entity: id,
                    parent: parent.id().to_string(),
                });
            }
        }

        Ok(Self {
            inner: Rc::new(EntityState {
                id,
                permissions,
                parents,
            }),
        })
    }

    /// The lower-cased id.
    pub fn id(&self) -> &str {
        &self.inner.id
    }

    /// Check if two handles refer to the same entity instance.
    pub fn ptr_eq(&self, other: &Entity) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    // -- Parents ----------------------------------------------------------

    /// Attach `candidate` as a direct parent.
    ///
    /// - If a value-equal entity is already an ancestor (direct or not),
    ///   nothing is appended. Every ancestor slot holding a value-equal but
    ///   different instance is overwritten in place with `candidate`, so the
    ///   whole ancestor subtree converges on one instance.
    /// - Otherwise `candidate` is appended to the direct parents.
    ///
    /// # Errors
    ///
    /// [`AclError::ParentCannotBeChild`] if the change would make any entity
    /// its own ancestor. Nothing is modified in that case.
    pub fn add_parent(&self, candidate: &Entity) -> AclResult<()> {
        if self.get_all_parents().has(candidate) {
            return self.converge_ancestor(candidate);
        }

        if candidate.is_equal_to(self) || candidate.is_child_of(self) {
            warn!(entity = %self.id(), parent = %candidate.id(), "Rejected parent: would create a cycle");
            return Err(self.cycle_error(candidate));
        }

        let key = self.inner.parents.add(candidate.clone());
        debug!(entity = %self.id(), parent = %candidate.id(), key = %key, "Attached parent");
        Ok(())
    }

    /// Attach each entity in `parents`, in order.
    ///
    /// Stops at the first failure; parents attached before it stay attached.
    pub fn add_parents(&self, parents: &EntityCollection) -> AclResult<()> {
        for parent in parents {
            self.add_parent(&parent)?;
        }
        Ok(())
    }

    /// The live collection of direct parents.
    ///
    /// Mutating it bypasses the cycle check in [`add_parent`](Self::add_parent).
    pub fn get_direct_parents(&self) -> EntityCollection {
        self.inner.parents.clone()
    }

    /// Every ancestor, nearest first in depth-first pre-order, one entry per
    /// id (the first one reached).
    pub fn get_all_parents(&self) -> EntityCollection {
        let all = EntityCollection::new();
        let mut seen_ids = HashSet::new();
        let mut expanded = HashSet::new();
        let mut stack: Vec<Entity> = self.inner.parents.items().into_iter().rev().collect();

        while let Some(parent) = stack.pop() {
            if seen_ids.insert(parent.id().to_string()) {
                all.push(parent.clone());
            }
            // One instance always has the same ancestors.
            if !expanded.insert(Rc::as_ptr(&parent.inner)) {
                continue;
            }
            stack.extend(parent.inner.parents.items().into_iter().rev());
        }
        all
    }

    /// Check whether `candidate` is an ancestor of this entity.
    pub fn is_child_of(&self, candidate: &Entity) -> bool {
        self.get_all_parents().has(candidate)
    }

    /// Check whether an entity with `id` is an ancestor of this entity.
    pub fn is_child_of_entity_with_id(&self, id: &str) -> bool {
        self.get_all_parents().has_id(id)
    }

    /// Detach a direct parent value-equal to `parent`. Returns whether one
    /// was removed.
    pub fn remove_parent_if_exists(&self, parent: &Entity) -> bool {
        let removed = self.inner.parents.remove(parent).is_some();
        if removed {
            debug!(entity = %self.id(), parent = %parent.id(), "Detached parent");
        }
        removed
    }

    /// Detach every direct parent value-equal to a member of `parents`.
    pub fn remove_parents_that_exist(&self, parents: &EntityCollection) {
        for parent in parents {
            self.remove_parent_if_exists(&parent);
        }
    }

    // -- Permissions ------------------------------------------------------

    /// Add a direct permission, replacing a value-equal one in place.
    pub fn add_permission(&self, permission: Permission) {
        self.inner.permissions.add(permission);
    }

    /// Add each permission in `permissions`, in order.
    pub fn add_permissions(&self, permissions: &PermissionCollection) {
        for permission in permissions {
            self.add_permission(permission);
        }
    }

    /// The live collection of direct permissions.
    pub fn get_direct_permissions(&self) -> PermissionCollection {
        self.inner.permissions.clone()
    }

    /// Permissions held directly by ancestors.
    ///
    /// Ancestors are visited in [`get_all_parents`](Self::get_all_parents)
    /// order and their permissions in collection order; a permission is only
    /// added when no value-equal one is present yet. When `into` is given
    /// the permissions are accumulated there and the same collection is
    /// returned.
    pub fn get_inherited_permissions(&self, into: Option<PermissionCollection>) -> PermissionCollection {
        let inherited = into.unwrap_or_default();
        for ancestor in &self.get_all_parents() {
            for permission in &ancestor.inner.permissions {
                if !inherited.has(&permission) {
                    inherited.add(permission);
                }
            }
        }
        inherited
    }

    /// Direct and inherited permissions in one collection.
    ///
    /// With `direct_first` the direct permissions come first, otherwise the
    /// inherited ones. Either way a direct permission shadows a value-equal
    /// inherited one. When `into` is given the permissions are accumulated
    /// there and the same collection is returned.
    pub fn get_all_permissions(
        &self,
        direct_first: bool,
        into: Option<PermissionCollection>,
    ) -> PermissionCollection {
        let all = into.unwrap_or_default();
        if direct_first {
            self.add_direct_permissions_to(&all);
            self.get_inherited_permissions(Some(all))
        } else {
            let all = self.get_inherited_permissions(Some(all));
            self.add_direct_permissions_to(&all);
            all
        }
    }

    /// Remove a direct permission value-equal to `permission`. Returns
    /// whether one was removed.
    pub fn remove_permission_if_exists(&self, permission: &Permission) -> bool {
        self.inner.permissions.remove(permission).is_some()
    }

    /// Remove every direct permission value-equal to a member of
    /// `permissions`.
    pub fn remove_permissions_that_exist(&self, permissions: &PermissionCollection) {
        for permission in permissions {
            self.remove_permission_if_exists(&permission);
        }
    }

    /// Check whether this entity may perform `action` on `resource`.
    ///
    /// Resolves over [`get_all_permissions`](Self::get_all_permissions) with
    /// direct permissions first, then applies
    /// [`PermissionCollection::is_allowed`].
    pub fn is_allowed(
        &self,
        action: &str,
        resource: &str,
        assertion: Option<&Assertion>,
        args: &[Value],
    ) -> bool {
        let allowed = self
            .get_all_permissions(true, None)
            .is_allowed(action, resource, assertion, args);
        debug!(entity = %self.id(), action = %action, resource = %resource, allowed, "Resolved access");
        allowed
    }

    // -- Internals --------------------------------------------------------

    fn add_direct_permissions_to(&self, target: &PermissionCollection) {
        for permission in &self.inner.permissions {
            target.add(permission);
        }
    }

    fn cycle_error(&self, candidate: &Entity) -> AclError {
        AclError::ParentCannotBeChild {
            entity: self.id().to_string(),
            parent: candidate.id().to_string(),
        }
    }

    /// Overwrite every ancestor slot holding an instance value-equal to
    /// `candidate` (but not `candidate` itself) with `candidate`.
    ///
    /// This reaches into the parent collections of other entities, so a
    /// call on one entity can change what a different entity's
    /// `get_direct_parents` returns.
    fn converge_ancestor(&self, candidate: &Entity) -> AclResult<()> {
        let mut sites: Vec<(Entity, CollectionKey)> = Vec::new();
        let mut expanded = HashSet::new();
        let mut stack = vec![self.clone()];

        while let Some(owner) = stack.pop() {
            if !expanded.insert(Rc::as_ptr(&owner.inner)) {
                continue;
            }
            for (key, parent) in owner.inner.parents.entries() {
                if parent.is_equal_to(candidate) && !parent.ptr_eq(candidate) {
                    sites.push((owner.clone(), key));
                }
                stack.push(parent);
            }
        }

        if sites.is_empty() {
            debug!(entity = %self.id(), parent = %candidate.id(), "Parent already present");
            return Ok(());
        }

        // The new instance may carry different ancestors than the one it
        // replaces; no owner may end up among them.
        for (owner, _) in &sites {
            if candidate.is_equal_to(owner) || candidate.is_child_of(owner) {
                warn!(
                    entity = %owner.id(),
                    parent = %candidate.id(),
                    "Rejected ancestor replacement: would create a cycle"
                );
                return Err(owner.cycle_error(candidate));
            }
        }

        let rewritten = sites.len();
        for (owner, key) in sites {
            owner.inner.parents.put(candidate.clone(), key);
        }
        debug!(
            entity = %self.id(),
            parent = %candidate.id(),
            rewritten,
            "Replaced equal ancestor instances in place"
        );
        Ok(())
    }
}

impl ValueEquatable for Entity {
    fn is_equal_to(&self, other: &Self) -> bool {
        self.id() == other.id()
    }
}

impl fmt::Debug for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Entity")
            .field("id", &self.inner.id)
            .field("direct_permissions", &self.inner.permissions.count())
            .field("direct_parents", &self.inner.parents.ids())
            .finish()
    }
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl Describe for Entity {
    fn write_description(&self, out: &mut String, depth: usize, excluding: &[&str]) {
        indent(out, depth);
        out.push_str("Entity {\n");
        field_line(out, depth + 1, excluding, "id", format!("{:?}", self.id()));
        if !is_excluded(excluding, "direct_permissions") {
            indent(out, depth + 1);
            out.push_str("direct_permissions: ");
            self.inner.permissions.write_description(out, depth + 1, excluding);
        }
        if !is_excluded(excluding, "direct_parents") {
            indent(out, depth + 1);
            out.push_str("direct_parents: ");
            self.inner.parents.write_description(out, depth + 1, excluding);
        }
        indent(out, depth);
        out.push_str("}\n");
    }
}
