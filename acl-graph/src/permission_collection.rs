//! # Permission Collections
//!
//! Ordered sets of [`Permission`]s with wildcard-aware resolution.
//! Resolution is order-sensitive: the first rule that is about the queried
//! action and resource decides, whether it grants or denies.

use std::cmp::Ordering;

use serde_json::Value;
use tracing::{debug, trace};

use crate::assertion::Assertion;
use crate::collection::{Collection, CollectionItem};
use crate::config::Wildcards;
use crate::error::{AclError, AclResult};
use crate::permission::{Permission, PermissionSpec};

/// Ordered, value-deduplicated collection of permissions.
///
/// # Example
///
/// ```
/// use acl_graph::{Permission, PermissionCollection};
///
/// let rules = PermissionCollection::new();
/// rules.add(Permission::deny("delete", "blog-post"));
/// rules.add(Permission::new("*", "*"));
///
/// assert!(!rules.is_allowed("delete", "blog-post", None, &[]));
/// assert!(rules.is_allowed("read", "blog-post", None, &[]));
/// ```
pub type PermissionCollection = Collection<Permission>;

impl CollectionItem for Permission {
    const COLLECTION_NAME: &'static str = "PermissionCollection";
}

/// Default ordering for [`PermissionCollection::sort`]: resource, then
/// action, then allow flag with denies first.
pub fn default_permission_order(a: &Permission, b: &Permission) -> Ordering {
    a.resource()
        .cmp(b.resource())
        .then_with(|| a.action().cmp(b.action()))
        .then_with(|| a.allows().cmp(&b.allows()))
}

impl Collection<Permission> {
    /// Check whether a value-equal permission is stored.
    pub fn has_permission(&self, permission: &Permission) -> bool {
        self.has(permission)
    }

    /// Check whether this collection grants `action` on `resource`.
    ///
    /// Rules are scanned in collection order. The first rule that applies
    /// to the pair (by name or wildcard) decides the outcome through its
    /// own [`Permission::is_allowed`]; later rules are never consulted.
    /// Returns `false` when no rule applies.
    pub fn is_allowed(
        &self,
        action: &str,
        resource: &str,
        assertion: Option<&Assertion>,
        args: &[Value],
    ) -> bool {
        for permission in self {
            if !permission.applies_to(action, resource) {
                continue;
            }
            let allowed = permission.is_allowed(action, resource, assertion, args);
            trace!(
                action = %action,
                resource = %resource,
                rule = %permission,
                allowed,
                "Permission rule decided access"
            );
            return allowed;
        }

        trace!(action = %action, resource = %resource, "No permission rule applies");
        false
    }

    /// Sort with [`default_permission_order`].
    pub fn sort(&self) {
        self.sort_by(default_permission_order);
    }

    /// Find the first permission matching `action` and `resource`.
    ///
    /// Matching is case-insensitive and literal (stored wildcards are not
    /// expanded). An empty argument leaves that dimension unconstrained; if
    /// both are empty nothing matches.
    pub fn find_one(&self, action: &str, resource: &str) -> Option<Permission> {
        self.find_bounded(action, resource, 1).first()
    }

    /// Find every permission matching `action` and `resource`, with the
    /// same rules as [`find_one`](Self::find_one).
    pub fn find_all(&self, action: &str, resource: &str) -> PermissionCollection {
        self.find_bounded(action, resource, self.count())
    }

    fn find_bounded(&self, action: &str, resource: &str, limit: usize) -> PermissionCollection {
        let found = PermissionCollection::new();
        if action.is_empty() && resource.is_empty() {
            return found;
        }

        let action = action.to_lowercase();
        let resource = resource.to_lowercase();
        for permission in self {
            if found.count() >= limit {
                break;
            }
            let action_matches = action.is_empty() || permission.action() == action;
            let resource_matches = resource.is_empty() || permission.resource() == resource;
            if action_matches && resource_matches {
                found.add(permission);
            }
        }
        found
    }

    /// Build a collection from loosely typed values with the default
    /// wildcards. See [`try_from_values_with`](Self::try_from_values_with).
    pub fn try_from_values<I>(values: I) -> AclResult<Self>
    where
        I: IntoIterator<Item = Value>,
    {
        Self::try_from_values_with(values, &Wildcards::default())
    }

    /// Build a collection from values shaped like [`PermissionSpec`]
    /// (`{"action": .., "resource": .., "allow": ..}`).
    ///
    /// Fails with [`AclError::InvalidItemType`] on the first value that is
    /// not a permission description.
    pub fn try_from_values_with<I>(values: I, wildcards: &Wildcards) -> AclResult<Self>
    where
        I: IntoIterator<Item = Value>,
    {
        let collection = Self::new();
        for value in values {
            let rendered = value.to_string();
            let spec: PermissionSpec = serde_json::from_value(value).map_err(|e| {
                debug!(item = %rendered, error = %e, "Rejected permission item");
                AclError::InvalidItemType {
                    collection: Permission::COLLECTION_NAME,
                    item: rendered.clone(),
                    reason: e.to_string(),
                }
            })?;
            collection.add(spec.into_permission(wildcards));
        }
        Ok(collection)
    }
}
