//! # Permissions
//!
//! A permission is a single authorization fact: an action on a resource,
//! either granted or explicitly denied, optionally refined by an
//! [`Assertion`] evaluated at query time.

use std::cell::Cell;
use std::fmt;
use std::rc::Rc;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::assertion::Assertion;
use crate::config::Wildcards;
use crate::describe::{field_line, indent, Describe};
use crate::equality::ValueEquatable;

/// A single (action, resource, allow) rule.
///
/// `Permission` is a shared handle: cloning it yields another reference to
/// the same rule, so the same instance can sit in several collections at
/// once and [`set_allow`](Permission::set_allow) is visible through all of
/// them. Action and resource are lower-cased and fixed for the lifetime of
/// the rule.
///
/// Two permissions are value-equal when their action and resource match;
/// the allow flag and the assertion do not take part, which is what lets a
/// collection replace a rule in place.
///
/// # Example
///
/// ```
/// use acl_graph::Permission;
///
/// let perm = Permission::new("Edit", "Blog-Post");
/// assert_eq!(perm.action(), "edit");
/// assert!(perm.is_allowed("EDIT", "blog-post", None, &[]));
///
/// let wildcard = Permission::new("*", "blog-post");
/// assert!(wildcard.is_allowed("delete", "blog-post", None, &[]));
/// ```
#[derive(Clone)]
pub struct Permission {
    inner: Rc<PermissionState>,
}

struct PermissionState {
    action: String,
    resource: String,
    allow: Cell<bool>,
    assertion: Option<Assertion>,
    bound_args: Vec<Value>,
    wildcards: Wildcards,
}

impl Permission {
    /// Create a granting permission with the default wildcards.
    pub fn new(action: &str, resource: &str) -> Self {
        Self::builder(action, resource).build()
    }

    /// Create a denying permission with the default wildcards.
    pub fn deny(action: &str, resource: &str) -> Self {
        Self::builder(action, resource).allow(false).build()
    }

    /// Start building a permission.
    ///
    /// # Example
    ///
    /// ```
    /// use acl_graph::{Assertion, Permission};
    /// use serde_json::json;
    ///
    /// let perm = Permission::builder("edit", "blog-post")
    ///     .assertion(Assertion::new(|args| args.first() == Some(&json!("jdoe"))))
    ///     .bound_args(vec![json!("jdoe")])
    ///     .build();
    ///
    /// assert!(perm.is_allowed("edit", "blog-post", None, &[]));
    /// assert!(!perm.is_allowed("edit", "blog-post", None, &[json!("asmith")]));
    /// ```
    pub fn builder(action: &str, resource: &str) -> PermissionBuilder {
        PermissionBuilder::new(action, resource)
    }

    /// The lower-cased action.
    pub fn action(&self) -> &str {
        &self.inner.action
    }

    /// The lower-cased resource.
    pub fn resource(&self) -> &str {
        &self.inner.resource
    }

    /// Whether the rule grants (`true`) or denies (`false`).
    pub fn allows(&self) -> bool {
        self.inner.allow.get()
    }

    /// Change the allow flag. Visible through every handle to this rule.
    pub fn set_allow(&self, allow: bool) {
        self.inner.allow.set(allow);
    }

    /// The assertion bound at construction, if any.
    pub fn assertion(&self) -> Option<&Assertion> {
        self.inner.assertion.as_ref()
    }

    /// Default arguments passed to the assertion.
    pub fn bound_args(&self) -> &[Value] {
        &self.inner.bound_args
    }

    /// The wildcard sentinels this rule recognizes.
    pub fn wildcards(&self) -> &Wildcards {
        &self.inner.wildcards
    }

    /// Check if two handles refer to the same rule instance.
    pub fn ptr_eq(&self, other: &Permission) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    /// Check whether this rule is about `action` on `resource`, either by
    /// name or through a wildcard. The allow flag and assertion are not
    /// consulted.
    pub fn applies_to(&self, action: &str, resource: &str) -> bool {
        let state = &self.inner;
        let action_matches = state.wildcards.is_all_actions(&state.action)
            || state.action == action.to_lowercase();
        let resource_matches = state.wildcards.is_all_resources(&state.resource)
            || state.resource == resource.to_lowercase();
        action_matches && resource_matches
    }

    /// Check whether this rule grants `action` on `resource`.
    ///
    /// The rule must apply to the pair, its allow flag must be set, and the
    /// assertion (if any) must hold. An `assertion` passed here overrides the
    /// bound one. The assertion receives `args` when non-empty, otherwise the
    /// bound arguments.
    pub fn is_allowed(
        &self,
        action: &str,
        resource: &str,
        assertion: Option<&Assertion>,
        args: &[Value],
    ) -> bool {
        if !self.applies_to(action, resource) || !self.allows() {
            return false;
        }

        match assertion.or(self.inner.assertion.as_ref()) {
            Some(predicate) => {
                let args = if args.is_empty() {
                    self.bound_args()
                } else {
                    args
                };
                predicate.evaluate(args)
            }
            None => true,
        }
    }
}

impl ValueEquatable for Permission {
    fn is_equal_to(&self, other: &Self) -> bool {
        // Both sides were lower-cased at construction.
        self.action() == other.action() && self.resource() == other.resource()
    }
}

impl fmt::Debug for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Permission")
            .field("action", &self.inner.action)
            .field("resource", &self.inner.resource)
            .field("allow", &self.allows())
            .field("assertion", &self.inner.assertion.is_some())
            .field("bound_args", &self.inner.bound_args)
            .finish()
    }
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let verdict = if self.allows() { "allow" } else { "deny" };
        write!(f, "{}:{} ({})", self.resource(), self.action(), verdict)
    }
}

impl Describe for Permission {
    fn write_description(&self, out: &mut String, depth: usize, excluding: &[&str]) {
        indent(out, depth);
        out.push_str("Permission {\n");
        field_line(out, depth + 1, excluding, "action", format!("{:?}", self.action()));
        field_line(out, depth + 1, excluding, "resource", format!("{:?}", self.resource()));
        field_line(out, depth + 1, excluding, "allow", self.allows());
        let assertion = if self.assertion().is_some() { "set" } else { "none" };
        field_line(out, depth + 1, excluding, "assertion", assertion);
        field_line(out, depth + 1, excluding, "bound_args", Value::from(self.bound_args().to_vec()));
        indent(out, depth);
        out.push_str("}\n");
    }
}

/// Builder for [`Permission`].
#[derive(Debug, Clone)]
pub struct PermissionBuilder {
    action: String,
    resource: String,
    allow: bool,
    assertion: Option<Assertion>,
    bound_args: Vec<Value>,
    wildcards: Wildcards,
}

impl PermissionBuilder {
    fn new(action: &str, resource: &str) -> Self {
        Self {
            action: action.to_lowercase(),
            resource: resource.to_lowercase(),
            allow: true,
            assertion: None,
            bound_args: Vec::new(),
            wildcards: Wildcards::default(),
        }
    }

    /// Set whether the rule grants or denies.
    pub fn allow(mut self, allow: bool) -> Self {
        self.allow = allow;
        self
    }

    /// Attach an assertion.
    pub fn assertion(mut self, assertion: Assertion) -> Self {
        self.assertion = Some(assertion);
        self
    }

    /// Attach an optional assertion.
    pub fn maybe_assertion(mut self, assertion: Option<Assertion>) -> Self {
        self.assertion = assertion;
        self
    }

    /// Set the default assertion arguments.
    pub fn bound_args(mut self, args: Vec<Value>) -> Self {
        self.bound_args = args;
        self
    }

    /// Use custom wildcard sentinels.
    pub fn wildcards(mut self, wildcards: Wildcards) -> Self {
        self.wildcards = Wildcards::new(wildcards.all_actions, wildcards.all_resources);
        self
    }

    /// Build the permission.
    pub fn build(self) -> Permission {
        Permission {
            inner: Rc::new(PermissionState {
                action: self.action,
                resource: self.resource,
                allow: Cell::new(self.allow),
                assertion: self.assertion,
                bound_args: self.bound_args,
                wildcards: self.wildcards,
            }),
        }
    }
}

/// Serializable description of a permission without an assertion.
///
/// Used to bulk-populate collections from loosely typed input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermissionSpec {
    /// Action name.
    pub action: String,
    /// Resource name.
    pub resource: String,
    /// Whether the rule grants. Defaults to `true`.
    #[serde(default = "default_allow")]
    pub allow: bool,
}

fn default_allow() -> bool {
    true
}

impl PermissionSpec {
    /// Build a permission from this description.
    pub fn into_permission(self, wildcards: &Wildcards) -> Permission {
        Permission::builder(&self.action, &self.resource)
            .allow(self.allow)
            .wildcards(wildcards.clone())
            .build()
    }
}

impl From<&Permission> for PermissionSpec {
    fn from(permission: &Permission) -> Self {
        Self {
            action: permission.action().to_string(),
            resource: permission.resource().to_string(),
            allow: permission.allows(),
        }
    }
}
