//! Caller-supplied predicates that refine a permission at query time.

use std::fmt;
use std::rc::Rc;

use serde_json::Value;

/// A side-effect-free predicate evaluated with positional arguments.
///
/// Arguments are plain JSON values so any caller can marshal its own data
/// into them. Cloning an `Assertion` shares the underlying closure.
///
/// # Example
///
/// ```
/// use acl_graph::Assertion;
/// use serde_json::json;
///
/// let is_owner = Assertion::new(|args| args.first() == args.get(1));
/// assert!(is_owner.evaluate(&[json!("jdoe"), json!("jdoe")]));
/// assert!(!is_owner.evaluate(&[json!("jdoe"), json!("asmith")]));
/// ```
#[derive(Clone)]
pub struct Assertion {
    predicate: Rc<dyn Fn(&[Value]) -> bool>,
}

impl Assertion {
    /// Wrap a predicate.
    pub fn new<F>(predicate: F) -> Self
    where
        F: Fn(&[Value]) -> bool + 'static,
    {
        Self {
            predicate: Rc::new(predicate),
        }
    }

    /// Invoke the predicate.
    pub fn evaluate(&self, args: &[Value]) -> bool {
        (self.predicate)(args)
    }

    /// Check whether two assertions share the same closure.
    pub fn ptr_eq(&self, other: &Assertion) -> bool {
        Rc::ptr_eq(&self.predicate, &other.predicate)
    }
}

impl fmt::Debug for Assertion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Assertion").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_evaluate_with_args() {
        let positive = Assertion::new(|args| args.first().and_then(Value::as_i64).unwrap_or(0) > 0);
        assert!(positive.evaluate(&[json!(3)]));
        assert!(!positive.evaluate(&[json!(-1)]));
        assert!(!positive.evaluate(&[]));
    }

    #[test]
    fn test_clone_shares_closure() {
        let a = Assertion::new(|_| true);
        let b = a.clone();
        let c = Assertion::new(|_| true);
        assert!(a.ptr_eq(&b));
        assert!(!a.ptr_eq(&c));
    }
}
