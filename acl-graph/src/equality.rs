//! Value-equality contract shared by everything a collection can hold.

/// Equality over an item's semantic fields rather than its identity.
///
/// Collections rely on this trait alone for membership and de-duplication:
/// two distinct handles that are value-equal occupy the same slot.
pub trait ValueEquatable {
    /// Check whether `other` is value-equal to `self`.
    fn is_equal_to(&self, other: &Self) -> bool;
}
