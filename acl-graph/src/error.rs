//! Error types for access-control graph operations
//!
//! Every failure in this crate is a caller mistake: an empty entity id,
//! a parent edge that would close a cycle, or a bulk-populated collection
//! item that does not describe an entity or permission. None of them is
//! transient, so there is no retry classification.

use thiserror::Error;

/// Access-control graph error types.
#[derive(Debug, Error)]
pub enum AclError {
    /// Entity id is empty once surrounding whitespace is trimmed
    #[error("Entity id must not be empty (got {id:?})")]
    EmptyId {
        /// The raw id that was supplied.
        id: String,
    },

    /// Attaching the parent would make the graph cyclic
    #[error("Parent cannot be child: '{parent}' cannot become a parent of '{entity}' because '{entity}' is already one of its ancestors")]
    ParentCannotBeChild {
        /// Id of the entity the parent was being attached to.
        entity: String,
        /// Id of the rejected parent.
        parent: String,
    },

    /// A bulk-populated collection received an item it cannot hold
    #[error("Invalid item for {collection}: {item} ({reason})")]
    InvalidItemType {
        /// Name of the collection type being populated.
        collection: &'static str,
        /// Rendering of the offending item.
        item: String,
        /// Why the item was rejected.
        reason: String,
    },

    /// Configuration could not be parsed
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Result type for access-control graph operations.
pub type AclResult<T> = Result<T, AclError>;

impl AclError {
    /// Get a stable error code for this error.
    pub fn error_code(&self) -> &'static str {
        match self {
            AclError::EmptyId { .. } => "EMPTY_ID",
            AclError::ParentCannotBeChild { .. } => "PARENT_CANNOT_BE_CHILD",
            AclError::InvalidItemType { .. } => "INVALID_ITEM_TYPE",
            AclError::Config(_) => "CONFIG_ERROR",
        }
    }

    /// Check if this error was caused by the shape of the graph rather than
    /// by malformed input values.
    pub fn is_graph_error(&self) -> bool {
        matches!(self, AclError::ParentCannotBeChild { .. })
    }
}
