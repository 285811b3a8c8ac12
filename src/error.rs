//! Error types with fix suggestions
//!
//! Error code ranges:
//! - NW-001-009: Scene tree errors
//! - NW-010-019: Binding resolution errors
//! - NW-020-029: Signal wiring errors
//! - NW-030-039: Configuration errors

use thiserror::Error;

use crate::tree::NodeId;

pub type Result<T> = std::result::Result<T, BindError>;

/// Trait for errors that provide fix suggestions
pub trait FixSuggestion {
    fn fix_suggestion(&self) -> Option<&str>;
}

/// All error variants are part of the public API.
#[derive(Error, Debug)]
pub enum BindError {
    // ─────────────────────────────────────────────────────────────
    // Scene tree errors (NW-001 to NW-007)
    // ─────────────────────────────────────────────────────────────
    #[error("NW-001: Node {0} does not exist (never created or already freed)")]
    InvalidNode(NodeId),

    #[error("NW-002: Parent '{parent}' already has a child named '{name}'")]
    DuplicateName { parent: String, name: String },

    #[error("NW-003: Invalid node name '{name}'")]
    InvalidNodeName { name: String },

    #[error("NW-004: Node '{owner}' cannot own '{node}' (owner must be an ancestor)")]
    InvalidOwner { node: String, owner: String },

    #[error("NW-005: Unique name '%{name}' is already used in the scope of '{owner}'")]
    UniqueNameConflict { name: String, owner: String },

    #[error("NW-006: Node '{node}' needs an owner before it can have a unique name")]
    UniqueNameWithoutOwner { node: String },

    #[error("NW-007: The tree root cannot be freed")]
    CannotFreeRoot,

    // ─────────────────────────────────────────────────────────────
    // Binding resolution errors (NW-010 to NW-015)
    // ─────────────────────────────────────────────────────────────
    #[error(
        "NW-010: {type_name}.{member} - unable to find node with the following names: {}",
        .candidates.join(",")
    )]
    BindingNotFound {
        type_name: String,
        member: String,
        candidates: Vec<String>,
    },

    #[error("NW-011: {type_name}.{member} - cannot set value of type {found} on member type {expected}")]
    TypeMismatch {
        type_name: String,
        member: String,
        expected: String,
        found: String,
    },

    #[error("NW-012: {type_name}.{member} resolves through nonexistent member '{target}'")]
    MissingTarget {
        type_name: String,
        member: String,
        target: String,
    },

    #[error("NW-013: Failed to load resource '{resource}' into {type_name}.{member}: {reason}")]
    ResourceLoadFailure {
        type_name: String,
        member: String,
        resource: String,
        reason: String,
    },

    #[error(
        "NW-014: {type_name}.{member} - singleton not found with the following names: {}",
        .candidates.join(",")
    )]
    SingletonNotFound {
        type_name: String,
        member: String,
        candidates: Vec<String>,
    },

    // ─────────────────────────────────────────────────────────────
    // Signal wiring errors (NW-020)
    // ─────────────────────────────────────────────────────────────
    #[error("NW-020: Handler {type_name}.{method} - '{source_member}' is a nonexistent member or does not hold a node")]
    MissingSource {
        type_name: String,
        method: String,
        source_member: String,
    },

    // ─────────────────────────────────────────────────────────────
    // Configuration errors (NW-030)
    // ─────────────────────────────────────────────────────────────
    #[error("NW-030: Configuration error: {reason}")]
    Config { reason: String },
}

impl FixSuggestion for BindError {
    fn fix_suggestion(&self) -> Option<&str> {
        match self {
            BindError::InvalidNode(_) => Some("Keep node ids only while the node is alive"),
            BindError::DuplicateName { .. } => Some("Give sibling nodes distinct names"),
            BindError::InvalidNodeName { .. } => {
                Some("Node names must be non-empty and cannot contain / : . @ % \"")
            }
            BindError::InvalidOwner { .. } => Some("Set the owner to the scene root that contains the node"),
            BindError::UniqueNameConflict { .. } => {
                Some("Unique names must be unique within the owning scene")
            }
            BindError::UniqueNameWithoutOwner { .. } => Some("Call set_owner before set_unique_name"),
            BindError::CannotFreeRoot => Some("Free the root's children instead"),
            BindError::BindingNotFound { .. } => {
                Some("Fix the node path, rename the node to match the member, or mark it unique (%Name)")
            }
            BindError::TypeMismatch { .. } => {
                Some("Change the member's declared type or point the binding at a compatible node")
            }
            BindError::MissingTarget { .. } => {
                Some("Declare the target member on the same type before referencing it")
            }
            BindError::ResourceLoadFailure { .. } => Some("Check the resource id and the resource root"),
            BindError::SingletonNotFound { .. } => {
                Some("Parent the singleton under the registry root with a matching name")
            }
            BindError::MissingSource { .. } => {
                Some("Bind the source member to a node before its handlers are wired")
            }
            BindError::Config { .. } => Some("Check the resolver configuration file and NODEWIRE_* variables"),
        }
    }
}

/// Errors raised by resource loaders
#[derive(Error, Debug)]
pub enum ResourceError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid resource file: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Unsupported resource id '{id}' (expected res://...)")]
    InvalidId { id: String },
}
