//! Error types for chronicle construction.

use crate::chronicle::DynamicKind;
use crate::ident::Identifier;

/// Errors arising from precondition violations during construction.
///
/// All variants are fail-fast and local: a failing call never leaves a
/// partially built record appended to a concept's collections, and the core
/// neither retries nor logs. The decision to continue or abort the
/// surrounding conversion run belongs to the caller.
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    /// A dynamic value sequence violates the registered column shapes.
    #[error(
        "schema mismatch for assemblage {assemblage}: column {column} expects {expected:?}, got {actual:?}"
    )]
    SchemaMismatch {
        assemblage: Identifier,
        column: u32,
        expected: Option<DynamicKind>,
        actual: Option<DynamicKind>,
    },

    /// No column shape was ever registered for the assemblage.
    #[error("assemblage {assemblage} is not registered as a dynamic refset")]
    InvalidRefset { assemblage: Identifier },

    /// A description kind label could not be resolved.
    #[error("unknown description kind: {kind}")]
    UnknownDescriptionKind { kind: String },

    /// A property belongs to the wrong property-type family for the call.
    #[error("property {property} does not belong to a {expected} group")]
    InconsistentGroupType { property: String, expected: String },

    /// A required value was absent.
    #[error("missing required value: {what}")]
    MissingRequiredValue { what: String },

    /// A property name was never registered in the group.
    #[error("property {name} not found in group {group}")]
    PropertyNotFound { group: String, name: String },

    /// A property name was registered twice within one group.
    #[error("property {name} registered twice in group {group}")]
    DuplicateProperty { group: String, name: String },

    /// The external writer refused a finished concept.
    #[error("sink error: {0}")]
    Sink(String),
}
