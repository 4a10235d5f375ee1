//! # Termforge Kernel
//!
//! The chronicle data model and the deterministic machinery underneath it:
//! identifier derivation, revision stamping, the fixed terminology
//! bindings, the writer seam, and load statistics.
//!
//! This crate is **terminology-agnostic**: it does not decide which source
//! rows become which concepts. It only prescribes how finished records are
//! identified, stamped, and handed off.
//!
//! ## Architecture
//!
//! ```text
//! Namespace / Identifier   ← (namespace, ordered string tuple) → stable id
//!     │
//! SessionContext           ← write-once path / default time / namespace
//!     │
//! Concept                  ← attributes + descriptions + relationships
//!     │                       + members + annotations
//! ConceptSink              ← append-only writer boundary
//! ```

pub mod bindings;
pub mod chronicle;
pub mod error;
pub mod ident;
pub mod sink;
pub mod stamp;
pub mod stats;

pub use chronicle::{
    Component, ComponentKind, Concept, ConceptAttributes, Description, DescriptionKind,
    DynamicAnnotation, DynamicColumn, DynamicKind, DynamicValue, LegacyMember, Relationship,
    canonical_annotation_bytes,
};
pub use error::BuildError;
pub use ident::{Identifier, Namespace, PATH_DERIVATION_NAMESPACE, Part, WELL_KNOWN_NAMESPACE};
pub use sink::{ConceptSink, MemorySink};
pub use stamp::{SessionContext, Stamp, Status};
pub use stats::LoadStats;
