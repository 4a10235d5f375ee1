//! # Termforge Loader
//!
//! The caller-facing construction surface: typed property groups, the
//! concept builder, and the metadata assembler.
//!
//! A conversion run declares its recurring source attributes once as
//! [`PropertyGroup`]s, lets [`ConceptBuilder::assemble`] emit that registry
//! as first-class concepts, and then drives `create_*`/`add_*` calls for the
//! content itself. Every identifier the caller does not supply is derived
//! deterministically, so re-running the same conversion produces
//! byte-identical output.
//!
//! ```text
//! PropertyGroup      ← declared families of source attributes
//!     │
//! ConceptBuilder     ← create/add calls → populated concepts
//!     │   assemble() ← registry emitted as self-describing concepts
//! ConceptSink        ← finished concepts, written once each
//! ```

pub mod builder;
pub mod metadata;
pub mod properties;

pub use builder::ConceptBuilder;
pub use properties::{
    DEFINITION_BAND, FSN_BAND, GroupKind, Property, PropertyGroup, PropertySpec, SYNONYM_BAND,
    ValueProperty,
};
