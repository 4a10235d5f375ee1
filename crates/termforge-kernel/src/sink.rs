//! The writer seam.
//!
//! The physical binary chronicle format is an external collaborator. This
//! core hands each concept to a [`ConceptSink`] at most once, and only after
//! the concept is fully populated. The sink is append-only, sequential, and
//! non-retryable from this side of the boundary.

use crate::chronicle::Concept;
use crate::error::BuildError;

/// Append-only sink for finished concepts.
pub trait ConceptSink {
    fn write(&mut self, concept: &Concept) -> Result<(), BuildError>;
}

/// In-memory sink, for tests and for callers that batch concepts themselves.
#[derive(Debug, Default)]
pub struct MemorySink {
    concepts: Vec<Concept>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn concepts(&self) -> &[Concept] {
        &self.concepts
    }

    pub fn into_concepts(self) -> Vec<Concept> {
        self.concepts
    }
}

impl ConceptSink for MemorySink {
    fn write(&mut self, concept: &Concept) -> Result<(), BuildError> {
        self.concepts.push(concept.clone());
        Ok(())
    }
}
