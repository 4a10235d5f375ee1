//! Load statistics.
//!
//! Process-wide counters incremented on every create/add call. Purely
//! observational: never read back by construction logic. Breakdown maps are
//! BTreeMaps so snapshots iterate deterministically.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Counters for one conversion run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoadStats {
    concepts: u64,
    clones: u64,
    descriptions: BTreeMap<String, u64>,
    relationships: BTreeMap<String, u64>,
    refset_members: BTreeMap<String, u64>,
    annotations: BTreeMap<String, u64>,
}

impl LoadStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_concept(&mut self) {
        self.concepts += 1;
    }

    pub fn add_clone(&mut self) {
        self.clones += 1;
    }

    pub fn add_description(&mut self, label: impl Into<String>) {
        *self.descriptions.entry(label.into()).or_default() += 1;
    }

    pub fn add_relationship(&mut self, label: impl Into<String>) {
        *self.relationships.entry(label.into()).or_default() += 1;
    }

    pub fn add_refset_member(&mut self, label: impl Into<String>) {
        *self.refset_members.entry(label.into()).or_default() += 1;
    }

    pub fn add_annotation(&mut self, label: impl Into<String>) {
        *self.annotations.entry(label.into()).or_default() += 1;
    }

    pub fn concepts(&self) -> u64 {
        self.concepts
    }

    pub fn clones(&self) -> u64 {
        self.clones
    }

    /// A serializable copy of the current counters.
    pub fn snapshot(&self) -> LoadStats {
        self.clone()
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Total descriptions across all labels.
    pub fn description_total(&self) -> u64 {
        self.descriptions.values().sum()
    }

    /// Total relationships across all labels.
    pub fn relationship_total(&self) -> u64 {
        self.relationships.values().sum()
    }

    /// Total refset members across all labels.
    pub fn refset_member_total(&self) -> u64 {
        self.refset_members.values().sum()
    }

    /// Total annotations across all labels.
    pub fn annotation_total(&self) -> u64 {
        self.annotations.values().sum()
    }
}
