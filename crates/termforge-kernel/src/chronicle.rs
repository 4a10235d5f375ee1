//! The concept chronicle data model.
//!
//! A concept holds one attribute record plus four independently populated
//! ordered collections: descriptions, relationships, legacy refset members,
//! and dynamic members. Descriptions, relationships, and members are
//! themselves components that can carry annotations.
//!
//! Concepts are produced once, mutated only during the single construction
//! pass that produced them, and then handed to the writer. The physical
//! binary layout of a written concept is an external concern.

use crate::bindings;
use crate::error::BuildError;
use crate::ident::Identifier;
use crate::stamp::Stamp;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Description kind. Exactly one description per concept is the
/// FullySpecifiedName, and it is always preferred.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DescriptionKind {
    FullySpecifiedName,
    Synonym,
    Definition,
}

impl DescriptionKind {
    /// The fixed description-type identifier for this kind.
    pub fn type_id(&self) -> Identifier {
        match self {
            Self::FullySpecifiedName => bindings::FULLY_SPECIFIED_NAME,
            Self::Synonym => bindings::SYNONYM,
            Self::Definition => bindings::DEFINITION,
        }
    }

    /// Stable label used in identifier derivation and statistics.
    pub fn label(&self) -> &'static str {
        match self {
            Self::FullySpecifiedName => "FSN",
            Self::Synonym => "SYNONYM",
            Self::Definition => "DEFINITION",
        }
    }
}

impl FromStr for DescriptionKind {
    type Err = BuildError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "FSN" | "FullySpecifiedName" => Ok(Self::FullySpecifiedName),
            "SYNONYM" | "Synonym" => Ok(Self::Synonym),
            "DEFINITION" | "Definition" => Ok(Self::Definition),
            other => Err(BuildError::UnknownDescriptionKind {
                kind: other.to_string(),
            }),
        }
    }
}

/// Runtime type of a dynamic annotation column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DynamicKind {
    Uuid,
    Text,
    Integer,
    Boolean,
}

/// A typed value carried by a dynamic annotation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DynamicValue {
    Uuid(Identifier),
    Text(String),
    Integer(i64),
    Boolean(bool),
}

impl DynamicValue {
    pub fn kind(&self) -> DynamicKind {
        match self {
            Self::Uuid(_) => DynamicKind::Uuid,
            Self::Text(_) => DynamicKind::Text,
            Self::Integer(_) => DynamicKind::Integer,
            Self::Boolean(_) => DynamicKind::Boolean,
        }
    }

    /// Append this value's canonical byte encoding, used for content-hash
    /// identifier derivation. Tagged per variant so value sequences of
    /// different shapes never collide.
    pub fn encode(&self, buf: &mut Vec<u8>) {
        match self {
            Self::Uuid(id) => {
                buf.push(0u8);
                buf.extend_from_slice(id.as_uuid().as_bytes());
            }
            Self::Text(s) => {
                buf.push(1u8);
                buf.extend_from_slice(&(s.len() as u64).to_be_bytes());
                buf.extend_from_slice(s.as_bytes());
            }
            Self::Integer(i) => {
                buf.push(2u8);
                buf.extend_from_slice(&i.to_be_bytes());
            }
            Self::Boolean(b) => {
                buf.push(3u8);
                buf.push(u8::from(*b));
            }
        }
    }
}

/// Declared shape of one dynamic-annotation column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DynamicColumn {
    pub position: u32,
    pub column_id: Identifier,
    pub kind: DynamicKind,
    pub required: bool,
}

impl DynamicColumn {
    pub fn new(position: u32, column_id: Identifier, kind: DynamicKind, required: bool) -> Self {
        Self {
            position,
            column_id,
            kind,
            required,
        }
    }
}

/// A dynamic annotation: (component, assemblage, ordered typed values).
///
/// Values are `None` when the annotation only marks membership.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DynamicAnnotation {
    pub id: Identifier,
    pub component: Identifier,
    pub assemblage: Identifier,
    pub values: Option<Vec<DynamicValue>>,
    pub stamp: Stamp,
}

/// Canonical identity material for a dynamic annotation's derived id.
pub fn canonical_annotation_bytes(
    component: Identifier,
    assemblage: Identifier,
    values: Option<&[DynamicValue]>,
) -> Vec<u8> {
    let mut buf = Vec::with_capacity(64);
    buf.extend_from_slice(component.as_uuid().as_bytes());
    buf.extend_from_slice(assemblage.as_uuid().as_bytes());
    match values {
        Some(vs) => {
            buf.push(1u8);
            buf.extend_from_slice(&(vs.len() as u64).to_be_bytes());
            for v in vs {
                v.encode(&mut buf);
            }
        }
        None => buf.push(0u8),
    }
    buf
}

/// A legacy-style refset membership: (target, member-type, optional value).
///
/// Attached either to a refset concept's member list or, as a legacy
/// annotation, to an individual component (dialect acceptability).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LegacyMember {
    pub id: Identifier,
    pub refset: Identifier,
    pub target: Identifier,
    pub member_type: Identifier,
    pub value: Option<i64>,
    pub stamp: Stamp,
    pub annotations: Vec<DynamicAnnotation>,
    pub legacy_annotations: Vec<LegacyMember>,
}

/// Text attached to a concept.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Description {
    pub id: Identifier,
    pub concept: Identifier,
    pub text: String,
    pub kind: DescriptionKind,
    pub lang: String,
    pub stamp: Stamp,
    pub annotations: Vec<DynamicAnnotation>,
    pub legacy_annotations: Vec<LegacyMember>,
}

/// A directed edge from a source concept to a target identifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Relationship {
    pub id: Identifier,
    pub source: Identifier,
    pub target: Identifier,
    pub kind: Identifier,
    pub characteristic: Identifier,
    pub refinability: Identifier,
    pub group: i32,
    pub stamp: Stamp,
    pub annotations: Vec<DynamicAnnotation>,
    pub legacy_annotations: Vec<LegacyMember>,
}

/// The attribute record of a concept. The identifier is immutable once
/// assigned.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConceptAttributes {
    id: Identifier,
    pub defined: bool,
    pub stamp: Stamp,
    pub annotations: Vec<DynamicAnnotation>,
    pub legacy_annotations: Vec<LegacyMember>,
}

impl ConceptAttributes {
    pub fn new(id: Identifier, defined: bool, stamp: Stamp) -> Self {
        Self {
            id,
            defined,
            stamp,
            annotations: Vec::new(),
            legacy_annotations: Vec::new(),
        }
    }

    pub fn id(&self) -> Identifier {
        self.id
    }
}

/// A concept chronicle: the unit of the graph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Concept {
    attributes: ConceptAttributes,
    pub descriptions: Vec<Description>,
    pub relationships: Vec<Relationship>,
    pub members: Vec<LegacyMember>,
    pub dynamic_members: Vec<DynamicAnnotation>,
    annotation_style: Option<bool>,
}

impl Concept {
    pub fn new(attributes: ConceptAttributes) -> Self {
        Self {
            attributes,
            descriptions: Vec::new(),
            relationships: Vec::new(),
            members: Vec::new(),
            dynamic_members: Vec::new(),
            annotation_style: None,
        }
    }

    pub fn id(&self) -> Identifier {
        self.attributes.id()
    }

    pub fn attributes(&self) -> &ConceptAttributes {
        &self.attributes
    }

    pub fn attributes_mut(&mut self) -> &mut ConceptAttributes {
        &mut self.attributes
    }

    /// Whether memberships live on the targets (`true`) or on this refset
    /// concept (`false`). Unset until the first membership is recorded.
    pub fn annotation_style(&self) -> Option<bool> {
        self.annotation_style
    }

    pub fn set_annotation_style(&mut self, annotation_style: bool) {
        self.annotation_style = Some(annotation_style);
    }
}

/// Which component family a record belongs to; used for statistics labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComponentKind {
    ConceptAttributes,
    Description,
    Relationship,
    Member,
}

impl ComponentKind {
    pub fn label(&self) -> &'static str {
        match self {
            Self::ConceptAttributes => "Concept",
            Self::Description => "Description",
            Self::Relationship => "Relationship",
            Self::Member => "Member",
        }
    }
}

/// The attachment seam shared by every record that can carry annotations.
pub trait Component {
    fn component_id(&self) -> Identifier;
    fn component_time(&self) -> DateTime<Utc>;
    fn component_kind(&self) -> ComponentKind;
    fn annotations_mut(&mut self) -> &mut Vec<DynamicAnnotation>;
    fn legacy_annotations_mut(&mut self) -> &mut Vec<LegacyMember>;
}

impl Component for ConceptAttributes {
    fn component_id(&self) -> Identifier {
        self.id()
    }

    fn component_time(&self) -> DateTime<Utc> {
        self.stamp.time
    }

    fn component_kind(&self) -> ComponentKind {
        ComponentKind::ConceptAttributes
    }

    fn annotations_mut(&mut self) -> &mut Vec<DynamicAnnotation> {
        &mut self.annotations
    }

    fn legacy_annotations_mut(&mut self) -> &mut Vec<LegacyMember> {
        &mut self.legacy_annotations
    }
}

impl Component for Description {
    fn component_id(&self) -> Identifier {
        self.id
    }

    fn component_time(&self) -> DateTime<Utc> {
        self.stamp.time
    }

    fn component_kind(&self) -> ComponentKind {
        ComponentKind::Description
    }

    fn annotations_mut(&mut self) -> &mut Vec<DynamicAnnotation> {
        &mut self.annotations
    }

    fn legacy_annotations_mut(&mut self) -> &mut Vec<LegacyMember> {
        &mut self.legacy_annotations
    }
}

impl Component for LegacyMember {
    fn component_id(&self) -> Identifier {
        self.id
    }

    fn component_time(&self) -> DateTime<Utc> {
        self.stamp.time
    }

    fn component_kind(&self) -> ComponentKind {
        ComponentKind::Member
    }

    fn annotations_mut(&mut self) -> &mut Vec<DynamicAnnotation> {
        &mut self.annotations
    }

    fn legacy_annotations_mut(&mut self) -> &mut Vec<LegacyMember> {
        &mut self.legacy_annotations
    }
}

impl Component for Relationship {
    fn component_id(&self) -> Identifier {
        self.id
    }

    fn component_time(&self) -> DateTime<Utc> {
        self.stamp.time
    }

    fn component_kind(&self) -> ComponentKind {
        ComponentKind::Relationship
    }

    fn annotations_mut(&mut self) -> &mut Vec<DynamicAnnotation> {
        &mut self.annotations
    }

    fn legacy_annotations_mut(&mut self) -> &mut Vec<LegacyMember> {
        &mut self.legacy_annotations
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ident::Namespace;
    use crate::stamp::{SessionContext, Status};
    use chrono::TimeZone;

    fn stamp() -> Stamp {
        let ns = Namespace::from_seed("test");
        let ctx = SessionContext::new(
            ns,
            ns.derive_one("path"),
            Utc.with_ymd_and_hms(2015, 3, 1, 0, 0, 0).unwrap(),
        );
        ctx.stamp(Some(Status::Active), None)
    }

    #[test]
    fn description_kind_round_trips_through_labels() {
        for kind in [
            DescriptionKind::FullySpecifiedName,
            DescriptionKind::Synonym,
            DescriptionKind::Definition,
        ] {
            assert_eq!(kind.label().parse::<DescriptionKind>().unwrap(), kind);
        }
    }

    #[test]
    fn unknown_description_kind_is_an_error() {
        let err = "Acronym".parse::<DescriptionKind>().unwrap_err();
        assert!(matches!(err, BuildError::UnknownDescriptionKind { .. }));
    }

    #[test]
    fn canonical_bytes_distinguish_membership_from_empty_values() {
        let ns = Namespace::from_seed("test");
        let component = ns.derive_one("c");
        let assemblage = ns.derive_one("a");
        let membership = canonical_annotation_bytes(component, assemblage, None);
        let empty = canonical_annotation_bytes(component, assemblage, Some(&[]));
        assert_ne!(membership, empty);
    }

    #[test]
    fn canonical_bytes_are_value_order_sensitive() {
        let ns = Namespace::from_seed("test");
        let component = ns.derive_one("c");
        let assemblage = ns.derive_one("a");
        let ab = canonical_annotation_bytes(
            component,
            assemblage,
            Some(&[
                DynamicValue::Text("a".into()),
                DynamicValue::Text("b".into()),
            ]),
        );
        let ba = canonical_annotation_bytes(
            component,
            assemblage,
            Some(&[
                DynamicValue::Text("b".into()),
                DynamicValue::Text("a".into()),
            ]),
        );
        assert_ne!(ab, ba);
    }

    #[test]
    fn concept_round_trips_through_serde() {
        let ns = Namespace::from_seed("test");
        let mut concept =
            Concept::new(ConceptAttributes::new(ns.derive_one("heart"), false, stamp()));
        concept.descriptions.push(Description {
            id: ns.derive_one("heart description"),
            concept: concept.id(),
            text: "Heart structure".to_string(),
            kind: DescriptionKind::FullySpecifiedName,
            lang: "en".to_string(),
            stamp: stamp(),
            annotations: Vec::new(),
            legacy_annotations: Vec::new(),
        });
        let json = serde_json::to_string(&concept).unwrap();
        let back: Concept = serde_json::from_str(&json).unwrap();
        assert_eq!(back, concept);
    }

    #[test]
    fn annotation_style_is_unset_until_first_touch() {
        let ns = Namespace::from_seed("test");
        let mut concept =
            Concept::new(ConceptAttributes::new(ns.derive_one("refset"), false, stamp()));
        assert_eq!(concept.annotation_style(), None);
        concept.set_annotation_style(false);
        assert_eq!(concept.annotation_style(), Some(false));
    }
}
