//! The concept builder.
//!
//! Turns high-level calls (create a concept, add a description, link a
//! parent) into fully populated chronicle records: every identifier that the
//! caller does not supply is derived from the record's content under the
//! session namespace, and every record is stamped through the session
//! context. Identical call sequences against a fresh builder with the same
//! namespace and path therefore yield byte-identical identifiers, which is
//! what makes re-converted terminologies merge cleanly.
//!
//! Construction is validate-then-append: a failing call never leaves a
//! partially built record attached to a concept.

use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use termforge_kernel::bindings;
use termforge_kernel::chronicle::{
    Component, Concept, ConceptAttributes, Description, DescriptionKind, DynamicAnnotation,
    DynamicColumn, DynamicKind, DynamicValue, LegacyMember, Relationship,
    canonical_annotation_bytes,
};
use termforge_kernel::error::BuildError;
use termforge_kernel::ident::{Identifier, Namespace, PATH_DERIVATION_NAMESPACE};
use termforge_kernel::sink::ConceptSink;
use termforge_kernel::stamp::{SessionContext, Status};
use termforge_kernel::stats::LoadStats;

use crate::properties::{
    DEFINITION_BAND, GroupKind, Property, PropertyGroup, SYNONYM_BAND, ValueProperty,
};

/// Stateful constructor for concept chronicles.
///
/// Created once per conversion run. Construction bootstraps the terminology
/// path concept (on the auxiliary path) and then fixes the session context
/// for the rest of the run.
pub struct ConceptBuilder {
    pub(crate) context: SessionContext,
    // Registered column shapes, keyed by assemblage identifier.
    pub(crate) shapes: BTreeMap<Identifier, Vec<DynamicColumn>>,
    // Foundation metadata concepts, memoized by name so repeated groups
    // share one organizing node.
    pub(crate) special_metadata: BTreeMap<String, Identifier>,
    // Human names for identifiers, used only for statistics labels.
    pub(crate) name_hints: BTreeMap<Identifier, String>,
    // Dynamic assemblages created this run that need a downstream index,
    // paired with their comma-joined column positions.
    pub(crate) index_entries: Vec<(Identifier, String)>,
    pub(crate) stats: LoadStats,
}

impl ConceptBuilder {
    /// Set up a conversion run: seed the namespace, create and write the
    /// terminology path concept plus its path-refset memberships, then lock
    /// the session context onto the new path.
    pub fn new(
        namespace_seed: &str,
        path_name: &str,
        default_time: DateTime<Utc>,
        sink: &mut dyn ConceptSink,
    ) -> Result<Self, BuildError> {
        let namespace = Namespace::from_seed(namespace_seed);
        let mut builder = Self {
            context: SessionContext::new(namespace, bindings::AUXILIARY_PATH, default_time),
            shapes: BTreeMap::new(),
            special_metadata: BTreeMap::new(),
            name_hints: BTreeMap::new(),
            index_entries: Vec::new(),
            stats: LoadStats::new(),
        };
        builder.hint(bindings::IS_A, "isA");
        builder.hint(bindings::SYNONYM, "Synonym");
        builder.hint(bindings::FULLY_SPECIFIED_NAME, "Fully Specified Name");
        builder.hint(bindings::US_ENGLISH_DIALECT, "US English Refset");
        builder.hint(bindings::PATH_REFSET, "Path reference set");
        builder.hint(bindings::PATH_ORIGIN_REFSET, "Path origin reference set");

        let path = builder.bootstrap_path(path_name, sink)?;
        builder.context = SessionContext::new(namespace, path, default_time);

        builder.register_shape(
            bindings::DYNAMIC_DEFINITION,
            vec![DynamicColumn::new(
                0,
                bindings::DYNAMIC_COLUMN_VALUE,
                DynamicKind::Text,
                true,
            )],
        );
        builder.register_shape(
            bindings::DYNAMIC_INDEX_CONFIGURATION,
            vec![
                DynamicColumn::new(0, bindings::DYNAMIC_COLUMN_VALUE, DynamicKind::Uuid, true),
                DynamicColumn::new(1, bindings::DYNAMIC_COLUMN_VALUE, DynamicKind::Text, false),
            ],
        );
        Ok(builder)
    }

    /// Create the path concept and register it in the path refsets, all on
    /// the auxiliary path. The path concept's identity is derived under the
    /// fixed path namespace so it does not depend on the run namespace.
    fn bootstrap_path(
        &mut self,
        path_name: &str,
        sink: &mut dyn ConceptSink,
    ) -> Result<Identifier, BuildError> {
        let path_id = PATH_DERIVATION_NAMESPACE.derive_one(path_name);
        let mut path_concept = self.new_concept(path_id, None, None);
        self.push_plain_description(
            &mut path_concept,
            path_name,
            DescriptionKind::FullySpecifiedName,
            true,
        );
        // A preferred synonym as well, so the path is addressable by name.
        self.push_plain_description(&mut path_concept, path_name, DescriptionKind::Synonym, true);
        self.add_relationship(&mut path_concept, bindings::PATH_RELEASE);
        self.hint(path_id, path_name);
        sink.write(&path_concept)?;

        // i64::MAX displays as "latest" in the origin position field.
        let mut origin_refset = self.new_concept(bindings::PATH_ORIGIN_REFSET, None, None);
        self.add_legacy_member(
            &mut origin_refset,
            path_id,
            Some(bindings::AUXILIARY_PATH),
            Some(i64::from(i32::MAX)),
            Some(Status::Active),
            None,
        );
        sink.write(&origin_refset)?;

        let mut path_refset = self.new_concept(bindings::PATH_REFSET, None, None);
        self.add_legacy_member(
            &mut path_refset,
            bindings::PATH,
            Some(path_id),
            None,
            Some(Status::Active),
            None,
        );
        sink.write(&path_refset)?;

        Ok(path_id)
    }

    pub fn context(&self) -> &SessionContext {
        &self.context
    }

    pub fn stats(&self) -> &LoadStats {
        &self.stats
    }

    pub fn reset_stats(&mut self) {
        self.stats.reset();
    }

    /// Record a human name for an identifier, for statistics labels.
    pub fn hint(&mut self, id: Identifier, name: &str) {
        self.name_hints.insert(id, name.to_string());
    }

    pub fn label_for(&self, id: Identifier) -> String {
        self.name_hints
            .get(&id)
            .cloned()
            .unwrap_or_else(|| id.to_string())
    }

    /// Store the expected column shapes for a dynamic assemblage. Required
    /// before any valued annotation of that assemblage can be created.
    pub fn register_shape(&mut self, assemblage: Identifier, columns: Vec<DynamicColumn>) {
        self.shapes.insert(assemblage, columns);
    }

    pub fn shape(&self, assemblage: Identifier) -> Option<&[DynamicColumn]> {
        self.shapes.get(&assemblage).map(Vec::as_slice)
    }

    /// Create a bare concept: attribute record only, primitive, stamped.
    pub fn new_concept(
        &mut self,
        id: Identifier,
        time: Option<DateTime<Utc>>,
        status: Option<Status>,
    ) -> Concept {
        let stamp = self.context.stamp(status, time);
        self.stats.add_concept();
        Concept::new(ConceptAttributes::new(id, false, stamp))
    }

    /// Create a concept whose identifier is derived from its preferred name,
    /// with the name attached as a preferred FSN.
    pub fn create_concept(&mut self, preferred_name: &str) -> Concept {
        let id = self.context.namespace().derive_one(preferred_name);
        self.create_concept_with_id(id, preferred_name)
    }

    pub fn create_concept_with_id(&mut self, id: Identifier, preferred_name: &str) -> Concept {
        let mut concept = self.new_concept(id, None, None);
        self.push_plain_description(
            &mut concept,
            preferred_name,
            DescriptionKind::FullySpecifiedName,
            true,
        );
        self.hint(id, preferred_name);
        concept
    }

    /// Create a named concept linked to `parent` via is-a.
    pub fn create_child_concept(&mut self, preferred_name: &str, parent: Identifier) -> Concept {
        let mut concept = self.create_concept(preferred_name);
        self.add_relationship(&mut concept, parent);
        concept
    }

    /// Copy the identity and attribute fields of `source` onto the current
    /// path, dropping all descriptions, relationships, and memberships.
    /// Used when re-hosting a concept onto a new conversion path without
    /// re-deriving its identity.
    pub fn clone_skeleton(&mut self, source: &Concept) -> Concept {
        let mut stamp = source.attributes().stamp;
        stamp.path = self.context.path();
        self.stats.add_clone();
        Concept::new(ConceptAttributes::new(
            source.id(),
            source.attributes().defined,
            stamp,
        ))
    }

    /// Attach the canonical name: one FSN, always preferred.
    pub fn add_fully_specified_name(&mut self, concept: &mut Concept, text: &str) -> Identifier {
        self.push_plain_description(concept, text, DescriptionKind::FullySpecifiedName, true)
    }

    /// Build a description without appending it, so callers can attach
    /// further annotations before committing it to the concept.
    fn build_description(
        &mut self,
        concept: &Concept,
        id: Option<Identifier>,
        text: &str,
        kind: DescriptionKind,
        preferred: bool,
        source_type: Option<Identifier>,
        status: Option<Status>,
    ) -> Description {
        let concept_part = concept.id().to_string();
        let source_part = source_type.map(|t| t.to_string());
        let id = id.unwrap_or_else(|| {
            self.context.namespace().derive(&[
                Some(&concept_part),
                Some(text),
                Some(kind.label()),
                Some(if preferred { "true" } else { "false" }),
                source_part.as_deref(),
            ])
        });
        let stamp = self
            .context
            .stamp(status, Some(concept.attributes().stamp.time));
        let mut description = Description {
            id,
            concept: concept.id(),
            text: text.to_string(),
            kind,
            lang: "en".to_string(),
            stamp,
            annotations: Vec::new(),
            legacy_annotations: Vec::new(),
        };
        // Every description carries the US English acceptability marker.
        let acceptability = if preferred {
            bindings::ACCEPTABILITY_PREFERRED
        } else {
            bindings::ACCEPTABILITY_ACCEPTABLE
        };
        self.attach_legacy_annotation(
            &mut description,
            Some(acceptability),
            bindings::US_ENGLISH_DIALECT,
            Some(Status::Active),
            None,
        );
        description
    }

    fn push_plain_description(
        &mut self,
        concept: &mut Concept,
        text: &str,
        kind: DescriptionKind,
        preferred: bool,
    ) -> Identifier {
        let description =
            self.build_description(concept, None, text, kind, preferred, None, Some(Status::Active));
        let id = description.id;
        concept.descriptions.push(description);
        self.stats.add_description(kind.label());
        id
    }

    /// Add a description with full control over provenance.
    ///
    /// When `id` is absent it is derived from the concept, the text, the
    /// kind, the preferred flag, and `source_type` (if present). If
    /// `source_refset` is given, a dynamic annotation recording the source
    /// terminology's own description type (or plain membership when
    /// `source_type` is absent) is attached under that assemblage.
    #[allow(clippy::too_many_arguments)]
    pub fn add_description_full(
        &mut self,
        concept: &mut Concept,
        id: Option<Identifier>,
        text: &str,
        kind: DescriptionKind,
        preferred: bool,
        source_type: Option<Identifier>,
        source_refset: Option<Identifier>,
        status: Option<Status>,
    ) -> Result<Identifier, BuildError> {
        let mut description =
            self.build_description(concept, id, text, kind, preferred, source_type, status);
        if let Some(refset) = source_refset {
            let values = source_type.map(|t| vec![DynamicValue::Uuid(t)]);
            self.attach_annotation(&mut description, None, values, refset, None, None)?;
        }
        let id = description.id;
        concept.descriptions.push(description);
        self.stats.add_description(kind.label());
        Ok(id)
    }

    /// Add a ranked batch of descriptions from description-group properties.
    ///
    /// Items are sorted by their property's sub-type; the first becomes the
    /// FSN and is forced preferred. Later items bucket into the synonym or
    /// definition band, with the first item in each band preferred. An unset
    /// sub-type sorts last and lands in the synonym band.
    pub fn add_descriptions(
        &mut self,
        concept: &mut Concept,
        mut items: Vec<ValueProperty<'_>>,
    ) -> Result<Vec<Identifier>, BuildError> {
        for item in &items {
            if item.property.group_kind() != GroupKind::Descriptions {
                return Err(BuildError::InconsistentGroupType {
                    property: item.property.name().to_string(),
                    expected: GroupKind::Descriptions.label().to_string(),
                });
            }
        }
        items.sort_by_key(|item| item.property.sort_key());

        let mut ids = Vec::with_capacity(items.len());
        let mut have_fsn = false;
        let mut have_preferred_synonym = false;
        let mut have_preferred_definition = false;
        for item in &items {
            let sub_type = item.property.sort_key();
            let (kind, preferred) = if !have_fsn {
                have_fsn = true;
                (DescriptionKind::FullySpecifiedName, true)
            } else if sub_type < SYNONYM_BAND {
                // A second FSN-band item stays FSN-typed but is never
                // preferred.
                (DescriptionKind::FullySpecifiedName, false)
            } else if sub_type < DEFINITION_BAND || sub_type == i32::MAX {
                let preferred = !have_preferred_synonym;
                have_preferred_synonym = true;
                (DescriptionKind::Synonym, preferred)
            } else {
                let preferred = !have_preferred_definition;
                have_preferred_definition = true;
                (DescriptionKind::Definition, preferred)
            };
            let status = if item.disabled || item.property.disabled() {
                Status::Inactive
            } else {
                Status::Active
            };
            ids.push(self.add_description_full(
                concept,
                item.id,
                &item.text,
                kind,
                preferred,
                Some(item.property.id()),
                item.property.group_refset(),
                Some(status),
            )?);
        }
        Ok(ids)
    }

    fn build_relationship(
        &self,
        concept: &Concept,
        id: Option<Identifier>,
        target: Identifier,
        rel_type: Option<Identifier>,
        time: Option<DateTime<Utc>>,
    ) -> Relationship {
        let kind = rel_type.unwrap_or(bindings::IS_A);
        let source_part = concept.id().to_string();
        let target_part = target.to_string();
        let kind_part = kind.to_string();
        let id = id.unwrap_or_else(|| {
            self.context
                .namespace()
                .derive(&[Some(&source_part), Some(&target_part), Some(&kind_part)])
        });
        Relationship {
            id,
            source: concept.id(),
            target,
            kind,
            characteristic: bindings::STATED_RELATIONSHIP,
            refinability: bindings::NOT_REFINABLE,
            group: 0,
            stamp: self.context.stamp(None, time),
            annotations: Vec::new(),
            legacy_annotations: Vec::new(),
        }
    }

    /// Add an is-a relationship with the default time.
    pub fn add_relationship(&mut self, concept: &mut Concept, target: Identifier) -> Identifier {
        let relationship = self.build_relationship(concept, None, target, None, None);
        let id = relationship.id;
        let label = self.label_for(relationship.kind);
        concept.relationships.push(relationship);
        self.stats.add_relationship(label);
        id
    }

    /// Add a typed relationship.
    pub fn add_typed_relationship(
        &mut self,
        concept: &mut Concept,
        target: Identifier,
        rel_type: Identifier,
        time: Option<DateTime<Utc>>,
    ) -> Identifier {
        let relationship = self.build_relationship(concept, None, target, Some(rel_type), time);
        let id = relationship.id;
        let label = self.label_for(rel_type);
        concept.relationships.push(relationship);
        self.stats.add_relationship(label);
        id
    }

    /// Add a relationship, recording provenance when the source
    /// terminology's relationship type is being normalized onto another
    /// type. When both `source_type` and `source_refset` are present, the
    /// original type is attached as a UUID annotation on the relationship.
    #[allow(clippy::too_many_arguments)]
    pub fn add_relationship_full(
        &mut self,
        concept: &mut Concept,
        id: Option<Identifier>,
        target: Identifier,
        rel_type: Option<Identifier>,
        source_type: Option<Identifier>,
        source_refset: Option<Identifier>,
        time: Option<DateTime<Utc>>,
    ) -> Result<Identifier, BuildError> {
        let mut relationship = self.build_relationship(concept, id, target, rel_type, time);
        let label = match (source_type, source_refset) {
            (Some(original), Some(refset)) => {
                self.attach_annotation(
                    &mut relationship,
                    None,
                    Some(vec![DynamicValue::Uuid(original)]),
                    refset,
                    None,
                    None,
                )?;
                format!(
                    "{}:{}",
                    self.label_for(relationship.kind),
                    self.label_for(original)
                )
            }
            _ => self.label_for(relationship.kind),
        };
        let id = relationship.id;
        concept.relationships.push(relationship);
        self.stats.add_relationship(label);
        Ok(id)
    }

    /// Add a relationship for a registered relation property. When the
    /// property declares a remap, the remapped type is used on the edge and
    /// the property itself is recorded as provenance.
    pub fn add_relationship_for(
        &mut self,
        concept: &mut Concept,
        target: Identifier,
        property: &Property,
        time: Option<DateTime<Utc>>,
    ) -> Result<Identifier, BuildError> {
        match property.remap_type() {
            None => self.add_relationship_full(
                concept,
                None,
                target,
                Some(property.id()),
                None,
                None,
                time,
            ),
            Some(remapped) => self.add_relationship_full(
                concept,
                None,
                target,
                Some(remapped),
                Some(property.id()),
                property.group_refset(),
                time,
            ),
        }
    }

    fn validate_values(
        &self,
        assemblage: Identifier,
        values: Option<&[DynamicValue]>,
    ) -> Result<(), BuildError> {
        // Membership-only annotations carry no data to validate.
        let Some(values) = values else { return Ok(()) };
        if values.is_empty() {
            return Ok(());
        }
        let columns = self
            .shapes
            .get(&assemblage)
            .filter(|columns| !columns.is_empty())
            .ok_or(BuildError::InvalidRefset { assemblage })?;
        for (i, value) in values.iter().enumerate() {
            let position = i as u32;
            match columns.iter().find(|c| c.position == position) {
                None => {
                    return Err(BuildError::SchemaMismatch {
                        assemblage,
                        column: position,
                        expected: None,
                        actual: Some(value.kind()),
                    });
                }
                Some(column) if column.kind != value.kind() => {
                    return Err(BuildError::SchemaMismatch {
                        assemblage,
                        column: position,
                        expected: Some(column.kind),
                        actual: Some(value.kind()),
                    });
                }
                Some(_) => {}
            }
        }
        for column in columns.iter().filter(|c| c.required) {
            if column.position as usize >= values.len() {
                return Err(BuildError::MissingRequiredValue {
                    what: format!("column {} of assemblage {assemblage}", column.position),
                });
            }
        }
        Ok(())
    }

    fn attach_annotation<C: Component + ?Sized>(
        &mut self,
        component: &mut C,
        id: Option<Identifier>,
        values: Option<Vec<DynamicValue>>,
        assemblage: Identifier,
        status: Option<Status>,
        time: Option<DateTime<Utc>>,
    ) -> Result<Identifier, BuildError> {
        self.validate_values(assemblage, values.as_deref())?;
        let component_id = component.component_id();
        let id = id.unwrap_or_else(|| {
            let bytes = canonical_annotation_bytes(component_id, assemblage, values.as_deref());
            self.context.namespace().derive_hashed(&bytes)
        });
        let stamp = self
            .context
            .stamp(status, Some(time.unwrap_or_else(|| component.component_time())));
        component.annotations_mut().push(DynamicAnnotation {
            id,
            component: component_id,
            assemblage,
            values,
            stamp,
        });
        self.stats.add_annotation(format!(
            "{}:{}",
            component.component_kind().label(),
            self.label_for(assemblage)
        ));
        Ok(id)
    }

    /// Attach a dynamic annotation to any component, validating the values
    /// against the column shapes registered for `assemblage`. `values` of
    /// `None` marks plain membership. Fails with `InvalidRefset` when no
    /// shape is registered, `SchemaMismatch` when the types disagree; on
    /// failure the component's annotation list is unchanged.
    pub fn add_dynamic_annotation(
        &mut self,
        component: &mut dyn Component,
        values: Option<Vec<DynamicValue>>,
        assemblage: Identifier,
        id: Option<Identifier>,
        status: Option<Status>,
        time: Option<DateTime<Utc>>,
    ) -> Result<Identifier, BuildError> {
        self.attach_annotation(component, id, values, assemblage, status, time)
    }

    /// Single-UUID-value annotation, with the component's time.
    pub fn add_uuid_annotation(
        &mut self,
        component: &mut dyn Component,
        value: Identifier,
        assemblage: Identifier,
    ) -> Result<Identifier, BuildError> {
        self.attach_annotation(
            component,
            None,
            Some(vec![DynamicValue::Uuid(value)]),
            assemblage,
            None,
            None,
        )
    }

    /// Single-text-value annotation, with the component's time.
    pub fn add_string_annotation(
        &mut self,
        component: &mut dyn Component,
        value: &str,
        assemblage: Identifier,
        status: Option<Status>,
    ) -> Result<Identifier, BuildError> {
        self.attach_annotation(
            component,
            None,
            Some(vec![DynamicValue::Text(value.to_string())]),
            assemblage,
            status,
            None,
        )
    }

    /// Membership-only annotation: the component joins `assemblage` with no
    /// attached data.
    pub fn add_membership_annotation(
        &mut self,
        component: &mut dyn Component,
        assemblage: Identifier,
        status: Option<Status>,
        time: Option<DateTime<Utc>>,
    ) -> Result<Identifier, BuildError> {
        self.attach_annotation(component, None, None, assemblage, status, time)
    }

    // Legacy-style annotation on a component: a membership record in
    // `refset` whose target is the component itself.
    fn attach_legacy_annotation<C: Component + ?Sized>(
        &mut self,
        component: &mut C,
        member_type: Option<Identifier>,
        refset: Identifier,
        status: Option<Status>,
        time: Option<DateTime<Utc>>,
    ) -> Identifier {
        let member_type = member_type.unwrap_or(bindings::NORMAL_MEMBER);
        let target = component.component_id();
        let target_part = target.to_string();
        let type_part = member_type.to_string();
        let refset_part = refset.to_string();
        let id = self.context.namespace().derive(&[
            Some(&target_part),
            Some(&type_part),
            Some(&refset_part),
        ]);
        let stamp = self
            .context
            .stamp(status, Some(time.unwrap_or_else(|| component.component_time())));
        component.legacy_annotations_mut().push(LegacyMember {
            id,
            refset,
            target,
            member_type,
            value: None,
            stamp,
            annotations: Vec::new(),
            legacy_annotations: Vec::new(),
        });
        self.stats.add_annotation(format!(
            "{}:{}",
            component.component_kind().label(),
            self.label_for(refset)
        ));
        id
    }

    /// Record a legacy-style membership on a refset concept. The first
    /// membership fixes the concept's attachment style: members live on the
    /// refset, not on the targets.
    pub fn add_legacy_member(
        &mut self,
        refset: &mut Concept,
        target: Identifier,
        member_type: Option<Identifier>,
        value: Option<i64>,
        status: Option<Status>,
        time: Option<DateTime<Utc>>,
    ) -> Identifier {
        if refset.annotation_style().is_none() {
            refset.set_annotation_style(false);
        }
        let member_type = member_type.unwrap_or(bindings::NORMAL_MEMBER);
        let refset_part = refset.id().to_string();
        let target_part = target.to_string();
        // A valued membership derives from the value, an unvalued one from
        // the member type.
        let id = match value {
            Some(v) => {
                let value_part = v.to_string();
                self.context.namespace().derive(&[
                    Some(&refset_part),
                    Some(&target_part),
                    Some(&value_part),
                ])
            }
            None => {
                let type_part = member_type.to_string();
                self.context.namespace().derive(&[
                    Some(&refset_part),
                    Some(&target_part),
                    Some(&type_part),
                ])
            }
        };
        let stamp = self.context.stamp(
            status,
            Some(time.unwrap_or(refset.attributes().stamp.time)),
        );
        refset.members.push(LegacyMember {
            id,
            refset: refset.id(),
            target,
            member_type,
            value,
            stamp,
            annotations: Vec::new(),
            legacy_annotations: Vec::new(),
        });
        let label = self.label_for(refset.id());
        self.stats.add_refset_member(label);
        id
    }

    /// Record a dynamic membership on a refset concept: the member record
    /// lives on the refset, carries no data, and is identified by a content
    /// hash of (target, assemblage).
    pub fn add_dynamic_member(
        &mut self,
        refset: &mut Concept,
        target: Identifier,
        id: Option<Identifier>,
        status: Option<Status>,
        time: Option<DateTime<Utc>>,
    ) -> Identifier {
        let assemblage = refset.id();
        let id = id.unwrap_or_else(|| {
            let bytes = canonical_annotation_bytes(target, assemblage, None);
            self.context.namespace().derive_hashed(&bytes)
        });
        let stamp = self.context.stamp(
            status,
            Some(time.unwrap_or(refset.attributes().stamp.time)),
        );
        refset.dynamic_members.push(DynamicAnnotation {
            id,
            component: target,
            assemblage,
            values: None,
            stamp,
        });
        let label = self.label_for(assemblage);
        self.stats.add_refset_member(label);
        id
    }

    /// Compose a metadata concept: FSN, optional preferred/alternate
    /// synonyms and definition, one or two is-a parents. The concept is
    /// returned unwritten so the caller can transform it (for example into
    /// a dynamic assemblage) before handing it to the sink.
    #[allow(clippy::too_many_arguments)]
    pub fn add_metadata_concept(
        &mut self,
        id: Identifier,
        fsn: &str,
        preferred: Option<&str>,
        alt: Option<&str>,
        definition: Option<&str>,
        parent: Identifier,
        second_parent: Option<Identifier>,
    ) -> Concept {
        let mut concept = self.create_concept_with_id(id, fsn);
        self.add_relationship(&mut concept, parent);
        if let Some(second) = second_parent {
            self.add_relationship(&mut concept, second);
        }
        if let Some(text) = preferred.filter(|t| !t.is_empty()) {
            self.push_plain_description(&mut concept, text, DescriptionKind::Synonym, true);
        }
        if let Some(text) = alt.filter(|t| !t.is_empty()) {
            self.push_plain_description(&mut concept, text, DescriptionKind::Synonym, false);
        }
        if let Some(text) = definition.filter(|t| !t.is_empty()) {
            self.push_plain_description(&mut concept, text, DescriptionKind::Definition, true);
        }
        concept
    }

    /// Turn a concept into a dynamic assemblage: record its usage
    /// description and column declaration on the concept, register the
    /// column shapes, and remember it for the trailing index concept.
    pub fn make_dynamic_assemblage(
        &mut self,
        concept: &mut Concept,
        usage: &str,
        columns: Vec<DynamicColumn>,
    ) -> Result<Identifier, BuildError> {
        if usage.is_empty() {
            return Err(BuildError::MissingRequiredValue {
                what: "assemblage usage description".to_string(),
            });
        }
        let id = self.attach_annotation(
            concept.attributes_mut(),
            None,
            Some(vec![DynamicValue::Text(usage.to_string())]),
            bindings::DYNAMIC_DEFINITION,
            None,
            None,
        )?;
        concept.set_annotation_style(true);
        let positions = (0..columns.len())
            .map(|i| i.to_string())
            .collect::<Vec<_>>()
            .join(",");
        self.register_shape(concept.id(), columns);
        self.index_entries.push((concept.id(), positions));
        Ok(id)
    }

    /// Lazily materialize the concept behind a member-refset property.
    /// The first call creates and caches it under the group's identity
    /// parent; repeated calls return the cached identity. The concept is
    /// not written here: memberships accumulate on it until
    /// [`Self::write_member_refsets`].
    pub fn ensure_refset_concept(
        &mut self,
        group: &mut PropertyGroup,
        property_name: &str,
    ) -> Result<Identifier, BuildError> {
        let property = group.property(property_name)?.clone();
        if property.group_kind() != GroupKind::MemberRefsets {
            return Err(BuildError::InconsistentGroupType {
                property: property.name().to_string(),
                expected: GroupKind::MemberRefsets.label().to_string(),
            });
        }
        if let Some(existing) = group.cached_concept(property_name) {
            return Ok(existing.id());
        }
        let second_parent = group
            .refset_identity_parent()
            .map(|c| c.id())
            .unwrap_or(bindings::PROJECT_REFSETS);
        let concept = self.add_metadata_concept(
            property.id(),
            property.name(),
            property.preferred_name(),
            property.alt_name(),
            property.definition(),
            group.id(),
            Some(second_parent),
        );
        let id = concept.id();
        group.insert_concept(concept)?;
        Ok(id)
    }

    /// Write every cached member-refset concept, then clear the cache.
    /// Must be called exactly once per group, after all memberships have
    /// been recorded. The group's identity parent is written on the first
    /// flush.
    pub fn write_member_refsets(
        &mut self,
        group: &mut PropertyGroup,
        sink: &mut dyn ConceptSink,
    ) -> Result<(), BuildError> {
        if group.kind() != GroupKind::MemberRefsets {
            return Err(BuildError::InconsistentGroupType {
                property: group.name().to_string(),
                expected: GroupKind::MemberRefsets.label().to_string(),
            });
        }
        if let Some(parent) = group.take_refset_identity_parent() {
            sink.write(&parent)?;
        }
        for concept in group.flush() {
            sink.write(&concept)?;
        }
        Ok(())
    }
}
