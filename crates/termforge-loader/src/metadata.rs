//! The metadata assembler.
//!
//! Emits the property-group registry itself as first-class concepts, so a
//! converted terminology carries its own description of which source fields
//! became which records. Group concepts hang under a caller-supplied parent;
//! property concepts hang under their group, with a second parent in the
//! shared foundation hierarchy so equivalent organizing nodes from
//! independently converted terminologies merge.

use termforge_kernel::bindings;
use termforge_kernel::chronicle::{DescriptionKind, DynamicColumn, DynamicKind, DynamicValue};
use termforge_kernel::error::BuildError;
use termforge_kernel::ident::{Identifier, WELL_KNOWN_NAMESPACE};
use termforge_kernel::sink::ConceptSink;
use termforge_kernel::stamp::Status;

use crate::builder::ConceptBuilder;
use crate::properties::{GroupKind, PropertyGroup};

impl ConceptBuilder {
    /// Emit registry concepts for every group, in order.
    ///
    /// Skip groups are ignored. Member-refset property concepts are cached
    /// on their group instead of written, because their memberships are
    /// recorded later; the caller must invoke
    /// [`ConceptBuilder::write_member_refsets`] once per such group. Ends by
    /// writing one index concept cataloging every dynamic assemblage
    /// created so far.
    pub fn assemble(
        &mut self,
        groups: &mut [PropertyGroup],
        parent: Identifier,
        sink: &mut dyn ConceptSink,
    ) -> Result<(), BuildError> {
        for group in groups.iter_mut() {
            if group.kind() == GroupKind::Skip {
                continue;
            }
            let group_concept = self.add_metadata_concept(
                group.id(),
                group.name(),
                None,
                None,
                None,
                parent,
                None,
            );
            sink.write(&group_concept)?;

            let second_parent = match group.kind() {
                GroupKind::Descriptions => Some(self.foundation_pair(
                    group,
                    "Description source type reference set",
                    "Description name in source terminology",
                    sink,
                )?),
                GroupKind::Relations => Some(self.foundation_pair(
                    group,
                    "Relation source type reference set",
                    "Relation name in source terminology",
                    sink,
                )?),
                GroupKind::MemberRefsets => {
                    // The shared refset root has a fixed identity; writing
                    // it once per group is merge-safe.
                    let root = self.add_metadata_concept(
                        bindings::PROJECT_REFSETS,
                        bindings::PROJECT_REFSETS_NAME,
                        None,
                        None,
                        None,
                        bindings::REFSET_IDENTITY,
                        None,
                    );
                    sink.write(&root)?;
                    let refset_name = group.source_refset_name().map(str::to_string).ok_or(
                        BuildError::MissingRequiredValue {
                            what: format!("source refset name for group {}", group.name()),
                        },
                    )?;
                    let identity_parent =
                        self.create_child_concept(&refset_name, bindings::PROJECT_REFSETS);
                    let identity_parent_id = identity_parent.id();
                    group.set_refset_identity_parent(identity_parent);
                    Some(identity_parent_id)
                }
                GroupKind::ContentVersion => None,
                GroupKind::Skip => continue,
            };

            let properties = group.properties().to_vec();
            for property in properties {
                let mut concept = self.add_metadata_concept(
                    property.id(),
                    property.name(),
                    property.preferred_name(),
                    property.alt_name(),
                    property.definition(),
                    group.id(),
                    second_parent,
                );
                if group.kind().creates_dynamic_assemblages() {
                    let columns = group.effective_columns(&property).unwrap_or_default();
                    if columns.is_empty() {
                        // Member-style refset: no data columns, no index.
                    } else {
                        let usage = property
                            .definition()
                            .map(str::to_string)
                            .unwrap_or_else(|| property.name().to_string());
                        self.make_dynamic_assemblage(&mut concept, &usage, columns)?;
                    }
                }
                if group.kind() == GroupKind::MemberRefsets {
                    group.insert_concept(concept)?;
                } else {
                    sink.write(&concept)?;
                }
            }
        }
        self.write_assemblage_index(sink)
    }

    /// Create (memoized by label) a foundation organizing concept with
    /// identities fixed across conversion runs and loaders.
    fn special_metadata_concept(
        &mut self,
        label: &str,
        parent: Identifier,
        sink: &mut dyn ConceptSink,
    ) -> Result<Identifier, BuildError> {
        if let Some(&id) = self.special_metadata.get(label) {
            return Ok(id);
        }
        let fsn = format!("{label} (foundation metadata concept)");
        let id = WELL_KNOWN_NAMESPACE.derive_one(&fsn);
        let mut concept = self.new_concept(id, None, None);
        // Description identities are fixed per text, not derived under the
        // run namespace, so multiple loaders merge onto one concept.
        let fsn_id = WELL_KNOWN_NAMESPACE.derive_one(&format!("FSN:{fsn}"));
        self.add_description_full(
            &mut concept,
            Some(fsn_id),
            &fsn,
            DescriptionKind::FullySpecifiedName,
            true,
            None,
            None,
            Some(Status::Active),
        )?;
        concept.set_annotation_style(false);
        self.add_relationship(&mut concept, parent);
        let synonym_id = WELL_KNOWN_NAMESPACE.derive_one(&format!("preferredName:{label}"));
        self.add_description_full(
            &mut concept,
            Some(synonym_id),
            label,
            DescriptionKind::Synonym,
            true,
            None,
            None,
            Some(Status::Active),
        )?;
        self.hint(id, label);
        sink.write(&concept)?;
        self.special_metadata.insert(label.to_string(), id);
        Ok(id)
    }

    /// Create the foundation pair for a description or relation group: the
    /// group's source-type refset (a single-UUID-column dynamic assemblage
    /// under the reference-set foundation) and the "named in source
    /// terminology" organizing node whose per-group child is returned as
    /// the second parent for the group's property concepts.
    fn foundation_pair(
        &mut self,
        group: &PropertyGroup,
        refset_label: &str,
        value_label: &str,
        sink: &mut dyn ConceptSink,
    ) -> Result<Identifier, BuildError> {
        let refset_name =
            group
                .source_refset_name()
                .ok_or_else(|| BuildError::MissingRequiredValue {
                    what: format!("source refset name for group {}", group.name()),
                })?;
        let refset_id =
            group
                .source_refset_id()
                .ok_or_else(|| BuildError::MissingRequiredValue {
                    what: format!("source refset identity for group {}", group.name()),
                })?;

        let refset_parent = self.special_metadata_concept(
            refset_label,
            bindings::REFERENCE_SET_FOUNDATION,
            sink,
        )?;
        let mut refset_concept =
            self.add_metadata_concept(refset_id, refset_name, None, None, None, refset_parent, None);
        self.make_dynamic_assemblage(
            &mut refset_concept,
            "Carries the source description type information",
            vec![DynamicColumn::new(
                0,
                bindings::DYNAMIC_COLUMN_VALUE,
                DynamicKind::Uuid,
                true,
            )],
        )?;
        self.hint(refset_id, refset_name);
        sink.write(&refset_concept)?;

        let value_parent = self.special_metadata_concept(
            value_label,
            bindings::REFERENCE_SET_ATTRIBUTE,
            sink,
        )?;
        // The per-group organizing child is pluralized so its identity does
        // not collide with the refset concept above. A duplicate across
        // groups with the same source refset name merges by identity.
        let plural = format!("{refset_name}s");
        let child = self.add_metadata_concept(
            self.context.namespace().derive_one(&plural),
            &plural,
            None,
            None,
            None,
            value_parent,
            None,
        );
        sink.write(&child)?;
        Ok(child.id())
    }

    /// Write the synthetic concept cataloging every dynamic assemblage
    /// created since the last call, for downstream index configuration.
    /// Does nothing when no assemblages were created.
    pub fn write_assemblage_index(
        &mut self,
        sink: &mut dyn ConceptSink,
    ) -> Result<(), BuildError> {
        let entries = std::mem::take(&mut self.index_entries);
        if entries.is_empty() {
            return Ok(());
        }
        let mut concept = self.create_concept_with_id(
            bindings::DYNAMIC_INDEX_CONFIGURATION,
            "Dynamic assemblage index configuration",
        );
        for (assemblage, positions) in entries {
            self.add_dynamic_annotation(
                concept.attributes_mut(),
                Some(vec![
                    DynamicValue::Uuid(assemblage),
                    DynamicValue::Text(positions),
                ]),
                bindings::DYNAMIC_INDEX_CONFIGURATION,
                None,
                None,
                None,
            )?;
        }
        sink.write(&concept)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::properties::PropertySpec;
    use chrono::{TimeZone, Utc};
    use termforge_kernel::chronicle::Concept;
    use termforge_kernel::sink::MemorySink;

    fn builder() -> ConceptBuilder {
        let mut sink = MemorySink::new();
        let time = Utc.with_ymd_and_hms(2015, 3, 1, 0, 0, 0).unwrap();
        ConceptBuilder::new("test-terminology", "Test Path", time, &mut sink).expect("bootstrap")
    }

    fn find<'a>(concepts: &'a [Concept], id: Identifier) -> Option<&'a Concept> {
        concepts.iter().find(|c| c.id() == id)
    }

    #[test]
    fn assemble_skips_skip_groups() {
        let mut builder = builder();
        let ns = *builder.context().namespace();
        let mut groups = vec![PropertyGroup::skip(&ns, "ignored")];
        let mut sink = MemorySink::new();
        builder
            .assemble(&mut groups, bindings::REFSET_IDENTITY, &mut sink)
            .unwrap();
        assert!(sink.concepts().is_empty());
    }

    #[test]
    fn description_group_emits_foundation_hierarchy() {
        let mut builder = builder();
        let ns = *builder.context().namespace();
        let mut group = PropertyGroup::descriptions(&ns, "LOINC");
        group
            .add_property(PropertySpec::named("Consumer Name").sub_type(20))
            .unwrap();
        let property_id = group.property("Consumer Name").unwrap().id();
        let refset_id = group.source_refset_id().unwrap();
        let mut groups = vec![group];

        let mut sink = MemorySink::new();
        let parent = ns.derive_one("LOINC Metadata");
        builder.assemble(&mut groups, parent, &mut sink).unwrap();

        // Group concept under the supplied parent.
        let group_concept = find(sink.concepts(), groups[0].id()).expect("group concept");
        assert_eq!(group_concept.relationships[0].target, parent);

        // The source-type refset is a dynamic assemblage under the fixed
        // foundation parent.
        let refset = find(sink.concepts(), refset_id).expect("source refset");
        assert_eq!(
            refset.relationships[0].target,
            WELL_KNOWN_NAMESPACE.derive_one(
                "Description source type reference set (foundation metadata concept)"
            )
        );
        assert!(builder.shape(refset_id).is_some());
        // The usage text feeds the assemblage definition annotation, which
        // in turn feeds content-hashed identities downstream; independent
        // conversions must agree on it verbatim.
        assert!(refset.attributes().annotations.iter().any(|a| {
            a.assemblage == bindings::DYNAMIC_DEFINITION
                && a.values.as_deref().is_some_and(|v| {
                    v.first()
                        == Some(&DynamicValue::Text(
                            "Carries the source description type information".into(),
                        ))
                })
        }));

        // Property concept carries group and foundation parents.
        let property = find(sink.concepts(), property_id).expect("property concept");
        assert_eq!(property.relationships.len(), 2);
        assert_eq!(property.relationships[0].target, groups[0].id());

        // The trailing index concept catalogs the created assemblage.
        let index =
            find(sink.concepts(), bindings::DYNAMIC_INDEX_CONFIGURATION).expect("index concept");
        assert!(index.attributes().annotations.iter().any(|a| {
            a.values.as_deref().is_some_and(|v| {
                v.first() == Some(&DynamicValue::Uuid(refset_id))
            })
        }));
    }

    #[test]
    fn foundation_concepts_are_memoized_across_groups() {
        let mut builder = builder();
        let ns = *builder.context().namespace();
        let mut groups = vec![
            PropertyGroup::descriptions(&ns, "LOINC"),
            PropertyGroup::descriptions(&ns, "LOINC2"),
        ];
        let mut sink = MemorySink::new();
        builder
            .assemble(&mut groups, ns.derive_one("Metadata"), &mut sink)
            .unwrap();
        let foundation_id = WELL_KNOWN_NAMESPACE
            .derive_one("Description source type reference set (foundation metadata concept)");
        let count = sink
            .concepts()
            .iter()
            .filter(|c| c.id() == foundation_id)
            .count();
        assert_eq!(count, 1);
    }

    #[test]
    fn member_refset_concepts_are_cached_not_written() {
        let mut builder = builder();
        let ns = *builder.context().namespace();
        let mut group = PropertyGroup::member_refsets(&ns, "LOINC");
        group.add_property(PropertySpec::named("All Codes")).unwrap();
        let property_id = group.property("All Codes").unwrap().id();
        let mut groups = vec![group];

        let mut sink = MemorySink::new();
        builder
            .assemble(&mut groups, ns.derive_one("Metadata"), &mut sink)
            .unwrap();

        assert!(find(sink.concepts(), property_id).is_none());
        assert!(find(sink.concepts(), bindings::PROJECT_REFSETS).is_some());
        assert!(groups[0].cached_concept("All Codes").is_some());
        assert!(groups[0].refset_identity_parent().is_some());

        // Populate a membership, then flush: parent and refset appear.
        let target = ns.derive_one("12345");
        let mut refset = groups[0].cached_concept("All Codes").unwrap().clone();
        builder.add_dynamic_member(&mut refset, target, None, None, None);
        *groups[0].cached_concept_mut("All Codes").unwrap() = refset;

        let mut flush_sink = MemorySink::new();
        builder
            .write_member_refsets(&mut groups[0], &mut flush_sink)
            .unwrap();
        assert_eq!(flush_sink.concepts().len(), 2);
        let written = find(flush_sink.concepts(), property_id).expect("flushed refset");
        assert_eq!(written.dynamic_members.len(), 1);
        assert!(groups[0].cached_concept("All Codes").is_none());
    }

    #[test]
    fn content_version_group_emits_writable_assemblages() {
        let mut builder = builder();
        let ns = *builder.context().namespace();
        let mut groups = vec![PropertyGroup::content_version(&ns).unwrap()];
        let release_id = groups[0].property("Release").unwrap().id();

        let mut sink = MemorySink::new();
        builder
            .assemble(&mut groups, ns.derive_one("Metadata"), &mut sink)
            .unwrap();

        let release = find(sink.concepts(), release_id).expect("release concept");
        assert_eq!(release.annotation_style(), Some(true));
        assert!(builder.shape(release_id).is_some());

        // The registered shape accepts a version string.
        let mut target = builder.create_concept("Some terminology root");
        builder
            .add_string_annotation(target.attributes_mut(), "2.56", release_id, None)
            .unwrap();
        assert_eq!(target.attributes().annotations.len(), 1);
    }

    #[test]
    fn index_concept_is_omitted_when_nothing_needs_indexing() {
        let mut builder = builder();
        let mut sink = MemorySink::new();
        builder.write_assemblage_index(&mut sink).unwrap();
        assert!(sink.concepts().is_empty());
    }
}
