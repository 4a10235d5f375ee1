//! Typed property groups.
//!
//! A [`PropertyGroup`] is a named family of recurring source attributes —
//! descriptions, relationships, member refsets — declared once by the
//! caller and applied uniformly by the builder. Each group and each
//! registered [`Property`] carries a stable identifier derived at
//! registration time, so the same declarations always produce the same
//! metadata concepts.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use termforge_kernel::chronicle::{Concept, DynamicColumn};
use termforge_kernel::error::BuildError;
use termforge_kernel::ident::{Identifier, Namespace};

/// Description ranking bands. Properties whose sub-type sorts below
/// [`SYNONYM_BAND`] are FSN candidates; `[SYNONYM_BAND, DEFINITION_BAND)`
/// is the synonym band; everything at or above [`DEFINITION_BAND`] is the
/// definition band. A sub-type of `i32::MAX` sorts last but still lands in
/// the synonym band — a compatibility quirk preserved from the legacy
/// converters.
pub const FSN_BAND: i32 = 0;
pub const SYNONYM_BAND: i32 = 20;
pub const DEFINITION_BAND: i32 = 40;

/// The closed set of property-group families.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GroupKind {
    /// Source fields the conversion deliberately ignores.
    Skip,
    /// Source fields loaded as descriptions, ranked by sub-type.
    Descriptions,
    /// Source fields loaded as relationships.
    Relations,
    /// Source fields loaded as refset memberships. Concepts for these are
    /// cached and must not be written until their members are recorded.
    MemberRefsets,
    /// The fixed release / loader-version pair.
    ContentVersion,
}

impl GroupKind {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Skip => "Skip",
            Self::Descriptions => "Descriptions",
            Self::Relations => "Relations",
            Self::MemberRefsets => "Member Refsets",
            Self::ContentVersion => "Content Version",
        }
    }

    /// Whether property concepts in this family are dynamic assemblages.
    pub fn creates_dynamic_assemblages(&self) -> bool {
        matches!(self, Self::MemberRefsets | Self::ContentVersion)
    }
}

/// A property declaration, before registration in a group.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PropertySpec {
    pub name: String,
    pub preferred_name: Option<String>,
    pub alt_name: Option<String>,
    pub definition: Option<String>,
    /// Emit relationships of this property under another type identifier,
    /// recording the original as a provenance annotation.
    pub remap_type: Option<Identifier>,
    /// Description ranking sub-type. `None` sorts last (synonym band).
    pub sub_type: Option<i32>,
    /// Dynamic column shapes; falls back to the group default when `None`.
    pub columns: Option<Vec<DynamicColumn>>,
    pub disabled: bool,
}

impl PropertySpec {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn preferred_name(mut self, value: impl Into<String>) -> Self {
        self.preferred_name = Some(value.into());
        self
    }

    pub fn alt_name(mut self, value: impl Into<String>) -> Self {
        self.alt_name = Some(value.into());
        self
    }

    pub fn definition(mut self, value: impl Into<String>) -> Self {
        self.definition = Some(value.into());
        self
    }

    pub fn remap_type(mut self, value: Identifier) -> Self {
        self.remap_type = Some(value);
        self
    }

    pub fn sub_type(mut self, value: i32) -> Self {
        self.sub_type = Some(value);
        self
    }

    pub fn columns(mut self, value: Vec<DynamicColumn>) -> Self {
        self.columns = Some(value);
        self
    }

    pub fn disabled(mut self) -> Self {
        self.disabled = true;
        self
    }
}

/// A registered property: a [`PropertySpec`] plus its derived identifier
/// and the family it was registered under.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Property {
    spec: PropertySpec,
    id: Identifier,
    group_kind: GroupKind,
    group_refset: Option<Identifier>,
}

impl Property {
    pub fn id(&self) -> Identifier {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.spec.name
    }

    pub fn preferred_name(&self) -> Option<&str> {
        self.spec.preferred_name.as_deref()
    }

    pub fn alt_name(&self) -> Option<&str> {
        self.spec.alt_name.as_deref()
    }

    pub fn definition(&self) -> Option<&str> {
        self.spec.definition.as_deref()
    }

    pub fn remap_type(&self) -> Option<Identifier> {
        self.spec.remap_type
    }

    pub fn columns(&self) -> Option<&[DynamicColumn]> {
        self.spec.columns.as_deref()
    }

    pub fn disabled(&self) -> bool {
        self.spec.disabled
    }

    pub fn group_kind(&self) -> GroupKind {
        self.group_kind
    }

    /// The source-type refset of the owning group, when the group has one.
    pub fn group_refset(&self) -> Option<Identifier> {
        self.group_refset
    }

    /// Ranking key for description ordering. Unset sub-types sort last.
    pub fn sort_key(&self) -> i32 {
        self.spec.sub_type.unwrap_or(i32::MAX)
    }
}

/// One source text paired with the registered property that produced it;
/// the unit of [`crate::builder::ConceptBuilder::add_descriptions`].
#[derive(Debug, Clone)]
pub struct ValueProperty<'p> {
    pub text: String,
    pub property: &'p Property,
    pub disabled: bool,
    /// Explicit description identifier; derived when `None`.
    pub id: Option<Identifier>,
}

impl<'p> ValueProperty<'p> {
    pub fn new(text: impl Into<String>, property: &'p Property) -> Self {
        Self {
            text: text.into(),
            property,
            disabled: false,
            id: None,
        }
    }

    pub fn disabled(mut self) -> Self {
        self.disabled = true;
        self
    }
}

/// A named group of properties with a stable identity.
///
/// Identifiers are assigned once, at construction, from the process
/// namespace — the group never re-derives them.
#[derive(Debug, Clone)]
pub struct PropertyGroup {
    kind: GroupKind,
    name: String,
    namespace: Namespace,
    id: Identifier,
    source_refset_name: Option<String>,
    source_refset_id: Option<Identifier>,
    default_columns: Option<Vec<DynamicColumn>>,
    properties: Vec<Property>,
    index: BTreeMap<String, usize>,
    // MemberRefsets only: concepts cached until their members are recorded.
    concepts: BTreeMap<String, Concept>,
    refset_identity_parent: Option<Concept>,
}

impl PropertyGroup {
    fn new(
        kind: GroupKind,
        name: &str,
        namespace: &Namespace,
        source_refset_name: Option<String>,
        default_columns: Option<Vec<DynamicColumn>>,
    ) -> Self {
        let id = namespace.derive_one(name);
        let source_refset_id = source_refset_name
            .as_deref()
            .map(|n| namespace.derive_one(n));
        Self {
            kind,
            name: name.to_string(),
            namespace: *namespace,
            id,
            source_refset_name,
            source_refset_id,
            default_columns,
            properties: Vec::new(),
            index: BTreeMap::new(),
            concepts: BTreeMap::new(),
            refset_identity_parent: None,
        }
    }

    pub fn descriptions(namespace: &Namespace, terminology: &str) -> Self {
        Self::new(
            GroupKind::Descriptions,
            "Descriptions",
            namespace,
            Some(format!("{terminology} Description Types")),
            None,
        )
    }

    pub fn relations(namespace: &Namespace, terminology: &str) -> Self {
        Self::new(
            GroupKind::Relations,
            "Relations",
            namespace,
            Some(format!("{terminology} Relation Types")),
            None,
        )
    }

    pub fn member_refsets(namespace: &Namespace, terminology: &str) -> Self {
        Self::new(
            GroupKind::MemberRefsets,
            "Refsets",
            namespace,
            Some(format!("{terminology} Refsets")),
            None,
        )
    }

    /// The fixed two-property release / loader-version group.
    pub fn content_version(namespace: &Namespace) -> Result<Self, BuildError> {
        use termforge_kernel::bindings::DYNAMIC_COLUMN_VALUE;
        use termforge_kernel::chronicle::DynamicKind;
        let mut group = Self::new(
            GroupKind::ContentVersion,
            "Content Version",
            namespace,
            None,
            Some(vec![DynamicColumn::new(
                0,
                DYNAMIC_COLUMN_VALUE,
                DynamicKind::Text,
                true,
            )]),
        );
        group.add_property(PropertySpec::named("Release"))?;
        group.add_property(PropertySpec::named("Loader Version"))?;
        Ok(group)
    }

    pub fn skip(namespace: &Namespace, name: &str) -> Self {
        Self::new(GroupKind::Skip, name, namespace, None, None)
    }

    pub fn kind(&self) -> GroupKind {
        self.kind
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn id(&self) -> Identifier {
        self.id
    }

    pub fn source_refset_name(&self) -> Option<&str> {
        self.source_refset_name.as_deref()
    }

    pub fn source_refset_id(&self) -> Option<Identifier> {
        self.source_refset_id
    }

    /// Register a property, deriving its identifier from the group name and
    /// the property name. Duplicate names within a group are caller misuse.
    pub fn add_property(&mut self, spec: PropertySpec) -> Result<&Property, BuildError> {
        if self.index.contains_key(&spec.name) {
            return Err(BuildError::DuplicateProperty {
                group: self.name.clone(),
                name: spec.name,
            });
        }
        let id = self
            .namespace
            .derive(&[Some(&self.name), Some(&spec.name)]);
        let property = Property {
            spec,
            id,
            group_kind: self.kind,
            group_refset: self.source_refset_id,
        };
        let idx = self.properties.len();
        self.index.insert(property.spec.name.clone(), idx);
        self.properties.push(property);
        Ok(&self.properties[idx])
    }

    /// Look up a registered property by name.
    pub fn property(&self, name: &str) -> Result<&Property, BuildError> {
        self.index
            .get(name)
            .map(|&i| &self.properties[i])
            .ok_or_else(|| BuildError::PropertyNotFound {
                group: self.name.clone(),
                name: name.to_string(),
            })
    }

    pub fn properties(&self) -> &[Property] {
        &self.properties
    }

    /// A property's declared columns, falling back to the group default.
    pub fn effective_columns(&self, property: &Property) -> Option<Vec<DynamicColumn>> {
        property
            .columns()
            .map(<[DynamicColumn]>::to_vec)
            .or_else(|| self.default_columns.clone())
    }

    fn expect_member_refsets(&self) -> Result<(), BuildError> {
        if self.kind == GroupKind::MemberRefsets {
            Ok(())
        } else {
            Err(BuildError::InconsistentGroupType {
                property: self.name.clone(),
                expected: GroupKind::MemberRefsets.label().to_string(),
            })
        }
    }

    /// Cache a member-refset concept until its memberships are recorded.
    pub fn insert_concept(&mut self, concept: Concept) -> Result<(), BuildError> {
        self.expect_member_refsets()?;
        let name = self
            .properties
            .iter()
            .find(|p| p.id() == concept.id())
            .map(|p| p.name().to_string())
            .ok_or_else(|| BuildError::PropertyNotFound {
                group: self.name.clone(),
                name: concept.id().to_string(),
            })?;
        self.concepts.insert(name, concept);
        Ok(())
    }

    pub fn cached_concept(&self, property_name: &str) -> Option<&Concept> {
        self.concepts.get(property_name)
    }

    pub fn cached_concept_mut(&mut self, property_name: &str) -> Option<&mut Concept> {
        self.concepts.get_mut(property_name)
    }

    pub fn set_refset_identity_parent(&mut self, concept: Concept) {
        self.refset_identity_parent = Some(concept);
    }

    pub fn refset_identity_parent(&self) -> Option<&Concept> {
        self.refset_identity_parent.as_ref()
    }

    pub(crate) fn take_refset_identity_parent(&mut self) -> Option<Concept> {
        self.refset_identity_parent.take()
    }

    /// Return ownership of every cached concept and clear the cache.
    ///
    /// After a flush the group may be reused: re-creating a concept with
    /// the same derivation inputs yields the same identifier.
    pub fn flush(&mut self) -> Vec<Concept> {
        std::mem::take(&mut self.concepts).into_values().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ns() -> Namespace {
        Namespace::from_seed("test-terminology")
    }

    #[test]
    fn group_and_property_identity_is_stable() {
        let ns = ns();
        let mut a = PropertyGroup::descriptions(&ns, "LOINC");
        let mut b = PropertyGroup::descriptions(&ns, "LOINC");
        let pa = a
            .add_property(PropertySpec::named("Consumer Name").sub_type(SYNONYM_BAND))
            .unwrap()
            .id();
        let pb = b
            .add_property(PropertySpec::named("Consumer Name").sub_type(SYNONYM_BAND))
            .unwrap()
            .id();
        assert_eq!(a.id(), b.id());
        assert_eq!(a.source_refset_id(), b.source_refset_id());
        assert_eq!(pa, pb);
    }

    #[test]
    fn duplicate_property_names_are_rejected() {
        let ns = ns();
        let mut group = PropertyGroup::relations(&ns, "LOINC");
        group.add_property(PropertySpec::named("has_part")).unwrap();
        let err = group
            .add_property(PropertySpec::named("has_part"))
            .unwrap_err();
        assert!(matches!(err, BuildError::DuplicateProperty { .. }));
    }

    #[test]
    fn missing_property_lookup_fails() {
        let ns = ns();
        let group = PropertyGroup::descriptions(&ns, "LOINC");
        let err = group.property("never registered").unwrap_err();
        assert!(matches!(err, BuildError::PropertyNotFound { .. }));
    }

    #[test]
    fn content_version_carries_the_fixed_pair() {
        let ns = ns();
        let group = PropertyGroup::content_version(&ns).unwrap();
        assert!(group.property("Release").is_ok());
        assert!(group.property("Loader Version").is_ok());
        let release = group.property("Release").unwrap();
        let columns = group.effective_columns(release).unwrap();
        assert_eq!(columns.len(), 1);
    }

    #[test]
    fn cached_concepts_are_refused_outside_member_refsets() {
        let ns = ns();
        let mut group = PropertyGroup::descriptions(&ns, "LOINC");
        let err = group.flush();
        assert!(err.is_empty());
        let concept = {
            use termforge_kernel::chronicle::ConceptAttributes;
            use termforge_kernel::stamp::{SessionContext, Status};
            let ctx = SessionContext::new(ns, ns.derive_one("path"), chrono::Utc::now());
            Concept::new(ConceptAttributes::new(
                ns.derive_one("x"),
                false,
                ctx.stamp(Some(Status::Active), None),
            ))
        };
        assert!(matches!(
            group.insert_concept(concept),
            Err(BuildError::InconsistentGroupType { .. })
        ));
    }
}
