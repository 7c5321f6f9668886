//! Element inventory
//!
//! [`enumerate`] walks every element declaration of a schema, depth first in
//! declaration order, and classifies each one by the content model of its
//! resolved type. The result is an [`Inventory`]: one entry per qualified
//! name, plus the warnings collected on the way.
//!
//! ```rust,ignore
//! use xmlschema_inventory::{enumerate, SchemaDocument};
//!
//! let schema = SchemaDocument::from_file("tei_all.xsd")?;
//! let inventory = enumerate(&schema)?;
//! print!("{}", inventory.sorted().to_tsv());
//! ```

use std::collections::HashSet;
use std::fmt;

use indexmap::{IndexMap, IndexSet};
use serde::ser::SerializeStruct;
use serde::{Serialize, Serializer};

use crate::error::{Error, Result};
use crate::namespaces::QName;
use crate::schema::builtins::{any_type_name, is_builtin};
use crate::schema::classify::{classify, Classification, ContentKind};
use crate::schema::resolver::TypeResolver;
use crate::schema::{ElementDeclaration, ModelGroup, Particle, SchemaDocument, TypeDefinition, TypeRef};
use crate::warnings::Warning;

/// Options controlling which elements end up in the inventory
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EnumerateOptions {
    /// Emit entries for abstract elements
    pub include_abstract: bool,
    /// Also walk named complex types and groups no element reaches
    pub include_unreferenced: bool,
}

impl Default for EnumerateOptions {
    fn default() -> Self {
        Self {
            include_abstract: false,
            include_unreferenced: true,
        }
    }
}

impl EnumerateOptions {
    /// Create options with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Set whether abstract elements are listed
    pub fn with_abstract(mut self, include: bool) -> Self {
        self.include_abstract = include;
        self
    }

    /// Set whether unreferenced types and groups are walked
    pub fn with_unreferenced(mut self, include: bool) -> Self {
        self.include_unreferenced = include;
        self
    }
}

/// Classification of an entry, or the type that could not be found
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum EntryStatus {
    /// The element's type was resolved and classified
    Resolved(Classification),
    /// The element's type (or one of its bases) is not defined
    #[serde(rename_all = "camelCase")]
    Unresolved {
        /// The missing type
        unresolved_type: QName,
    },
}

impl fmt::Display for EntryStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntryStatus::Resolved(classification) => write!(f, "{}", classification),
            EntryStatus::Unresolved { unresolved_type } => {
                write!(f, "unresolved {}", unresolved_type)
            }
        }
    }
}

/// One element of the inventory
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InventoryEntry {
    /// Qualified name of the element
    pub qualified_name: QName,
    /// Classification or unresolved marker
    #[serde(flatten)]
    pub status: EntryStatus,
}

impl InventoryEntry {
    /// Create an entry
    pub fn new(qualified_name: QName, status: EntryStatus) -> Self {
        Self {
            qualified_name,
            status,
        }
    }

    /// The classification, if the type was resolved
    pub fn classification(&self) -> Option<Classification> {
        match &self.status {
            EntryStatus::Resolved(classification) => Some(*classification),
            EntryStatus::Unresolved { .. } => None,
        }
    }

    /// Whether the element has a simple type
    pub fn is_simple_type(&self) -> Option<bool> {
        self.classification().map(|c| c.is_simple_type)
    }

    /// The element's content kind
    pub fn content_kind(&self) -> Option<ContentKind> {
        self.classification().map(|c| c.content_kind)
    }

    /// Whether the element's type was resolved
    pub fn is_resolved(&self) -> bool {
        matches!(self.status, EntryStatus::Resolved(_))
    }

    /// Tab-separated line: name, simple/complex, content kind
    pub fn to_tsv(&self) -> String {
        match &self.status {
            EntryStatus::Resolved(c) => format!(
                "{}\t{}\t{}",
                self.qualified_name,
                if c.is_simple_type { "simple" } else { "complex" },
                c.content_kind
            ),
            EntryStatus::Unresolved { .. } => format!("{}\t---\t---", self.qualified_name),
        }
    }
}

/// An entry replaced by an overlay
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Override {
    /// The element whose entry changed
    pub name: QName,
    /// Status before the overlay
    pub before: EntryStatus,
    /// Status taken from the overlay
    pub after: EntryStatus,
}

impl fmt::Display for Override {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {} ==> {}", self.name, self.before, self.after)
    }
}

/// Outcome of [`Inventory::overlay`]
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OverlayReport {
    /// Entries whose classification changed
    pub overrides: Vec<Override>,
    /// Entries present in both with the same classification
    pub identical: usize,
    /// Entries only present in the overlay
    pub added: usize,
}

/// The element inventory of a schema
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Inventory {
    entries: IndexMap<QName, InventoryEntry>,
    warnings: Vec<Warning>,
}

impl Inventory {
    /// Create an inventory from entries and warnings
    pub fn new(entries: impl IntoIterator<Item = InventoryEntry>, warnings: Vec<Warning>) -> Self {
        Self {
            entries: entries
                .into_iter()
                .map(|entry| (entry.qualified_name.clone(), entry))
                .collect(),
            warnings,
        }
    }

    /// Entries in inventory order
    pub fn entries(&self) -> impl Iterator<Item = &InventoryEntry> {
        self.entries.values()
    }

    /// Look up an entry by name
    pub fn get(&self, name: &QName) -> Option<&InventoryEntry> {
        self.entries.get(name)
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether there are no entries
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Warnings collected while loading and enumerating
    pub fn warnings(&self) -> &[Warning] {
        &self.warnings
    }

    /// A copy ordered by qualified name
    pub fn sorted(&self) -> Inventory {
        let mut entries = self.entries.clone();
        entries.sort_keys();
        Inventory {
            entries,
            warnings: self.warnings.clone(),
        }
    }

    /// One tab-separated line per entry
    pub fn to_tsv(&self) -> String {
        self.entries()
            .map(|entry| entry.to_tsv() + "\n")
            .collect()
    }

    /// Pretty-printed JSON: `{"elements": [...], "warnings": [...]}`
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Let the entries of `other` take precedence over this inventory
    ///
    /// Same-named entries with a different classification are replaced, new
    /// names are appended, and warnings are merged.
    pub fn overlay(&mut self, other: &Inventory) -> OverlayReport {
        let mut report = OverlayReport::default();

        for entry in other.entries() {
            match self.entries.get_mut(&entry.qualified_name) {
                Some(existing) if existing.status == entry.status => report.identical += 1,
                Some(existing) => {
                    report.overrides.push(Override {
                        name: entry.qualified_name.clone(),
                        before: existing.status.clone(),
                        after: entry.status.clone(),
                    });
                    existing.status = entry.status.clone();
                }
                None => {
                    self.entries
                        .insert(entry.qualified_name.clone(), entry.clone());
                    report.added += 1;
                }
            }
        }

        for warning in &other.warnings {
            if !self.warnings.contains(warning) {
                self.warnings.push(warning.clone());
            }
        }

        report
    }
}

impl Serialize for Inventory {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let elements: Vec<&InventoryEntry> = self.entries.values().collect();
        let warnings: Vec<WarningView<'_>> = self
            .warnings
            .iter()
            .map(|warning| WarningView {
                message: warning.to_string(),
                warning,
            })
            .collect();

        let mut state = serializer.serialize_struct("Inventory", 2)?;
        state.serialize_field("elements", &elements)?;
        state.serialize_field("warnings", &warnings)?;
        state.end()
    }
}

#[derive(Serialize)]
struct WarningView<'a> {
    message: String,
    #[serde(flatten)]
    warning: &'a Warning,
}

/// Enumerate the elements of a schema with default options
pub fn enumerate(schema: &SchemaDocument) -> Result<Inventory> {
    enumerate_with(schema, &EnumerateOptions::default())
}

/// Enumerate the elements of a schema
///
/// Fails only on fatal conditions: a cyclic derivation anywhere in the schema
/// or an exceeded limit. Missing types, groups and elements become warnings.
pub fn enumerate_with(schema: &SchemaDocument, options: &EnumerateOptions) -> Result<Inventory> {
    let resolver = TypeResolver::new(schema);
    resolver.check_derivations()?;

    let mut enumerator = Enumerator::new(resolver, *options);
    for decl in schema.elements.values() {
        enumerator.run(Step::Element(decl))?;
    }

    if options.include_unreferenced {
        for (name, definition) in &schema.types {
            if let TypeDefinition::Complex(_) = definition {
                enumerator.run(Step::NamedType(name))?;
            }
        }
        for name in schema.groups.keys() {
            enumerator.run(Step::GroupRef(name))?;
        }
    }

    let inventory = enumerator.finish();
    tracing::info!(
        entries = inventory.len(),
        warnings = inventory.warnings().len(),
        "enumerated schema elements"
    );
    Ok(inventory)
}

/// Depth-first walk state
struct Enumerator<'a> {
    schema: &'a SchemaDocument,
    resolver: TypeResolver<'a>,
    options: EnumerateOptions,
    entries: IndexMap<QName, InventoryEntry>,
    warnings: IndexSet<Warning>,
    visited_types: HashSet<QName>,
    visited_groups: HashSet<QName>,
    // Named groups being expanded within the current content model
    group_stack: IndexSet<QName>,
}

impl<'a> Enumerator<'a> {
    fn new(resolver: TypeResolver<'a>, options: EnumerateOptions) -> Self {
        let schema = resolver.schema();
        Self {
            schema,
            resolver,
            options,
            entries: IndexMap::new(),
            warnings: schema.warnings.iter().cloned().collect(),
            visited_types: HashSet::new(),
            visited_groups: HashSet::new(),
            group_stack: IndexSet::new(),
        }
    }

    fn finish(self) -> Inventory {
        Inventory {
            entries: self.entries,
            warnings: self.warnings.into_iter().collect(),
        }
    }

    fn warn(&mut self, warning: Warning) {
        if !self.warnings.contains(&warning) {
            tracing::debug!(%warning, "enumeration warning");
            self.warnings.insert(warning);
        }
    }

    /// Walk from `start` until everything it reaches has been visited
    fn run(&mut self, start: Step<'a>) -> Result<()> {
        let mut pending = vec![start];

        while let Some(step) = pending.pop() {
            match step {
                Step::Element(decl) => self.visit_element(decl, &mut pending)?,
                Step::NamedType(name) => self.enter_named_type(name, &mut pending),
                Step::Definition(definition) => enter_definition(definition, &mut pending),
                Step::Group(group) => push_particles(group, &mut pending),
                Step::GroupRef(name) => self.enter_group_ref(name, &mut pending),
                Step::ElementRef(name) => {
                    if self.schema.lookup_element(name).is_none() {
                        self.warn(Warning::UnresolvedElementRef { name: name.clone() });
                    }
                }
                Step::LeaveGroup => {
                    self.group_stack.pop();
                }
                Step::RestoreGroups(outer) => self.group_stack = outer,
            }
        }
        Ok(())
    }

    /// Emit an entry for `decl`, then schedule its type's content
    fn visit_element(
        &mut self,
        decl: &'a ElementDeclaration,
        pending: &mut Vec<Step<'a>>,
    ) -> Result<()> {
        let resolved = match self.declared_type(decl) {
            DeclaredType::Type(type_ref) => self.resolver.resolve(type_ref),
            DeclaredType::AnyType => self.resolver.resolve_name(&any_type_name()),
            DeclaredType::UnusableHead(head) => {
                // Already reported while following the chain
                self.record_unless_abstract(
                    decl,
                    EntryStatus::Unresolved {
                        unresolved_type: head,
                    },
                );
                return Ok(());
            }
        };
        let status = match resolved {
            Ok(definition) => EntryStatus::Resolved(classify(&definition)),
            Err(Error::UnresolvedReference(missing)) => {
                self.warn(Warning::UnresolvedReference {
                    element: decl.name.clone(),
                    type_name: missing.clone(),
                });
                EntryStatus::Unresolved {
                    unresolved_type: missing,
                }
            }
            Err(e) => return Err(e),
        };
        self.record_unless_abstract(decl, status);

        let content = match &decl.type_ref {
            Some(TypeRef::Named(name)) => Step::NamedType(name),
            Some(TypeRef::Inline(definition)) => Step::Definition(definition),
            None => return Ok(()),
        };
        // Group nesting restarts inside an element's own content
        pending.push(Step::RestoreGroups(std::mem::take(&mut self.group_stack)));
        pending.push(content);
        Ok(())
    }

    /// Follow the substitution group chain to the first declared type
    fn declared_type(&mut self, decl: &'a ElementDeclaration) -> DeclaredType<'a> {
        let schema = self.schema;
        let mut current = decl;
        let mut seen = HashSet::new();

        loop {
            if let Some(type_ref) = &current.type_ref {
                return DeclaredType::Type(type_ref);
            }
            let Some(head_name) = current.substitution_group.as_ref() else {
                return DeclaredType::AnyType;
            };
            if !seen.insert(&current.name) {
                self.warn(Warning::CircularSubstitution {
                    element: decl.name.clone(),
                });
                return DeclaredType::UnusableHead(current.name.clone());
            }
            match schema.lookup_element(head_name) {
                Some(head) => current = head,
                None => {
                    self.warn(Warning::UnresolvedElementRef {
                        name: head_name.clone(),
                    });
                    return DeclaredType::UnusableHead(head_name.clone());
                }
            }
        }
    }

    fn record_unless_abstract(&mut self, decl: &ElementDeclaration, status: EntryStatus) {
        if !decl.abstract_element || self.options.include_abstract {
            self.record(decl, status);
        }
    }

    /// First declaration wins; a conflicting later one is reported
    fn record(&mut self, decl: &ElementDeclaration, status: EntryStatus) {
        let conflict = match self.entries.get(&decl.name) {
            None => None,
            Some(existing) if existing.status == status => return,
            Some(existing) => Some(Warning::AmbiguousRedeclaration {
                name: decl.name.clone(),
                kept: existing.status.to_string(),
                ignored: status.to_string(),
            }),
        };

        match conflict {
            Some(warning) => self.warn(warning),
            None => {
                self.entries
                    .insert(decl.name.clone(), InventoryEntry::new(decl.name.clone(), status));
            }
        }
    }

    fn enter_named_type(&mut self, name: &'a QName, pending: &mut Vec<Step<'a>>) {
        if is_builtin(name) {
            return;
        }
        let schema = self.schema;
        // Missing types are reported against the elements that use them
        let Some(definition) = schema.lookup_type(name) else {
            return;
        };
        let key = definition.name().cloned().unwrap_or_else(|| name.clone());
        if self.visited_types.insert(key) {
            pending.push(Step::Definition(definition));
        }
    }

    fn enter_group_ref(&mut self, name: &'a QName, pending: &mut Vec<Step<'a>>) {
        let schema = self.schema;
        let Some(definition) = schema.lookup_group(name) else {
            self.warn(Warning::UnresolvedGroup { name: name.clone() });
            return;
        };

        if self.group_stack.contains(&definition.name) {
            self.warn(Warning::CircularGroup {
                name: definition.name.clone(),
            });
            return;
        }
        if !self.visited_groups.insert(definition.name.clone()) {
            return;
        }

        self.group_stack.insert(definition.name.clone());
        pending.push(Step::LeaveGroup);
        pending.push(Step::Group(&definition.group));
    }
}

/// Where an element's type comes from
enum DeclaredType<'a> {
    /// Its own type, or the first one along its substitution group chain
    Type(&'a TypeRef),
    /// Neither a type nor a substitution group
    AnyType,
    /// The head that is missing, or where the chain loops back
    UnusableHead(QName),
}

/// A unit of the depth-first walk still to be done
enum Step<'a> {
    Element(&'a ElementDeclaration),
    ElementRef(&'a QName),
    NamedType(&'a QName),
    Definition(&'a TypeDefinition),
    Group(&'a ModelGroup),
    GroupRef(&'a QName),
    /// Close the innermost named group
    LeaveGroup,
    /// Return to the group nesting around an element's content
    RestoreGroups(IndexSet<QName>),
}

/// Schedule a type's base before its own particles
fn enter_definition<'a>(definition: &'a TypeDefinition, pending: &mut Vec<Step<'a>>) {
    let TypeDefinition::Complex(complex_type) = definition else {
        return;
    };
    if let Some(group) = complex_type.particles() {
        pending.push(Step::Group(group));
    }
    if let Some(derivation) = &complex_type.derivation {
        pending.push(Step::NamedType(&derivation.base));
    }
}

/// Schedule particles so they are popped in document order
fn push_particles<'a>(group: &'a ModelGroup, pending: &mut Vec<Step<'a>>) {
    for particle in group.particles.iter().rev() {
        let step = match particle {
            Particle::Element(decl) => Step::Element(decl),
            Particle::ElementRef(name) => Step::ElementRef(name),
            Particle::GroupRef(name) => Step::GroupRef(name),
            Particle::Group(inner) => Step::Group(inner),
            Particle::Any => continue,
        };
        pending.push(step);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::XSD_1_0_NAMESPACE;
    use pretty_assertions::assert_eq;

    fn schema(body: &str) -> SchemaDocument {
        let xsd = format!(
            r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema">{}</xs:schema>"#,
            body
        );
        SchemaDocument::from_string(&xsd).unwrap()
    }

    fn resolved(is_simple_type: bool, content_kind: ContentKind) -> EntryStatus {
        EntryStatus::Resolved(Classification {
            is_simple_type,
            content_kind,
        })
    }

    fn names(inventory: &Inventory) -> Vec<String> {
        inventory
            .entries()
            .map(|e| e.qualified_name.to_string())
            .collect()
    }

    #[test]
    fn test_preorder_declaration_order() {
        let schema = schema(
            r#"<xs:element name="doc">
                 <xs:complexType>
                   <xs:sequence>
                     <xs:element name="head" type="xs:string"/>
                     <xs:element name="body">
                       <xs:complexType>
                         <xs:sequence><xs:element name="p" type="xs:string"/></xs:sequence>
                       </xs:complexType>
                     </xs:element>
                     <xs:element name="tail" type="xs:string"/>
                   </xs:sequence>
                 </xs:complexType>
               </xs:element>
               <xs:element name="other" type="xs:int"/>"#,
        );
        let inventory = enumerate(&schema).unwrap();
        assert_eq!(names(&inventory), vec!["doc", "head", "body", "p", "tail", "other"]);
    }

    #[test]
    fn test_named_type_walked_once() {
        let schema = schema(
            r#"<xs:complexType name="t">
                 <xs:sequence><xs:element name="inner" type="xs:string"/></xs:sequence>
               </xs:complexType>
               <xs:element name="a" type="t"/>
               <xs:element name="b" type="t"/>"#,
        );
        let inventory = enumerate(&schema).unwrap();
        assert_eq!(names(&inventory), vec!["a", "inner", "b"]);
        assert!(inventory.warnings().is_empty());
    }

    #[test]
    fn test_group_references_expand_in_place() {
        let schema = schema(
            r#"<xs:group name="g">
                 <xs:sequence><xs:element name="fromGroup" type="xs:string"/></xs:sequence>
               </xs:group>
               <xs:element name="root">
                 <xs:complexType>
                   <xs:sequence>
                     <xs:element name="first" type="xs:string"/>
                     <xs:group ref="g"/>
                     <xs:element name="last" type="xs:string"/>
                   </xs:sequence>
                 </xs:complexType>
               </xs:element>"#,
        );
        let inventory = enumerate(&schema).unwrap();
        assert_eq!(names(&inventory), vec!["root", "first", "fromGroup", "last"]);
    }

    #[test]
    fn test_element_refs_emit_nothing() {
        let schema = schema(
            r#"<xs:element name="root">
                 <xs:complexType>
                   <xs:sequence>
                     <xs:element ref="leaf"/>
                     <xs:element ref="ghost"/>
                   </xs:sequence>
                 </xs:complexType>
               </xs:element>
               <xs:element name="leaf" type="xs:string"/>"#,
        );
        let inventory = enumerate(&schema).unwrap();
        assert_eq!(names(&inventory), vec!["root", "leaf"]);
        assert_eq!(
            inventory.warnings(),
            &[Warning::UnresolvedElementRef {
                name: QName::local("ghost")
            }]
        );
    }

    #[test]
    fn test_abstract_elements_are_omitted_by_default() {
        let schema = schema(
            r#"<xs:element name="block" abstract="true">
                 <xs:complexType mixed="true">
                   <xs:sequence><xs:element name="inside" type="xs:string"/></xs:sequence>
                 </xs:complexType>
               </xs:element>
               <xs:element name="p" substitutionGroup="block"/>"#,
        );

        let inventory = enumerate(&schema).unwrap();
        assert_eq!(names(&inventory), vec!["inside", "p"]);
        // p inherits the head's type
        assert_eq!(
            inventory.get(&QName::local("p")).unwrap().status,
            resolved(false, ContentKind::Mixed)
        );

        let options = EnumerateOptions::new().with_abstract(true);
        let inventory = enumerate_with(&schema, &options).unwrap();
        assert_eq!(names(&inventory), vec!["block", "inside", "p"]);
    }

    #[test]
    fn test_untyped_element_is_any_type() {
        let schema = schema(r#"<xs:element name="anything"/>"#);
        let inventory = enumerate(&schema).unwrap();
        assert_eq!(
            inventory.get(&QName::local("anything")).unwrap().status,
            resolved(false, ContentKind::Mixed)
        );
    }

    #[test]
    fn test_circular_substitution_group() {
        let schema = schema(
            r#"<xs:element name="a" substitutionGroup="b"/>
               <xs:element name="b" substitutionGroup="a"/>"#,
        );
        let inventory = enumerate(&schema).unwrap();
        assert_eq!(inventory.len(), 2);
        assert!(inventory
            .warnings()
            .iter()
            .any(|w| matches!(w, Warning::CircularSubstitution { .. })));
        assert_eq!(
            inventory.get(&QName::local("a")).unwrap().status,
            EntryStatus::Unresolved {
                unresolved_type: QName::local("a")
            }
        );
        assert_eq!(inventory.get(&QName::local("b")).unwrap().to_tsv(), "b\t---\t---");
    }

    #[test]
    fn test_missing_substitution_head_is_unresolved() {
        let schema = schema(r#"<xs:element name="p" substitutionGroup="ghostHead"/>"#);
        let inventory = enumerate(&schema).unwrap();

        let p = inventory.get(&QName::local("p")).unwrap();
        assert!(!p.is_resolved());
        assert_eq!(
            p.status,
            EntryStatus::Unresolved {
                unresolved_type: QName::local("ghostHead")
            }
        );
        assert_eq!(
            inventory.warnings(),
            &[Warning::UnresolvedElementRef {
                name: QName::local("ghostHead")
            }]
        );
    }

    #[test]
    fn test_long_type_chain_does_not_exhaust_the_stack() {
        let count = 20_000;
        let mut body = String::from(r#"<xs:element name="root" type="t0"/>"#);
        for i in 0..count {
            body.push_str(&format!(
                r#"<xs:complexType name="t{}"><xs:sequence><xs:element name="e{}" type="t{}"/></xs:sequence></xs:complexType>"#,
                i,
                i,
                i + 1
            ));
        }
        body.push_str(&format!(
            r#"<xs:simpleType name="t{}"><xs:restriction base="xs:string"/></xs:simpleType>"#,
            count
        ));
        let schema = schema(&body);

        let inventory = enumerate(&schema).unwrap();
        assert_eq!(inventory.len(), count + 1);
        let names: Vec<String> = inventory
            .entries()
            .take(3)
            .map(|entry| entry.qualified_name.to_string())
            .collect();
        assert_eq!(names, vec!["root", "e0", "e1"]);
        assert_eq!(
            inventory.entries().last().unwrap().to_tsv(),
            format!("e{}\tsimple\tsimple", count - 1)
        );
        assert!(inventory.warnings().is_empty());
    }

    #[test]
    fn test_long_group_chain_does_not_exhaust_the_stack() {
        let count = 40_000;
        let mut body = String::from(
            r#"<xs:element name="root"><xs:complexType><xs:group ref="g0"/></xs:complexType></xs:element>"#,
        );
        for i in 0..count {
            body.push_str(&format!(
                r#"<xs:group name="g{}"><xs:sequence><xs:group ref="g{}"/></xs:sequence></xs:group>"#,
                i,
                i + 1
            ));
        }
        body.push_str(&format!(
            r#"<xs:group name="g{}"><xs:sequence><xs:element name="leaf" type="xs:string"/></xs:sequence></xs:group>"#,
            count
        ));
        let schema = schema(&body);

        let inventory = enumerate(&schema).unwrap();
        assert_eq!(names(&inventory), vec!["root", "leaf"]);
        assert_eq!(
            inventory.get(&QName::local("root")).unwrap().content_kind(),
            Some(ContentKind::ElementOnly)
        );
        assert!(inventory.warnings().is_empty());
    }

    #[test]
    fn test_first_declaration_wins() {
        let schema = schema(
            r#"<xs:element name="root">
                 <xs:complexType>
                   <xs:choice>
                     <xs:element name="x" type="xs:string"/>
                     <xs:element name="nested">
                       <xs:complexType>
                         <xs:sequence>
                           <xs:element name="x">
                             <xs:complexType><xs:sequence><xs:any/></xs:sequence></xs:complexType>
                           </xs:element>
                         </xs:sequence>
                       </xs:complexType>
                     </xs:element>
                   </xs:choice>
                 </xs:complexType>
               </xs:element>"#,
        );
        let inventory = enumerate(&schema).unwrap();

        assert_eq!(names(&inventory), vec!["root", "x", "nested"]);
        assert_eq!(
            inventory.get(&QName::local("x")).unwrap().status,
            resolved(true, ContentKind::Simple)
        );
        assert_eq!(
            inventory.warnings(),
            &[Warning::AmbiguousRedeclaration {
                name: QName::local("x"),
                kept: "simple simple".to_string(),
                ignored: "complex elementOnly".to_string(),
            }]
        );
    }

    #[test]
    fn test_unresolved_type_gets_marker_and_one_warning() {
        let schema = schema(
            r#"<xs:element name="para" type="missing:Type"/>
               <xs:element name="title" type="xs:string"/>"#,
        );
        let inventory = enumerate(&schema).unwrap();

        let para = inventory.get(&QName::local("para")).unwrap();
        assert!(!para.is_resolved());
        assert_eq!(
            para.status,
            EntryStatus::Unresolved {
                unresolved_type: QName::local("missing:Type")
            }
        );
        assert_eq!(inventory.warnings().len(), 1);
        assert!(inventory.get(&QName::local("title")).unwrap().is_resolved());
    }

    #[test]
    fn test_cyclic_derivation_is_fatal() {
        let schema = schema(
            r#"<xs:complexType name="A"><xs:complexContent><xs:extension base="B"/></xs:complexContent></xs:complexType>
               <xs:complexType name="B"><xs:complexContent><xs:extension base="A"/></xs:complexContent></xs:complexType>
               <xs:element name="fine" type="xs:string"/>"#,
        );
        assert!(matches!(enumerate(&schema), Err(Error::CyclicDerivation { .. })));
    }

    #[test]
    fn test_self_referential_element_terminates() {
        let schema = schema(
            r#"<xs:element name="div">
                 <xs:complexType>
                   <xs:sequence>
                     <xs:element ref="div" minOccurs="0" maxOccurs="unbounded"/>
                   </xs:sequence>
                 </xs:complexType>
               </xs:element>
               <xs:complexType name="list">
                 <xs:sequence>
                   <xs:element name="item" type="list" minOccurs="0"/>
                 </xs:sequence>
               </xs:complexType>
               <xs:element name="list" type="list"/>"#,
        );
        let inventory = enumerate(&schema).unwrap();
        assert_eq!(names(&inventory), vec!["div", "list", "item"]);
        assert_eq!(
            inventory.get(&QName::local("item")).unwrap().status,
            resolved(false, ContentKind::ElementOnly)
        );
    }

    #[test]
    fn test_circular_group_reference() {
        let schema = schema(
            r#"<xs:group name="loop">
                 <xs:sequence>
                   <xs:element name="a" type="xs:string"/>
                   <xs:group ref="loop"/>
                 </xs:sequence>
               </xs:group>
               <xs:element name="root"><xs:complexType><xs:group ref="loop"/></xs:complexType></xs:element>"#,
        );
        let inventory = enumerate(&schema).unwrap();
        assert_eq!(names(&inventory), vec!["root", "a"]);
        assert_eq!(
            inventory.warnings(),
            &[Warning::CircularGroup {
                name: QName::local("loop")
            }]
        );
    }

    #[test]
    fn test_recursion_through_elements_is_not_a_circular_group() {
        let schema = schema(
            r#"<xs:group name="inline">
                 <xs:choice>
                   <xs:element name="hi">
                     <xs:complexType mixed="true"><xs:group ref="inline"/></xs:complexType>
                   </xs:element>
                 </xs:choice>
               </xs:group>
               <xs:element name="p"><xs:complexType mixed="true"><xs:group ref="inline"/></xs:complexType></xs:element>"#,
        );
        let inventory = enumerate(&schema).unwrap();
        assert_eq!(names(&inventory), vec!["p", "hi"]);
        assert!(inventory.warnings().is_empty());
    }

    #[test]
    fn test_unreferenced_definitions() {
        let schema = schema(
            r#"<xs:complexType name="unused">
                 <xs:sequence><xs:element name="hidden" type="xs:string"/></xs:sequence>
               </xs:complexType>
               <xs:group name="alsoUnused">
                 <xs:sequence><xs:element name="tucked" type="xs:string"/></xs:sequence>
               </xs:group>
               <xs:element name="root" type="xs:string"/>"#,
        );

        let inventory = enumerate(&schema).unwrap();
        assert_eq!(names(&inventory), vec!["root", "hidden", "tucked"]);

        let options = EnumerateOptions::new().with_unreferenced(false);
        let inventory = enumerate_with(&schema, &options).unwrap();
        assert_eq!(names(&inventory), vec!["root"]);
    }

    #[test]
    fn test_load_warnings_come_first() {
        let schema = schema(
            r#"<xs:redefine schemaLocation="x.xsd"/>
               <xs:element name="a" type="nope"/>"#,
        );
        let inventory = enumerate(&schema).unwrap();
        assert!(matches!(
            inventory.warnings(),
            [Warning::UnsupportedConstruct { .. }, Warning::UnresolvedReference { .. }]
        ));
    }

    #[test]
    fn test_tsv_output() {
        let schema = schema(
            r#"<xs:element name="title" type="xs:string"/>
               <xs:element name="br"><xs:complexType/></xs:element>
               <xs:element name="para" type="missing:Type"/>"#,
        );
        let inventory = enumerate(&schema).unwrap();
        assert_eq!(
            inventory.to_tsv(),
            "title\tsimple\tsimple\nbr\tcomplex\tnone\npara\t---\t---\n"
        );
    }

    #[test]
    fn test_json_output() {
        let schema = schema(
            r#"<xs:element name="title" type="xs:string"/>
               <xs:element name="para" type="missing:Type"/>"#,
        );
        let inventory = enumerate(&schema).unwrap();
        let json: serde_json::Value = serde_json::from_str(&inventory.to_json().unwrap()).unwrap();

        assert_eq!(
            json["elements"][0],
            serde_json::json!({
                "qualifiedName": "title",
                "isSimpleType": true,
                "contentKind": "simple"
            })
        );
        assert_eq!(
            json["elements"][1],
            serde_json::json!({
                "qualifiedName": "para",
                "unresolvedType": "missing:Type"
            })
        );
        assert_eq!(json["warnings"][0]["kind"], "unresolvedReference");
        assert_eq!(json["warnings"][0]["typeName"], "missing:Type");
        assert!(json["warnings"][0]["message"].as_str().unwrap().contains("para"));
    }

    #[test]
    fn test_sorted() {
        let inventory = Inventory::new(
            vec![
                InventoryEntry::new(QName::local("zeta"), resolved(true, ContentKind::Simple)),
                InventoryEntry::new(QName::local("alpha"), resolved(true, ContentKind::Simple)),
            ],
            Vec::new(),
        );
        assert_eq!(names(&inventory.sorted()), vec!["alpha", "zeta"]);
        assert_eq!(names(&inventory), vec!["zeta", "alpha"]);
    }

    #[test]
    fn test_overlay() {
        let mut base = Inventory::new(
            vec![
                InventoryEntry::new(QName::local("p"), resolved(false, ContentKind::ElementOnly)),
                InventoryEntry::new(QName::local("hi"), resolved(false, ContentKind::Mixed)),
            ],
            Vec::new(),
        );
        let custom = Inventory::new(
            vec![
                InventoryEntry::new(QName::local("p"), resolved(false, ContentKind::Mixed)),
                InventoryEntry::new(QName::local("hi"), resolved(false, ContentKind::Mixed)),
                InventoryEntry::new(QName::local("new"), resolved(true, ContentKind::Simple)),
            ],
            Vec::new(),
        );

        let report = base.overlay(&custom);
        assert_eq!(report.identical, 1);
        assert_eq!(report.added, 1);
        assert_eq!(report.overrides.len(), 1);
        assert_eq!(
            report.overrides[0].to_string(),
            "p: complex elementOnly ==> complex mixed"
        );
        assert_eq!(
            base.get(&QName::local("p")).unwrap().content_kind(),
            Some(ContentKind::Mixed)
        );
        assert_eq!(names(&base), vec!["p", "hi", "new"]);
    }

    #[test]
    fn test_enumeration_is_deterministic() {
        let schema = schema(
            r#"<xs:element name="a"><xs:complexType><xs:sequence>
                 <xs:element name="b" type="xs:string"/><xs:element ref="c"/>
               </xs:sequence></xs:complexType></xs:element>
               <xs:element name="c" type="xs:anyType"/>"#,
        );
        let first = enumerate(&schema).unwrap();
        let second = enumerate(&schema).unwrap();
        assert_eq!(first, second);
        assert_eq!(
            first.get(&QName::local("c")).unwrap().status,
            resolved(false, ContentKind::Mixed)
        );
        assert_eq!(any_type_name(), QName::namespaced(XSD_1_0_NAMESPACE, "anyType"));
    }
}
