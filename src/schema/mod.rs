//! XSD schema loading, type resolution and content classification
//!
//! [`SchemaDocument`] is the loaded form of a single schema file. It owns every
//! declaration and definition found in it and is immutable once loaded.
//! Resolution ([`resolver`]) and classification ([`classify`]) are pure
//! functions over it.

pub mod builtins;
pub mod classify;
pub mod model;
pub mod parsing;
pub mod resolver;

use std::path::Path;

use indexmap::{IndexMap, IndexSet};

pub use model::{
    ComplexType, ContentModel, Derivation, DerivationMethod, ElementDeclaration, FormDefault,
    GroupDefinition, Import, ModelGroup, ModelType, Particle, Scope, SimpleType, TypeDefinition,
    TypeRef,
};

use crate::documents::Document;
use crate::error::Result;
use crate::limits::Limits;
use crate::loaders::Loader;
use crate::locations::Location;
use crate::namespaces::QName;
use crate::warnings::Warning;
use crate::XSD_1_0_NAMESPACE;

/// A loaded XSD schema document
#[derive(Debug, Clone)]
pub struct SchemaDocument {
    /// Target namespace
    pub target_namespace: Option<String>,
    /// Namespace of the `xs:schema` root (XSD 1.0 or 1.1)
    pub xsd_namespace: String,
    /// `elementFormDefault`
    pub element_form_default: FormDefault,
    /// Top-level element declarations in declaration order
    pub elements: IndexMap<QName, ElementDeclaration>,
    /// Named simple and complex types
    pub types: IndexMap<QName, TypeDefinition>,
    /// Named model groups
    pub groups: IndexMap<QName, GroupDefinition>,
    /// Names of top-level attribute declarations
    pub attributes: IndexSet<QName>,
    /// Named attribute groups
    pub attribute_groups: IndexSet<QName>,
    /// Recorded `xs:import`s
    pub imports: Vec<Import>,
    /// Recorded `xs:include` locations
    pub includes: Vec<String>,
    /// Problems found while loading
    pub warnings: Vec<Warning>,
    /// Where the schema was read from
    pub source: Option<String>,
    limits: Limits,
}

impl Default for SchemaDocument {
    fn default() -> Self {
        Self::new()
    }
}

impl SchemaDocument {
    /// Create an empty schema
    pub fn new() -> Self {
        Self {
            target_namespace: None,
            xsd_namespace: XSD_1_0_NAMESPACE.to_string(),
            element_form_default: FormDefault::default(),
            elements: IndexMap::new(),
            types: IndexMap::new(),
            groups: IndexMap::new(),
            attributes: IndexSet::new(),
            attribute_groups: IndexSet::new(),
            imports: Vec::new(),
            includes: Vec::new(),
            warnings: Vec::new(),
            source: None,
            limits: Limits::default(),
        }
    }

    /// Parse a schema from a string
    pub fn from_string(xsd: &str) -> Result<Self> {
        Self::from_bytes(xsd.as_bytes())
    }

    /// Parse a schema from bytes
    pub fn from_bytes(xsd: &[u8]) -> Result<Self> {
        Self::parse_with_limits(xsd, &Limits::default())
    }

    /// Parse a schema from bytes with the given limits
    pub fn parse_with_limits(xsd: &[u8], limits: &Limits) -> Result<Self> {
        let doc = Document::parse_with_limits(xsd, limits)?;
        parsing::parse_schema(&doc.root, limits)
    }

    /// Load a schema from a file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let location = Location::Path(path.as_ref().to_path_buf());
        Self::from_location(&location, &Loader::new())
    }

    /// Load a schema from any supported location
    pub fn from_location(location: &Location, loader: &Loader) -> Result<Self> {
        let content = loader.load(location)?;
        let mut schema = Self::parse_with_limits(content.as_bytes(), loader.limits())?;
        schema.source = Some(location.as_str());
        tracing::info!(
            source = %location.as_str(),
            elements = schema.elements.len(),
            types = schema.types.len(),
            groups = schema.groups.len(),
            warnings = schema.warnings.len(),
            "loaded schema"
        );
        Ok(schema)
    }

    /// The limits the schema was loaded with
    pub fn limits(&self) -> &Limits {
        &self.limits
    }

    pub(crate) fn set_limits(&mut self, limits: Limits) {
        self.limits = limits;
    }

    /// Record a load warning
    pub(crate) fn warn(&mut self, warning: Warning) {
        tracing::debug!(%warning, "schema warning");
        self.warnings.push(warning);
    }

    /// Number of global components defined
    pub fn component_count(&self) -> usize {
        self.elements.len()
            + self.types.len()
            + self.groups.len()
            + self.attributes.len()
            + self.attribute_groups.len()
    }

    /// Create a QName in the target namespace
    pub fn target_qname(&self, local_name: &str) -> QName {
        QName::new(self.target_namespace.as_deref(), local_name)
    }

    /// Look up a global element declaration
    pub fn lookup_element(&self, name: &QName) -> Option<&ElementDeclaration> {
        lookup_lenient(&self.elements, name, self.target_namespace.as_deref())
    }

    /// Look up a named type definition (built-in types are not included)
    pub fn lookup_type(&self, name: &QName) -> Option<&TypeDefinition> {
        lookup_lenient(&self.types, name, self.target_namespace.as_deref())
    }

    /// Look up a named model group
    pub fn lookup_group(&self, name: &QName) -> Option<&GroupDefinition> {
        lookup_lenient(&self.groups, name, self.target_namespace.as_deref())
    }
}

/// Exact lookup, then a retry in the target namespace for no-namespace names
fn lookup_lenient<'a, T>(
    table: &'a IndexMap<QName, T>,
    name: &QName,
    target_namespace: Option<&str>,
) -> Option<&'a T> {
    if let Some(found) = table.get(name) {
        return Some(found);
    }
    match (&name.namespace, target_namespace) {
        (None, Some(target)) => table.get(&name.with_namespace(Some(target))),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const BOOK_XSD: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema"
           xmlns:book="http://example.com/book"
           targetNamespace="http://example.com/book"
           elementFormDefault="qualified">
    <xs:element name="book" type="book:bookType"/>
    <xs:complexType name="bookType">
        <xs:sequence>
            <xs:element name="title" type="xs:string"/>
        </xs:sequence>
    </xs:complexType>
    <xs:group name="meta">
        <xs:sequence>
            <xs:element name="isbn" type="xs:string"/>
        </xs:sequence>
    </xs:group>
</xs:schema>"#;

    #[test]
    fn test_lookup_is_lenient_for_unqualified_names() {
        let schema = SchemaDocument::from_string(BOOK_XSD).unwrap();

        let exact = QName::namespaced("http://example.com/book", "bookType");
        assert!(schema.lookup_type(&exact).is_some());
        assert!(schema.lookup_type(&QName::local("bookType")).is_some());
        assert!(schema.lookup_element(&QName::local("book")).is_some());
        assert!(schema.lookup_group(&QName::local("meta")).is_some());
        assert!(schema
            .lookup_type(&QName::namespaced("urn:other", "bookType"))
            .is_none());
    }

    #[test]
    fn test_component_count() {
        let schema = SchemaDocument::from_string(BOOK_XSD).unwrap();
        assert_eq!(schema.component_count(), 3);
    }

    #[test]
    fn test_from_file_records_source() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "{}", BOOK_XSD).unwrap();

        let schema = SchemaDocument::from_file(file.path()).unwrap();
        assert_eq!(
            schema.source.as_deref(),
            Some(file.path().to_string_lossy().as_ref())
        );
    }

    #[test]
    fn test_from_missing_file() {
        let result = SchemaDocument::from_file("/nonexistent/schema.xsd");
        assert!(matches!(result, Err(Error::Resource(_))));
    }

    #[test]
    fn test_limits_are_kept() {
        let limits = Limits::strict();
        let schema = SchemaDocument::parse_with_limits(BOOK_XSD.as_bytes(), &limits).unwrap();
        assert_eq!(schema.limits(), &limits);
    }
}
