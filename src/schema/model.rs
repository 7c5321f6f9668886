//! Schema component model
//!
//! Declarations and definitions as they are written in the schema, before any
//! base-type resolution. Inline anonymous types are owned by the declaration
//! that carries them and never appear in the named-type table.

use std::fmt;

use crate::namespaces::QName;

/// Where an element is declared
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Scope {
    /// Top-level child of `xs:schema`
    #[default]
    Global,
    /// Nested inside a model group
    Local,
}

/// An element declaration (`xs:element` with a `name`)
#[derive(Debug, Clone, PartialEq)]
pub struct ElementDeclaration {
    /// Qualified name of the element
    pub name: QName,
    /// Declared type; `None` when neither `type` nor an inline type is given
    pub type_ref: Option<TypeRef>,
    /// Global or local declaration
    pub scope: Scope,
    /// `abstract="true"`
    pub abstract_element: bool,
    /// Head of the substitution group this element belongs to
    pub substitution_group: Option<QName>,
    /// Line of the declaration in the schema source
    pub line: usize,
}

impl ElementDeclaration {
    /// Create a global declaration with no type
    pub fn new(name: QName) -> Self {
        Self {
            name,
            type_ref: None,
            scope: Scope::Global,
            abstract_element: false,
            substitution_group: None,
            line: 0,
        }
    }

    /// Is this a top-level declaration?
    pub fn is_global(&self) -> bool {
        self.scope == Scope::Global
    }
}

/// Reference from a declaration to its type
#[derive(Debug, Clone, PartialEq)]
pub enum TypeRef {
    /// Key into the named-type table or the built-in types
    Named(QName),
    /// Anonymous type owned by the declaration
    Inline(Box<TypeDefinition>),
}

impl TypeRef {
    /// The referenced name, if this is a named reference
    pub fn name(&self) -> Option<&QName> {
        match self {
            TypeRef::Named(name) => Some(name),
            TypeRef::Inline(_) => None,
        }
    }
}

/// A simple or complex type definition
#[derive(Debug, Clone, PartialEq)]
pub enum TypeDefinition {
    /// `xs:simpleType` or a built-in simple type
    Simple(SimpleType),
    /// `xs:complexType` or `xs:anyType`
    Complex(ComplexType),
}

impl TypeDefinition {
    /// Name of the definition; `None` for anonymous types
    pub fn name(&self) -> Option<&QName> {
        match self {
            TypeDefinition::Simple(st) => st.name.as_ref(),
            TypeDefinition::Complex(ct) => ct.name.as_ref(),
        }
    }

    /// Whether this is a simple type
    pub fn is_simple(&self) -> bool {
        matches!(self, TypeDefinition::Simple(_))
    }
}

/// A simple type: only a value space, no content structure
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SimpleType {
    /// Type name; `None` when anonymous
    pub name: Option<QName>,
    /// Restriction base
    pub base: Option<QName>,
}

/// Derivation method of a complex type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DerivationMethod {
    /// `xs:extension`
    Extension,
    /// `xs:restriction`
    Restriction,
}

impl fmt::Display for DerivationMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Extension => write!(f, "extension"),
            Self::Restriction => write!(f, "restriction"),
        }
    }
}

/// Derivation of a complex type from a named base
#[derive(Debug, Clone, PartialEq)]
pub struct Derivation {
    /// Extension or restriction
    pub method: DerivationMethod,
    /// Base type name
    pub base: QName,
    /// Declared in `xs:simpleContent` rather than `xs:complexContent`
    pub simple_content: bool,
}

/// Content model of a complex type
#[derive(Debug, Clone, PartialEq)]
pub enum ContentModel {
    /// No character data and no child elements
    Empty,
    /// Child elements only
    ElementOnly(ModelGroup),
    /// Child elements interleaved with character data
    Mixed(ModelGroup),
    /// Character data only (`xs:simpleContent`)
    Simple,
}

impl ContentModel {
    /// The particle group, if the content model has one
    pub fn group(&self) -> Option<&ModelGroup> {
        match self {
            ContentModel::ElementOnly(group) | ContentModel::Mixed(group) => Some(group),
            ContentModel::Empty | ContentModel::Simple => None,
        }
    }
}

/// A complex type definition
#[derive(Debug, Clone, PartialEq)]
pub struct ComplexType {
    /// Type name; `None` when anonymous
    pub name: Option<QName>,
    /// Explicit `mixed` attribute on the type or its `xs:complexContent`
    pub mixed: Option<bool>,
    /// Content model as written, before merging with the base type
    pub content: ContentModel,
    /// Base type derivation
    pub derivation: Option<Derivation>,
}

impl ComplexType {
    /// A complex type with the given content and nothing else
    pub fn new(name: Option<QName>, content: ContentModel) -> Self {
        Self {
            name,
            mixed: None,
            content,
            derivation: None,
        }
    }

    /// Whether the type says `mixed="true"`
    pub fn is_mixed(&self) -> bool {
        self.mixed == Some(true)
    }

    /// The locally written particle group, if any
    pub fn particles(&self) -> Option<&ModelGroup> {
        self.content.group()
    }
}

/// Model group compositor type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ModelType {
    /// Ordered sequence of particles
    #[default]
    Sequence,
    /// One of multiple alternatives
    Choice,
    /// Unordered set of particles
    All,
}

impl ModelType {
    /// Parse from a compositor's local name
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "sequence" => Some(Self::Sequence),
            "choice" => Some(Self::Choice),
            "all" => Some(Self::All),
            _ => None,
        }
    }
}

impl fmt::Display for ModelType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sequence => write!(f, "sequence"),
            Self::Choice => write!(f, "choice"),
            Self::All => write!(f, "all"),
        }
    }
}

/// A sequence, choice or all group
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ModelGroup {
    /// Compositor
    pub compositor: ModelType,
    /// Particles in declaration order
    pub particles: Vec<Particle>,
}

impl ModelGroup {
    /// Create an empty group
    pub fn new(compositor: ModelType) -> Self {
        Self {
            compositor,
            particles: Vec::new(),
        }
    }

    /// Whether the group has no particles at all
    pub fn is_empty(&self) -> bool {
        self.particles.is_empty()
    }

    /// Base particles followed by extension particles
    pub fn extended_by(&self, extension: &ModelGroup) -> ModelGroup {
        if self.is_empty() {
            return extension.clone();
        }
        if extension.is_empty() {
            return self.clone();
        }
        ModelGroup {
            compositor: ModelType::Sequence,
            particles: vec![
                Particle::Group(self.clone()),
                Particle::Group(extension.clone()),
            ],
        }
    }
}

/// A member of a model group
#[derive(Debug, Clone, PartialEq)]
pub enum Particle {
    /// Local element declaration
    Element(ElementDeclaration),
    /// Reference to a global element
    ElementRef(QName),
    /// Reference to a named model group
    GroupRef(QName),
    /// Nested anonymous group
    Group(ModelGroup),
    /// Element wildcard
    Any,
}

/// A named model group (`xs:group` with a `name`)
#[derive(Debug, Clone, PartialEq)]
pub struct GroupDefinition {
    /// Group name
    pub name: QName,
    /// Group content
    pub group: ModelGroup,
    /// Line of the definition in the schema source
    pub line: usize,
}

/// Form of local declarations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FormDefault {
    /// Local names are in no namespace
    #[default]
    Unqualified,
    /// Local names are in the target namespace
    Qualified,
}

impl FormDefault {
    /// Parse an `elementFormDefault` / `form` value
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim() {
            "qualified" => Some(Self::Qualified),
            "unqualified" => Some(Self::Unqualified),
            _ => None,
        }
    }

    /// Check if qualified
    pub fn is_qualified(&self) -> bool {
        *self == Self::Qualified
    }
}

/// An `xs:import`, recorded but not followed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Import {
    /// Imported namespace
    pub namespace: Option<String>,
    /// Schema location hint
    pub schema_location: Option<String>,
}
