//! XSD Document Parsing
//!
//! This module turns the element tree of an XSD document into a
//! [`SchemaDocument`]. Constructs outside the supported scope are reported as
//! warnings and skipped; only a document that is not an XSD schema at all is
//! rejected.

use super::builtins::is_xsd_namespace;
use super::model::{
    ComplexType, ContentModel, Derivation, DerivationMethod, ElementDeclaration, FormDefault,
    GroupDefinition, Import, ModelGroup, ModelType, Particle, Scope, SimpleType, TypeDefinition,
    TypeRef,
};
use super::SchemaDocument;

use crate::documents::Element;
use crate::error::{Error, ParseError, Result};
use crate::limits::Limits;
use crate::names::is_valid_ncname;
use crate::namespaces::QName;
use crate::warnings::Warning;

/// XSD element local names
mod xsd_elements {
    pub const SCHEMA: &str = "schema";
    pub const ELEMENT: &str = "element";
    pub const COMPLEX_TYPE: &str = "complexType";
    pub const SIMPLE_TYPE: &str = "simpleType";
    pub const ATTRIBUTE: &str = "attribute";
    pub const ATTRIBUTE_GROUP: &str = "attributeGroup";
    pub const GROUP: &str = "group";
    pub const SEQUENCE: &str = "sequence";
    pub const CHOICE: &str = "choice";
    pub const ALL: &str = "all";
    pub const ANNOTATION: &str = "annotation";
    pub const IMPORT: &str = "import";
    pub const INCLUDE: &str = "include";
    pub const NOTATION: &str = "notation";
    pub const RESTRICTION: &str = "restriction";
    pub const EXTENSION: &str = "extension";
    pub const COMPLEX_CONTENT: &str = "complexContent";
    pub const SIMPLE_CONTENT: &str = "simpleContent";
    pub const ANY: &str = "any";
    pub const ANY_ATTRIBUTE: &str = "anyAttribute";
    pub const ASSERT: &str = "assert";
    pub const OPEN_CONTENT: &str = "openContent";
    // Identity constraints
    pub const UNIQUE: &str = "unique";
    pub const KEY: &str = "key";
    pub const KEYREF: &str = "keyref";
}

/// XSD attribute names
mod xsd_attrs {
    pub const NAME: &str = "name";
    pub const TYPE: &str = "type";
    pub const REF: &str = "ref";
    pub const BASE: &str = "base";
    pub const TARGET_NAMESPACE: &str = "targetNamespace";
    pub const ELEMENT_FORM_DEFAULT: &str = "elementFormDefault";
    pub const FORM: &str = "form";
    pub const MIXED: &str = "mixed";
    pub const ABSTRACT: &str = "abstract";
    pub const SUBSTITUTION_GROUP: &str = "substitutionGroup";
    pub const NAMESPACE: &str = "namespace";
    pub const SCHEMA_LOCATION: &str = "schemaLocation";
}

/// Build a [`SchemaDocument`] from the root of a parsed document
pub fn parse_schema(root: &Element, limits: &Limits) -> Result<SchemaDocument> {
    if root.local_name() != xsd_elements::SCHEMA || !is_xsd_element(root) {
        return Err(Error::MalformedSchema(
            ParseError::new(format!("Expected xs:schema root element, got {}", root.qname))
                .with_location(format!("line {}", root.line)),
        ));
    }

    let mut schema = SchemaDocument::new();
    schema.set_limits(limits.clone());
    parse_schema_element(&mut schema, root)?;
    Ok(schema)
}

/// Parse the xs:schema root element
fn parse_schema_element(schema: &mut SchemaDocument, elem: &Element) -> Result<()> {
    if let Some(ns) = elem.namespace() {
        schema.xsd_namespace = ns.to_string();
    }

    if let Some(ns) = elem.get_attribute(xsd_attrs::TARGET_NAMESPACE) {
        if !ns.is_empty() {
            schema.target_namespace = Some(ns.to_string());
        }
    }

    if let Some(efd) = elem.get_attribute(xsd_attrs::ELEMENT_FORM_DEFAULT) {
        if let Some(form) = FormDefault::parse(efd) {
            schema.element_form_default = form;
        }
    }

    for child in &elem.children {
        let result = parse_schema_child(schema, child);
        recover(schema, child, "schema", result)?;
        schema
            .limits()
            .check_schema_components(schema.component_count())?;
    }

    Ok(())
}

/// Parse a child element of xs:schema
fn parse_schema_child(schema: &mut SchemaDocument, elem: &Element) -> Result<()> {
    if !is_xsd_element(elem) {
        return unsupported(elem);
    }

    match elem.local_name() {
        xsd_elements::ELEMENT => parse_global_element(schema, elem),
        xsd_elements::COMPLEX_TYPE | xsd_elements::SIMPLE_TYPE => parse_global_type(schema, elem),
        xsd_elements::GROUP => parse_group(schema, elem),
        xsd_elements::ATTRIBUTE => parse_global_attribute(schema, elem),
        xsd_elements::ATTRIBUTE_GROUP => parse_attribute_group(schema, elem),
        xsd_elements::IMPORT => parse_import(schema, elem),
        xsd_elements::INCLUDE => parse_include(schema, elem),
        xsd_elements::ANNOTATION | xsd_elements::NOTATION => Ok(()),
        // redefine, override, defaultOpenContent and anything unknown
        _ => unsupported(elem),
    }
}

/// Parse a global element declaration
fn parse_global_element(schema: &mut SchemaDocument, elem: &Element) -> Result<()> {
    let Some(name) = required_name(schema, elem, "global element") else {
        return Ok(());
    };

    let qname = schema.target_qname(&name);
    let mut decl = parse_element_body(schema, elem, qname.clone())?;
    decl.scope = Scope::Global;

    if schema.elements.contains_key(&qname) {
        duplicate(schema, "element", qname);
    } else {
        schema.elements.insert(qname, decl);
    }
    Ok(())
}

/// Parse a global complex or simple type definition
fn parse_global_type(schema: &mut SchemaDocument, elem: &Element) -> Result<()> {
    let component = elem.local_name();
    let Some(name) = required_name(schema, elem, component) else {
        return Ok(());
    };

    let qname = schema.target_qname(&name);
    let definition = if component == xsd_elements::COMPLEX_TYPE {
        TypeDefinition::Complex(parse_complex_type(schema, elem, Some(qname.clone()))?)
    } else {
        TypeDefinition::Simple(parse_simple_type(elem, Some(qname.clone())))
    };

    if schema.types.contains_key(&qname) {
        duplicate(schema, "type", qname);
    } else {
        schema.types.insert(qname, definition);
    }
    Ok(())
}

/// Parse a named model group definition
fn parse_group(schema: &mut SchemaDocument, elem: &Element) -> Result<()> {
    let Some(name) = required_name(schema, elem, "group") else {
        return Ok(());
    };

    let qname = schema.target_qname(&name);
    let context = format!("group '{}'", qname);
    let mut group = None;
    for child in &elem.children {
        let result = match child.local_name() {
            _ if !is_xsd_element(child) => unsupported(child),
            xsd_elements::ANNOTATION => Ok(None),
            tag => match ModelType::from_tag(tag) {
                Some(compositor) => parse_model_group(schema, child, compositor).map(Some),
                None => unsupported(child),
            },
        };
        if let Some(Some(parsed)) = recover(schema, child, &context, result)? {
            group.get_or_insert(parsed);
        }
    }

    let definition = GroupDefinition {
        name: qname.clone(),
        group: group.unwrap_or_default(),
        line: elem.line,
    };

    if schema.groups.contains_key(&qname) {
        duplicate(schema, "group", qname);
    } else {
        schema.groups.insert(qname, definition);
    }
    Ok(())
}

/// Parse a global attribute declaration; only its name matters here
fn parse_global_attribute(schema: &mut SchemaDocument, elem: &Element) -> Result<()> {
    let Some(name) = required_name(schema, elem, "global attribute") else {
        return Ok(());
    };

    let qname = schema.target_qname(&name);
    if !schema.attributes.insert(qname.clone()) {
        duplicate(schema, "attribute", qname);
    }
    Ok(())
}

/// Parse a named attribute group; only its name matters here
fn parse_attribute_group(schema: &mut SchemaDocument, elem: &Element) -> Result<()> {
    let Some(name) = required_name(schema, elem, "attributeGroup") else {
        return Ok(());
    };

    let qname = schema.target_qname(&name);
    if !schema.attribute_groups.insert(qname.clone()) {
        duplicate(schema, "attributeGroup", qname);
    }
    Ok(())
}

/// Record an xs:import without loading it
fn parse_import(schema: &mut SchemaDocument, elem: &Element) -> Result<()> {
    let import = Import {
        namespace: elem.get_attribute(xsd_attrs::NAMESPACE).map(str::to_string),
        schema_location: elem
            .get_attribute(xsd_attrs::SCHEMA_LOCATION)
            .map(str::to_string),
    };
    tracing::debug!(
        namespace = import.namespace.as_deref().unwrap_or(""),
        location = import.schema_location.as_deref().unwrap_or(""),
        "import recorded, not followed"
    );
    schema.imports.push(import);
    Ok(())
}

/// Record an xs:include without loading it
fn parse_include(schema: &mut SchemaDocument, elem: &Element) -> Result<()> {
    match elem.get_attribute(xsd_attrs::SCHEMA_LOCATION) {
        Some(location) => {
            tracing::debug!(location, "include recorded, not followed");
            schema.includes.push(location.to_string());
        }
        None => schema.warn(Warning::InvalidDeclaration {
            message: "xs:include missing schemaLocation attribute".to_string(),
            line: elem.line,
        }),
    }
    Ok(())
}

/// Type, abstract flag and substitution group shared by global and local
/// element declarations
fn parse_element_body(
    schema: &mut SchemaDocument,
    elem: &Element,
    name: QName,
) -> Result<ElementDeclaration> {
    let context = format!("element '{}'", name);
    let mut decl = ElementDeclaration::new(name);
    decl.line = elem.line;
    decl.abstract_element = elem.get_bool_attribute(xsd_attrs::ABSTRACT).unwrap_or(false);
    decl.substitution_group = elem
        .get_attribute(xsd_attrs::SUBSTITUTION_GROUP)
        .map(|value| resolve_reference(elem, value));

    if let Some(type_name) = elem.get_attribute(xsd_attrs::TYPE) {
        decl.type_ref = Some(TypeRef::Named(resolve_reference(elem, type_name)));
    }

    for child in &elem.children {
        let result = parse_element_child(schema, child);
        if let Some(Some(definition)) = recover(schema, child, &context, result)? {
            // An explicit type attribute wins over an inline definition
            if decl.type_ref.is_none() {
                decl.type_ref = Some(TypeRef::Inline(Box::new(definition)));
            }
        }
    }

    Ok(decl)
}

/// Parse a child of xs:element, returning its inline type if it is one
fn parse_element_child(
    schema: &mut SchemaDocument,
    elem: &Element,
) -> Result<Option<TypeDefinition>> {
    if !is_xsd_element(elem) {
        return unsupported(elem);
    }

    match elem.local_name() {
        xsd_elements::COMPLEX_TYPE => Ok(Some(TypeDefinition::Complex(parse_complex_type(
            schema, elem, None,
        )?))),
        xsd_elements::SIMPLE_TYPE => Ok(Some(TypeDefinition::Simple(parse_simple_type(
            elem, None,
        )))),
        xsd_elements::ANNOTATION
        | xsd_elements::UNIQUE
        | xsd_elements::KEY
        | xsd_elements::KEYREF => Ok(None),
        // XSD 1.1 type alternatives and anything unknown
        _ => unsupported(elem),
    }
}

/// Parse a named or anonymous complex type
fn parse_complex_type(
    schema: &mut SchemaDocument,
    elem: &Element,
    name: Option<QName>,
) -> Result<ComplexType> {
    let context = match &name {
        Some(name) => format!("complexType '{}'", name),
        None => "anonymous complexType".to_string(),
    };

    let mut complex_type = ComplexType::new(name, ContentModel::Empty);
    complex_type.mixed = elem.get_bool_attribute(xsd_attrs::MIXED);

    let mut group = None;
    for child in &elem.children {
        let result = parse_complex_type_child(schema, child, &mut complex_type, &mut group);
        recover(schema, child, &context, result)?;
    }

    let simple_content = complex_type
        .derivation
        .as_ref()
        .map(|d| d.simple_content)
        .unwrap_or(false);
    complex_type.content = if simple_content {
        ContentModel::Simple
    } else {
        match (group, complex_type.is_mixed()) {
            (Some(group), true) => ContentModel::Mixed(group),
            (None, true) => ContentModel::Mixed(ModelGroup::default()),
            (Some(group), false) if !group.is_empty() => ContentModel::ElementOnly(group),
            _ => ContentModel::Empty,
        }
    };

    Ok(complex_type)
}

/// Parse a child of xs:complexType
fn parse_complex_type_child(
    schema: &mut SchemaDocument,
    elem: &Element,
    complex_type: &mut ComplexType,
    group: &mut Option<ModelGroup>,
) -> Result<()> {
    if !is_xsd_element(elem) {
        return unsupported(elem);
    }

    match elem.local_name() {
        xsd_elements::SEQUENCE
        | xsd_elements::CHOICE
        | xsd_elements::ALL
        | xsd_elements::GROUP => {
            let parsed = parse_particle_group(schema, elem)?;
            group.get_or_insert(parsed);
            Ok(())
        }
        xsd_elements::COMPLEX_CONTENT => {
            // mixed on complexContent takes precedence
            if let Some(mixed) = elem.get_bool_attribute(xsd_attrs::MIXED) {
                complex_type.mixed = Some(mixed);
            }
            parse_derivation(schema, elem, complex_type, group, false)
        }
        xsd_elements::SIMPLE_CONTENT => parse_derivation(schema, elem, complex_type, group, true),
        // Attribute uses do not affect the content model
        xsd_elements::ATTRIBUTE
        | xsd_elements::ATTRIBUTE_GROUP
        | xsd_elements::ANY_ATTRIBUTE
        | xsd_elements::ANNOTATION
        | xsd_elements::ASSERT => Ok(()),
        // openContent and anything unknown
        _ => unsupported(elem),
    }
}

/// Parse xs:complexContent or xs:simpleContent
fn parse_derivation(
    schema: &mut SchemaDocument,
    content: &Element,
    complex_type: &mut ComplexType,
    group: &mut Option<ModelGroup>,
    simple_content: bool,
) -> Result<()> {
    let context = content.local_name().to_string();

    for child in &content.children {
        let method = match child.local_name() {
            _ if !is_xsd_element(child) => None,
            xsd_elements::EXTENSION => Some(DerivationMethod::Extension),
            xsd_elements::RESTRICTION => Some(DerivationMethod::Restriction),
            xsd_elements::ANNOTATION => continue,
            _ => None,
        };
        let Some(method) = method else {
            recover(schema, child, &context, unsupported::<()>(child))?;
            continue;
        };

        match child.get_attribute(xsd_attrs::BASE) {
            Some(base) => {
                complex_type.derivation = Some(Derivation {
                    method,
                    base: resolve_reference(child, base),
                    simple_content,
                });
            }
            None => schema.warn(Warning::InvalidDeclaration {
                message: format!("xs:{} without a base type", method),
                line: child.line,
            }),
        }

        for grandchild in &child.children {
            if !is_xsd_element(grandchild) {
                recover(schema, grandchild, &context, unsupported::<()>(grandchild))?;
                continue;
            }
            match grandchild.local_name() {
                xsd_elements::SEQUENCE
                | xsd_elements::CHOICE
                | xsd_elements::ALL
                | xsd_elements::GROUP
                    if !simple_content =>
                {
                    let result = parse_particle_group(schema, grandchild);
                    if let Some(parsed) = recover(schema, grandchild, &context, result)? {
                        group.get_or_insert(parsed);
                    }
                }
                xsd_elements::OPEN_CONTENT => {
                    recover(schema, grandchild, &context, unsupported::<()>(grandchild))?;
                }
                // Attribute uses, facets, inline simple types, wildcards, assertions
                _ => {}
            }
        }
    }

    Ok(())
}

/// Parse the single particle group of a complex type or derivation
fn parse_particle_group(schema: &mut SchemaDocument, elem: &Element) -> Result<ModelGroup> {
    if elem.local_name() == xsd_elements::GROUP {
        let mut group = ModelGroup::new(ModelType::Sequence);
        if let Some(particle) = parse_group_ref(schema, elem) {
            group.particles.push(particle);
        }
        return Ok(group);
    }

    let compositor = ModelType::from_tag(elem.local_name()).unwrap_or_default();
    parse_model_group(schema, elem, compositor)
}

/// Parse a content model (sequence, choice, or all) into a group of particles
fn parse_model_group(
    schema: &mut SchemaDocument,
    elem: &Element,
    compositor: ModelType,
) -> Result<ModelGroup> {
    let context = compositor.to_string();
    let mut group = ModelGroup::new(compositor);

    for child in &elem.children {
        let result = parse_particle(schema, child);
        if let Some(Some(particle)) = recover(schema, child, &context, result)? {
            group.particles.push(particle);
        }
    }

    Ok(group)
}

/// Parse one member of a model group
fn parse_particle(schema: &mut SchemaDocument, elem: &Element) -> Result<Option<Particle>> {
    if !is_xsd_element(elem) {
        return unsupported(elem);
    }

    match elem.local_name() {
        xsd_elements::ELEMENT => parse_local_element(schema, elem),
        xsd_elements::SEQUENCE | xsd_elements::CHOICE | xsd_elements::ALL => {
            let compositor = ModelType::from_tag(elem.local_name()).unwrap_or_default();
            Ok(Some(Particle::Group(parse_model_group(schema, elem, compositor)?)))
        }
        xsd_elements::GROUP => Ok(parse_group_ref(schema, elem)),
        xsd_elements::ANY => Ok(Some(Particle::Any)),
        xsd_elements::ANNOTATION => Ok(None),
        _ => unsupported(elem),
    }
}

/// Parse a local element declaration or element reference
fn parse_local_element(schema: &mut SchemaDocument, elem: &Element) -> Result<Option<Particle>> {
    if let Some(reference) = elem.get_attribute(xsd_attrs::REF) {
        return Ok(Some(Particle::ElementRef(resolve_reference(elem, reference))));
    }

    let Some(name) = required_name(schema, elem, "local element") else {
        return Ok(None);
    };

    let form = elem
        .get_attribute(xsd_attrs::FORM)
        .and_then(FormDefault::parse)
        .unwrap_or(schema.element_form_default);
    let qname = if form.is_qualified() {
        schema.target_qname(&name)
    } else {
        QName::local(name)
    };

    let mut decl = parse_element_body(schema, elem, qname)?;
    decl.scope = Scope::Local;
    Ok(Some(Particle::Element(decl)))
}

/// Parse an `xs:group ref=` particle
fn parse_group_ref(schema: &mut SchemaDocument, elem: &Element) -> Option<Particle> {
    match elem.get_attribute(xsd_attrs::REF) {
        Some(reference) => Some(Particle::GroupRef(resolve_reference(elem, reference))),
        None => {
            schema.warn(Warning::InvalidDeclaration {
                message: "group reference without a ref attribute".to_string(),
                line: elem.line,
            });
            None
        }
    }
}

/// Parse a named or anonymous simple type
fn parse_simple_type(elem: &Element, name: Option<QName>) -> SimpleType {
    let mut simple_type = SimpleType {
        name,
        ..SimpleType::default()
    };

    for child in elem.children.iter().filter(|c| is_xsd_element(c)) {
        match child.local_name() {
            xsd_elements::RESTRICTION => {
                simple_type.base = child
                    .get_attribute(xsd_attrs::BASE)
                    .map(|base| resolve_reference(child, base));
            }
            // Lists and unions have no base to follow
            _ => {}
        }
    }

    simple_type
}

/// Resolve a QName-valued attribute; an undeclared prefix keeps the lexical
/// form, which never matches a definition
fn resolve_reference(elem: &Element, value: &str) -> QName {
    // XSD 1.1 allows a list of substitution group heads; the first one is used
    let lexical = value.split_whitespace().next().unwrap_or("");
    elem.resolve_qname(lexical)
        .unwrap_or_else(|_| QName::local(lexical))
}

/// The `name` attribute of a declaration, or a warning when it is missing
fn required_name(schema: &mut SchemaDocument, elem: &Element, component: &str) -> Option<String> {
    let Some(name) = elem.get_attribute(xsd_attrs::NAME) else {
        schema.warn(Warning::InvalidDeclaration {
            message: format!("{} without a name, skipped", component),
            line: elem.line,
        });
        return None;
    };

    let name = name.trim();
    if !is_valid_ncname(name) {
        schema.warn(Warning::InvalidDeclaration {
            message: format!("{} name '{}' is not a valid NCName", component, name),
            line: elem.line,
        });
    }
    Some(name.to_string())
}

fn duplicate(schema: &mut SchemaDocument, component: &str, name: QName) {
    schema.warn(Warning::DuplicateDefinition {
        component: component.to_string(),
        name,
    });
}

fn is_xsd_element(elem: &Element) -> bool {
    is_xsd_namespace(elem.namespace())
}

fn unsupported<T>(elem: &Element) -> Result<T> {
    Err(Error::UnsupportedConstruct(format!(
        "{} at line {}",
        elem.qname, elem.line
    )))
}

/// Turn an [`Error::UnsupportedConstruct`] into a warning and carry on
fn recover<T>(
    schema: &mut SchemaDocument,
    elem: &Element,
    context: &str,
    result: Result<T>,
) -> Result<Option<T>> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(Error::UnsupportedConstruct(_)) => {
            schema.warn(Warning::UnsupportedConstruct {
                construct: elem.local_name().to_string(),
                context: context.to_string(),
                line: elem.line,
            });
            Ok(None)
        }
        Err(e) => Err(e),
    }
}
