//! XSD built-in types
//!
//! Every built-in datatype is a simple type except `xs:anyType`, the ur-type,
//! which is complex with mixed content admitting any element.

use std::collections::HashMap;

use once_cell::sync::Lazy;

use super::model::{
    ComplexType, ContentModel, ModelGroup, ModelType, Particle, SimpleType, TypeDefinition,
};
use crate::namespaces::QName;
use crate::{XSD_1_0_NAMESPACE, XSD_1_1_NAMESPACE};

/// The ur-type
pub const XSD_ANY_TYPE: &str = "anyType";
/// Base of all simple types
pub const XSD_ANY_SIMPLE_TYPE: &str = "anySimpleType";
/// Base of all atomic types (XSD 1.1)
pub const XSD_ANY_ATOMIC_TYPE: &str = "anyAtomicType";

// (name, base) for each built-in simple type
const BUILTIN_SIMPLE_TYPES: &[(&str, &str)] = &[
    (XSD_ANY_SIMPLE_TYPE, XSD_ANY_TYPE),
    (XSD_ANY_ATOMIC_TYPE, XSD_ANY_SIMPLE_TYPE),
    // Primitive types
    ("string", XSD_ANY_ATOMIC_TYPE),
    ("boolean", XSD_ANY_ATOMIC_TYPE),
    ("decimal", XSD_ANY_ATOMIC_TYPE),
    ("float", XSD_ANY_ATOMIC_TYPE),
    ("double", XSD_ANY_ATOMIC_TYPE),
    ("duration", XSD_ANY_ATOMIC_TYPE),
    ("dateTime", XSD_ANY_ATOMIC_TYPE),
    ("time", XSD_ANY_ATOMIC_TYPE),
    ("date", XSD_ANY_ATOMIC_TYPE),
    ("gYearMonth", XSD_ANY_ATOMIC_TYPE),
    ("gYear", XSD_ANY_ATOMIC_TYPE),
    ("gMonthDay", XSD_ANY_ATOMIC_TYPE),
    ("gDay", XSD_ANY_ATOMIC_TYPE),
    ("gMonth", XSD_ANY_ATOMIC_TYPE),
    ("hexBinary", XSD_ANY_ATOMIC_TYPE),
    ("base64Binary", XSD_ANY_ATOMIC_TYPE),
    ("anyURI", XSD_ANY_ATOMIC_TYPE),
    ("QName", XSD_ANY_ATOMIC_TYPE),
    ("NOTATION", XSD_ANY_ATOMIC_TYPE),
    // String-derived types
    ("normalizedString", "string"),
    ("token", "normalizedString"),
    ("language", "token"),
    ("Name", "token"),
    ("NMTOKEN", "token"),
    ("NMTOKENS", "NMTOKEN"),
    ("NCName", "Name"),
    ("ID", "NCName"),
    ("IDREF", "NCName"),
    ("IDREFS", "IDREF"),
    ("ENTITY", "NCName"),
    ("ENTITIES", "ENTITY"),
    // Numeric types
    ("integer", "decimal"),
    ("nonPositiveInteger", "integer"),
    ("negativeInteger", "nonPositiveInteger"),
    ("long", "integer"),
    ("int", "long"),
    ("short", "int"),
    ("byte", "short"),
    ("nonNegativeInteger", "integer"),
    ("unsignedLong", "nonNegativeInteger"),
    ("unsignedInt", "unsignedLong"),
    ("unsignedShort", "unsignedInt"),
    ("unsignedByte", "unsignedShort"),
    ("positiveInteger", "nonNegativeInteger"),
    // XSD 1.1 additions
    ("yearMonthDuration", "duration"),
    ("dayTimeDuration", "duration"),
    ("dateTimeStamp", "dateTime"),
];

static BUILTIN_BASES: Lazy<HashMap<&'static str, &'static str>> =
    Lazy::new(|| BUILTIN_SIMPLE_TYPES.iter().copied().collect());

/// Whether `namespace` is one of the XSD namespaces
pub fn is_xsd_namespace(namespace: Option<&str>) -> bool {
    matches!(namespace, Some(XSD_1_0_NAMESPACE) | Some(XSD_1_1_NAMESPACE))
}

/// Whether `name` is `xs:anyType`
pub fn is_any_type(name: &QName) -> bool {
    is_xsd_namespace(name.namespace.as_deref()) && name.local_name == XSD_ANY_TYPE
}

/// Whether `name` is a built-in type
pub fn is_builtin(name: &QName) -> bool {
    is_xsd_namespace(name.namespace.as_deref())
        && (name.local_name == XSD_ANY_TYPE
            || BUILTIN_BASES.contains_key(name.local_name.as_str()))
}

/// `xs:anyType` in the XSD 1.0 namespace
pub fn any_type_name() -> QName {
    QName::namespaced(XSD_1_0_NAMESPACE, XSD_ANY_TYPE)
}

/// Look up a built-in type definition
pub fn builtin_type(name: &QName) -> Option<TypeDefinition> {
    let namespace = name.namespace.as_deref()?;
    if !is_xsd_namespace(Some(namespace)) {
        return None;
    }

    let local = name.local_name.as_str();
    if local == XSD_ANY_TYPE {
        return Some(TypeDefinition::Complex(any_type(name.clone())));
    }

    let base = BUILTIN_BASES.get(local)?;
    Some(TypeDefinition::Simple(SimpleType {
        name: Some(name.clone()),
        base: Some(QName::namespaced(namespace, *base)),
    }))
}

fn any_type(name: QName) -> ComplexType {
    let mut group = ModelGroup::new(ModelType::Sequence);
    group.particles.push(Particle::Any);
    let mut complex_type = ComplexType::new(Some(name), ContentModel::Mixed(group));
    complex_type.mixed = Some(true);
    complex_type
}
