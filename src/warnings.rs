//! Recoverable diagnostics
//!
//! Warnings are collected while loading and enumerating a schema and returned
//! next to the inventory. None of them stops the analysis.

use serde::Serialize;
use thiserror::Error;

use crate::namespaces::QName;

/// A recoverable problem found in a schema
#[derive(Error, Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum Warning {
    /// A construct outside the supported scope was skipped
    #[error("line {line}: unsupported construct <{construct}> in {context}, skipped")]
    #[serde(rename_all = "camelCase")]
    UnsupportedConstruct {
        /// Local name of the skipped construct
        construct: String,
        /// Where it appeared
        context: String,
        /// Line of the construct in the schema source
        line: usize,
    },

    /// A declaration that could not be read, e.g. one without a name
    #[error("line {line}: invalid declaration: {message}")]
    #[serde(rename_all = "camelCase")]
    InvalidDeclaration {
        /// What is wrong with it
        message: String,
        /// Line of the declaration in the schema source
        line: usize,
    },

    /// A global component was defined twice; the first definition is kept
    #[error("duplicate {component} definition '{name}', keeping the first one")]
    #[serde(rename_all = "camelCase")]
    DuplicateDefinition {
        /// Component kind (element, type, group, ...)
        component: String,
        /// Qualified name of the component
        name: QName,
    },

    /// An element's type could not be found
    #[error("element '{element}' references undefined type '{type_name}'")]
    #[serde(rename_all = "camelCase")]
    UnresolvedReference {
        /// The element whose type is missing
        element: QName,
        /// The missing type (or base type along its derivation chain)
        type_name: QName,
    },

    /// A model group reference could not be found
    #[error("reference to undefined group '{name}'")]
    #[serde(rename_all = "camelCase")]
    UnresolvedGroup {
        /// The missing group
        name: QName,
    },

    /// An element reference or substitution-group head could not be found
    #[error("reference to undeclared element '{name}'")]
    #[serde(rename_all = "camelCase")]
    UnresolvedElementRef {
        /// The missing element
        name: QName,
    },

    /// A model group contains a reference to itself
    #[error("group '{name}' refers to itself")]
    #[serde(rename_all = "camelCase")]
    CircularGroup {
        /// The self-referencing group
        name: QName,
    },

    /// A substitution-group chain loops back on itself
    #[error("substitution group chain of '{element}' is circular")]
    #[serde(rename_all = "camelCase")]
    CircularSubstitution {
        /// The element whose head chain loops
        element: QName,
    },

    /// The same element name was declared with different classifications
    #[error("element '{name}' is declared as {kept} and as {ignored}; keeping {kept}")]
    #[serde(rename_all = "camelCase")]
    AmbiguousRedeclaration {
        /// The redeclared element
        name: QName,
        /// Classification of the first declaration
        kept: String,
        /// Classification of the later, ignored declaration
        ignored: String,
    },
}
