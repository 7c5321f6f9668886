//! # xmlschema-inventory
//!
//! Inventory of the element declarations of an XML Schema (XSD 1.0 / 1.1).
//!
//! For every element a schema declares, globally or locally, the inventory tells
//! whether the element's type is simple or complex and what its content model
//! is: empty, simple (text only), element-only, or mixed. That last distinction
//! is what a consumer of the schema needs to decide whether whitespace between
//! child elements is significant.
//!
//! ## Example
//!
//! ```rust,ignore
//! use xmlschema_inventory::{enumerate, SchemaDocument};
//!
//! let schema = SchemaDocument::from_file("path/to/schema.xsd")?;
//! let inventory = enumerate(&schema)?;
//!
//! for entry in inventory.entries() {
//!     println!("{}", entry.to_tsv());
//! }
//! for warning in inventory.warnings() {
//!     eprintln!("warning: {}", warning);
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

// Foundation
pub mod error;
pub mod limits;
pub mod warnings;

// Utilities
pub mod names;
pub mod namespaces;

// Resource loading
pub mod documents;
pub mod loaders;
pub mod locations;

// Schema model, resolution and classification
pub mod schema;

// Element enumeration and presentation
pub mod inventory;

// Notebook publishing collaborator
pub mod publish;

// Re-exports for convenience
pub use error::{Error, ParseError, Result};
pub use inventory::{
    enumerate, enumerate_with, EntryStatus, EnumerateOptions, Inventory, InventoryEntry,
    OverlayReport, Override,
};
pub use namespaces::QName;
pub use schema::classify::{classify, Classification, ContentKind};
pub use schema::resolver::TypeResolver;
pub use schema::{SchemaDocument, TypeDefinition, TypeRef};
pub use warnings::Warning;

use std::path::Path;

/// Version of the xmlschema-inventory library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// XSD 1.0 namespace
pub const XSD_1_0_NAMESPACE: &str = "http://www.w3.org/2001/XMLSchema";

/// XSD 1.1 namespace
pub const XSD_1_1_NAMESPACE: &str = "http://www.w3.org/2009/XMLSchema";

/// XML namespace
pub const XML_NAMESPACE: &str = "http://www.w3.org/XML/1998/namespace";

/// XMLNS namespace
pub const XMLNS_NAMESPACE: &str = "http://www.w3.org/2000/xmlns/";

/// Load the schema at `path` and enumerate its elements with default options.
pub fn analyse(path: impl AsRef<Path>) -> Result<Inventory> {
    let schema = SchemaDocument::from_file(path)?;
    enumerate(&schema)
}
