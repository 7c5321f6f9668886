//! Type resolution
//!
//! Resolving a type reference yields a self-contained [`TypeDefinition`]
//! whose content model already includes whatever it inherits from its base
//! types. Only the derivation axis is followed here, so an element whose
//! content contains itself never looks like a cycle.

use std::collections::HashSet;

use indexmap::IndexSet;

use super::builtins::{builtin_type, is_any_type};
use super::model::{
    ComplexType, ContentModel, DerivationMethod, ModelGroup, Particle, TypeDefinition, TypeRef,
};
use super::SchemaDocument;
use crate::error::{Error, Result};
use crate::limits::Limits;
use crate::namespaces::QName;

/// Resolves type references against a schema and the built-in types
#[derive(Debug, Clone)]
pub struct TypeResolver<'a> {
    schema: &'a SchemaDocument,
    limits: Limits,
}

impl<'a> TypeResolver<'a> {
    /// Create a resolver bounded by the schema's derivation depth limit
    pub fn new(schema: &'a SchemaDocument) -> Self {
        Self {
            schema,
            limits: schema.limits().clone(),
        }
    }

    /// Override the maximum derivation chain length
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.limits.max_derivation_depth = max_depth;
        self
    }

    /// The schema this resolver reads from
    pub fn schema(&self) -> &'a SchemaDocument {
        self.schema
    }

    /// Resolve a type reference to its effective definition
    ///
    /// Fails with [`Error::UnresolvedReference`] naming the first missing type
    /// along the chain, [`Error::CyclicDerivation`] when the base chain loops,
    /// or [`Error::LimitExceeded`] when it is too long.
    pub fn resolve(&self, type_ref: &TypeRef) -> Result<TypeDefinition> {
        let mut chain = IndexSet::new();
        match type_ref {
            TypeRef::Named(name) => self.resolve_named(name, &mut chain),
            TypeRef::Inline(definition) => self.resolve_definition(definition, &mut chain),
        }
    }

    /// Resolve a type by name
    pub fn resolve_name(&self, name: &QName) -> Result<TypeDefinition> {
        self.resolve_named(name, &mut IndexSet::new())
    }

    /// Resolve every named type, failing on the first fatal error
    ///
    /// Missing types are left for the caller to report per element.
    pub fn check_derivations(&self) -> Result<()> {
        for name in self.schema.types.keys() {
            match self.resolve_name(name) {
                Ok(_) => {}
                Err(e) if e.is_recoverable() => {}
                Err(e) => return Err(e),
            }
        }
        Ok(())
    }

    fn resolve_named(&self, name: &QName, chain: &mut IndexSet<QName>) -> Result<TypeDefinition> {
        if let Some(builtin) = builtin_type(name) {
            return Ok(builtin);
        }

        let definition = self
            .schema
            .lookup_type(name)
            .ok_or_else(|| Error::UnresolvedReference(name.clone()))?;
        let key = definition.name().cloned().unwrap_or_else(|| name.clone());

        if chain.contains(&key) {
            let mut cycle: Vec<QName> = chain.iter().skip_while(|n| **n != key).cloned().collect();
            cycle.push(key);
            return Err(Error::CyclicDerivation { chain: cycle });
        }
        self.limits.check_derivation_depth(chain.len() + 1)?;

        tracing::trace!(type_name = %key, depth = chain.len(), "resolving type");
        chain.insert(key);
        let result = self.resolve_definition(definition, chain);
        chain.pop();
        result
    }

    fn resolve_definition(
        &self,
        definition: &TypeDefinition,
        chain: &mut IndexSet<QName>,
    ) -> Result<TypeDefinition> {
        match definition {
            TypeDefinition::Simple(simple_type) => {
                // Followed only to detect missing and cyclic bases
                if let Some(base) = &simple_type.base {
                    self.resolve_named(base, chain)?;
                }
                Ok(TypeDefinition::Simple(simple_type.clone()))
            }
            TypeDefinition::Complex(complex_type) => self
                .resolve_complex(complex_type, chain)
                .map(TypeDefinition::Complex),
        }
    }

    fn resolve_complex(
        &self,
        complex_type: &ComplexType,
        chain: &mut IndexSet<QName>,
    ) -> Result<ComplexType> {
        let mut resolved = complex_type.clone();

        let derivation = match &complex_type.derivation {
            Some(derivation) if !is_any_type(&derivation.base) => derivation,
            _ => {
                self.normalize(&mut resolved);
                return Ok(resolved);
            }
        };

        let base = self.resolve_named(&derivation.base, chain)?;
        resolved.content = if derivation.simple_content {
            ContentModel::Simple
        } else {
            match &base {
                TypeDefinition::Simple(_) => ContentModel::Simple,
                TypeDefinition::Complex(base_type) => {
                    merge_content(&base_type.content, complex_type, derivation.method)
                }
            }
        };

        self.normalize(&mut resolved);
        Ok(resolved)
    }

    /// Element-only content whose groups hold no particles is empty content
    fn normalize(&self, complex_type: &mut ComplexType) {
        if let ContentModel::ElementOnly(group) = &complex_type.content {
            if !self.has_particles(group) {
                complex_type.content = ContentModel::Empty;
            }
        }
    }

    /// Whether any particle is reachable through nested and named groups
    fn has_particles(&self, group: &ModelGroup) -> bool {
        let mut visited = HashSet::new();
        let mut pending = vec![group];

        while let Some(group) = pending.pop() {
            for particle in &group.particles {
                match particle {
                    Particle::Element(_) | Particle::ElementRef(_) | Particle::Any => return true,
                    Particle::Group(inner) => pending.push(inner),
                    Particle::GroupRef(name) => match self.schema.lookup_group(name) {
                        Some(definition) => {
                            if visited.insert(&definition.name) {
                                pending.push(&definition.group);
                            }
                        }
                        // An unknown group may well contain elements
                        None => return true,
                    },
                }
            }
        }
        false
    }
}

/// Content of `derived` given the resolved content of its base
fn merge_content(
    base: &ContentModel,
    derived: &ComplexType,
    method: DerivationMethod,
) -> ContentModel {
    let local = derived.particles().cloned().unwrap_or_default();

    match (method, base) {
        (_, ContentModel::Simple) => ContentModel::Simple,

        (DerivationMethod::Extension, ContentModel::Mixed(base_group)) => {
            ContentModel::Mixed(base_group.extended_by(&local))
        }
        (DerivationMethod::Extension, ContentModel::ElementOnly(base_group)) => {
            let group = base_group.extended_by(&local);
            if derived.is_mixed() {
                ContentModel::Mixed(group)
            } else {
                ContentModel::ElementOnly(group)
            }
        }
        (DerivationMethod::Extension, ContentModel::Empty) => derived.content.clone(),

        (DerivationMethod::Restriction, ContentModel::Mixed(_)) if derived.mixed != Some(false) => {
            ContentModel::Mixed(local)
        }
        (DerivationMethod::Restriction, ContentModel::Mixed(_))
        | (DerivationMethod::Restriction, ContentModel::ElementOnly(_)) => {
            if local.is_empty() {
                ContentModel::Empty
            } else {
                ContentModel::ElementOnly(local)
            }
        }
        (DerivationMethod::Restriction, ContentModel::Empty) => ContentModel::Empty,
    }
}
