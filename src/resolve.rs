//! Resolution pass: bind every collected type reference to its declaration.
//!
//! Runs once per mspec document, after parsing, before any reference is dereferenced:
//!
//! 1. Build one name → definition [`Registry`]. Every duplicated name is reported.
//! 2. Look up each [`ReferenceSite`]. A miss is a [`ResolveError::Lookup`] carrying the
//!    missing name and the field path that referenced it; a hit is kind-checked.
//! 3. Only when steps 1 and 2 found no error at all are the slots bound, so a failed
//!    pass leaves every reference untouched.
//!
//! Binding only stores a weak pointer and never looks inside the target, so forward
//! references and cycles (`A` has a field of type `B`, `B` one of type `A`) resolve
//! like any other reference, and the outcome does not depend on declaration order.
//!
//! Definition slots are mutated in place. A process that re-resolves documents at runtime
//! must build fresh references or serialise resolutions behind a single writer.

use std::collections::{BTreeMap, HashMap};
use std::fmt;

use crate::types::{TypeDefinition, TypeError, TypeReference};

/// Dotted location of a reference inside the mspec document, e.g. `S7Message.parameter`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct FieldPath {
    segments: Vec<String>,
}

impl FieldPath {
    pub fn new(root: impl Into<String>) -> Self {
        FieldPath {
            segments: vec![root.into()],
        }
    }

    pub fn child(&self, segment: impl Into<String>) -> Self {
        let mut segments = self.segments.clone();
        segments.push(segment.into());
        FieldPath { segments }
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.segments.join("."))
    }
}

/// A reference collected during parsing, with where it came from.
#[derive(Debug, Clone)]
pub struct ReferenceSite<'a> {
    pub path: FieldPath,
    pub reference: &'a TypeReference,
}

impl<'a> ReferenceSite<'a> {
    pub fn new(path: FieldPath, reference: &'a TypeReference) -> Self {
        ReferenceSite { path, reference }
    }
}

#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum ResolveError {
    #[error("type {name} is declared {count} times")]
    DuplicateType { name: String, count: usize },
    #[error("{path}: no type named {name}")]
    Lookup { name: String, path: FieldPath },
    #[error("{path}: {source}")]
    Binding { path: FieldPath, source: TypeError },
}

/// Every error found in one resolution pass. Never empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolveErrors(Vec<ResolveError>);

impl ResolveErrors {
    pub fn errors(&self) -> &[ResolveError] {
        &self.0
    }

    pub fn into_vec(self) -> Vec<ResolveError> {
        self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for ResolveErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} resolution error(s)", self.0.len())?;
        for e in &self.0 {
            write!(f, "\n  {}", e)?;
        }
        Ok(())
    }
}

impl std::error::Error for ResolveErrors {}

/// Declared types by name.
#[derive(Debug, Clone, Default)]
pub struct Registry {
    by_name: HashMap<String, TypeDefinition>,
}

impl Registry {
    /// Index `declarations`, failing with one [`ResolveError::DuplicateType`] per
    /// duplicated name (sorted by name).
    pub fn build(declarations: &[TypeDefinition]) -> Result<Self, ResolveErrors> {
        let (registry, duplicates) = Self::index(declarations);
        if duplicates.is_empty() {
            Ok(registry)
        } else {
            Err(ResolveErrors(duplicates))
        }
    }

    fn index(declarations: &[TypeDefinition]) -> (Self, Vec<ResolveError>) {
        let mut by_name = HashMap::new();
        let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
        for d in declarations {
            *counts.entry(d.name()).or_default() += 1;
            by_name.entry(d.name().to_string()).or_insert_with(|| d.clone());
        }
        let duplicates: Vec<ResolveError> = counts
            .into_iter()
            .filter(|&(_, count)| count > 1)
            .map(|(name, count)| {
                log::warn!("type {} declared {} times", name, count);
                ResolveError::DuplicateType {
                    name: name.to_string(),
                    count,
                }
            })
            .collect();
        for e in &duplicates {
            if let ResolveError::DuplicateType { name, .. } = e {
                by_name.remove(name);
            }
        }
        (Registry { by_name }, duplicates)
    }

    pub fn get(&self, name: &str) -> Option<&TypeDefinition> {
        self.by_name.get(name)
    }

    pub fn len(&self) -> usize {
        self.by_name.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }

    /// Declared names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.by_name.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

/// Every non-simple reference in the fields and parser arguments of `declarations`.
///
/// Paths are `Type.field` for fields and `Type.argument` for parser arguments.
pub fn collect_references(declarations: &[TypeDefinition]) -> Vec<ReferenceSite<'_>> {
    let mut sites = Vec::new();
    for d in declarations {
        let root = FieldPath::new(d.name());
        let (arguments, fields) = match d {
            TypeDefinition::Complex(c) => (c.parser_arguments(), c.fields()),
            TypeDefinition::DataIo(io) => (io.parser_arguments(), &[][..]),
            TypeDefinition::Enum(_) => continue,
        };
        for f in arguments.iter().chain(fields) {
            if !f.type_reference.is_simple() {
                sites.push(ReferenceSite::new(root.child(f.name.as_str()), &f.type_reference));
            }
        }
    }
    sites
}

/// Bind every site against `declarations`.
///
/// Either every reference is bound and the registry is returned, or nothing is bound
/// and every duplicate, lookup and kind error is returned together.
pub fn resolve(
    declarations: &[TypeDefinition],
    sites: &[ReferenceSite<'_>],
) -> Result<Registry, ResolveErrors> {
    let (registry, mut errors) = Registry::index(declarations);
    let duplicated: Vec<String> = errors
        .iter()
        .filter_map(|e| match e {
            ResolveError::DuplicateType { name, .. } => Some(name.clone()),
            _ => None,
        })
        .collect();

    let mut bindings = Vec::with_capacity(sites.len());
    for site in sites {
        let Some(name) = site.reference.name() else {
            continue;
        };
        if duplicated.iter().any(|d| d == name) {
            continue;
        }
        match registry.get(name) {
            None => errors.push(ResolveError::Lookup {
                name: name.to_string(),
                path: site.path.clone(),
            }),
            Some(definition) => match site.reference.check_type_definition(definition) {
                Ok(()) => bindings.push((site, definition)),
                Err(source) => errors.push(ResolveError::Binding {
                    path: site.path.clone(),
                    source,
                }),
            },
        }
    }

    if !errors.is_empty() {
        log::info!(
            "resolution failed: {} error(s) over {} reference(s)",
            errors.len(),
            sites.len()
        );
        return Err(ResolveErrors(errors));
    }

    for (site, definition) in &bindings {
        log::debug!("binding {} at {}", definition.name(), site.path);
        site.reference
            .set_type_definition(definition)
            .map_err(|source| {
                ResolveErrors(vec![ResolveError::Binding {
                    path: site.path.clone(),
                    source,
                }])
            })?;
    }
    log::info!(
        "resolved {} reference(s) against {} type(s)",
        bindings.len(),
        registry.len()
    );
    Ok(registry)
}

/// [`collect_references`] then [`resolve`].
pub fn resolve_all(declarations: &[TypeDefinition]) -> Result<Registry, ResolveErrors> {
    let sites = collect_references(declarations);
    resolve(declarations, &sites)
}
