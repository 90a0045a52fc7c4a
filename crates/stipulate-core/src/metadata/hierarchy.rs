//! Type hierarchy walk
//!
//! Copyright (c) 2025 Stipulate Team
//! Licensed under the Apache-2.0 license

use super::declaration::{DeclarationReader, TypeDeclaration};
use crate::error::{Error, Result};
use std::collections::{BTreeSet, HashMap, HashSet, VecDeque};
use std::sync::Arc;

/// Declared types of a bean's hierarchy, root first
///
/// The superclass line comes first, then interfaces breadth first. Types
/// referenced but not declared are skipped; they contribute no constraints.
#[derive(Debug, Clone)]
pub struct TypeHierarchy {
    types: Vec<Arc<TypeDeclaration>>,
    ancestors: HashMap<String, BTreeSet<String>>,
}

impl TypeHierarchy {
    pub fn walk(reader: &dyn DeclarationReader, root: &str) -> Result<Self> {
        let root_declaration = reader.type_declaration(root).ok_or_else(|| Error::UnknownType {
            type_name: root.to_string(),
        })?;

        let mut visited = HashSet::new();
        let mut types = Vec::new();

        let mut next = Some(root_declaration);
        while let Some(declaration) = next.take() {
            if !visited.insert(declaration.name.clone()) {
                break;
            }
            next = match &declaration.superclass {
                Some(superclass) => lookup(reader, superclass),
                None => None,
            };
            types.push(declaration);
        }

        let mut queue: VecDeque<String> = types
            .iter()
            .flat_map(|t| t.interfaces.iter().cloned())
            .collect();
        while let Some(interface) = queue.pop_front() {
            if !visited.insert(interface.clone()) {
                continue;
            }
            if let Some(declaration) = lookup(reader, &interface) {
                queue.extend(declaration.interfaces.iter().cloned());
                if let Some(superclass) = &declaration.superclass {
                    queue.push_back(superclass.clone());
                }
                types.push(declaration);
            }
        }

        let ancestors = types
            .iter()
            .map(|t| (t.name.clone(), collect_ancestors(&types, &t.name)))
            .collect();

        Ok(Self { types, ancestors })
    }

    pub fn types(&self) -> &[Arc<TypeDeclaration>] {
        &self.types
    }

    pub fn root(&self) -> &Arc<TypeDeclaration> {
        &self.types[0]
    }

    /// Names of the walked types, in walk order
    pub fn type_names(&self) -> Vec<String> {
        self.types.iter().map(|t| t.name.clone()).collect()
    }

    /// True when `sub` is `sup` or transitively extends or implements it
    pub fn is_subtype_of(&self, sub: &str, sup: &str) -> bool {
        sub == sup || self.ancestors.get(sub).is_some_and(|a| a.contains(sup))
    }
}

fn lookup(reader: &dyn DeclarationReader, type_name: &str) -> Option<Arc<TypeDeclaration>> {
    let declaration = reader.type_declaration(type_name);
    if declaration.is_none() {
        log::debug!("Type '{}' has no declarations, skipping it in the hierarchy", type_name);
    }
    declaration
}

fn collect_ancestors(types: &[Arc<TypeDeclaration>], start: &str) -> BTreeSet<String> {
    let by_name: HashMap<&str, &TypeDeclaration> = types.iter().map(|t| (t.name.as_str(), t.as_ref())).collect();
    let mut ancestors = BTreeSet::new();
    let mut pending = vec![start.to_string()];
    while let Some(current) = pending.pop() {
        let Some(declaration) = by_name.get(current.as_str()) else {
            continue;
        };
        for parent in declaration.superclass.iter().chain(declaration.interfaces.iter()) {
            if ancestors.insert(parent.clone()) {
                pending.push(parent.clone());
            }
        }
    }
    ancestors
}
