//! Extractor registry and resolution
//!
//! Copyright (c) 2025 Stipulate Team
//! Licensed under the Apache-2.0 license

use super::builtin::*;
use super::ValueExtractor;
use crate::error::{Error, Result};
use dashmap::DashMap;
use std::collections::{HashMap, HashSet, VecDeque};
use std::fmt;
use std::sync::Arc;

type ExtractorKey = (String, usize);

/// Registered extractors plus the container type hierarchy they resolve against
pub struct ValueExtractorRegistry {
    extractors: HashMap<ExtractorKey, Arc<dyn ValueExtractor>>,
    builtin: HashSet<ExtractorKey>,
    supertypes: HashMap<String, Vec<String>>,
    resolved: DashMap<ExtractorKey, Arc<dyn ValueExtractor>>,
}

impl ValueExtractorRegistry {
    /// Registry holding the extractors for the built-in containers
    pub fn new() -> Self {
        let mut registry = Self::empty();
        let builtins: [Arc<dyn ValueExtractor>; 5] = [
            Arc::new(ListExtractor),
            Arc::new(IterableExtractor),
            Arc::new(MapKeyExtractor),
            Arc::new(MapValueExtractor),
            Arc::new(OptionalExtractor),
        ];
        for extractor in builtins {
            let key = (extractor.container_type().to_string(), extractor.type_argument());
            registry.builtin.insert(key.clone());
            registry.extractors.insert(key, extractor);
        }
        registry.declare_supertype("List", "Iterable");
        registry.declare_supertype("Set", "Iterable");
        registry
    }

    pub fn empty() -> Self {
        Self {
            extractors: HashMap::new(),
            builtin: HashSet::new(),
            supertypes: HashMap::new(),
            resolved: DashMap::new(),
        }
    }

    /// Register an extractor
    ///
    /// Replaces a built-in extractor for the same container type and
    /// position; registering two custom extractors for the same pair fails.
    pub fn register<E: ValueExtractor + 'static>(&mut self, extractor: E) -> Result<()> {
        self.register_arc(Arc::new(extractor))
    }

    pub fn register_arc(&mut self, extractor: Arc<dyn ValueExtractor>) -> Result<()> {
        let key = (extractor.container_type().to_string(), extractor.type_argument());
        if self.extractors.contains_key(&key) && !self.builtin.remove(&key) {
            return Err(Error::ValueExtractor {
                container_type: key.0,
                position: key.1,
                message: "an extractor is already registered for this type argument".to_string(),
            });
        }
        self.extractors.insert(key, extractor);
        self.resolved.clear();
        Ok(())
    }

    /// Declare `supertype` as a direct supertype of `container_type`
    pub fn declare_supertype<S: Into<String>, T: Into<String>>(&mut self, container_type: S, supertype: T) {
        let supertypes = self.supertypes.entry(container_type.into()).or_default();
        let supertype = supertype.into();
        if !supertypes.contains(&supertype) {
            supertypes.push(supertype);
        }
        self.resolved.clear();
    }

    /// `container_type` followed by all of its supertypes, breadth first
    fn ancestry(&self, container_type: &str) -> Vec<String> {
        let mut seen = HashSet::new();
        let mut ordered = Vec::new();
        let mut queue = VecDeque::from([container_type.to_string()]);
        while let Some(next) = queue.pop_front() {
            if !seen.insert(next.clone()) {
                continue;
            }
            if let Some(parents) = self.supertypes.get(&next) {
                queue.extend(parents.iter().cloned());
            }
            ordered.push(next);
        }
        ordered
    }

    fn is_strict_supertype(&self, candidate: &str, of: &str) -> bool {
        candidate != of && self.ancestry(of).iter().any(|t| t == candidate)
    }

    /// The maximally specific extractor for `container_type` at `position`
    pub fn resolve(&self, container_type: &str, position: usize) -> Result<Arc<dyn ValueExtractor>> {
        let key = (container_type.to_string(), position);
        if let Some(cached) = self.resolved.get(&key) {
            return Ok(cached.clone());
        }

        let candidates: Vec<String> = self
            .ancestry(container_type)
            .into_iter()
            .filter(|t| self.extractors.contains_key(&(t.clone(), position)))
            .collect();
        let most_specific: Vec<&String> = candidates
            .iter()
            .filter(|c| !candidates.iter().any(|o| self.is_strict_supertype(c, o)))
            .collect();

        let chosen = match most_specific.as_slice() {
            [] => {
                return Err(Error::ValueExtractor {
                    container_type: container_type.to_string(),
                    position,
                    message: "no value extractor found".to_string(),
                })
            }
            [single] => (*single).clone(),
            several => {
                let names: Vec<&str> = several.iter().map(|s| s.as_str()).collect();
                return Err(Error::ValueExtractor {
                    container_type: container_type.to_string(),
                    position,
                    message: format!("ambiguous value extractors for {}", names.join(", ")),
                });
            }
        };

        let extractor = self
            .extractors
            .get(&(chosen, position))
            .cloned()
            .ok_or_else(|| Error::ValueExtractor {
                container_type: container_type.to_string(),
                position,
                message: "no value extractor found".to_string(),
            })?;
        log::trace!(
            "Resolved value extractor for '{}' type argument {} to '{}'",
            container_type,
            position,
            extractor.container_type()
        );
        Ok(self.resolved.entry(key).or_insert(extractor).clone())
    }

    /// Whether any extractor applies to `container_type`
    pub fn is_container(&self, container_type: &str) -> bool {
        self.ancestry(container_type)
            .iter()
            .any(|t| self.extractors.keys().any(|(registered, _)| registered == t))
    }

    /// Type argument a plain cascade on the container applies to: values for maps, else the first
    pub fn default_position(&self, container_type: &str) -> usize {
        if self.ancestry(container_type).iter().any(|t| t == "Map") {
            1
        } else {
            0
        }
    }
}

impl Default for ValueExtractorRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ValueExtractorRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut keys: Vec<_> = self.extractors.keys().collect();
        keys.sort();
        f.debug_struct("ValueExtractorRegistry")
            .field("extractors", &keys)
            .field("supertypes", &self.supertypes)
            .finish()
    }
}
