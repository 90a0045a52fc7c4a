//! Metadata cache
//!
//! Bean and executable metadata is built lazily on first request and shared
//! afterwards. Builds run without holding any lock; when two threads build
//! the same entry concurrently, the first inserted value wins and both
//! callers observe it. Failed builds are never cached.
//!
//! Copyright (c) 2025 Stipulate Team
//! Licensed under the Apache-2.0 license

use super::bean::BeanMetaData;
use super::declaration::{DeclarationReader, ExecutableSignature};
use super::executable::ExecutableMetaData;
use super::hierarchy::TypeHierarchy;
use crate::config::MethodValidationConfig;
use crate::constraint::ConstraintValidatorFactory;
use crate::error::Result;
use crate::extraction::ValueExtractorRegistry;
use dashmap::DashMap;
use std::sync::Arc;

/// Collaborators available while building metadata
pub(crate) struct BuildContext<'a> {
    pub reader: &'a dyn DeclarationReader,
    pub validators: &'a dyn ConstraintValidatorFactory,
    pub extractors: &'a ValueExtractorRegistry,
    pub method_validation: &'a MethodValidationConfig,
}

/// Builds and caches [`BeanMetaData`] and [`ExecutableMetaData`]
pub struct MetaDataManager {
    reader: Arc<dyn DeclarationReader>,
    validators: Arc<dyn ConstraintValidatorFactory>,
    extractors: Arc<ValueExtractorRegistry>,
    method_validation: MethodValidationConfig,
    beans: DashMap<String, Arc<BeanMetaData>>,
    executables: DashMap<(String, ExecutableSignature), Arc<ExecutableMetaData>>,
}

impl MetaDataManager {
    pub fn new(
        reader: Arc<dyn DeclarationReader>,
        validators: Arc<dyn ConstraintValidatorFactory>,
        extractors: Arc<ValueExtractorRegistry>,
        method_validation: MethodValidationConfig,
    ) -> Self {
        Self {
            reader,
            validators,
            extractors,
            method_validation,
            beans: DashMap::new(),
            executables: DashMap::new(),
        }
    }

    fn context(&self) -> BuildContext<'_> {
        BuildContext {
            reader: self.reader.as_ref(),
            validators: self.validators.as_ref(),
            extractors: self.extractors.as_ref(),
            method_validation: &self.method_validation,
        }
    }

    pub fn reader(&self) -> &Arc<dyn DeclarationReader> {
        &self.reader
    }

    /// Metadata of `bean_type`, built on first use
    pub fn bean_metadata(&self, bean_type: &str) -> Result<Arc<BeanMetaData>> {
        if let Some(cached) = self.beans.get(bean_type) {
            return Ok(cached.clone());
        }

        let _span = tracing::debug_span!("build_bean_metadata", bean_type = %bean_type).entered();
        let hierarchy = TypeHierarchy::walk(self.reader.as_ref(), bean_type)?;
        let metadata = Arc::new(BeanMetaData::build(&hierarchy, &self.context())?);
        Ok(self
            .beans
            .entry(bean_type.to_string())
            .or_insert(metadata)
            .clone())
    }

    /// Metadata of the executable `signature` on `bean_type`, built on first use
    pub fn executable_metadata(
        &self,
        bean_type: &str,
        signature: &ExecutableSignature,
    ) -> Result<Arc<ExecutableMetaData>> {
        let key = (bean_type.to_string(), signature.clone());
        if let Some(cached) = self.executables.get(&key) {
            return Ok(cached.clone());
        }

        let _span = tracing::debug_span!(
            "build_executable_metadata",
            bean_type = %bean_type,
            executable = %signature
        )
        .entered();
        let hierarchy = TypeHierarchy::walk(self.reader.as_ref(), bean_type)?;
        let metadata = Arc::new(ExecutableMetaData::build(&hierarchy, signature, &self.context())?);
        Ok(self.executables.entry(key).or_insert(metadata).clone())
    }

    /// Drop cached metadata of `bean_type`
    ///
    /// Metadata of subtypes embeds the dropped type's declarations too and is
    /// therefore dropped as well.
    pub fn invalidate(&self, bean_type: &str) {
        self.beans
            .retain(|_, metadata| !metadata.hierarchy().iter().any(|t| t == bean_type));
        self.executables
            .retain(|_, metadata| !metadata.hierarchy().iter().any(|t| t == bean_type));
        log::debug!("Invalidated cached metadata of '{}'", bean_type);
    }

    pub fn clear(&self) {
        self.beans.clear();
        self.executables.clear();
    }

    /// Number of cached bean metadata entries
    pub fn cached_beans(&self) -> usize {
        self.beans.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constraint::DefaultConstraintValidatorFactory;
    use crate::metadata::{
        ConstraintDeclaration, Declarations, ExecutableDeclaration, ParameterDeclaration, PropertyDeclaration,
        TypeDeclaration,
    };
    use std::thread;

    fn manager(declarations: Declarations) -> MetaDataManager {
        MetaDataManager::new(
            Arc::new(declarations),
            Arc::new(DefaultConstraintValidatorFactory::new()),
            Arc::new(ValueExtractorRegistry::new()),
            MethodValidationConfig::default(),
        )
    }

    fn declarations() -> Declarations {
        Declarations::new()
            .with_type(
                TypeDeclaration::new("Car")
                    .extends("Vehicle")
                    .property(PropertyDeclaration::new("plate").constraint(ConstraintDeclaration::not_blank())),
            )
            .with_type(
                TypeDeclaration::new("Vehicle")
                    .property(PropertyDeclaration::new("plate").constraint(ConstraintDeclaration::size(2, 8)))
                    .property(PropertyDeclaration::new("wheels").constraint(ConstraintDeclaration::min(2))),
            )
    }

    #[test]
    fn test_merges_hierarchy() {
        let manager = manager(declarations());
        let car = manager.bean_metadata("Car").unwrap();

        assert_eq!(car.properties().len(), 2);
        assert_eq!(car.property("plate").unwrap().element().constraints().len(), 2);
        assert_eq!(car.hierarchy(), &["Car".to_string(), "Vehicle".to_string()]);
    }

    #[test]
    fn test_cache_returns_same_instance() {
        let manager = manager(declarations());
        let first = manager.bean_metadata("Car").unwrap();
        let second = manager.bean_metadata("Car").unwrap();
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn test_concurrent_builds_agree() {
        let manager = Arc::new(manager(declarations()));
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let manager = manager.clone();
                thread::spawn(move || manager.bean_metadata("Car").unwrap())
            })
            .collect();
        let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();

        for metadata in &results[1..] {
            assert!(Arc::ptr_eq(&results[0], metadata));
        }
        assert_eq!(manager.cached_beans(), 1);
    }

    #[test]
    fn test_errors_are_not_cached() {
        let broken = Declarations::new().with_type(
            TypeDeclaration::new("Order").with_default_sequence(["Basic"]),
        );
        let manager = manager(broken);
        assert!(manager.bean_metadata("Order").is_err());
        assert!(manager.bean_metadata("Missing").is_err());
        assert_eq!(manager.cached_beans(), 0);
    }

    #[test]
    fn test_invalidate_drops_subtypes() {
        let manager = manager(declarations());
        manager.bean_metadata("Car").unwrap();
        manager.bean_metadata("Vehicle").unwrap();
        assert_eq!(manager.cached_beans(), 2);

        manager.invalidate("Vehicle");
        assert_eq!(manager.cached_beans(), 0);
    }

    #[test]
    fn test_executable_metadata_parameters() {
        let signature = ExecutableSignature::method("refuel", ["int", "String"]);
        let declarations = Declarations::new().with_type(
            TypeDeclaration::new("Car").executable(
                ExecutableDeclaration::new(signature.clone())
                    .parameter(ParameterDeclaration::new("litres").constraint(ConstraintDeclaration::min(1)))
                    .cross_parameter(ConstraintDeclaration::not_null()),
            ),
        );
        let manager = manager(declarations);
        let metadata = manager.executable_metadata("Car", &signature).unwrap();

        assert_eq!(metadata.parameters().len(), 2);
        assert_eq!(metadata.parameters()[0].name(), "litres");
        assert_eq!(metadata.parameters()[1].name(), "arg1");
        assert_eq!(metadata.cross_parameter_constraints().len(), 1);
        assert!(metadata.has_parameter_constraints());
        assert_eq!(metadata.declaring_types(), &["Car".to_string()]);
    }
}
