//! Validator factory and its builder
//!
//! A factory owns everything shared between validators: configuration, the
//! metadata cache, the group resolver, the value extractor registry and the
//! pluggable interpolator and traversable resolver. Validators are cheap
//! handles onto it.
//!
//! Copyright (c) 2025 Stipulate Team
//! Licensed under the Apache-2.0 license

use super::traversable::{DefaultTraversableResolver, TraversableResolver};
use super::validator::Validator;
use crate::config::ValidatorConfig;
use crate::constraint::{ConstraintValidatorFactory, DefaultConstraintValidatorFactory, DefaultMessageInterpolator, MessageInterpolator};
use crate::error::Result;
use crate::extraction::{ValueExtractor, ValueExtractorRegistry};
use crate::group::GroupResolver;
use crate::metadata::{BeanMetaData, DeclarationReader, MetaDataManager};
use std::fmt;
use std::sync::Arc;

/// State shared by all validators of one factory
pub(crate) struct ValidatorShared {
    pub(crate) config: ValidatorConfig,
    pub(crate) metadata: MetaDataManager,
    pub(crate) resolver: GroupResolver,
    pub(crate) extractors: Arc<ValueExtractorRegistry>,
    pub(crate) interpolator: Arc<dyn MessageInterpolator>,
    pub(crate) traversable: Arc<dyn TraversableResolver>,
}

/// Entry point creating [`Validator`]s over one declaration source
#[derive(Clone)]
pub struct ValidatorFactory {
    shared: Arc<ValidatorShared>,
}

impl ValidatorFactory {
    /// Factory with the default configuration and the built-in validators and extractors
    pub fn new(reader: Arc<dyn DeclarationReader>) -> Self {
        let extractors = Arc::new(ValueExtractorRegistry::new());
        let config = ValidatorConfig::default();
        let metadata = MetaDataManager::new(
            reader.clone(),
            Arc::new(DefaultConstraintValidatorFactory::new()),
            extractors.clone(),
            config.method_validation.clone(),
        );
        Self {
            shared: Arc::new(ValidatorShared {
                config,
                metadata,
                resolver: GroupResolver::new(reader),
                extractors,
                interpolator: Arc::new(DefaultMessageInterpolator),
                traversable: Arc::new(DefaultTraversableResolver),
            }),
        }
    }

    pub fn builder(reader: Arc<dyn DeclarationReader>) -> ValidatorFactoryBuilder {
        ValidatorFactoryBuilder::new(reader)
    }

    /// A validator using the factory's fail-fast setting
    pub fn validator(&self) -> Validator {
        Validator::new(self.shared.clone(), self.shared.config.fail_fast)
    }

    pub fn config(&self) -> &ValidatorConfig {
        &self.shared.config
    }

    /// Build (or fetch the cached) metadata of a bean type
    ///
    /// Useful to surface configuration errors before the first validation.
    pub fn bean_metadata(&self, bean_type: &str) -> Result<Arc<BeanMetaData>> {
        self.shared.metadata.bean_metadata(bean_type)
    }

    /// Drop cached metadata of `bean_type` and of every type built on top of it
    ///
    /// Group sequence expansions are dropped as well, they may depend on
    /// corrected group definitions.
    pub fn invalidate(&self, bean_type: &str) {
        self.shared.metadata.invalidate(bean_type);
        self.shared.resolver.clear();
    }

    /// Drop all cached metadata and group sequence expansions
    pub fn clear_metadata(&self) {
        self.shared.metadata.clear();
        self.shared.resolver.clear();
    }
}

impl fmt::Debug for ValidatorFactory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ValidatorFactory")
            .field("config", &self.shared.config)
            .field("cached_beans", &self.shared.metadata.cached_beans())
            .finish()
    }
}

/// Builder for a [`ValidatorFactory`] with custom plug-ins
pub struct ValidatorFactoryBuilder {
    reader: Arc<dyn DeclarationReader>,
    config: ValidatorConfig,
    validators: Option<Arc<dyn ConstraintValidatorFactory>>,
    extractors: Vec<Arc<dyn ValueExtractor>>,
    supertypes: Vec<(String, String)>,
    interpolator: Option<Arc<dyn MessageInterpolator>>,
    traversable: Option<Arc<dyn TraversableResolver>>,
}

impl ValidatorFactoryBuilder {
    pub fn new(reader: Arc<dyn DeclarationReader>) -> Self {
        Self {
            reader,
            config: ValidatorConfig::default(),
            validators: None,
            extractors: Vec::new(),
            supertypes: Vec::new(),
            interpolator: None,
            traversable: None,
        }
    }

    pub fn with_config(mut self, config: ValidatorConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_fail_fast(mut self) -> Self {
        self.config.fail_fast = true;
        self
    }

    /// Replace the factory instantiating constraint validators
    pub fn with_constraint_validator_factory<F>(mut self, factory: F) -> Self
    where
        F: ConstraintValidatorFactory + 'static,
    {
        self.validators = Some(Arc::new(factory));
        self
    }

    /// Register a value extractor on top of the built-in ones
    ///
    /// A custom extractor replaces the built-in one for the same container
    /// type and type argument.
    pub fn with_value_extractor<E>(mut self, extractor: E) -> Self
    where
        E: ValueExtractor + 'static,
    {
        self.extractors.push(Arc::new(extractor));
        self
    }

    /// Declare `supertype` as a supertype of `container_type` for extractor resolution
    pub fn with_container_supertype<S: Into<String>, T: Into<String>>(mut self, container_type: S, supertype: T) -> Self {
        self.supertypes.push((container_type.into(), supertype.into()));
        self
    }

    pub fn with_message_interpolator<I>(mut self, interpolator: I) -> Self
    where
        I: MessageInterpolator + 'static,
    {
        self.interpolator = Some(Arc::new(interpolator));
        self
    }

    /// Decide per property whether validation may read it and cascade into it
    pub fn with_traversable_resolver<R>(mut self, resolver: R) -> Self
    where
        R: TraversableResolver + 'static,
    {
        self.traversable = Some(Arc::new(resolver));
        self
    }

    pub fn build(self) -> Result<ValidatorFactory> {
        let mut registry = ValueExtractorRegistry::new();
        for (container_type, supertype) in self.supertypes {
            registry.declare_supertype(container_type, supertype);
        }
        for extractor in self.extractors {
            registry.register_arc(extractor)?;
        }
        let extractors = Arc::new(registry);

        let validators = self
            .validators
            .unwrap_or_else(|| Arc::new(DefaultConstraintValidatorFactory::new()));
        let interpolator = self
            .interpolator
            .unwrap_or_else(|| Arc::new(DefaultMessageInterpolator));
        let traversable = self
            .traversable
            .unwrap_or_else(|| Arc::new(DefaultTraversableResolver));

        log::debug!(
            "Building validator factory (fail_fast: {}, method rules: {:?})",
            self.config.fail_fast,
            self.config.method_validation
        );

        let metadata = MetaDataManager::new(
            self.reader.clone(),
            validators,
            extractors.clone(),
            self.config.method_validation.clone(),
        );
        Ok(ValidatorFactory {
            shared: Arc::new(ValidatorShared {
                config: self.config,
                metadata,
                resolver: GroupResolver::new(self.reader),
                extractors,
                interpolator,
                traversable,
            }),
        })
    }
}
