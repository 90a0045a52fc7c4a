//! Validation entry points
//!
//! Copyright (c) 2025 Stipulate Team
//! Licensed under the Apache-2.0 license

use super::context::ValidationContext;
use super::factory::ValidatorShared;
use super::traversal::leaf_property;
use super::violation::ConstraintViolations;
use crate::error::{Error, Result};
use crate::group::GroupId;
use crate::metadata::{ExecutableKind, ExecutableSignature};
use crate::path::{PathSegment, PropertyPath};
use crate::value::{Bean, Value};
use std::fmt;
use std::sync::Arc;

/// Validates beans, single properties, hypothetical values and executables
///
/// Cheap to clone. Every call is independent: visited beans and processed
/// constraints are tracked per call, so a validator may be used from many
/// threads at once.
#[derive(Clone)]
pub struct Validator {
    shared: Arc<ValidatorShared>,
    fail_fast: bool,
}

impl Validator {
    pub(crate) fn new(shared: Arc<ValidatorShared>, fail_fast: bool) -> Self {
        Self { shared, fail_fast }
    }

    /// The same validator with fail-fast mode switched on or off
    pub fn with_fail_fast(mut self, fail_fast: bool) -> Self {
        self.fail_fast = fail_fast;
        self
    }

    pub fn is_fail_fast(&self) -> bool {
        self.fail_fast
    }

    /// Validate all constraints of `bean` for `groups`, cascading through the object graph
    ///
    /// An empty group list means the Default group.
    pub fn validate(&self, bean: &Arc<dyn Bean>, groups: &[GroupId]) -> Result<ConstraintViolations> {
        let span = tracing::debug_span!("validate", bean_type = bean.bean_type());
        let _enter = span.enter();

        let mut ctx = ValidationContext::new(&self.shared, self.fail_fast, bean.bean_type())
            .with_root_bean(bean.clone());
        ctx.validate_root_bean(bean, groups)?;
        Ok(self.finish(ctx))
    }

    /// Validate the constraints of the property designated by `property_path`
    ///
    /// The path is a dotted list of property names, each optionally followed
    /// by an index or key selector (`orders[1].lines[0].amount`). Every
    /// segment before the last must be a cascaded property.
    pub fn validate_property(
        &self,
        bean: &Arc<dyn Bean>,
        property_path: &str,
        groups: &[GroupId],
    ) -> Result<ConstraintViolations> {
        let span = tracing::debug_span!("validate_property", bean_type = bean.bean_type(), path = property_path);
        let _enter = span.enter();

        let segments = PropertyPath::parse(property_path)?;
        let (last, intermediate) = split_last_segment(&segments, property_path)?;

        let mut ctx = ValidationContext::new(&self.shared, self.fail_fast, bean.bean_type())
            .with_root_bean(bean.clone());
        let Some((leaf, metadata, bean_path)) = ctx.walk_bean_path(bean, intermediate, property_path)? else {
            return Ok(ConstraintViolations::default());
        };
        let property = leaf_property(&metadata, last, property_path)?;
        if !ctx.is_reachable(&leaf, property.name(), &bean_path)? {
            return Ok(ConstraintViolations::default());
        }
        let cascadable = ctx.is_cascadable(&leaf, property.name(), &bean_path)?;
        let value = property.read(leaf.as_ref())?;
        let order = self.shared.resolver.resolve(groups, &metadata, Some(leaf.as_ref()))?;
        let path = bean_path.property(property.name());

        ctx.validate_property_value(&metadata, property, &value, &path, Some(&leaf), cascadable, &order)?;
        Ok(self.finish(ctx))
    }

    /// Validate `value` as if it were the value of `property_path` on a bean of `bean_type`
    ///
    /// No bean instance exists: violations carry no root or leaf bean, and
    /// dynamic default group sequence providers are called without one.
    pub fn validate_value(
        &self,
        bean_type: &str,
        property_path: &str,
        value: Value,
        groups: &[GroupId],
    ) -> Result<ConstraintViolations> {
        let span = tracing::debug_span!("validate_value", bean_type, path = property_path);
        let _enter = span.enter();

        let segments = PropertyPath::parse(property_path)?;
        let (last, intermediate) = split_last_segment(&segments, property_path)?;

        let mut ctx = ValidationContext::new(&self.shared, self.fail_fast, bean_type);
        let (metadata, path) = ctx.walk_type_path(bean_type, intermediate, property_path)?;
        let property = leaf_property(&metadata, last, property_path)?;
        let order = self.shared.resolver.resolve(groups, &metadata, None)?;
        let path = path.property(property.name());

        ctx.validate_property_value(&metadata, property, &value, &path, None, true, &order)?;
        Ok(self.finish(ctx))
    }

    /// Validate the arguments of a method call on `bean`
    pub fn validate_parameters(
        &self,
        bean: &Arc<dyn Bean>,
        method: &ExecutableSignature,
        parameters: &[Value],
        groups: &[GroupId],
    ) -> Result<ConstraintViolations> {
        let span = tracing::debug_span!("validate_parameters", bean_type = bean.bean_type(), executable = %method);
        let _enter = span.enter();

        expect_kind(method, ExecutableKind::Method)?;
        let metadata = self.shared.metadata.executable_metadata(bean.bean_type(), method)?;
        let bean_metadata = self.shared.metadata.bean_metadata(bean.bean_type())?;
        let order = self.shared.resolver.resolve(groups, &bean_metadata, Some(bean.as_ref()))?;

        let mut ctx = ValidationContext::new(&self.shared, self.fail_fast, bean.bean_type())
            .with_root_bean(bean.clone())
            .with_parameters(parameters);
        ctx.validate_parameters(&metadata, Some(bean), parameters, &order)?;
        Ok(self.finish(ctx))
    }

    /// Validate the value returned by a method call on `bean`
    pub fn validate_return_value(
        &self,
        bean: &Arc<dyn Bean>,
        method: &ExecutableSignature,
        return_value: &Value,
        groups: &[GroupId],
    ) -> Result<ConstraintViolations> {
        let span = tracing::debug_span!("validate_return_value", bean_type = bean.bean_type(), executable = %method);
        let _enter = span.enter();

        expect_kind(method, ExecutableKind::Method)?;
        let metadata = self.shared.metadata.executable_metadata(bean.bean_type(), method)?;
        let bean_metadata = self.shared.metadata.bean_metadata(bean.bean_type())?;
        let order = self.shared.resolver.resolve(groups, &bean_metadata, Some(bean.as_ref()))?;

        let mut ctx = ValidationContext::new(&self.shared, self.fail_fast, bean.bean_type())
            .with_root_bean(bean.clone())
            .with_return_value(return_value);
        ctx.validate_return_value(&metadata, Some(bean), return_value, &order)?;
        Ok(self.finish(ctx))
    }

    /// Validate constructor arguments before an instance of `bean_type` exists
    pub fn validate_constructor_parameters(
        &self,
        bean_type: &str,
        constructor: &ExecutableSignature,
        parameters: &[Value],
        groups: &[GroupId],
    ) -> Result<ConstraintViolations> {
        let span = tracing::debug_span!("validate_constructor_parameters", bean_type, executable = %constructor);
        let _enter = span.enter();

        expect_kind(constructor, ExecutableKind::Constructor)?;
        let metadata = self.shared.metadata.executable_metadata(bean_type, constructor)?;
        let bean_metadata = self.shared.metadata.bean_metadata(bean_type)?;
        let order = self.shared.resolver.resolve(groups, &bean_metadata, None)?;

        let mut ctx = ValidationContext::new(&self.shared, self.fail_fast, bean_type).with_parameters(parameters);
        ctx.validate_parameters(&metadata, None, parameters, &order)?;
        Ok(self.finish(ctx))
    }

    /// Validate a freshly constructed bean as the constructor's return value
    pub fn validate_constructor_return_value(
        &self,
        created: &Arc<dyn Bean>,
        constructor: &ExecutableSignature,
        groups: &[GroupId],
    ) -> Result<ConstraintViolations> {
        let span = tracing::debug_span!(
            "validate_constructor_return_value",
            bean_type = created.bean_type(),
            executable = %constructor
        );
        let _enter = span.enter();

        expect_kind(constructor, ExecutableKind::Constructor)?;
        let metadata = self.shared.metadata.executable_metadata(created.bean_type(), constructor)?;
        let bean_metadata = self.shared.metadata.bean_metadata(created.bean_type())?;
        let order = self.shared.resolver.resolve(groups, &bean_metadata, Some(created.as_ref()))?;

        let return_value = Value::Bean(created.clone());
        let mut ctx = ValidationContext::new(&self.shared, self.fail_fast, created.bean_type())
            .with_root_bean(created.clone())
            .with_return_value(&return_value);
        ctx.validate_return_value(&metadata, Some(created), &return_value, &order)?;
        Ok(self.finish(ctx))
    }

    fn finish(&self, ctx: ValidationContext<'_>) -> ConstraintViolations {
        let violations = ctx.into_violations();
        tracing::debug!(violations = violations.len(), "validation finished");
        violations
    }
}

impl fmt::Debug for Validator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Validator")
            .field("fail_fast", &self.fail_fast)
            .finish()
    }
}

fn split_last_segment<'s>(
    segments: &'s [PathSegment],
    raw_path: &str,
) -> Result<(&'s PathSegment, &'s [PathSegment])> {
    let (last, intermediate) = segments
        .split_last()
        .ok_or_else(|| Error::invalid_path(raw_path, "empty property path"))?;
    if last.selector.is_some() {
        return Err(Error::invalid_path(
            raw_path,
            "the last segment must name a property, not a container element",
        ));
    }
    Ok((last, intermediate))
}

fn expect_kind(signature: &ExecutableSignature, kind: ExecutableKind) -> Result<()> {
    if signature.kind == kind {
        Ok(())
    } else {
        Err(Error::configuration(format!(
            "{} is not a {}",
            signature,
            match kind {
                ExecutableKind::Method => "method",
                ExecutableKind::Constructor => "constructor",
            }
        )))
    }
}
