//! Object graph traversal
//!
//! Evaluates local constraints of beans and executables for one group at a
//! time and cascades into referenced beans and container elements. A bean is
//! validated at most once per group within a call, which also terminates
//! traversal of cyclic graphs.
//!
//! Copyright (c) 2025 Stipulate Team
//! Licensed under the Apache-2.0 license

use super::context::ValidationContext;
use crate::constraint::composition;
use crate::error::{Error, Result};
use crate::group::{GroupId, GroupSlot, ValidationOrder};
use crate::metadata::{
    BeanMetaData, CascadingMetadata, ContainerElementMetaData, ElementMetaData, ExecutableKind, ExecutableMetaData,
    ExecutableSignature, MetaConstraint, PropertyMetaData,
};
use crate::path::{PathNode, PathSegment, PathSelector, PropertyPath};
use crate::value::{Bean, Value};
use std::collections::BTreeSet;
use std::sync::Arc;

/// The group being evaluated and the bean type it is evaluated for
struct GroupScope<'g> {
    group: &'g GroupId,
    closure: Arc<BTreeSet<GroupId>>,
    bean_type: &'g str,
}

impl GroupScope<'_> {
    /// A constraint applies when one of its groups is the evaluated group or
    /// one of its ancestors. Default constraints also apply to the implicit
    /// group of the validated type and of their declaring type.
    fn includes(&self, constraint: &MetaConstraint) -> bool {
        let descriptor = constraint.descriptor();
        if descriptor.groups().iter().any(|g| self.closure.contains(g)) {
            return true;
        }
        descriptor.is_in_default_group()
            && (self.group.name() == self.bean_type || self.group.name() == constraint.location().declaring_type())
    }

    /// Cascades leave the implicit type group as the Default group
    fn cascade_group(&self) -> GroupId {
        if self.group.name() == self.bean_type {
            GroupId::default_group()
        } else {
            self.group.clone()
        }
    }
}

/// Root path of an executable's parameters or return value
pub(crate) fn executable_path(signature: &ExecutableSignature) -> PropertyPath {
    let node = match signature.kind {
        ExecutableKind::Method => PathNode::Method(signature.name.clone()),
        ExecutableKind::Constructor => PathNode::Constructor(signature.name.clone()),
    };
    PropertyPath::root().child(node)
}

impl ValidationContext<'_> {
    fn scope<'g>(&self, group: &'g GroupId, bean_type: &'g str) -> GroupScope<'g> {
        GroupScope {
            group,
            closure: self.shared.resolver.group_closure(group),
            bean_type,
        }
    }

    /// Evaluate each slot of `order`; a sequence stops after its first group with violations
    pub(crate) fn run_order<F>(&mut self, order: &ValidationOrder, mut evaluate: F) -> Result<()>
    where
        F: FnMut(&mut Self, &GroupId) -> Result<()>,
    {
        for slot in order.slots() {
            match slot {
                GroupSlot::Group(group) => evaluate(self, group)?,
                GroupSlot::Sequence { groups, .. } => self.run_sequence(groups, &mut evaluate)?,
            }
            if self.should_stop() {
                break;
            }
        }
        Ok(())
    }

    fn run_sequence<F>(&mut self, groups: &[GroupId], evaluate: &mut F) -> Result<()>
    where
        F: FnMut(&mut Self, &GroupId) -> Result<()>,
    {
        for group in groups {
            let before = self.violation_count();
            evaluate(self, group)?;
            if self.violation_count() > before || self.should_stop() {
                log::trace!("Group sequence stopped after group '{}'", group);
                break;
            }
        }
        Ok(())
    }

    pub(crate) fn validate_root_bean(&mut self, bean: &Arc<dyn Bean>, groups: &[GroupId]) -> Result<()> {
        let metadata = self.shared.metadata.bean_metadata(bean.bean_type())?;
        let order = self.shared.resolver.resolve(groups, &metadata, Some(bean.as_ref()))?;
        let path = PropertyPath::root();
        self.run_order(&order, |ctx, group| ctx.validate_bean(bean, &metadata, &path, group))
    }

    /// Validate a bean for one group, expanding Default and sequence groups for this bean
    fn validate_bean(
        &mut self,
        bean: &Arc<dyn Bean>,
        metadata: &BeanMetaData,
        path: &PropertyPath,
        group: &GroupId,
    ) -> Result<()> {
        if group.is_default() && metadata.default_sequence().is_redefined() {
            let sequence = self
                .shared
                .resolver
                .default_sequence(metadata, Some(bean.as_ref()))?
                .unwrap_or_default();
            return self.run_sequence(&sequence, &mut |ctx, g| ctx.validate_bean(bean, metadata, path, g));
        }
        if let Some(sequence) = self.shared.resolver.expand_sequence(group)? {
            return self.run_sequence(&sequence, &mut |ctx, g| ctx.validate_bean(bean, metadata, path, g));
        }
        self.validate_bean_for_group(bean, metadata, path, group)
    }

    fn validate_bean_for_group(
        &mut self,
        bean: &Arc<dyn Bean>,
        metadata: &BeanMetaData,
        path: &PropertyPath,
        group: &GroupId,
    ) -> Result<()> {
        if self.should_stop() || !self.mark_visited(bean, group) {
            return Ok(());
        }
        let scope = self.scope(group, metadata.bean_type());

        if !metadata.type_constraints().is_empty() {
            let bean_value = Value::Bean(bean.clone());
            let unit = path.to_string();
            for constraint in metadata.type_constraints() {
                if scope.includes(constraint) {
                    self.validate_constraint(constraint, &bean_value, path, &unit, Some(bean), group)?;
                }
            }
        }

        let cascade_group = scope.cascade_group();
        for property in metadata.properties() {
            if self.should_stop() {
                break;
            }
            let element = property.element();
            if !element.is_constrained() || !self.is_reachable(bean, property.name(), path)? {
                continue;
            }
            let value = property.read(bean.as_ref())?;
            let property_path = path.property(property.name());
            self.validate_element(element, &value, &property_path, Some(bean), &scope)?;
            if element.cascading().has_cascading() && self.is_cascadable(bean, property.name(), path)? {
                self.cascade(element.cascading(), &value, &property_path, &cascade_group)?;
            }
        }
        Ok(())
    }

    fn validate_element(
        &mut self,
        element: &ElementMetaData,
        value: &Value,
        path: &PropertyPath,
        leaf: Option<&Arc<dyn Bean>>,
        scope: &GroupScope<'_>,
    ) -> Result<()> {
        let unit = path.to_string();
        for constraint in element.constraints() {
            if scope.includes(constraint) {
                self.validate_constraint(constraint, value, path, &unit, leaf, scope.group)?;
            }
        }
        for container in element.container_elements() {
            self.validate_container_element(container, value, path, &unit, leaf, scope)?;
        }
        Ok(())
    }

    fn validate_container_element(
        &mut self,
        container: &ContainerElementMetaData,
        value: &Value,
        path: &PropertyPath,
        unit: &str,
        leaf: Option<&Arc<dyn Bean>>,
        scope: &GroupScope<'_>,
    ) -> Result<()> {
        if value.is_null() || self.should_stop() || !container.has_constraints() {
            return Ok(());
        }
        let extractor = match container.extractor() {
            Some(extractor) => extractor.clone(),
            None => self.shared.extractors.resolve(value.type_name(), container.position())?,
        };

        for (ordinal, extracted) in extractor.extract(value).into_iter().enumerate() {
            let element_path = path.element(&extracted.node);
            // iterable elements render identically, the ordinal keeps their units apart
            let element_unit = format!("{}<{}>[{}]", unit, container.position(), ordinal);
            for constraint in container.constraints() {
                if scope.includes(constraint) {
                    self.validate_constraint(
                        constraint,
                        &extracted.value,
                        &element_path,
                        &element_unit,
                        leaf,
                        scope.group,
                    )?;
                }
            }
            for nested in container.nested() {
                self.validate_container_element(nested, &extracted.value, &element_path, &element_unit, leaf, scope)?;
            }
        }
        Ok(())
    }

    fn validate_constraint(
        &mut self,
        constraint: &MetaConstraint,
        value: &Value,
        path: &PropertyPath,
        unit: &str,
        leaf: Option<&Arc<dyn Bean>>,
        group: &GroupId,
    ) -> Result<()> {
        if self.should_stop() || !self.mark_processed(leaf, unit, constraint) {
            return Ok(());
        }
        log::trace!("Evaluating '{}' at '{}'", constraint.descriptor().name(), path);
        let evaluation = composition::evaluate(constraint.descriptor(), value)?;
        for pending in evaluation.violations {
            self.report(pending, value, path, leaf, group);
            if self.should_stop() {
                break;
            }
        }
        Ok(())
    }

    fn cascade(
        &mut self,
        cascading: &CascadingMetadata,
        value: &Value,
        path: &PropertyPath,
        group: &GroupId,
    ) -> Result<()> {
        if value.is_null() || self.should_stop() {
            return Ok(());
        }
        if cascading.is_cascading() {
            let target = cascading.convert_group(group);
            match value {
                Value::Bean(bean) => self.validate_cascaded_bean(bean, path, &target)?,
                other => self.cascade_into_container(other, path, &target)?,
            }
        }
        for (position, nested) in cascading.type_arguments() {
            if !nested.has_cascading() {
                continue;
            }
            let extractor = self.shared.extractors.resolve(value.type_name(), *position)?;
            for extracted in extractor.extract(value) {
                let element_path = path.element(&extracted.node);
                self.cascade(nested, &extracted.value, &element_path, group)?;
            }
        }
        Ok(())
    }

    /// Cascade on a container value reaches the beans at its default type argument
    fn cascade_into_container(&mut self, value: &Value, path: &PropertyPath, group: &GroupId) -> Result<()> {
        let container_type = value.type_name();
        if !self.shared.extractors.is_container(container_type) {
            log::trace!(
                "Value of type '{}' at '{}' is neither a bean nor a container, not cascading",
                container_type,
                path
            );
            return Ok(());
        }
        let position = self.shared.extractors.default_position(container_type);
        let extractor = self.shared.extractors.resolve(container_type, position)?;
        for extracted in extractor.extract(value) {
            if let Value::Bean(bean) = &extracted.value {
                self.validate_cascaded_bean(bean, &path.element(&extracted.node), group)?;
            }
        }
        Ok(())
    }

    fn validate_cascaded_bean(&mut self, bean: &Arc<dyn Bean>, path: &PropertyPath, group: &GroupId) -> Result<()> {
        if self.should_stop() {
            return Ok(());
        }
        let metadata = self.shared.metadata.bean_metadata(bean.bean_type())?;
        self.validate_bean(bean, &metadata, path, group)
    }

    /// Cross-parameter and per-parameter constraints, cascading into parameters
    pub(crate) fn validate_parameters(
        &mut self,
        metadata: &ExecutableMetaData,
        leaf: Option<&Arc<dyn Bean>>,
        parameters: &[Value],
        order: &ValidationOrder,
    ) -> Result<()> {
        if parameters.len() != metadata.parameters().len() {
            return Err(Error::ParameterCount {
                executable: metadata.signature().to_string(),
                expected: metadata.parameters().len(),
                actual: parameters.len(),
            });
        }
        let base = executable_path(metadata.signature());
        let cross_path = base.child(PathNode::CrossParameter);
        let cross_unit = cross_path.to_string();
        let all_parameters = Value::List(parameters.to_vec());

        self.run_order(order, |ctx, group| {
            let scope = ctx.scope(group, metadata.bean_type());
            for constraint in metadata.cross_parameter_constraints() {
                if scope.includes(constraint) {
                    ctx.validate_constraint(constraint, &all_parameters, &cross_path, &cross_unit, leaf, group)?;
                }
            }
            let cascade_group = scope.cascade_group();
            for parameter in metadata.parameters() {
                let value = &parameters[parameter.index()];
                let path = base.child(PathNode::Parameter {
                    name: parameter.name().to_string(),
                    index: parameter.index(),
                });
                ctx.validate_element(parameter.element(), value, &path, leaf, &scope)?;
                ctx.cascade(parameter.element().cascading(), value, &path, &cascade_group)?;
            }
            Ok(())
        })
    }

    /// Return value constraints, cascading into the returned value
    pub(crate) fn validate_return_value(
        &mut self,
        metadata: &ExecutableMetaData,
        leaf: Option<&Arc<dyn Bean>>,
        value: &Value,
        order: &ValidationOrder,
    ) -> Result<()> {
        let path = executable_path(metadata.signature()).child(PathNode::ReturnValue);
        self.run_order(order, |ctx, group| {
            let scope = ctx.scope(group, metadata.bean_type());
            ctx.validate_element(metadata.return_value(), value, &path, leaf, &scope)?;
            ctx.cascade(metadata.return_value().cascading(), value, &path, &scope.cascade_group())
        })
    }

    /// Constraints of one property, for a live bean or a hypothetical value
    pub(crate) fn validate_property_value(
        &mut self,
        metadata: &BeanMetaData,
        property: &PropertyMetaData,
        value: &Value,
        path: &PropertyPath,
        leaf: Option<&Arc<dyn Bean>>,
        cascadable: bool,
        order: &ValidationOrder,
    ) -> Result<()> {
        self.run_order(order, |ctx, group| {
            let scope = ctx.scope(group, metadata.bean_type());
            ctx.validate_element(property.element(), value, path, leaf, &scope)?;
            if !cascadable {
                return Ok(());
            }
            if let Some(bean) = leaf {
                // a cascade leading back to the leaf bean must not validate all of it
                ctx.mark_visited(bean, group);
            }
            ctx.cascade(property.element().cascading(), value, path, &scope.cascade_group())
        })
    }

    /// Follow the intermediate segments of a property path on a live bean
    ///
    /// Returns the bean holding the last segment and the path walked so far,
    /// or `None` when a null value or an untraversable property interrupts
    /// the walk.
    pub(crate) fn walk_bean_path(
        &self,
        root: &Arc<dyn Bean>,
        segments: &[PathSegment],
        raw_path: &str,
    ) -> Result<Option<(Arc<dyn Bean>, Arc<BeanMetaData>, PropertyPath)>> {
        let mut current = root.clone();
        let mut metadata = self.shared.metadata.bean_metadata(current.bean_type())?;
        let mut path = PropertyPath::root();

        for segment in segments {
            let property = cascaded_property(&metadata, segment, raw_path)?;
            let traversable = self.is_reachable(&current, &segment.name, &path)?
                && self.is_cascadable(&current, &segment.name, &path)?;
            if !traversable {
                return Ok(None);
            }
            let mut value = property.read(current.as_ref())?;
            path = path.property(&segment.name);
            if let Some(selector) = &segment.selector {
                match self.select_element(&value, selector, raw_path)? {
                    Some((node_path, element)) => {
                        path = path.extended(node_path.nodes());
                        value = element;
                    }
                    None => return Ok(None),
                }
            }
            match value {
                Value::Null => return Ok(None),
                Value::Bean(next) => {
                    metadata = self.shared.metadata.bean_metadata(next.bean_type())?;
                    current = next;
                }
                other => {
                    return Err(Error::invalid_path(
                        raw_path,
                        format!("'{}' holds a {} value, not a bean", segment.name, other.type_name()),
                    ))
                }
            }
        }
        Ok(Some((current, metadata, path)))
    }

    /// Follow the intermediate segments of a property path through declared types
    pub(crate) fn walk_type_path(
        &self,
        root_type: &str,
        segments: &[PathSegment],
        raw_path: &str,
    ) -> Result<(Arc<BeanMetaData>, PropertyPath)> {
        let mut metadata = self.shared.metadata.bean_metadata(root_type)?;
        let mut path = PropertyPath::root();

        for segment in segments {
            let property = cascaded_property(&metadata, segment, raw_path)?;
            let element = property.element();
            path = path.property(&segment.name);
            let next_type = match &segment.selector {
                Some(selector) => {
                    let container_type = element.declared_type().ok_or_else(|| {
                        Error::invalid_path(raw_path, format!("'{}' has no declared container type", segment.name))
                    })?;
                    let position = self.shared.extractors.default_position(container_type);
                    path = path.extended(&[PathNode::Element(selector_node(selector, container_type))]);
                    element.element_type(position)
                }
                None => element.declared_type(),
            };
            let next_type = next_type.map(str::to_string).ok_or_else(|| {
                Error::invalid_path(raw_path, format!("the type behind '{}' is not declared", segment.name))
            })?;
            metadata = self.shared.metadata.bean_metadata(&next_type)?;
        }
        Ok((metadata, path))
    }

    /// The element of a container addressed by a path selector
    fn select_element(
        &self,
        value: &Value,
        selector: &PathSelector,
        raw_path: &str,
    ) -> Result<Option<(PropertyPath, Value)>> {
        if value.is_null() {
            return Ok(None);
        }
        let container_type = value.type_name();
        if !self.shared.extractors.is_container(container_type) {
            return Err(Error::invalid_path(
                raw_path,
                format!("a {} value cannot be indexed", container_type),
            ));
        }
        let position = self.shared.extractors.default_position(container_type);
        let extractor = self.shared.extractors.resolve(container_type, position)?;
        Ok(extractor
            .extract(value)
            .into_iter()
            .find(|extracted| extracted.node.matches(selector))
            .map(|extracted| (PropertyPath::root().element(&extracted.node), extracted.value)))
    }
}

/// Intermediate path segments must name cascading properties
fn cascaded_property<'m>(
    metadata: &'m BeanMetaData,
    segment: &PathSegment,
    raw_path: &str,
) -> Result<&'m PropertyMetaData> {
    let property = leaf_property(metadata, segment, raw_path)?;
    if !property.element().cascading().has_cascading() {
        return Err(Error::invalid_path(
            raw_path,
            format!("property '{}' of '{}' is not cascaded", segment.name, metadata.bean_type()),
        ));
    }
    Ok(property)
}

pub(crate) fn leaf_property<'m>(
    metadata: &'m BeanMetaData,
    segment: &PathSegment,
    raw_path: &str,
) -> Result<&'m PropertyMetaData> {
    metadata.property(&segment.name).ok_or_else(|| {
        Error::invalid_path(
            raw_path,
            format!("'{}' has no constrained property '{}'", metadata.bean_type(), segment.name),
        )
    })
}

fn selector_node(selector: &PathSelector, container_type: &str) -> crate::path::ElementNode {
    use crate::path::ElementNode;
    match selector {
        PathSelector::Index(index) if container_type == "Map" => ElementNode::Key(Value::Int(*index as i64)),
        PathSelector::Index(index) => ElementNode::Index(*index),
        PathSelector::Key(key) => ElementNode::Key(Value::text(key.clone())),
    }
}
