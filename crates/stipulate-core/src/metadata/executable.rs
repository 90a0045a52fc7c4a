//! Method and constructor metadata
//!
//! Copyright (c) 2025 Stipulate Team
//! Licensed under the Apache-2.0 license

use super::declaration::{ExecutableKind, ExecutableSignature};
use super::descriptor::{ConstraintDescriptor, MetaConstraint};
use super::element::{ElementBuilder, ElementMetaData};
use super::hierarchy::TypeHierarchy;
use super::location::ConstraintLocation;
use super::manager::BuildContext;
use super::rules::{self, DeclaredExecutable};
use crate::error::Result;

#[derive(Debug, Clone)]
pub struct ParameterMetaData {
    index: usize,
    name: String,
    element: ElementMetaData,
}

impl ParameterMetaData {
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn element(&self) -> &ElementMetaData {
        &self.element
    }
}

/// Parameter, cross-parameter and return value constraints of one executable
#[derive(Debug)]
pub struct ExecutableMetaData {
    bean_type: String,
    signature: ExecutableSignature,
    parameters: Vec<ParameterMetaData>,
    cross_parameter_constraints: Vec<MetaConstraint>,
    return_value: ElementMetaData,
    declaring_types: Vec<String>,
    hierarchy: Vec<String>,
}

impl ExecutableMetaData {
    /// Aggregate the declarations of `signature` over the hierarchy
    ///
    /// Methods are collected from every type of the hierarchy; constructors
    /// are never inherited and come from the root type only.
    pub(crate) fn build(
        hierarchy: &TypeHierarchy,
        signature: &ExecutableSignature,
        context: &BuildContext<'_>,
    ) -> Result<Self> {
        let candidates = match signature.kind {
            ExecutableKind::Method => hierarchy.types(),
            ExecutableKind::Constructor => &hierarchy.types()[..1],
        };
        let declared: Vec<DeclaredExecutable<'_>> = candidates
            .iter()
            .filter_map(|t| {
                t.executable_declaration(signature).map(|declaration| DeclaredExecutable {
                    declaring_type: &t.name,
                    declaration,
                })
            })
            .collect();

        rules::check(&declared, hierarchy, context.method_validation)?;

        let bean_type = hierarchy.root().name.clone();
        let count = signature.parameter_count();
        let mut parameter_builders: Vec<ElementBuilder> = (0..count).map(|_| ElementBuilder::new(&bean_type)).collect();
        let mut names: Vec<Option<String>> = vec![None; count];
        let mut cross_parameter_constraints = Vec::new();
        let mut return_value = ElementBuilder::new(&bean_type);

        for executable in &declared {
            let declaration = executable.declaration;
            for (index, parameter) in declaration.parameters.iter().enumerate().take(count) {
                if names[index].is_none() {
                    names[index] = Some(parameter.name.clone());
                }
                let location = ConstraintLocation::for_parameter(executable.declaring_type, signature, index);
                parameter_builders[index].add(&parameter.element, &location, context)?;
            }
            for constraint in &declaration.cross_parameter_constraints {
                let descriptor = ConstraintDescriptor::build(constraint, context.validators)?;
                cross_parameter_constraints.push(MetaConstraint::new(
                    ConstraintLocation::for_cross_parameter(executable.declaring_type, signature),
                    descriptor,
                ));
            }
            let location = ConstraintLocation::for_return_value(executable.declaring_type, signature);
            return_value.add(&declaration.return_value, &location, context)?;
        }

        let parameters = parameter_builders
            .into_iter()
            .zip(names)
            .enumerate()
            .map(|(index, (builder, name))| -> Result<ParameterMetaData> {
                Ok(ParameterMetaData {
                    index,
                    name: name.unwrap_or_else(|| format!("arg{}", index)),
                    element: builder.build(context)?,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        log::debug!(
            "Built metadata for {} of '{}' from {} declaration(s)",
            signature,
            bean_type,
            declared.len()
        );

        Ok(Self {
            declaring_types: declared.iter().map(|d| d.declaring_type.to_string()).collect(),
            hierarchy: hierarchy.type_names(),
            bean_type,
            signature: signature.clone(),
            parameters,
            cross_parameter_constraints,
            return_value: return_value.build(context)?,
        })
    }

    pub fn bean_type(&self) -> &str {
        &self.bean_type
    }

    pub fn signature(&self) -> &ExecutableSignature {
        &self.signature
    }

    pub fn parameters(&self) -> &[ParameterMetaData] {
        &self.parameters
    }

    pub fn cross_parameter_constraints(&self) -> &[MetaConstraint] {
        &self.cross_parameter_constraints
    }

    pub fn return_value(&self) -> &ElementMetaData {
        &self.return_value
    }

    /// Types of the hierarchy declaring this executable, root first
    pub fn declaring_types(&self) -> &[String] {
        &self.declaring_types
    }

    /// Names of the declared types this metadata was aggregated from, root first
    pub fn hierarchy(&self) -> &[String] {
        &self.hierarchy
    }

    pub fn has_parameter_constraints(&self) -> bool {
        !self.cross_parameter_constraints.is_empty() || self.parameters.iter().any(|p| p.element.is_constrained())
    }
}
