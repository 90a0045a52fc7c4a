//! Method configuration rules
//!
//! Checked pairwise over every declaration of one method signature found in a
//! bean's hierarchy. Two declarations are on the same hierarchy line when one
//! declaring type is a subtype of the other, and parallel otherwise.
//!
//! Copyright (c) 2025 Stipulate Team
//! Licensed under the Apache-2.0 license

use super::declaration::ExecutableDeclaration;
use super::hierarchy::TypeHierarchy;
use crate::config::MethodValidationConfig;
use crate::error::{Error, Result};

/// One declaration of the executable and the type declaring it
#[derive(Debug, Clone, Copy)]
pub(crate) struct DeclaredExecutable<'a> {
    pub declaring_type: &'a str,
    pub declaration: &'a ExecutableDeclaration,
}

type RuleCheck = fn(&DeclaredExecutable<'_>, &DeclaredExecutable<'_>, &TypeHierarchy) -> Option<String>;

struct MethodConfigurationRule {
    name: &'static str,
    check: RuleCheck,
}

const OVERRIDING_METHOD_MUST_NOT_ALTER_PARAMETER_CONSTRAINTS: MethodConfigurationRule = MethodConfigurationRule {
    name: "OverridingMethodMustNotAlterParameterConstraints",
    check: overriding_alters_parameter_constraints,
};

const PARALLEL_METHODS_MUST_NOT_DEFINE_PARAMETER_CONSTRAINTS: MethodConfigurationRule = MethodConfigurationRule {
    name: "ParallelMethodsMustNotDefineParameterConstraints",
    check: parallel_defines_parameter_constraints,
};

const RETURN_VALUE_MAY_ONLY_BE_MARKED_ONCE_AS_CASCADED: MethodConfigurationRule = MethodConfigurationRule {
    name: "ReturnValueMayOnlyBeMarkedOnceAsCascadedPerHierarchyLine",
    check: return_value_cascaded_twice,
};

const PARALLEL_METHODS_MUST_NOT_DEFINE_GROUP_CONVERSION: MethodConfigurationRule = MethodConfigurationRule {
    name: "ParallelMethodsMustNotDefineGroupConversionForCascadedReturnValue",
    check: parallel_defines_return_value_conversion,
};

const VOID_METHODS_MUST_NOT_BE_RETURN_VALUE_CONSTRAINED: &str = "VoidMethodsMustNotBeReturnValueConstrained";

fn is_defined_on_subtype(
    method: &DeclaredExecutable<'_>,
    other: &DeclaredExecutable<'_>,
    hierarchy: &TypeHierarchy,
) -> bool {
    method.declaring_type != other.declaring_type
        && hierarchy.is_subtype_of(method.declaring_type, other.declaring_type)
}

fn is_defined_on_parallel_type(
    method: &DeclaredExecutable<'_>,
    other: &DeclaredExecutable<'_>,
    hierarchy: &TypeHierarchy,
) -> bool {
    !hierarchy.is_subtype_of(method.declaring_type, other.declaring_type)
        && !hierarchy.is_subtype_of(other.declaring_type, method.declaring_type)
}

fn overriding_alters_parameter_constraints(
    method: &DeclaredExecutable<'_>,
    other: &DeclaredExecutable<'_>,
    hierarchy: &TypeHierarchy,
) -> Option<String> {
    let violated = is_defined_on_subtype(method, other, hierarchy)
        && method.declaration.has_parameter_constraints()
        && !other.declaration.is_equally_parameter_constrained(method.declaration);
    violated.then(|| {
        format!(
            "'{}' overrides a method of '{}' and must not alter its parameter constraints",
            method.declaring_type, other.declaring_type
        )
    })
}

fn parallel_defines_parameter_constraints(
    method: &DeclaredExecutable<'_>,
    other: &DeclaredExecutable<'_>,
    hierarchy: &TypeHierarchy,
) -> Option<String> {
    let violated = is_defined_on_parallel_type(method, other, hierarchy)
        && (method.declaration.has_parameter_constraints() || other.declaration.has_parameter_constraints());
    violated.then(|| {
        format!(
            "methods declared in parallel types '{}' and '{}' must not define parameter constraints",
            method.declaring_type, other.declaring_type
        )
    })
}

fn return_value_cascaded_twice(
    method: &DeclaredExecutable<'_>,
    other: &DeclaredExecutable<'_>,
    hierarchy: &TypeHierarchy,
) -> Option<String> {
    let violated = method.declaration.return_value.cascading.cascade
        && other.declaration.return_value.cascading.cascade
        && (is_defined_on_subtype(method, other, hierarchy) || is_defined_on_subtype(other, method, hierarchy));
    violated.then(|| {
        format!(
            "the return value is marked for cascaded validation in both '{}' and '{}'",
            method.declaring_type, other.declaring_type
        )
    })
}

fn parallel_defines_return_value_conversion(
    method: &DeclaredExecutable<'_>,
    other: &DeclaredExecutable<'_>,
    hierarchy: &TypeHierarchy,
) -> Option<String> {
    let has_conversions = |e: &DeclaredExecutable<'_>| !e.declaration.return_value.cascading.group_conversions.is_empty();
    let violated = is_defined_on_parallel_type(method, other, hierarchy) && (has_conversions(method) || has_conversions(other));
    violated.then(|| {
        format!(
            "methods declared in parallel types '{}' and '{}' must not define group conversions on the cascaded return value",
            method.declaring_type, other.declaring_type
        )
    })
}

/// Apply every enabled rule to all declarations of one executable
pub(crate) fn check(
    executables: &[DeclaredExecutable<'_>],
    hierarchy: &TypeHierarchy,
    config: &MethodValidationConfig,
) -> Result<()> {
    for executable in executables {
        let declaration = executable.declaration;
        if declaration.returns_void && declaration.has_return_value_constraints() {
            return Err(Error::MethodConfiguration {
                rule: VOID_METHODS_MUST_NOT_BE_RETURN_VALUE_CONSTRAINED,
                executable: declaration.signature.to_string(),
                message: format!(
                    "'{}' declares return value constraints on a void method",
                    executable.declaring_type
                ),
            });
        }
    }

    let mut rules = vec![PARALLEL_METHODS_MUST_NOT_DEFINE_GROUP_CONVERSION];
    if !config.allow_overriding_method_alter_parameter_constraint {
        rules.push(OVERRIDING_METHOD_MUST_NOT_ALTER_PARAMETER_CONSTRAINTS);
    }
    if !config.allow_parallel_methods_define_parameter_constraints {
        rules.push(PARALLEL_METHODS_MUST_NOT_DEFINE_PARAMETER_CONSTRAINTS);
    }
    if !config.allow_multiple_cascaded_validation_on_return_values {
        rules.push(RETURN_VALUE_MAY_ONLY_BE_MARKED_ONCE_AS_CASCADED);
    }

    for (i, method) in executables.iter().enumerate() {
        for (j, other) in executables.iter().enumerate() {
            if i == j {
                continue;
            }
            for rule in &rules {
                if let Some(message) = (rule.check)(method, other, hierarchy) {
                    return Err(Error::MethodConfiguration {
                        rule: rule.name,
                        executable: method.declaration.signature.to_string(),
                        message,
                    });
                }
            }
        }
    }
    Ok(())
}
