//! Method and constructor validation integration tests


use std::sync::Arc;
use stipulate_core::{
    Bean, ConstraintDeclaration, Declarations, DefaultConstraintValidatorFactory, DynamicBean, Error,
    ExecutableDeclaration, ExecutableSignature, GroupId, ParameterDeclaration, PropertyDeclaration, TypeDeclaration,
    Validator, ValidatorConfig, ValidatorFactory, Value,
};
use test_support::{bean_value, configured_factory, paths, validator};

fn place() -> ExecutableSignature {
    ExecutableSignature::method("place", ["String", "Int"])
}

fn schedule() -> ExecutableSignature {
    ExecutableSignature::method("schedule", ["Int", "Int"])
}

fn find() -> ExecutableSignature {
    ExecutableSignature::method("find", ["String"])
}

fn create() -> ExecutableSignature {
    ExecutableSignature::constructor("OrderService", ["String"])
}

fn service_declarations() -> Declarations {
    Declarations::new()
        .with_type(
            TypeDeclaration::new("OrderService")
                .property(PropertyDeclaration::new("region").constraint(ConstraintDeclaration::not_null()))
                .executable(
                    ExecutableDeclaration::new(place())
                        .parameter(ParameterDeclaration::new("sku").constraint(ConstraintDeclaration::not_blank()))
                        .parameter(
                            ParameterDeclaration::new("quantity")
                                .constraint(ConstraintDeclaration::min(1))
                                .constraint(ConstraintDeclaration::max(10).group("Strict")),
                        ),
                )
                .executable(
                    ExecutableDeclaration::new(schedule())
                        .parameter(ParameterDeclaration::new("start"))
                        .parameter(ParameterDeclaration::new("end"))
                        .cross_parameter(ConstraintDeclaration::new("Ordered").message("start must not be after end")),
                )
                .executable(
                    ExecutableDeclaration::new(find())
                        .parameter(ParameterDeclaration::new("id"))
                        .returning_constraint(ConstraintDeclaration::not_null())
                        .valid_return(),
                )
                .executable(
                    ExecutableDeclaration::new(create())
                        .parameter(ParameterDeclaration::new("region").constraint(ConstraintDeclaration::not_blank()))
                        .valid_return(),
                ),
        )
        .with_type(
            TypeDeclaration::new("Customer")
                .property(PropertyDeclaration::new("name").constraint(ConstraintDeclaration::not_blank())),
        )
}

fn service_validator() -> Validator {
    let mut validators = DefaultConstraintValidatorFactory::new();
    validators.register_fn("Ordered", |value| match value {
        Value::List(parameters) => match (parameters[0].as_f64(), parameters[1].as_f64()) {
            (Some(start), Some(end)) => start <= end,
            _ => true,
        },
        _ => true,
    });
    ValidatorFactory::builder(Arc::new(service_declarations()))
        .with_constraint_validator_factory(validators)
        .build()
        .unwrap()
        .validator()
}

fn service() -> Arc<dyn Bean> {
    DynamicBean::new("OrderService").with("region", "EU").into_arc()
}

#[test]
fn test_parameter_constraints() {
    let validator = service_validator();
    let service = service();
    let arguments = [Value::text(" "), Value::Int(0)];

    let violations = validator.validate_parameters(&service, &place(), &arguments, &[]).unwrap();
    assert_eq!(paths(&violations), vec!["place.quantity", "place.sku"]);

    let violation = violations.for_path("place.quantity")[0];
    assert_eq!(violation.executable_parameters(), Some(&arguments[..]));
    assert!(violation.executable_return_value().is_none());
    assert!(Arc::ptr_eq(violation.root_bean().unwrap(), &service));

    let strict = validator
        .validate_parameters(&service, &place(), &[Value::text("A1"), Value::Int(11)], &[GroupId::new("Strict")])
        .unwrap();
    assert_eq!(paths(&strict), vec!["place.quantity"]);
}

#[test]
fn test_cross_parameter_constraint() {
    let validator = service_validator();
    let service = service();

    let violations = validator
        .validate_parameters(&service, &schedule(), &[Value::Int(5), Value::Int(3)], &[])
        .unwrap();
    assert_eq!(paths(&violations), vec!["schedule.<cross-parameter>"]);

    let violation = violations.iter().next().unwrap();
    assert_eq!(violation.message(), "start must not be after end");
    assert_eq!(violation.invalid_value(), &Value::List(vec![Value::Int(5), Value::Int(3)]));

    assert!(validator
        .validate_parameters(&service, &schedule(), &[Value::Int(1), Value::Int(3)], &[])
        .unwrap()
        .is_empty());
}

#[test]
fn test_wrong_argument_count() {
    let validator = service_validator();
    let err = validator
        .validate_parameters(&service(), &place(), &[Value::text("A1")], &[])
        .unwrap_err();
    assert!(matches!(
        err,
        Error::ParameterCount {
            expected: 2,
            actual: 1,
            ..
        }
    ));
}

#[test]
fn test_return_value_constraints_and_cascade() {
    let validator = service_validator();
    let service = service();

    let violations = validator.validate_return_value(&service, &find(), &Value::Null, &[]).unwrap();
    assert_eq!(paths(&violations), vec!["find.<return value>"]);
    assert_eq!(
        violations.iter().next().unwrap().executable_return_value(),
        Some(&Value::Null)
    );

    let customer = bean_value(DynamicBean::new("Customer").with("name", ""));
    let violations = validator.validate_return_value(&service, &find(), &customer, &[]).unwrap();
    assert_eq!(paths(&violations), vec!["find.<return value>.name"]);
}

#[test]
fn test_constructor_validation() {
    let validator = service_validator();

    let violations = validator
        .validate_constructor_parameters("OrderService", &create(), &[Value::text("")], &[])
        .unwrap();
    assert_eq!(paths(&violations), vec!["OrderService.region"]);
    assert!(violations.iter().next().unwrap().root_bean().is_none());

    let created = DynamicBean::new("OrderService").into_arc();
    let violations = validator
        .validate_constructor_return_value(&created, &create(), &[])
        .unwrap();
    assert_eq!(paths(&violations), vec!["OrderService.<return value>.region"]);
}

#[test]
fn test_signature_kind_must_match_entry_point() {
    let validator = service_validator();
    let err = validator
        .validate_parameters(&service(), &create(), &[Value::text("EU")], &[])
        .unwrap_err();
    assert!(err.is_configuration_error());
}

fn ship() -> ExecutableSignature {
    ExecutableSignature::method("ship", ["Parcel"])
}

fn shipping_declarations(base_constrained: bool, derived_constrained: bool) -> Declarations {
    let parameter = |constrained: bool| {
        let parameter = ParameterDeclaration::new("parcel");
        if constrained {
            parameter.constraint(ConstraintDeclaration::not_null())
        } else {
            parameter
        }
    };
    Declarations::new()
        .with_type(
            TypeDeclaration::new("Shipper")
                .executable(ExecutableDeclaration::new(ship()).parameter(parameter(base_constrained))),
        )
        .with_type(
            TypeDeclaration::new("ExpressShipper")
                .extends("Shipper")
                .executable(ExecutableDeclaration::new(ship()).parameter(parameter(derived_constrained))),
        )
}

#[test]
fn test_overriding_method_must_not_strengthen_preconditions() {
    let shipper = DynamicBean::new("ExpressShipper").into_arc();

    let err = validator(shipping_declarations(false, true))
        .validate_parameters(&shipper, &ship(), &[Value::Null], &[])
        .unwrap_err();
    match err {
        Error::MethodConfiguration { rule, .. } => {
            assert_eq!(rule, "OverridingMethodMustNotAlterParameterConstraints")
        }
        other => panic!("unexpected error {:?}", other),
    }

    let relaxed = configured_factory(
        shipping_declarations(false, true),
        ValidatorConfig::new().allow_overriding_method_alter_parameter_constraint(),
    );
    let violations = relaxed
        .validator()
        .validate_parameters(&shipper, &ship(), &[Value::Null], &[])
        .unwrap();
    assert_eq!(paths(&violations), vec!["ship.parcel"]);
}

#[test]
fn test_inherited_parameter_constraints_apply() {
    let shipper = DynamicBean::new("ExpressShipper").into_arc();
    let violations = validator(shipping_declarations(true, false))
        .validate_parameters(&shipper, &ship(), &[Value::Null], &[])
        .unwrap();
    assert_eq!(paths(&violations), vec!["ship.parcel"]);
}

#[test]
fn test_parallel_methods_must_not_define_parameter_constraints() {
    let declarations = Declarations::new()
        .with_type(TypeDeclaration::new("Tracked").executable(ExecutableDeclaration::new(ship()).parameter(
            ParameterDeclaration::new("parcel").constraint(ConstraintDeclaration::not_null()),
        )))
        .with_type(
            TypeDeclaration::new("Insured")
                .executable(ExecutableDeclaration::new(ship()).parameter(ParameterDeclaration::new("parcel"))),
        )
        .with_type(TypeDeclaration::new("Courier").implements("Tracked").implements("Insured"));
    let courier = DynamicBean::new("Courier").into_arc();

    let err = validator(declarations)
        .validate_parameters(&courier, &ship(), &[Value::Null], &[])
        .unwrap_err();
    assert!(matches!(
        err,
        Error::MethodConfiguration {
            rule: "ParallelMethodsMustNotDefineParameterConstraints",
            ..
        }
    ));
}

#[test]
fn test_void_method_with_return_value_constraint() {
    let close = ExecutableSignature::method("close", std::iter::empty::<&str>());
    let declarations = Declarations::new().with_type(
        TypeDeclaration::new("Channel").executable(
            ExecutableDeclaration::new(close.clone())
                .void()
                .returning_constraint(ConstraintDeclaration::not_null()),
        ),
    );
    let channel = DynamicBean::new("Channel").into_arc();

    let err = validator(declarations)
        .validate_return_value(&channel, &close, &Value::Null, &[])
        .unwrap_err();
    assert!(matches!(
        err,
        Error::MethodConfiguration {
            rule: "VoidMethodsMustNotBeReturnValueConstrained",
            ..
        }
    ));
}
