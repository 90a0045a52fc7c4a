//! Property-based tests for the validation engine
//!
//! These tests verify invariants that should hold for all inputs: constraint
//! aggregation over hierarchies, size semantics, fail-fast bounds and
//! repeatability of validation calls.


use proptest::prelude::*;
use stipulate_core::{ConstraintDeclaration, Declarations, DynamicBean, PropertyDeclaration, TypeDeclaration};
use test_support::{factory, validator};

/// Chain `T0 <- T1 <- ...` where every type puts one `Min` bound on `value`
fn chain(bounds: &[i64]) -> Declarations {
    let mut declarations = Declarations::new();
    for (i, bound) in bounds.iter().enumerate() {
        let mut declaration = TypeDeclaration::new(format!("T{}", i))
            .property(PropertyDeclaration::new("value").constraint(ConstraintDeclaration::min(*bound)));
        if i > 0 {
            declaration = declaration.extends(format!("T{}", i - 1));
        }
        declarations.add_type(declaration);
    }
    declarations
}

proptest! {
    #[test]
    fn prop_hierarchy_constraints_accumulate(
        bounds in prop::collection::vec(-50i64..50, 1..6),
        value in -60i64..60,
    ) {
        let validator = validator(chain(&bounds));
        let leaf = DynamicBean::new(format!("T{}", bounds.len() - 1)).with("value", value).into_arc();

        let violations = validator.validate(&leaf, &[]).unwrap();
        let expected = bounds.iter().filter(|bound| value < **bound).count();
        prop_assert_eq!(violations.len(), expected);
        prop_assert!(violations.iter().all(|v| v.property_path().to_string() == "value"));
    }

    #[test]
    fn prop_size_matches_char_count(
        text in "[a-zé ]{0,12}",
        min in 0i64..6,
        extra in 0i64..6,
    ) {
        let max = min + extra;
        let declarations = Declarations::new().with_type(
            TypeDeclaration::new("Note")
                .property(PropertyDeclaration::new("body").constraint(ConstraintDeclaration::size(min, max))),
        );
        let note = DynamicBean::new("Note").with("body", text.clone()).into_arc();

        let violations = validator(declarations).validate(&note, &[]).unwrap();
        let len = text.chars().count() as i64;
        prop_assert_eq!(violations.is_empty(), len >= min && len <= max);
    }

    #[test]
    fn prop_fail_fast_reports_at_most_one(
        bounds in prop::collection::vec(-50i64..50, 1..6),
        value in -60i64..60,
    ) {
        let factory = factory(chain(&bounds));
        let leaf = DynamicBean::new(format!("T{}", bounds.len() - 1)).with("value", value).into_arc();

        let all = factory.validator().validate(&leaf, &[]).unwrap();
        let fast = factory.validator().with_fail_fast(true).validate(&leaf, &[]).unwrap();
        prop_assert!(fast.len() <= 1);
        prop_assert_eq!(fast.is_empty(), all.is_empty());
    }

    #[test]
    fn prop_validation_is_repeatable(
        bounds in prop::collection::vec(-50i64..50, 1..6),
        value in -60i64..60,
    ) {
        let validator = validator(chain(&bounds));
        let leaf = DynamicBean::new(format!("T{}", bounds.len() - 1)).with("value", value).into_arc();

        let first = validator.validate(&leaf, &[]).unwrap();
        let second = validator.validate(&leaf, &[]).unwrap();
        prop_assert_eq!(first.messages(), second.messages());
    }
}
