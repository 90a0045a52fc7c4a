//! Traversable resolver integration tests


use std::sync::{Arc, Mutex};
use stipulate_core::{
    Bean, ConstraintDeclaration, Declarations, DynamicBean, Error, PropertyDeclaration, PropertyPath,
    TraversableResolver, TypeDeclaration, ValidatorFactory,
};
use test_support::{bean_value, paths};

fn declarations() -> Declarations {
    Declarations::new()
        .with_type(
            TypeDeclaration::new("User")
                .property(PropertyDeclaration::new("name").constraint(ConstraintDeclaration::not_null()))
                .property(PropertyDeclaration::new("age").constraint(ConstraintDeclaration::min(18)))
                .property(
                    PropertyDeclaration::new("address")
                        .declared_type("Address")
                        .constraint(ConstraintDeclaration::not_null())
                        .valid(),
                ),
        )
        .with_type(
            TypeDeclaration::new("Address")
                .property(PropertyDeclaration::new("street").constraint(ConstraintDeclaration::not_blank())),
        )
}

fn user() -> Arc<dyn Bean> {
    DynamicBean::new("User")
        .with("age", 12)
        .with("address", bean_value(DynamicBean::new("Address").with("street", "")))
        .into_arc()
}

/// Hides one property and stops cascades through another, recording every query
#[derive(Default)]
struct Restricting {
    unreachable: Option<&'static str>,
    not_cascadable: Option<&'static str>,
    queries: Mutex<Vec<String>>,
}

impl TraversableResolver for Restricting {
    fn is_reachable(
        &self,
        bean: &dyn Bean,
        property: &str,
        root_bean_type: &str,
        path_to_bean: &PropertyPath,
    ) -> anyhow::Result<bool> {
        self.queries.lock().unwrap().push(format!(
            "reachable {}:{}.{} from {}",
            path_to_bean,
            bean.bean_type(),
            property,
            root_bean_type
        ));
        Ok(self.unreachable != Some(property))
    }

    fn is_cascadable(
        &self,
        _bean: &dyn Bean,
        property: &str,
        _root_bean_type: &str,
        _path_to_bean: &PropertyPath,
    ) -> anyhow::Result<bool> {
        Ok(self.not_cascadable != Some(property))
    }
}

struct Failing;

impl TraversableResolver for Failing {
    fn is_reachable(&self, _: &dyn Bean, _: &str, _: &str, _: &PropertyPath) -> anyhow::Result<bool> {
        anyhow::bail!("session closed")
    }

    fn is_cascadable(&self, _: &dyn Bean, _: &str, _: &str, _: &PropertyPath) -> anyhow::Result<bool> {
        Ok(true)
    }
}

fn factory_with(resolver: impl TraversableResolver + 'static) -> ValidatorFactory {
    ValidatorFactory::builder(Arc::new(declarations()))
        .with_traversable_resolver(resolver)
        .build()
        .unwrap()
}

#[test]
fn test_default_resolver_visits_everything() {
    let violations = ValidatorFactory::new(Arc::new(declarations()))
        .validator()
        .validate(&user(), &[])
        .unwrap();
    assert_eq!(paths(&violations), vec!["address.street", "age", "name"]);
}

#[test]
fn test_unreachable_property_is_skipped() {
    let resolver = Restricting {
        unreachable: Some("age"),
        ..Default::default()
    };
    let violations = factory_with(resolver).validator().validate(&user(), &[]).unwrap();
    assert_eq!(paths(&violations), vec!["address.street", "name"]);
}

#[test]
fn test_not_cascadable_property_is_validated_but_not_followed() {
    let resolver = Restricting {
        not_cascadable: Some("address"),
        ..Default::default()
    };
    let validator = factory_with(resolver).validator();

    let violations = validator.validate(&user(), &[]).unwrap();
    assert_eq!(paths(&violations), vec!["age", "name"]);

    let homeless = DynamicBean::new("User").with("name", "Ada").with("age", 30).into_arc();
    assert_eq!(paths(&validator.validate(&homeless, &[]).unwrap()), vec!["address"]);
}

#[test]
fn test_resolver_sees_path_to_the_bean() {
    let resolver = Arc::new(Restricting::default());
    let factory = ValidatorFactory::builder(Arc::new(declarations()))
        .with_traversable_resolver(SharedResolver(resolver.clone()))
        .build()
        .unwrap();
    factory.validator().validate(&user(), &[]).unwrap();

    let queries = resolver.queries.lock().unwrap();
    assert!(queries.contains(&"reachable :User.age from User".to_string()), "{:?}", queries);
    assert!(
        queries.contains(&"reachable address:Address.street from User".to_string()),
        "{:?}",
        queries
    );
}

#[test]
fn test_validate_property_respects_resolver() {
    let hidden_street = Restricting {
        unreachable: Some("street"),
        ..Default::default()
    };
    let validator = factory_with(hidden_street).validator();
    assert!(validator.validate_property(&user(), "address.street", &[]).unwrap().is_empty());

    let no_cascade = Restricting {
        not_cascadable: Some("address"),
        ..Default::default()
    };
    let validator = factory_with(no_cascade).validator();
    assert!(validator.validate_property(&user(), "address.street", &[]).unwrap().is_empty());
    assert_eq!(
        paths(&validator.validate_property(&user(), "age", &[]).unwrap()),
        vec!["age"]
    );
}

#[test]
fn test_resolver_errors_abort_validation() {
    let err = factory_with(Failing).validator().validate(&user(), &[]).unwrap_err();
    match err {
        Error::TraversableResolver { bean_type, source, .. } => {
            assert_eq!(bean_type, "User");
            assert_eq!(source.to_string(), "session closed");
        }
        other => panic!("unexpected error {:?}", other),
    }
}

struct SharedResolver(Arc<Restricting>);

impl TraversableResolver for SharedResolver {
    fn is_reachable(
        &self,
        bean: &dyn Bean,
        property: &str,
        root_bean_type: &str,
        path_to_bean: &PropertyPath,
    ) -> anyhow::Result<bool> {
        self.0.is_reachable(bean, property, root_bean_type, path_to_bean)
    }

    fn is_cascadable(
        &self,
        bean: &dyn Bean,
        property: &str,
        root_bean_type: &str,
        path_to_bean: &PropertyPath,
    ) -> anyhow::Result<bool> {
        self.0.is_cascadable(bean, property, root_bean_type, path_to_bean)
    }
}
