//! Group and group sequence resolution
//!
//! Expands a requested group set into an ordered [`ValidationOrder`]. Sequence
//! expansions and group ancestries are cached per resolver; both are pure
//! functions of the group definitions, so concurrent duplicate computation is
//! harmless and the first stored value wins.
//!
//! Copyright (c) 2025 Stipulate Team
//! Licensed under the Apache-2.0 license

use super::{GroupId, GroupSlot, ValidationOrder};
use crate::error::{Error, Result};
use crate::metadata::{BeanMetaData, DeclarationReader, DefaultGroupSequence};
use crate::value::Bean;
use dashmap::DashMap;
use std::collections::BTreeSet;
use std::sync::Arc;

/// Computes the default group sequence of a bean at validation time
///
/// Called with the bean instance, or `None` when no live instance exists
/// (value-only validation). Returning `Ok(None)` or an error is a
/// configuration error.
pub trait DefaultGroupSequenceProvider: Send + Sync {
    fn group_sequence(&self, bean: Option<&dyn Bean>) -> anyhow::Result<Option<Vec<GroupId>>>;
}

impl<F> DefaultGroupSequenceProvider for F
where
    F: Fn(Option<&dyn Bean>) -> anyhow::Result<Option<Vec<GroupId>>> + Send + Sync,
{
    fn group_sequence(&self, bean: Option<&dyn Bean>) -> anyhow::Result<Option<Vec<GroupId>>> {
        self(bean)
    }
}

/// Resolves requested groups into ordered group slots
pub struct GroupResolver {
    reader: Arc<dyn DeclarationReader>,
    sequences: DashMap<GroupId, Arc<Vec<GroupId>>>,
    closures: DashMap<GroupId, Arc<BTreeSet<GroupId>>>,
}

impl GroupResolver {
    pub fn new(reader: Arc<dyn DeclarationReader>) -> Self {
        Self {
            reader,
            sequences: DashMap::new(),
            closures: DashMap::new(),
        }
    }

    /// Resolve `requested` for a bean of the given metadata
    ///
    /// An empty request means the Default group. Default is replaced by the
    /// bean's redefined default sequence when it has one.
    pub fn resolve(
        &self,
        requested: &[GroupId],
        bean: &BeanMetaData,
        instance: Option<&dyn Bean>,
    ) -> Result<ValidationOrder> {
        let default_group = [GroupId::default_group()];
        let requested = if requested.is_empty() {
            &default_group[..]
        } else {
            requested
        };

        let mut order = ValidationOrder::new();
        for group in requested {
            if group.is_default() {
                match self.default_sequence(bean, instance)? {
                    Some(sequence) => order.insert_sequence(group.clone(), sequence),
                    None => order.insert_group(group.clone()),
                }
            } else if let Some(sequence) = self.expand_sequence(group)? {
                order.insert_sequence(group.clone(), sequence.as_ref().clone());
            } else {
                order.insert_group(group.clone());
            }
        }

        log::trace!(
            "Resolved groups {:?} for '{}' into {} slot(s)",
            requested,
            bean.bean_type(),
            order.len()
        );
        Ok(order)
    }

    /// The redefined default sequence of a bean, `None` when it uses the plain Default group
    pub fn default_sequence(
        &self,
        bean: &BeanMetaData,
        instance: Option<&dyn Bean>,
    ) -> Result<Option<Vec<GroupId>>> {
        match bean.default_sequence() {
            DefaultGroupSequence::Implicit => Ok(None),
            DefaultGroupSequence::Static(groups) => {
                let expanded = self.expand(&GroupId::default_group(), groups, &mut Vec::new())?;
                check_expanded_default(bean.bean_type(), &expanded).map_err(Error::group_definition)?;
                Ok(Some(expanded))
            }
            DefaultGroupSequence::Dynamic(provider) => {
                let groups = self.invoke_provider(bean, provider.as_ref(), instance)?;
                let expanded = self.expand(&GroupId::default_group(), &groups, &mut Vec::new())?;
                check_expanded_default(bean.bean_type(), &expanded).map_err(|message| {
                    Error::GroupSequenceProvider {
                        type_name: bean.bean_type().to_string(),
                        message,
                        source: None,
                    }
                })?;
                Ok(Some(expanded))
            }
        }
    }

    fn invoke_provider(
        &self,
        bean: &BeanMetaData,
        provider: &dyn DefaultGroupSequenceProvider,
        instance: Option<&dyn Bean>,
    ) -> Result<Vec<GroupId>> {
        let type_name = bean.bean_type();
        let groups = provider
            .group_sequence(instance)
            .map_err(|e| Error::GroupSequenceProvider {
                type_name: type_name.to_string(),
                message: "provider returned an error".to_string(),
                source: Some(e),
            })?
            .ok_or_else(|| Error::GroupSequenceProvider {
                type_name: type_name.to_string(),
                message: "provider returned no sequence".to_string(),
                source: None,
            })?;

        if groups.is_empty() {
            log::warn!(
                "Default group sequence provider of '{}' returned an empty sequence, using the Default group",
                type_name
            );
            return Ok(vec![GroupId::of_type(type_name)]);
        }

        check_redefined_sequence(type_name, &groups).map_err(|message| Error::GroupSequenceProvider {
            type_name: type_name.to_string(),
            message,
            source: None,
        })?;
        Ok(groups)
    }

    /// Expanded members of `group` when it is declared as a sequence
    pub fn expand_sequence(&self, group: &GroupId) -> Result<Option<Arc<Vec<GroupId>>>> {
        if let Some(cached) = self.sequences.get(group) {
            return Ok(Some(cached.clone()));
        }

        let members = match self.reader.group_definition(group).and_then(|def| def.sequence) {
            Some(members) => members,
            None => return Ok(None),
        };

        let expanded = Arc::new(self.expand(group, &members, &mut Vec::new())?);
        let stored = self
            .sequences
            .entry(group.clone())
            .or_insert(expanded)
            .clone();
        Ok(Some(stored))
    }

    fn expand(
        &self,
        name: &GroupId,
        members: &[GroupId],
        visiting: &mut Vec<GroupId>,
    ) -> Result<Vec<GroupId>> {
        if visiting.contains(name) {
            return Err(Error::group_definition(format!(
                "cyclic dependency in the definition of group sequence '{}'",
                name
            )));
        }
        visiting.push(name.clone());

        let mut resolved = Vec::new();
        for member in members {
            let nested = self
                .reader
                .group_definition(member)
                .and_then(|def| def.sequence);
            match nested {
                Some(nested) => {
                    let expanded = self.expand(member, &nested, visiting)?;
                    add_groups(name, &mut resolved, expanded)?;
                }
                None => add_groups(name, &mut resolved, vec![member.clone()])?,
            }
        }

        visiting.pop();
        Ok(resolved)
    }

    /// Drop cached sequence expansions and group ancestries
    pub fn clear(&self) {
        self.sequences.clear();
        self.closures.clear();
    }

    /// `group` plus every group it transitively extends
    pub fn group_closure(&self, group: &GroupId) -> Arc<BTreeSet<GroupId>> {
        if let Some(cached) = self.closures.get(group) {
            return cached.clone();
        }

        let mut closure = BTreeSet::new();
        let mut pending = vec![group.clone()];
        while let Some(next) = pending.pop() {
            if !closure.insert(next.clone()) {
                continue;
            }
            if let Some(definition) = self.reader.group_definition(&next) {
                pending.extend(definition.extends);
            }
        }

        self.closures
            .entry(group.clone())
            .or_insert(Arc::new(closure))
            .clone()
    }
}

/// Appending a group already present at a non-trailing position makes the sequence unexpandable
fn add_groups(sequence: &GroupId, resolved: &mut Vec<GroupId>, groups: Vec<GroupId>) -> Result<()> {
    for group in groups {
        if let Some(position) = resolved.iter().position(|g| *g == group) {
            if position < resolved.len() - 1 {
                return Err(Error::group_definition(format!(
                    "unable to expand group sequence '{}': group '{}' would be evaluated twice",
                    sequence, group
                )));
            }
        }
        resolved.push(group);
    }
    Ok(())
}

/// A redefined default sequence must name the bean's own group and must not name Default
pub(crate) fn check_redefined_sequence(
    type_name: &str,
    groups: &[GroupId],
) -> std::result::Result<(), String> {
    if groups.iter().any(GroupId::is_default) {
        return Err(format!(
            "the default group sequence of '{}' must not contain the Default group",
            type_name
        ));
    }
    if !groups.contains(&GroupId::of_type(type_name)) {
        return Err(format!(
            "the default group sequence of '{}' must contain the group '{}'",
            type_name, type_name
        ));
    }
    Ok(())
}

/// Default reached through a nested sequence would redefine Default in terms of itself
fn check_expanded_default(type_name: &str, expanded: &[GroupId]) -> std::result::Result<(), String> {
    if expanded.iter().any(GroupId::is_default) {
        return Err(format!(
            "the default group sequence of '{}' reaches the Default group through a nested sequence",
            type_name
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::group::GroupDefinition;
    use crate::metadata::{Declarations, TypeDeclaration};

    fn resolver(declarations: Declarations) -> GroupResolver {
        GroupResolver::new(Arc::new(declarations))
    }

    fn bean(declaration: TypeDeclaration) -> BeanMetaData {
        BeanMetaData::implicit_for_tests(declaration)
    }

    #[test]
    fn test_empty_request_is_default() {
        let resolver = resolver(Declarations::new());
        let order = resolver
            .resolve(&[], &bean(TypeDeclaration::new("Order")), None)
            .unwrap();
        assert_eq!(order.slots(), &[GroupSlot::Group(GroupId::default_group())]);
    }

    #[test]
    fn test_sequence_group_is_inlined() {
        let declarations = Declarations::new()
            .with_group(GroupDefinition::sequence("Complete", ["Basic", "Inner"]))
            .with_group(GroupDefinition::sequence("Inner", ["Deep", "Final"]));
        let resolver = resolver(declarations);

        let order = resolver
            .resolve(&[GroupId::new("Complete")], &bean(TypeDeclaration::new("Order")), None)
            .unwrap();
        assert_eq!(
            order.slots(),
            &[GroupSlot::Sequence {
                name: GroupId::new("Complete"),
                groups: vec![
                    GroupId::new("Basic"),
                    GroupId::new("Deep"),
                    GroupId::new("Final")
                ],
            }]
        );
    }

    #[test]
    fn test_cyclic_sequence_is_rejected() {
        let declarations = Declarations::new()
            .with_group(GroupDefinition::sequence("A", ["B"]))
            .with_group(GroupDefinition::sequence("B", ["A"]));
        let resolver = resolver(declarations);

        let err = resolver
            .resolve(&[GroupId::new("A")], &bean(TypeDeclaration::new("Order")), None)
            .unwrap_err();
        assert!(matches!(err, Error::GroupDefinition { .. }));
        assert!(err.to_string().contains("cyclic"));
    }

    #[test]
    fn test_unexpandable_sequence_is_rejected() {
        let declarations = Declarations::new()
            .with_group(GroupDefinition::sequence("Outer", ["A", "Inner"]))
            .with_group(GroupDefinition::sequence("Inner", ["A", "B"]));
        let resolver = resolver(declarations);

        let err = resolver.expand_sequence(&GroupId::new("Outer")).unwrap_err();
        assert!(err.to_string().contains("unable to expand"));
    }

    #[test]
    fn test_static_default_sequence_substitutes_default() {
        let declaration = TypeDeclaration::new("Order").with_default_sequence(["Basic", "Order"]);
        let resolver = resolver(Declarations::new());

        let order = resolver.resolve(&[], &bean(declaration), None).unwrap();
        assert_eq!(
            order.slots(),
            &[GroupSlot::Sequence {
                name: GroupId::default_group(),
                groups: vec![GroupId::new("Basic"), GroupId::new("Order")],
            }]
        );
    }

    struct FixedProvider(Option<Vec<GroupId>>);

    impl DefaultGroupSequenceProvider for FixedProvider {
        fn group_sequence(&self, _bean: Option<&dyn Bean>) -> anyhow::Result<Option<Vec<GroupId>>> {
            Ok(self.0.clone())
        }
    }

    struct FailingProvider;

    impl DefaultGroupSequenceProvider for FailingProvider {
        fn group_sequence(&self, _bean: Option<&dyn Bean>) -> anyhow::Result<Option<Vec<GroupId>>> {
            anyhow::bail!("provider exploded")
        }
    }

    #[test]
    fn test_dynamic_provider_misbehaviour_is_configuration_error() {
        let resolver = resolver(Declarations::new());

        let none = bean(TypeDeclaration::new("Order").with_sequence_provider(FixedProvider(None)));
        let err = resolver.resolve(&[], &none, None).unwrap_err();
        assert!(matches!(err, Error::GroupSequenceProvider { .. }));

        let failing = bean(TypeDeclaration::new("Order").with_sequence_provider(FailingProvider));
        let err = resolver.resolve(&[], &failing, None).unwrap_err();
        assert!(err.is_configuration_error());

        let with_default = bean(
            TypeDeclaration::new("Order")
                .with_sequence_provider(FixedProvider(Some(vec![GroupId::default_group()]))),
        );
        assert!(resolver.resolve(&[], &with_default, None).is_err());
    }

    #[test]
    fn test_dynamic_provider_empty_means_default() {
        let resolver = resolver(Declarations::new());
        let empty = bean(TypeDeclaration::new("Order").with_sequence_provider(FixedProvider(Some(vec![]))));

        let order = resolver.resolve(&[], &empty, None).unwrap();
        assert_eq!(order.slots()[0].groups(), &[GroupId::new("Order")]);
    }

    #[test]
    fn test_default_reached_through_nested_sequence_is_rejected() {
        let declarations = Declarations::new().with_group(GroupDefinition::sequence("Wrapper", ["Default"]));
        let resolver = resolver(declarations);

        let redefined = bean(TypeDeclaration::new("Order").with_default_sequence(["Order", "Wrapper"]));
        let err = resolver.resolve(&[], &redefined, None).unwrap_err();
        assert!(matches!(err, Error::GroupDefinition { .. }));
        assert!(err.to_string().contains("nested sequence"));

        let provided = bean(TypeDeclaration::new("Order").with_sequence_provider(FixedProvider(Some(vec![
            GroupId::new("Order"),
            GroupId::new("Wrapper"),
        ]))));
        let err = resolver.resolve(&[], &provided, None).unwrap_err();
        assert!(matches!(err, Error::GroupSequenceProvider { .. }));
    }

    #[test]
    fn test_clear_drops_cached_expansions() {
        let resolver = resolver(Declarations::new().with_group(GroupDefinition::sequence("Checks", ["A", "B"])));
        assert!(resolver.expand_sequence(&GroupId::new("Checks")).unwrap().is_some());
        resolver.group_closure(&GroupId::new("A"));
        assert_eq!(resolver.sequences.len(), 1);

        resolver.clear();
        assert!(resolver.sequences.is_empty());
        assert!(resolver.closures.is_empty());
    }

    #[test]
    fn test_group_closure_follows_extends() {
        let declarations = Declarations::new()
            .with_group(GroupDefinition::new("Extended").extending("Basic"))
            .with_group(GroupDefinition::new("Basic").extending("Root"));
        let resolver = resolver(declarations);

        let closure = resolver.group_closure(&GroupId::new("Extended"));
        assert!(closure.contains(&GroupId::new("Basic")));
        assert!(closure.contains(&GroupId::new("Root")));
        assert!(!closure.contains(&GroupId::default_group()));
    }
}
