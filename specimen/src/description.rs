//! Bean descriptions: the discovered property set plus the chosen creation
//! strategy for one target type.

use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

use crate::creation::{CreationStrategy, select_strategy};
use crate::error::SpecimenError;
use crate::model::TypeSpec;
use crate::property::Property;
use crate::proxy::shape_properties;
use crate::value::{TypeToken, Value};

/// A customization pass applied while a description is created.
///
/// Passes are applied in an explicit order: removals first, per-property
/// transforms second, additions last.
#[derive(Debug, Clone)]
pub enum Customization {
    /// Exclude an attribute from all testing.
    Ignore(String),
    /// Mark an attribute not-null.
    NotNull(String),
    /// Exclude an attribute from equality comparisons.
    Insignificant(String),
    /// Override an attribute's type.
    Retype(String, TypeToken),
    /// Expect a substitute whenever the null value is written.
    NullSubstitute(String, Value),
    /// Expect a substitute whenever no value was ever supplied.
    OmittedSubstitute(String, Value),
    /// Remove an attribute from the discovered set.
    Remove(String),
    /// Inject a property, replacing any discovered one of the same name.
    Add(Property),
}

impl Customization {
    /// Exclude an attribute from all testing.
    pub fn ignore(name: impl Into<String>) -> Self {
        Self::Ignore(name.into())
    }

    /// Mark an attribute not-null.
    pub fn not_null(name: impl Into<String>) -> Self {
        Self::NotNull(name.into())
    }

    /// Exclude an attribute from equality comparisons.
    pub fn insignificant(name: impl Into<String>) -> Self {
        Self::Insignificant(name.into())
    }

    /// Remove an attribute from the discovered set.
    pub fn remove(name: impl Into<String>) -> Self {
        Self::Remove(name.into())
    }
}

/// The discovered property set for a target type, keyed by unique name,
/// plus its chosen creation strategy.
///
/// Created once per target type per test run; immutable after creation
/// except for the customization passes applied while it is built.
pub struct BeanDescription {
    token: TypeToken,
    properties: BTreeMap<String, Property>,
    strategy: Rc<dyn CreationStrategy>,
}

impl BeanDescription {
    /// Discover the property set for a registered type and select its
    /// creation strategy.
    ///
    /// Properties visible only through the strategy (constructor, factory
    /// method, or builder parameters) are merged with properties visible
    /// through registered accessors and mutators; a restriction
    /// (`ignored`, `not_null`) declared on either side is honored on both.
    /// A type disagreement between the two views fails fast with
    /// [`SpecimenError::TypeConflict`].
    pub fn create(
        spec: &TypeSpec,
        customizations: &[Customization],
    ) -> Result<Self, SpecimenError> {
        let token = spec.token();
        let strategy = select_strategy(spec)?;

        let mut strategy_side: BTreeMap<String, Property> = BTreeMap::new();
        for property in strategy.declared_properties() {
            insert_merged(&mut strategy_side, property);
        }

        let mut accessor_side: BTreeMap<String, Property> = BTreeMap::new();
        for attribute in &spec.attributes {
            insert_merged(
                &mut accessor_side,
                Property::from_attribute(attribute, spec.default_not_null),
            );
        }
        if let Some(shape) = strategy.proxy_shape() {
            for property in shape_properties(&shape) {
                insert_merged(&mut accessor_side, property);
            }
        }

        for (name, accessor_property) in &accessor_side {
            if let Some(strategy_property) = strategy_side.get(name) {
                if let (Some(strategy_type), Some(accessor_type)) = (
                    strategy_property.type_token(),
                    accessor_property.type_token(),
                ) {
                    if strategy_type != accessor_type {
                        return Err(SpecimenError::TypeConflict {
                            attribute: name.clone(),
                            strategy_type: strategy_type.name().to_string(),
                            accessor_type: accessor_type.name().to_string(),
                        });
                    }
                }
            }
        }

        // The accessor view acts as the update side of the merge: it
        // carries the real read/write functions, while the OR rule keeps
        // restrictions declared on the strategy side.
        let mut properties = strategy_side;
        for (name, update) in accessor_side {
            let merged = match properties.remove(&name) {
                Some(original) => Property::merge(original, update),
                None => update,
            };
            properties.insert(name, merged);
        }

        // Customization passes: remove, then per-property transforms, then
        // additions.
        for customization in customizations {
            if let Customization::Remove(name) = customization {
                properties
                    .remove(name)
                    .ok_or_else(|| SpecimenError::illegal_override(name, token.name()))?;
            }
        }
        for customization in customizations {
            let (name, apply): (&str, fn(&mut Property, &Customization)) = match customization {
                Customization::Ignore(name) => (name.as_str(), |p, _| p.mark_ignored()),
                Customization::NotNull(name) => (name.as_str(), |p, _| p.mark_not_null()),
                Customization::Insignificant(name) => (name.as_str(), |p, _| p.mark_insignificant()),
                Customization::Retype(name, _) => (name.as_str(), |p, c| {
                    if let Customization::Retype(_, new_type) = c {
                        p.set_explicit_type(Some(*new_type));
                    }
                }),
                Customization::NullSubstitute(name, _) => (name.as_str(), |p, c| {
                    if let Customization::NullSubstitute(_, value) = c {
                        p.set_null_substitute(Some(value.clone()));
                    }
                }),
                Customization::OmittedSubstitute(name, _) => (name.as_str(), |p, c| {
                    if let Customization::OmittedSubstitute(_, value) = c {
                        p.set_omitted_substitute(Some(value.clone()));
                    }
                }),
                Customization::Remove(_) | Customization::Add(_) => continue,
            };
            let property = properties
                .get_mut(name)
                .ok_or_else(|| SpecimenError::illegal_override(name, token.name()))?;
            apply(property, customization);
        }
        for customization in customizations {
            if let Customization::Add(property) = customization {
                properties.insert(property.name().to_string(), property.clone());
            }
        }

        Ok(Self {
            token,
            properties,
            strategy,
        })
    }

    /// The described type.
    pub fn token(&self) -> TypeToken {
        self.token
    }

    /// The chosen creation strategy.
    pub fn strategy(&self) -> &Rc<dyn CreationStrategy> {
        &self.strategy
    }

    /// Look up a property by name.
    pub fn property(&self, name: &str) -> Option<&Property> {
        self.properties.get(name)
    }

    /// Iterate the discovered properties.
    pub fn properties(&self) -> impl Iterator<Item = &Property> {
        self.properties.values()
    }

    /// The discovered property names.
    pub fn property_names(&self) -> Vec<&str> {
        self.properties.keys().map(String::as_str).collect()
    }

    /// Number of discovered properties.
    pub fn len(&self) -> usize {
        self.properties.len()
    }

    /// Whether no properties were discovered.
    pub fn is_empty(&self) -> bool {
        self.properties.is_empty()
    }
}

fn insert_merged(side: &mut BTreeMap<String, Property>, property: Property) {
    let name = property.name().to_string();
    let merged = match side.remove(&name) {
        Some(original) => Property::merge(original, property),
        None => property,
    };
    side.insert(name, merged);
}

impl fmt::Debug for BeanDescription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BeanDescription")
            .field("type", &self.token.name())
            .field("strategy", &self.strategy.label())
            .field("properties", &self.property_names())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{
        Accessor, AttributeSpec, ConstructorSpec, Mutator, TypeSpec, optional_arg, required_arg,
    };

    #[derive(Debug, Clone, PartialEq)]
    struct Ticket {
        id: String,
        note: Option<String>,
        priority: u8,
    }

    fn ticket_spec() -> TypeSpec {
        TypeSpec::new::<Ticket>()
            .constructor(
                ConstructorSpec::new(|args| {
                    Ok(Ticket {
                        id: required_arg(&args, 0, "id")?,
                        note: optional_arg(&args, 1, "note")?,
                        priority: 0,
                    })
                })
                .param("id", TypeToken::of::<String>(), true)
                .param("note", TypeToken::of::<String>(), false),
            )
            .attribute(
                AttributeSpec::new("id")
                    .accessor(Accessor::of(|t: &Ticket| t.id.clone())),
            )
            .attribute(
                AttributeSpec::new("note")
                    .accessor(Accessor::nullable(|t: &Ticket| t.note.clone()))
                    .mutator(Mutator::nullable(|t: &mut Ticket, note: Option<String>| {
                        t.note = note
                    })),
            )
            .attribute(
                AttributeSpec::new("priority")
                    .accessor(Accessor::of(|t: &Ticket| t.priority))
                    .mutator(Mutator::of(|t: &mut Ticket, priority: u8| {
                        t.priority = priority
                    })),
            )
    }

    #[test]
    fn test_merges_strategy_and_accessor_views() {
        let spec = ticket_spec();
        let description = BeanDescription::create(&spec, &[]).unwrap();

        assert_eq!(description.property_names(), vec!["id", "note", "priority"]);

        // `id` is a constructor input and readable, but has no mutator
        let id = description.property("id").unwrap();
        assert!(id.readable());
        assert!(!id.writable());
        // The restriction declared on the strategy side survives the merge
        assert!(id.not_null());

        // `priority` only exists on the accessor side
        let priority = description.property("priority").unwrap();
        assert!(priority.readable());
        assert!(priority.writable());
        assert!(!description.strategy().declares("priority"));
    }

    #[test]
    fn test_not_null_reconciled_from_accessor_side() {
        let spec = ticket_spec().attribute(AttributeSpec::new("id").not_null(true));
        let description = BeanDescription::create(&spec, &[]).unwrap();
        assert!(description.property("id").unwrap().not_null());
    }

    #[test]
    fn test_type_conflict_fails_fast() {
        let spec = ticket_spec().attribute(
            // Accessor view disagrees with the constructor's `String`
            AttributeSpec::new("id").accessor(Accessor::of(|t: &Ticket| t.priority)),
        );
        let error = BeanDescription::create(&spec, &[]).unwrap_err();
        assert!(matches!(error, SpecimenError::TypeConflict { .. }));
    }

    #[test]
    fn test_customization_order_remove_transform_add() {
        let mut injected = Property::new("synthetic");
        injected.set_explicit_type(Some(TypeToken::of::<bool>()));

        let description = BeanDescription::create(
            &ticket_spec(),
            &[
                Customization::ignore("note"),
                Customization::remove("priority"),
                Customization::Add(injected),
            ],
        )
        .unwrap();

        assert!(description.property("priority").is_none());
        assert!(description.property("note").unwrap().ignored());
        assert_eq!(
            description.property("synthetic").unwrap().type_token(),
            Some(TypeToken::of::<bool>())
        );
    }

    #[test]
    fn test_unknown_customization_target_is_illegal() {
        let error =
            BeanDescription::create(&ticket_spec(), &[Customization::ignore("missing")])
                .unwrap_err();
        assert!(matches!(error, SpecimenError::IllegalOverride { .. }));

        let error =
            BeanDescription::create(&ticket_spec(), &[Customization::remove("missing")])
                .unwrap_err();
        assert!(matches!(error, SpecimenError::IllegalOverride { .. }));
    }

    #[test]
    fn test_insignificant_and_retype_customizations() {
        let description = BeanDescription::create(
            &ticket_spec(),
            &[
                Customization::insignificant("priority"),
                Customization::Retype("priority".to_string(), TypeToken::of::<u32>()),
            ],
        )
        .unwrap();

        let priority = description.property("priority").unwrap();
        assert!(!priority.significant());
        assert_eq!(priority.type_token(), Some(TypeToken::of::<u32>()));
    }
}
