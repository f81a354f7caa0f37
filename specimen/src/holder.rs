//! The instance synthesizer and round-trip validator for one target type.

use std::any::Any;
use std::collections::BTreeSet;
use std::fmt;
use std::rc::Rc;

use crate::description::BeanDescription;
use crate::error::SpecimenError;
use crate::model::Instance;
use crate::repository::FactoryRepository;
use crate::value::{Value, ValueKind, ValueMap};

/// Holds pending attribute writes for one target type, decides whether each
/// write must go through the creation strategy or can be applied after
/// construction, and validates that writes are observable on read-back.
///
/// One holder is owned exclusively by the verification pass for one target
/// type at a time; [`BeanHolder::reset`] clears all state for reuse.
pub struct BeanHolder {
    description: Rc<BeanDescription>,
    prefer_mutators: bool,
    // Primary values pre-seeded for every non-nullable creation-time
    // attribute, so synthesis succeeds before any explicit write.
    seeds: ValueMap,
    pending: ValueMap,
    changed: BTreeSet<String>,
    instance: Option<Instance>,
}

impl BeanHolder {
    /// Create a holder, pre-seeding required creation-time values from the
    /// repository.
    pub fn new(
        description: Rc<BeanDescription>,
        repository: &FactoryRepository,
    ) -> Result<Self, SpecimenError> {
        let owner = description.token();
        let mut seeds = ValueMap::new();
        for property in description.properties() {
            if property.ignored() || !property.not_null() {
                continue;
            }
            if !description.strategy().declares(property.name()) {
                continue;
            }
            let declared = property.type_token().ok_or_else(|| {
                SpecimenError::value_access(format!(
                    "attribute `{}` of `{}` has no resolvable type",
                    property.name(),
                    owner.name()
                ))
            })?;
            let factory = repository.get_attribute_factory(&owner, property.name(), &declared)?;
            seeds.set(property.name(), factory.create(ValueKind::Primary)?);
        }

        Ok(Self {
            description,
            prefer_mutators: repository.config().prefer_mutators,
            seeds,
            pending: ValueMap::new(),
            changed: BTreeSet::new(),
            instance: None,
        })
    }

    /// The description this holder synthesizes against.
    pub fn description(&self) -> &BeanDescription {
        &self.description
    }

    /// Record a pending write for an attribute.
    ///
    /// The name's iteration position is refreshed, the name is tracked as
    /// changed, and any cached instance is invalidated.
    pub fn set_value(&mut self, name: &str, value: Value) -> Result<(), SpecimenError> {
        if self.description.property(name).is_none() {
            return Err(SpecimenError::unknown_attribute(name));
        }
        self.pending.set(name, value);
        self.changed.insert(name.to_string());
        self.instance = None;
        Ok(())
    }

    /// Whether a pending write for this name must go through the creation
    /// strategy rather than a post-construction mutator.
    fn creation_route(&self, name: &str) -> bool {
        if !self.description.strategy().declares(name) {
            return false;
        }
        let has_mutator = self
            .description
            .property(name)
            .is_some_and(|property| property.writable());
        !(self.prefer_mutators && has_mutator)
    }

    /// Synthesize or update the instance so every pending write is applied.
    ///
    /// Re-synthesizes only when a changed name requires the creation
    /// strategy or no instance exists yet; post-construction writes are
    /// applied through their accessor-side mutators in the order the names
    /// were last set.
    pub fn build(&mut self) -> Result<&dyn Any, SpecimenError> {
        let needs_synthesis = self.instance.is_none()
            || self.changed.iter().any(|name| self.creation_route(name));

        if needs_synthesis {
            let mut values = self.seeds.clone();
            for (name, value) in self.pending.iter() {
                if self.description.strategy().declares(name) {
                    values.set(name, value.clone());
                }
            }
            self.instance = Some(self.description.strategy().synthesize(&values)?);
        }

        // After a fresh synthesis every post-construction value must be
        // (re)applied; otherwise only the ones changed since last build.
        let post: Vec<(String, Value)> = self
            .pending
            .iter()
            .filter(|(name, _)| !self.creation_route(name))
            .filter(|(name, _)| needs_synthesis || self.changed.contains(*name))
            .map(|(name, value)| (name.to_string(), value.clone()))
            .collect();

        let Some(instance) = self.instance.as_mut() else {
            return Err(SpecimenError::value_access(
                "no instance after synthesis".to_string(),
            ));
        };
        for (name, value) in post {
            let Some(property) = self.description.property(&name) else {
                return Err(SpecimenError::unknown_attribute(&name));
            };
            match property.mutator() {
                Some(mutator) => mutator.write(instance.as_mut(), value)?,
                None if self.description.strategy().declares(&name) => {}
                None => {
                    return Err(SpecimenError::value_access(format!(
                        "attribute `{}` is not writable",
                        name
                    )));
                }
            }
        }

        self.changed.clear();
        Ok(self.instance.as_deref().ok_or_else(|| {
            SpecimenError::value_access("no instance after synthesis".to_string())
        })?)
    }

    /// Read an attribute back and compare against the expected value: the
    /// last value written for the name, or for never-written names the
    /// pre-seeded required value, the omitted substitute, or null.
    ///
    /// This is the primitive higher-level verifiers use to detect values
    /// that were not persisted and writes to one attribute that silently
    /// change another.
    pub fn verify(&mut self, name: &str) -> Result<(), SpecimenError> {
        let property = self
            .description
            .property(name)
            .ok_or_else(|| SpecimenError::unknown_attribute(name))?
            .clone();
        let Some(accessor) = property.accessor() else {
            return Err(SpecimenError::value_access(format!(
                "attribute `{}` is not readable",
                name
            )));
        };

        self.build()?;
        let Some(instance) = self.instance.as_ref() else {
            return Err(SpecimenError::value_access(
                "no instance after synthesis".to_string(),
            ));
        };
        let actual = accessor.read(instance.as_ref())?;

        let expected = match self.pending.get(name) {
            Some(value) if value.is_null() => property
                .null_substitute()
                .cloned()
                .unwrap_or(Value::Null),
            Some(value) => value.clone(),
            None => self
                .seeds
                .get(name)
                .cloned()
                .or_else(|| property.omitted_substitute().cloned())
                .unwrap_or(Value::Null),
        };

        if actual != expected {
            return Err(SpecimenError::round_trip_mismatch(
                name,
                format!("{:?}", expected),
                format!("{:?}", actual),
            ));
        }
        Ok(())
    }

    /// Clear all pending state for reuse.
    pub fn reset(&mut self) {
        self.pending.clear();
        self.changed.clear();
        self.instance = None;
    }

    /// The discovered property names.
    pub fn property_names(&self) -> Vec<&str> {
        self.description.property_names()
    }

    /// Whether an attribute can be round-trip tested: readable, writable
    /// through some route, and not ignored.
    pub fn is_testable(&self, name: &str) -> bool {
        self.description.property(name).is_some_and(|property| {
            !property.ignored()
                && property.readable()
                && (property.writable() || self.description.strategy().declares(name))
        })
    }

    /// Whether an attribute participates in equality comparisons.
    pub fn is_significant(&self, name: &str) -> bool {
        self.description
            .property(name)
            .is_some_and(|property| property.significant() && !property.ignored())
    }

    /// Whether an attribute accepts the null value.
    pub fn is_nullable(&self, name: &str) -> bool {
        self.description
            .property(name)
            .is_some_and(|property| !property.not_null())
    }
}

impl fmt::Debug for BeanHolder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BeanHolder")
            .field("type", &self.description.token().name())
            .field("pending", &self.pending)
            .field("changed", &self.changed)
            .field("built", &self.instance.is_some())
            .finish()
    }
}
