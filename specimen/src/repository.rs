//! The value-factory repository: layered, memoizing factory resolution.

use std::any::TypeId;
use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::rc::Rc;

use crate::config::EngineConfig;
use crate::description::BeanDescription;
use crate::error::SpecimenError;
use crate::factory::ValueFactory;
use crate::lookups::LookupStrategy;
use crate::model::ModelRegistry;
use crate::rng::{SharedRng, shared_rng};
use crate::value::{TypeToken, Value, ValueKind, ValueMap};

/// Resolves a [`ValueFactory`] for a type through a prioritized chain:
/// exact registration, per-attribute override, pluggable lookup strategies
/// in reverse registration order, and finally a structural fallback that
/// synthesizes instances of registered types through their own creation
/// strategy.
///
/// One repository is created per engine context and populated before
/// resolution begins; afterwards it is consulted read-mostly, and resolved
/// factories are memoized into the exact map. The memoizing caches are
/// plain maps behind `RefCell`: the engine is single-threaded, and callers
/// verifying across threads partition by target type with a context each.
pub struct FactoryRepository {
    registry: Rc<ModelRegistry>,
    config: EngineConfig,
    rng: SharedRng,
    exact: RefCell<HashMap<TypeId, Rc<ValueFactory>>>,
    overrides: RefCell<HashMap<(TypeId, String), Rc<ValueFactory>>>,
    lookups: Vec<Rc<dyn LookupStrategy>>,
    // Types currently being structurally resolved; re-entry means a cyclic
    // non-nullable dependency.
    in_progress: RefCell<HashSet<TypeId>>,
    diagnostics: RefCell<Vec<String>>,
}

impl FactoryRepository {
    /// Create a repository over a frozen registry.
    pub fn new(registry: Rc<ModelRegistry>, config: EngineConfig) -> Self {
        let rng = shared_rng(config.seed);
        Self {
            registry,
            config,
            rng,
            exact: RefCell::new(HashMap::new()),
            overrides: RefCell::new(HashMap::new()),
            lookups: Vec::new(),
            in_progress: RefCell::new(HashSet::new()),
            diagnostics: RefCell::new(Vec::new()),
        }
    }

    /// The registry this repository resolves against.
    pub fn registry(&self) -> &ModelRegistry {
        &self.registry
    }

    /// The engine configuration.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// The shared RNG handle Random-kind generators draw from.
    pub fn shared_rng(&self) -> SharedRng {
        self.rng.clone()
    }

    /// Register an exact factory for its target type; the last write for a
    /// type wins.
    pub fn add_factory(&mut self, factory: ValueFactory) {
        let token = factory.token();
        self.exact.borrow_mut().insert(token.id(), Rc::new(factory));
    }

    /// Register a per-attribute override keyed by owner type and name.
    pub fn add_override(
        &mut self,
        owner: TypeToken,
        attribute: impl Into<String>,
        factory: ValueFactory,
    ) {
        self.overrides
            .borrow_mut()
            .insert((owner.id(), attribute.into()), Rc::new(factory));
    }

    /// Register a lookup strategy; later registrations are consulted first.
    pub fn add_lookup(&mut self, lookup: Rc<dyn LookupStrategy>) {
        self.lookups.push(lookup);
    }

    /// Record a diagnostic finding.
    pub fn record_diagnostic(&self, message: impl Into<String>) {
        self.diagnostics.borrow_mut().push(message.into());
    }

    /// Diagnostics recorded during resolution so far.
    pub fn diagnostics(&self) -> Vec<String> {
        self.diagnostics.borrow().clone()
    }

    /// Resolve the factory for a type.
    ///
    /// Fails with [`SpecimenError::NoFactoryFound`] once every stage is
    /// exhausted.
    pub fn get_factory(&self, token: &TypeToken) -> Result<Rc<ValueFactory>, SpecimenError> {
        if let Some(factory) = self.exact.borrow().get(&token.id()) {
            return Ok(factory.clone());
        }

        // Most recently registered strategy wins, letting a later, more
        // specific registration shadow an earlier general one.
        for lookup in self.lookups.iter().rev() {
            if let Some(factory) = lookup.find(token, self) {
                let factory = Rc::new(factory);
                self.exact.borrow_mut().insert(token.id(), factory.clone());
                return Ok(factory);
            }
        }

        let factory = Rc::new(self.structural_factory(token)?);
        self.exact.borrow_mut().insert(token.id(), factory.clone());
        Ok(factory)
    }

    /// Resolve the factory for one attribute of an owner type.
    ///
    /// The per-attribute override map is consulted first and lazily
    /// populated from the lookup strategies; otherwise resolution falls
    /// back to the attribute's declared type.
    pub fn get_attribute_factory(
        &self,
        owner: &TypeToken,
        attribute: &str,
        declared: &TypeToken,
    ) -> Result<Rc<ValueFactory>, SpecimenError> {
        let key = (owner.id(), attribute.to_string());
        if let Some(factory) = self.overrides.borrow().get(&key) {
            return Ok(factory.clone());
        }

        for lookup in self.lookups.iter().rev() {
            if let Some(factory) = lookup.find_attribute(owner, attribute, declared, self) {
                let factory = Rc::new(factory);
                self.overrides.borrow_mut().insert(key, factory.clone());
                return Ok(factory);
            }
        }

        self.get_factory(declared)
    }

    /// The generic structural fallback: synthesize instances of a
    /// registered type through its own creation strategy, with every
    /// nullable attribute forced to null (breaking reference cycles
    /// between mutually-referencing types) and every non-nullable
    /// attribute filled with its own primary value. Each kind call
    /// re-synthesizes with all attributes set to the matching kind.
    fn structural_factory(&self, token: &TypeToken) -> Result<ValueFactory, SpecimenError> {
        if !self.in_progress.borrow_mut().insert(token.id()) {
            // Cyclic non-nullable dependency; the caller is expected to
            // break the cycle with an explicit factory for one side.
            return Err(SpecimenError::no_factory(format!(
                "{} (cyclic non-nullable dependency)",
                token.name()
            )));
        }
        let result = self.build_structural(token);
        self.in_progress.borrow_mut().remove(&token.id());
        result
    }

    fn build_structural(&self, token: &TypeToken) -> Result<ValueFactory, SpecimenError> {
        let spec = self
            .registry
            .get(token.id())
            .ok_or_else(|| SpecimenError::no_factory(token.name()))?;
        let lift = spec.lift.clone().ok_or_else(|| {
            SpecimenError::no_factory(format!(
                "{} (registered as opaque, not usable as an attribute value)",
                token.name()
            ))
        })?;

        let description = Rc::new(BeanDescription::create(spec, &[])?);

        // Resolve every attribute's factory up front; a failure here (for
        // example a cyclic non-nullable dependency) propagates instead of
        // being deferred to the first create call.
        let mut plan: Vec<(String, Option<Rc<ValueFactory>>)> = Vec::new();
        for property in description.properties() {
            if property.ignored() {
                continue;
            }
            let creation_input = description.strategy().declares(property.name());
            if !creation_input && !property.writable() {
                continue;
            }
            if property.not_null() {
                let declared = property.type_token().ok_or_else(|| {
                    SpecimenError::value_access(format!(
                        "attribute `{}` of `{}` has no resolvable type",
                        property.name(),
                        token.name()
                    ))
                })?;
                let factory = self.get_attribute_factory(token, property.name(), &declared)?;
                plan.push((property.name().to_string(), Some(factory)));
            } else {
                plan.push((property.name().to_string(), None));
            }
        }

        let strategy = description.strategy().clone();
        let generator = Rc::new(move |kind: ValueKind| -> Result<Value, SpecimenError> {
            let mut values = ValueMap::new();
            for (name, factory) in &plan {
                match factory {
                    Some(factory) => values.set(name.clone(), factory.create(kind)?),
                    None => values.set(name.clone(), Value::Null),
                }
            }
            let mut instance = strategy.synthesize(&values)?;
            for (name, value) in values.iter() {
                if strategy.declares(name) {
                    continue;
                }
                if let Some(property) = description.property(name) {
                    if let Some(mutator) = property.mutator() {
                        mutator.write(instance.as_mut(), value.clone())?;
                    }
                }
            }
            lift(instance)
        });

        // Probe one synthesis now so construction failures surface from
        // resolution, not from a later create call.
        generator(ValueKind::Primary)?;

        let primary = generator.clone();
        let secondary = generator.clone();
        let random = generator;
        Ok(ValueFactory::new(
            *token,
            Rc::new(move || primary(ValueKind::Primary)),
            Rc::new(move || secondary(ValueKind::Secondary)),
            Rc::new(move || random(ValueKind::Random)),
        ))
    }
}

impl std::fmt::Debug for FactoryRepository {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FactoryRepository")
            .field("exact", &self.exact.borrow().len())
            .field("overrides", &self.overrides.borrow().len())
            .field("lookups", &self.lookups.len())
            .finish()
    }
}
