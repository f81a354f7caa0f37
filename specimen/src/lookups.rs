//! Pluggable factory lookup strategies.
//!
//! The repository consults registered strategies in reverse registration
//! order, so a later, more specific registration shadows an earlier general
//! one. The built-ins cover sequence shapes and enumerations; hosts add
//! their own through [`FnLookup`] or a custom [`LookupStrategy`].

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use rand::Rng;

use crate::error::SpecimenError;
use crate::factory::ValueFactory;
use crate::repository::FactoryRepository;
use crate::value::{TypeToken, Value, ValueKind};

/// One stage of the factory resolution chain.
pub trait LookupStrategy {
    /// Human-readable label for diagnostics.
    fn name(&self) -> &str;

    /// Produce a factory for a type, or pass to the next stage.
    fn find(&self, token: &TypeToken, repository: &FactoryRepository) -> Option<ValueFactory>;

    /// Produce a per-attribute factory for an exact owner/name pair, or
    /// pass. The repository caches the first hit.
    fn find_attribute(
        &self,
        _owner: &TypeToken,
        _attribute: &str,
        _declared: &TypeToken,
        _repository: &FactoryRepository,
    ) -> Option<ValueFactory> {
        None
    }
}

type SequenceBuild = Rc<dyn Fn(Vec<Value>) -> Result<Value, SpecimenError>>;

struct SequenceShape {
    token: TypeToken,
    component: TypeToken,
    build: SequenceBuild,
}

/// Resolves `Vec<T>` shapes by wrapping the component type's factory.
///
/// Primary and Secondary sequences have length exactly 1, so the
/// deterministic kinds stay deterministic; Random sequences have a length
/// drawn uniformly from `[0, max_sequence_len]`.
#[derive(Default)]
pub struct SequenceLookup {
    shapes: HashMap<TypeId, SequenceShape>,
}

impl SequenceLookup {
    /// Create an empty sequence lookup.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the `Vec<T>` shape for a component type.
    pub fn register<T>(&mut self)
    where
        T: Any + fmt::Debug + Clone + PartialEq,
    {
        let token = TypeToken::of::<Vec<T>>();
        let build: SequenceBuild = Rc::new(|items: Vec<Value>| {
            let items = items
                .into_iter()
                .map(|item| item.take::<T>())
                .collect::<Result<Vec<T>, SpecimenError>>()?;
            Ok(Value::of(items))
        });
        self.shapes.insert(
            token.id(),
            SequenceShape {
                token,
                component: TypeToken::of::<T>(),
                build,
            },
        );
    }

    /// Number of registered shapes.
    pub fn len(&self) -> usize {
        self.shapes.len()
    }

    /// Whether no shapes are registered.
    pub fn is_empty(&self) -> bool {
        self.shapes.is_empty()
    }
}

impl LookupStrategy for SequenceLookup {
    fn name(&self) -> &str {
        "sequence"
    }

    fn find(&self, token: &TypeToken, repository: &FactoryRepository) -> Option<ValueFactory> {
        let shape = self.shapes.get(&token.id())?;
        // An unresolvable component passes the type to the next stage.
        let component = repository.get_factory(&shape.component).ok()?;

        let primary = {
            let component = component.clone();
            let build = shape.build.clone();
            Rc::new(move || build(vec![component.create(ValueKind::Primary)?]))
                as Rc<dyn Fn() -> Result<Value, SpecimenError>>
        };
        let secondary = {
            let component = component.clone();
            let build = shape.build.clone();
            Rc::new(move || build(vec![component.create(ValueKind::Secondary)?]))
                as Rc<dyn Fn() -> Result<Value, SpecimenError>>
        };
        let random = {
            let build = shape.build.clone();
            let rng = repository.shared_rng();
            let max_len = repository.config().max_sequence_len;
            Rc::new(move || {
                let len = rng.borrow_mut().r#gen_range(0..=max_len);
                let mut items = Vec::with_capacity(len);
                for _ in 0..len {
                    items.push(component.create(ValueKind::Random)?);
                }
                build(items)
            }) as Rc<dyn Fn() -> Result<Value, SpecimenError>>
        };

        Some(ValueFactory::new(shape.token, primary, secondary, random))
    }
}

struct EnumerationSet {
    token: TypeToken,
    variants: Vec<Value>,
}

/// Resolves registered enumerations.
///
/// Zero variants short-circuit to a null factory; a single variant yields a
/// fixed factory and records a diagnostic, since equality significance
/// cannot be distinguished for a single-valued type; two or more variants
/// use the first two as primary/secondary and a random choice otherwise.
#[derive(Default)]
pub struct EnumerationLookup {
    sets: HashMap<TypeId, EnumerationSet>,
}

impl EnumerationLookup {
    /// Create an empty enumeration lookup.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an enumeration's variant set.
    pub fn register<T>(&mut self, variants: Vec<T>)
    where
        T: Any + fmt::Debug + Clone + PartialEq,
    {
        let token = TypeToken::of::<T>();
        self.sets.insert(
            token.id(),
            EnumerationSet {
                token,
                variants: variants.into_iter().map(Value::of).collect(),
            },
        );
    }
}

impl LookupStrategy for EnumerationLookup {
    fn name(&self) -> &str {
        "enumeration"
    }

    fn find(&self, token: &TypeToken, repository: &FactoryRepository) -> Option<ValueFactory> {
        let set = self.sets.get(&token.id())?;
        match set.variants.len() {
            0 => Some(ValueFactory::null(set.token)),
            1 => {
                repository.record_diagnostic(format!(
                    "enumeration `{}` has a single variant; primary and secondary values \
                     coincide and equality significance cannot be distinguished",
                    set.token.name()
                ));
                let variant = set.variants[0].clone();
                let fixed = move || Ok(variant.clone());
                let fixed: Rc<dyn Fn() -> Result<Value, SpecimenError>> = Rc::new(fixed);
                Some(ValueFactory::new(
                    set.token,
                    fixed.clone(),
                    fixed.clone(),
                    fixed,
                ))
            }
            _ => {
                let primary = set.variants[0].clone();
                let secondary = set.variants[1].clone();
                let variants = set.variants.clone();
                let rng = repository.shared_rng();
                Some(ValueFactory::new(
                    set.token,
                    Rc::new(move || Ok(primary.clone())),
                    Rc::new(move || Ok(secondary.clone())),
                    Rc::new(move || {
                        let index = rng.borrow_mut().r#gen_range(0..variants.len());
                        Ok(variants[index].clone())
                    }),
                ))
            }
        }
    }
}

/// A closure-backed lookup strategy for one-off registrations.
pub struct FnLookup<F> {
    name: String,
    find: F,
}

impl<F> FnLookup<F>
where
    F: Fn(&TypeToken, &FactoryRepository) -> Option<ValueFactory>,
{
    /// Wrap a closure as a lookup strategy.
    pub fn new(name: impl Into<String>, find: F) -> Self {
        Self {
            name: name.into(),
            find,
        }
    }
}

impl<F> LookupStrategy for FnLookup<F>
where
    F: Fn(&TypeToken, &FactoryRepository) -> Option<ValueFactory>,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn find(&self, token: &TypeToken, repository: &FactoryRepository) -> Option<ValueFactory> {
        (self.find)(token, repository)
    }
}
