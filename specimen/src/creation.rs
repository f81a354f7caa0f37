//! Creation strategies: the mechanisms used to synthesize an instance of a
//! target type from attribute values.

use std::fmt;
use std::rc::Rc;

use crate::error::SpecimenError;
use crate::model::{
    BuilderParam, BuilderSpec, ConstructorSpec, FactoryMethodSpec, Instance, TypeKind, TypeSpec,
};
use crate::property::Property;
use crate::proxy::{ProxyShape, ProxyStrategy};
use crate::value::{Value, ValueMap};

/// A construction mechanism for one target type.
///
/// Implementations expose the input properties they declare and synthesize
/// an instance from a value map. Selection happens once per target type,
/// in a fixed priority order (see [`select_strategy`]).
pub trait CreationStrategy {
    /// Human-readable label for diagnostics.
    fn label(&self) -> &'static str;

    /// The input properties this mechanism declares (constructor or
    /// factory-method parameters, builder mutators, proxy attributes).
    fn declared_properties(&self) -> Vec<Property>;

    /// Whether the mechanism declares an input with this name.
    fn declares(&self, attribute: &str) -> bool;

    /// Synthesize an instance from the supplied values.
    fn synthesize(&self, values: &ValueMap) -> Result<Instance, SpecimenError>;

    /// The proxy shape backing this strategy, when it is a dynamic proxy.
    fn proxy_shape(&self) -> Option<Rc<ProxyShape>> {
        None
    }
}

impl fmt::Debug for dyn CreationStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CreationStrategy({})", self.label())
    }
}

/// Synthesis through a designated or default constructor, or a static
/// factory method; the two differ only in origin.
pub struct ConstructorStrategy {
    type_name: &'static str,
    label: &'static str,
    params: Vec<crate::model::ParamSpec>,
    invoke: Rc<dyn Fn(Vec<Value>) -> Result<Instance, SpecimenError>>,
}

impl ConstructorStrategy {
    /// Build from a registered constructor.
    pub fn from_constructor(spec: &TypeSpec, constructor: &ConstructorSpec) -> Self {
        Self {
            type_name: spec.token().name(),
            label: "constructor",
            params: constructor.params.clone(),
            invoke: constructor.invoke.clone(),
        }
    }

    /// Build from a registered factory method.
    pub fn from_factory_method(spec: &TypeSpec, factory_method: &FactoryMethodSpec) -> Self {
        Self {
            type_name: spec.token().name(),
            label: "factory method",
            params: factory_method.params.clone(),
            invoke: factory_method.invoke.clone(),
        }
    }
}

impl CreationStrategy for ConstructorStrategy {
    fn label(&self) -> &'static str {
        self.label
    }

    fn declared_properties(&self) -> Vec<Property> {
        self.params.iter().map(Property::from_param).collect()
    }

    fn declares(&self, attribute: &str) -> bool {
        self.params.iter().any(|param| param.name() == attribute)
    }

    fn synthesize(&self, values: &ValueMap) -> Result<Instance, SpecimenError> {
        let mut args = Vec::with_capacity(self.params.len());
        for param in &self.params {
            match values.get(param.name()) {
                Some(value) => {
                    if value.is_null() && param.not_null() {
                        return Err(SpecimenError::construction_failed(
                            self.type_name,
                            format!("null supplied for required input `{}`", param.name()),
                        ));
                    }
                    args.push(value.clone());
                }
                None if param.not_null() => {
                    return Err(SpecimenError::construction_failed(
                        self.type_name,
                        format!("missing required input `{}`", param.name()),
                    ));
                }
                None => args.push(Value::Null),
            }
        }
        (self.invoke)(args).map_err(|error| {
            SpecimenError::construction_failed(self.type_name, error.to_string())
        })
    }
}

/// Synthesis through a builder pair: create the mutable intermediate,
/// apply every supplied value through the builder's own mutators, finalize.
pub struct BuilderStrategy {
    type_name: &'static str,
    create: Rc<dyn Fn() -> Result<Instance, SpecimenError>>,
    params: Vec<BuilderParam>,
    finish: Rc<dyn Fn(Instance) -> Result<Instance, SpecimenError>>,
}

impl BuilderStrategy {
    /// Build from a registered builder pair.
    pub fn from_builder(spec: &TypeSpec, builder: &BuilderSpec) -> Self {
        Self {
            type_name: spec.token().name(),
            create: builder.create.clone(),
            params: builder.params.clone(),
            finish: builder.finish.clone(),
        }
    }
}

impl CreationStrategy for BuilderStrategy {
    fn label(&self) -> &'static str {
        "builder"
    }

    fn declared_properties(&self) -> Vec<Property> {
        self.params
            .iter()
            .map(|param| {
                let mut property = Property::new(param.name.clone());
                property.set_explicit_type(Some(param.token));
                if param.not_null {
                    property.mark_not_null();
                }
                property
            })
            .collect()
    }

    fn declares(&self, attribute: &str) -> bool {
        self.params.iter().any(|param| param.name == attribute)
    }

    fn synthesize(&self, values: &ValueMap) -> Result<Instance, SpecimenError> {
        let mut builder = (self.create)().map_err(|error| {
            SpecimenError::construction_failed(self.type_name, error.to_string())
        })?;
        // The value map already collapses repeated writes to the last one,
        // so applying in iteration order gives last-write-wins through the
        // intermediate object. Values with no matching builder mutator are
        // skipped; they belong to post-construction application.
        for (name, value) in values.iter() {
            let Some(param) = self.params.iter().find(|param| param.name == name) else {
                continue;
            };
            if value.is_null() && param.not_null {
                return Err(SpecimenError::construction_failed(
                    self.type_name,
                    format!("null supplied for required input `{}`", name),
                ));
            }
            (param.apply)(builder.as_mut(), value.clone()).map_err(|error| {
                SpecimenError::construction_failed(self.type_name, error.to_string())
            })?;
        }
        (self.finish)(builder).map_err(|error| {
            SpecimenError::construction_failed(self.type_name, error.to_string())
        })
    }
}

/// Select the creation strategy for a registered type.
///
/// First match wins: explicit strategy, designated factory method,
/// designated constructor, designated builder, convention-detected default
/// builder, default constructor (the one with the fewest fully-named
/// parameters), and finally a dynamic proxy for interface-shaped types
/// without constructors.
pub fn select_strategy(spec: &TypeSpec) -> Result<Rc<dyn CreationStrategy>, SpecimenError> {
    if let Some(explicit) = &spec.explicit {
        return Ok(explicit.clone());
    }

    if let Some(factory_method) = spec.factory_methods.iter().find(|m| m.designated) {
        return Ok(Rc::new(ConstructorStrategy::from_factory_method(
            spec,
            factory_method,
        )));
    }

    if let Some(constructor) = spec.constructors.iter().find(|c| c.designated) {
        return Ok(Rc::new(ConstructorStrategy::from_constructor(
            spec,
            constructor,
        )));
    }

    // A designated builder outranks a convention-detected one, and both
    // outrank the default constructor; with one builder slot per type the
    // two builder steps collapse into this check.
    if let Some(builder) = &spec.builder {
        return Ok(Rc::new(BuilderStrategy::from_builder(spec, builder)));
    }

    if let Some(constructor) = spec
        .constructors
        .iter()
        .filter(|c| c.named_params)
        .min_by_key(|c| c.params.len())
    {
        return Ok(Rc::new(ConstructorStrategy::from_constructor(
            spec,
            constructor,
        )));
    }

    if spec.kind == TypeKind::Interface && spec.constructors.is_empty() {
        if let Some(shape) = &spec.proxy {
            return Ok(Rc::new(ProxyStrategy::new(shape.clone())));
        }
    }

    Err(SpecimenError::no_strategy(spec.token().name()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{required_arg, ConstructorSpec, FactoryMethodSpec, TypeSpec};
    use crate::value::{TypeToken, ValueMap};

    #[derive(Debug, Clone, PartialEq)]
    struct Account {
        id: String,
        note: Option<String>,
    }

    fn account_spec() -> TypeSpec {
        TypeSpec::new::<Account>().constructor(
            ConstructorSpec::new(|args| {
                Ok(Account {
                    id: required_arg(&args, 0, "id")?,
                    note: crate::model::optional_arg(&args, 1, "note")?,
                })
            })
            .param("id", TypeToken::of::<String>(), true)
            .param("note", TypeToken::of::<String>(), false),
        )
    }

    #[test]
    fn test_constructor_synthesis() {
        let spec = account_spec();
        let strategy = select_strategy(&spec).unwrap();
        assert_eq!(strategy.label(), "constructor");
        assert!(strategy.declares("id"));
        assert!(!strategy.declares("balance"));

        let mut values = ValueMap::new();
        values.set("id", Value::of("a-1".to_string()));

        let instance = strategy.synthesize(&values).unwrap();
        let account = instance.downcast_ref::<Account>().unwrap();
        assert_eq!(account.id, "a-1");
        assert_eq!(account.note, None);
    }

    #[test]
    fn test_missing_required_input_fails_construction() {
        let spec = account_spec();
        let strategy = select_strategy(&spec).unwrap();

        let values = ValueMap::new();
        let error = strategy
            .synthesize(&values)
            .err()
            .expect("synthesis must fail without `id`");
        assert!(matches!(
            error,
            SpecimenError::ConstructionFailed { .. }
        ));
        assert!(error.to_string().contains("`id`"));
    }

    #[test]
    fn test_null_for_required_input_fails_construction() {
        let spec = account_spec();
        let strategy = select_strategy(&spec).unwrap();

        let mut values = ValueMap::new();
        values.set("id", Value::Null);
        assert!(strategy.synthesize(&values).is_err());
    }

    #[test]
    fn test_designated_factory_method_outranks_constructor() {
        let spec = account_spec().factory_method(
            FactoryMethodSpec::new("open", |args| {
                Ok(Account {
                    id: required_arg(&args, 0, "id")?,
                    note: Some("opened".to_string()),
                })
            })
            .param("id", TypeToken::of::<String>(), true)
            .designated(),
        );

        let strategy = select_strategy(&spec).unwrap();
        assert_eq!(strategy.label(), "factory method");
    }

    #[test]
    fn test_default_constructor_picks_fewest_named_params() {
        let spec = TypeSpec::new::<Account>()
            .constructor(
                ConstructorSpec::new(|args| {
                    Ok(Account {
                        id: required_arg(&args, 0, "id")?,
                        note: crate::model::optional_arg(&args, 1, "note")?,
                    })
                })
                .param("id", TypeToken::of::<String>(), true)
                .param("note", TypeToken::of::<String>(), false),
            )
            .constructor(
                ConstructorSpec::new(|args| {
                    Ok(Account {
                        id: required_arg(&args, 0, "id")?,
                        note: None,
                    })
                })
                .param("id", TypeToken::of::<String>(), true),
            )
            .constructor(
                // Unresolvable parameter names: never selected by default
                ConstructorSpec::new(|_args| {
                    Ok(Account {
                        id: String::new(),
                        note: None,
                    })
                })
                .unnamed_params(),
            );

        let strategy = select_strategy(&spec).unwrap();
        assert_eq!(strategy.declared_properties().len(), 1);
    }

    #[test]
    fn test_no_viable_strategy() {
        let spec = TypeSpec::new::<Account>();
        assert!(matches!(
            select_strategy(&spec),
            Err(SpecimenError::NoViableCreationStrategy { .. })
        ));
    }

    #[test]
    fn test_builder_synthesis_last_write_wins() {
        #[derive(Debug, Clone, PartialEq, Default)]
        struct DraftAccount {
            id: String,
        }

        let spec = TypeSpec::new::<Account>().builder(
            crate::model::BuilderSpec::new(DraftAccount::default, |draft: DraftAccount| {
                Ok(Account {
                    id: draft.id,
                    note: None,
                })
            })
            .param(BuilderParam::of("id", |draft: &mut DraftAccount, id: String| {
                draft.id = id;
            })),
        );

        let strategy = select_strategy(&spec).unwrap();
        assert_eq!(strategy.label(), "builder");

        let mut values = ValueMap::new();
        values.set("id", Value::of("first".to_string()));
        values.set("id", Value::of("second".to_string()));

        let instance = strategy.synthesize(&values).unwrap();
        let account = instance.downcast_ref::<Account>().unwrap();
        assert_eq!(account.id, "second");
    }
}
