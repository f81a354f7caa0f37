//! The host-facing registration model.
//!
//! The engine performs no reflection: the host environment registers, once
//! per type, an explicit table of accessors, mutators, construction paths,
//! and nullability hints. Everything downstream (property discovery,
//! strategy selection, value resolution) reads this table.

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use crate::creation::CreationStrategy;
use crate::error::SpecimenError;
use crate::proxy::{ProxyInstance, ProxyShape};
use crate::value::{TypeToken, Value};

/// A synthesized instance of some target type, type-erased.
pub type Instance = Box<dyn Any>;

/// The declared surface shape of a mutator.
///
/// The discovery rules tolerate mutators that return nothing, the previous
/// value, or the receiver itself (chained style); the registration adapters
/// normalize all three to a write-only call but record the declared shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutatorStyle {
    /// Returns nothing.
    Void,
    /// Returns the previously stored value.
    ReturnsPrevious,
    /// Returns the receiver for chaining.
    Chained,
}

/// A readable view of one attribute: declared type plus a read adapter.
#[derive(Clone)]
pub struct Accessor {
    token: TypeToken,
    read: Rc<dyn Fn(&dyn Any) -> Result<Value, SpecimenError>>,
}

impl Accessor {
    /// Adapter for a plain getter returning the attribute value.
    pub fn of<S, T>(read: impl Fn(&S) -> T + 'static) -> Self
    where
        S: Any,
        T: Any + fmt::Debug + Clone + PartialEq,
    {
        Self {
            token: TypeToken::of::<T>(),
            read: Rc::new(move |target: &dyn Any| {
                let target = downcast_target::<S>(target)?;
                Ok(Value::of(read(target)))
            }),
        }
    }

    /// Adapter for a getter over an optional attribute; `None` reads back
    /// as the null value.
    pub fn nullable<S, T>(read: impl Fn(&S) -> Option<T> + 'static) -> Self
    where
        S: Any,
        T: Any + fmt::Debug + Clone + PartialEq,
    {
        Self {
            token: TypeToken::of::<T>(),
            read: Rc::new(move |target: &dyn Any| {
                let target = downcast_target::<S>(target)?;
                Ok(Value::of_option(read(target)))
            }),
        }
    }

    /// Build from a raw read adapter. Used where the target is already
    /// type-erased (proxy-backed attributes).
    pub(crate) fn raw(
        token: TypeToken,
        read: Rc<dyn Fn(&dyn Any) -> Result<Value, SpecimenError>>,
    ) -> Self {
        Self { token, read }
    }

    /// The declared value type.
    pub fn token(&self) -> TypeToken {
        self.token
    }

    /// Read the attribute from an instance.
    pub fn read(&self, target: &dyn Any) -> Result<Value, SpecimenError> {
        (self.read)(target)
    }
}

impl fmt::Debug for Accessor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Accessor({})", self.token.name())
    }
}

/// A writable view of one attribute: declared type plus a write adapter.
#[derive(Clone)]
pub struct Mutator {
    token: TypeToken,
    style: MutatorStyle,
    write: Rc<dyn Fn(&mut dyn Any, Value) -> Result<(), SpecimenError>>,
}

impl Mutator {
    /// Adapter for a void setter.
    pub fn of<S, T>(write: impl Fn(&mut S, T) + 'static) -> Self
    where
        S: Any,
        T: Any + fmt::Debug + Clone + PartialEq,
    {
        Self::wrap::<S, _>(
            TypeToken::of::<T>(),
            MutatorStyle::Void,
            move |target, value| {
                write(target, value.take::<T>()?);
                Ok(())
            },
        )
    }

    /// Adapter for a setter over an optional attribute; the null value
    /// writes `None`.
    pub fn nullable<S, T>(write: impl Fn(&mut S, Option<T>) + 'static) -> Self
    where
        S: Any,
        T: Any + fmt::Debug + Clone + PartialEq,
    {
        Self::wrap::<S, _>(
            TypeToken::of::<T>(),
            MutatorStyle::Void,
            move |target, value| {
                write(target, value.take_nullable::<T>()?);
                Ok(())
            },
        )
    }

    /// Adapter for a setter that returns the previous value; the returned
    /// value is discarded.
    pub fn returning_previous<S, T>(write: impl Fn(&mut S, T) -> T + 'static) -> Self
    where
        S: Any,
        T: Any + fmt::Debug + Clone + PartialEq,
    {
        Self::wrap::<S, _>(
            TypeToken::of::<T>(),
            MutatorStyle::ReturnsPrevious,
            move |target, value| {
                let _previous = write(target, value.take::<T>()?);
                Ok(())
            },
        )
    }

    /// Adapter for a chained setter (one that would return the receiver).
    pub fn chained<S, T>(write: impl Fn(&mut S, T) + 'static) -> Self
    where
        S: Any,
        T: Any + fmt::Debug + Clone + PartialEq,
    {
        Self::wrap::<S, _>(
            TypeToken::of::<T>(),
            MutatorStyle::Chained,
            move |target, value| {
                write(target, value.take::<T>()?);
                Ok(())
            },
        )
    }

    fn wrap<S, F>(token: TypeToken, style: MutatorStyle, write: F) -> Self
    where
        S: Any,
        F: Fn(&mut S, Value) -> Result<(), SpecimenError> + 'static,
    {
        Self {
            token,
            style,
            write: Rc::new(move |target: &mut dyn Any, value: Value| {
                let target = downcast_target_mut::<S>(target)?;
                write(target, value)
            }),
        }
    }

    /// Build from a raw write adapter (proxy-backed attributes).
    pub(crate) fn raw(
        token: TypeToken,
        style: MutatorStyle,
        write: Rc<dyn Fn(&mut dyn Any, Value) -> Result<(), SpecimenError>>,
    ) -> Self {
        Self {
            token,
            style,
            write,
        }
    }

    /// The declared value type.
    pub fn token(&self) -> TypeToken {
        self.token
    }

    /// The declared surface shape.
    pub fn style(&self) -> MutatorStyle {
        self.style
    }

    /// Write a value onto an instance.
    pub fn write(&self, target: &mut dyn Any, value: Value) -> Result<(), SpecimenError> {
        (self.write)(target, value)
    }
}

impl fmt::Debug for Mutator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Mutator({}, {:?})", self.token.name(), self.style)
    }
}

fn downcast_target<S: Any>(target: &dyn Any) -> Result<&S, SpecimenError> {
    target.downcast_ref::<S>().ok_or_else(|| {
        SpecimenError::value_access(format!(
            "instance does not have the expected target type `{}`",
            std::any::type_name::<S>()
        ))
    })
}

fn downcast_target_mut<S: Any>(target: &mut dyn Any) -> Result<&mut S, SpecimenError> {
    target.downcast_mut::<S>().ok_or_else(|| {
        SpecimenError::value_access(format!(
            "instance does not have the expected target type `{}`",
            std::any::type_name::<S>()
        ))
    })
}

/// One registered attribute: optional accessor/mutator plus hints.
#[derive(Debug, Clone)]
pub struct AttributeSpec {
    pub(crate) name: String,
    pub(crate) accessor: Option<Accessor>,
    pub(crate) mutator: Option<Mutator>,
    /// Explicit nullability; `None` falls back to the type-level default.
    pub(crate) not_null: Option<bool>,
    pub(crate) ignored: bool,
    pub(crate) significant: bool,
}

impl AttributeSpec {
    /// Start an attribute registration.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            accessor: None,
            mutator: None,
            not_null: None,
            ignored: false,
            significant: true,
        }
    }

    /// Attach the accessor.
    pub fn accessor(mut self, accessor: Accessor) -> Self {
        self.accessor = Some(accessor);
        self
    }

    /// Attach the mutator.
    pub fn mutator(mut self, mutator: Mutator) -> Self {
        self.mutator = Some(mutator);
        self
    }

    /// Record an explicit nullability hint.
    pub fn not_null(mut self, not_null: bool) -> Self {
        self.not_null = Some(not_null);
        self
    }

    /// Exclude the attribute from all testing.
    pub fn ignored(mut self) -> Self {
        self.ignored = true;
        self
    }

    /// Exclude the attribute from equality comparisons.
    pub fn insignificant(mut self) -> Self {
        self.significant = false;
        self
    }
}

/// A named, typed parameter of a constructor or factory method.
#[derive(Debug, Clone)]
pub struct ParamSpec {
    pub(crate) name: String,
    pub(crate) token: TypeToken,
    pub(crate) not_null: bool,
}

impl ParamSpec {
    /// Declare a parameter.
    pub fn new(name: impl Into<String>, token: TypeToken, not_null: bool) -> Self {
        Self {
            name: name.into(),
            token,
            not_null,
        }
    }

    /// The parameter name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The declared type.
    pub fn token(&self) -> TypeToken {
        self.token
    }

    /// Whether the parameter rejects the null value.
    pub fn not_null(&self) -> bool {
        self.not_null
    }
}

/// A registered constructor: parameter list plus an invocation adapter
/// receiving the argument values in declared order.
#[derive(Clone)]
pub struct ConstructorSpec {
    pub(crate) params: Vec<ParamSpec>,
    pub(crate) invoke: Rc<dyn Fn(Vec<Value>) -> Result<Instance, SpecimenError>>,
    pub(crate) designated: bool,
    /// Whether parameter names were resolvable. Constructors without
    /// resolvable names are skipped by default-constructor selection.
    pub(crate) named_params: bool,
}

impl ConstructorSpec {
    /// Register a constructor through a typed invocation adapter.
    pub fn new<T: Any>(
        invoke: impl Fn(Vec<Value>) -> Result<T, SpecimenError> + 'static,
    ) -> Self {
        Self {
            params: Vec::new(),
            invoke: Rc::new(move |args| invoke(args).map(|v| Box::new(v) as Instance)),
            designated: false,
            named_params: true,
        }
    }

    /// Append a parameter declaration.
    pub fn param(mut self, name: impl Into<String>, token: TypeToken, not_null: bool) -> Self {
        self.params.push(ParamSpec::new(name, token, not_null));
        self
    }

    /// Mark this constructor as the designated construction path.
    pub fn designated(mut self) -> Self {
        self.designated = true;
        self
    }

    /// Record that parameter names could not be resolved.
    pub fn unnamed_params(mut self) -> Self {
        self.named_params = false;
        self
    }
}

impl fmt::Debug for ConstructorSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConstructorSpec")
            .field("params", &self.params)
            .field("designated", &self.designated)
            .field("named_params", &self.named_params)
            .finish()
    }
}

/// A registered static factory method.
#[derive(Clone)]
pub struct FactoryMethodSpec {
    pub(crate) name: String,
    pub(crate) params: Vec<ParamSpec>,
    pub(crate) invoke: Rc<dyn Fn(Vec<Value>) -> Result<Instance, SpecimenError>>,
    pub(crate) designated: bool,
}

impl FactoryMethodSpec {
    /// Register a factory method through a typed invocation adapter.
    pub fn new<T: Any>(
        name: impl Into<String>,
        invoke: impl Fn(Vec<Value>) -> Result<T, SpecimenError> + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            params: Vec::new(),
            invoke: Rc::new(move |args| invoke(args).map(|v| Box::new(v) as Instance)),
            designated: false,
        }
    }

    /// Append a parameter declaration.
    pub fn param(mut self, name: impl Into<String>, token: TypeToken, not_null: bool) -> Self {
        self.params.push(ParamSpec::new(name, token, not_null));
        self
    }

    /// Mark this factory method as the designated construction path.
    pub fn designated(mut self) -> Self {
        self.designated = true;
        self
    }
}

impl fmt::Debug for FactoryMethodSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FactoryMethodSpec")
            .field("name", &self.name)
            .field("params", &self.params)
            .field("designated", &self.designated)
            .finish()
    }
}

/// One mutator on an intermediate builder object.
#[derive(Clone)]
pub struct BuilderParam {
    pub(crate) name: String,
    pub(crate) token: TypeToken,
    pub(crate) not_null: bool,
    pub(crate) apply: Rc<dyn Fn(&mut dyn Any, Value) -> Result<(), SpecimenError>>,
}

impl BuilderParam {
    /// Register a builder mutator through a typed adapter.
    pub fn of<B, T>(name: impl Into<String>, apply: impl Fn(&mut B, T) + 'static) -> Self
    where
        B: Any,
        T: Any + fmt::Debug + Clone + PartialEq,
    {
        Self {
            name: name.into(),
            token: TypeToken::of::<T>(),
            not_null: false,
            apply: Rc::new(move |builder: &mut dyn Any, value: Value| {
                let builder = downcast_target_mut::<B>(builder)?;
                apply(builder, value.take::<T>()?);
                Ok(())
            }),
        }
    }

    /// Register a builder mutator over an optional attribute.
    pub fn nullable<B, T>(
        name: impl Into<String>,
        apply: impl Fn(&mut B, Option<T>) + 'static,
    ) -> Self
    where
        B: Any,
        T: Any + fmt::Debug + Clone + PartialEq,
    {
        Self {
            name: name.into(),
            token: TypeToken::of::<T>(),
            not_null: false,
            apply: Rc::new(move |builder: &mut dyn Any, value: Value| {
                let builder = downcast_target_mut::<B>(builder)?;
                apply(builder, value.take_nullable::<T>()?);
                Ok(())
            }),
        }
    }

    /// Record that the builder rejects the null value for this attribute.
    pub fn not_null(mut self) -> Self {
        self.not_null = true;
        self
    }
}

impl fmt::Debug for BuilderParam {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BuilderParam({}: {})", self.name, self.token.name())
    }
}

/// A registered builder pair: create the mutable intermediate, apply
/// values through its own mutators, finalize into the target type.
#[derive(Clone)]
pub struct BuilderSpec {
    pub(crate) create: Rc<dyn Fn() -> Result<Instance, SpecimenError>>,
    pub(crate) params: Vec<BuilderParam>,
    pub(crate) finish: Rc<dyn Fn(Instance) -> Result<Instance, SpecimenError>>,
    /// Whether the builder was explicitly designated, as opposed to
    /// detected from the `create`/`build` naming convention.
    pub(crate) designated: bool,
}

impl BuilderSpec {
    /// Register a builder through typed create/finish adapters.
    pub fn new<B, T>(
        create: impl Fn() -> B + 'static,
        finish: impl Fn(B) -> Result<T, SpecimenError> + 'static,
    ) -> Self
    where
        B: Any,
        T: Any,
    {
        Self {
            create: Rc::new(move || Ok(Box::new(create()) as Instance)),
            params: Vec::new(),
            finish: Rc::new(move |builder: Instance| {
                let builder = builder.downcast::<B>().map_err(|_| {
                    SpecimenError::value_access(format!(
                        "builder instance does not have type `{}`",
                        std::any::type_name::<B>()
                    ))
                })?;
                finish(*builder).map(|v| Box::new(v) as Instance)
            }),
            designated: false,
        }
    }

    /// Append a builder mutator.
    pub fn param(mut self, param: BuilderParam) -> Self {
        self.params.push(param);
        self
    }

    /// Mark the builder as explicitly designated.
    pub fn designated(mut self) -> Self {
        self.designated = true;
        self
    }
}

impl fmt::Debug for BuilderSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BuilderSpec")
            .field("params", &self.params)
            .field("designated", &self.designated)
            .finish()
    }
}

/// Whether a registered type is concrete or interface-shaped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeKind {
    /// A concrete type with real construction paths.
    Struct,
    /// An abstract capability set, synthesized through a dynamic proxy.
    Interface,
}

/// Everything the host registered for one target type.
pub struct TypeSpec {
    pub(crate) token: TypeToken,
    pub(crate) kind: TypeKind,
    pub(crate) default_not_null: bool,
    pub(crate) attributes: Vec<AttributeSpec>,
    pub(crate) constructors: Vec<ConstructorSpec>,
    pub(crate) factory_methods: Vec<FactoryMethodSpec>,
    pub(crate) builder: Option<BuilderSpec>,
    pub(crate) proxy: Option<Rc<ProxyShape>>,
    pub(crate) explicit: Option<Rc<dyn CreationStrategy>>,
    /// Lifts a synthesized instance into a `Value`, when the target type
    /// supports it. Required for the structural factory fallback.
    pub(crate) lift: Option<Rc<dyn Fn(Instance) -> Result<Value, SpecimenError>>>,
}

impl TypeSpec {
    /// Register a concrete type whose instances can themselves be used as
    /// attribute values.
    pub fn new<T>() -> Self
    where
        T: Any + fmt::Debug + Clone + PartialEq,
    {
        Self {
            token: TypeToken::of::<T>(),
            kind: TypeKind::Struct,
            default_not_null: false,
            attributes: Vec::new(),
            constructors: Vec::new(),
            factory_methods: Vec::new(),
            builder: None,
            proxy: None,
            explicit: None,
            lift: Some(Rc::new(|instance: Instance| {
                let value = instance.downcast::<T>().map_err(|_| {
                    SpecimenError::value_access(format!(
                        "synthesized instance does not have type `{}`",
                        std::any::type_name::<T>()
                    ))
                })?;
                Ok(Value::of(*value))
            })),
        }
    }

    /// Register a concrete type that only ever acts as a synthesis target,
    /// never as an attribute value (no `Clone`/`PartialEq` available). The
    /// structural factory fallback is unavailable for such types.
    pub fn opaque<T: Any>() -> Self {
        Self {
            token: TypeToken::of::<T>(),
            kind: TypeKind::Struct,
            default_not_null: false,
            attributes: Vec::new(),
            constructors: Vec::new(),
            factory_methods: Vec::new(),
            builder: None,
            proxy: None,
            explicit: None,
            lift: None,
        }
    }

    /// Register an interface-shaped type. Instances are map-backed proxy
    /// objects.
    pub fn interface<T: Any>() -> Self {
        Self {
            token: TypeToken::of::<T>(),
            kind: TypeKind::Interface,
            default_not_null: false,
            attributes: Vec::new(),
            constructors: Vec::new(),
            factory_methods: Vec::new(),
            builder: None,
            proxy: None,
            explicit: None,
            lift: Some(Rc::new(|instance: Instance| {
                let proxy = instance.downcast::<ProxyInstance>().map_err(|_| {
                    SpecimenError::value_access(
                        "synthesized instance is not a proxy instance".to_string(),
                    )
                })?;
                Ok(Value::of(*proxy))
            })),
        }
    }

    /// The registered type.
    pub fn token(&self) -> TypeToken {
        self.token
    }

    /// Apply a type-level default-not-null hint to attributes without an
    /// explicit nullability marking.
    pub fn default_not_null(mut self, default_not_null: bool) -> Self {
        self.default_not_null = default_not_null;
        self
    }

    /// Register an attribute.
    pub fn attribute(mut self, attribute: AttributeSpec) -> Self {
        self.attributes.push(attribute);
        self
    }

    /// Register a constructor.
    pub fn constructor(mut self, constructor: ConstructorSpec) -> Self {
        self.constructors.push(constructor);
        self
    }

    /// Register a factory method.
    pub fn factory_method(mut self, factory_method: FactoryMethodSpec) -> Self {
        self.factory_methods.push(factory_method);
        self
    }

    /// Register the builder pair.
    pub fn builder(mut self, builder: BuilderSpec) -> Self {
        self.builder = Some(builder);
        self
    }

    /// Register the proxy shape for an interface-shaped type. The shape
    /// takes on the registered type's identity.
    pub fn proxy(mut self, shape: ProxyShape) -> Self {
        self.proxy = Some(Rc::new(shape.bound_to(self.token)));
        self
    }

    /// Supply a ready-made creation strategy, bypassing selection.
    pub fn explicit_strategy(mut self, strategy: Rc<dyn CreationStrategy>) -> Self {
        self.explicit = Some(strategy);
        self
    }
}

impl fmt::Debug for TypeSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeSpec")
            .field("token", &self.token)
            .field("kind", &self.kind)
            .field("attributes", &self.attributes.len())
            .field("constructors", &self.constructors.len())
            .field("factory_methods", &self.factory_methods.len())
            .field("builder", &self.builder.is_some())
            .field("proxy", &self.proxy.is_some())
            .finish()
    }
}

/// Registry of all type registrations for one engine context.
///
/// Populated before resolution begins; read-only afterwards.
#[derive(Default)]
pub struct ModelRegistry {
    specs: HashMap<TypeId, TypeSpec>,
}

impl ModelRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a type; a later registration for the same type wins.
    pub fn register(&mut self, spec: TypeSpec) {
        self.specs.insert(spec.token.id(), spec);
    }

    /// Look up the registration for a concrete type.
    pub fn spec_of<T: Any>(&self) -> Option<&TypeSpec> {
        self.specs.get(&TypeId::of::<T>())
    }

    /// Look up the registration for a type id.
    pub fn get(&self, id: TypeId) -> Option<&TypeSpec> {
        self.specs.get(&id)
    }

    /// Number of registered types.
    pub fn len(&self) -> usize {
        self.specs.len()
    }

    /// Whether the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.specs.is_empty()
    }
}

impl fmt::Debug for ModelRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ModelRegistry({} types)", self.specs.len())
    }
}

/// Clone the argument at `index` as a `T`, for invocation adapters.
pub fn required_arg<T>(args: &[Value], index: usize, name: &str) -> Result<T, SpecimenError>
where
    T: Any + fmt::Debug + Clone + PartialEq,
{
    match args.get(index) {
        Some(value) => value.clone().take::<T>().map_err(|_| {
            SpecimenError::value_access(format!(
                "argument `{}` is not a `{}`",
                name,
                std::any::type_name::<T>()
            ))
        }),
        None => Err(SpecimenError::value_access(format!(
            "missing argument `{}` at position {}",
            name, index
        ))),
    }
}

/// Clone the argument at `index` as an `Option<T>`, mapping null to `None`.
pub fn optional_arg<T>(args: &[Value], index: usize, name: &str) -> Result<Option<T>, SpecimenError>
where
    T: Any + fmt::Debug + Clone + PartialEq,
{
    match args.get(index) {
        Some(value) => value.clone().take_nullable::<T>().map_err(|_| {
            SpecimenError::value_access(format!(
                "argument `{}` is not a `{}`",
                name,
                std::any::type_name::<T>()
            ))
        }),
        None => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    struct Point {
        x: i32,
        y: i32,
    }

    #[test]
    fn test_accessor_reads_through_erasure() {
        let accessor = Accessor::of(|p: &Point| p.x);
        let point = Point { x: 3, y: 4 };
        let target: &dyn Any = &point;

        assert_eq!(accessor.read(target).unwrap(), Value::of(3i32));
        assert_eq!(accessor.token(), TypeToken::of::<i32>());
    }

    #[test]
    fn test_accessor_rejects_wrong_target() {
        let accessor = Accessor::of(|p: &Point| p.x);
        let not_a_point = "nope".to_string();
        let target: &dyn Any = &not_a_point;

        assert!(matches!(
            accessor.read(target),
            Err(SpecimenError::ValueAccess { .. })
        ));
    }

    #[test]
    fn test_mutator_writes_through_erasure() {
        let mutator = Mutator::of(|p: &mut Point, x: i32| p.x = x);
        let mut point = Point { x: 0, y: 0 };
        let target: &mut dyn Any = &mut point;

        mutator.write(target, Value::of(9i32)).unwrap();
        assert_eq!(point.x, 9);
    }

    #[test]
    fn test_mutator_styles_recorded() {
        let void = Mutator::of(|p: &mut Point, x: i32| p.x = x);
        let previous =
            Mutator::returning_previous(|p: &mut Point, x: i32| std::mem::replace(&mut p.x, x));
        let chained = Mutator::chained(|p: &mut Point, x: i32| p.x = x);

        assert_eq!(void.style(), MutatorStyle::Void);
        assert_eq!(previous.style(), MutatorStyle::ReturnsPrevious);
        assert_eq!(chained.style(), MutatorStyle::Chained);
    }

    #[test]
    fn test_nullable_mutator_accepts_null() {
        #[derive(Debug, Clone, PartialEq)]
        struct Tagged {
            tag: Option<String>,
        }

        let mutator = Mutator::nullable(|t: &mut Tagged, tag: Option<String>| t.tag = tag);
        let mut tagged = Tagged {
            tag: Some("old".to_string()),
        };
        mutator
            .write(&mut tagged as &mut dyn Any, Value::Null)
            .unwrap();
        assert_eq!(tagged.tag, None);
    }

    #[test]
    fn test_non_nullable_mutator_rejects_null() {
        let mutator = Mutator::of(|p: &mut Point, x: i32| p.x = x);
        let mut point = Point { x: 0, y: 0 };
        assert!(
            mutator
                .write(&mut point as &mut dyn Any, Value::Null)
                .is_err()
        );
    }

    #[test]
    fn test_registry_registration() {
        let mut registry = ModelRegistry::new();
        assert!(registry.is_empty());

        registry.register(
            TypeSpec::new::<Point>()
                .attribute(AttributeSpec::new("x").accessor(Accessor::of(|p: &Point| p.x))),
        );

        assert_eq!(registry.len(), 1);
        let spec = registry.spec_of::<Point>().unwrap();
        assert_eq!(spec.token(), TypeToken::of::<Point>());
        assert_eq!(spec.attributes.len(), 1);
        assert!(registry.spec_of::<String>().is_none());
    }

    #[test]
    fn test_last_registration_wins() {
        let mut registry = ModelRegistry::new();
        registry.register(TypeSpec::new::<Point>());
        registry.register(
            TypeSpec::new::<Point>()
                .attribute(AttributeSpec::new("x").accessor(Accessor::of(|p: &Point| p.x))),
        );

        assert_eq!(registry.len(), 1);
        assert_eq!(registry.spec_of::<Point>().unwrap().attributes.len(), 1);
    }

    #[test]
    fn test_arg_helpers() {
        let args = vec![Value::of("id-1".to_string()), Value::Null];

        let id: String = required_arg(&args, 0, "id").unwrap();
        assert_eq!(id, "id-1");

        let tag: Option<String> = optional_arg(&args, 1, "tag").unwrap();
        assert_eq!(tag, None);

        assert!(required_arg::<String>(&args, 5, "missing").is_err());
        assert!(required_arg::<i32>(&args, 0, "id").is_err());
    }
}
