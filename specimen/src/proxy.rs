//! Dynamic proxies: map-backed instances for interface-shaped types.
//!
//! There is no runtime interface implementation to generate; instead a
//! small dispatch object carries the attribute map, and its dispatch table
//! (the shape) is built once per interface shape rather than per instance.

use std::any::Any;
use std::collections::BTreeMap;
use std::collections::hash_map::DefaultHasher;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::rc::Rc;

use crate::creation::CreationStrategy;
use crate::error::SpecimenError;
use crate::model::{Accessor, Instance, Mutator, MutatorStyle};
use crate::property::Property;
use crate::value::{TypeToken, Value, ValueMap};

/// One attribute of an interface shape.
#[derive(Clone)]
pub struct ProxyAttribute {
    pub(crate) name: String,
    pub(crate) token: TypeToken,
    pub(crate) not_null: bool,
    pub(crate) style: MutatorStyle,
    pub(crate) default: Option<Value>,
}

impl ProxyAttribute {
    /// Declare an attribute.
    pub fn new(name: impl Into<String>, token: TypeToken) -> Self {
        Self {
            name: name.into(),
            token,
            not_null: false,
            style: MutatorStyle::Void,
            default: None,
        }
    }

    /// Reject the null value for this attribute.
    pub fn not_null(mut self) -> Self {
        self.not_null = true;
        self
    }

    /// Record the declared mutator surface shape.
    pub fn style(mut self, style: MutatorStyle) -> Self {
        self.style = style;
        self
    }

    /// Register a non-null default substituted when the attribute is
    /// omitted at synthesis time.
    pub fn default_value(mut self, value: Value) -> Self {
        self.default = Some(value);
        self
    }
}

impl fmt::Debug for ProxyAttribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ProxyAttribute({}: {})", self.name, self.token.name())
    }
}

/// A default (non-abstract) capability method, delegated to its registered
/// implementation bound to the proxy instance.
#[derive(Clone)]
pub struct DerivedMethod {
    name: String,
    call: Rc<dyn Fn(&ProxyInstance) -> Result<Value, SpecimenError>>,
}

impl fmt::Debug for DerivedMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DerivedMethod({})", self.name)
    }
}

/// The dispatch table for one interface shape, built once and shared by
/// every proxy instance of that shape.
#[derive(Clone)]
pub struct ProxyShape {
    token: TypeToken,
    attributes: Vec<ProxyAttribute>,
    derived: Vec<DerivedMethod>,
}

impl ProxyShape {
    /// Start an unbound shape; registering it on a `TypeSpec` binds it to
    /// that type's identity.
    pub fn new() -> Self {
        Self {
            token: TypeToken::of::<ProxyInstance>(),
            attributes: Vec::new(),
            derived: Vec::new(),
        }
    }

    /// Declare an attribute.
    pub fn attribute(mut self, attribute: ProxyAttribute) -> Self {
        self.attributes.push(attribute);
        self
    }

    /// Register a default capability method.
    pub fn derived(
        mut self,
        name: impl Into<String>,
        call: impl Fn(&ProxyInstance) -> Result<Value, SpecimenError> + 'static,
    ) -> Self {
        self.derived.push(DerivedMethod {
            name: name.into(),
            call: Rc::new(call),
        });
        self
    }

    /// Bind the shape to the registered interface type's identity.
    pub(crate) fn bound_to(mut self, token: TypeToken) -> Self {
        self.token = token;
        self
    }

    /// The interface type this shape describes.
    pub fn token(&self) -> TypeToken {
        self.token
    }

    /// The declared attributes.
    pub fn attributes(&self) -> &[ProxyAttribute] {
        &self.attributes
    }

    fn find(&self, name: &str) -> Option<&ProxyAttribute> {
        self.attributes.iter().find(|attr| attr.name == name)
    }
}

impl Default for ProxyShape {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ProxyShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "ProxyShape({}, {} attributes)",
            self.token.name(),
            self.attributes.len()
        )
    }
}

/// What a proxy write returns, per the declared mutator surface shape.
#[derive(Debug, Clone, PartialEq)]
pub enum SetOutcome {
    /// The mutator is void.
    Done,
    /// The mutator returns the previously stored value.
    Previous(Value),
    /// The mutator returns the receiver for chaining.
    Chained,
}

/// A synthesized instance of an interface-shaped type.
///
/// Reads look up the backing map; writes validate against the attribute's
/// nullability and honor the declared mutator shape. Equality, hashing, and
/// the debug rendering are structural over the backing map, so two proxies
/// built from equal maps are equal and hash identically, and a proxy is
/// never equal to an instance of an unrelated shape or type.
#[derive(Clone)]
pub struct ProxyInstance {
    shape: Rc<ProxyShape>,
    values: BTreeMap<String, Value>,
}

impl ProxyInstance {
    pub(crate) fn new(shape: Rc<ProxyShape>, values: BTreeMap<String, Value>) -> Self {
        Self { shape, values }
    }

    /// The shape this instance dispatches through.
    pub fn shape(&self) -> &ProxyShape {
        &self.shape
    }

    /// Read an attribute from the backing map.
    pub fn get(&self, name: &str) -> Result<Value, SpecimenError> {
        if self.shape.find(name).is_none() {
            return Err(SpecimenError::unknown_attribute(name));
        }
        Ok(self.values.get(name).cloned().unwrap_or(Value::Null))
    }

    /// Write an attribute into the backing map.
    pub fn set(&mut self, name: &str, value: Value) -> Result<SetOutcome, SpecimenError> {
        let attribute = self
            .shape
            .find(name)
            .ok_or_else(|| SpecimenError::unknown_attribute(name))?;
        if attribute.not_null && value.is_null() {
            return Err(SpecimenError::null_disallowed(name));
        }
        let style = attribute.style;
        let previous = self.values.insert(name.to_string(), value);
        Ok(match style {
            MutatorStyle::Void => SetOutcome::Done,
            MutatorStyle::ReturnsPrevious => {
                SetOutcome::Previous(previous.unwrap_or(Value::Null))
            }
            MutatorStyle::Chained => SetOutcome::Chained,
        })
    }

    /// Invoke a default capability method bound to this instance.
    pub fn call(&self, method: &str) -> Result<Value, SpecimenError> {
        let derived = self
            .shape
            .derived
            .iter()
            .find(|d| d.name == method)
            .ok_or_else(|| {
                SpecimenError::value_access(format!(
                    "`{}` declares no default method `{}`",
                    self.shape.token.name(),
                    method
                ))
            })?;
        (derived.call)(self)
    }

    /// The structural hash of the backing map.
    pub fn structural_hash(&self) -> u64 {
        let mut hasher = DefaultHasher::new();
        self.hash(&mut hasher);
        hasher.finish()
    }
}

impl PartialEq for ProxyInstance {
    fn eq(&self, other: &Self) -> bool {
        self.shape.token == other.shape.token && self.values == other.values
    }
}

impl Hash for ProxyInstance {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.shape.token.id().hash(state);
        for (name, value) in &self.values {
            name.hash(state);
            // Values are not themselves hashable behind the erasure; the
            // debug rendering is the structural stand-in, and it is stable
            // for equal values.
            format!("{:?}", value).hash(state);
        }
    }
}

impl fmt::Debug for ProxyInstance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ", self.shape.token.name())?;
        f.debug_map()
            .entries(self.values.iter().map(|(k, v)| (k, v)))
            .finish()
    }
}

/// Synthesis through a dynamic proxy: validates not-null attributes,
/// substitutes registered defaults for omitted ones, and returns the
/// map-backed instance.
pub struct ProxyStrategy {
    shape: Rc<ProxyShape>,
}

impl ProxyStrategy {
    /// Build over a bound shape.
    pub fn new(shape: Rc<ProxyShape>) -> Self {
        Self { shape }
    }
}

impl CreationStrategy for ProxyStrategy {
    fn label(&self) -> &'static str {
        "dynamic proxy"
    }

    fn declared_properties(&self) -> Vec<Property> {
        self.shape
            .attributes
            .iter()
            .map(|attribute| {
                let mut property = Property::new(attribute.name.clone());
                property.set_explicit_type(Some(attribute.token));
                if attribute.not_null {
                    property.mark_not_null();
                }
                property
            })
            .collect()
    }

    fn declares(&self, attribute: &str) -> bool {
        self.shape.find(attribute).is_some()
    }

    fn synthesize(&self, values: &ValueMap) -> Result<Instance, SpecimenError> {
        let type_name = self.shape.token.name();
        let mut backing = BTreeMap::new();
        for attribute in &self.shape.attributes {
            let value = match values.get(&attribute.name) {
                Some(value) if value.is_null() && attribute.not_null => {
                    return Err(SpecimenError::null_disallowed(&attribute.name));
                }
                Some(value) => value.clone(),
                None => match &attribute.default {
                    Some(default) => default.clone(),
                    None if attribute.not_null => {
                        return Err(SpecimenError::construction_failed(
                            type_name,
                            format!(
                                "missing required attribute `{}` and no default is registered",
                                attribute.name
                            ),
                        ));
                    }
                    None => Value::Null,
                },
            };
            backing.insert(attribute.name.clone(), value);
        }
        Ok(Box::new(ProxyInstance::new(self.shape.clone(), backing)))
    }

    fn proxy_shape(&self) -> Option<Rc<ProxyShape>> {
        Some(self.shape.clone())
    }
}

/// Accessor/mutator-side properties for a proxy-backed type: each declared
/// attribute reads and writes through the backing map.
pub fn shape_properties(shape: &Rc<ProxyShape>) -> Vec<Property> {
    shape
        .attributes
        .iter()
        .map(|attribute| {
            let read_name = attribute.name.clone();
            let accessor = Accessor::raw(
                attribute.token,
                Rc::new(move |target: &dyn Any| {
                    let proxy = downcast_proxy(target)?;
                    proxy.get(&read_name)
                }),
            );

            let write_name = attribute.name.clone();
            let mutator = Mutator::raw(
                attribute.token,
                attribute.style,
                Rc::new(move |target: &mut dyn Any, value: Value| {
                    let proxy = downcast_proxy_mut(target)?;
                    proxy.set(&write_name, value).map(|_| ())
                }),
            );

            let mut property = Property::new(attribute.name.clone());
            property.set_explicit_type(Some(attribute.token));
            property.set_accessor(Some(accessor));
            property.set_mutator(Some(mutator));
            if attribute.not_null {
                property.mark_not_null();
            }
            property
        })
        .collect()
}

fn downcast_proxy(target: &dyn Any) -> Result<&ProxyInstance, SpecimenError> {
    target.downcast_ref::<ProxyInstance>().ok_or_else(|| {
        SpecimenError::value_access("instance is not a proxy instance".to_string())
    })
}

fn downcast_proxy_mut(target: &mut dyn Any) -> Result<&mut ProxyInstance, SpecimenError> {
    target.downcast_mut::<ProxyInstance>().ok_or_else(|| {
        SpecimenError::value_access("instance is not a proxy instance".to_string())
    })
}
