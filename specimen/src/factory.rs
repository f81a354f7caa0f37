//! Value factories: three generators per target type, selected by kind.

use std::any::Any;
use std::fmt;
use std::rc::Rc;

use crate::error::SpecimenError;
use crate::value::{TypeToken, Value, ValueKind};

/// A boxed zero-argument generator for one value kind.
pub type Generator = Rc<dyn Fn() -> Result<Value, SpecimenError>>;

/// Produces candidate values for one target type.
///
/// `Primary` and `Secondary` are deterministic across calls within one
/// process and, for any well-formed factory, distinct from each other;
/// `Random` is statistically varied. A single-valued type (for example a
/// one-variant enumeration) is the documented degenerate case in which
/// primary and secondary coincide.
pub struct ValueFactory {
    token: TypeToken,
    primary: Generator,
    secondary: Generator,
    random: Generator,
}

impl ValueFactory {
    /// Build from three erased generators.
    pub fn new(token: TypeToken, primary: Generator, secondary: Generator, random: Generator) -> Self {
        Self {
            token,
            primary,
            secondary,
            random,
        }
    }

    /// Build from three typed zero-argument generators.
    ///
    /// A generator that fails must surface that failure to the caller; it
    /// is never substituted with null, so panics inside these closures
    /// propagate.
    pub fn from_fns<T>(
        primary: impl Fn() -> T + 'static,
        secondary: impl Fn() -> T + 'static,
        random: impl Fn() -> T + 'static,
    ) -> Self
    where
        T: Any + fmt::Debug + Clone + PartialEq,
    {
        Self {
            token: TypeToken::of::<T>(),
            primary: Rc::new(move || Ok(Value::of(primary()))),
            secondary: Rc::new(move || Ok(Value::of(secondary()))),
            random: Rc::new(move || Ok(Value::of(random()))),
        }
    }

    /// Build from fixed primary/secondary values and a random generator.
    pub fn from_values<T>(primary: T, secondary: T, random: impl Fn() -> T + 'static) -> Self
    where
        T: Any + fmt::Debug + Clone + PartialEq,
    {
        Self {
            token: TypeToken::of::<T>(),
            primary: Rc::new(move || Ok(Value::of(primary.clone()))),
            secondary: Rc::new(move || Ok(Value::of(secondary.clone()))),
            random: Rc::new(move || Ok(Value::of(random()))),
        }
    }

    /// Build a degenerate single-valued factory: all three kinds produce
    /// the same fixed value.
    pub fn constant<T>(value: T) -> Self
    where
        T: Any + fmt::Debug + Clone + PartialEq,
    {
        let primary = value.clone();
        let secondary = value.clone();
        Self::from_values(primary, secondary, move || value.clone())
    }

    /// Build a factory that produces the null value for every kind.
    pub fn null(token: TypeToken) -> Self {
        Self {
            token,
            primary: Rc::new(|| Ok(Value::Null)),
            secondary: Rc::new(|| Ok(Value::Null)),
            random: Rc::new(|| Ok(Value::Null)),
        }
    }

    /// The target type this factory produces values for.
    pub fn token(&self) -> TypeToken {
        self.token
    }

    /// Produce a value of the given kind.
    pub fn create(&self, kind: ValueKind) -> Result<Value, SpecimenError> {
        match kind {
            ValueKind::Primary => (self.primary)(),
            ValueKind::Secondary => (self.secondary)(),
            ValueKind::Random => (self.random)(),
        }
    }

    /// Probe the well-formedness invariant: primary and secondary are
    /// distinct. Returns `false` for a degenerate single-valued factory.
    pub fn distinct_deterministic(&self) -> Result<bool, SpecimenError> {
        Ok(self.create(ValueKind::Primary)? != self.create(ValueKind::Secondary)?)
    }
}

impl fmt::Debug for ValueFactory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ValueFactory({})", self.token.name())
    }
}
