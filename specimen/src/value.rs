//! Type-erased attribute values and the value-kind discriminator.

use std::any::{Any, TypeId};
use std::fmt;

use crate::error::SpecimenError;

/// The three classes of candidate value a factory must produce.
///
/// `Primary` and `Secondary` are fixed, mutually distinct values used for
/// deterministic round-trip and last-write-wins checks; `Random` is an
/// unconstrained value drawn from the engine's RNG.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueKind {
    /// The fixed first value for a type.
    Primary,
    /// A fixed value distinct from `Primary`.
    Secondary,
    /// A statistically varied value.
    Random,
}

impl ValueKind {
    /// Human-readable label used in diagnostics.
    pub fn as_str(&self) -> &'static str {
        match self {
            ValueKind::Primary => "primary",
            ValueKind::Secondary => "secondary",
            ValueKind::Random => "random",
        }
    }
}

/// A runtime type handle: a `TypeId` paired with the type's name.
///
/// Equality and hashing consider only the `TypeId`; the name is carried for
/// error messages and diagnostics.
#[derive(Clone, Copy)]
pub struct TypeToken {
    id: TypeId,
    name: &'static str,
}

impl TypeToken {
    /// Create the token for a concrete type.
    pub fn of<T: Any>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: std::any::type_name::<T>(),
        }
    }

    /// The underlying `TypeId`.
    pub fn id(&self) -> TypeId {
        self.id
    }

    /// The type's name as reported by the compiler.
    pub fn name(&self) -> &'static str {
        self.name
    }
}

impl PartialEq for TypeToken {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for TypeToken {}

impl std::hash::Hash for TypeToken {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Debug for TypeToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TypeToken({})", self.name)
    }
}

/// Object-safe capability bundle for values stored in the engine.
///
/// Implemented automatically for every `'static` type that is `Debug`,
/// `Clone`, and `PartialEq`; attribute values flow through the engine behind
/// this trait so that properties of unrelated types share one code path.
pub trait PropValue: Any + fmt::Debug {
    /// Clone the value behind the trait object.
    fn clone_box(&self) -> Box<dyn PropValue>;

    /// Compare against another erased value; `false` when the types differ.
    fn eq_box(&self, other: &dyn PropValue) -> bool;

    /// Borrow as `Any` for downcasting.
    fn as_any(&self) -> &dyn Any;

    /// Convert the box into a `Box<dyn Any>` for by-value downcasting.
    fn into_any(self: Box<Self>) -> Box<dyn Any>;
}

impl<T> PropValue for T
where
    T: Any + fmt::Debug + Clone + PartialEq,
{
    fn clone_box(&self) -> Box<dyn PropValue> {
        Box::new(self.clone())
    }

    fn eq_box(&self, other: &dyn PropValue) -> bool {
        other
            .as_any()
            .downcast_ref::<T>()
            .is_some_and(|other| other == self)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn into_any(self: Box<Self>) -> Box<dyn Any> {
        self
    }
}

/// An attribute value: either the engine's null or a boxed concrete value.
///
/// Rust has no null; the engine models the source domain's nullable
/// attributes with an explicit `Null` variant, and hosts map an optional
/// attribute's `None` onto it.
pub enum Value {
    /// The absent value for a nullable attribute.
    Null,
    /// A concrete value of some registered type.
    Present(Box<dyn PropValue>),
}

impl Value {
    /// Wrap a concrete value.
    pub fn of<T>(value: T) -> Self
    where
        T: Any + fmt::Debug + Clone + PartialEq,
    {
        Value::Present(Box::new(value))
    }

    /// Wrap an optional value, mapping `None` to `Null`.
    pub fn of_option<T>(value: Option<T>) -> Self
    where
        T: Any + fmt::Debug + Clone + PartialEq,
    {
        match value {
            Some(value) => Value::of(value),
            None => Value::Null,
        }
    }

    /// Whether this is the null value.
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Borrow the contained value as `T`, if present and of that type.
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        match self {
            Value::Null => None,
            Value::Present(value) => value.as_any().downcast_ref::<T>(),
        }
    }

    /// Take the contained value as an owned `T`.
    ///
    /// Fails on `Null` and on a type mismatch; both are representation
    /// errors surfaced to the caller rather than silently substituted.
    pub fn take<T>(self) -> Result<T, SpecimenError>
    where
        T: Any + fmt::Debug + Clone + PartialEq,
    {
        match self {
            Value::Null => Err(SpecimenError::value_access(format!(
                "null value where `{}` was expected",
                std::any::type_name::<T>()
            ))),
            Value::Present(value) => {
                let debug = format!("{:?}", value);
                value.into_any().downcast::<T>().map(|v| *v).map_err(|_| {
                    SpecimenError::value_access(format!(
                        "value {} does not have type `{}`",
                        debug,
                        std::any::type_name::<T>()
                    ))
                })
            }
        }
    }

    /// Take the contained value as `Option<T>`, mapping `Null` to `None`.
    pub fn take_nullable<T>(self) -> Result<Option<T>, SpecimenError>
    where
        T: Any + fmt::Debug + Clone + PartialEq,
    {
        match self {
            Value::Null => Ok(None),
            present => present.take().map(Some),
        }
    }
}

impl Clone for Value {
    fn clone(&self) -> Self {
        match self {
            Value::Null => Value::Null,
            Value::Present(value) => Value::Present(value.clone_box()),
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Present(a), Value::Present(b)) => a.eq_box(b.as_ref()),
            _ => false,
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Present(value) => value.fmt(f),
        }
    }
}

/// An insertion-ordered name-to-value map.
///
/// `set` removes any existing entry before appending, so the iteration order
/// is the order in which names were *last* written; last write per name wins.
#[derive(Clone, Default)]
pub struct ValueMap {
    entries: Vec<(String, Value)>,
}

impl ValueMap {
    /// Create an empty map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a value, refreshing the name's iteration position.
    pub fn set(&mut self, name: impl Into<String>, value: Value) {
        let name = name.into();
        self.entries.retain(|(existing, _)| *existing != name);
        self.entries.push((name, value));
    }

    /// Look up the value last written for a name.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.entries
            .iter()
            .find(|(existing, _)| existing == name)
            .map(|(_, value)| value)
    }

    /// Whether a value has been written for a name.
    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Remove a name, returning its value if it was present.
    pub fn remove(&mut self, name: &str) -> Option<Value> {
        let index = self
            .entries
            .iter()
            .position(|(existing, _)| existing == name)?;
        Some(self.entries.remove(index).1)
    }

    /// Iterate entries in last-written order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries
            .iter()
            .map(|(name, value)| (name.as_str(), value))
    }

    /// Number of distinct names.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the map is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Clear all entries.
    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

impl fmt::Debug for ValueMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map()
            .entries(self.entries.iter().map(|(k, v)| (k, v)))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_value_equality_and_clone() {
        let a = Value::of(42i32);
        let b = Value::of(42i32);
        let c = Value::of(43i32);

        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(a.clone(), b);

        // Values of different types are never equal
        let s = Value::of("42".to_string());
        assert_ne!(a, s);

        // Null only equals null
        assert_eq!(Value::Null, Value::Null);
        assert_ne!(Value::Null, a);
    }

    #[test]
    fn test_value_downcast_and_take() {
        let value = Value::of("hello".to_string());
        assert_eq!(value.downcast_ref::<String>().unwrap(), "hello");
        assert!(value.downcast_ref::<i32>().is_none());

        let owned: String = value.take().unwrap();
        assert_eq!(owned, "hello");

        let null = Value::Null;
        assert!(null.take::<String>().is_err());
        assert_eq!(Value::Null.take_nullable::<String>().unwrap(), None);
        assert_eq!(
            Value::of(7u8).take_nullable::<u8>().unwrap(),
            Some(7u8)
        );
    }

    #[test]
    fn test_value_of_option() {
        assert!(Value::of_option::<i32>(None).is_null());
        assert_eq!(Value::of_option(Some(5i32)), Value::of(5i32));
    }

    #[test]
    fn test_type_token_identity() {
        let a = TypeToken::of::<String>();
        let b = TypeToken::of::<String>();
        let c = TypeToken::of::<i32>();

        assert_eq!(a, b);
        assert_ne!(a, c);
        assert!(a.name().contains("String"));
    }

    #[test]
    fn test_value_map_last_write_order() {
        let mut map = ValueMap::new();
        map.set("a", Value::of(1i32));
        map.set("b", Value::of(2i32));
        map.set("a", Value::of(3i32));

        // Last write wins and refreshes iteration position
        assert_eq!(map.get("a"), Some(&Value::of(3i32)));
        let order: Vec<&str> = map.iter().map(|(name, _)| name).collect();
        assert_eq!(order, vec!["b", "a"]);
        assert_eq!(map.len(), 2);
    }

    #[test]
    fn test_value_map_remove() {
        let mut map = ValueMap::new();
        map.set("a", Value::of(1i32));
        assert_eq!(map.remove("a"), Some(Value::of(1i32)));
        assert_eq!(map.remove("a"), None);
        assert!(map.is_empty());
    }

    #[test]
    fn test_value_kind_labels() {
        assert_eq!(ValueKind::Primary.as_str(), "primary");
        assert_eq!(ValueKind::Secondary.as_str(), "secondary");
        assert_eq!(ValueKind::Random.as_str(), "random");
    }
}
