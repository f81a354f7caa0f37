//! Property descriptors: one named, typed, independently testable facet of a
//! target type.

use std::cell::OnceCell;
use std::fmt;

use crate::model::{Accessor, AttributeSpec, Mutator, ParamSpec};
use crate::value::{TypeToken, Value};

/// Policy applied when a value is null or was never supplied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotPolicy {
    /// Keep the observed value as-is.
    Preserve,
    /// Expect a substitute value instead.
    Substitute,
}

/// Descriptor for one named attribute.
///
/// A property with neither accessor nor mutator carries no functional
/// contract; it exists only as a placeholder while partial declarations for
/// the same name are merged.
pub struct Property {
    name: String,
    explicit_type: Option<TypeToken>,
    accessor: Option<Accessor>,
    mutator: Option<Mutator>,
    not_null: bool,
    ignored: bool,
    significant: bool,
    null_substitute: Option<Value>,
    omitted_substitute: Option<Value>,
    // Memoized result of type inference; reset whenever the accessor or
    // mutator is replaced.
    inferred: OnceCell<Option<TypeToken>>,
}

impl Property {
    /// Create a placeholder property for a name.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            explicit_type: None,
            accessor: None,
            mutator: None,
            not_null: false,
            ignored: false,
            significant: true,
            null_substitute: None,
            omitted_substitute: None,
            inferred: OnceCell::new(),
        }
    }

    /// Build a property from a creation-strategy input parameter: writable
    /// through construction, not readable by itself.
    pub fn from_param(param: &ParamSpec) -> Self {
        let mut property = Property::new(param.name());
        property.explicit_type = Some(param.token());
        property.not_null = param.not_null();
        property
    }

    /// Build a property from a registered attribute.
    pub fn from_attribute(attribute: &AttributeSpec, default_not_null: bool) -> Self {
        let mut property = Property::new(attribute.name.clone());
        property.accessor = attribute.accessor.clone();
        property.mutator = attribute.mutator.clone();
        property.not_null = attribute.not_null.unwrap_or(default_not_null);
        property.ignored = attribute.ignored;
        property.significant = attribute.significant;
        property
    }

    /// The attribute name, the property's unique key.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The property's type: explicit if set, else inferred from the
    /// mutator's parameter type, else from the accessor's return type.
    /// The inference result is memoized.
    pub fn type_token(&self) -> Option<TypeToken> {
        if let Some(token) = self.explicit_type {
            return Some(token);
        }
        *self.inferred.get_or_init(|| {
            self.mutator
                .as_ref()
                .map(|m| m.token())
                .or_else(|| self.accessor.as_ref().map(|a| a.token()))
        })
    }

    /// The accessor, if the attribute is readable.
    pub fn accessor(&self) -> Option<&Accessor> {
        self.accessor.as_ref()
    }

    /// The mutator, if the attribute is writable after construction.
    pub fn mutator(&self) -> Option<&Mutator> {
        self.mutator.as_ref()
    }

    /// Whether an accessor is present.
    pub fn readable(&self) -> bool {
        self.accessor.is_some()
    }

    /// Whether a mutator is present.
    pub fn writable(&self) -> bool {
        self.mutator.is_some()
    }

    /// Whether the attribute rejects the null value.
    pub fn not_null(&self) -> bool {
        self.not_null
    }

    /// Whether the attribute is excluded from all testing.
    pub fn ignored(&self) -> bool {
        self.ignored
    }

    /// Whether the attribute participates in equality comparisons.
    pub fn significant(&self) -> bool {
        self.significant
    }

    /// The null-value policy.
    pub fn null_policy(&self) -> SlotPolicy {
        if self.null_substitute.is_some() {
            SlotPolicy::Substitute
        } else {
            SlotPolicy::Preserve
        }
    }

    /// The substitute expected when the null value is written, if any.
    pub fn null_substitute(&self) -> Option<&Value> {
        self.null_substitute.as_ref()
    }

    /// The omitted-value policy.
    pub fn omitted_policy(&self) -> SlotPolicy {
        if self.omitted_substitute.is_some() {
            SlotPolicy::Substitute
        } else {
            SlotPolicy::Preserve
        }
    }

    /// The substitute expected when no value was ever supplied, if any.
    pub fn omitted_substitute(&self) -> Option<&Value> {
        self.omitted_substitute.as_ref()
    }

    /// Replace the accessor, invalidating the inference memo.
    pub fn set_accessor(&mut self, accessor: Option<Accessor>) {
        self.accessor = accessor;
        self.inferred = OnceCell::new();
    }

    /// Replace the mutator, invalidating the inference memo.
    pub fn set_mutator(&mut self, mutator: Option<Mutator>) {
        self.mutator = mutator;
        self.inferred = OnceCell::new();
    }

    /// Set the explicit type, shadowing inference.
    pub fn set_explicit_type(&mut self, token: Option<TypeToken>) {
        self.explicit_type = token;
    }

    /// Mark the attribute not-null.
    pub fn mark_not_null(&mut self) {
        self.not_null = true;
    }

    /// Exclude the attribute from all testing.
    pub fn mark_ignored(&mut self) {
        self.ignored = true;
    }

    /// Exclude the attribute from equality comparisons.
    pub fn mark_insignificant(&mut self) {
        self.significant = false;
    }

    /// Expect a substitute value whenever the null value is written.
    pub fn set_null_substitute(&mut self, value: Option<Value>) {
        self.null_substitute = value;
    }

    /// Expect a substitute value whenever no value was ever supplied.
    pub fn set_omitted_substitute(&mut self, value: Option<Value>) {
        self.omitted_substitute = value;
    }

    /// Combine two partial declarations for the same name; `update` takes
    /// precedence.
    ///
    /// Accessor and mutator are replaced wholesale, as a pair, when
    /// `update` supplies either; `ignored` and `not_null` are OR-combined
    /// so the most restrictive declaration wins; every other field prefers
    /// `update`, falling back to `original`.
    pub fn merge(original: Property, update: Property) -> Property {
        debug_assert_eq!(original.name, update.name);

        let (accessor, mutator) = if update.accessor.is_some() || update.mutator.is_some() {
            (update.accessor, update.mutator)
        } else {
            (original.accessor, original.mutator)
        };

        Property {
            name: update.name,
            explicit_type: update.explicit_type.or(original.explicit_type),
            accessor,
            mutator,
            not_null: original.not_null || update.not_null,
            ignored: original.ignored || update.ignored,
            significant: update.significant,
            null_substitute: update.null_substitute.or(original.null_substitute),
            omitted_substitute: update.omitted_substitute.or(original.omitted_substitute),
            inferred: OnceCell::new(),
        }
    }
}

impl Clone for Property {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            explicit_type: self.explicit_type,
            accessor: self.accessor.clone(),
            mutator: self.mutator.clone(),
            not_null: self.not_null,
            ignored: self.ignored,
            significant: self.significant,
            null_substitute: self.null_substitute.clone(),
            omitted_substitute: self.omitted_substitute.clone(),
            // The memo is cheap to recompute; a clone starts fresh.
            inferred: OnceCell::new(),
        }
    }
}

impl fmt::Debug for Property {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Property")
            .field("name", &self.name)
            .field("type", &self.type_token().map(|t| t.name()))
            .field("readable", &self.readable())
            .field("writable", &self.writable())
            .field("not_null", &self.not_null)
            .field("ignored", &self.ignored)
            .field("significant", &self.significant)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Accessor, Mutator};
    use crate::value::TypeToken;

    #[derive(Debug, Clone, PartialEq)]
    struct Widget {
        label: String,
        count: i32,
    }

    fn label_accessor() -> Accessor {
        Accessor::of(|w: &Widget| w.label.clone())
    }

    fn label_mutator() -> Mutator {
        Mutator::of(|w: &mut Widget, label: String| w.label = label)
    }

    #[test]
    fn test_type_inference_prefers_mutator() {
        let mut property = Property::new("label");
        assert_eq!(property.type_token(), None);

        property.set_accessor(Some(label_accessor()));
        assert_eq!(property.type_token(), Some(TypeToken::of::<String>()));

        // An explicit type shadows inference
        property.set_explicit_type(Some(TypeToken::of::<i32>()));
        assert_eq!(property.type_token(), Some(TypeToken::of::<i32>()));
    }

    #[test]
    fn test_inference_memo_invalidated_on_replacement() {
        let mut property = Property::new("count");
        property.set_accessor(Some(Accessor::of(|w: &Widget| w.count)));
        assert_eq!(property.type_token(), Some(TypeToken::of::<i32>()));

        // Replacing the mutator must re-run inference, and the mutator's
        // parameter type now wins over the accessor's return type.
        property.set_mutator(Some(label_mutator()));
        assert_eq!(property.type_token(), Some(TypeToken::of::<String>()));
    }

    #[test]
    fn test_placeholder_has_no_contract() {
        let property = Property::new("ghost");
        assert!(!property.readable());
        assert!(!property.writable());
        assert_eq!(property.type_token(), None);
    }

    #[test]
    fn test_merge_or_combines_restrictions() {
        let mut original = Property::new("label");
        original.mark_ignored();

        let mut update = Property::new("label");
        update.mark_not_null();

        let merged = Property::merge(original, update);
        assert!(merged.ignored());
        assert!(merged.not_null());
    }

    #[test]
    fn test_merge_replaces_functions_wholesale() {
        let mut original = Property::new("label");
        original.set_accessor(Some(label_accessor()));
        original.set_mutator(Some(label_mutator()));

        // The update supplies only an accessor: the pair is replaced as a
        // unit, so the original's mutator does not survive.
        let mut update = Property::new("label");
        update.set_accessor(Some(label_accessor()));

        let merged = Property::merge(original, update);
        assert!(merged.readable());
        assert!(!merged.writable());
    }

    #[test]
    fn test_merge_keeps_original_functions_when_update_has_none() {
        let mut original = Property::new("label");
        original.set_accessor(Some(label_accessor()));
        original.set_mutator(Some(label_mutator()));

        let update = Property::new("label");

        let merged = Property::merge(original, update);
        assert!(merged.readable());
        assert!(merged.writable());
    }

    #[test]
    fn test_merge_prefers_update_type() {
        let mut original = Property::new("count");
        original.set_explicit_type(Some(TypeToken::of::<i64>()));

        let mut update = Property::new("count");
        update.set_explicit_type(Some(TypeToken::of::<i32>()));

        let merged = Property::merge(original.clone(), update);
        assert_eq!(merged.type_token(), Some(TypeToken::of::<i32>()));

        // Without an update-side type the original's survives
        let merged = Property::merge(original, Property::new("count"));
        assert_eq!(merged.type_token(), Some(TypeToken::of::<i64>()));
    }

    #[test]
    fn test_slot_policies() {
        let mut property = Property::new("tag");
        assert_eq!(property.null_policy(), SlotPolicy::Preserve);
        assert_eq!(property.omitted_policy(), SlotPolicy::Preserve);

        property.set_null_substitute(Some(Value::of("".to_string())));
        property.set_omitted_substitute(Some(Value::of("default".to_string())));
        assert_eq!(property.null_policy(), SlotPolicy::Substitute);
        assert_eq!(property.omitted_policy(), SlotPolicy::Substitute);
        assert_eq!(
            property.omitted_substitute(),
            Some(&Value::of("default".to_string()))
        );
    }

    #[test]
    fn test_from_param_is_write_only_input() {
        let param = ParamSpec::new("id", TypeToken::of::<String>(), true);
        let property = Property::from_param(&param);

        assert_eq!(property.name(), "id");
        assert_eq!(property.type_token(), Some(TypeToken::of::<String>()));
        assert!(property.not_null());
        assert!(!property.readable());
        assert!(!property.writable());
    }
}
