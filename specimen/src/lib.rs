//! # Specimen - Property-Model and Value-Synthesis Engine
//!
//! Specimen discovers the settable/gettable attributes ("properties") of a
//! registered type, synthesizes instances of it through one of several
//! construction strategies, and generates deterministic and randomized
//! candidate values for each attribute, so that property round-tripping,
//! equality, and hash-code contracts can be verified without hand-written
//! test fixtures.
//!
//! ## Quick Start
//!
//! ```rust
//! use specimen::{
//!     Accessor, AttributeSpec, ConstructorSpec, Engine, Mutator, TypeSpec, TypeToken,
//!     required_arg,
//! };
//!
//! #[derive(Debug, Clone, PartialEq)]
//! struct Badge {
//!     label: String,
//! }
//!
//! let engine = Engine::builder()
//!     .register_type(
//!         TypeSpec::new::<Badge>()
//!             .constructor(
//!                 ConstructorSpec::new(|args| {
//!                     Ok(Badge { label: required_arg(&args, 0, "label")? })
//!                 })
//!                 .param("label", TypeToken::of::<String>(), true),
//!             )
//!             .attribute(
//!                 AttributeSpec::new("label")
//!                     .accessor(Accessor::of(|b: &Badge| b.label.clone()))
//!                     .mutator(Mutator::of(|b: &mut Badge, label: String| b.label = label)),
//!             ),
//!     )
//!     .build()
//!     .unwrap();
//!
//! // Every testable property round-trips its primary and secondary values.
//! engine.verify_type::<Badge>().unwrap();
//! ```

// Public modules
pub mod config;
pub mod creation;
pub mod defaults;
pub mod description;
pub mod engine;
pub mod error;
pub mod factory;
pub mod holder;
pub mod lookups;
pub mod model;
pub mod property;
pub mod proxy;
pub mod repository;
pub mod rng;
pub mod value;

// Re-export the main public API
pub use config::{ConfigError, EngineConfig};
pub use creation::{BuilderStrategy, ConstructorStrategy, CreationStrategy, select_strategy};
pub use defaults::install_default_factories;
pub use description::{BeanDescription, Customization};
pub use engine::{Engine, EngineBuilder};
pub use error::SpecimenError;
pub use factory::ValueFactory;
pub use holder::BeanHolder;
pub use lookups::{EnumerationLookup, FnLookup, LookupStrategy, SequenceLookup};
pub use model::{
    Accessor, AttributeSpec, BuilderParam, BuilderSpec, ConstructorSpec, FactoryMethodSpec,
    Instance, ModelRegistry, Mutator, MutatorStyle, ParamSpec, TypeKind, TypeSpec, optional_arg,
    required_arg,
};
pub use property::{Property, SlotPolicy};
pub use proxy::{
    DerivedMethod, ProxyAttribute, ProxyInstance, ProxyShape, ProxyStrategy, SetOutcome,
    shape_properties,
};
pub use repository::FactoryRepository;
pub use rng::{DefaultRngProvider, RngManager, RngProvider, SharedRng, shared_rng};
pub use value::{PropValue, TypeToken, Value, ValueKind, ValueMap};
