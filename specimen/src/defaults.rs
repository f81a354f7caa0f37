//! Built-in factories for primitive types.
//!
//! Numeric primary/secondary values anchor on `num_traits::{One, Zero}`, so
//! every numeric type gets the same distinct deterministic pair without a
//! per-type table; Random values draw from the repository's shared RNG.

use rand::Rng;
use rand::distributions::Alphanumeric;

use crate::factory::ValueFactory;
use crate::repository::FactoryRepository;

macro_rules! install_numeric_factories {
    ($repository:expr, $($t:ty),* $(,)?) => {
        $(
            {
                let rng = $repository.shared_rng();
                $repository.add_factory(ValueFactory::from_fns(
                    || <$t as num_traits::One>::one(),
                    || <$t as num_traits::Zero>::zero(),
                    move || rng.borrow_mut().r#gen::<$t>(),
                ));
            }
        )*
    };
}

/// Install factories for the primitive types every repository understands:
/// the integer and float types, `bool`, `char`, and `String`.
pub fn install_default_factories(repository: &mut FactoryRepository) {
    install_numeric_factories!(
        repository, i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize, f32, f64
    );

    {
        let rng = repository.shared_rng();
        repository.add_factory(ValueFactory::from_fns(
            || true,
            || false,
            move || rng.borrow_mut().r#gen::<bool>(),
        ));
    }

    {
        let rng = repository.shared_rng();
        repository.add_factory(ValueFactory::from_fns(
            || 'a',
            || 'b',
            move || rng.borrow_mut().r#gen_range('a'..='z'),
        ));
    }

    {
        let rng = repository.shared_rng();
        let max_len = repository.config().max_sequence_len;
        repository.add_factory(ValueFactory::from_fns(
            || "alpha".to_string(),
            || "bravo".to_string(),
            move || {
                let mut rng = rng.borrow_mut();
                let len = rng.r#gen_range(0..=max_len);
                (0..len)
                    .map(|_| char::from(rng.sample(Alphanumeric)))
                    .collect()
            },
        ));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::rc::Rc;

    use crate::config::EngineConfig;
    use crate::model::ModelRegistry;
    use crate::value::{TypeToken, Value, ValueKind};

    fn repository() -> FactoryRepository {
        let mut repository = FactoryRepository::new(
            Rc::new(ModelRegistry::new()),
            EngineConfig::default().with_seed(5),
        );
        install_default_factories(&mut repository);
        repository
    }

    #[test]
    fn test_numeric_primary_secondary_distinct() {
        let repository = repository();

        let factory = repository.get_factory(&TypeToken::of::<i32>()).unwrap();
        assert_eq!(factory.create(ValueKind::Primary).unwrap(), Value::of(1i32));
        assert_eq!(
            factory.create(ValueKind::Secondary).unwrap(),
            Value::of(0i32)
        );
        assert!(factory.distinct_deterministic().unwrap());

        let factory = repository.get_factory(&TypeToken::of::<f64>()).unwrap();
        assert!(factory.distinct_deterministic().unwrap());
    }

    #[test]
    fn test_all_primitive_types_resolve() {
        let repository = repository();
        for token in [
            TypeToken::of::<u8>(),
            TypeToken::of::<u128>(),
            TypeToken::of::<isize>(),
            TypeToken::of::<f32>(),
            TypeToken::of::<bool>(),
            TypeToken::of::<char>(),
            TypeToken::of::<String>(),
        ] {
            let factory = repository.get_factory(&token).unwrap();
            assert!(factory.create(ValueKind::Random).is_ok());
        }
    }

    #[test]
    fn test_string_random_bounded_by_config() {
        let repository = repository();
        let factory = repository.get_factory(&TypeToken::of::<String>()).unwrap();
        for _ in 0..50 {
            let value = factory.create(ValueKind::Random).unwrap();
            let s = value.downcast_ref::<String>().unwrap();
            assert!(s.len() <= repository.config().max_sequence_len);
        }
    }

    #[test]
    fn test_seeded_random_is_reproducible() {
        let a = repository();
        let b = repository();
        let fa = a.get_factory(&TypeToken::of::<u64>()).unwrap();
        let fb = b.get_factory(&TypeToken::of::<u64>()).unwrap();
        for _ in 0..10 {
            assert_eq!(
                fa.create(ValueKind::Random).unwrap(),
                fb.create(ValueKind::Random).unwrap()
            );
        }
    }
}
