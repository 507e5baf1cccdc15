//! Synchronous and asynchronous validators.
//!
//! Validators are shared handles: installing the validator of one control on
//! another keeps the same closure, and [`Validator::ptr_eq`] can tell the two
//! installations apart from a look-alike.

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::rc::Rc;

use crate::collections::map::HashMap;
use crate::value::FormValue;

/// Error keys reported by a failing validator, each with an optional detail.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ValidationErrors(HashMap<String, FormValue>);

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Shorthand for a single error key with a `true` detail.
    pub fn single(key: impl Into<String>) -> Self {
        Self::new().with(key, true)
    }

    pub fn with(mut self, key: impl Into<String>, detail: impl Into<FormValue>) -> Self {
        self.insert(key, detail);
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, detail: impl Into<FormValue>) {
        self.0.insert(key.into(), detail.into());
    }

    pub fn contains(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn get(&self, key: &str) -> Option<&FormValue> {
        self.0.get(key)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn merge(&mut self, other: ValidationErrors) {
        self.0.extend(other.0);
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut keys: Vec<&str> = self.keys().collect();
        keys.sort_unstable();
        f.write_str(&keys.join(", "))
    }
}

pub type ValidationFuture = Pin<Box<dyn Future<Output = Option<ValidationErrors>>>>;

type SyncFn = dyn Fn(&FormValue) -> Option<ValidationErrors>;
type AsyncFn = dyn Fn(FormValue) -> ValidationFuture;

#[derive(Clone)]
pub struct Validator(Rc<SyncFn>);

impl Validator {
    pub fn new(check: impl Fn(&FormValue) -> Option<ValidationErrors> + 'static) -> Self {
        Self(Rc::new(check))
    }

    pub fn validate(&self, value: &FormValue) -> Option<ValidationErrors> {
        (self.0)(value).filter(|errors| !errors.is_empty())
    }

    pub fn ptr_eq(&self, other: &Validator) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for Validator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Validator")
            .field(&Rc::as_ptr(&self.0).cast::<()>())
            .finish()
    }
}

#[derive(Clone)]
pub struct AsyncValidator(Rc<AsyncFn>);

impl AsyncValidator {
    pub fn new<F, Fut>(check: F) -> Self
    where
        F: Fn(FormValue) -> Fut + 'static,
        Fut: Future<Output = Option<ValidationErrors>> + 'static,
    {
        Self(Rc::new(move |value| Box::pin(check(value))))
    }

    pub fn validate(&self, value: FormValue) -> ValidationFuture {
        (self.0)(value)
    }

    pub fn ptr_eq(&self, other: &AsyncValidator) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for AsyncValidator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("AsyncValidator")
            .field(&Rc::as_ptr(&self.0).cast::<()>())
            .finish()
    }
}

/// Fails with `required` when the value is blank.
pub fn required() -> Validator {
    Validator::new(|value| value.is_blank().then(|| ValidationErrors::single("required")))
}

/// Fails with `minlength` when a measurable value is shorter than `min`.
/// Blank values pass so the validator composes with [`required`].
pub fn min_length(min: usize) -> Validator {
    Validator::new(move |value| {
        if value.is_blank() {
            return None;
        }
        let actual = value.len()?;
        (actual < min).then(|| {
            ValidationErrors::new().with(
                "minlength",
                FormValue::group([
                    ("requiredLength", FormValue::from(min as f64)),
                    ("actualLength", FormValue::from(actual as f64)),
                ]),
            )
        })
    })
}

pub fn max_length(max: usize) -> Validator {
    Validator::new(move |value| {
        let actual = value.len()?;
        (actual > max).then(|| {
            ValidationErrors::new().with(
                "maxlength",
                FormValue::group([
                    ("requiredLength", FormValue::from(max as f64)),
                    ("actualLength", FormValue::from(actual as f64)),
                ]),
            )
        })
    })
}

/// Fails with `name` when the text value does not satisfy `predicate`.
pub fn pattern(name: &'static str, predicate: impl Fn(&str) -> bool + 'static) -> Validator {
    Validator::new(move |value| match value {
        FormValue::Text(text) if !text.is_empty() && !predicate(text) => {
            Some(ValidationErrors::single(name))
        }
        _ => None,
    })
}

/// Runs every validator and merges their errors into one set.
pub fn compose(validators: impl IntoIterator<Item = Validator>) -> Validator {
    let validators: Vec<Validator> = validators.into_iter().collect();
    Validator::new(move |value| {
        let mut merged = ValidationErrors::new();
        for validator in &validators {
            if let Some(errors) = validator.validate(value) {
                merged.merge(errors);
            }
        }
        (!merged.is_empty()).then_some(merged)
    })
}

/// Awaits every async validator in order and merges their errors.
pub fn compose_async(validators: impl IntoIterator<Item = AsyncValidator>) -> AsyncValidator {
    let validators: Rc<[AsyncValidator]> = validators.into_iter().collect();
    AsyncValidator::new(move |value: FormValue| {
        let validators = Rc::clone(&validators);
        async move {
            let mut merged = ValidationErrors::new();
            for validator in validators.iter() {
                if let Some(errors) = validator.validate(value.clone()).await {
                    merged.merge(errors);
                }
            }
            (!merged.is_empty()).then_some(merged)
        }
    })
}
