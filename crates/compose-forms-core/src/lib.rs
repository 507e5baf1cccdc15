#![doc = r"Form controls, slot containers and the deferred-commit runtime for Compose-RS."]

pub mod aggregate;
pub mod collections;
pub mod container;
pub mod control;
pub mod hash;
pub mod platform;
pub mod runtime;
pub mod validators;
pub mod value;

pub use aggregate::{recompute, AggregateState};
pub use container::{
    Container, ContainerError, ControlKey, IndexedContainer, KeyKind, KeyedContainer,
};
pub use control::{
    Control, ControlEvent, ControlId, ControlStatus, Subscription, UpdateOptions, Validity,
};
pub use platform::RuntimeScheduler;
pub use runtime::{DefaultScheduler, Runtime, RuntimeHandle};
pub use validators::{AsyncValidator, ValidationErrors, ValidationFuture, Validator};
pub use value::FormValue;

#[cfg(test)]
pub use runtime::TestScheduler;

#[cfg(test)]
#[path = "tests/control_tests.rs"]
mod control_tests;

#[cfg(test)]
#[path = "tests/runtime_tests.rs"]
mod runtime_tests;
