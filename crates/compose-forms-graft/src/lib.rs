//! Control grafting for Compose-RS forms.
//!
//! A [`GraftDirective`] lets a component that owns a self-contained control
//! (usually a group) take over a slot of an ancestor's form. The attach copies
//! the placeholder's value, enabled flag and validators onto the component's
//! control, swaps it into the slot and silently recomputes the container. The
//! detach puts the placeholder back.

mod directive;
mod error;
mod host;
mod transfer;

pub use directive::{GraftDirective, GraftPhase};
pub use error::GraftError;
pub use host::HostControl;
pub use transfer::copy_control_state;

#[cfg(test)]
#[path = "tests/directive_tests.rs"]
mod directive_tests;

#[cfg(test)]
#[path = "tests/transfer_tests.rs"]
mod transfer_tests;
