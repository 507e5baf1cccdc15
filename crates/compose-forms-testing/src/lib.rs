//! Testing utilities and harness for Compose-RS forms

mod fixtures;
mod harness;

pub use fixtures::{CompositeForm, Fixture, NameForm, PersonForm};
pub use harness::{FormHarness, HarnessError, MountId};

