use std::cell::RefCell;

use compose_forms_core::validators::required;
use compose_forms_core::{Control, FormValue, RuntimeHandle};
use compose_forms_graft::{GraftDirective, GraftError, HostControl};

/// A component as the harness drives it: it owns a control and reacts to the
/// form during each check pass.
pub trait Fixture: HostControl {
    /// Runs during the check pass. Must only prepare, never mutate the form.
    fn detect_changes(&self) -> Result<(), GraftError> {
        Ok(())
    }
}

/// `{ name: required, age: required }`
#[derive(Debug)]
pub struct PersonForm {
    control: Control,
}

impl PersonForm {
    pub fn new() -> Self {
        Self {
            control: Control::group([
                ("name", Control::field("").with_validator(required())),
                ("age", Control::field("").with_validator(required())),
            ]),
        }
    }
}

impl Default for PersonForm {
    fn default() -> Self {
        Self::new()
    }
}

impl HostControl for PersonForm {
    fn control(&self) -> Control {
        self.control.clone()
    }
}

impl Fixture for PersonForm {}

/// `{ name: required }`
#[derive(Debug)]
pub struct NameForm {
    control: Control,
}

impl NameForm {
    pub fn new() -> Self {
        Self {
            control: Control::group([("name", Control::field("").with_validator(required()))]),
        }
    }
}

impl Default for NameForm {
    fn default() -> Self {
        Self::new()
    }
}

impl HostControl for NameForm {
    fn control(&self) -> Control {
        self.control.clone()
    }
}

impl Fixture for NameForm {}

/// `{ type: required, person }` where `person` is taken over by a
/// [`PersonForm`] when `type` is `"foo"` and by a [`NameForm`] when it is
/// `"bar"`.
pub struct CompositeForm {
    control: Control,
    runtime: RuntimeHandle,
    mounted: RefCell<Option<(String, GraftDirective)>>,
}

impl CompositeForm {
    pub fn new(runtime: RuntimeHandle) -> Self {
        Self {
            control: Control::group([
                ("type", Control::field(FormValue::Null).with_validator(required())),
                ("person", Control::field(FormValue::Null)),
            ]),
            runtime,
            mounted: RefCell::new(None),
        }
    }

    /// The `type` the current sub-form was mounted for.
    pub fn mounted_type(&self) -> Option<String> {
        self.mounted.borrow().as_ref().map(|(kind, _)| kind.clone())
    }

    /// The control of the mounted sub-form.
    pub fn person_host(&self) -> Option<Control> {
        self.mounted
            .borrow()
            .as_ref()
            .map(|(_, directive)| directive.host_control().clone())
    }

    fn selected_type(&self) -> Option<String> {
        self.control
            .raw_value()
            .get("type")
            .and_then(FormValue::as_str)
            .map(str::to_owned)
    }
}

impl HostControl for CompositeForm {
    fn control(&self) -> Control {
        self.control.clone()
    }
}

impl Fixture for CompositeForm {
    fn detect_changes(&self) -> Result<(), GraftError> {
        let selected = self.selected_type();
        let mut mounted = self.mounted.borrow_mut();
        if mounted.as_ref().map(|(kind, _)| kind) == selected.as_ref() {
            return Ok(());
        }
        // Dropping the old directive prepares its detach.
        *mounted = None;
        let host = match selected.as_deref() {
            Some("foo") => PersonForm::new().control(),
            Some("bar") => NameForm::new().control(),
            _ => return Ok(()),
        };
        let mut directive = GraftDirective::new(&self.control, &host, self.runtime.clone());
        directive.set_key("person")?;
        *mounted = selected.map(|kind| (kind, directive));
        Ok(())
    }
}
