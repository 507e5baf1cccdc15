//! The capability a component exposes to be grafted.

use std::rc::Rc;

use compose_forms_core::Control;

/// A component that owns a [`Control`] usable as a substitute node.
///
/// The control must be the same node on every call; the directive reads it
/// once, when it is constructed.
pub trait HostControl {
    fn control(&self) -> Control;
}

impl HostControl for Control {
    fn control(&self) -> Control {
        self.clone()
    }
}

impl<T: HostControl + ?Sized> HostControl for Rc<T> {
    fn control(&self) -> Control {
        (**self).control()
    }
}

impl<T: HostControl + ?Sized> HostControl for &T {
    fn control(&self) -> Control {
        (**self).control()
    }
}
