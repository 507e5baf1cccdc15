use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

use compose_forms_core::collections::map::HashMap;
use compose_forms_core::{
    recompute, Container, Control, ControlId, ControlKey, RuntimeHandle, UpdateOptions,
};

use crate::error::GraftError;
use crate::host::HostControl;
use crate::transfer::copy_control_state;

/// Where a directive stands in its attach/detach lifecycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum GraftPhase {
    /// No attach has been prepared yet, or the slot was gone when it committed.
    Unattached,
    /// An attach has been prepared and is waiting for the next commit.
    ///
    /// The backup in [`GraftDirective::original_control`] is already held in
    /// this phase: it is taken when the attach is prepared and released when
    /// the detach is prepared.
    Pending,
    /// The host control occupies the target slot.
    Attached,
    /// The original control has been put back.
    Detached,
}

thread_local! {
    /// Host controls currently sitting in a slot, mapped to the placeholder
    /// they displaced.
    static PLACEHOLDERS: RefCell<HashMap<ControlId, Control>> = RefCell::new(HashMap::default());
}

/// The control a detach should put back into a slot occupied by `occupant`.
fn placeholder_behind(occupant: &Control) -> Control {
    PLACEHOLDERS
        .with(|map| map.borrow().get(&occupant.id()).cloned())
        .unwrap_or_else(|| occupant.clone())
}

struct GraftBinding {
    parent: Control,
    host: Control,
    original: RefCell<Option<Control>>,
    disabled: Cell<Option<bool>>,
    phase: Cell<GraftPhase>,
}

impl GraftBinding {
    fn commit_attach(
        &self,
        container: &Container,
        key: &ControlKey,
        occupant: &Control,
        placeholder: Control,
    ) {
        copy_control_state(&self.host, occupant, self.disabled.get());
        let phase = match container.set_control(key, self.host.clone()) {
            Ok(_) => {
                log::trace!("graft: host control now at {key}");
                PLACEHOLDERS.with(|map| map.borrow_mut().insert(self.host.id(), placeholder));
                GraftPhase::Attached
            }
            Err(err) => {
                log::debug!("graft: slot vanished before commit: {err}");
                let mut original = self.original.borrow_mut();
                if original.as_ref().is_some_and(|o| o.ptr_eq(&placeholder)) {
                    *original = None;
                }
                // A later attach may already be waiting with its own backup.
                if original.is_some() {
                    GraftPhase::Pending
                } else {
                    GraftPhase::Unattached
                }
            }
        };
        let parent = container.control();
        recompute(parent).apply(parent, UpdateOptions::silent());
        self.phase.set(phase);
    }

    fn commit_detach(&self, container: &Container, key: &ControlKey, original: Control) {
        PLACEHOLDERS.with(|map| map.borrow_mut().remove(&self.host.id()));
        match container.set_control(key, original) {
            Ok(_) => log::trace!("graft: original control restored at {key}"),
            Err(err) => log::debug!("graft: slot vanished before restore: {err}"),
        }
        let parent = container.control();
        recompute(parent).apply(parent, UpdateOptions::silent());
        self.phase.set(GraftPhase::Detached);
    }
}

/// Splices a component's own control into an ancestor's container.
///
/// Every operation runs in two phases. The prepare phase happens inside the
/// call: it resolves the container, checks the key and captures the
/// placeholder, failing with a [`GraftError`] before anything is touched. The
/// mutation itself is deferred to the runtime and happens when the host calls
/// [`Runtime::commit`](compose_forms_core::Runtime::commit), in the order the
/// operations were prepared.
///
/// ```ignore
/// let mut directive = GraftDirective::new(&form, &person_form, runtime.handle());
/// directive.set_key("person")?;
/// runtime.commit();
/// ```
pub struct GraftDirective {
    binding: Rc<GraftBinding>,
    runtime: RuntimeHandle,
    key: Option<ControlKey>,
    destroyed: bool,
}

impl GraftDirective {
    /// `parent` is the ambient container, `host` the component whose control
    /// will take over a slot in it.
    pub fn new(parent: &Control, host: &impl HostControl, runtime: RuntimeHandle) -> Self {
        Self {
            binding: Rc::new(GraftBinding {
                parent: parent.clone(),
                host: host.control(),
                original: RefCell::new(None),
                disabled: Cell::new(None),
                phase: Cell::new(GraftPhase::Unattached),
            }),
            runtime,
            key: None,
            destroyed: false,
        }
    }

    pub fn key(&self) -> Option<&ControlKey> {
        self.key.as_ref()
    }

    pub fn phase(&self) -> GraftPhase {
        self.binding.phase.get()
    }

    pub fn host_control(&self) -> &Control {
        &self.binding.host
    }

    pub fn parent(&self) -> &Control {
        &self.binding.parent
    }

    /// The placeholder that will be put back on detach. Set from the moment an
    /// attach is prepared until the matching detach is prepared.
    ///
    /// When the slot was held by another directive's host at prepare time,
    /// state is still copied from that host but the placeholder is the one
    /// that host displaced.
    pub fn original_control(&self) -> Option<Control> {
        self.binding.original.borrow().clone()
    }

    pub fn disabled_override(&self) -> Option<bool> {
        self.binding.disabled.get()
    }

    /// Forces the host control's enabled state and stops the attach from
    /// mirroring the placeholder's.
    pub fn set_disabled(&mut self, disabled: bool) {
        let control = &self.binding.host;
        if disabled && control.is_enabled() {
            control.disable(UpdateOptions::default());
        } else if !disabled && control.is_disabled() {
            control.enable(UpdateOptions::default());
        }
        self.binding.disabled.set(Some(disabled));
    }

    /// Points the directive at `key`.
    ///
    /// The first call prepares an attach. A different key prepares a detach
    /// from the old key followed by an attach to the new one; the detach is
    /// prepared even if the attach then fails, and a failed key is not kept,
    /// so it can be set again once the entry exists. Setting the current key
    /// again does nothing.
    pub fn set_key(&mut self, key: impl Into<ControlKey>) -> Result<(), GraftError> {
        let key = key.into();
        if self.destroyed {
            log::debug!("graft: ignoring key {key} on a destroyed directive");
            return Ok(());
        }
        if self.key.as_ref() == Some(&key) {
            return Ok(());
        }
        if let Some(previous) = self.key.take() {
            self.prepare_detach(previous);
        }
        self.prepare_attach(&key)?;
        self.key = Some(key);
        Ok(())
    }

    /// Unmounts the directive: prepares a detach from the current key. Later
    /// calls, including the one made on drop, do nothing.
    pub fn destroy(&mut self) {
        if std::mem::replace(&mut self.destroyed, true) {
            return;
        }
        if let Some(key) = self.key.clone() {
            self.prepare_detach(key);
        }
    }

    fn prepare_attach(&self, key: &ControlKey) -> Result<(), GraftError> {
        let container =
            Container::resolve(&self.binding.parent).ok_or(GraftError::UnsupportedContainer)?;
        let occupant = container.get(key)?;
        // A slot may still hold another directive's host whose detach is
        // queued; the backup is the placeholder behind it.
        let original = placeholder_behind(&occupant);
        *self.binding.original.borrow_mut() = Some(original.clone());
        self.binding.phase.set(GraftPhase::Pending);
        log::debug!("graft: prepared attach at {key}");

        let binding = Rc::clone(&self.binding);
        let key = key.clone();
        self.runtime.defer(move || {
            binding.commit_attach(&container, &key, &occupant, original);
        });
        Ok(())
    }

    fn prepare_detach(&self, key: ControlKey) {
        let Some(original) = self.binding.original.borrow_mut().take() else {
            return;
        };
        let Some(container) = Container::resolve(&self.binding.parent) else {
            return;
        };
        log::debug!("graft: prepared detach from {key}");

        let binding = Rc::clone(&self.binding);
        self.runtime
            .defer(move || binding.commit_detach(&container, &key, original));
    }
}

impl Drop for GraftDirective {
    fn drop(&mut self) {
        self.destroy();
    }
}

impl fmt::Debug for GraftDirective {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GraftDirective")
            .field("key", &self.key)
            .field("phase", &self.phase())
            .field("disabled", &self.binding.disabled.get())
            .field("destroyed", &self.destroyed)
            .finish()
    }
}
