use std::fmt;
use std::rc::Rc;

use compose_forms_core::{Control, ControlKey, RuntimeHandle, UpdateOptions};
use compose_forms_graft::{GraftDirective, GraftError};
use compose_forms_runtime_std::{FormShell, ShellError, ShellOptions, TickReport};

use crate::fixtures::Fixture;

pub type MountId = usize;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HarnessError {
    Graft(GraftError),
    Shell(ShellError),
    UnknownMount(MountId),
    NoSuchPath(String),
}

impl fmt::Display for HarnessError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HarnessError::Graft(err) => write!(f, "{err}"),
            HarnessError::Shell(err) => write!(f, "{err}"),
            HarnessError::UnknownMount(id) => write!(f, "nothing mounted as #{id}"),
            HarnessError::NoSuchPath(path) => write!(f, "no control at {path:?}"),
        }
    }
}

impl std::error::Error for HarnessError {}

impl From<GraftError> for HarnessError {
    fn from(err: GraftError) -> Self {
        HarnessError::Graft(err)
    }
}

impl From<ShellError> for HarnessError {
    fn from(err: ShellError) -> Self {
        HarnessError::Shell(err)
    }
}

struct Mount {
    host: Rc<dyn Fixture>,
    directive: GraftDirective,
}

fn check_pass(mounts: &[Option<Mount>]) -> Result<(), GraftError> {
    for mount in mounts.iter().flatten() {
        mount.host.detect_changes()?;
    }
    Ok(())
}

/// Mounts fixture components onto a root form and drives them through
/// [`FormShell`] ticks, the way a host application would.
///
/// Mounting, retargeting and unmounting each run inside a tick, so their
/// effects are committed by the time the call returns. Components nested in
/// a freshly attached host only see the copied state on the next
/// [`detect_changes`](FormHarness::detect_changes).
pub struct FormHarness {
    shell: FormShell,
    mounts: Vec<Option<Mount>>,
}

impl FormHarness {
    pub fn new(root: Control) -> Self {
        Self::with_options(root, ShellOptions::default())
    }

    pub fn with_options(root: Control, options: ShellOptions) -> Self {
        Self {
            shell: FormShell::with_options(root, options),
            mounts: Vec::new(),
        }
    }

    pub fn root(&self) -> &Control {
        self.shell.root()
    }

    pub fn shell(&mut self) -> &mut FormShell {
        &mut self.shell
    }

    pub fn runtime_handle(&self) -> RuntimeHandle {
        self.shell.runtime_handle()
    }

    pub fn directive(&self, id: MountId) -> Option<&GraftDirective> {
        self.mounts
            .get(id)
            .and_then(Option::as_ref)
            .map(|mount| &mount.directive)
    }

    pub fn mount(
        &mut self,
        key: impl Into<ControlKey>,
        host: Rc<dyn Fixture>,
    ) -> Result<MountId, HarnessError> {
        self.mount_with(key.into(), host, None)
    }

    /// Mounts with the directive's disabled input bound to `disabled`.
    pub fn mount_disabled(
        &mut self,
        key: impl Into<ControlKey>,
        host: Rc<dyn Fixture>,
        disabled: bool,
    ) -> Result<MountId, HarnessError> {
        self.mount_with(key.into(), host, Some(disabled))
    }

    fn mount_with(
        &mut self,
        key: ControlKey,
        host: Rc<dyn Fixture>,
        disabled: Option<bool>,
    ) -> Result<MountId, HarnessError> {
        let root = self.shell.root().clone();
        let mut directive = GraftDirective::new(&root, &host, self.shell.runtime_handle());
        if let Some(disabled) = disabled {
            directive.set_disabled(disabled);
        }
        let mut prepared = Ok(());
        let mounts = &self.mounts;
        self.shell.tick(|| {
            prepared = directive
                .set_key(key)
                .and_then(|()| check_pass(mounts));
        })?;
        prepared?;

        self.mounts.push(Some(Mount { host, directive }));
        Ok(self.mounts.len() - 1)
    }

    /// Points a mounted directive at another key.
    pub fn retarget(
        &mut self,
        id: MountId,
        key: impl Into<ControlKey>,
    ) -> Result<TickReport, HarnessError> {
        let key = key.into();
        let mounts = &mut self.mounts;
        let mut prepared = Ok(());
        let report = self.shell.tick(|| {
            let retargeted = match mounts.get_mut(id).and_then(Option::as_mut) {
                Some(mount) => mount.directive.set_key(key).map_err(HarnessError::from),
                None => Err(HarnessError::UnknownMount(id)),
            };
            prepared = retargeted
                .and_then(|()| check_pass(mounts.as_slice()).map_err(HarnessError::from));
        })?;
        prepared?;
        Ok(report)
    }

    /// Destroys a mounted component and commits its detach.
    pub fn unmount(&mut self, id: MountId) -> Result<TickReport, HarnessError> {
        let mounts = &mut self.mounts;
        let mut prepared = Ok(());
        let report = self.shell.tick(|| {
            prepared = match mounts.get_mut(id).and_then(Option::take) {
                Some(mount) => {
                    drop(mount);
                    check_pass(mounts.as_slice()).map_err(HarnessError::from)
                }
                None => Err(HarnessError::UnknownMount(id)),
            };
        })?;
        prepared?;
        Ok(report)
    }

    /// Writes `text` into the control at `path` as an input event would.
    pub fn type_into(&mut self, path: &str, text: &str) -> Result<(), HarnessError> {
        let control = self
            .root()
            .get(path)
            .ok_or_else(|| HarnessError::NoSuchPath(path.to_owned()))?;
        control.set_value(text, UpdateOptions::default());
        Ok(())
    }

    /// One tick: every mounted component checks the form, then the deferred
    /// work is committed.
    pub fn detect_changes(&mut self) -> Result<TickReport, HarnessError> {
        let mounts = &self.mounts;
        let mut checked = Ok(());
        let report = self.shell.tick(|| checked = check_pass(mounts))?;
        checked?;
        Ok(report)
    }

    /// Calls [`detect_changes`](FormHarness::detect_changes) until a tick has
    /// nothing left to do.
    pub fn settle(&mut self) -> Result<usize, HarnessError> {
        let limit = self.shell.options().max_settle_ticks;
        for ticks in 1..=limit {
            if self.detect_changes()?.is_idle() && !self.shell.runtime().has_pending_tasks() {
                return Ok(ticks);
            }
        }
        Err(ShellError::Unsettled { ticks: limit }.into())
    }
}

impl fmt::Debug for FormHarness {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FormHarness")
            .field("shell", &self.shell)
            .field("mounts", &self.mounts.iter().flatten().count())
            .finish()
    }
}
