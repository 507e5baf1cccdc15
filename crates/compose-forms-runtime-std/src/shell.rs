use std::fmt;

use compose_forms_core::{Control, RuntimeHandle};

use crate::StdRuntime;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ShellOptions {
    /// Fail a tick whose check pass changed the root value.
    pub verify_checked: bool,
    /// Upper bound on the ticks [`FormShell::settle`] may run.
    pub max_settle_ticks: usize,
}

impl Default for ShellOptions {
    fn default() -> Self {
        Self {
            verify_checked: true,
            max_settle_ticks: 16,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TickReport {
    /// Deferred tasks run by this tick's commit.
    pub committed: usize,
    /// Whether an async validation is still in flight after the tick.
    pub pending_validations: bool,
}

impl TickReport {
    pub fn is_idle(&self) -> bool {
        self.committed == 0 && !self.pending_validations
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShellError {
    /// The check pass mutated the form it was reading.
    ChangedAfterChecked { before: u64, after: u64 },
    /// Work was still arriving after the configured number of ticks.
    Unsettled { ticks: usize },
}

impl fmt::Display for ShellError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShellError::ChangedAfterChecked { before, after } => write!(
                f,
                "form value changed during the check pass (fingerprint {before:#x} -> {after:#x})"
            ),
            ShellError::Unsettled { ticks } => {
                write!(f, "form did not settle after {ticks} ticks")
            }
        }
    }
}

impl std::error::Error for ShellError {}

/// Host update loop for a form tree.
///
/// Each [`tick`](FormShell::tick) is one pass of the host: a read-only check
/// pass in which components prepare their graft operations, then a single
/// commit that applies them in order, then one poll of in-flight async
/// validators.
pub struct FormShell {
    runtime: StdRuntime,
    root: Control,
    options: ShellOptions,
}

impl FormShell {
    pub fn new(root: Control) -> Self {
        Self::with_options(root, ShellOptions::default())
    }

    pub fn with_options(root: Control, options: ShellOptions) -> Self {
        Self {
            runtime: StdRuntime::new(),
            root,
            options,
        }
    }

    pub fn root(&self) -> &Control {
        &self.root
    }

    pub fn runtime(&self) -> &StdRuntime {
        &self.runtime
    }

    pub fn runtime_handle(&self) -> RuntimeHandle {
        self.runtime.runtime_handle()
    }

    pub fn options(&self) -> ShellOptions {
        self.options
    }

    /// Whether anything asked for a tick since the last one.
    pub fn should_tick(&self) -> bool {
        self.runtime.take_frame_request() || self.runtime.has_pending_tasks()
    }

    pub fn tick(&mut self, check: impl FnOnce()) -> Result<TickReport, ShellError> {
        let before = self.root.value().fingerprint();
        check();
        if self.options.verify_checked {
            let after = self.root.value().fingerprint();
            if after != before {
                log::error!("form value changed while it was being checked");
                return Err(ShellError::ChangedAfterChecked { before, after });
            }
        }

        let committed = self.runtime.commit();
        self.runtime.take_frame_request();
        let pending_validations = self.root.poll_pending_validation();
        let report = TickReport {
            committed,
            pending_validations,
        };
        log::trace!("form tick: {report:?}");
        Ok(report)
    }

    /// Ticks with an empty check pass until nothing is left to commit or poll.
    /// Returns the number of ticks run.
    pub fn settle(&mut self) -> Result<usize, ShellError> {
        for ticks in 1..=self.options.max_settle_ticks {
            let report = self.tick(|| {})?;
            if report.is_idle() && !self.runtime.has_pending_tasks() {
                return Ok(ticks);
            }
        }
        log::debug!(
            "form still busy after {} ticks",
            self.options.max_settle_ticks
        );
        Err(ShellError::Unsettled {
            ticks: self.options.max_settle_ticks,
        })
    }
}

impl fmt::Debug for FormShell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FormShell")
            .field("root", &self.root)
            .field("runtime", &self.runtime)
            .field("options", &self.options)
            .finish()
    }
}
