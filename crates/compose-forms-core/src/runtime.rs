use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::fmt;
use std::rc::{Rc, Weak};
use std::sync::Arc;

use crate::platform::RuntimeScheduler;

type Task = Box<dyn FnOnce() + 'static>;

struct RuntimeInner {
    scheduler: Arc<dyn RuntimeScheduler>,
    needs_frame: Cell<bool>,
    pending_tasks: RefCell<VecDeque<Task>>,
    committing: Cell<bool>,
}

impl RuntimeInner {
    fn new(scheduler: Arc<dyn RuntimeScheduler>) -> Self {
        Self {
            scheduler,
            needs_frame: Cell::new(false),
            pending_tasks: RefCell::new(VecDeque::new()),
            committing: Cell::new(false),
        }
    }

    fn schedule(&self) {
        self.needs_frame.set(true);
        self.scheduler.schedule_frame();
    }

    fn enqueue_task(&self, task: Task) {
        self.pending_tasks.borrow_mut().push_back(task);
        if !self.committing.get() {
            self.schedule();
        }
    }

    /// Runs queued tasks in FIFO order until the queue is empty, including
    /// tasks queued by the tasks themselves.
    fn commit(&self) -> usize {
        if self.committing.replace(true) {
            return 0;
        }
        let mut ran = 0;
        loop {
            let next = self.pending_tasks.borrow_mut().pop_front();
            let Some(task) = next else {
                break;
            };
            task();
            ran += 1;
        }
        self.committing.set(false);
        self.needs_frame.set(false);
        ran
    }

    fn has_tasks(&self) -> bool {
        !self.pending_tasks.borrow().is_empty()
    }
}

/// Owner of the deferred-commit queue.
///
/// Form operations that must not mutate the tree in the middle of the host's
/// update pass are queued here with [`RuntimeHandle::defer`]. The host calls
/// [`Runtime::commit`] once per tick, after every read-only pass for that tick
/// has finished.
#[derive(Clone)]
pub struct Runtime {
    inner: Rc<RuntimeInner>,
}

impl Runtime {
    pub fn new(scheduler: Arc<dyn RuntimeScheduler>) -> Self {
        Self {
            inner: Rc::new(RuntimeInner::new(scheduler)),
        }
    }

    pub fn handle(&self) -> RuntimeHandle {
        RuntimeHandle(Rc::downgrade(&self.inner))
    }

    pub fn needs_frame(&self) -> bool {
        self.inner.needs_frame.get()
    }

    pub fn has_pending_tasks(&self) -> bool {
        self.inner.has_tasks()
    }

    /// Runs every deferred task and returns how many ran. A nested call from
    /// inside a task returns `0`; the outer commit picks up the new work.
    pub fn commit(&self) -> usize {
        self.inner.commit()
    }
}

impl Default for Runtime {
    fn default() -> Self {
        Self::new(Arc::new(DefaultScheduler))
    }
}

impl fmt::Debug for Runtime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Runtime")
            .field("needs_frame", &self.inner.needs_frame.get())
            .field("pending_tasks", &self.inner.pending_tasks.borrow().len())
            .finish()
    }
}

#[derive(Default)]
pub struct DefaultScheduler;

impl RuntimeScheduler for DefaultScheduler {
    fn schedule_frame(&self) {}
}

#[cfg(test)]
#[derive(Default)]
pub struct TestScheduler {
    frames: std::sync::atomic::AtomicUsize,
}

#[cfg(test)]
impl TestScheduler {
    pub fn frames(&self) -> usize {
        self.frames.load(std::sync::atomic::Ordering::SeqCst)
    }
}

#[cfg(test)]
impl RuntimeScheduler for TestScheduler {
    fn schedule_frame(&self) {
        self.frames
            .fetch_add(1, std::sync::atomic::Ordering::SeqCst);
    }
}

/// Weak handle to a [`Runtime`], held by anything that defers work.
#[derive(Clone)]
pub struct RuntimeHandle(pub(crate) Weak<RuntimeInner>);

impl RuntimeHandle {
    /// Queues `task` for the next commit. Once the runtime is gone there is
    /// no commit left to wait for, so the task runs immediately.
    pub fn defer(&self, task: impl FnOnce() + 'static) {
        if let Some(inner) = self.0.upgrade() {
            inner.enqueue_task(Box::new(task));
        } else {
            task();
        }
    }

    pub fn commit(&self) -> usize {
        self.0.upgrade().map(|inner| inner.commit()).unwrap_or(0)
    }

    pub fn is_alive(&self) -> bool {
        self.0.strong_count() > 0
    }
}

impl fmt::Debug for RuntimeHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("RuntimeHandle").field(&self.is_alive()).finish()
    }
}
