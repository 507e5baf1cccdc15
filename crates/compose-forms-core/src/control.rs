use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::task::{Context, Poll};

use indexmap::IndexMap;

use crate::aggregate::recompute;
use crate::container::ControlKey;
use crate::validators::{AsyncValidator, ValidationErrors, ValidationFuture, Validator};
use crate::value::FormValue;

pub type ControlId = usize;
pub(crate) type SubscriptionId = usize;

static NEXT_CONTROL_ID: AtomicUsize = AtomicUsize::new(1);
static NEXT_SUBSCRIPTION_ID: AtomicUsize = AtomicUsize::new(1);

fn next_control_id() -> ControlId {
    NEXT_CONTROL_ID.fetch_add(1, Ordering::Relaxed)
}

fn next_subscription_id() -> SubscriptionId {
    NEXT_SUBSCRIPTION_ID.fetch_add(1, Ordering::Relaxed)
}

/// Validity computed from a control's own validators and its enabled children.
///
/// `Invalid` carries the reasons reported by the control's own validators; the
/// set is empty when the control is invalid only because a child is.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum Validity {
    #[default]
    Valid,
    Invalid(ValidationErrors),
    Pending,
}

/// Validity folded together with the enabled flag, as observers see it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ControlStatus {
    Valid,
    Invalid,
    Pending,
    Disabled,
}

#[derive(Clone, Debug, PartialEq)]
pub enum ControlEvent {
    ValueChanged(FormValue),
    StatusChanged(ControlStatus),
}

/// How far an update travels and whether observers hear about it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct UpdateOptions {
    /// Stop after this control instead of recomputing its ancestors.
    pub only_self: bool,
    /// Notify subscribers of value and status changes.
    pub emit_event: bool,
}

impl Default for UpdateOptions {
    fn default() -> Self {
        Self {
            only_self: false,
            emit_event: true,
        }
    }
}

impl UpdateOptions {
    /// Recompute this control and its ancestors without notifying anyone.
    pub fn silent() -> Self {
        Self {
            only_self: false,
            emit_event: false,
        }
    }

    /// Recompute this control only, without notifying anyone.
    pub fn silent_self() -> Self {
        Self {
            only_self: true,
            emit_event: false,
        }
    }

    fn for_children(self) -> Self {
        Self {
            only_self: true,
            emit_event: self.emit_event,
        }
    }
}

pub(crate) enum ControlKind {
    Field,
    Group(IndexMap<String, Control>),
    Array(Vec<Control>),
}

pub(crate) struct ControlState {
    pub(crate) kind: ControlKind,
    /// Own value for fields, cached aggregate for composites.
    pub(crate) value: FormValue,
    pub(crate) self_disabled: bool,
    pub(crate) enabled: bool,
    pub(crate) validator: Option<Validator>,
    pub(crate) async_validator: Option<AsyncValidator>,
    pub(crate) validity: Validity,
    pending: Option<ValidationFuture>,
    parent: Weak<ControlInner>,
}

type Listener = Rc<dyn Fn(&ControlEvent)>;

pub(crate) struct ControlInner {
    id: ControlId,
    pub(crate) state: RefCell<ControlState>,
    listeners: RefCell<Vec<(SubscriptionId, Listener)>>,
}

/// A node of the form tree.
///
/// `Control` is a shared handle: clones refer to the same node, and containers
/// hold handles rather than copies. Use [`Control::ptr_eq`] to compare identity.
#[derive(Clone)]
pub struct Control {
    inner: Rc<ControlInner>,
}

impl Control {
    fn with_kind(kind: ControlKind, value: FormValue) -> Self {
        Self {
            inner: Rc::new(ControlInner {
                id: next_control_id(),
                state: RefCell::new(ControlState {
                    kind,
                    value,
                    self_disabled: false,
                    enabled: true,
                    validator: None,
                    async_validator: None,
                    validity: Validity::Valid,
                    pending: None,
                    parent: Weak::new(),
                }),
                listeners: RefCell::new(Vec::new()),
            }),
        }
    }

    pub fn field(value: impl Into<FormValue>) -> Self {
        let control = Self::with_kind(ControlKind::Field, value.into());
        control.update_value_and_validity(UpdateOptions::silent_self());
        control
    }

    /// Keyed composite. Later duplicates of a key replace earlier ones.
    pub fn group<K, I>(children: I) -> Self
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, Control)>,
    {
        let children: IndexMap<String, Control> = children
            .into_iter()
            .map(|(key, control)| (key.into(), control))
            .collect();
        let control = Self::with_kind(ControlKind::Group(children), FormValue::Null);
        control.adopt_children();
        control.update_value_and_validity(UpdateOptions::silent_self());
        control
    }

    /// Indexed composite.
    pub fn array(children: impl IntoIterator<Item = Control>) -> Self {
        let control = Self::with_kind(
            ControlKind::Array(children.into_iter().collect()),
            FormValue::Null,
        );
        control.adopt_children();
        control.update_value_and_validity(UpdateOptions::silent_self());
        control
    }

    pub fn with_validator(self, validator: Validator) -> Self {
        self.set_validator(validator);
        self.update_value_and_validity(UpdateOptions::silent_self());
        self
    }

    pub fn with_async_validator(self, validator: AsyncValidator) -> Self {
        self.set_async_validator(validator);
        self.update_value_and_validity(UpdateOptions::silent_self());
        self
    }

    pub fn id(&self) -> ControlId {
        self.inner.id
    }

    pub fn ptr_eq(&self, other: &Control) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    pub fn is_composite(&self) -> bool {
        !matches!(self.inner.state.borrow().kind, ControlKind::Field)
    }

    /// Aggregate value. Composites leave out disabled children unless every
    /// child is disabled.
    pub fn value(&self) -> FormValue {
        self.inner.state.borrow().value.clone()
    }

    /// Value including disabled children.
    pub fn raw_value(&self) -> FormValue {
        let children = self.children();
        let state = self.inner.state.borrow();
        match &state.kind {
            ControlKind::Field => state.value.clone(),
            ControlKind::Group(_) => FormValue::Group(
                children
                    .iter()
                    .filter_map(|(key, child)| match key {
                        ControlKey::Name(name) => Some((name.clone(), child.raw_value())),
                        ControlKey::Index(_) => None,
                    })
                    .collect(),
            ),
            ControlKind::Array(_) => {
                FormValue::List(children.iter().map(|(_, child)| child.raw_value()).collect())
            }
        }
    }

    pub fn validity(&self) -> Validity {
        self.inner.state.borrow().validity.clone()
    }

    /// Errors reported by this control's own validators.
    pub fn errors(&self) -> Option<ValidationErrors> {
        match &self.inner.state.borrow().validity {
            Validity::Invalid(errors) if !errors.is_empty() => Some(errors.clone()),
            _ => None,
        }
    }

    pub fn status(&self) -> ControlStatus {
        let state = self.inner.state.borrow();
        if !state.enabled {
            return ControlStatus::Disabled;
        }
        match state.validity {
            Validity::Valid => ControlStatus::Valid,
            Validity::Invalid(_) => ControlStatus::Invalid,
            Validity::Pending => ControlStatus::Pending,
        }
    }

    pub fn is_valid(&self) -> bool {
        self.status() == ControlStatus::Valid
    }

    pub fn is_invalid(&self) -> bool {
        self.status() == ControlStatus::Invalid
    }

    pub fn is_pending(&self) -> bool {
        self.status() == ControlStatus::Pending
    }

    pub fn is_enabled(&self) -> bool {
        self.inner.state.borrow().enabled
    }

    pub fn is_disabled(&self) -> bool {
        !self.is_enabled()
    }

    pub fn validator(&self) -> Option<Validator> {
        self.inner.state.borrow().validator.clone()
    }

    pub fn async_validator(&self) -> Option<AsyncValidator> {
        self.inner.state.borrow().async_validator.clone()
    }

    /// Replaces the synchronous validator. Takes effect on the next update.
    pub fn set_validator(&self, validator: Validator) {
        self.inner.state.borrow_mut().validator = Some(validator);
    }

    pub fn clear_validator(&self) {
        self.inner.state.borrow_mut().validator = None;
    }

    /// Replaces the asynchronous validator. Takes effect on the next update.
    pub fn set_async_validator(&self, validator: AsyncValidator) {
        self.inner.state.borrow_mut().async_validator = Some(validator);
    }

    pub fn clear_async_validator(&self) {
        self.inner.state.borrow_mut().async_validator = None;
    }

    pub fn parent(&self) -> Option<Control> {
        self.inner
            .state
            .borrow()
            .parent
            .upgrade()
            .map(|inner| Control { inner })
    }

    /// Direct children in slot order. Empty for fields.
    pub fn children(&self) -> Vec<(ControlKey, Control)> {
        match &self.inner.state.borrow().kind {
            ControlKind::Field => Vec::new(),
            ControlKind::Group(map) => map
                .iter()
                .map(|(key, control)| (ControlKey::Name(key.clone()), control.clone()))
                .collect(),
            ControlKind::Array(items) => items
                .iter()
                .enumerate()
                .map(|(index, control)| (ControlKey::Index(index), control.clone()))
                .collect(),
        }
    }

    /// Direct child by key; the key kind must match the composite kind.
    pub fn child(&self, key: &ControlKey) -> Option<Control> {
        match (&self.inner.state.borrow().kind, key) {
            (ControlKind::Group(map), ControlKey::Name(name)) => map.get(name).cloned(),
            (ControlKind::Array(items), ControlKey::Index(index)) => items.get(*index).cloned(),
            _ => None,
        }
    }

    /// Walks a dotted path such as `"person.name"` or `"items.0"`.
    pub fn get(&self, path: &str) -> Option<Control> {
        path.split('.')
            .filter(|segment| !segment.is_empty())
            .try_fold(self.clone(), |current, segment| {
                let key = match &current.inner.state.borrow().kind {
                    ControlKind::Field => return None,
                    ControlKind::Group(_) => ControlKey::Name(segment.to_owned()),
                    ControlKind::Array(_) => ControlKey::Index(segment.parse().ok()?),
                };
                current.child(&key)
            })
    }

    /// Replaces the value. Composites forward each entry to the matching child
    /// and reset children without an entry to `Null`.
    pub fn set_value(&self, value: impl Into<FormValue>, options: UpdateOptions) {
        let value = value.into();
        let children = self.children();
        if !self.is_composite() {
            self.inner.state.borrow_mut().value = value;
        } else {
            for (key, child) in children {
                let entry = match &key {
                    ControlKey::Name(name) => value.get(name),
                    ControlKey::Index(index) => value.at(*index),
                };
                child.set_value(
                    entry.cloned().unwrap_or_default(),
                    options.for_children(),
                );
            }
        }
        self.update_value_and_validity(options);
    }

    /// Partial update: only entries present in `value` that match an existing
    /// child are written. Missing entries keep their current value and extra
    /// entries are ignored. A composite given a value of the wrong shape is
    /// left alone.
    pub fn patch_value(&self, value: &FormValue, options: UpdateOptions) {
        let kind_matches = {
            let state = self.inner.state.borrow();
            match (&state.kind, value) {
                (ControlKind::Field, _) => true,
                (ControlKind::Group(_), FormValue::Group(_)) => true,
                (ControlKind::Array(_), FormValue::List(_)) => true,
                _ => false,
            }
        };
        if !kind_matches {
            return;
        }
        match value {
            FormValue::Group(entries) if self.is_composite() => {
                for (key, entry) in entries {
                    if let Some(child) = self.child(&ControlKey::Name(key.clone())) {
                        child.patch_value(entry, options.for_children());
                    }
                }
            }
            FormValue::List(items) if self.is_composite() => {
                for (index, entry) in items.iter().enumerate() {
                    if let Some(child) = self.child(&ControlKey::Index(index)) {
                        child.patch_value(entry, options.for_children());
                    }
                }
            }
            _ => self.inner.state.borrow_mut().value = value.clone(),
        }
        self.update_value_and_validity(options);
    }

    /// Enables this control and its whole subtree.
    pub fn enable(&self, options: UpdateOptions) {
        self.set_enabled_tree(true);
        self.update_value_and_validity(options);
    }

    /// Disables this control and its whole subtree. Disabled controls report
    /// no errors and drop out of their parent's value and validity.
    pub fn disable(&self, options: UpdateOptions) {
        self.set_enabled_tree(false);
        self.update_value_and_validity(options);
    }

    fn set_enabled_tree(&self, enabled: bool) {
        for (_, child) in self.children() {
            child.set_enabled_tree(enabled);
        }
        self.inner.state.borrow_mut().self_disabled = !enabled;
        recompute(self).apply(self, UpdateOptions::silent_self());
    }

    /// Recomputes value and validity from scratch, then walks up to the
    /// ancestors unless `options.only_self` is set.
    pub fn update_value_and_validity(&self, options: UpdateOptions) {
        recompute(self).apply(self, options);
    }

    /// Registers a listener for value and status changes. The listener stays
    /// registered until the returned [`Subscription`] is dropped or cancelled.
    pub fn subscribe(&self, listener: impl Fn(&ControlEvent) + 'static) -> Subscription {
        let id = next_subscription_id();
        self.inner
            .listeners
            .borrow_mut()
            .push((id, Rc::new(listener)));
        Subscription {
            control: Rc::downgrade(&self.inner),
            id: Some(id),
        }
    }

    /// Polls in-flight async validations in this subtree once. Returns `true`
    /// while any of them is still pending.
    pub fn poll_pending_validation(&self) -> bool {
        let mut still_pending = false;
        for (_, child) in self.children() {
            still_pending |= child.poll_pending_validation();
        }
        let future = self.inner.state.borrow_mut().pending.take();
        if let Some(mut future) = future {
            let mut cx = Context::from_waker(futures_task::noop_waker_ref());
            match future.as_mut().poll(&mut cx) {
                Poll::Ready(result) => {
                    self.settle_async(result);
                }
                Poll::Pending => {
                    self.inner.state.borrow_mut().pending = Some(future);
                    still_pending = true;
                }
            }
        }
        still_pending
    }

    fn settle_async(&self, result: Option<ValidationErrors>) {
        {
            let mut state = self.inner.state.borrow_mut();
            state.validity = match result.filter(|errors| !errors.is_empty()) {
                Some(errors) => Validity::Invalid(errors),
                None => Validity::Valid,
            };
        }
        self.emit(&ControlEvent::StatusChanged(self.status()));
        if let Some(parent) = self.parent() {
            parent.update_value_and_validity(UpdateOptions::default());
        }
    }

    /// Starts the async validator against `value` and polls it once.
    pub(crate) fn start_async_validation(&self, validator: &AsyncValidator, value: FormValue) {
        let mut future = validator.validate(value);
        let mut cx = Context::from_waker(futures_task::noop_waker_ref());
        let poll = future.as_mut().poll(&mut cx);
        let mut state = self.inner.state.borrow_mut();
        match poll {
            Poll::Ready(result) => {
                state.validity = match result.filter(|errors| !errors.is_empty()) {
                    Some(errors) => Validity::Invalid(errors),
                    None => Validity::Valid,
                };
                state.pending = None;
            }
            Poll::Pending => {
                state.validity = Validity::Pending;
                state.pending = Some(future);
            }
        }
    }

    pub(crate) fn cancel_async_validation(&self) {
        self.inner.state.borrow_mut().pending = None;
    }

    pub(crate) fn emit(&self, event: &ControlEvent) {
        let listeners: Vec<Listener> = self
            .inner
            .listeners
            .borrow()
            .iter()
            .map(|(_, listener)| Rc::clone(listener))
            .collect();
        for listener in listeners {
            listener(event);
        }
    }

    pub(crate) fn set_parent(&self, parent: &Control) {
        self.inner.state.borrow_mut().parent = Rc::downgrade(&parent.inner);
    }

    /// Clears the parent link if it still points at `parent`.
    pub(crate) fn unlink_from(&self, parent: &Control) {
        let mut state = self.inner.state.borrow_mut();
        if std::ptr::eq(state.parent.as_ptr(), Rc::as_ptr(&parent.inner)) {
            state.parent = Weak::new();
        }
    }

    fn adopt_children(&self) {
        for (_, child) in self.children() {
            child.set_parent(self);
        }
    }

    /// Swaps the child at `key`, keeping parent links consistent. Returns the
    /// previous occupant, or `None` when there is no such slot.
    pub(crate) fn replace_child(&self, key: &ControlKey, control: Control) -> Option<Control> {
        let previous = {
            let mut state = self.inner.state.borrow_mut();
            match (&mut state.kind, key) {
                (ControlKind::Group(map), ControlKey::Name(name)) => map
                    .get_mut(name)
                    .map(|slot| std::mem::replace(slot, control.clone())),
                (ControlKind::Array(items), ControlKey::Index(index)) => items
                    .get_mut(*index)
                    .map(|slot| std::mem::replace(slot, control.clone())),
                _ => None,
            }
        }?;
        if !previous.ptr_eq(&control) {
            previous.unlink_from(self);
        }
        control.set_parent(self);
        Some(previous)
    }

    pub(crate) fn insert_child(&self, key: ControlKey, control: Control) -> bool {
        let inserted = {
            let mut state = self.inner.state.borrow_mut();
            match (&mut state.kind, key) {
                (ControlKind::Group(map), ControlKey::Name(name)) => {
                    if map.contains_key(&name) {
                        false
                    } else {
                        map.insert(name, control.clone());
                        true
                    }
                }
                (ControlKind::Array(items), ControlKey::Index(index)) if index <= items.len() => {
                    items.insert(index, control.clone());
                    true
                }
                _ => false,
            }
        };
        if inserted {
            control.set_parent(self);
        }
        inserted
    }

    pub(crate) fn remove_child(&self, key: &ControlKey) -> Option<Control> {
        let removed = {
            let mut state = self.inner.state.borrow_mut();
            match (&mut state.kind, key) {
                (ControlKind::Group(map), ControlKey::Name(name)) => map.shift_remove(name),
                (ControlKind::Array(items), ControlKey::Index(index)) if *index < items.len() => {
                    Some(items.remove(*index))
                }
                _ => None,
            }
        }?;
        removed.unlink_from(self);
        Some(removed)
    }

    pub(crate) fn inner(&self) -> &ControlInner {
        &self.inner
    }
}

impl PartialEq for Control {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl Eq for Control {}

impl fmt::Debug for Control {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.inner.state.borrow();
        let kind = match state.kind {
            ControlKind::Field => "field",
            ControlKind::Group(_) => "group",
            ControlKind::Array(_) => "array",
        };
        f.debug_struct("Control")
            .field("id", &self.inner.id)
            .field("kind", &kind)
            .field("value", &state.value)
            .field("enabled", &state.enabled)
            .field("validity", &state.validity)
            .finish()
    }
}

/// Keeps a [`Control::subscribe`] listener registered.
pub struct Subscription {
    control: Weak<ControlInner>,
    id: Option<SubscriptionId>,
}

impl Subscription {
    pub fn cancel(mut self) {
        self.unregister();
    }

    fn unregister(&mut self) {
        if let (Some(id), Some(inner)) = (self.id.take(), self.control.upgrade()) {
            inner
                .listeners
                .borrow_mut()
                .retain(|(listener_id, _)| *listener_id != id);
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.unregister();
    }
}
