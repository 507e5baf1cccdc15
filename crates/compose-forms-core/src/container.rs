//! Composite controls seen as slot containers.
//!
//! A [`Container`] is either keyed (a group, addressed by name) or indexed (an
//! array, addressed by position). Key-kind checks happen once, when a
//! [`ControlKey`] meets a container variant, instead of at every call site.

use std::fmt;

use crate::control::{Control, ControlKind, UpdateOptions};

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum ControlKey {
    Name(String),
    Index(usize),
}

impl ControlKey {
    pub fn kind(&self) -> KeyKind {
        match self {
            ControlKey::Name(_) => KeyKind::Name,
            ControlKey::Index(_) => KeyKind::Index,
        }
    }
}

impl fmt::Display for ControlKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ControlKey::Name(name) => write!(f, "{name:?}"),
            ControlKey::Index(index) => write!(f, "{index}"),
        }
    }
}

impl From<&str> for ControlKey {
    fn from(name: &str) -> Self {
        ControlKey::Name(name.to_owned())
    }
}

impl From<String> for ControlKey {
    fn from(name: String) -> Self {
        ControlKey::Name(name)
    }
}

impl From<usize> for ControlKey {
    fn from(index: usize) -> Self {
        ControlKey::Index(index)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum KeyKind {
    Name,
    Index,
}

impl fmt::Display for KeyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeyKind::Name => f.write_str("string name"),
            KeyKind::Index => f.write_str("integer index"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContainerError {
    KeyKindMismatch { key: ControlKey, expected: KeyKind },
    NoSuchEntry { key: ControlKey },
}

impl std::fmt::Display for ContainerError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ContainerError::KeyKindMismatch { key, expected } => {
                write!(f, "key {key} does not address this container, expected a {expected}")
            }
            ContainerError::NoSuchEntry { key } => {
                write!(f, "no control {key} in control container")
            }
        }
    }
}

impl std::error::Error for ContainerError {}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct KeyedContainer(Control);

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IndexedContainer(Control);

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Container {
    Keyed(KeyedContainer),
    Indexed(IndexedContainer),
}

impl Container {
    /// Views `control` as a container. Fields are not containers.
    pub fn resolve(control: &Control) -> Option<Container> {
        match control.inner().state.borrow().kind {
            ControlKind::Field => None,
            ControlKind::Group(_) => Some(Container::Keyed(KeyedContainer(control.clone()))),
            ControlKind::Array(_) => Some(Container::Indexed(IndexedContainer(control.clone()))),
        }
    }

    pub fn control(&self) -> &Control {
        match self {
            Container::Keyed(keyed) => &keyed.0,
            Container::Indexed(indexed) => &indexed.0,
        }
    }

    pub fn key_kind(&self) -> KeyKind {
        match self {
            Container::Keyed(_) => KeyKind::Name,
            Container::Indexed(_) => KeyKind::Index,
        }
    }

    /// Checks that `key` can address this container at all.
    pub fn check_key(&self, key: &ControlKey) -> Result<(), ContainerError> {
        if key.kind() == self.key_kind() {
            Ok(())
        } else {
            Err(ContainerError::KeyKindMismatch {
                key: key.clone(),
                expected: self.key_kind(),
            })
        }
    }

    pub fn get(&self, key: &ControlKey) -> Result<Control, ContainerError> {
        self.check_key(key)?;
        let found = match (self, key) {
            (Container::Keyed(keyed), ControlKey::Name(name)) => keyed.get(name),
            (Container::Indexed(indexed), ControlKey::Index(index)) => indexed.at(*index),
            _ => None,
        };
        found.ok_or_else(|| ContainerError::NoSuchEntry { key: key.clone() })
    }

    /// Puts `control` into the existing slot at `key` and returns the control
    /// it displaced.
    ///
    /// Only the reference changes: the displaced control keeps its state, and
    /// nothing is recomputed or emitted. Follow up with
    /// [`recompute`](crate::aggregate::recompute) on [`Container::control`].
    pub fn set_control(&self, key: &ControlKey, control: Control) -> Result<Control, ContainerError> {
        self.check_key(key)?;
        self.control()
            .replace_child(key, control)
            .ok_or_else(|| ContainerError::NoSuchEntry { key: key.clone() })
    }

    pub fn keys(&self) -> Vec<ControlKey> {
        self.control()
            .children()
            .into_iter()
            .map(|(key, _)| key)
            .collect()
    }

    pub fn len(&self) -> usize {
        self.control().children().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl KeyedContainer {
    pub fn control(&self) -> &Control {
        &self.0
    }

    pub fn get(&self, name: &str) -> Option<Control> {
        self.0.child(&ControlKey::Name(name.to_owned()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Adds a new slot. Returns `false` without changes if `name` is taken.
    pub fn add_control(&self, name: impl Into<String>, control: Control, options: UpdateOptions) -> bool {
        let added = self.0.insert_child(ControlKey::Name(name.into()), control);
        if added {
            self.0.update_value_and_validity(options);
        }
        added
    }

    pub fn remove_control(&self, name: &str, options: UpdateOptions) -> Option<Control> {
        let removed = self.0.remove_child(&ControlKey::Name(name.to_owned()));
        if removed.is_some() {
            self.0.update_value_and_validity(options);
        }
        removed
    }
}

impl IndexedContainer {
    pub fn control(&self) -> &Control {
        &self.0
    }

    pub fn at(&self, index: usize) -> Option<Control> {
        self.0.child(&ControlKey::Index(index))
    }

    pub fn len(&self) -> usize {
        self.0.children().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn push(&self, control: Control, options: UpdateOptions) {
        let end = self.len();
        self.insert(end, control, options);
    }

    /// Inserts at `index`, shifting later slots. Returns `false` past the end.
    pub fn insert(&self, index: usize, control: Control, options: UpdateOptions) -> bool {
        let inserted = self.0.insert_child(ControlKey::Index(index), control);
        if inserted {
            self.0.update_value_and_validity(options);
        }
        inserted
    }

    pub fn remove_at(&self, index: usize, options: UpdateOptions) -> Option<Control> {
        let removed = self.0.remove_child(&ControlKey::Index(index));
        if removed.is_some() {
            self.0.update_value_and_validity(options);
        }
        removed
    }
}
