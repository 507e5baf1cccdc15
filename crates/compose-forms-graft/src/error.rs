use compose_forms_core::{ContainerError, ControlKey, KeyKind};

/// Configuration errors raised while preparing an attach.
///
/// Every variant is detected before the form tree is touched, so a failed
/// attach leaves the ambient container exactly as it was.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GraftError {
    /// The ambient parent is a field, not a keyed or indexed container.
    UnsupportedContainer,
    KeyKindMismatch { key: ControlKey, expected: KeyKind },
    NoSuchEntry { key: ControlKey },
}

impl std::fmt::Display for GraftError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GraftError::UnsupportedContainer => {
                f.write_str("unsupported control container: expected a group or an array")
            }
            GraftError::KeyKindMismatch { key, expected } => {
                write!(f, "graft key {key} must be a {expected} for this container")
            }
            GraftError::NoSuchEntry { key } => write!(f, "no control {key} in control container"),
        }
    }
}

impl std::error::Error for GraftError {}

impl From<ContainerError> for GraftError {
    fn from(err: ContainerError) -> Self {
        match err {
            ContainerError::KeyKindMismatch { key, expected } => {
                GraftError::KeyKindMismatch { key, expected }
            }
            ContainerError::NoSuchEntry { key } => GraftError::NoSuchEntry { key },
        }
    }
}
