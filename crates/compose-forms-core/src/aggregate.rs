//! Aggregate recomputation.
//!
//! [`recompute`] only reads: it derives a control's value, enabled flag and
//! validity from its own state and its children. Nothing changes until the
//! caller hands the result to [`AggregateState::apply`] with options that say
//! how far the update travels and whether observers are told. A silent
//! recompute is an `apply` with `emit_event: false`.

use crate::container::ControlKey;
use crate::control::{Control, ControlEvent, ControlKind, UpdateOptions, Validity};
use crate::validators::ValidationErrors;
use crate::value::FormValue;

#[derive(Clone, Debug, PartialEq)]
pub struct AggregateState {
    pub value: FormValue,
    pub enabled: bool,
    pub validity: Validity,
}

impl AggregateState {
    /// Stores the state on `control`, starts its async validator when the
    /// synchronous result is valid, then notifies and propagates per `options`.
    pub fn apply(self, control: &Control, options: UpdateOptions) {
        let async_validator = {
            let mut state = control.inner().state.borrow_mut();
            state.value = self.value.clone();
            state.enabled = self.enabled;
            state.validity = self.validity.clone();
            state.async_validator.clone()
        };
        control.cancel_async_validation();
        if self.enabled && self.validity == Validity::Valid {
            if let Some(validator) = async_validator {
                control.start_async_validation(&validator, self.value.clone());
            }
        }
        if options.emit_event {
            control.emit(&ControlEvent::ValueChanged(self.value));
            control.emit(&ControlEvent::StatusChanged(control.status()));
        }
        if !options.only_self {
            if let Some(parent) = control.parent() {
                recompute(&parent).apply(&parent, options);
            }
        }
    }
}

/// Derives the aggregate state of `control` from its current children.
pub fn recompute(control: &Control) -> AggregateState {
    let children = control.children();
    let (own_value, self_disabled, validator, is_field) = {
        let state = control.inner().state.borrow();
        (
            state.value.clone(),
            state.self_disabled,
            state.validator.clone(),
            matches!(state.kind, ControlKind::Field),
        )
    };

    let enabled = if children.is_empty() {
        !self_disabled
    } else {
        children.iter().any(|(_, child)| child.is_enabled())
    };

    let value = if is_field {
        own_value
    } else {
        composite_value(control, &children)
    };

    if !enabled {
        return AggregateState {
            value,
            enabled,
            validity: Validity::Valid,
        };
    }

    if let Some(errors) = validator.and_then(|validator| validator.validate(&value)) {
        return AggregateState {
            value,
            enabled,
            validity: Validity::Invalid(errors),
        };
    }

    let live: Vec<&Control> = children
        .iter()
        .map(|(_, child)| child)
        .filter(|child| child.is_enabled())
        .collect();
    let validity = if live.iter().any(|child| child.is_pending()) {
        Validity::Pending
    } else if live.iter().any(|child| child.is_invalid()) {
        Validity::Invalid(ValidationErrors::new())
    } else {
        Validity::Valid
    };

    AggregateState {
        value,
        enabled,
        validity,
    }
}

fn composite_value(control: &Control, children: &[(ControlKey, Control)]) -> FormValue {
    let all_disabled = !children.is_empty() && children.iter().all(|(_, c)| c.is_disabled());
    let included = children
        .iter()
        .filter(|(_, child)| all_disabled || child.is_enabled());
    let is_array = matches!(control.inner().state.borrow().kind, ControlKind::Array(_));
    if is_array {
        FormValue::List(included.map(|(_, child)| child.value()).collect())
    } else {
        FormValue::Group(
            included
                .filter_map(|(key, child)| match key {
                    ControlKey::Name(name) => Some((name.clone(), child.value())),
                    ControlKey::Index(_) => None,
                })
                .collect(),
        )
    }
}
