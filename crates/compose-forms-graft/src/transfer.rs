use compose_forms_core::{Control, UpdateOptions};

/// Copies the state of the placeholder `original` onto `host`.
///
/// Steps run in a fixed order and later steps may overwrite earlier ones:
///
/// 1. A non-blank value is applied as a partial patch.
/// 2. Without a `disabled_override`, the enabled flag is mirrored.
/// 3. The sync validator replaces the host's, followed by a silent self-only revalidation.
/// 4. The async validator likewise.
pub fn copy_control_state(host: &Control, original: &Control, disabled_override: Option<bool>) {
    let value = original.value();
    if !value.is_blank() {
        host.patch_value(&value, UpdateOptions::default());
    }
    if disabled_override.is_none() {
        if original.is_enabled() {
            host.enable(UpdateOptions::default());
        } else {
            host.disable(UpdateOptions::default());
        }
    }
    if let Some(validator) = original.validator() {
        host.set_validator(validator);
        host.update_value_and_validity(UpdateOptions::silent_self());
    }
    if let Some(validator) = original.async_validator() {
        host.set_async_validator(validator);
        host.update_value_and_validity(UpdateOptions::silent_self());
    }
}
