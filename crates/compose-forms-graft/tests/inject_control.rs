use std::rc::Rc;

use compose_forms_core::{
    Control, ControlKey, FormValue, KeyKind, UpdateOptions, ValidationErrors, Validator,
};
use compose_forms_graft::{GraftError, HostControl};
use compose_forms_testing::{CompositeForm, FormHarness, HarnessError, NameForm, PersonForm};

fn person_slot(value: FormValue) -> Control {
    Control::group([("person", Control::field(value))])
}

fn text_at(form: &Control, path: &str) -> FormValue {
    form.get(path).map(|control| control.value()).unwrap_or_default()
}

#[test]
fn typing_into_the_grafted_form_reaches_the_root() {
    let form = person_slot(FormValue::Null);
    let mut harness = FormHarness::new(form.clone());
    harness.mount("person", Rc::new(PersonForm::new())).unwrap();
    assert!(form.is_invalid());

    harness.type_into("person.name", "Robert Speedwagon").unwrap();
    assert_eq!(
        form.value().get("person").and_then(|person| person.get("name")),
        Some(&FormValue::text("Robert Speedwagon"))
    );
    assert!(form.is_invalid());

    harness.type_into("person.age", "23").unwrap();
    assert_eq!(
        form.value().get("person").and_then(|person| person.get("age")),
        Some(&FormValue::text("23"))
    );
    assert!(form.is_valid());
}

#[test]
fn disabled_input_disables_the_grafted_control() {
    let form = person_slot(FormValue::Null);
    let mut harness = FormHarness::new(form.clone());
    harness
        .mount_disabled("person", Rc::new(PersonForm::new()), true)
        .unwrap();
    assert!(form.get("person").unwrap().is_disabled());
}

#[test]
fn existing_value_is_copied() {
    let form = person_slot(FormValue::group([("name", "Bobo"), ("age", "25")]));
    let mut harness = FormHarness::new(form.clone());
    harness.mount("person", Rc::new(PersonForm::new())).unwrap();

    assert_eq!(text_at(&form, "person.name"), FormValue::text("Bobo"));
    assert_eq!(text_at(&form, "person.age"), FormValue::text("25"));
    assert!(form.is_valid());
}

#[test]
fn missing_values_keep_their_defaults() {
    let form = person_slot(FormValue::group([("name", "Bobo")]));
    let mut harness = FormHarness::new(form.clone());
    harness.mount("person", Rc::new(PersonForm::new())).unwrap();

    assert_eq!(text_at(&form, "person.name"), FormValue::text("Bobo"));
    assert_eq!(text_at(&form, "person.age"), FormValue::text(""));
    assert!(form.is_invalid());
}

#[test]
fn extra_values_are_ignored() {
    let form = person_slot(FormValue::group([
        ("name", FormValue::text("Bobo")),
        ("age", FormValue::from(25)),
        ("height", FormValue::from(200)),
    ]));
    let mut harness = FormHarness::new(form.clone());
    harness.mount("person", Rc::new(PersonForm::new())).unwrap();

    assert_eq!(text_at(&form, "person.name"), FormValue::text("Bobo"));
    assert_eq!(text_at(&form, "person.age"), FormValue::from(25));
    assert!(form.get("person.height").is_none());
    assert!(form.is_valid());
}

#[test]
fn existing_validators_are_copied() {
    let always_bad = Validator::new(|_| Some(ValidationErrors::single("alwaysBad")));
    let form = Control::group([(
        "person",
        Control::field(FormValue::group([("name", "Bobo"), ("age", "25")]))
            .with_validator(always_bad),
    )]);
    let mut harness = FormHarness::new(form.clone());
    harness.mount("person", Rc::new(PersonForm::new())).unwrap();

    assert_eq!(text_at(&form, "person.name"), FormValue::text("Bobo"));
    assert_eq!(text_at(&form, "person.age"), FormValue::text("25"));
    assert!(form.is_invalid());
    assert!(form.get("person").unwrap().errors().unwrap().contains("alwaysBad"));
}

#[test]
fn missing_control_is_a_configuration_error() {
    let form = person_slot(FormValue::Null);
    let mut harness = FormHarness::new(form.clone());
    let placeholder = form.get("person").unwrap();

    let err = harness.mount("p", Rc::new(PersonForm::new())).unwrap_err();
    assert_eq!(
        err,
        HarnessError::Graft(GraftError::NoSuchEntry {
            key: ControlKey::from("p")
        })
    );
    assert_eq!(err.to_string(), "no control \"p\" in control container");
    assert!(form.get("person").unwrap().ptr_eq(&placeholder));
}

#[test]
fn field_roots_are_rejected() {
    let mut harness = FormHarness::new(Control::field(FormValue::Null));
    assert_eq!(
        harness.mount("person", Rc::new(PersonForm::new())),
        Err(HarnessError::Graft(GraftError::UnsupportedContainer))
    );
}

#[test]
fn arrays_take_integer_keys() {
    let first = Control::field(FormValue::group([("name", "Bobo")]));
    let form = Control::array([first.clone(), Control::field("second")]);
    let mut harness = FormHarness::new(form.clone());

    assert_eq!(
        harness.mount("person", Rc::new(NameForm::new())),
        Err(HarnessError::Graft(GraftError::KeyKindMismatch {
            key: ControlKey::from("person"),
            expected: KeyKind::Index,
        }))
    );

    let id = harness.mount(0usize, Rc::new(NameForm::new())).unwrap();
    assert_eq!(
        form.value(),
        FormValue::list([
            FormValue::group([("name", "Bobo")]),
            FormValue::text("second")
        ])
    );
    assert!(form.is_valid());

    harness.type_into("0.name", "").unwrap();
    assert!(form.is_invalid());

    harness.unmount(id).unwrap();
    assert!(form.get("0").unwrap().ptr_eq(&first));
    assert!(form.is_valid());
}

mod composite {
    use super::*;

    fn data_slot(value: FormValue) -> Control {
        Control::group([("data", Control::field(value))])
    }

    fn populated() -> FormValue {
        FormValue::group([
            ("type", FormValue::text("foo")),
            (
                "person",
                FormValue::group([
                    ("name", FormValue::text("Robert")),
                    ("age", FormValue::from(25)),
                ]),
            ),
        ])
    }

    #[test]
    fn nothing_is_mounted_without_a_type() {
        let form = data_slot(FormValue::Null);
        let mut harness = FormHarness::new(form.clone());
        let composite = Rc::new(CompositeForm::new(harness.runtime_handle()));
        harness.mount("data", composite.clone()).unwrap();
        harness.settle().unwrap();

        assert!(composite.person_host().is_none());
        assert!(form.get("data.person.name").is_none());
        assert!(form.is_invalid());
    }

    #[test]
    fn selecting_a_type_mounts_the_sub_form() {
        let form = data_slot(FormValue::Null);
        let mut harness = FormHarness::new(form.clone());
        let composite = Rc::new(CompositeForm::new(harness.runtime_handle()));
        harness.mount("data", composite.clone()).unwrap();

        harness.type_into("data.type", "foo").unwrap();
        harness.settle().unwrap();
        assert_eq!(composite.mounted_type().as_deref(), Some("foo"));
        assert!(form.is_invalid());

        harness.type_into("data.person.name", "Robert Speedwagon").unwrap();
        assert_eq!(
            text_at(&form, "data.person.name"),
            FormValue::text("Robert Speedwagon")
        );
        assert!(form.is_invalid());

        harness.type_into("data.person.age", "23").unwrap();
        assert_eq!(text_at(&form, "data.person.age"), FormValue::text("23"));
        assert!(form.is_valid());
    }

    #[test]
    fn populated_form_fills_the_sub_form() {
        let form = data_slot(populated());
        let mut harness = FormHarness::new(form.clone());
        let composite = Rc::new(CompositeForm::new(harness.runtime_handle()));
        harness.mount("data", composite.clone()).unwrap();
        harness.settle().unwrap();

        assert_eq!(text_at(&form, "data.type"), FormValue::text("foo"));
        let person = composite.person_host().unwrap();
        assert!(form.get("data.person").unwrap().ptr_eq(&person));
        assert_eq!(text_at(&person, "name"), FormValue::text("Robert"));
        assert_eq!(text_at(&person, "age"), FormValue::from(25));
        assert!(form.is_valid());
    }

    #[test]
    fn switching_sub_forms_keeps_the_name() {
        let form = data_slot(populated());
        let mut harness = FormHarness::new(form.clone());
        let composite = Rc::new(CompositeForm::new(harness.runtime_handle()));
        harness.mount("data", composite.clone()).unwrap();
        harness.settle().unwrap();
        let person_form = composite.person_host().unwrap();

        harness.type_into("data.type", "bar").unwrap();
        harness.settle().unwrap();

        assert_eq!(composite.mounted_type().as_deref(), Some("bar"));
        let name_form = composite.person_host().unwrap();
        assert!(!name_form.ptr_eq(&person_form));
        assert!(form.get("data.person").unwrap().ptr_eq(&name_form));
        assert!(form.get("data.person.age").is_none());
        assert_eq!(text_at(&name_form, "name"), FormValue::text("Robert"));
        assert!(name_form.get("name").unwrap().is_enabled());
    }

    #[test]
    fn disabled_form_stays_disabled_across_switches() {
        let form = data_slot(populated());
        form.disable(UpdateOptions::default());
        let mut harness = FormHarness::new(form.clone());
        let composite = Rc::new(CompositeForm::new(harness.runtime_handle()));
        harness.mount("data", composite.clone()).unwrap();
        harness.settle().unwrap();
        assert!(composite.person_host().unwrap().is_disabled());

        harness.type_into("data.type", "bar").unwrap();
        harness.settle().unwrap();

        let name_form = composite.person_host().unwrap();
        assert!(name_form.get("name").unwrap().is_disabled());
        assert!(form.is_disabled());
    }

    #[test]
    fn unmounting_restores_every_placeholder() {
        let form = data_slot(populated());
        let data = form.get("data").unwrap();
        let mut harness = FormHarness::new(form.clone());
        let composite = Rc::new(CompositeForm::new(harness.runtime_handle()));
        let composite_control = composite.control();
        let inner_placeholder = composite_control.get("person").unwrap();
        let id = harness.mount("data", composite.clone()).unwrap();
        harness.settle().unwrap();
        harness.type_into("data.type", "bar").unwrap();
        harness.settle().unwrap();
        drop(composite);

        harness.unmount(id).unwrap();

        assert!(form.get("data").unwrap().ptr_eq(&data));
        assert!(composite_control.get("person").unwrap().ptr_eq(&inner_placeholder));
        assert_eq!(form.value(), FormValue::group([("data", populated())]));
    }
}
