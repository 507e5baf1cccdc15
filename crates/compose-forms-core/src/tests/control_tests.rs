use super::*;
use crate::validators::{required, ValidationErrors};
use std::cell::{Cell, RefCell};
use std::future::Future;
use std::pin::Pin;
use std::rc::Rc;
use std::task::{Context, Poll};

fn person() -> Control {
    Control::group([
        ("name", Control::field("").with_validator(required())),
        ("age", Control::field("").with_validator(required())),
    ])
}

/// Future that stays pending until the test opens it.
struct Gate(Rc<Cell<Option<bool>>>);

impl Future for Gate {
    type Output = Option<ValidationErrors>;

    fn poll(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<Self::Output> {
        match self.0.get() {
            None => Poll::Pending,
            Some(true) => Poll::Ready(None),
            Some(false) => Poll::Ready(Some(ValidationErrors::single("taken"))),
        }
    }
}

#[test]
fn patch_with_matching_shape_copies_everything() {
    let host = person();
    host.patch_value(
        &FormValue::group([("name", "Bobo"), ("age", "25")]),
        UpdateOptions::default(),
    );
    assert_eq!(host.value(), FormValue::group([("name", "Bobo"), ("age", "25")]));
    assert!(host.is_valid());
}

#[test]
fn patch_keeps_defaults_for_missing_keys() {
    let host = person();
    host.patch_value(&FormValue::group([("name", "Bobo")]), UpdateOptions::default());
    assert_eq!(host.value(), FormValue::group([("name", "Bobo"), ("age", "")]));
    assert!(host.is_invalid());
}

#[test]
fn patch_ignores_extra_keys() {
    let host = person();
    host.patch_value(
        &FormValue::group([
            ("name", FormValue::text("Bobo")),
            ("age", FormValue::from(25)),
            ("height", FormValue::from(200)),
        ]),
        UpdateOptions::default(),
    );
    assert_eq!(
        host.value(),
        FormValue::group([("name", FormValue::text("Bobo")), ("age", FormValue::from(25))])
    );
}

#[test]
fn patch_with_wrong_shape_leaves_composite_alone() {
    let host = person();
    host.patch_value(&FormValue::text("Bobo"), UpdateOptions::default());
    assert_eq!(host.value(), FormValue::group([("name", ""), ("age", "")]));
}

#[test]
fn set_value_resets_children_without_entries() {
    let host = person();
    host.patch_value(&FormValue::group([("name", "Bobo"), ("age", "25")]), UpdateOptions::default());
    host.set_value(FormValue::group([("name", "Robert")]), UpdateOptions::default());
    assert_eq!(
        host.value(),
        FormValue::group([("name", FormValue::text("Robert")), ("age", FormValue::Null)])
    );
}

#[test]
fn child_updates_propagate_to_ancestors() {
    let host = person();
    let root = Control::group([("person", host.clone())]);
    assert!(root.is_invalid());

    root.get("person.name")
        .unwrap()
        .set_value("Robert Speedwagon", UpdateOptions::default());
    assert!(root.is_invalid());
    root.get("person.age")
        .unwrap()
        .set_value("23", UpdateOptions::default());

    assert!(root.is_valid());
    assert_eq!(
        root.value().get("person").and_then(|p| p.get("age")).cloned(),
        Some(FormValue::text("23"))
    );
}

#[test]
fn only_self_updates_stop_at_the_node() {
    let name = Control::field("");
    let root = Control::group([("name", name.clone())]);
    name.set_value("x", UpdateOptions { only_self: true, emit_event: true });
    assert_eq!(root.value(), FormValue::group([("name", "")]));
    root.update_value_and_validity(UpdateOptions::default());
    assert_eq!(root.value(), FormValue::group([("name", "x")]));
}

#[test]
fn get_walks_groups_and_arrays() {
    let root = Control::group([(
        "items",
        Control::array([Control::field("a"), Control::group([("deep", Control::field(1))])]),
    )]);
    assert_eq!(root.get("items.0").unwrap().value(), FormValue::text("a"));
    assert_eq!(root.get("items.1.deep").unwrap().value(), FormValue::from(1));
    assert!(root.get("items.x").is_none());
    assert!(root.get("items.0.deeper").is_none());
}

#[test]
fn subscribers_hear_loud_updates_only() {
    let name = Control::field("");
    let events = Rc::new(RefCell::new(Vec::new()));
    let subscription = {
        let events = Rc::clone(&events);
        name.subscribe(move |event| events.borrow_mut().push(event.clone()))
    };

    name.set_value("a", UpdateOptions::silent());
    assert!(events.borrow().is_empty());

    name.set_value("b", UpdateOptions::default());
    assert_eq!(
        *events.borrow(),
        vec![
            ControlEvent::ValueChanged(FormValue::text("b")),
            ControlEvent::StatusChanged(ControlStatus::Valid),
        ]
    );

    subscription.cancel();
    name.set_value("c", UpdateOptions::default());
    assert_eq!(events.borrow().len(), 2);
}

#[test]
fn dropping_subscription_unregisters() {
    let name = Control::field("");
    let hits = Rc::new(Cell::new(0));
    {
        let hits = Rc::clone(&hits);
        let _subscription = name.subscribe(move |_| hits.set(hits.get() + 1));
        name.set_value("a", UpdateOptions::default());
    }
    name.set_value("b", UpdateOptions::default());
    assert_eq!(hits.get(), 2);
}

#[test]
fn disable_cascades_and_enable_restores() {
    let host = person();
    let root = Control::group([("person", host.clone()), ("other", Control::field(1))]);
    host.disable(UpdateOptions::default());
    assert!(host.is_disabled());
    assert!(host.get("name").unwrap().is_disabled());
    assert!(root.is_enabled());
    assert!(root.is_valid());
    assert_eq!(root.value(), FormValue::group([("other", 1)]));

    host.enable(UpdateOptions::default());
    assert!(host.get("age").unwrap().is_enabled());
    assert!(root.is_invalid());
}

#[test]
fn async_validator_resolving_immediately_settles_in_place() {
    let taken = AsyncValidator::new(|value: FormValue| {
        std::future::ready((value.as_str() == Some("admin")).then(|| ValidationErrors::single("taken")))
    });
    let name = Control::field("admin").with_async_validator(taken);
    assert!(name.is_invalid());
    name.set_value("bobo", UpdateOptions::default());
    assert!(name.is_valid());
}

#[test]
fn pending_async_validation_settles_when_polled() {
    let gate = Rc::new(Cell::new(None));
    let validator = {
        let gate = Rc::clone(&gate);
        AsyncValidator::new(move |_value: FormValue| Gate(Rc::clone(&gate)))
    };
    let name = Control::field("bobo").with_async_validator(validator);
    let root = Control::group([("name", name.clone())]);
    assert!(name.is_pending());
    assert!(root.is_pending());

    assert!(root.poll_pending_validation());
    assert!(root.is_pending());

    gate.set(Some(false));
    assert!(!root.poll_pending_validation());
    assert!(name.is_invalid());
    assert!(root.is_invalid());
    assert_eq!(name.errors().map(|e| e.contains("taken")), Some(true));
}

#[test]
fn async_validator_waits_for_sync_validity() {
    let calls = Rc::new(Cell::new(0));
    let validator = {
        let calls = Rc::clone(&calls);
        AsyncValidator::new(move |_value: FormValue| {
            calls.set(calls.get() + 1);
            std::future::ready(None)
        })
    };
    let name = Control::field("")
        .with_validator(required())
        .with_async_validator(validator);
    assert!(name.is_invalid());
    assert_eq!(calls.get(), 0);
    name.set_value("x", UpdateOptions::default());
    assert!(name.is_valid());
    assert_eq!(calls.get(), 1);
}

#[test]
fn identity_is_by_reference() {
    let a = Control::field(1);
    let b = Control::field(1);
    assert_ne!(a, b);
    assert_eq!(a, a.clone());
    assert_ne!(a.id(), b.id());
}
