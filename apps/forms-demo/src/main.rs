use std::error::Error;

use compose_forms_core::validators::{compose, min_length, pattern, required};
use compose_forms_core::{Control, FormValue, UpdateOptions};
use compose_forms_graft::{GraftDirective, HostControl};
use compose_forms_runtime_std::FormShell;

/// Checkout sub-form owned by the "customer" component.
struct CustomerForm {
    control: Control,
}

impl CustomerForm {
    fn new() -> Self {
        let email = compose([required(), pattern("email", |text| text.contains('@'))]);
        Self {
            control: Control::group([
                ("name", Control::field("").with_validator(required())),
                ("email", Control::field("").with_validator(email)),
            ]),
        }
    }
}

impl HostControl for CustomerForm {
    fn control(&self) -> Control {
        self.control.clone()
    }
}

struct AddressForm {
    control: Control,
}

impl AddressForm {
    fn new() -> Self {
        Self {
            control: Control::group([
                ("street", Control::field("").with_validator(required())),
                ("zip", Control::field("").with_validator(min_length(5))),
            ]),
        }
    }
}

impl HostControl for AddressForm {
    fn control(&self) -> Control {
        self.control.clone()
    }
}

fn print_form(label: &str, form: &Control) {
    println!("{label:<28} {:?}  {}", form.status(), form.value());
}

fn type_into(form: &Control, path: &str, text: &str) {
    match form.get(path) {
        Some(control) => control.set_value(text, UpdateOptions::default()),
        None => log::warn!("no input bound to {path}"),
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::init();

    println!("=== Compose-RS Forms Example ===");
    println!("Components graft their own controls into the checkout form.");
    println!();

    let form = Control::group([
        (
            "customer",
            Control::field(FormValue::group([("name", "Ada Lovelace")])),
        ),
        ("shipping", Control::field(FormValue::Null)),
        ("billing", Control::field(FormValue::Null)),
    ]);
    let mut shell = FormShell::new(form.clone());
    print_form("initial", &form);

    let customer = CustomerForm::new();
    let address = AddressForm::new();
    let mut customer_directive = GraftDirective::new(&form, &customer, shell.runtime_handle());
    let mut address_directive = GraftDirective::new(&form, &address, shell.runtime_handle());

    let mut prepared = Ok(());
    shell.tick(|| {
        prepared = customer_directive
            .set_key("customer")
            .and_then(|()| address_directive.set_key("shipping"));
    })?;
    prepared?;
    print_form("mounted", &form);

    type_into(&form, "customer.email", "ada@example.org");
    type_into(&form, "shipping.street", "12 Analytical Row");
    type_into(&form, "shipping.zip", "10001");
    print_form("after typing", &form);

    let mut retargeted = Ok(());
    shell.tick(|| retargeted = address_directive.set_key("billing"))?;
    retargeted?;
    print_form("address moved to billing", &form);

    shell.tick(|| {
        customer_directive.destroy();
        address_directive.destroy();
    })?;
    shell.settle()?;
    print_form("unmounted", &form);

    println!();
    println!(
        "customer component kept its own state: {}",
        customer.control().value()
    );
    Ok(())
}
