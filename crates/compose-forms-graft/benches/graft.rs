use compose_forms_core::validators::required;
use compose_forms_core::{Control, FormValue, Runtime};
use compose_forms_graft::GraftDirective;
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

const SLOT_SAMPLES: &[usize] = &[4, 16, 64, 256];

struct GraftFixture {
    runtime: Runtime,
    form: Control,
}

impl GraftFixture {
    fn new(slots: usize) -> Self {
        let form = Control::group((0..slots).map(|slot| {
            let value = FormValue::group([("name", format!("Person {slot}"))]);
            (format!("slot{slot}"), Control::field(value))
        }));
        Self {
            runtime: Runtime::default(),
            form,
        }
    }

    fn host() -> Control {
        Control::group([
            ("name", Control::field("").with_validator(required())),
            ("age", Control::field("").with_validator(required())),
        ])
    }
}

fn bench_attach_detach(c: &mut Criterion) {
    let fixture = GraftFixture::new(8);

    c.bench_function("graft_attach_detach", |b| {
        b.iter(|| {
            let host = GraftFixture::host();
            let mut directive =
                GraftDirective::new(&fixture.form, &host, fixture.runtime.handle());
            directive.set_key("slot0").expect("slot exists");
            fixture.runtime.commit();
            directive.destroy();
            fixture.runtime.commit();
            black_box(fixture.form.value());
        });
    });
}

fn bench_retarget(c: &mut Criterion) {
    let mut group = c.benchmark_group("graft_retarget");
    for &slots in SLOT_SAMPLES {
        group.bench_with_input(BenchmarkId::new("slots", slots), &slots, |b, &slots| {
            let fixture = GraftFixture::new(slots);
            let host = GraftFixture::host();
            let mut directive =
                GraftDirective::new(&fixture.form, &host, fixture.runtime.handle());
            let mut next = 0;

            b.iter(|| {
                directive
                    .set_key(format!("slot{next}"))
                    .expect("slot exists");
                fixture.runtime.commit();
                next = (next + 1) % slots;
                black_box(directive.phase());
            });
        });
    }
    group.finish();
}

criterion_group!(graft, bench_attach_detach, bench_retarget);
criterion_main!(graft);
