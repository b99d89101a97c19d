//! # Driver Benchmarks
//!
//! Measures sequencer steps and whole runs without pacing.
//!
//! Run: `cargo bench --bench driver_bench`

use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use tensorviz_orchestration::*;

fn request(ops: &[&str], steps: usize, registry: &OperationRegistry) -> RunRequest {
    RunRequest::from_input(&[10, 10, 3], ops, steps, registry).expect("valid request")
}

/// Benchmark a single sequencer step per operation
fn bench_sequencer_step(c: &mut Criterion) {
    let mut group = c.benchmark_group("sequencer_step");

    let registry = OperationRegistry::new();
    let sequencer = Sequencer::new(&registry);
    let tensor = tensorviz_core::create_tensor(Shape::new(10, 10, 10).expect("valid shape"));

    for op in OperationKind::ALL {
        let sequence = OperationSequence::new(vec![op]).expect("non-empty");
        group.bench_with_input(BenchmarkId::from_parameter(op), &sequence, |b, seq| {
            b.iter(|| black_box(sequencer.apply_at(tensor.clone(), 3, seq)))
        });
    }

    group.finish();
}

/// Benchmark complete runs through the driver
fn bench_driver_run(c: &mut Criterion) {
    let mut group = c.benchmark_group("driver_run");

    let registry = OperationRegistry::new();
    let cases: [(&str, &[&str]); 3] = [
        ("sine_tanh", &["sine", "tanh"]),
        ("decay", &["exp_decay"]),
        ("mixed", &["sine", "matrix_power", "tanh", "exp_decay"]),
    ];

    for (name, ops) in cases {
        for steps in [10usize, 100] {
            group.bench_with_input(BenchmarkId::new(name, steps), &steps, |b, &steps| {
                let mut driver = SimulationDriver::with_seed(registry.clone(), 1);
                let mut scheduler = Scheduler::immediate();
                b.iter(|| {
                    let summary = driver
                        .run(request(ops, steps, &registry), &mut NullObserver, &mut scheduler)
                        .expect("run completes");
                    black_box(summary.statistics)
                })
            });
        }
    }

    group.finish();
}

/// Benchmark event bus fan-out
fn bench_event_bus(c: &mut Criterion) {
    let bus = EventBus::with_history(100);
    for filter in [EventFilter::All, EventFilter::Progress, EventFilter::Tensor] {
        bus.subscribe(filter, |event| {
            black_box(event.run());
        })
        .expect("subscribe");
    }

    let tensor = tensorviz_core::create_tensor(Shape::new(10, 10, 3).expect("valid shape"));
    let event = SimEvent::Step {
        run: RunId::new(1),
        step: 1,
        total_steps: 50,
        applied: AppliedOp::Applied(OperationKind::Sine),
        tensor: &tensor,
    };

    c.bench_function("event_bus_emit", |b| {
        b.iter(|| bus.emit(black_box(&event)))
    });
}

criterion_group!(benches, bench_sequencer_step, bench_driver_run, bench_event_bus);
criterion_main!(benches);
