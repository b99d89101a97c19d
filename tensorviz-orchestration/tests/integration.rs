//! Integration tests for tensorviz-orchestration

use std::sync::{Arc, Mutex};

use tensorviz_orchestration::*;

fn quiet_config(shape: &[i64], ops: &[&str], steps: usize) -> SimulationConfig {
    SimulationConfig {
        shape: shape.to_vec(),
        operations: ops.iter().map(|s| s.to_string()).collect(),
        steps,
        step_delay_ms: 0,
        seed: Some(5),
        ..SimulationConfig::default()
    }
}

fn run_recorded(config: &SimulationConfig) -> (RunSummary, Vec<EventRecord>) {
    let (request, registry) = config.validate().unwrap();
    let mut driver = config.driver(registry);
    let mut scheduler = Scheduler::new(config.scheduler_config());
    let bus = EventBus::with_history(2048);
    let mut observer = bus.clone();

    let summary = driver.run(request, &mut observer, &mut scheduler).unwrap();
    (summary, bus.history().unwrap())
}

fn step_names(records: &[EventRecord]) -> Vec<String> {
    records
        .iter()
        .filter_map(|r| match r {
            EventRecord::Step { operation, .. } => Some(operation.clone()),
            _ => None,
        })
        .collect()
}

#[test]
fn test_three_sine_steps_keep_shape() {
    let (summary, records) = run_recorded(&quiet_config(&[2, 2, 2], &["sine"], 3));

    assert_eq!(step_names(&records), ["sine", "sine", "sine"]);
    assert_eq!(summary.final_shape.dims(), [2, 2, 2]);
    assert_eq!(summary.failures, 0);

    for record in &records {
        match record {
            EventRecord::Started { shape, .. } | EventRecord::Step { shape, .. } => {
                assert_eq!(shape.dims(), [2, 2, 2]);
            }
            _ => {}
        }
    }
}

#[test]
fn test_cyclic_sequence() {
    let (summary, records) = run_recorded(&quiet_config(&[2, 3, 3], &["sine", "tanh"], 5));

    assert_eq!(step_names(&records), ["sine", "tanh", "sine", "tanh", "sine"]);
    let names: Vec<&str> = summary.applied.iter().map(AppliedOp::name).collect();
    assert_eq!(names, ["sine", "tanh", "sine", "tanh", "sine"]);
    assert_eq!(summary.explanation, OperationKind::Sine.explanation());
}

#[test]
fn test_event_order() {
    let (_, records) = run_recorded(&quiet_config(&[1, 2, 2], &["tanh"], 2));

    assert!(matches!(records.first(), Some(EventRecord::Started { total_steps: 2, .. })));
    assert!(matches!(records.last(), Some(EventRecord::Completed { .. })));

    let steps: Vec<usize> = records
        .iter()
        .filter_map(|r| match r {
            EventRecord::Step { step, total_steps, .. } => {
                assert_eq!(*total_steps, 2);
                Some(*step)
            }
            _ => None,
        })
        .collect();
    assert_eq!(steps, [1, 2]);
}

#[test]
fn test_failing_conv_steps_are_tagged() {
    // 3x3 Laplacian does not fit a 2x2 plane
    let (summary, records) = run_recorded(&quiet_config(&[2, 2, 2], &["conv", "sine"], 4));

    assert_eq!(step_names(&records), ["error", "sine", "error", "sine"]);
    assert_eq!(summary.failures, 2);

    let failures: Vec<&EventRecord> = records
        .iter()
        .filter(|r| matches!(r, EventRecord::StepFailed { .. }))
        .collect();
    assert_eq!(failures.len(), 2);
    match failures[0] {
        EventRecord::StepFailed { step, operation, error, .. } => {
            assert_eq!(*step, 1);
            assert_eq!(*operation, OperationKind::Conv);
            assert!(error.contains("Kernel too large"));
        }
        other => panic!("unexpected record {:?}", other),
    }
}

#[test]
fn test_failed_step_passes_tensor_through() {
    let config = quiet_config(&[2, 2, 2], &["matrix_power"], 1);
    let (request, _) = config.validate().unwrap();
    let mut driver = config.driver(OperationRegistry::new());

    let run = driver.start(request, &mut NullObserver).unwrap();
    let before = driver.tensor().cloned().unwrap();
    let report = driver.step(run, &mut NullObserver).unwrap();

    // Square planes: matrix_power succeeds and changes the tensor
    assert_eq!(report.applied.name(), "matrix_power");
    assert_ne!(driver.tensor(), Some(&before));

    let config = quiet_config(&[2, 2, 3], &["matrix_power"], 1);
    let (request, registry) = config.validate().unwrap();
    let mut driver = config.driver(registry);
    let run = driver.start(request, &mut NullObserver).unwrap();
    let before = driver.tensor().cloned().unwrap();
    let report = driver.step(run, &mut NullObserver).unwrap();

    assert_eq!(report.applied, AppliedOp::Failed(OperationKind::MatrixPower));
    assert_eq!(driver.tensor(), Some(&before));
    assert!(report.finished);
}

#[test]
fn test_conv_shrinks_tensor() {
    let (summary, records) = run_recorded(&quiet_config(&[10, 10, 3], &["conv"], 2));

    assert_eq!(step_names(&records), ["conv", "conv"]);
    assert_eq!(summary.final_shape.dims(), [6, 6, 3]);
    assert!(summary.explanation.contains("convolution"));
}

#[test]
fn test_superseded_run_is_stale() {
    let config = quiet_config(&[3, 3, 3], &["sine", "exp_decay"], 10);
    let (request, registry) = config.validate().unwrap();
    let mut driver = config.driver(registry);

    let first = driver.start(request.clone(), &mut NullObserver).unwrap();
    driver.step(first, &mut NullObserver).unwrap();
    driver.step(first, &mut NullObserver).unwrap();

    let second = driver.start(request, &mut NullObserver).unwrap();
    let err = driver.step(first, &mut NullObserver).unwrap_err();
    assert_eq!(
        err,
        SimError::StaleRun {
            requested: first,
            current: second
        }
    );
    assert!(err.to_string().contains("superseded"));

    let report = driver.step(second, &mut NullObserver).unwrap();
    assert_eq!(report.step, 1);
    assert_eq!(report.run, second);
}

#[test]
fn test_invalid_requests_create_no_state() {
    let registry = OperationRegistry::new();

    assert_eq!(
        RunRequest::from_input(&[2, 2, 2], &["sine"], 0, &registry).unwrap_err(),
        SimError::InvalidStepCount(0)
    );
    assert!(matches!(
        RunRequest::from_input(&[2, 2], &["sine"], 3, &registry),
        Err(SimError::Tensor(TensorError::InvalidShape(_)))
    ));
    assert_eq!(
        RunRequest::from_input::<&str>(&[2, 2, 2], &[], 3, &registry).unwrap_err(),
        SimError::EmptyOperationSequence
    );
}

#[test]
fn test_observer_sees_every_tensor() {
    let config = quiet_config(&[2, 4, 4], &["sine", "matrix_power", "tanh"], 6);
    let (request, registry) = config.validate().unwrap();
    let mut driver = config.driver(registry);
    let mut scheduler = Scheduler::immediate();

    let mut shapes = Vec::new();
    let mut explanation = None;
    let mut observer = |event: &SimEvent<'_>| {
        if let Some((tensor, shape)) = event.tensor() {
            assert_eq!(tensor.len(), shape.len());
            shapes.push(shape);
        }
        if let SimEvent::Completed { explanation: text, .. } = event {
            explanation = Some(*text);
        }
    };

    driver.run(request, &mut observer, &mut scheduler).unwrap();

    assert_eq!(shapes.len(), 7);
    assert_eq!(explanation, Some(OperationKind::Tanh.explanation()));
}

#[test]
fn test_bus_subscribers_receive_filtered_events() {
    let config = quiet_config(&[1, 2, 2], &["sine"], 3);
    let (request, registry) = config.validate().unwrap();
    let mut driver = config.driver(registry);
    let mut scheduler = Scheduler::immediate();

    let progress = Arc::new(Mutex::new(Vec::new()));
    let mut bus = EventBus::new();
    let sink = progress.clone();
    bus.subscribe(EventFilter::Progress, move |event| {
        if let SimEvent::Step { step, total_steps, applied, .. } = event {
            sink.lock()
                .unwrap()
                .push(format!("Step {}/{}: Applied {}", step, total_steps, applied));
        }
    })
    .unwrap();

    driver.run(request, &mut bus, &mut scheduler).unwrap();

    let lines = progress.lock().unwrap();
    assert_eq!(
        *lines,
        [
            "Step 1/3: Applied sine",
            "Step 2/3: Applied sine",
            "Step 3/3: Applied sine"
        ]
    );
}

#[test]
fn test_seeded_runs_are_reproducible() {
    let config = quiet_config(&[3, 4, 4], &["sine", "matrix_power", "exp_decay"], 9);
    let (a, _) = run_recorded(&config);
    let (b, _) = run_recorded(&config);
    assert_eq!(a.statistics, b.statistics);
}
