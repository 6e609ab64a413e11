use std::time::Duration;

use lifeline::errors::{AppError, ConstructionError};
use lifeline::runner::Unwired;
use lifeline::signals::TerminationSignal;
use lifeline::{exit_status, report, run, run_with_parent, EXIT_FAILURE, EXIT_SUCCESS};
use lifeline_test_utils::{fake_signals, init_tracing, with_timeout, Script, ScriptedFactory};
use tokio_util::sync::CancellationToken;

#[tokio::test]
async fn voluntary_completion_runs_cleanup_once_and_exits_zero() {
    init_tracing();

    let factory = ScriptedFactory::new(Script::ReturnAfter(Duration::from_millis(10)));
    let cleanup = factory.cleanup_probe();
    let (signals, injector) = fake_signals();

    let outcome = with_timeout(run(&factory, signals)).await;

    assert!(outcome.is_ok(), "got {outcome:?}");
    assert_eq!(cleanup.calls(), 1);
    assert!(!cleanup.ran_before_cancel());
    assert_eq!(exit_status(&outcome), EXIT_SUCCESS);
    with_timeout(injector.wait_released()).await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn signal_at_start_stops_a_cooperative_runner() {
    init_tracing();

    let factory = ScriptedFactory::new(Script::UntilCancelled);
    let cleanup = factory.cleanup_probe();
    let runner = factory.runner_probe();
    let (signals, injector) = fake_signals();

    injector.send(TerminationSignal::Terminate);
    let outcome = with_timeout(run(&factory, signals)).await;

    assert!(outcome.is_ok(), "got {outcome:?}");
    assert!(runner.saw_cancel());
    assert_eq!(cleanup.calls(), 1);
    assert!(!cleanup.ran_before_cancel());
    assert_eq!(exit_status(&outcome), EXIT_SUCCESS);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn signal_mid_run_stops_a_cooperative_runner() {
    init_tracing();

    let factory = ScriptedFactory::new(Script::UntilCancelled);
    let cleanup = factory.cleanup_probe();
    let runner = factory.runner_probe();
    let (signals, injector) = fake_signals();

    let handle = tokio::spawn(async move { run(&factory, signals).await });

    tokio::time::sleep(Duration::from_millis(20)).await;
    assert!(runner.started());
    assert!(!runner.returned());
    assert_eq!(cleanup.calls(), 0, "cleanup must wait for cancellation");

    injector.send(TerminationSignal::Interrupt);
    injector.send(TerminationSignal::Interrupt);

    let outcome = with_timeout(handle).await.unwrap();
    assert!(outcome.is_ok(), "got {outcome:?}");
    assert!(runner.returned());
    assert_eq!(cleanup.calls(), 1);
}

#[tokio::test]
async fn primary_failure_is_the_outcome_and_cleanup_still_runs() {
    init_tracing();

    let factory = ScriptedFactory::new(Script::FailAfter(
        Duration::from_millis(10),
        "upstream went away".to_string(),
    ));
    let cleanup = factory.cleanup_probe();
    let (signals, _injector) = fake_signals();

    let outcome = with_timeout(run(&factory, signals)).await;

    match &outcome {
        Err(AppError::Task { task, source }) => {
            assert_eq!(task, "primary");
            assert_eq!(source.to_string(), "upstream went away");
        }
        other => panic!("expected primary Task error, got {other:?}"),
    }
    assert_eq!(cleanup.calls(), 1);
    assert!(!cleanup.ran_before_cancel());
    assert_eq!(exit_status(&outcome), EXIT_FAILURE);
}

#[tokio::test]
async fn primary_panic_is_a_failure_and_cleanup_still_runs() {
    init_tracing();

    let factory = ScriptedFactory::new(Script::Panic);
    let cleanup = factory.cleanup_probe();
    let (signals, _injector) = fake_signals();

    let outcome = with_timeout(run(&factory, signals)).await;

    assert!(
        matches!(&outcome, Err(AppError::TaskPanicked { task }) if task == "primary"),
        "got {outcome:?}"
    );
    assert_eq!(cleanup.calls(), 1);
}

#[tokio::test]
async fn construction_failure_never_starts_the_group() {
    init_tracing();

    let factory = ScriptedFactory::failing("database url");
    let cleanup = factory.cleanup_probe();
    let runner = factory.runner_probe();
    let (signals, injector) = fake_signals();

    let outcome = with_timeout(run(&factory, signals)).await;

    match &outcome {
        Err(AppError::Construction(ConstructionError::MissingConfig(what))) => {
            assert_eq!(what, "database url");
        }
        other => panic!("expected construction error, got {other:?}"),
    }
    assert_eq!(factory.builds(), 1);
    assert!(!runner.started());
    assert_eq!(cleanup.calls(), 0);
    assert_ne!(exit_status(&outcome), EXIT_SUCCESS);
    with_timeout(injector.wait_released()).await;
}

#[tokio::test]
async fn unwired_binary_fails_construction() {
    init_tracing();

    let (signals, _injector) = fake_signals();
    let outcome = with_timeout(run(&Unwired, signals)).await;

    assert!(
        matches!(outcome, Err(AppError::Construction(ConstructionError::NotWired))),
        "got {outcome:?}"
    );
}

#[tokio::test]
async fn program_decision_through_parent_token_shuts_down() {
    init_tracing();

    let factory = ScriptedFactory::new(Script::UntilCancelled);
    let cleanup = factory.cleanup_probe();
    let (signals, _injector) = fake_signals();
    let parent = CancellationToken::new();

    let stopper = parent.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(10)).await;
        stopper.cancel();
    });

    let outcome = with_timeout(run_with_parent(&factory, signals, &parent)).await;

    assert!(outcome.is_ok(), "got {outcome:?}");
    assert_eq!(cleanup.calls(), 1);
}

#[test]
fn report_maps_outcomes_to_exit_status() {
    init_tracing();

    assert_eq!(report(&Ok(())), EXIT_SUCCESS);
    let failed = Err(AppError::Construction(ConstructionError::NotWired));
    assert_eq!(report(&failed), EXIT_FAILURE);
}
