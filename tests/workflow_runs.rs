//! End-to-end runs against local HTTP mocks and file-backed stores.

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use httpmock::prelude::*;
use tempfile::tempdir;

use steprunner::execution::{ExecutorRegistry, RunnerConfig, WorkflowRunner};
use steprunner::ledger::{
    render_run, step_durations, FileStore, LogEntry, LogLevel, MemoryStore, RunStatus, RunStore,
};
use steprunner::workflow::{load_workflow, save_workflow, Step, Workflow};

fn memory_runner() -> (WorkflowRunner, Arc<MemoryStore>) {
    let store = Arc::new(MemoryStore::new());
    let runner = WorkflowRunner::new(ExecutorRegistry::new(), store.clone());
    (runner, store)
}

fn entries_for(entries: &[LogEntry], step: &Step) -> Vec<LogEntry> {
    entries
        .iter()
        .filter(|e| e.step_id == Some(step.id))
        .cloned()
        .collect()
}

#[test]
fn test_delay_then_http_check_succeeds() {
    let server = MockServer::start();
    let health = server.mock(|when, then| {
        when.method(GET).path("/health");
        then.status(200).body("ok");
    });

    let workflow = Workflow::from_steps(
        "Health Check",
        vec![Step::delay(0.1), Step::http_check(server.url("/health"))],
    );
    let (runner, store) = memory_runner();

    let run = runner.execute(&workflow).unwrap();
    let entries = store.logs(run.id).unwrap();

    health.assert();
    assert_eq!(run.status, RunStatus::Succeeded);
    assert!(run.completed_at.unwrap() >= run.started_at);
    assert!(entries.len() >= 4);

    // Every step has info entries, and they appear in position order
    let mut last_sequence = 0;
    for step in workflow.steps() {
        let step_entries = entries_for(&entries, step);
        assert!(step_entries.iter().any(|e| e.level == LogLevel::Info));
        let first = step_entries.first().unwrap().sequence;
        assert!(first >= last_sequence);
        last_sequence = step_entries.last().unwrap().sequence;
    }
}

#[test]
fn test_client_error_fails_run() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/missing");
        then.status(404);
    });

    let workflow = Workflow::from_steps(
        "Broken link",
        vec![Step::http_check(server.url("/missing")), Step::delay(0.0)],
    );
    let (runner, store) = memory_runner();

    let run = runner.execute(&workflow).unwrap();
    let entries = store.logs(run.id).unwrap();

    assert_eq!(run.status, RunStatus::Failed);
    assert!(entries
        .iter()
        .any(|e| e.level == LogLevel::Warn && e.message.contains("Status: 404")));
    assert!(entries_for(&entries, workflow.step_at(2).unwrap()).is_empty());
}

#[test]
fn test_server_error_fails_run() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/down");
        then.status(503);
    });

    let workflow = Workflow::from_steps("Outage", vec![Step::http_check(server.url("/down"))]);
    let (runner, store) = memory_runner();

    let run = runner.execute(&workflow).unwrap();
    let entries = store.logs(run.id).unwrap();

    assert_eq!(run.status, RunStatus::Failed);
    assert!(entries
        .iter()
        .any(|e| e.level == LogLevel::Error && e.message.contains("Status: 503")));
}

#[test]
fn test_refused_connection_fails_run() {
    let workflow = Workflow::from_steps("Refused", vec![Step::http_check("http://127.0.0.1:1/")]);
    let (runner, store) = memory_runner();

    let run = runner.execute(&workflow).unwrap();
    let entries = store.logs(run.id).unwrap();

    assert_eq!(run.status, RunStatus::Failed);
    assert!(entries
        .iter()
        .any(|e| e.level == LogLevel::Error && e.message.starts_with("Connection failed")));
}

#[test]
fn test_failure_midway_leaves_later_steps_untouched() {
    let workflow = Workflow::from_steps(
        "Fail fast",
        vec![Step::delay(0.0), Step::delay(-1.0), Step::delay(0.0)],
    );
    let (runner, store) = memory_runner();

    let run = runner.execute(&workflow).unwrap();
    let entries = store.logs(run.id).unwrap();

    assert_eq!(run.status, RunStatus::Failed);
    assert!(entries
        .iter()
        .any(|e| e.message == "Delay 'seconds' cannot be negative: -1"));
    assert!(entries_for(&entries, workflow.step_at(3).unwrap()).is_empty());
}

#[test]
fn test_capped_delay_warns_and_succeeds() {
    let registry = ExecutorRegistry::with_config(RunnerConfig::new().max_delay_seconds(0.05));
    let store = Arc::new(MemoryStore::new());
    let runner = WorkflowRunner::new(registry, store.clone());

    let workflow = Workflow::from_steps("Capped", vec![Step::delay(5.0)]);
    let run = runner.execute(&workflow).unwrap();
    let entries = store.logs(run.id).unwrap();

    assert_eq!(run.status, RunStatus::Succeeded);
    assert!(entries.iter().any(|e| e.level == LogLevel::Warn
        && e.message == "Requested delay of 5s exceeds maximum. Capped to 0.05s"));
}

#[test]
fn test_empty_workflow() {
    let (runner, store) = memory_runner();
    let run = runner.execute(&Workflow::new("Nothing")).unwrap();
    let entries = store.logs(run.id).unwrap();

    assert_eq!(run.status, RunStatus::Succeeded);
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].level, LogLevel::Warn);
    assert!(entries[0].step_id.is_none());
}

#[test]
fn test_concurrent_runs_share_registry_and_store() {
    let (runner, store) = memory_runner();
    let workflows: Vec<Workflow> = (0..4)
        .map(|i| Workflow::from_steps(format!("wf-{}", i), vec![Step::delay(0.05), Step::delay(0.0)]))
        .collect();

    let runs: Vec<_> = thread::scope(|scope| {
        let handles: Vec<_> = workflows
            .iter()
            .map(|workflow| {
                let runner = &runner;
                scope.spawn(move || runner.execute(workflow).unwrap())
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    for (run, workflow) in runs.iter().zip(&workflows) {
        assert_eq!(run.status, RunStatus::Succeeded);
        assert_eq!(run.workflow_id, workflow.id);

        let entries = store.logs(run.id).unwrap();
        assert!(entries.iter().all(|e| e.run_id == run.id));
        let sequences: Vec<u64> = entries.iter().map(|e| e.sequence).collect();
        assert_eq!(sequences, (0..entries.len() as u64).collect::<Vec<_>>());
    }
}

#[test]
fn test_file_store_history_and_report() {
    let temp_dir = tempdir().unwrap();
    let path = temp_dir.path().join("workflow.yaml");

    let mut workflow = Workflow::from_steps("Persisted", vec![Step::delay(0.01), Step::delay(0.02)]);
    save_workflow(&workflow, &path).unwrap();

    let store = Arc::new(FileStore::open(temp_dir.path().join(".steprunner")).unwrap());
    let runner = WorkflowRunner::new(ExecutorRegistry::new(), store.clone());

    let loaded = load_workflow(&path).unwrap();
    let run = runner.execute(&loaded).unwrap();
    assert_eq!(run.status, RunStatus::Succeeded);

    // A second handle on the same directory sees the run
    let reopened = FileStore::open(store.root()).unwrap();
    let history = reopened.runs_for_workflow(workflow.id).unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0], run);

    let entries = reopened.logs(run.id).unwrap();
    assert_eq!(step_durations(&entries).len(), 2);

    // Deleting a step afterwards leaves its log entries readable
    let removed = workflow.step_at(1).unwrap().id;
    workflow.remove_step(removed).unwrap();
    let report = render_run(&run, &entries, Some(&workflow));
    assert!(report.contains("(removed)"));
    assert!(report.contains("Succeeded"));

    assert_eq!(reopened.delete_workflow_runs(workflow.id).unwrap(), 1);
    assert!(reopened.logs(run.id).unwrap().is_empty());
}

#[test]
#[ignore = "requires network access"]
fn test_live_http_check() {
    let registry = ExecutorRegistry::with_config(
        RunnerConfig::new().http_timeout(Duration::from_secs(10)),
    );
    let store = Arc::new(MemoryStore::new());
    let runner = WorkflowRunner::new(registry, store.clone());

    let workflow = Workflow::from_steps("Live", vec![Step::http_check("https://example.com")]);
    let run = runner.execute(&workflow).unwrap();

    assert_eq!(run.status, RunStatus::Succeeded);
}
