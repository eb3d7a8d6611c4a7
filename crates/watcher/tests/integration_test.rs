//! Integration tests for the workspace validation watcher
//!
//! These drive the in-memory host through realistic workspace activations and
//! indexing runs and observe the notices that reach the presenter.

use intellisense_check_core::config::{Config, WatcherConfig};
use intellisense_check_core::memory::{
    MemoryFileContext, MemoryHost, MemoryProjectContext, MemoryWorkspace,
};
use intellisense_check_core::host::{ProjectContext, Workspace};
use intellisense_check_core::model::{
    CommandLine, IndexProperties, IndexingChanged, IndexingState, NATIVE_PROJECT_CONTEXT_TYPE,
};
use intellisense_check_core::report::{
    RecordingPresenter, RecordingReporter, EMPTY_COMMAND_LINES_MESSAGE,
};
use intellisense_check_watcher::{main_thread_channel, WorkspaceSubscriber};
use pretty_assertions::assert_eq;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio_test::{assert_err, assert_ok};
use tokio_util::sync::CancellationToken;

fn project(name: &str, lines: usize) -> Arc<MemoryProjectContext> {
    Arc::new(MemoryProjectContext::new(
        name,
        (0..lines)
            .map(|i| CommandLine::new(format!("cl.exe /c {name}_{i}.cpp")))
            .collect(),
    ))
}

fn add_file(ws: &MemoryWorkspace, path: &str, project: &Arc<MemoryProjectContext>) {
    ws.add_file(
        MemoryFileContext::new(path, "native", NATIVE_PROJECT_CONTEXT_TYPE)
            .with_project(Arc::clone(project)),
    );
}

fn run_indexing(ws: &MemoryWorkspace) {
    ws.set_indexing_state(IndexingState::InProgress);
    ws.set_indexing_state(IndexingState::Completed);
}

fn config_with(watcher: WatcherConfig) -> Config {
    Config {
        watcher,
        ..Config::default()
    }
}

fn install(host: &MemoryHost, config: &Config) -> (Arc<WorkspaceSubscriber>, RecordingReporter) {
    let reporter = RecordingReporter::new();
    let subscriber = WorkspaceSubscriber::install(host, Arc::new(reporter.clone()), config)
        .expect("host provides a workspace service");
    (subscriber, reporter)
}

#[tokio::test]
async fn test_install_without_workspace_service_is_inert() {
    let host = MemoryHost::without_workspace_service();
    let installed =
        WorkspaceSubscriber::install(&host, Arc::new(RecordingReporter::new()), &Config::default());
    assert!(installed.is_none());
}

#[test]
fn test_install_outside_runtime_is_inert() {
    let host = MemoryHost::new();
    let installed =
        WorkspaceSubscriber::install(&host, Arc::new(RecordingReporter::new()), &Config::default());
    assert!(installed.is_none());
    assert_eq!(host.service().unwrap().observer_count(), 0);
}

#[tokio::test]
async fn test_shared_empty_project_reported_once_through_main_thread() {
    let host = MemoryHost::new();
    let presenter = RecordingPresenter::new();
    let (reporter, dispatcher) = main_thread_channel(8, presenter.clone());
    let shutdown = CancellationToken::new();
    let main = tokio::spawn(dispatcher.run_until(shutdown.clone()));

    let subscriber =
        WorkspaceSubscriber::install(&host, Arc::new(reporter), &Config::default()).unwrap();

    let ws = Arc::new(MemoryWorkspace::new("/src/app"));
    let a = project("a", 0);
    add_file(&ws, "/src/app/one.cpp", &a);
    add_file(&ws, "/src/app/two.cpp", &a);

    host.service().unwrap().activate(Some(Arc::clone(&ws)));
    run_indexing(&ws);

    let outcomes = subscriber.wait_idle().await;
    shutdown.cancel();
    assert_ok!(main.await);

    assert_eq!(outcomes.len(), 1);
    assert_eq!(outcomes[0].project_contexts, 1);

    let notices = presenter.notices();
    assert_eq!(notices.len(), 1);
    assert_eq!(notices[0].message, EMPTY_COMMAND_LINES_MESSAGE);
    assert_eq!(notices[0].project, Some(a.id()));
}

#[tokio::test]
async fn test_only_project_without_command_lines_is_reported() {
    let host = MemoryHost::new();
    let (subscriber, reporter) = install(&host, &Config::default());

    let ws = Arc::new(MemoryWorkspace::new("/src/engine"));
    let a = project("a", 3);
    let b = project("b", 0);
    add_file(&ws, "/src/engine/a.cpp", &a);
    add_file(&ws, "/src/engine/b.cpp", &b);

    host.service().unwrap().activate(Some(Arc::clone(&ws)));
    run_indexing(&ws);
    subscriber.wait_idle().await;

    let notices = reporter.notices();
    assert_eq!(notices.len(), 1);
    assert_eq!(notices[0].project, Some(b.id()));
}

#[tokio::test]
async fn test_empty_workspace_reports_nothing() {
    let host = MemoryHost::new();
    let (subscriber, reporter) = install(&host, &Config::default());

    let ws = Arc::new(MemoryWorkspace::new("/src/empty"));
    host.service().unwrap().activate(Some(Arc::clone(&ws)));
    run_indexing(&ws);

    let outcomes = subscriber.wait_idle().await;
    assert_eq!(outcomes.len(), 1);
    assert_eq!(outcomes[0].groups, 0);
    assert!(reporter.is_empty());
}

#[tokio::test]
async fn test_failed_indexing_triggers_no_pass() {
    let host = MemoryHost::new();
    let (subscriber, reporter) = install(&host, &Config::default());

    let ws = Arc::new(MemoryWorkspace::new("/src/app"));
    add_file(&ws, "/src/app/a.cpp", &project("a", 0));
    host.service().unwrap().activate(Some(Arc::clone(&ws)));

    ws.set_indexing_state(IndexingState::InProgress);
    ws.set_indexing_state(IndexingState::Failed);
    subscriber.wait_idle().await;

    assert_eq!(subscriber.active_watcher().unwrap().passes_started(), 0);
    assert_eq!(ws.query_count(), 0);
    assert!(reporter.is_empty());
}

#[tokio::test]
async fn test_non_state_change_while_completed_triggers_no_pass() {
    let host = MemoryHost::new();
    let (subscriber, reporter) = install(&host, &Config::default());

    let ws = Arc::new(MemoryWorkspace::new("/src/app"));
    add_file(&ws, "/src/app/a.cpp", &project("a", 0));
    host.service().unwrap().activate(Some(Arc::clone(&ws)));

    run_indexing(&ws);
    subscriber.wait_idle().await;
    assert_eq!(reporter.len(), 1);

    // State is still Completed, but only progress changed
    ws.notify_property_change(IndexProperties::PROGRESS | IndexProperties::FILE_COUNT);
    subscriber.wait_idle().await;

    assert_eq!(subscriber.active_watcher().unwrap().passes_started(), 1);
    assert_eq!(reporter.len(), 1);
}

#[tokio::test]
async fn test_reindex_runs_another_pass_with_same_violations() {
    let host = MemoryHost::new();
    let (subscriber, reporter) = install(&host, &Config::default());

    let ws = Arc::new(MemoryWorkspace::new("/src/app"));
    let a = project("a", 0);
    let b = project("b", 2);
    add_file(&ws, "/src/app/a.cpp", &a);
    add_file(&ws, "/src/app/b.cpp", &b);
    host.service().unwrap().activate(Some(Arc::clone(&ws)));

    run_indexing(&ws);
    let first = subscriber.wait_idle().await;
    run_indexing(&ws);
    let second = subscriber.wait_idle().await;

    assert_eq!(subscriber.active_watcher().unwrap().passes_started(), 2);
    assert_eq!(first[0].violations, second[0].violations);
    let reported: Vec<_> = reporter.notices().iter().map(|n| n.project).collect();
    assert_eq!(reported, vec![Some(a.id()), Some(a.id())]);
}

#[tokio::test]
async fn test_reindex_picks_up_changed_command_lines() {
    let host = MemoryHost::new();
    let (subscriber, reporter) = install(&host, &Config::default());

    let ws = Arc::new(MemoryWorkspace::new("/src/app"));
    let a = project("a", 0);
    let b = project("b", 1);
    add_file(&ws, "/src/app/a.cpp", &a);
    add_file(&ws, "/src/app/b.cpp", &b);
    host.service().unwrap().activate(Some(Arc::clone(&ws)));

    run_indexing(&ws);
    subscriber.wait_idle().await;

    // The build system fixed `a` and broke `b`
    a.set_command_lines(vec![CommandLine::new("cl.exe /c a.cpp")]);
    b.set_command_lines(Vec::new());
    run_indexing(&ws);
    let second = subscriber.wait_idle().await;

    assert_eq!(second[0].violations.len(), 1);
    assert_eq!(second[0].violations[0].project, b.id());
    let reported: Vec<_> = reporter.notices().iter().map(|n| n.project).collect();
    assert_eq!(reported, vec![Some(a.id()), Some(b.id())]);
}

#[tokio::test]
async fn test_finished_passes_are_released_across_reindexing() {
    let host = MemoryHost::new();
    let (subscriber, reporter) = install(&host, &Config::default());

    let ws = Arc::new(MemoryWorkspace::new("/src/app"));
    add_file(&ws, "/src/app/a.cpp", &project("a", 0));
    host.service().unwrap().activate(Some(Arc::clone(&ws)));
    let watcher = subscriber.active_watcher().unwrap();

    for _ in 0..200 {
        run_indexing(&ws);
        // Let the pass run to completion before the next reindex
        tokio::time::sleep(Duration::from_millis(1)).await;
    }

    assert_eq!(watcher.passes_started(), 200);
    assert_eq!(reporter.len(), 200);
    assert!(
        watcher.pending_passes() <= 1,
        "pending handles kept: {}",
        watcher.pending_passes()
    );
}

#[tokio::test]
async fn test_closing_workspace_keeps_current_watcher() {
    let host = MemoryHost::new();
    let (subscriber, _reporter) = install(&host, &Config::default());
    let service = host.service().unwrap();

    service.activate(None);
    assert!(subscriber.active_watcher().is_none());

    let ws = Arc::new(MemoryWorkspace::new("/src/app"));
    service.activate(Some(Arc::clone(&ws)));
    service.activate(None);

    let active = subscriber.active_watcher().unwrap();
    assert_eq!(active.location(), Path::new("/src/app"));
    assert!(active.is_attached());
}

#[tokio::test]
async fn test_previous_watcher_left_subscribed_by_default() {
    let host = MemoryHost::new();
    let (subscriber, reporter) = install(&host, &Config::default());
    let service = host.service().unwrap();

    let old = Arc::new(MemoryWorkspace::new("/src/old"));
    add_file(&old, "/src/old/a.cpp", &project("old", 0));
    let new = Arc::new(MemoryWorkspace::new("/src/new"));

    service.activate(Some(Arc::clone(&old)));
    service.activate(Some(Arc::clone(&new)));

    assert_eq!(old.indexing_observer_count(), 1);
    assert_eq!(subscriber.retired_watchers().len(), 1);

    // The stale watcher still validates its old workspace
    run_indexing(&old);
    subscriber.wait_idle().await;
    assert_eq!(reporter.len(), 1);
    assert_eq!(reporter.notices()[0].workspace, PathBuf::from("/src/old"));
}

#[tokio::test]
async fn test_previous_watcher_disposed_when_configured() {
    let host = MemoryHost::new();
    let config = config_with(WatcherConfig::builder().dispose_previous_watcher(true).build());
    let (subscriber, reporter) = install(&host, &config);
    let service = host.service().unwrap();

    let old = Arc::new(MemoryWorkspace::new("/src/old"));
    add_file(&old, "/src/old/a.cpp", &project("old", 0));
    let new = Arc::new(MemoryWorkspace::new("/src/new"));

    service.activate(Some(Arc::clone(&old)));
    service.activate(Some(Arc::clone(&new)));

    assert_eq!(old.indexing_observer_count(), 0);
    assert_eq!(new.indexing_observer_count(), 1);
    assert!(subscriber.retired_watchers().is_empty());

    run_indexing(&old);
    subscriber.wait_idle().await;
    assert!(reporter.is_empty());
}

#[tokio::test]
async fn test_overlapping_passes_run_concurrently_by_default() {
    let host = MemoryHost::new();
    let (subscriber, reporter) = install(&host, &Config::default());

    let ws = Arc::new(MemoryWorkspace::new("/src/app").with_query_delay(Duration::from_millis(50)));
    add_file(&ws, "/src/app/a.cpp", &project("a", 0));
    host.service().unwrap().activate(Some(Arc::clone(&ws)));

    run_indexing(&ws);
    run_indexing(&ws);
    let outcomes = subscriber.wait_idle().await;

    assert_eq!(outcomes.len(), 2);
    assert_eq!(reporter.len(), 2);
}

#[tokio::test]
async fn test_new_completion_cancels_in_flight_pass_when_configured() {
    let host = MemoryHost::new();
    let config = config_with(WatcherConfig::builder().cancel_in_flight(true).build());
    let (subscriber, reporter) = install(&host, &config);

    let ws = Arc::new(MemoryWorkspace::new("/src/app").with_query_delay(Duration::from_millis(50)));
    add_file(&ws, "/src/app/a.cpp", &project("a", 0));
    host.service().unwrap().activate(Some(Arc::clone(&ws)));

    run_indexing(&ws);
    run_indexing(&ws);
    let outcomes = subscriber.wait_idle().await;

    assert_eq!(subscriber.active_watcher().unwrap().passes_started(), 2);
    assert_eq!(outcomes.len(), 1);
    assert_eq!(reporter.len(), 1);
}

#[tokio::test]
async fn test_workspace_without_indexing_service_installs_no_watcher() {
    let host = MemoryHost::new();
    let (subscriber, reporter) = install(&host, &Config::default());

    let ws = Arc::new(MemoryWorkspace::new("/src/app").without_indexing_service());
    assert_err!(ws.subscribe_indexing_changed(Arc::new(|_: &IndexingChanged| {})));
    host.service().unwrap().activate(Some(Arc::clone(&ws)));

    assert!(subscriber.active_watcher().is_none());
    assert!(reporter.is_empty());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_notifications_from_foreign_thread() {
    let host = MemoryHost::new();
    let (subscriber, reporter) = install(&host, &Config::default());

    let ws = Arc::new(MemoryWorkspace::new("/src/app"));
    let b = project("b", 0);
    add_file(&ws, "/src/app/b.cpp", &b);
    host.service().unwrap().activate(Some(Arc::clone(&ws)));

    let indexer = Arc::clone(&ws);
    assert_ok!(std::thread::spawn(move || run_indexing(&indexer)).join());

    subscriber.wait_idle().await;
    assert_eq!(reporter.notices()[0].project, Some(b.id()));
}

#[tokio::test]
async fn test_shutdown_detaches_everything() {
    let host = MemoryHost::new();
    let (subscriber, reporter) = install(&host, &Config::default());
    let service = host.service().unwrap();

    let ws = Arc::new(MemoryWorkspace::new("/src/app"));
    add_file(&ws, "/src/app/a.cpp", &project("a", 0));
    service.activate(Some(Arc::clone(&ws)));

    subscriber.shutdown();
    assert_eq!(service.observer_count(), 0);
    assert_eq!(ws.indexing_observer_count(), 0);
    assert!(subscriber.active_watcher().is_none());

    run_indexing(&ws);
    subscriber.wait_idle().await;
    assert!(reporter.is_empty());
}
