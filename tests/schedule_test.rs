//! Integration tests for job registration, background runs and the scheduler

mod common;

use common::{seed, Detail, ScriptedSource};
use cristin_sync::adapters::database::MemoryStore;
use cristin_sync::config::{JobSpec, JobType, ScheduleConfig, SyncConfig};
use cristin_sync::core::context::Principal;
use cristin_sync::core::engine::SyncEngine;
use cristin_sync::core::progress::NoopProgress;
use cristin_sync::core::schedule::job::{DESCRIPTOR_IMPORT, DESCRIPTOR_UPDATE};
use cristin_sync::core::schedule::{
    jobs_from_config, upsert_scheduled_job, JobConfig, JobStore, MemoryJobStore, Scheduler,
};
use cristin_sync::core::tasks::{TaskRunner, IMPORT_STARTED_MESSAGE};
use cristin_sync::domain::EntityKind;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;

fn spec(name: &str, cron: &str, kind: &str) -> JobSpec {
    JobSpec {
        name: name.to_string(),
        cron: cron.to_string(),
        kind: kind.to_string(),
        job_type: JobType::Update,
        institution: None,
        enabled: true,
        run_as: None,
        description: None,
    }
}

#[tokio::test]
async fn test_default_jobs_are_registered() {
    let store = MemoryJobStore::new();
    for request in jobs_from_config(&ScheduleConfig::default()).unwrap() {
        upsert_scheduled_job(&store, request).await.unwrap();
    }

    let jobs = store.list().await.unwrap();
    let names: Vec<_> = jobs.iter().map(|j| j.name.as_str()).collect();
    assert_eq!(
        names,
        vec![
            "import-institutions",
            "import-persons",
            "import-projects",
            "import-results",
            "import-units"
        ]
    );

    let persons = store.get("import-persons").await.unwrap().unwrap();
    assert_eq!(persons.cron, "30 0 * * *");
    assert_eq!(persons.time_zone, "GMT+1:00");
    assert_eq!(persons.descriptor, DESCRIPTOR_UPDATE);
    assert_eq!(persons.description, "Update Cristin Repo \"no.item.cristin.persons\"");
    assert_eq!(persons.run_as, Principal::system_su());
    assert_eq!(persons.config, JobConfig::update(EntityKind::Persons));
}

#[tokio::test]
async fn test_configured_jobs_override_and_extend_defaults() {
    let mut config = ScheduleConfig::default();
    let mut disabled = spec("import-units", "0 2 * * *", "units");
    disabled.enabled = false;
    let mut results = spec("import-results-185", "15 4 * * *", "results");
    results.job_type = JobType::Import;
    results.institution = Some("185".to_string());
    results.run_as = Some("user:cristin:importer".to_string());
    config.jobs = vec![disabled, results];

    let store = MemoryJobStore::new();
    for request in jobs_from_config(&config).unwrap() {
        upsert_scheduled_job(&store, request).await.unwrap();
    }

    assert_eq!(store.list().await.unwrap().len(), 6);
    assert!(!store.get("import-units").await.unwrap().unwrap().enabled);

    let import = store.get("import-results-185").await.unwrap().unwrap();
    assert_eq!(import.descriptor, DESCRIPTOR_IMPORT);
    assert_eq!(import.run_as, Principal::new("cristin", "importer"));
    assert_eq!(import.config.institution(), Some("185"));
}

#[tokio::test]
async fn test_reregistering_keeps_principal_and_creation_time() {
    let store = MemoryJobStore::new();
    let mut requests = jobs_from_config(&ScheduleConfig::default()).unwrap();
    let mut request = requests.remove(0);
    request.run_as = Some(Principal::new("cristin", "ops"));
    let first = upsert_scheduled_job(&store, request.clone()).await.unwrap();

    request.run_as = None;
    request.cron = "45 0 * * *".to_string();
    let second = upsert_scheduled_job(&store, request).await.unwrap();

    assert_eq!(second.run_as, Principal::new("cristin", "ops"));
    assert_eq!(second.cron, "45 0 * * *");
    assert_eq!(second.created_at, first.created_at);
    assert_eq!(store.list().await.unwrap().len(), 1);
}

fn runner(source: ScriptedSource, store: Arc<MemoryStore>) -> TaskRunner {
    let engine = SyncEngine::new(Arc::new(source), store, Arc::new(NoopProgress), SyncConfig::default());
    TaskRunner::new(Arc::new(engine))
}

#[tokio::test]
async fn test_import_all_acknowledges_and_runs() {
    let store = Arc::new(MemoryStore::new());
    seed(&store, EntityKind::Persons, "1", json!({"name": "A"})).await;
    let source = ScriptedSource::new().with_detail("1", Detail::Found(json!({"name": "A2"})));

    let task = runner(source, store.clone()).import_all(EntityKind::Persons).unwrap();
    assert_eq!(task.ack.message, IMPORT_STARTED_MESSAGE);
    assert_eq!(task.ack.kind, EntityKind::Persons);

    let report = task.wait().await.unwrap().unwrap();
    assert_eq!(report.update_tally().unwrap().changed, 1);
    assert_eq!(
        store.record_by_external_id(EntityKind::Persons, "1").unwrap().payload,
        json!({"name": "A2"})
    );
}

#[tokio::test]
async fn test_kind_is_released_after_run() {
    let store = Arc::new(MemoryStore::new());
    let runner = runner(ScriptedSource::new(), store);

    let task = runner.import_all(EntityKind::Units).unwrap();
    task.wait().await.unwrap();
    assert!(runner.busy_kinds().is_empty());

    let again = runner.import_all(EntityKind::Units).unwrap();
    assert!(again.wait().await.unwrap().unwrap().is_completed());
}

#[tokio::test]
async fn test_scheduler_stops_on_shutdown() {
    let jobs: Arc<dyn JobStore> = Arc::new(MemoryJobStore::new());
    for request in jobs_from_config(&ScheduleConfig::default()).unwrap() {
        upsert_scheduled_job(jobs.as_ref(), request).await.unwrap();
    }
    let scheduler = Scheduler::new(jobs, Arc::new(runner(ScriptedSource::new(), Arc::new(MemoryStore::new()))));

    let (tx, rx) = watch::channel(false);
    let handle = tokio::spawn(async move { scheduler.run(rx).await });

    tokio::time::sleep(Duration::from_millis(50)).await;
    tx.send(true).unwrap();

    let result = tokio::time::timeout(Duration::from_secs(5), handle)
        .await
        .expect("scheduler did not stop")
        .unwrap();
    assert!(result.is_ok());
}
