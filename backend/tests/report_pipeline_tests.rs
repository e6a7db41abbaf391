//! End-to-end tests for report generation over the in-memory repository.

mod support;

use std::sync::Arc;
use std::time::Duration;

use store_uptime::config::ReportConfig;
use store_uptime::db::{LocalRepository, ReportRepository};
use store_uptime::models::{ReportId, ReportStatus};
use store_uptime::services::report_csv::{self, REPORT_CSV_HEADER};
use store_uptime::services::{get_report, ReportOutcome, ReportPipeline, ReportProgress};

async fn run_to_completion(
    repo: Arc<LocalRepository>,
    config: ReportConfig,
    now: chrono::DateTime<chrono::Utc>,
) -> String {
    let pipeline = ReportPipeline::new(repo.clone(), config);
    let id = ReportId::generate();
    repo.create_report(id).await.unwrap();
    assert_eq!(pipeline.run_at(id, now).await, ReportStatus::Complete);

    match get_report(repo.as_ref(), id).await.unwrap() {
        ReportOutcome::Complete(csv) => csv,
        other => panic!("expected a complete report, got {:?}", other),
    }
}

#[tokio::test]
async fn test_monday_scenario_report() {
    let csv = run_to_completion(
        support::monday_scenario(),
        ReportConfig::default(),
        support::scenario_now(),
    )
    .await;

    let mut lines = csv.lines();
    assert_eq!(lines.next(), Some(REPORT_CSV_HEADER));
    let rows: Vec<&str> = lines.collect();
    assert_eq!(rows, support::MONDAY_SCENARIO_ROWS);
}

#[tokio::test]
async fn test_small_batches_cover_whole_fleet() {
    let now = support::utc(2024, 1, 15, 12);
    let repo = support::uniform_fleet(7, now);
    let csv = run_to_completion(repo, ReportConfig::default().with_batch_size(3), now).await;

    let records = report_csv::parse(&csv).unwrap();
    let ids: Vec<i64> = records.iter().map(|r| r.store_id.value()).collect();
    assert_eq!(ids, (1..=7).collect::<Vec<_>>());
    for record in &records {
        assert_eq!(record.uptime_last_hour + record.downtime_last_hour, 0);
        assert_eq!(record.downtime_last_day, 60);
        assert_eq!(record.downtime_last_week, 60);
    }
}

#[tokio::test]
async fn test_rerun_over_unchanged_data_is_identical() {
    let repo = support::monday_scenario();
    let now = support::scenario_now();

    let first = run_to_completion(repo.clone(), ReportConfig::default(), now).await;
    let second =
        run_to_completion(repo, ReportConfig::default().with_batch_size(1), now).await;

    let mut a = report_csv::parse(&first).unwrap();
    let mut b = report_csv::parse(&second).unwrap();
    a.sort_by_key(|r| r.store_id);
    b.sort_by_key(|r| r.store_id);
    assert_eq!(a, b);
}

#[tokio::test]
async fn test_progress_reaches_fleet_size() {
    let now = support::utc(2024, 1, 15, 12);
    let pipeline = ReportPipeline::new(
        support::uniform_fleet(5, now),
        ReportConfig::default().with_batch_size(2),
    );
    let progress = ReportProgress::new();
    pipeline.compute(now, &progress).await.unwrap();
    assert_eq!(progress.processed(), 5);
    assert_eq!(progress.percent(), 100);
}

#[tokio::test]
async fn test_unreadable_observations_end_in_error() {
    let repo = support::monday_scenario();
    repo.set_observations_unavailable(true);
    let pipeline = Arc::new(ReportPipeline::new(repo.clone(), ReportConfig::default()));

    let (id, handle) = pipeline.trigger().await.unwrap();
    assert_eq!(handle.await.unwrap(), ReportStatus::Error);
    assert_eq!(get_report(repo.as_ref(), id).await.unwrap(), ReportOutcome::Error);
}

#[tokio::test]
async fn test_trigger_fails_when_job_store_is_down() {
    let repo = support::monday_scenario();
    repo.set_healthy(false);
    let pipeline = Arc::new(ReportPipeline::new(repo.clone(), ReportConfig::default()));

    assert!(pipeline.trigger().await.is_err());
    assert_eq!(repo.report_count(), 0);
}

#[tokio::test]
async fn test_job_is_running_until_pipeline_finishes() {
    let repo = support::monday_scenario();
    repo.set_read_delay(Some(Duration::from_millis(200)));
    let pipeline = Arc::new(ReportPipeline::new(repo.clone(), ReportConfig::default()));

    let (id, handle) = pipeline.trigger().await.unwrap();
    assert_eq!(get_report(repo.as_ref(), id).await.unwrap(), ReportOutcome::Running);

    handle.await.unwrap();
    assert!(matches!(
        get_report(repo.as_ref(), id).await.unwrap(),
        ReportOutcome::Complete(_)
    ));
}

#[tokio::test]
async fn test_concurrent_jobs_are_independent() {
    let repo = support::monday_scenario();
    let pipeline = Arc::new(ReportPipeline::new(repo.clone(), ReportConfig::default()));

    let (first, h1) = pipeline.trigger().await.unwrap();
    let (second, h2) = pipeline.trigger().await.unwrap();
    assert_ne!(first, second);

    let (s1, s2) = tokio::join!(h1, h2);
    assert_eq!(s1.unwrap(), ReportStatus::Complete);
    assert_eq!(s2.unwrap(), ReportStatus::Complete);
    assert_eq!(repo.report_count(), 2);
}
