use std::time::Duration;

use chrono::Utc;
use serde_json::json;
use sqlx::SqlitePool;

use jobflow::jobs::{JobStatus, JobsRepo, NewJob};

fn new_job(task_name: &str, payload: serde_json::Value) -> NewJob {
    NewJob {
        task_name: task_name.to_string(),
        payload,
        priority: "Medium".to_string(),
    }
}

#[sqlx::test(migrations = "./migrations")]
async fn create_assigns_unique_increasing_ids(pool: SqlitePool) {
    let repo = JobsRepo::new(pool);

    let first = repo
        .create(new_job("send-email", json!({"to": "a@example.com"})))
        .await
        .unwrap();
    let second = repo
        .create(new_job("resize-image", json!({"width": 200})))
        .await
        .unwrap();
    let third = repo
        .create(new_job("send-email", json!({"to": "b@example.com"})))
        .await
        .unwrap();

    assert_eq!(first, 1, "fresh store starts ids at 1");
    assert!(second > first && third > second, "ids must only grow");
}

#[sqlx::test(migrations = "./migrations")]
async fn created_job_starts_pending_with_equal_timestamps(pool: SqlitePool) {
    let repo = JobsRepo::new(pool);

    let id = repo
        .create(new_job("send-email", json!({"to": "a@example.com"})))
        .await
        .unwrap();

    let job = repo.get(id).await.unwrap().expect("job must exist");
    assert_eq!(job.task_name, "send-email");
    assert_eq!(job.priority, "Medium");
    assert_eq!(job.status, "pending");
    assert_eq!(job.created_at, job.updated_at);
}

#[sqlx::test(migrations = "./migrations")]
async fn payload_round_trips_through_text_storage(pool: SqlitePool) {
    let repo = JobsRepo::new(pool);

    let payload = json!({
        "to": "a@example.com",
        "attempts": [1, 2, 3],
        "meta": { "note": null, "ratio": 0.5, "tags": ["a", "b"] }
    });

    let id = repo.create(new_job("send-email", payload.clone())).await.unwrap();
    let job = repo.get(id).await.unwrap().expect("job must exist");

    let decoded: serde_json::Value = serde_json::from_str(&job.payload).unwrap();
    assert_eq!(decoded, payload, "stored text must decode to the original value");
}

#[sqlx::test(migrations = "./migrations")]
async fn list_is_empty_on_a_fresh_store(pool: SqlitePool) {
    let repo = JobsRepo::new(pool);
    assert!(repo.list().await.unwrap().is_empty());
}

#[sqlx::test(migrations = "./migrations")]
async fn list_returns_newest_first(pool: SqlitePool) {
    let repo = JobsRepo::new(pool);

    for task in ["first", "second", "third"] {
        repo.create(new_job(task, json!({}))).await.unwrap();
    }

    let jobs = repo.list().await.unwrap();
    let ids: Vec<i64> = jobs.iter().map(|j| j.id).collect();
    assert_eq!(ids, vec![3, 2, 1]);
    assert_eq!(jobs[0].task_name, "third");
}

#[sqlx::test(migrations = "./migrations")]
async fn get_missing_returns_none(pool: SqlitePool) {
    let repo = JobsRepo::new(pool);
    assert!(repo.get(999).await.unwrap().is_none());
}

#[sqlx::test(migrations = "./migrations")]
async fn set_status_overwrites_and_touches_updated_at(pool: SqlitePool) {
    let repo = JobsRepo::new(pool);

    let id = repo.create(new_job("send-email", json!({}))).await.unwrap();

    // The store does not police transitions; any status write lands.
    tokio::time::sleep(Duration::from_millis(10)).await;
    let rows = repo
        .set_status(id, JobStatus::Completed, Utc::now())
        .await
        .unwrap();
    assert_eq!(rows, 1);

    let job = repo.get(id).await.unwrap().expect("job must exist");
    assert_eq!(job.status, "completed");
    assert!(
        job.updated_at > job.created_at,
        "status write must advance updated_at"
    );
}

#[sqlx::test(migrations = "./migrations")]
async fn set_status_on_missing_job_touches_nothing(pool: SqlitePool) {
    let repo = JobsRepo::new(pool);
    let rows = repo
        .set_status(42, JobStatus::Running, Utc::now())
        .await
        .unwrap();
    assert_eq!(rows, 0);
}
