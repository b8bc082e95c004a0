use chrono::{Duration, Utc};
use futures::future::join_all;
use sonar_core::{Job, JobParameters, JobStatus, ScanError};
use sonar_store::{JobStore, MemoryJobStore, Reaper};
use std::sync::Arc;

fn job_for(user_id: &str) -> Job {
    Job::new(user_id, JobParameters::new("192.168.1.0/24"))
}

#[tokio::test]
async fn concurrent_writers_and_readers_see_consistent_state() {
    let store = Arc::new(MemoryJobStore::new());

    let jobs: Vec<Job> = (0..50).map(|i| job_for(&format!("user-{}", i % 5))).collect();
    let writes = jobs.iter().map(|job| {
        let store = store.clone();
        let job = job.clone();
        tokio::spawn(async move { store.save_job(&job).await })
    });
    for outcome in join_all(writes).await {
        outcome.expect("task joins").expect("save job");
    }

    let reads = jobs.iter().map(|job| {
        let store = store.clone();
        let id = job.id.clone();
        tokio::spawn(async move { store.get_job(&id).await })
    });
    for outcome in join_all(reads).await {
        let job = outcome.expect("task joins").expect("get job");
        assert_eq!(job.status, JobStatus::Pending);
    }

    assert_eq!(store.job_count().await, 50);
    let user_jobs = store.list_jobs("user-3", 100, 0).await.expect("list jobs");
    assert_eq!(user_jobs.len(), 10);
    assert!(user_jobs.iter().all(|job| job.user_id == "user-3"));
}

#[tokio::test]
async fn list_is_newest_first_and_paginated() {
    let store = MemoryJobStore::new();
    let base = Utc::now();

    let mut ids = Vec::new();
    for minutes in 0..5 {
        let mut job = job_for("alice");
        job.created_at = base + Duration::minutes(minutes);
        store.save_job(&job).await.expect("save job");
        ids.push(job.id);
    }
    store.save_job(&job_for("bob")).await.expect("save other user");

    let page = store.list_jobs("alice", 2, 1).await.expect("list page");
    let page_ids: Vec<&str> = page.iter().map(|job| job.id.as_str()).collect();
    assert_eq!(page_ids, vec![ids[3].as_str(), ids[2].as_str()]);

    assert!(store.list_jobs("alice", 10, 10).await.expect("past end").is_empty());
    assert!(store.list_jobs("alice", 0, 0).await.expect("zero limit").is_empty());
    assert_eq!(store.list_jobs("", 100, 0).await.expect("all users").len(), 6);
}

#[tokio::test]
async fn get_missing_job_is_not_found() {
    let store = MemoryJobStore::new();
    let err = store.get_job("does-not-exist").await.unwrap_err();
    assert!(matches!(err, ScanError::NotFound(_)));
    assert_eq!(err.to_string(), "not found: scan with ID does-not-exist not found");
}

#[tokio::test]
async fn reaper_purges_alongside_live_traffic() {
    let store = Arc::new(MemoryJobStore::new());

    let mut stale = job_for("alice");
    stale.created_at = Utc::now() - Duration::days(8);
    store.save_job(&stale).await.expect("save stale");

    let reaper = Reaper::new(store.clone(), std::time::Duration::from_secs(7 * 24 * 3600));

    let writers = (0..10).map(|_| {
        let store = store.clone();
        tokio::spawn(async move { store.save_job(&job_for("alice")).await })
    });
    let (stats, writes) = tokio::join!(reaper.run_once(), join_all(writers));
    for outcome in writes {
        outcome.expect("task joins").expect("save job");
    }

    assert_eq!(stats.jobs, 1);
    assert_eq!(store.job_count().await, 10);
}
