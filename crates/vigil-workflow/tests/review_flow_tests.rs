//! End-to-end review workflow against the in-memory store.

use chrono::{DateTime, Duration, TimeZone, Utc};
use std::sync::Arc;
use uuid::Uuid;

use vigil_core::{
    Category, EngineConfig, EvidenceFile, Factor, FixedClock, InMemoryLocationDirectory,
    LocationRef, Relation, ReportDraft, RequestContext, Status,
};
use vigil_store::{MemoryStore, Pagination, ReportFilter};
use vigil_workflow::{EngineMetrics, ReviewService};

const ACCOUNT: &str = "At lunch on Friday the chicken rice served in class 4B smelled sour and twelve students vomited within an hour of eating.";

fn start() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 10, 18, 9, 0, 0).unwrap()
}

fn directory() -> InMemoryLocationDirectory {
    InMemoryLocationDirectory::new()
        .with_province("31", "DKI Jakarta")
        .with_city("3171", "Jakarta Selatan", "31")
        .with_district("317101", "Tebet", "3171")
}

fn service() -> (Arc<ReviewService>, FixedClock) {
    let clock = FixedClock::new(start());
    let service = ReviewService::new(
        Arc::new(MemoryStore::new()),
        Arc::new(directory()),
        EngineConfig::default(),
    )
    .with_clock(Arc::new(clock.clone()))
    .with_metrics(EngineMetrics::new().unwrap());
    (Arc::new(service), clock)
}

fn draft(narrative: &str) -> ReportDraft {
    ReportDraft {
        category: Category::Poisoning,
        title: "Students vomited after lunch".to_string(),
        narrative: narrative.to_string(),
        location: LocationRef {
            province_id: "31".to_string(),
            city_id: "3171".to_string(),
            district_id: Some("317101".to_string()),
            specific_location: Some("SDN Tebet 01 canteen".to_string()),
        },
        incident_at: start() - Duration::days(1),
        relation: Some(Relation::Parent),
        relation_detail: None,
        evidence: vec![
            EvidenceFile::new("photo-1", 120_000, "image/jpeg"),
            EvidenceFile::new("photo-2", 98_000, "image/jpeg"),
        ],
    }
}

fn truncated(chars: usize) -> String {
    ACCOUNT.chars().take(chars).collect()
}

#[tokio::test]
async fn test_end_to_end_review() {
    let (service, _clock) = service();
    let parent = RequestContext::reporter("parent-1");
    let admin = RequestContext::admin("admin-1");

    let err = service.submit(&parent, draft(&truncated(40))).await.unwrap_err();
    assert_eq!(err.code(), "VALIDATION_ERROR");
    assert_eq!(err.field(), Some("narrative"));

    let report = service.submit(&parent, draft(&truncated(60))).await.unwrap();
    assert_eq!(report.status, Status::Pending);
    assert_eq!(report.score.factors.len(), 6);
    assert_eq!(report.total_score, report.score.factors.iter().map(|f| f.value).sum::<u32>());

    service
        .update_status(&admin, report.id, Status::Analyzing, None)
        .await
        .unwrap();

    let err = service
        .update_status(&admin, report.id, Status::Resolved, None)
        .await
        .unwrap_err();
    assert_eq!(err.code(), "CONFLICT");
    assert_eq!(err.current_status(), Some(Status::Analyzing));

    service
        .update_status(&admin, report.id, Status::InProgress, Some("site visit booked".into()))
        .await
        .unwrap();
    service
        .update_status(&admin, report.id, Status::Resolved, None)
        .await
        .unwrap();

    let trail = service.history(&admin, report.id).await.unwrap();
    assert_eq!(trail.entries.len(), 4);
    trail.verify().unwrap();

    let resolved = service.get_report(&admin, report.id).await.unwrap();
    assert_eq!(resolved.status, Status::Resolved);
    assert_eq!(resolved.verified_by.as_deref(), Some("admin-1"));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn test_concurrent_updates_single_winner() {
    const ADMINS: usize = 8;
    let (service, _clock) = service();

    for round in 0..20 {
        let reporter = RequestContext::reporter(format!("parent-{}", round));
        let id = service.submit(&reporter, draft(ACCOUNT)).await.unwrap().id;

        let barrier = Arc::new(tokio::sync::Barrier::new(ADMINS));
        let mut handles = Vec::new();
        for i in 0..ADMINS {
            let service = Arc::clone(&service);
            let barrier = Arc::clone(&barrier);
            let admin = RequestContext::admin(format!("admin-{}", i));
            handles.push(tokio::spawn(async move {
                barrier.wait().await;
                service.update_status(&admin, id, Status::Analyzing, None).await
            }));
        }

        let mut wins = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(_) => wins += 1,
                Err(e) => {
                    assert_eq!(e.code(), "CONFLICT");
                    assert_eq!(e.current_status(), Some(Status::Analyzing));
                }
            }
        }
        assert_eq!(wins, 1, "round {}", round);

        let trail = service.history(&RequestContext::admin("admin-0"), id).await.unwrap();
        assert_eq!(trail.entries.len(), 2);
        assert_eq!(trail.current_status(), Some(Status::Analyzing));
    }
}

#[tokio::test]
async fn test_independent_reports_corroborate_each_other() {
    let (service, clock) = service();
    let admin = RequestContext::admin("admin-1");

    let first = service
        .submit(&RequestContext::reporter("parent-a"), draft(ACCOUNT))
        .await
        .unwrap();
    assert_eq!(first.score.value_of(Factor::Similarity), 0);

    clock.advance(Duration::minutes(5));
    let second = service
        .submit(&RequestContext::reporter("parent-b"), draft(ACCOUNT))
        .await
        .unwrap();
    assert_eq!(second.score.corroborators, 1);
    assert!(second.score.value_of(Factor::Similarity) > 0);

    let first = service.get_report(&admin, first.id).await.unwrap();
    assert_eq!(first.score.corroborators, 1);
    assert!(first.score.value_of(Factor::Similarity) > 0);
}

#[tokio::test]
async fn test_same_reporter_repeat_marked_duplicate() {
    let (service, clock) = service();
    let parent = RequestContext::reporter("parent-a");

    let first = service.submit(&parent, draft(ACCOUNT)).await.unwrap();
    clock.advance(Duration::minutes(5));
    let again = service.submit(&parent, draft(ACCOUNT)).await.unwrap();

    assert_eq!(again.duplicate_of(), Some(first.id));
    assert_eq!(again.score.value_of(Factor::Similarity), 0);

    let first = service.get_report(&parent, first.id).await.unwrap();
    assert_eq!(first.score.value_of(Factor::Similarity), 0);

    let stats = service.stats(&RequestContext::admin("admin-1")).await.unwrap();
    assert_eq!(stats.total, 2);
    assert_eq!(stats.duplicates, 1);
}

#[tokio::test]
async fn test_bulk_reports_each_outcome() {
    let (service, clock) = service();
    let admin = RequestContext::admin("admin-1");

    let mut ids = Vec::new();
    for i in 0..3 {
        clock.advance(Duration::minutes(1));
        let ctx = RequestContext::reporter(format!("parent-{}", i));
        ids.push(service.submit(&ctx, draft(ACCOUNT)).await.unwrap().id);
    }
    service
        .update_status(&admin, ids[2], Status::Analyzing, None)
        .await
        .unwrap();
    let missing = Uuid::new_v4();
    ids.push(missing);

    let outcome = service
        .bulk_update_status(&admin, &ids, Status::Analyzing, None)
        .await
        .unwrap();
    assert_eq!(outcome.requested, 4);
    assert_eq!(outcome.succeeded, 2);
    assert_eq!(outcome.failed, 2);

    let conflict = &outcome.results[2];
    assert!(!conflict.ok);
    assert_eq!(conflict.code.as_deref(), Some("CONFLICT"));
    assert_eq!(conflict.status, Some(Status::Analyzing));
    assert_eq!(outcome.results[3].code.as_deref(), Some("NOT_FOUND"));
}

#[tokio::test]
async fn test_evidence_resubmission_rescores() {
    let (service, _clock) = service();
    let parent = RequestContext::reporter("parent-1");
    let admin = RequestContext::admin("admin-1");

    let mut d = draft(ACCOUNT);
    d.evidence.truncate(1);
    let report = service.submit(&parent, d).await.unwrap();
    let before = report.score.value_of(Factor::Evidence);

    let files = vec![
        EvidenceFile::new("video-1", 4_000_000, "video/mp4"),
        EvidenceFile::new("receipt", 30_000, "application/pdf"),
    ];
    let err = service
        .attach_evidence(&parent, report.id, files.clone())
        .await
        .unwrap_err();
    assert_eq!(err.current_status(), Some(Status::Pending));

    service.update_status(&admin, report.id, Status::Analyzing, None).await.unwrap();
    service
        .update_status(&admin, report.id, Status::NeedsEvidence, Some("need photos".into()))
        .await
        .unwrap();

    let err = service
        .attach_evidence(&RequestContext::reporter("someone-else"), report.id, files.clone())
        .await
        .unwrap_err();
    assert_eq!(err.code(), "AUTHORIZATION_ERROR");

    let updated = service.attach_evidence(&parent, report.id, files).await.unwrap();
    assert_eq!(updated.status, Status::Analyzing);
    assert_eq!(updated.evidence.len(), 3);
    assert!(updated.score.value_of(Factor::Evidence) > before);

    let trail = service.history(&admin, report.id).await.unwrap();
    let last = trail.entries.last().unwrap();
    assert_eq!(last.from_status, Some(Status::NeedsEvidence));
    assert_eq!(last.actor, "parent-1");
}

#[tokio::test]
async fn test_rate_limit_per_source() {
    let (service, clock) = service();
    let anon = RequestContext::anonymous().with_client_key("device-7");

    for _ in 0..5 {
        clock.advance(Duration::minutes(1));
        service.submit(&anon, draft(ACCOUNT)).await.unwrap();
    }
    let err = service.submit(&anon, draft(ACCOUNT)).await.unwrap_err();
    assert_eq!(err.code(), "RATE_LIMITED");

    let other = RequestContext::anonymous().with_client_key("device-8");
    service.submit(&other, draft(ACCOUNT)).await.unwrap();

    clock.advance(Duration::minutes(61));
    service.submit(&anon, draft(ACCOUNT)).await.unwrap();
}

#[tokio::test]
async fn test_access_control() {
    let (service, _clock) = service();
    let parent = RequestContext::reporter("parent-1");
    let report = service.submit(&parent, draft(ACCOUNT)).await.unwrap();

    let err = service
        .update_status(&RequestContext::anonymous(), report.id, Status::Analyzing, None)
        .await
        .unwrap_err();
    assert_eq!(err.code(), "AUTHENTICATION_ERROR");

    let err = service
        .update_status(&parent, report.id, Status::Analyzing, None)
        .await
        .unwrap_err();
    assert_eq!(err.code(), "AUTHORIZATION_ERROR");

    let err = service
        .query(&parent, &ReportFilter::new(), Pagination::default())
        .await
        .unwrap_err();
    assert_eq!(err.code(), "AUTHORIZATION_ERROR");

    let err = service.get_scoring(&parent, report.id).await.unwrap_err();
    assert_eq!(err.code(), "AUTHORIZATION_ERROR");

    let err = service
        .get_report(&RequestContext::reporter("stranger"), report.id)
        .await
        .unwrap_err();
    assert_eq!(err.code(), "AUTHORIZATION_ERROR");
    assert!(service.get_report(&parent, report.id).await.is_ok());
}

#[tokio::test]
async fn test_query_and_breakdown() {
    let (service, clock) = service();
    let admin = RequestContext::admin("admin-1");
    for i in 0..3 {
        clock.advance(Duration::minutes(1));
        let mut d = draft(ACCOUNT);
        if i == 2 {
            d.category = Category::Distribution;
        }
        service
            .submit(&RequestContext::reporter(format!("p-{}", i)), d)
            .await
            .unwrap();
    }

    let page = service
        .query(&admin, &ReportFilter::new().category(Category::Poisoning), Pagination::new(1, 1))
        .await
        .unwrap();
    assert_eq!(page.total, 2);
    assert_eq!(page.total_pages, 2);
    assert_eq!(page.data.len(), 1);

    let err = service
        .query(&admin, &ReportFilter::new(), Pagination::new(1, 101))
        .await
        .unwrap_err();
    assert_eq!(err.code(), "VALIDATION_ERROR");

    let newest = &page.data[0];
    let breakdown = service.get_scoring(&admin, newest.id).await.unwrap();
    assert_eq!(breakdown.total, newest.total_score);
    assert_eq!(breakdown.max_total, 18);

    let table = service.thresholds();
    assert_eq!(table.max_total, 18);
    assert_eq!(table.levels.len(), 3);
}
