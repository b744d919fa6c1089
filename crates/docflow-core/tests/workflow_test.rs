//! Workflow engine behavior against the in-memory store.
//!
//! Covers the document lifecycle end to end: submission, approval,
//! forwarding provenance, responses, role-scoped listings, and the
//! optimistic concurrency guard.

use std::sync::Arc;

use chrono::{Datelike, Utc};
use docflow_core::memory::MemoryStore;
use docflow_core::{
    CreateDocumentRequest, DocumentStatus, Error, ForwardRequest, Priority, ReleaseQuery,
    RespondRequest, Scope, StatusUpdate, User, UserRole, WorkflowEngine,
};

struct Fixture {
    store: Arc<MemoryStore>,
    engine: WorkflowEngine,
    owner: User,
}

fn fixture() -> Fixture {
    let store = Arc::new(MemoryStore::new());
    store.seed_department("HR");
    store.seed_department("Finance");
    store.seed_division("Payroll", "HR");
    let mut owner = store.seed_user("jdoe", "secret-pass", UserRole::Employee, Some("HR"));
    owner.division = Some("Payroll".to_string());
    store.put_user(owner.clone());
    let engine = WorkflowEngine::new(store.clone(), store.clone());
    Fixture {
        store,
        engine,
        owner,
    }
}

fn leave_request(user_id: i64) -> CreateDocumentRequest {
    CreateDocumentRequest {
        doc_type: "Leave Request".to_string(),
        user_id,
        priority: Priority::High,
        payload: Some(b"%PDF-1.4".to_vec()),
        description: Some("Two weeks in March".to_string()),
    }
}

fn set_status(status: DocumentStatus) -> StatusUpdate {
    StatusUpdate {
        status: Some(status),
        actor: Some("Admin Ann".to_string()),
        ..Default::default()
    }
}

fn forward_to(id: i64, department: &str) -> ForwardRequest {
    ForwardRequest {
        document_id: id,
        target_department: department.to_string(),
        notes: Some("Please review budget".to_string()),
        forwarder_department: Some("HR".to_string()),
        forwarder_name: Some("Admin Ann".to_string()),
    }
}

// =============================================================================
// CREATE
// =============================================================================

#[tokio::test]
async fn test_create_starts_pending_with_fresh_id() {
    let f = fixture();
    let a = f.engine.create(leave_request(f.owner.id)).await.unwrap();
    let b = f.engine.create(leave_request(f.owner.id)).await.unwrap();

    assert_eq!(a.status, DocumentStatus::Pending);
    assert_eq!(a.version, 1);
    assert_eq!(a.department.as_deref(), Some("HR"));
    assert!(!a.is_forwarded_request);
    assert_ne!(a.id, b.id);
}

#[tokio::test]
async fn test_create_requires_type_and_known_owner() {
    let f = fixture();

    let mut blank = leave_request(f.owner.id);
    blank.doc_type = "   ".to_string();
    let err = f.engine.create(blank).await.unwrap_err();
    assert!(matches!(err, Error::InvalidInput(_)), "got {:?}", err);

    let err = f.engine.create(leave_request(9999)).await.unwrap_err();
    assert!(matches!(err, Error::InvalidInput(_)), "got {:?}", err);
}

// =============================================================================
// STATUS WRITES
// =============================================================================

#[tokio::test]
async fn test_illegal_transitions_are_rejected() {
    let f = fixture();
    let doc = f.engine.create(leave_request(f.owner.id)).await.unwrap();

    let err = f
        .engine
        .update_status(doc.id, set_status(DocumentStatus::Released))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        Error::InvalidTransition {
            from: DocumentStatus::Pending,
            to: DocumentStatus::Released
        }
    ));

    f.engine.archive(doc.id, None).await.unwrap();
    let err = f
        .engine
        .update_status(doc.id, set_status(DocumentStatus::Pending))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::InvalidTransition { .. }));
}

#[tokio::test]
async fn test_received_is_reachable_only_by_forwarding() {
    let f = fixture();
    let doc = f.engine.create(leave_request(f.owner.id)).await.unwrap();

    let err = f
        .engine
        .update_status(doc.id, set_status(DocumentStatus::Received))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::InvalidInput(_)));
}

#[tokio::test]
async fn test_update_status_records_actor_and_comments() {
    let f = fixture();
    let doc = f.engine.create(leave_request(f.owner.id)).await.unwrap();

    let updated = f
        .engine
        .update_status(
            doc.id,
            StatusUpdate {
                status: Some(DocumentStatus::Revision),
                comments: Some("Missing signature".to_string()),
                actor: Some("Admin Ann".to_string()),
                expected_version: None,
            },
        )
        .await
        .unwrap();

    assert_eq!(updated.status, DocumentStatus::Revision);
    assert_eq!(updated.comments.as_deref(), Some("Missing signature"));
    assert_eq!(updated.updated_by.as_deref(), Some("Admin Ann"));
    assert_eq!(updated.version, 2);
}

#[tokio::test]
async fn test_stale_version_is_a_conflict() {
    let f = fixture();
    let doc = f.engine.create(leave_request(f.owner.id)).await.unwrap();

    let approved = f
        .engine
        .update_status(
            doc.id,
            StatusUpdate {
                expected_version: Some(doc.version),
                ..set_status(DocumentStatus::Approved)
            },
        )
        .await
        .unwrap();
    assert_eq!(approved.version, doc.version + 1);

    // A second writer still holding version 1
    let err = f
        .engine
        .update_status(
            doc.id,
            StatusUpdate {
                comments: Some("late note".to_string()),
                expected_version: Some(doc.version),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Conflict(_)), "got {:?}", err);
}

#[tokio::test]
async fn test_noop_update_does_not_write() {
    let f = fixture();
    let doc = f.engine.create(leave_request(f.owner.id)).await.unwrap();

    let same = f
        .engine
        .update_status(doc.id, StatusUpdate::default())
        .await
        .unwrap();
    assert_eq!(same.version, doc.version);
}

#[tokio::test]
async fn test_release_and_resubmit_follow_the_table() {
    let f = fixture();
    let doc = f.engine.create(leave_request(f.owner.id)).await.unwrap();

    let err = f.engine.release(doc.id, None).await.unwrap_err();
    assert!(matches!(err, Error::InvalidTransition { .. }));

    f.engine
        .update_status(doc.id, set_status(DocumentStatus::Approved))
        .await
        .unwrap();
    let released = f
        .engine
        .release(doc.id, Some("Rel Ray".to_string()))
        .await
        .unwrap();
    assert_eq!(released.status, DocumentStatus::Released);
    assert_eq!(released.updated_by.as_deref(), Some("Rel Ray"));

    let other = f.engine.create(leave_request(f.owner.id)).await.unwrap();
    f.engine
        .update_status(other.id, set_status(DocumentStatus::Revision))
        .await
        .unwrap();
    let again = f
        .engine
        .resubmit(other.id, Some("Signed now".to_string()))
        .await
        .unwrap();
    assert_eq!(again.status, DocumentStatus::Pending);
    assert_eq!(again.comments.as_deref(), Some("Signed now"));
}

#[tokio::test]
async fn test_archive_is_idempotent() {
    let f = fixture();
    let doc = f.engine.create(leave_request(f.owner.id)).await.unwrap();

    let first = f.engine.archive(doc.id, None).await.unwrap();
    let second = f.engine.archive(doc.id, None).await.unwrap();
    assert_eq!(first.status, DocumentStatus::Archived);
    assert_eq!(first.version, second.version);
}

#[tokio::test]
async fn test_delete_then_get_is_not_found() {
    let f = fixture();
    let doc = f.engine.create(leave_request(f.owner.id)).await.unwrap();

    f.engine.delete(doc.id).await.unwrap();
    assert!(matches!(
        f.engine.get(doc.id).await.unwrap_err(),
        Error::DocumentNotFound(id) if id == doc.id
    ));
    assert!(matches!(
        f.engine.delete(doc.id).await.unwrap_err(),
        Error::DocumentNotFound(_)
    ));
}

// =============================================================================
// FORWARD AND RESPOND
// =============================================================================

#[tokio::test]
async fn test_leave_request_forwarded_to_finance() {
    let f = fixture();
    let doc = f.engine.create(leave_request(f.owner.id)).await.unwrap();
    f.engine
        .update_status(doc.id, set_status(DocumentStatus::Approved))
        .await
        .unwrap();

    let forwarded = f.engine.forward(forward_to(doc.id, "Finance")).await.unwrap();

    assert_eq!(forwarded.status, DocumentStatus::Received);
    assert!(forwarded.is_forwarded_request);
    assert_eq!(forwarded.department.as_deref(), Some("Finance"));
    assert_eq!(forwarded.forwarded_from.as_deref(), Some("HR"));
    assert_eq!(forwarded.forwarded_by_admin.as_deref(), Some("Admin Ann"));
    assert_eq!(forwarded.comments.as_deref(), Some("Please review budget"));
}

#[tokio::test]
async fn test_reforward_records_previous_custodian() {
    let f = fixture();
    f.store.seed_department("Legal");
    let doc = f.engine.create(leave_request(f.owner.id)).await.unwrap();

    f.engine.forward(forward_to(doc.id, "Finance")).await.unwrap();
    let again = f.engine.forward(forward_to(doc.id, "Legal")).await.unwrap();

    assert_eq!(again.department.as_deref(), Some("Legal"));
    assert_eq!(again.forwarded_from.as_deref(), Some("Finance"));
}

#[tokio::test]
async fn test_forward_falls_back_to_forwarder_department() {
    let f = fixture();
    let orphan = f
        .store
        .seed_user("nodept", "secret-pass", UserRole::Employee, None);
    let doc = f.engine.create(leave_request(orphan.id)).await.unwrap();
    assert!(doc.department.is_none());

    let forwarded = f.engine.forward(forward_to(doc.id, "Finance")).await.unwrap();
    assert_eq!(forwarded.forwarded_from.as_deref(), Some("HR"));
}

#[tokio::test]
async fn test_forward_validation() {
    let f = fixture();
    let doc = f.engine.create(leave_request(f.owner.id)).await.unwrap();

    let err = f.engine.forward(forward_to(doc.id, "")).await.unwrap_err();
    assert!(matches!(err, Error::InvalidInput(_)));

    let err = f
        .engine
        .forward(forward_to(doc.id, "Nowhere"))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::InvalidInput(_)));

    let err = f.engine.forward(forward_to(424242, "Finance")).await.unwrap_err();
    assert!(matches!(err, Error::DocumentNotFound(424242)));

    f.engine.archive(doc.id, None).await.unwrap();
    let err = f
        .engine
        .forward(forward_to(doc.id, "Finance"))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::InvalidTransition { .. }));
}

#[tokio::test]
async fn test_respond_archives_and_is_listed_for_forwarder() {
    let f = fixture();
    let doc = f.engine.create(leave_request(f.owner.id)).await.unwrap();
    f.engine.forward(forward_to(doc.id, "Finance")).await.unwrap();

    let response = f
        .engine
        .respond(RespondRequest {
            document_id: doc.id,
            responder_department: Some("Finance".to_string()),
            responder_name: Some("Fin Fay".to_string()),
            message: "Budget approved".to_string(),
        })
        .await
        .unwrap();
    assert_eq!(response.document_id, doc.id);
    assert_eq!(response.message, "Budget approved");

    let stored = f.engine.get(doc.id).await.unwrap();
    assert_eq!(stored.status, DocumentStatus::Archived);
    assert_eq!(stored.comments.as_deref(), Some("Budget approved"));

    let responses = f.engine.list_responses("hr").await.unwrap();
    assert_eq!(responses.len(), 1);
    assert_eq!(responses[0].message, "Budget approved");
    assert_eq!(responses[0].responder_department.as_deref(), Some("Finance"));
    assert_eq!(responses[0].responder_name.as_deref(), Some("Fin Fay"));
    assert!(f.engine.list_responses("Finance").await.unwrap().is_empty());
}

#[tokio::test]
async fn test_second_response_replaces_first() {
    let f = fixture();
    let doc = f.engine.create(leave_request(f.owner.id)).await.unwrap();
    f.engine.forward(forward_to(doc.id, "Finance")).await.unwrap();

    let respond = |message: &str| RespondRequest {
        document_id: doc.id,
        responder_department: None,
        responder_name: None,
        message: message.to_string(),
    };
    f.engine.respond(respond("first")).await.unwrap();
    let second = f.engine.respond(respond("second")).await.unwrap();
    assert_eq!(second.message, "second");

    let stored = f.engine.get(doc.id).await.unwrap();
    assert_eq!(stored.status, DocumentStatus::Archived);
    assert_eq!(stored.comments.as_deref(), Some("second"));

    let responses = f.engine.list_responses("HR").await.unwrap();
    assert_eq!(responses.len(), 1);
    assert_eq!(responses[0].message, "second");
}

#[tokio::test]
async fn test_later_comment_overwrites_response() {
    let f = fixture();
    let doc = f.engine.create(leave_request(f.owner.id)).await.unwrap();
    f.engine.forward(forward_to(doc.id, "Finance")).await.unwrap();
    f.engine
        .respond(RespondRequest {
            document_id: doc.id,
            responder_department: None,
            responder_name: None,
            message: "Budget approved".to_string(),
        })
        .await
        .unwrap();

    f.engine
        .update_status(
            doc.id,
            StatusUpdate {
                comments: Some("Filed".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    let responses = f.engine.list_responses("HR").await.unwrap();
    assert_eq!(responses.len(), 1);
    assert_eq!(responses[0].message, "Filed");
}

#[tokio::test]
async fn test_respond_requires_forwarded_document_and_message() {
    let f = fixture();
    let doc = f.engine.create(leave_request(f.owner.id)).await.unwrap();

    let req = |message: &str| RespondRequest {
        document_id: doc.id,
        responder_department: None,
        responder_name: None,
        message: message.to_string(),
    };
    assert!(matches!(
        f.engine.respond(req(" ")).await.unwrap_err(),
        Error::InvalidInput(_)
    ));
    assert!(matches!(
        f.engine.respond(req("ok")).await.unwrap_err(),
        Error::Conflict(_)
    ));

    // Archived without ever being forwarded
    f.engine.archive(doc.id, None).await.unwrap();
    assert!(matches!(
        f.engine.respond(req("ok")).await.unwrap_err(),
        Error::Conflict(_)
    ));
}

// =============================================================================
// LISTINGS AND STATS
// =============================================================================

#[tokio::test]
async fn test_listing_is_idempotent_and_newest_first() {
    let f = fixture();
    let first = f.engine.create(leave_request(f.owner.id)).await.unwrap();
    let second = f.engine.create(leave_request(f.owner.id)).await.unwrap();

    let scope = Scope {
        role: Some(UserRole::Admin),
        department: Some("HR".to_string()),
        ..Default::default()
    };
    let a = f.engine.list(scope.clone(), None).await.unwrap();
    let b = f.engine.list(scope, None).await.unwrap();

    assert_eq!(a, b);
    let ids: Vec<i64> = a.iter().map(|d| d.id).collect();
    assert_eq!(ids, vec![second.id, first.id]);
}

#[tokio::test]
async fn test_department_listing_includes_forwarded_out_documents() {
    let f = fixture();
    let doc = f.engine.create(leave_request(f.owner.id)).await.unwrap();
    f.engine.forward(forward_to(doc.id, "Finance")).await.unwrap();

    for dept in ["HR", "finance"] {
        let scope = Scope {
            role: Some(UserRole::Admin),
            department: Some(dept.to_string()),
            ..Default::default()
        };
        let docs = f
            .engine
            .list(scope, Some(DocumentStatus::Received))
            .await
            .unwrap();
        assert_eq!(docs.len(), 1, "department {}", dept);
    }
}

#[tokio::test]
async fn test_employee_sees_only_own_documents() {
    let f = fixture();
    let colleague = f
        .store
        .seed_user("asmith", "secret-pass", UserRole::Employee, Some("HR"));
    f.engine.create(leave_request(f.owner.id)).await.unwrap();
    f.engine.create(leave_request(colleague.id)).await.unwrap();

    let scope = Scope {
        user_id: Some(f.owner.id),
        role: Some(UserRole::Employee),
        department: Some("HR".to_string()),
    };
    let docs = f.engine.list(scope, None).await.unwrap();
    assert_eq!(docs.len(), 1);
    assert_eq!(docs[0].user_id, f.owner.id);

    let own_elsewhere = Scope {
        user_id: Some(f.owner.id),
        role: Some(UserRole::Employee),
        department: Some("Finance".to_string()),
    };
    assert!(f.engine.list(own_elsewhere, None).await.unwrap().is_empty());

    let missing_user = Scope {
        role: Some(UserRole::Employee),
        ..Default::default()
    };
    assert!(matches!(
        f.engine.list(missing_user, None).await.unwrap_err(),
        Error::InvalidInput(_)
    ));
}

#[tokio::test]
async fn test_superadmin_without_department_sees_everything() {
    let f = fixture();
    let finance = f
        .store
        .seed_user("fin", "secret-pass", UserRole::Employee, Some("Finance"));
    f.engine.create(leave_request(f.owner.id)).await.unwrap();
    f.engine.create(leave_request(finance.id)).await.unwrap();

    let scope = Scope {
        role: Some(UserRole::SuperAdmin),
        ..Default::default()
    };
    assert_eq!(f.engine.list(scope, None).await.unwrap().len(), 2);
}

#[tokio::test]
async fn test_releases_filter_by_owner_affiliation() {
    let f = fixture();
    let approved = f.engine.create(leave_request(f.owner.id)).await.unwrap();
    f.engine
        .update_status(approved.id, set_status(DocumentStatus::Approved))
        .await
        .unwrap();
    f.engine.create(leave_request(f.owner.id)).await.unwrap();

    let query = ReleaseQuery {
        department: Some("HR".to_string()),
        division: Some("Payroll".to_string()),
        owner_id: None,
    };
    let docs = f.engine.list_releases(query).await.unwrap();
    assert_eq!(docs.len(), 1);
    assert_eq!(docs[0].id, approved.id);

    let other_division = ReleaseQuery {
        department: Some("HR".to_string()),
        division: Some("Recruiting".to_string()),
        owner_id: None,
    };
    assert!(f.engine.list_releases(other_division).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_stats_count_each_status() {
    let f = fixture();
    let a = f.engine.create(leave_request(f.owner.id)).await.unwrap();
    let b = f.engine.create(leave_request(f.owner.id)).await.unwrap();
    f.engine.create(leave_request(f.owner.id)).await.unwrap();
    f.engine
        .update_status(a.id, set_status(DocumentStatus::Approved))
        .await
        .unwrap();
    f.engine.archive(b.id, None).await.unwrap();

    let stats = f
        .engine
        .stats(Scope {
            role: Some(UserRole::Admin),
            department: Some("HR".to_string()),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(stats.total, 3);
    assert_eq!(stats.pending, 1);
    assert_eq!(stats.approved, 1);
    assert_eq!(stats.received, 0);
}

#[tokio::test]
async fn test_monthly_stats_always_has_twelve_months() {
    let f = fixture();
    f.engine.create(leave_request(f.owner.id)).await.unwrap();
    f.engine.create(leave_request(f.owner.id)).await.unwrap();

    let now = Utc::now();
    let months = f
        .engine
        .monthly_stats(now.year(), Scope::default())
        .await
        .unwrap();
    assert_eq!(months.len(), 12);
    assert_eq!(months[(now.month() - 1) as usize].total, 2);
    assert_eq!(months.iter().map(|m| m.total).sum::<i64>(), 2);

    let empty = f
        .engine
        .monthly_stats(now.year() - 1, Scope::default())
        .await
        .unwrap();
    assert!(empty.iter().all(|m| m.total == 0));

    assert!(matches!(
        f.engine
            .monthly_stats(12, Scope::default())
            .await
            .unwrap_err(),
        Error::InvalidInput(_)
    ));
}
