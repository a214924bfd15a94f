//! End-to-end task flows through the in-memory marketplace.

use super::helpers::{Services, services};
use rstest::rstest;
use taskforce::task::{
    domain::{ActionRequest, Actor, OpinionDraft, TaskDomainError, TaskStatus, UserId},
    services::{TaskListFilter, TaskWorkflowError, UserRole},
};

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn task_runs_from_posting_to_completion(services: Services) {
    let client = UserId::new();
    let performer = services.performer().await;
    let task = services.post(client, "Move a sofa").await;

    let started = services
        .workflow
        .transition_request(
            task.id(),
            ActionRequest::Start { performer_id: performer },
            Actor::new(client),
        )
        .await
        .expect("start should succeed");
    let completed = services
        .workflow
        .transition_request(
            task.id(),
            ActionRequest::Complete {
                opinion: Some(OpinionDraft::new(5, "Careful and quick").expect("valid")),
            },
            Actor::new(client),
        )
        .await
        .expect("completion should succeed");

    assert_eq!(started.status(), TaskStatus::InProgress);
    assert_eq!(completed.previous_status, TaskStatus::InProgress);
    assert_eq!(completed.status(), TaskStatus::Complete);
    assert_eq!(completed.task.version(), task.version() + 2);
    let opinion = services
        .lifecycle
        .find_opinion(task.id())
        .await
        .expect("lookup succeeds")
        .expect("opinion stored");
    assert_eq!(opinion.rate().value(), 5);
    assert_eq!(opinion.comment(), "Careful and quick");
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn closed_tasks_cannot_be_reopened(services: Services) {
    let client = UserId::new();
    let performer = services.performer().await;
    let task = services.refuse(client, performer).await;

    for request in [
        ActionRequest::Cancel,
        ActionRequest::Fail,
        ActionRequest::Start { performer_id: performer },
    ] {
        let result = services
            .workflow
            .transition_request(task.id(), request, Actor::new(client))
            .await;
        assert!(
            matches!(
                result,
                Err(TaskWorkflowError::Domain(TaskDomainError::InvalidTransition {
                    from: TaskStatus::Deny,
                    ..
                }))
            ),
            "unexpected result: {result:?}"
        );
    }
    let stored = services
        .lifecycle
        .find_task(task.id())
        .await
        .expect("lookup succeeds");
    assert_eq!(stored, Some(task));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn client_and_contractor_see_their_own_buckets(services: Services) {
    let client = UserId::new();
    let performer = services.performer().await;
    let posted = services.post(client, "Paint a fence").await;
    let active = services.start(client, performer).await;
    let finished = services.complete(client, performer, 4).await;

    let list = |user, role, filter| services.lifecycle.list_for_user(user, role, filter);
    let client_new = list(client, UserRole::Client, TaskListFilter::New)
        .await
        .expect("listing succeeds");
    let contractor_active = list(performer, UserRole::Contractor, TaskListFilter::InProgress)
        .await
        .expect("listing succeeds");
    let contractor_closed = list(performer, UserRole::Contractor, TaskListFilter::Closed)
        .await
        .expect("listing succeeds");
    let contractor_new = list(performer, UserRole::Contractor, TaskListFilter::New)
        .await
        .expect("listing succeeds");

    assert_eq!(client_new, vec![posted]);
    assert_eq!(contractor_active, vec![active]);
    assert_eq!(contractor_closed, vec![finished]);
    assert!(contractor_new.is_empty());
    assert!(services.lifecycle.is_busy(performer).await.expect("query"));
}
