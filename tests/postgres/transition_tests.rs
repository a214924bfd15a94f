//! `PostgreSQL` tests for atomic transition commits.

use crate::postgres::helpers::{BoxError, PgMarketplace, pg_marketplace};
use chrono::Utc;
use rstest::rstest;
use taskforce::task::{
    domain::{
        Actor, DenyAction, FailCountIncrement, Opinion, OpinionDraft, PersistedTaskData,
        StartAction, Task, TaskDomainError, TaskStatus, UserId,
    },
    ports::{TaskRepository, TaskRepositoryError, TransitionCommit},
    services::TaskWorkflowError,
};

/// Returns `task` moved to `status` with its version bumped.
fn moved(task: &Task, status: TaskStatus) -> Task {
    Task::from_persisted(PersistedTaskData {
        id: task.id(),
        client_id: task.client_id(),
        performer_id: task.performer_id(),
        category: task.category().clone(),
        title: task.title().to_owned(),
        description: task.description().map(str::to_owned),
        status,
        expire_at: task.expire_at(),
        created_at: task.created_at(),
        updated_at: Utc::now(),
        version: task.version() + 1,
    })
}

async fn stored(marketplace: &PgMarketplace, task: &Task) -> Result<Task, BoxError> {
    TaskRepository::find_by_id(marketplace.store.as_ref(), task.id())
        .await?
        .ok_or_else(|| Box::new(std::io::Error::other("task missing")) as BoxError)
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn stale_version_commit_is_a_conflict(
    pg_marketplace: PgMarketplace,
) -> Result<(), BoxError> {
    let performer = pg_marketplace.performer().await?;
    let task = pg_marketplace.started(performer).await?;
    let before = stored(&pg_marketplace, &task).await?;
    let commit = TransitionCommit {
        task: moved(&task, TaskStatus::Fail),
        expected_version: task.version() - 1,
        opinion: None,
        fail_count_increments: Vec::new(),
    };

    let result = pg_marketplace.store.commit_transition(&commit).await;

    assert!(matches!(
        result,
        Err(TaskRepositoryError::VersionConflict { task_id, expected })
            if task_id == task.id() && expected == task.version() - 1
    ));
    assert_eq!(stored(&pg_marketplace, &task).await?, before);
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn duplicate_opinion_rolls_back_task_and_fail_count(
    pg_marketplace: PgMarketplace,
) -> Result<(), BoxError> {
    let performer = pg_marketplace.performer().await?;
    let task = pg_marketplace.started(performer).await?;
    pg_marketplace
        .execute_sql(format!(
            concat!(
                "INSERT INTO opinions (id, task_id, performer_id, rate, comment, created_at) ",
                "VALUES ('{}', '{}', '{}', 3, 'earlier', NOW())",
            ),
            uuid::Uuid::new_v4(),
            task.id(),
            performer,
        ))
        .await?;
    let before = stored(&pg_marketplace, &task).await?;
    let draft = OpinionDraft::new(5, "great")?;
    let commit = TransitionCommit {
        task: moved(&task, TaskStatus::Complete),
        expected_version: task.version(),
        opinion: Some(Opinion::from_draft(task.id(), performer, &draft, Utc::now())),
        fail_count_increments: vec![FailCountIncrement {
            performer_id: performer,
            delta: 1,
        }],
    };

    let result = pg_marketplace.store.commit_transition(&commit).await;

    assert!(matches!(
        result,
        Err(TaskRepositoryError::DuplicateOpinion(id)) if id == task.id()
    ));
    assert_eq!(stored(&pg_marketplace, &task).await?, before);
    assert_eq!(pg_marketplace.fail_count(performer).await?, 0);
    let kept = pg_marketplace.store.find_opinion_by_task(task.id()).await?;
    assert_eq!(kept.map(|opinion| opinion.comment().to_owned()), Some("earlier".to_owned()));
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn failed_fail_count_increment_rolls_back_status(
    pg_marketplace: PgMarketplace,
) -> Result<(), BoxError> {
    let performer = pg_marketplace.performer().await?;
    let task = pg_marketplace.started(performer).await?;
    let stranger = UserId::new();
    let commit = TransitionCommit {
        task: moved(&task, TaskStatus::Deny),
        expected_version: task.version(),
        opinion: None,
        fail_count_increments: vec![FailCountIncrement {
            performer_id: stranger,
            delta: 1,
        }],
    };

    let result = pg_marketplace.store.commit_transition(&commit).await;

    assert!(matches!(
        result,
        Err(TaskRepositoryError::PerformerNotFound(id)) if id == stranger
    ));
    let after = stored(&pg_marketplace, &task).await?;
    assert_eq!(after.status(), TaskStatus::InProgress);
    assert_eq!(after.version(), task.version());
    assert_eq!(pg_marketplace.fail_count(performer).await?, 0);
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn deny_commits_status_and_fail_count_together(
    pg_marketplace: PgMarketplace,
) -> Result<(), BoxError> {
    let performer = pg_marketplace.performer().await?;
    let task = pg_marketplace.started(performer).await?;

    let outcome = pg_marketplace
        .workflow
        .transition(task.id(), &DenyAction, Actor::new(performer))
        .await?;

    let after = stored(&pg_marketplace, &task).await?;
    assert_eq!(outcome.status(), TaskStatus::Deny);
    assert_eq!(after.status(), TaskStatus::Deny);
    assert_eq!(after.version(), outcome.task.version());
    assert_eq!(pg_marketplace.fail_count(performer).await?, 1);
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn start_with_unregistered_performer_leaves_task_open(
    pg_marketplace: PgMarketplace,
) -> Result<(), BoxError> {
    let task = pg_marketplace.post("courier", "Carry boxes").await?;
    let before = stored(&pg_marketplace, &task).await?;
    let stranger = UserId::new();

    let start = pg_marketplace
        .workflow
        .transition(task.id(), &StartAction::new(stranger), pg_marketplace.client_actor())
        .await;
    let deny = pg_marketplace
        .workflow
        .transition(task.id(), &DenyAction, Actor::new(stranger))
        .await;

    assert!(matches!(
        start,
        Err(TaskWorkflowError::Repository(TaskRepositoryError::PerformerNotFound(id)))
            if id == stranger
    ));
    assert!(matches!(
        deny,
        Err(TaskWorkflowError::Domain(TaskDomainError::InvalidTransition { .. }))
    ));
    let after = stored(&pg_marketplace, &task).await?;
    assert_eq!(after, before);
    assert!(after.performer_id().is_none());
    Ok(())
}
