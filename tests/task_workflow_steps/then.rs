//! Then steps for task workflow BDD scenarios.

use super::world::{TaskWorkflowWorld, run_async};
use rstest_bdd_macros::then;
use taskforce::task::{
    domain::{TaskDomainError, TaskStatus},
    services::TaskWorkflowError,
};

fn last_error(world: &TaskWorkflowWorld) -> Result<&TaskWorkflowError, eyre::Report> {
    let result = world
        .last_transition_result
        .as_ref()
        .ok_or_else(|| eyre::eyre!("missing transition result"))?;
    match result {
        Ok(outcome) => Err(eyre::eyre!(
            "expected the transition to fail, but it reached {}",
            outcome.status()
        )),
        Err(err) => Ok(err),
    }
}

#[then(r#"the task status is "{status}""#)]
fn task_status_is(world: &TaskWorkflowWorld, status: String) -> Result<(), eyre::Report> {
    let expected = TaskStatus::try_from(status.as_str())
        .map_err(|err| eyre::eyre!("invalid expected status in scenario: {err}"))?;
    let stored = world.reload_task()?;

    if stored.status() != expected {
        return Err(eyre::eyre!(
            "expected status {expected}, found {}",
            stored.status()
        ));
    }

    Ok(())
}

#[then("the task has an opinion with rate {rate:u8}")]
fn task_has_opinion(world: &TaskWorkflowWorld, rate: u8) -> Result<(), eyre::Report> {
    let task_id = world.task()?.id();
    let opinion = run_async(world.lifecycle.find_opinion(task_id))?
        .ok_or_else(|| eyre::eyre!("task {task_id} has no opinion"))?;

    if opinion.rate().value() != rate {
        return Err(eyre::eyre!(
            "expected opinion rate {rate}, found {}",
            opinion.rate()
        ));
    }

    Ok(())
}

#[then("the task has no opinion")]
fn task_has_no_opinion(world: &TaskWorkflowWorld) -> Result<(), eyre::Report> {
    let task_id = world.task()?.id();
    if let Some(opinion) = run_async(world.lifecycle.find_opinion(task_id))? {
        return Err(eyre::eyre!("unexpected opinion {opinion:?}"));
    }
    Ok(())
}

#[then(r#"the performer rating is "{rating}""#)]
fn performer_rating_is(world: &TaskWorkflowWorld, rating: String) -> Result<(), eyre::Report> {
    let actual = run_async(world.reputation.rating(world.performer))?
        .ok_or_else(|| eyre::eyre!("performer has no rating"))?;

    if actual.to_string() != rating {
        return Err(eyre::eyre!("expected rating {rating}, found {actual}"));
    }

    Ok(())
}

#[then("the performer fail count is {count:u32}")]
fn performer_fail_count_is(world: &TaskWorkflowWorld, count: u32) -> Result<(), eyre::Report> {
    let summary = run_async(world.reputation.summary(world.performer))?
        .ok_or_else(|| eyre::eyre!("performer is not registered"))?;

    if summary.performer.fail_count() != count {
        return Err(eyre::eyre!(
            "expected fail count {count}, found {}",
            summary.performer.fail_count()
        ));
    }

    Ok(())
}

#[then("the transition fails because the task is already in the target status")]
fn transition_fails_already_in_target(world: &TaskWorkflowWorld) -> Result<(), eyre::Report> {
    let err = last_error(world)?;
    if !err.is_already_in_target_state() {
        return Err(eyre::eyre!("expected AlreadyInTargetState, got {err:?}"));
    }
    Ok(())
}

#[then("the transition fails with an invalid transition error")]
fn transition_fails_invalid(world: &TaskWorkflowWorld) -> Result<(), eyre::Report> {
    let err = last_error(world)?;
    if !matches!(
        err,
        TaskWorkflowError::Domain(TaskDomainError::InvalidTransition { .. })
    ) {
        return Err(eyre::eyre!("expected InvalidTransition, got {err:?}"));
    }
    Ok(())
}

#[then("the transition fails with a validation error")]
fn transition_fails_validation(world: &TaskWorkflowWorld) -> Result<(), eyre::Report> {
    let err = last_error(world)?;
    if !matches!(err, TaskWorkflowError::Domain(TaskDomainError::Validation(_))) {
        return Err(eyre::eyre!("expected Validation, got {err:?}"));
    }
    Ok(())
}
