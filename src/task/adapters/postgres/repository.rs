//! `PostgreSQL` repository implementation for marketplace storage.

use super::{
    models::{
        NewPerformerRow, NewTaskRow, OpinionRow, PerformerRow, StandingRow, TaskRow,
        TaskTransitionChangeset,
    },
    schema::{opinions, performers, tasks},
};
use crate::reputation::{
    domain::{Performer, PerformerStanding},
    ports::{PerformerRepository, PerformerRepositoryError, PerformerRepositoryResult},
};
use crate::task::{
    domain::{
        Category, FailCountIncrement, Opinion, OpinionId, PersistedOpinionData, PersistedTaskData,
        Rate, Task, TaskDomainError, TaskId, TaskStatus, UserId,
    },
    ports::{TaskRepository, TaskRepositoryError, TaskRepositoryResult, TransitionCommit},
};
use async_trait::async_trait;
use diesel::pg::PgConnection;
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, Pool};
use diesel::result::{DatabaseErrorKind, Error as DieselError};

/// `PostgreSQL` connection pool type used by marketplace adapters.
pub type MarketplacePgPool = Pool<ConnectionManager<PgConnection>>;

/// Ranking query: one row per performer in registration order.
const STANDINGS_QUERY: &str = concat!(
    "SELECT p.id AS performer_id, p.fail_count, ",
    "COALESCE(SUM(o.rate), 0)::BIGINT AS rate_sum, ",
    "COUNT(o.id)::BIGINT AS opinion_count ",
    "FROM performers p ",
    "LEFT JOIN opinions o ON o.performer_id = p.id ",
    "GROUP BY p.id, p.fail_count, p.registration_seq ",
    "ORDER BY p.registration_seq",
);

/// Error types that can absorb opaque persistence failures.
trait PersistenceFailure: Sized {
    fn wrap(err: impl std::error::Error + Send + Sync + 'static) -> Self;
}

impl PersistenceFailure for TaskRepositoryError {
    fn wrap(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::persistence(err)
    }
}

impl PersistenceFailure for PerformerRepositoryError {
    fn wrap(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::persistence(err)
    }
}

impl From<DieselError> for TaskRepositoryError {
    fn from(err: DieselError) -> Self {
        Self::persistence(err)
    }
}

/// `PostgreSQL`-backed store implementing the task and performer ports.
#[derive(Debug, Clone)]
pub struct PostgresMarketplace {
    pool: MarketplacePgPool,
}

impl PostgresMarketplace {
    /// Creates a new repository from a `PostgreSQL` connection pool.
    #[must_use]
    pub const fn new(pool: MarketplacePgPool) -> Self {
        Self { pool }
    }

    async fn run_blocking<F, T, E>(&self, f: F) -> Result<T, E>
    where
        F: FnOnce(&mut PgConnection) -> Result<T, E> + Send + 'static,
        T: Send + 'static,
        E: PersistenceFailure + Send + 'static,
    {
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || {
            let mut connection = pool.get().map_err(E::wrap)?;
            f(&mut connection)
        })
        .await
        .map_err(E::wrap)?
    }
}

#[async_trait]
impl TaskRepository for PostgresMarketplace {
    async fn store(&self, task: &Task) -> TaskRepositoryResult<()> {
        let task_id = task.id();
        let performer_id = task.performer_id();
        let new_row = to_new_task_row(task)?;

        self.run_blocking(move |connection| {
            diesel::insert_into(tasks::table)
                .values(&new_row)
                .execute(connection)
                .map_err(|err| match err {
                    DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _) => {
                        TaskRepositoryError::DuplicateTask(task_id)
                    }
                    other => unknown_assignee(other, performer_id),
                })?;
            Ok(())
        })
        .await
    }

    async fn find_by_id(&self, id: TaskId) -> TaskRepositoryResult<Option<Task>> {
        self.run_blocking(move |connection| {
            let row = tasks::table
                .filter(tasks::id.eq(id.into_inner()))
                .select(TaskRow::as_select())
                .first::<TaskRow>(connection)
                .optional()?;
            row.map(row_to_task).transpose()
        })
        .await
    }

    async fn commit_transition(&self, commit: &TransitionCommit) -> TaskRepositoryResult<()> {
        let task_id = commit.task.id();
        let expected_version = to_db_version(commit.expected_version)?;
        let changeset = TaskTransitionChangeset {
            performer_id: commit.task.performer_id().map(UserId::into_inner),
            status: commit.task.status().as_str().to_owned(),
            updated_at: commit.task.updated_at(),
            version: to_db_version(commit.task.version())?,
        };
        let opinion_row = commit.opinion.as_ref().map(to_opinion_row);
        let increments = commit.fail_count_increments.clone();

        self.run_blocking(move |connection| {
            connection.transaction::<_, TaskRepositoryError, _>(|tx| {
                update_task_row(tx, task_id, expected_version, &changeset)?;
                if let Some(row) = &opinion_row {
                    insert_opinion(tx, task_id, row)?;
                }
                for increment in &increments {
                    apply_fail_count_increment(tx, increment)?;
                }
                Ok(())
            })
        })
        .await
    }

    async fn list_for_client(
        &self,
        client_id: UserId,
        statuses: &[TaskStatus],
    ) -> TaskRepositoryResult<Vec<Task>> {
        let status_names = status_names(statuses);
        self.run_blocking(move |connection| {
            let rows = tasks::table
                .filter(tasks::client_id.eq(client_id.into_inner()))
                .filter(tasks::status.eq_any(status_names))
                .order(tasks::created_at.desc())
                .select(TaskRow::as_select())
                .load::<TaskRow>(connection)?;
            rows.into_iter().map(row_to_task).collect()
        })
        .await
    }

    async fn list_for_performer(
        &self,
        performer_id: UserId,
        statuses: &[TaskStatus],
    ) -> TaskRepositoryResult<Vec<Task>> {
        let status_names = status_names(statuses);
        self.run_blocking(move |connection| {
            let rows = tasks::table
                .filter(tasks::performer_id.eq(performer_id.into_inner()))
                .filter(tasks::status.eq_any(status_names))
                .order(tasks::created_at.desc())
                .select(TaskRow::as_select())
                .load::<TaskRow>(connection)?;
            rows.into_iter().map(row_to_task).collect()
        })
        .await
    }

    async fn list_open(&self, category: Option<Category>) -> TaskRepositoryResult<Vec<Task>> {
        self.run_blocking(move |connection| {
            let mut query = tasks::table
                .filter(tasks::status.eq(TaskStatus::New.as_str()))
                .order(tasks::created_at.desc())
                .select(TaskRow::as_select())
                .into_boxed();
            if let Some(wanted) = category {
                query = query.filter(tasks::category.eq(wanted.as_str().to_owned()));
            }
            let rows = query.load::<TaskRow>(connection)?;
            rows.into_iter().map(row_to_task).collect()
        })
        .await
    }

    async fn find_opinion_by_task(&self, task_id: TaskId) -> TaskRepositoryResult<Option<Opinion>> {
        self.run_blocking(move |connection| {
            let row = opinions::table
                .filter(opinions::task_id.eq(task_id.into_inner()))
                .select(OpinionRow::as_select())
                .first::<OpinionRow>(connection)
                .optional()?;
            row.map(row_to_opinion)
                .transpose()
                .map_err(TaskRepositoryError::persistence)
        })
        .await
    }
}

#[async_trait]
impl PerformerRepository for PostgresMarketplace {
    async fn register(&self, performer: &Performer) -> PerformerRepositoryResult<()> {
        let performer_id = performer.id();
        let new_row = NewPerformerRow {
            id: performer_id.into_inner(),
            fail_count: i32::try_from(performer.fail_count())
                .map_err(PerformerRepositoryError::persistence)?,
            hide_contacts: performer.hide_contacts(),
            registered_at: performer.registered_at(),
        };

        self.run_blocking(move |connection| {
            diesel::insert_into(performers::table)
                .values(&new_row)
                .execute(connection)
                .map_err(|err| match err {
                    DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _) => {
                        PerformerRepositoryError::DuplicatePerformer(performer_id)
                    }
                    _ => PerformerRepositoryError::persistence(err),
                })?;
            Ok(())
        })
        .await
    }

    async fn find_by_id(&self, id: UserId) -> PerformerRepositoryResult<Option<Performer>> {
        self.run_blocking(move |connection| {
            let row = performers::table
                .filter(performers::id.eq(id.into_inner()))
                .select(PerformerRow::as_select())
                .first::<PerformerRow>(connection)
                .optional()
                .map_err(PerformerRepositoryError::persistence)?;
            row.map(row_to_performer).transpose()
        })
        .await
    }

    async fn load_standings(&self) -> PerformerRepositoryResult<Vec<PerformerStanding>> {
        self.run_blocking(move |connection| {
            let rows = diesel::sql_query(STANDINGS_QUERY)
                .load::<StandingRow>(connection)
                .map_err(PerformerRepositoryError::persistence)?;
            rows.into_iter().map(row_to_standing).collect()
        })
        .await
    }

    async fn find_opinions(&self, performer_id: UserId) -> PerformerRepositoryResult<Vec<Opinion>> {
        self.run_blocking(move |connection| {
            let rows = opinions::table
                .filter(opinions::performer_id.eq(performer_id.into_inner()))
                .order(opinions::created_at.desc())
                .select(OpinionRow::as_select())
                .load::<OpinionRow>(connection)
                .map_err(PerformerRepositoryError::persistence)?;
            rows.into_iter()
                .map(|row| row_to_opinion(row).map_err(PerformerRepositoryError::persistence))
                .collect()
        })
        .await
    }
}

fn update_task_row(
    connection: &mut PgConnection,
    task_id: TaskId,
    expected_version: i64,
    changeset: &TaskTransitionChangeset,
) -> TaskRepositoryResult<()> {
    let updated = diesel::update(
        tasks::table
            .filter(tasks::id.eq(task_id.into_inner()))
            .filter(tasks::version.eq(expected_version)),
    )
    .set(changeset)
    .execute(connection)
    .map_err(|err| unknown_assignee(err, changeset.performer_id.map(UserId::from_uuid)))?;
    if updated == 1 {
        return Ok(());
    }

    let exists = diesel::select(diesel::dsl::exists(
        tasks::table.filter(tasks::id.eq(task_id.into_inner())),
    ))
    .get_result::<bool>(connection)?;
    if exists {
        Err(TaskRepositoryError::VersionConflict {
            task_id,
            expected: u64::try_from(expected_version).unwrap_or_default(),
        })
    } else {
        Err(TaskRepositoryError::NotFound(task_id))
    }
}

/// Maps a foreign-key violation on `tasks.performer_id` to
/// [`TaskRepositoryError::PerformerNotFound`].
fn unknown_assignee(err: DieselError, performer_id: Option<UserId>) -> TaskRepositoryError {
    match (err, performer_id) {
        (DieselError::DatabaseError(DatabaseErrorKind::ForeignKeyViolation, _), Some(id)) => {
            TaskRepositoryError::PerformerNotFound(id)
        }
        (other, _) => TaskRepositoryError::persistence(other),
    }
}

fn insert_opinion(
    connection: &mut PgConnection,
    task_id: TaskId,
    row: &OpinionRow,
) -> TaskRepositoryResult<()> {
    diesel::insert_into(opinions::table)
        .values(row)
        .execute(connection)
        .map_err(|err| match err {
            DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _) => {
                TaskRepositoryError::DuplicateOpinion(task_id)
            }
            _ => TaskRepositoryError::persistence(err),
        })?;
    Ok(())
}

fn apply_fail_count_increment(
    connection: &mut PgConnection,
    increment: &FailCountIncrement,
) -> TaskRepositoryResult<()> {
    let delta = i32::try_from(increment.delta).map_err(TaskRepositoryError::persistence)?;
    let updated = diesel::update(
        performers::table.filter(performers::id.eq(increment.performer_id.into_inner())),
    )
    .set(performers::fail_count.eq(performers::fail_count + delta))
    .execute(connection)?;
    if updated == 0 {
        return Err(TaskRepositoryError::PerformerNotFound(
            increment.performer_id,
        ));
    }
    Ok(())
}

fn status_names(statuses: &[TaskStatus]) -> Vec<String> {
    statuses
        .iter()
        .map(|status| status.as_str().to_owned())
        .collect()
}

fn to_db_version(version: u64) -> TaskRepositoryResult<i64> {
    i64::try_from(version).map_err(TaskRepositoryError::persistence)
}

fn to_new_task_row(task: &Task) -> TaskRepositoryResult<NewTaskRow> {
    Ok(NewTaskRow {
        id: task.id().into_inner(),
        client_id: task.client_id().into_inner(),
        performer_id: task.performer_id().map(UserId::into_inner),
        category: task.category().as_str().to_owned(),
        title: task.title().to_owned(),
        description: task.description().map(str::to_owned),
        status: task.status().as_str().to_owned(),
        expire_at: task.expire_at(),
        created_at: task.created_at(),
        updated_at: task.updated_at(),
        version: to_db_version(task.version())?,
    })
}

fn to_opinion_row(opinion: &Opinion) -> OpinionRow {
    OpinionRow {
        id: opinion.id().into_inner(),
        task_id: opinion.task_id().into_inner(),
        performer_id: opinion.performer_id().into_inner(),
        rate: i16::from(opinion.rate().value()),
        comment: opinion.comment().to_owned(),
        created_at: opinion.created_at(),
    }
}

fn row_to_task(row: TaskRow) -> TaskRepositoryResult<Task> {
    let TaskRow {
        id,
        client_id,
        performer_id,
        category,
        title,
        description,
        status,
        expire_at,
        created_at,
        updated_at,
        version,
    } = row;

    let data = PersistedTaskData {
        id: TaskId::from_uuid(id),
        client_id: UserId::from_uuid(client_id),
        performer_id: performer_id.map(UserId::from_uuid),
        category: Category::new(category).map_err(TaskRepositoryError::persistence)?,
        title,
        description,
        status: TaskStatus::try_from(status.as_str()).map_err(TaskRepositoryError::persistence)?,
        expire_at,
        created_at,
        updated_at,
        version: u64::try_from(version).map_err(TaskRepositoryError::persistence)?,
    };
    Ok(Task::from_persisted(data))
}

fn row_to_opinion(row: OpinionRow) -> Result<Opinion, TaskDomainError> {
    // Out-of-range stored rates fall to 0, which `Rate::new` rejects.
    let rate_value = u8::try_from(row.rate).unwrap_or_default();
    Ok(Opinion::from_persisted(PersistedOpinionData {
        id: OpinionId::from_uuid(row.id),
        task_id: TaskId::from_uuid(row.task_id),
        performer_id: UserId::from_uuid(row.performer_id),
        rate: Rate::new(rate_value)?,
        comment: row.comment,
        created_at: row.created_at,
    }))
}

fn row_to_performer(row: PerformerRow) -> PerformerRepositoryResult<Performer> {
    let fail_count =
        u32::try_from(row.fail_count).map_err(PerformerRepositoryError::persistence)?;
    Ok(Performer::from_persisted(
        UserId::from_uuid(row.id),
        fail_count,
        row.hide_contacts,
        row.registered_at,
    ))
}

fn row_to_standing(row: StandingRow) -> PerformerRepositoryResult<PerformerStanding> {
    Ok(PerformerStanding {
        performer_id: UserId::from_uuid(row.performer_id),
        rate_sum: u64::try_from(row.rate_sum).map_err(PerformerRepositoryError::persistence)?,
        opinion_count: u64::try_from(row.opinion_count)
            .map_err(PerformerRepositoryError::persistence)?,
        fail_count: u32::try_from(row.fail_count).map_err(PerformerRepositoryError::persistence)?,
    })
}
