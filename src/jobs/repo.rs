use chrono::{DateTime, Utc};
use sqlx::SqlitePool;

use crate::jobs::model::{Job, JobStatus, NewJob};

#[derive(Clone)]
pub struct JobsRepo {
    pool: SqlitePool,
}

impl JobsRepo {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    // ----------------------------
    // Writes
    // ----------------------------

    /// Insert a new pending job and return its assigned id.
    ///
    /// Ids come from the database and only ever grow, so newer jobs always
    /// sort above older ones.
    pub async fn create(&self, job: NewJob) -> Result<i64, sqlx::Error> {
        let now = Utc::now();

        let id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO jobs (task_name, payload, priority, status, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            RETURNING id
            "#,
        )
        .bind(&job.task_name)
        .bind(job.payload.to_string())
        .bind(&job.priority)
        .bind(JobStatus::Pending.as_str())
        .bind(now)
        .bind(now)
        .fetch_one(&self.pool)
        .await?;

        Ok(id)
    }

    /// Unconditional status write. Transition legality is the caller's
    /// concern; the store accepts any status at any time.
    ///
    /// Returns the number of rows touched (0 when the job no longer exists).
    pub async fn set_status(
        &self,
        id: i64,
        status: JobStatus,
        at: DateTime<Utc>,
    ) -> Result<u64, sqlx::Error> {
        let res = sqlx::query("UPDATE jobs SET status = ?2, updated_at = ?3 WHERE id = ?1")
            .bind(id)
            .bind(status.as_str())
            .bind(at)
            .execute(&self.pool)
            .await?;

        Ok(res.rows_affected())
    }

    // ----------------------------
    // Reads
    // ----------------------------

    pub async fn get(&self, id: i64) -> Result<Option<Job>, sqlx::Error> {
        sqlx::query_as::<_, Job>("SELECT * FROM jobs WHERE id = ?1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
    }

    /// All jobs, newest first.
    pub async fn list(&self) -> Result<Vec<Job>, sqlx::Error> {
        sqlx::query_as::<_, Job>("SELECT * FROM jobs ORDER BY id DESC")
            .fetch_all(&self.pool)
            .await
    }
}
