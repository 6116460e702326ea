use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::{PgConnection, PgExecutor, PgPool, Postgres, Transaction};
use std::collections::HashMap;

use super::{ledger_not_opened, DateRange, ScheduleStore};
use crate::{
    models::{
        ChangeRequest, ChangeRequestRow, CreateWorkTypeInput, EntryAnnotation, LeaveLedger, LedgerChange,
        NewChangeRequest, PersonId, Reconciled, RequestId, ScheduleEntry, UpdateWorkTypeInput, VerificationRecord,
        WorkType, WorkTypeId,
    },
    AppError, AppResult,
};

const ENTRY_COLUMNS: &str = r#"
    id, person_id, date, work_type_id, proof_image, proof_sha256, captured_at,
    is_verified, is_late, is_absent, memo, updated_at
"#;

const REQUEST_COLUMNS: &str = r#"
    id, requester_id, submitted_by, date, target_work_type_id, reason, status,
    approver_id, created_at, resolved_at
"#;

const WORK_TYPE_COLUMNS: &str = "id, name, short_name, color, deduction, is_working_day, sort_order";

const LEDGER_COLUMNS: &str = "person_id, total_leave, used_leave, period_start, updated_at";

#[derive(Clone)]
pub struct PgStore {
    db: PgPool,
}

impl PgStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

fn map_unique_violation(e: sqlx::Error, name: &str) -> AppError {
    match &e {
        sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
            AppError::Conflict(format!("Work type '{}' already exists", name))
        }
        _ => AppError::Database(e),
    }
}

async fn upsert_entry_with<'e, E: PgExecutor<'e>>(
    executor: E,
    person_id: PersonId,
    date: NaiveDate,
    work_type_id: Option<WorkTypeId>,
) -> Result<ScheduleEntry, sqlx::Error> {
    let sql = format!(
        r#"
        INSERT INTO "DailySchedules" (person_id, date, work_type_id)
        VALUES ($1, $2, $3)
        ON CONFLICT (person_id, date)
        DO UPDATE SET work_type_id = EXCLUDED.work_type_id, updated_at = NOW()
        RETURNING {}
        "#,
        ENTRY_COLUMNS
    );

    sqlx::query_as::<_, ScheduleEntry>(&sql)
        .bind(person_id)
        .bind(date)
        .bind(work_type_id)
        .fetch_one(executor)
        .await
}

/// Locks the person's ledger row until the transaction ends.
async fn lock_ledger(conn: &mut PgConnection, person_id: PersonId) -> AppResult<LeaveLedger> {
    let sql = format!(
        r#"SELECT {} FROM "LeaveLedgers" WHERE person_id = $1 FOR UPDATE"#,
        LEDGER_COLUMNS
    );
    sqlx::query_as::<_, LeaveLedger>(&sql)
        .bind(person_id)
        .fetch_optional(&mut *conn)
        .await?
        .ok_or_else(|| {
            tracing::warn!(person_id, "Leave ledger missing for person");
            ledger_not_opened(person_id)
        })
}

/// Stores the live deduction sum over `period` on a ledger locked by [`lock_ledger`].
async fn settle_ledger(
    conn: &mut PgConnection,
    locked: LeaveLedger,
    period: Option<DateRange>,
) -> AppResult<LedgerChange> {
    let previous_used = locked.used_leave;
    let used = sum_deductions_with(&mut *conn, locked.person_id, period).await?;
    let period_start = period.map(|(start, _)| start);

    let ledger = if used != previous_used || period_start != locked.period_start {
        let sql = format!(
            r#"
            UPDATE "LeaveLedgers" SET used_leave = $2, period_start = $3, updated_at = NOW()
            WHERE person_id = $1
            RETURNING {}
            "#,
            LEDGER_COLUMNS
        );
        sqlx::query_as::<_, LeaveLedger>(&sql)
            .bind(locked.person_id)
            .bind(used)
            .bind(period_start)
            .fetch_one(&mut *conn)
            .await?
    } else {
        locked
    };

    Ok(LedgerChange { previous_used, ledger })
}

async fn commit(tx: Transaction<'_, Postgres>, operation: &str, person_id: PersonId) -> AppResult<()> {
    tx.commit().await.map_err(|e| {
        tracing::error!(error = %e, person_id, operation, "Transaction rollback");
        AppError::Internal(format!("Failed to commit {} for person {}: {}", operation, person_id, e))
    })
}

async fn sum_deductions_with<'e, E: PgExecutor<'e>>(
    executor: E,
    person_id: PersonId,
    range: Option<DateRange>,
) -> Result<f64, sqlx::Error> {
    sqlx::query_scalar::<_, f64>(
        r#"
        SELECT COALESCE(SUM(w.deduction), 0)::float8
        FROM "DailySchedules" d
        INNER JOIN "WorkTypes" w ON d.work_type_id = w.id
        WHERE d.person_id = $1
        AND ($2::date IS NULL OR d.date >= $2)
        AND ($3::date IS NULL OR d.date <= $3)
        "#,
    )
    .bind(person_id)
    .bind(range.map(|r| r.0))
    .bind(range.map(|r| r.1))
    .fetch_one(executor)
    .await
}

#[async_trait]
impl ScheduleStore for PgStore {
    async fn list_work_types(&self) -> AppResult<Vec<WorkType>> {
        let sql = format!(r#"SELECT {} FROM "WorkTypes" ORDER BY sort_order, id"#, WORK_TYPE_COLUMNS);
        let types = sqlx::query_as::<_, WorkType>(&sql).fetch_all(&self.db).await?;
        Ok(types)
    }

    async fn get_work_type(&self, id: WorkTypeId) -> AppResult<Option<WorkType>> {
        let sql = format!(r#"SELECT {} FROM "WorkTypes" WHERE id = $1"#, WORK_TYPE_COLUMNS);
        let work_type = sqlx::query_as::<_, WorkType>(&sql).bind(id).fetch_optional(&self.db).await?;
        Ok(work_type)
    }

    async fn find_work_type_by_name(&self, name: &str) -> AppResult<Option<WorkType>> {
        let sql = format!(r#"SELECT {} FROM "WorkTypes" WHERE name = $1"#, WORK_TYPE_COLUMNS);
        let work_type = sqlx::query_as::<_, WorkType>(&sql).bind(name).fetch_optional(&self.db).await?;
        Ok(work_type)
    }

    async fn create_work_type(&self, input: &CreateWorkTypeInput) -> AppResult<WorkType> {
        let sql = format!(
            r#"
            INSERT INTO "WorkTypes" (name, short_name, color, deduction, is_working_day, sort_order)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {}
            "#,
            WORK_TYPE_COLUMNS
        );

        sqlx::query_as::<_, WorkType>(&sql)
            .bind(&input.name)
            .bind(&input.short_name)
            .bind(&input.color)
            .bind(input.deduction)
            .bind(input.is_working_day)
            .bind(input.sort_order)
            .fetch_one(&self.db)
            .await
            .map_err(|e| map_unique_violation(e, &input.name))
    }

    async fn insert_work_type_if_missing(&self, input: &CreateWorkTypeInput) -> AppResult<bool> {
        let result = sqlx::query(
            r#"
            INSERT INTO "WorkTypes" (name, short_name, color, deduction, is_working_day, sort_order)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (name) DO NOTHING
            "#,
        )
        .bind(&input.name)
        .bind(&input.short_name)
        .bind(&input.color)
        .bind(input.deduction)
        .bind(input.is_working_day)
        .bind(input.sort_order)
        .execute(&self.db)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    async fn update_work_type(&self, id: WorkTypeId, input: &UpdateWorkTypeInput) -> AppResult<Option<WorkType>> {
        let sql = format!(
            r#"
            UPDATE "WorkTypes"
            SET name = COALESCE($2, name),
                short_name = COALESCE($3, short_name),
                color = COALESCE($4, color),
                deduction = COALESCE($5, deduction),
                is_working_day = COALESCE($6, is_working_day),
                sort_order = COALESCE($7, sort_order)
            WHERE id = $1
            RETURNING {}
            "#,
            WORK_TYPE_COLUMNS
        );

        sqlx::query_as::<_, WorkType>(&sql)
            .bind(id)
            .bind(&input.name)
            .bind(&input.short_name)
            .bind(&input.color)
            .bind(input.deduction)
            .bind(input.is_working_day)
            .bind(input.sort_order)
            .fetch_optional(&self.db)
            .await
            .map_err(|e| map_unique_violation(e, input.name.as_deref().unwrap_or_default()))
    }

    async fn people_using_work_type(&self, id: WorkTypeId) -> AppResult<Vec<PersonId>> {
        let people = sqlx::query_scalar::<_, PersonId>(
            r#"SELECT DISTINCT person_id FROM "DailySchedules" WHERE work_type_id = $1 ORDER BY person_id"#,
        )
        .bind(id)
        .fetch_all(&self.db)
        .await?;
        Ok(people)
    }

    async fn delete_work_type(&self, id: WorkTypeId) -> AppResult<Option<Vec<PersonId>>> {
        let mut tx = self.db.begin().await?;

        let exists = sqlx::query_scalar::<_, WorkTypeId>(r#"SELECT id FROM "WorkTypes" WHERE id = $1 FOR UPDATE"#)
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?;
        if exists.is_none() {
            return Ok(None);
        }

        let people = sqlx::query_scalar::<_, PersonId>(
            r#"SELECT DISTINCT person_id FROM "DailySchedules" WHERE work_type_id = $1 ORDER BY person_id"#,
        )
        .bind(id)
        .fetch_all(&mut *tx)
        .await?;

        // Entry references become NULL through the ON DELETE SET NULL constraint.
        sqlx::query(r#"DELETE FROM "WorkTypes" WHERE id = $1"#)
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await.map_err(|e| {
            tracing::error!(error = %e, work_type_id = id, "Transaction rollback in delete_work_type");
            AppError::Internal(format!("Failed to commit deletion of work type {}: {}", id, e))
        })?;

        Ok(Some(people))
    }

    async fn get_entry(&self, person_id: PersonId, date: NaiveDate) -> AppResult<Option<ScheduleEntry>> {
        let sql = format!(
            r#"SELECT {} FROM "DailySchedules" WHERE person_id = $1 AND date = $2"#,
            ENTRY_COLUMNS
        );
        let entry = sqlx::query_as::<_, ScheduleEntry>(&sql)
            .bind(person_id)
            .bind(date)
            .fetch_optional(&self.db)
            .await?;
        Ok(entry)
    }

    async fn upsert_entry(
        &self,
        person_id: PersonId,
        date: NaiveDate,
        work_type_id: Option<WorkTypeId>,
        period: Option<DateRange>,
    ) -> AppResult<Reconciled<ScheduleEntry>> {
        let mut tx = self.db.begin().await?;
        let locked = lock_ledger(&mut tx, person_id).await?;

        let entry = upsert_entry_with(&mut *tx, person_id, date, work_type_id)
            .await
            .map_err(|e| {
                tracing::error!(error = %e, person_id, %date, "Failed to upsert schedule entry");
                e
            })?;
        let ledger = settle_ledger(&mut tx, locked, period).await?;

        commit(tx, "schedule entry", person_id).await?;
        Ok(Reconciled { value: entry, ledger })
    }

    async fn record_verification(
        &self,
        person_id: PersonId,
        date: NaiveDate,
        default_work_type: Option<WorkTypeId>,
        record: &VerificationRecord,
        period: Option<DateRange>,
    ) -> AppResult<Reconciled<ScheduleEntry>> {
        let mut tx = self.db.begin().await?;
        let locked = lock_ledger(&mut tx, person_id).await?;

        let sql = format!(
            r#"
            INSERT INTO "DailySchedules" (
                person_id, date, work_type_id, proof_image, proof_sha256, captured_at, is_verified, is_late
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            ON CONFLICT (person_id, date)
            DO UPDATE SET
                proof_image = EXCLUDED.proof_image,
                proof_sha256 = EXCLUDED.proof_sha256,
                captured_at = EXCLUDED.captured_at,
                is_verified = EXCLUDED.is_verified,
                is_late = EXCLUDED.is_late,
                updated_at = NOW()
            RETURNING {}
            "#,
            ENTRY_COLUMNS
        );

        let entry = sqlx::query_as::<_, ScheduleEntry>(&sql)
            .bind(person_id)
            .bind(date)
            .bind(default_work_type)
            .bind(&record.proof.key)
            .bind(&record.proof.sha256)
            .bind(record.captured_at)
            .bind(record.is_verified)
            .bind(record.is_late)
            .fetch_one(&mut *tx)
            .await
            .map_err(|e| {
                tracing::error!(error = %e, person_id, %date, "Failed to record verification");
                e
            })?;
        let ledger = settle_ledger(&mut tx, locked, period).await?;

        commit(tx, "verification", person_id).await?;
        Ok(Reconciled { value: entry, ledger })
    }

    async fn annotate_entry(
        &self,
        person_id: PersonId,
        date: NaiveDate,
        annotation: &EntryAnnotation,
    ) -> AppResult<Option<ScheduleEntry>> {
        let sql = format!(
            r#"
            UPDATE "DailySchedules"
            SET is_absent = COALESCE($3, is_absent),
                memo = COALESCE($4, memo),
                updated_at = NOW()
            WHERE person_id = $1 AND date = $2
            RETURNING {}
            "#,
            ENTRY_COLUMNS
        );

        let entry = sqlx::query_as::<_, ScheduleEntry>(&sql)
            .bind(person_id)
            .bind(date)
            .bind(annotation.is_absent)
            .bind(&annotation.memo)
            .fetch_optional(&self.db)
            .await?;
        Ok(entry)
    }

    async fn delete_entry(
        &self,
        person_id: PersonId,
        date: NaiveDate,
        period: Option<DateRange>,
    ) -> AppResult<Option<Reconciled<ScheduleEntry>>> {
        let mut tx = self.db.begin().await?;
        let locked = lock_ledger(&mut tx, person_id).await?;

        let sql = format!(
            r#"DELETE FROM "DailySchedules" WHERE person_id = $1 AND date = $2 RETURNING {}"#,
            ENTRY_COLUMNS
        );
        let Some(entry) = sqlx::query_as::<_, ScheduleEntry>(&sql)
            .bind(person_id)
            .bind(date)
            .fetch_optional(&mut *tx)
            .await?
        else {
            return Ok(None);
        };
        let ledger = settle_ledger(&mut tx, locked, period).await?;

        commit(tx, "entry deletion", person_id).await?;
        Ok(Some(Reconciled { value: entry, ledger }))
    }

    async fn insert_missing_entries(
        &self,
        person_id: PersonId,
        dates: &[NaiveDate],
        work_type_id: WorkTypeId,
        period: Option<DateRange>,
    ) -> AppResult<Reconciled<u64>> {
        let mut tx = self.db.begin().await?;
        let locked = lock_ledger(&mut tx, person_id).await?;

        let result = sqlx::query(
            r#"
            INSERT INTO "DailySchedules" (person_id, date, work_type_id)
            SELECT $1, d, $3 FROM UNNEST($2::date[]) AS d
            ON CONFLICT (person_id, date) DO NOTHING
            "#,
        )
        .bind(person_id)
        .bind(dates)
        .bind(work_type_id)
        .execute(&mut *tx)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, person_id, "Failed to insert default entries");
            e
        })?;
        let ledger = settle_ledger(&mut tx, locked, period).await?;

        commit(tx, "default entries", person_id).await?;
        Ok(Reconciled {
            value: result.rows_affected(),
            ledger,
        })
    }

    async fn list_entries_for_person(&self, person_id: PersonId) -> AppResult<Vec<ScheduleEntry>> {
        let sql = format!(
            r#"SELECT {} FROM "DailySchedules" WHERE person_id = $1 ORDER BY date DESC"#,
            ENTRY_COLUMNS
        );
        let entries = sqlx::query_as::<_, ScheduleEntry>(&sql)
            .bind(person_id)
            .fetch_all(&self.db)
            .await?;
        Ok(entries)
    }

    async fn list_entries_in_range(&self, people: &[PersonId], range: DateRange) -> AppResult<Vec<ScheduleEntry>> {
        if people.is_empty() {
            return Ok(Vec::new());
        }

        let sql = format!(
            r#"
            SELECT {} FROM "DailySchedules"
            WHERE person_id = ANY($1) AND date BETWEEN $2 AND $3
            ORDER BY person_id, date
            "#,
            ENTRY_COLUMNS
        );
        let entries = sqlx::query_as::<_, ScheduleEntry>(&sql)
            .bind(people)
            .bind(range.0)
            .bind(range.1)
            .fetch_all(&self.db)
            .await?;
        Ok(entries)
    }

    async fn open_ledger(&self, person_id: PersonId, total_leave: f64) -> AppResult<bool> {
        let result = sqlx::query(
            r#"
            INSERT INTO "LeaveLedgers" (person_id, total_leave, used_leave)
            VALUES ($1, $2, 0)
            ON CONFLICT (person_id) DO NOTHING
            "#,
        )
        .bind(person_id)
        .bind(total_leave)
        .execute(&self.db)
        .await?;
        Ok(result.rows_affected() == 1)
    }

    async fn get_ledger(&self, person_id: PersonId) -> AppResult<Option<LeaveLedger>> {
        let sql = format!(r#"SELECT {} FROM "LeaveLedgers" WHERE person_id = $1"#, LEDGER_COLUMNS);
        let ledger = sqlx::query_as::<_, LeaveLedger>(&sql)
            .bind(person_id)
            .fetch_optional(&self.db)
            .await?;
        Ok(ledger)
    }

    async fn list_ledgers(&self, people: &[PersonId]) -> AppResult<Vec<LeaveLedger>> {
        let sql = format!(
            r#"SELECT {} FROM "LeaveLedgers" WHERE person_id = ANY($1) ORDER BY person_id"#,
            LEDGER_COLUMNS
        );
        let ledgers = sqlx::query_as::<_, LeaveLedger>(&sql)
            .bind(people)
            .fetch_all(&self.db)
            .await?;
        Ok(ledgers)
    }

    async fn set_ledger_total(&self, person_id: PersonId, total_leave: f64) -> AppResult<Option<LeaveLedger>> {
        let sql = format!(
            r#"
            UPDATE "LeaveLedgers" SET total_leave = $2, updated_at = NOW()
            WHERE person_id = $1
            RETURNING {}
            "#,
            LEDGER_COLUMNS
        );
        let ledger = sqlx::query_as::<_, LeaveLedger>(&sql)
            .bind(person_id)
            .bind(total_leave)
            .fetch_optional(&self.db)
            .await?;
        Ok(ledger)
    }

    async fn sum_deductions(&self, person_id: PersonId, range: Option<DateRange>) -> AppResult<f64> {
        Ok(sum_deductions_with(&self.db, person_id, range).await?)
    }

    async fn sum_deductions_by_person(
        &self,
        people: &[PersonId],
        range: Option<DateRange>,
    ) -> AppResult<HashMap<PersonId, f64>> {
        if people.is_empty() {
            return Ok(HashMap::new());
        }

        let sums = sqlx::query_as::<_, (PersonId, f64)>(
            r#"
            SELECT d.person_id, COALESCE(SUM(w.deduction), 0)::float8
            FROM "DailySchedules" d
            INNER JOIN "WorkTypes" w ON d.work_type_id = w.id
            WHERE d.person_id = ANY($1)
            AND ($2::date IS NULL OR d.date >= $2)
            AND ($3::date IS NULL OR d.date <= $3)
            GROUP BY d.person_id
            "#,
        )
        .bind(people)
        .bind(range.map(|r| r.0))
        .bind(range.map(|r| r.1))
        .fetch_all(&self.db)
        .await?;

        Ok(sums.into_iter().collect())
    }

    async fn reconcile_ledger(&self, person_id: PersonId, period: Option<DateRange>) -> AppResult<LedgerChange> {
        let mut tx = self.db.begin().await?;
        let locked = lock_ledger(&mut tx, person_id).await?;
        let change = settle_ledger(&mut tx, locked, period).await?;

        commit(tx, "ledger", person_id).await?;
        Ok(change)
    }

    async fn create_request(&self, request: &NewChangeRequest) -> AppResult<ChangeRequest> {
        let sql = format!(
            r#"
            INSERT INTO "ScheduleRequests" (requester_id, submitted_by, date, target_work_type_id, reason, status)
            VALUES ($1, $2, $3, $4, $5, 'pending')
            RETURNING {}
            "#,
            REQUEST_COLUMNS
        );

        let row = sqlx::query_as::<_, ChangeRequestRow>(&sql)
            .bind(request.requester_id)
            .bind(request.submitted_by)
            .bind(request.date)
            .bind(request.target_work_type_id)
            .bind(&request.reason)
            .fetch_one(&self.db)
            .await?;
        row.try_into()
    }

    async fn get_request(&self, id: RequestId) -> AppResult<Option<ChangeRequest>> {
        let sql = format!(r#"SELECT {} FROM "ScheduleRequests" WHERE id = $1"#, REQUEST_COLUMNS);
        sqlx::query_as::<_, ChangeRequestRow>(&sql)
            .bind(id)
            .fetch_optional(&self.db)
            .await?
            .map(ChangeRequest::try_from)
            .transpose()
    }

    async fn list_pending_requests(&self, requesters: Option<&[PersonId]>) -> AppResult<Vec<ChangeRequest>> {
        let sql = format!(
            r#"
            SELECT {} FROM "ScheduleRequests"
            WHERE status = 'pending'
            AND ($1::int4[] IS NULL OR requester_id = ANY($1))
            ORDER BY created_at ASC, id ASC
            "#,
            REQUEST_COLUMNS
        );

        let rows = sqlx::query_as::<_, ChangeRequestRow>(&sql)
            .bind(requesters.map(|r| r.to_vec()))
            .fetch_all(&self.db)
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "Failed to fetch pending requests");
                e
            })?;

        rows.into_iter().map(ChangeRequest::try_from).collect()
    }

    async fn approve_request(
        &self,
        id: RequestId,
        approver_id: PersonId,
        period: Option<DateRange>,
    ) -> AppResult<Option<Reconciled<(ChangeRequest, ScheduleEntry)>>> {
        let mut tx = self.db.begin().await?;

        let sql = format!(
            r#"SELECT {} FROM "ScheduleRequests" WHERE id = $1 AND status = 'pending' FOR UPDATE"#,
            REQUEST_COLUMNS
        );
        let Some(row) = sqlx::query_as::<_, ChangeRequestRow>(&sql)
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?
        else {
            return Ok(None);
        };

        let pending = ChangeRequest::try_from(row)?;
        let work_type_id = pending
            .target_work_type_id
            .ok_or_else(|| AppError::Conflict(format!("Request {} targets a deleted work type", id)))?;
        let locked = lock_ledger(&mut tx, pending.requester_id).await?;

        let sql = format!(
            r#"
            UPDATE "ScheduleRequests"
            SET status = 'approved', approver_id = $2, resolved_at = NOW()
            WHERE id = $1
            RETURNING {}
            "#,
            REQUEST_COLUMNS
        );
        let request: ChangeRequest = sqlx::query_as::<_, ChangeRequestRow>(&sql)
            .bind(id)
            .bind(approver_id)
            .fetch_one(&mut *tx)
            .await?
            .try_into()?;

        let entry = upsert_entry_with(&mut *tx, pending.requester_id, pending.date, Some(work_type_id)).await?;
        let ledger = settle_ledger(&mut tx, locked, period).await?;

        tx.commit().await.map_err(|e| {
            tracing::error!(error = %e, request_id = id, approver_id, "Transaction rollback in approve_request");
            AppError::Internal(format!("Failed to commit approval for request {}: {}", id, e))
        })?;

        Ok(Some(Reconciled {
            value: (request, entry),
            ledger,
        }))
    }

    async fn reject_request(&self, id: RequestId, approver_id: PersonId) -> AppResult<Option<ChangeRequest>> {
        let sql = format!(
            r#"
            UPDATE "ScheduleRequests"
            SET status = 'rejected', approver_id = $2, resolved_at = NOW()
            WHERE id = $1 AND status = 'pending'
            RETURNING {}
            "#,
            REQUEST_COLUMNS
        );

        sqlx::query_as::<_, ChangeRequestRow>(&sql)
            .bind(id)
            .bind(approver_id)
            .fetch_optional(&self.db)
            .await
            .map_err(|e| {
                tracing::error!(error = %e, request_id = id, "Failed to reject request");
                e
            })?
            .map(ChangeRequest::try_from)
            .transpose()
    }
}
