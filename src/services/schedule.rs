use chrono::NaiveDate;
use metrics::counter;

use super::Attendance;
use crate::{
    events::DomainEvent,
    models::{
        EntryAnnotation, Person, PersonId, ScheduleEntry, UploadProofResponse, Verdict, VerificationRecord, WorkTypeId,
    },
    AppError, AppResult,
};

fn verification_outcome(verdict: &Verdict) -> &'static str {
    if verdict.is_security_violation {
        "violation"
    } else if verdict.is_valid_time {
        "verified"
    } else {
        "invalid_time"
    }
}

impl Attendance {
    /// Analyzes and stores a proof image for today and records the verdict on
    /// today's entry. Analysis problems become a failing verdict, not an error.
    pub async fn upload_proof(&self, person_id: PersonId, image: &[u8]) -> AppResult<UploadProofResponse> {
        if image.is_empty() {
            return Err(AppError::Validation("Proof image is empty".to_string()));
        }
        self.person(person_id).await?;

        let now = self.now_local();
        let date = now.date_naive();

        let verdict = self.analyzer.analyze(image, now).await;
        let proof = self.images.save(person_id, date, image).await?;
        let default_work_type = self.default_work_type().await?.map(|w| w.id);
        let record = VerificationRecord::derive(&verdict, proof);

        let entry = {
            let _guard = self.ledgers.lock(person_id).await;
            let written = self
                .store
                .record_verification(person_id, date, default_work_type, &record, self.ledgers.period(date))
                .await?;
            self.ledgers.record(&written.ledger);
            written.value
        };

        let outcome = verification_outcome(&verdict);
        counter!("proof_verifications_total", "outcome" => outcome).increment(1);
        tracing::info!(
            person_id,
            date = %date,
            outcome,
            is_late = entry.is_late,
            key = %record.proof.key,
            "Proof verification recorded"
        );

        self.events.publish(DomainEvent::VerificationCompleted {
            person_id,
            date,
            verdict,
        });

        Ok(UploadProofResponse { verdict, entry })
    }

    /// Entries of `person_id`, newest first. Visible to the person and their managers.
    pub async fn person_log(&self, actor: &Person, person_id: PersonId) -> AppResult<Vec<ScheduleEntry>> {
        let target = self.person(person_id).await?;
        if actor.id != target.id && !actor.manages(&target) {
            return Err(AppError::Forbidden("Cannot view another person's attendance log".to_string()));
        }

        self.store.list_entries_for_person(person_id).await
    }

    /// Stored proof image of a person's day, with the same visibility as their log.
    pub async fn proof_image(&self, actor: &Person, person_id: PersonId, date: NaiveDate) -> AppResult<Vec<u8>> {
        let target = self.person(person_id).await?;
        if actor.id != target.id && !actor.manages(&target) {
            return Err(AppError::Forbidden("Cannot view another person's proof".to_string()));
        }

        let key = self
            .store
            .get_entry(person_id, date)
            .await?
            .and_then(|entry| entry.proof_image)
            .ok_or_else(|| AppError::NotFound(format!("No proof for person {} on {}", person_id, date)))?;

        self.images.load(&key).await?.ok_or_else(|| {
            tracing::warn!(person_id, date = %date, key = %key, "Proof image missing from storage");
            AppError::NotFound(format!("Proof image for person {} on {} is no longer stored", person_id, date))
        })
    }

    /// Sets the day's work type and reconciles the ledger. Authorization is the caller's job.
    pub(crate) async fn apply_entry(
        &self,
        person_id: PersonId,
        date: NaiveDate,
        work_type_id: WorkTypeId,
    ) -> AppResult<ScheduleEntry> {
        let _guard = self.ledgers.lock(person_id).await;
        let written = self
            .store
            .upsert_entry(person_id, date, Some(work_type_id), self.ledgers.period(self.today()))
            .await?;
        self.ledgers.record(&written.ledger);

        tracing::info!(person_id, date = %date, work_type_id, "Schedule entry set");
        Ok(written.value)
    }

    /// Edits the absent flag or memo. Administrators and managers of the person only.
    pub async fn annotate_entry(
        &self,
        actor: &Person,
        person_id: PersonId,
        date: NaiveDate,
        annotation: &EntryAnnotation,
    ) -> AppResult<ScheduleEntry> {
        let target = self.person(person_id).await?;
        if !actor.is_staff() || !actor.manages(&target) {
            return Err(AppError::Forbidden("Only managers of this person can annotate entries".to_string()));
        }

        let entry = self
            .store
            .annotate_entry(person_id, date, annotation)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("No entry for person {} on {}", person_id, date)))?;

        tracing::info!(person_id, date = %date, actor_id = actor.id, "Schedule entry annotated");
        Ok(entry)
    }

    /// Administrative removal of an entry.
    pub async fn delete_entry(&self, actor: &Person, person_id: PersonId, date: NaiveDate) -> AppResult<()> {
        if !actor.is_admin {
            return Err(AppError::Forbidden("Only administrators can delete entries".to_string()));
        }

        let _guard = self.ledgers.lock(person_id).await;
        let deleted = self
            .store
            .delete_entry(person_id, date, self.ledgers.period(self.today()))
            .await?
            .ok_or_else(|| AppError::NotFound(format!("No entry for person {} on {}", person_id, date)))?;
        self.ledgers.record(&deleted.ledger);

        tracing::info!(person_id, date = %date, admin_id = actor.id, "Schedule entry deleted");
        Ok(())
    }
}
