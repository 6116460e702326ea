use super::Attendance;
use crate::{
    models::{CreateWorkTypeInput, Person, UpdateWorkTypeInput, WorkType, WorkTypeId, STANDARD_WORK_TYPES},
    AppError, AppResult,
};

fn require_admin(actor: &Person) -> AppResult<()> {
    if actor.is_admin {
        Ok(())
    } else {
        Err(AppError::Forbidden("Only administrators can manage work types".to_string()))
    }
}

fn validate_deduction(deduction: f64) -> AppResult<()> {
    if deduction.is_finite() && deduction >= 0.0 {
        Ok(())
    } else {
        Err(AppError::Validation("deduction must be a non-negative number".to_string()))
    }
}

fn validate_label(field: &str, value: &str) -> AppResult<()> {
    if value.trim().is_empty() {
        return Err(AppError::Validation(format!("{} must not be empty", field)));
    }
    Ok(())
}

impl Attendance {
    /// Catalog in display order.
    pub async fn list_work_types(&self) -> AppResult<Vec<WorkType>> {
        self.store.list_work_types().await
    }

    pub async fn create_work_type(&self, actor: &Person, input: &CreateWorkTypeInput) -> AppResult<WorkType> {
        require_admin(actor)?;
        validate_label("name", &input.name)?;
        validate_label("short_name", &input.short_name)?;
        validate_deduction(input.deduction)?;

        let created = self.store.create_work_type(input).await?;
        tracing::info!(work_type_id = created.id, name = %created.name, "Work type created");
        Ok(created)
    }

    /// Updates a work type; a weight change reconciles every affected ledger.
    pub async fn update_work_type(
        &self,
        actor: &Person,
        id: WorkTypeId,
        input: &UpdateWorkTypeInput,
    ) -> AppResult<WorkType> {
        require_admin(actor)?;
        if let Some(name) = &input.name {
            validate_label("name", name)?;
        }
        if let Some(short_name) = &input.short_name {
            validate_label("short_name", short_name)?;
        }
        if let Some(deduction) = input.deduction {
            validate_deduction(deduction)?;
        }

        let before = self
            .store
            .get_work_type(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Work type {} not found", id)))?;
        let updated = self
            .store
            .update_work_type(id, input)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Work type {} not found", id)))?;

        if updated.deduction != before.deduction {
            let affected = self.store.people_using_work_type(id).await?;
            tracing::info!(
                work_type_id = id,
                from = before.deduction,
                to = updated.deduction,
                people = affected.len(),
                "Work type weight changed, reconciling ledgers"
            );
            self.ledgers.recompute_many(&affected, self.today()).await?;
        }

        Ok(updated)
    }

    /// Deletes a work type; entries keep their dates with no type.
    pub async fn delete_work_type(&self, actor: &Person, id: WorkTypeId) -> AppResult<()> {
        require_admin(actor)?;

        let affected = self
            .store
            .delete_work_type(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Work type {} not found", id)))?;

        tracing::info!(work_type_id = id, people = affected.len(), "Work type deleted");
        self.ledgers.recompute_many(&affected, self.today()).await
    }

    /// Get-or-create of the standard catalog; returns how many types were added.
    pub async fn seed_standard_work_types(&self) -> AppResult<usize> {
        let mut inserted = 0;
        for &(name, short_name, color, deduction, is_working_day, sort_order) in STANDARD_WORK_TYPES {
            let input = CreateWorkTypeInput {
                name: name.to_string(),
                short_name: short_name.to_string(),
                color: color.to_string(),
                deduction,
                is_working_day,
                sort_order,
            };
            if self.store.insert_work_type_if_missing(&input).await? {
                inserted += 1;
            }
        }

        if inserted > 0 {
            tracing::info!(inserted, "Seeded standard work types");
        }
        Ok(inserted)
    }
}
