use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

pub type PersonId = i32;

/// A person as known to the external directory.
///
/// `scope_id` is the responsibility scope (the trainee's process/class); a
/// manager is authorized over everyone sharing their scope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Person {
    pub id: PersonId,
    pub name: String,
    pub scope_id: Option<i32>,
    pub cohort_id: Option<i32>,
    pub is_manager: bool,
    pub is_admin: bool,
    pub joined_at: Option<NaiveDate>,
    pub active: bool,
}

impl Person {
    /// Staff are managers and administrators; everyone else is a trainee.
    pub fn is_staff(&self) -> bool {
        self.is_manager || self.is_admin
    }

    /// True when `self` may act on `target`'s schedule as their manager.
    pub fn manages(&self, target: &Person) -> bool {
        if self.is_admin {
            return true;
        }
        self.is_manager && self.scope_id.is_some() && self.scope_id == target.scope_id
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum RosterRole {
    #[default]
    Trainees,
    Staff,
}
