//! Attendance core: verification, schedule mutations, the leave ledger and
//! the change-request workflow, composed over pluggable collaborators.

pub mod bulk;
pub mod calendar;
pub mod catalog;
pub mod ledger;
pub mod schedule;
pub mod workflow;

#[cfg(test)]
pub(crate) mod fixtures;

use chrono::{DateTime, FixedOffset, NaiveDate};
use std::sync::Arc;

use crate::{
    clock::Clock,
    directory::Directory,
    events::EventBus,
    holidays::HolidayCalendar,
    models::{LedgerPeriod, Person, PersonId, WorkType},
    proofs::{ImageStore, ProofAnalyzer},
    store::ScheduleStore,
    AppError, AppResult,
};

pub use ledger::LedgerKeeper;

/// External collaborators the core depends on.
pub struct Collaborators {
    pub store: Arc<dyn ScheduleStore>,
    pub directory: Arc<dyn Directory>,
    pub holidays: Arc<dyn HolidayCalendar>,
    pub clock: Arc<dyn Clock>,
    pub analyzer: Arc<dyn ProofAnalyzer>,
    pub images: Arc<dyn ImageStore>,
}

#[derive(Debug, Clone)]
pub struct ServiceSettings {
    /// Offset of the attendance time zone; "today" and lateness use it.
    pub utc_offset: FixedOffset,
    pub ledger_period: LedgerPeriod,
    /// Name of the work type used for implicit entries.
    pub default_work_type: String,
}

pub struct Attendance {
    store: Arc<dyn ScheduleStore>,
    directory: Arc<dyn Directory>,
    holidays: Arc<dyn HolidayCalendar>,
    clock: Arc<dyn Clock>,
    analyzer: Arc<dyn ProofAnalyzer>,
    images: Arc<dyn ImageStore>,
    events: EventBus,
    ledgers: LedgerKeeper,
    settings: ServiceSettings,
}

impl Attendance {
    pub fn new(collaborators: Collaborators, events: EventBus, settings: ServiceSettings) -> Self {
        let ledgers = LedgerKeeper::new(collaborators.store.clone(), events.clone(), settings.ledger_period);
        Self {
            store: collaborators.store,
            directory: collaborators.directory,
            holidays: collaborators.holidays,
            clock: collaborators.clock,
            analyzer: collaborators.analyzer,
            images: collaborators.images,
            events,
            ledgers,
            settings,
        }
    }

    pub fn events(&self) -> &EventBus {
        &self.events
    }

    pub fn now_local(&self) -> DateTime<FixedOffset> {
        self.clock.now().with_timezone(&self.settings.utc_offset)
    }

    pub fn today(&self) -> NaiveDate {
        self.now_local().date_naive()
    }

    /// Looks up the acting or target person; unknown ids are a validation error.
    pub async fn person(&self, id: PersonId) -> AppResult<Person> {
        self.directory
            .get_person(id)
            .await?
            .ok_or_else(|| AppError::Validation(format!("Unknown person {}", id)))
    }

    /// Work type for implicit entries: the configured name, else the first
    /// non-deducting working type in catalog order.
    pub async fn default_work_type(&self) -> AppResult<Option<WorkType>> {
        if let Some(found) = self.store.find_work_type_by_name(&self.settings.default_work_type).await? {
            return Ok(Some(found));
        }

        let fallback = self
            .store
            .list_work_types()
            .await?
            .into_iter()
            .find(|w| w.deduction == 0.0 && w.is_working_day);
        Ok(fallback)
    }
}
