use chrono::{Datelike, NaiveDate};
use metrics::counter;
use std::{
    collections::{HashMap, HashSet},
    sync::{Arc, Mutex},
};
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

use super::Attendance;
use crate::{
    events::{DomainEvent, EventBus},
    models::{annual_allowance, LeaveLedger, LedgerChange, LedgerPeriod, LedgerSummary, Person, PersonId},
    store::{DateRange, ScheduleStore},
    AppError, AppResult,
};

/// Keeps every ledger's `used_leave` equal to the live deduction sum.
///
/// Entry writes reconcile inside the store's own transaction and hand the
/// result to [`LedgerKeeper::record`]. Callers hold [`LedgerKeeper::lock`]
/// for the person around each write, so mutations of one person are
/// serialized while different people never contend.
pub struct LedgerKeeper {
    store: Arc<dyn ScheduleStore>,
    events: EventBus,
    period: LedgerPeriod,
    locks: Mutex<HashMap<PersonId, Arc<AsyncMutex<()>>>>,
    in_flight: Arc<Mutex<HashSet<PersonId>>>,
}

/// Marks a recompute as running; removed on drop.
struct InFlight {
    set: Arc<Mutex<HashSet<PersonId>>>,
    person_id: PersonId,
}

impl InFlight {
    fn enter(set: &Arc<Mutex<HashSet<PersonId>>>, person_id: PersonId) -> Option<Self> {
        let inserted = set.lock().unwrap_or_else(|e| e.into_inner()).insert(person_id);
        inserted.then(|| Self {
            set: set.clone(),
            person_id,
        })
    }
}

impl Drop for InFlight {
    fn drop(&mut self) {
        self.set.lock().unwrap_or_else(|e| e.into_inner()).remove(&self.person_id);
    }
}

impl LedgerKeeper {
    pub fn new(store: Arc<dyn ScheduleStore>, events: EventBus, period: LedgerPeriod) -> Self {
        Self {
            store,
            events,
            period,
            locks: Mutex::new(HashMap::new()),
            in_flight: Arc::new(Mutex::new(HashSet::new())),
        }
    }

    /// Per-person mutation lock.
    pub async fn lock(&self, person_id: PersonId) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.locks.lock().unwrap_or_else(|e| e.into_inner());
            locks.entry(person_id).or_default().clone()
        };
        lock.lock_owned().await
    }

    /// Dates whose deductions count on `today`.
    pub fn period(&self, today: NaiveDate) -> Option<DateRange> {
        self.period.range(today)
    }

    /// Counts a committed reconciliation and announces it when `used_leave` moved.
    pub fn record(&self, change: &LedgerChange) {
        let changed = change.changed();
        counter!("ledger_recomputes_total", "changed" => changed.to_string()).increment(1);

        if changed {
            let person_id = change.ledger.person_id;
            tracing::info!(
                person_id,
                previous_used = change.previous_used,
                used = change.ledger.used_leave,
                "Leave ledger updated"
            );
            self.events.publish(DomainEvent::LedgerChanged {
                person_id,
                previous_used: change.previous_used,
                ledger: change.ledger.summary(),
            });
        }
    }

    /// Reconciles the person's ledger. Returns `None` when a recompute for the
    /// same person is already running.
    pub async fn recompute(&self, person_id: PersonId, today: NaiveDate) -> AppResult<Option<LedgerChange>> {
        let Some(_flight) = InFlight::enter(&self.in_flight, person_id) else {
            tracing::debug!(person_id, "Ledger recompute already in flight, skipping");
            return Ok(None);
        };

        let change = self.store.reconcile_ledger(person_id, self.period(today)).await?;
        self.record(&change);
        Ok(Some(change))
    }

    /// Re-sums a ledger last reconciled for an earlier period, such as last
    /// year's after New Year.
    pub async fn refresh(&self, ledger: LeaveLedger, today: NaiveDate) -> AppResult<LeaveLedger> {
        if self.period.is_current(&ledger, today) {
            return Ok(ledger);
        }

        let person_id = ledger.person_id;
        tracing::debug!(person_id, period_start = ?ledger.period_start, "Ledger period ended, reconciling");
        let _guard = self.lock(person_id).await;
        Ok(match self.recompute(person_id, today).await? {
            Some(change) => change.ledger,
            None => ledger,
        })
    }

    /// Locks and recomputes each person in turn.
    pub async fn recompute_many(&self, people: &[PersonId], today: NaiveDate) -> AppResult<()> {
        for &person_id in people {
            let _guard = self.lock(person_id).await;
            self.recompute(person_id, today).await?;
        }
        Ok(())
    }
}

impl Attendance {
    /// Creates the person's ledger with their tenure allowance and syncs it
    /// with any existing entries. Opening twice keeps the first row.
    pub async fn open_ledger(&self, person_id: PersonId) -> AppResult<LeaveLedger> {
        let person = self.person(person_id).await?;
        let today = self.today();

        let _guard = self.ledgers.lock(person_id).await;
        let total = annual_allowance(person.joined_at, today.year());
        if self.store.open_ledger(person_id, total).await? {
            tracing::info!(person_id, total_leave = total, "Leave ledger opened");
        }
        self.ledgers.recompute(person_id, today).await?;

        self.store
            .get_ledger(person_id)
            .await?
            .ok_or_else(|| AppError::Internal(format!("Ledger for person {} vanished after opening", person_id)))
    }

    /// Opens ledgers for directory people that have none; returns how many were opened.
    pub async fn open_missing_ledgers(&self) -> AppResult<usize> {
        let people = self.directory.list_people().await?;
        let ids: Vec<PersonId> = people.iter().map(|p| p.id).collect();
        let existing: HashSet<PersonId> = self.store.list_ledgers(&ids).await?.into_iter().map(|l| l.person_id).collect();

        let mut opened = 0;
        for person in people.iter().filter(|p| !existing.contains(&p.id)) {
            self.open_ledger(person.id).await?;
            opened += 1;
        }

        if opened > 0 {
            tracing::info!(opened, "Opened missing leave ledgers");
        }
        Ok(opened)
    }

    /// The person's own ledger, or one they manage.
    pub async fn ledger_summary(&self, actor: &Person, person_id: PersonId) -> AppResult<LedgerSummary> {
        let target = self.person(person_id).await?;
        if actor.id != target.id && !actor.manages(&target) {
            return Err(AppError::Forbidden("Cannot view another person's ledger".to_string()));
        }

        let ledger = self
            .store
            .get_ledger(person_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("No leave ledger for person {}", person_id)))?;

        Ok(self.ledgers.refresh(ledger, self.today()).await?.summary())
    }

    /// Administrator override of a person's total allowance.
    pub async fn set_allowance(&self, actor: &Person, person_id: PersonId, total_leave: f64) -> AppResult<LedgerSummary> {
        if !actor.is_admin {
            return Err(AppError::Forbidden("Only administrators can change allowances".to_string()));
        }
        if !total_leave.is_finite() || total_leave < 0.0 {
            return Err(AppError::Validation("total_leave must be a non-negative number".to_string()));
        }

        let _guard = self.ledgers.lock(person_id).await;
        let ledger = self
            .store
            .set_ledger_total(person_id, total_leave)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("No leave ledger for person {}", person_id)))?;

        tracing::info!(person_id, total_leave, admin_id = actor.id, "Leave allowance overridden");
        Ok(ledger.summary())
    }
}
