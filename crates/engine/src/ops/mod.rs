use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use crate::{AbsenceStore, LeaveLedger, PersonnelId, PersonnelStore, ResultEngine};

mod absences;
mod personnel;
mod queries;
mod snapshot;
mod stats;

pub use queries::AbsenceFilter;
pub use snapshot::Snapshot;
pub use stats::LeaveStatistics;

/// The engine owns the stores and serializes balance-affecting operations per
/// personnel.
///
/// Methods take `&self`; concurrent callers share the engine behind an
/// [`Arc`]. Every compound write acquires the owning personnel's mutex for its
/// whole read-modify-write, so two operations on the same personnel never
/// interleave while operations on different personnel run in parallel.
#[derive(Debug)]
pub struct Engine {
    personnel: Arc<PersonnelStore>,
    absences: AbsenceStore,
    ledger: LeaveLedger,
    personnel_locks: Mutex<HashMap<PersonnelId, Arc<Mutex<()>>>>,
}

impl Engine {
    /// Return a builder for `Engine`. Help to build the struct.
    pub fn builder() -> EngineBuilder {
        EngineBuilder::default()
    }

    /// Hand out the mutex guarding balance mutations for one personnel.
    fn personnel_lock(&self, personnel_id: PersonnelId) -> Arc<Mutex<()>> {
        let mut locks = self
            .personnel_locks
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        locks.entry(personnel_id).or_default().clone()
    }
}

/// The builder for `Engine`
#[derive(Default)]
pub struct EngineBuilder {
    snapshot: Option<Snapshot>,
}

impl EngineBuilder {
    /// Seed the engine from a previously exported snapshot.
    pub fn snapshot(mut self, snapshot: Snapshot) -> EngineBuilder {
        self.snapshot = Some(snapshot);
        self
    }

    /// Construct `Engine`
    pub fn build(self) -> ResultEngine<Engine> {
        let (personnel, absences) = match self.snapshot {
            Some(snapshot) => snapshot.into_stores()?,
            None => (PersonnelStore::new(), AbsenceStore::new()),
        };
        let personnel = Arc::new(personnel);
        tracing::debug!(
            personnel = personnel.list().len(),
            absences = absences.list_all().len(),
            "engine ready"
        );
        Ok(Engine {
            ledger: LeaveLedger::new(Arc::clone(&personnel)),
            personnel,
            absences,
            personnel_locks: Mutex::new(HashMap::new()),
        })
    }
}
