//! Whole-state export/import: the pluggable-persistence seam.
//!
//! A snapshot is a plain serializable value; collaborators decide where and
//! how to keep it. Loading re-validates the invariants the stores enforce at
//! runtime, so a hand-edited snapshot cannot smuggle in a negative balance, a
//! dangling absence, or an id the counters would mint again.

use serde::{Deserialize, Serialize};

use crate::{
    Absence, AbsenceId, AbsenceStore, EngineError, Personnel, PersonnelId, PersonnelStore,
    ResultEngine,
};

use super::Engine;

/// Full engine state.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Snapshot {
    pub personnel: Vec<Personnel>,
    pub next_personnel_id: PersonnelId,
    pub absences: Vec<Absence>,
    pub next_absence_id: AbsenceId,
}

impl Snapshot {
    pub(crate) fn into_stores(self) -> ResultEngine<(PersonnelStore, AbsenceStore)> {
        let personnel = PersonnelStore::hydrate(self.personnel, self.next_personnel_id)?;
        for absence in &self.absences {
            personnel.get(absence.personnel_id).map_err(|_| {
                EngineError::InvalidState(format!(
                    "absence {} references unknown personnel {}",
                    absence.id, absence.personnel_id
                ))
            })?;
        }
        let absences = AbsenceStore::hydrate(self.absences, self.next_absence_id)?;
        Ok((personnel, absences))
    }
}

impl Engine {
    /// Export the full engine state.
    ///
    /// Take the snapshot at a quiescent point; it is assembled store by store,
    /// not under the per-personnel locks.
    pub fn snapshot(&self) -> Snapshot {
        let (personnel, next_personnel_id) = self.personnel.export();
        let (absences, next_absence_id) = self.absences.export();
        Snapshot {
            personnel,
            next_personnel_id,
            absences,
            next_absence_id,
        }
    }
}
