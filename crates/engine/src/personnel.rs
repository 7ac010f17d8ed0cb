//! The module contains `Personnel` and its in-memory store.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use serde::{Deserialize, Serialize};

use crate::{EngineError, PersonnelId, ResultEngine, util};

/// A member of the personnel roster.
///
/// The record is a value type: mutation goes through
/// [`PersonnelStore::upsert`] as a full-record replace. `leave_balance` is the
/// number of paid-leave days still available; it is committed exclusively by
/// the leave ledger, every other caller treats it as read-only.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Personnel {
    pub id: PersonnelId,
    pub name: String,
    pub employment_type: String,
    pub active: bool,
    pub leave_balance: i64,
}

/// In-memory store of personnel records.
///
/// Identifiers are minted from a process-wide counter and never reused.
#[derive(Debug)]
pub struct PersonnelStore {
    records: RwLock<BTreeMap<PersonnelId, Personnel>>,
    next_id: AtomicI64,
}

impl PersonnelStore {
    pub fn new() -> Self {
        Self {
            records: RwLock::new(BTreeMap::new()),
            next_id: AtomicI64::new(1),
        }
    }

    /// Register a new personnel record with its starting leave balance.
    pub fn insert(
        &self,
        name: &str,
        employment_type: &str,
        initial_balance: i64,
    ) -> ResultEngine<Personnel> {
        if initial_balance < 0 {
            return Err(EngineError::InvalidState(format!(
                "starting balance must be >= 0, got {initial_balance}"
            )));
        }
        let personnel = Personnel {
            id: self.next_id.fetch_add(1, Ordering::SeqCst),
            name: name.trim().to_string(),
            employment_type: employment_type.trim().to_string(),
            active: true,
            leave_balance: initial_balance,
        };
        self.write_records()
            .insert(personnel.id, personnel.clone());
        Ok(personnel)
    }

    /// Return a personnel record.
    pub fn get(&self, id: PersonnelId) -> ResultEngine<Personnel> {
        self.read_records()
            .get(&id)
            .cloned()
            .ok_or_else(|| EngineError::NotFound(format!("personnel {id}")))
    }

    /// Replace the full record for `personnel.id`.
    ///
    /// Rejects a negative `leave_balance` so a ledger bug can never persist a
    /// corrupted balance.
    pub fn upsert(&self, personnel: Personnel) -> ResultEngine<Personnel> {
        if personnel.leave_balance < 0 {
            return Err(EngineError::InvalidState(format!(
                "personnel {} balance would become {}",
                personnel.id, personnel.leave_balance
            )));
        }
        let mut records = self.write_records();
        if !records.contains_key(&personnel.id) {
            return Err(EngineError::NotFound(format!("personnel {}", personnel.id)));
        }
        records.insert(personnel.id, personnel.clone());
        Ok(personnel)
    }

    /// All personnel records, in id order.
    pub fn list(&self) -> Vec<Personnel> {
        self.read_records().values().cloned().collect()
    }

    /// Case- and accent-insensitive search over name and employment type.
    pub fn search(&self, query: &str) -> Vec<Personnel> {
        let needle = util::search_fold(query.trim());
        if needle.is_empty() {
            return self.list();
        }
        self.read_records()
            .values()
            .filter(|personnel| {
                util::search_fold(&personnel.name).contains(&needle)
                    || util::search_fold(&personnel.employment_type).contains(&needle)
            })
            .cloned()
            .collect()
    }

    pub(crate) fn export(&self) -> (Vec<Personnel>, PersonnelId) {
        (
            self.read_records().values().cloned().collect(),
            self.next_id.load(Ordering::SeqCst),
        )
    }

    pub(crate) fn hydrate(personnel: Vec<Personnel>, next_id: PersonnelId) -> ResultEngine<Self> {
        let mut records = BTreeMap::new();
        for record in personnel {
            if record.leave_balance < 0 {
                return Err(EngineError::InvalidState(format!(
                    "personnel {} has negative balance {}",
                    record.id, record.leave_balance
                )));
            }
            if record.id >= next_id {
                return Err(EngineError::InvalidState(format!(
                    "personnel {} is past the id counter {next_id}",
                    record.id
                )));
            }
            let id = record.id;
            if records.insert(id, record).is_some() {
                return Err(EngineError::InvalidState(format!(
                    "duplicate personnel {id}"
                )));
            }
        }
        Ok(Self {
            records: RwLock::new(records),
            next_id: AtomicI64::new(next_id.max(1)),
        })
    }

    fn read_records(&self) -> RwLockReadGuard<'_, BTreeMap<PersonnelId, Personnel>> {
        self.records.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_records(&self) -> RwLockWriteGuard<'_, BTreeMap<PersonnelId, Personnel>> {
        self.records.write().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for PersonnelStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> PersonnelStore {
        PersonnelStore::new()
    }

    #[test]
    fn insert_assigns_increasing_ids() {
        let store = store();
        let first = store.insert("Imane Alaoui", "teaching", 30).unwrap();
        let second = store.insert("Karim Bennis", "administrative", 22).unwrap();

        assert!(second.id > first.id);
        assert_eq!(store.get(first.id).unwrap().leave_balance, 30);
    }

    #[test]
    fn insert_rejects_negative_starting_balance() {
        let err = store().insert("Imane Alaoui", "teaching", -1).unwrap_err();
        assert!(matches!(err, EngineError::InvalidState(_)));
    }

    #[test]
    fn upsert_rejects_negative_balance() {
        let store = store();
        let mut personnel = store.insert("Imane Alaoui", "teaching", 10).unwrap();
        personnel.leave_balance = -2;

        let err = store.upsert(personnel).unwrap_err();
        assert!(matches!(err, EngineError::InvalidState(_)));
        assert_eq!(store.get(1).unwrap().leave_balance, 10);
    }

    #[test]
    fn upsert_unknown_id_fails() {
        let store = store();
        let ghost = Personnel {
            id: 99,
            name: "Ghost".to_string(),
            employment_type: "teaching".to_string(),
            active: true,
            leave_balance: 5,
        };
        assert_eq!(
            store.upsert(ghost).unwrap_err(),
            EngineError::NotFound("personnel 99".to_string())
        );
    }

    #[test]
    fn search_ignores_case_and_accents() {
        let store = store();
        store.insert("Imane Alaoui", "pédagogique", 30).unwrap();
        store.insert("Karim Bennis", "administrative", 22).unwrap();

        let hits = store.search("ALAOUÏ");
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].name, "Imane Alaoui");

        let hits = store.search("pedagogique");
        assert_eq!(hits.len(), 1);
    }
}
