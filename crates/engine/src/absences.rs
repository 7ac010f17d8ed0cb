//! The module contains the representation of an absence and its store.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::{AbsenceId, EngineError, PersonnelId, ResultEngine, util};

/// The kind of an absence, driving its effect on the leave balance.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AbsenceKind {
    AnnualLeave,
    Sick,
    Exceptional,
    Unjustified,
}

impl AbsenceKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::AnnualLeave => "annual_leave",
            Self::Sick => "sick",
            Self::Exceptional => "exceptional",
            Self::Unjustified => "unjustified",
        }
    }

    /// Whether a reason is mandatory for this kind.
    pub fn requires_reason(self) -> bool {
        matches!(self, Self::Exceptional | Self::Unjustified)
    }
}

impl TryFrom<&str> for AbsenceKind {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "annual_leave" => Ok(Self::AnnualLeave),
            "sick" => Ok(Self::Sick),
            "exceptional" => Ok(Self::Exceptional),
            "unjustified" => Ok(Self::Unjustified),
            other => Err(EngineError::Validation(format!(
                "invalid absence kind: {other}"
            ))),
        }
    }
}

/// A recorded absence.
///
/// `charged_days` and `penalty_days` hold the deductions actually applied for
/// this absence (creation charge and validation penalty). They are what a
/// reversal credits back, so a clamped penalty is reversed exactly instead of
/// re-deriving a nominal amount from kind and duration.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Absence {
    pub id: AbsenceId,
    pub personnel_id: PersonnelId,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub kind: AbsenceKind,
    pub reason: Option<String>,
    pub proof_reference: Option<String>,
    pub admin_validated: bool,
    pub charged_days: i64,
    pub penalty_days: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Absence {
    /// Inclusive day count of the date range.
    pub fn duration_days(&self) -> i64 {
        inclusive_days(self.start_date, self.end_date)
    }

    /// An absence counts as justified when it is not of the unjustified kind
    /// and carries a proof reference.
    pub fn is_justified(&self) -> bool {
        self.kind != AbsenceKind::Unjustified && self.proof_reference.is_some()
    }

    /// Build a record from a draft, normalizing text fields and checking the
    /// date range and the required-reason rule. The store assigns the real
    /// identifier on insertion.
    pub(crate) fn from_draft(draft: AbsenceDraft, now: DateTime<Utc>) -> ResultEngine<Self> {
        validate_date_range(draft.start_date, draft.end_date)?;
        let reason = util::normalize_optional_text(draft.reason.as_deref());
        validate_reason(draft.kind, reason.as_deref())?;
        Ok(Self {
            id: 0,
            personnel_id: draft.personnel_id,
            start_date: draft.start_date,
            end_date: draft.end_date,
            kind: draft.kind,
            reason,
            proof_reference: util::normalize_optional_text(draft.proof_reference.as_deref()),
            admin_validated: false,
            charged_days: 0,
            penalty_days: 0,
            created_at: now,
            updated_at: now,
        })
    }
}

/// Input for creating an absence.
#[derive(Clone, Debug)]
pub struct AbsenceDraft {
    pub personnel_id: PersonnelId,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub kind: AbsenceKind,
    pub reason: Option<String>,
    pub proof_reference: Option<String>,
}

impl AbsenceDraft {
    /// Inclusive day count of the drafted date range.
    ///
    /// ```rust
    /// use chrono::NaiveDate;
    /// use engine::{AbsenceDraft, AbsenceKind};
    ///
    /// let draft = AbsenceDraft {
    ///     personnel_id: 1,
    ///     start_date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
    ///     end_date: NaiveDate::from_ymd_opt(2024, 1, 5).unwrap(),
    ///     kind: AbsenceKind::Sick,
    ///     reason: None,
    ///     proof_reference: None,
    /// };
    /// assert_eq!(draft.duration_days(), 5);
    /// ```
    pub fn duration_days(&self) -> i64 {
        inclusive_days(self.start_date, self.end_date)
    }
}

/// Input for updating an absence's descriptive fields.
///
/// Kind, owner and validation state are deliberately absent: the kind and the
/// owner are immutable, and the validation flag moves only through the
/// engine's validation operation.
#[derive(Clone, Debug)]
pub struct AbsenceUpdate {
    pub id: AbsenceId,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub reason: Option<String>,
    pub proof_reference: Option<String>,
}

fn inclusive_days(start: NaiveDate, end: NaiveDate) -> i64 {
    end.signed_duration_since(start).num_days() + 1
}

pub(crate) fn validate_date_range(start: NaiveDate, end: NaiveDate) -> ResultEngine<()> {
    if end < start {
        return Err(EngineError::Validation(
            "end date must not precede start date".to_string(),
        ));
    }
    Ok(())
}

pub(crate) fn validate_reason(kind: AbsenceKind, reason: Option<&str>) -> ResultEngine<()> {
    if kind.requires_reason() && reason.is_none() {
        return Err(EngineError::Validation(format!(
            "a reason is required for {} absences",
            kind.as_str()
        )));
    }
    Ok(())
}

#[derive(Debug, Default)]
struct AbsenceMap {
    records: BTreeMap<AbsenceId, Absence>,
    by_personnel: BTreeMap<PersonnelId, Vec<AbsenceId>>,
}

/// In-memory store of absences: a primary map keyed by id plus an explicit
/// per-personnel index, kept consistent on every mutation.
#[derive(Debug)]
pub struct AbsenceStore {
    inner: RwLock<AbsenceMap>,
    next_id: AtomicI64,
}

impl AbsenceStore {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(AbsenceMap::default()),
            next_id: AtomicI64::new(1),
        }
    }

    /// Store a new absence under a freshly minted identifier.
    ///
    /// Identifiers are monotonically increasing and never reused, also across
    /// deletions.
    pub fn create(&self, mut absence: Absence) -> Absence {
        absence.id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let mut inner = self.write_inner();
        inner
            .by_personnel
            .entry(absence.personnel_id)
            .or_default()
            .push(absence.id);
        inner.records.insert(absence.id, absence.clone());
        absence
    }

    /// Replace the absence with the matching identifier.
    pub fn update(&self, absence: Absence) -> ResultEngine<Absence> {
        let mut inner = self.write_inner();
        let Some(previous) = inner.records.get(&absence.id).cloned() else {
            return Err(EngineError::NotFound(format!("absence {}", absence.id)));
        };
        if previous.personnel_id != absence.personnel_id {
            // Keep the index consistent even if a caller re-homes the record.
            let drained = match inner.by_personnel.get_mut(&previous.personnel_id) {
                Some(ids) => {
                    ids.retain(|id| *id != absence.id);
                    ids.is_empty()
                }
                None => false,
            };
            if drained {
                inner.by_personnel.remove(&previous.personnel_id);
            }
            inner
                .by_personnel
                .entry(absence.personnel_id)
                .or_default()
                .push(absence.id);
        }
        inner.records.insert(absence.id, absence.clone());
        Ok(absence)
    }

    /// Remove the absence; returns whether it existed.
    pub fn delete(&self, id: AbsenceId) -> bool {
        let mut inner = self.write_inner();
        let Some(absence) = inner.records.remove(&id) else {
            return false;
        };
        let drained = match inner.by_personnel.get_mut(&absence.personnel_id) {
            Some(ids) => {
                ids.retain(|entry| *entry != id);
                ids.is_empty()
            }
            None => false,
        };
        if drained {
            inner.by_personnel.remove(&absence.personnel_id);
        }
        true
    }

    /// Return an absence.
    pub fn get(&self, id: AbsenceId) -> ResultEngine<Absence> {
        self.read_inner()
            .records
            .get(&id)
            .cloned()
            .ok_or_else(|| EngineError::NotFound(format!("absence {id}")))
    }

    /// All absences of one personnel, in insertion order.
    pub fn list_by_personnel(&self, personnel_id: PersonnelId) -> Vec<Absence> {
        let inner = self.read_inner();
        inner
            .by_personnel
            .get(&personnel_id)
            .map(|ids| {
                ids.iter()
                    .filter_map(|id| inner.records.get(id).cloned())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// All absences, in id order.
    pub fn list_all(&self) -> Vec<Absence> {
        self.read_inner().records.values().cloned().collect()
    }

    pub(crate) fn export(&self) -> (Vec<Absence>, AbsenceId) {
        (
            self.read_inner().records.values().cloned().collect(),
            self.next_id.load(Ordering::SeqCst),
        )
    }

    pub(crate) fn hydrate(absences: Vec<Absence>, next_id: AbsenceId) -> ResultEngine<Self> {
        let mut inner = AbsenceMap::default();
        for absence in absences {
            if absence.id >= next_id {
                return Err(EngineError::InvalidState(format!(
                    "absence {} is past the id counter {next_id}",
                    absence.id
                )));
            }
            if absence.charged_days < 0 || absence.penalty_days < 0 {
                return Err(EngineError::InvalidState(format!(
                    "absence {} carries negative realized deltas",
                    absence.id
                )));
            }
            validate_date_range(absence.start_date, absence.end_date)?;
            let id = absence.id;
            let personnel_id = absence.personnel_id;
            if inner.records.insert(id, absence).is_some() {
                return Err(EngineError::InvalidState(format!("duplicate absence {id}")));
            }
            inner.by_personnel.entry(personnel_id).or_default().push(id);
        }
        Ok(Self {
            inner: RwLock::new(inner),
            next_id: AtomicI64::new(next_id.max(1)),
        })
    }

    fn read_inner(&self) -> RwLockReadGuard<'_, AbsenceMap> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_inner(&self) -> RwLockWriteGuard<'_, AbsenceMap> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for AbsenceStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn draft(personnel_id: PersonnelId, kind: AbsenceKind) -> AbsenceDraft {
        AbsenceDraft {
            personnel_id,
            start_date: date(2024, 1, 1),
            end_date: date(2024, 1, 5),
            kind,
            reason: Some("family event".to_string()),
            proof_reference: None,
        }
    }

    fn absence(personnel_id: PersonnelId, kind: AbsenceKind) -> Absence {
        Absence::from_draft(draft(personnel_id, kind), Utc.timestamp_opt(0, 0).unwrap()).unwrap()
    }

    #[test]
    fn kind_round_trips_through_str() {
        for kind in [
            AbsenceKind::AnnualLeave,
            AbsenceKind::Sick,
            AbsenceKind::Exceptional,
            AbsenceKind::Unjustified,
        ] {
            assert_eq!(AbsenceKind::try_from(kind.as_str()).unwrap(), kind);
        }
        assert!(AbsenceKind::try_from("holiday").is_err());
    }

    #[test]
    fn duration_is_inclusive() {
        let absence = absence(1, AbsenceKind::Sick);
        assert_eq!(absence.duration_days(), 5);

        let mut single = absence.clone();
        single.end_date = single.start_date;
        assert_eq!(single.duration_days(), 1);
    }

    #[test]
    fn from_draft_rejects_reversed_dates() {
        let mut bad = draft(1, AbsenceKind::Sick);
        bad.start_date = date(2024, 1, 10);
        let err = Absence::from_draft(bad, Utc::now()).unwrap_err();
        assert!(matches!(err, EngineError::Validation(_)));
    }

    #[test]
    fn from_draft_requires_reason_for_unjustified() {
        let mut bad = draft(1, AbsenceKind::Unjustified);
        bad.reason = Some("   ".to_string());
        let err = Absence::from_draft(bad, Utc::now()).unwrap_err();
        assert!(matches!(err, EngineError::Validation(_)));

        let mut ok = draft(1, AbsenceKind::AnnualLeave);
        ok.reason = None;
        assert!(Absence::from_draft(ok, Utc::now()).is_ok());
    }

    #[test]
    fn justified_needs_proof_and_non_unjustified_kind() {
        let mut sick = absence(1, AbsenceKind::Sick);
        assert!(!sick.is_justified());
        sick.proof_reference = Some("scan-001".to_string());
        assert!(sick.is_justified());

        let mut unjustified = absence(1, AbsenceKind::Unjustified);
        unjustified.proof_reference = Some("scan-002".to_string());
        assert!(!unjustified.is_justified());
    }

    #[test]
    fn create_assigns_fresh_ids_and_indexes_by_personnel() {
        let store = AbsenceStore::new();
        let first = store.create(absence(7, AbsenceKind::Sick));
        let second = store.create(absence(7, AbsenceKind::AnnualLeave));
        let other = store.create(absence(9, AbsenceKind::Sick));

        assert!(second.id > first.id);
        let listed = store.list_by_personnel(7);
        assert_eq!(
            listed.iter().map(|a| a.id).collect::<Vec<_>>(),
            vec![first.id, second.id]
        );
        assert_eq!(store.list_by_personnel(9).len(), 1);
        assert_eq!(store.list_all().len(), 3);
        assert_eq!(store.get(other.id).unwrap().personnel_id, 9);
    }

    #[test]
    fn delete_removes_record_and_index_entry() {
        let store = AbsenceStore::new();
        let stored = store.create(absence(7, AbsenceKind::Sick));

        assert!(store.delete(stored.id));
        assert!(!store.delete(stored.id));
        assert!(store.list_by_personnel(7).is_empty());
        assert_eq!(
            store.get(stored.id).unwrap_err(),
            EngineError::NotFound(format!("absence {}", stored.id))
        );
    }

    #[test]
    fn ids_are_not_reused_after_delete() {
        let store = AbsenceStore::new();
        let first = store.create(absence(7, AbsenceKind::Sick));
        store.delete(first.id);
        let second = store.create(absence(7, AbsenceKind::Sick));

        assert!(second.id > first.id);
    }

    #[test]
    fn update_replaces_matching_record() {
        let store = AbsenceStore::new();
        let mut stored = store.create(absence(7, AbsenceKind::Sick));
        stored.reason = Some("flu".to_string());

        let updated = store.update(stored).unwrap();
        assert_eq!(store.get(updated.id).unwrap().reason.as_deref(), Some("flu"));

        let mut ghost = absence(7, AbsenceKind::Sick);
        ghost.id = 99;
        assert!(store.update(ghost).is_err());
    }
}
