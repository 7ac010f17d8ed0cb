//! Absence write operations: create, update, validate, delete.
//!
//! Each operation is all-or-nothing: the stores and the ledger either both
//! move or neither does. There is no storage transaction to lean on, so the
//! create path compensates (deletes the record it just stored) when the charge
//! fails, and the reversal paths run the ledger *before* touching the record.

use std::sync::PoisonError;

use chrono::Utc;

use crate::{
    Absence, AbsenceDraft, AbsenceId, AbsenceKind, AbsenceUpdate, EngineError, ResultEngine,
    absences::{validate_date_range, validate_reason},
    util,
};

use super::Engine;

impl Engine {
    /// Create an absence and apply its creation-time balance effect.
    ///
    /// Annual leave is charged immediately and fails with
    /// [`EngineError::InsufficientBalance`] when the balance cannot cover the
    /// duration; in that case the stored record is rolled back and nothing is
    /// persisted.
    pub fn create_absence(&self, draft: AbsenceDraft) -> ResultEngine<Absence> {
        let absence = Absence::from_draft(draft, Utc::now())?;
        let personnel_id = absence.personnel_id;

        let lock = self.personnel_lock(personnel_id);
        let _guard = lock.lock().unwrap_or_else(PoisonError::into_inner);

        // Resolve the owner before touching the stores.
        self.personnel.get(personnel_id)?;

        let kind = absence.kind;
        let duration = absence.duration_days();
        let mut stored = self.absences.create(absence);
        match self.ledger.charge(personnel_id, kind, duration) {
            Ok((balance, charged_days)) => {
                if charged_days != 0 {
                    stored.charged_days = charged_days;
                    stored = self.absences.update(stored)?;
                }
                tracing::info!(
                    absence_id = stored.id,
                    personnel_id,
                    kind = kind.as_str(),
                    days = duration,
                    balance,
                    "absence created"
                );
                Ok(stored)
            }
            Err(err) => {
                // Creation is all-or-nothing: drop the record we just stored.
                self.absences.delete(stored.id);
                Err(err)
            }
        }
    }

    /// Replace the descriptive fields of an absence.
    ///
    /// The kind and the owner are immutable, and the validation flag moves
    /// only through [`Engine::set_validation`]. A date edit that changes the
    /// duration of an already-charged annual leave re-charges the difference,
    /// and fails without touching the record when the balance cannot cover it.
    pub fn update_absence(&self, update: AbsenceUpdate) -> ResultEngine<Absence> {
        let current = self.absences.get(update.id)?;
        let lock = self.personnel_lock(current.personnel_id);
        let _guard = lock.lock().unwrap_or_else(PoisonError::into_inner);
        // Re-read under the lock; the record may have changed meanwhile.
        let current = self.absences.get(update.id)?;

        validate_date_range(update.start_date, update.end_date)?;
        let reason = util::normalize_optional_text(update.reason.as_deref());
        validate_reason(current.kind, reason.as_deref())?;

        let mut candidate = current.clone();
        candidate.start_date = update.start_date;
        candidate.end_date = update.end_date;
        candidate.reason = reason;
        candidate.proof_reference = util::normalize_optional_text(update.proof_reference.as_deref());

        if current.charged_days != 0 {
            let new_duration = candidate.duration_days();
            let delta = new_duration - current.charged_days;
            if delta > 0 {
                self.ledger.charge(current.personnel_id, current.kind, delta)?;
            } else if delta < 0 {
                self.ledger.restore(current.personnel_id, -delta)?;
            }
            if delta != 0 {
                candidate.charged_days = new_duration;
                tracing::debug!(
                    absence_id = current.id,
                    personnel_id = current.personnel_id,
                    delta,
                    "annual leave re-charged after date edit"
                );
            }
        }

        candidate.updated_at = Utc::now();
        self.absences.update(candidate)
    }

    /// Flip the administrative validation flag.
    ///
    /// Validating an unjustified absence applies the penalty once and records
    /// the amount actually deducted; un-validating credits exactly that amount
    /// back. A call that does not change the flag is a no-op.
    pub fn set_validation(&self, id: AbsenceId, validate: bool) -> ResultEngine<Absence> {
        let current = self.absences.get(id)?;
        let lock = self.personnel_lock(current.personnel_id);
        let _guard = lock.lock().unwrap_or_else(PoisonError::into_inner);
        let mut absence = self.absences.get(id)?;

        if absence.admin_validated == validate {
            return Ok(absence);
        }

        if validate {
            if absence.kind == AbsenceKind::Unjustified {
                if absence.penalty_days != 0 {
                    return Err(EngineError::InvalidState(format!(
                        "absence {id} already carries a penalty of {} days",
                        absence.penalty_days
                    )));
                }
                let (balance, realized) = self
                    .ledger
                    .apply_validation_penalty(absence.personnel_id, absence.duration_days())?;
                absence.penalty_days = realized;
                tracing::info!(
                    absence_id = id,
                    personnel_id = absence.personnel_id,
                    penalty = realized,
                    balance,
                    "unjustified absence validated"
                );
            }
        } else if absence.penalty_days != 0 {
            let balance = self
                .ledger
                .restore(absence.personnel_id, absence.penalty_days)?;
            tracing::info!(
                absence_id = id,
                personnel_id = absence.personnel_id,
                restored = absence.penalty_days,
                balance,
                "validation penalty reversed"
            );
            absence.penalty_days = 0;
        }

        absence.admin_validated = validate;
        absence.updated_at = Utc::now();
        self.absences.update(absence)
    }

    /// Delete an absence, reversing whatever net balance effect it carries.
    ///
    /// Returns whether a record was removed. When the reversal fails the
    /// record stays in place.
    pub fn delete_absence(&self, id: AbsenceId) -> ResultEngine<bool> {
        let Ok(current) = self.absences.get(id) else {
            return Ok(false);
        };
        let lock = self.personnel_lock(current.personnel_id);
        let _guard = lock.lock().unwrap_or_else(PoisonError::into_inner);
        let Ok(absence) = self.absences.get(id) else {
            return Ok(false);
        };

        let refund = absence.charged_days + absence.penalty_days;
        if refund != 0 {
            let balance = self.ledger.restore(absence.personnel_id, refund)?;
            tracing::info!(
                absence_id = id,
                personnel_id = absence.personnel_id,
                restored = refund,
                balance,
                "balance restored before delete"
            );
        }
        Ok(self.absences.delete(id))
    }
}
