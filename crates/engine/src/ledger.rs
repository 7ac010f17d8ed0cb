//! The leave ledger: the only writer of personnel leave balances.
//!
//! The ledger translates an absence's kind and validation transition into a
//! balance delta and commits it through [`PersonnelStore::upsert`]. Callers
//! hold the per-personnel critical section for the whole read-modify-write, so
//! the load/store pair here never interleaves with another mutation of the
//! same personnel.

use std::sync::Arc;

use crate::{AbsenceKind, EngineError, PersonnelId, PersonnelStore, ResultEngine};

/// Balance policy, in days, for an absence of duration `d`:
///
/// | kind         | creation charge            | validation penalty     |
/// |--------------|----------------------------|------------------------|
/// | annual leave | `-d` (needs `d` available) | —                      |
/// | sick         | 0                          | —                      |
/// | exceptional  | 0                          | —                      |
/// | unjustified  | 0                          | `-2d`, clamped at zero |
#[derive(Clone, Debug)]
pub struct LeaveLedger {
    personnel: Arc<PersonnelStore>,
}

impl LeaveLedger {
    pub fn new(personnel: Arc<PersonnelStore>) -> Self {
        Self { personnel }
    }

    /// Apply the creation-time effect of an absence.
    ///
    /// Returns the new balance and the days actually charged. Only annual
    /// leave is charged at creation; the other kinds leave the balance
    /// untouched.
    pub fn charge(
        &self,
        personnel_id: PersonnelId,
        kind: AbsenceKind,
        duration_days: i64,
    ) -> ResultEngine<(i64, i64)> {
        let mut personnel = self.personnel.get(personnel_id)?;
        if kind != AbsenceKind::AnnualLeave {
            return Ok((personnel.leave_balance, 0));
        }
        if personnel.leave_balance < duration_days {
            return Err(EngineError::InsufficientBalance(format!(
                "{} days available, {duration_days} requested",
                personnel.leave_balance
            )));
        }
        personnel.leave_balance -= duration_days;
        let committed = self.personnel.upsert(personnel)?;
        Ok((committed.leave_balance, duration_days))
    }

    /// Apply the penalty for validating an unjustified absence: two days per
    /// absence day, clamped so the balance never goes negative.
    ///
    /// Returns the new balance and the days actually deducted; the caller
    /// records the realized amount so the penalty can be reversed exactly.
    pub fn apply_validation_penalty(
        &self,
        personnel_id: PersonnelId,
        duration_days: i64,
    ) -> ResultEngine<(i64, i64)> {
        let mut personnel = self.personnel.get(personnel_id)?;
        let realized = (duration_days * 2).min(personnel.leave_balance);
        personnel.leave_balance -= realized;
        let committed = self.personnel.upsert(personnel)?;
        Ok((committed.leave_balance, realized))
    }

    /// Credit back previously charged days (creation charge and/or realized
    /// penalty).
    pub fn restore(&self, personnel_id: PersonnelId, days: i64) -> ResultEngine<i64> {
        if days < 0 {
            return Err(EngineError::InvalidState(format!(
                "cannot restore {days} days"
            )));
        }
        let mut personnel = self.personnel.get(personnel_id)?;
        if days == 0 {
            return Ok(personnel.leave_balance);
        }
        personnel.leave_balance += days;
        let committed = self.personnel.upsert(personnel)?;
        Ok(committed.leave_balance)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ledger_with_balance(balance: i64) -> (LeaveLedger, PersonnelId) {
        let personnel = Arc::new(PersonnelStore::new());
        let record = personnel
            .insert("Imane Alaoui", "teaching", balance)
            .unwrap();
        (LeaveLedger::new(personnel), record.id)
    }

    #[test]
    fn annual_leave_charges_its_duration() {
        let (ledger, id) = ledger_with_balance(30);
        assert_eq!(
            ledger.charge(id, AbsenceKind::AnnualLeave, 5).unwrap(),
            (25, 5)
        );
    }

    #[test]
    fn non_annual_kinds_are_never_charged() {
        let (ledger, id) = ledger_with_balance(30);
        for kind in [
            AbsenceKind::Sick,
            AbsenceKind::Exceptional,
            AbsenceKind::Unjustified,
        ] {
            assert_eq!(ledger.charge(id, kind, 90).unwrap(), (30, 0));
        }
    }

    #[test]
    fn charge_fails_when_balance_is_short() {
        let (ledger, id) = ledger_with_balance(3);
        let err = ledger.charge(id, AbsenceKind::AnnualLeave, 5).unwrap_err();
        assert!(matches!(err, EngineError::InsufficientBalance(_)));
        assert_eq!(ledger.charge(id, AbsenceKind::Sick, 1).unwrap().0, 3);
    }

    #[test]
    fn penalty_is_twice_the_duration() {
        let (ledger, id) = ledger_with_balance(25);
        assert_eq!(ledger.apply_validation_penalty(id, 3).unwrap(), (19, 6));
    }

    #[test]
    fn penalty_clamps_at_zero_and_reports_realized_amount() {
        let (ledger, id) = ledger_with_balance(4);
        assert_eq!(ledger.apply_validation_penalty(id, 3).unwrap(), (0, 4));
    }

    #[test]
    fn restore_credits_exactly_the_given_days() {
        let (ledger, id) = ledger_with_balance(10);
        ledger.charge(id, AbsenceKind::AnnualLeave, 4).unwrap();
        assert_eq!(ledger.restore(id, 4).unwrap(), 10);
        assert_eq!(ledger.restore(id, 0).unwrap(), 10);
        assert!(ledger.restore(id, -1).is_err());
    }

    #[test]
    fn unknown_personnel_is_reported() {
        let (ledger, _) = ledger_with_balance(10);
        assert_eq!(
            ledger.charge(99, AbsenceKind::AnnualLeave, 1).unwrap_err(),
            EngineError::NotFound("personnel 99".to_string())
        );
    }
}
