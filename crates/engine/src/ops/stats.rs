//! Aggregate leave statistics.

use serde::Serialize;

use crate::AbsenceKind;

use super::Engine;

/// Totals over the roster and the absence book.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct LeaveStatistics {
    pub total_personnel: usize,
    pub active_personnel: usize,
    pub total_balance_days: i64,
    pub total_absences: usize,
    pub total_absence_days: i64,
    pub pending_validation: usize,
    pub annual_leave: usize,
    pub sick: usize,
    pub exceptional: usize,
    pub unjustified: usize,
}

impl Engine {
    /// Compute totals over personnel and absences.
    pub fn leave_statistics(&self) -> LeaveStatistics {
        let mut stats =
            self.personnel
                .list()
                .iter()
                .fold(LeaveStatistics::default(), |mut acc, personnel| {
                    acc.total_personnel += 1;
                    if personnel.active {
                        acc.active_personnel += 1;
                    }
                    acc.total_balance_days += personnel.leave_balance;
                    acc
                });
        for absence in self.absences.list_all() {
            stats.total_absences += 1;
            stats.total_absence_days += absence.duration_days();
            if !absence.admin_validated {
                stats.pending_validation += 1;
            }
            match absence.kind {
                AbsenceKind::AnnualLeave => stats.annual_leave += 1,
                AbsenceKind::Sick => stats.sick += 1,
                AbsenceKind::Exceptional => stats.exceptional += 1,
                AbsenceKind::Unjustified => stats.unjustified += 1,
            }
        }
        stats
    }
}
