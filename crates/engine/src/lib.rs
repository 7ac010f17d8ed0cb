pub use absences::{Absence, AbsenceDraft, AbsenceKind, AbsenceStore, AbsenceUpdate};
pub use error::EngineError;
pub use ledger::LeaveLedger;
pub use ops::{AbsenceFilter, Engine, EngineBuilder, LeaveStatistics, Snapshot};
pub use personnel::{Personnel, PersonnelStore};

mod absences;
mod error;
mod ledger;
mod ops;
mod personnel;
mod util;

/// Identifier of a personnel record.
pub type PersonnelId = i64;

/// Identifier of an absence record.
pub type AbsenceId = i64;

type ResultEngine<T> = Result<T, EngineError>;
