//! Read-only absence queries.

use crate::{Absence, AbsenceId, AbsenceKind, PersonnelId, ResultEngine, util};

use super::Engine;

/// Filter for [`Engine::find_absences`]. An empty filter matches everything.
#[derive(Clone, Debug, Default)]
pub struct AbsenceFilter {
    pub kind: Option<AbsenceKind>,
    pub validated: Option<bool>,
    pub query: Option<String>,
}

impl Engine {
    /// Return an absence.
    pub fn absence(&self, id: AbsenceId) -> ResultEngine<Absence> {
        self.absences.get(id)
    }

    /// All absences of one personnel, in creation order.
    pub fn absences_for_personnel(&self, personnel_id: PersonnelId) -> ResultEngine<Vec<Absence>> {
        self.personnel.get(personnel_id)?;
        Ok(self.absences.list_by_personnel(personnel_id))
    }

    /// All absences, in id order.
    pub fn absences(&self) -> Vec<Absence> {
        self.absences.list_all()
    }

    /// Absences matching a kind/validation/text filter.
    ///
    /// The text query matches the reason and the owner's name, case- and
    /// accent-insensitively.
    pub fn find_absences(&self, filter: &AbsenceFilter) -> Vec<Absence> {
        let needle = filter
            .query
            .as_deref()
            .map(str::trim)
            .filter(|query| !query.is_empty())
            .map(util::search_fold);
        self.absences
            .list_all()
            .into_iter()
            .filter(|absence| filter.kind.is_none_or(|kind| absence.kind == kind))
            .filter(|absence| {
                filter
                    .validated
                    .is_none_or(|validated| absence.admin_validated == validated)
            })
            .filter(|absence| match &needle {
                None => true,
                Some(needle) => {
                    absence
                        .reason
                        .as_deref()
                        .is_some_and(|reason| util::search_fold(reason).contains(needle))
                        || self
                            .personnel
                            .get(absence.personnel_id)
                            .map(|personnel| util::search_fold(&personnel.name).contains(needle))
                            .unwrap_or(false)
                }
            })
            .collect()
    }
}
