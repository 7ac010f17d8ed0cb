//! Personnel seeding and read access.

use crate::{Personnel, PersonnelId, ResultEngine};

use super::Engine;

impl Engine {
    /// Register a personnel record with its starting leave balance.
    ///
    /// Seeding entry point for the onboarding collaborator; day-to-day balance
    /// changes go through the absence operations only.
    pub fn add_personnel(
        &self,
        name: &str,
        employment_type: &str,
        initial_balance: i64,
    ) -> ResultEngine<Personnel> {
        let personnel = self.personnel.insert(name, employment_type, initial_balance)?;
        tracing::debug!(
            personnel_id = personnel.id,
            balance = initial_balance,
            "personnel registered"
        );
        Ok(personnel)
    }

    /// Return a personnel record.
    pub fn personnel(&self, id: PersonnelId) -> ResultEngine<Personnel> {
        self.personnel.get(id)
    }

    /// All personnel records, in id order.
    pub fn personnel_list(&self) -> Vec<Personnel> {
        self.personnel.list()
    }

    /// Case- and accent-insensitive search over the roster.
    pub fn search_personnel(&self, query: &str) -> Vec<Personnel> {
        self.personnel.search(query)
    }

    /// Current leave balance in days.
    pub fn leave_balance(&self, id: PersonnelId) -> ResultEngine<i64> {
        Ok(self.personnel.get(id)?.leave_balance)
    }
}
