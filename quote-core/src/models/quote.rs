use serde::{Deserialize, Serialize};

use crate::calculations::OperationLedger;

/// A quote being built in the current session. Never persisted.
///
/// `quantity` is kept as entered; the pricing engine rejects anything
/// below 1.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quote {
    pub job_name: String,
    pub customer_name: String,
    pub material: String,
    pub quantity: i64,
    pub notes: String,
    pub operations: OperationLedger,
}

impl Quote {
    pub fn new(
        job_name: impl Into<String>,
        customer_name: impl Into<String>,
        material: impl Into<String>,
        quantity: i64,
    ) -> Self {
        Self {
            job_name: job_name.into(),
            customer_name: customer_name.into(),
            material: material.into(),
            quantity,
            ..Default::default()
        }
    }

    /// Resets the form to a fresh quote for `material`, optionally keeping
    /// the job and customer names. The ledger (and its id counter) is
    /// replaced.
    pub fn clear(
        &mut self,
        material: impl Into<String>,
        keep_job_info: bool,
    ) {
        if !keep_job_info {
            self.job_name.clear();
            self.customer_name.clear();
        }
        self.material = material.into();
        self.quantity = 1;
        self.notes.clear();
        self.operations = OperationLedger::with_policy(self.operations.policy());
    }
}
