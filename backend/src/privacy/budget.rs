//! Per-user privacy-budget ledger.
//!
//! Epsilon is tracked in fixed-point milli-units per user and per operation
//! category. The one piece of shared mutable state in the pipeline: every
//! consumption is a single atomic check-then-reserve under the ledger lock,
//! so two concurrent requests can never both pass a check against a stale
//! remaining balance. Consumption is monotonic; exhaustion is terminal for
//! the user until an administrative reset.

use crate::errors::PipelineError;
use std::collections::{BTreeMap, HashMap};
use std::sync::Mutex;

/// Operation categories the allocation table is keyed by.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum BudgetCategory {
    Analysis,
    Issuance,
    Aggregation,
    Statistics,
}

impl BudgetCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            BudgetCategory::Analysis => "analysis",
            BudgetCategory::Issuance => "issuance",
            BudgetCategory::Aggregation => "aggregation",
            BudgetCategory::Statistics => "statistics",
        }
    }
}

/// One user's budget state.
#[derive(Clone, Debug)]
pub struct UserBudget {
    pub total_milli: u64,
    pub consumed_milli: u64,
    pub by_category: BTreeMap<String, u64>,
}

impl UserBudget {
    fn new(total_milli: u64) -> Self {
        Self {
            total_milli,
            consumed_milli: 0,
            by_category: BTreeMap::new(),
        }
    }

    pub fn remaining_milli(&self) -> u64 {
        self.total_milli.saturating_sub(self.consumed_milli)
    }
}

/// Budget ledger keyed by user identity.
///
/// Created on a user's first reserve; no ambient global state.
pub struct BudgetLedger {
    default_total_milli: u64,
    users: Mutex<HashMap<String, UserBudget>>,
}

impl BudgetLedger {
    pub fn new(default_total_milli: u64) -> Self {
        Self {
            default_total_milli,
            users: Mutex::new(HashMap::new()),
        }
    }

    /// Restore persisted budgets at startup.
    pub fn restore(default_total_milli: u64, entries: Vec<(String, UserBudget)>) -> Self {
        Self {
            default_total_milli,
            users: Mutex::new(entries.into_iter().collect()),
        }
    }

    /// Atomically check and consume `epsilon_milli` for `user`.
    ///
    /// Zero-epsilon requests are invalid; a request larger than the
    /// remaining balance is rejected without consuming anything.
    pub fn reserve(
        &self,
        user: &str,
        category: BudgetCategory,
        epsilon_milli: u64,
    ) -> Result<(), PipelineError> {
        if epsilon_milli == 0 {
            return Err(PipelineError::Analysis(
                "epsilon must be positive".to_string(),
            ));
        }

        let mut users = self.users.lock().expect("ledger lock");
        let budget = users
            .entry(user.to_string())
            .or_insert_with(|| UserBudget::new(self.default_total_milli));

        let remaining = budget.remaining_milli();
        if epsilon_milli > remaining {
            return Err(PipelineError::PrivacyBudgetExceeded {
                requested_milli: epsilon_milli,
                remaining_milli: remaining,
            });
        }

        budget.consumed_milli += epsilon_milli;
        *budget
            .by_category
            .entry(category.as_str().to_string())
            .or_insert(0) += epsilon_milli;
        Ok(())
    }

    /// Current state for a user (created on first sight).
    pub fn snapshot(&self, user: &str) -> UserBudget {
        let mut users = self.users.lock().expect("ledger lock");
        users
            .entry(user.to_string())
            .or_insert_with(|| UserBudget::new(self.default_total_milli))
            .clone()
    }

    /// Administrative reset; the only way consumption ever decreases.
    pub fn reset(&self, user: &str) {
        let mut users = self.users.lock().expect("ledger lock");
        users.insert(
            user.to_string(),
            UserBudget::new(self.default_total_milli),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn sequential_allocations_exactly_exhaust_the_budget() {
        // Total epsilon 10.0; five reserves of 2.0 each exhaust it; a sixth
        // of any positive size is rejected.
        let ledger = BudgetLedger::new(10_000);
        for _ in 0..5 {
            ledger
                .reserve("dev", BudgetCategory::Issuance, 2_000)
                .unwrap();
        }
        assert_eq!(ledger.snapshot("dev").remaining_milli(), 0);

        let err = ledger.reserve("dev", BudgetCategory::Issuance, 1).unwrap_err();
        assert!(matches!(
            err,
            PipelineError::PrivacyBudgetExceeded { requested_milli: 1, remaining_milli: 0 }
        ));
    }

    #[test]
    fn rejection_consumes_nothing() {
        let ledger = BudgetLedger::new(5_000);
        ledger.reserve("dev", BudgetCategory::Analysis, 4_000).unwrap();
        assert!(ledger.reserve("dev", BudgetCategory::Analysis, 2_000).is_err());
        assert_eq!(ledger.snapshot("dev").remaining_milli(), 1_000);
    }

    #[test]
    fn budgets_are_per_user() {
        let ledger = BudgetLedger::new(1_000);
        ledger.reserve("alice", BudgetCategory::Statistics, 1_000).unwrap();
        ledger.reserve("bob", BudgetCategory::Statistics, 1_000).unwrap();
        assert!(ledger.reserve("alice", BudgetCategory::Statistics, 1).is_err());
    }

    #[test]
    fn allocation_table_tracks_categories() {
        let ledger = BudgetLedger::new(10_000);
        ledger.reserve("dev", BudgetCategory::Analysis, 1_000).unwrap();
        ledger.reserve("dev", BudgetCategory::Issuance, 2_000).unwrap();
        ledger.reserve("dev", BudgetCategory::Issuance, 500).unwrap();

        let snap = ledger.snapshot("dev");
        assert_eq!(snap.by_category["analysis"], 1_000);
        assert_eq!(snap.by_category["issuance"], 2_500);
        assert_eq!(snap.consumed_milli, 3_500);
    }

    #[test]
    fn reset_restores_the_full_budget() {
        let ledger = BudgetLedger::new(2_000);
        ledger.reserve("dev", BudgetCategory::Analysis, 2_000).unwrap();
        assert!(ledger.reserve("dev", BudgetCategory::Analysis, 1).is_err());

        ledger.reset("dev");
        ledger.reserve("dev", BudgetCategory::Analysis, 2_000).unwrap();
    }

    #[test]
    fn concurrent_reserves_never_oversubscribe() {
        let ledger = Arc::new(BudgetLedger::new(10_000));
        let mut handles = Vec::new();
        for _ in 0..20 {
            let ledger = ledger.clone();
            handles.push(std::thread::spawn(move || {
                ledger.reserve("dev", BudgetCategory::Issuance, 1_000).is_ok()
            }));
        }
        let granted = handles
            .into_iter()
            .map(|h| h.join().expect("reserve thread"))
            .filter(|ok| *ok)
            .count();

        // Regardless of interleaving, exactly 10 grants of 1.0 fit in 10.0.
        assert_eq!(granted, 10);
        assert_eq!(ledger.snapshot("dev").consumed_milli, 10_000);
    }
}
