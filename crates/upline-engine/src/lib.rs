// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// UPLINE - COMPENSATION ENGINE
//
// The three commission algorithms (direct referral, level, binary
// pairing), the shared daily cap, the rank evaluator, and the batch
// sweep jobs — over the tree store and wallet ledger.
//
// Two regimes: enrollment/investment run synchronously on the caller's
// request; pairing, rank evaluation and payout settlement are scheduled
// sweeps invoked by an external scheduler. The engine never reads the
// wall clock — every operation takes `now_secs`.
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

pub mod commission;
pub mod enroll;
pub mod ids;
pub mod pairing;
pub mod rank;
pub mod sweep;

pub use commission::{Commission, CommissionKind, CommissionStatus, CommissionStore};
pub use enroll::InvestmentOutcome;
pub use rank::Promotion;
pub use sweep::SweepSummary;

use upline_core::config::EngineConfig;
use upline_core::TreeStore;
use upline_ledger::Ledger;

/// The engine's working state: member tree, wallet ledger, append-only
/// commission trail, and the compensation-plan parameters.
pub struct CompensationEngine {
    pub tree: TreeStore,
    pub ledger: Ledger,
    pub commissions: CommissionStore,
    pub config: EngineConfig,
}

impl CompensationEngine {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            tree: TreeStore::new(),
            ledger: Ledger::new(),
            commissions: CommissionStore::new(),
            config,
        }
    }
}

impl Default for CompensationEngine {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}
