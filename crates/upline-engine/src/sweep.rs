// ─────────────────────────────────────────────────────────────────
// Batch sweeps — explicit jobs over all ACTIVE members
//
// Each sweep is a standalone, independently invokable, idempotent
// function driven by an external scheduler (the engine never schedules
// itself). A per-member failure is caught, logged with the member id
// and cause, counted, and never aborts the remaining members.
// ─────────────────────────────────────────────────────────────────

use serde::{Deserialize, Serialize};

use crate::CompensationEngine;
use upline_ledger::WalletBucket;

/// Operational rollup of one sweep run.
#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct SweepSummary {
    pub job: String,
    /// Members examined.
    pub processed: u64,
    /// Members whose pass completed without error (including no-ops).
    pub succeeded: u64,
    /// Members whose pass errored (logged, isolated).
    pub failed: u64,
    /// Members skipped by the idempotency guard.
    pub skipped: u64,
    /// State-changing outcomes: pairings paid / promotions / settlements.
    pub actions: u64,
    /// Total paise moved by this sweep.
    pub amount_paise: u128,
}

impl SweepSummary {
    fn new(job: &str) -> Self {
        Self {
            job: job.to_string(),
            ..Self::default()
        }
    }
}

impl CompensationEngine {
    /// Daily binary-pairing pass.
    ///
    /// Members whose raw `left_bv`/`right_bv` are both zero are skipped:
    /// a completed pass zeroes both fields, so re-running the sweep after
    /// a partial failure no-ops the members already processed instead of
    /// pairing their carry again. Carry-only balances pair on the first
    /// sweep after new volume arrives.
    pub fn run_daily_pairing_sweep(&mut self, now: u64) -> SweepSummary {
        let mut summary = SweepSummary::new("daily_pairing");
        let members = self.tree.active_member_ids();
        log::info!("pairing sweep started over {} active members", members.len());

        for member_id in members {
            summary.processed += 1;
            match self.tree.get(&member_id) {
                Ok(node) if node.left_bv == 0 && node.right_bv == 0 => {
                    summary.skipped += 1;
                    continue;
                }
                Ok(_) => {}
                Err(e) => {
                    summary.failed += 1;
                    log::error!("pairing failed for {}: {}", member_id, e);
                    continue;
                }
            }
            match self.pair_member(&member_id, now) {
                Ok(Some(record)) => {
                    summary.succeeded += 1;
                    summary.actions += 1;
                    summary.amount_paise = summary.amount_paise.saturating_add(record.amount_paise);
                }
                Ok(None) => summary.succeeded += 1,
                Err(e) => {
                    summary.failed += 1;
                    log::error!("pairing failed for {}: {}", member_id, e);
                }
            }
        }
        log::info!(
            "pairing sweep finished: {} processed, {} paired, {} skipped, {} failed",
            summary.processed,
            summary.actions,
            summary.skipped,
            summary.failed
        );
        summary
    }

    /// Daily rank-evaluation pass. Re-running on the same day is safe:
    /// a promoted member's next tier needs thresholds they have not yet
    /// re-qualified for, and an unpromoted member stays unpromoted.
    pub fn run_daily_rank_sweep(&mut self, now: u64) -> SweepSummary {
        let mut summary = SweepSummary::new("daily_rank");
        let members = self.tree.active_member_ids();
        log::info!("rank sweep started over {} active members", members.len());

        for member_id in members {
            summary.processed += 1;
            match self.evaluate_member_rank(&member_id, now) {
                Ok(Some(_promotion)) => {
                    summary.succeeded += 1;
                    summary.actions += 1;
                }
                Ok(None) => summary.succeeded += 1,
                Err(e) => {
                    summary.failed += 1;
                    log::error!("rank evaluation failed for {}: {}", member_id, e);
                }
            }
        }
        log::info!(
            "rank sweep finished: {} processed, {} promoted, {} failed",
            summary.processed,
            summary.actions,
            summary.failed
        );
        summary
    }

    /// Weekly settlement: every CREDITED commission record transitions to
    /// PAID and the corresponding amount leaves the Commission bucket
    /// toward the external payout processor. Members with nothing in
    /// CREDITED status are skipped; a failed debit leaves the member's
    /// records CREDITED for the next run.
    pub fn run_weekly_payout_settlement(&mut self, now: u64) -> SweepSummary {
        let mut summary = SweepSummary::new("weekly_settlement");
        let members = self.tree.active_member_ids();
        log::info!(
            "payout settlement started over {} active members",
            members.len()
        );

        for member_id in members {
            summary.processed += 1;
            let due = self.commissions.credited_total(&member_id);
            if due == 0 {
                summary.skipped += 1;
                continue;
            }
            match self.ledger.debit(
                &member_id,
                due,
                WalletBucket::Commission,
                "Weekly payout settlement",
                now,
            ) {
                Ok(_) => {
                    let settled = self.commissions.settle_credited_for(&member_id, now);
                    debug_assert_eq!(settled, due);
                    summary.succeeded += 1;
                    summary.actions += 1;
                    summary.amount_paise = summary.amount_paise.saturating_add(settled);
                }
                Err(e) => {
                    summary.failed += 1;
                    log::error!("settlement failed for {}: {}", member_id, e);
                }
            }
        }
        log::info!(
            "payout settlement finished: {} members settled, {} paise, {} failed",
            summary.actions,
            summary.amount_paise,
            summary.failed
        );
        summary
    }
}

// ─────────────────────────────────────────────────────────────────
// Unit Tests
// ─────────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::commission::CommissionStatus;
    use upline_core::{MemberNode, MemberStatus, CENTI_PER_BV, PAISE_PER_RUPEE};

    const NOW: u64 = 1_700_000_000;

    fn bv(points: u128) -> u128 {
        points * CENTI_PER_BV
    }

    fn engine_with_members(specs: &[(&str, u128, u128)]) -> CompensationEngine {
        let mut engine = CompensationEngine::default();
        for (id, left, right) in specs {
            let mut m = MemberNode::new(id, None, "Associate", NOW);
            m.status = MemberStatus::Active;
            m.left_bv = *left;
            m.right_bv = *right;
            engine.tree.insert(m).unwrap();
            engine.ledger.create_wallet(id);
        }
        engine
    }

    #[test]
    fn pairing_sweep_processes_all_active_members() {
        let mut engine = engine_with_members(&[
            ("A", bv(25_000), bv(17_000)), // 1 pair
            ("B", bv(5_000), bv(3_000)),   // no pairs, but raw BV present
            ("C", 0, 0),                   // nothing — skipped
        ]);
        let summary = engine.run_daily_pairing_sweep(NOW);
        assert_eq!(summary.processed, 3);
        assert_eq!(summary.actions, 1);
        assert_eq!(summary.skipped, 1);
        assert_eq!(summary.failed, 0);
        assert_eq!(summary.amount_paise, 100 * PAISE_PER_RUPEE);
    }

    #[test]
    fn pairing_sweep_rerun_is_idempotent() {
        let mut engine = engine_with_members(&[("A", bv(25_000), bv(17_000))]);
        let first = engine.run_daily_pairing_sweep(NOW);
        assert_eq!(first.actions, 1);

        // Same-day re-run: A's raw BV is zero now, carry (15k/7k) must
        // NOT pair again even though min(carry) isn't zero.
        let second = engine.run_daily_pairing_sweep(NOW);
        assert_eq!(second.actions, 0);
        assert_eq!(second.skipped, 1);
        assert_eq!(
            engine.ledger.balances("A").unwrap().commission_paise,
            100 * PAISE_PER_RUPEE
        );
    }

    #[test]
    fn inactive_members_are_not_swept() {
        let mut engine = engine_with_members(&[("A", bv(25_000), bv(25_000))]);
        engine.tree.get_mut("A").unwrap().status = MemberStatus::Inactive;
        let summary = engine.run_daily_pairing_sweep(NOW);
        assert_eq!(summary.processed, 0);
        assert_eq!(engine.tree.get("A").unwrap().left_bv, bv(25_000));
    }

    #[test]
    fn one_corrupt_member_does_not_abort_the_sweep() {
        let mut engine = engine_with_members(&[
            ("A", bv(25_000), bv(17_000)),
            ("B", bv(30_000), bv(30_000)),
        ]);
        // Corrupt B: wallet vanishes
        let fresh = upline_ledger::Ledger::new();
        fresh.create_wallet("A");
        engine.ledger = fresh;

        let summary = engine.run_daily_pairing_sweep(NOW);
        assert_eq!(summary.processed, 2);
        assert_eq!(summary.actions, 1);
        assert_eq!(summary.failed, 1);
        // A still got paid
        assert_eq!(
            engine.ledger.balances("A").unwrap().commission_paise,
            100 * PAISE_PER_RUPEE
        );
        // B's volume is untouched for the next run
        assert_eq!(engine.tree.get("B").unwrap().left_bv, bv(30_000));
    }

    #[test]
    fn rank_sweep_promotes_and_counts() {
        let mut engine = engine_with_members(&[("A", 0, 0), ("B", 0, 0)]);
        {
            let a = engine.tree.get_mut("A").unwrap();
            a.total_investment_paise = 50_000 * PAISE_PER_RUPEE;
            a.team_bv = bv(200_000);
        }
        for i in 0..2 {
            let mut d = MemberNode::new(&format!("D{}", i), Some("A"), "Associate", NOW);
            d.status = MemberStatus::Active;
            engine.tree.insert(d).unwrap();
            engine.ledger.create_wallet(&format!("D{}", i));
        }
        let summary = engine.run_daily_rank_sweep(NOW);
        assert_eq!(summary.actions, 1);
        assert_eq!(engine.tree.get("A").unwrap().rank, "Silver");
        assert_eq!(engine.tree.get("B").unwrap().rank, "Associate");
    }

    #[test]
    fn settlement_pays_credited_once_and_only_once() {
        let mut engine = engine_with_members(&[("A", bv(25_000), bv(25_000))]);
        engine.run_daily_pairing_sweep(NOW); // ₹200 credited (2 pairs)

        let s1 = engine.run_weekly_payout_settlement(NOW + 3_600);
        assert_eq!(s1.actions, 1);
        assert_eq!(s1.amount_paise, 200 * PAISE_PER_RUPEE);
        assert_eq!(engine.ledger.balances("A").unwrap().commission_paise, 0);
        assert!(engine
            .commissions
            .records()
            .iter()
            .all(|c| c.status == CommissionStatus::Paid));

        // Re-run: nothing left in CREDITED status
        let s2 = engine.run_weekly_payout_settlement(NOW + 7_200);
        assert_eq!(s2.actions, 0);
        assert_eq!(s2.skipped, 1);
    }
}
