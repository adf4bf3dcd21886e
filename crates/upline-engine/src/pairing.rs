// ─────────────────────────────────────────────────────────────────
// Binary pairing — matched-leg bonus with carry-forward
//
// Standard binary matching with infinite carry on the stronger leg:
// the weaker leg is always fully consumed, the stronger leg's excess
// rolls forward indefinitely. Payout (not accrual) is bounded by the
// daily cap. Runs per member on the daily sweep, independent of the
// per-investment commissions.
// ─────────────────────────────────────────────────────────────────

use crate::commission::{Commission, CommissionKind};
use crate::CompensationEngine;
use upline_core::EngineError;

impl CompensationEngine {
    /// One pairing pass for one member.
    ///
    /// `left = left_bv + carry_left`, `right = right_bv + carry_right`,
    /// `pairs = ⌊min(left, right) / bv_per_pair⌋`. Zero pairs is a
    /// complete no-op (raw BV keeps accumulating). Otherwise the matched
    /// BV is consumed: carries become the per-leg excess and both raw
    /// fields reset to zero — carry-forward is the only value kept
    /// across cycles.
    pub fn pair_member(
        &mut self,
        member_id: &str,
        now: u64,
    ) -> Result<Option<Commission>, EngineError> {
        let node = self.tree.get(member_id)?;
        let left = node.left_bv.saturating_add(node.carry_forward_left);
        let right = node.right_bv.saturating_add(node.carry_forward_right);
        let matched = left.min(right);

        let pairs = matched / self.config.bv_per_pair_centi;
        if pairs == 0 {
            log::debug!("no complete pairs for {} (L={}, R={})", member_id, left, right);
            return Ok(None);
        }

        // The wallet must exist before BV is consumed; consuming and then
        // failing the credit would strand the matched volume.
        if !self.ledger.has_wallet(member_id) {
            return Err(EngineError::WalletNotFound(member_id.to_string()));
        }

        let used_bv = pairs * self.config.bv_per_pair_centi;
        let proposed = pairs * self.config.pairing_bonus_per_pair_paise;
        let carry_left = left - used_bv;
        let carry_right = right - used_bv;

        let details = serde_json::json!({
            "pairs": pairs as u64,
            "leftBv": left as u64,
            "rightBv": right as u64,
            "matchedBv": matched as u64,
            "usedBv": used_bv as u64,
            "carryForwardLeft": carry_left as u64,
            "carryForwardRight": carry_right as u64,
        })
        .to_string();

        {
            let node = self.tree.get_mut(member_id)?;
            node.carry_forward_left = carry_left;
            node.carry_forward_right = carry_right;
            node.left_bv = 0;
            node.right_bv = 0;
        }

        self.credit_commission(
            member_id,
            None,
            CommissionKind::BinaryPairing,
            0,
            proposed,
            used_bv,
            None,
            &format!("Binary pairing bonus - {} pairs matched", pairs),
            Some(details),
            now,
        )
    }
}
