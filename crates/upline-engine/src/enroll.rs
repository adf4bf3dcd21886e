// ─────────────────────────────────────────────────────────────────
// Enrollment and the synchronous investment flow
//
// Enrollment resolves the binary-tree slot, records the sponsor link
// and creates the wallet. An investment debits the investment bucket,
// allocates BV, propagates it up the placement chain, and fires the
// two synchronous commissions (direct referral + level). Binary
// pairing belongs to the daily sweep, never to this path.
// ─────────────────────────────────────────────────────────────────

use serde::{Deserialize, Serialize};

use crate::commission::Commission;
use crate::CompensationEngine;
use upline_core::placement::{resolve_placement, PlacementMode};
use upline_core::propagation::propagate_bv;
use upline_core::{pct_of, EngineError, MemberNode, MemberStatus, Side};
use upline_ledger::WalletBucket;

/// What one investment event did, for the caller's records.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct InvestmentOutcome {
    pub member_id: String,
    pub investment_paise: u128,
    pub bv_allocated_centi: u128,
    /// Placement ancestors whose BV the propagation touched.
    pub levels_touched: u32,
    pub direct_referral: Option<Commission>,
    pub level_commissions: Vec<Commission>,
}

impl CompensationEngine {
    /// Seed the network's first member: no sponsor, no placement parent.
    pub fn enroll_root(&mut self, member_id: &str, now: u64) -> Result<(), EngineError> {
        let mut node = MemberNode::new(member_id, None, self.config.starting_rank(), now);
        node.status = MemberStatus::Active;
        node.activated_at = Some(now);
        self.tree.insert(node)?;
        self.ledger.create_wallet(member_id);
        log::info!("root member {} enrolled", member_id);
        Ok(())
    }

    /// Register a new member under `sponsor_id` with the requested
    /// placement. The sponsor link (genealogy) and the placement slot
    /// (structure) are recorded independently — under AUTO or spillover
    /// the placement parent is usually NOT the sponsor. New members
    /// start Pending and activate on their first investment.
    pub fn enroll_member(
        &mut self,
        member_id: &str,
        sponsor_id: &str,
        mode: PlacementMode,
        now: u64,
    ) -> Result<(String, Side), EngineError> {
        if self.tree.contains(member_id) {
            return Err(EngineError::DuplicateMember(member_id.to_string()));
        }
        let (parent, side) = resolve_placement(&self.tree, sponsor_id, mode)?;

        let node = MemberNode::new(member_id, Some(sponsor_id), self.config.starting_rank(), now);
        self.tree.insert(node)?;
        self.tree.attach_child(&parent, side, member_id)?;
        self.ledger.create_wallet(member_id);

        log::info!(
            "member {} enrolled under sponsor {}, placed {:?} of {}",
            member_id,
            sponsor_id,
            side,
            parent
        );
        Ok((parent, side))
    }

    pub fn activate_member(&mut self, member_id: &str, now: u64) -> Result<(), EngineError> {
        let member = self.tree.get_mut(member_id)?;
        if member.status == MemberStatus::Blocked {
            return Err(EngineError::MemberNotEligible(member_id.to_string()));
        }
        if member.status != MemberStatus::Active {
            member.status = MemberStatus::Active;
            member.activated_at = Some(now);
        }
        Ok(())
    }

    /// Record one investment event. `bv_ratio_bps` converts rupees to BV
    /// (10,000 bps = 1:1). The investment-bucket debit happens first and
    /// aborts the whole operation on a shortfall; nothing downstream runs.
    pub fn record_investment(
        &mut self,
        member_id: &str,
        amount_paise: u128,
        bv_ratio_bps: u32,
        now: u64,
    ) -> Result<InvestmentOutcome, EngineError> {
        if amount_paise == 0 {
            return Err(EngineError::InvalidAmount(
                "investment amount must be greater than zero".to_string(),
            ));
        }
        match self.tree.get(member_id)?.status {
            MemberStatus::Blocked | MemberStatus::Inactive => {
                return Err(EngineError::MemberNotEligible(member_id.to_string()));
            }
            MemberStatus::Pending | MemberStatus::Active => {}
        }

        self.ledger.debit(
            member_id,
            amount_paise,
            WalletBucket::Investment,
            &format!("Investment by {}", member_id),
            now,
        )?;

        // Paise and centi-BV share the ×100 scale, so the bps conversion
        // lands directly in centi-BV.
        let bv_centi = pct_of(amount_paise, bv_ratio_bps);

        {
            let member = self.tree.get_mut(member_id)?;
            member.personal_bv = member.personal_bv.saturating_add(bv_centi);
            member.total_investment_paise =
                member.total_investment_paise.saturating_add(amount_paise);
            // First investment activates a pending member.
            if member.status == MemberStatus::Pending {
                member.status = MemberStatus::Active;
                member.activated_at = Some(now);
            }
        }

        let levels_touched = propagate_bv(&mut self.tree, member_id, bv_centi)?;
        let direct_referral = self.direct_referral_bonus(member_id, amount_paise, now)?;
        let level_commissions = self.level_commission(member_id, amount_paise, now)?;

        log::info!(
            "investment of {} paise by {} allocated {} centi-BV across {} levels",
            amount_paise,
            member_id,
            bv_centi,
            levels_touched
        );
        Ok(InvestmentOutcome {
            member_id: member_id.to_string(),
            investment_paise: amount_paise,
            bv_allocated_centi: bv_centi,
            levels_touched,
            direct_referral,
            level_commissions,
        })
    }
}
