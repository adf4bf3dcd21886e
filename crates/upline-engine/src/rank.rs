// ─────────────────────────────────────────────────────────────────
// Rank Evaluator — tiered promotion with one-time bonuses
//
// Tiers form a total order by display_order; the evaluator promotes a
// member to the FIRST tier above their current order whose three
// thresholds (direct referrals, personal investment, team BV) all
// pass. At most ONE promotion per sweep per member — a member newly
// qualifying two tiers up must re-qualify on a later sweep. Promotion
// is monotonic; there is no demotion path.
// ─────────────────────────────────────────────────────────────────

use crate::commission::{Commission, CommissionKind};
use crate::CompensationEngine;
use upline_core::config::RankTier;
use upline_core::EngineError;

/// Outcome of one member's rank evaluation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Promotion {
    pub member_id: String,
    pub from_rank: String,
    pub to_rank: String,
    pub bonus: Option<String>,
}

impl CompensationEngine {
    fn tier_order(&self, rank_name: &str) -> u32 {
        self.config
            .rank_tiers
            .iter()
            .find(|t| t.name.eq_ignore_ascii_case(rank_name))
            .map(|t| t.display_order)
            .unwrap_or(0)
    }

    fn meets_thresholds(&self, member_id: &str, tier: &RankTier) -> Result<bool, EngineError> {
        let member = self.tree.get(member_id)?;
        if tier.min_direct_referrals > 0
            && self.tree.direct_referral_count(member_id) < tier.min_direct_referrals
        {
            return Ok(false);
        }
        if member.total_investment_paise < tier.min_personal_investment_paise {
            return Ok(false);
        }
        if member.team_bv < tier.min_team_bv_centi {
            return Ok(false);
        }
        Ok(true)
    }

    /// Evaluate one member against the tier table and promote at most one
    /// step. The one-time bonus goes through the same capped commission
    /// path as every other credit, recorded as RANK_BONUS.
    pub fn evaluate_member_rank(
        &mut self,
        member_id: &str,
        now: u64,
    ) -> Result<Option<Promotion>, EngineError> {
        let current_rank = self.tree.get(member_id)?.rank.clone();
        let current_order = self.tier_order(&current_rank);

        let mut tiers: Vec<RankTier> = self
            .config
            .rank_tiers
            .iter()
            .filter(|t| t.active && t.display_order > current_order)
            .cloned()
            .collect();
        tiers.sort_by_key(|t| t.display_order);

        for tier in tiers {
            if !self.meets_thresholds(member_id, &tier)? {
                continue;
            }
            log::info!(
                "promoting {} from {} to {}",
                member_id,
                current_rank,
                tier.name
            );
            {
                let member = self.tree.get_mut(member_id)?;
                member.rank = tier.name.clone();
                member.rank_achieved_at = Some(now);
            }

            let mut bonus_record: Option<Commission> = None;
            if tier.one_time_bonus_paise > 0 {
                bonus_record = self.credit_commission(
                    member_id,
                    None,
                    CommissionKind::RankBonus,
                    0,
                    tier.one_time_bonus_paise,
                    tier.one_time_bonus_paise,
                    None,
                    &format!("Rank achievement bonus for {}", tier.name),
                    None,
                    now,
                )?;
            }

            // One promotion per sweep — higher tiers wait for the next run.
            return Ok(Some(Promotion {
                member_id: member_id.to_string(),
                from_rank: current_rank,
                to_rank: tier.name,
                bonus: bonus_record.map(|c| c.commission_id),
            }));
        }
        Ok(None)
    }
}
