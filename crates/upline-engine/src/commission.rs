// ─────────────────────────────────────────────────────────────────
// Commission records, the shared daily cap, and the synchronous
// commission algorithms (direct referral + level)
//
// Every credit funnels through `credit_commission`: cap first, then
// ledger credit, then the immutable record — a record exists only if
// the corresponding wallet credit succeeded.
//
// The cap tally is computed by QUERYING the commission trail for
// today's credited sum, never from a cached in-process counter, so it
// stays correct across every crediting path.
// ─────────────────────────────────────────────────────────────────

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::ids::prefixed_id;
use crate::CompensationEngine;
use upline_core::{day_of, pct_of, EngineError};
use upline_ledger::WalletBucket;

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommissionKind {
    DirectReferral,
    Level,
    BinaryPairing,
    RankBonus,
}

impl CommissionKind {
    /// Reporting label; level commissions carry their 1-based level.
    pub fn label(self, level: u32) -> String {
        match self {
            CommissionKind::DirectReferral => "DIRECT_REFERRAL".to_string(),
            CommissionKind::Level => format!("LEVEL_{}", level),
            CommissionKind::BinaryPairing => "BINARY_PAIRING".to_string(),
            CommissionKind::RankBonus => "RANK_BONUS".to_string(),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommissionStatus {
    Credited,
    Reversed,
    Paid,
}

/// An immutable commission entry — created once, never mutated except
/// the status transition at settlement. The audit trail for every
/// credited rupee, including what the daily cap clipped.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Commission {
    pub commission_id: String,
    /// Beneficiary.
    pub member_id: String,
    /// The member whose investment generated this commission, when any.
    pub source_member: Option<String>,
    pub kind: CommissionKind,
    /// 1-based sponsor-chain level for Level commissions, 0 otherwise.
    pub level: u32,
    /// Final credited amount (post-cap), paise.
    pub amount_paise: u128,
    /// The base the percentage applied to: investment paise, or matched
    /// BV (centi-BV) for pairing.
    pub base_amount: u128,
    pub percentage_bps: Option<u32>,
    pub cap_applied: bool,
    /// The clipped remainder when the cap applied — recorded for audit,
    /// never paid, never carried to tomorrow.
    pub capped_amount_paise: u128,
    pub status: CommissionStatus,
    pub memo: String,
    /// Optional JSON calculation breakdown (pairing stores its inputs).
    pub details: Option<String>,
    pub created_at: u64,
    pub paid_at: Option<u64>,
}

/// Per-member earnings rollup for reporting.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct CommissionSummary {
    pub member_id: String,
    pub total_paise: u128,
    pub today_paise: u128,
    pub record_count: u64,
    pub by_type_paise: BTreeMap<String, u128>,
}

/// Append-only commission trail.
#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct CommissionStore {
    records: Vec<Commission>,
    seq: u64,
}

impl CommissionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> &[Commission] {
        &self.records
    }

    pub fn next_id(&mut self, member_id: &str, now: u64) -> String {
        self.seq += 1;
        prefixed_id("COM", self.seq, &format!("{}@{}", member_id, now))
    }

    pub fn append(&mut self, record: Commission) {
        self.records.push(record);
    }

    /// Sum of CREDITED amounts for `member_id` on calendar day `day`.
    /// This is the cap tally — records already settled to PAID belong to
    /// earlier weeks and earlier days by construction.
    pub fn sum_credited_on_day(&self, member_id: &str, day: u64) -> u128 {
        self.records
            .iter()
            .filter(|c| {
                c.member_id == member_id
                    && c.status == CommissionStatus::Credited
                    && day_of(c.created_at) == day
            })
            .map(|c| c.amount_paise)
            .fold(0u128, u128::saturating_add)
    }

    pub fn by_member<'a>(&'a self, member_id: &'a str) -> impl Iterator<Item = &'a Commission> {
        self.records.iter().filter(move |c| c.member_id == member_id)
    }

    pub fn summary_for(&self, member_id: &str, now: u64) -> CommissionSummary {
        let today = day_of(now);
        let mut summary = CommissionSummary {
            member_id: member_id.to_string(),
            total_paise: 0,
            today_paise: 0,
            record_count: 0,
            by_type_paise: BTreeMap::new(),
        };
        for c in self.by_member(member_id) {
            summary.record_count += 1;
            summary.total_paise = summary.total_paise.saturating_add(c.amount_paise);
            if day_of(c.created_at) == today {
                summary.today_paise = summary.today_paise.saturating_add(c.amount_paise);
            }
            *summary
                .by_type_paise
                .entry(c.kind.label(c.level))
                .or_insert(0) += c.amount_paise;
        }
        summary
    }

    /// Total still sitting in CREDITED status for a member.
    pub fn credited_total(&self, member_id: &str) -> u128 {
        self.by_member(member_id)
            .filter(|c| c.status == CommissionStatus::Credited)
            .map(|c| c.amount_paise)
            .fold(0u128, u128::saturating_add)
    }

    /// Transition every CREDITED record of `member_id` to PAID.
    /// Returns the settled total. Already-PAID records are untouched, so
    /// a repeated settlement run settles nothing twice.
    pub fn settle_credited_for(&mut self, member_id: &str, now: u64) -> u128 {
        let mut total: u128 = 0;
        for c in self.records.iter_mut() {
            if c.member_id == member_id && c.status == CommissionStatus::Credited {
                c.status = CommissionStatus::Paid;
                c.paid_at = Some(now);
                total = total.saturating_add(c.amount_paise);
            }
        }
        total
    }
}

impl CompensationEngine {
    /// Daily-cap computation: how much of `proposed` may still be paid
    /// today, and how much gets clipped. Pure read.
    pub fn apply_daily_cap(&self, member_id: &str, proposed_paise: u128, now: u64) -> (u128, u128) {
        let already = self
            .commissions
            .sum_credited_on_day(member_id, day_of(now));
        let remaining = self.config.daily_cap_paise.saturating_sub(already);
        let final_amount = proposed_paise.min(remaining);
        (final_amount, proposed_paise - final_amount)
    }

    /// The single crediting path every commission kind goes through:
    /// cap → wallet credit → immutable record → member earnings rollup.
    /// A fully-capped (zero) amount produces no record and no credit.
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn credit_commission(
        &mut self,
        member_id: &str,
        source_member: Option<&str>,
        kind: CommissionKind,
        level: u32,
        proposed_paise: u128,
        base_amount: u128,
        percentage_bps: Option<u32>,
        memo: &str,
        details: Option<String>,
        now: u64,
    ) -> Result<Option<Commission>, EngineError> {
        if proposed_paise == 0 {
            return Ok(None);
        }
        let (final_amount, clipped) = self.apply_daily_cap(member_id, proposed_paise, now);
        if final_amount == 0 {
            log::warn!(
                "daily cap reached for {}: {} {} paise not credited",
                member_id,
                kind.label(level),
                proposed_paise
            );
            return Ok(None);
        }
        if clipped > 0 {
            log::info!(
                "commission capped for {}: proposed {}, credited {}",
                member_id,
                proposed_paise,
                final_amount
            );
        }

        self.ledger
            .credit(member_id, final_amount, WalletBucket::Commission, memo, now)?;

        let record = Commission {
            commission_id: self.commissions.next_id(member_id, now),
            member_id: member_id.to_string(),
            source_member: source_member.map(str::to_string),
            kind,
            level,
            amount_paise: final_amount,
            base_amount,
            percentage_bps,
            cap_applied: clipped > 0,
            capped_amount_paise: clipped,
            status: CommissionStatus::Credited,
            memo: memo.to_string(),
            details,
            created_at: now,
            paid_at: None,
        };
        self.commissions.append(record.clone());

        let member = self.tree.get_mut(member_id)?;
        member.total_earnings_paise = member.total_earnings_paise.saturating_add(final_amount);

        log::info!(
            "{} credited {} paise to {} ({})",
            kind.label(level),
            final_amount,
            member_id,
            memo
        );
        Ok(Some(record))
    }

    /// Direct referral bonus: fixed percentage of the investment, paid
    /// to the investor's SPONSOR (not the placement parent). Skipped
    /// when the investor has no sponsor.
    pub fn direct_referral_bonus(
        &mut self,
        investor_id: &str,
        investment_paise: u128,
        now: u64,
    ) -> Result<Option<Commission>, EngineError> {
        let Some(sponsor_id) = self.tree.get(investor_id)?.sponsor_id.clone() else {
            log::debug!("{} has no sponsor; direct referral bonus skipped", investor_id);
            return Ok(None);
        };
        let bps = self.config.direct_referral_bps;
        let proposed = pct_of(investment_paise, bps);
        self.credit_commission(
            &sponsor_id,
            Some(investor_id),
            CommissionKind::DirectReferral,
            1,
            proposed,
            investment_paise,
            Some(bps),
            &format!("Direct referral bonus from {}", investor_id),
            None,
            now,
        )
    }

    /// Level commission along the SPONSOR chain, up to the configured
    /// depth. Level numbering is positional in the chain: an inactive
    /// ancestor is skipped but still consumes its level index, so the
    /// next active ancestor receives the NEXT level's percentage, not
    /// the skipped one's.
    pub fn level_commission(
        &mut self,
        investor_id: &str,
        investment_paise: u128,
        now: u64,
    ) -> Result<Vec<Commission>, EngineError> {
        let chain = self
            .tree
            .sponsor_chain(investor_id, self.config.max_tree_depth)?;
        let mut credited = Vec::new();

        for (idx, ancestor_id) in chain.iter().enumerate() {
            let level = (idx + 1) as u32;
            let Some(bps) = self.config.level_bps_at(level as usize) else {
                break;
            };
            if !self.tree.get(ancestor_id)?.is_active() {
                log::debug!("skipping inactive sponsor at level {}: {}", level, ancestor_id);
                continue;
            }
            let proposed = pct_of(investment_paise, bps);
            if let Some(record) = self.credit_commission(
                ancestor_id,
                Some(investor_id),
                CommissionKind::Level,
                level,
                proposed,
                investment_paise,
                Some(bps),
                &format!("Level {} commission from {}", level, investor_id),
                None,
                now,
            )? {
                credited.push(record);
            }
        }
        Ok(credited)
    }
}
