// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// UPLINE - CORE MODULE
//
// Data model for the binary-MLM compensation engine: member nodes, the
// dual-tree store (sponsor genealogy + binary placement), placement
// resolution and BV propagation.
// All financial arithmetic uses u128 paise units (no floating-point).
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, VecDeque};

pub mod config;
pub mod error;
pub mod placement;
pub mod propagation;

pub use error::EngineError;

/// 1 rupee = 100 paise. Every money field in the engine is u128 paise.
pub const PAISE_PER_RUPEE: u128 = 100;

/// 1 BV point = 100 centi-BV. BV columns carry two decimals in the books,
/// so BV fields are u128 centi-BV for exact integer arithmetic.
pub const CENTI_PER_BV: u128 = 100;

/// Maximum total commission a member may be credited per calendar day:
/// ₹25,000. All commission kinds compete for this single ceiling.
pub const DAILY_COMMISSION_CAP_PAISE: u128 = 25_000 * PAISE_PER_RUPEE;

/// Direct referral bonus: 2% of the investment, paid to the sponsor.
pub const DIRECT_REFERRAL_BPS: u32 = 200;

/// Level commission table in basis points, level 1 first:
/// 3%, 2%, 1.5%, 1%, 1%, 0.5% × 5. Paid along the SPONSOR chain.
pub const LEVEL_COMMISSION_BPS: [u32; 10] = [300, 200, 150, 100, 100, 50, 50, 50, 50, 50];

/// Maximum depth of the level-commission walk up the sponsor chain.
pub const MAX_LEVEL_DEPTH: usize = 10;

/// One binary pair = 10,000 BV matched on both legs.
pub const BV_PER_PAIR_CENTI: u128 = 10_000 * CENTI_PER_BV;

/// Fixed bonus per matched pair: ₹100.
pub const PAIRING_BONUS_PER_PAIR_PAISE: u128 = 100 * PAISE_PER_RUPEE;

/// Upper bound on any upward walk (placement or sponsor chain).
/// A well-formed tree never comes close; the bound turns a corrupted
/// cycle into `DepthExceeded` instead of an infinite loop.
pub const MAX_TREE_DEPTH: u32 = 10_000;

/// Upper bound on placement-search node visits (leg descent and BFS).
pub const MAX_PLACEMENT_SCAN: u64 = 1_000_000;

/// Calendar-day bucketing for the daily cap (UTC).
pub const SECS_PER_DAY: u64 = 86_400;

/// The day index a Unix timestamp falls on.
pub fn day_of(now_secs: u64) -> u64 {
    now_secs / SECS_PER_DAY
}

/// `amount × bps%` rounded half-up at the smallest unit.
/// Pure integer: (amount·bps + 5000) / 10000.
pub fn pct_of(amount: u128, bps: u32) -> u128 {
    (amount.saturating_mul(bps as u128) + 5_000) / 10_000
}

/// The two legs of the binary placement tree. A member's side is assigned
/// once at attachment and never changes.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Side {
    Left,
    Right,
}

impl Side {
    pub fn opposite(self) -> Side {
        match self {
            Side::Left => Side::Right,
            Side::Right => Side::Left,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemberStatus {
    /// Registered, not yet activated. Does not participate in sweeps.
    Pending,
    /// Full participant in commission and rank runs.
    Active,
    Inactive,
    Blocked,
}

/// One member of the network. Sponsor and placement are two INDEPENDENT
/// graphs: `sponsor_id` is genealogy (who gets referral credit),
/// `placement_parent`/`placement_side` is the binary-tree slot (which leg
/// BV flows up). They frequently differ because of spillover.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct MemberNode {
    pub member_id: String,
    pub sponsor_id: Option<String>,
    pub placement_parent: Option<String>,
    pub placement_side: Option<Side>,
    pub left_child: Option<String>,
    pub right_child: Option<String>,
    /// BV received this accounting cycle through each leg (centi-BV).
    pub left_bv: u128,
    pub right_bv: u128,
    /// Unmatched BV rolled over from prior pairing cycles (centi-BV).
    pub carry_forward_left: u128,
    pub carry_forward_right: u128,
    /// Cumulative BV from the member's own investments (centi-BV).
    pub personal_bv: u128,
    /// Cumulative BV from the whole placement subtree (centi-BV).
    pub team_bv: u128,
    pub total_investment_paise: u128,
    pub total_earnings_paise: u128,
    pub rank: String,
    pub rank_achieved_at: Option<u64>,
    pub status: MemberStatus,
    pub joined_at: u64,
    pub activated_at: Option<u64>,
}

impl MemberNode {
    pub fn new(member_id: &str, sponsor_id: Option<&str>, starting_rank: &str, now: u64) -> Self {
        Self {
            member_id: member_id.to_string(),
            sponsor_id: sponsor_id.map(str::to_string),
            placement_parent: None,
            placement_side: None,
            left_child: None,
            right_child: None,
            left_bv: 0,
            right_bv: 0,
            carry_forward_left: 0,
            carry_forward_right: 0,
            personal_bv: 0,
            team_bv: 0,
            total_investment_paise: 0,
            total_earnings_paise: 0,
            rank: starting_rank.to_string(),
            rank_achieved_at: None,
            status: MemberStatus::Pending,
            joined_at: now,
            activated_at: None,
        }
    }

    pub fn is_active(&self) -> bool {
        self.status == MemberStatus::Active
    }

    pub fn child(&self, side: Side) -> Option<&str> {
        match side {
            Side::Left => self.left_child.as_deref(),
            Side::Right => self.right_child.as_deref(),
        }
    }
}

/// Result of a placement-tree integrity walk.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct IntegrityReport {
    pub valid: bool,
    pub total_nodes: u64,
    pub issues: Vec<String>,
}

/// The member store. Holds every node and both link structures.
/// BTreeMap guarantees deterministic iteration and serialization.
///
/// Mutation is `&mut self` — callers needing concurrent registration
/// serialize writers around the store; reads between attachments always
/// observe a structurally consistent tree.
#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct TreeStore {
    members: BTreeMap<String, MemberNode>,
}

impl TreeStore {
    pub fn new() -> Self {
        Self {
            members: BTreeMap::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.members.contains_key(id)
    }

    pub fn get(&self, id: &str) -> Result<&MemberNode, EngineError> {
        self.members
            .get(id)
            .ok_or_else(|| EngineError::MemberNotFound(id.to_string()))
    }

    pub fn get_mut(&mut self, id: &str) -> Result<&mut MemberNode, EngineError> {
        self.members
            .get_mut(id)
            .ok_or_else(|| EngineError::MemberNotFound(id.to_string()))
    }

    /// Insert a new, unattached node. Attachment is a separate step so the
    /// (parent, side) slot check happens against the final tree state.
    pub fn insert(&mut self, node: MemberNode) -> Result<(), EngineError> {
        if self.members.contains_key(&node.member_id) {
            return Err(EngineError::DuplicateMember(node.member_id));
        }
        if node.placement_parent.is_some() || node.placement_side.is_some() {
            return Err(EngineError::Config(
                "insert expects an unattached node; use attach_child".to_string(),
            ));
        }
        self.members.insert(node.member_id.clone(), node);
        Ok(())
    }

    pub fn child_of(&self, parent: &str, side: Side) -> Result<Option<&str>, EngineError> {
        Ok(self.get(parent)?.child(side))
    }

    /// Attach `child_id` into the (parent, side) slot. The slot must be
    /// empty and the child unattached — at most one child per side per
    /// parent, forever. Both directions of the link are written together.
    pub fn attach_child(
        &mut self,
        parent_id: &str,
        side: Side,
        child_id: &str,
    ) -> Result<(), EngineError> {
        if !self.members.contains_key(child_id) {
            return Err(EngineError::MemberNotFound(child_id.to_string()));
        }
        {
            let parent = self.get(parent_id)?;
            if parent.child(side).is_some() {
                return Err(EngineError::SlotOccupied {
                    parent: parent_id.to_string(),
                    side,
                });
            }
        }
        {
            let child = self.get(child_id)?;
            if child.placement_parent.is_some() {
                return Err(EngineError::Config(format!(
                    "{} is already attached in the placement tree",
                    child_id
                )));
            }
        }
        let parent = self.members.get_mut(parent_id).expect("checked above");
        match side {
            Side::Left => parent.left_child = Some(child_id.to_string()),
            Side::Right => parent.right_child = Some(child_id.to_string()),
        }
        let child = self.members.get_mut(child_id).expect("checked above");
        child.placement_parent = Some(parent_id.to_string());
        child.placement_side = Some(side);
        Ok(())
    }

    /// Sponsor genealogy chain, nearest first, bounded by `max_depth`.
    pub fn sponsor_chain(&self, id: &str, max_depth: u32) -> Result<Vec<String>, EngineError> {
        let mut chain = Vec::new();
        let mut current = self.get(id)?.sponsor_id.clone();
        while let Some(sid) = current {
            if chain.len() as u32 >= max_depth {
                return Err(EngineError::DepthExceeded(id.to_string()));
            }
            let sponsor = self.get(&sid)?;
            current = sponsor.sponsor_id.clone();
            chain.push(sid);
        }
        Ok(chain)
    }

    /// Placement ancestors, nearest first, each with the side the walk
    /// ascended FROM (i.e. which leg of that ancestor the member sits in).
    pub fn placement_chain(
        &self,
        id: &str,
        max_depth: u32,
    ) -> Result<Vec<(String, Side)>, EngineError> {
        let mut chain = Vec::new();
        let start = self.get(id)?;
        let mut parent = start.placement_parent.clone();
        let mut side = start.placement_side;
        while let (Some(pid), Some(s)) = (parent, side) {
            if chain.len() as u32 >= max_depth {
                return Err(EngineError::DepthExceeded(id.to_string()));
            }
            let node = self.get(&pid)?;
            parent = node.placement_parent.clone();
            side = node.placement_side;
            chain.push((pid, s));
        }
        Ok(chain)
    }

    pub fn active_member_ids(&self) -> Vec<String> {
        self.members
            .values()
            .filter(|m| m.is_active())
            .map(|m| m.member_id.clone())
            .collect()
    }

    /// How many members name `id` as their sponsor (genealogy, not placement).
    pub fn direct_referral_count(&self, id: &str) -> u64 {
        self.members
            .values()
            .filter(|m| m.sponsor_id.as_deref() == Some(id))
            .count() as u64
    }

    /// Depth of the placement subtree under `id` (0 for a leaf).
    pub fn tree_depth(&self, id: &str) -> Result<u32, EngineError> {
        let node = self.get(id)?;
        let left = match &node.left_child {
            Some(c) => 1 + self.tree_depth(c)?,
            None => 0,
        };
        let right = match &node.right_child {
            Some(c) => 1 + self.tree_depth(c)?,
            None => 0,
        };
        Ok(left.max(right))
    }

    /// Total investment across the placement subtree, excluding `id` itself.
    pub fn team_investment_paise(&self, id: &str) -> Result<u128, EngineError> {
        let mut total: u128 = 0;
        for did in self.descendants(id)? {
            total = total.saturating_add(self.get(&did)?.total_investment_paise);
        }
        Ok(total)
    }

    /// All placement descendants of `id` (preorder), excluding `id`.
    pub fn descendants(&self, id: &str) -> Result<Vec<String>, EngineError> {
        let mut out = Vec::new();
        let mut stack = vec![self.get(id)?];
        while let Some(node) = stack.pop() {
            for child in [&node.left_child, &node.right_child].into_iter().flatten() {
                out.push(child.clone());
                stack.push(self.get(child)?);
            }
        }
        Ok(out)
    }

    /// Walk the whole placement tree and report structural damage:
    /// child links whose back-pointers disagree, nodes attached to a
    /// missing parent, and cycles (a node reachable twice).
    pub fn verify_integrity(&self) -> IntegrityReport {
        let mut issues = Vec::new();
        let mut seen: BTreeSet<&str> = BTreeSet::new();

        for (id, node) in &self.members {
            for (side, link) in [(Side::Left, &node.left_child), (Side::Right, &node.right_child)]
            {
                let Some(child_id) = link else { continue };
                match self.members.get(child_id) {
                    None => issues.push(format!("{} links to missing {:?} child {}", id, side, child_id)),
                    Some(child) => {
                        if child.placement_parent.as_deref() != Some(id.as_str()) {
                            issues.push(format!(
                                "{:?} child {} of {} has mismatched placement parent",
                                side, child_id, id
                            ));
                        }
                        if child.placement_side != Some(side) {
                            issues.push(format!(
                                "{:?} child {} of {} has mismatched placement side",
                                side, child_id, id
                            ));
                        }
                        if !seen.insert(child_id.as_str()) {
                            issues.push(format!("{} occupies more than one slot", child_id));
                        }
                    }
                }
            }
            if let Some(pid) = &node.placement_parent {
                if !self.members.contains_key(pid) {
                    issues.push(format!("{} attached to missing parent {}", id, pid));
                }
            }
        }

        IntegrityReport {
            valid: issues.is_empty(),
            total_nodes: self.members.len() as u64,
            issues,
        }
    }

    /// BV conservation audit: every node's `team_bv` must equal the sum of
    /// its placement-descendants' `personal_bv`. Propagation applied
    /// exactly once per investment keeps this exact; a mismatch means a
    /// propagation was skipped or double-applied.
    pub fn audit_team_bv(&self) -> Result<(), Vec<String>> {
        let mut issues = Vec::new();
        for (id, node) in &self.members {
            let mut expected: u128 = 0;
            let mut queue: VecDeque<&MemberNode> = VecDeque::new();
            queue.push_back(node);
            while let Some(n) = queue.pop_front() {
                for child in [&n.left_child, &n.right_child].into_iter().flatten() {
                    if let Some(c) = self.members.get(child) {
                        expected = expected.saturating_add(c.personal_bv);
                        queue.push_back(c);
                    }
                }
            }
            if node.team_bv != expected {
                issues.push(format!(
                    "{}: team_bv {} != descendant personal_bv sum {}",
                    id, node.team_bv, expected
                ));
            }
        }
        if issues.is_empty() {
            Ok(())
        } else {
            Err(issues)
        }
    }
}
