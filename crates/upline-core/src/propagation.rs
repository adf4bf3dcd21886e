// ─────────────────────────────────────────────────────────────────
// BV Propagator — upward fold along placement links
//
// One investment event updates one ancestor per tree level: the side
// BV of the leg the walk ascended from, plus team BV unconditionally.
// Cost is O(depth). Triggered exactly once per investment event.
// ─────────────────────────────────────────────────────────────────

use crate::{EngineError, Side, TreeStore, MAX_TREE_DEPTH};

/// Add `bv_centi` to every placement ancestor of `member_id`: to
/// `left_bv` or `right_bv` depending on which leg the member hangs
/// under, and to `team_bv` at every level. Returns the number of
/// ancestors touched. The member's own `personal_bv` is NOT updated
/// here — that belongs to the investment entry point.
pub fn propagate_bv(
    tree: &mut TreeStore,
    member_id: &str,
    bv_centi: u128,
) -> Result<u32, EngineError> {
    let start = tree.get(member_id)?;
    let mut parent = start.placement_parent.clone();
    let mut side = start.placement_side;
    let mut levels: u32 = 0;

    while let (Some(pid), Some(s)) = (parent.take(), side) {
        levels += 1;
        if levels > MAX_TREE_DEPTH {
            return Err(EngineError::DepthExceeded(member_id.to_string()));
        }
        let ancestor = tree.get_mut(&pid)?;
        match s {
            Side::Left => ancestor.left_bv = ancestor.left_bv.saturating_add(bv_centi),
            Side::Right => ancestor.right_bv = ancestor.right_bv.saturating_add(bv_centi),
        }
        ancestor.team_bv = ancestor.team_bv.saturating_add(bv_centi);
        parent = ancestor.placement_parent.clone();
        side = ancestor.placement_side;
    }
    log::debug!(
        "propagated {} centi-BV from {} across {} levels",
        bv_centi,
        member_id,
        levels
    );
    Ok(levels)
}
