// ─────────────────────────────────────────────────────────────────
// Placement Resolver — where a new member attaches in the binary tree
//
// LEFT/RIGHT: straight-line descent down the named leg from the
// sponsor until an empty slot appears ("follow the leg the sponsor
// named" — deep single-leg chains are intentional).
// AUTO: breadth-first from the sponsor, LEFT before RIGHT, yielding
// the shallowest available slot.
// ─────────────────────────────────────────────────────────────────

use crate::{EngineError, Side, TreeStore, MAX_PLACEMENT_SCAN};
use std::collections::VecDeque;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlacementMode {
    Left,
    Right,
    Auto,
}

impl PlacementMode {
    /// Parse the wire/tree-store spelling ("LEFT" / "RIGHT" / "AUTO").
    pub fn parse(s: &str) -> Result<Self, EngineError> {
        match s.to_ascii_uppercase().as_str() {
            "LEFT" => Ok(PlacementMode::Left),
            "RIGHT" => Ok(PlacementMode::Right),
            "AUTO" => Ok(PlacementMode::Auto),
            other => Err(EngineError::Config(format!(
                "invalid placement option: {}",
                other
            ))),
        }
    }
}

/// Resolve the (parent, side) slot a new member should occupy under
/// `sponsor_id`. The sponsor must exist and be ACTIVE. The returned slot
/// is guaranteed empty at return time; attachment re-checks it so two
/// racing registrations cannot both win the same slot.
pub fn resolve_placement(
    tree: &TreeStore,
    sponsor_id: &str,
    mode: PlacementMode,
) -> Result<(String, Side), EngineError> {
    let sponsor = tree
        .get(sponsor_id)
        .map_err(|_| EngineError::InvalidSponsor(sponsor_id.to_string()))?;
    if !sponsor.is_active() {
        return Err(EngineError::InvalidSponsor(sponsor_id.to_string()));
    }

    let (parent, side) = match mode {
        PlacementMode::Left => descend_leg(tree, sponsor_id, Side::Left)?,
        PlacementMode::Right => descend_leg(tree, sponsor_id, Side::Right)?,
        PlacementMode::Auto => auto_placement(tree, sponsor_id)?,
    };

    // Slot exclusivity, verified structurally before we hand the slot out.
    if tree.get(&parent)?.child(side).is_some() {
        return Err(EngineError::SlotOccupied { parent, side });
    }
    log::debug!(
        "placement for sponsor {} resolved to {:?} of {}",
        sponsor_id,
        side,
        parent
    );
    Ok((parent, side))
}

/// Follow one leg downward until its first empty slot. Visits one node
/// per level — O(leg depth), bounded against corrupted link chains.
fn descend_leg(
    tree: &TreeStore,
    start: &str,
    side: Side,
) -> Result<(String, Side), EngineError> {
    let mut current = start.to_string();
    let mut visited: u64 = 0;
    loop {
        visited += 1;
        if visited > MAX_PLACEMENT_SCAN {
            return Err(EngineError::NoAvailableSlot(start.to_string()));
        }
        match tree.get(&current)?.child(side) {
            None => return Ok((current, side)),
            Some(child) => current = child.to_string(),
        }
    }
}

/// Breadth-first search from the sponsor; LEFT is probed before RIGHT at
/// every node, so the first hole found is the shallowest available slot
/// (ties broken toward LEFT). Guarantees nearly-balanced growth.
fn auto_placement(tree: &TreeStore, start: &str) -> Result<(String, Side), EngineError> {
    let mut queue: VecDeque<String> = VecDeque::new();
    queue.push_back(start.to_string());
    let mut visited: u64 = 0;

    while let Some(current) = queue.pop_front() {
        visited += 1;
        if visited > MAX_PLACEMENT_SCAN {
            break;
        }
        let node = tree.get(&current)?;
        match node.child(Side::Left) {
            None => return Ok((current, Side::Left)),
            Some(child) => queue.push_back(child.to_string()),
        }
        match node.child(Side::Right) {
            None => return Ok((current, Side::Right)),
            Some(child) => queue.push_back(child.to_string()),
        }
    }
    // Unreachable in a well-formed tree: every node has ≤2 children, so an
    // exhaustive BFS always finds a hole before the bound.
    Err(EngineError::NoAvailableSlot(start.to_string()))
}
