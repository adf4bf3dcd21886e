// ─────────────────────────────────────────────────────────────────
// Engine error taxonomy.
//
// Registration/investment errors surface synchronously to the caller;
// batch sweeps catch per-member errors at the member boundary and
// aggregate them into the sweep summary instead of propagating.
// ─────────────────────────────────────────────────────────────────

use crate::Side;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    /// Sponsor missing or not ACTIVE — fatal to registration, not retried.
    InvalidSponsor(String),
    /// Placement search exhausted its scan bound without an empty slot.
    /// Should not occur in a well-formed tree; the bound exists so a
    /// corrupted tree cannot send the resolver into an infinite loop.
    NoAvailableSlot(String),
    MemberNotFound(String),
    DuplicateMember(String),
    /// Attempt to attach into a (parent, side) slot that already has an
    /// occupant. Slot exclusivity is structural — this is never retried
    /// against the same slot.
    SlotOccupied { parent: String, side: Side },
    WalletNotFound(String),
    InsufficientBalance {
        member: String,
        bucket: String,
        needed_paise: u128,
        available_paise: u128,
    },
    /// An upward/downward walk exceeded the maximum tree depth — the
    /// tree data is corrupted (cycle or runaway chain).
    DepthExceeded(String),
    InvalidAmount(String),
    /// Member exists but is INACTIVE/BLOCKED and may not perform the
    /// requested operation.
    MemberNotEligible(String),
    Config(String),
}

impl fmt::Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EngineError::InvalidSponsor(id) => {
                write!(f, "Invalid Sponsor: {} is missing or not active", id)
            }
            EngineError::NoAvailableSlot(id) => write!(
                f,
                "No Available Slot: placement search from {} exhausted its bound",
                id
            ),
            EngineError::MemberNotFound(id) => write!(f, "Member Error: {} not found", id),
            EngineError::DuplicateMember(id) => {
                write!(f, "Member Error: {} already exists", id)
            }
            EngineError::SlotOccupied { parent, side } => write!(
                f,
                "Placement Error: {:?} slot under {} already occupied",
                side, parent
            ),
            EngineError::WalletNotFound(id) => write!(f, "Wallet Error: no wallet for {}", id),
            EngineError::InsufficientBalance {
                member,
                bucket,
                needed_paise,
                available_paise,
            } => write!(
                f,
                "Insufficient Funds: {} has {} paise in {} bucket, needs {}",
                member, available_paise, bucket, needed_paise
            ),
            EngineError::DepthExceeded(id) => write!(
                f,
                "Tree Error: walk from {} exceeded maximum depth (corrupted tree?)",
                id
            ),
            EngineError::InvalidAmount(msg) => write!(f, "Amount Error: {}", msg),
            EngineError::MemberNotEligible(id) => {
                write!(f, "Member Error: {} is not eligible (inactive or blocked)", id)
            }
            EngineError::Config(msg) => write!(f, "Config Error: {}", msg),
        }
    }
}

impl std::error::Error for EngineError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_includes_member_and_amounts() {
        let err = EngineError::InsufficientBalance {
            member: "MEM01".to_string(),
            bucket: "INVESTMENT".to_string(),
            needed_paise: 5_000_00,
            available_paise: 100_00,
        };
        let msg = err.to_string();
        assert!(msg.contains("MEM01"));
        assert!(msg.contains("500000"));
        assert!(msg.starts_with("Insufficient Funds"));
    }

    #[test]
    fn slot_occupied_names_the_side() {
        let err = EngineError::SlotOccupied {
            parent: "MEM02".to_string(),
            side: Side::Left,
        };
        assert!(err.to_string().contains("Left"));
    }
}
