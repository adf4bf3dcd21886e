// ─────────────────────────────────────────────────────────────────
// Engine configuration — compensation-plan parameters
//
// Compiled-in defaults match the launch plan; operators override per
// deployment via a TOML file or environment variables.
// ─────────────────────────────────────────────────────────────────

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fs;
use std::path::Path;

use crate::{
    EngineError, BV_PER_PAIR_CENTI, DAILY_COMMISSION_CAP_PAISE, DIRECT_REFERRAL_BPS,
    LEVEL_COMMISSION_BPS, MAX_LEVEL_DEPTH, MAX_PLACEMENT_SCAN, MAX_TREE_DEPTH, PAISE_PER_RUPEE,
    PAIRING_BONUS_PER_PAIR_PAISE,
};

/// Serde adapter for u128 ↔ TOML: serialize as string, deserialize from
/// string or integer. TOML has no native u128, so money fields round-trip
/// through strings.
mod u128_toml {
    use super::*;

    pub fn serialize<S: Serializer>(val: &u128, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&val.to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<u128, D::Error> {
        use serde::de::{self, Visitor};
        struct U128Visitor;

        impl<'de> Visitor<'de> for U128Visitor {
            type Value = u128;

            fn expecting(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
                f.write_str("a u128 as a string or integer")
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<u128, E> {
                v.parse().map_err(E::custom)
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> Result<u128, E> {
                Ok(v as u128)
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> Result<u128, E> {
                if v >= 0 {
                    Ok(v as u128)
                } else {
                    Err(E::custom("negative value for u128"))
                }
            }
        }

        d.deserialize_any(U128Visitor)
    }
}

/// One rank tier. Tiers form a total order by `display_order`; promotion
/// is monotonic (no demotion path) and pays the one-time bonus through
/// the capped commission path.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RankTier {
    pub name: String,
    pub display_order: u32,
    pub min_direct_referrals: u64,
    #[serde(with = "u128_toml")]
    pub min_personal_investment_paise: u128,
    /// Team threshold is compared against the member's cumulative team BV.
    /// With the standard 1:1 BV ratio this coincides with team investment.
    #[serde(with = "u128_toml")]
    pub min_team_bv_centi: u128,
    #[serde(with = "u128_toml")]
    pub one_time_bonus_paise: u128,
    pub active: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    #[serde(with = "u128_toml")]
    pub daily_cap_paise: u128,
    pub direct_referral_bps: u32,
    /// Level commission table, level 1 first, in basis points.
    pub level_bps: Vec<u32>,
    pub max_level_depth: usize,
    #[serde(with = "u128_toml")]
    pub bv_per_pair_centi: u128,
    #[serde(with = "u128_toml")]
    pub pairing_bonus_per_pair_paise: u128,
    pub max_tree_depth: u32,
    pub max_placement_scan: u64,
    pub rank_tiers: Vec<RankTier>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            daily_cap_paise: DAILY_COMMISSION_CAP_PAISE,
            direct_referral_bps: DIRECT_REFERRAL_BPS,
            level_bps: LEVEL_COMMISSION_BPS.to_vec(),
            max_level_depth: MAX_LEVEL_DEPTH,
            bv_per_pair_centi: BV_PER_PAIR_CENTI,
            pairing_bonus_per_pair_paise: PAIRING_BONUS_PER_PAIR_PAISE,
            max_tree_depth: MAX_TREE_DEPTH,
            max_placement_scan: MAX_PLACEMENT_SCAN,
            rank_tiers: default_rank_tiers(),
        }
    }
}

/// Launch rank table. Associate is the starting rank (order 0, no
/// thresholds, no bonus); higher tiers gate on direct referrals,
/// personal investment and team BV.
pub fn default_rank_tiers() -> Vec<RankTier> {
    let tier = |name: &str, order: u32, directs: u64, personal_rs: u128, team_bv: u128, bonus_rs: u128| RankTier {
        name: name.to_string(),
        display_order: order,
        min_direct_referrals: directs,
        min_personal_investment_paise: personal_rs * PAISE_PER_RUPEE,
        min_team_bv_centi: team_bv * crate::CENTI_PER_BV,
        one_time_bonus_paise: bonus_rs * PAISE_PER_RUPEE,
        active: true,
    };
    vec![
        tier("Associate", 0, 0, 0, 0, 0),
        tier("Silver", 1, 2, 50_000, 200_000, 5_000),
        tier("Gold", 2, 4, 100_000, 500_000, 15_000),
        tier("Platinum", 3, 6, 200_000, 1_000_000, 50_000),
        tier("Diamond", 4, 10, 500_000, 2_500_000, 150_000),
    ]
}

impl EngineConfig {
    /// Load engine config from a TOML file.
    pub fn load_from_file(path: &Path) -> Result<Self, EngineError> {
        let content =
            fs::read_to_string(path).map_err(|e| EngineError::Config(e.to_string()))?;
        let config: EngineConfig =
            toml::from_str(&content).map_err(|e| EngineError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Apply scalar overrides from environment variables on top of `self`.
    /// Useful for containerized deployments; the rank table and level
    /// table stay file/default-driven.
    pub fn apply_env_overrides(mut self) -> Result<Self, EngineError> {
        if let Ok(v) = std::env::var("UPLINE_DAILY_CAP_PAISE") {
            self.daily_cap_paise = v.parse().map_err(|_| {
                EngineError::Config("UPLINE_DAILY_CAP_PAISE is not a u128".to_string())
            })?;
        }
        if let Ok(v) = std::env::var("UPLINE_DIRECT_REFERRAL_BPS") {
            self.direct_referral_bps = v.parse().map_err(|_| {
                EngineError::Config("UPLINE_DIRECT_REFERRAL_BPS is not a u32".to_string())
            })?;
        }
        if let Ok(v) = std::env::var("UPLINE_BV_PER_PAIR_CENTI") {
            self.bv_per_pair_centi = v.parse().map_err(|_| {
                EngineError::Config("UPLINE_BV_PER_PAIR_CENTI is not a u128".to_string())
            })?;
        }
        if let Ok(v) = std::env::var("UPLINE_PAIRING_BONUS_PER_PAIR_PAISE") {
            self.pairing_bonus_per_pair_paise = v.parse().map_err(|_| {
                EngineError::Config(
                    "UPLINE_PAIRING_BONUS_PER_PAIR_PAISE is not a u128".to_string(),
                )
            })?;
        }
        self.validate()?;
        Ok(self)
    }

    pub fn validate(&self) -> Result<(), EngineError> {
        if self.bv_per_pair_centi == 0 {
            return Err(EngineError::Config("bv_per_pair_centi must be > 0".to_string()));
        }
        if self.level_bps.is_empty() || self.max_level_depth == 0 {
            return Err(EngineError::Config(
                "level commission table must not be empty".to_string(),
            ));
        }
        if self.rank_tiers.is_empty() {
            return Err(EngineError::Config("rank tier table must not be empty".to_string()));
        }
        let mut orders: Vec<u32> = self.rank_tiers.iter().map(|t| t.display_order).collect();
        orders.sort_unstable();
        orders.dedup();
        if orders.len() != self.rank_tiers.len() {
            return Err(EngineError::Config(
                "rank tiers must have unique display_order values".to_string(),
            ));
        }
        Ok(())
    }

    /// The starting rank: lowest display_order among active tiers.
    pub fn starting_rank(&self) -> &str {
        self.rank_tiers
            .iter()
            .filter(|t| t.active)
            .min_by_key(|t| t.display_order)
            .map(|t| t.name.as_str())
            .unwrap_or("Associate")
    }

    /// Effective percentage for a 1-based level, if the table covers it.
    pub fn level_bps_at(&self, level: usize) -> Option<u32> {
        if level == 0 || level > self.max_level_depth {
            return None;
        }
        self.level_bps.get(level - 1).copied()
    }
}

// ─────────────────────────────────────────────────────────────────
// Unit Tests
// ─────────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_match_launch_plan() {
        let cfg = EngineConfig::default();
        assert_eq!(cfg.daily_cap_paise, 25_000 * PAISE_PER_RUPEE);
        assert_eq!(cfg.direct_referral_bps, 200);
        assert_eq!(cfg.level_bps.len(), 10);
        assert_eq!(cfg.level_bps_at(1), Some(300));
        assert_eq!(cfg.level_bps_at(10), Some(50));
        assert_eq!(cfg.level_bps_at(11), None);
        assert_eq!(cfg.starting_rank(), "Associate");
        cfg.validate().unwrap();
    }

    #[test]
    fn toml_round_trip_preserves_u128_fields() {
        let cfg = EngineConfig::default();
        let text = toml::to_string(&cfg).unwrap();
        let back: EngineConfig = toml::from_str(&text).unwrap();
        assert_eq!(back.daily_cap_paise, cfg.daily_cap_paise);
        assert_eq!(back.bv_per_pair_centi, cfg.bv_per_pair_centi);
        assert_eq!(back.rank_tiers, cfg.rank_tiers);
    }

    #[test]
    fn load_from_file_accepts_integer_or_string_u128() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        let base = toml::to_string(&EngineConfig::default()).unwrap();
        // Integer spelling for a u128 field must also deserialize
        let patched = base.replace(
            &format!("daily_cap_paise = \"{}\"", 25_000 * PAISE_PER_RUPEE),
            "daily_cap_paise = 1000000",
        );
        f.write_all(patched.as_bytes()).unwrap();
        let cfg = EngineConfig::load_from_file(f.path()).unwrap();
        assert_eq!(cfg.daily_cap_paise, 1_000_000);
    }

    #[test]
    fn validation_rejects_degenerate_tables() {
        let mut cfg = EngineConfig::default();
        cfg.bv_per_pair_centi = 0;
        assert!(cfg.validate().is_err());

        let mut cfg = EngineConfig::default();
        cfg.rank_tiers[1].display_order = 0; // collides with Associate
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn rank_tier_order_is_strictly_increasing_in_defaults() {
        let tiers = default_rank_tiers();
        for pair in tiers.windows(2) {
            assert!(pair[0].display_order < pair[1].display_order);
            // Thresholds never shrink as tiers rise
            assert!(pair[0].min_direct_referrals <= pair[1].min_direct_referrals);
            assert!(pair[0].min_team_bv_centi <= pair[1].min_team_bv_centi);
        }
    }
}
