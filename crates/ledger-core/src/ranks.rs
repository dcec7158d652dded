use serde::{Deserialize, Serialize};

use crate::error::{LedgerError, Result};

/// One bracket of the rank ladder.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankTier {
    /// Display name of the tier.
    pub name: String,
    /// Lowest lifetime profit that earns this tier.
    pub min_profit: f64,
    /// Display colour hint for the presentation layer.
    pub color: String,
    /// Emoji shown next to the tier name.
    pub icon: String,
}

impl RankTier {
    pub fn new(name: &str, min_profit: f64, color: &str, icon: &str) -> Self {
        Self {
            name: name.to_string(),
            min_profit,
            color: color.to_string(),
            icon: icon.to_string(),
        }
    }
}

/// Ordered profit-threshold ladder, lowest tier first.
///
/// The lowest tier always has a threshold of negative infinity so every
/// profit value maps to some tier.
#[derive(Debug, Clone, PartialEq)]
pub struct RankLadder {
    tiers: Vec<RankTier>,
}

impl RankLadder {
    /// Build a ladder from tiers sorted ascending by `min_profit`.
    ///
    /// Fails with [`LedgerError::InvalidLadder`] when the list is empty, is
    /// not sorted ascending, contains a NaN threshold, or its first tier is
    /// not the negative-infinity catch-all.
    pub fn new(tiers: Vec<RankTier>) -> Result<Self> {
        let first = tiers
            .first()
            .ok_or_else(|| LedgerError::InvalidLadder("ladder has no tiers".to_string()))?;

        if first.min_profit != f64::NEG_INFINITY {
            return Err(LedgerError::InvalidLadder(format!(
                "lowest tier \"{}\" must start at negative infinity",
                first.name
            )));
        }

        if tiers.iter().any(|t| t.min_profit.is_nan()) {
            return Err(LedgerError::InvalidLadder(
                "tier threshold is NaN".to_string(),
            ));
        }

        if let Some(pair) = tiers.windows(2).find(|w| w[0].min_profit > w[1].min_profit) {
            return Err(LedgerError::InvalidLadder(format!(
                "tier \"{}\" is out of order after \"{}\"",
                pair[1].name, pair[0].name
            )));
        }

        Ok(Self { tiers })
    }

    /// Tier for a lifetime profit value.
    ///
    /// Scans from the highest threshold down and returns the first tier whose
    /// minimum is `<= profit`. NaN matches nothing and falls through to the
    /// lowest tier.
    pub fn rank_of(&self, profit: f64) -> &RankTier {
        self.tiers
            .iter()
            .rev()
            .find(|tier| profit >= tier.min_profit)
            .unwrap_or(&self.tiers[0])
    }

    /// All tiers, lowest first.
    pub fn tiers(&self) -> &[RankTier] {
        &self.tiers
    }

    /// Next tier above `profit` and the amount still needed to reach it.
    ///
    /// Returns `None` once the top tier is reached.
    pub fn next_tier(&self, profit: f64) -> Option<(&RankTier, f64)> {
        self.tiers
            .iter()
            .find(|tier| tier.min_profit > profit)
            .map(|tier| (tier, tier.min_profit - profit))
    }
}

impl Default for RankLadder {
    fn default() -> Self {
        Self {
            tiers: vec![
                RankTier::new("Tập Sự", f64::NEG_INFINITY, "text-gray-400", "🐣"),
                RankTier::new("Đồng", 0.0, "text-amber-700", "🥉"),
                RankTier::new("Bạc", 2_000_000.0, "text-slate-400", "🥈"),
                RankTier::new("Vàng", 5_000_000.0, "text-yellow-500", "🥇"),
                RankTier::new("Bạch Kim", 10_000_000.0, "text-cyan-400", "💠"),
                RankTier::new("Kim Cương", 20_000_000.0, "text-blue-400", "💎"),
                RankTier::new("Cao Thủ", 50_000_000.0, "text-purple-400", "🔮"),
                RankTier::new("Đại Cao Thủ", 100_000_000.0, "text-red-500", "👹"),
                RankTier::new("Thách Đấu", 200_000_000.0, "text-yellow-300", "👑"),
            ],
        }
    }
}
