//! Pure economy math
//!
//! Cost curves, derived stats, and reward formulas are functions of content
//! and current state only. Nothing here is persisted; callers recompute on
//! every read.

use crate::content::GradeDef;

/// Highest reachable enhancement level
pub const MAX_ENHANCE_LEVEL: u8 = 5;

/// Duplicate tokens required to advance from `level` to `level + 1`
pub fn enhance_cost(level: u8) -> u32 {
    level as u32 + 1
}

/// A character's stats after grade and enhancement scaling
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EffectiveStats {
    pub score_per_tap: u32,
    pub coin_drop_chance: f64,
    pub crit_chance: f64,
    pub hp_loss_interval: u32,
}

/// Stats for a grade at the given enhancement level
///
/// Linear per-level growth on top of the grade's base; chances cap at 1.0
/// and the hp-loss interval never drops below one tap.
pub fn effective_stats(grade: &GradeDef, level: u8) -> EffectiveStats {
    let level = level.min(MAX_ENHANCE_LEVEL) as u32;
    EffectiveStats {
        score_per_tap: grade.base.score_per_tap + grade.growth.score_per_tap * level,
        coin_drop_chance: (grade.base.coin_drop_chance + grade.growth.coin_drop_chance * level as f64)
            .min(1.0),
        crit_chance: (grade.base.crit_chance + grade.growth.crit_chance * level as f64).min(1.0),
        hp_loss_interval: (grade.base.hp_loss_interval + grade.growth.hp_loss_interval * level).max(1),
    }
}

/// Matured expedition payout
///
/// `floor(base × multiplier × (1 + 0.2 × level))`, evaluated with the
/// character's enhancement level at collection time.
pub fn expedition_reward(base_reward: u64, grade_multiplier: u32, level: u8) -> u64 {
    let scaled = base_reward as f64 * grade_multiplier as f64 * (1.0 + 0.2 * level as f64);
    scaled.floor() as u64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::{BaseStats, StatGrowth};
    use crate::identity::GradeId;

    fn grade() -> GradeDef {
        GradeDef {
            id: GradeId::new("rare"),
            name: String::new(),
            weight: 10,
            reward_multiplier: 5,
            base: BaseStats {
                score_per_tap: 3,
                coin_drop_chance: 0.2,
                crit_chance: 0.9,
                hp_loss_interval: 12,
            },
            growth: StatGrowth {
                score_per_tap: 2,
                coin_drop_chance: 0.05,
                crit_chance: 0.1,
                hp_loss_interval: 3,
            },
        }
    }

    #[test]
    fn test_cost_curve() {
        assert_eq!(enhance_cost(0), 1);
        assert_eq!(enhance_cost(1), 2);
        assert_eq!(enhance_cost(4), 5);
    }

    #[test]
    fn test_effective_stats_scaling() {
        let g = grade();
        let s0 = effective_stats(&g, 0);
        assert_eq!(s0.score_per_tap, 3);
        assert_eq!(s0.hp_loss_interval, 12);

        let s3 = effective_stats(&g, 3);
        assert_eq!(s3.score_per_tap, 9);
        assert!((s3.coin_drop_chance - 0.35).abs() < 1e-9);
        assert_eq!(s3.hp_loss_interval, 21);
        // Crit hits the 1.0 cap at level 3 (0.9 + 0.3)
        assert_eq!(s3.crit_chance, 1.0);
    }

    #[test]
    fn test_effective_stats_clamps_level() {
        let g = grade();
        assert_eq!(effective_stats(&g, 200), effective_stats(&g, MAX_ENHANCE_LEVEL));
    }

    #[test]
    fn test_expedition_reward_formula() {
        assert_eq!(expedition_reward(250, 5, 3), 2000);
        assert_eq!(expedition_reward(100, 1, 0), 100);
        // floor applies after the full product
        assert_eq!(expedition_reward(33, 1, 1), 39);
    }
}
