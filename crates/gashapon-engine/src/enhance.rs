//! Enhancement level-ups
//!
//! Advancing from level L costs L+1 duplicate tokens. Deduction and
//! increment live in the same record, so the write is atomic by
//! construction: either both land or neither does.

use crate::error::{Error, Result};
use crate::Engine;
use gashapon_core::economy::{enhance_cost, MAX_ENHANCE_LEVEL};
use gashapon_core::records::{scoped_key, Enhancement};
use gashapon_core::{CharId, Clock};

/// Result of an enhancement attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnhanceOutcome {
    /// The level went up
    Enhanced { level: u8, spent: u32, remaining: u32 },
    /// The character already sits at the cap; nothing changed
    AlreadyMaxed { duplicates: u32 },
}

impl<C: Clock> Engine<C> {
    /// Spend duplicates to raise a character's enhancement level
    pub fn enhance(&mut self, id: &CharId) -> Result<EnhanceOutcome> {
        self.content().grade_of(id)?;
        let key = scoped_key::<Enhancement>(id);
        self.with_retry(|engine| {
            let loaded = engine.store().load::<Enhancement>(&key)?;
            let mut record = loaded.record;

            if record.level >= MAX_ENHANCE_LEVEL {
                return Ok(EnhanceOutcome::AlreadyMaxed { duplicates: record.duplicates });
            }

            let cost = enhance_cost(record.level);
            if record.duplicates < cost {
                return Err(Error::InsufficientDuplicates {
                    needed: cost,
                    have: record.duplicates,
                });
            }

            record.duplicates -= cost;
            record.level += 1;
            engine.store().save(&key, &record, loaded.version)?;

            log::debug!("'{id}' enhanced to level {}", record.level);
            Ok(EnhanceOutcome::Enhanced {
                level: record.level,
                spent: cost,
                remaining: record.duplicates,
            })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testkit::funded_engine;

    fn mochi() -> CharId {
        CharId::new("mochi")
    }

    fn seed_duplicates<C: Clock>(engine: &mut Engine<C>, id: &CharId, duplicates: u32, level: u8) {
        let key = scoped_key::<Enhancement>(id);
        let loaded = engine.store().load::<Enhancement>(&key).unwrap();
        let record = Enhancement { level, duplicates };
        engine.store().save(&key, &record, loaded.version).unwrap();
    }

    #[test]
    fn test_cost_is_level_plus_one() {
        let mut engine = funded_engine();
        seed_duplicates(&mut engine, &mochi(), 6, 0);

        // 0 -> 1 costs 1
        let outcome = engine.enhance(&mochi()).unwrap();
        assert_eq!(outcome, EnhanceOutcome::Enhanced { level: 1, spent: 1, remaining: 5 });

        // 1 -> 2 costs 2
        let outcome = engine.enhance(&mochi()).unwrap();
        assert_eq!(outcome, EnhanceOutcome::Enhanced { level: 2, spent: 2, remaining: 3 });

        // 2 -> 3 costs 3
        let outcome = engine.enhance(&mochi()).unwrap();
        assert_eq!(outcome, EnhanceOutcome::Enhanced { level: 3, spent: 3, remaining: 0 });
    }

    #[test]
    fn test_insufficient_duplicates_leaves_state_untouched() {
        let mut engine = funded_engine();
        seed_duplicates(&mut engine, &mochi(), 2, 2);

        assert!(matches!(
            engine.enhance(&mochi()),
            Err(Error::InsufficientDuplicates { needed: 3, have: 2 })
        ));

        let record = engine.enhancement(&mochi()).unwrap();
        assert_eq!(record.level, 2);
        assert_eq!(record.duplicates, 2);
    }

    #[test]
    fn test_enhance_at_cap_is_a_reported_noop() {
        let mut engine = funded_engine();
        seed_duplicates(&mut engine, &mochi(), 9, MAX_ENHANCE_LEVEL);

        let before = engine.store().version(&scoped_key::<Enhancement>(&mochi())).unwrap();
        let outcome = engine.enhance(&mochi()).unwrap();
        assert_eq!(outcome, EnhanceOutcome::AlreadyMaxed { duplicates: 9 });

        // No write happened
        let after = engine.store().version(&scoped_key::<Enhancement>(&mochi())).unwrap();
        assert_eq!(before, after);
        assert_eq!(engine.enhancement(&mochi()).unwrap().duplicates, 9);
    }

    #[test]
    fn test_stats_scale_with_level() {
        let mut engine = funded_engine();
        let base = engine.stats(&mochi()).unwrap();
        seed_duplicates(&mut engine, &mochi(), 1, 0);
        engine.enhance(&mochi()).unwrap();
        let leveled = engine.stats(&mochi()).unwrap();
        assert_eq!(leveled.score_per_tap, base.score_per_tap + 1);
        assert_eq!(leveled.hp_loss_interval, base.hp_loss_interval + 2);
    }
}
