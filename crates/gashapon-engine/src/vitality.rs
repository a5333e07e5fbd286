//! Vitality regeneration and the tap odometer
//!
//! Hp heals one point per whole elapsed minute, credited lazily on read.
//! A record untouched for an hour catches up in a single write, which
//! keeps regeneration correct across process suspension without any
//! background timer.

use crate::error::{Error, Result};
use crate::Engine;
use gashapon_core::economy::{self, EffectiveStats};
use gashapon_core::records::{scoped_key, Enhancement, Vitality, MAX_HP};
use gashapon_core::{CharId, Clock, Metric};
use gashapon_db::PendingWrite;

/// Result of one tap
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TapOutcome {
    pub hp: i32,
    pub tap_count: u32,
    /// True when this tap crossed the odometer threshold and cost 1 hp
    pub hp_lost: bool,
}

impl<C: Clock> Engine<C> {
    /// Read a character's vitality, crediting elapsed regeneration
    ///
    /// Synthesizes a full-health record on first read; persists only when
    /// at least one whole minute of healing was credited.
    pub fn vitality(&mut self, id: &CharId) -> Result<Vitality> {
        self.content().grade_of(id)?;
        let key = scoped_key::<Vitality>(id);
        self.with_retry(|engine| {
            let loaded = engine.store().load::<Vitality>(&key)?;
            let mut record = loaded.record;
            let now = engine.now_ms();
            if loaded.version == 0 {
                record.last_update_ms = now;
                return Ok(record);
            }

            let minutes = (now - record.last_update_ms) / 60_000;
            if minutes > 0 {
                record.hp = record.hp.saturating_add(minutes.min(MAX_HP as i64) as i32).min(MAX_HP);
                record.last_update_ms = now;
                engine.store().save(&key, &record, loaded.version)?;
            }
            Ok(record)
        })
    }

    /// Overwrite a character's vitality
    ///
    /// Clamps hp to `[0, MAX_HP]`, stamps the update time, and persists
    /// unconditionally. Does not credit regeneration; call
    /// [`vitality`](Self::vitality) first when healing should land before
    /// a decrement.
    pub fn set_vitality(&mut self, id: &CharId, hp: i32, tap_count: u32) -> Result<Vitality> {
        self.content().grade_of(id)?;
        let key = scoped_key::<Vitality>(id);
        self.with_retry(|engine| {
            let loaded = engine.store().load::<Vitality>(&key)?;
            let record = Vitality {
                hp: hp.clamp(0, MAX_HP),
                last_update_ms: engine.now_ms(),
                tap_count,
            };
            engine.store().save(&key, &record, loaded.version)?;
            Ok(record)
        })
    }

    /// Record one tap on a character
    ///
    /// Regeneration is credited first, then the odometer moves: the write
    /// either increments the tap count or - when the count reaches the
    /// character's effective hp-loss interval - resets it to zero and
    /// costs exactly one hp. Never both. Taps on an exhausted character
    /// are rejected.
    pub fn record_tap(&mut self, id: &CharId) -> Result<TapOutcome> {
        let stats = self.stats(id)?;
        let key = scoped_key::<Vitality>(id);
        self.with_retry(|engine| {
            let loaded = engine.store().load::<Vitality>(&key)?;
            let mut record = loaded.record;
            let now = engine.now_ms();
            if loaded.version == 0 {
                record.last_update_ms = now;
            } else {
                let minutes = (now - record.last_update_ms) / 60_000;
                if minutes > 0 {
                    record.hp = record.hp.saturating_add(minutes.min(MAX_HP as i64) as i32).min(MAX_HP);
                    record.last_update_ms = now;
                }
            }

            if record.hp == 0 {
                return Err(Error::Exhausted(id.clone()));
            }

            let hp_lost = record.tap_count + 1 >= stats.hp_loss_interval;
            if hp_lost {
                record.tap_count = 0;
                record.hp -= 1;
            } else {
                record.tap_count += 1;
            }
            record.last_update_ms = now;

            let mut writes = vec![PendingWrite::new(&key, &record, loaded.version)?];
            writes.push(engine.quest_bump_pending(Metric::Taps, 1)?);
            engine.commit(writes)?;
            Ok(TapOutcome { hp: record.hp, tap_count: record.tap_count, hp_lost })
        })
    }

    /// A character's stats under its grade and current enhancement level
    ///
    /// Derived on every call, never persisted.
    pub fn stats(&self, id: &CharId) -> Result<EffectiveStats> {
        let grade = self.content().grade_of(id)?;
        let enhancement = self
            .store()
            .load::<Enhancement>(&scoped_key::<Enhancement>(id))?
            .record;
        Ok(economy::effective_stats(grade, enhancement.level))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testkit::funded_engine;

    fn mochi() -> CharId {
        CharId::new("mochi")
    }

    #[test]
    fn test_first_read_synthesizes_full_health() {
        let mut engine = funded_engine();
        let v = engine.vitality(&mochi()).unwrap();
        assert_eq!(v.hp, MAX_HP);
        assert_eq!(v.tap_count, 0);
        assert_eq!(v.last_update_ms, engine.now_ms());
    }

    #[test]
    fn test_unknown_character_rejected() {
        let mut engine = funded_engine();
        assert!(engine.vitality(&CharId::new("nobody")).is_err());
    }

    #[test]
    fn test_regen_catch_up() {
        let mut engine = funded_engine();
        engine.set_vitality(&mochi(), 50, 0).unwrap();

        engine.clock_mut().advance_minutes(10);
        let v = engine.vitality(&mochi()).unwrap();
        assert_eq!(v.hp, 60);
        assert_eq!(v.last_update_ms, engine.now_ms());

        // Partial minutes do not heal or advance the stamp
        engine.clock_mut().advance_ms(59_000);
        let v2 = engine.vitality(&mochi()).unwrap();
        assert_eq!(v2.hp, 60);
        assert_eq!(v2.last_update_ms, v.last_update_ms);
    }

    #[test]
    fn test_regen_caps_at_max() {
        let mut engine = funded_engine();
        engine.set_vitality(&mochi(), 95, 0).unwrap();
        engine.clock_mut().advance_minutes(60);
        assert_eq!(engine.vitality(&mochi()).unwrap().hp, MAX_HP);
    }

    #[test]
    fn test_set_vitality_clamps() {
        let mut engine = funded_engine();
        assert_eq!(engine.set_vitality(&mochi(), 250, 0).unwrap().hp, MAX_HP);
        assert_eq!(engine.set_vitality(&mochi(), -10, 0).unwrap().hp, 0);
    }

    #[test]
    fn test_tap_odometer_never_does_both() {
        let mut engine = funded_engine();
        // Mochi at level 0 endures 10 taps per hp
        let interval = engine.stats(&mochi()).unwrap().hp_loss_interval;
        assert_eq!(interval, 10);

        for expected in 1..interval {
            let outcome = engine.record_tap(&mochi()).unwrap();
            assert!(!outcome.hp_lost);
            assert_eq!(outcome.tap_count, expected);
            assert_eq!(outcome.hp, MAX_HP);
        }

        // The tenth tap resets the odometer and costs exactly one hp
        let outcome = engine.record_tap(&mochi()).unwrap();
        assert!(outcome.hp_lost);
        assert_eq!(outcome.tap_count, 0);
        assert_eq!(outcome.hp, MAX_HP - 1);
    }

    #[test]
    fn test_tap_on_exhausted_character_is_rejected() {
        let mut engine = funded_engine();
        engine.set_vitality(&mochi(), 0, 0).unwrap();
        assert!(matches!(engine.record_tap(&mochi()), Err(Error::Exhausted(_))));
        // Nothing was written
        assert_eq!(engine.vitality(&mochi()).unwrap().hp, 0);
    }

    #[test]
    fn test_exhausted_character_heals_back() {
        let mut engine = funded_engine();
        engine.set_vitality(&mochi(), 0, 0).unwrap();
        engine.clock_mut().advance_minutes(5);
        assert_eq!(engine.vitality(&mochi()).unwrap().hp, 5);
        assert!(engine.record_tap(&mochi()).is_ok());
    }
}
