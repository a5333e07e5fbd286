//! Timed expeditions
//!
//! A slot stores only Idle or Running; whether a running expedition is
//! still active or already matured is derived from elapsed time on every
//! read. Rewards are computed at collection with the character's current
//! enhancement level, so enhancing mid-expedition raises the payout.

use crate::error::{Error, Result};
use crate::Engine;
use gashapon_core::economy::expedition_reward;
use gashapon_core::records::{scoped_key, ExpeditionSlot};
use gashapon_core::{CharId, Clock, Metric, Reward};
use gashapon_db::PendingWrite;

/// Derived lifecycle phase of a slot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotPhase {
    Idle,
    /// Still running; reward not yet claimable
    Active { remaining_ms: i64 },
    /// Timer elapsed; reward waiting to be collected
    Complete,
}

/// A slot together with its derived phase and reward preview
#[derive(Debug, Clone)]
pub struct SlotView {
    pub index: u32,
    pub slot: ExpeditionSlot,
    pub phase: SlotPhase,
    /// Payout if collected right now, for running slots
    pub reward_preview: Option<u64>,
}

impl<C: Clock> Engine<C> {
    /// All expedition slots with derived phases
    pub fn slots(&self) -> Result<Vec<SlotView>> {
        (0..self.content().expedition_slots())
            .map(|index| self.slot_view(index))
            .collect()
    }

    /// One slot with its derived phase
    pub fn slot_view(&self, index: u32) -> Result<SlotView> {
        if index >= self.content().expedition_slots() {
            return Err(Error::NoSuchSlot(index));
        }
        let slot = self
            .store()
            .load::<ExpeditionSlot>(&scoped_key::<ExpeditionSlot>(index))?
            .record;
        let phase = self.phase_of(&slot)?;
        let reward_preview = match &slot {
            ExpeditionSlot::Idle => None,
            ExpeditionSlot::Running { .. } => Some(self.payout_of(&slot)?),
        };
        Ok(SlotView { index, slot, phase, reward_preview })
    }

    /// Send a collected character on an expedition
    ///
    /// Rejected when the slot is busy, the character is already away in
    /// any slot, or the character is currently equipped.
    pub fn start_expedition(&mut self, index: u32, id: &CharId, expedition_id: &str) -> Result<()> {
        if index >= self.content().expedition_slots() {
            return Err(Error::NoSuchSlot(index));
        }
        self.content()
            .expedition(expedition_id)
            .ok_or_else(|| Error::UnknownContent(expedition_id.to_string()))?;
        self.require_collected(id)?;

        if self.selected()? == Some(id.clone()) {
            return Err(Error::CharacterSelected(id.clone()));
        }
        if let Some(busy) = self.slot_holding(id)? {
            log::debug!("'{id}' already away in slot {busy}");
            return Err(Error::CharacterOnExpedition(id.clone()));
        }

        let key = scoped_key::<ExpeditionSlot>(index);
        let expedition = expedition_id.to_string();
        self.with_retry(|engine| {
            let loaded = engine.store().load::<ExpeditionSlot>(&key)?;
            if !loaded.record.is_idle() {
                return Err(Error::SlotBusy(index));
            }
            let slot = ExpeditionSlot::Running {
                character: id.clone(),
                expedition: expedition.clone(),
                started_ms: engine.now_ms(),
            };
            engine.store().save(&key, &slot, loaded.version)?;
            Ok(())
        })
    }

    /// Payout if the slot were collected right now
    pub fn preview_reward(&self, index: u32) -> Result<u64> {
        let view = self.slot_view(index)?;
        view.reward_preview.ok_or(Error::SlotEmpty(index))
    }

    /// Collect a matured expedition
    ///
    /// Pays the scaled reward, frees the slot, and counts quest progress,
    /// all in one commit.
    pub fn collect_expedition(&mut self, index: u32) -> Result<u64> {
        if index >= self.content().expedition_slots() {
            return Err(Error::NoSuchSlot(index));
        }
        let key = scoped_key::<ExpeditionSlot>(index);
        self.with_retry(|engine| {
            let loaded = engine.store().load::<ExpeditionSlot>(&key)?;
            if loaded.record.is_idle() {
                return Err(Error::SlotEmpty(index));
            }
            match engine.phase_of(&loaded.record)? {
                SlotPhase::Active { remaining_ms } => {
                    return Err(Error::ExpeditionNotComplete { remaining_ms });
                }
                SlotPhase::Complete => {}
                SlotPhase::Idle => unreachable!("non-idle slot"),
            }

            let payout = engine.payout_of(&loaded.record)?;
            let mut writes = vec![PendingWrite::new(&key, &ExpeditionSlot::Idle, loaded.version)?];
            engine.grant_writes(&Reward::coins(payout), &mut writes)?;
            writes.push(engine.quest_bump_pending(Metric::Expeditions, 1)?);
            engine.commit(writes)?;

            log::debug!("slot {index} collected for {payout} coins");
            Ok(payout)
        })
    }

    fn phase_of(&self, slot: &ExpeditionSlot) -> Result<SlotPhase> {
        match slot {
            ExpeditionSlot::Idle => Ok(SlotPhase::Idle),
            ExpeditionSlot::Running { expedition, started_ms, .. } => {
                let def = self
                    .content()
                    .expedition(expedition)
                    .ok_or_else(|| Error::UnknownContent(expedition.clone()))?;
                let elapsed = self.now_ms() - started_ms;
                let remaining_ms = def.duration_ms() - elapsed;
                if remaining_ms > 0 {
                    Ok(SlotPhase::Active { remaining_ms })
                } else {
                    Ok(SlotPhase::Complete)
                }
            }
        }
    }

    /// Reward for a running slot at the character's current level
    fn payout_of(&self, slot: &ExpeditionSlot) -> Result<u64> {
        match slot {
            ExpeditionSlot::Idle => Err(Error::SlotEmpty(0)),
            ExpeditionSlot::Running { character, expedition, .. } => {
                let def = self
                    .content()
                    .expedition(expedition)
                    .ok_or_else(|| Error::UnknownContent(expedition.clone()))?;
                let grade = self.content().grade_of(character)?;
                let level = self.enhancement(character)?.level;
                Ok(expedition_reward(def.base_reward, grade.reward_multiplier, level))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testkit::funded_engine;
    use crate::EnhanceOutcome;
    use gashapon_core::records::Enhancement;

    fn taro() -> CharId {
        CharId::new("taro")
    }

    fn mochi() -> CharId {
        CharId::new("mochi")
    }

    #[test]
    fn test_start_and_phase_transitions() {
        let mut engine = funded_engine();
        engine.start_expedition(0, &taro(), "forest").unwrap();

        match engine.slot_view(0).unwrap().phase {
            SlotPhase::Active { remaining_ms } => assert_eq!(remaining_ms, 30 * 60_000),
            other => panic!("expected active, got {other:?}"),
        }

        engine.clock_mut().advance_minutes(30);
        assert_eq!(engine.slot_view(0).unwrap().phase, SlotPhase::Complete);
    }

    #[test]
    fn test_collect_before_maturity_rejected() {
        let mut engine = funded_engine();
        engine.start_expedition(0, &taro(), "forest").unwrap();
        engine.clock_mut().advance_minutes(29);
        assert!(matches!(
            engine.collect_expedition(0),
            Err(Error::ExpeditionNotComplete { .. })
        ));
        // Slot unchanged
        assert!(!engine.slot_view(0).unwrap().slot.is_idle());
    }

    #[test]
    fn test_collect_pays_scaled_reward_and_frees_slot() {
        let mut engine = funded_engine();
        let coins_before = engine.wallet().unwrap().coins;

        engine.start_expedition(0, &taro(), "forest").unwrap();
        engine.clock_mut().advance_minutes(31);

        // taro is rare: 250 base x5 multiplier at level 0
        let payout = engine.collect_expedition(0).unwrap();
        assert_eq!(payout, 1250);
        assert_eq!(engine.wallet().unwrap().coins, coins_before + 1250);
        assert!(engine.slot_view(0).unwrap().slot.is_idle());

        // A freed character can go out again
        engine.start_expedition(1, &taro(), "volcano").unwrap();
    }

    #[test]
    fn test_enhancing_mid_expedition_raises_payout() {
        let mut engine = funded_engine();
        engine.start_expedition(0, &taro(), "forest").unwrap();
        assert_eq!(engine.preview_reward(0).unwrap(), 1250);

        // Credit duplicates and push taro to level 3 while away
        let key = scoped_key::<Enhancement>(&taro());
        let loaded = engine.store().load::<Enhancement>(&key).unwrap();
        engine
            .store()
            .save(&key, &Enhancement { level: 0, duplicates: 6 }, loaded.version)
            .unwrap();
        for _ in 0..3 {
            assert!(matches!(engine.enhance(&taro()), Ok(EnhanceOutcome::Enhanced { .. })));
        }

        // 250 x 5 x 1.6
        assert_eq!(engine.preview_reward(0).unwrap(), 2000);
        engine.clock_mut().advance_minutes(30);
        assert_eq!(engine.collect_expedition(0).unwrap(), 2000);
    }

    #[test]
    fn test_character_occupies_at_most_one_slot() {
        let mut engine = funded_engine();
        engine.start_expedition(0, &taro(), "forest").unwrap();

        // Second slot, same character
        assert!(matches!(
            engine.start_expedition(1, &taro(), "volcano"),
            Err(Error::CharacterOnExpedition(_))
        ));

        // Still busy after maturing, until collected
        engine.clock_mut().advance_minutes(40);
        assert!(matches!(
            engine.start_expedition(1, &taro(), "volcano"),
            Err(Error::CharacterOnExpedition(_))
        ));

        engine.collect_expedition(0).unwrap();
        engine.start_expedition(1, &taro(), "volcano").unwrap();
    }

    #[test]
    fn test_busy_slot_rejected() {
        let mut engine = funded_engine();
        engine.start_expedition(0, &taro(), "forest").unwrap();
        assert!(matches!(
            engine.start_expedition(0, &mochi(), "forest"),
            Err(Error::SlotBusy(0))
        ));
    }

    #[test]
    fn test_equipped_character_cannot_leave() {
        let mut engine = funded_engine();
        engine.select_character(&taro()).unwrap();
        assert!(matches!(
            engine.start_expedition(0, &taro(), "forest"),
            Err(Error::CharacterSelected(_))
        ));

        // And the reverse: an away character cannot be equipped
        engine.start_expedition(0, &mochi(), "forest").unwrap();
        assert!(matches!(
            engine.select_character(&mochi()),
            Err(Error::CharacterOnExpedition(_))
        ));
    }

    #[test]
    fn test_collect_idle_slot_rejected() {
        let mut engine = funded_engine();
        assert!(matches!(engine.collect_expedition(2), Err(Error::SlotEmpty(2))));
        assert!(matches!(engine.collect_expedition(9), Err(Error::NoSuchSlot(9))));
    }
}
