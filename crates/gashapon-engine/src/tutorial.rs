//! Tutorial progression
//!
//! A small linear machine persisted so a restart resumes mid-tutorial.
//! Step 0 is inactive/complete. Transitions are driven by named UI events;
//! an event that does not match the current step is a no-op. If the stored
//! target character is ever missing from the collection at the step that
//! needs it, the tutorial fails open and skips rather than deadlocking the
//! player.

use crate::error::{Error, Result};
use crate::Engine;
use gashapon_core::records::{Collection, Tutorial};
use gashapon_core::{CharId, Clock, Persist};
use gashapon_db::PendingWrite;

/// UI events that drive the tutorial forward
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TutorialEvent {
    /// Start the tutorial around a target character
    Begin { target: CharId },
    /// The player opened the gacha menu (step 1 -> 2)
    OpenedGacha,
    /// The player performed a roll (step 2 -> 3, grants the target)
    RolledOnce,
    /// The player equipped the target character (step 3 -> complete)
    EquippedTarget,
}

impl<C: Clock> Engine<C> {
    /// Tutorial state, with the fail-open repair applied
    pub fn tutorial(&mut self) -> Result<Tutorial> {
        self.with_retry(|engine| {
            let loaded = engine.store().load::<Tutorial>(Tutorial::KIND)?;
            let mut record = loaded.record;
            if engine.tutorial_is_stuck(&record)? {
                log::warn!("tutorial target missing from collection; skipping");
                record = Tutorial::default();
                engine.store().save(Tutorial::KIND, &record, loaded.version)?;
            }
            Ok(record)
        })
    }

    /// Feed one UI event into the tutorial machine
    ///
    /// Returns the step after the event; an event that does not fit the
    /// current step leaves the state untouched.
    pub fn tutorial_event(&mut self, event: TutorialEvent) -> Result<u8> {
        if let TutorialEvent::Begin { target } = &event {
            self.content().grade_of(target)?;
        }
        self.with_retry(|engine| {
            let loaded = engine.store().load::<Tutorial>(Tutorial::KIND)?;
            let mut record = loaded.record;

            if engine.tutorial_is_stuck(&record)? {
                log::warn!("tutorial target missing from collection; skipping");
                engine.store().save(Tutorial::KIND, &Tutorial::default(), loaded.version)?;
                return Ok(0);
            }

            let mut writes = Vec::new();
            match (record.step, &event) {
                (0, TutorialEvent::Begin { target }) => {
                    record.step = 1;
                    record.target = Some(target.clone());
                }
                (1, TutorialEvent::OpenedGacha) => {
                    record.step = 2;
                }
                (2, TutorialEvent::RolledOnce) => {
                    // The target joins the collection here, so the equip
                    // step can always be satisfied
                    let target = record.target.clone().ok_or_else(|| {
                        Error::UnknownContent("tutorial target".to_string())
                    })?;
                    let collection_loaded = engine.store().load::<Collection>(Collection::KIND)?;
                    let mut collection = collection_loaded.record;
                    if collection.owned.insert(target) {
                        writes.push(PendingWrite::new(
                            Collection::KIND,
                            &collection,
                            collection_loaded.version,
                        )?);
                    }
                    record.step = 3;
                }
                (3, TutorialEvent::EquippedTarget) => {
                    // Only complete when the target really is equipped
                    if engine.selected()? != record.target {
                        return Ok(record.step);
                    }
                    record = Tutorial::default();
                }
                // Anything else is out of order
                _ => return Ok(record.step),
            }

            writes.push(PendingWrite::new(Tutorial::KIND, &record, loaded.version)?);
            engine.commit(writes)?;
            Ok(record.step)
        })
    }

    /// True when the machine sits at a step whose target is gone
    fn tutorial_is_stuck(&self, record: &Tutorial) -> Result<bool> {
        if record.step != 3 {
            return Ok(false);
        }
        match &record.target {
            None => Ok(true),
            Some(target) => Ok(!self.collection()?.owned.contains(target)),
        }
    }
}
