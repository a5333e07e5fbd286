//! The weighted gacha roll
//!
//! Grade selection walks the content table in declared order, subtracting
//! integer weights from a uniform draw; the member pick is uniform within
//! the grade's pool, falling back to the whole roster when a grade has no
//! characters. Payment, collection growth or duplicate credit, quest
//! progress, and the RNG state all land in one atomic batch.

use crate::error::{Error, Result};
use crate::Engine;
use gashapon_core::records::{scoped_key, Collection, Enhancement, Wallet};
use gashapon_core::{CharId, Clock, GradeId, Metric, Persist};
use gashapon_db::PendingWrite;

/// Result of one gacha roll
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RollOutcome {
    /// A character joined the collection
    New { character: CharId, grade: GradeId },
    /// An owned character came up again; one duplicate token credited
    Duplicate { character: CharId, grade: GradeId, duplicates: u32 },
}

impl RollOutcome {
    /// The rolled character, whichever way the roll went
    pub fn character(&self) -> &CharId {
        match self {
            RollOutcome::New { character, .. } => character,
            RollOutcome::Duplicate { character, .. } => character,
        }
    }
}

impl<C: Clock> Engine<C> {
    /// Pay for and perform one gacha roll
    pub fn roll(&mut self) -> Result<RollOutcome> {
        let cost = self.content().roll_cost_coins();
        self.with_retry(|engine| {
            let wallet_loaded = engine.store().load::<Wallet>(Wallet::KIND)?;
            let mut wallet = wallet_loaded.record;
            if wallet.coins < cost {
                return Err(Error::InsufficientCoins { needed: cost, have: wallet.coins });
            }
            wallet.coins -= cost;

            let character = engine.draw_character()?;
            let grade = engine.content().character(&character).map(|c| c.grade.clone());
            let grade = grade.ok_or_else(|| Error::UnknownContent(character.to_string()))?;

            let collection_loaded = engine.store().load::<Collection>(Collection::KIND)?;
            let mut collection = collection_loaded.record;

            let mut writes = vec![PendingWrite::new(Wallet::KIND, &wallet, wallet_loaded.version)?];
            let outcome = if collection.owned.insert(character.clone()) {
                writes.push(PendingWrite::new(
                    Collection::KIND,
                    &collection,
                    collection_loaded.version,
                )?);
                RollOutcome::New { character, grade }
            } else {
                let key = scoped_key::<Enhancement>(&character);
                let enhance_loaded = engine.store().load::<Enhancement>(&key)?;
                let mut enhancement = enhance_loaded.record;
                enhancement.duplicates = enhancement.duplicates.saturating_add(1);
                writes.push(PendingWrite::new(&key, &enhancement, enhance_loaded.version)?);
                RollOutcome::Duplicate { character, grade, duplicates: enhancement.duplicates }
            };

            writes.push(engine.quest_bump_pending(Metric::Rolls, 1)?);
            writes.push(engine.rng_pending()?);
            engine.commit(writes)?;

            log::debug!("roll: {:?}", outcome);
            Ok(outcome)
        })
    }

    /// Weighted grade pick, then a uniform member of that grade's pool
    ///
    /// An empty pool falls back to a uniform draw over the entire roster.
    fn draw_character(&mut self) -> Result<CharId> {
        let weights = self.content().grade_weights();
        let index = self
            .rng()
            .weighted_index(&weights)
            .ok_or_else(|| gashapon_core::Error::InvalidContent("no grade weight".into()))?;
        let grade = self
            .content()
            .grades()
            .nth(index)
            .map(|g| g.id.clone())
            .ok_or_else(|| gashapon_core::Error::UnknownGrade(index.to_string()))?;

        let pool: Vec<CharId> = self
            .content()
            .pool_of(&grade)
            .into_iter()
            .map(|c| c.id.clone())
            .collect();
        if let Some(id) = self.rng().pick(&pool) {
            return Ok(id.clone());
        }

        let roster: Vec<CharId> = self.content().roster().into_iter().map(|c| c.id.clone()).collect();
        match self.rng().pick(&roster) {
            Some(id) => Ok(id.clone()),
            None => Err(Error::EmptyRoster),
        }
    }

    /// Duplicate tokens and enhancement level for a character
    pub fn enhancement(&self, id: &CharId) -> Result<Enhancement> {
        self.content().grade_of(id)?;
        Ok(self
            .store()
            .load::<Enhancement>(&scoped_key::<Enhancement>(id))?
            .record)
    }
}
