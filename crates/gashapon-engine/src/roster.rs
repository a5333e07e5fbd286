//! Collection, selection, and skins
//!
//! The collection only ever grows. Selection and skin equipment reference
//! into it, and a character tied up in an expedition slot cannot be
//! equipped - the contradictory state is rejected here, not left to the
//! UI.

use crate::error::{Error, Result};
use crate::Engine;
use gashapon_core::records::{scoped_key, Collection, Selected, SkinCloset};
use gashapon_core::{CharId, Clock, Persist};

impl<C: Clock> Engine<C> {
    /// Owned characters
    pub fn collection(&self) -> Result<Collection> {
        Ok(self.store().load::<Collection>(Collection::KIND)?.record)
    }

    /// Add a character to the collection outside the gacha path
    ///
    /// Used for starter and tutorial grants. Idempotent; returns false
    /// when the character was already owned.
    pub fn grant_character(&mut self, id: &CharId) -> Result<bool> {
        self.content().grade_of(id)?;
        self.with_retry(|engine| {
            let loaded = engine.store().load::<Collection>(Collection::KIND)?;
            let mut collection = loaded.record;
            if !collection.owned.insert(id.clone()) {
                return Ok(false);
            }
            engine.store().save(Collection::KIND, &collection, loaded.version)?;
            Ok(true)
        })
    }

    /// The currently equipped character
    pub fn selected(&self) -> Result<Option<CharId>> {
        Ok(self.store().load::<Selected>(Selected::KIND)?.record.character)
    }

    /// Equip a character
    ///
    /// The character must be collected and must not be away on an
    /// expedition.
    pub fn select_character(&mut self, id: &CharId) -> Result<()> {
        self.require_collected(id)?;
        if let Some(slot) = self.slot_holding(id)? {
            log::debug!("refusing to equip '{id}': busy in slot {slot}");
            return Err(Error::CharacterOnExpedition(id.clone()));
        }
        self.with_retry(|engine| {
            let loaded = engine.store().load::<Selected>(Selected::KIND)?;
            let selected = Selected { character: Some(id.clone()) };
            engine.store().save(Selected::KIND, &selected, loaded.version)?;
            Ok(())
        })
    }

    /// Owned skins and per-character equipment
    pub fn skins(&self) -> Result<SkinCloset> {
        Ok(self.store().load::<SkinCloset>(SkinCloset::KIND)?.record)
    }

    /// Equip an owned skin on the character it was made for
    pub fn equip_skin(&mut self, id: &CharId, skin_id: &str) -> Result<()> {
        let def = self
            .content()
            .skin(skin_id)
            .ok_or_else(|| Error::UnknownContent(skin_id.to_string()))?;
        if &def.character != id {
            return Err(Error::SkinMismatch { skin: skin_id.to_string(), character: id.clone() });
        }
        self.require_collected(id)?;
        self.with_retry(|engine| {
            let loaded = engine.store().load::<SkinCloset>(SkinCloset::KIND)?;
            let mut closet = loaded.record;
            if !closet.owned.contains(skin_id) {
                return Err(Error::SkinNotOwned(skin_id.to_string()));
            }
            closet.equipped.insert(id.clone(), skin_id.to_string());
            engine.store().save(SkinCloset::KIND, &closet, loaded.version)?;
            Ok(())
        })
    }

    /// Reject characters outside the collection
    pub(crate) fn require_collected(&self, id: &CharId) -> Result<()> {
        self.content().grade_of(id)?;
        let collection = self.collection()?;
        if !collection.owned.contains(id) {
            return Err(Error::NotCollected(id.clone()));
        }
        Ok(())
    }

    /// Index of the slot a character is away in, if any
    pub(crate) fn slot_holding(&self, id: &CharId) -> Result<Option<u32>> {
        use gashapon_core::records::ExpeditionSlot;
        for index in 0..self.content().expedition_slots() {
            let slot = self
                .store()
                .load::<ExpeditionSlot>(&scoped_key::<ExpeditionSlot>(index))?
                .record;
            if slot.character() == Some(id) {
                return Ok(Some(index));
            }
        }
        Ok(None)
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
    fn test_grant_is_idempotent() {
        let mut engine = funded_engine();
        // mochi was granted by the fixture
        assert!(!engine.grant_character(&mochi()).unwrap());
        assert!(engine.grant_character(&CharId::new("hime")).unwrap());
        assert_eq!(engine.collection().unwrap().owned.len(), 3);
    }

    #[test]
    fn test_select_requires_collection_membership() {
        let mut engine = funded_engine();
        assert!(matches!(
            engine.select_character(&CharId::new("hime")),
            Err(Error::NotCollected(_))
        ));

        engine.select_character(&mochi()).unwrap();
        assert_eq!(engine.selected().unwrap(), Some(mochi()));
    }

    #[test]
    fn test_equip_skin_checks_ownership_and_fit() {
        let mut engine = funded_engine();

        // Not owned yet
        assert!(matches!(
            engine.equip_skin(&mochi(), "party_hat"),
            Err(Error::SkinNotOwned(_))
        ));

        // Buy it, then equip
        engine.purchase("mochi_hat").unwrap();
        engine.equip_skin(&mochi(), "party_hat").unwrap();
        let closet = engine.skins().unwrap();
        assert_eq!(closet.equipped.get(&mochi()).map(String::as_str), Some("party_hat"));

        // A skin cut for taro never fits mochi
        assert!(matches!(
            engine.equip_skin(&mochi(), "raincoat"),
            Err(Error::SkinMismatch { .. })
        ));
    }

    #[test]
    fn test_selected_character_survives_reload() {
        let mut engine = funded_engine();
        engine.select_character(&mochi()).unwrap();
        // Fresh read straight from the store
        let selected = engine.store().load::<Selected>(Selected::KIND).unwrap().record;
        assert_eq!(selected.character, Some(mochi()));
    }
}
