//! Durable player-state records
//!
//! One struct per persisted entity. Every field defaults when absent so
//! records written by older app versions keep decoding, and unknown fields
//! from newer versions are ignored. `normalize` runs on every load and
//! clamps whatever a corrupt or hand-edited record might contain; stored
//! invariants are never trusted as-is.

use crate::content::{Metric, Reward};
use crate::identity::CharId;
use chrono::NaiveDate;
use indexmap::IndexMap;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt::Display;

/// A record type the entity store can load and save
///
/// `KIND` doubles as the storage key for global records; per-character and
/// per-slot records append an identifier via [`scoped_key`].
pub trait Persist: Serialize + DeserializeOwned + Default {
    /// Key namespace for this record type
    const KIND: &'static str;

    /// Repair out-of-range values after decoding
    fn normalize(&mut self) {}
}

/// Storage key for a record scoped to one entity (`"vitality:mochi"`)
pub fn scoped_key<R: Persist>(id: impl Display) -> String {
    format!("{}:{}", R::KIND, id)
}

/// Hard ceiling for character vitality
pub const MAX_HP: i32 = 100;

/// Currency balances
///
/// Balances are absolute values; operations write the new total rather
/// than a delta, and the unsigned type rules out negatives by construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Wallet {
    pub coins: u64,
    pub medals: u64,
}

impl Persist for Wallet {
    const KIND: &'static str = "wallet";
}

impl Wallet {
    /// Apply a reward's currency portion
    pub fn credit(&mut self, reward: &Reward) {
        self.coins = self.coins.saturating_add(reward.coins);
        self.medals = self.medals.saturating_add(reward.medals);
    }

    /// True when both prices are affordable
    pub fn can_afford(&self, coins: u64, medals: u64) -> bool {
        self.coins >= coins && self.medals >= medals
    }
}

/// Owned character set; membership only ever grows
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Collection {
    pub owned: BTreeSet<CharId>,
}

impl Persist for Collection {
    const KIND: &'static str = "collection";
}

/// The currently equipped character
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Selected {
    pub character: Option<CharId>,
}

impl Persist for Selected {
    const KIND: &'static str = "selected";
}

/// Per-character vitality with lazy regeneration bookkeeping
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Vitality {
    /// Hit points, always within `[0, MAX_HP]`
    pub hp: i32,
    /// Unix millis of the last hp-affecting write
    pub last_update_ms: i64,
    /// Taps since the last hp loss (the tap odometer)
    pub tap_count: u32,
}

impl Default for Vitality {
    fn default() -> Self {
        Self { hp: MAX_HP, last_update_ms: 0, tap_count: 0 }
    }
}

impl Persist for Vitality {
    const KIND: &'static str = "vitality";

    fn normalize(&mut self) {
        self.hp = self.hp.clamp(0, MAX_HP);
    }
}

/// Per-character enhancement level and duplicate tokens
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Enhancement {
    pub level: u8,
    pub duplicates: u32,
}

impl Persist for Enhancement {
    const KIND: &'static str = "enhance";

    fn normalize(&mut self) {
        self.level = self.level.min(crate::economy::MAX_ENHANCE_LEVEL);
    }
}

/// Unlocked achievement set; monotonic
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Achievements {
    pub unlocked: BTreeSet<String>,
}

impl Persist for Achievements {
    const KIND: &'static str = "achievements";
}

/// Counters and claim flags for one reset cycle
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CycleProgress {
    /// Metric counters accumulated this cycle
    pub counters: IndexMap<Metric, u32>,
    /// Quest IDs already claimed this cycle
    pub claimed: BTreeSet<String>,
    /// Boundary identifier (date or week start) the data belongs to
    pub boundary: Option<NaiveDate>,
}

impl CycleProgress {
    /// Zero everything and stamp a new boundary
    pub fn reset_to(&mut self, boundary: NaiveDate) {
        self.counters.clear();
        self.claimed.clear();
        self.boundary = Some(boundary);
    }

    /// Counter value for a metric
    pub fn counter(&self, metric: Metric) -> u32 {
        self.counters.get(&metric).copied().unwrap_or(0)
    }

    /// Add to a metric counter
    pub fn bump(&mut self, metric: Metric, amount: u32) {
        let slot = self.counters.entry(metric).or_insert(0);
        *slot = slot.saturating_add(amount);
    }
}

/// Daily and weekly quest progress
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct QuestLog {
    pub daily: CycleProgress,
    pub weekly: CycleProgress,
}

impl Persist for QuestLog {
    const KIND: &'static str = "quests";
}

/// Login-streak state
///
/// `claimed_today` from the original data model is derived from
/// `last_claim`, so the flag can never disagree with the date behind it.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Attendance {
    pub consecutive_days: u32,
    pub last_claim: Option<NaiveDate>,
}

impl Attendance {
    /// Whether today's reward was already taken
    pub fn claimed_on(&self, today: NaiveDate) -> bool {
        self.last_claim == Some(today)
    }
}

impl Persist for Attendance {
    const KIND: &'static str = "attendance";

    fn normalize(&mut self) {
        if self.last_claim.is_some() {
            self.consecutive_days = self.consecutive_days.max(1);
        }
    }
}

/// Weekly shop purchase counters
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ShopLedger {
    /// Week the counters belong to
    pub week_start: Option<NaiveDate>,
    /// Item ID -> purchases made this week
    pub purchased: IndexMap<String, u32>,
}

impl ShopLedger {
    /// Purchases of one item this week
    pub fn count(&self, item: &str) -> u32 {
        self.purchased.get(item).copied().unwrap_or(0)
    }
}

impl Persist for ShopLedger {
    const KIND: &'static str = "shop";
}

/// One expedition slot
///
/// Only `Idle` and `Running` are stored; whether a running expedition is
/// still active or already complete is derived from elapsed time on read,
/// so a slot can never be stuck in a stale phase.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ExpeditionSlot {
    #[default]
    Idle,
    Running {
        character: CharId,
        /// Content ID of the expedition being run
        expedition: String,
        /// Unix millis at departure
        started_ms: i64,
    },
}

impl ExpeditionSlot {
    /// The character tied up in this slot, if any
    pub fn character(&self) -> Option<&CharId> {
        match self {
            ExpeditionSlot::Idle => None,
            ExpeditionSlot::Running { character, .. } => Some(character),
        }
    }

    /// True when the slot can take a new expedition
    pub fn is_idle(&self) -> bool {
        matches!(self, ExpeditionSlot::Idle)
    }
}

impl Persist for ExpeditionSlot {
    const KIND: &'static str = "slot";
}

/// One generated board tile
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Tile {
    pub reward: Reward,
}

/// Board mini-game state
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Board {
    /// Tile sequence for the current lifetime; regenerated on completion
    pub tiles: Vec<Tile>,
    /// Current position; only increases within one lifetime
    pub position: u32,
    /// Dice available to roll
    pub dice: u32,
}

impl Persist for Board {
    const KIND: &'static str = "board";

    fn normalize(&mut self) {
        if !self.tiles.is_empty() {
            self.position = self.position.min(self.tiles.len() as u32 - 1);
        } else {
            self.position = 0;
        }
    }
}

/// Owned skins and what each character wears
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SkinCloset {
    pub owned: BTreeSet<String>,
    pub equipped: BTreeMap<CharId, String>,
}

impl Persist for SkinCloset {
    const KIND: &'static str = "skins";

    fn normalize(&mut self) {
        // An equipped skin must come from the owned set
        let owned = self.owned.clone();
        self.equipped.retain(|_, skin| owned.contains(skin));
    }
}

/// Tutorial state machine position
///
/// Step 0 means inactive or finished; the target is the character the
/// current step expects the player to act on.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Tutorial {
    pub step: u8,
    pub target: Option<CharId>,
}

impl Persist for Tutorial {
    const KIND: &'static str = "tutorial";
}

/// Persisted RNG state, so a restored session continues the same sequence
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RngState {
    pub state: u64,
}

impl Persist for RngState {
    const KIND: &'static str = "rng";
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scoped_key() {
        assert_eq!(scoped_key::<Vitality>(&CharId::new("mochi")), "vitality:mochi");
        assert_eq!(scoped_key::<ExpeditionSlot>(2), "slot:2");
    }

    #[test]
    fn test_vitality_normalize_clamps() {
        let mut v = Vitality { hp: 250, last_update_ms: 0, tap_count: 0 };
        v.normalize();
        assert_eq!(v.hp, MAX_HP);

        let mut v = Vitality { hp: -4, last_update_ms: 0, tap_count: 0 };
        v.normalize();
        assert_eq!(v.hp, 0);
    }

    #[test]
    fn test_enhancement_normalize_caps_level() {
        let mut e = Enhancement { level: 99, duplicates: 1 };
        e.normalize();
        assert_eq!(e.level, crate::economy::MAX_ENHANCE_LEVEL);
    }

    #[test]
    fn test_skin_closet_normalize_drops_unowned() {
        let mut closet = SkinCloset::default();
        closet.owned.insert("party_hat".into());
        closet.equipped.insert(CharId::new("mochi"), "party_hat".into());
        closet.equipped.insert(CharId::new("taro"), "ghost_skin".into());
        closet.normalize();
        assert_eq!(closet.equipped.len(), 1);
        assert!(closet.equipped.contains_key(&CharId::new("mochi")));
    }

    #[test]
    fn test_cycle_progress_reset() {
        let mut cycle = CycleProgress::default();
        cycle.bump(Metric::Taps, 7);
        cycle.claimed.insert("daily_tap".into());

        let boundary = NaiveDate::from_ymd_opt(2026, 8, 7).unwrap();
        cycle.reset_to(boundary);
        assert_eq!(cycle.counter(Metric::Taps), 0);
        assert!(cycle.claimed.is_empty());
        assert_eq!(cycle.boundary, Some(boundary));
    }

    #[test]
    fn test_wallet_credit_saturates() {
        let mut wallet = Wallet { coins: u64::MAX - 1, medals: 0 };
        wallet.credit(&Reward { coins: 10, medals: 2, dice: 0 });
        assert_eq!(wallet.coins, u64::MAX);
        assert_eq!(wallet.medals, 2);
    }

    #[test]
    fn test_board_normalize_bounds_position() {
        let mut board = Board {
            tiles: vec![Tile::default(); 4],
            position: 9,
            dice: 0,
        };
        board.normalize();
        assert_eq!(board.position, 3);
    }

    #[test]
    fn test_attendance_claimed_today() {
        let today = NaiveDate::from_ymd_opt(2026, 8, 7).unwrap();
        let mut attendance = Attendance::default();
        assert!(!attendance.claimed_on(today));
        attendance.last_claim = Some(today);
        attendance.consecutive_days = 3;
        assert!(attendance.claimed_on(today));
        assert!(!attendance.claimed_on(today.succ_opt().unwrap()));
    }
}
