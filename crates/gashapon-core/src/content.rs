//! Static game-content tables
//!
//! Grades, roster, quests, shop stock, expeditions, skins, board tiles, and
//! attendance rewards are data, not code: they arrive as RON supplied by
//! the surrounding product and are validated once at load. The engine only
//! ever reads them.

use crate::error::{Error, Result};
use crate::identity::{CharId, GradeId};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Base stats a grade confers on its characters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BaseStats {
    /// Score granted per tap
    pub score_per_tap: u32,
    /// Chance a tap drops a coin
    pub coin_drop_chance: f64,
    /// Chance a tap is critical
    pub crit_chance: f64,
    /// Taps endured before losing 1 hp
    pub hp_loss_interval: u32,
}

impl Default for BaseStats {
    fn default() -> Self {
        Self {
            score_per_tap: 1,
            coin_drop_chance: 0.1,
            crit_chance: 0.05,
            hp_loss_interval: 10,
        }
    }
}

/// Per-level stat increments applied on top of [`BaseStats`]
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StatGrowth {
    pub score_per_tap: u32,
    pub coin_drop_chance: f64,
    pub crit_chance: f64,
    /// Extra taps endured per level (a higher interval loses hp more slowly)
    pub hp_loss_interval: u32,
}

/// Definition of a rarity grade
///
/// Declared order in the content file is the order the weighted roll walks,
/// and reward multipliers must not decrease along it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GradeDef {
    /// Unique identifier for this grade
    pub id: GradeId,
    /// Display name
    #[serde(default)]
    pub name: String,
    /// Roll weight; probability is weight / total
    pub weight: u32,
    /// Expedition reward multiplier
    #[serde(default = "default_multiplier")]
    pub reward_multiplier: u32,
    /// Stats at enhancement level 0
    #[serde(default)]
    pub base: BaseStats,
    /// Per-enhancement-level increments
    #[serde(default)]
    pub growth: StatGrowth,
}

fn default_multiplier() -> u32 {
    1
}

/// Definition of a roster character
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CharacterDef {
    /// Unique identifier for this character
    pub id: CharId,
    /// Display name
    #[serde(default)]
    pub name: String,
    /// The grade this character rolls and scores under
    pub grade: GradeId,
}

/// A bundle of granted resources
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Reward {
    pub coins: u64,
    pub medals: u64,
    pub dice: u32,
}

impl Reward {
    /// A coins-only reward
    pub fn coins(coins: u64) -> Self {
        Self { coins, ..Self::default() }
    }

    /// True when nothing is granted
    pub fn is_empty(&self) -> bool {
        self.coins == 0 && self.medals == 0 && self.dice == 0
    }
}

/// Progress metrics quests count
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Metric {
    Taps,
    Rolls,
    Expeditions,
    BoardMoves,
    Purchases,
}

/// Which reset cycle a quest belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CycleKind {
    Daily,
    Weekly,
}

/// Definition of a daily or weekly quest
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuestDef {
    /// Unique identifier for this quest
    pub id: String,
    /// Display name
    #[serde(default)]
    pub name: String,
    /// Reset cycle
    pub cycle: CycleKind,
    /// Counted metric
    pub metric: Metric,
    /// Counter value required before the reward can be claimed
    pub goal: u32,
    /// Reward granted on claim
    #[serde(default)]
    pub reward: Reward,
}

/// Definition of a shop item with a weekly purchase cap
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShopItemDef {
    /// Unique identifier for this item
    pub id: String,
    /// Display name
    #[serde(default)]
    pub name: String,
    /// Price in coins
    #[serde(default)]
    pub cost_coins: u64,
    /// Price in medals
    #[serde(default)]
    pub cost_medals: u64,
    /// Purchases allowed per week
    pub weekly_limit: u32,
    /// Resources granted on purchase
    #[serde(default)]
    pub grants: Reward,
    /// Skin granted on purchase, if any
    #[serde(default)]
    pub skin: Option<String>,
}

/// Definition of a cosmetic skin bound to one character
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SkinDef {
    /// Unique identifier for this skin
    pub id: String,
    /// Display name
    #[serde(default)]
    pub name: String,
    /// The character this skin fits
    pub character: CharId,
}

/// Definition of a timed expedition
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExpeditionDef {
    /// Unique identifier for this expedition
    pub id: String,
    /// Display name
    #[serde(default)]
    pub name: String,
    /// Wall-clock minutes until the reward matures
    pub duration_minutes: u32,
    /// Base coin reward before grade and enhancement scaling
    pub base_reward: u64,
}

impl ExpeditionDef {
    /// Duration in milliseconds
    pub fn duration_ms(&self) -> i64 {
        self.duration_minutes as i64 * 60_000
    }
}

/// Definition of an achievement
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AchievementDef {
    /// Unique identifier for this achievement
    pub id: String,
    /// Display name
    #[serde(default)]
    pub name: String,
    /// Reward granted on first unlock
    #[serde(default)]
    pub reward: Reward,
}

/// One weighted entry in the board tile table
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TileDef {
    /// Generation weight
    pub weight: u32,
    /// Reward granted when a move lands here
    #[serde(default)]
    pub reward: Reward,
}

/// Board mini-game configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BoardConfig {
    /// Tiles per generated board
    pub length: u32,
    /// Die faces for a move roll
    pub dice_sides: u32,
    /// Weighted tile table the board is generated from
    pub tiles: Vec<TileDef>,
    /// Bonus paid when the end of the board is reached
    pub completion: Reward,
}

impl Default for BoardConfig {
    fn default() -> Self {
        Self {
            length: 24,
            dice_sides: 6,
            tiles: vec![TileDef { weight: 1, reward: Reward::default() }],
            completion: Reward::default(),
        }
    }
}

/// Raw content file as deserialized from RON
///
/// Every section defaults to empty so partial files parse; validation of
/// cross-references happens in [`ContentDb::from_file`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ContentFile {
    pub grades: Vec<GradeDef>,
    pub characters: Vec<CharacterDef>,
    pub quests: Vec<QuestDef>,
    pub shop: Vec<ShopItemDef>,
    pub skins: Vec<SkinDef>,
    pub expeditions: Vec<ExpeditionDef>,
    pub achievements: Vec<AchievementDef>,
    /// Reward for attendance day N is entry `min(N-1, len-1)`
    pub attendance_rewards: Vec<Reward>,
    pub board: BoardConfig,
    /// Price of one gacha roll, in coins
    pub roll_cost_coins: u64,
    /// Number of expedition slots
    pub expedition_slots: u32,
}

/// Validated, indexed game content
#[derive(Debug, Clone)]
pub struct ContentDb {
    grades: IndexMap<GradeId, GradeDef>,
    characters: IndexMap<CharId, CharacterDef>,
    quests: IndexMap<String, QuestDef>,
    shop: IndexMap<String, ShopItemDef>,
    skins: IndexMap<String, SkinDef>,
    expeditions: IndexMap<String, ExpeditionDef>,
    achievements: IndexMap<String, AchievementDef>,
    attendance_rewards: Vec<Reward>,
    board: BoardConfig,
    roll_cost_coins: u64,
    expedition_slots: u32,
}

impl ContentDb {
    /// Parse and validate content from a RON string
    pub fn from_ron_str(content: &str) -> Result<Self> {
        let file: ContentFile = ron::from_str(content)?;
        Self::from_file(file)
    }

    /// Load and validate content from a RON file
    pub fn load_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Self::from_ron_str(&content)
    }

    /// Validate a raw content file and build the indexed tables
    pub fn from_file(file: ContentFile) -> Result<Self> {
        if file.grades.is_empty() {
            return Err(Error::InvalidContent("no grades defined".into()));
        }

        let mut grades = IndexMap::new();
        let mut last_multiplier = 0u32;
        for grade in file.grades {
            if grade.reward_multiplier < last_multiplier {
                return Err(Error::InvalidContent(format!(
                    "grade '{}' lowers the reward multiplier",
                    grade.id
                )));
            }
            last_multiplier = grade.reward_multiplier;
            let id = grade.id.clone();
            if grades.insert(id.clone(), grade).is_some() {
                return Err(Error::DuplicateDefinition(id.to_string()));
            }
        }
        if grades.values().map(|g| g.weight as u64).sum::<u64>() == 0 {
            return Err(Error::InvalidContent("total grade weight is zero".into()));
        }

        let mut characters = IndexMap::new();
        for character in file.characters {
            if !grades.contains_key(&character.grade) {
                return Err(Error::UnknownGrade(character.grade.to_string()));
            }
            let id = character.id.clone();
            if characters.insert(id.clone(), character).is_some() {
                return Err(Error::DuplicateDefinition(id.to_string()));
            }
        }

        let mut skins = IndexMap::new();
        for skin in file.skins {
            if !characters.contains_key(&skin.character) {
                return Err(Error::UnknownCharacter(skin.character.to_string()));
            }
            let id = skin.id.clone();
            if skins.insert(id.clone(), skin).is_some() {
                return Err(Error::DuplicateDefinition(id));
            }
        }

        let mut quests = IndexMap::new();
        for quest in file.quests {
            if quest.goal == 0 {
                return Err(Error::InvalidContent(format!("quest '{}' has goal 0", quest.id)));
            }
            let id = quest.id.clone();
            if quests.insert(id.clone(), quest).is_some() {
                return Err(Error::DuplicateDefinition(id));
            }
        }

        let mut shop = IndexMap::new();
        for item in file.shop {
            if let Some(skin) = &item.skin {
                if !skins.contains_key(skin) {
                    return Err(Error::InvalidContent(format!(
                        "shop item '{}' grants unknown skin '{}'",
                        item.id, skin
                    )));
                }
            }
            if item.weekly_limit == 0 {
                return Err(Error::InvalidContent(format!(
                    "shop item '{}' can never be purchased",
                    item.id
                )));
            }
            let id = item.id.clone();
            if shop.insert(id.clone(), item).is_some() {
                return Err(Error::DuplicateDefinition(id));
            }
        }

        let mut expeditions = IndexMap::new();
        for expedition in file.expeditions {
            if expedition.duration_minutes == 0 {
                return Err(Error::InvalidContent(format!(
                    "expedition '{}' has zero duration",
                    expedition.id
                )));
            }
            let id = expedition.id.clone();
            if expeditions.insert(id.clone(), expedition).is_some() {
                return Err(Error::DuplicateDefinition(id));
            }
        }

        let mut achievements = IndexMap::new();
        for achievement in file.achievements {
            let id = achievement.id.clone();
            if achievements.insert(id.clone(), achievement).is_some() {
                return Err(Error::DuplicateDefinition(id));
            }
        }

        if file.board.length < 2 {
            return Err(Error::InvalidContent("board shorter than 2 tiles".into()));
        }
        if file.board.dice_sides < 2 {
            return Err(Error::InvalidContent("die needs at least 2 sides".into()));
        }
        if file.board.tiles.iter().map(|t| t.weight as u64).sum::<u64>() == 0 {
            return Err(Error::InvalidContent("board tile table has no weight".into()));
        }

        Ok(Self {
            grades,
            characters,
            quests,
            shop,
            skins,
            expeditions,
            achievements,
            attendance_rewards: file.attendance_rewards,
            board: file.board,
            roll_cost_coins: file.roll_cost_coins,
            expedition_slots: if file.expedition_slots == 0 { 3 } else { file.expedition_slots },
        })
    }

    /// Grades in declared order
    pub fn grades(&self) -> impl Iterator<Item = &GradeDef> {
        self.grades.values()
    }

    /// Look up a grade
    pub fn grade(&self, id: &GradeId) -> Option<&GradeDef> {
        self.grades.get(id)
    }

    /// Look up a character
    pub fn character(&self, id: &CharId) -> Option<&CharacterDef> {
        self.characters.get(id)
    }

    /// The grade definition of a character
    pub fn grade_of(&self, id: &CharId) -> Result<&GradeDef> {
        let character = self
            .characters
            .get(id)
            .ok_or_else(|| Error::UnknownCharacter(id.to_string()))?;
        self.grades
            .get(&character.grade)
            .ok_or_else(|| Error::UnknownGrade(character.grade.to_string()))
    }

    /// The whole roster in declared order
    pub fn roster(&self) -> Vec<&CharacterDef> {
        self.characters.values().collect()
    }

    /// Characters belonging to one grade
    pub fn pool_of(&self, grade: &GradeId) -> Vec<&CharacterDef> {
        self.characters.values().filter(|c| &c.grade == grade).collect()
    }

    /// Roll weights aligned with [`Self::grades`] order
    pub fn grade_weights(&self) -> Vec<u32> {
        self.grades.values().map(|g| g.weight).collect()
    }

    /// Look up a quest
    pub fn quest(&self, id: &str) -> Option<&QuestDef> {
        self.quests.get(id)
    }

    /// Quests belonging to one cycle, declared order
    pub fn quests_in(&self, cycle: CycleKind) -> impl Iterator<Item = &QuestDef> {
        self.quests.values().filter(move |q| q.cycle == cycle)
    }

    /// Look up a shop item
    pub fn shop_item(&self, id: &str) -> Option<&ShopItemDef> {
        self.shop.get(id)
    }

    /// Look up a skin
    pub fn skin(&self, id: &str) -> Option<&SkinDef> {
        self.skins.get(id)
    }

    /// Look up an expedition
    pub fn expedition(&self, id: &str) -> Option<&ExpeditionDef> {
        self.expeditions.get(id)
    }

    /// Look up an achievement
    pub fn achievement(&self, id: &str) -> Option<&AchievementDef> {
        self.achievements.get(id)
    }

    /// Attendance reward for a streak of `consecutive_days`
    pub fn attendance_reward(&self, consecutive_days: u32) -> Reward {
        if self.attendance_rewards.is_empty() {
            return Reward::default();
        }
        let index = (consecutive_days.max(1) as usize - 1).min(self.attendance_rewards.len() - 1);
        self.attendance_rewards[index]
    }

    /// Board configuration
    pub fn board(&self) -> &BoardConfig {
        &self.board
    }

    /// Price of one gacha roll, in coins
    pub fn roll_cost_coins(&self) -> u64 {
        self.roll_cost_coins
    }

    /// Number of expedition slots
    pub fn expedition_slots(&self) -> u32 {
        self.expedition_slots
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimal_content_ron() {
        let content = r#"
        (
            grades: [
                (id: "common", weight: 70),
                (id: "rare", weight: 25, reward_multiplier: 3),
                (id: "epic", weight: 5, reward_multiplier: 10),
            ],
            characters: [
                (id: "mochi", name: "Mochi", grade: "common"),
                (id: "taro", name: "Taro", grade: "rare"),
            ],
            roll_cost_coins: 100,
        )
        "#;

        let db = ContentDb::from_ron_str(content).unwrap();
        assert_eq!(db.grades().count(), 3);
        assert_eq!(db.grade_weights(), vec![70, 25, 5]);
        assert_eq!(db.roll_cost_coins(), 100);
        assert_eq!(db.expedition_slots(), 3);
        assert_eq!(db.grade_of(&CharId::new("taro")).unwrap().reward_multiplier, 3);
        assert!(db.pool_of(&GradeId::new("epic")).is_empty());
    }

    #[test]
    fn test_rejects_empty_grades() {
        assert!(ContentDb::from_file(ContentFile::default()).is_err());
    }

    #[test]
    fn test_rejects_unknown_grade_reference() {
        let file = ContentFile {
            grades: vec![GradeDef {
                id: GradeId::new("common"),
                name: String::new(),
                weight: 1,
                reward_multiplier: 1,
                base: BaseStats::default(),
                growth: StatGrowth::default(),
            }],
            characters: vec![CharacterDef {
                id: CharId::new("ghost"),
                name: String::new(),
                grade: GradeId::new("mythic"),
            }],
            ..ContentFile::default()
        };
        assert!(matches!(ContentDb::from_file(file), Err(Error::UnknownGrade(_))));
    }

    #[test]
    fn test_rejects_decreasing_multiplier() {
        let grade = |id: &str, weight, mult| GradeDef {
            id: GradeId::new(id),
            name: String::new(),
            weight,
            reward_multiplier: mult,
            base: BaseStats::default(),
            growth: StatGrowth::default(),
        };
        let file = ContentFile {
            grades: vec![grade("a", 1, 5), grade("b", 1, 2)],
            ..ContentFile::default()
        };
        assert!(ContentDb::from_file(file).is_err());
    }

    #[test]
    fn test_attendance_reward_saturates() {
        let content = r#"
        (
            grades: [(id: "common", weight: 1)],
            attendance_rewards: [
                (coins: 10),
                (coins: 20),
                (coins: 50),
            ],
        )
        "#;
        let db = ContentDb::from_ron_str(content).unwrap();
        assert_eq!(db.attendance_reward(1).coins, 10);
        assert_eq!(db.attendance_reward(3).coins, 50);
        // Streaks past the table reuse the last entry
        assert_eq!(db.attendance_reward(30).coins, 50);
    }
}
