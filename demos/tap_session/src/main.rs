//! Tap Session Demo
//!
//! Drives one play session end to end: roll, tap, enhance, expedition,
//! quests, attendance, shop, and the dice board, all against an in-memory
//! store with a manually advanced clock.

use chrono::NaiveDate;
use gashapon_core::{ContentDb, ManualClock, Metric, Reward};
use gashapon_db::Store;
use gashapon_engine::{Engine, EnhanceOutcome, RollOutcome};

const CONTENT: &str = r#"
(
    grades: [
        (
            id: "common",
            name: "Common",
            weight: 70,
            reward_multiplier: 1,
            base: (score_per_tap: 1, coin_drop_chance: 0.10, crit_chance: 0.02, hp_loss_interval: 10),
            growth: (score_per_tap: 1, coin_drop_chance: 0.02, crit_chance: 0.01, hp_loss_interval: 2),
        ),
        (
            id: "rare",
            name: "Rare",
            weight: 25,
            reward_multiplier: 5,
            base: (score_per_tap: 3, coin_drop_chance: 0.15, crit_chance: 0.05, hp_loss_interval: 12),
            growth: (score_per_tap: 2, coin_drop_chance: 0.03, crit_chance: 0.02, hp_loss_interval: 3),
        ),
        (
            id: "epic",
            name: "Epic",
            weight: 5,
            reward_multiplier: 10,
            base: (score_per_tap: 8, coin_drop_chance: 0.25, crit_chance: 0.10, hp_loss_interval: 15),
            growth: (score_per_tap: 4, coin_drop_chance: 0.05, crit_chance: 0.03, hp_loss_interval: 5),
        ),
    ],
    characters: [
        (id: "mochi", name: "Mochi", grade: "common"),
        (id: "kuro", name: "Kuro", grade: "common"),
        (id: "taro", name: "Taro", grade: "rare"),
        (id: "hime", name: "Hime", grade: "epic"),
    ],
    quests: [
        (id: "daily_taps", name: "Tap 10 times", cycle: Daily, metric: Taps, goal: 10, reward: (coins: 50)),
        (id: "daily_roll", name: "Roll once", cycle: Daily, metric: Rolls, goal: 1, reward: (coins: 30, dice: 1)),
        (id: "weekly_expeditions", name: "Finish 3 expeditions", cycle: Weekly, metric: Expeditions, goal: 3, reward: (medals: 5)),
    ],
    shop: [
        (id: "dice_pack", name: "Dice pack", cost_coins: 120, weekly_limit: 5, grants: (dice: 3)),
    ],
    skins: [],
    expeditions: [
        (id: "forest", name: "Forest stroll", duration_minutes: 30, base_reward: 250),
    ],
    achievements: [
        (id: "first_roll", name: "First roll", reward: (coins: 100)),
    ],
    attendance_rewards: [
        (coins: 50),
        (coins: 80),
        (coins: 120, dice: 1),
    ],
    board: (
        length: 12,
        dice_sides: 6,
        tiles: [
            (weight: 5),
            (weight: 3, reward: (coins: 20)),
            (weight: 1, reward: (coins: 60, dice: 1)),
        ],
        completion: (coins: 150, medals: 1),
    ),
    roll_cost_coins: 100,
    expedition_slots: 3,
)
"#;

fn main() {
    env_logger::init();
    println!("=== Gashapon Tap Session Demo ===\n");

    let store = Store::in_memory().expect("in-memory store");
    let content = ContentDb::from_ron_str(CONTENT).expect("valid content");
    let clock = ManualClock::starting(NaiveDate::from_ymd_opt(2026, 8, 7).expect("date"));
    let mut engine = Engine::with_clock(store, content, clock).expect("engine");

    // Starter funds and character
    engine.set_wallet(1_000, 0).expect("wallet");
    engine.grant_character(&"mochi".into()).expect("starter");
    println!("Starter: mochi, 1000 coins\n");

    // Attendance first
    let attendance = engine.claim_attendance().expect("attendance");
    println!(
        "Attendance day {}: +{} coins",
        attendance.consecutive_days, attendance.reward.coins
    );

    // A few rolls
    println!("\nRolling 5 times at 100 coins each...");
    for _ in 0..5 {
        match engine.roll().expect("roll") {
            RollOutcome::New { character, grade } => {
                println!("  NEW {} ({})", character, grade);
            }
            RollOutcome::Duplicate { character, duplicates, .. } => {
                println!("  duplicate {} (tokens: {})", character, duplicates);
            }
        }
    }
    engine.unlock_achievement("first_roll").expect("achievement");

    // Tap until the first hp loss
    println!("\nTapping mochi...");
    loop {
        let outcome = engine.record_tap(&"mochi".into()).expect("tap");
        if outcome.hp_lost {
            println!("  hp dropped to {} after a full odometer", outcome.hp);
            break;
        }
    }
    let _ = engine.claim_quest("daily_taps");
    let _ = engine.claim_quest("daily_roll");

    // Enhancement, when tokens allow
    match engine.enhance(&"mochi".into()) {
        Ok(EnhanceOutcome::Enhanced { level, .. }) => println!("\nmochi enhanced to level {level}"),
        Ok(EnhanceOutcome::AlreadyMaxed { .. }) => println!("\nmochi is already maxed"),
        Err(e) => println!("\nno enhancement today: {e}"),
    }

    // Expedition: send, wait, collect
    let away = engine
        .collection()
        .expect("collection")
        .owned
        .iter()
        .find(|id| id.as_str() != "mochi")
        .cloned();
    if let Some(away) = away {
        engine.start_expedition(0, &away, "forest").expect("start");
        println!("\n{} left for the forest (30 min)", away);
        engine.clock_mut().advance_minutes(31);
        let payout = engine.collect_expedition(0).expect("collect");
        println!("{} returned with {} coins", away, payout);
    }

    // Dice board
    engine.credit_reward(Reward { dice: 3, ..Reward::default() }).expect("dice");
    println!("\nRolling the board with 3 dice...");
    while let Ok(outcome) = engine.roll_dice() {
        println!(
            "  rolled {} -> tile {} (+{} coins){}",
            outcome.rolled,
            outcome.position,
            outcome.tile_reward.coins,
            if outcome.completed { " BOARD COMPLETE" } else { "" }
        );
    }

    // Shop
    if engine.purchase("dice_pack").is_ok() {
        println!("\nBought a dice pack");
    }

    let wallet = engine.wallet().expect("wallet");
    let log = engine.quest_progress().expect("quests");
    println!("\n=== End of session ===");
    println!("coins: {}, medals: {}", wallet.coins, wallet.medals);
    println!(
        "daily taps: {}, daily rolls: {}",
        log.daily.counter(Metric::Taps),
        log.daily.counter(Metric::Rolls)
    );
}
