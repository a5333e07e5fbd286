//! Daily/weekly quests, attendance, and achievements
//!
//! Cycle state is never reset by a scheduled job. Every read compares the
//! stored boundary identifier against the current day or week start and
//! zeroes counters and claim flags on mismatch, so the state behaves as if
//! the reset happened exactly at the boundary even when nobody observed
//! it.

use crate::error::{Error, Result};
use crate::Engine;
use gashapon_core::records::{Achievements, Attendance, CycleProgress, QuestLog};
use gashapon_core::{Clock, CycleKind, Metric, Persist, Reward};
use gashapon_db::PendingWrite;

/// Result of claiming today's attendance reward
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttendanceOutcome {
    pub consecutive_days: u32,
    pub reward: Reward,
}

/// Zero a cycle when its stored boundary no longer matches the current one
fn roll_cycle(cycle: &mut CycleProgress, boundary: chrono::NaiveDate) {
    if cycle.boundary != Some(boundary) {
        cycle.reset_to(boundary);
    }
}

impl<C: Clock> Engine<C> {
    /// Quest progress with lazy resets applied
    ///
    /// The returned view is already reset when a boundary passed; the
    /// store catches up on the next mutation.
    pub fn quest_progress(&self) -> Result<QuestLog> {
        let mut log = self.store().load::<QuestLog>(QuestLog::KIND)?.record;
        roll_cycle(&mut log.daily, self.today());
        roll_cycle(&mut log.weekly, self.this_week());
        Ok(log)
    }

    /// Count progress toward every quest watching a metric
    pub fn record_metric(&mut self, metric: Metric, amount: u32) -> Result<()> {
        self.with_retry(|engine| {
            let write = engine.quest_bump_pending(metric, amount)?;
            engine.commit(vec![write])
        })
    }

    /// Pending write that bumps a metric in both cycles, resets included
    ///
    /// Other operations fold this into their own batches so quest progress
    /// commits atomically with the action that earned it.
    pub(crate) fn quest_bump_pending(&self, metric: Metric, amount: u32) -> Result<PendingWrite> {
        let loaded = self.store().load::<QuestLog>(QuestLog::KIND)?;
        let mut log = loaded.record;
        roll_cycle(&mut log.daily, self.today());
        roll_cycle(&mut log.weekly, self.this_week());
        log.daily.bump(metric, amount);
        log.weekly.bump(metric, amount);
        Ok(PendingWrite::new(QuestLog::KIND, &log, loaded.version)?)
    }

    /// Claim a quest's reward, once per cycle
    pub fn claim_quest(&mut self, quest_id: &str) -> Result<Reward> {
        let def = self
            .content()
            .quest(quest_id)
            .ok_or_else(|| Error::UnknownContent(quest_id.to_string()))?
            .clone();

        self.with_retry(|engine| {
            let loaded = engine.store().load::<QuestLog>(QuestLog::KIND)?;
            let mut log = loaded.record;
            roll_cycle(&mut log.daily, engine.today());
            roll_cycle(&mut log.weekly, engine.this_week());

            let cycle = match def.cycle {
                CycleKind::Daily => &mut log.daily,
                CycleKind::Weekly => &mut log.weekly,
            };
            if cycle.claimed.contains(&def.id) {
                return Err(Error::AlreadyClaimed(def.id.clone()));
            }
            let have = cycle.counter(def.metric);
            if have < def.goal {
                return Err(Error::GoalNotReached { quest: def.id.clone(), have, need: def.goal });
            }
            cycle.claimed.insert(def.id.clone());

            let mut writes = vec![PendingWrite::new(QuestLog::KIND, &log, loaded.version)?];
            engine.grant_writes(&def.reward, &mut writes)?;
            engine.commit(writes)?;
            Ok(def.reward)
        })
    }

    /// Current attendance state
    pub fn attendance(&self) -> Result<Attendance> {
        Ok(self.store().load::<Attendance>(Attendance::KIND)?.record)
    }

    /// Claim today's attendance reward
    ///
    /// The streak grows only on the first claim of a new calendar day and
    /// falls back to 1 when a day was skipped.
    pub fn claim_attendance(&mut self) -> Result<AttendanceOutcome> {
        self.with_retry(|engine| {
            let loaded = engine.store().load::<Attendance>(Attendance::KIND)?;
            let mut record = loaded.record;
            let today = engine.today();

            if record.claimed_on(today) {
                return Err(Error::AlreadyClaimedToday);
            }
            record.consecutive_days = match record.last_claim {
                Some(last) if last.succ_opt() == Some(today) => record.consecutive_days + 1,
                _ => 1,
            };
            record.last_claim = Some(today);

            let reward = engine.content().attendance_reward(record.consecutive_days);
            let mut writes = vec![PendingWrite::new(Attendance::KIND, &record, loaded.version)?];
            engine.grant_writes(&reward, &mut writes)?;
            engine.commit(writes)?;

            log::debug!("attendance day {} claimed", record.consecutive_days);
            Ok(AttendanceOutcome { consecutive_days: record.consecutive_days, reward })
        })
    }

    /// Unlocked achievements
    pub fn achievements(&self) -> Result<Achievements> {
        Ok(self.store().load::<Achievements>(Achievements::KIND)?.record)
    }

    /// Unlock an achievement and pay its reward
    ///
    /// Idempotent: a second unlock returns false, grants nothing, and
    /// writes nothing.
    pub fn unlock_achievement(&mut self, id: &str) -> Result<bool> {
        let def = self
            .content()
            .achievement(id)
            .ok_or_else(|| Error::UnknownContent(id.to_string()))?
            .clone();

        self.with_retry(|engine| {
            let loaded = engine.store().load::<Achievements>(Achievements::KIND)?;
            let mut record = loaded.record;
            if !record.unlocked.insert(def.id.clone()) {
                return Ok(false);
            }

            let mut writes = vec![PendingWrite::new(Achievements::KIND, &record, loaded.version)?];
            engine.grant_writes(&def.reward, &mut writes)?;
            engine.commit(writes)?;
            Ok(true)
        })
    }
}
