//! Gashapon Engine - progression and economy operations
//!
//! The operation layer above the entity store. Each public method is one
//! user-triggered action (tap, roll, claim, purchase, start, collect) that
//! runs a read-modify-write against the store and returns an explicit
//! result. Time-based effects - vitality regeneration, daily/weekly resets,
//! expedition maturity - are computed lazily on read; there is no
//! background scheduler.
//!
//! Every mutation goes through the store's compare-and-swap surface, so a
//! concurrent trigger of the same operation (a double-tapped button firing
//! twice) can never double-spend: the second commit sees a stale version,
//! and the operation retries from a fresh read.

mod board;
mod enhance;
mod error;
mod expedition;
mod gacha;
mod quests;
mod roster;
mod shop;
mod tutorial;
mod vitality;
mod wallet;

pub use board::DiceOutcome;
pub use enhance::EnhanceOutcome;
pub use error::{Error, Result};
pub use expedition::{SlotPhase, SlotView};
pub use gacha::RollOutcome;
pub use quests::AttendanceOutcome;
pub use shop::PurchaseOutcome;
pub use tutorial::TutorialEvent;
pub use vitality::TapOutcome;

use chrono::NaiveDate;
use gashapon_core::records::RngState;
use gashapon_core::{Clock, ContentDb, GameRng, Persist, SystemClock};
use gashapon_db::{PendingWrite, Store};

/// Commit attempts per operation before a conflict is surfaced
const CAS_RETRIES: u32 = 3;

/// The progression and economy engine
///
/// Owns the store handle, the validated content tables, a wall-clock
/// source, and the persistent RNG. Generic over the clock so tests pin
/// time the same way they seed the RNG.
pub struct Engine<C: Clock = SystemClock> {
    store: Store,
    content: ContentDb,
    clock: C,
    rng: GameRng,
    rng_version: u64,
}

impl Engine<SystemClock> {
    /// Engine on the local system clock
    pub fn new(store: Store, content: ContentDb) -> Result<Self> {
        Self::with_clock(store, content, SystemClock)
    }
}

impl<C: Clock> Engine<C> {
    /// Engine on an explicit clock
    ///
    /// The RNG resumes from its persisted state when one exists; a fresh
    /// save seeds it from the current time.
    pub fn with_clock(store: Store, content: ContentDb, clock: C) -> Result<Self> {
        let saved = store.load::<RngState>(RngState::KIND)?;
        let rng = if saved.version == 0 {
            GameRng::new(clock.now_ms() as u64)
        } else {
            GameRng::from_state(saved.record.state)
        };
        Ok(Self { store, content, clock, rng, rng_version: saved.version })
    }

    /// The content tables this engine runs on
    pub fn content(&self) -> &ContentDb {
        &self.content
    }

    /// The underlying store
    pub fn store(&self) -> &Store {
        &self.store
    }

    /// Mutable clock access, for tests and demos driving time forward
    pub fn clock_mut(&mut self) -> &mut C {
        &mut self.clock
    }

    pub(crate) fn now_ms(&self) -> i64 {
        self.clock.now_ms()
    }

    pub(crate) fn today(&self) -> NaiveDate {
        self.clock.today()
    }

    pub(crate) fn this_week(&self) -> NaiveDate {
        self.clock.this_week()
    }

    /// Pending write carrying the RNG state for ops that consumed draws
    pub(crate) fn rng_pending(&self) -> Result<PendingWrite> {
        let state = RngState { state: self.rng.state() };
        Ok(PendingWrite::new(RngState::KIND, &state, self.rng_version)?)
    }

    /// Borrow the RNG for an operation's draws
    pub(crate) fn rng(&mut self) -> &mut GameRng {
        &mut self.rng
    }

    /// Commit a batch and advance the in-memory RNG version when the batch
    /// carried an RNG write
    pub(crate) fn commit(&mut self, writes: Vec<PendingWrite>) -> Result<()> {
        let touches_rng = writes.iter().any(|w| w.key() == RngState::KIND);
        self.store.save_batch(writes)?;
        if touches_rng {
            self.rng_version += 1;
        }
        Ok(())
    }

    /// Run an operation's read-compute-commit attempt, retrying a bounded
    /// number of times when a concurrent commit invalidated the read
    pub(crate) fn with_retry<T>(&mut self, mut attempt: impl FnMut(&mut Self) -> Result<T>) -> Result<T> {
        let mut tries = 0;
        loop {
            match attempt(self) {
                Err(Error::Store(gashapon_db::Error::VersionConflict { key, .. }))
                    if tries < CAS_RETRIES =>
                {
                    tries += 1;
                    log::warn!("write conflict on '{key}', retrying ({tries}/{CAS_RETRIES})");
                    // The RNG row may have advanced under us
                    self.rng_version = self.store.version(RngState::KIND)?;
                }
                other => return other,
            }
        }
    }
}
