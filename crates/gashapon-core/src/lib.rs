//! Gashapon Core - types, content tables, and economy math
//!
//! This crate holds everything below the storage line:
//! - Identity newtypes for characters and grades
//! - Typed durable records with serde-defaulted fields
//! - Calendar windows for daily/weekly resets (`Clock`, `week_start`)
//! - Deterministic RNG with integer-weight sampling
//! - Static game content loaded from RON
//! - Pure economy math (cost curve, stat scaling, reward formula)
//!
//! Nothing here performs I/O except the RON content loader.

pub mod content;
pub mod economy;
mod error;
mod identity;
pub mod records;
mod rng;
pub mod time;

pub use content::{ContentDb, ContentFile, CycleKind, Metric, Reward};
pub use error::{Error, Result};
pub use identity::{CharId, GradeId};
pub use records::Persist;
pub use rng::GameRng;
pub use time::{week_start, Clock, ManualClock, SystemClock};
