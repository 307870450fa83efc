//! Observer health counters
//!
//! Counts how many results made it through validation and which field was
//! missing when they did not. The counters ride along with every upload as
//! the `_meta` array so the service can tell how well the observer is doing.
//! They are per process and never persisted.

use std::sync::atomic::{AtomicU32, Ordering};

use serde::ser::{Serialize, SerializeTuple, Serializer};

use crate::profile::{PLATFORM, VERSION};
use crate::types::Field;

/// Counters shared between the pipeline (writer) and upload dispatch (reader)
#[derive(Debug, Default)]
pub struct ObserverStats {
    success: AtomicU32,
    unknown_outcome: AtomicU32,
    unknown_mode: AtomicU32,
    unknown_order: AtomicU32,
    unknown_class: AtomicU32,
    unknown_opponent: AtomicU32,
    screen_width: AtomicU32,
    screen_height: AtomicU32,
}

impl ObserverStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_success(&self) {
        self.success.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_missing(&self, field: Field) {
        let counter = match field {
            Field::Outcome => &self.unknown_outcome,
            Field::Mode => &self.unknown_mode,
            Field::Order => &self.unknown_order,
            Field::Hero => &self.unknown_class,
            Field::Opponent => &self.unknown_opponent,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    /// Size of the game window, as last reported by the observer
    pub fn set_screen_size(&self, width: u32, height: u32) {
        self.screen_width.store(width, Ordering::Relaxed);
        self.screen_height.store(height, Ordering::Relaxed);
    }

    /// Point-in-time copy of all counters, ready to send
    pub fn meta(&self) -> Meta {
        Meta {
            success: self.success.load(Ordering::Relaxed),
            unknown_outcome: self.unknown_outcome.load(Ordering::Relaxed),
            unknown_mode: self.unknown_mode.load(Ordering::Relaxed),
            unknown_order: self.unknown_order.load(Ordering::Relaxed),
            unknown_class: self.unknown_class.load(Ordering::Relaxed),
            unknown_opponent: self.unknown_opponent.load(Ordering::Relaxed),
            screen_width: self.screen_width.load(Ordering::Relaxed),
            screen_height: self.screen_height.load(Ordering::Relaxed),
        }
    }
}

/// Diagnostic tuple attached to each upload.
///
/// Serializes as a 10-element JSON array:
/// `[success, unknownOutcome, unknownMode, unknownOrder, unknownClass,
/// unknownOpponent, screenWidth, screenHeight, VERSION, PLATFORM]`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Meta {
    pub success: u32,
    pub unknown_outcome: u32,
    pub unknown_mode: u32,
    pub unknown_order: u32,
    pub unknown_class: u32,
    pub unknown_opponent: u32,
    pub screen_width: u32,
    pub screen_height: u32,
}

impl Serialize for Meta {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut tuple = serializer.serialize_tuple(10)?;
        tuple.serialize_element(&self.success)?;
        tuple.serialize_element(&self.unknown_outcome)?;
        tuple.serialize_element(&self.unknown_mode)?;
        tuple.serialize_element(&self.unknown_order)?;
        tuple.serialize_element(&self.unknown_class)?;
        tuple.serialize_element(&self.unknown_opponent)?;
        tuple.serialize_element(&self.screen_width)?;
        tuple.serialize_element(&self.screen_height)?;
        tuple.serialize_element(VERSION)?;
        tuple.serialize_element(PLATFORM)?;
        tuple.end()
    }
}
