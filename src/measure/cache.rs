//! Raw readings keyed by ordered pair.

use std::collections::HashMap;

use crate::hardware::RawReading;
use crate::netlist::TestPointId;

/// Last raw reading seen for each `(from, to)` pair.
#[derive(Debug, Clone, Default)]
pub struct MeasurementCache {
    readings: HashMap<(TestPointId, TestPointId), RawReading>,
}

impl MeasurementCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, from: TestPointId, to: TestPointId) -> Option<RawReading> {
        self.readings.get(&(from, to)).copied()
    }

    pub fn insert(&mut self, from: TestPointId, to: TestPointId, reading: RawReading) {
        self.readings.insert((from, to), reading);
    }

    pub fn len(&self) -> usize {
        self.readings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.readings.is_empty()
    }

    pub fn clear(&mut self) {
        self.readings.clear();
    }
}
