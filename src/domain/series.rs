// Minute-indexed ESI series with two aligned channels
use crate::domain::rul::RulEstimate;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Channel {
    Raw,
    Smoothed,
}

/// Immutable copy of the series handed to observers.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SeriesSnapshot {
    pub minutes: Vec<u32>,
    pub raw: Vec<Option<f64>>,
    pub smoothed: Vec<Option<f64>>,
}

impl SeriesSnapshot {
    /// Chart labels, one per minute, in ascending numeric order
    pub fn labels(&self) -> Vec<String> {
        self.minutes.iter().map(|m| m.to_string()).collect()
    }

    pub fn len(&self) -> usize {
        self.minutes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.minutes.is_empty()
    }
}

/// Ordered minute set plus the raw and smoothed value arrays.
///
/// `minutes`, `raw` and `smoothed` always have the same length. A slot that
/// was never reported on a channel holds `None`, which renders as a gap.
#[derive(Debug, Clone, Default)]
pub struct TimeSeriesStore {
    minutes: Vec<u32>,
    raw: Vec<Option<f64>>,
    smoothed: Vec<Option<f64>>,
    latest_rul: Option<RulEstimate>,
}

impl TimeSeriesStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the slot index for `minute`, inserting an empty slot on both
    /// channels if the minute has not been seen yet.
    pub fn insert_minute(&mut self, minute: u32) -> usize {
        match self.minutes.binary_search(&minute) {
            Ok(idx) => idx,
            Err(idx) => {
                self.minutes.insert(idx, minute);
                self.raw.insert(idx, None);
                self.smoothed.insert(idx, None);
                idx
            }
        }
    }

    /// Sets one channel's value for `minute` (last write wins).
    /// Non-finite values are stored as absent.
    pub fn upsert_channel_value(&mut self, minute: u32, channel: Channel, value: Option<f64>) {
        let idx = self.insert_minute(minute);
        let value = value.filter(|v| v.is_finite());
        match channel {
            Channel::Raw => self.raw[idx] = value,
            Channel::Smoothed => self.smoothed[idx] = value,
        }
    }

    pub fn value_at(&self, minute: u32, channel: Channel) -> Option<f64> {
        let idx = self.minutes.binary_search(&minute).ok()?;
        match channel {
            Channel::Raw => self.raw[idx],
            Channel::Smoothed => self.smoothed[idx],
        }
    }

    pub fn set_rul(&mut self, estimate: RulEstimate) {
        self.latest_rul = Some(estimate);
    }

    pub fn latest_rul(&self) -> Option<&RulEstimate> {
        self.latest_rul.as_ref()
    }

    pub fn len(&self) -> usize {
        self.minutes.len()
    }

    pub fn snapshot(&self) -> SeriesSnapshot {
        SeriesSnapshot {
            minutes: self.minutes.clone(),
            raw: self.raw.clone(),
            smoothed: self.smoothed.clone(),
        }
    }
}
