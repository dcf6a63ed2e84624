// Remaining-useful-life estimate
use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub struct RulEstimate {
    pub minute: u32,
    pub predicted_minutes: Option<f64>,
    pub is_infinite: bool,
    pub is_not_a_number: bool,
}

/// The single authoritative reading of an estimate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RulValue {
    Infinite,
    NotANumber,
    Minutes(f64),
    Unavailable,
}

impl RulEstimate {
    /// Builds an estimate, folding non-finite predictions into the flags.
    pub fn new(
        minute: u32,
        predicted_minutes: Option<f64>,
        is_infinite: bool,
        is_not_a_number: bool,
    ) -> Self {
        let mut estimate = Self {
            minute,
            predicted_minutes,
            is_infinite,
            is_not_a_number,
        };
        if let Some(value) = predicted_minutes {
            if value.is_infinite() {
                estimate.is_infinite = true;
                estimate.predicted_minutes = None;
            } else if value.is_nan() {
                estimate.is_not_a_number = true;
                estimate.predicted_minutes = None;
            }
        }
        estimate
    }

    /// Infinite wins over not-a-number, which wins over a numeric value.
    pub fn value(&self) -> RulValue {
        if self.is_infinite {
            RulValue::Infinite
        } else if self.is_not_a_number {
            RulValue::NotANumber
        } else {
            match self.predicted_minutes {
                Some(minutes) => RulValue::Minutes(minutes),
                None => RulValue::Unavailable,
            }
        }
    }

    /// Display text including the run minute, e.g. `12.30 min (no min 5)`
    pub fn summary(&self) -> String {
        format!("{} (no min {})", self.value(), self.minute)
    }
}

impl fmt::Display for RulValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RulValue::Infinite => write!(f, "Infinito"),
            RulValue::Minutes(minutes) => write!(f, "{:.2} min", minutes),
            RulValue::NotANumber | RulValue::Unavailable => write!(f, "N/A"),
        }
    }
}
