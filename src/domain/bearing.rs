// Bearing catalog entry
use serde::Deserialize;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct BearingOption {
    pub value: String,
    pub label: String,
}
