// Domain layer - Pure run, series and message types
pub mod bearing;
pub mod log;
pub mod message;
pub mod rul;
pub mod run_state;
pub mod series;
pub mod status;
