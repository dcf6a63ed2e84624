// State of the run being observed
use crate::domain::log::{LogBuffer, LogEntry, LogLevel};
use crate::domain::message::StreamEvent;
use crate::domain::rul::RulEstimate;
use crate::domain::series::{Channel, SeriesSnapshot, TimeSeriesStore};
use crate::domain::status::{Failure, FailureKind, Status};

/// What the stream owner must do after an event has been applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    Keep,
    Close,
}

#[derive(Debug)]
pub struct RunState {
    /// Distinguishes this run from earlier ones sharing the same consumer
    pub generation: u64,
    pub target: String,
    pub status: Status,
    pub series: TimeSeriesStore,
    pub current_minute: Option<u32>,
    pub log: LogBuffer,
    /// The job server acknowledged the start request
    pub job_started: bool,
    stop_sent: bool,
}

/// Owned copy of a run for presentation.
#[derive(Debug, Clone)]
pub struct RunView {
    pub target: String,
    pub status: Status,
    pub series: SeriesSnapshot,
    pub latest_rul: Option<RulEstimate>,
    pub current_minute: Option<u32>,
    pub log: Vec<LogEntry>,
}

impl RunView {
    pub fn minute_display(&self) -> String {
        self.current_minute
            .map(|m| m.to_string())
            .unwrap_or_else(|| "-".to_string())
    }

    pub fn rul_display(&self) -> String {
        self.latest_rul
            .as_ref()
            .map(RulEstimate::summary)
            .unwrap_or_else(|| "-".to_string())
    }
}

impl RunState {
    pub fn idle(generation: u64) -> Self {
        Self {
            generation,
            target: String::new(),
            status: Status::Idle,
            series: TimeSeriesStore::new(),
            current_minute: None,
            log: LogBuffer::new(),
            job_started: false,
            stop_sent: false,
        }
    }

    pub fn starting(generation: u64, target: &str) -> Self {
        let mut state = Self::idle(generation);
        state.target = target.to_string();
        state.status = Status::Starting;
        state
    }

    pub fn info(&mut self, message: impl Into<String>) {
        let entry = self.log.push(LogLevel::Info, message);
        tracing::info!(target_name = %self.target, "{}", entry.message);
    }

    pub fn error(&mut self, message: impl Into<String>) {
        let entry = self.log.push(LogLevel::Error, message);
        tracing::error!(target_name = %self.target, "{}", entry.message);
    }

    /// Reserves this run's single remote stop. Returns `false` once it has
    /// been taken.
    pub fn claim_stop(&mut self) -> bool {
        !std::mem::replace(&mut self.stop_sent, true)
    }

    /// Moves to a failed status; the log keeps the untruncated reason.
    pub fn fail(&mut self, kind: FailureKind, reason: impl Into<String>) {
        let failure = Failure::new(kind, reason);
        self.error(failure.reason.clone());
        self.status = Status::Failed(failure);
    }

    /// Applies one classified message. Once the run has left its active
    /// states nothing further is applied and the stream should be closed.
    pub fn apply(&mut self, event: StreamEvent) -> Disposition {
        if !self.status.is_active() {
            return Disposition::Close;
        }
        match event {
            StreamEvent::Esi(sample) => {
                self.status = Status::Running;
                self.current_minute = Some(sample.minute);
                if let Some(error) = &sample.error {
                    self.error(format!("Erro no ESI min {}: {}", sample.minute, error));
                }
                self.series.insert_minute(sample.minute);
                self.series
                    .upsert_channel_value(sample.minute, Channel::Raw, sample.value_raw_g);
                self.series.upsert_channel_value(
                    sample.minute,
                    Channel::Smoothed,
                    sample.value_smoothed_g,
                );
                Disposition::Keep
            }
            StreamEvent::Rul(estimate) => {
                self.info(format!("RUL @ min {}: {}", estimate.minute, estimate.value()));
                self.series.set_rul(estimate);
                Disposition::Keep
            }
            StreamEvent::Completed { bearing } => {
                let bearing = bearing.unwrap_or_else(|| self.target.clone());
                self.status = Status::Completed(self.target.clone());
                self.info(format!("Simulação para {} finalizada.", bearing));
                Disposition::Close
            }
            StreamEvent::Fatal { message } => {
                self.fail(FailureKind::Job, message);
                Disposition::Close
            }
            StreamEvent::Diagnostic(text) => {
                self.info(text);
                Disposition::Keep
            }
        }
    }

    pub fn view(&self) -> RunView {
        RunView {
            target: self.target.clone(),
            status: self.status.clone(),
            series: self.series.snapshot(),
            latest_rul: self.series.latest_rul().cloned(),
            current_minute: self.current_minute,
            log: self.log.entries().cloned().collect(),
        }
    }
}
