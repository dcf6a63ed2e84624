// Run status state machine
use std::fmt;

const PREVIEW_CHARS: usize = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// The start control call was refused or could not be sent
    Start,
    /// The event stream dropped or never opened
    Connection,
    /// The job reported a fatal error on the stream
    Job,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Failure {
    pub kind: FailureKind,
    pub reason: String,
}

impl Failure {
    pub fn new(kind: FailureKind, reason: impl Into<String>) -> Self {
        Self {
            kind,
            reason: reason.into(),
        }
    }

    /// Reason cut to a display-friendly length
    pub fn preview(&self) -> String {
        if self.reason.chars().count() <= PREVIEW_CHARS {
            return self.reason.clone();
        }
        let cut: String = self.reason.chars().take(PREVIEW_CHARS).collect();
        format!("{}...", cut)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Status {
    #[default]
    Idle,
    Starting,
    AwaitingData,
    Running,
    Stopping,
    Stopped,
    Completed(String),
    Failed(Failure),
}

impl Status {
    /// A run is active from the start request until it reaches a terminal state.
    pub fn is_active(&self) -> bool {
        matches!(self, Status::Starting | Status::AwaitingData | Status::Running)
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Status::Stopped | Status::Completed(_) | Status::Failed(_)
        )
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Status::Idle => write!(f, "Ocioso"),
            Status::Starting => write!(f, "Iniciando..."),
            Status::AwaitingData => write!(f, "Conectado, aguardando dados..."),
            Status::Running => write!(f, "Rodando"),
            Status::Stopping => write!(f, "Parando..."),
            Status::Stopped => write!(f, "Parada pelo usuário."),
            Status::Completed(target) => write!(f, "Finalizada ({})", target),
            Status::Failed(failure) => match failure.kind {
                FailureKind::Start => write!(f, "Falha ao iniciar: {}", failure.preview()),
                FailureKind::Connection => {
                    write!(f, "Erro de conexão SSE: {}", failure.preview())
                }
                FailureKind::Job => write!(f, "Erro: {}", failure.preview()),
            },
        }
    }
}
