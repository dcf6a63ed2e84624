// Console rendering of a run
use crate::domain::run_state::RunView;
use crate::domain::status::Status;

/// Turns successive views into the lines not yet shown.
#[derive(Debug, Default)]
pub struct ConsoleRenderer {
    last_status: Option<Status>,
    last_seq: u64,
}

impl ConsoleRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn render(&mut self, view: &RunView) -> Vec<String> {
        let mut lines = Vec::new();

        let seen = self.last_seq;
        for entry in view.log.iter().filter(|e| e.seq > seen) {
            lines.push(entry.to_string());
            self.last_seq = entry.seq;
        }

        if self.last_status.as_ref() != Some(&view.status) {
            lines.push(format!(
                "Rolamento: {} | Minuto: {} | Amostras: {} | Status: {}",
                view.target,
                view.minute_display(),
                view.series.len(),
                view.status
            ));
            self.last_status = Some(view.status.clone());
        }

        lines
    }
}

/// Final table of the series plus the latest RUL.
pub fn summary(view: &RunView) -> Vec<String> {
    let series = &view.series;
    if series.is_empty() {
        return vec!["Nenhum dado recebido.".to_string(), format!("RUL: {}", view.rul_display())];
    }

    let mut lines = vec![format!("{:>8} {:>12} {:>12}", "minuto", "bruto (g)", "suavizado (g)")];
    for (i, label) in series.labels().iter().enumerate() {
        lines.push(format!(
            "{:>8} {:>12} {:>12}",
            label,
            cell(series.raw[i]),
            cell(series.smoothed[i])
        ));
    }
    lines.push(format!("RUL: {}", view.rul_display()));
    lines
}

fn cell(value: Option<f64>) -> String {
    value.map(|v| format!("{:.4}", v)).unwrap_or_else(|| "-".to_string())
}
