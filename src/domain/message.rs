// Classification of event-stream frames
use crate::domain::rul::RulEstimate;
use serde::Deserialize;
use serde_json::Value;

const UNKNOWN_JOB_ERROR: &str = "Erro desconhecido na simulação";

/// One per-minute ESI reading. A channel that is missing or `null` is
/// absent for this minute.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct EsiSample {
    #[serde(default)]
    pub bearing: Option<String>,
    pub minute: u32,
    #[serde(default)]
    pub value_raw_g: Option<f64>,
    #[serde(default)]
    pub value_smoothed_g: Option<f64>,
    #[serde(default)]
    pub error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RulRecord {
    minute: u32,
    #[serde(default)]
    rul_predicted_min: Option<f64>,
    #[serde(default)]
    is_inf: bool,
    #[serde(default)]
    is_nan: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum StreamEvent {
    Esi(EsiSample),
    Rul(RulEstimate),
    Completed { bearing: Option<String> },
    Fatal { message: String },
    Diagnostic(String),
}

/// Classify one frame's data payload. Never fails: anything that is not a
/// recognised record degrades to diagnostic text.
pub fn classify(frame: &str) -> StreamEvent {
    let value: Value = match serde_json::from_str(frame) {
        Ok(value) => value,
        Err(_) => return StreamEvent::Diagnostic(frame.to_string()),
    };

    let kind = value.get("type").and_then(Value::as_str).unwrap_or_default();
    match kind {
        "esi" => EsiSample::deserialize(&value)
            .map(StreamEvent::Esi)
            .unwrap_or_else(|_| diagnostic(&value)),
        "rul" => RulRecord::deserialize(&value)
            .map(|r| {
                StreamEvent::Rul(RulEstimate::new(
                    r.minute,
                    r.rul_predicted_min,
                    r.is_inf,
                    r.is_nan,
                ))
            })
            .unwrap_or_else(|_| diagnostic(&value)),
        "simulation_end" => completed(&value),
        "status" if value.get("status").and_then(Value::as_str) == Some("completed") => {
            completed(&value)
        }
        "error_python" | "error_system" | "error" => StreamEvent::Fatal {
            message: text_field(&value, "message")
                .unwrap_or(UNKNOWN_JOB_ERROR)
                .to_string(),
        },
        _ => diagnostic(&value),
    }
}

fn text_field<'a>(value: &'a Value, key: &str) -> Option<&'a str> {
    value.get(key).and_then(Value::as_str).filter(|s| !s.is_empty())
}

fn completed(value: &Value) -> StreamEvent {
    StreamEvent::Completed {
        bearing: text_field(value, "bearing").map(str::to_string),
    }
}

fn diagnostic(value: &Value) -> StreamEvent {
    let text = match text_field(value, "message") {
        Some(message) => message.to_string(),
        None => value.to_string(),
    };
    StreamEvent::Diagnostic(format!("[PYTHON LOG]: {}", text))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_esi_with_both_channels() {
        let event = classify(
            r#"{"type":"esi","bearing":"Bearing1_1","minute":12,"value_raw_g":0.41,"value_smoothed_g":0.38}"#,
        );
        let StreamEvent::Esi(sample) = event else {
            panic!("expected esi, got {:?}", event);
        };
        assert_eq!(sample.minute, 12);
        assert_eq!(sample.value_raw_g, Some(0.41));
        assert_eq!(sample.value_smoothed_g, Some(0.38));
        assert_eq!(sample.error, None);
    }

    #[test]
    fn test_esi_null_and_missing_are_absent() {
        let event = classify(r#"{"type":"esi","minute":3,"value_raw_g":null,"error":"bad file"}"#);
        let StreamEvent::Esi(sample) = event else {
            panic!("expected esi, got {:?}", event);
        };
        assert_eq!(sample.value_raw_g, None);
        assert_eq!(sample.value_smoothed_g, None);
        assert_eq!(sample.error.as_deref(), Some("bad file"));
    }

    #[test]
    fn test_rul_record() {
        let event = classify(
            r#"{"type":"rul","bearing":"b","minute":5,"rul_predicted_min":12.3,"is_inf":true,"is_nan":false}"#,
        );
        assert_eq!(
            event,
            StreamEvent::Rul(RulEstimate::new(5, Some(12.3), true, false))
        );
    }

    #[test]
    fn test_completion_variants() {
        assert_eq!(
            classify(r#"{"type":"simulation_end","bearing":"b2"}"#),
            StreamEvent::Completed {
                bearing: Some("b2".to_string())
            }
        );
        assert_eq!(
            classify(r#"{"type":"status","status":"completed"}"#),
            StreamEvent::Completed { bearing: None }
        );
        match classify(r#"{"type":"status","status":"warming_up"}"#) {
            StreamEvent::Diagnostic(text) => {
                assert!(text.starts_with("[PYTHON LOG]: {"));
                assert!(text.contains("warming_up"));
            }
            other => panic!("expected diagnostic, got {:?}", other),
        }
    }

    #[test]
    fn test_fatal_errors() {
        for kind in ["error_python", "error_system", "error"] {
            let frame = format!(r#"{{"type":"{}","message":"disk full"}}"#, kind);
            assert_eq!(
                classify(&frame),
                StreamEvent::Fatal {
                    message: "disk full".to_string()
                }
            );
        }
        assert_eq!(
            classify(r#"{"type":"error"}"#),
            StreamEvent::Fatal {
                message: UNKNOWN_JOB_ERROR.to_string()
            }
        );
    }

    #[test]
    fn test_unknown_type_is_diagnostic() {
        assert_eq!(
            classify(r#"{"type":"log","message":"loading model"}"#),
            StreamEvent::Diagnostic("[PYTHON LOG]: loading model".to_string())
        );
    }

    #[test]
    fn test_unparseable_frame_is_verbatim() {
        assert_eq!(
            classify("Traceback (most recent call last):"),
            StreamEvent::Diagnostic("Traceback (most recent call last):".to_string())
        );
    }

    #[test]
    fn test_malformed_esi_is_diagnostic() {
        let event = classify(r#"{"type":"esi","minute":-1}"#);
        assert!(matches!(event, StreamEvent::Diagnostic(_)));
    }
}
