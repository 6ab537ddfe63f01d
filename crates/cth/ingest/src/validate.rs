use serde_json::Value;
use std::fmt;

/// One structural problem found in an ingestion document.
///
/// Rendered as a human-readable string; the ingestion contract returns the
/// full list so a caller can report everything wrong at once.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize)]
pub struct ValidationIssue {
    pub message: String,
}

impl ValidationIssue {
    fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

/// Structural check of a raw ingestion document. Pure, no side effects,
/// and exhaustive: it never stops at the first violation.
///
/// Checks: the document is an object with array fields `traces`, `metrics`,
/// `logs`; every trace has `trace_id` and a `spans` array; every metric has
/// `entity`, `metric_name`, `timestamp`; every log has `entity`, `message`,
/// `timestamp`.
pub fn validate_document(doc: &Value) -> Vec<ValidationIssue> {
    let mut issues = Vec::new();

    let Some(obj) = doc.as_object() else {
        issues.push(ValidationIssue::new("input data must be an object"));
        return issues;
    };

    for key in ["traces", "metrics", "logs"] {
        match obj.get(key) {
            None => issues.push(ValidationIssue::new(format!("missing required key: {}", key))),
            Some(v) if !v.is_array() => {
                issues.push(ValidationIssue::new(format!("key '{}' must be an array", key)))
            }
            Some(_) => {}
        }
    }

    if let Some(traces) = obj.get("traces").and_then(Value::as_array) {
        for (i, trace) in traces.iter().enumerate() {
            let Some(t) = trace.as_object() else {
                issues.push(ValidationIssue::new(format!("trace {} must be an object", i)));
                continue;
            };
            if !t.contains_key("trace_id") {
                issues.push(ValidationIssue::new(format!("trace {} missing trace_id", i)));
            }
            if !t.get("spans").is_some_and(Value::is_array) {
                issues.push(ValidationIssue::new(format!(
                    "trace {} must have 'spans' as an array",
                    i
                )));
            }
        }
    }

    if let Some(metrics) = obj.get("metrics").and_then(Value::as_array) {
        for (i, metric) in metrics.iter().enumerate() {
            let Some(m) = metric.as_object() else {
                issues.push(ValidationIssue::new(format!("metric {} must be an object", i)));
                continue;
            };
            for key in ["entity", "metric_name", "timestamp"] {
                if !m.contains_key(key) {
                    issues.push(ValidationIssue::new(format!(
                        "metric {} missing required key: {}",
                        i, key
                    )));
                }
            }
        }
    }

    if let Some(logs) = obj.get("logs").and_then(Value::as_array) {
        for (i, log) in logs.iter().enumerate() {
            let Some(l) = log.as_object() else {
                issues.push(ValidationIssue::new(format!("log {} must be an object", i)));
                continue;
            };
            for key in ["entity", "message", "timestamp"] {
                if !l.contains_key(key) {
                    issues.push(ValidationIssue::new(format!(
                        "log {} missing required key: {}",
                        i, key
                    )));
                }
            }
        }
    }

    issues
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn valid_document_has_no_issues() {
        let doc = json!({
            "traces": [{"trace_id": "t1", "spans": []}],
            "metrics": [{"entity": "a", "metric_name": "cpu", "timestamp": "2024-01-01T10:00:00Z"}],
            "logs": [{"entity": "a", "message": "ok", "timestamp": "2024-01-01T10:00:00Z"}],
        });
        assert!(validate_document(&doc).is_empty());
    }

    #[test]
    fn non_object_input() {
        let issues = validate_document(&json!([1, 2, 3]));
        assert_eq!(issues.len(), 1);
        assert!(issues[0].to_string().contains("must be an object"));
    }

    #[test]
    fn missing_top_level_keys_all_reported() {
        let issues = validate_document(&json!({}));
        assert_eq!(issues.len(), 3);
    }

    #[test]
    fn wrong_typed_top_level_key() {
        let doc = json!({"traces": "nope", "metrics": [], "logs": []});
        let issues = validate_document(&doc);
        assert_eq!(issues.len(), 1);
        assert!(issues[0].to_string().contains("'traces' must be an array"));
    }

    #[test]
    fn all_record_violations_enumerated() {
        let doc = json!({
            "traces": [{"spans": []}, {"trace_id": "t2"}],
            "metrics": [{"entity": "a"}],
            "logs": [{"message": "m"}],
        });
        let issues = validate_document(&doc);
        let rendered: Vec<String> = issues.iter().map(|i| i.to_string()).collect();
        assert!(rendered.iter().any(|m| m.contains("trace 0 missing trace_id")));
        assert!(rendered.iter().any(|m| m.contains("trace 1 must have 'spans'")));
        assert!(rendered.iter().any(|m| m.contains("metric 0 missing required key: metric_name")));
        assert!(rendered.iter().any(|m| m.contains("metric 0 missing required key: timestamp")));
        assert!(rendered.iter().any(|m| m.contains("log 0 missing required key: entity")));
        assert!(rendered.iter().any(|m| m.contains("log 0 missing required key: timestamp")));
    }

    #[test]
    fn non_object_records_reported() {
        let doc = json!({"traces": [42], "metrics": ["x"], "logs": [null]});
        let issues = validate_document(&doc);
        assert_eq!(issues.len(), 3);
    }
}
