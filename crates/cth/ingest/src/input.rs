use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// The top-level ingestion document: three parallel arrays of telemetry.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct TelemetryBatch {
    #[serde(default)]
    pub traces: Vec<TraceRecord>,
    #[serde(default)]
    pub metrics: Vec<MetricRecord>,
    #[serde(default)]
    pub logs: Vec<LogRecord>,
}

/// One distributed trace: a correlation id plus its spans.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct TraceRecord {
    #[serde(default)]
    pub trace_id: String,
    #[serde(default)]
    pub spans: Vec<SpanRecord>,
}

/// One span within a trace. Everything is optional because real telemetry is
/// ragged, and the builder works with whatever is present.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct SpanRecord {
    #[serde(default)]
    pub service: Option<String>,
    #[serde(default)]
    pub operation: Option<String>,
    #[serde(default)]
    pub start_time: Option<String>,
    #[serde(default)]
    pub end_time: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub tags: BTreeMap<String, Value>,
}

/// One metric sample. Only samples flagged `is_anomalous` participate in
/// hyperedge construction.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct MetricRecord {
    #[serde(default)]
    pub entity: String,
    #[serde(default)]
    pub metric_name: String,
    #[serde(default)]
    pub value: Option<Value>,
    #[serde(default)]
    pub timestamp: String,
    #[serde(default)]
    pub is_anomalous: bool,
    #[serde(default)]
    pub trace_id: Option<String>,
    #[serde(default)]
    pub tags: BTreeMap<String, Value>,
}

/// One log line.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct LogRecord {
    #[serde(default)]
    pub entity: String,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub level: Option<String>,
    #[serde(default)]
    pub timestamp: String,
    #[serde(default)]
    pub trace_id: Option<String>,
    #[serde(default)]
    pub tags: BTreeMap<String, Value>,
}

/// String tag values of a record's tag map (non-string values are skipped).
pub(crate) fn tag_strings(tags: &BTreeMap<String, Value>) -> impl Iterator<Item = &str> {
    tags.values().filter_map(|v| v.as_str())
}
