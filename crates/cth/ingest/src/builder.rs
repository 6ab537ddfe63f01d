use crate::input::{tag_strings, LogRecord, MetricRecord, TelemetryBatch, TraceRecord};
use chrono::{DateTime, NaiveDateTime, Utc};
use cth_graph::{CthGraph, GraphError};
use cth_types::{EntityId, EventType, Hyperedge, Severity};
use std::collections::{BTreeMap, BTreeSet, HashSet};
use tracing::{debug, warn};

/// Keywords that mark a log message as an anomaly signal regardless of its
/// level field.
pub const CRITICAL_KEYWORDS: [&str; 16] = [
    "error",
    "exception",
    "failed",
    "timeout",
    "refused",
    "denied",
    "unavailable",
    "unreachable",
    "critical",
    "fatal",
    "panic",
    "warning",
    "alert",
    "threshold",
    "limit",
    "exceeded",
];

/// Span statuses that count as errors for hyperedge emission.
const ERROR_STATUSES: [&str; 3] = ["error", "failed", "timeout"];

/// Log messages are truncated to this many characters before storage.
const LOG_EXCERPT_CHARS: usize = 100;

#[derive(Clone, Copy, Debug)]
pub struct BuilderConfig {
    /// Correlation window appended after a trace's end time, and the width
    /// of the buckets orphaned anomalies are grouped into. Seconds.
    pub time_window_secs: i64,
}

impl Default for BuilderConfig {
    fn default() -> Self {
        Self {
            time_window_secs: 300,
        }
    }
}

/// Converts a [`TelemetryBatch`] into a [`CthGraph`].
///
/// Construction is two-pass. The trace pass turns each trace with anomaly
/// signals into one hyperedge, pulling in anomalous metrics and critical
/// logs that correlate with the trace's entities inside its time window.
/// The orphan pass buckets the anomalous signals no trace covered into
/// window-aligned `orphaned_anomaly` edges so they still participate in
/// propagation analysis.
pub struct CthBuilder {
    config: BuilderConfig,
}

impl Default for CthBuilder {
    fn default() -> Self {
        Self::new(BuilderConfig::default())
    }
}

impl CthBuilder {
    pub fn new(config: BuilderConfig) -> Self {
        Self { config }
    }

    /// Build a graph from a parsed batch. Malformed records are dropped from
    /// correlation with a `tracing` event; the batch itself never fails.
    pub fn build(&self, batch: &TelemetryBatch) -> CthGraph {
        let mut graph = CthGraph::new();

        for trace in &batch.traces {
            if let Some(edge) = self.hyperedge_from_trace(trace, &batch.metrics, &batch.logs) {
                self.insert(&mut graph, edge);
            }
        }

        for edge in self.orphaned_hyperedges(batch) {
            self.insert(&mut graph, edge);
        }

        graph
    }

    fn insert(&self, graph: &mut CthGraph, edge: Hyperedge) {
        if let Err(GraphError::DuplicateEdge(id)) = graph.add_hyperedge(edge) {
            warn!(edge_id = %id, "skipping duplicate hyperedge");
        }
    }

    fn hyperedge_from_trace(
        &self,
        trace: &TraceRecord,
        metrics: &[MetricRecord],
        logs: &[LogRecord],
    ) -> Option<Hyperedge> {
        if trace.spans.is_empty() {
            return None;
        }

        let mut nodes: BTreeSet<EntityId> = BTreeSet::new();
        let mut trace_start: Option<DateTime<Utc>> = None;
        let mut trace_end: Option<DateTime<Utc>> = None;
        let mut has_errors = false;

        for span in &trace.spans {
            if let Some(service) = &span.service {
                nodes.insert(EntityId::service(service));
            }
            for key in ["pod", "container", "node"] {
                if let Some(name) = span.tags.get(key).and_then(|v| v.as_str()) {
                    nodes.insert(EntityId::parse(&format!("{}:{}", key, name)));
                }
            }

            if let Some(start) = span.start_time.as_deref().and_then(parse_timestamp) {
                trace_start = Some(trace_start.map_or(start, |t| t.min(start)));
            }
            if let Some(end) = span.end_time.as_deref().and_then(parse_timestamp) {
                trace_end = Some(trace_end.map_or(end, |t| t.max(end)));
            }

            if span
                .status
                .as_deref()
                .is_some_and(|s| ERROR_STATUSES.contains(&s))
            {
                has_errors = true;
            }
        }

        let Some(start) = trace_start else {
            debug!(trace_id = %trace.trace_id, "trace has no parseable start time, dropped");
            return None;
        };
        if nodes.is_empty() {
            debug!(trace_id = %trace.trace_id, "trace has no entities, dropped");
            return None;
        }
        let end = trace_end.unwrap_or(start);

        let anomalous_metrics = self.correlate_metrics(metrics, &nodes, start, end);
        let critical_logs = self.correlate_logs(logs, &nodes, start, end);

        // Sparse by design: healthy traces leave no edge behind.
        if anomalous_metrics.is_empty() && critical_logs.is_empty() && !has_errors {
            return None;
        }

        let severity = determine_severity(&trace.spans, &anomalous_metrics, &critical_logs);

        let mut edge = Hyperedge::new(nodes, start)
            .ok()?
            .with_metrics(anomalous_metrics)
            .with_logs(critical_logs)
            .with_trace_id(&trace.trace_id)
            .with_event_type(EventType::TraceEvent)
            .with_severity(severity);
        if let Some(e) = trace_end {
            edge = edge.with_duration_secs((e - start).num_milliseconds() as f64 / 1000.0);
        }
        Some(edge)
    }

    /// Anomalous metrics correlated with `nodes` inside
    /// `[start, end + window]`. Each match contributes one
    /// `entity:metric_name` identifier.
    fn correlate_metrics(
        &self,
        metrics: &[MetricRecord],
        nodes: &BTreeSet<EntityId>,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> BTreeSet<String> {
        let deadline = end + chrono::Duration::seconds(self.config.time_window_secs);
        let mut out = BTreeSet::new();
        for metric in metrics {
            if !metric.is_anomalous {
                continue;
            }
            let Some(ts) = parse_timestamp(&metric.timestamp) else {
                debug!(entity = %metric.entity, "metric with unparseable timestamp, skipped");
                continue;
            };
            if ts < start || ts > deadline {
                continue;
            }
            if self.matches_any_node(nodes, &metric.entity, &metric.tags) {
                out.insert(format!("{}:{}", metric.entity, metric.metric_name));
            }
        }
        out
    }

    /// Critical logs correlated with `nodes` inside `[start, end + window]`,
    /// truncated to excerpt length.
    fn correlate_logs(
        &self,
        logs: &[LogRecord],
        nodes: &BTreeSet<EntityId>,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> BTreeSet<String> {
        let deadline = end + chrono::Duration::seconds(self.config.time_window_secs);
        let mut out = BTreeSet::new();
        for log in logs {
            if !is_critical_log(log) {
                continue;
            }
            let Some(ts) = parse_timestamp(&log.timestamp) else {
                debug!(entity = %log.entity, "log with unparseable timestamp, skipped");
                continue;
            };
            if ts < start || ts > deadline {
                continue;
            }
            if self.matches_any_node(nodes, &log.entity, &log.tags) {
                out.insert(truncate_chars(&log.message, LOG_EXCERPT_CHARS));
            }
        }
        out
    }

    /// A record is associated with a node when its entity string is a
    /// substring of the node's canonical form, or any of its string tag
    /// values is.
    fn matches_any_node(
        &self,
        nodes: &BTreeSet<EntityId>,
        entity: &str,
        tags: &BTreeMap<String, serde_json::Value>,
    ) -> bool {
        nodes.iter().any(|node| {
            node.text_matches(entity) || tag_strings(tags).any(|tag| node.text_matches(tag))
        })
    }

    /// Edges for anomalous signals no trace covered, bucketed into
    /// window-aligned groups.
    fn orphaned_hyperedges(&self, batch: &TelemetryBatch) -> Vec<Hyperedge> {
        let covered: HashSet<&str> = batch
            .traces
            .iter()
            .filter(|t| !t.trace_id.is_empty())
            .map(|t| t.trace_id.as_str())
            .collect();
        let is_orphan =
            |trace_id: &Option<String>| !trace_id.as_deref().is_some_and(|id| covered.contains(id));

        // Bucket start -> accumulated signals. BTreeMap keeps emission order
        // deterministic.
        let mut buckets: BTreeMap<i64, OrphanBucket> = BTreeMap::new();

        for metric in &batch.metrics {
            if !metric.is_anomalous || !is_orphan(&metric.trace_id) {
                continue;
            }
            let Some(ts) = parse_timestamp(&metric.timestamp) else {
                continue;
            };
            let bucket = buckets.entry(self.bucket_start(ts)).or_default();
            bucket.add_entity(&metric.entity);
            bucket
                .metrics
                .insert(format!("{}:{}", metric.entity, metric.metric_name));
        }

        for log in &batch.logs {
            if !is_critical_log(log) || !is_orphan(&log.trace_id) {
                continue;
            }
            let Some(ts) = parse_timestamp(&log.timestamp) else {
                continue;
            };
            let bucket = buckets.entry(self.bucket_start(ts)).or_default();
            bucket.add_entity(&log.entity);
            bucket
                .logs
                .insert(truncate_chars(&log.message, LOG_EXCERPT_CHARS));
        }

        buckets
            .into_iter()
            .filter_map(|(window_start, bucket)| {
                if bucket.nodes.is_empty() || (bucket.metrics.is_empty() && bucket.logs.is_empty())
                {
                    return None;
                }
                let ts = DateTime::from_timestamp(window_start, 0)?;
                Hyperedge::new(bucket.nodes, ts)
                    .ok()
                    .map(|e| {
                        e.with_metrics(bucket.metrics)
                            .with_logs(bucket.logs)
                            .with_event_type(EventType::OrphanedAnomaly)
                            .with_severity(Severity::Warning)
                    })
            })
            .collect()
    }

    /// Floor to the enclosing window boundary (epoch-aligned).
    fn bucket_start(&self, ts: DateTime<Utc>) -> i64 {
        let secs = ts.timestamp();
        secs - secs.rem_euclid(self.config.time_window_secs)
    }
}

#[derive(Default)]
struct OrphanBucket {
    nodes: BTreeSet<EntityId>,
    metrics: BTreeSet<String>,
    logs: BTreeSet<String>,
}

impl OrphanBucket {
    /// Entity type is inferred from the raw name; the full name is kept as
    /// the node name either way.
    fn add_entity(&mut self, entity: &str) {
        if entity.is_empty() {
            return;
        }
        let lower = entity.to_ascii_lowercase();
        let id = if lower.contains("service") {
            EntityId::service(entity)
        } else if lower.contains("pod") {
            EntityId::pod(entity)
        } else {
            EntityId::entity(entity)
        };
        self.nodes.insert(id);
    }
}

/// A log is critical when its level says so or its message contains any of
/// the [`CRITICAL_KEYWORDS`].
fn is_critical_log(log: &LogRecord) -> bool {
    if let Some(level) = &log.level {
        if matches!(
            level.to_ascii_lowercase().as_str(),
            "error" | "critical" | "fatal" | "panic"
        ) {
            return true;
        }
    }
    let message = log.message.to_ascii_lowercase();
    CRITICAL_KEYWORDS.iter().any(|kw| message.contains(kw))
}

/// Severity precedence: span status first, then correlated log content,
/// then the mere presence of anomaly signals.
fn determine_severity(
    spans: &[crate::input::SpanRecord],
    metrics: &BTreeSet<String>,
    logs: &BTreeSet<String>,
) -> Severity {
    for span in spans {
        match span.status.as_deref() {
            Some("critical") | Some("fatal") => return Severity::Critical,
            Some("error") => return Severity::Error,
            _ => {}
        }
    }
    for log in logs {
        let lower = log.to_ascii_lowercase();
        if ["critical", "fatal", "panic"].iter().any(|w| lower.contains(w)) {
            return Severity::Critical;
        }
        if ["error", "exception", "failed"].iter().any(|w| lower.contains(w)) {
            return Severity::Error;
        }
    }
    if !metrics.is_empty() || !logs.is_empty() {
        return Severity::Warning;
    }
    Severity::Normal
}

/// Lenient timestamp parsing: RFC 3339 first, then the two space-separated
/// forms telemetry pipelines commonly emit, taken as UTC.
fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    if raw.is_empty() {
        return None;
    }
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.with_timezone(&Utc));
    }
    for fmt in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, fmt) {
            return Some(naive.and_utc());
        }
    }
    None
}

/// Truncate on a character boundary, not a byte boundary.
fn truncate_chars(s: &str, max: usize) -> String {
    s.chars().take(max).collect()
}
