pub fn init() {
    // Honor RUST_LOG if set, default to info. Always log to stderr: in stdio
    // mode stdout carries the JSON-RPC stream.
    let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}

/// Log a metric line and forward it to the `metrics` facade. Names ending in
/// `_total` are counters, everything else a histogram.
pub fn log_metric(tool: &str, metric: &str, value: f64) {
    tracing::info!(tool = tool, metric = metric, value = value, "metric");
    if metric.ends_with("_total") {
        metrics::counter!(metric.to_string(), "tool" => tool.to_string()).increment(value as u64);
    } else {
        metrics::histogram!(metric.to_string(), "tool" => tool.to_string()).record(value);
    }
}
