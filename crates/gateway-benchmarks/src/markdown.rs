//! Markdown summary rendering for a batch of benchmark results.

use crate::BenchmarkResult;

/// Render a human-readable markdown report for `results`.
///
/// One table row per target: id, pass/fail, latency, and throughput when
/// either metric is present. Failed targets show their `error` field
/// instead of the latency/throughput columns.
#[must_use]
pub fn generate_summary(results: &[BenchmarkResult]) -> String {
    let mut out = String::new();
    out.push_str("# Benchmark Summary\n\n");
    out.push_str(&format!(
        "Generated {}\n\n",
        results
            .first()
            .map(|r| r.timestamp.to_rfc3339())
            .unwrap_or_else(|| "n/a".to_string())
    ));

    let failed = results.iter().filter(|r| r.is_error()).count();
    out.push_str(&format!(
        "{} target(s), {} failed.\n\n",
        results.len(),
        failed
    ));

    out.push_str("| Target | Status | Latency (ms) | Throughput (rps) |\n");
    out.push_str("|---|---|---|---|\n");

    for result in results {
        if result.is_error() {
            let error = result
                .metrics
                .get("error")
                .and_then(|v| v.as_str())
                .unwrap_or("unknown error");
            out.push_str(&format!("| {} | FAILED | {error} | |\n", result.target_id));
            continue;
        }

        let latency = result
            .latency_ms()
            .map_or_else(|| "-".to_string(), |v| format!("{v:.2}"));
        let throughput = result
            .throughput_rps()
            .map_or_else(|| "-".to_string(), |v| format!("{v:.2}"));
        out.push_str(&format!(
            "| {} | OK | {latency} | {throughput} |\n",
            result.target_id
        ));
    }

    out
}
