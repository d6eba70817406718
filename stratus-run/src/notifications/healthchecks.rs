use super::Request;
use crate::report::format_run_duration;
use std::fmt::Write;
use stratus_core::model::RunResult;

fn ping_url(base: &str, ok: bool) -> String {
    if ok {
        base.to_owned()
    } else {
        format!("{}/fail", base.trim_end_matches('/'))
    }
}

pub(super) fn body(server_name: &str, result: &RunResult) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Server: {}", server_name);
    let _ = writeln!(out, "Success: {}/{}", result.success_count, result.total_count);
    let _ = writeln!(out, "Size: {:.2} GB", result.total_size_gb);
    let _ = writeln!(out, "Duration: {}", format_run_duration(result.duration));

    let mut failed = result.failed().peekable();
    if failed.peek().is_some() {
        let _ = writeln!(out, "\nFailed:");
        for state in failed {
            let message = state
                .failure()
                .map_or("unknown error", |failure| failure.message.as_str());
            let _ = writeln!(out, "- {}: {}", state.display_name(), message);
        }
    }
    out
}

/// A run with no services at all counts as failed, so that the monitor
/// alerts on a host that lost its spec files.
pub(super) fn request(base: &str, server_name: &str, result: &RunResult) -> Request {
    Request::new(
        ping_url(base, result.succeeded()),
        body(server_name, result),
    )
}
