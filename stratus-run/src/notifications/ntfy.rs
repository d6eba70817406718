use super::Request;
use crate::report::{format_service_duration, format_size, status_icon};
use std::fmt::Write;
use stratus_core::{model::RunResult, secrets::SecretValue};

/// Header values have to be plain ASCII.
fn ascii(value: &str) -> String {
    value
        .chars()
        .map(|c| if c.is_ascii() && !c.is_ascii_control() { c } else { '?' })
        .collect()
}

fn duration_text(result: &RunResult) -> String {
    let seconds = result.duration.as_secs();
    if seconds >= 60 {
        format!("{}m {}s", seconds / 60, seconds % 60)
    } else {
        format!("{}s", seconds)
    }
}

pub(super) fn title(server_name: &str, result: &RunResult) -> String {
    ascii(&format!(
        "Backup report, server \"{}\": {}/{} ({}%)",
        server_name,
        result.success_count,
        result.total_count,
        result.success_rate()
    ))
}

pub(super) fn body(result: &RunResult, top: usize) -> String {
    let mut out = String::new();
    let size_errors = result.size_error_count();
    if result.measured_count() > 0 {
        let _ = write!(out, "💾 Total: {:.2} GB", result.total_size_gb);
        if size_errors > 0 {
            let _ = write!(out, " ({} size errors)", size_errors);
        }
        let _ = writeln!(out);
    } else if size_errors > 0 {
        let _ = writeln!(out, "⚠️ Size calculation failed for all repositories");
    }
    let _ = writeln!(out, "⏱️ Duration: {}", duration_text(result));
    let _ = writeln!(out);

    if result.total_count == 0 {
        let _ = writeln!(out, "No services were found to back up");
        return out;
    }

    let services = result.by_share();
    for state in services.iter().take(top) {
        let (_, size) = format_size(result, state);
        let _ = writeln!(
            out,
            "{} {}: {} ({})",
            status_icon(state),
            state.display_name(),
            size,
            format_service_duration(state.duration)
        );
    }
    if services.len() > top {
        let _ = writeln!(out, "\n...and {} more", services.len() - top);
    }

    let mut failed = result.failed().peekable();
    if failed.peek().is_some() {
        let _ = writeln!(out, "\n⚠️ Errors:");
        for state in failed {
            if let Some(failure) = state.failure() {
                let _ = writeln!(
                    out,
                    "• {}: [{}] {}",
                    state.display_name(),
                    failure.step.to_string().to_uppercase(),
                    failure.message
                );
            }
        }
    }
    out
}

pub(super) fn request(
    url: &str,
    token: Option<&SecretValue>,
    server_name: &str,
    result: &RunResult,
    top: usize,
) -> Request {
    let ok = result.succeeded();
    let mut request = Request::new(url, body(result, top));
    request.headers = vec![
        ("Title", title(server_name, result)),
        ("Priority", if ok { "default" } else { "high" }.to_owned()),
        ("Tags", if ok { "white_check_mark" } else { "warning" }.to_owned()),
    ];
    request.bearer_token = token.cloned();
    request
}
