//! Plain-text formatting of a finished run.

use std::{fmt::Write, time::Duration};
use stratus_core::model::{RepoSize, RunResult, ServiceState, Status};

const NAME_WIDTH: usize = 20;

pub fn status_icon(state: &ServiceState) -> &'static str {
    match state.status() {
        Status::Success => "✅",
        _ => "❌",
    }
}

pub fn format_gb(gb: f64) -> String {
    format!("{:.2} GB", gb)
}

/// Duration of one service, e.g. `2m5s`.
pub fn format_service_duration(duration: Option<Duration>) -> String {
    match duration {
        None => "N/A".to_owned(),
        Some(duration) => {
            let seconds = duration.as_secs();
            if seconds >= 60 {
                format!("{}m{}s", seconds / 60, seconds % 60)
            } else {
                format!("{}s", seconds)
            }
        }
    }
}

/// Duration of the whole run, e.g. `12m 5s`.
pub fn format_run_duration(duration: Duration) -> String {
    let seconds = duration.as_secs();
    format!("{}m {}s", seconds / 60, seconds % 60)
}

/// Share of the total and size columns for one service.
pub fn format_size(result: &RunResult, state: &ServiceState) -> (String, String) {
    match (&state.size, result.share_of(state)) {
        (Some(size), Some(share)) => (
            format!("{:<6}", format!("{:.1}%", share)),
            size.gb().map(format_gb).unwrap_or_default(),
        ),
        (Some(size @ RepoSize::Measured { .. }), None) => (
            "N/A   ".to_owned(),
            size.gb().map(format_gb).unwrap_or_default(),
        ),
        (Some(RepoSize::Error(_)), _) => ("ERR   ".to_owned(), "Error".to_owned()),
        (None, _) => ("N/A   ".to_owned(), "N/A".to_owned()),
    }
}

fn table_name(name: &str) -> String {
    format!("{:<width$}", name, width = NAME_WIDTH)
        .chars()
        .take(NAME_WIDTH)
        .collect()
}

/// The summary printed at the end of a run.
pub fn console_report(result: &RunResult) -> String {
    let mut out = String::new();
    // writing to a String can't fail
    let _ = writeln!(
        out,
        "--------- Backups finished: {} / {} successful ({}%) ---------",
        result.success_count,
        result.total_count,
        result.success_rate()
    );
    let _ = writeln!(out, "Duration: {}", format_run_duration(result.duration));

    if result.total_count == 0 {
        let _ = writeln!(out, "No services were found to back up");
        return out;
    }

    let size_errors = result.size_error_count();
    if result.measured_count() > 0 {
        let _ = writeln!(out, "Total backup size: {}", format_gb(result.total_size_gb));
        if size_errors > 0 {
            let _ = writeln!(out, "Size calculation errors: {} repositories", size_errors);
        }
    } else if size_errors > 0 {
        let _ = writeln!(out, "Size calculation failed for all {} repositories", size_errors);
    }

    let _ = writeln!(out, "Status | Name                 | %      | Size      | Time");
    let _ = writeln!(out, "-------|----------------------|--------|-----------|-------");
    for state in result.by_share() {
        let (percentage, size) = format_size(result, state);
        let _ = writeln!(
            out,
            "{}     | {} | {} | {:<9} | {}",
            status_icon(state),
            table_name(&state.display_name()),
            percentage,
            size,
            format_service_duration(state.duration)
        );
    }
    out
}
