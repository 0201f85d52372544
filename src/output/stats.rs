//! Statistics reporting.

use std::time::Duration;

use console::style;

use crate::download::RunState;

/// Print the end-of-run summary.
pub fn print_run_summary(subreddit: &str, state: &RunState, elapsed: Duration) {
    println!();
    println!("{}", style("═".repeat(50)).dim());
    println!("{}", style(format!("Summary for r/{}:", subreddit)).bold());
    println!("  Pages:    {}", state.pages_fetched);
    println!("  Posts:    {} seen, {} rejected", state.posts_seen, state.rejected);
    println!("  Accepted: {}", state.accepted);
    println!(
        "  Saved:    {} ({})",
        style(state.saved).green(),
        format_bytes(state.bytes_saved)
    );
    println!("  Skipped:  {} (already downloaded)", style(state.skipped).yellow());
    if state.failed > 0 {
        println!("  Failed:   {}", style(state.failed).red());
    }
    if state.rate_limit_retries > 0 {
        println!("  Throttled: {} cooldowns", state.rate_limit_retries);
    }
    if let Some(reason) = &state.aborted {
        println!("  {} {}", style("Stopped early:").red(), reason);
    }
    if state.cancelled {
        println!("  {}", style("Cancelled by user").yellow());
    }
    println!("  Elapsed:  {:.1}s", elapsed.as_secs_f64());
    println!("{}", style("═".repeat(50)).dim());
}

/// Human-readable byte count.
pub fn format_bytes(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["B", "KiB", "MiB", "GiB"];

    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }

    if unit == 0 {
        format!("{} {}", bytes, UNITS[0])
    } else {
        format!("{:.1} {}", value, UNITS[unit])
    }
}
