//! Console output utilities.

use console::style;

use crate::config::Config;

/// Print an info message.
pub fn print_info(message: &str) {
    println!("{} {}", style("INFO").cyan().bold(), message);
}

/// Print a success message.
pub fn print_success(message: &str) {
    println!("{} {}", style("OK").green().bold(), message);
}

/// Print a warning message.
pub fn print_warning(message: &str) {
    println!("{} {}", style("WARN").yellow().bold(), message);
}

/// Print an error message.
pub fn print_error(message: &str) {
    eprintln!("{} {}", style("ERROR").red().bold(), message);
}

/// Print the application banner.
pub fn print_banner() {
    let banner = r#"
╔═══════════════════════════════════════════════════════╗
║     subreddit-dl                                      ║
║     Bulk image downloader for subreddit listings      ║
╚═══════════════════════════════════════════════════════╝
"#;
    println!("{}", style(banner).cyan());
}

/// Print configuration summary.
pub fn print_config_summary(config: &Config, target_dir: &str) {
    let target = &config.target;
    let filters = &config.filters;

    println!();
    println!("{}", style("Configuration:").bold());
    println!("  Subreddit: r/{}", target.subreddit);
    if target.sort == crate::config::SortMode::Top {
        println!("  Sort: {} ({})", target.sort, target.time_range);
    } else {
        println!("  Sort: {}", target.sort);
    }
    println!("  Limit: {}", target.limit);
    println!("  Directory: {}", target_dir);
    println!("  Workers: {}", config.options.workers);

    if filters.min_score != 0 || filters.min_width > 0 || filters.min_height > 0 {
        println!(
            "  Filters: score >= {}, width >= {}, height >= {}",
            filters.min_score, filters.min_width, filters.min_height
        );
    }
    if filters.include_nsfw {
        println!("  NSFW: {}", style("included").yellow());
    }
    if !config.options.skip_existing {
        println!("  Existing files: {}", style("re-downloaded").yellow());
    }
    println!();
}
