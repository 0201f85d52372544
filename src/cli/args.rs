//! Command-line argument definitions using clap.

use clap::{Parser, ValueEnum};
use std::path::PathBuf;

use crate::config::{normalize_subreddit, Config, SortMode, TimeRange};

/// Subreddit image downloader CLI.
#[derive(Parser, Debug)]
#[command(
    name = "subreddit-dl",
    version,
    about = "Download images from a subreddit listing",
    long_about = "A CLI tool to bulk download images posted to a subreddit.\n\n\
                  Walks the public JSON listing, resolves direct links, previews and galleries,\n\
                  filters by score, size and NSFW flag, and skips posts already on disk."
)]
pub struct Args {
    /// Subreddit to download from (with or without the r/ prefix).
    pub subreddit: Option<String>,

    /// Base directory for downloads. Images land in <OUTPUT>/<subreddit>/.
    #[arg(short, long, env = "SUBREDDIT_DL_OUTPUT")]
    pub output: Option<PathBuf>,

    /// Number of images to collect.
    #[arg(short, long)]
    pub limit: Option<u32>,

    /// Listing sort order.
    #[arg(short, long, value_enum)]
    pub sort: Option<SortArg>,

    /// Time range for the top sort.
    #[arg(short, long, value_enum)]
    pub time: Option<TimeArg>,

    /// Minimum post score.
    #[arg(long, allow_negative_numbers = true)]
    pub min_score: Option<i64>,

    /// Minimum image width in pixels, when known.
    #[arg(long)]
    pub min_width: Option<u32>,

    /// Minimum image height in pixels, when known.
    #[arg(long)]
    pub min_height: Option<u32>,

    /// Include posts marked NSFW.
    #[arg(long)]
    pub nsfw: bool,

    /// Download again even if a file for the post already exists.
    #[arg(long)]
    pub no_skip: bool,

    /// Number of concurrent download workers.
    #[arg(short, long)]
    pub workers: Option<usize>,

    /// Hide per-image progress output.
    #[arg(long, short)]
    pub quiet: bool,

    /// Path to configuration file.
    #[arg(short, long, default_value = "config.toml")]
    pub config: PathBuf,

    /// Validate TLS certificates of image hosts.
    #[arg(long)]
    pub verify_certs: bool,

    /// Enable debug logging.
    #[arg(long)]
    pub debug: bool,
}

/// CLI sort argument.
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum SortArg {
    Hot,
    New,
    Top,
    Rising,
}

impl From<SortArg> for SortMode {
    fn from(arg: SortArg) -> Self {
        match arg {
            SortArg::Hot => SortMode::Hot,
            SortArg::New => SortMode::New,
            SortArg::Top => SortMode::Top,
            SortArg::Rising => SortMode::Rising,
        }
    }
}

/// CLI time range argument.
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum TimeArg {
    Hour,
    Day,
    Week,
    Month,
    Year,
    All,
}

impl From<TimeArg> for TimeRange {
    fn from(arg: TimeArg) -> Self {
        match arg {
            TimeArg::Hour => TimeRange::Hour,
            TimeArg::Day => TimeRange::Day,
            TimeArg::Week => TimeRange::Week,
            TimeArg::Month => TimeRange::Month,
            TimeArg::Year => TimeRange::Year,
            TimeArg::All => TimeRange::All,
        }
    }
}

impl Args {
    /// Merge CLI arguments into an existing config, overriding where specified.
    pub fn merge_into_config(self, config: &mut Config) {
        if let Some(subreddit) = self.subreddit {
            config.target.subreddit = subreddit;
        }
        config.target.subreddit = normalize_subreddit(&config.target.subreddit);

        if let Some(limit) = self.limit {
            config.target.limit = limit;
        }

        if let Some(sort) = self.sort {
            config.target.sort = sort.into();
        }

        if let Some(time) = self.time {
            config.target.time_range = time.into();
        }

        if let Some(min_score) = self.min_score {
            config.filters.min_score = min_score;
        }

        if let Some(min_width) = self.min_width {
            config.filters.min_width = min_width;
        }

        if let Some(min_height) = self.min_height {
            config.filters.min_height = min_height;
        }

        if let Some(dir) = self.output {
            config.options.output_dir = dir;
        }

        if let Some(workers) = self.workers {
            config.options.workers = workers;
        }

        // Boolean flags (only override if set to non-default)
        if self.nsfw {
            config.filters.include_nsfw = true;
        }

        if self.no_skip {
            config.options.skip_existing = false;
        }

        if self.quiet {
            config.options.quiet = true;
        }

        if self.verify_certs {
            config.network.accept_invalid_certs = false;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_merge_overrides() {
        let args = Args::parse_from([
            "subreddit-dl",
            "r/EarthPorn",
            "-l",
            "40",
            "-s",
            "top",
            "-t",
            "month",
            "--min-score",
            "-5",
            "--nsfw",
            "--no-skip",
            "-w",
            "8",
        ]);

        let mut config = Config::default();
        args.merge_into_config(&mut config);

        assert_eq!(config.target.subreddit, "EarthPorn");
        assert_eq!(config.target.limit, 40);
        assert_eq!(config.target.sort, SortMode::Top);
        assert_eq!(config.target.time_range, TimeRange::Month);
        assert_eq!(config.filters.min_score, -5);
        assert!(config.filters.include_nsfw);
        assert!(!config.options.skip_existing);
        assert_eq!(config.options.workers, 8);
        assert!(config.network.accept_invalid_certs);
    }

    #[test]
    fn test_merge_keeps_file_values() {
        let args = Args::parse_from(["subreddit-dl", "--verify-certs"]);

        let mut config = Config::for_subreddit("/r/wallpapers/");
        config.target.limit = 7;
        args.merge_into_config(&mut config);

        assert_eq!(config.target.subreddit, "wallpapers");
        assert_eq!(config.target.limit, 7);
        assert!(config.options.skip_existing);
        assert!(!config.network.accept_invalid_certs);
    }
}
