//! subreddit-dl - CLI entry point.

use std::process::ExitCode;
use std::sync::Arc;
use std::time::Instant;

use clap::Parser;
use tracing_subscriber::{fmt, EnvFilter};

use subreddit_downloader::{
    api::RedditClient,
    cli::Args,
    config::{validate_config, Config},
    download::{RunState, Scraper},
    error::{exit_codes, Error, Result},
    fs::get_subreddit_folder,
    output::{
        print_banner, print_config_summary, print_error, print_info, print_run_summary,
        print_success, print_warning, ConsoleSink,
    },
};

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(state) => {
            if state.cancelled {
                ExitCode::from(exit_codes::ABORT as u8)
            } else if state.aborted.is_some() {
                ExitCode::from(exit_codes::API_ERROR as u8)
            } else if state.failed > 0 && state.saved == 0 && state.skipped == 0 {
                ExitCode::from(exit_codes::DOWNLOAD_ERROR as u8)
            } else {
                ExitCode::from(exit_codes::SUCCESS as u8)
            }
        }
        Err(e) => {
            print_error(&format!("{}", e));
            match e {
                Error::Config(_)
                | Error::ConfigValidation { .. }
                | Error::MissingConfig(_)
                | Error::TomlParse(_)
                | Error::UrlParse(_) => ExitCode::from(exit_codes::CONFIG_ERROR as u8),
                Error::RateLimited(_)
                | Error::TransientNetwork(_)
                | Error::MalformedResponse(_)
                | Error::PaginationAborted { .. } => ExitCode::from(exit_codes::API_ERROR as u8),
                _ => ExitCode::from(exit_codes::UNEXPECTED_ERROR as u8),
            }
        }
    }
}

async fn run() -> Result<RunState> {
    // Parse CLI arguments
    let args = Args::parse();

    // Set up logging (per-image output goes through the progress bar)
    let log_level = if args.debug {
        "debug"
    } else if args.quiet {
        "error"
    } else {
        "warn"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));

    fmt().with_env_filter(filter).with_target(false).init();

    // Print banner
    if !args.quiet {
        print_banner();
    }

    // Load configuration
    let config_path = args.config.clone();
    let mut config = if config_path.exists() {
        Config::load(&config_path)?
    } else {
        if args.debug {
            print_info(&format!(
                "No configuration file at {}, using defaults",
                config_path.display()
            ));
        }
        Config::default()
    };

    // Merge CLI arguments into config
    args.merge_into_config(&mut config);

    // Validate configuration
    validate_config(&config)?;

    let target_dir = get_subreddit_folder(&config)?;
    let quiet = config.options.quiet;
    if !quiet {
        print_config_summary(&config, &target_dir.display().to_string());
    }

    let client = Arc::new(RedditClient::new(&config.network)?);
    let sink = Arc::new(ConsoleSink::new(u64::from(config.target.limit), quiet));
    let subreddit = config.target.subreddit.clone();

    let scraper = Scraper::new(config, client).with_sink(sink.clone());

    // Stop requesting pages on Ctrl-C; queued downloads still finish
    let cancel = scraper.cancel_handle();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            print_warning("Interrupted, finishing in-flight downloads...");
            cancel.cancel();
        }
    });

    let started = Instant::now();
    let state = scraper.run().await;
    sink.finish();
    let state = state?;

    print_run_summary(&subreddit, &state, started.elapsed());

    if state.aborted.is_none() && !state.cancelled && state.failed == 0 {
        print_success(&format!("Done, {} new images", state.saved));
    }

    Ok(state)
}
