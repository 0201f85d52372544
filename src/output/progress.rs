//! Progress bar rendering of scrape events.

use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};

use crate::download::{DownloadOutcome, EventSink, ScrapeEvent, TracingSink};

/// Create a progress bar for item counts.
pub fn create_item_bar(total: u64, message: &str) -> ProgressBar {
    let bar = ProgressBar::new(total);
    if let Ok(style) = ProgressStyle::default_bar().template(&format!(
        "{{spinner:.green}} {} [{{bar:40.cyan/blue}}] {{pos}}/{{len}} {{msg}}",
        message
    )) {
        bar.set_style(style.progress_chars("#>-"));
    }
    bar
}

/// Shows one bar tick per finished image, sized to the requested limit.
///
/// Everything is also forwarded to [`TracingSink`] so `--debug` keeps the
/// full event log.
pub struct ConsoleSink {
    bar: ProgressBar,
    quiet: bool,
}

impl ConsoleSink {
    pub fn new(limit: u64, quiet: bool) -> Self {
        let bar = create_item_bar(limit, "Downloading");
        if quiet {
            bar.set_draw_target(ProgressDrawTarget::hidden());
        }
        Self { bar, quiet }
    }

    /// Remove the bar from the terminal.
    pub fn finish(&self) {
        self.bar.finish_and_clear();
    }
}

impl EventSink for ConsoleSink {
    fn emit(&self, event: ScrapeEvent) {
        match &event {
            ScrapeEvent::PageFetched { page, .. } => {
                self.bar.set_message(format!("page {}", page));
            }
            ScrapeEvent::Finished(result) => {
                self.bar.inc(1);
                if !self.quiet {
                    match &result.outcome {
                        DownloadOutcome::Saved { path, .. } => {
                            if let Some(name) = path.file_name() {
                                self.bar.println(format!("  saved {}", name.to_string_lossy()));
                            }
                        }
                        DownloadOutcome::Failed(kind) => {
                            self.bar.println(format!("  failed {}: {}", result.post_id, kind));
                        }
                        DownloadOutcome::Skipped(_) => {}
                    }
                }
            }
            ScrapeEvent::RunComplete(_) => self.finish(),
            _ => {}
        }

        TracingSink.emit(event);
    }
}
