//! Output formatting and styling module.
//!
//! All user-facing terminal output goes through [`OutputFormatter`]: action
//! lines, the progress spinner and the end-of-run summary. Diagnostics go
//! through `tracing` instead.

use std::time::Duration;

use colored::*;
use indicatif::{HumanDuration, ProgressBar, ProgressStyle};

use crate::metrics::RunMetrics;
use crate::relocator::{TaskOutcome, TaskStatus};

pub struct OutputFormatter;

impl OutputFormatter {
    /// Prints a success message in green with a checkmark.
    pub fn success(message: &str) {
        println!("{} {}", "✓".green(), message);
    }

    /// Prints an error message in red with an X mark.
    pub fn error(message: &str) {
        eprintln!("{} {}", "✗".red(), message);
    }

    /// Prints a warning message in yellow with a warning symbol.
    pub fn warning(message: &str) {
        println!("{} {}", "⚠".yellow(), message);
    }

    pub fn header(header: &str) {
        println!("\n{}", header.bold());
    }

    /// `[MOVE] src -> dst` style line for one task.
    ///
    /// ```
    /// use mediasort::media_type::MediaType;
    /// use mediasort::output::OutputFormatter;
    /// use mediasort::relocator::{RelocationMode, TaskOutcome, TaskStatus};
    /// use mediasort::scanner::FileTask;
    ///
    /// let outcome = TaskOutcome {
    ///     task: FileTask {
    ///         source: "/src/a.jpg".into(),
    ///         destination: "/out/a.jpg".into(),
    ///         kind: MediaType::Image,
    ///     },
    ///     mode: RelocationMode::Copy,
    ///     status: TaskStatus::DryRun,
    /// };
    /// assert_eq!(OutputFormatter::action_line(&outcome), "[COPY] /src/a.jpg -> /out/a.jpg");
    /// ```
    pub fn action_line(outcome: &TaskOutcome) -> String {
        format!(
            "[{}] {} -> {}",
            outcome.mode.as_str().to_uppercase(),
            outcome.task.source.display(),
            outcome.task.destination.display()
        )
    }

    /// Prints an action, marking failures.
    pub fn action(outcome: &TaskOutcome) {
        let line = Self::action_line(outcome);
        match outcome.status {
            TaskStatus::Failed(_) => eprintln!("{} {}", "✗".red(), line),
            TaskStatus::Succeeded | TaskStatus::DryRun => println!("{line}"),
        }
    }

    /// A spinner for runs whose total is not known up front.
    pub fn create_spinner() -> ProgressBar {
        let pb = ProgressBar::new_spinner();
        pb.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.cyan} {pos} files {msg}")
                .expect("Invalid progress bar template"),
        );
        pb.enable_steady_tick(Duration::from_millis(120));
        pb
    }

    /// Prints the elapsed time, the counters and the per-type table.
    pub fn summary(metrics: &RunMetrics, elapsed: Duration, dry_run: bool) {
        println!("Operation completed in: {}", HumanDuration(elapsed));
        if dry_run {
            Self::dry_run_notice("No files were modified.");
        }
        if metrics.interrupted {
            Self::warning("Interrupted: remaining files were not processed.");
        }

        Self::header("STATS:");
        let counters = [
            ("moves", metrics.moves),
            ("copies", metrics.copies),
            ("errors", metrics.errors),
        ];
        for (name, value) in counters {
            let value = if name == "errors" && value > 0 {
                value.to_string().red().bold()
            } else {
                value.to_string().green()
            };
            println!("  - {name:<6}\t: {value:>5}");
        }

        println!("  - types\t:");
        for (kind, count) in &metrics.type_counts {
            println!(
                "  \t- {:<12} {:>5} {}",
                kind.as_str(),
                count.to_string().green(),
                if *count == 1 { "file" } else { "files" }
            );
        }
    }

    pub fn dry_run_notice(message: &str) {
        println!("{}", format!("[DRY RUN] {}", message).yellow());
    }
}
