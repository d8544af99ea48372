//! Batch run: skip-existing, progress, streaming table output, summary.

use std::collections::HashSet;
use std::time::{Duration, Instant};

use ontoclass_core::{
    load_existing_keys, BatchEvent, BatchStats, ClassificationTask, Config, Money, TableWriter,
};

use super::setup::{build_runner, output_format};
use super::ClassifyArgs;

/// Classify `records` with `task` and append rows to the output table.
pub async fn run_task<T: ClassificationTask>(
    task: T,
    records: &[T::Record],
    args: &ClassifyArgs,
    config: &Config,
) -> anyhow::Result<()> {
    if records.is_empty() {
        tracing::warn!("No records found in {:?}", args.input);
        return Ok(());
    }

    let format = output_format(config)?;
    let existing_keys = if args.skip_existing {
        load_existing_keys(&args.output, format, task.headers(), task.key_columns())?
    } else {
        HashSet::new()
    };
    if !existing_keys.is_empty() {
        tracing::info!(
            "Loaded {} existing row(s) from output file",
            existing_keys.len()
        );
    }

    let runner = build_runner(task, config, args.llm_model.as_deref(), existing_keys)?;

    let mut writer =
        TableWriter::create(&args.output, format, runner.task().headers(), args.skip_existing)?;

    let progress = create_progress_bar(records.len() as u64);
    let start_time = Instant::now();
    let mut spent = Money::default();

    let stats = runner
        .run(records, &mut writer, |event| match event {
            BatchEvent::Started { label, .. } => {
                progress.set_message(format!("{} | ${spent}", truncate(&label, 40)));
            }
            BatchEvent::Written { cost, .. } => {
                spent = spent + cost;
                progress.inc(1);
            }
            BatchEvent::Skipped { .. } | BatchEvent::AlreadyDone { .. } => progress.inc(1),
        })
        .await?;
    writer.flush()?;

    progress.finish_and_clear();
    tracing::info!("Output written to {:?}", args.output);
    print_summary(&stats, start_time.elapsed());

    Ok(())
}

fn truncate(label: &str, max_chars: usize) -> String {
    if label.chars().count() <= max_chars {
        label.to_string()
    } else {
        let head: String = label.chars().take(max_chars.saturating_sub(3)).collect();
        format!("{head}...")
    }
}

fn create_progress_bar(total: u64) -> indicatif::ProgressBar {
    use indicatif::{ProgressBar, ProgressStyle};

    let pb = ProgressBar::new(total);
    if let Ok(style) = ProgressStyle::default_bar().template(
        "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({percent}%) {msg}",
    ) {
        pb.set_style(style.progress_chars("##-"));
    }
    pb.set_message("starting...");
    pb
}

fn print_summary(stats: &BatchStats, elapsed: Duration) {
    eprintln!();
    eprintln!("  ====================================");
    eprintln!("               Summary");
    eprintln!("  ====================================");
    eprintln!("    Written:      {:>8}", stats.written);
    if stats.skipped > 0 {
        eprintln!("    Skipped:      {:>8}", stats.skipped);
    }
    if stats.already_done > 0 {
        eprintln!("    Already done: {:>8}", stats.already_done);
    }
    eprintln!("  ------------------------------------");
    eprintln!("    Total:        {:>8}", stats.total);
    eprintln!("    Input tok:    {:>8}", stats.usage.input);
    eprintln!("    Thinking tok: {:>8}", stats.usage.thinking);
    eprintln!("    Output tok:   {:>8}", stats.usage.output);
    eprintln!("    Total cost:   {:>8}", stats.total_cost.to_string());
    eprintln!("    Duration:     {:>7.1}s", elapsed.as_secs_f64());
    eprintln!("  ====================================");
}
