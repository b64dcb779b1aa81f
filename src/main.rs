mod cli;
mod logging;

use std::path::PathBuf;
use std::process;

use anyhow::{bail, Context, Result};
use clap::Parser;
use time::OffsetDateTime;
use tracing::info;

use gpcp::batch::{process_file, run_batch, BatchRequest, FileJob};
use gpcp::{ConvertConfig, FormatVersion, OutputLayout, TruncationPolicy};

use crate::cli::Cli;

/// 変換できる最初の年
const FIRST_YEAR: i32 = 1970;

fn main() {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    if let Err(e) = run(cli) {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    let format = FormatVersion::from_code(cli.format)?;
    let mut config = ConvertConfig::new(format).with_skip_missing(cli.skip_missing);
    if cli.strict {
        config = config.with_truncation(TruncationPolicy::Strict);
    }
    if cli.map {
        config = config.with_layout(OutputLayout::WithMap);
    }

    eprintln!("GPCPの格子データをCSVに変換します。");
    if cli.single_file {
        let input = cli.input_file.context("--input-fileを指定してください。")?;
        let output = cli.output_file.context("--output-fileを指定してください。")?;
        let job = FileJob {
            input,
            output: with_csv_extension(output),
        };
        let outcome = process_file(&job, cli.gzip, &config)
            .with_context(|| format!("{}を変換できませんでした。", job.input.display()))?;
        info!(?outcome, output = %job.output.display(), "変換が完了しました。");
    } else {
        let now = OffsetDateTime::now_utc();
        let years = if cli.years.is_empty() {
            vec![now.year()]
        } else {
            cli.years
        };
        if let Some(year) = years.iter().find(|y| !(FIRST_YEAR..=now.year()).contains(*y)) {
            bail!("年は{FIRST_YEAR}年から今年までを指定してください。`{year}`");
        }
        let months = if cli.months.is_empty() {
            vec![u8::from(now.month())]
        } else {
            cli.months
        };
        let request = BatchRequest {
            input_prefix: cli.input_prefix,
            output_prefix: cli.output_prefix,
            years,
            months,
            zipped: cli.gzip,
            config,
        };
        let summary = run_batch(&request);
        info!(
            written = summary.written.len(),
            empty = summary.empty.len(),
            skipped = summary.skipped.len(),
            "変換が完了しました。"
        );
    }
    eprintln!("変換が完了しました。");

    Ok(())
}

fn with_csv_extension(path: PathBuf) -> PathBuf {
    if path.extension().is_some_and(|ext| ext == "csv") {
        path
    } else {
        let mut name = path.into_os_string();
        name.push(".csv");
        PathBuf::from(name)
    }
}
