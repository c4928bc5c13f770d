// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 read2vec contributors

//! Run handler - execute the pipeline for one sample

use colored::Colorize;
use miette::Result;

use super::Cli;
use crate::config::Settings;
use crate::errors::Read2vecError;
use crate::executors::create_default_executors;
use crate::pipeline::{
    ConsoleReporter, PipelineDriver, ProgressReporter, RunOptions, SessionContext,
    StageValidator, TracingReporter,
};

/// Run the pipeline
pub async fn run(cli: Cli) -> Result<()> {
    if !cli.input_root.is_dir() {
        return Err(miette::miette!(
            "Input root not found: {}\n\n\
             Pass the directory that holds the sample folders.",
            cli.input_root.display()
        ));
    }

    let settings = Settings::resolve(cli.config.as_deref(), &cli.input_root, &cli.overrides())?;
    tracing::debug!(?settings, "resolved settings");

    let ctx = SessionContext::new(
        &cli.input_root,
        &cli.sample_id,
        &cli.reference_panel,
        &settings.layout,
    )?;

    let options = RunOptions {
        force: cli.force,
        dry_run: cli.dry_run,
    };

    let reporter: Box<dyn ProgressReporter> = if cli.json {
        Box::new(TracingReporter)
    } else {
        Box::new(ConsoleReporter::new(cli.verbose))
    };

    let mut driver = PipelineDriver::new(StageValidator::new(settings.min_lines), options)
        .with_reporter(reporter);

    for (stage, executor) in create_default_executors(&settings.intersect) {
        tracing::debug!(%stage, executor = executor.name(), "registered executor");
        driver.register_executor(stage, executor);
    }

    let report = driver.execute(&ctx).await?;

    if cli.json {
        let json = serde_json::to_string_pretty(&report).map_err(Read2vecError::from)?;
        println!("{}", json);
    } else if cli.verbose {
        println!();
        println!("{}:", "Outputs".bold());
        for outcome in &report.stages {
            if let Some(ref output) = outcome.output {
                println!("  - {} {}", output.display(), format!("({:?})", outcome.status).dimmed());
            }
        }
    }

    Ok(())
}
