// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! partforge CLI

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use partforge::cli::{Reporter, Runner};
use partforge::parts::{self, parse_overrides};
use partforge::{Kernel, ModelingConfig};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser)]
#[command(name = "partforge")]
#[command(about = "Parametric part generators on a polygonal solid kernel", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file (defaults to ./partforge.toml when present)
    #[arg(short, long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Debug logging (RUST_LOG takes precedence)
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// List part generators and their default parameters
    List,

    /// Build one part and report its geometry
    Build {
        /// Generator name
        part: String,

        /// Parameter override
        #[arg(long = "set", value_name = "KEY=VALUE")]
        overrides: Vec<String>,

        /// Print statistics as JSON instead of a table
        #[arg(long)]
        json: bool,

        /// Also write the statistics to a JSON file
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,
    },

    /// Build every part with default parameters, in parallel
    Batch {
        /// Print results as JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Show the effective configuration
    Config {
        /// Write it to a TOML file instead
        #[arg(long, value_name = "FILE")]
        write: Option<PathBuf>,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            Reporter::report_error(&e);
            ExitCode::FAILURE
        }
    }
}

fn init_tracing(verbose: bool) {
    let fallback = if verbose { "partforge=debug" } else { "warn" };
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| fallback.into()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn run(cli: &Cli) -> Result<()> {
    let config = match &cli.config {
        Some(path) => ModelingConfig::from_file(path)?,
        None => ModelingConfig::load()?,
    };
    let runner = Runner::new(Kernel::with_config(config));

    match &cli.command {
        Commands::List => Reporter::report_catalog(&parts::catalog()),
        Commands::Build {
            part,
            overrides,
            json,
            output,
        } => build_command(&runner, part, overrides, *json, output.as_ref())?,
        Commands::Batch { json } => batch_command(&runner, *json)?,
        Commands::Config { write } => match write {
            Some(path) => {
                runner.kernel().config().save(path)?;
                Reporter::success(&format!("Configuration written to {}", path.display()));
            }
            None => print!(
                "{}",
                toml::to_string_pretty(runner.kernel().config()).context("Failed to serialize config")?
            ),
        },
    }
    Ok(())
}

fn build_command(
    runner: &Runner,
    name: &str,
    overrides: &[String],
    json: bool,
    output: Option<&PathBuf>,
) -> Result<()> {
    let Some(part) = parts::find(name) else {
        let known: Vec<_> = parts::catalog().iter().map(|p| p.name()).collect();
        bail!("unknown part `{name}` (known: {})", known.join(", "));
    };
    let overrides = parse_overrides(overrides)?;
    let result = runner.build(part.as_ref(), &overrides)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        Reporter::report_build(&result);
    }
    if let Some(path) = output {
        result.stats.write_json(path)?;
    }
    Ok(())
}

fn batch_command(runner: &Runner, json: bool) -> Result<()> {
    let catalog = parts::catalog();
    let pb = ProgressBar::new(catalog.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")?
            .progress_chars("#>-"),
    );
    let results = runner.batch(&catalog, |name| {
        pb.set_message(name.to_string());
        pb.inc(1);
    });
    pb.finish_and_clear();

    if json {
        let report: serde_json::Map<String, serde_json::Value> = results
            .iter()
            .map(|(name, result)| -> Result<(String, serde_json::Value)> {
                let value = match result {
                    Ok(build) => serde_json::to_value(build)?,
                    Err(e) => serde_json::json!({ "error": format!("{e:#}") }),
                };
                Ok((name.clone(), value))
            })
            .collect::<Result<_>>()?;
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        Reporter::report_batch(&results);
    }

    let failed = results.iter().filter(|(_, r)| r.is_err()).count();
    if failed > 0 {
        bail!("{failed} of {} parts failed to build", results.len());
    }
    Ok(())
}
