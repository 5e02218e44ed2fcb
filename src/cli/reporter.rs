// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! CLI output reporter with colored formatting

use super::runner::BuildResult;
use crate::parts::PartGenerator;
use colored::*;
use std::time::Duration;

/// CLI reporter for formatted output
pub struct Reporter;

impl Reporter {
    fn rule() {
        println!("{}", "━".repeat(80).bright_black());
    }

    /// List generators with their default parameters
    pub fn report_catalog(parts: &[Box<dyn PartGenerator>]) {
        Self::rule();
        for part in parts {
            println!("{} {}", part.name().cyan().bold(), part.describe().bright_black());
            if let Some(defaults) = part.defaults().as_object() {
                for (key, value) in defaults {
                    println!("    {} {}", format!("{key}:").bright_black(), value);
                }
            }
        }
        Self::rule();
    }

    /// Report the items of one built part
    pub fn report_build(result: &BuildResult) {
        println!();
        Self::rule();
        println!("{} {}", "Built:".bold(), result.part.cyan());
        Self::rule();
        for item in &result.stats.items {
            let stats = &item.stats;
            let [sx, sy, sz] = stats.size();
            if stats.is_watertight && stats.shell_count == 1 {
                println!("{} {}", "✅".green(), item.name.green().bold());
            } else {
                println!("{} {}", "❌".red(), item.name.red().bold());
            }
            Self::print_field("Volume", format!("{:.3} mm³", stats.volume).cyan());
            Self::print_field("Surface", format!("{:.3} mm²", stats.surface_area).cyan());
            Self::print_field("Size", format!("{sx:.2} × {sy:.2} × {sz:.2} mm").cyan());
            Self::print_field("Faces", stats.face_count.to_string().cyan());
            Self::print_field("Shells", Self::flag(stats.shell_count.to_string(), stats.shell_count == 1));
            Self::print_field("Watertight", Self::flag(if stats.is_watertight { "yes" } else { "no" }.into(), stats.is_watertight));
        }
        Self::print_field("Time", Self::format_duration(result.duration).yellow());
        Self::rule();
    }

    /// One line per batch entry plus a summary
    pub fn report_batch(results: &[(String, anyhow::Result<BuildResult>)]) {
        println!("\n{}", "═".repeat(80).bright_black());
        println!("{}", "Batch Summary".bold());
        println!("{}", "═".repeat(80).bright_black());
        for (name, result) in results {
            match result {
                Ok(build) => println!(
                    "  {} {:<16} {}",
                    "✅".green(),
                    name,
                    Self::format_duration(build.duration).bright_black()
                ),
                Err(e) => println!("  {} {:<16} {}", "❌".red(), name, format!("{e:#}").red()),
            }
        }
        let failed = results.iter().filter(|(_, r)| r.is_err()).count();
        println!(
            "  {} {}   {} {}",
            "Built:".bright_black(),
            (results.len() - failed).to_string().green(),
            "Failed:".bright_black(),
            if failed > 0 { failed.to_string().red() } else { failed.to_string().green() }
        );
        println!("{}", "═".repeat(80).bright_black());
    }

    /// Report error with its full context chain
    pub fn report_error(error: &anyhow::Error) {
        eprintln!("\n{} {:#}", "❌ Error:".red().bold(), error);
    }

    pub fn success(message: &str) {
        println!("{} {}", "✅".green(), message.green());
    }

    fn flag(value: String, ok: bool) -> ColoredString {
        if ok {
            value.green()
        } else {
            value.red()
        }
    }

    fn print_field(name: &str, value: ColoredString) {
        println!("  {} {}", format!("{name}:").bright_black(), value);
    }

    /// Format duration for display
    fn format_duration(duration: Duration) -> String {
        let micros = duration.as_micros();

        if micros < 1_000 {
            format!("{}µs", micros)
        } else if micros < 1_000_000 {
            format!("{:.2}ms", micros as f64 / 1_000.0)
        } else {
            format!("{:.2}s", micros as f64 / 1_000_000.0)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_duration() {
        assert_eq!(Reporter::format_duration(Duration::from_micros(500)), "500µs");
        assert_eq!(Reporter::format_duration(Duration::from_millis(5)), "5.00ms");
        assert_eq!(Reporter::format_duration(Duration::from_secs(2)), "2.00s");
    }
}
