//! Week commands
//!
//! List, validate, export, scaffold and inspect curriculum weeks.

use crate::api::ValidationResult;
use crate::cli::WeekCommand;
use crate::commands::{build_api, interrupt_token, print_json, render_content};
use crate::config::Config;
use crate::error::{Result, TequilaError};
use crate::models::{validate_week_number, WeekStatus, WeekSummary};
use crate::weeks::WeekAggregator;

use colored::Colorize;
use prettytable::{format, row, Table};
use std::path::Path;

/// Handle `tequila weeks ...`
pub async fn handle_weeks(config: &Config, command: WeekCommand) -> Result<()> {
    let api = build_api(config)?;
    let cancellation = interrupt_token();
    let mut weeks = WeekAggregator::new(api.clone(), config.weeks.clone())
        .with_cancellation(cancellation.clone());

    match command {
        WeekCommand::List { json } => {
            weeks.load().await?;
            if let Some(error) = weeks.error() {
                eprintln!(
                    "{}",
                    format!("Week discovery failed, showing all weeks as pending: {}", error)
                        .yellow()
                );
            }
            if json {
                print_json(weeks.weeks())?;
            } else {
                print_week_table(weeks.weeks());
            }
        }
        WeekCommand::Validate { week, json } => {
            let Some(result) = weeks.validate_week(week).await else {
                if cancellation.is_cancelled() {
                    return Err(TequilaError::Cancelled.into());
                }
                let message = weeks.error().unwrap_or("validation failed").to_string();
                return Err(anyhow::anyhow!(message));
            };
            if json {
                print_json(&result)?;
            } else {
                print_validation(&result);
            }
        }
        WeekCommand::Export { week, download } => {
            let export = weeks.export_week(week).await?;
            println!(
                "{} {} ({:.1} KB)",
                "Exported".green(),
                export.zip_path,
                export.size_kb
            );
            if let Some(path) = download {
                let bytes = api.download_week_export(week).await?;
                write_archive(&path, &bytes).await?;
                println!("Saved archive to {}", path.display().to_string().cyan());
            }
        }
        WeekCommand::Scaffold { week } => {
            validate_week_number(week)?;
            let response = api.scaffold_week(week).await?;
            println!("{}", response.message.green());
            if let Some(path) = response.extra.get("week_path").and_then(|v| v.as_str()) {
                println!("  {}", path);
            }
        }
        WeekCommand::Spec { week, part } => {
            validate_week_number(week)?;
            match part {
                Some(part) => {
                    let spec_part = api.get_week_spec_part(week, &part).await?;
                    println!("{}", render_content(&spec_part.content));
                }
                None => {
                    let compiled = api.get_compiled_week_spec(week).await?;
                    print_json(&compiled.spec)?;
                }
            }
        }
    }

    Ok(())
}

async fn write_archive(path: &Path, bytes: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await?;
    }
    tokio::fs::write(path, bytes).await?;
    Ok(())
}

fn colored_status(status: WeekStatus) -> colored::ColoredString {
    match status {
        WeekStatus::Completed => status.to_string().green(),
        WeekStatus::Generating => status.to_string().yellow(),
        WeekStatus::Pending => status.to_string().dimmed(),
    }
}

fn print_week_table(weeks: &[WeekSummary]) {
    let mut table = Table::new();
    table.set_format(*format::consts::FORMAT_BORDERS_ONLY);
    table.add_row(row![
        "Week".bold(),
        "Virtue".bold(),
        "Status".bold(),
        "Lessons".bold(),
        "Validated".bold()
    ]);

    for week in weeks {
        table.add_row(row![
            week.number,
            week.virtue,
            colored_status(week.status),
            week.lessons_count,
            if week.validated { "yes" } else { "-" }
        ]);
    }

    let completed = weeks
        .iter()
        .filter(|w| w.status == WeekStatus::Completed)
        .count();

    println!("\nCurriculum weeks:");
    table.printstd();
    println!("\n{} of {} weeks completed\n", completed, weeks.len());
}

fn print_validation(result: &ValidationResult) {
    let verdict = if result.is_valid {
        "VALID".green().bold()
    } else {
        "INVALID".red().bold()
    };
    println!("Week {}: {} {}", result.week, verdict, result.summary);

    for issue in &result.errors {
        println!("  {} {} {}", "error".red(), issue.location, issue.message);
    }
    for issue in &result.warnings {
        println!("  {} {} {}", "warning".yellow(), issue.location, issue.message);
    }
    for issue in &result.info {
        println!("  {} {} {}", "info".cyan(), issue.location, issue.message);
    }
}
