//! Day commands

use crate::cli::DayCommand;
use crate::commands::{build_api, interrupt_token, print_json, render_content};
use crate::config::Config;
use crate::days::DayAggregator;
use crate::error::{Result, TequilaError};
use crate::models::{
    day_field, is_filled, is_json_field, validate_day_number, validate_week_number, Day,
    DAY_FIELDS,
};

use colored::Colorize;
use serde_json::Value;
use std::path::PathBuf;

/// Handle `tequila day ...`
pub async fn handle_day(config: &Config, command: DayCommand) -> Result<()> {
    let api = build_api(config)?;
    let cancellation = interrupt_token();

    match command {
        DayCommand::Show { week, day, json } => {
            let mut view = DayAggregator::new(api, week, day)?.with_cancellation(cancellation);
            let day = view.load().await?;
            if json {
                print_json(day)?;
            } else {
                print_day(week, day);
            }
        }
        DayCommand::Set {
            week,
            day,
            field,
            value,
            file,
        } => {
            let raw = read_content(value, file).await?;
            let content = parse_field_content(&field, raw)?;
            let mut view = DayAggregator::new(api, week, day)?.with_cancellation(cancellation);
            let updated = view.update_field(&field, content).await?;
            println!(
                "{} {} ({}/{} fields complete)",
                "Updated".green(),
                field,
                updated.fields_complete,
                updated.total_fields
            );
        }
        DayCommand::Bundle { week, day } => {
            validate_week_number(week)?;
            validate_day_number(day)?;
            let bundle = api.get_day_flint_bundle(week, day).await?;
            print_json(&bundle)?;
        }
    }

    Ok(())
}

async fn read_content(value: Option<String>, file: Option<PathBuf>) -> Result<String> {
    match (value, file) {
        (Some(value), _) => Ok(value),
        (None, Some(path)) => Ok(tokio::fs::read_to_string(&path).await?),
        (None, None) => {
            Err(TequilaError::Config("Either --value or --file is required".to_string()).into())
        }
    }
}

/// Turn raw CLI input into field content
///
/// `.json` fields must hold valid JSON; every other field is stored as text.
fn parse_field_content(field: &str, raw: String) -> Result<Value> {
    if day_field(field).is_none() {
        return Err(TequilaError::InvalidField(field.to_string()).into());
    }
    if is_json_field(field) {
        let value = serde_json::from_str(&raw).map_err(TequilaError::Serialization)?;
        return Ok(value);
    }
    Ok(Value::String(raw))
}

fn print_day(week: u32, day: &Day) {
    let header = format!("Week {} Day {}", week, day.day);
    let completion = format!("{}/{} fields", day.fields_complete, day.total_fields);
    let completion = if day.validated {
        completion.green()
    } else {
        completion.yellow()
    };
    println!("\n{} ({})\n", header.bold(), completion);

    for def in DAY_FIELDS.iter() {
        let content = day.field(def.key).cloned().unwrap_or(Value::Null);
        let marker = if is_filled(&content) {
            "✓".green()
        } else {
            "·".dimmed()
        };
        println!(
            "{} {} {}",
            marker,
            def.label.bold(),
            format!("({})", def.key).dimmed()
        );
        if is_filled(&content) {
            for line in render_content(&content).lines() {
                println!("    {}", line);
            }
        }
        println!();
    }
}
