//! Generation commands
//!
//! `generate week` drives a [`GenerationTracker`] and can follow backend
//! progress events and usage stats while the hydrate call is running. The
//! single-step commands call one generation endpoint each.

use crate::api::{CurriculumApi, EventStream, MessageResponse, ServerEvent, WeekHydrationResult};
use crate::cli::GenerateCommand;
use crate::commands::{build_api, interrupt_token, ping_interval, poll_interval};
use crate::config::Config;
use crate::error::Result;
use crate::generation::GenerationTracker;
use crate::models::{
    validate_day_number, validate_week_number, GenerationProgress, GenerationStatus,
};
use crate::usage::{UsagePoller, UsageSnapshot};

use colored::Colorize;
use prettytable::{format, row, Table};
use std::sync::Arc;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

/// Handle `tequila generate ...`
pub async fn handle_generate(config: &Config, command: GenerateCommand) -> Result<()> {
    let api = build_api(config)?;
    let cancellation = interrupt_token();

    match command {
        GenerateCommand::Week {
            week,
            watch_usage,
            events,
        } => generate_week(config, api, week, watch_usage, events, cancellation).await,
        GenerateCommand::Range { from, to } => {
            validate_week_number(from)?;
            validate_week_number(to)?;
            let tracker = GenerationTracker::new(api).with_cancellation(cancellation);
            let results = tracker.generate_week_range(from, to).await;
            print_range_results(from, to, &results);
            Ok(())
        }
        GenerateCommand::Spec { week } => {
            validate_week_number(week)?;
            print_step(&api.generate_week_spec(week).await?);
            Ok(())
        }
        GenerateCommand::RoleContext { week } => {
            validate_week_number(week)?;
            print_step(&api.generate_role_context(week).await?);
            Ok(())
        }
        GenerateCommand::Assets { week } => {
            validate_week_number(week)?;
            print_step(&api.generate_assets(week).await?);
            Ok(())
        }
        GenerateCommand::DayFields { week, day } => {
            validate_week_number(week)?;
            validate_day_number(day)?;
            print_step(&api.generate_day_fields(week, day).await?);
            Ok(())
        }
        GenerateCommand::Document { week, day } => {
            validate_week_number(week)?;
            validate_day_number(day)?;
            print_step(&api.generate_day_document(week, day).await?);
            Ok(())
        }
    }
}

async fn generate_week(
    config: &Config,
    api: Arc<dyn CurriculumApi>,
    week: u32,
    watch_usage: bool,
    follow_events: bool,
    cancellation: CancellationToken,
) -> Result<()> {
    let tracker = GenerationTracker::new(api.clone()).with_cancellation(cancellation.clone());

    let poller = watch_usage
        .then(|| UsagePoller::spawn(api.clone(), poll_interval(config), &cancellation));
    let mut usage_rx = poller.as_ref().map(UsagePoller::subscribe);

    let mut stream = None;
    if follow_events {
        match EventStream::connect(
            &config.api.base_url,
            config.api.api_key.as_deref(),
            ping_interval(config),
            cancellation.child_token(),
        )
        .await
        {
            Ok(s) => stream = Some(s),
            Err(e) => tracing::warn!("Continuing without live progress: {}", e),
        }
    }

    print_progress(&GenerationProgress::starting(week));

    let job = tracker.generate_week(week);
    tokio::pin!(job);

    let mut events_open = stream.is_some();
    let mut usage_open = usage_rx.is_some();
    let outcome = loop {
        tokio::select! {
            result = &mut job => break result,

            event = next_event(stream.as_mut()), if events_open => match event {
                Some(event) => {
                    if tracker.apply_event(&event) {
                        if let Some(progress) = tracker.state().progress {
                            print_progress(&progress);
                        }
                    } else {
                        print_side_event(&event);
                    }
                }
                None => events_open = false,
            },

            snapshot = next_usage(usage_rx.as_mut()), if usage_open => match snapshot {
                Some(snapshot) => print_usage_line(&snapshot),
                None => usage_open = false,
            },
        }
    };

    if let Some(stream) = stream {
        stream.close().await;
    }
    if let Some(poller) = poller {
        if let Some(snapshot) = poller.latest() {
            print_usage_line(&snapshot);
        }
        poller.stop().await;
    }

    if let Some(progress) = tracker.state().progress {
        print_progress(&progress);
    }
    let result = outcome?;
    print_hydration(&result);
    Ok(())
}

async fn next_event(stream: Option<&mut EventStream>) -> Option<ServerEvent> {
    match stream {
        Some(stream) => stream.next().await,
        None => std::future::pending().await,
    }
}

async fn next_usage(
    receiver: Option<&mut watch::Receiver<Option<UsageSnapshot>>>,
) -> Option<UsageSnapshot> {
    let Some(receiver) = receiver else {
        return std::future::pending().await;
    };
    loop {
        receiver.changed().await.ok()?;
        if let Some(snapshot) = receiver.borrow_and_update().clone() {
            return Some(snapshot);
        }
    }
}

fn progress_line(progress: &GenerationProgress) -> String {
    let status = match progress.status {
        GenerationStatus::Generating => progress.status.to_string().yellow(),
        GenerationStatus::Validating => progress.status.to_string().cyan(),
        GenerationStatus::Completed => progress.status.to_string().green(),
        GenerationStatus::Error => progress.status.to_string().red(),
    };
    let mut line = format!(
        "[week {}] day {} field {}/{} ({:.1}%) {} {}",
        progress.week,
        progress.day,
        progress.field,
        progress.total_fields,
        progress.percent(),
        status,
        progress.message
    );
    if let (Some(attempt), Some(max)) = (progress.attempt, progress.max_attempts) {
        line.push_str(&format!(" (attempt {}/{})", attempt, max));
    }
    line
}

fn print_progress(progress: &GenerationProgress) {
    println!("{}", progress_line(progress));
}

fn print_side_event(event: &ServerEvent) {
    match event {
        ServerEvent::Validation(v) => println!(
            "{} week {}: {} ({} errors, {} warnings)",
            "validation".cyan(),
            v.week,
            v.summary,
            v.error_count,
            v.warning_count
        ),
        ServerEvent::Error(e) => println!("{} {}", "backend error:".red(), e.message),
        ServerEvent::Complete(c) => {
            tracing::debug!("Backend reported completion for week {:?}", c.week)
        }
        ServerEvent::Progress(p) => tracing::debug!("Ignoring progress for week {}", p.week),
    }
}

fn print_usage_line(snapshot: &UsageSnapshot) {
    println!(
        "{} {} requests, {} tokens, ${:.4}",
        "usage".dimmed(),
        snapshot.stats.total_requests,
        snapshot.stats.total_tokens,
        snapshot.stats.total_cost
    );
}

fn print_step(response: &MessageResponse) {
    println!("{}", response.message.green());
    for (key, value) in &response.extra {
        println!("  {}: {}", key, value);
    }
}

fn print_hydration(result: &WeekHydrationResult) {
    let verdict = if result.validation.is_valid {
        "valid".green()
    } else {
        "invalid".red()
    };
    println!(
        "\nWeek {} hydrated: {} days, {} assets, {} ({})",
        result.week,
        result.components.days.len(),
        result.components.assets.len(),
        verdict,
        result.validation.summary
    );
}

fn print_range_results(from: u32, to: u32, results: &[WeekHydrationResult]) {
    let mut table = Table::new();
    table.set_format(*format::consts::FORMAT_BORDERS_ONLY);
    table.add_row(row![
        "Week".bold(),
        "Days".bold(),
        "Valid".bold(),
        "Summary".bold()
    ]);

    for result in results {
        table.add_row(row![
            result.week,
            result.components.days.len(),
            if result.validation.is_valid { "yes" } else { "no" },
            result.validation.summary
        ]);
    }

    let attempted = (to + 1).saturating_sub(from);
    println!("\nGenerated {} of {} weeks:", results.len(), attempted);
    table.printstd();

    let failed: Vec<String> = (from..=to)
        .filter(|w| !results.iter().any(|r| r.week == *w))
        .map(|w| w.to_string())
        .collect();
    if !failed.is_empty() {
        println!("{} {}", "Failed weeks:".red(), failed.join(", "));
    }
}
