//! Usage commands

use crate::cli::UsageCommand;
use crate::commands::{build_api, interrupt_token, poll_interval, print_json};
use crate::config::Config;
use crate::error::Result;
use crate::usage::{UsageMonitor, UsagePoller, UsageSnapshot};

use colored::Colorize;
use prettytable::{format, row, Table};

/// Handle `tequila usage ...`
pub async fn handle_usage(config: &Config, command: UsageCommand) -> Result<()> {
    let api = build_api(config)?;
    let cancellation = interrupt_token();

    match command {
        UsageCommand::Show { json } => {
            let mut monitor = UsageMonitor::new(api).with_cancellation(cancellation);
            let snapshot = monitor.load().await?;
            if json {
                print_json(&snapshot.stats)?;
            } else {
                print_usage_table(snapshot);
            }
        }
        UsageCommand::Reset => {
            let mut monitor = UsageMonitor::new(api).with_cancellation(cancellation);
            let snapshot = monitor.reset().await?;
            println!("{}", "Usage statistics reset".green());
            print_usage_table(snapshot);
        }
        UsageCommand::Watch => {
            let poller = UsagePoller::spawn(api, poll_interval(config), &cancellation);
            let mut receiver = poller.subscribe();
            println!("Polling usage every {:?}, Ctrl-C to stop", poll_interval(config));

            while receiver.changed().await.is_ok() {
                let latest = receiver.borrow_and_update().clone();
                if let Some(snapshot) = latest {
                    print_usage_table(&snapshot);
                }
            }
            poller.stop().await;
        }
    }

    Ok(())
}

fn print_usage_table(snapshot: &UsageSnapshot) {
    let stats = &snapshot.stats;
    let mut table = Table::new();
    table.set_format(*format::consts::FORMAT_BORDERS_ONLY);
    table.add_row(row!["Metric".bold(), "Value".bold()]);
    table.add_row(row!["Requests", stats.total_requests]);
    table.add_row(row!["Tokens", stats.total_tokens]);
    table.add_row(row!["Cost (USD)", format!("${:.4}", stats.total_cost)]);
    for (name, value) in &stats.breakdown {
        table.add_row(row![name, value]);
    }

    println!(
        "\nUsage as of {}:",
        snapshot.fetched_at.format("%Y-%m-%d %H:%M:%S UTC")
    );
    table.printstd();
    println!();
}
