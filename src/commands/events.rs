//! `tequila events`: print backend events until interrupted

use crate::api::{EventStream, ServerEvent};
use crate::commands::{interrupt_token, ping_interval};
use crate::config::Config;
use crate::error::Result;

use colored::Colorize;

/// Follow the backend event socket
pub async fn follow_events(config: &Config) -> Result<()> {
    let cancellation = interrupt_token();
    let mut stream = EventStream::connect(
        &config.api.base_url,
        config.api.api_key.as_deref(),
        ping_interval(config),
        cancellation.clone(),
    )
    .await?;

    println!("Listening for backend events, Ctrl-C to stop");
    while let Some(event) = stream.next().await {
        println!("{}", describe(&event));
    }

    stream.close().await;
    Ok(())
}

fn describe(event: &ServerEvent) -> String {
    match event {
        ServerEvent::Progress(p) => format!(
            "{} week {} day {} field {}/{} {}",
            "progress".yellow(),
            p.week,
            p.day,
            p.field,
            p.total_fields,
            p.message
        ),
        ServerEvent::Validation(v) => format!(
            "{} week {} {} {}",
            "validation".cyan(),
            v.week,
            if v.is_valid { "valid" } else { "invalid" },
            v.summary
        ),
        ServerEvent::Error(e) => match e.week {
            Some(week) => format!("{} week {} {}", "error".red(), week, e.message),
            None => format!("{} {}", "error".red(), e.message),
        },
        ServerEvent::Complete(c) => match c.week {
            Some(week) => format!("{} week {}", "complete".green(), week),
            None => "complete".green().to_string(),
        },
    }
}
