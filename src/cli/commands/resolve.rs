//! One-shot resolve command.

use console::style;

use super::helpers::spinner;
use crate::config::Settings;
use crate::services::Services;

/// Resolve `url` and print the result as JSON.
pub async fn cmd_resolve(settings: &Settings, url: &str, cookie: Option<&str>) -> anyhow::Result<()> {
    let services = Services::from_settings(settings);
    let supplied = cookie.map(str::trim).filter(|c| !c.is_empty());
    let effective = match supplied {
        Some(cookie) => Some(cookie.to_string()),
        None => services.cookies.load().await,
    };

    let pb = spinner(format!("Resolving {}...", url));
    let outcome = services.resolver.resolve(url, effective.as_deref()).await;
    pb.finish_and_clear();

    match outcome {
        Ok(result) => {
            if let Some(cookie) = supplied {
                services.cookies.save(cookie).await?;
            }
            println!("{}", serde_json::to_string_pretty(&result)?);
            Ok(())
        }
        Err(e) => {
            eprintln!("{} {}", style("✗").red(), e);
            if let Some(details) = e.details() {
                eprintln!("  {}", details);
            }
            Err(e.into())
        }
    }
}
