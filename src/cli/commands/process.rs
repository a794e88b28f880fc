//! Merge command.

use console::style;

use super::helpers::spinner;
use crate::config::Settings;
use crate::error::ResolveError;
use crate::services::Services;

/// Merge `format_id` of `url` and print where the file landed.
pub async fn cmd_process(settings: &Settings, url: &str, format_id: &str) -> anyhow::Result<()> {
    settings.ensure_directories()?;
    let services = Services::from_settings(settings);

    let pb = spinner(format!("Merging format {}...", format_id));
    let processed = services.processor.process(url, format_id).await;
    pb.finish_and_clear();

    match processed {
        Some(file) => {
            println!("{} {}", style("✓").green(), file.filename);
            println!("{}", file.path.display());
            Ok(())
        }
        None => {
            eprintln!("{} Processing failed (run with -v for details)", style("✗").red());
            Err(ResolveError::ProcessingFailed.into())
        }
    }
}
