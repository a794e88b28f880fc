//! Stored cookie management.

use console::style;

use crate::config::Settings;
use crate::services::cookie_store::{mask_token, CookieStore};

pub async fn cmd_show(settings: &Settings) -> anyhow::Result<()> {
    let store = CookieStore::new(&settings.cookie_file);
    match store.load().await {
        Some(token) => println!("{} ({})", mask_token(&token), store.path().display()),
        None => println!(
            "{} No stored cookie at {}",
            style("!").yellow(),
            store.path().display()
        ),
    }
    Ok(())
}

pub async fn cmd_set(settings: &Settings, token: &str) -> anyhow::Result<()> {
    let token = token.trim();
    if token.is_empty() {
        anyhow::bail!("Cookie must not be empty");
    }

    let store = CookieStore::new(&settings.cookie_file);
    store.save(token).await?;
    println!(
        "{} Stored cookie {} in {}",
        style("✓").green(),
        mask_token(token),
        store.path().display()
    );
    Ok(())
}
