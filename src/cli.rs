//! Terminal output for the one-shot subcommands

use std::path::Path;

use anyhow::{Result, anyhow};
use colored::*;
use furnish_core::{
    fetch_analytics, recommendation::PRICE_UNAVAILABLE, AnalyticsView, Config, Conversation,
    HttpBackend, Message, MessageContent, Recommendation, Sender,
};

use crate::ui::group_thousands;

pub async fn ask(backend: &HttpBackend, prompt: &str) -> Result<()> {
    let mut conversation = Conversation::new();
    conversation
        .submit(backend, prompt)
        .await
        .map_err(|e| anyhow!("Cannot ask: {}", e))?;

    for message in conversation.messages().iter().skip(1) {
        print_message(message);
    }
    Ok(())
}

fn print_message(message: &Message) {
    match (message.sender, &message.content) {
        (Sender::User, MessageContent::Text(text)) => {
            println!("{} {}", "You:".bold().cyan(), text);
        }
        (Sender::User, MessageContent::Recommendations(_)) => {}
        (Sender::Assistant, MessageContent::Text(text)) => {
            println!("{} {}", "AI:".bold().yellow(), text.red());
        }
        (Sender::Assistant, MessageContent::Recommendations(recs)) if recs.is_empty() => {
            println!("{} {}", "AI:".bold().yellow(), "No matching products found".red());
        }
        (Sender::Assistant, MessageContent::Recommendations(recs)) => {
            println!(
                "\n{}",
                format!("Top {} Recommendations for You", recs.len()).bold().green()
            );
            println!("{}", "=".repeat(50).dimmed());
            for (i, rec) in recs.iter().enumerate() {
                print_recommendation(i + 1, rec);
            }
            println!("\n{}", "=".repeat(50).dimmed());
        }
    }
}

fn print_recommendation(position: usize, rec: &Recommendation) {
    println!(
        "\n{}. {}  {}",
        position.to_string().bold().blue(),
        rec.display_title().bold(),
        styled_price(&rec.display_price())
    );
    println!("   {} \"{}\"", "AI Says:".magenta(), rec.creative_description.italic());
    println!("   {}", rec.image_or_placeholder().dimmed());
}

fn styled_price(price: &str) -> ColoredString {
    if price == PRICE_UNAVAILABLE {
        price.dimmed()
    } else {
        price.bold().green()
    }
}

pub async fn analytics(backend: &HttpBackend) -> Result<()> {
    let view = fetch_analytics(backend).await;

    let AnalyticsView::Loaded { snapshot, charts } = view else {
        return Err(anyhow!(
            "Could not load analytics data from {}. Is the backend running?",
            backend.base_url()
        ));
    };

    println!("\n{}", "Catalog Analytics".bold().green());
    println!("{}", "=".repeat(50).dimmed());
    println!(
        "Total Products Indexed: {}",
        group_thousands(snapshot.total_products).bold()
    );
    match charts.top_brand() {
        Some(brand) => println!(
            "Top Brand: {} ({} products)",
            brand.name.bold().cyan(),
            group_thousands(brand.count)
        ),
        None => println!("Top Brand: {}", charts.top_brand_label().dimmed()),
    }

    println!("\n{}", "Top Categories by Product Count".bold().blue());
    for category in &charts.top_categories {
        println!("  {:<28} {}", category.name, group_thousands(category.value).bold());
    }

    println!("\n{}", "Average Price by Primary Material".bold().blue());
    for material in &charts.avg_price {
        println!(
            "  {:<28} {}",
            material.material,
            format!("${:.2}", material.avg_price).green()
        );
    }

    println!("\n{}", "Brand Distribution".bold().blue());
    if charts.brand_distribution.is_empty() {
        println!("  {}", "No brand data".red());
    }
    for brand in &charts.brand_distribution {
        println!("  {:<28} {}", brand.name, group_thousands(brand.count).bold());
    }
    println!("{}", "=".repeat(50).dimmed());

    Ok(())
}

pub async fn status(backend: &HttpBackend) -> Result<()> {
    match backend.health().await {
        Ok(health) => {
            println!("{} {}", backend.base_url().bold(), health.status.green());
            Ok(())
        }
        Err(e) => {
            println!("{} {}", backend.base_url().bold(), "unreachable".red());
            Err(anyhow!("Backend at {} is not reachable: {}", backend.base_url(), e))
        }
    }
}

pub fn config(api_override: Option<&str>, set_url: Option<String>, set_timeout: Option<u64>) -> Result<()> {
    let path = Config::get_config_path()?;
    let (config, saved) = update_config(&path, set_url, set_timeout)?;

    if saved {
        println!("{} {}", "Saved".green(), path.display());
    }
    println!("api_base_url: {}", config.resolve_api_url(api_override).bold());
    match config.request_timeout() {
        Some(timeout) => println!("request_timeout: {}s", timeout.as_secs()),
        None => println!("request_timeout: {}", "transport default".dimmed()),
    }
    Ok(())
}

/// Apply any new settings to the config file at `path`; returns the config and whether it was written
fn update_config(
    path: &Path,
    set_url: Option<String>,
    set_timeout: Option<u64>,
) -> Result<(Config, bool)> {
    let mut config = Config::load_from(path)
        .map_err(|e| anyhow!("Cannot read {}: {}", path.display(), e))?;

    if set_url.is_none() && set_timeout.is_none() {
        return Ok((config, false));
    }
    if let Some(url) = set_url {
        config.api_base_url = Some(url);
    }
    if let Some(secs) = set_timeout {
        config.request_timeout_secs = Some(secs);
    }
    config.save_to(path)?;
    Ok((config, true))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_update_config_saves_new_url() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("furnish").join("config.json");

        let (config, saved) =
            update_config(&path, Some("http://backend:9000".to_string()), None).unwrap();

        assert!(saved);
        assert_eq!(config.api_base_url.as_deref(), Some("http://backend:9000"));
        assert_eq!(Config::load_from(&path).unwrap().api_base_url.as_deref(), Some("http://backend:9000"));
    }

    #[test]
    fn test_update_config_without_changes_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");

        let (config, saved) = update_config(&path, None, None).unwrap();

        assert!(!saved);
        assert_eq!(config, Config::new());
        assert!(!path.exists());
    }

    #[test]
    fn test_update_config_keeps_malformed_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, "{ not json").unwrap();

        let result = update_config(&path, Some("http://backend:9000".to_string()), Some(5));

        assert!(result.is_err());
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "{ not json");
    }

    #[test]
    fn test_override_wins_over_saved_url() {
        let config = Config {
            api_base_url: Some("http://saved:1".to_string()),
            request_timeout_secs: None,
        };
        assert_eq!(config.resolve_api_url(Some("http://flag:2")), "http://flag:2");
    }

    #[test]
    fn test_unavailable_price_is_not_highlighted() {
        colored::control::set_override(false);
        assert_eq!(styled_price(PRICE_UNAVAILABLE).to_string(), "N/A");
        assert_eq!(styled_price("$42.00").to_string(), "$42.00");
    }
}
