use owo_colors::OwoColorize;
use owo_colors::Stream::Stdout;

use game_ledger_core::DataSource;
use game_ledger_scraper::{ApiKey, ApiKeys};

/// Key an adapter cannot run without.
pub(crate) fn required_key(source: DataSource) -> Option<ApiKey> {
    match source {
        DataSource::MobyGames => Some(ApiKey::MobyGames),
        _ => None,
    }
}

/// Run the sources command.
pub(crate) fn run_sources() {
    let keys = ApiKeys::load();
    log::info!("Known sources:");
    log::info!("");
    for &source in DataSource::all() {
        let state = if !source.has_adapter() {
            "no adapter".if_supports_color(Stdout, |t| t.dimmed()).to_string()
        } else {
            match required_key(source) {
                Some(key) if keys.get(key).is_none() => format!(
                    "{} (set {})",
                    "missing key".if_supports_color(Stdout, |t| t.yellow()),
                    key.env_var()
                ),
                _ => "ready".if_supports_color(Stdout, |t| t.green()).to_string(),
            }
        };
        log::info!(
            "  {} [{}] {}",
            source.short_name().if_supports_color(Stdout, |t| t.bold()),
            source.display_name().if_supports_color(Stdout, |t| t.cyan()),
            state
        );
        if !source.aliases().is_empty() {
            log::info!("    Aliases: {}", source.aliases().join(", "));
        }
    }
}
