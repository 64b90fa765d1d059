use owo_colors::OwoColorize;
use owo_colors::Stream::Stdout;

use game_ledger_batch::RunConfig;
use game_ledger_core::settings;
use game_ledger_scraper::{ApiKey, ApiKeys};

fn mask_value(s: &str) -> String {
    if s.chars().count() <= 2 {
        "****".to_string()
    } else {
        format!("{}****", s.chars().take(2).collect::<String>())
    }
}

/// Show the config file, run settings and API key sources.
pub(crate) fn run_config_show() {
    let path = settings::config_path();

    log::info!(
        "{}",
        "game-ledger Configuration".if_supports_color(Stdout, |t| t.bold()),
    );
    log::info!("");

    if path.exists() {
        log::info!(
            "  Config file: {} {}",
            path.display().if_supports_color(Stdout, |t| t.cyan()),
            "(exists)".if_supports_color(Stdout, |t| t.green()),
        );
    } else {
        log::info!(
            "  Config file: {} {}",
            path.display().if_supports_color(Stdout, |t| t.cyan()),
            "(not found)".if_supports_color(Stdout, |t| t.dimmed()),
        );
    }
    log::info!("");

    match RunConfig::load() {
        Ok(config) => {
            let sources: Vec<&str> = config.sources.iter().map(|s| s.short_name()).collect();
            log::info!("  {}", "[run]".if_supports_color(Stdout, |t| t.bold()));
            log::info!("  batch_size:   {}", config.batch_size);
            log::info!("  output_dir:   {}", config.output_dir.display());
            log::info!("  sources:      {}", sources.join(", "));
            log::info!("  retry_errors: {}", config.retry_errors);
        }
        Err(e) => log::warn!("  [run] table is invalid: {}", e),
    }
    log::info!("");

    let keys = ApiKeys::load();
    log::info!("  {}", "[keys]".if_supports_color(Stdout, |t| t.bold()));
    for &key in ApiKey::all() {
        let source = format!("({})", keys.source_of(key));
        let name = format!("{}:", key.config_key());
        match keys.get(key) {
            Some(value) => log::info!(
                "  {} {} {}",
                name.if_supports_color(Stdout, |t| t.cyan()),
                mask_value(value),
                source.if_supports_color(Stdout, |t| t.dimmed()),
            ),
            None => log::info!(
                "  {} {} {}",
                name.if_supports_color(Stdout, |t| t.cyan()),
                "not set".if_supports_color(Stdout, |t| t.yellow()),
                format!("(env ${})", key.env_var()).if_supports_color(Stdout, |t| t.dimmed()),
            ),
        }
    }
}

/// Print the config file path.
pub(crate) fn run_config_path() {
    println!("{}", settings::config_path().display());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn secrets_are_masked() {
        assert_eq!(mask_value("abcdef"), "ab****");
        assert_eq!(mask_value("ab"), "****");
        assert_eq!(mask_value("ключ"), "кл****");
    }
}
