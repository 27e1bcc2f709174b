use anyhow::Result;
use bbsearch_config::Config;
use bbsearch_security::MASK;

pub fn handle(config: &Config) -> Result<()> {
    println!("Config file: {}", Config::config_path().display());
    println!();
    print!("{}", toml::to_string_pretty(&masked(config))?);

    if let Err(e) = config.validate() {
        eprintln!("⚠ {}", e);
    }
    Ok(())
}

/// Copy of `config` safe to print.
fn masked(config: &Config) -> Config {
    let mut shown = config.clone();
    if !shown.bitbucket.app_password.is_empty() {
        shown.bitbucket.app_password = MASK.to_string();
    }
    shown
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_masked_hides_app_password() {
        let mut config = Config::default();
        config.bitbucket.username = "bot".to_string();
        config.bitbucket.app_password = "hunter2".to_string();

        let shown = masked(&config);
        assert_eq!(shown.bitbucket.app_password, MASK);
        assert_eq!(shown.bitbucket.username, "bot");

        let text = toml::to_string_pretty(&shown).unwrap();
        assert!(!text.contains("hunter2"));
    }

    #[test]
    fn test_masked_leaves_empty_password() {
        let shown = masked(&Config::default());
        assert!(shown.bitbucket.app_password.is_empty());
    }
}
