pub mod cli;
pub mod lambda;
pub mod toml_config;

use crate::core::assignment::DEFAULT_MAX_ATTEMPTS;
use crate::core::message::validate_template;
use crate::core::ConfigProvider;
use crate::utils::error::Result;
use crate::utils::validation::{
    validate_aws_region, validate_country_prefix, validate_log_level, validate_non_empty_string,
    validate_path, validate_range, Validate,
};
use chrono::Datelike;
use std::path::PathBuf;
use toml_config::TomlConfig;

#[cfg(feature = "cli")]
use clap::{builder::BoolishValueParser, ArgAction, Parser};

pub const DEFAULT_FILE: &str = "list.csv";
pub const DEFAULT_BUDGET: &str = "20";
pub const DEFAULT_CURRENCY: &str = "€";
pub const DEFAULT_COUNTRY_PREFIX: &str = "+351";
pub const DEFAULT_SENDER_ID: &str = "SENDER001";
pub const DEFAULT_REGION: &str = "eu-west-1";
pub const DEFAULT_LOG_LEVEL: &str = "info";

#[cfg(feature = "cli")]
#[derive(Debug, Clone, Default, Parser)]
#[command(name = "secret-santa")]
#[command(about = "Draw Secret Santa pairs and text everyone their recipient")]
pub struct CliConfig {
    #[arg(long, env = "SECRET_SANTA_CONFIG", help = "TOML settings file")]
    pub config: Option<PathBuf>,

    #[arg(long, env = "SECRET_SANTA_FILE", help = "Participant CSV [default: list.csv]")]
    pub file: Option<String>,

    #[arg(long, env = "SECRET_SANTA_BUDGET")]
    pub budget: Option<String>,

    #[arg(long, env = "SECRET_SANTA_COIN")]
    pub currency: Option<String>,

    #[arg(long, env = "SECRET_SANTA_COUNTRY_PREFIX")]
    pub country_prefix: Option<String>,

    #[arg(long, env = "SECRET_SANTA_YEAR", help = "Event year [default: current year]")]
    pub year: Option<i32>,

    #[arg(long, env = "SECRET_SANTA_TEMPLATE", help = "Message text with {giver}, {recipient}, {budget}, {currency}, {year}")]
    pub template: Option<String>,

    #[arg(long, env = "SECRET_SANTA_MAX_ATTEMPTS")]
    pub max_attempts: Option<usize>,

    #[arg(long, env = "SECRET_SANTA_SEED", help = "Fixed random seed (reproducible draw)")]
    pub seed: Option<u64>,

    #[arg(
        long,
        env = "SECRET_SANTA_STRICT",
        action = ArgAction::SetTrue,
        value_parser = BoolishValueParser::new(),
        help = "Fail on any invalid CSV row"
    )]
    pub strict: bool,

    #[arg(
        long,
        env = "SECRET_SANTA_DRY_RUN",
        action = ArgAction::SetTrue,
        value_parser = BoolishValueParser::new(),
        help = "Print messages instead of sending them"
    )]
    pub dry_run: bool,

    #[arg(long, env = "SECRET_SANTA_SENDER_ID")]
    pub sender_id: Option<String>,

    #[arg(long, env = "SECRET_SANTA_REGION")]
    pub region: Option<String>,

    #[arg(long, env = "SECRET_SANTA_LOG_LEVEL")]
    pub log_level: Option<String>,

    #[arg(long, env = "SECRET_SANTA_LOG_FILE", help = "Also write logs to this file")]
    pub log_file: Option<PathBuf>,

    #[arg(short, long, help = "Enable verbose output")]
    pub verbose: bool,
}

/// Fully resolved settings for one draw.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub roster_path: String,
    pub budget: String,
    pub currency: String,
    pub year: i32,
    pub country_prefix: String,
    pub template: Option<String>,
    pub max_attempts: usize,
    pub seed: Option<u64>,
    pub strict_roster: bool,
    pub dry_run: bool,
    pub sender_id: Option<String>,
    pub region: String,
    pub log_level: String,
    pub log_file: Option<PathBuf>,
    pub verbose: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            roster_path: DEFAULT_FILE.to_string(),
            budget: DEFAULT_BUDGET.to_string(),
            currency: DEFAULT_CURRENCY.to_string(),
            year: chrono::Local::now().year(),
            country_prefix: DEFAULT_COUNTRY_PREFIX.to_string(),
            template: None,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            seed: None,
            strict_roster: false,
            dry_run: false,
            sender_id: Some(DEFAULT_SENDER_ID.to_string()),
            region: DEFAULT_REGION.to_string(),
            log_level: DEFAULT_LOG_LEVEL.to_string(),
            log_file: None,
            verbose: false,
        }
    }
}

impl Settings {
    /// Layers the optional TOML file over the built-in defaults.
    pub fn from_toml(file: &TomlConfig) -> Self {
        let defaults = Self::default();
        Self {
            roster_path: file.draw.file.clone().unwrap_or(defaults.roster_path),
            budget: file.event.budget.clone().unwrap_or(defaults.budget),
            currency: file.event.currency.clone().unwrap_or(defaults.currency),
            year: file.event.year.unwrap_or(defaults.year),
            country_prefix: file
                .delivery
                .country_prefix
                .clone()
                .unwrap_or(defaults.country_prefix),
            template: file.event.template.clone(),
            max_attempts: file.draw.max_attempts.unwrap_or(defaults.max_attempts),
            seed: file.draw.seed,
            strict_roster: file.draw.strict.unwrap_or(defaults.strict_roster),
            dry_run: file.delivery.dry_run.unwrap_or(defaults.dry_run),
            sender_id: file.delivery.sender_id.clone().or(defaults.sender_id),
            region: file.delivery.region.clone().unwrap_or(defaults.region),
            log_level: file.logging.level.clone().unwrap_or(defaults.log_level),
            log_file: file.logging.file.clone(),
            verbose: defaults.verbose,
        }
    }

    /// Command line and environment values override the file.
    #[cfg(feature = "cli")]
    pub fn resolve(cli: &CliConfig, file: Option<&TomlConfig>) -> Self {
        let base = file.map(Self::from_toml).unwrap_or_default();
        Self {
            roster_path: cli.file.clone().unwrap_or(base.roster_path),
            budget: cli.budget.clone().unwrap_or(base.budget),
            currency: cli.currency.clone().unwrap_or(base.currency),
            year: cli.year.unwrap_or(base.year),
            country_prefix: cli.country_prefix.clone().unwrap_or(base.country_prefix),
            template: cli.template.clone().or(base.template),
            max_attempts: cli.max_attempts.unwrap_or(base.max_attempts),
            seed: cli.seed.or(base.seed),
            strict_roster: cli.strict || base.strict_roster,
            dry_run: cli.dry_run || base.dry_run,
            sender_id: cli.sender_id.clone().or(base.sender_id),
            region: cli.region.clone().unwrap_or(base.region),
            log_level: cli.log_level.clone().unwrap_or(base.log_level),
            log_file: cli.log_file.clone().or(base.log_file),
            verbose: cli.verbose,
        }
    }

    /// Reads the `--config` file when one was given.
    #[cfg(feature = "cli")]
    pub fn load(cli: &CliConfig) -> Result<Self> {
        let file = match &cli.config {
            Some(path) => Some(TomlConfig::from_file(path)?),
            None => None,
        };
        Ok(Self::resolve(cli, file.as_ref()))
    }
}

impl ConfigProvider for Settings {
    fn roster_path(&self) -> &str {
        &self.roster_path
    }

    fn budget(&self) -> &str {
        &self.budget
    }

    fn currency(&self) -> &str {
        &self.currency
    }

    fn year(&self) -> i32 {
        self.year
    }

    fn country_prefix(&self) -> &str {
        &self.country_prefix
    }

    fn template(&self) -> Option<&str> {
        self.template.as_deref()
    }

    fn max_attempts(&self) -> usize {
        self.max_attempts
    }

    fn seed(&self) -> Option<u64> {
        self.seed
    }

    fn strict_roster(&self) -> bool {
        self.strict_roster
    }

    fn dry_run(&self) -> bool {
        self.dry_run
    }
}

impl Validate for Settings {
    fn validate(&self) -> Result<()> {
        validate_path("file", &self.roster_path)?;
        validate_non_empty_string("budget", &self.budget)?;
        validate_non_empty_string("currency", &self.currency)?;
        validate_range("year", self.year, 1900, 9999)?;
        validate_country_prefix("country_prefix", &self.country_prefix)?;
        validate_range("max_attempts", self.max_attempts, 1, 1_000_000)?;
        validate_aws_region("region", &self.region)?;
        validate_log_level("log_level", &self.log_level)?;

        if let Some(template) = &self.template {
            validate_template(template)?;
        }

        tracing::debug!("✅ Configuration validation passed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let settings = Settings::default();

        assert_eq!(settings.roster_path, "list.csv");
        assert_eq!(settings.budget, "20");
        assert_eq!(settings.currency, "€");
        assert_eq!(settings.country_prefix, "+351");
        assert_eq!(settings.max_attempts, 1000);
        assert!(!settings.dry_run);
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_toml_overrides_defaults() {
        let file = TomlConfig::from_toml_str(
            "[event]\nbudget = \"30\"\nyear = 2030\n[delivery]\ndry_run = true\n",
        )
        .unwrap();

        let settings = Settings::from_toml(&file);

        assert_eq!(settings.budget, "30");
        assert_eq!(settings.year, 2030);
        assert!(settings.dry_run);
        assert_eq!(settings.currency, "€");
    }

    #[cfg(feature = "cli")]
    #[test]
    fn test_cli_overrides_toml() {
        let file = TomlConfig::from_toml_str(
            "[draw]\nfile = \"toml.csv\"\nmax_attempts = 50\n[event]\nbudget = \"30\"\n",
        )
        .unwrap();
        let cli = CliConfig::parse_from([
            "secret-santa",
            "--file",
            "cli.csv",
            "--dry-run",
            "--seed",
            "9",
        ]);

        let settings = Settings::resolve(&cli, Some(&file));

        assert_eq!(settings.roster_path, "cli.csv");
        assert_eq!(settings.budget, "30");
        assert_eq!(settings.max_attempts, 50);
        assert_eq!(settings.seed, Some(9));
        assert!(settings.dry_run);
    }

    #[cfg(feature = "cli")]
    #[test]
    fn test_boolean_env_values_like_1_and_yes_enable_flags() {
        std::env::set_var("SECRET_SANTA_DRY_RUN", "1");
        std::env::set_var("SECRET_SANTA_STRICT", "yes");

        let parsed = CliConfig::try_parse_from(["secret-santa"]);

        std::env::remove_var("SECRET_SANTA_DRY_RUN");
        std::env::remove_var("SECRET_SANTA_STRICT");

        let cli = parsed.unwrap();
        assert!(cli.dry_run);
        assert!(cli.strict);
    }

    #[cfg(feature = "cli")]
    #[test]
    fn test_dry_run_flag_without_value() {
        let cli = CliConfig::try_parse_from(["secret-santa", "--dry-run"]).unwrap();
        assert!(cli.dry_run);
    }

    #[test]
    fn test_invalid_settings_are_rejected() {
        let mut settings = Settings::default();
        settings.country_prefix = "351".to_string();
        assert!(settings.validate().is_err());

        let mut settings = Settings::default();
        settings.max_attempts = 0;
        assert!(settings.validate().is_err());

        let mut settings = Settings::default();
        settings.template = Some("Hi {giver}".to_string());
        assert!(settings.validate().is_err());
    }
}
