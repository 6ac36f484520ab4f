#[cfg(feature = "lambda")]
use crate::config::Settings;
#[cfg(feature = "lambda")]
use crate::core::{ConfigProvider, Storage};
#[cfg(feature = "lambda")]
use crate::utils::error::{Result, SantaError};
#[cfg(feature = "lambda")]
use aws_sdk_s3::Client as S3Client;
#[cfg(feature = "lambda")]
use serde::Deserialize;

/// Lambda invocation payload. Every field overrides the environment.
#[cfg(feature = "lambda")]
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DrawRequest {
    pub bucket: Option<String>,
    pub key: Option<String>,
    pub dry_run: Option<bool>,
    pub budget: Option<String>,
    pub year: Option<i32>,
}

#[cfg(feature = "lambda")]
#[derive(Debug, Clone)]
pub struct LambdaConfig {
    pub settings: Settings,
    pub bucket: Option<String>,
}

#[cfg(feature = "lambda")]
impl LambdaConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut settings = Settings::default();

        if let Some(key) = lookup("SECRET_SANTA_KEY") {
            settings.roster_path = key;
        }
        if let Some(budget) = lookup("SECRET_SANTA_BUDGET") {
            settings.budget = budget;
        }
        if let Some(currency) = lookup("SECRET_SANTA_COIN") {
            settings.currency = currency;
        }
        if let Some(prefix) = lookup("SECRET_SANTA_COUNTRY_PREFIX") {
            settings.country_prefix = prefix;
        }
        if let Some(year) = lookup("SECRET_SANTA_YEAR").and_then(|v| v.parse().ok()) {
            settings.year = year;
        }
        if let Some(template) = lookup("SECRET_SANTA_TEMPLATE") {
            settings.template = Some(template);
        }
        if let Some(attempts) = lookup("SECRET_SANTA_MAX_ATTEMPTS").and_then(|v| v.parse().ok()) {
            settings.max_attempts = attempts;
        }
        if let Some(sender_id) = lookup("SECRET_SANTA_SENDER_ID") {
            settings.sender_id = Some(sender_id);
        }
        if let Some(region) = lookup("SECRET_SANTA_REGION").or_else(|| lookup("AWS_REGION")) {
            settings.region = region;
        }
        settings.dry_run = lookup("SECRET_SANTA_DRY_RUN")
            .map(|v| is_truthy(&v))
            .unwrap_or(false);
        settings.strict_roster = lookup("SECRET_SANTA_STRICT")
            .map(|v| is_truthy(&v))
            .unwrap_or(false);

        Self {
            settings,
            bucket: lookup("SECRET_SANTA_BUCKET"),
        }
    }

    pub fn apply_request(&mut self, request: &DrawRequest) {
        if let Some(bucket) = &request.bucket {
            self.bucket = Some(bucket.clone());
        }
        if let Some(key) = &request.key {
            self.settings.roster_path = key.clone();
        }
        if let Some(dry_run) = request.dry_run {
            self.settings.dry_run = dry_run;
        }
        if let Some(budget) = &request.budget {
            self.settings.budget = budget.clone();
        }
        if let Some(year) = request.year {
            self.settings.year = year;
        }
    }

    pub fn bucket(&self) -> Result<&str> {
        crate::utils::validation::validate_required_field("bucket", &self.bucket)
            .map(String::as_str)
    }
}

#[cfg(feature = "lambda")]
fn is_truthy(value: &str) -> bool {
    matches!(
        value.trim().to_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

#[cfg(feature = "lambda")]
impl ConfigProvider for LambdaConfig {
    fn roster_path(&self) -> &str {
        self.settings.roster_path()
    }

    fn budget(&self) -> &str {
        self.settings.budget()
    }

    fn currency(&self) -> &str {
        self.settings.currency()
    }

    fn year(&self) -> i32 {
        self.settings.year()
    }

    fn country_prefix(&self) -> &str {
        self.settings.country_prefix()
    }

    fn template(&self) -> Option<&str> {
        self.settings.template()
    }

    fn max_attempts(&self) -> usize {
        self.settings.max_attempts()
    }

    fn seed(&self) -> Option<u64> {
        None
    }

    fn strict_roster(&self) -> bool {
        self.settings.strict_roster()
    }

    fn dry_run(&self) -> bool {
        self.settings.dry_run()
    }
}

#[cfg(feature = "lambda")]
impl crate::utils::validation::Validate for LambdaConfig {
    fn validate(&self) -> Result<()> {
        use crate::utils::validation::Validate;

        validate_s3_bucket_name("bucket", self.bucket()?)?;
        self.settings.validate()?;

        tracing::info!("✅ Lambda configuration validation passed");
        Ok(())
    }
}

#[cfg(feature = "lambda")]
fn validate_s3_bucket_name(field_name: &str, bucket_name: &str) -> Result<()> {
    if bucket_name.len() < 3 || bucket_name.len() > 63 {
        return Err(SantaError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: bucket_name.to_string(),
            reason: "S3 bucket name must be between 3 and 63 characters".to_string(),
        });
    }

    if !bucket_name
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-' || c == '.')
    {
        return Err(SantaError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: bucket_name.to_string(),
            reason: "S3 bucket name can only contain lowercase letters, numbers, hyphens, and dots"
                .to_string(),
        });
    }

    if bucket_name.starts_with('-') || bucket_name.ends_with('-') {
        return Err(SantaError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: bucket_name.to_string(),
            reason: "S3 bucket name cannot start or end with a hyphen".to_string(),
        });
    }

    Ok(())
}

/// Reads the roster CSV from an S3 bucket.
#[cfg(feature = "lambda")]
#[derive(Debug, Clone)]
pub struct S3Storage {
    client: S3Client,
    bucket: String,
}

#[cfg(feature = "lambda")]
impl S3Storage {
    pub fn new(client: S3Client, bucket: String) -> Self {
        Self { client, bucket }
    }
}

#[cfg(feature = "lambda")]
impl Storage for S3Storage {
    async fn read_file(&self, path: &str) -> Result<Vec<u8>> {
        let resp = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(path)
            .send()
            .await
            .map_err(|e| SantaError::RosterError {
                message: format!(
                    "Failed to read s3://{}/{}: {}",
                    self.bucket,
                    path,
                    aws_sdk_s3::error::DisplayErrorContext(&e)
                ),
            })?;

        let data = resp.body.collect().await.map_err(|e| SantaError::RosterError {
            message: format!("Failed to collect S3 data: {}", e),
        })?;

        Ok(data.into_bytes().to_vec())
    }
}

#[cfg(all(test, feature = "lambda"))]
mod tests {
    use super::*;
    use crate::utils::validation::Validate;
    use std::collections::HashMap;

    fn config_from(vars: &[(&str, &str)]) -> LambdaConfig {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        LambdaConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_from_lookup_reads_variables() {
        let config = config_from(&[
            ("SECRET_SANTA_BUCKET", "santa-lists"),
            ("SECRET_SANTA_KEY", "2025/list.csv"),
            ("SECRET_SANTA_DRY_RUN", "yes"),
            ("SECRET_SANTA_YEAR", "2025"),
            ("AWS_REGION", "us-east-1"),
        ]);

        assert_eq!(config.bucket().unwrap(), "santa-lists");
        assert_eq!(config.roster_path(), "2025/list.csv");
        assert!(config.dry_run());
        assert_eq!(config.year(), 2025);
        assert_eq!(config.settings.region, "us-east-1");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_request_overrides_environment() {
        let mut config = config_from(&[("SECRET_SANTA_BUCKET", "santa-lists")]);
        let request: DrawRequest =
            serde_json::from_str(r#"{"key": "office.csv", "dry_run": true, "budget": "15"}"#)
                .unwrap();

        config.apply_request(&request);

        assert_eq!(config.roster_path(), "office.csv");
        assert_eq!(config.budget(), "15");
        assert!(config.dry_run());
    }

    #[test]
    fn test_missing_bucket_fails_validation() {
        let config = config_from(&[]);
        assert!(matches!(
            config.validate(),
            Err(SantaError::MissingConfigError { .. })
        ));
    }

    #[test]
    fn test_bucket_name_rules() {
        assert!(validate_s3_bucket_name("bucket", "santa-lists").is_ok());
        assert!(validate_s3_bucket_name("bucket", "Santa").is_err());
        assert!(validate_s3_bucket_name("bucket", "-santa").is_err());
        assert!(validate_s3_bucket_name("bucket", "ab").is_err());
    }
}
