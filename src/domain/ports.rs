use crate::domain::model::Notification;
use crate::utils::error::Result;
use async_trait::async_trait;

pub trait Storage: Send + Sync {
    fn read_file(&self, path: &str) -> impl std::future::Future<Output = Result<Vec<u8>>> + Send;
}

/// Settings every draw needs, regardless of where they came from.
pub trait ConfigProvider: Send + Sync {
    fn roster_path(&self) -> &str;
    fn budget(&self) -> &str;
    fn currency(&self) -> &str;
    fn year(&self) -> i32;
    fn country_prefix(&self) -> &str;
    fn template(&self) -> Option<&str>;
    fn max_attempts(&self) -> usize;
    fn seed(&self) -> Option<u64>;
    fn strict_roster(&self) -> bool;
    fn dry_run(&self) -> bool;
}

#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, notification: &Notification) -> Result<()>;

    /// Short name used in logs.
    fn name(&self) -> &'static str;
}
