#[cfg(feature = "sns")]
use crate::domain::model::Notification;
#[cfg(feature = "sns")]
use crate::domain::ports::Notifier;
#[cfg(feature = "sns")]
use crate::utils::error::{Result, SantaError};
#[cfg(feature = "sns")]
use async_trait::async_trait;
#[cfg(feature = "sns")]
use aws_config::BehaviorVersion;
#[cfg(feature = "sns")]
use aws_sdk_sns::config::Region;
#[cfg(feature = "sns")]
use aws_sdk_sns::error::DisplayErrorContext;
#[cfg(feature = "sns")]
use aws_sdk_sns::types::MessageAttributeValue;
#[cfg(feature = "sns")]
use aws_sdk_sns::Client as SnsClient;

/// Carriers commonly truncate alphanumeric sender ids past this length.
#[cfg(feature = "sns")]
pub const MAX_SENDER_ID_LEN: usize = 11;

#[cfg(feature = "sns")]
#[derive(Debug, Clone)]
pub struct SnsNotifier {
    client: SnsClient,
    sender_id: Option<String>,
}

#[cfg(feature = "sns")]
impl SnsNotifier {
    pub fn new(client: SnsClient, sender_id: Option<String>) -> Self {
        let sender_id = sender_id.filter(|id| !id.trim().is_empty());
        match &sender_id {
            None => tracing::warn!(
                "No SMS sender id set, messages may appear from a generic originator"
            ),
            Some(id) if id.len() > MAX_SENDER_ID_LEN => tracing::warn!(
                "Sender id '{}' longer than {} chars, may be truncated by carriers",
                id,
                MAX_SENDER_ID_LEN
            ),
            Some(_) => {}
        }
        Self { client, sender_id }
    }

    /// 使用預設的 AWS 憑證鏈建立客戶端
    pub async fn from_region(region: &str, sender_id: Option<String>) -> Self {
        let config = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(region.to_string()))
            .load()
            .await;
        tracing::info!("Initialized SNS client in region '{}'", region);
        Self::new(SnsClient::new(&config), sender_id)
    }

    fn attribute(value: &str, destination: &str) -> Result<MessageAttributeValue> {
        MessageAttributeValue::builder()
            .data_type("String")
            .string_value(value)
            .build()
            .map_err(|e| SantaError::DeliveryError {
                destination: destination.to_string(),
                message: format!("Failed to build message attribute: {}", e),
            })
    }
}

#[cfg(feature = "sns")]
#[async_trait]
impl Notifier for SnsNotifier {
    async fn send(&self, notification: &Notification) -> Result<()> {
        let destination = notification.masked_phone();

        let mut request = self
            .client
            .publish()
            .phone_number(&notification.phone_number)
            .message(&notification.body)
            .message_attributes(
                "AWS.SNS.SMS.SMSType",
                Self::attribute("Transactional", &destination)?,
            );
        if let Some(sender_id) = &self.sender_id {
            request = request.message_attributes(
                "AWS.SNS.SMS.SenderID",
                Self::attribute(sender_id, &destination)?,
            );
        }

        let output = request.send().await.map_err(|e| SantaError::DeliveryError {
            destination: destination.clone(),
            message: DisplayErrorContext(&e).to_string(),
        })?;

        tracing::debug!(
            "Published SMS to {}; message id: {:?}",
            destination,
            output.message_id()
        );
        Ok(())
    }

    fn name(&self) -> &'static str {
        "AWS SNS"
    }
}
