use crate::domain::model::Notification;
use crate::domain::ports::Notifier;
use crate::utils::error::{Result, SantaError};
use async_trait::async_trait;
use std::io::{Stdout, Write};
use std::sync::Mutex;

/// Dry-run delivery: writes every message instead of sending it.
pub struct ConsoleNotifier<W: Write + Send> {
    out: Mutex<W>,
}

impl ConsoleNotifier<Stdout> {
    pub fn stdout() -> Self {
        Self::new(std::io::stdout())
    }
}

impl<W: Write + Send> ConsoleNotifier<W> {
    pub fn new(out: W) -> Self {
        Self {
            out: Mutex::new(out),
        }
    }

    pub fn into_inner(self) -> W {
        match self.out.into_inner() {
            Ok(out) => out,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

#[async_trait]
impl<W: Write + Send> Notifier for ConsoleNotifier<W> {
    async fn send(&self, notification: &Notification) -> Result<()> {
        let mut out = self.out.lock().map_err(|_| SantaError::DeliveryError {
            destination: notification.masked_phone(),
            message: "console writer lock poisoned".to_string(),
        })?;

        writeln!(out, "To: {}", notification.phone_number)?;
        writeln!(out, "Message: {}\n", notification.body)?;
        Ok(())
    }

    fn name(&self) -> &'static str {
        "dry-run console"
    }
}
