use crate::core::assignment::{Assignment, AssignmentEngine, RandomPermutations};
use crate::core::message::{build_notifications, MessageTemplate};
use crate::core::roster::load_roster;
use crate::domain::model::{DrawSummary, Participant};
use crate::domain::ports::{ConfigProvider, Notifier, Storage};
use crate::utils::error::Result;

/// Runs one draw: roster → assignment → messages → delivery.
pub struct SantaEngine<S: Storage, N: Notifier, C: ConfigProvider> {
    storage: S,
    notifier: N,
    config: C,
}

impl<S: Storage, N: Notifier, C: ConfigProvider> SantaEngine<S, N, C> {
    pub fn new(storage: S, notifier: N, config: C) -> Self {
        Self {
            storage,
            notifier,
            config,
        }
    }

    pub async fn run(&self) -> Result<DrawSummary> {
        tracing::info!(
            "🎄 Starting Secret Santa draw (file='{}', budget={}{}, year={}, dry_run={})",
            self.config.roster_path(),
            self.config.budget(),
            self.config.currency(),
            self.config.year(),
            self.config.dry_run()
        );

        // 讀取名單
        let roster = load_roster(
            &self.storage,
            self.config.roster_path(),
            self.config.strict_roster(),
            self.config.country_prefix(),
        )
        .await?;
        for row in &roster.rejected {
            tracing::error!("Skipped invalid entry at line {}: {}", row.line, row.reason);
        }
        tracing::info!(
            "Loaded {} participants from '{}'",
            roster.participants.len(),
            self.config.roster_path()
        );

        // 抽籤
        let assignment = self.draw(&roster.participants)?;
        tracing::debug!("Found valid assignment on attempt {}", assignment.attempts());

        // 產生訊息
        let mut template = MessageTemplate::new(
            self.config.budget(),
            self.config.currency(),
            self.config.year(),
        )?;
        if let Some(custom) = self.config.template() {
            template = template.with_template(custom)?;
        }
        let notifications = build_notifications(
            &assignment,
            &roster.participants,
            &template,
            self.config.country_prefix(),
        );

        // 寄送
        tracing::info!(
            "Delivering {} messages via {}",
            notifications.len(),
            self.notifier.name()
        );
        let mut sent = 0;
        for notification in &notifications {
            tracing::debug!("Message for {}: {}", notification.giver, notification.body);
            tracing::info!(
                "Sending SMS to {}, phone <{}>",
                notification.giver,
                notification.masked_phone()
            );

            if let Err(e) = self.notifier.send(notification).await {
                tracing::error!(
                    "Delivery stopped after {} of {} messages",
                    sent,
                    notifications.len()
                );
                return Err(e);
            }
            sent += 1;
        }

        tracing::info!("✅ Draw completed, {} messages delivered", sent);

        Ok(DrawSummary {
            participants: roster.participants.len(),
            attempts: assignment.attempts(),
            messages_sent: sent,
            dry_run: self.config.dry_run(),
        })
    }

    fn draw(&self, participants: &[Participant]) -> Result<Assignment> {
        let engine = AssignmentEngine::with_max_attempts(self.config.max_attempts());

        let assignment = match self.config.seed() {
            Some(seed) => {
                tracing::warn!("Using fixed seed {}, the draw is reproducible", seed);
                engine.assign(participants, &mut RandomPermutations::seeded(seed))?
            }
            None => engine.assign(participants, &mut RandomPermutations::from_entropy())?,
        };
        Ok(assignment)
    }
}
