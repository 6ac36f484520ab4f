pub mod assignment;
pub mod draw;
pub mod message;
pub mod roster;

pub use crate::domain::model::{DrawSummary, Notification, Participant, ParticipantId, Roster};
pub use crate::domain::ports::{ConfigProvider, Notifier, Storage};
pub use crate::utils::error::Result;
