pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use crate::config::CliConfig;
pub use crate::config::{cli::LocalStorage, Settings};

#[cfg(feature = "lambda")]
pub use crate::config::lambda::{DrawRequest, LambdaConfig, S3Storage};

pub use crate::adapters::ConsoleNotifier;
#[cfg(feature = "sns")]
pub use crate::adapters::SnsNotifier;

pub use crate::core::assignment::{
    Assignment, AssignmentEngine, AssignmentError, PermutationSource, RandomPermutations,
    ScriptedPermutations, DEFAULT_MAX_ATTEMPTS,
};
pub use crate::core::draw::SantaEngine;
pub use crate::domain::model::{DrawSummary, Notification, Participant, ParticipantId, Roster};
pub use crate::utils::error::{Result, SantaError};
