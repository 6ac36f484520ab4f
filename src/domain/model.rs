use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ParticipantId(pub u32);

impl fmt::Display for ParticipantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Participant {
    pub id: ParticipantId,
    pub name: String,
    /// Phone number as written in the roster. The assignment engine never reads it.
    pub contact: String,
    pub exclusion_group: Option<String>,
}

impl Participant {
    pub fn single(id: u32, name: impl Into<String>, contact: impl Into<String>) -> Self {
        Self {
            id: ParticipantId(id),
            name: name.into(),
            contact: contact.into(),
            exclusion_group: None,
        }
    }

    pub fn in_group(
        id: u32,
        name: impl Into<String>,
        contact: impl Into<String>,
        group: impl Into<String>,
    ) -> Self {
        Self {
            id: ParticipantId(id),
            name: name.into(),
            contact: contact.into(),
            exclusion_group: Some(group.into()),
        }
    }
}

/// A row of the roster file that was skipped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RejectedRow {
    pub line: u64,
    pub reason: String,
}

#[derive(Debug, Clone, Default)]
pub struct Roster {
    pub participants: Vec<Participant>,
    pub rejected: Vec<RejectedRow>,
}

/// 單一要寄出的簡訊
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub giver: String,
    pub phone_number: String,
    pub body: String,
}

impl Notification {
    /// Phone number safe to write to logs: only the last four digits survive.
    pub fn masked_phone(&self) -> String {
        mask_phone(&self.phone_number)
    }
}

pub fn mask_phone(phone: &str) -> String {
    let chars: Vec<char> = phone.chars().collect();
    if chars.len() >= 4 {
        let tail: String = chars[chars.len() - 4..].iter().collect();
        format!("***{}", tail)
    } else {
        "***".to_string()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DrawSummary {
    pub participants: usize,
    pub attempts: usize,
    pub messages_sent: usize,
    pub dry_run: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mask_phone_keeps_last_four_digits() {
        assert_eq!(mask_phone("+351912345678"), "***5678");
        assert_eq!(mask_phone("123"), "***");
    }
}
