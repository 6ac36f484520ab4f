use crate::core::assignment::Assignment;
use crate::core::roster::normalize_phone;
use crate::domain::model::{Notification, Participant};
use crate::utils::error::{Result, SantaError};
use regex::{Captures, Regex};

const PLACEHOLDER_PATTERN: &str = r"\{(year|budget|currency|giver|recipient)\}";

pub const DEFAULT_TEMPLATE: &str = "Secret Santa {year}!!! Congratulations {giver} you're the Secret Santa of << {recipient} >>. The gift's budget is: {budget}{currency}";

#[derive(Debug, Clone)]
pub struct MessageTemplate {
    template: String,
    budget: String,
    currency: String,
    year: i32,
    placeholders: Regex,
}

impl MessageTemplate {
    pub fn new(budget: impl Into<String>, currency: impl Into<String>, year: i32) -> Result<Self> {
        let placeholders = Regex::new(PLACEHOLDER_PATTERN).map_err(|e| SantaError::ConfigError {
            message: format!("Invalid placeholder pattern: {}", e),
        })?;

        Ok(Self {
            template: DEFAULT_TEMPLATE.to_string(),
            budget: budget.into(),
            currency: currency.into(),
            year,
            placeholders,
        })
    }

    /// Replaces the default text. `{recipient}` must appear somewhere in it.
    pub fn with_template(mut self, template: impl Into<String>) -> Result<Self> {
        let template = template.into();
        validate_template(&template)?;
        self.template = template;
        Ok(self)
    }

    /// 一次替換所有佔位符，代入的值不會再被展開
    pub fn render(&self, giver: &str, recipient: &str) -> String {
        self.placeholders
            .replace_all(&self.template, |caps: &Captures| match &caps[1] {
                "year" => self.year.to_string(),
                "budget" => self.budget.clone(),
                "currency" => self.currency.clone(),
                "giver" => giver.to_string(),
                _ => recipient.to_string(),
            })
            .into_owned()
    }
}

pub fn validate_template(template: &str) -> Result<()> {
    if !template.contains("{recipient}") {
        return Err(SantaError::InvalidConfigValueError {
            field: "template".to_string(),
            value: template.to_string(),
            reason: "template must contain the {recipient} placeholder".to_string(),
        });
    }
    Ok(())
}

/// 加上國碼，移除空白
pub fn international_number(phone: &str, country_prefix: &str) -> String {
    let phone = normalize_phone(phone);
    if phone.starts_with('+') {
        phone
    } else {
        format!("{}{}", country_prefix, phone)
    }
}

/// One notification per giver, in giver order.
pub fn build_notifications(
    assignment: &Assignment,
    participants: &[Participant],
    template: &MessageTemplate,
    country_prefix: &str,
) -> Vec<Notification> {
    assignment
        .resolve(participants)
        .into_iter()
        .map(|(giver, recipient)| Notification {
            giver: giver.name.clone(),
            phone_number: international_number(&giver.contact, country_prefix),
            body: template.render(&giver.name, &recipient.name),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::assignment::{AssignmentEngine, ScriptedPermutations};

    #[test]
    fn test_default_template_matches_classic_text() {
        let template = MessageTemplate::new("20", "€", 2024).unwrap();

        assert_eq!(
            template.render("Ana", "Rui"),
            "Secret Santa 2024!!! Congratulations Ana you're the Secret Santa of << Rui >>. The gift's budget is: 20€"
        );
    }

    #[test]
    fn test_custom_template() {
        let template = MessageTemplate::new("15", "$", 2025)
            .unwrap()
            .with_template("{giver}, buy a gift for {recipient} (max {currency}{budget})")
            .unwrap();

        assert_eq!(template.render("Ana", "Rui"), "Ana, buy a gift for Rui (max $15)");
    }

    #[test]
    fn test_template_without_recipient_is_rejected() {
        let result = MessageTemplate::new("15", "$", 2025)
            .unwrap()
            .with_template("Hello {giver}");
        assert!(result.is_err());
    }

    #[test]
    fn test_substituted_values_are_not_expanded_again() {
        let template = MessageTemplate::new("{giver}", "{year}", 2024)
            .unwrap()
            .with_template("{giver} -> {recipient}, {budget}{currency}")
            .unwrap();

        assert_eq!(
            template.render("{recipient}", "Rui"),
            "{recipient} -> Rui, {giver}{year}"
        );
    }

    #[test]
    fn test_unknown_braces_are_left_alone() {
        let template = MessageTemplate::new("20", "€", 2024)
            .unwrap()
            .with_template("{name} gives to {recipient}")
            .unwrap();

        assert_eq!(template.render("Ana", "Rui"), "{name} gives to Rui");
    }

    #[test]
    fn test_international_number() {
        assert_eq!(international_number("912 345 678", "+351"), "+351912345678");
        assert_eq!(international_number("+44 7700 900123", "+351"), "+447700900123");
    }

    #[test]
    fn test_build_notifications_follows_assignment() {
        let people = vec![
            Participant::single(0, "Ana", "910 000 001"),
            Participant::single(1, "Rui", "910000002"),
            Participant::single(2, "Zé", "+34910000003"),
        ];
        let mut source = ScriptedPermutations::new(vec![vec![1, 2, 0]]);
        let assignment = AssignmentEngine::new().assign(&people, &mut source).unwrap();

        let notifications = build_notifications(
            &assignment,
            &people,
            &MessageTemplate::new("20", "€", 2024).unwrap(),
            "+351",
        );

        assert_eq!(notifications.len(), 3);
        assert_eq!(notifications[0].giver, "Ana");
        assert_eq!(notifications[0].phone_number, "+351910000001");
        assert!(notifications[0].body.contains("<< Rui >>"));
        assert_eq!(notifications[2].phone_number, "+34910000003");
        assert!(notifications[2].body.contains("<< Ana >>"));
    }
}
