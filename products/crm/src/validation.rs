//! Draft validation. Every check runs so callers can show all problems at once.

use chrono::Utc;
use entity::{Record, activity, contact, deal, stage};
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("{}", .messages.join("; "))]
pub struct ValidationErrors {
    pub messages: Vec<String>,
}

#[derive(Default)]
struct Collector(Vec<String>);

impl Collector {
    fn check(&mut self, ok: bool, message: &str) {
        if !ok {
            self.0.push(message.to_string());
        }
    }

    fn finish(self) -> Result<(), ValidationErrors> {
        if self.0.is_empty() {
            Ok(())
        } else {
            Err(ValidationErrors { messages: self.0 })
        }
    }
}

/// One trillion dollars. Keeps stage and pipeline sums within `i64`.
pub const MAX_DEAL_VALUE_CENTS: i64 = 100_000_000_000_000;

fn present(value: &str) -> bool {
    !value.trim().is_empty()
}

/// Loose `local@domain.tld` shape check.
pub fn looks_like_email(value: &str) -> bool {
    let value = value.trim();
    if value.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = value.rsplit_once('@') else {
        return false;
    };
    if local.is_empty() {
        return false;
    }
    match domain.rsplit_once('.') {
        Some((host, tld)) => !host.is_empty() && !tld.is_empty(),
        None => false,
    }
}

pub fn looks_like_phone(value: &str) -> bool {
    value
        .chars()
        .all(|c| c.is_ascii_digit() || matches!(c, ' ' | '-' | '+' | '(' | ')' | '.'))
}

pub fn validate_contact(draft: &contact::Draft) -> Result<(), ValidationErrors> {
    let mut errors = Collector::default();
    errors.check(present(&draft.name), "Name is required");
    errors.check(present(&draft.company), "Company is required");
    if present(&draft.email) {
        errors.check(
            looks_like_email(&draft.email),
            "Please enter a valid email address",
        );
    } else {
        errors.check(false, "Email is required");
    }
    if let Some(phone) = draft.phone.as_deref().filter(|phone| present(phone)) {
        errors.check(looks_like_phone(phone), "Please enter a valid phone number");
    }
    errors.finish()
}

pub fn validate_deal(draft: &deal::Draft, stages: &[stage::Model]) -> Result<(), ValidationErrors> {
    let mut errors = Collector::default();
    errors.check(present(&draft.title), "Deal title is required");
    errors.check(draft.contact_id.is_some(), "Contact is required");
    if draft.stage.is_blank() {
        errors.check(false, "Stage is required");
    } else {
        errors.check(
            stages.iter().any(|stage| stage.id == draft.stage),
            "Stage does not exist",
        );
    }
    errors.check(
        draft.value_cents.is_none_or(|value| value >= 0),
        "Deal value cannot be negative",
    );
    errors.check(
        draft
            .value_cents
            .is_none_or(|value| value <= MAX_DEAL_VALUE_CENTS),
        "Deal value is too large",
    );
    errors.check(
        draft.probability <= 100,
        "Probability must be between 0 and 100",
    );
    errors.finish()
}

pub fn validate_activity(draft: &activity::Draft) -> Result<(), ValidationErrors> {
    let mut errors = Collector::default();
    errors.check(draft.contact_id.is_some(), "Please select a contact");
    errors.check(present(&draft.subject), "Please enter a subject");
    errors.finish()
}

/// Validate the record an update would produce.
pub fn validate_contact_update(
    existing: &contact::Model,
    patch: &contact::Patch,
) -> Result<(), ValidationErrors> {
    let mut merged = existing.clone();
    merged.apply_patch(patch.clone(), Utc::now());
    validate_contact(&contact::Draft {
        name: merged.name,
        company: merged.company,
        email: merged.email,
        phone: merged.phone,
        notes: merged.notes,
        tags: merged.tags,
    })
}

pub fn validate_deal_update(
    existing: &deal::Model,
    patch: &deal::Patch,
    stages: &[stage::Model],
) -> Result<(), ValidationErrors> {
    let mut merged = existing.clone();
    merged.apply_patch(patch.clone(), Utc::now());
    validate_deal(
        &deal::Draft {
            title: merged.title,
            value_cents: merged.value_cents,
            stage: merged.stage,
            contact_id: merged.contact_id,
            notes: merged.notes,
            close_date: merged.close_date,
            probability: merged.probability,
        },
        stages,
    )
}

pub fn validate_activity_update(
    existing: &activity::Model,
    patch: &activity::Patch,
) -> Result<(), ValidationErrors> {
    let mut merged = existing.clone();
    merged.apply_patch(patch.clone(), Utc::now());
    validate_activity(&activity::Draft {
        kind: merged.kind,
        subject: merged.subject,
        description: merged.description,
        contact_id: merged.contact_id,
        deal_id: merged.deal_id,
        occurred_at: Some(merged.occurred_at),
    })
}

#[cfg(test)]
mod tests {
    use entity::StageId;

    use super::*;

    #[test]
    fn email_shape() {
        assert!(looks_like_email("ada@example.com"));
        assert!(looks_like_email(" ada@mail.example.co "));
        assert!(!looks_like_email("ada@example"));
        assert!(!looks_like_email("@example.com"));
        assert!(!looks_like_email("ada lovelace@example.com"));
    }

    #[test]
    fn empty_contact_reports_every_required_field() {
        let err = validate_contact(&contact::Draft::default()).unwrap_err();
        assert_eq!(
            err.messages,
            vec!["Name is required", "Company is required", "Email is required"]
        );
    }

    #[test]
    fn phone_allows_punctuation_only() {
        let mut draft = contact::Draft {
            name: "Ada".into(),
            company: "Engines".into(),
            email: "ada@engines.test".into(),
            phone: Some("+1 (555) 123-4567".into()),
            ..contact::Draft::default()
        };
        assert!(validate_contact(&draft).is_ok());
        draft.phone = Some("call me".into());
        assert_eq!(
            validate_contact(&draft).unwrap_err().messages,
            vec!["Please enter a valid phone number"]
        );
    }

    #[test]
    fn deal_checks_stage_value_and_probability() {
        let stages = vec![stage::Model::new("lead", "Lead", 1)];
        let draft = deal::Draft {
            title: "Pilot".into(),
            value_cents: Some(-1),
            stage: StageId::from("nope"),
            contact_id: Some(1),
            notes: String::new(),
            close_date: None,
            probability: 120,
        };
        assert_eq!(
            validate_deal(&draft, &stages).unwrap_err().messages,
            vec![
                "Stage does not exist",
                "Deal value cannot be negative",
                "Probability must be between 0 and 100",
            ]
        );
    }

    #[test]
    fn deal_value_has_an_upper_bound() {
        let stages = vec![stage::Model::new("lead", "Lead", 1)];
        let mut draft = deal::Draft {
            title: "Pilot".into(),
            value_cents: Some(MAX_DEAL_VALUE_CENTS),
            stage: StageId::from("lead"),
            contact_id: Some(1),
            notes: String::new(),
            close_date: None,
            probability: 50,
        };
        assert!(validate_deal(&draft, &stages).is_ok());
        draft.value_cents = Some(i64::MAX);
        assert_eq!(
            validate_deal(&draft, &stages).unwrap_err().messages,
            vec!["Deal value is too large"]
        );
    }

    #[test]
    fn updates_are_checked_against_the_merged_record() {
        let now = Utc::now();
        let existing = activity::Model {
            id: 1,
            kind: activity::Kind::Call,
            subject: "Intro".into(),
            description: String::new(),
            contact_id: Some(2),
            deal_id: None,
            occurred_at: now,
        };
        let clear_subject = activity::Patch {
            subject: Some("  ".into()),
            ..activity::Patch::default()
        };
        assert!(validate_activity_update(&existing, &clear_subject).is_err());
        assert!(validate_activity_update(&existing, &activity::Patch::default()).is_ok());
    }
}
