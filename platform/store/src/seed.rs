//! Demo pipeline used by `crm-server seed` and the in-memory backend.

use chrono::{DateTime, Duration, Utc};
use entity::{RecordId, StageId, activity, contact, deal, stage};
use serde::Serialize;

#[derive(Clone, Debug, Serialize)]
pub struct DemoDataset {
    pub stages: Vec<stage::Model>,
    pub contacts: Vec<contact::Model>,
    pub deals: Vec<deal::Model>,
    pub activities: Vec<activity::Model>,
}

pub fn demo_stages() -> Vec<stage::Model> {
    vec![
        stage::Model::new("lead", "Lead", 1).with_color("#94a3b8"),
        stage::Model::new("qualified", "Qualified", 2).with_color("#3b82f6"),
        stage::Model::new("proposal", "Proposal", 3).with_color("#8b5cf6"),
        stage::Model::new("negotiation", "Negotiation", 4).with_color("#f59e0b"),
        stage::Model::new("won", "Won", 5).with_color("#10b981"),
        stage::Model::new("lost", "Lost", 6).with_color("#ef4444"),
    ]
}

pub fn demo_dataset(now: DateTime<Utc>) -> DemoDataset {
    let contacts = vec![
        contact_row(
            1,
            "Sarah Johnson",
            "TechCorp Solutions",
            "sarah.johnson@techcorp.test",
            Some("5551234567"),
            &["enterprise", "decision-maker"],
            now - Duration::days(30),
        ),
        contact_row(
            2,
            "Michael Chen",
            "StartupXYZ",
            "michael@startupxyz.test",
            Some("5552345678"),
            &["startup", "tech"],
            now - Duration::days(21),
        ),
        contact_row(
            3,
            "Emily Rodriguez",
            "Global Industries",
            "emily.r@globalind.test",
            None,
            &["enterprise"],
            now - Duration::days(14),
        ),
        contact_row(
            4,
            "David Park",
            "Innovation Labs",
            "dpark@innovationlabs.test",
            Some("+1 (555) 456-7890"),
            &["partner"],
            now - Duration::days(7),
        ),
    ];
    let deals = vec![
        deal_row(
            1,
            "TechCorp Platform License",
            4_500_000,
            "proposal",
            Some(1),
            60,
            now - Duration::days(20),
        ),
        deal_row(2, "StartupXYZ Pilot", 1_200_000, "lead", Some(2), 20, now - Duration::days(10)),
        deal_row(
            3,
            "Global Industries Expansion",
            8_750_000,
            "negotiation",
            Some(3),
            75,
            now - Duration::days(12),
        ),
        deal_row(
            4,
            "Innovation Labs Support",
            2_500_000,
            "won",
            Some(4),
            100,
            now - Duration::days(40),
        ),
        deal_row(
            5,
            "StartupXYZ Analytics Add-on",
            600_000,
            "qualified",
            Some(2),
            40,
            now - Duration::days(5),
        ),
        deal_row(6, "Legacy Migration", 3_000_000, "lost", Some(3), 0, now - Duration::days(60)),
    ];
    let activities = vec![
        activity_row(
            1,
            activity::Kind::Call,
            "Discovery call",
            "Walked through current tooling and pain points.",
            Some(2),
            Some(2),
            now - Duration::days(9),
        ),
        activity_row(
            2,
            activity::Kind::Email,
            "Sent proposal",
            "Proposal v2 with volume pricing.",
            Some(1),
            Some(1),
            now - Duration::days(3),
        ),
        activity_row(
            3,
            activity::Kind::Meeting,
            "Contract review",
            "Legal redlines on the MSA.",
            Some(3),
            Some(3),
            now - Duration::days(2),
        ),
        activity_row(
            4,
            activity::Kind::Note,
            "Renewal champion",
            "David owns the renewal budget.",
            Some(4),
            None,
            now - Duration::hours(5),
        ),
    ];
    DemoDataset {
        stages: demo_stages(),
        contacts,
        deals,
        activities,
    }
}

fn contact_row(
    id: RecordId,
    name: &str,
    company: &str,
    email: &str,
    phone: Option<&str>,
    tags: &[&str],
    created_at: DateTime<Utc>,
) -> contact::Model {
    contact::Model {
        id,
        name: name.into(),
        company: company.into(),
        email: email.into(),
        phone: phone.map(str::to_string),
        notes: String::new(),
        tags: tags.iter().map(|tag| tag.to_string()).collect(),
        created_at,
        updated_at: created_at,
    }
}

fn deal_row(
    id: RecordId,
    title: &str,
    value_cents: i64,
    stage: &str,
    contact_id: Option<RecordId>,
    probability: u8,
    created_at: DateTime<Utc>,
) -> deal::Model {
    let close_date = (created_at + Duration::days(45)).date_naive();
    deal::Model {
        id,
        title: title.into(),
        value_cents: Some(value_cents),
        stage: StageId::from(stage),
        contact_id,
        notes: String::new(),
        close_date: Some(close_date),
        probability,
        created_at,
        updated_at: created_at,
    }
}

fn activity_row(
    id: RecordId,
    kind: activity::Kind,
    subject: &str,
    description: &str,
    contact_id: Option<RecordId>,
    deal_id: Option<RecordId>,
    occurred_at: DateTime<Utc>,
) -> activity::Model {
    activity::Model {
        id,
        kind,
        subject: subject.into(),
        description: description.into(),
        contact_id,
        deal_id,
        occurred_at,
    }
}
