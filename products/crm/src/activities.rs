//! Activity log queries.

use std::collections::{BTreeMap, HashMap};

use chrono::NaiveDate;
use entity::{RecordId, activity, contact};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivityFilter {
    /// Matches subject, description, kind, or the linked contact's name and company.
    pub search: Option<String>,
    pub kind: Option<activity::Kind>,
    /// Substring of the linked contact's name.
    pub contact: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ActivityDay {
    pub date: NaiveDate,
    pub activities: Vec<activity::Model>,
}

fn normalized(term: &Option<String>) -> Option<String> {
    term.as_deref()
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_lowercase)
}

/// Newest first; ties keep their original order.
pub fn newest_first(activities: &mut [activity::Model]) {
    activities.sort_by(|a, b| b.occurred_at.cmp(&a.occurred_at));
}

pub fn filter_activities(
    activities: &[activity::Model],
    contacts: &[contact::Model],
    filter: &ActivityFilter,
) -> Vec<activity::Model> {
    let by_id: HashMap<RecordId, &contact::Model> =
        contacts.iter().map(|contact| (contact.id, contact)).collect();
    let search = normalized(&filter.search);
    let contact_name = normalized(&filter.contact);

    let mut matched: Vec<activity::Model> = activities
        .iter()
        .filter(|activity| {
            let linked = activity.contact_id.and_then(|id| by_id.get(&id).copied());
            if let Some(term) = &search {
                let hit = activity.subject.to_lowercase().contains(term)
                    || activity.description.to_lowercase().contains(term)
                    || activity.kind.as_str().contains(term.as_str())
                    || linked.is_some_and(|contact| {
                        contact.name.to_lowercase().contains(term)
                            || contact.company.to_lowercase().contains(term)
                    });
                if !hit {
                    return false;
                }
            }
            if let Some(kind) = filter.kind {
                if activity.kind != kind {
                    return false;
                }
            }
            if let Some(name) = &contact_name {
                if !linked.is_some_and(|contact| contact.name.to_lowercase().contains(name)) {
                    return false;
                }
            }
            true
        })
        .cloned()
        .collect();
    newest_first(&mut matched);
    matched
}

/// Bucket activities by calendar day (UTC), newest day first. Order inside a
/// day follows the input.
pub fn group_by_day(activities: &[activity::Model]) -> Vec<ActivityDay> {
    let mut days: BTreeMap<NaiveDate, Vec<activity::Model>> = BTreeMap::new();
    for activity in activities {
        days.entry(activity.occurred_at.date_naive())
            .or_default()
            .push(activity.clone());
    }
    days.into_iter()
        .rev()
        .map(|(date, activities)| ActivityDay { date, activities })
        .collect()
}

pub fn count_by_kind(activities: &[activity::Model]) -> BTreeMap<activity::Kind, usize> {
    let mut counts = BTreeMap::new();
    for activity in activities {
        *counts.entry(activity.kind).or_insert(0) += 1;
    }
    counts
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::*;

    fn at(day: u32, hour: u32) -> chrono::DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, day, hour, 0, 0).unwrap()
    }

    fn activity(
        id: RecordId,
        kind: activity::Kind,
        subject: &str,
        contact_id: Option<RecordId>,
        occurred_at: chrono::DateTime<Utc>,
    ) -> activity::Model {
        activity::Model {
            id,
            kind,
            subject: subject.into(),
            description: String::new(),
            contact_id,
            deal_id: None,
            occurred_at,
        }
    }

    fn contacts() -> Vec<contact::Model> {
        let now = Utc::now();
        vec![contact::Model {
            id: 1,
            name: "Sarah Johnson".into(),
            company: "TechCorp".into(),
            email: "sarah@techcorp.test".into(),
            phone: None,
            notes: String::new(),
            tags: vec![],
            created_at: now,
            updated_at: now,
        }]
    }

    fn sample() -> Vec<activity::Model> {
        vec![
            activity(1, activity::Kind::Call, "Intro", Some(1), at(1, 9)),
            activity(2, activity::Kind::Email, "Follow up", None, at(3, 10)),
            activity(3, activity::Kind::Call, "Pricing", Some(1), at(3, 15)),
        ]
    }

    #[test]
    fn search_reaches_linked_contact_company() {
        let filter = ActivityFilter {
            search: Some("techcorp".into()),
            ..ActivityFilter::default()
        };
        let ids: Vec<_> = filter_activities(&sample(), &contacts(), &filter)
            .iter()
            .map(|a| a.id)
            .collect();
        assert_eq!(ids, vec![3, 1]);
    }

    #[test]
    fn kind_and_contact_filters_combine() {
        let filter = ActivityFilter {
            kind: Some(activity::Kind::Call),
            contact: Some("sarah".into()),
            ..ActivityFilter::default()
        };
        assert_eq!(filter_activities(&sample(), &contacts(), &filter).len(), 2);

        let filter = ActivityFilter {
            contact: Some("sarah".into()),
            kind: Some(activity::Kind::Email),
            ..ActivityFilter::default()
        };
        assert!(filter_activities(&sample(), &contacts(), &filter).is_empty());
    }

    #[test]
    fn days_are_newest_first() {
        let mut activities = sample();
        newest_first(&mut activities);
        let days = group_by_day(&activities);
        assert_eq!(days.len(), 2);
        assert_eq!(days[0].date, NaiveDate::from_ymd_opt(2025, 3, 3).unwrap());
        let ids: Vec<_> = days[0].activities.iter().map(|a| a.id).collect();
        assert_eq!(ids, vec![3, 2]);
    }

    #[test]
    fn counts_every_kind_present() {
        let counts = count_by_kind(&sample());
        assert_eq!(counts.get(&activity::Kind::Call), Some(&2));
        assert_eq!(counts.get(&activity::Kind::Email), Some(&1));
        assert_eq!(counts.get(&activity::Kind::Meeting), None);
    }
}
