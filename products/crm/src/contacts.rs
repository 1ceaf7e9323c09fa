//! Contact list search, filtering and sorting.

use std::cmp::Ordering;

use entity::contact;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactFilter {
    /// Matches name, company, email or any tag.
    pub search: Option<String>,
    pub company: Option<String>,
    /// Keep contacts carrying at least one of these tags.
    #[serde(default)]
    pub tags: Vec<String>,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ContactSortField {
    #[default]
    Name,
    Company,
    Email,
    UpdatedAt,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    pub fn toggled(self) -> Self {
        match self {
            SortDirection::Asc => SortDirection::Desc,
            SortDirection::Desc => SortDirection::Asc,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactSort {
    pub field: ContactSortField,
    pub direction: SortDirection,
}

impl ContactSort {
    /// Clicking the active column flips direction; another column starts ascending.
    pub fn select(self, field: ContactSortField) -> Self {
        if self.field == field {
            Self {
                field,
                direction: self.direction.toggled(),
            }
        } else {
            Self {
                field,
                direction: SortDirection::Asc,
            }
        }
    }
}

fn normalized(term: &Option<String>) -> Option<String> {
    term.as_deref()
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_lowercase)
}

fn contains(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(needle)
}

impl ContactFilter {
    pub fn is_empty(&self) -> bool {
        normalized(&self.search).is_none()
            && normalized(&self.company).is_none()
            && self.tags.is_empty()
    }

    pub fn matches(&self, contact: &contact::Model) -> bool {
        if let Some(term) = normalized(&self.search) {
            let hit = contains(&contact.name, &term)
                || contains(&contact.company, &term)
                || contains(&contact.email, &term)
                || contact.tags.iter().any(|tag| contains(tag, &term));
            if !hit {
                return false;
            }
        }
        if let Some(company) = normalized(&self.company) {
            if !contains(&contact.company, &company) {
                return false;
            }
        }
        if !self.tags.is_empty() && !contact.tags.iter().any(|tag| self.tags.contains(tag)) {
            return false;
        }
        true
    }
}

fn compare(a: &contact::Model, b: &contact::Model, field: ContactSortField) -> Ordering {
    match field {
        ContactSortField::Name => a.name.to_lowercase().cmp(&b.name.to_lowercase()),
        ContactSortField::Company => a.company.to_lowercase().cmp(&b.company.to_lowercase()),
        ContactSortField::Email => a.email.to_lowercase().cmp(&b.email.to_lowercase()),
        ContactSortField::UpdatedAt => a.updated_at.cmp(&b.updated_at),
    }
}

pub fn sort_contacts(contacts: &mut [contact::Model], sort: ContactSort) {
    contacts.sort_by(|a, b| {
        let ordering = compare(a, b, sort.field);
        match sort.direction {
            SortDirection::Asc => ordering,
            SortDirection::Desc => ordering.reverse(),
        }
    });
}

/// Filter then sort.
pub fn query_contacts(
    contacts: &[contact::Model],
    filter: &ContactFilter,
    sort: ContactSort,
) -> Vec<contact::Model> {
    let mut matched: Vec<contact::Model> = contacts
        .iter()
        .filter(|contact| filter.matches(contact))
        .cloned()
        .collect();
    sort_contacts(&mut matched, sort);
    matched
}
