use std::{cmp::Ordering, fmt};

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Stage identifier. Backends use either small integers or short codes such
/// as `"lead"`; both are kept in canonical string form.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct StageId(String);

impl StageId {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into().trim().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_blank(&self) -> bool {
        self.0.is_empty()
    }
}

/// Numeric ids compare as numbers, so `9` sorts before `10`. Codes compare
/// as text and come after every numeric id.
impl Ord for StageId {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self.0.parse::<i64>(), other.0.parse::<i64>()) {
            (Ok(a), Ok(b)) => a.cmp(&b).then_with(|| self.0.cmp(&other.0)),
            (Ok(_), Err(_)) => Ordering::Less,
            (Err(_), Ok(_)) => Ordering::Greater,
            (Err(_), Err(_)) => self.0.cmp(&other.0),
        }
    }
}

impl PartialOrd for StageId {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for StageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for StageId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for StageId {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

impl From<i64> for StageId {
    fn from(value: i64) -> Self {
        Self(value.to_string())
    }
}

impl Serialize for StageId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for StageId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Int(i64),
            Text(String),
        }
        Ok(match Raw::deserialize(deserializer)? {
            Raw::Int(value) => StageId::from(value),
            Raw::Text(value) => StageId::new(value),
        })
    }
}

/// A pipeline column. Loaded once per session and never edited here.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Model {
    pub id: StageId,
    pub name: String,
    #[serde(default)]
    pub color: String,
    pub sort_order: i32,
    #[serde(default)]
    pub is_won: bool,
    #[serde(default)]
    pub is_lost: bool,
}

impl Model {
    pub fn new(id: impl Into<StageId>, name: impl Into<String>, sort_order: i32) -> Self {
        let id = id.into();
        let is_won = id.as_str().eq_ignore_ascii_case("won");
        let is_lost = id.as_str().eq_ignore_ascii_case("lost");
        Self {
            id,
            name: name.into(),
            color: String::new(),
            sort_order,
            is_won,
            is_lost,
        }
    }

    pub fn with_color(mut self, color: impl Into<String>) -> Self {
        self.color = color.into();
        self
    }

    /// Won and lost stages close a deal; every other stage is open.
    pub fn is_closed(&self) -> bool {
        self.is_won || self.is_lost
    }

    /// Column order: ascending sort order, ties broken by identifier.
    pub fn display_cmp(&self, other: &Self) -> Ordering {
        self.sort_order
            .cmp(&other.sort_order)
            .then_with(|| self.id.cmp(&other.id))
    }
}

/// Sort stages into left-to-right column order.
pub fn sort_for_display(stages: &mut [Model]) {
    stages.sort_by(Model::display_cmp);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stage_ids_accept_numbers_and_codes() {
        let ids: Vec<StageId> = serde_json::from_str(r#"[3, " lead ", "won"]"#).unwrap();
        assert_eq!(ids, vec![StageId::from(3), StageId::from("lead"), StageId::from("won")]);
        assert_eq!(serde_json::to_string(&ids[0]).unwrap(), "\"3\"");
    }

    #[test]
    fn ties_in_sort_order_fall_back_to_identifier() {
        let mut stages = vec![
            Model::new("b", "B", 2),
            Model::new("z", "Z", 1),
            Model::new("a", "A", 2),
        ];
        sort_for_display(&mut stages);
        let order: Vec<&str> = stages.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(order, vec!["z", "a", "b"]);
    }

    #[test]
    fn numeric_ids_tie_break_by_value() {
        let mut stages = vec![
            Model::new(10_i64, "Ten", 1),
            Model::new("lead", "Lead", 1),
            Model::new(9_i64, "Nine", 1),
        ];
        sort_for_display(&mut stages);
        let order: Vec<&str> = stages.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(order, vec!["9", "10", "lead"]);
    }

    #[test]
    fn outcome_flags_follow_conventional_codes() {
        assert!(Model::new("won", "Won", 5).is_won);
        assert!(Model::new("LOST", "Lost", 6).is_lost);
        assert!(!Model::new("lead", "Lead", 1).is_closed());
    }
}
