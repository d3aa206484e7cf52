//! Scorecard draft model: the seven fixed sections and their open field maps.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Field key → value within one section. Keys are whatever the backend sends.
pub type SectionFields = BTreeMap<String, String>;

/// The closed set of scorecard sections, in display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SectionName {
    Situation,
    Mission,
    Outcomes,
    Competencies,
    Culture,
    BossStyle,
    Requirements,
}

impl SectionName {
    pub const ALL: [SectionName; 7] = [
        SectionName::Situation,
        SectionName::Mission,
        SectionName::Outcomes,
        SectionName::Competencies,
        SectionName::Culture,
        SectionName::BossStyle,
        SectionName::Requirements,
    ];

    /// Wire key used by the backend.
    pub fn as_str(&self) -> &'static str {
        match self {
            SectionName::Situation => "situation",
            SectionName::Mission => "mission",
            SectionName::Outcomes => "outcomes",
            SectionName::Competencies => "competencies",
            SectionName::Culture => "culture",
            SectionName::BossStyle => "boss_style",
            SectionName::Requirements => "requirements",
        }
    }

    /// Heading shown in the preview panel.
    pub fn label(&self) -> &'static str {
        match self {
            SectionName::Situation => "Situation",
            SectionName::Mission => "Mission",
            SectionName::Outcomes => "Key Outcomes",
            SectionName::Competencies => "Competencies",
            SectionName::Culture => "Culture & Values",
            SectionName::BossStyle => "Boss Style",
            SectionName::Requirements => "Requirements",
        }
    }
}

impl fmt::Display for SectionName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SectionName {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SectionName::ALL
            .iter()
            .copied()
            .find(|name| name.as_str() == s)
            .ok_or_else(|| format!("Unknown section: {}", s))
    }
}

/// Convert one JSON section value into fields.
///
/// Returns `None` unless `value` is a non-empty object, which is the only
/// shape the backend uses for a populated section. Scalars inside the object
/// are stringified; `null` becomes the empty string.
pub fn section_fields_from_value(value: &Value) -> Option<SectionFields> {
    let obj = value.as_object()?;
    if obj.is_empty() {
        return None;
    }
    Some(
        obj.iter()
            .map(|(key, v)| (key.clone(), field_to_string(v)))
            .collect(),
    )
}

fn field_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// Sections carried by one inbound event. Only non-empty sections are present.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SectionUpdate(BTreeMap<SectionName, SectionFields>);

impl SectionUpdate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pick the seven known sections out of a JSON object, ignoring other keys.
    pub fn from_json_object(obj: &serde_json::Map<String, Value>) -> Self {
        let mut update = SectionUpdate::new();
        for name in SectionName::ALL {
            if let Some(fields) = obj.get(name.as_str()).and_then(section_fields_from_value) {
                update.0.insert(name, fields);
            }
        }
        update
    }

    /// Add a section. Empty field maps are ignored.
    pub fn with(mut self, name: SectionName, fields: SectionFields) -> Self {
        if !fields.is_empty() {
            self.0.insert(name, fields);
        }
        self
    }

    pub fn get(&self, name: SectionName) -> Option<&SectionFields> {
        self.0.get(&name)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (SectionName, &SectionFields)> {
        self.0.iter().map(|(k, v)| (*k, v))
    }
}

/// The accumulating scorecard: at most one field map per section.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScorecardDraft(BTreeMap<SectionName, SectionFields>);

impl ScorecardDraft {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a draft from the `state` object of a history response.
    pub fn from_json(value: &Value) -> Self {
        match value.as_object() {
            Some(obj) => ScorecardDraft(SectionUpdate::from_json_object(obj).0),
            None => ScorecardDraft::default(),
        }
    }

    /// Replace every section present in `update` wholesale. Sections the
    /// update does not carry are left as they were.
    pub fn merge(&mut self, update: &SectionUpdate) {
        for (name, fields) in update.iter() {
            self.0.insert(name, fields.clone());
        }
    }

    pub fn section(&self, name: SectionName) -> Option<&SectionFields> {
        self.0.get(&name)
    }

    /// Number of sections that hold at least one field.
    pub fn populated(&self) -> usize {
        self.0.values().filter(|f| !f.is_empty()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (SectionName, &SectionFields)> {
        self.0.iter().map(|(k, v)| (*k, v))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn fields(pairs: &[(&str, &str)]) -> SectionFields {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    #[test]
    fn test_section_name_roundtrips_through_str() {
        for name in SectionName::ALL {
            assert_eq!(name.as_str().parse::<SectionName>(), Ok(name));
        }
        assert!("salary".parse::<SectionName>().is_err());
    }

    #[test]
    fn test_section_name_serde_uses_wire_key() {
        let json = serde_json::to_string(&SectionName::BossStyle).expect("serialize");
        assert_eq!(json, "\"boss_style\"");
    }

    #[test]
    fn test_section_order_matches_display_order() {
        let mut sorted = SectionName::ALL.to_vec();
        sorted.sort();
        assert_eq!(sorted, SectionName::ALL.to_vec());
    }

    #[test]
    fn test_section_fields_from_value_rejects_non_objects() {
        assert!(section_fields_from_value(&json!(null)).is_none());
        assert!(section_fields_from_value(&json!("text")).is_none());
        assert!(section_fields_from_value(&json!([1, 2])).is_none());
        assert!(section_fields_from_value(&json!({})).is_none());
    }

    #[test]
    fn test_section_fields_from_value_stringifies_scalars() {
        let f = section_fields_from_value(&json!({
            "team_size": 5,
            "remote": true,
            "note": null,
            "title": "Lead",
        }))
        .expect("non-empty object");
        assert_eq!(f["team_size"], "5");
        assert_eq!(f["remote"], "true");
        assert_eq!(f["note"], "");
        assert_eq!(f["title"], "Lead");
    }

    #[test]
    fn test_update_ignores_unknown_and_empty_sections() {
        let obj = json!({
            "situation": {"team_size": "5"},
            "mission": {},
            "salary": {"base": "100"},
            "culture": "",
        });
        let update = SectionUpdate::from_json_object(obj.as_object().expect("object"));
        assert_eq!(update.len(), 1);
        assert_eq!(update.get(SectionName::Situation), Some(&fields(&[("team_size", "5")])));
    }

    #[test]
    fn test_merge_replaces_wholesale() {
        let mut draft = ScorecardDraft::new();
        draft.merge(&SectionUpdate::new().with(
            SectionName::Mission,
            fields(&[("purpose", "ship"), ("horizon", "1y")]),
        ));
        draft.merge(&SectionUpdate::new().with(SectionName::Mission, fields(&[("purpose", "scale")])));
        assert_eq!(draft.section(SectionName::Mission), Some(&fields(&[("purpose", "scale")])));
    }

    #[test]
    fn test_merge_leaves_absent_sections_untouched() {
        let mut draft = ScorecardDraft::new();
        draft.merge(&SectionUpdate::new().with(SectionName::Culture, fields(&[("pace", "fast")])));
        draft.merge(&SectionUpdate::new().with(SectionName::Outcomes, fields(&[("q1", "hire 2")])));
        assert_eq!(draft.section(SectionName::Culture), Some(&fields(&[("pace", "fast")])));
        assert_eq!(draft.populated(), 2);
    }

    #[test]
    fn test_with_ignores_empty_fields() {
        let update = SectionUpdate::new().with(SectionName::Requirements, SectionFields::new());
        assert!(update.is_empty());
    }

    #[test]
    fn test_draft_from_json_non_object_is_empty() {
        assert!(ScorecardDraft::from_json(&json!(null)).is_empty());
        assert!(ScorecardDraft::from_json(&json!([])).is_empty());
    }
}
