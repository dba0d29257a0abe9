//! Search criteria
//!
//! A `SearchCriteria` is built per request, used once, and dropped. Every
//! field is optional; an absent field places no constraint on its dimension.
//!
//! Decoding is lenient: a field with the wrong JSON type, a blank string, or
//! a number that does not parse decodes as absent instead of failing the
//! whole request.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchCriteria {
    #[serde(default, deserialize_with = "lenient_text", skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(default, deserialize_with = "lenient_text", skip_serializing_if = "Option::is_none")]
    pub board: Option<String>,
    #[serde(default, deserialize_with = "lenient_text", skip_serializing_if = "Option::is_none")]
    pub school_type: Option<String>,
    #[serde(default, deserialize_with = "lenient_text", skip_serializing_if = "Option::is_none")]
    pub medium: Option<String>,
    #[serde(default, deserialize_with = "lenient_amount", skip_serializing_if = "Option::is_none")]
    pub fees_min: Option<i64>,
    #[serde(default, deserialize_with = "lenient_amount", skip_serializing_if = "Option::is_none")]
    pub fees_max: Option<i64>,
    #[serde(default, deserialize_with = "lenient_names", skip_serializing_if = "Vec::is_empty")]
    pub facilities: Vec<String>,
    /// Name fragment pushed down to storage as a substring search.
    #[serde(default, deserialize_with = "lenient_text", skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl SearchCriteria {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn city(mut self, city: impl Into<String>) -> Self {
        self.city = non_blank(city.into());
        self
    }

    #[must_use]
    pub fn board(mut self, board: impl Into<String>) -> Self {
        self.board = non_blank(board.into());
        self
    }

    #[must_use]
    pub fn school_type(mut self, school_type: impl Into<String>) -> Self {
        self.school_type = non_blank(school_type.into());
        self
    }

    #[must_use]
    pub fn medium(mut self, medium: impl Into<String>) -> Self {
        self.medium = non_blank(medium.into());
        self
    }

    #[must_use]
    pub fn fees_min(mut self, amount: i64) -> Self {
        self.fees_min = Some(amount);
        self
    }

    #[must_use]
    pub fn fees_max(mut self, amount: i64) -> Self {
        self.fees_max = Some(amount);
        self
    }

    #[must_use]
    pub fn facility(mut self, name: impl Into<String>) -> Self {
        if let Some(name) = non_blank(name.into()) {
            self.facilities.push(name);
        }
        self
    }

    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = non_blank(name.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

fn non_blank(s: String) -> Option<String> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        None
    } else if trimmed.len() == s.len() {
        Some(s)
    } else {
        Some(trimmed.to_string())
    }
}

fn lenient_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::String(s) => non_blank(s),
        _ => None,
    })
}

fn lenient_amount<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(parse_amount(&value))
}

fn parse_amount(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.is_finite()).map(|f| f.trunc() as i64)),
        Value::String(s) => {
            let cleaned: String = s.trim().chars().filter(|c| *c != ',').collect();
            cleaned
                .parse::<i64>()
                .ok()
                .or_else(|| cleaned.parse::<f64>().ok().filter(|f| f.is_finite()).map(|f| f.trunc() as i64))
        }
        _ => None,
    }
}

fn lenient_names<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::Array(items) => items
            .into_iter()
            .filter_map(|item| match item {
                Value::String(s) => non_blank(s),
                _ => None,
            })
            .collect(),
        Value::String(s) => s
            .split(',')
            .filter_map(|part| non_blank(part.to_string()))
            .collect(),
        _ => Vec::new(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_empty_object_is_empty_criteria() {
        let criteria: SearchCriteria = serde_json::from_value(json!({})).unwrap();
        assert!(criteria.is_empty());
    }

    #[test]
    fn test_malformed_fields_decode_as_absent() {
        let criteria: SearchCriteria = serde_json::from_value(json!({
            "city": 42,
            "board": "   ",
            "feesMax": "lots",
            "feesMin": {"value": 1},
            "facilities": 7,
            "medium": null
        }))
        .unwrap();
        assert!(criteria.is_empty());
    }

    #[test]
    fn test_amounts_accept_numbers_and_strings() {
        let criteria: SearchCriteria = serde_json::from_value(json!({
            "feesMin": "20,000",
            "feesMax": 70000.9
        }))
        .unwrap();
        assert_eq!(criteria.fees_min, Some(20000));
        assert_eq!(criteria.fees_max, Some(70000));
    }

    #[test]
    fn test_facilities_list_skips_junk() {
        let criteria: SearchCriteria = serde_json::from_value(json!({
            "facilities": ["library", "", 3, " hostel "]
        }))
        .unwrap();
        assert_eq!(criteria.facilities, vec!["library", "hostel"]);
    }

    #[test]
    fn test_facilities_comma_string() {
        let criteria: SearchCriteria = serde_json::from_value(json!({
            "facilities": "library, swimming pool,"
        }))
        .unwrap();
        assert_eq!(criteria.facilities, vec!["library", "swimming pool"]);
    }

    #[test]
    fn test_builder_trims() {
        let criteria = SearchCriteria::new().city(" Delhi ").board("").facility("  ");
        assert_eq!(criteria.city.as_deref(), Some("Delhi"));
        assert_eq!(criteria.board, None);
        assert!(criteria.facilities.is_empty());
    }
}
