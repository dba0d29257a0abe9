use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::borrow::Cow;

pub type SchoolId = u64;

/// Free text that older documents store as one comma-delimited string and
/// newer ones as a list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TextList {
    One(String),
    Many(Vec<String>),
}

impl TextList {
    /// Flatten to the comma-delimited form.
    pub fn as_text(&self) -> Cow<'_, str> {
        match self {
            TextList::One(s) => Cow::Borrowed(s.as_str()),
            TextList::Many(items) => Cow::Owned(items.join(", ")),
        }
    }

    pub fn is_blank(&self) -> bool {
        match self {
            TextList::One(s) => s.trim().is_empty(),
            TextList::Many(items) => items.iter().all(|s| s.trim().is_empty()),
        }
    }
}

impl From<&str> for TextList {
    fn from(s: &str) -> Self {
        TextList::One(s.to_string())
    }
}

/// A school profile as stored by the document store.
///
/// Facilities come in two shapes that coexist across data generations: the
/// `has*` boolean flags and the free-form `facilities` list. Both are kept
/// as read; reconciling them is the matcher's job.
///
/// Fields this type does not model are kept in `extra` so that a record read
/// from a snapshot is written back unchanged.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SchoolRecord {
    pub id: SchoolId,
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub board: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub school_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub medium: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub languages: Option<TextList>,

    #[serde(default)]
    pub fees_min: Option<i64>,
    #[serde(default)]
    pub fees_max: Option<i64>,

    #[serde(default)]
    pub rating: Option<f64>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub review_count: u32,

    #[serde(default, deserialize_with = "null_as_default")]
    pub featured: bool,
    #[serde(default = "default_public", deserialize_with = "null_as_public")]
    pub is_public: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub has_library: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub has_computer_lab: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub has_playground: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sports_facilities: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub has_swimming_pool: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub has_hostel: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub has_transport: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub has_cafeteria: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub has_auditorium: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub facilities: Option<Vec<String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logo: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logo_url: Option<String>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

fn default_public() -> bool {
    true
}

/// Explicit `null` reads like a missing field.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

fn null_as_public<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<bool>::deserialize(deserializer)?.unwrap_or_else(default_public))
}

impl SchoolRecord {
    pub fn new(id: SchoolId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            is_public: true,
            ..Default::default()
        }
    }

    /// Rating used for ordering; a missing rating ranks as 0.
    #[inline]
    pub fn rating_or_zero(&self) -> f64 {
        self.rating.unwrap_or(0.0)
    }

    /// `medium` when set, otherwise `languages` flattened to text.
    pub fn display_medium(&self) -> Option<String> {
        match self.medium.as_deref() {
            Some(m) if !m.is_empty() => Some(m.to_string()),
            _ => self.languages.as_ref().map(|l| l.as_text().into_owned()),
        }
    }

    /// `logo` when set, otherwise `logoUrl`.
    pub fn display_logo(&self) -> Option<String> {
        match self.logo.as_deref() {
            Some(l) if !l.is_empty() => Some(l.to_string()),
            _ => self.logo_url.clone(),
        }
    }

    pub fn summary(&self) -> SchoolSummary {
        SchoolSummary {
            id: self.id,
            name: self.name.clone(),
            board: self.board.clone(),
            city: self.city.clone(),
            fees_min: self.fees_min,
            fees_max: self.fees_max,
            rating: self.rating_or_zero(),
            facilities: self.facilities.clone(),
            school_type: self.school_type.clone(),
            medium: self.display_medium(),
            logo: self.display_logo(),
        }
    }
}

/// The card-shaped view of a school handed to search callers. The shape is
/// the same whichever representation the stored record used.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SchoolSummary {
    pub id: SchoolId,
    pub name: String,
    pub board: Option<String>,
    pub city: Option<String>,
    pub fees_min: Option<i64>,
    pub fees_max: Option<i64>,
    pub rating: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub facilities: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub school_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub medium: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub logo: Option<String>,
}
