//! Free-text query extraction
//!
//! Turns a chat message such as *"CBSE day school in Pune under 80k with a
//! library"* into structured filters. Keywords are matched on word
//! boundaries, so "ib" does not fire inside "library" and "ac" does not fire
//! inside "academy".

use ahash::AHashSet;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

use crate::criteria::SearchCriteria;

const BOARDS: [(&str, &str); 5] = [
    ("cbse", "CBSE"),
    ("icse", "ICSE"),
    ("ib", "IB"),
    ("igcse", "IGCSE"),
    ("state", "State"),
];

/// Words that end an unquoted school name: "Delhi Public School".
const NAME_ENDINGS: [&str; 6] = ["school", "academy", "international", "convent", "public", "vidyalaya"];

const MEDIUMS: [(&str, &str); 3] = [("english", "English"), ("hindi", "Hindi"), ("gujarati", "Gujarati")];

const FACILITY_KEYWORDS: [(&str, &[&str]); 11] = [
    ("sports", &["sports", "playground", "swimming", "fitness", "football", "cricket", "basketball"]),
    ("transport", &["transport", "bus", "van"]),
    ("hostel", &["hostel", "boarding", "residential"]),
    ("library", &["library", "books"]),
    ("computer lab", &["computer", "lab", "it lab"]),
    ("wifi", &["wifi", "wi-fi", "internet"]),
    ("smart board", &["smart board", "digital classroom"]),
    ("ac", &["ac", "air condition"]),
    ("cctv", &["cctv", "camera", "security"]),
    ("medical", &["medical", "infirmary", "doctor", "nurse"]),
    ("cafeteria", &["cafeteria", "canteen", "mess", "food"]),
];

struct Patterns {
    quoted: Regex,
    fees: Regex,
    class_level: Regex,
    day_school: Regex,
    boarding: Regex,
    boards: Vec<(Regex, &'static str)>,
    mediums: Vec<(Regex, &'static str)>,
    facilities: Vec<(Regex, &'static str)>,
}

fn word_pattern(words: &[&str]) -> Regex {
    let alternatives: Vec<String> = words.iter().map(|w| regex::escape(w)).collect();
    Regex::new(&format!(r"(?i)\b(?:{})\b", alternatives.join("|"))).expect("keyword pattern")
}

fn patterns() -> &'static Patterns {
    static PATTERNS: OnceLock<Patterns> = OnceLock::new();
    PATTERNS.get_or_init(|| Patterns {
        quoted: Regex::new(r#""([^"]+)"|'([^']+)'"#).expect("quoted pattern"),
        fees: Regex::new(r"(?i)(?:\bunder|\bbelow|\bless than|₹|\brs\.?)\s*(\d+(?:,\d+)*)\s*(k|lakhs?)?\b")
            .expect("fees pattern"),
        class_level: Regex::new(r"(?i)\bclass\s+(\d+|[ivx]+)\b").expect("class pattern"),
        day_school: word_pattern(&["day school", "day-school"]),
        boarding: word_pattern(&["boarding", "residential"]),
        boards: BOARDS.iter().map(|(kw, name)| (word_pattern(&[kw]), *name)).collect(),
        mediums: MEDIUMS.iter().map(|(kw, name)| (word_pattern(&[kw]), *name)).collect(),
        facilities: FACILITY_KEYWORDS
            .iter()
            .map(|(name, kws)| (word_pattern(kws), *name))
            .collect(),
    })
}

/// Up to two words before the first name ending, plus the ending itself.
/// The ending must not be the first word.
fn guess_school_name(message: &str) -> Option<String> {
    let words: Vec<&str> = message.split_whitespace().collect();
    let end = words
        .iter()
        .enumerate()
        .skip(1)
        .find(|(_, w)| NAME_ENDINGS.contains(&w.to_lowercase().as_str()))
        .map(|(i, _)| i)?;
    Some(words[end.saturating_sub(2)..=end].join(" "))
}

/// Known cities named in `message`, in `known` order with their stored
/// spelling. One alternation is compiled per call, longest names first so
/// "New Delhi" wins over "Delhi".
fn match_cities<S: AsRef<str>>(message: &str, known: &[S]) -> Vec<String> {
    let mut names: Vec<&str> = known
        .iter()
        .map(|c| c.as_ref().trim())
        .filter(|c| !c.is_empty())
        .collect();
    if names.is_empty() {
        return Vec::new();
    }
    names.sort_by_key(|c| std::cmp::Reverse(c.len()));

    let alternatives: Vec<String> = names.iter().map(|c| regex::escape(c)).collect();
    let Ok(pattern) = Regex::new(&format!(r"(?i)\b(?:{})\b", alternatives.join("|"))) else {
        return Vec::new();
    };

    let found: AHashSet<String> = pattern
        .find_iter(message)
        .map(|m| m.as_str().to_lowercase())
        .collect();

    let mut seen = AHashSet::new();
    known
        .iter()
        .map(|c| c.as_ref().trim())
        .filter(|c| found.contains(&c.to_lowercase()) && seen.insert(c.to_lowercase()))
        .map(str::to_string)
        .collect()
}

/// Everything recognised in a free-text query.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryFilters {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub school_name: Option<String>,
    /// Set when `school_name` came from quotes rather than the keyword guess.
    #[serde(skip)]
    pub name_quoted: bool,
    pub boards: Vec<String>,
    pub cities: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub school_type: Option<String>,
    pub mediums: Vec<String>,
    pub facilities: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fees_max: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub class_level: Option<String>,
}

impl QueryFilters {
    /// Extract filters from `message`. `known_cities` are matched as whole
    /// words, case-insensitively, and reported with their stored spelling.
    pub fn extract<S: AsRef<str>>(message: &str, known_cities: &[S]) -> Self {
        let p = patterns();

        let quoted = p.quoted.captures(message).and_then(|c| {
            c.get(1)
                .or_else(|| c.get(2))
                .map(|m| m.as_str().trim().to_string())
                .filter(|s| !s.is_empty())
        });
        let name_quoted = quoted.is_some();
        let school_name = quoted.or_else(|| guess_school_name(message));

        let boards = p
            .boards
            .iter()
            .filter(|(re, _)| re.is_match(message))
            .map(|(_, name)| name.to_string())
            .collect();

        let school_type = if p.day_school.is_match(message) {
            Some("Day School".to_string())
        } else if p.boarding.is_match(message) {
            Some("Boarding".to_string())
        } else {
            None
        };

        let mediums = p
            .mediums
            .iter()
            .filter(|(re, _)| re.is_match(message))
            .map(|(_, name)| name.to_string())
            .collect();

        let facilities = p
            .facilities
            .iter()
            .filter(|(re, _)| re.is_match(message))
            .map(|(_, name)| name.to_string())
            .collect();

        let fees_max = p.fees.captures(message).and_then(|c| {
            let digits: String = c[1].chars().filter(|ch| *ch != ',').collect();
            let amount: i64 = digits.parse().ok()?;
            let multiplier = match c.get(2).map(|m| m.as_str().to_lowercase()) {
                Some(suffix) if suffix == "k" => 1_000,
                Some(suffix) if suffix.starts_with("lakh") => 100_000,
                _ => 1,
            };
            amount.checked_mul(multiplier)
        });

        let class_level = p.class_level.find(message).map(|m| m.as_str().to_lowercase());

        let cities = match_cities(message, known_cities);

        Self {
            school_name,
            name_quoted,
            boards,
            cities,
            school_type,
            mediums,
            facilities,
            fees_max,
            class_level,
        }
    }

    /// Criteria for the matcher. A dimension with several candidates (two
    /// boards, say) stays unconstrained since criteria hold one value each.
    pub fn into_criteria(self) -> SearchCriteria {
        fn single(mut values: Vec<String>) -> Option<String> {
            if values.len() == 1 {
                values.pop()
            } else {
                None
            }
        }

        SearchCriteria {
            city: single(self.cities),
            board: single(self.boards),
            school_type: self.school_type,
            medium: single(self.mediums),
            fees_min: None,
            fees_max: self.fees_max,
            facilities: self.facilities,
            name: self.school_name.filter(|_| self.name_quoted),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const NO_CITIES: [&str; 0] = [];

    #[test]
    fn test_full_query() {
        let q = QueryFilters::extract(
            "Looking for a CBSE day school in Pune under 80k with a library and bus service",
            &["Pune", "Delhi"],
        );
        assert_eq!(q.boards, vec!["CBSE"]);
        assert_eq!(q.cities, vec!["Pune"]);
        assert_eq!(q.school_type.as_deref(), Some("Day School"));
        assert_eq!(q.fees_max, Some(80_000));
        assert_eq!(q.facilities, vec!["transport", "library"]);
    }

    #[test]
    fn test_word_boundaries() {
        let q = QueryFilters::extract("a library at the academy", &NO_CITIES);
        assert!(q.boards.is_empty());
        assert_eq!(q.facilities, vec!["library"]);
    }

    #[test]
    fn test_boarding_sets_type_and_hostel() {
        let q = QueryFilters::extract("residential schools with english medium", &NO_CITIES);
        assert_eq!(q.school_type.as_deref(), Some("Boarding"));
        assert_eq!(q.facilities, vec!["hostel"]);
        assert_eq!(q.mediums, vec!["English"]);
    }

    #[test]
    fn test_fee_suffixes() {
        assert_eq!(QueryFilters::extract("below 2 lakh", &NO_CITIES).fees_max, Some(200_000));
        assert_eq!(QueryFilters::extract("fees less than 1,50,000", &NO_CITIES).fees_max, Some(150_000));
        assert_eq!(QueryFilters::extract("₹50000 per year", &NO_CITIES).fees_max, Some(50_000));
        assert_eq!(QueryFilters::extract("Rs. 90k", &NO_CITIES).fees_max, Some(90_000));
        assert_eq!(QueryFilters::extract("under 5 kids per class", &NO_CITIES).fees_max, Some(5));
        assert_eq!(QueryFilters::extract("good schools", &NO_CITIES).fees_max, None);
    }

    #[test]
    fn test_quoted_name_and_class() {
        let q = QueryFilters::extract("Tell me about 'Orbit International' for class 5", &NO_CITIES);
        assert_eq!(q.school_name.as_deref(), Some("Orbit International"));
        assert_eq!(q.class_level.as_deref(), Some("class 5"));
    }

    #[test]
    fn test_into_criteria_drops_ambiguous_dimensions() {
        let q = QueryFilters::extract("CBSE or ICSE schools in hindi", &NO_CITIES);
        let criteria = q.into_criteria();
        assert_eq!(criteria.board, None);
        assert_eq!(criteria.medium.as_deref(), Some("Hindi"));
    }

    #[test]
    fn test_unquoted_name_is_reported_but_not_searched() {
        let q = QueryFilters::extract("fees at Delhi Public School for class 3", &NO_CITIES);
        assert_eq!(q.school_name.as_deref(), Some("at Delhi Public"));
        assert!(!q.name_quoted);
        assert_eq!(q.clone().into_criteria().name, None);

        let q = QueryFilters::extract("is Kendriya Vidyalaya good", &NO_CITIES);
        assert_eq!(q.school_name.as_deref(), Some("is Kendriya Vidyalaya"));

        // A leading ending is not a name.
        assert_eq!(QueryFilters::extract("school near me", &NO_CITIES).school_name, None);

        let q = QueryFilters::extract("details of \"Orbit School\"", &NO_CITIES);
        assert!(q.name_quoted);
        assert_eq!(q.into_criteria().name.as_deref(), Some("Orbit School"));
    }

    #[test]
    fn test_cities_keep_stored_spelling_and_order() {
        let known = ["Pune", "New Delhi", "Delhi", "Surat", ""];
        let q = QueryFilters::extract("schools in surat or NEW DELHI", &known);
        assert_eq!(q.cities, vec!["New Delhi", "Surat"]);

        let q = QueryFilters::extract("delhi and pune", &known);
        assert_eq!(q.cities, vec!["Pune", "Delhi"]);

        let q = QueryFilters::extract("punekar schools", &known);
        assert!(q.cities.is_empty());
    }

    #[test]
    fn test_empty_message() {
        let criteria = QueryFilters::extract("", &NO_CITIES).into_criteria();
        assert!(criteria.is_empty());
    }
}
