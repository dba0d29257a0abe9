use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApprovalStatus {
    Pending,
    Approved,
    Rejected,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Review {
    pub rating: f64,
    pub approval_status: ApprovalStatus,
}

/// Rating aggregate written back onto a school.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewStats {
    pub average_rating: f64,
    pub total_reviews: u32,
}

impl ReviewStats {
    /// Average over approved reviews only, rounded to two decimals; 0 when
    /// there are none.
    pub fn from_reviews(reviews: &[Review]) -> Self {
        let approved: Vec<f64> = reviews
            .iter()
            .filter(|r| r.approval_status == ApprovalStatus::Approved)
            .map(|r| r.rating)
            .collect();

        if approved.is_empty() {
            return Self {
                average_rating: 0.0,
                total_reviews: 0,
            };
        }

        let mean = approved.iter().sum::<f64>() / approved.len() as f64;
        Self {
            average_rating: (mean * 100.0).round() / 100.0,
            total_reviews: approved.len() as u32,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn review(rating: f64, approval_status: ApprovalStatus) -> Review {
        Review { rating, approval_status }
    }

    #[test]
    fn test_only_approved_count() {
        let stats = ReviewStats::from_reviews(&[
            review(5.0, ApprovalStatus::Approved),
            review(4.0, ApprovalStatus::Approved),
            review(4.0, ApprovalStatus::Approved),
            review(1.0, ApprovalStatus::Rejected),
            review(1.0, ApprovalStatus::Pending),
        ]);
        assert_eq!(stats.total_reviews, 3);
        assert_eq!(stats.average_rating, 4.33);
    }

    #[test]
    fn test_no_reviews() {
        let stats = ReviewStats::from_reviews(&[]);
        assert_eq!(stats.average_rating, 0.0);
        assert_eq!(stats.total_reviews, 0);
    }

    #[test]
    fn test_status_wire_format() {
        let r: Review = serde_json::from_str(r#"{"rating": 3, "approvalStatus": "approved"}"#).unwrap();
        assert_eq!(r.approval_status, ApprovalStatus::Approved);
    }
}
