use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::service::ServiceTypeId;
use crate::errors::DomainError;

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct QuoteId(pub String);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuoteStatus {
    Pending,
    Approved,
    Rejected,
    Completed,
}

/// One persisted pricing estimate for one customer submission.
///
/// `ai_analysis` holds the validated analysis JSON exactly as it was
/// accepted at submission time; later admin edits never rewrite it.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Quote {
    pub id: QuoteId,
    pub customer_email: Option<String>,
    pub customer_name: Option<String>,
    pub service_type_id: Option<ServiceTypeId>,
    pub photo_path: Option<String>,
    pub ai_analysis: Option<serde_json::Value>,
    pub total_price: Option<i64>,
    pub status: QuoteStatus,
    pub created_at: DateTime<Utc>,
}

impl Quote {
    pub fn can_transition_to(&self, next: QuoteStatus) -> bool {
        matches!(
            (self.status, next),
            (QuoteStatus::Pending, QuoteStatus::Approved)
                | (QuoteStatus::Pending, QuoteStatus::Rejected)
                | (QuoteStatus::Approved, QuoteStatus::Completed)
        )
    }

    pub fn transition_to(&mut self, next: QuoteStatus) -> Result<(), DomainError> {
        if self.can_transition_to(next) {
            self.status = next;
            return Ok(());
        }

        Err(DomainError::InvalidQuoteTransition { from: self.status, to: next })
    }
}

impl QuoteStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
            Self::Completed => "completed",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "pending" => Some(Self::Pending),
            "approved" => Some(Self::Approved),
            "rejected" => Some(Self::Rejected),
            "completed" => Some(Self::Completed),
            _ => None,
        }
    }
}
