pub mod config;
pub mod domain;
pub mod errors;
pub mod pricing;

pub use domain::admin::AdminSettings;
pub use domain::chat::{ChatMessage, ChatMessageId, ChatRole};
pub use domain::quote::{Quote, QuoteId, QuoteStatus};
pub use domain::service::{ServiceType, ServiceTypeId};
pub use errors::{ApplicationError, DomainError, InterfaceError};
pub use pricing::{AnalysisError, ConditionAssessment, PriceBreakdown, PricingAnalysis};
