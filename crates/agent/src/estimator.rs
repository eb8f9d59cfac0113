use std::sync::Arc;

use refineai_core::pricing::{AnalysisError, PricingAnalysis};
use thiserror::Error;

use crate::llm::{LlmError, VisionLlm};
use crate::prompt::build_analysis_prompt;

#[derive(Debug, Error)]
pub enum EstimateError {
    #[error(transparent)]
    Llm(#[from] LlmError),
    #[error(transparent)]
    Analysis(#[from] AnalysisError),
}

/// Turns one photo into a validated pricing analysis.
pub struct PricingEstimator {
    llm: Arc<dyn VisionLlm>,
}

impl PricingEstimator {
    pub fn new(llm: Arc<dyn VisionLlm>) -> Self {
        Self { llm }
    }

    pub async fn estimate(
        &self,
        image_base64: &str,
        mime_type: &str,
        service_type_name: &str,
    ) -> Result<PricingAnalysis, EstimateError> {
        let prompt = build_analysis_prompt(service_type_name);
        let reply = self.llm.analyze_image(image_base64, mime_type, &prompt).await?;

        let analysis = PricingAnalysis::parse_reply(&reply)?;
        tracing::info!(
            event_name = "estimate.analyzed",
            service_type = %service_type_name,
            total_price = analysis.total_price,
            complexity = analysis.complexity,
            "pricing analysis accepted"
        );

        Ok(analysis)
    }
}


#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::testing::MockVisionLlm;
    use super::{EstimateError, PricingEstimator};

    const GOOD_REPLY: &str = r#"Assessment follows.
{
  "totalPrice": 725,
  "breakdown": {"basePrice": 480, "complexityMultiplier": 1.3, "additionalFees": 75, "laborHours": 8},
  "complexity": 4,
  "surfaceArea": 45,
  "conditionAssessment": {"damage": ["three small chips"], "cleanability": "fair", "existingFinish": "worn fiberglass"},
  "recommendations": ["repair chips before coating"]
}"#;

    #[tokio::test]
    async fn estimate_parses_and_validates_model_reply() {
        let llm = Arc::new(MockVisionLlm::replying(GOOD_REPLY));
        let estimator = PricingEstimator::new(llm.clone());

        let analysis = estimator
            .estimate("aGVsbG8=", "image/jpeg", "Bathtub Refinishing")
            .await
            .expect("estimate");

        assert_eq!(analysis.total_price_dollars(), 725);
        assert_eq!(analysis.complexity, 4);

        let prompt = llm.last_prompt.lock().expect("prompt lock").clone().expect("prompt recorded");
        assert!(prompt.contains("Service category: Bathtub Refinishing"));
        assert!(prompt.contains("MASTER PRICING POLICY"));
    }

    #[tokio::test]
    async fn estimate_propagates_llm_failures() {
        let estimator = PricingEstimator::new(Arc::new(MockVisionLlm::failing(503)));
        let error = estimator
            .estimate("aGVsbG8=", "image/jpeg", "Bathtub Refinishing")
            .await
            .expect_err("should fail");
        assert!(matches!(error, EstimateError::Llm(_)));
    }

    #[tokio::test]
    async fn estimate_rejects_invalid_analysis() {
        let reply = r#"{"totalPrice": -5, "breakdown": {"basePrice": 480, "complexityMultiplier": 1.3}, "complexity": 4}"#;
        let estimator = PricingEstimator::new(Arc::new(MockVisionLlm::replying(reply)));
        let error = estimator
            .estimate("aGVsbG8=", "image/jpeg", "Bathtub Refinishing")
            .await
            .expect_err("should fail");
        assert!(matches!(error, EstimateError::Analysis(_)));
    }

    #[tokio::test]
    async fn estimate_rejects_reply_without_json() {
        let estimator =
            PricingEstimator::new(Arc::new(MockVisionLlm::replying("I cannot see the image.")));
        let error = estimator
            .estimate("aGVsbG8=", "image/jpeg", "Bathtub Refinishing")
            .await
            .expect_err("should fail");
        assert!(matches!(error, EstimateError::Analysis(_)));
    }
}
