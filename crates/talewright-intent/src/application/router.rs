//! Intent analysis use case: deterministic classification with an optional
//! generative refinement.

use async_trait::async_trait;
use serde::Serialize;
use talewright_core::error::DomainError;
use tracing::{debug, instrument, warn};

use crate::domain::annotator::annotate_segments;
use crate::domain::classifier::{ClassifierInput, IntentClassification, classify_intent};
use crate::domain::decision::{IntentDecision, parse_intent_decision};
use crate::domain::segmenter::{Segment, segment_message};

/// What the generative router is shown.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RouterRequest {
    pub text: String,
    pub segments: Vec<Segment>,
    pub scene_participants: Vec<String>,
    pub in_combat: bool,
    /// Deterministic decision, offered as a hint.
    pub deterministic: IntentDecision,
}

/// An untrusted generative source of `IntentDecision` JSON.
#[async_trait]
pub trait IntentRouter: Send + Sync {
    /// Returns raw model output for `request`.
    async fn route(&self, request: &RouterRequest) -> Result<String, DomainError>;
}

/// Where the final decision came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DecisionSource {
    Deterministic,
    Router,
}

/// Full analysis of one player message.
#[derive(Debug, Clone)]
pub struct IntentAnalysis {
    pub segments: Vec<Segment>,
    pub classification: IntentClassification,
    pub decision: IntentDecision,
    pub source: DecisionSource,
}

impl IntentAnalysis {
    /// Builds the router request for this analysis.
    #[must_use]
    pub fn router_request(&self, input: &ClassifierInput<'_>) -> RouterRequest {
        RouterRequest {
            text: input.text.to_owned(),
            segments: self.segments.clone(),
            scene_participants: input.scene_participants.to_vec(),
            in_combat: input.game_context.in_combat,
            deterministic: self.decision.clone(),
        }
    }
}

/// Segments, annotates and classifies `input` without any generative help.
#[must_use]
#[instrument(skip_all, fields(text_len = input.text.len()))]
pub fn analyze_text(input: &ClassifierInput<'_>) -> IntentAnalysis {
    let segments = annotate_segments(segment_message(input.text), input.last_resolved_action);
    let classification = classify_intent(input);
    let decision = IntentDecision::from_classification(&segments, &classification);

    debug!(
        rule = %classification.rule,
        action = %classification.action,
        should_roll = decision.should_roll,
        "intent classified"
    );

    IntentAnalysis {
        segments,
        classification,
        decision,
        source: DecisionSource::Deterministic,
    }
}

/// Asks `router` for a richer decision. Router errors and invalid output
/// leave `analysis` unchanged.
#[instrument(skip_all, fields(rule = %analysis.classification.rule))]
pub async fn refine_with_router(
    mut analysis: IntentAnalysis,
    input: &ClassifierInput<'_>,
    router: &dyn IntentRouter,
) -> IntentAnalysis {
    let request = analysis.router_request(input);
    let raw = match router.route(&request).await {
        Ok(raw) => raw,
        Err(err) => {
            warn!(error = %err, "intent router failed, using deterministic decision");
            return analysis;
        }
    };

    match parse_intent_decision(&raw, &analysis.segments) {
        Ok(decision) => {
            debug!(domain = %decision.domain, should_roll = decision.should_roll, "router decision accepted");
            analysis.decision = decision;
            analysis.source = DecisionSource::Router;
        }
        Err(err) => {
            warn!(error = %err, "router decision rejected, using deterministic decision");
        }
    }
    analysis
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::classifier::GameContext;
    use crate::domain::decision::Domain;

    struct CannedRouter(Result<&'static str, &'static str>);

    #[async_trait]
    impl IntentRouter for CannedRouter {
        async fn route(&self, _request: &RouterRequest) -> Result<String, DomainError> {
            self.0
                .map(str::to_owned)
                .map_err(|e| DomainError::Infrastructure(e.to_owned()))
        }
    }

    fn analysis_for(text: &str) -> IntentAnalysis {
        let context = GameContext::default();
        analyze_text(&ClassifierInput::new(text, &[], &context))
    }

    // --- analyze_text ---

    #[test]
    fn test_analyze_text_rolls_for_sneak() {
        let analysis = analysis_for("I sneak past the sleeping dog");
        assert_eq!(analysis.decision.domain, Domain::Stealth);
        assert!(analysis.decision.should_roll);
        assert_eq!(analysis.source, DecisionSource::Deterministic);
    }

    #[test]
    fn test_analyze_text_does_not_roll_for_talk() {
        let analysis = analysis_for("Good evening to you all");
        assert!(!analysis.decision.should_roll);
        assert_eq!(analysis.decision.domain, Domain::None);
    }

    // --- refine_with_router ---

    #[tokio::test]
    async fn test_valid_router_output_is_accepted() {
        let text = "I sneak past the sleeping dog";
        let context = GameContext::default();
        let input = ClassifierInput::new(text, &[], &context);
        let analysis = analyze_text(&input);
        let router = CannedRouter(Ok(
            r#"Sure: {"intentType":"ACTION_NOW","domain":"stealth","shouldRoll":true,"stat":"DEX","skill":"Stealth","dc":14,"actionLabel":"sneak past dog"}"#,
        ));

        let refined = refine_with_router(analysis, &input, &router).await;

        assert_eq!(refined.source, DecisionSource::Router);
        assert_eq!(refined.decision.dc, Some(14));
        assert_eq!(refined.decision.skill.as_deref(), Some("stealth"));
    }

    #[tokio::test]
    async fn test_malformed_router_output_falls_back() {
        let text = "I sneak past the sleeping dog";
        let context = GameContext::default();
        let input = ClassifierInput::new(text, &[], &context);
        let analysis = analyze_text(&input);
        let expected = analysis.decision.clone();
        let router = CannedRouter(Ok(r#"{"domain":"stealth"}"#));

        let refined = refine_with_router(analysis, &input, &router).await;

        assert_eq!(refined.source, DecisionSource::Deterministic);
        assert_eq!(refined.decision, expected);
    }

    #[tokio::test]
    async fn test_router_error_falls_back() {
        let text = "I kick down the door";
        let context = GameContext::default();
        let input = ClassifierInput::new(text, &[], &context);
        let analysis = analyze_text(&input);
        let expected = analysis.decision.clone();
        let router = CannedRouter(Err("model offline"));

        let refined = refine_with_router(analysis, &input, &router).await;

        assert_eq!(refined.source, DecisionSource::Deterministic);
        assert_eq!(refined.decision, expected);
    }
}
