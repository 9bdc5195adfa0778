//! Keyword router: scoring, confidence and fallback

use serde::{Deserialize, Serialize};

use crate::error::RouteError;
use crate::rules::{CategoryRule, RuleSet};

/// Confidence assigned when a category has no keywords configured, and to
/// every fallback decision.
pub const NEUTRAL_CONFIDENCE: f64 = 0.5;

/// Category used when no rule clears its own confidence threshold. When
/// absent from the rule set, the first declared category takes its place.
pub const FALLBACK_CATEGORY: &str = "general";

/// Result of one routing pass. Ephemeral: consumed immediately by the
/// orchestrator, never persisted.
///
/// `rule` is a snapshot taken at route time, so a concurrent configuration
/// reload cannot change the rule mid-request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RouteDecision {
    pub category: String,
    pub rule: CategoryRule,
    pub confidence: f64,
}

/// Score a query against every category and pick the route.
///
/// Scoring: each keyword contained in the lowercased query adds the rule's
/// weight; when `context` is non-empty, each context keyword contained in
/// the lowercased context adds half the weight. The highest raw score wins,
/// first-in-declaration-order on ties.
///
/// Confidence is a coverage ratio: raw score over `keyword_count * weight`
/// (neutral 0.5 for keyword-less categories). A category is accepted only
/// when confidence clears its own `min_confidence`; otherwise the decision
/// falls back to [`FALLBACK_CATEGORY`] (or the first category) at neutral
/// confidence.
pub fn route(rules: &RuleSet, query: &str, context: &str) -> Result<RouteDecision, RouteError> {
    if rules.is_empty() {
        return Err(RouteError::NoCategories);
    }

    let query_lower = query.to_lowercase();
    let context_lower = (!context.is_empty()).then(|| context.to_lowercase());

    let mut best: Option<(&str, &CategoryRule, f64)> = None;
    for (name, rule) in rules.iter() {
        let mut score = 0.0;
        for keyword in &rule.keywords {
            if query_lower.contains(keyword.as_str()) {
                score += rule.weight;
            }
        }
        if let Some(context_lower) = &context_lower {
            for keyword in &rule.context_keywords {
                if context_lower.contains(keyword.as_str()) {
                    score += rule.weight * 0.5;
                }
            }
        }
        // Strictly-greater keeps the first category on ties.
        if best.map_or(true, |(_, _, top)| score > top) {
            best = Some((name, rule, score));
        }
    }

    let (category, rule, score) = best.expect("rule set checked non-empty");

    let confidence = if rule.keywords.is_empty() {
        NEUTRAL_CONFIDENCE
    } else {
        score / (rule.keywords.len() as f64 * rule.weight)
    };

    if confidence >= rule.min_confidence {
        tracing::debug!(category, confidence, "query routed");
        return Ok(RouteDecision {
            category: category.to_string(),
            rule: rule.clone(),
            confidence,
        });
    }

    let (fallback, rule) = match rules.get(FALLBACK_CATEGORY) {
        Some(rule) => (FALLBACK_CATEGORY, rule),
        None => rules.first().expect("rule set checked non-empty"),
    };
    tracing::debug!(
        category = fallback,
        rejected = category,
        confidence,
        "confidence below threshold, falling back"
    );
    Ok(RouteDecision {
        category: fallback.to_string(),
        rule: rule.clone(),
        confidence: NEUTRAL_CONFIDENCE,
    })
}

/// Post-hoc rescan of the selected rule's keywords against the query.
///
/// Observability only: reported in query metadata, independent of the
/// scoring pass.
pub fn matched_keywords(rule: &CategoryRule, query: &str) -> Vec<String> {
    let query_lower = query.to_lowercase();
    rule.keywords
        .iter()
        .filter(|kw| query_lower.contains(kw.as_str()))
        .cloned()
        .collect()
}
