//! Category rules and the ordered rule set

use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

use crate::error::ConfigurationError;
use crate::model::ModelId;

/// Routing rule for one category.
///
/// `keywords` are the primary signal; `context_keywords` are scored at
/// half weight against the caller-supplied context. All keywords are held
/// lowercase so scoring is a plain substring check.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryRule {
    #[serde(default)]
    pub keywords: Vec<String>,
    #[serde(default)]
    pub context_keywords: Vec<String>,
    pub primary_model: ModelId,
    #[serde(default)]
    pub secondary_models: Vec<ModelId>,
    #[serde(default = "default_weight")]
    pub weight: f64,
    #[serde(default = "default_min_confidence")]
    pub min_confidence: f64,
}

fn default_weight() -> f64 {
    1.0
}

fn default_min_confidence() -> f64 {
    0.7
}

impl CategoryRule {
    /// A rule with no keywords, defaulting to weight 1.0 / min_confidence 0.7.
    pub fn new(primary_model: ModelId) -> Self {
        Self {
            keywords: Vec::new(),
            context_keywords: Vec::new(),
            primary_model,
            secondary_models: Vec::new(),
            weight: default_weight(),
            min_confidence: default_min_confidence(),
        }
    }

    pub fn with_keywords<I, S>(mut self, keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.keywords = keywords.into_iter().map(|k| k.into().to_lowercase()).collect();
        self
    }

    pub fn with_context_keywords<I, S>(mut self, keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.context_keywords = keywords.into_iter().map(|k| k.into().to_lowercase()).collect();
        self
    }

    pub fn with_secondaries<I: IntoIterator<Item = ModelId>>(mut self, models: I) -> Self {
        self.secondary_models = models.into_iter().collect();
        self
    }

    pub fn with_weight(mut self, weight: f64) -> Self {
        self.weight = weight;
        self
    }

    pub fn with_min_confidence(mut self, min_confidence: f64) -> Self {
        self.min_confidence = min_confidence;
        self
    }

    /// Check the rule invariants: positive weight, min_confidence in [0,1],
    /// secondaries distinct from the primary.
    pub fn validate(&self, category: &str) -> Result<(), ConfigurationError> {
        if self.weight <= 0.0 || !self.weight.is_finite() {
            return Err(ConfigurationError::InvalidRule {
                category: category.to_string(),
                reason: format!("weight must be positive, got {}", self.weight),
            });
        }
        if !(0.0..=1.0).contains(&self.min_confidence) {
            return Err(ConfigurationError::InvalidRule {
                category: category.to_string(),
                reason: format!("min_confidence must be in [0,1], got {}", self.min_confidence),
            });
        }
        if self.secondary_models.contains(&self.primary_model) {
            return Err(ConfigurationError::InvalidRule {
                category: category.to_string(),
                reason: format!(
                    "secondary model {} duplicates the primary",
                    self.primary_model
                ),
            });
        }
        Ok(())
    }
}

/// Ordered mapping of category name to rule.
///
/// Iteration order is declaration order, which keeps routing tie-breaks
/// (first category reaching the maximum score wins) reproducible across
/// runs and across save/load cycles.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RuleSet {
    entries: Vec<(String, CategoryRule)>,
}

impl RuleSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a validated rule. Duplicate names are rejected.
    pub fn insert(
        &mut self,
        name: impl Into<String>,
        mut rule: CategoryRule,
    ) -> Result<(), ConfigurationError> {
        let name = name.into();
        rule.validate(&name)?;
        if self.get(&name).is_some() {
            return Err(ConfigurationError::DuplicateCategory(name));
        }
        for kw in rule.keywords.iter_mut().chain(rule.context_keywords.iter_mut()) {
            *kw = kw.to_lowercase();
        }
        self.entries.push((name, rule));
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&CategoryRule> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, rule)| rule)
    }

    /// First category in declaration order (the ultimate routing fallback).
    pub fn first(&self) -> Option<(&str, &CategoryRule)> {
        self.entries.first().map(|(n, r)| (n.as_str(), r))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &CategoryRule)> {
        self.entries.iter().map(|(n, r)| (n.as_str(), r))
    }

    pub fn names(&self) -> Vec<String> {
        self.entries.iter().map(|(n, _)| n.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Replace or extend the keyword list of an existing category.
    ///
    /// Incoming keywords are lowercased. Unknown categories are an error;
    /// keyword updates never create categories implicitly.
    pub fn update_keywords(
        &mut self,
        category: &str,
        keywords: Vec<String>,
        append: bool,
    ) -> Result<(), ConfigurationError> {
        let rule = self
            .entries
            .iter_mut()
            .find(|(n, _)| n == category)
            .map(|(_, r)| r)
            .ok_or_else(|| ConfigurationError::UnknownCategory(category.to_string()))?;

        let mut incoming: Vec<String> = keywords.into_iter().map(|k| k.to_lowercase()).collect();
        if append {
            rule.keywords.append(&mut incoming);
        } else {
            rule.keywords = incoming;
        }
        Ok(())
    }

    /// The built-in rule set written when no configuration file exists:
    /// eight task categories with model assignments and thresholds, no
    /// keywords pre-populated.
    pub fn default_rules() -> Self {
        let mut rules = RuleSet::new();
        let defaults = [
            ("unit_testing", ModelId::OpenAiGpt4, vec![ModelId::Claude3], 1.0, 0.8),
            ("integration_testing", ModelId::Claude3, vec![ModelId::OpenAiGpt4], 0.9, 0.75),
            ("e2e_testing", ModelId::OpenAiGpt4, vec![ModelId::Claude2], 0.95, 0.8),
            ("performance_testing", ModelId::OpenAiGpt4, vec![ModelId::Llama70b], 0.85, 0.7),
            ("security_testing", ModelId::Claude3, vec![ModelId::OpenAiGpt4], 1.0, 0.9),
            ("accessibility_testing", ModelId::Claude2, vec![ModelId::OpenAiGpt35], 0.8, 0.75),
            ("code_review", ModelId::OpenAiGpt4, vec![ModelId::Claude3], 0.9, 0.8),
            ("debugging", ModelId::Claude3, vec![ModelId::OpenAiGpt4], 0.95, 0.85),
        ];
        for (name, primary, secondaries, weight, min_confidence) in defaults {
            rules
                .insert(
                    name,
                    CategoryRule::new(primary)
                        .with_secondaries(secondaries)
                        .with_weight(weight)
                        .with_min_confidence(min_confidence),
                )
                .expect("built-in rules are valid");
        }
        rules
    }
}

// RuleSet serializes as a mapping. Custom impls rather than a derive so
// that declaration order survives YAML/JSON round-trips and every rule is
// validated at deserialization time.
impl Serialize for RuleSet {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (name, rule) in &self.entries {
            map.serialize_entry(name, rule)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for RuleSet {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct RuleSetVisitor;

        impl<'de> Visitor<'de> for RuleSetVisitor {
            type Value = RuleSet;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a mapping of category name to rule")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<RuleSet, A::Error> {
                let mut rules = RuleSet::new();
                while let Some((name, rule)) = access.next_entry::<String, CategoryRule>()? {
                    rules
                        .insert(name, rule)
                        .map_err(serde::de::Error::custom)?;
                }
                Ok(rules)
            }
        }

        deserializer.deserialize_map(RuleSetVisitor)
    }
}
