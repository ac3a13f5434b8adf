//! Declarative routing overrides, consulted before load-balanced
//! selection. Rules let an operator pin a model pattern to a specific
//! provider or exclude one without touching code.

use regex::Regex;

/// What a matching rule does to the candidate set.
#[derive(Debug, Clone)]
pub enum RuleAction {
    /// Only this provider id may serve the matched model.
    ForceProvider(String),
    /// This provider id is never selected for the matched model.
    ExcludeProvider(String),
}

/// A single `model pattern -> action` routing override.
#[derive(Debug, Clone)]
pub struct RoutingRule {
    /// Regex matched against the requested model id.
    pub model_pattern: Regex,
    /// What happens to the candidate set on a match.
    pub action: RuleAction,
}

impl RoutingRule {
    /// Force every request for models matching `pattern` onto `provider_id`.
    ///
    /// # Errors
    /// Returns an error if `pattern` isn't a valid regex.
    pub fn force_provider(pattern: &str, provider_id: impl Into<String>) -> Result<Self, regex::Error> {
        Ok(Self {
            model_pattern: Regex::new(pattern)?,
            action: RuleAction::ForceProvider(provider_id.into()),
        })
    }

    /// Exclude `provider_id` from serving models matching `pattern`.
    ///
    /// # Errors
    /// Returns an error if `pattern` isn't a valid regex.
    pub fn exclude_provider(pattern: &str, provider_id: impl Into<String>) -> Result<Self, regex::Error> {
        Ok(Self {
            model_pattern: Regex::new(pattern)?,
            action: RuleAction::ExcludeProvider(provider_id.into()),
        })
    }
}

/// Applies a rule set to a model id, in declaration order.
pub struct RuleMatcher;

impl RuleMatcher {
    /// Reduce `candidate_ids` to those still eligible for `model` after
    /// applying every rule that matches it.
    #[must_use]
    pub fn apply(rules: &[RoutingRule], model: &str, candidate_ids: Vec<String>) -> Vec<String> {
        let mut ids = candidate_ids;
        for rule in rules {
            if !rule.model_pattern.is_match(model) {
                continue;
            }
            match &rule.action {
                RuleAction::ForceProvider(id) => {
                    if ids.iter().any(|c| c == id) {
                        ids = vec![id.clone()];
                    }
                }
                RuleAction::ExcludeProvider(id) => {
                    ids.retain(|c| c != id);
                }
            }
        }
        ids
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn force_provider_narrows_to_one_candidate() {
        let rule = RoutingRule::force_provider("^gpt-4", "openai-primary").unwrap();
        let result = RuleMatcher::apply(
            &[rule],
            "gpt-4o",
            vec!["openai-primary".into(), "openai-backup".into()],
        );
        assert_eq!(result, vec!["openai-primary".to_string()]);
    }

    #[test]
    fn exclude_provider_removes_matching_candidate() {
        let rule = RoutingRule::exclude_provider("^claude", "anthropic-degraded").unwrap();
        let result = RuleMatcher::apply(
            &[rule],
            "claude-3-5-sonnet-latest",
            vec!["anthropic-degraded".into(), "anthropic-primary".into()],
        );
        assert_eq!(result, vec!["anthropic-primary".to_string()]);
    }

    #[test]
    fn non_matching_rule_leaves_candidates_untouched() {
        let rule = RoutingRule::exclude_provider("^gemini", "google").unwrap();
        let result = RuleMatcher::apply(&[rule], "gpt-4o", vec!["openai".into()]);
        assert_eq!(result, vec!["openai".to_string()]);
    }
}
