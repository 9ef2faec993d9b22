//! Keyword-based message routing
//!
//! Classifies a free-text chat message into the set of agents that should
//! answer it, by case-insensitive substring match against fixed keyword sets.
//! Every matching agent is selected — this is a fan-out, not a classifier
//! with a winner. When nothing matches, the configured fallback agent is
//! selected, so the result is always non-empty.

use tracing::debug;

use crate::types::AgentKind;

/// Keyword sets per agent. Note that generic drink/water terms route to the
/// hydration agent; the drinks agent answers label/scan questions.
const HYDRATION_KEYWORDS: &[&str] = &["drink", "hydration", "urine", "fluid", "water"];
const WEATHER_KEYWORDS: &[&str] = &["weather", "heat", "humidity", "temperature"];
const ACTIVITY_KEYWORDS: &[&str] = &["step", "activity", "exercise", "workout", "run"];
const NUTRITION_KEYWORDS: &[&str] = &["food", "meal", "recipe", "nutrition", "choline", "ferment"];
const DRINKS_KEYWORDS: &[&str] = &["label", "drink label", "scan", "eco score"];

/// Configuration for the keyword router
#[derive(Debug, Clone)]
pub struct RouterConfig {
    /// Agent selected when no keyword set matches
    pub fallback: AgentKind,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            fallback: AgentKind::Hydration,
        }
    }
}

/// Route a message to the agents whose keyword sets match it.
/// Selection order is fixed (hydration, weather, activity, nutrition,
/// drinks) so aggregated replies are stable.
pub fn route_message(message: &str, config: &RouterConfig) -> Vec<AgentKind> {
    let lower = message.to_lowercase();

    let sets: [(AgentKind, &[&str]); 5] = [
        (AgentKind::Hydration, HYDRATION_KEYWORDS),
        (AgentKind::Weather, WEATHER_KEYWORDS),
        (AgentKind::Activity, ACTIVITY_KEYWORDS),
        (AgentKind::Nutrition, NUTRITION_KEYWORDS),
        (AgentKind::Drinks, DRINKS_KEYWORDS),
    ];

    let mut selected: Vec<AgentKind> = sets
        .iter()
        .filter(|(_, keywords)| keywords.iter().any(|k| lower.contains(k)))
        .map(|(agent, _)| *agent)
        .collect();

    if selected.is_empty() {
        debug!("No keyword match, falling back to {}", config.fallback);
        selected.push(config.fallback);
    } else {
        debug!("Routed message to {:?}", selected);
    }

    selected
}

#[cfg(test)]
mod tests {
    use super::*;

    fn route(message: &str) -> Vec<AgentKind> {
        route_message(message, &RouterConfig::default())
    }

    #[test]
    fn test_hydration_keywords() {
        assert_eq!(route("I drank 250ml of water"), vec![AgentKind::Hydration]);
        assert_eq!(route("how is my hydration today?"), vec![AgentKind::Hydration]);
        assert_eq!(route("my urine is dark"), vec![AgentKind::Hydration]);
        assert_eq!(route("fluid intake so far"), vec![AgentKind::Hydration]);
    }

    #[test]
    fn test_weather_keywords() {
        assert_eq!(route("what's the weather like?"), vec![AgentKind::Weather]);
        assert_eq!(route("is the heat dangerous?"), vec![AgentKind::Weather]);
        assert_eq!(route("humidity outside"), vec![AgentKind::Weather]);
        assert_eq!(route("current temperature please"), vec![AgentKind::Weather]);
    }

    #[test]
    fn test_activity_keywords() {
        assert_eq!(route("I finished a workout"), vec![AgentKind::Activity]);
        assert_eq!(route("how many steps today?"), vec![AgentKind::Activity]);
        assert_eq!(route("went for an exercise session"), vec![AgentKind::Activity]);
    }

    #[test]
    fn test_nutrition_keywords() {
        assert_eq!(route("what should I eat for my next meal?"), vec![AgentKind::Nutrition]);
        assert_eq!(route("a recipe with choline"), vec![AgentKind::Nutrition]);
        assert_eq!(route("is fermented food good?"), vec![AgentKind::Nutrition]);
    }

    #[test]
    fn test_drinks_keywords() {
        assert_eq!(route("scan this eco score"), vec![AgentKind::Drinks]);
        assert_eq!(route("can you read this label?"), vec![AgentKind::Drinks]);
    }

    #[test]
    fn test_drink_word_routes_to_hydration_not_drinks() {
        // "drink" belongs to the hydration keyword set; only label/scan terms
        // select the drinks agent.
        assert_eq!(route("what drink do you recommend?"), vec![AgentKind::Hydration]);
    }

    #[test]
    fn test_case_insensitive() {
        assert_eq!(route("WEATHER REPORT"), vec![AgentKind::Weather]);
        assert_eq!(route("Drink Label"), vec![AgentKind::Hydration, AgentKind::Drinks]);
    }

    #[test]
    fn test_multiple_matches_fan_out() {
        let selected = route("should I drink more water in this heat after my workout?");
        assert_eq!(
            selected,
            vec![AgentKind::Hydration, AgentKind::Weather, AgentKind::Activity]
        );
    }

    #[test]
    fn test_selection_order_is_stable() {
        // Order follows the fixed set order, not word order in the message.
        let selected = route("post-run meal and weather check");
        assert_eq!(
            selected,
            vec![AgentKind::Weather, AgentKind::Activity, AgentKind::Nutrition]
        );
    }

    #[test]
    fn test_fallback_when_nothing_matches() {
        assert_eq!(route("hello there"), vec![AgentKind::Hydration]);
        assert_eq!(route(""), vec![AgentKind::Hydration]);
    }

    #[test]
    fn test_fallback_is_configurable() {
        let config = RouterConfig {
            fallback: AgentKind::Nutrition,
        };
        assert_eq!(route_message("hello", &config), vec![AgentKind::Nutrition]);
    }

    #[test]
    fn test_substring_matching() {
        // "running" contains "run"; substring semantics are intentional.
        assert_eq!(route("I love running"), vec![AgentKind::Activity]);
    }

    #[test]
    fn test_never_empty() {
        for message in ["", "xyzzy", "!!!", "bonjour"] {
            assert!(!route(message).is_empty());
        }
    }
}
