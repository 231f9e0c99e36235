//! Recent-activity pattern analysis
//!
//! Classifies a short window of the most recent tool uses. The window is
//! always **oldest-first**: index 0 is the oldest event in the window and the
//! last element is the most recent.
//!
//! Logical progressions are matched as exact adjacent subsequences: the
//! curated pair must appear with its predecessor immediately before its
//! successor in the window. A gapped ordering does not count.

use crate::types::ToolUsageEvent;
use serde::Serialize;
use std::collections::BTreeSet;

/// Windows with at least this share of distinct tools classify as exploratory.
const EXPLORATORY_DIVERSITY_THRESHOLD: f64 = 0.75;

/// Curated known-good tool transitions. Matching any adjacent pair in the
/// window classifies the activity as a logical progression.
const KNOWN_PROGRESSIONS: &[[&str; 2]] = &[
    ["clarify_research_goals", "suggest_methodology"],
    ["suggest_methodology", "design_experimental_framework"],
    ["semantic_search_documents", "extract_key_concepts"],
    ["extract_key_concepts", "generate_document_summary"],
    ["store_bibliography_reference", "generate_bibliography"],
    ["simulate_peer_review", "generate_review_feedback"],
    ["generate_latex_document", "compile_latex"],
];

/// Classified access pattern over a recent window.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "pattern_type", rename_all = "snake_case")]
pub enum UsagePattern {
    /// Most recent tool equals the one before it
    Repetitive {
        repeated_tool: String,
        suggestion: String,
    },
    /// A known transition appears adjacently in the window
    LogicalProgression {
        /// The matched (predecessor, successor) pair
        sequence: [String; 2],
        /// Known follow-up tool after the matched pair, if any
        next_tool: Option<String>,
    },
    /// High tool diversity without a recognizable structure
    Exploratory { diversity: f64 },
    /// Insufficient data or nothing recognizable
    None,
}

impl UsagePattern {
    pub fn pattern_type(&self) -> &'static str {
        match self {
            UsagePattern::Repetitive { .. } => "repetitive",
            UsagePattern::LogicalProgression { .. } => "logical_progression",
            UsagePattern::Exploratory { .. } => "exploratory",
            UsagePattern::None => "none",
        }
    }
}

/// Classify a window of recent tool names, oldest-first.
///
/// Windows of size 0 or 1 yield [`UsagePattern::None`]; this is the normal
/// cold-start state, never an error.
pub fn analyze_recent_tools(recent_tools: &[&str]) -> UsagePattern {
    if recent_tools.len() < 2 {
        return UsagePattern::None;
    }

    // Repetitive wins over everything else: the two most recent uses are the
    // same tool.
    let last = recent_tools[recent_tools.len() - 1];
    let second_last = recent_tools[recent_tools.len() - 2];
    if last == second_last {
        return UsagePattern::Repetitive {
            repeated_tool: last.to_string(),
            suggestion: format!(
                "You have used {} twice in a row; consider a different tool to broaden coverage",
                last
            ),
        };
    }

    // Look for a known transition as an adjacent pair, preferring the most
    // recent occurrence.
    for i in (0..recent_tools.len() - 1).rev() {
        let pair = [recent_tools[i], recent_tools[i + 1]];
        if KNOWN_PROGRESSIONS.iter().any(|known| *known == pair) {
            let next_tool = KNOWN_PROGRESSIONS
                .iter()
                .find(|known| known[0] == pair[1])
                .map(|known| known[1].to_string());
            return UsagePattern::LogicalProgression {
                sequence: [pair[0].to_string(), pair[1].to_string()],
                next_tool,
            };
        }
    }

    let distinct: BTreeSet<&str> = recent_tools.iter().copied().collect();
    let diversity = distinct.len() as f64 / recent_tools.len() as f64;
    if diversity >= EXPLORATORY_DIVERSITY_THRESHOLD {
        return UsagePattern::Exploratory { diversity };
    }

    UsagePattern::None
}

/// Classify a window of recent usage events, oldest-first.
pub fn analyze_recent_events(events: &[ToolUsageEvent]) -> UsagePattern {
    let names: Vec<&str> = events.iter().map(|e| e.tool_name.as_str()).collect();
    analyze_recent_tools(&names)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_and_single_windows_are_none() {
        assert_eq!(analyze_recent_tools(&[]), UsagePattern::None);
        assert_eq!(
            analyze_recent_tools(&["clarify_research_goals"]),
            UsagePattern::None
        );
    }

    #[test]
    fn test_repetitive_pair() {
        let pattern = analyze_recent_tools(&["semantic_search_documents", "semantic_search_documents"]);
        match pattern {
            UsagePattern::Repetitive { repeated_tool, .. } => {
                assert_eq!(repeated_tool, "semantic_search_documents");
            }
            other => panic!("expected repetitive, got {:?}", other),
        }
    }

    #[test]
    fn test_repetitive_wins_over_progression() {
        // Window ends with a repeat even though it contains a known pair.
        let pattern = analyze_recent_tools(&[
            "clarify_research_goals",
            "suggest_methodology",
            "suggest_methodology",
        ]);
        assert_eq!(pattern.pattern_type(), "repetitive");
    }

    #[test]
    fn test_logical_progression_adjacent() {
        let pattern = analyze_recent_tools(&[
            "explain_key_concepts",
            "clarify_research_goals",
            "suggest_methodology",
        ]);
        match pattern {
            UsagePattern::LogicalProgression { sequence, next_tool } => {
                assert_eq!(
                    sequence,
                    [
                        "clarify_research_goals".to_string(),
                        "suggest_methodology".to_string()
                    ]
                );
                assert_eq!(
                    next_tool.as_deref(),
                    Some("design_experimental_framework")
                );
            }
            other => panic!("expected logical progression, got {:?}", other),
        }
    }

    #[test]
    fn test_gapped_progression_does_not_match() {
        // Predecessor and successor present but not adjacent: adjacency
        // semantics say this is not a progression.
        let pattern = analyze_recent_tools(&[
            "clarify_research_goals",
            "explain_key_concepts",
            "suggest_methodology",
        ]);
        assert_ne!(pattern.pattern_type(), "logical_progression");
        assert_eq!(pattern.pattern_type(), "exploratory");
    }

    #[test]
    fn test_exploratory_all_distinct() {
        let pattern = analyze_recent_tools(&[
            "discover_patterns",
            "simulate_peer_review",
            "extract_document_sections",
        ]);
        match pattern {
            UsagePattern::Exploratory { diversity } => assert_eq!(diversity, 1.0),
            other => panic!("expected exploratory, got {:?}", other),
        }
    }

    #[test]
    fn test_low_diversity_without_repeat_is_none() {
        // Repeats spread through the window: not repetitive (last two differ),
        // not a progression, diversity 2/4 = 0.5.
        let pattern = analyze_recent_tools(&[
            "discover_patterns",
            "build_knowledge_graph",
            "discover_patterns",
            "build_knowledge_graph",
        ]);
        assert_eq!(pattern, UsagePattern::None);
    }
}
