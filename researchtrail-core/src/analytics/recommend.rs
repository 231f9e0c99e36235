//! Recommendation engine: ranked next-tool suggestions with gap detection.
//!
//! Recommendations are derived from the same distinct-tool snapshot the
//! progress calculator consumes. The contextual variant layers the pattern
//! analyzer on top, so a repetitive streak suppresses the repeated tool and
//! a recognized progression boosts its natural follow-up.

use std::collections::BTreeSet;

use serde::Serialize;

use crate::analytics::patterns::{analyze_recent_tools, UsagePattern};
use crate::analytics::progress::{act_completion, ActCompletion};
use crate::taxonomy::{self, ToolContext};
use crate::types::ResearchAct;

/// How urgently a recommendation should be surfaced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    High,
    Medium,
    Low,
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::High => "high",
            Priority::Medium => "medium",
            Priority::Low => "low",
        }
    }
}

/// One suggested next tool.
#[derive(Debug, Clone, Serialize)]
pub struct Recommendation {
    pub tool_name: String,
    pub research_act: ResearchAct,
    pub priority: Priority,
    pub rationale: String,
}

/// An earlier research act skipped entirely while a later act has activity.
#[derive(Debug, Clone, Serialize)]
pub struct WorkflowGap {
    pub research_act: ResearchAct,
    pub severity: Priority,
    /// Tools from the skipped act, none of which have been used
    pub missing_tools: Vec<String>,
    /// The later act whose activity exposed the gap
    pub blocked_act: ResearchAct,
}

/// A sideways option: another incomplete act the user could move to.
#[derive(Debug, Clone, Serialize)]
pub struct AlternativePath {
    pub research_act: ResearchAct,
    pub description: String,
    pub tools: Vec<String>,
}

/// Full guidance payload returned by [`contextual_recommendations`].
#[derive(Debug, Clone, Serialize)]
pub struct ContextualGuidance {
    /// Taxonomy classification of the last tool used, when it is known
    pub current_context: Option<ToolContext>,
    pub recent_activity_pattern: UsagePattern,
    /// At most `depth` entries, highest priority first
    pub prioritized_recommendations: Vec<Recommendation>,
    pub rationale: String,
    pub alternative_paths: Vec<AlternativePath>,
}

/// Flag every act with zero activity that precedes an act with activity.
///
/// Returns gaps in taxonomy order. An empty usage history has no gaps: a
/// brand-new project has not skipped anything yet.
pub fn detect_workflow_gaps<'a>(
    tools_used: impl IntoIterator<Item = &'a str>,
) -> Vec<WorkflowGap> {
    let used: BTreeSet<&str> = tools_used.into_iter().collect();
    let completions: Vec<ActCompletion> = ResearchAct::ALL
        .iter()
        .map(|act| act_completion(used.iter().copied(), *act))
        .collect();

    // Latest act with any activity; everything untouched before it is a gap.
    let Some(frontier) = completions
        .iter()
        .rposition(|c| c.completion_percentage > 0.0)
    else {
        return Vec::new();
    };

    completions[..frontier]
        .iter()
        .filter(|c| c.completion_percentage == 0.0)
        .map(|c| WorkflowGap {
            research_act: c.research_act,
            severity: Priority::High,
            missing_tools: taxonomy::tools_for_act(c.research_act)
                .into_iter()
                .map(str::to_string)
                .collect(),
            blocked_act: ResearchAct::ALL[frontier],
        })
        .collect()
}

/// Ranked list of tools to use next.
///
/// Cold start (no usage at all) recommends the first category of the first
/// act. Otherwise skipped foundational acts come first, then unfinished
/// categories of the active act, then the act's untouched categories.
pub fn recommend_next_tools<'a>(
    tools_used: impl IntoIterator<Item = &'a str>,
    current_act: Option<ResearchAct>,
) -> Vec<Recommendation> {
    let used: BTreeSet<&str> = tools_used.into_iter().collect();

    if used.is_empty() {
        let first_act = ResearchAct::ALL[0];
        let Some(first_category) = taxonomy::categories_for_act(first_act).into_iter().next()
        else {
            return Vec::new();
        };
        return first_category
            .tools
            .iter()
            .map(|tool| Recommendation {
                tool_name: tool.to_string(),
                research_act: first_act,
                priority: Priority::High,
                rationale: format!(
                    "Start with {} to ground the project",
                    first_category.name
                ),
            })
            .collect();
    }

    let mut recommendations = Vec::new();
    let mut seen: BTreeSet<String> = BTreeSet::new();

    // Skipped foundational acts outrank everything else.
    let gaps = detect_workflow_gaps(used.iter().copied());
    for gap in &gaps {
        for tool in &gap.missing_tools {
            if seen.insert(tool.clone()) {
                recommendations.push(Recommendation {
                    tool_name: tool.clone(),
                    research_act: gap.research_act,
                    priority: Priority::High,
                    rationale: format!(
                        "{} was skipped before moving to {}",
                        gap.research_act.display_name(),
                        gap.blocked_act.display_name()
                    ),
                });
            }
        }
    }

    // Continue the current act, or the first act still incomplete.
    let target = current_act
        .filter(|act| {
            act_completion(used.iter().copied(), *act).completion_percentage < 100.0
        })
        .or_else(|| {
            ResearchAct::ALL.iter().copied().find(|act| {
                act_completion(used.iter().copied(), *act).completion_percentage < 100.0
            })
        });
    let Some(target) = target else {
        return recommendations;
    };

    // Finish what's started before opening new categories.
    let target_completion = act_completion(used.iter().copied(), target);
    let (partial, untouched): (Vec<_>, Vec<_>) = target_completion
        .categories
        .iter()
        .filter(|c| c.completion_percentage < 100.0)
        .partition(|c| c.completion_percentage > 0.0);

    let continue_priority = if gaps.is_empty() {
        Priority::High
    } else {
        Priority::Medium
    };
    for category in partial {
        let Some(def) = taxonomy::category(target, &category.research_category) else {
            continue;
        };
        for tool in def.tools.iter().filter(|t| !used.contains(*t)) {
            if seen.insert(tool.to_string()) {
                recommendations.push(Recommendation {
                    tool_name: tool.to_string(),
                    research_act: target,
                    priority: continue_priority,
                    rationale: format!(
                        "Finish {} ({:.1}% complete)",
                        category.category_name, category.completion_percentage
                    ),
                });
            }
        }
    }

    let open_priority = if gaps.is_empty() {
        Priority::Medium
    } else {
        Priority::Low
    };
    for category in untouched {
        let Some(def) = taxonomy::category(target, &category.research_category) else {
            continue;
        };
        for tool in def.tools.iter().filter(|t| !used.contains(*t)) {
            if seen.insert(tool.to_string()) {
                recommendations.push(Recommendation {
                    tool_name: tool.to_string(),
                    research_act: target,
                    priority: open_priority,
                    rationale: format!(
                        "Begin {} within {}",
                        category.category_name,
                        target.display_name()
                    ),
                });
            }
        }
    }

    recommendations
}

/// Recommendations adjusted for the recent activity pattern.
///
/// `recent_tools` is the short oldest-first window fed to the pattern
/// analyzer; `last_tool_used` anchors the current act. A last tool the
/// taxonomy does not know degrades to no-context rather than an error.
pub fn contextual_recommendations<'a>(
    tools_used: impl IntoIterator<Item = &'a str>,
    recent_tools: &[&str],
    last_tool_used: Option<&str>,
    depth: usize,
) -> ContextualGuidance {
    let used: BTreeSet<&str> = tools_used.into_iter().collect();
    let current_context = last_tool_used.and_then(taxonomy::tool_context);
    let pattern = analyze_recent_tools(recent_tools);

    let current_act = current_context.as_ref().map(|c| c.act);
    let mut recommendations = recommend_next_tools(used.iter().copied(), current_act);

    let mut notes = Vec::new();
    match &pattern {
        UsagePattern::Repetitive { repeated_tool, .. } => {
            recommendations.retain(|r| r.tool_name != *repeated_tool);
            notes.push(format!(
                "Recent activity repeats {}; varying tools will cover more ground",
                repeated_tool
            ));
        }
        UsagePattern::LogicalProgression {
            sequence,
            next_tool: Some(next_tool),
        } => {
            if !used.contains(next_tool.as_str()) {
                recommendations.retain(|r| r.tool_name != *next_tool);
                let research_act = taxonomy::tool_context(next_tool)
                    .map(|c| c.act)
                    .unwrap_or(ResearchAct::ALL[0]);
                recommendations.insert(
                    0,
                    Recommendation {
                        tool_name: next_tool.clone(),
                        research_act,
                        priority: Priority::High,
                        rationale: format!(
                            "Natural next step after {} and {}",
                            sequence[0], sequence[1]
                        ),
                    },
                );
            }
            notes.push("Recent tools follow a recognized research progression".to_string());
        }
        UsagePattern::LogicalProgression { next_tool: None, .. } => {
            notes.push("Recent tools follow a recognized research progression".to_string());
        }
        UsagePattern::Exploratory { .. } => {
            notes.push(
                "Recent activity is exploratory; focusing on one category will build depth"
                    .to_string(),
            );
        }
        UsagePattern::None => {}
    }

    recommendations.truncate(depth);

    let rationale = match (&current_context, notes.is_empty()) {
        (Some(ctx), true) => format!("Continuing {} work in {}", ctx.category_name, ctx.act_name),
        (Some(ctx), false) => format!(
            "Continuing {} work in {}. {}",
            ctx.category_name,
            ctx.act_name,
            notes.join(". ")
        ),
        (None, true) => "No recent context; recommendations follow the research lifecycle"
            .to_string(),
        (None, false) => notes.join(". "),
    };

    let alternative_paths = alternative_paths(&used, current_act, &recommendations);

    ContextualGuidance {
        current_context,
        recent_activity_pattern: pattern,
        prioritized_recommendations: recommendations,
        rationale,
        alternative_paths,
    }
}

/// Other incomplete acts the user could branch into, excluding the one the
/// recommendations already focus on.
fn alternative_paths(
    used: &BTreeSet<&str>,
    current_act: Option<ResearchAct>,
    recommendations: &[Recommendation],
) -> Vec<AlternativePath> {
    let focus: BTreeSet<ResearchAct> = recommendations
        .iter()
        .map(|r| r.research_act)
        .chain(current_act)
        .collect();

    ResearchAct::ALL
        .iter()
        .copied()
        .filter(|act| !focus.contains(act))
        .filter_map(|act| {
            let completion = act_completion(used.iter().copied(), act);
            if completion.completion_percentage >= 100.0 {
                return None;
            }
            let tools: Vec<String> = taxonomy::tools_for_act(act)
                .into_iter()
                .filter(|t| !used.contains(t))
                .take(3)
                .map(str::to_string)
                .collect();
            if tools.is_empty() {
                return None;
            }
            Some(AlternativePath {
                research_act: act,
                description: format!(
                    "{} is {:.1}% complete",
                    act.display_name(),
                    completion.completion_percentage
                ),
                tools,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cold_start_recommends_first_act() {
        let recs = recommend_next_tools(std::iter::empty(), None);
        assert!(!recs.is_empty());
        for rec in &recs {
            assert_eq!(rec.research_act, ResearchAct::Conceptualization);
            assert_eq!(rec.priority, Priority::High);
        }
        assert!(recs.iter().any(|r| r.tool_name == "clarify_research_goals"));
    }

    #[test]
    fn test_late_act_usage_flags_earlier_gaps() {
        let gaps = detect_workflow_gaps(["generate_latex_document"]);
        assert!(!gaps.is_empty());
        assert!(gaps.iter().all(|g| g.severity == Priority::High));
        assert!(gaps
            .iter()
            .any(|g| g.research_act == ResearchAct::Conceptualization));
        for gap in &gaps {
            assert!(gap.research_act < ResearchAct::Communication);
            assert_eq!(gap.blocked_act, ResearchAct::Communication);
            assert!(!gap.missing_tools.is_empty());
        }
    }

    #[test]
    fn test_no_gaps_without_any_usage() {
        assert!(detect_workflow_gaps(std::iter::empty()).is_empty());
    }

    #[test]
    fn test_no_gaps_when_work_is_sequential() {
        let gaps = detect_workflow_gaps(["clarify_research_goals", "suggest_methodology"]);
        assert!(gaps.is_empty());
    }

    #[test]
    fn test_gap_tools_outrank_current_act_tools() {
        let recs = recommend_next_tools(["generate_latex_document"], Some(ResearchAct::Communication));
        let first_conceptualization = recs
            .iter()
            .position(|r| r.research_act == ResearchAct::Conceptualization)
            .expect("gap recommendations present");
        let first_communication = recs
            .iter()
            .position(|r| r.research_act == ResearchAct::Communication);
        if let Some(comm) = first_communication {
            assert!(first_conceptualization < comm);
        }
        assert_eq!(recs[first_conceptualization].priority, Priority::High);
    }

    #[test]
    fn test_partial_categories_come_before_untouched_ones() {
        // goal_setting is partially done; problem_identification untouched.
        let recs = recommend_next_tools(["clarify_research_goals"], Some(ResearchAct::Conceptualization));
        let finish = recs
            .iter()
            .position(|r| r.tool_name == "assess_foundational_assumptions")
            .expect("remaining goal_setting tool recommended");
        let open = recs
            .iter()
            .position(|r| r.tool_name == "initiate_paradigm_challenge")
            .expect("problem_identification tool recommended");
        assert!(finish < open);
        assert_eq!(recs[finish].priority, Priority::High);
        assert_eq!(recs[open].priority, Priority::Medium);
    }

    #[test]
    fn test_used_tools_are_never_recommended() {
        let used = ["clarify_research_goals", "assess_foundational_assumptions"];
        let recs = recommend_next_tools(used, None);
        for rec in &recs {
            assert!(!used.contains(&rec.tool_name.as_str()));
        }
    }

    #[test]
    fn test_repetitive_pattern_suppresses_repeated_tool() {
        let guidance = contextual_recommendations(
            ["clarify_research_goals"],
            &["clarify_research_goals", "clarify_research_goals"],
            Some("clarify_research_goals"),
            5,
        );
        assert_eq!(guidance.recent_activity_pattern.pattern_type(), "repetitive");
        assert!(guidance
            .prioritized_recommendations
            .iter()
            .all(|r| r.tool_name != "clarify_research_goals"));
        assert!(guidance.rationale.contains("clarify_research_goals"));
    }

    #[test]
    fn test_progression_boosts_next_tool() {
        let recent = ["clarify_research_goals", "suggest_methodology"];
        let guidance = contextual_recommendations(
            recent,
            &recent,
            Some("suggest_methodology"),
            5,
        );
        assert_eq!(
            guidance.recent_activity_pattern.pattern_type(),
            "logical_progression"
        );
        let first = &guidance.prioritized_recommendations[0];
        assert_eq!(first.tool_name, "design_experimental_framework");
        assert_eq!(first.priority, Priority::High);
    }

    #[test]
    fn test_unknown_last_tool_degrades_to_no_context() {
        let guidance = contextual_recommendations(
            ["clarify_research_goals"],
            &["clarify_research_goals"],
            Some("totally_unknown_tool"),
            3,
        );
        assert!(guidance.current_context.is_none());
        assert!(!guidance.prioritized_recommendations.is_empty());
        assert!(guidance.prioritized_recommendations.len() <= 3);
    }

    #[test]
    fn test_depth_caps_recommendation_count() {
        let guidance = contextual_recommendations(std::iter::empty(), &[], None, 2);
        assert!(guidance.prioritized_recommendations.len() <= 2);
    }

    #[test]
    fn test_alternative_paths_exclude_focus_act() {
        let guidance = contextual_recommendations(
            ["clarify_research_goals"],
            &["clarify_research_goals"],
            Some("clarify_research_goals"),
            3,
        );
        let focus: Vec<ResearchAct> = guidance
            .prioritized_recommendations
            .iter()
            .map(|r| r.research_act)
            .collect();
        for path in &guidance.alternative_paths {
            assert!(!focus.contains(&path.research_act));
        }
    }
}
