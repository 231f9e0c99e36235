//! Progress calculation
//!
//! Completion percentage is the share of a category's tool set covered by
//! distinct tools used. Act completion uses the union of the act's tools, not
//! an average of category percentages, so small categories cannot inflate the
//! score. All functions here are pure over a snapshot of usage history.

use crate::taxonomy::{self, CategoryDef};
use crate::types::{CompletionStatus, ResearchAct};
use serde::Serialize;
use std::collections::BTreeSet;

/// Completion state of one category.
#[derive(Debug, Clone, Serialize)]
pub struct CategoryCompletion {
    pub research_act: ResearchAct,
    pub research_category: String,
    pub category_name: String,
    /// Percentage in [0, 100], rounded to one decimal
    pub completion_percentage: f64,
    /// Distinct category tools already used, in taxonomy order
    pub tools_used: Vec<String>,
    pub total_tools: usize,
    pub status: CompletionStatus,
}

/// Completion state of one act, with its category breakdown.
#[derive(Debug, Clone, Serialize)]
pub struct ActCompletion {
    pub research_act: ResearchAct,
    pub act_name: String,
    /// Distinct act tools used over distinct act tools defined
    pub completion_percentage: f64,
    pub tools_used: Vec<String>,
    pub total_tools: usize,
    pub status: CompletionStatus,
    pub categories: Vec<CategoryCompletion>,
}

/// Full progress snapshot for a project.
#[derive(Debug, Clone, Serialize)]
pub struct ProgressReport {
    /// One entry per act, in canonical lifecycle order
    pub acts: Vec<ActCompletion>,
    /// Distinct classified tools used over all tools in the taxonomy
    pub overall_percentage: f64,
    /// Total usage-event count (duplicates included)
    pub total_tool_uses: i64,
}

impl ProgressReport {
    /// Completion of a single act from this report.
    pub fn act(&self, act: ResearchAct) -> &ActCompletion {
        // `acts` always holds every act in canonical order.
        &self.acts[act.index()]
    }
}

/// Round to one decimal place; 2 of 3 tools yields 66.7.
pub(crate) fn round_pct(pct: f64) -> f64 {
    (pct * 10.0).round() / 10.0
}

fn completion_for(tools_used: &BTreeSet<&str>, defined: &[&'static str]) -> (Vec<String>, f64) {
    if defined.is_empty() {
        // Zero-tool sets report 0%, never a division by zero.
        return (Vec::new(), 0.0);
    }

    let used: Vec<String> = defined
        .iter()
        .filter(|tool| tools_used.contains(**tool))
        .map(|tool| tool.to_string())
        .collect();

    let pct = round_pct(100.0 * used.len() as f64 / defined.len() as f64);
    (used, pct)
}

/// Completion of one category given the tools used so far.
///
/// Duplicate uses count once; tools outside the category are ignored.
pub fn category_completion<'a>(
    tools_used: impl IntoIterator<Item = &'a str>,
    category: &CategoryDef,
) -> CategoryCompletion {
    let used: BTreeSet<&str> = tools_used.into_iter().collect();
    let (tools, pct) = completion_for(&used, category.tools);

    CategoryCompletion {
        research_act: category.act,
        research_category: category.key.to_string(),
        category_name: category.name.to_string(),
        completion_percentage: pct,
        tools_used: tools,
        total_tools: category.tools.len(),
        status: CompletionStatus::from_percentage(pct),
    }
}

/// Completion of one act: distinct tools used in the act over the act's
/// full tool set, plus the per-category breakdown.
pub fn act_completion<'a>(
    tools_used: impl IntoIterator<Item = &'a str>,
    act: ResearchAct,
) -> ActCompletion {
    let used: BTreeSet<&str> = tools_used.into_iter().collect();
    let defined = taxonomy::tools_for_act(act);
    let (tools, pct) = completion_for(&used, &defined);

    let categories = taxonomy::categories_for_act(act)
        .into_iter()
        .map(|category| category_completion(used.iter().copied(), category))
        .collect();

    ActCompletion {
        research_act: act,
        act_name: act.display_name().to_string(),
        completion_percentage: pct,
        tools_used: tools,
        total_tools: defined.len(),
        status: CompletionStatus::from_percentage(pct),
        categories,
    }
}

/// Full progress report across every act.
pub fn progress_report<'a>(
    tools_used: impl IntoIterator<Item = &'a str>,
    total_tool_uses: i64,
) -> ProgressReport {
    let used: BTreeSet<&str> = tools_used.into_iter().collect();

    let acts: Vec<ActCompletion> = ResearchAct::ALL
        .iter()
        .map(|act| act_completion(used.iter().copied(), *act))
        .collect();

    let all_tools = taxonomy::all_tools();
    let (_, overall) = completion_for(&used, &all_tools);

    ProgressReport {
        acts,
        overall_percentage: overall,
        total_tool_uses,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn goal_setting() -> &'static CategoryDef {
        taxonomy::category(ResearchAct::Conceptualization, "goal_setting").unwrap()
    }

    #[test]
    fn test_category_completion_two_of_three() {
        let used = vec!["clarify_research_goals", "generate_critical_questions"];
        let completion = category_completion(used, goal_setting());

        assert_eq!(completion.completion_percentage, 66.7);
        assert_eq!(completion.status, CompletionStatus::InProgress);
        assert_eq!(completion.total_tools, 3);
        assert_eq!(
            completion.tools_used,
            vec!["clarify_research_goals", "generate_critical_questions"]
        );
    }

    #[test]
    fn test_category_completion_bounds() {
        let empty = category_completion(std::iter::empty(), goal_setting());
        assert_eq!(empty.completion_percentage, 0.0);
        assert_eq!(empty.status, CompletionStatus::NotStarted);

        // 100 iff the deduped usage is a superset of the category's tools
        let full = category_completion(
            vec![
                "clarify_research_goals",
                "assess_foundational_assumptions",
                "generate_critical_questions",
                "unrelated_tool",
            ],
            goal_setting(),
        );
        assert_eq!(full.completion_percentage, 100.0);
        assert_eq!(full.status, CompletionStatus::Completed);
    }

    #[test]
    fn test_duplicates_count_once() {
        let completion = category_completion(
            vec!["clarify_research_goals"; 10],
            goal_setting(),
        );
        assert_eq!(completion.completion_percentage, 33.3);
        assert_eq!(completion.tools_used.len(), 1);
    }

    #[test]
    fn test_act_completion_uses_tool_union() {
        // Conceptualization defines 5 tools across 2 categories; 1 used = 20%,
        // not an average of (33.3%, 0%).
        let act = act_completion(vec!["clarify_research_goals"], ResearchAct::Conceptualization);
        assert_eq!(act.total_tools, 5);
        assert_eq!(act.completion_percentage, 20.0);
        assert_eq!(act.categories.len(), 2);
    }

    #[test]
    fn test_act_completion_monotone() {
        let mut used: Vec<&str> = Vec::new();
        let mut previous = 0.0;
        for tool in taxonomy::tools_for_act(ResearchAct::KnowledgeAcquisition) {
            used.push(tool);
            let pct =
                act_completion(used.iter().copied(), ResearchAct::KnowledgeAcquisition)
                    .completion_percentage;
            assert!(pct >= previous, "adding a tool must not decrease completion");
            previous = pct;
        }
        assert_eq!(previous, 100.0);
    }

    #[test]
    fn test_report_covers_all_acts() {
        let report = progress_report(vec!["clarify_research_goals"], 4);
        assert_eq!(report.acts.len(), ResearchAct::ALL.len());
        assert_eq!(report.total_tool_uses, 4);
        assert!(report.overall_percentage > 0.0);
        assert_eq!(
            report.act(ResearchAct::Communication).completion_percentage,
            0.0
        );
    }
}
