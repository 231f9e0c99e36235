//! Static research taxonomy
//!
//! Maps every known tool name to exactly one (act, category) pair. The
//! taxonomy is the classification ground truth for progress math: a tool the
//! taxonomy does not know is "uncategorized" and excluded from completion
//! percentages.
//!
//! The mapping is total and consistent by construction (one flat table, each
//! tool listed once); `test_taxonomy_total_and_non_overlapping` asserts it
//! stays that way.

use crate::types::ResearchAct;
use std::collections::HashMap;
use std::sync::OnceLock;

/// One category definition: a named subdivision of exactly one act, owning an
/// ordered set of tool names.
#[derive(Debug, Clone, Copy)]
pub struct CategoryDef {
    /// Act this category belongs to
    pub act: ResearchAct,
    /// Stable key used in storage ("goal_setting")
    pub key: &'static str,
    /// Human-friendly name ("Goal Setting")
    pub name: &'static str,
    /// Tools owned by this category, in recommendation order
    pub tools: &'static [&'static str],
}

/// Classification result for a single tool.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct ToolContext {
    pub act: ResearchAct,
    pub category: &'static str,
    pub act_name: &'static str,
    pub category_name: &'static str,
}

const CATEGORIES: &[CategoryDef] = &[
    CategoryDef {
        act: ResearchAct::Conceptualization,
        key: "goal_setting",
        name: "Goal Setting",
        tools: &[
            "clarify_research_goals",
            "assess_foundational_assumptions",
            "generate_critical_questions",
        ],
    },
    CategoryDef {
        act: ResearchAct::Conceptualization,
        key: "problem_identification",
        name: "Problem Identification",
        tools: &["initiate_paradigm_challenge", "explain_key_concepts"],
    },
    CategoryDef {
        act: ResearchAct::DesignPlanning,
        key: "methodology",
        name: "Methodology",
        tools: &[
            "suggest_methodology",
            "compare_approaches",
            "validate_design",
        ],
    },
    CategoryDef {
        act: ResearchAct::DesignPlanning,
        key: "experimental_design",
        name: "Experimental Design",
        tools: &["design_experimental_framework", "plan_data_collection"],
    },
    CategoryDef {
        act: ResearchAct::KnowledgeAcquisition,
        key: "literature_search",
        name: "Literature Search",
        tools: &[
            "semantic_search_documents",
            "search_knowledge_base",
            "retrieve_bibliography_references",
        ],
    },
    CategoryDef {
        act: ResearchAct::KnowledgeAcquisition,
        key: "concept_extraction",
        name: "Concept Extraction",
        tools: &["extract_key_concepts", "extract_document_sections"],
    },
    CategoryDef {
        act: ResearchAct::KnowledgeAcquisition,
        key: "source_management",
        name: "Source Management",
        tools: &["store_bibliography_reference", "generate_bibliography"],
    },
    CategoryDef {
        act: ResearchAct::AnalysisSynthesis,
        key: "pattern_discovery",
        name: "Pattern Discovery",
        tools: &["discover_patterns", "build_knowledge_graph"],
    },
    CategoryDef {
        act: ResearchAct::AnalysisSynthesis,
        key: "synthesis",
        name: "Synthesis",
        tools: &["generate_document_summary", "synthesize_findings"],
    },
    CategoryDef {
        act: ResearchAct::ValidationRefinement,
        key: "peer_review",
        name: "Peer Review",
        tools: &["simulate_peer_review", "generate_review_feedback"],
    },
    CategoryDef {
        act: ResearchAct::ValidationRefinement,
        key: "paradigm_validation",
        name: "Paradigm Validation",
        tools: &["validate_novel_theory", "evaluate_paradigm_shift"],
    },
    CategoryDef {
        act: ResearchAct::Communication,
        key: "document_generation",
        name: "Document Generation",
        tools: &[
            "generate_latex_document",
            "compile_latex",
            "format_research_content",
        ],
    },
    CategoryDef {
        act: ResearchAct::Communication,
        key: "presentation",
        name: "Presentation",
        tools: &["generate_latex_slides", "list_latex_templates"],
    },
];

fn tool_index() -> &'static HashMap<&'static str, &'static CategoryDef> {
    static INDEX: OnceLock<HashMap<&'static str, &'static CategoryDef>> = OnceLock::new();
    INDEX.get_or_init(|| {
        let mut map = HashMap::new();
        for category in CATEGORIES {
            for tool in category.tools {
                map.insert(*tool, category);
            }
        }
        map
    })
}

/// Classify a tool name. Unknown tools return `None`, which callers treat as
/// "uncategorized" rather than an error.
pub fn tool_context(tool_name: &str) -> Option<ToolContext> {
    tool_index().get(tool_name).map(|category| ToolContext {
        act: category.act,
        category: category.key,
        act_name: category.act.display_name(),
        category_name: category.name,
    })
}

/// All category definitions, in act order.
pub fn categories() -> &'static [CategoryDef] {
    CATEGORIES
}

/// Categories belonging to one act, in definition order.
pub fn categories_for_act(act: ResearchAct) -> Vec<&'static CategoryDef> {
    CATEGORIES.iter().filter(|c| c.act == act).collect()
}

/// Look up a single category by act and key.
pub fn category(act: ResearchAct, key: &str) -> Option<&'static CategoryDef> {
    CATEGORIES.iter().find(|c| c.act == act && c.key == key)
}

/// Ordered list of all tools defined for an act.
pub fn tools_for_act(act: ResearchAct) -> Vec<&'static str> {
    categories_for_act(act)
        .into_iter()
        .flat_map(|c| c.tools.iter().copied())
        .collect()
}

/// Every tool name the taxonomy knows.
pub fn all_tools() -> Vec<&'static str> {
    CATEGORIES
        .iter()
        .flat_map(|c| c.tools.iter().copied())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_taxonomy_total_and_non_overlapping() {
        // Every tool maps to exactly one (act, category) pair and no tool
        // appears in two categories.
        let mut seen = HashSet::new();
        for category in categories() {
            assert!(!category.tools.is_empty(), "empty category {}", category.key);
            for tool in category.tools {
                assert!(seen.insert(*tool), "tool {} appears twice", tool);
                let ctx = tool_context(tool).expect("registered tool must classify");
                assert_eq!(ctx.act, category.act);
                assert_eq!(ctx.category, category.key);
            }
        }
        assert_eq!(seen.len(), all_tools().len());
    }

    #[test]
    fn test_every_act_has_categories() {
        for act in ResearchAct::ALL {
            assert!(
                !categories_for_act(act).is_empty(),
                "act {} has no categories",
                act
            );
            assert!(!tools_for_act(act).is_empty());
        }
    }

    #[test]
    fn test_unknown_tool_is_none() {
        assert!(tool_context("definitely_not_a_tool").is_none());
        assert!(tool_context("").is_none());
    }

    #[test]
    fn test_lookup_context() {
        let ctx = tool_context("clarify_research_goals").unwrap();
        assert_eq!(ctx.act, ResearchAct::Conceptualization);
        assert_eq!(ctx.category, "goal_setting");
        assert_eq!(ctx.category_name, "Goal Setting");

        let ctx = tool_context("generate_latex_document").unwrap();
        assert_eq!(ctx.act, ResearchAct::Communication);
        assert_eq!(ctx.category, "document_generation");
    }

    #[test]
    fn test_act_tools_are_ordered_by_category() {
        let tools = tools_for_act(ResearchAct::Conceptualization);
        assert_eq!(
            tools,
            vec![
                "clarify_research_goals",
                "assess_foundational_assumptions",
                "generate_critical_questions",
                "initiate_paradigm_challenge",
                "explain_key_concepts",
            ]
        );
    }
}
