//! Milestone detection: threshold crossings over progress and usage history.
//!
//! Every detector is a pure scan over a snapshot. Running a detector twice on
//! unchanged data yields the identical milestone set, so de-duplicating
//! notifications across calls is the caller's job, keyed by [`Milestone::id`].

use chrono::Duration;

use crate::analytics::progress::act_completion;
use crate::config::AnalyticsConfig;
use crate::db::DailyUsage;
use crate::types::{Milestone, ResearchAct};

/// Total-usage counts that rate a notification.
const USAGE_BUCKETS: [i64; 8] = [10, 15, 25, 50, 100, 250, 500, 1000];

fn act_icon(act: ResearchAct) -> &'static str {
    match act {
        ResearchAct::Conceptualization => "🌱",
        ResearchAct::DesignPlanning => "📐",
        ResearchAct::KnowledgeAcquisition => "📚",
        ResearchAct::AnalysisSynthesis => "🔬",
        ResearchAct::ValidationRefinement => "🧪",
        ResearchAct::Communication => "📣",
    }
}

/// One milestone per act whose completion has reached `threshold` percent.
pub fn act_milestones<'a>(
    tools_used: impl IntoIterator<Item = &'a str> + Clone,
    threshold: f64,
) -> Vec<Milestone> {
    ResearchAct::ALL
        .iter()
        .copied()
        .filter_map(|act| {
            let completion = act_completion(tools_used.clone(), act);
            if completion.completion_percentage < threshold {
                return None;
            }
            Some(Milestone {
                id: format!("act:{}", act.as_str()),
                title: format!("{} Milestone", act.display_name()),
                icon: act_icon(act).to_string(),
                significance: format!(
                    "{} foundation established ({:.1}% of its tools exercised)",
                    act.display_name(),
                    completion.completion_percentage
                ),
            })
        })
        .collect()
}

/// The highest usage bucket reached by `total_uses`, if any.
///
/// Only the highest bucket fires; a project at 30 uses reports 25, not 10,
/// 15, and 25 at once.
pub fn usage_milestones(total_uses: i64) -> Vec<Milestone> {
    USAGE_BUCKETS
        .iter()
        .rev()
        .find(|bucket| total_uses >= **bucket)
        .map(|bucket| Milestone {
            id: format!("usage:{}", bucket),
            title: "Tools Used Milestone".to_string(),
            icon: "🏁".to_string(),
            significance: format!("{} research tool uses recorded", bucket),
        })
        .into_iter()
        .collect()
}

/// Momentum milestone: sustained daily activity in the recent window.
///
/// The window is anchored at the newest day with any activity, so detection
/// over an unchanged event log never depends on the wall clock.
pub fn velocity_milestones(per_day: &[DailyUsage], config: &AnalyticsConfig) -> Vec<Milestone> {
    let Some(newest) = per_day.iter().map(|d| d.day).max() else {
        return Vec::new();
    };
    let window_start = newest - Duration::days(config.velocity_window_days - 1);

    let active_days = per_day
        .iter()
        .filter(|d| d.day >= window_start && d.count >= config.velocity_min_daily_uses)
        .count();

    if active_days < config.velocity_min_active_days {
        return Vec::new();
    }

    vec![Milestone {
        id: "velocity:momentum".to_string(),
        title: "Consistent Research Momentum".to_string(),
        icon: "🔥".to_string(),
        significance: format!(
            "Active on {} days in the last {} days with {}+ tool uses each",
            active_days, config.velocity_window_days, config.velocity_min_daily_uses
        ),
    }]
}

/// Run all three detectors over one snapshot of a project's history.
pub fn detect_milestones<'a>(
    tools_used: impl IntoIterator<Item = &'a str> + Clone,
    total_uses: i64,
    per_day: &[DailyUsage],
    config: &AnalyticsConfig,
) -> Vec<Milestone> {
    let mut milestones = act_milestones(tools_used, config.act_completion_threshold);
    milestones.extend(usage_milestones(total_uses));
    milestones.extend(velocity_milestones(per_day, config));
    milestones
}
