//! Prompt construction for each generative call.

use crate::lesson::{
    ContentUnit, GenerationContext, Grouping, GroupingPlan, ObjectiveTarget, PlanArtifact,
    RubricKind, TimeAllocation, ValidationReport,
};
use crate::provider::CompletionOptions;
use std::fmt;
use std::fmt::Write as _;

/// Which artifact a prompt asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PromptKind {
    Plan,
    Content { grouping: Grouping },
    Review { rubric: RubricKind },
    /// Rewrite of one grouping's existing units.
    Refine { grouping: Grouping },
}

impl fmt::Display for PromptKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PromptKind::Plan => f.write_str("plan"),
            PromptKind::Content { grouping } => write!(f, "content[{}]", grouping.number()),
            PromptKind::Review { rubric } => write!(f, "review[{}]", rubric),
            PromptKind::Refine { grouping } => write!(f, "refine[{}]", grouping.number()),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PromptSpec {
    pub kind: PromptKind,
    pub system: String,
    pub user: String,
    /// Overrides the provider's default completion options.
    pub options: Option<CompletionOptions>,
}

const PLAN_SYSTEM: &str = "You are an expert instructional designer. You write lesson plans \
    structured around nine instructional events and measurable learning objectives. \
    Reply with a single JSON object and nothing else.";

const CONTENT_SYSTEM: &str = "You are an expert educational content developer. You write \
    presentation units that combine visual, auditory and textual modalities and follow \
    universal design for learning. Reply with a single JSON object and nothing else.";

const REFINE_SYSTEM: &str = "You are an expert educational content developer revising \
    existing presentation units. Keep what works, apply the requested changes and preserve the \
    time budget. Reply with a single JSON object and nothing else.";

const UNIT_BATCH_FORMAT: &str = "Return JSON of the form:\n\
     {\"units\": [{\"title\": str, \"body\": str (markdown), \
     \"kind\": \"introduction|concept_explanation|activity_guide|assessment|reflection|mixed\", \
     \"modalities\": [\"visual|auditory|textual|interactive|kinesthetic\"], \
     \"duration_minutes\": number, \
     \"visuals\": [{\"kind\": \"image|diagram|chart|video|animation|interactive|code_snippet\", \
     \"description\": str, \"alt_text\": str, \"caption\": str|null}], \
     \"narration\": str|null, \"speaker_notes\": str|null, \"key_points\": [str], \
     \"activities\": [str], \"accessibility_features\": [str]}]}";

const REVIEW_SYSTEM: &str = "You are an instructional quality reviewer. You suggest concrete, \
    actionable improvements to lesson content. Reply with a single JSON object and nothing else.";

fn json_options(max_tokens: u32) -> Option<CompletionOptions> {
    Some(
        CompletionOptions {
            json_mode: true,
            ..Default::default()
        }
        .with_max_tokens(max_tokens),
    )
}

impl PromptSpec {
    pub fn plan(
        context: &GenerationContext,
        allocation: &TimeAllocation,
        objectives: &ObjectiveTarget,
    ) -> Self {
        let mut user = String::new();
        write_context(&mut user, context);

        let _ = writeln!(
            user,
            "\nWrite exactly {} learning objectives distributed as:",
            objectives.count
        );
        for (level, count) in &objectives.distribution {
            let _ = writeln!(
                user,
                "- {} {} (verbs such as {})",
                count,
                level,
                level.verbs().join(", ")
            );
        }

        let _ = writeln!(user, "\nTime allocation per instructional event (fixed):");
        for (grouping, minutes) in allocation.iter() {
            let _ = writeln!(
                user,
                "{}. {} ({} min): {}",
                grouping.number(),
                grouping.name(),
                minutes,
                grouping.description()
            );
        }

        user.push_str(
            "\nReturn JSON of the form:\n\
             {\"overview\": {\"title\": str, \"summary\": str, \"prerequisites\": [str], \
             \"materials\": [str], \"assessment_methods\": [str], \
             \"differentiation_strategies\": [str], \"closure_activities\": [str]},\n \
             \"objectives\": [{\"level\": \"remember|understand|apply|analyze|evaluate|create\", \
             \"statement\": str, \"action_verb\": str, \"content\": str, \"condition\": str|null, \
             \"criteria\": str|null}],\n \
             \"groupings\": [{\"number\": 1-9, \"activities\": [str], \"materials\": [str], \
             \"assessment_strategy\": str|null}]}\n\
             Include all nine events exactly once.",
        );

        Self {
            kind: PromptKind::Plan,
            system: PLAN_SYSTEM.to_string(),
            user,
            options: json_options(3000),
        }
    }

    pub fn content(
        context: &GenerationContext,
        plan: &PlanArtifact,
        entry: &GroupingPlan,
        unit_count: u32,
        strategies: &[String],
        outcomes: &[String],
    ) -> Self {
        let mut user = String::new();
        write_context(&mut user, context);

        let _ = writeln!(user, "\nLesson: {}", plan.overview.title);
        let _ = writeln!(
            user,
            "Instructional event {}: {} ({} minutes)",
            entry.grouping.number(),
            entry.name,
            entry.minutes
        );
        let _ = writeln!(user, "Purpose: {}", entry.description);
        write_list(&mut user, "Planned activities", &entry.activities);
        write_list(&mut user, "Materials", &entry.materials);
        write_list(&mut user, "Teaching strategies", strategies);
        write_list(&mut user, "Learning outcomes", outcomes);

        let _ = writeln!(
            user,
            "\nWrite exactly {} presentation units for this event. Their durations must be \
             positive and no single unit may exceed {} minutes.",
            unit_count, entry.minutes
        );
        user.push_str(UNIT_BATCH_FORMAT);

        Self {
            kind: PromptKind::Content {
                grouping: entry.grouping,
            },
            system: CONTENT_SYSTEM.to_string(),
            user,
            options: json_options(4000),
        }
    }

    /// Asks for a revised version of `units`, all of which belong to `entry`'s grouping.
    pub fn refine(
        context: &GenerationContext,
        entry: &GroupingPlan,
        units: &[ContentUnit],
        instructions: &str,
    ) -> Self {
        let mut user = String::new();
        write_context(&mut user, context);

        let _ = writeln!(
            user,
            "\nInstructional event {}: {} ({} minutes)",
            entry.grouping.number(),
            entry.name,
            entry.minutes
        );
        user.push_str("\nCurrent units:\n");
        for unit in units {
            let _ = writeln!(
                user,
                "## {} ({:.1} min)\n{}",
                unit.title, unit.duration_minutes, unit.body
            );
            if !unit.activities.is_empty() {
                let _ = writeln!(user, "Activities: {}", unit.activities.join("; "));
            }
        }
        let _ = writeln!(user, "\nRevision instructions: {}", instructions);
        let _ = writeln!(
            user,
            "\nReturn the revised units. No single unit may exceed {} minutes.",
            entry.minutes
        );
        user.push_str(UNIT_BATCH_FORMAT);

        Self {
            kind: PromptKind::Refine {
                grouping: entry.grouping,
            },
            system: REFINE_SYSTEM.to_string(),
            user,
            options: json_options(4000),
        }
    }

    pub fn review(rubric: RubricKind, report: &ValidationReport, units: &[ContentUnit]) -> Self {
        let mut user = String::new();
        let _ = writeln!(
            user,
            "A {} review scored {} content units as follows (0.0 to 1.0):",
            rubric,
            units.len()
        );
        for (principle, score) in &report.scores {
            let _ = writeln!(user, "- {}: {:.2}", principle, score);
        }
        let _ = writeln!(user, "- overall: {:.2}", report.overall);

        user.push_str("\nUnits:\n");
        for unit in units {
            let _ = writeln!(
                user,
                "- [{}.{}] {} ({:.1} min, {} visuals, narration: {})",
                unit.grouping.number(),
                unit.sequence,
                unit.title,
                unit.duration_minutes,
                unit.visuals.len(),
                if unit.narration.is_some() { "yes" } else { "no" }
            );
        }

        let _ = writeln!(
            user,
            "\nSuggest improvements for principles scoring below 0.70. Principles: {}.",
            rubric.principles().join(", ")
        );
        user.push_str(
            "Return JSON of the form:\n\
             {\"summary\": str, \"recommendations\": [{\"principle\": str, \
             \"priority\": \"high|medium|low\", \"text\": str}]}",
        );

        Self {
            kind: PromptKind::Review { rubric },
            system: REVIEW_SYSTEM.to_string(),
            user,
            options: json_options(1500),
        }
    }
}

fn write_context(out: &mut String, context: &GenerationContext) {
    let _ = writeln!(out, "Course: {}", context.course_title());
    let _ = writeln!(out, "Topic: {}", context.topic());
    let _ = writeln!(out, "Audience: {}", context.audience());
    let _ = writeln!(out, "Total duration: {} minutes", context.total_minutes());
    let levels: Vec<&str> = context
        .cognitive_levels()
        .iter()
        .map(|level| level.as_str())
        .collect();
    let _ = writeln!(out, "Cognitive levels: {}", levels.join(", "));
    if let Some(requirements) = context.additional_requirements() {
        let _ = writeln!(out, "Additional requirements: {}", requirements);
    }
    if let Some(digest) = context.material_digest() {
        let _ = writeln!(out, "\nCourse material:\n{}", digest);
    }
}

fn write_list(out: &mut String, label: &str, items: &[String]) {
    if items.is_empty() {
        return;
    }
    let _ = writeln!(out, "{}:", label);
    for item in items {
        let _ = writeln!(out, "- {}", item);
    }
}
