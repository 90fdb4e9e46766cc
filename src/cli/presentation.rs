//! CLI presentation: json, text and toml formatters for command results.

use crate::config::LessonforgeConfig;
use crate::error::CliError;
use crate::lesson::RubricKind;
use crate::pipeline::{AggregateOutput, StageStatus};
use comfy_table::presets::UTF8_BORDERS_ONLY;
use comfy_table::Table;
use owo_colors::OwoColorize;

const REDACTED: &str = "********";

pub fn format_section_heading(title: &str) -> String {
    format!("{}", title.bold().underline())
}

fn status_label(status: StageStatus) -> String {
    match status {
        StageStatus::Success => format!("{}", "success".green()),
        StageStatus::Fallback => format!("{}", "fallback".yellow()),
        StageStatus::Failed => format!("{}", "failed".red()),
    }
}

pub fn format_output_json(output: &AggregateOutput) -> Result<String, CliError> {
    serde_json::to_string_pretty(output).map_err(|e| CliError::Serialization(e.to_string()))
}

/// Human-readable run summary: stages, groupings and scorecards.
pub fn format_output_text(output: &AggregateOutput) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "{}\n\n",
        format_section_heading(&output.plan.overview.title)
    ));
    out.push_str(&format!("  Run: {}\n", output.run_id));
    out.push_str(&format!("  Generated: {}\n", output.generated_at));
    out.push_str(&format!("  Units: {}\n", output.units.len()));
    let degraded = if output.degraded {
        format!("{}", "yes".yellow())
    } else {
        "no".to_string()
    };
    out.push_str(&format!("  Degraded: {}\n\n", degraded));

    out.push_str(&format!("{}\n\n", format_section_heading("Stages")));
    let mut table = Table::new();
    table.load_preset(UTF8_BORDERS_ONLY);
    table.set_header(vec!["Stage", "Status", "Duration (ms)"]);
    for summary in &output.stage_summaries {
        table.add_row(vec![
            summary.stage.to_string(),
            status_label(summary.status),
            summary.duration_ms.to_string(),
        ]);
    }
    out.push_str(&format!("{}\n\n", table));

    out.push_str(&format!("{}\n\n", format_section_heading("Groupings")));
    let mut table = Table::new();
    table.load_preset(UTF8_BORDERS_ONLY);
    table.set_header(vec!["#", "Grouping", "Minutes", "Units", "Status"]);
    for summary in &output.grouping_summaries {
        table.add_row(vec![
            summary.grouping.number().to_string(),
            summary.name.clone(),
            summary.minutes.to_string(),
            summary.unit_count.to_string(),
            status_label(summary.status),
        ]);
    }
    out.push_str(&format!("{}\n\n", table));

    out.push_str(&format!("{}\n\n", format_section_heading("Scorecards")));
    let mut table = Table::new();
    table.load_preset(UTF8_BORDERS_ONLY);
    table.set_header(vec!["Rubric", "Principle", "Score"]);
    for rubric in RubricKind::MERGE_ORDER {
        let report = output.reports.get(rubric);
        for (principle, score) in &report.scores {
            table.add_row(vec![
                rubric.to_string(),
                principle.clone(),
                format!("{:.2}", score),
            ]);
        }
        table.add_row(vec![
            rubric.to_string(),
            "overall".to_string(),
            format!("{:.2} ({:?})", report.overall, report.level),
        ]);
    }
    out.push_str(&format!("{}\n", table));

    if !output.diagnostics.is_empty() {
        out.push_str(&format!(
            "\n{}\n\n",
            format_section_heading("Diagnostics")
        ));
        for diagnostic in &output.diagnostics {
            out.push_str(&format!("  - {}\n", diagnostic));
        }
    }
    out
}

/// Effective configuration as TOML, with the API key redacted.
pub fn format_config_toml(config: &LessonforgeConfig) -> Result<String, CliError> {
    let mut shown = config.clone();
    if shown.provider.api_key.is_some() {
        shown.provider.api_key = Some(REDACTED.to_string());
    }
    toml::to_string_pretty(&shown).map_err(|e| CliError::Serialization(e.to_string()))
}
