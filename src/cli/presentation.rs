//! Presentation: stage status lines, audit and provider tables.

use crate::config::BrandlineConfig;
use crate::documents::{AuditReport, StageDocument};
use crate::error::StageError;
use crate::pipeline::StageOutput;
use crate::session::CampaignSession;
use crate::types::StageId;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use owo_colors::OwoColorize;

const RATIONALE_WIDTH: u16 = 60;

pub fn format_stage_line(output: &StageOutput) -> String {
    let mut line = format!(
        "{} {} -> {}",
        "ok".green().bold(),
        output.stage.as_str().bold(),
        output.state.as_str()
    );
    if !output.schema_gaps.is_empty() {
        line.push_str(&format!(
            "\n   {} missing fields: {}",
            "warning:".yellow(),
            output.schema_gaps.join(", ")
        ));
    }
    line
}

pub fn format_stage_failure(stage: StageId, err: &StageError) -> String {
    format!(
        "{} {} [{}] {}",
        "failed".red().bold(),
        stage.as_str().bold(),
        err.kind(),
        err.user_message()
    )
}

pub fn format_audit_table(report: &AuditReport) -> String {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_width(RATIONALE_WIDTH * 2);
    table.set_header(vec!["Asset", "Channel", "Score", "Rationale", "Fix"]);
    for item in report.items() {
        table.add_row(vec![
            item.asset_id.clone(),
            item.channel
                .map(|c| c.as_str().to_string())
                .unwrap_or_else(|| "-".to_string()),
            item.score
                .map(|s| s.to_string())
                .unwrap_or_else(|| "-".to_string()),
            item.rationale.clone(),
            item.fix.clone(),
        ]);
    }

    let average = report
        .average_score()
        .map(|s| format!("{:.1}/5", s))
        .unwrap_or_else(|| "n/a".to_string());
    let mut out = format!("Average score: {}\n", average.bold());
    match report.require("overall") {
        Ok(_) => {
            let themes = report.drift_themes();
            if !themes.is_empty() {
                out.push_str(&format!("Drift themes: {}\n", themes.join("; ")));
            }
        }
        Err(err) => out.push_str(&format!(
            "{} {}; average taken from item scores\n",
            "warning:".yellow(),
            err
        )),
    }
    out.push_str(&table.to_string());
    out
}

pub fn format_session_summary(session: &CampaignSession) -> String {
    let mut lines = vec![format!(
        "Session {} ({})",
        session.session_id(),
        session.state().as_str()
    )];
    if let Some(card) = session.voice_card() {
        lines.push(format!(
            "  Voice: {} - {} [{}]",
            card.brand_name(),
            card.positioning(),
            card.tone_traits().join(", ")
        ));
    }
    if let Some(bundle) = session.asset_bundle() {
        lines.push(format!(
            "  Assets: \"{}\" - {} emails, {} auditable assets",
            bundle.big_idea(),
            bundle.emails().len(),
            bundle.asset_refs().len()
        ));
    }
    if let Some(report) = session.audit_report() {
        lines.push(format!("  Audit: {} items", report.items().len()));
    }
    lines.join("\n")
}

pub fn format_provider_table(config: &BrandlineConfig) -> String {
    if config.providers.is_empty() {
        return "No providers configured.".to_string();
    }
    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_header(vec!["Name", "Type", "Model", "Endpoint", "API key", "Default"]);
    for (name, provider) in &config.providers {
        let key_status = match (provider.resolve_api_key(), provider.api_key_env_name()) {
            (Some(_), _) => "set".to_string(),
            (None, Some(env)) => format!("missing ({})", env),
            (None, None) => "not needed".to_string(),
        };
        let is_default = config.pipeline.provider.as_deref() == Some(name.as_str());
        table.add_row(vec![
            name.clone(),
            provider.provider_type.as_str().to_string(),
            provider.model.clone(),
            provider.endpoint.clone().unwrap_or_else(|| "-".to_string()),
            key_status,
            if is_default { "*".to_string() } else { String::new() },
        ]);
    }
    table.to_string()
}
