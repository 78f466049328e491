//! Tickets command implementation.
//!
//! Fetches tickets from the tracker (or a saved search response), rebuilds
//! each phase timeline, resolves the parent hierarchy and writes the flat
//! CSV export.

use crate::cli::TicketsArgs;
use crate::config::{self, CliOverrides, ConfigLayer, TrackerSettings};
use crate::error::{ReportError, Result};
use crate::extract::{TicketExtractor, weekly_rollup};
use crate::format::TicketExport;
use crate::format::csv::{self, ALL_FIELDS};
use crate::output::{OutputContext, StatsPanel, WeeklyTable};
use crate::tracker::{
    ChainCredentials, CredentialProvider, EnvCredentials, JiraClient, JsonFileSource,
    PromptCredentials, StaticCredentials, TrackerSource,
};
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;
use tracing::{debug, info};

const TOKEN_HELP: &str =
    "API token (generated at https://id.atlassian.com/manage-profile/security/api-tokens)";

/// Execute the tickets command.
///
/// # Errors
///
/// Returns an error if configuration is invalid, the source cannot be read,
/// or the CSV cannot be written.
pub fn execute(
    args: &TicketsArgs,
    config_path: Option<&Path>,
    overrides: &CliOverrides,
    ctx: &OutputContext,
) -> Result<()> {
    let layer = config::load_config(config_path, overrides)?;
    let rules = config::rules_from_layer(&layer)?;
    let settings = TrackerSettings::from_layer(&layer)?;
    let output = config::tickets_output_from_layer(&layer);

    let fields = csv::parse_fields(args.fields.as_deref());
    if fields.is_empty() {
        return Err(ReportError::validation(
            "fields",
            format!("no known columns; choose from {}", ALL_FIELDS.join(", ")),
        ));
    }

    let source = open_source(args, &settings, &layer)?;
    info!(source = %source.describe(), query = %settings.query, "Fetching tickets");
    let raws = source.fetch(&settings.query)?;

    let extraction = TicketExtractor::new(&rules)
        .with_progress(ctx.is_rich())
        .extract(raws);

    if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    let file = File::create(&output)?;
    let mut writer = BufWriter::new(file);
    csv::write_csv(&mut writer, &extraction.tickets, &fields)?;
    writer.flush()?;
    debug!(path = %output.display(), columns = fields.len(), "Wrote ticket export");

    let weekly = args.weekly.then(|| weekly_rollup(&extraction.tickets));

    if ctx.is_json() {
        ctx.json_pretty(&TicketExport {
            source: source.describe(),
            output,
            columns: fields,
            stats: extraction.stats,
            weekly,
        });
        return Ok(());
    }

    ctx.success(&format!(
        "Wrote {} tickets to {}",
        extraction.tickets.len(),
        output.display()
    ));

    let panel = StatsPanel::extraction(&extraction.stats, ctx.theme());
    if ctx.is_rich() {
        ctx.render(&panel.build());
    } else {
        for line in panel.plain_lines() {
            ctx.print(&line);
        }
    }

    if let Some(weeks) = weekly {
        let table = WeeklyTable::new(&weeks, ctx.theme());
        ctx.section("Weekly throughput");
        if ctx.is_rich() {
            ctx.render(&table.build());
        } else {
            for line in table.plain_lines() {
                ctx.print(&line);
            }
        }
    }

    Ok(())
}

fn open_source(
    args: &TicketsArgs,
    settings: &TrackerSettings,
    layer: &ConfigLayer,
) -> Result<Box<dyn TrackerSource>> {
    if let Some(path) = &args.from_file {
        return Ok(Box::new(JsonFileSource::new(
            path.clone(),
            settings.custom_fields.clone(),
        )));
    }

    if layer.get("tracker.base-url").is_none() {
        return Err(ReportError::Config(
            "tracker.base-url is not set (or pass --from-file)".to_string(),
        ));
    }

    let credentials = ChainCredentials::new()
        .with(StaticCredentials::new(
            settings.user.clone(),
            settings.token.clone(),
        ))
        .with(EnvCredentials::default())
        .with(PromptCredentials::with_token_help(TOKEN_HELP))
        .credentials()?;
    Ok(Box::new(JiraClient::new(settings, credentials)?))
}
