//! Configuration inspection command.
//!
//! Prints the merged configuration, optionally with the layer each value
//! came from. Secret values (any key containing `token`) are masked.

use crate::cli::ConfigArgs;
use crate::config::{
    self, CliOverrides, ConfigLayer, default_config_layer, load_project_layer, load_user_config,
};
use crate::error::Result;
use crate::output::OutputContext;
use rich_rust::prelude::*;
use rich_rust::renderables::Cell;
use serde_json::json;
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ConfigSource {
    Default,
    User,
    Project,
    Environment,
    Cli,
}

impl ConfigSource {
    const fn label(self) -> &'static str {
        match self {
            Self::Default => "default",
            Self::User => "user config",
            Self::Project => "project config",
            Self::Environment => "environment",
            Self::Cli => "cli",
        }
    }
}

struct ConfigEntry {
    key: String,
    value: String,
    source: ConfigSource,
}

struct LayerWithSource {
    source: ConfigSource,
    layer: ConfigLayer,
}

/// Execute the config command.
///
/// # Errors
///
/// Returns an error if a config file cannot be read or parsed.
pub fn execute(
    args: &ConfigArgs,
    config_path: Option<&Path>,
    overrides: &CliOverrides,
    ctx: &OutputContext,
) -> Result<()> {
    let layers = build_layers(config_path, overrides)?;
    let merged = merge_layers(&layers);
    let entries: Vec<ConfigEntry> = merged
        .masked_entries()
        .into_iter()
        .map(|(key, value)| ConfigEntry {
            source: resolve_source(&key, &layers),
            key,
            value,
        })
        .collect();

    if ctx.is_json() {
        let values: serde_json::Map<String, serde_json::Value> = entries
            .iter()
            .map(|entry| {
                let value = if args.sources {
                    json!({ "value": entry.value, "source": entry.source.label() })
                } else {
                    json!(entry.value)
                };
                (entry.key.clone(), value)
            })
            .collect();
        ctx.json_pretty(&json!({
            "user_config": config::user_config_path().map(|p| p.display().to_string()),
            "project_config": config_path
                .map_or_else(|| config::PROJECT_CONFIG_FILE.to_string(), |p| p.display().to_string()),
            "values": values,
        }));
        return Ok(());
    }

    if ctx.is_rich() {
        render_config_table(&entries, args.sources, ctx);
    } else {
        for entry in &entries {
            if args.sources {
                ctx.print(&format!(
                    "{} = {}  ({})",
                    entry.key,
                    entry.value,
                    entry.source.label()
                ));
            } else {
                ctx.print(&format!("{} = {}", entry.key, entry.value));
            }
        }
    }
    Ok(())
}

fn build_layers(config_path: Option<&Path>, overrides: &CliOverrides) -> Result<Vec<LayerWithSource>> {
    Ok(vec![
        LayerWithSource {
            source: ConfigSource::Default,
            layer: default_config_layer(),
        },
        LayerWithSource {
            source: ConfigSource::User,
            layer: load_user_config()?,
        },
        LayerWithSource {
            source: ConfigSource::Project,
            layer: load_project_layer(config_path)?,
        },
        LayerWithSource {
            source: ConfigSource::Environment,
            layer: ConfigLayer::from_env(),
        },
        LayerWithSource {
            source: ConfigSource::Cli,
            layer: overrides.as_layer(),
        },
    ])
}

fn merge_layers(layers: &[LayerWithSource]) -> ConfigLayer {
    let mut merged = ConfigLayer::default();
    for layer in layers {
        merged.merge_from(&layer.layer);
    }
    merged
}

fn resolve_source(key: &str, layers: &[LayerWithSource]) -> ConfigSource {
    layers
        .iter()
        .rev()
        .find(|layer| layer.layer.values.contains_key(key))
        .map_or(ConfigSource::Default, |layer| layer.source)
}

fn render_config_table(entries: &[ConfigEntry], with_sources: bool, ctx: &OutputContext) {
    let theme = ctx.theme();
    let mut table = Table::new()
        .box_style(theme.box_style)
        .border_style(theme.panel_border.clone())
        .title(Text::styled("Configuration", theme.panel_title.clone()));

    table = table
        .with_column(Column::new("Key").min_width(16).max_width(30))
        .with_column(Column::new("Value").min_width(12).max_width(50));
    if with_sources {
        table = table.with_column(Column::new("Source").min_width(12).max_width(20));
    }

    for entry in entries {
        let mut cells = vec![
            Cell::new(Text::styled(&entry.key, theme.emphasis.clone())),
            Cell::new(Text::new(entry.value.clone())),
        ];
        if with_sources {
            cells.push(Cell::new(Text::styled(
                entry.source.label(),
                theme.dimmed.clone(),
            )));
        }
        table.add_row(Row::new(cells));
    }

    ctx.render(&table);
}
