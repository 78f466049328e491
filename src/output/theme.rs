//! Colors for the summary tables and panels.

use rich_rust::r#box::ROUNDED;
use rich_rust::prelude::*;

fn color(name: &str) -> Style {
    Color::parse(name).map_or_else(|_| Style::new(), |c| Style::new().color(c))
}

#[derive(Debug, Clone)]
pub struct Theme {
    pub success: Style,
    pub warning: Style,
    pub info: Style,
    pub dimmed: Style,
    pub muted: Style,
    pub emphasis: Style,

    pub developer: Style,
    pub number: Style,
    pub total: Style,
    pub week: Style,

    pub table_border: Style,
    pub panel_title: Style,
    pub panel_border: Style,
    pub section: Style,

    pub box_style: &'static BoxChars,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            success: color("green").bold(),
            warning: color("yellow").bold(),
            info: color("blue"),
            dimmed: Style::new().dim(),
            muted: color("bright_black"),
            emphasis: Style::new().bold(),

            developer: color("green"),
            number: color("cyan"),
            total: Style::new().bold(),
            week: color("magenta"),

            table_border: color("bright_black"),
            panel_title: Style::new().bold(),
            panel_border: color("bright_black"),
            section: color("cyan").bold(),

            box_style: &ROUNDED,
        }
    }
}
