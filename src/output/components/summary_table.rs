use crate::aggregate::SummaryStats;
use crate::output::Theme;
use rich_rust::prelude::*;
use rich_rust::renderables::Cell;
use unicode_width::UnicodeWidthStr;

const RULE_WIDTH: usize = 60;
const AUTHOR_WIDTH: usize = 25;

/// Per-developer productivity summary: one row per author plus totals.
pub struct SummaryTable<'a> {
    stats: &'a SummaryStats,
    theme: &'a Theme,
    title: Option<String>,
}

impl<'a> SummaryTable<'a> {
    #[must_use]
    pub const fn new(stats: &'a SummaryStats, theme: &'a Theme) -> Self {
        Self {
            stats,
            theme,
            title: None,
        }
    }

    #[must_use]
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    #[must_use]
    pub fn build(&self) -> Table {
        let mut table = Table::new()
            .box_style(self.theme.box_style)
            .border_style(self.theme.table_border.clone());

        if let Some(ref title) = self.title {
            table = table.title(Text::styled(title, self.theme.panel_title.clone()));
        }

        table = table
            .with_column(Column::new("Developer").min_width(12))
            .with_column(Column::new("PRs").justify(JustifyMethod::Right).min_width(5))
            .with_column(Column::new("Lines").justify(JustifyMethod::Right).min_width(7))
            .with_column(Column::new("Avg/PR").justify(JustifyMethod::Right).min_width(7))
            .with_column(
                Column::new("Comments")
                    .justify(JustifyMethod::Right)
                    .min_width(8),
            );

        for author in &self.stats.authors {
            table.add_row(Row::new(vec![
                Cell::new(Text::styled(&author.author, self.theme.developer.clone())),
                self.number(author.pr_count.to_string()),
                self.number(author.total_lines.to_string()),
                self.number(format!("{:.0}", author.avg_lines_per_pr)),
                self.number(author.comment_count.to_string()),
            ]));
        }

        table.add_row(Row::new(vec![
            Cell::new(Text::styled("TOTALS", self.theme.total.clone())),
            Cell::new(Text::styled(
                self.stats.total_prs.to_string(),
                self.theme.total.clone(),
            )),
            Cell::new(Text::styled(
                self.stats.total_lines.to_string(),
                self.theme.total.clone(),
            )),
            Cell::new(Text::new("")),
            Cell::new(Text::styled(
                self.stats.total_comments.to_string(),
                self.theme.total.clone(),
            )),
        ]));

        table
    }

    fn number(&self, value: String) -> Cell {
        Cell::new(Text::styled(value, self.theme.number.clone()))
    }

    /// Fixed-width text rendition for plain output.
    #[must_use]
    pub fn plain_lines(&self) -> Vec<String> {
        let mut lines = Vec::with_capacity(self.stats.authors.len() + 4);
        if let Some(ref title) = self.title {
            lines.push("=".repeat(RULE_WIDTH));
            lines.push(title.clone());
            lines.push("=".repeat(RULE_WIDTH));
        }
        lines.push(format!(
            "{} {:<6} {:<8} {:<8} {:<10}",
            pad("Developer", AUTHOR_WIDTH),
            "PRs",
            "Lines",
            "Avg/PR",
            "Comments"
        ));
        lines.push("-".repeat(RULE_WIDTH));
        for author in &self.stats.authors {
            lines.push(format!(
                "{} {:<6} {:<8} {:<8.0} {:<10}",
                pad(&author.author, AUTHOR_WIDTH),
                author.pr_count,
                author.total_lines,
                author.avg_lines_per_pr,
                author.comment_count
            ));
        }
        lines.push("-".repeat(RULE_WIDTH));
        lines.push(format!(
            "{} {:<6} {:<8} {:<8} {:<10}",
            pad("TOTALS", AUTHOR_WIDTH),
            self.stats.total_prs,
            self.stats.total_lines,
            "",
            self.stats.total_comments
        ));
        lines
    }
}

/// Left-align `text` in `width` terminal columns.
pub(crate) fn pad(text: &str, width: usize) -> String {
    let visible = UnicodeWidthStr::width(text);
    if visible >= width {
        text.to_string()
    } else {
        format!("{text}{}", " ".repeat(width - visible))
    }
}
