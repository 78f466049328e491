use crate::aggregate::FilterCounts;
use crate::extract::ExtractStats;
use crate::output::Theme;
use rich_rust::prelude::*;
use rich_rust::renderables::Cell;

/// Renders labelled counts as a two-column table.
pub struct StatsPanel<'a> {
    title: String,
    stats: Vec<(String, usize, Style)>,
    theme: &'a Theme,
}

impl<'a> StatsPanel<'a> {
    pub fn new(title: impl Into<String>, theme: &'a Theme) -> Self {
        Self {
            title: title.into(),
            stats: vec![],
            theme,
        }
    }

    pub fn add(&mut self, label: impl Into<String>, count: usize, style: Style) -> &mut Self {
        self.stats.push((label.into(), count, style));
        self
    }

    /// Counts of records removed before aggregation; zero rows are skipped.
    #[must_use]
    pub fn filtered(counts: &FilterCounts, theme: &'a Theme) -> Self {
        let mut panel = Self::new("Filtered records", theme);
        let rows = [
            ("Malformed PR rows", counts.malformed_prs),
            ("Malformed comment rows", counts.malformed_comments),
            ("Automated PRs", counts.automated_prs),
            ("Automated comments", counts.automated_comments),
            ("Denylisted PRs", counts.denylisted_prs),
            ("Denylisted comments", counts.denylisted_comments),
            ("PRs outside range", counts.out_of_range_prs),
            ("Comments outside range", counts.out_of_range_comments),
        ];
        for (label, count) in rows {
            if count > 0 {
                panel.add(label, count, theme.muted.clone());
            }
        }
        panel
    }

    #[must_use]
    pub fn extraction(stats: &ExtractStats, theme: &'a Theme) -> Self {
        let mut panel = Self::new("Ticket extraction", theme);
        panel
            .add("Fetched", stats.fetched, theme.info.clone())
            .add("Kept", stats.kept, theme.success.clone())
            .add("Excluded", stats.excluded, theme.muted.clone());
        for (status, count) in &stats.unmapped_statuses {
            panel.add(format!("Unmapped status '{status}'"), *count, theme.warning.clone());
        }
        for (issue_type, count) in &stats.unmapped_issue_types {
            panel.add(format!("Unmapped type '{issue_type}'"), *count, theme.warning.clone());
        }
        panel
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.stats.is_empty()
    }

    #[must_use]
    pub fn build(&self) -> Table {
        let mut table = Table::new()
            .box_style(self.theme.box_style)
            .border_style(self.theme.panel_border.clone())
            .title(Text::styled(&self.title, self.theme.panel_title.clone()));

        table = table
            .with_column(Column::new("Label").min_width(15))
            .with_column(
                Column::new("Count")
                    .justify(JustifyMethod::Right)
                    .min_width(6),
            );

        for (label, count, style) in &self.stats {
            let label_cell = Cell::new(Text::styled(label, style.clone()));
            table.add_row(Row::new(vec![
                label_cell,
                Cell::new(Text::new(count.to_string())),
            ]));
        }

        table
    }

    #[must_use]
    pub fn plain_lines(&self) -> Vec<String> {
        let mut lines = vec![format!("{}:", self.title)];
        lines.extend(
            self.stats
                .iter()
                .map(|(label, count, _)| format!("  {label}: {count}")),
        );
        lines
    }
}
