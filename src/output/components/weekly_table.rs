use crate::extract::WeeklyRollup;
use crate::output::Theme;
use rich_rust::prelude::*;
use rich_rust::renderables::Cell;

/// Tickets created and resolved per Sunday-started week.
pub struct WeeklyTable<'a> {
    weeks: &'a [WeeklyRollup],
    theme: &'a Theme,
}

impl<'a> WeeklyTable<'a> {
    #[must_use]
    pub const fn new(weeks: &'a [WeeklyRollup], theme: &'a Theme) -> Self {
        Self { weeks, theme }
    }

    #[must_use]
    pub fn build(&self) -> Table {
        let mut table = Table::new()
            .box_style(self.theme.box_style)
            .border_style(self.theme.table_border.clone())
            .title(Text::styled("Weekly throughput", self.theme.panel_title.clone()))
            .with_column(Column::new("Week").min_width(10))
            .with_column(
                Column::new("Created")
                    .justify(JustifyMethod::Right)
                    .min_width(7),
            )
            .with_column(
                Column::new("Resolved")
                    .justify(JustifyMethod::Right)
                    .min_width(8),
            );

        for week in self.weeks {
            table.add_row(Row::new(vec![
                Cell::new(Text::styled(week.week.to_string(), self.theme.week.clone())),
                Cell::new(Text::styled(week.created.to_string(), self.theme.number.clone())),
                Cell::new(Text::styled(week.resolved.to_string(), self.theme.number.clone())),
            ]));
        }

        table
    }

    #[must_use]
    pub fn plain_lines(&self) -> Vec<String> {
        let mut lines = vec![format!("{:<12} {:>8} {:>8}", "Week", "Created", "Resolved")];
        lines.extend(self.weeks.iter().map(|week| {
            format!(
                "{:<12} {:>8} {:>8}",
                week.week.format("%Y-%m-%d").to_string(),
                week.created,
                week.resolved
            )
        }));
        lines
    }
}
