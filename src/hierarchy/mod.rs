//! Parent-link resolution over the flat ticket table.
//!
//! Each ticket carries only its direct parent key. Three fixed sweeps copy
//! ancestor names and keys down the tree, top level first:
//!
//! | Pass | Rows with    | Copied from the parent row                          |
//! |------|--------------|-----------------------------------------------------|
//! | 1    | initiative   | summary → initiative name, theme                    |
//! | 2    | epic         | summary → epic name, initiative key/name, theme     |
//! | 3    | story        | summary → story name, epic key/name, initiative key/name, theme |
//!
//! Lookups go through a `key → row` index built once; the first row with a
//! key wins. A parent missing from the table leaves the row untouched. There
//! is no cycle detection: three passes bound the work regardless.

use crate::model::{ParentLinks, Ticket};
use std::collections::HashMap;
use tracing::debug;

/// Ticket rows plus a key index.
#[derive(Debug, Clone, Default)]
pub struct TicketTable {
    rows: Vec<Ticket>,
    index: HashMap<String, usize>,
}

impl TicketTable {
    #[must_use]
    pub fn new(rows: Vec<Ticket>) -> Self {
        let mut index = HashMap::with_capacity(rows.len());
        for (position, row) in rows.iter().enumerate() {
            index.entry(row.key.clone()).or_insert(position);
        }
        Self { rows, index }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    #[must_use]
    pub fn rows(&self) -> &[Ticket] {
        &self.rows
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Ticket> {
        self.index.get(key).map(|&position| &self.rows[position])
    }

    #[must_use]
    pub fn into_rows(self) -> Vec<Ticket> {
        self.rows
    }

    /// Run the three resolution passes in order.
    pub fn resolve(&mut self) {
        let initiatives = self.sweep(initiative_key, apply_initiative);
        let epics = self.sweep(epic_key, apply_epic);
        let stories = self.sweep(story_key, apply_story);
        debug!(initiatives, epics, stories, "Resolved parent links");
    }

    /// One pass in table order. Returns how many rows found their parent.
    ///
    /// Rows are updated in place, so a row later in the table sees updates
    /// made to earlier rows during the same pass.
    fn sweep(
        &mut self,
        parent_of: fn(&ParentLinks) -> Option<&str>,
        apply: fn(&mut ParentLinks, &Ticket),
    ) -> usize {
        let mut resolved = 0;
        for position in 0..self.rows.len() {
            let Some(parent_position) = parent_of(&self.rows[position].links)
                .and_then(|key| self.index.get(key).copied())
            else {
                continue;
            };
            let parent = self.rows[parent_position].clone();
            apply(&mut self.rows[position].links, &parent);
            resolved += 1;
        }
        resolved
    }
}

/// Resolve parent links for a list of tickets.
#[must_use]
pub fn resolve(rows: Vec<Ticket>) -> Vec<Ticket> {
    let mut table = TicketTable::new(rows);
    table.resolve();
    table.into_rows()
}

fn initiative_key(links: &ParentLinks) -> Option<&str> {
    links.parent_initiative.as_deref()
}

fn epic_key(links: &ParentLinks) -> Option<&str> {
    links.parent_epic.as_deref()
}

fn story_key(links: &ParentLinks) -> Option<&str> {
    links.parent_story.as_deref()
}

fn apply_initiative(links: &mut ParentLinks, initiative: &Ticket) {
    links.parent_initiative_name = Some(initiative.summary.clone());
    links.parent_theme.clone_from(&initiative.links.parent_theme);
}

fn apply_epic(links: &mut ParentLinks, epic: &Ticket) {
    links.parent_epic_name = Some(epic.summary.clone());
    links
        .parent_initiative
        .clone_from(&epic.links.parent_initiative);
    links
        .parent_initiative_name
        .clone_from(&epic.links.parent_initiative_name);
    links.parent_theme.clone_from(&epic.links.parent_theme);
}

fn apply_story(links: &mut ParentLinks, story: &Ticket) {
    links.parent_story_name = Some(story.summary.clone());
    links.parent_epic.clone_from(&story.links.parent_epic);
    links.parent_epic_name.clone_from(&story.links.parent_epic_name);
    links
        .parent_initiative
        .clone_from(&story.links.parent_initiative);
    links
        .parent_initiative_name
        .clone_from(&story.links.parent_initiative_name);
    links.parent_theme.clone_from(&story.links.parent_theme);
}
