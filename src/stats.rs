//! Collection statistics and the curated top lists.

use crate::error::{Result, ShelfError};
use crate::model::{Game, Id, Item, Stats, TopKind};

pub const TOP_CAP: usize = 5;

/// Something that can be put on a top list.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Candidate {
    pub id: Id,
    pub title: String,
    pub platform: String,
}

/// The pool a top list picks from: all games, consoles, or everything else.
pub fn candidates(kind: TopKind, games: &[Game], items: &[Item]) -> Vec<Candidate> {
    match kind {
        TopKind::Games => games
            .iter()
            .map(|g| Candidate { id: g.id, title: g.title.clone(), platform: g.platform.clone() })
            .collect(),
        TopKind::Consoles | TopKind::Accessories => items
            .iter()
            .filter(|i| i.is_console() == (kind == TopKind::Consoles))
            .map(|i| Candidate { id: i.id, title: i.title.clone(), platform: i.platform.clone() })
            .collect(),
    }
}

/// Selection state of the "edit top list" dialog.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TopPicker {
    pub kind: TopKind,
    pub query: String,
    selected: Vec<Id>,
}

impl TopPicker {
    /// Starts from the list as currently saved.
    pub fn open(kind: TopKind, stats: &Stats) -> Self {
        Self {
            kind,
            query: String::new(),
            selected: stats.top(kind).iter().map(|e| e.id).take(TOP_CAP).collect(),
        }
    }

    pub fn selected(&self) -> &[Id] {
        &self.selected
    }

    pub fn is_selected(&self, id: Id) -> bool {
        self.selected.contains(&id)
    }

    /// Adds at the end or removes; refuses a sixth entry.
    pub fn toggle(&mut self, id: Id) -> Result<()> {
        if let Some(pos) = self.selected.iter().position(|s| *s == id) {
            self.selected.remove(pos);
            return Ok(());
        }
        if self.selected.len() >= TOP_CAP {
            return Err(ShelfError::Validation(format!(
                "You can pick at most {TOP_CAP}. Remove one first."
            )));
        }
        self.selected.push(id);
        Ok(())
    }

    /// Candidates matching the search box on title or platform.
    pub fn filter<'a>(&self, pool: &'a [Candidate]) -> Vec<&'a Candidate> {
        let needle = self.query.trim().to_lowercase();
        pool.iter()
            .filter(|c| {
                needle.is_empty()
                    || c.title.to_lowercase().contains(&needle)
                    || c.platform.to_lowercase().contains(&needle)
            })
            .collect()
    }
}

#[derive(Debug, Default)]
pub struct StatsStore {
    pub stats: Option<Stats>,
    pub loading: bool,
    pub picker: Option<TopPicker>,
    /// Items for the console/accessory pools; games come from the games store.
    pub items: Vec<Item>,
}

impl StatsStore {
    pub fn finish_load(&mut self, result: Result<(Stats, Vec<Item>)>) -> Result<()> {
        self.loading = false;
        let (stats, items) = result?;
        self.stats = Some(stats);
        self.items = items;
        Ok(())
    }
}
