//! UI preferences that survive a restart.

use crate::filter::{GameFilter, SortKey};

pub const VIEW_MODE_KEY: &str = "game_shelf.view_mode";
pub const FILTERS_KEY: &str = "game_shelf.filters";

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Deserialize, serde::Serialize)]
pub enum ViewMode {
    #[default]
    List,
    Grid,
    Coverflow,
}

impl ViewMode {
    pub const ALL: [Self; 3] = [Self::List, Self::Grid, Self::Coverflow];

    pub fn label(self) -> &'static str {
        match self {
            Self::List => "List",
            Self::Grid => "Grid",
            Self::Coverflow => "Coverflow",
        }
    }
}

/// What goes under [`FILTERS_KEY`].
#[derive(Clone, Debug, Default, PartialEq, Eq, serde::Deserialize, serde::Serialize)]
#[serde(default)]
pub struct SavedFilters {
    pub filter: GameFilter,
    pub sort: SortKey,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Prefs {
    pub view: ViewMode,
    pub filters: SavedFilters,
}

impl Prefs {
    pub fn load(storage: Option<&dyn eframe::Storage>) -> Self {
        let Some(storage) = storage else { return Self::default() };
        Self {
            view: eframe::get_value(storage, VIEW_MODE_KEY).unwrap_or_default(),
            filters: eframe::get_value(storage, FILTERS_KEY).unwrap_or_default(),
        }
    }

    pub fn save(&self, storage: &mut dyn eframe::Storage) {
        eframe::set_value(storage, VIEW_MODE_KEY, &self.view);
        eframe::set_value(storage, FILTERS_KEY, &self.filters);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[derive(Default)]
    struct MemStorage(HashMap<String, String>);

    impl eframe::Storage for MemStorage {
        fn get_string(&self, key: &str) -> Option<String> {
            self.0.get(key).cloned()
        }

        fn set_string(&mut self, key: &str, value: String) {
            self.0.insert(key.to_owned(), value);
        }

        fn flush(&mut self) {}
    }

    #[test]
    fn prefs_use_two_keys_and_survive_a_restart() {
        let mut storage = MemStorage::default();
        let prefs = Prefs {
            view: ViewMode::Coverflow,
            filters: SavedFilters {
                filter: GameFilter { platform: Some("SNES".to_owned()), ..Default::default() },
                sort: SortKey::PriceDesc,
            },
        };
        prefs.save(&mut storage);
        let mut keys: Vec<&String> = storage.0.keys().collect();
        keys.sort();
        assert_eq!(keys, vec![FILTERS_KEY, VIEW_MODE_KEY]);
        assert_eq!(Prefs::load(Some(&storage as &dyn eframe::Storage)), prefs);
        assert_eq!(Prefs::load(None), Prefs::default());
    }
}
