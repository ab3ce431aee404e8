//! Consoles and accessories.

use serde_json::Value;

use crate::api::Backend;
use crate::error::Result;
use crate::form::ItemForm;
use crate::loader::LoadGate;
use crate::model::{Id, Item};

/// Categories offered in the form and the filter bar.
pub const CATEGORIES: [&str; 5] = ["Systems", "Controllers", "Accessories", "Memory Cards", "Cables"];

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ItemView {
    #[default]
    List,
    Grid,
}

/// Items in any of `categories`, source order kept. No categories means all.
pub fn filter_by_categories(items: &[Item], categories: &[String]) -> Vec<Item> {
    if categories.is_empty() {
        return items.to_vec();
    }
    items
        .iter()
        .filter(|i| categories.iter().any(|c| i.category.eq_ignore_ascii_case(c)))
        .cloned()
        .collect()
}

/// One category is filtered by the server; several are fetched together and
/// unioned here.
pub fn fetch_items(backend: &dyn Backend, categories: &[String]) -> Result<Vec<Item>> {
    match categories {
        [] => backend.list_items(None),
        [one] => backend.list_items(Some(one.as_str())),
        many => Ok(filter_by_categories(&backend.list_items(None)?, many)),
    }
}

/// Creates the item when `id` is `None`, updates it otherwise.
pub fn save_item(backend: &dyn Backend, id: Option<Id>, payload: &Value) -> Result<()> {
    match id {
        Some(id) => backend.update_item(id, payload),
        None => backend.create_item(payload).map(|id| log::info!("created item {id}")),
    }
}

#[derive(Debug, Default)]
pub struct ItemsStore {
    items: Vec<Item>,
    pub categories: Vec<String>,
    pub search: String,
    pub view: ItemView,
    pub gate: LoadGate,
    pub form: Option<ItemForm>,
    saving: bool,
    loaded: bool,
}

impl ItemsStore {
    pub fn items(&self) -> &[Item] {
        &self.items
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    /// Items passing the search box.
    pub fn visible(&self) -> Vec<&Item> {
        let needle = self.search.trim().to_lowercase();
        self.items
            .iter()
            .filter(|i| {
                needle.is_empty()
                    || i.title.to_lowercase().contains(&needle)
                    || i.platform.to_lowercase().contains(&needle)
            })
            .collect()
    }

    pub fn toggle_category(&mut self, category: &str) {
        if let Some(pos) = self.categories.iter().position(|c| c == category) {
            self.categories.remove(pos);
        } else {
            self.categories.push(category.to_owned());
        }
    }

    /// Failed loads keep what was shown before.
    pub fn finish_load(&mut self, result: Result<Vec<Item>>) -> Result<()> {
        self.gate.finish();
        let items = result?;
        self.items = items;
        self.loaded = true;
        Ok(())
    }

    pub fn remove(&mut self, id: Id) {
        self.items.retain(|i| i.id != id);
    }

    pub fn is_saving(&self) -> bool {
        self.saving
    }

    /// `false` while an earlier save is still in flight.
    pub fn begin_save(&mut self) -> bool {
        !std::mem::replace(&mut self.saving, true)
    }

    /// Closes the form on success; a rejected save leaves it open as typed.
    pub fn finish_save(&mut self, result: Result<()>) -> Result<()> {
        self.saving = false;
        result?;
        self.form = None;
        Ok(())
    }

    pub fn get(&self, id: Id) -> Option<&Item> {
        self.items.iter().find(|i| i.id == id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ShelfError;
    use crate::testing::{Call, MockBackend};

    fn item(id: Id, title: &str, category: &str) -> Item {
        Item {
            id,
            title: title.to_owned(),
            category: category.to_owned(),
            ..Default::default()
        }
    }

    fn backend() -> MockBackend {
        MockBackend {
            items: vec![
                item(1, "SNES", "Systems"),
                item(2, "DualShock 2", "Controllers"),
                item(3, "Memory Card", "Memory Cards"),
                item(4, "N64", "Systems"),
            ],
            ..Default::default()
        }
    }

    #[test]
    fn several_categories_are_unioned_client_side() {
        let backend = backend();
        let cats = vec!["Controllers".to_owned(), "Systems".to_owned()];
        let items = fetch_items(&backend, &cats).unwrap();
        let ids: Vec<Id> = items.iter().map(|i| i.id).collect();
        assert_eq!(ids, vec![1, 2, 4]);
        assert_eq!(backend.calls(), vec![Call::ListItems(None)]);
    }

    #[test]
    fn one_category_is_asked_of_the_server() {
        let backend = backend();
        let items = fetch_items(&backend, &["Systems".to_owned()]).unwrap();
        assert!(items.iter().all(Item::is_console));
        assert_eq!(backend.calls(), vec![Call::ListItems(Some("Systems".to_owned()))]);
    }

    #[test]
    fn failed_reload_keeps_previous_items() {
        let mut store = ItemsStore::default();
        store.finish_load(Ok(vec![item(1, "SNES", "Systems")])).unwrap();
        assert!(store.gate.try_begin());
        assert!(store.finish_load(Err(ShelfError::EmptyResponse)).is_err());
        assert_eq!(store.items().len(), 1);
        assert!(!store.gate.is_busy());
    }

    #[test]
    fn category_toggled_mid_load_is_fetched_afterwards() {
        let mut store = ItemsStore::default();
        assert!(store.gate.try_begin());
        store.toggle_category("Systems");
        assert!(!store.gate.try_begin());
        store.finish_load(Ok(vec![item(2, "DualShock 2", "Controllers")])).unwrap();
        assert!(store.gate.take_pending());
        assert!(store.gate.try_begin());
    }

    #[test]
    fn saving_creates_then_closes_the_form() {
        let backend = backend();
        let form = ItemForm { title: "Wavebird".to_owned(), category: "Controllers".to_owned(), ..Default::default() };
        let payload = form.to_payload().unwrap();
        let mut store = ItemsStore { form: Some(form), ..Default::default() };

        assert!(store.begin_save());
        assert!(!store.begin_save(), "one save at a time");
        store.finish_save(save_item(&backend, None, &payload)).unwrap();
        assert!(store.form.is_none());
        assert!(!store.is_saving());
        assert!(matches!(&backend.calls()[..], [Call::CreateItem(body)] if body["title"] == "Wavebird"));
    }

    #[test]
    fn rejected_save_keeps_form_and_list() {
        let backend = MockBackend {
            reject_mutations: Some("Name already taken".to_owned()),
            ..backend()
        };
        let form = ItemForm { title: "SNES".to_owned(), category: "Systems".to_owned(), ..Default::default() };
        let payload = form.to_payload().unwrap();
        let mut store = ItemsStore { form: Some(form.clone()), ..Default::default() };
        store.finish_load(Ok(vec![item(1, "SNES", "Systems")])).unwrap();

        assert!(store.begin_save());
        let err = store.finish_save(save_item(&backend, None, &payload)).unwrap_err();
        assert_eq!(err.user_message(), "Name already taken");
        assert_eq!(store.form, Some(form));
        assert_eq!(store.items().len(), 1);
        assert!(!store.is_saving());
    }

    #[test]
    fn search_matches_title_or_platform() {
        let mut store = ItemsStore::default();
        let mut pad = item(2, "Wavebird", "Controllers");
        pad.platform = "GameCube".to_owned();
        store.finish_load(Ok(vec![item(1, "SNES", "Systems"), pad])).unwrap();
        store.search = "gamecube".to_owned();
        assert_eq!(store.visible().len(), 1);
        store.toggle_category("Systems");
        store.toggle_category("Cables");
        store.toggle_category("Systems");
        assert_eq!(store.categories, vec!["Cables"]);
    }
}
