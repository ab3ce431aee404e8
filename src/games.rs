//! State behind the games page.

use std::time::Instant;

use serde_json::Value;

use crate::api::Backend;
use crate::coverflow::{self, Coverflow};
use crate::error::Result;
use crate::filter::{self, GameFilter, SortKey};
use crate::form::GameForm;
use crate::loader::LoadGate;
use crate::model::{Game, Id};
use crate::prefs::{Prefs, SavedFilters, ViewMode};
use crate::split::SplitSettings;

/// What the server handed back for a saved game form.
#[derive(Clone, Debug, PartialEq)]
pub enum Saved {
    Created(Id),
    /// The record as stored after the update.
    Updated(Game),
}

/// Creates the game when `id` is `None`; an update re-reads the stored record.
pub fn save_game(backend: &dyn Backend, id: Option<Id>, payload: &Value) -> Result<Saved> {
    match id {
        Some(id) => {
            backend.update_game(id, payload)?;
            backend.get_game(id).map(Saved::Updated)
        }
        None => backend.create_game(payload).map(Saved::Created),
    }
}

/// Everything the games page shows, with the only ways to change it.
#[derive(Debug, Default)]
pub struct GamesStore {
    games: Vec<Game>,
    filtered: Vec<Game>,
    filter: GameFilter,
    sort: SortKey,
    view: ViewMode,
    pub coverflow: Coverflow,
    pub gate: LoadGate,
    pub detail: Option<Id>,
    pub form: Option<GameForm>,
    /// Last manual split position, reused when no source preset applies.
    pub split_settings: SplitSettings,
    saving: bool,
    loaded: bool,
    /// Bumped whenever the filtered list is rebuilt.
    generation: u64,
}

impl GamesStore {
    pub fn from_prefs(prefs: &Prefs) -> Self {
        Self {
            filter: prefs.filters.filter.clone(),
            sort: prefs.filters.sort,
            view: prefs.view,
            ..Default::default()
        }
    }

    pub fn prefs(&self) -> Prefs {
        Prefs {
            view: self.view,
            filters: SavedFilters { filter: self.filter.clone(), sort: self.sort },
        }
    }

    pub fn all(&self) -> &[Game] {
        &self.games
    }

    pub fn filtered(&self) -> &[Game] {
        &self.filtered
    }

    pub fn filter(&self) -> &GameFilter {
        &self.filter
    }

    pub fn sort(&self) -> SortKey {
        self.sort
    }

    pub fn view(&self) -> ViewMode {
        self.view
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn get(&self, id: Id) -> Option<&Game> {
        self.games.iter().find(|g| g.id == id)
    }

    /// `false` if a load is already running.
    pub fn begin_load(&mut self) -> bool {
        self.gate.try_begin()
    }

    /// Replaces the list on success; on failure the current list stays.
    pub fn finish_load(&mut self, result: Result<Vec<Game>>) -> Result<()> {
        self.gate.finish();
        self.games = result?;
        self.loaded = true;
        self.refilter();
        Ok(())
    }

    pub fn set_filter(&mut self, filter: GameFilter) {
        if filter != self.filter {
            self.filter = filter;
            self.refilter();
        }
    }

    pub fn set_sort(&mut self, sort: SortKey) {
        if sort != self.sort {
            self.sort = sort;
            self.refilter();
        }
    }

    pub fn set_view(&mut self, view: ViewMode) {
        self.view = view;
    }

    /// Swaps in a fresh copy of one record after an update.
    pub fn upsert(&mut self, game: Game) {
        match self.games.iter_mut().find(|g| g.id == game.id) {
            Some(slot) => *slot = game,
            None => self.games.insert(0, game),
        }
        self.refilter();
    }

    pub fn is_saving(&self) -> bool {
        self.saving
    }

    /// `false` while an earlier save is still in flight.
    pub fn begin_save(&mut self) -> bool {
        !std::mem::replace(&mut self.saving, true)
    }

    /// Closes the form on success and returns whether the whole list needs a
    /// reload. A rejected save leaves the form and the list as they were.
    pub fn finish_save(&mut self, result: Result<Saved>) -> Result<bool> {
        self.saving = false;
        let saved = result?;
        self.form = None;
        match saved {
            Saved::Created(id) => {
                log::info!("created game {id}");
                Ok(true)
            }
            Saved::Updated(game) => {
                self.upsert(game);
                Ok(false)
            }
        }
    }

    /// Drops the record once the server agreed, handing it back so its covers
    /// can be released. A rejected delete changes nothing.
    pub fn finish_delete(&mut self, id: Id, result: Result<()>) -> Result<Option<Game>> {
        result?;
        let removed = self.get(id).cloned();
        self.remove(id);
        Ok(removed)
    }

    pub fn remove(&mut self, id: Id) {
        self.games.retain(|g| g.id != id);
        if self.detail == Some(id) {
            self.detail = None;
        }
        self.refilter();
    }

    fn refilter(&mut self) {
        let centered_before = self.centered().map(|g| g.id);
        self.filtered = filter::apply(&self.games, &self.filter, self.sort);
        self.generation += 1;
        self.coverflow.set_len(self.filtered.len());
        if self.centered().map(|g| g.id) != centered_before {
            self.coverflow.show_front();
        }
        let has_back = self.centered().is_some_and(Game::has_back_cover);
        self.coverflow.sync_face(has_back);
    }

    pub fn centered(&self) -> Option<&Game> {
        self.filtered.get(self.coverflow.index())
    }

    pub fn coverflow_event(&mut self, event: coverflow::Event, now: Instant) {
        self.coverflow.handle(event, now);
        let has_back = self.centered().is_some_and(Game::has_back_cover);
        self.coverflow.sync_face(has_back);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coverflow::{Event, Face};
    use crate::error::ShelfError;
    use crate::loader::load_all_games;
    use crate::form::CaseStyle;
    use crate::testing::{Call, MockBackend, game};

    #[test]
    fn failed_reload_keeps_the_displayed_games() {
        let mut store = GamesStore::default();
        assert!(store.begin_load());
        assert!(!store.begin_load());
        store.finish_load(Ok(vec![game(1, "Okami", "PS2")])).unwrap();

        let mut backend = MockBackend::with_games(vec![game(1, "Okami", "PS2"), game(2, "Ico", "PS2")]);
        backend.failing_pages = vec![1];
        assert!(store.begin_load());
        let err = store.finish_load(load_all_games(&backend, 500, 100)).unwrap_err();
        assert!(matches!(err, ShelfError::EmptyResponse));
        assert_eq!(store.all().len(), 1);
        assert_eq!(store.filtered().len(), 1);
        assert!(store.begin_load(), "gate is released after a failure");
    }

    #[test]
    fn filter_changes_refresh_the_view_and_coverflow() {
        let mut store = GamesStore::default();
        store
            .finish_load(Ok(vec![game(1, "Okami", "PS2"), game(2, "Ico", "PS2"), game(3, "Halo", "Xbox")]))
            .unwrap();
        store.coverflow_event(Event::Jump(2), Instant::now());
        store.set_filter(GameFilter { platform: Some("Xbox".to_owned()), ..Default::default() });
        assert_eq!(store.filtered().len(), 1);
        assert_eq!(store.coverflow.index(), 0);
        assert_eq!(store.centered().map(|g| g.id), Some(3));

        let before = store.generation();
        store.set_filter(store.filter().clone());
        assert_eq!(store.generation(), before, "unchanged filter is a no-op");
    }

    #[test]
    fn flip_only_when_the_center_has_a_back() {
        let mut with_back = game(1, "Okami", "PS2");
        with_back.back_cover_image = Some("okami_back.jpg".to_owned());
        let mut store = GamesStore::default();
        store.finish_load(Ok(vec![with_back, game(2, "Ico", "PS2")])).unwrap();
        store.set_sort(SortKey::CreatedAsc);

        let now = Instant::now();
        let has_back = store.centered().is_some_and(Game::has_back_cover);
        store.coverflow_event(Event::Flip { has_back }, now);
        assert_eq!(store.coverflow.face(), Face::Back);
        store.coverflow_event(Event::Next, now);
        assert_eq!(store.coverflow.face(), Face::Front);
    }

    #[test]
    fn prefs_round_trip_through_the_store() {
        let mut store = GamesStore::default();
        store.set_view(ViewMode::Grid);
        store.set_sort(SortKey::TitleAsc);
        let restored = GamesStore::from_prefs(&store.prefs());
        assert_eq!(restored.view(), ViewMode::Grid);
        assert_eq!(restored.sort(), SortKey::TitleAsc);
    }

    #[test]
    fn upsert_and_remove() {
        let mut store = GamesStore::default();
        store.finish_load(Ok(vec![game(1, "Okami", "PS2")])).unwrap();
        let mut edited = game(1, "Okami HD", "PS4");
        edited.played = true;
        store.upsert(edited);
        assert_eq!(store.get(1).map(|g| g.title.as_str()), Some("Okami HD"));
        store.detail = Some(1);
        store.remove(1);
        assert!(store.filtered().is_empty());
        assert_eq!(store.detail, None);
    }

    #[test]
    fn new_game_in_the_center_shows_its_front() {
        let mut games = vec![game(1, "Chrono Trigger", "SNES"), game(2, "Earthbound", "SNES")];
        for g in &mut games {
            g.back_cover_image = Some(format!("back_{}.jpg", g.id));
        }
        let mut store = GamesStore::default();
        store.set_sort(SortKey::TitleAsc);
        store.finish_load(Ok(games)).unwrap();
        assert_eq!(store.centered().map(|g| g.id), Some(1));

        store.coverflow_event(Event::Flip { has_back: true }, Instant::now());
        assert_eq!(store.coverflow.face(), Face::Back);
        store.set_filter(GameFilter { platform: Some("SNES".to_owned()), ..Default::default() });
        assert_eq!(store.coverflow.face(), Face::Back, "same game stays flipped");

        store.set_sort(SortKey::TitleDesc);
        assert_eq!(store.coverflow.index(), 0);
        assert_eq!(store.centered().map(|g| g.id), Some(2));
        assert_eq!(store.coverflow.face(), Face::Front);
    }

    #[test]
    fn reload_asked_for_mid_load_is_queued() {
        let mut store = GamesStore::default();
        assert!(store.begin_load());
        assert!(!store.begin_load());
        store.finish_load(Ok(vec![game(1, "Okami", "PS2")])).unwrap();
        assert!(store.gate.take_pending());
        assert!(store.begin_load());
    }

    #[test]
    fn adding_chrono_trigger_without_a_cover() {
        let backend = MockBackend::with_games(vec![game(1, "Okami", "PS2")]);
        let form = GameForm {
            title: "Chrono Trigger".to_owned(),
            platform: "SNES".to_owned(),
            ..Default::default()
        };
        let payload = form.to_payload().unwrap();
        let mut store = GamesStore { form: Some(form), ..Default::default() };

        assert!(store.begin_save());
        assert!(!store.begin_save(), "second click while saving");
        let reload = store.finish_save(save_game(&backend, None, &payload)).unwrap();
        assert!(reload);
        assert!(store.form.is_none());
        assert!(!store.is_saving());

        let calls = backend.calls();
        let [Call::CreateGame(body)] = calls.as_slice() else {
            panic!("expected one create call, got {calls:?}");
        };
        assert_eq!(body["title"], "Chrono Trigger");
        assert_eq!(body["front_cover_image"], Value::Null);
        assert_eq!(CaseStyle::for_platform("SNES"), CaseStyle::Cd);
    }

    #[test]
    fn update_swaps_in_the_stored_record() {
        let mut stored = game(1, "Okami HD", "PS4");
        stored.played = true;
        let backend = MockBackend::with_games(vec![stored]);
        let mut store = GamesStore::default();
        store.finish_load(Ok(vec![game(1, "Okami", "PS2")])).unwrap();
        let form = GameForm::edit(&game(1, "Okami HD", "PS4"));
        let payload = form.to_payload().unwrap();
        store.form = Some(form);

        let reload = store.finish_save(save_game(&backend, Some(1), &payload)).unwrap();
        assert!(!reload);
        assert_eq!(store.get(1).map(|g| (g.title.as_str(), g.played)), Some(("Okami HD", true)));
        assert!(matches!(backend.calls().first(), Some(Call::UpdateGame(1, _))));
    }

    #[test]
    fn rejected_save_keeps_the_form_and_the_list() {
        let backend = MockBackend {
            reject_mutations: Some("A game with that title already exists".to_owned()),
            ..MockBackend::with_games(vec![game(1, "Okami", "PS2")])
        };
        let mut store = GamesStore::default();
        store.finish_load(Ok(vec![game(1, "Okami", "PS2")])).unwrap();
        let form = GameForm::edit(&game(1, "Okami HD", "PS4"));
        let payload = form.to_payload().unwrap();
        store.form = Some(form.clone());
        let before = store.generation();

        assert!(store.begin_save());
        let err = store.finish_save(save_game(&backend, Some(1), &payload)).unwrap_err();
        assert_eq!(err.user_message(), "A game with that title already exists");
        assert_eq!(store.form, Some(form));
        assert_eq!(store.get(1).map(|g| g.title.as_str()), Some("Okami"));
        assert_eq!(store.generation(), before);
        assert!(!store.is_saving());
    }

    #[test]
    fn delete_only_removes_what_the_server_deleted() {
        let mut okami = game(1, "Okami", "PS2");
        okami.front_cover_image = Some("okami.jpg".to_owned());
        let mut store = GamesStore::default();
        store.finish_load(Ok(vec![okami.clone(), game(2, "Ico", "PS2")])).unwrap();
        store.detail = Some(1);

        let refusing = MockBackend {
            reject_mutations: Some("Game is on a top list".to_owned()),
            ..Default::default()
        };
        let err = store.finish_delete(1, refusing.delete_game(1)).unwrap_err();
        assert_eq!(err.user_message(), "Game is on a top list");
        assert_eq!(store.filtered().len(), 2);
        assert_eq!(store.detail, Some(1));

        let backend = MockBackend::default();
        let removed = store.finish_delete(1, backend.delete_game(1)).unwrap();
        assert_eq!(removed, Some(okami));
        assert_eq!(backend.calls(), vec![Call::DeleteGame(1)]);
        assert_eq!(store.filtered().len(), 1);
        assert_eq!(store.detail, None);
    }
}
