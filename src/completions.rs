//! Playthrough tracking, optionally linked to a game in the collection.

use std::time::{Duration, Instant};

use serde_json::Value;

use crate::api::Backend;
use crate::error::{Result, ShelfError};
use crate::form::CompletionForm;
use crate::loader::LoadGate;
use crate::model::{Completion, CompletionStatus, Game, Id};

pub const SEARCH_DEBOUNCE: Duration = Duration::from_millis(300);
pub const MAX_MATCHES: usize = 10;

/// Fires once, `delay` after the last touch.
#[derive(Clone, Debug)]
pub struct Debouncer {
    delay: Duration,
    due: Option<Instant>,
}

impl Debouncer {
    pub fn new(delay: Duration) -> Self {
        Self { delay, due: None }
    }

    /// Re-arms the timer, replacing any pending deadline.
    pub fn touch(&mut self, now: Instant) {
        self.due = Some(now + self.delay);
    }

    pub fn fire(&mut self, now: Instant) -> bool {
        match self.due {
            Some(due) if now >= due => {
                self.due = None;
                true
            }
            _ => false,
        }
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.due
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GameRef {
    pub id: Id,
    pub title: String,
    pub platform: String,
}

impl From<&Game> for GameRef {
    fn from(game: &Game) -> Self {
        Self {
            id: game.id,
            title: game.title.clone(),
            platform: game.platform.clone(),
        }
    }
}

/// Linear scan for titles containing `query`, case-insensitive.
pub fn search_games<'a>(games: &'a [Game], query: &str) -> Vec<&'a Game> {
    let needle = query.trim().to_lowercase();
    if needle.is_empty() {
        return Vec::new();
    }
    games
        .iter()
        .filter(|g| g.title.to_lowercase().contains(&needle))
        .take(MAX_MATCHES)
        .collect()
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Disambiguation {
    pub candidates: Vec<GameRef>,
}

impl Disambiguation {
    /// Numbered list shown to the user, starting at 1.
    pub fn prompt(&self) -> String {
        let mut out = String::from("Several games match. Enter a number (0 for none):");
        for (n, c) in self.candidates.iter().enumerate() {
            out.push_str(&format!("\n{}. {} ({})", n + 1, c.title, c.platform));
        }
        out
    }

    /// `Ok(None)` for `0` or a blank answer.
    pub fn choose(&self, input: &str) -> Result<Option<GameRef>> {
        let input = input.trim();
        if input.is_empty() || input == "0" {
            return Ok(None);
        }
        input
            .parse::<usize>()
            .ok()
            .and_then(|n| n.checked_sub(1))
            .and_then(|i| self.candidates.get(i))
            .cloned()
            .map(Some)
            .ok_or_else(|| {
                ShelfError::Validation(format!(
                    "Please enter a number between 0 and {}",
                    self.candidates.len()
                ))
            })
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LinkResolution {
    NoMatch,
    Unique(GameRef),
    Ambiguous(Disambiguation),
}

/// Finds the game a completion title refers to.
///
/// An exact title (ignoring case) wins; otherwise a lone substring match does.
pub fn resolve_link(games: &[Game], title: &str) -> LinkResolution {
    let wanted = title.trim().to_lowercase();
    if wanted.is_empty() {
        return LinkResolution::NoMatch;
    }
    let exact: Vec<&Game> = games
        .iter()
        .filter(|g| g.title.trim().to_lowercase() == wanted)
        .collect();
    let pool = if exact.is_empty() { search_games(games, title) } else { exact };
    match pool.as_slice() {
        [] => LinkResolution::NoMatch,
        [one] => LinkResolution::Unique(GameRef::from(*one)),
        many => LinkResolution::Ambiguous(Disambiguation {
            candidates: many.iter().map(|g| GameRef::from(*g)).collect(),
        }),
    }
}

/// The "link to a game" box of the completion form.
#[derive(Clone, Debug)]
pub struct GameLinker {
    pub query: String,
    debounce: Debouncer,
    matches: Vec<GameRef>,
}

impl Default for GameLinker {
    fn default() -> Self {
        Self {
            query: String::new(),
            debounce: Debouncer::new(SEARCH_DEBOUNCE),
            matches: Vec::new(),
        }
    }
}

impl GameLinker {
    pub fn edited(&mut self, now: Instant) {
        self.debounce.touch(now);
    }

    /// Runs the search once typing has paused. Returns whether matches changed.
    pub fn poll(&mut self, now: Instant, games: &[Game]) -> bool {
        if !self.debounce.fire(now) {
            return false;
        }
        self.matches = search_games(games, &self.query).into_iter().map(GameRef::from).collect();
        true
    }

    pub fn matches(&self) -> &[GameRef] {
        &self.matches
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.debounce.deadline()
    }

    pub fn clear(&mut self) {
        self.query.clear();
        self.matches.clear();
    }
}

/// An open completion form plus its linking helpers.
#[derive(Clone, Debug, Default)]
pub struct CompletionEditor {
    pub form: CompletionForm,
    pub linker: GameLinker,
    pub linked_title: Option<String>,
    pub disambiguation: Option<Disambiguation>,
    pub answer: String,
}

impl CompletionEditor {
    pub fn new(form: CompletionForm, games: &[Game]) -> Self {
        let linked_title = form
            .game_id
            .and_then(|id| games.iter().find(|g| g.id == id))
            .map(|g| g.title.clone());
        Self { form, linked_title, ..Default::default() }
    }

    pub fn link(&mut self, game: &GameRef) {
        self.form.game_id = Some(game.id);
        if self.form.title.trim().is_empty() {
            self.form.title = game.title.clone();
        }
        if self.form.platform.trim().is_empty() {
            self.form.platform = game.platform.clone();
        }
        self.linked_title = Some(game.title.clone());
        self.disambiguation = None;
        self.linker.clear();
    }

    pub fn unlink(&mut self) {
        self.form.game_id = None;
        self.linked_title = None;
    }

    /// Tries to link from the form's title. Leaves a disambiguation open when needed.
    pub fn auto_link(&mut self, games: &[Game]) -> LinkResolution {
        let resolution = resolve_link(games, &self.form.title);
        match &resolution {
            LinkResolution::Unique(game) => self.link(game),
            LinkResolution::Ambiguous(d) => {
                self.answer.clear();
                self.disambiguation = Some(d.clone());
            }
            LinkResolution::NoMatch => {}
        }
        resolution
    }

    /// Applies the typed answer to an open disambiguation.
    pub fn answer_disambiguation(&mut self) -> Result<()> {
        let Some(d) = &self.disambiguation else { return Ok(()) };
        match d.choose(&self.answer)? {
            Some(game) => self.link(&game),
            None => self.disambiguation = None,
        }
        Ok(())
    }
}

/// Creates the completion when `id` is `None`, updates it otherwise.
pub fn save_completion(backend: &dyn Backend, id: Option<Id>, payload: &Value) -> Result<()> {
    match id {
        Some(id) => backend.update_completion(id, payload),
        None => backend
            .create_completion(payload)
            .map(|id| log::info!("created completion {id}")),
    }
}

#[derive(Debug, Default)]
pub struct CompletionsStore {
    completions: Vec<Completion>,
    pub gate: LoadGate,
    pub editor: Option<CompletionEditor>,
    saving: bool,
    loaded: bool,
}

impl CompletionsStore {
    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    pub fn finish_load(&mut self, result: Result<Vec<Completion>>) -> Result<()> {
        self.gate.finish();
        self.completions = result?;
        self.loaded = true;
        Ok(())
    }

    /// In-progress runs first, then the most recently completed.
    pub fn ordered(&self) -> Vec<&Completion> {
        let mut out: Vec<&Completion> = self.completions.iter().collect();
        out.sort_by(|a, b| match (a.status(), b.status()) {
            (CompletionStatus::InProgress, CompletionStatus::Completed) => std::cmp::Ordering::Less,
            (CompletionStatus::Completed, CompletionStatus::InProgress) => std::cmp::Ordering::Greater,
            _ => b.date_completed.cmp(&a.date_completed),
        });
        out
    }

    pub fn get(&self, id: Id) -> Option<&Completion> {
        self.completions.iter().find(|c| c.id == id)
    }

    pub fn remove(&mut self, id: Id) {
        self.completions.retain(|c| c.id != id);
    }

    pub fn is_saving(&self) -> bool {
        self.saving
    }

    /// `false` while an earlier save is still in flight.
    pub fn begin_save(&mut self) -> bool {
        !std::mem::replace(&mut self.saving, true)
    }

    /// Closes the editor on success; a rejected save leaves it open as typed.
    pub fn finish_save(&mut self, result: Result<()>) -> Result<()> {
        self.saving = false;
        result?;
        self.editor = None;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{Call, MockBackend, game};
    use serde_json::json;

    fn library() -> Vec<Game> {
        vec![
            game(1, "Final Fantasy VII", "PS1"),
            game(2, "Final Fantasy VI", "SNES"),
            game(3, "Crisis Core: Final Fantasy VII", "PSP"),
            game(4, "Hades", "Switch"),
        ]
    }

    #[test]
    fn debouncer_fires_once_after_the_last_touch() {
        let t0 = Instant::now();
        let mut d = Debouncer::new(SEARCH_DEBOUNCE);
        d.touch(t0);
        d.touch(t0 + Duration::from_millis(200));
        assert!(!d.fire(t0 + Duration::from_millis(400)));
        assert!(d.fire(t0 + Duration::from_millis(500)));
        assert!(!d.fire(t0 + Duration::from_secs(5)));
    }

    #[test]
    fn search_is_case_insensitive_and_capped() {
        let games = library();
        let hits: Vec<Id> = search_games(&games, "final FANTASY vii").iter().map(|g| g.id).collect();
        assert_eq!(hits, vec![1, 3]);
        let many: Vec<Game> = (0..30).map(|i| game(i, "Tetris", "GB")).collect();
        assert_eq!(search_games(&many, "tet").len(), MAX_MATCHES);
        assert!(search_games(&games, "  ").is_empty());
    }

    #[test]
    fn exact_title_beats_substring_matches() {
        let games = library();
        assert_eq!(
            resolve_link(&games, "final fantasy vii"),
            LinkResolution::Unique(GameRef::from(&games[0]))
        );
        assert_eq!(resolve_link(&games, "hades"), LinkResolution::Unique(GameRef::from(&games[3])));
        assert_eq!(resolve_link(&games, "Zelda"), LinkResolution::NoMatch);
        let LinkResolution::Ambiguous(d) = resolve_link(&games, "Final Fantasy") else {
            panic!("expected several candidates");
        };
        assert_eq!(d.candidates.len(), 3);
        assert!(d.prompt().contains("2. Final Fantasy VI (SNES)"));
    }

    #[test]
    fn numeric_selection() {
        let games = library();
        let d = Disambiguation { candidates: games.iter().take(2).map(GameRef::from).collect() };
        assert_eq!(d.choose(" 2 ").unwrap().map(|g| g.id), Some(2));
        assert_eq!(d.choose("0").unwrap(), None);
        assert_eq!(d.choose("").unwrap(), None);
        assert!(d.choose("3").is_err());
        assert!(d.choose("two").is_err());
    }

    #[test]
    fn editor_links_after_disambiguation() {
        let games = library();
        let mut editor = CompletionEditor::new(
            CompletionForm { title: "Final Fantasy".to_owned(), ..Default::default() },
            &games,
        );
        assert!(matches!(editor.auto_link(&games), LinkResolution::Ambiguous(_)));
        editor.answer = "9".to_owned();
        assert!(editor.answer_disambiguation().is_err());
        assert!(editor.disambiguation.is_some());
        editor.answer = "1".to_owned();
        editor.answer_disambiguation().unwrap();
        assert_eq!(editor.form.game_id, Some(1));
        assert_eq!(editor.form.platform, "PS1");
        assert!(editor.disambiguation.is_none());
    }

    #[test]
    fn linker_searches_only_after_the_pause() {
        let games = library();
        let t0 = Instant::now();
        let mut linker = GameLinker { query: "hades".to_owned(), ..Default::default() };
        linker.edited(t0);
        assert!(!linker.poll(t0, &games));
        assert!(linker.poll(t0 + SEARCH_DEBOUNCE, &games));
        assert_eq!(linker.matches().len(), 1);
    }

    #[test]
    fn in_progress_runs_come_first() {
        let mut store = CompletionsStore::default();
        let done = |id, date: &str| Completion {
            id,
            date_completed: Some(date.to_owned()),
            ..Default::default()
        };
        store
            .finish_load(Ok(vec![
                done(1, "2023-01-01"),
                Completion { id: 2, ..Default::default() },
                done(3, "2024-06-01"),
            ]))
            .unwrap();
        let ids: Vec<Id> = store.ordered().iter().map(|c| c.id).collect();
        assert_eq!(ids, vec![2, 3, 1]);
    }

    #[test]
    fn linked_completion_is_sent_with_its_game() {
        let games = library();
        let backend = MockBackend::default();
        let mut editor = CompletionEditor::new(
            CompletionForm { title: "Hades".to_owned(), ..Default::default() },
            &games,
        );
        editor.auto_link(&games);
        let payload = editor.form.to_payload().unwrap();
        let mut store = CompletionsStore { editor: Some(editor), ..Default::default() };

        assert!(store.begin_save());
        store.finish_save(save_completion(&backend, None, &payload)).unwrap();
        assert!(store.editor.is_none());
        let calls = backend.calls();
        let [Call::CreateCompletion(body)] = calls.as_slice() else {
            panic!("expected one create call");
        };
        assert_eq!(body["game_id"], 4);
        assert_eq!(body["platform"], "Switch");
    }

    #[test]
    fn rejected_save_keeps_the_editor_and_list() {
        let backend = MockBackend {
            reject_mutations: Some("Date completed is invalid".to_owned()),
            ..Default::default()
        };
        let form = CompletionForm { title: "Hades".to_owned(), date_completed: "soon".to_owned(), ..Default::default() };
        let mut store = CompletionsStore {
            editor: Some(CompletionEditor::new(form.clone(), &[])),
            ..Default::default()
        };
        store.finish_load(Ok(vec![Completion { id: 1, ..Default::default() }])).unwrap();

        assert!(store.begin_save());
        assert!(!store.begin_save());
        let err = store
            .finish_save(save_completion(&backend, None, &json!({ "title": "Hades" })))
            .unwrap_err();
        assert_eq!(err.user_message(), "Date completed is invalid");
        assert_eq!(store.editor.as_ref().map(|e| &e.form), Some(&form));
        assert_eq!(store.ordered().len(), 1);
    }
}
