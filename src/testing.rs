//! In-memory backend that records what was asked of it.

use std::sync::Mutex;

use serde_json::Value;

use crate::api::{Backend, LookupKind};
use crate::error::{Result, ShelfError};
use crate::model::{Completion, Game, GamePage, Id, Item, Pagination, Stats, TopKind, UploadedImage};

#[derive(Clone, Debug, PartialEq)]
pub enum Call {
    ListGames { page: u32, per_page: u32 },
    CreateGame(Value),
    UpdateGame(Id, Value),
    DeleteGame(Id),
    ListItems(Option<String>),
    CreateItem(Value),
    CreateCompletion(Value),
    SaveTop(TopKind, Vec<Id>),
    Upload(String),
    FetchImage(String),
    Lookup(LookupKind),
}

#[derive(Default)]
pub struct MockBackend {
    pub games: Vec<Game>,
    pub items: Vec<Item>,
    pub completions: Vec<Completion>,
    pub stats: Stats,
    /// Pages (1-based) that answer with a server error.
    pub failing_pages: Vec<u32>,
    pub reject_mutations: Option<String>,
    pub images: Vec<(String, Vec<u8>)>,
    /// What each lookup source answers; anything missing finds nothing.
    pub lookups: Vec<(LookupKind, Value)>,
    pub calls: Mutex<Vec<Call>>,
}

impl MockBackend {
    pub fn with_games(games: Vec<Game>) -> Self {
        Self { games, ..Default::default() }
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    fn record(&self, call: Call) {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(call);
        }
    }

    fn mutation(&self) -> Result<()> {
        match &self.reject_mutations {
            Some(msg) => Err(ShelfError::Rejected(msg.clone())),
            None => Ok(()),
        }
    }
}

impl Backend for MockBackend {
    fn list_games(&self, page: u32, per_page: u32) -> Result<GamePage> {
        self.record(Call::ListGames { page, per_page });
        if self.failing_pages.contains(&page) {
            return Err(ShelfError::EmptyResponse);
        }
        let per_page = per_page.max(1) as usize;
        let start = (page.saturating_sub(1) as usize) * per_page;
        let games: Vec<Game> = self.games.iter().skip(start).take(per_page).cloned().collect();
        let total_pages = self.games.len().div_ceil(per_page).max(1) as u32;
        Ok(GamePage {
            games,
            pagination: Pagination { has_more: page < total_pages, total_pages },
        })
    }

    fn get_game(&self, id: Id) -> Result<Game> {
        self.games
            .iter()
            .find(|g| g.id == id)
            .cloned()
            .ok_or_else(|| ShelfError::Rejected("Game not found".to_owned()))
    }

    fn create_game(&self, payload: &Value) -> Result<Id> {
        self.record(Call::CreateGame(payload.clone()));
        self.mutation()?;
        Ok(self.games.len() as Id + 1)
    }

    fn update_game(&self, id: Id, payload: &Value) -> Result<()> {
        self.record(Call::UpdateGame(id, payload.clone()));
        self.mutation()
    }

    fn delete_game(&self, id: Id) -> Result<()> {
        self.record(Call::DeleteGame(id));
        self.mutation()
    }

    fn list_items(&self, category: Option<&str>) -> Result<Vec<Item>> {
        self.record(Call::ListItems(category.map(str::to_owned)));
        Ok(self
            .items
            .iter()
            .filter(|i| category.is_none_or(|c| i.category == c))
            .cloned()
            .collect())
    }

    fn create_item(&self, payload: &Value) -> Result<Id> {
        self.record(Call::CreateItem(payload.clone()));
        self.mutation()?;
        Ok(self.items.len() as Id + 1)
    }

    fn update_item(&self, _id: Id, _payload: &Value) -> Result<()> {
        self.mutation()
    }

    fn delete_item(&self, _id: Id) -> Result<()> {
        self.mutation()
    }

    fn list_completions(&self) -> Result<Vec<Completion>> {
        Ok(self.completions.clone())
    }

    fn create_completion(&self, payload: &Value) -> Result<Id> {
        self.record(Call::CreateCompletion(payload.clone()));
        self.mutation()?;
        Ok(self.completions.len() as Id + 1)
    }

    fn update_completion(&self, _id: Id, _payload: &Value) -> Result<()> {
        self.mutation()
    }

    fn delete_completion(&self, _id: Id) -> Result<()> {
        self.mutation()
    }

    fn stats(&self) -> Result<Stats> {
        Ok(self.stats.clone())
    }

    fn save_top(&self, kind: TopKind, ids: &[Id]) -> Result<()> {
        self.record(Call::SaveTop(kind, ids.to_vec()));
        self.mutation()
    }

    fn upload_image(&self, file_name: &str, _bytes: Vec<u8>) -> Result<UploadedImage> {
        self.record(Call::Upload(file_name.to_owned()));
        Ok(UploadedImage {
            url: format!("http://localhost/uploads/{file_name}"),
            path: file_name.to_owned(),
        })
    }

    fn fetch_image(&self, url: &str) -> Result<Vec<u8>> {
        self.record(Call::FetchImage(url.to_owned()));
        self.images
            .iter()
            .find(|(u, _)| u == url)
            .map(|(_, bytes)| bytes.clone())
            .ok_or_else(|| ShelfError::Rejected(format!("no image at {url}")))
    }

    fn lookup(&self, kind: LookupKind, _title: &str, _platform: &str) -> Result<Option<Value>> {
        self.record(Call::Lookup(kind));
        Ok(self.lookups.iter().find(|(k, _)| *k == kind).map(|(_, v)| v.clone()))
    }
}

/// A game with just the fields most tests care about.
pub fn game(id: Id, title: &str, platform: &str) -> Game {
    Game {
        id,
        title: title.to_owned(),
        platform: platform.to_owned(),
        is_physical: true,
        ..Default::default()
    }
}
