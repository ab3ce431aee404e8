//! The HTTP API this client talks to.
//!
//! Every response is `{ success, message?, ...payload }`. [`Backend`] is the seam
//! the stores are written against; [`HttpBackend`] is the real thing.

use reqwest::blocking::{Client, RequestBuilder, multipart};
use serde::de::DeserializeOwned;
use serde_json::{Value, json};

use crate::config::Config;
use crate::error::{Result, ShelfError};
use crate::model::{Completion, Game, GamePage, Id, Item, Pagination, Stats, TopKind, UploadedImage};

/// Best-effort metadata sources behind the server.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LookupKind {
    Cover,
    Price,
    Metacritic,
    Details,
}

impl LookupKind {
    fn endpoint(self) -> &'static str {
        match self {
            Self::Cover => "fetch_cover.php",
            Self::Price => "fetch_price.php",
            Self::Metacritic => "fetch_metacritic.php",
            Self::Details => "fetch_details.php",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Cover => "cover art",
            Self::Price => "price",
            Self::Metacritic => "critic score",
            Self::Details => "genre and description",
        }
    }
}

pub trait Backend: Send + Sync {
    fn list_games(&self, page: u32, per_page: u32) -> Result<GamePage>;
    fn get_game(&self, id: Id) -> Result<Game>;
    /// Returns the new record's id.
    fn create_game(&self, payload: &Value) -> Result<Id>;
    fn update_game(&self, id: Id, payload: &Value) -> Result<()>;
    fn delete_game(&self, id: Id) -> Result<()>;

    fn list_items(&self, category: Option<&str>) -> Result<Vec<Item>>;
    fn create_item(&self, payload: &Value) -> Result<Id>;
    fn update_item(&self, id: Id, payload: &Value) -> Result<()>;
    fn delete_item(&self, id: Id) -> Result<()>;

    fn list_completions(&self) -> Result<Vec<Completion>>;
    fn create_completion(&self, payload: &Value) -> Result<Id>;
    fn update_completion(&self, id: Id, payload: &Value) -> Result<()>;
    fn delete_completion(&self, id: Id) -> Result<()>;

    fn stats(&self) -> Result<Stats>;
    fn save_top(&self, kind: TopKind, ids: &[Id]) -> Result<()>;

    fn upload_image(&self, file_name: &str, bytes: Vec<u8>) -> Result<UploadedImage>;
    /// Raw bytes of an image, external URLs going through the same-origin proxy.
    fn fetch_image(&self, url: &str) -> Result<Vec<u8>>;
    /// `Ok(None)` when the source has nothing for this title.
    fn lookup(&self, kind: LookupKind, title: &str, platform: &str) -> Result<Option<Value>>;
}

pub struct HttpBackend {
    config: Config,
    http: Client,
}

impl HttpBackend {
    pub fn new(config: Config) -> Result<Self> {
        let http = Client::builder()
            .timeout(config.request_timeout())
            .build()
            .map_err(ShelfError::Network)?;
        Ok(Self { config, http })
    }

    fn get(&self, endpoint: &str, query: &[(&str, String)]) -> Result<Value> {
        let url = self.config.endpoint(endpoint);
        log::debug!("GET {url} {query:?}");
        send(self.http.get(&url).query(query))
    }

    fn post(&self, endpoint: &str, body: &Value) -> Result<Value> {
        let url = self.config.endpoint(endpoint);
        log::debug!("POST {url}");
        send(self.http.post(&url).json(body))
    }

    fn create(&self, endpoint: &str, payload: &Value) -> Result<Id> {
        let body = with_action("create", None, payload);
        let envelope = self.post(endpoint, &body)?;
        Ok(envelope.get("id").and_then(as_id).unwrap_or_default())
    }

    fn update(&self, endpoint: &str, id: Id, payload: &Value) -> Result<()> {
        self.post(endpoint, &with_action("update", Some(id), payload))
            .map(drop)
    }

    fn delete(&self, endpoint: &str, id: Id) -> Result<()> {
        self.post(endpoint, &json!({ "action": "delete", "id": id }))
            .map(drop)
    }
}

/// Sends a request and unwraps the `{ success, message }` envelope.
fn send(request: RequestBuilder) -> Result<Value> {
    let response = request.send().map_err(|err| {
        log::warn!("request failed: {err}");
        ShelfError::Network(err)
    })?;
    let body = response.text()?;
    parse_envelope(&body)
}

pub(crate) fn parse_envelope(body: &str) -> Result<Value> {
    if body.trim().is_empty() {
        return Err(ShelfError::EmptyResponse);
    }
    let value: Value = serde_json::from_str(body)?;
    let success = value.get("success").and_then(Value::as_bool).unwrap_or(false);
    if success {
        Ok(value)
    } else {
        let message = value
            .get("message")
            .and_then(Value::as_str)
            .filter(|m| !m.trim().is_empty())
            .unwrap_or("Request failed")
            .to_owned();
        log::warn!("server rejected request: {message}");
        Err(ShelfError::Rejected(message))
    }
}

fn field<T: DeserializeOwned>(envelope: &Value, name: &str) -> Result<T> {
    let value = envelope.get(name).cloned().unwrap_or(Value::Null);
    Ok(serde_json::from_value(value)?)
}

fn as_id(value: &Value) -> Option<Id> {
    value
        .as_i64()
        .or_else(|| value.as_str().and_then(|s| s.trim().parse().ok()))
}

fn with_action(action: &str, id: Option<Id>, payload: &Value) -> Value {
    let mut body = payload.clone();
    if let Some(map) = body.as_object_mut() {
        map.insert("action".to_owned(), json!(action));
        if let Some(id) = id {
            map.insert("id".to_owned(), json!(id));
        }
    }
    body
}

impl Backend for HttpBackend {
    fn list_games(&self, page: u32, per_page: u32) -> Result<GamePage> {
        let envelope = self.get(
            "games.php",
            &[
                ("action", "list".to_owned()),
                ("page", page.to_string()),
                ("per_page", per_page.to_string()),
            ],
        )?;
        Ok(GamePage {
            games: field(&envelope, "games")?,
            pagination: envelope
                .get("pagination")
                .cloned()
                .map(serde_json::from_value::<Pagination>)
                .transpose()?
                .unwrap_or_default(),
        })
    }

    fn get_game(&self, id: Id) -> Result<Game> {
        let envelope = self.get("games.php", &[("action", "get".to_owned()), ("id", id.to_string())])?;
        field(&envelope, "game")
    }

    fn create_game(&self, payload: &Value) -> Result<Id> {
        self.create("games.php", payload)
    }

    fn update_game(&self, id: Id, payload: &Value) -> Result<()> {
        self.update("games.php", id, payload)
    }

    fn delete_game(&self, id: Id) -> Result<()> {
        self.delete("games.php", id)
    }

    fn list_items(&self, category: Option<&str>) -> Result<Vec<Item>> {
        let mut query = vec![("action", "list".to_owned())];
        if let Some(category) = category {
            query.push(("category", category.to_owned()));
        }
        let envelope = self.get("items.php", &query)?;
        field(&envelope, "items")
    }

    fn create_item(&self, payload: &Value) -> Result<Id> {
        self.create("items.php", payload)
    }

    fn update_item(&self, id: Id, payload: &Value) -> Result<()> {
        self.update("items.php", id, payload)
    }

    fn delete_item(&self, id: Id) -> Result<()> {
        self.delete("items.php", id)
    }

    fn list_completions(&self) -> Result<Vec<Completion>> {
        let envelope = self.get("completions.php", &[("action", "list".to_owned())])?;
        field(&envelope, "completions")
    }

    fn create_completion(&self, payload: &Value) -> Result<Id> {
        self.create("completions.php", payload)
    }

    fn update_completion(&self, id: Id, payload: &Value) -> Result<()> {
        self.update("completions.php", id, payload)
    }

    fn delete_completion(&self, id: Id) -> Result<()> {
        self.delete("completions.php", id)
    }

    fn stats(&self) -> Result<Stats> {
        let envelope = self.get("stats.php", &[])?;
        match envelope.get("stats") {
            Some(stats) => Ok(serde_json::from_value(stats.clone())?),
            None => Ok(serde_json::from_value(envelope)?),
        }
    }

    fn save_top(&self, kind: TopKind, ids: &[Id]) -> Result<()> {
        self.post(
            "stats.php",
            &json!({ "action": "save_top", "list": kind.field(), "ids": ids }),
        )
        .map(drop)
    }

    fn upload_image(&self, file_name: &str, bytes: Vec<u8>) -> Result<UploadedImage> {
        let url = self.config.endpoint("upload.php");
        log::info!("uploading {file_name} ({} bytes)", bytes.len());
        let part = multipart::Part::bytes(bytes).file_name(file_name.to_owned());
        let form = multipart::Form::new().part("image", part);
        let envelope = send(self.http.post(&url).multipart(form))?;
        Ok(serde_json::from_value(envelope)?)
    }

    fn fetch_image(&self, url: &str) -> Result<Vec<u8>> {
        log::debug!("GET image {url}");
        let response = self.http.get(url).send()?.error_for_status()?;
        Ok(response.bytes()?.to_vec())
    }

    fn lookup(&self, kind: LookupKind, title: &str, platform: &str) -> Result<Option<Value>> {
        let query = [("title", title.to_owned()), ("platform", platform.to_owned())];
        match self.get(kind.endpoint(), &query) {
            Ok(envelope) => Ok(Some(envelope)),
            Err(ShelfError::Rejected(message)) => {
                log::info!("no {} for {title:?}: {message}", kind.label());
                Ok(None)
            }
            Err(err) => Err(err),
        }
    }
}
