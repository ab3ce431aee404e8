//! Records as the server sends them.
//!
//! The API is loose about types (numbers arrive as strings, booleans as `"1"`),
//! so most scalar fields go through the [`lenient`] deserialisers.

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

pub type Id = i64;

#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct Game {
    #[serde(deserialize_with = "lenient::id")]
    pub id: Id,
    #[serde(deserialize_with = "lenient::string")]
    pub title: String,
    #[serde(deserialize_with = "lenient::string")]
    pub platform: String,
    #[serde(deserialize_with = "lenient::opt_string")]
    pub genre: Option<String>,
    #[serde(deserialize_with = "lenient::opt_string")]
    pub release_date: Option<String>,
    #[serde(deserialize_with = "lenient::opt_string")]
    pub series: Option<String>,
    #[serde(deserialize_with = "lenient::opt_string")]
    pub special_edition: Option<String>,
    #[serde(deserialize_with = "lenient::opt_string")]
    pub condition: Option<String>,
    #[serde(deserialize_with = "lenient::opt_string")]
    pub description: Option<String>,
    #[serde(deserialize_with = "lenient::opt_string")]
    pub review: Option<String>,
    #[serde(deserialize_with = "lenient::opt_f64")]
    pub star_rating: Option<f64>,
    #[serde(deserialize_with = "lenient::opt_f64")]
    pub metacritic_rating: Option<f64>,
    #[serde(deserialize_with = "lenient::flag")]
    pub played: bool,
    #[serde(deserialize_with = "lenient::opt_f64")]
    pub price_paid: Option<f64>,
    #[serde(deserialize_with = "lenient::opt_f64")]
    pub pricecharting_price: Option<f64>,
    #[serde(deserialize_with = "lenient::flag")]
    pub is_physical: bool,
    #[serde(deserialize_with = "lenient::opt_string")]
    pub digital_store: Option<String>,
    #[serde(deserialize_with = "lenient::opt_string")]
    pub front_cover_image: Option<String>,
    #[serde(deserialize_with = "lenient::opt_string")]
    pub back_cover_image: Option<String>,
    pub extra_images: Vec<Attachment>,
    #[serde(deserialize_with = "lenient::opt_string")]
    pub created_at: Option<String>,
}

impl Game {
    /// PriceCharting value, else what was paid, else zero.
    pub fn market_price(&self) -> f64 {
        self.pricecharting_price.or(self.price_paid).unwrap_or(0.0)
    }

    pub fn release(&self) -> Option<NaiveDate> {
        self.release_date.as_deref().and_then(parse_date)
    }

    pub fn created(&self) -> Option<NaiveDateTime> {
        self.created_at.as_deref().and_then(parse_datetime)
    }

    pub fn has_back_cover(&self) -> bool {
        self.back_cover_image.as_deref().is_some_and(|s| !s.trim().is_empty())
    }
}

/// An extra picture attached to a game, in display order.
#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct Attachment {
    #[serde(deserialize_with = "lenient::opt_id")]
    pub id: Option<Id>,
    #[serde(alias = "file_path", alias = "path", deserialize_with = "lenient::string")]
    pub image: String,
    #[serde(alias = "label", deserialize_with = "lenient::opt_string")]
    pub caption: Option<String>,
}

/// Category value the server uses for consoles.
pub const CONSOLE_CATEGORY: &str = "Systems";

#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct Item {
    #[serde(deserialize_with = "lenient::id")]
    pub id: Id,
    #[serde(deserialize_with = "lenient::string")]
    pub title: String,
    #[serde(deserialize_with = "lenient::string")]
    pub platform: String,
    #[serde(deserialize_with = "lenient::string")]
    pub category: String,
    #[serde(deserialize_with = "lenient::opt_string")]
    pub condition: Option<String>,
    #[serde(deserialize_with = "lenient::opt_f64")]
    pub price_paid: Option<f64>,
    #[serde(deserialize_with = "lenient::opt_f64")]
    pub pricecharting_price: Option<f64>,
    #[serde(deserialize_with = "lenient::opt_string")]
    pub notes: Option<String>,
    #[serde(deserialize_with = "lenient::opt_string")]
    pub front_image: Option<String>,
    #[serde(deserialize_with = "lenient::opt_string")]
    pub back_image: Option<String>,
    #[serde(deserialize_with = "lenient::opt_string")]
    pub created_at: Option<String>,
}

impl Item {
    pub fn is_console(&self) -> bool {
        self.category.eq_ignore_ascii_case(CONSOLE_CATEGORY)
    }
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct Completion {
    #[serde(deserialize_with = "lenient::id")]
    pub id: Id,
    #[serde(deserialize_with = "lenient::string")]
    pub title: String,
    #[serde(deserialize_with = "lenient::string")]
    pub platform: String,
    #[serde(deserialize_with = "lenient::opt_string")]
    pub time_taken: Option<String>,
    #[serde(deserialize_with = "lenient::opt_string")]
    pub date_started: Option<String>,
    #[serde(deserialize_with = "lenient::opt_string")]
    pub date_completed: Option<String>,
    #[serde(deserialize_with = "lenient::opt_string")]
    pub notes: Option<String>,
    #[serde(deserialize_with = "lenient::opt_id")]
    pub game_id: Option<Id>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CompletionStatus {
    InProgress,
    Completed,
}

impl Completion {
    pub fn status(&self) -> CompletionStatus {
        if self.date_completed.is_some() {
            CompletionStatus::Completed
        } else {
            CompletionStatus::InProgress
        }
    }
}

/// One entry of a curated top list.
#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct TopEntry {
    #[serde(deserialize_with = "lenient::id")]
    pub id: Id,
    #[serde(deserialize_with = "lenient::string")]
    pub title: String,
    #[serde(deserialize_with = "lenient::string")]
    pub platform: String,
    #[serde(alias = "front_cover_image", alias = "front_image", deserialize_with = "lenient::opt_string")]
    pub image: Option<String>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Deserialize, Serialize)]
pub enum TopKind {
    Games,
    Consoles,
    Accessories,
}

impl TopKind {
    pub const ALL: [Self; 3] = [Self::Games, Self::Consoles, Self::Accessories];

    /// Field name used by the stats endpoint.
    pub fn field(self) -> &'static str {
        match self {
            Self::Games => "top_games",
            Self::Consoles => "top_consoles",
            Self::Accessories => "top_accessories",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Games => "Top games",
            Self::Consoles => "Top consoles",
            Self::Accessories => "Top accessories",
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct Stats {
    #[serde(deserialize_with = "lenient::count")]
    pub total_games: u64,
    #[serde(deserialize_with = "lenient::count")]
    pub physical_games: u64,
    #[serde(deserialize_with = "lenient::count")]
    pub digital_games: u64,
    #[serde(deserialize_with = "lenient::count")]
    pub played_games: u64,
    #[serde(deserialize_with = "lenient::count")]
    pub unplayed_games: u64,
    #[serde(deserialize_with = "lenient::count")]
    pub total_items: u64,
    #[serde(deserialize_with = "lenient::count")]
    pub total_consoles: u64,
    #[serde(deserialize_with = "lenient::count")]
    pub total_accessories: u64,
    #[serde(deserialize_with = "lenient::count")]
    pub total_completions: u64,
    #[serde(deserialize_with = "lenient::opt_f64")]
    pub total_paid: Option<f64>,
    #[serde(deserialize_with = "lenient::opt_f64")]
    pub total_value: Option<f64>,
    pub top_games: Vec<TopEntry>,
    pub top_consoles: Vec<TopEntry>,
    pub top_accessories: Vec<TopEntry>,
}

impl Stats {
    pub fn top(&self, kind: TopKind) -> &[TopEntry] {
        match kind {
            TopKind::Games => &self.top_games,
            TopKind::Consoles => &self.top_consoles,
            TopKind::Accessories => &self.top_accessories,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct Pagination {
    #[serde(deserialize_with = "lenient::flag")]
    pub has_more: bool,
    #[serde(deserialize_with = "lenient::count_u32")]
    pub total_pages: u32,
}

/// One page of the games list.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct GamePage {
    pub games: Vec<Game>,
    pub pagination: Pagination,
}

/// What the upload endpoint hands back.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct UploadedImage {
    /// Where the browser-facing copy lives.
    pub url: String,
    /// Storage-relative path to store on the record.
    pub path: String,
}

impl UploadedImage {
    /// The value a record stores: the path, or the URL when no path came back.
    pub fn stored_value(self) -> String {
        if self.path.trim().is_empty() { self.url } else { self.path }
    }
}

pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    let head = raw.get(..10).unwrap_or(raw);
    NaiveDate::parse_from_str(head, "%Y-%m-%d").ok()
}

pub fn parse_datetime(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S")
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S"))
        .ok()
        .or_else(|| parse_date(raw).and_then(|d| d.and_hms_opt(0, 0, 0)))
}

pub(crate) mod lenient {
    use serde::{Deserialize as _, Deserializer};
    use serde_json::Value;

    fn text(value: Value) -> Option<String> {
        match value {
            Value::String(s) => Some(s),
            Value::Number(n) => Some(n.to_string()),
            Value::Bool(b) => Some(b.to_string()),
            _ => None,
        }
    }

    fn number(value: &Value) -> Option<f64> {
        match value {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    pub fn string<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
        Ok(text(Value::deserialize(d)?).unwrap_or_default())
    }

    /// Blank strings count as missing.
    pub fn opt_string<'de, D: Deserializer<'de>>(d: D) -> Result<Option<String>, D::Error> {
        Ok(text(Value::deserialize(d)?).filter(|s| !s.trim().is_empty()))
    }

    pub fn opt_f64<'de, D: Deserializer<'de>>(d: D) -> Result<Option<f64>, D::Error> {
        Ok(number(&Value::deserialize(d)?))
    }

    pub fn flag<'de, D: Deserializer<'de>>(d: D) -> Result<bool, D::Error> {
        Ok(match Value::deserialize(d)? {
            Value::Bool(b) => b,
            Value::Number(n) => n.as_f64().is_some_and(|v| v != 0.0),
            Value::String(s) => matches!(
                s.trim().to_ascii_lowercase().as_str(),
                "1" | "true" | "yes" | "on"
            ),
            _ => false,
        })
    }

    pub fn opt_id<'de, D: Deserializer<'de>>(d: D) -> Result<Option<i64>, D::Error> {
        Ok(match Value::deserialize(d)? {
            Value::Number(n) => n.as_i64(),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        })
    }

    pub fn id<'de, D: Deserializer<'de>>(d: D) -> Result<i64, D::Error> {
        Ok(opt_id(d)?.unwrap_or_default())
    }

    pub fn count<'de, D: Deserializer<'de>>(d: D) -> Result<u64, D::Error> {
        Ok(number(&Value::deserialize(d)?)
            .filter(|v| *v >= 0.0)
            .map(|v| v as u64)
            .unwrap_or_default())
    }

    pub fn count_u32<'de, D: Deserializer<'de>>(d: D) -> Result<u32, D::Error> {
        Ok(u32::try_from(count(d)?).unwrap_or(u32::MAX))
    }
}
