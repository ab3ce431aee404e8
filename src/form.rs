//! Editable forms and their conversion into request bodies.

use serde_json::{Map, Value, json};

use crate::api::LookupKind;
use crate::error::{Result, ShelfError};
use crate::model::{Completion, Game, Item};

/// One image field of a form.
///
/// The value sent is, in order of preference: a typed URL, something staged in
/// this session (an upload's storage path or a split result), the stored value.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ImageSlot {
    pub url_input: String,
    pub staged: Option<String>,
    pub stored: Option<String>,
}

impl ImageSlot {
    pub fn from_stored(stored: Option<&str>) -> Self {
        Self {
            stored: stored.map(str::to_owned),
            ..Default::default()
        }
    }

    pub fn resolve(&self) -> Option<String> {
        let typed = self.url_input.trim();
        if !typed.is_empty() {
            return Some(typed.to_owned());
        }
        self.staged
            .clone()
            .or_else(|| self.stored.clone())
            .filter(|s| !s.trim().is_empty())
    }

    pub fn stage(&mut self, value: String) {
        self.url_input.clear();
        self.staged = Some(value);
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }
}

/// A numeric input with an "N/A" checkbox next to it.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct OptionalNumber {
    pub text: String,
    pub not_applicable: bool,
}

impl OptionalNumber {
    pub fn from_value(value: Option<f64>) -> Self {
        Self {
            text: value.map(format_number).unwrap_or_default(),
            not_applicable: false,
        }
    }

    /// `None` when N/A is ticked or the box is empty.
    pub fn parse(&self, label: &str) -> Result<Option<f64>> {
        if self.not_applicable {
            return Ok(None);
        }
        let raw = self.text.trim().trim_start_matches(['$', '£', '€']).replace(',', "");
        if raw.is_empty() {
            return Ok(None);
        }
        raw.parse::<f64>()
            .ok()
            .filter(|v| v.is_finite() && *v >= 0.0)
            .map(Some)
            .ok_or_else(|| ShelfError::Validation(format!("{label} must be a number")))
    }
}

fn format_number(v: f64) -> String {
    if v.fract() == 0.0 { format!("{v:.0}") } else { format!("{v:.2}") }
}

fn text(value: &str) -> Value {
    let trimmed = value.trim();
    if trimmed.is_empty() { Value::Null } else { json!(trimmed) }
}

fn required_title(title: &str) -> Result<&str> {
    let title = title.trim();
    if title.is_empty() {
        Err(ShelfError::Validation("Title is required".to_owned()))
    } else {
        Ok(title)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GameForm {
    pub id: Option<i64>,
    pub title: String,
    pub platform: String,
    pub genre: String,
    pub release_date: String,
    pub series: String,
    pub special_edition: String,
    pub condition: String,
    pub description: String,
    pub review: String,
    pub star_rating: u8,
    pub metacritic: OptionalNumber,
    pub played: bool,
    pub price_paid: OptionalNumber,
    pub pricecharting: OptionalNumber,
    pub is_physical: bool,
    pub digital_store: String,
    pub front: ImageSlot,
    pub back: ImageSlot,
}

impl Default for GameForm {
    fn default() -> Self {
        Self {
            id: None,
            title: String::new(),
            platform: String::new(),
            genre: String::new(),
            release_date: String::new(),
            series: String::new(),
            special_edition: String::new(),
            condition: String::new(),
            description: String::new(),
            review: String::new(),
            star_rating: 0,
            metacritic: OptionalNumber::default(),
            played: false,
            price_paid: OptionalNumber::default(),
            pricecharting: OptionalNumber::default(),
            is_physical: true,
            digital_store: String::new(),
            front: ImageSlot::default(),
            back: ImageSlot::default(),
        }
    }
}

impl GameForm {
    pub fn edit(game: &Game) -> Self {
        let s = |v: &Option<String>| v.clone().unwrap_or_default();
        Self {
            id: Some(game.id),
            title: game.title.clone(),
            platform: game.platform.clone(),
            genre: s(&game.genre),
            release_date: s(&game.release_date),
            series: s(&game.series),
            special_edition: s(&game.special_edition),
            condition: s(&game.condition),
            description: s(&game.description),
            review: s(&game.review),
            star_rating: game.star_rating.map_or(0, |r| r.clamp(0.0, 5.0).round() as u8),
            metacritic: OptionalNumber::from_value(game.metacritic_rating),
            played: game.played,
            price_paid: OptionalNumber::from_value(game.price_paid),
            pricecharting: OptionalNumber::from_value(game.pricecharting_price),
            is_physical: game.is_physical,
            digital_store: s(&game.digital_store),
            front: ImageSlot::from_stored(game.front_cover_image.as_deref()),
            back: ImageSlot::from_stored(game.back_cover_image.as_deref()),
        }
    }

    /// Flat JSON body for create/update. Fails before any request is made.
    pub fn to_payload(&self) -> Result<Value> {
        let title = required_title(&self.title)?;
        if !self.release_date.trim().is_empty() && crate::model::parse_date(&self.release_date).is_none() {
            return Err(ShelfError::Validation("Release date must look like YYYY-MM-DD".to_owned()));
        }
        let mut body = Map::new();
        body.insert("title".to_owned(), json!(title));
        body.insert("platform".to_owned(), text(&self.platform));
        body.insert("genre".to_owned(), text(&self.genre));
        body.insert("release_date".to_owned(), text(&self.release_date));
        body.insert("series".to_owned(), text(&self.series));
        body.insert("special_edition".to_owned(), text(&self.special_edition));
        body.insert("condition".to_owned(), text(&self.condition));
        body.insert("description".to_owned(), text(&self.description));
        body.insert("review".to_owned(), text(&self.review));
        body.insert(
            "star_rating".to_owned(),
            if self.star_rating == 0 { Value::Null } else { json!(self.star_rating.min(5)) },
        );
        body.insert("metacritic_rating".to_owned(), json!(self.metacritic.parse("Metacritic rating")?));
        body.insert("played".to_owned(), json!(u8::from(self.played)));
        body.insert("price_paid".to_owned(), json!(self.price_paid.parse("Price paid")?));
        body.insert("pricecharting_price".to_owned(), json!(self.pricecharting.parse("PriceCharting price")?));
        body.insert("is_physical".to_owned(), json!(u8::from(self.is_physical)));
        body.insert(
            "digital_store".to_owned(),
            if self.is_physical { Value::Null } else { text(&self.digital_store) },
        );
        body.insert("front_cover_image".to_owned(), json!(self.front.resolve()));
        body.insert("back_cover_image".to_owned(), json!(self.back.resolve()));
        Ok(Value::Object(body))
    }
}

/// First non-blank value among `keys`, numbers rendered as text.
fn found(value: &Value, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|k| match value.get(*k)? {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_owned()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    })
}

/// Fills the form from a lookup response. Returns `false` when nothing usable came back.
pub fn apply_lookup(form: &mut GameForm, kind: LookupKind, value: &Value) -> bool {
    match kind {
        LookupKind::Cover => found(value, &["image_url", "cover_url", "url"])
            .map(|url| form.front.url_input = url)
            .is_some(),
        LookupKind::Price => found(value, &["price", "loose_price", "pricecharting_price"])
            .map(|price| {
                form.pricecharting.text = price;
                form.pricecharting.not_applicable = false;
            })
            .is_some(),
        LookupKind::Metacritic => found(value, &["score", "metascore", "metacritic_rating"])
            .map(|score| {
                form.metacritic.text = score;
                form.metacritic.not_applicable = false;
            })
            .is_some(),
        LookupKind::Details => {
            let mut any = false;
            for (field, keys) in [
                (&mut form.genre, &["genre", "genres"][..]),
                (&mut form.description, &["description", "summary"][..]),
                (&mut form.release_date, &["release_date", "released"][..]),
            ] {
                if let Some(v) = found(value, keys) {
                    if field.trim().is_empty() {
                        *field = v;
                    }
                    any = true;
                }
            }
            any
        }
    }
}

/// The physical case a game is drawn in.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CaseStyle {
    /// Jewel-case proportions; the fallback.
    Cd,
    Dvd,
    BluRay,
    Handheld,
}

impl CaseStyle {
    pub fn for_platform(platform: &str) -> Self {
        let p = platform.trim().to_lowercase();
        let any = |names: &[&str]| names.iter().any(|n| p == *n);
        if any(&["ps3", "playstation 3", "ps4", "playstation 4", "ps5", "playstation 5", "xbox one", "xbox series x", "xbox series s", "xbox series x|s"]) {
            Self::BluRay
        } else if any(&["ps2", "playstation 2", "xbox", "xbox 360", "gamecube", "nintendo gamecube", "wii", "wii u"]) {
            Self::Dvd
        } else if any(&["switch", "nintendo switch", "ds", "nintendo ds", "3ds", "nintendo 3ds", "ps vita", "playstation vita", "psp", "game boy", "game boy color", "game boy advance", "gba"]) {
            Self::Handheld
        } else {
            Self::Cd
        }
    }

    /// Width over height of the case front.
    pub fn aspect(self) -> f32 {
        match self {
            Self::Cd => 1.0,
            Self::Dvd => 0.71,
            Self::BluRay => 0.80,
            Self::Handheld => 0.62,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ItemForm {
    pub id: Option<i64>,
    pub title: String,
    pub platform: String,
    pub category: String,
    pub condition: String,
    pub notes: String,
    pub price_paid: OptionalNumber,
    pub pricecharting: OptionalNumber,
    pub front: ImageSlot,
    pub back: ImageSlot,
}

impl Default for ItemForm {
    fn default() -> Self {
        Self {
            id: None,
            title: String::new(),
            platform: String::new(),
            category: crate::model::CONSOLE_CATEGORY.to_owned(),
            condition: String::new(),
            notes: String::new(),
            price_paid: OptionalNumber::default(),
            pricecharting: OptionalNumber::default(),
            front: ImageSlot::default(),
            back: ImageSlot::default(),
        }
    }
}

impl ItemForm {
    pub fn edit(item: &Item) -> Self {
        Self {
            id: Some(item.id),
            title: item.title.clone(),
            platform: item.platform.clone(),
            category: item.category.clone(),
            condition: item.condition.clone().unwrap_or_default(),
            notes: item.notes.clone().unwrap_or_default(),
            price_paid: OptionalNumber::from_value(item.price_paid),
            pricecharting: OptionalNumber::from_value(item.pricecharting_price),
            front: ImageSlot::from_stored(item.front_image.as_deref()),
            back: ImageSlot::from_stored(item.back_image.as_deref()),
        }
    }

    pub fn to_payload(&self) -> Result<Value> {
        let title = required_title(&self.title)?;
        Ok(json!({
            "title": title,
            "platform": text(&self.platform),
            "category": text(&self.category),
            "condition": text(&self.condition),
            "notes": text(&self.notes),
            "price_paid": self.price_paid.parse("Price paid")?,
            "pricecharting_price": self.pricecharting.parse("PriceCharting price")?,
            "front_image": self.front.resolve(),
            "back_image": self.back.resolve(),
        }))
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CompletionForm {
    pub id: Option<i64>,
    pub title: String,
    pub platform: String,
    pub time_taken: String,
    pub date_started: String,
    pub date_completed: String,
    pub notes: String,
    pub game_id: Option<i64>,
}

impl CompletionForm {
    pub fn edit(c: &Completion) -> Self {
        Self {
            id: Some(c.id),
            title: c.title.clone(),
            platform: c.platform.clone(),
            time_taken: c.time_taken.clone().unwrap_or_default(),
            date_started: c.date_started.clone().unwrap_or_default(),
            date_completed: c.date_completed.clone().unwrap_or_default(),
            notes: c.notes.clone().unwrap_or_default(),
            game_id: c.game_id,
        }
    }

    pub fn to_payload(&self) -> Result<Value> {
        let title = required_title(&self.title)?;
        for (label, date) in [("Start date", &self.date_started), ("Completion date", &self.date_completed)] {
            if !date.trim().is_empty() && crate::model::parse_date(date).is_none() {
                return Err(ShelfError::Validation(format!("{label} must look like YYYY-MM-DD")));
            }
        }
        Ok(json!({
            "title": title,
            "platform": text(&self.platform),
            "time_taken": text(&self.time_taken),
            "date_started": text(&self.date_started),
            "date_completed": text(&self.date_completed),
            "notes": text(&self.notes),
            "game_id": self.game_id,
        }))
    }
}
