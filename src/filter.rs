//! Client-side filtering and sorting of the in-memory games list.

use std::cmp::Ordering;

use crate::model::Game;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Deserialize, serde::Serialize)]
pub enum FormatFilter {
    #[default]
    Any,
    Physical,
    Digital,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Deserialize, serde::Serialize)]
pub enum PlayedFilter {
    #[default]
    Any,
    Played,
    Unplayed,
}

/// Current filter widget values. Persisted between runs.
#[derive(Clone, Debug, Default, PartialEq, Eq, serde::Deserialize, serde::Serialize)]
#[serde(default)]
pub struct GameFilter {
    pub search: String,
    pub platform: Option<String>,
    pub genre: Option<String>,
    pub format: FormatFilter,
    pub played: PlayedFilter,
}

impl GameFilter {
    pub fn matches(&self, game: &Game) -> bool {
        self.matches_search(game)
            && self.platform.as_ref().is_none_or(|p| game.platform == *p)
            && self
                .genre
                .as_ref()
                .is_none_or(|g| game.genre.as_deref() == Some(g.as_str()))
            && match self.format {
                FormatFilter::Any => true,
                FormatFilter::Physical => game.is_physical,
                FormatFilter::Digital => !game.is_physical,
            }
            && match self.played {
                PlayedFilter::Any => true,
                PlayedFilter::Played => game.played,
                PlayedFilter::Unplayed => !game.played,
            }
    }

    fn matches_search(&self, game: &Game) -> bool {
        let needle = self.search.trim().to_lowercase();
        if needle.is_empty() {
            return true;
        }
        [Some(game.title.as_str()), Some(game.platform.as_str()), game.series.as_deref()]
            .into_iter()
            .flatten()
            .any(|hay| hay.to_lowercase().contains(&needle))
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Deserialize, serde::Serialize)]
pub enum SortKey {
    CreatedAsc,
    #[default]
    CreatedDesc,
    TitleAsc,
    TitleDesc,
    PriceAsc,
    PriceDesc,
    RatingAsc,
    RatingDesc,
    ReleaseAsc,
    ReleaseDesc,
}

impl SortKey {
    pub const ALL: [Self; 10] = [
        Self::CreatedDesc,
        Self::CreatedAsc,
        Self::TitleAsc,
        Self::TitleDesc,
        Self::PriceAsc,
        Self::PriceDesc,
        Self::RatingDesc,
        Self::RatingAsc,
        Self::ReleaseDesc,
        Self::ReleaseAsc,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Self::CreatedAsc => "Oldest added",
            Self::CreatedDesc => "Newest added",
            Self::TitleAsc => "Title A-Z",
            Self::TitleDesc => "Title Z-A",
            Self::PriceAsc => "Price: low to high",
            Self::PriceDesc => "Price: high to low",
            Self::RatingAsc => "Rating: low to high",
            Self::RatingDesc => "Rating: high to low",
            Self::ReleaseAsc => "Release: oldest",
            Self::ReleaseDesc => "Release: newest",
        }
    }

    fn compare(self, a: &Game, b: &Game) -> Ordering {
        match self {
            Self::CreatedAsc => a.created().cmp(&b.created()),
            Self::CreatedDesc => b.created().cmp(&a.created()),
            Self::TitleAsc => collate(&a.title, &b.title),
            Self::TitleDesc => collate(&b.title, &a.title),
            Self::PriceAsc => a.market_price().total_cmp(&b.market_price()),
            Self::PriceDesc => b.market_price().total_cmp(&a.market_price()),
            Self::RatingAsc => rating(a).total_cmp(&rating(b)),
            Self::RatingDesc => rating(b).total_cmp(&rating(a)),
            Self::ReleaseAsc => undated_last(a, b, |x, y| x.cmp(&y)),
            Self::ReleaseDesc => undated_last(a, b, |x, y| y.cmp(&x)),
        }
    }
}

fn rating(game: &Game) -> f64 {
    game.star_rating.unwrap_or(0.0)
}

/// Case-insensitive first, exact text as a tie-break so the order is total.
fn collate(a: &str, b: &str) -> Ordering {
    a.to_lowercase().cmp(&b.to_lowercase()).then_with(|| a.cmp(b))
}

/// Undated games go after every dated one whatever the direction.
fn undated_last(
    a: &Game,
    b: &Game,
    dated: impl Fn(chrono::NaiveDate, chrono::NaiveDate) -> Ordering,
) -> Ordering {
    match (a.release(), b.release()) {
        (Some(x), Some(y)) => dated(x, y),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// Filtered, sorted copy of `games`. The input is left untouched.
pub fn apply(games: &[Game], filter: &GameFilter, sort: SortKey) -> Vec<Game> {
    let mut out: Vec<Game> = games.iter().filter(|g| filter.matches(g)).cloned().collect();
    // `sort_by` is stable, equal keys keep server order.
    out.sort_by(|a, b| sort.compare(a, b));
    out
}

/// Distinct non-empty platforms, sorted.
pub fn platforms(games: &[Game]) -> Vec<String> {
    distinct(games.iter().map(|g| g.platform.as_str()))
}

/// Distinct genres, sorted.
pub fn genres(games: &[Game]) -> Vec<String> {
    distinct(games.iter().filter_map(|g| g.genre.as_deref()))
}

fn distinct<'a>(values: impl Iterator<Item = &'a str>) -> Vec<String> {
    let set: std::collections::BTreeSet<&str> =
        values.map(str::trim).filter(|v| !v.is_empty()).collect();
    set.into_iter().map(str::to_owned).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn game(id: i64, title: &str, platform: &str) -> Game {
        Game {
            id,
            title: title.to_owned(),
            platform: platform.to_owned(),
            is_physical: true,
            ..Default::default()
        }
    }

    fn ids(games: &[Game]) -> Vec<i64> {
        games.iter().map(|g| g.id).collect()
    }

    fn library() -> Vec<Game> {
        let mut a = game(1, "Chrono Trigger", "SNES");
        a.genre = Some("RPG".to_owned());
        a.played = true;
        let mut b = game(2, "Super Metroid", "SNES");
        b.genre = Some("Action".to_owned());
        let mut c = game(3, "Chrono Cross", "PS1");
        c.genre = Some("RPG".to_owned());
        c.is_physical = false;
        let mut d = game(4, "Metroid Prime", "GameCube");
        d.series = Some("Metroid".to_owned());
        d.played = true;
        vec![a, b, c, d]
    }

    #[test]
    fn every_result_satisfies_every_active_predicate() {
        let games = library();
        let platforms = [None, Some("SNES"), Some("PS1")];
        let genres = [None, Some("RPG"), Some("Action")];
        let searches = ["", "chrono", "METROID", "zelda"];
        let formats = [FormatFilter::Any, FormatFilter::Physical, FormatFilter::Digital];
        let played = [PlayedFilter::Any, PlayedFilter::Played, PlayedFilter::Unplayed];

        for p in platforms {
            for g in genres {
                for s in searches {
                    for f in formats {
                        for pl in played {
                            let filter = GameFilter {
                                search: s.to_owned(),
                                platform: p.map(str::to_owned),
                                genre: g.map(str::to_owned),
                                format: f,
                                played: pl,
                            };
                            let out = apply(&games, &filter, SortKey::TitleAsc);
                            let expected =
                                games.iter().filter(|x| filter.matches(x)).count();
                            assert_eq!(out.len(), expected, "{filter:?}");
                            for hit in &out {
                                assert!(games.contains(hit), "result must come from the input");
                                assert!(filter.matches(hit), "{filter:?} let {} through", hit.title);
                            }
                        }
                    }
                }
            }
        }
    }

    #[test]
    fn search_is_case_insensitive_substring_over_series_too() {
        let games = library();
        let filter = GameFilter { search: "metroid".to_owned(), ..Default::default() };
        assert_eq!(ids(&apply(&games, &filter, SortKey::TitleAsc)), vec![4, 2]);
    }

    #[test]
    fn source_is_not_mutated() {
        let games = library();
        let before = games.clone();
        let _ = apply(&games, &GameFilter::default(), SortKey::TitleDesc);
        assert_eq!(games, before);
    }

    #[test]
    fn price_falls_back_to_price_paid_then_zero() {
        let mut a = game(1, "A", "SNES");
        a.price_paid = Some(30.0);
        let mut b = game(2, "B", "SNES");
        b.pricecharting_price = Some(10.0);
        b.price_paid = Some(100.0);
        let c = game(3, "C", "SNES");
        let mut d = game(4, "D", "SNES");
        d.pricecharting_price = Some(30.0);
        let games = vec![a, b, c, d];

        let asc = apply(&games, &GameFilter::default(), SortKey::PriceAsc);
        // 1 and 4 tie at 30 and keep input order.
        assert_eq!(ids(&asc), vec![3, 2, 1, 4]);
        let desc = apply(&games, &GameFilter::default(), SortKey::PriceDesc);
        assert_eq!(ids(&desc), vec![1, 4, 2, 3]);
    }

    #[test]
    fn undated_games_sort_last_in_both_directions() {
        let mut a = game(1, "A", "SNES");
        a.release_date = Some("1995-03-11".to_owned());
        let b = game(2, "B", "SNES");
        let mut c = game(3, "C", "SNES");
        c.release_date = Some("1994-04-18".to_owned());
        let mut d = game(4, "D", "SNES");
        d.release_date = Some("not a date".to_owned());
        let games = vec![b, a, d, c];

        let asc = apply(&games, &GameFilter::default(), SortKey::ReleaseAsc);
        assert_eq!(ids(&asc), vec![3, 1, 2, 4]);
        let desc = apply(&games, &GameFilter::default(), SortKey::ReleaseDesc);
        assert_eq!(ids(&desc), vec![1, 3, 2, 4]);
    }

    #[test]
    fn title_and_created_sorts() {
        let mut a = game(1, "banjo-Kazooie", "N64");
        a.created_at = Some("2024-01-02 00:00:00".to_owned());
        let mut b = game(2, "Abe's Oddysee", "PS1");
        b.created_at = Some("2024-03-01 12:00:00".to_owned());
        let mut c = game(3, "Castlevania", "NES");
        c.created_at = Some("2023-12-31 23:59:59".to_owned());
        let games = vec![a, b, c];

        assert_eq!(ids(&apply(&games, &GameFilter::default(), SortKey::TitleAsc)), vec![2, 1, 3]);
        assert_eq!(ids(&apply(&games, &GameFilter::default(), SortKey::TitleDesc)), vec![3, 1, 2]);
        assert_eq!(ids(&apply(&games, &GameFilter::default(), SortKey::CreatedDesc)), vec![2, 1, 3]);
        assert_eq!(ids(&apply(&games, &GameFilter::default(), SortKey::CreatedAsc)), vec![3, 1, 2]);
    }

    #[test]
    fn distinct_platforms_are_sorted() {
        assert_eq!(platforms(&library()), vec!["GameCube", "PS1", "SNES"]);
        assert_eq!(genres(&library()), vec!["Action", "RPG"]);
    }
}
