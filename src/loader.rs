use crate::api::Backend;
use crate::error::Result;
use crate::model::Game;

/// Pulls every page of games, in server order.
///
/// Stops when the server says there is nothing more, when its page count is
/// reached, or after `max_pages`. A failing page fails the whole load.
pub fn load_all_games(backend: &dyn Backend, per_page: u32, max_pages: u32) -> Result<Vec<Game>> {
    let mut games = Vec::new();
    let mut page = 1;
    loop {
        let batch = backend.list_games(page, per_page).inspect_err(|err| {
            log::warn!("loading games page {page} failed: {err}");
        })?;
        log::debug!("games page {page}: {} records", batch.games.len());
        games.extend(batch.games);

        let p = batch.pagination;
        let last_reported = p.total_pages > 0 && page >= p.total_pages;
        if !p.has_more || last_reported {
            break;
        }
        if page >= max_pages {
            log::warn!("stopping after {max_pages} pages, server still reports more");
            break;
        }
        page += 1;
    }
    log::info!("loaded {} games in {page} page(s)", games.len());
    Ok(games)
}

/// Keeps a second load from starting while one is in flight.
///
/// A request that arrives while busy is remembered, so the caller can run one
/// more load after the current one finishes.
#[derive(Debug, Default)]
pub struct LoadGate {
    busy: bool,
    reload_pending: bool,
}

impl LoadGate {
    /// `false` if a load is already running; the request is then queued.
    pub fn try_begin(&mut self) -> bool {
        if self.busy {
            self.reload_pending = true;
            return false;
        }
        self.busy = true;
        true
    }

    pub fn finish(&mut self) {
        self.busy = false;
    }

    pub fn is_busy(&self) -> bool {
        self.busy
    }

    /// Whether a load was asked for while busy. Clears the flag.
    pub fn take_pending(&mut self) -> bool {
        !self.busy && std::mem::take(&mut self.reload_pending)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{Call, MockBackend, game};

    fn numbered(n: i64) -> Vec<Game> {
        (1..=n).map(|i| game(i, &format!("Game {i}"), "SNES")).collect()
    }

    #[test]
    fn five_hundred_and_one_games_take_two_pages_in_order() {
        let backend = MockBackend::with_games(numbered(501));
        let games = load_all_games(&backend, 500, 100).unwrap();

        assert_eq!(
            backend.calls(),
            vec![
                Call::ListGames { page: 1, per_page: 500 },
                Call::ListGames { page: 2, per_page: 500 },
            ]
        );
        let ids: Vec<i64> = games.iter().map(|g| g.id).collect();
        assert_eq!(ids, (1..=501).collect::<Vec<_>>());
    }

    #[test]
    fn page_ceiling_stops_the_loop() {
        let backend = MockBackend::with_games(numbered(50));
        let games = load_all_games(&backend, 10, 3).unwrap();
        assert_eq!(games.len(), 30);
        assert_eq!(backend.calls().len(), 3);
    }

    #[test]
    fn a_failing_page_fails_the_load() {
        let mut backend = MockBackend::with_games(numbered(30));
        backend.failing_pages = vec![2];
        assert!(load_all_games(&backend, 10, 100).is_err());
        assert_eq!(backend.calls().len(), 2);
    }

    #[test]
    fn empty_library_is_one_request() {
        let backend = MockBackend::default();
        assert!(load_all_games(&backend, 500, 100).unwrap().is_empty());
        assert_eq!(backend.calls().len(), 1);
    }

    #[test]
    fn gate_rejects_overlapping_loads() {
        let mut gate = LoadGate::default();
        assert!(gate.try_begin());
        assert!(!gate.try_begin());
        gate.finish();
        assert!(gate.try_begin());
    }

    #[test]
    fn rejected_request_is_queued_until_the_load_finishes() {
        let mut gate = LoadGate::default();
        assert!(gate.try_begin());
        assert!(!gate.take_pending(), "nothing queued yet");
        assert!(!gate.try_begin());
        assert!(!gate.take_pending(), "still busy");
        gate.finish();
        assert!(gate.take_pending());
        assert!(!gate.take_pending(), "queued once");
    }
}
