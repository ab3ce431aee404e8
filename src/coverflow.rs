//! Coverflow carousel: which item sits in the middle, which face it shows,
//! and whether it advances on its own.

use std::time::{Duration, Instant};

pub const AUTOPLAY_INTERVAL: Duration = Duration::from_secs(3);

/// Items materialised on each side of the center.
pub const WINDOW_RADIUS: usize = 4;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Face {
    #[default]
    Front,
    Back,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Event {
    Prev,
    Next,
    Jump(usize),
    /// Carries whether the centered item has a back image.
    Flip { has_back: bool },
    ToggleAutoplay,
    Tick,
}

#[derive(Clone, Debug, Default)]
pub struct Coverflow {
    index: usize,
    len: usize,
    face: Face,
    autoplay_due: Option<Instant>,
}

impl Coverflow {
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn face(&self) -> Face {
        self.face
    }

    pub fn autoplay(&self) -> bool {
        self.autoplay_due.is_some()
    }

    /// When the next autoplay step is due.
    pub fn next_tick(&self) -> Option<Instant> {
        self.autoplay_due
    }

    /// Call after the filtered list changes.
    pub fn set_len(&mut self, len: usize) {
        self.len = len;
        if len == 0 {
            self.autoplay_due = None;
        }
        let clamped = self.index.min(len.saturating_sub(1));
        self.center_on(clamped);
    }

    /// Applies one transition; returns whether the center moved.
    pub fn handle(&mut self, event: Event, now: Instant) -> bool {
        if self.len == 0 {
            return false;
        }
        let before = self.index;
        match event {
            Event::Prev => self.center_on((self.index + self.len - 1) % self.len),
            Event::Next => self.center_on((self.index + 1) % self.len),
            Event::Jump(i) if i < self.len => self.center_on(i),
            Event::Jump(_) => {}
            Event::Flip { has_back } => {
                self.face = match (has_back, self.face) {
                    (true, Face::Front) => Face::Back,
                    _ => Face::Front,
                };
            }
            Event::ToggleAutoplay => {
                self.autoplay_due = match self.autoplay_due {
                    Some(_) => None,
                    None => Some(now + AUTOPLAY_INTERVAL),
                };
            }
            Event::Tick => {
                if self.autoplay_due.is_some_and(|due| now >= due) {
                    self.center_on((self.index + 1) % self.len);
                    self.autoplay_due = Some(now + AUTOPLAY_INTERVAL);
                }
            }
        }
        // Manual navigation restarts the countdown so the carousel doesn't jump right after.
        if self.index != before && !matches!(event, Event::Tick) && self.autoplay_due.is_some() {
            self.autoplay_due = Some(now + AUTOPLAY_INTERVAL);
        }
        self.index != before
    }

    /// Drops back to the front face if the center has nothing on its back.
    pub fn sync_face(&mut self, center_has_back: bool) {
        if !center_has_back {
            self.face = Face::Front;
        }
    }

    /// Turns the center back to its front, e.g. when a different item moved into it.
    pub fn show_front(&mut self) {
        self.face = Face::Front;
    }

    fn center_on(&mut self, index: usize) {
        if index != self.index {
            self.face = Face::Front;
        }
        self.index = index;
    }

    /// Signed shortest distance from the center to `i`, wrapping around.
    pub fn offset_of(&self, i: usize) -> isize {
        if self.len == 0 {
            return 0;
        }
        let len = self.len as isize;
        let d = (i as isize - self.index as isize).rem_euclid(len);
        if d > len / 2 { d - len } else { d }
    }

    /// Indices to draw around the center as `(index, offset)`, nearest last.
    ///
    /// Each index appears once even when the list is shorter than the window.
    pub fn window(&self, radius: usize) -> Vec<(usize, isize)> {
        if self.len == 0 {
            return Vec::new();
        }
        let mut out: Vec<(usize, isize)> = (0..self.len)
            .map(|i| (i, self.offset_of(i)))
            .filter(|(_, off)| off.unsigned_abs() <= radius)
            .collect();
        // Far items first so nearer ones paint over them.
        out.sort_by_key(|(_, off)| std::cmp::Reverse(off.unsigned_abs()));
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn flow(len: usize) -> Coverflow {
        let mut c = Coverflow::default();
        c.set_len(len);
        c
    }

    #[test]
    fn prev_and_next_wrap_around() {
        let now = Instant::now();
        let mut c = flow(3);
        c.handle(Event::Prev, now);
        assert_eq!(c.index(), 2);
        c.handle(Event::Next, now);
        assert_eq!(c.index(), 0);
        c.handle(Event::Jump(1), now);
        assert_eq!(c.index(), 1);
        assert!(!c.handle(Event::Jump(7), now));
        assert_eq!(c.index(), 1);
    }

    #[test]
    fn flip_needs_a_back_and_resets_on_move() {
        let now = Instant::now();
        let mut c = flow(5);
        c.handle(Event::Flip { has_back: false }, now);
        assert_eq!(c.face(), Face::Front);
        c.handle(Event::Flip { has_back: true }, now);
        assert_eq!(c.face(), Face::Back);
        c.handle(Event::Next, now);
        assert_eq!(c.face(), Face::Front);

        c.handle(Event::Flip { has_back: true }, now);
        c.sync_face(false);
        assert_eq!(c.face(), Face::Front);
    }

    #[test]
    fn autoplay_advances_on_interval() {
        let start = Instant::now();
        let mut c = flow(4);
        c.handle(Event::ToggleAutoplay, start);
        assert!(!c.handle(Event::Tick, start + Duration::from_secs(1)));
        assert!(c.handle(Event::Tick, start + AUTOPLAY_INTERVAL));
        assert_eq!(c.index(), 1);
        c.handle(Event::ToggleAutoplay, start);
        assert!(!c.handle(Event::Tick, start + AUTOPLAY_INTERVAL * 10));
    }

    #[test]
    fn offsets_take_the_short_way_round() {
        let mut c = flow(10);
        c.handle(Event::Jump(1), Instant::now());
        assert_eq!(c.offset_of(1), 0);
        assert_eq!(c.offset_of(3), 2);
        assert_eq!(c.offset_of(9), -2);
        assert_eq!(c.offset_of(6), 5);
    }

    #[test]
    fn window_is_bounded_and_unique() {
        let c = flow(100);
        let w = c.window(WINDOW_RADIUS);
        assert_eq!(w.len(), 2 * WINDOW_RADIUS + 1);
        assert_eq!(w.last(), Some(&(0, 0)));

        let small = flow(3);
        let mut idx: Vec<usize> = small.window(WINDOW_RADIUS).into_iter().map(|(i, _)| i).collect();
        idx.sort_unstable();
        assert_eq!(idx, vec![0, 1, 2]);
    }

    #[test]
    fn shrinking_clamps_the_center() {
        let mut c = flow(10);
        c.handle(Event::Jump(8), Instant::now());
        c.set_len(4);
        assert_eq!(c.index(), 3);
        c.set_len(0);
        assert!(!c.handle(Event::Next, Instant::now()));
    }
}
