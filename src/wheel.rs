//! The spin wheel: pick a platform when the list is long, then a game.
//!
//! Angles are in degrees, measured clockwise on screen from the positive x
//! axis (y grows downward). Segment `i` covers wheel-local angles
//! `[i * arc, (i + 1) * arc)`; a wheel rotated by `r` draws local angle `a` at
//! screen angle `a + r`. The pointer sits at the top, [`POINTER_ANGLE`], so the
//! segment under it is the one containing local angle `POINTER_ANGLE - r`.

use std::time::{Duration, Instant};

use rand::Rng;

use crate::model::Game;

/// More candidates than this and the wheel asks for a platform first.
pub const STAGE_CEILING: usize = 50;
pub const SPIN_DURATION: Duration = Duration::from_millis(4000);
pub const RESPIN_DELAY: Duration = Duration::from_millis(1200);
pub const POINTER_ANGLE: f64 = 270.0;

#[derive(Clone, Debug, PartialEq)]
pub enum Segment {
    Platform(String),
    Game(Game),
}

impl Segment {
    pub fn label(&self) -> &str {
        match self {
            Self::Platform(p) => p,
            Self::Game(g) => &g.title,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Stage {
    Platform,
    Game,
}

#[derive(Clone, Copy, Debug, PartialEq)]
enum Phase {
    Idle,
    Spinning { from: f64, to: f64, started: Instant },
    Landed(usize),
    Respin { at: Instant },
}

#[derive(Clone, Debug, PartialEq)]
pub enum Outcome {
    PlatformChosen(String),
    GameChosen(Game),
}

/// Degrees per segment.
pub fn arc(segments: usize) -> f64 {
    360.0 / segments.max(1) as f64
}

/// Index of the segment under the pointer for a wheel at `rotation`.
pub fn index_at(rotation: f64, segments: usize) -> usize {
    if segments == 0 {
        return 0;
    }
    let local = (POINTER_ANGLE - rotation).rem_euclid(360.0);
    ((local / arc(segments)).floor() as usize).min(segments - 1)
}

/// Screen-space start and end angle of segment `i`.
pub fn segment_span(i: usize, segments: usize, rotation: f64) -> (f64, f64) {
    let a = arc(segments);
    let start = i as f64 * a + rotation;
    (start, start + a)
}

fn ease_out_cubic(t: f64) -> f64 {
    1.0 - (1.0 - t).powi(3)
}

#[derive(Clone, Debug)]
pub struct SpinWheel {
    candidates: Vec<Game>,
    stage: Stage,
    segments: Vec<Segment>,
    rotation: f64,
    phase: Phase,
    narrowed_to: Option<String>,
}

impl Default for SpinWheel {
    fn default() -> Self {
        Self {
            candidates: Vec::new(),
            stage: Stage::Game,
            segments: Vec::new(),
            rotation: 0.0,
            phase: Phase::Idle,
            narrowed_to: None,
        }
    }
}

impl SpinWheel {
    /// Back to the first stage for a new candidate set.
    ///
    /// `preset_platform` is the platform filter the list was narrowed with, if any.
    pub fn reset(&mut self, candidates: Vec<Game>, preset_platform: Option<&str>) {
        self.stage = if preset_platform.is_none() && candidates.len() > STAGE_CEILING {
            Stage::Platform
        } else {
            Stage::Game
        };
        self.candidates = candidates;
        self.narrowed_to = None;
        self.phase = Phase::Idle;
        self.rebuild_segments();
    }

    fn rebuild_segments(&mut self) {
        self.segments = match self.stage {
            Stage::Platform => crate::filter::platforms(&self.candidates)
                .into_iter()
                .map(Segment::Platform)
                .collect(),
            Stage::Game => self.candidates.iter().cloned().map(Segment::Game).collect(),
        };
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn narrowed_to(&self) -> Option<&str> {
        self.narrowed_to.as_deref()
    }

    pub fn is_spinning(&self) -> bool {
        matches!(self.phase, Phase::Spinning { .. } | Phase::Respin { .. })
    }

    /// The segment the wheel came to rest on.
    pub fn landed(&self) -> Option<&Segment> {
        match self.phase {
            Phase::Landed(i) => self.segments.get(i),
            _ => None,
        }
    }

    /// Starts a spin: 3 to 5 full turns plus a random offset.
    pub fn spin(&mut self, now: Instant, rng: &mut impl Rng) -> bool {
        if self.segments.is_empty() || matches!(self.phase, Phase::Spinning { .. }) {
            return false;
        }
        let from = self.rotation.rem_euclid(360.0);
        let turns = f64::from(rng.gen_range(3_u32..=5));
        let offset = rng.gen_range(0.0..360.0);
        let to = from + turns * 360.0 + offset;
        log::debug!("spinning {} segments from {from:.1} to {to:.1}", self.segments.len());
        self.phase = Phase::Spinning { from, to, started: now };
        true
    }

    /// Rotation to draw at `now`. Ends exactly on the angle used for selection.
    pub fn rotation_at(&self, now: Instant) -> f64 {
        match self.phase {
            Phase::Spinning { from, to, started } => {
                let t = (now.saturating_duration_since(started).as_secs_f64()
                    / SPIN_DURATION.as_secs_f64())
                .clamp(0.0, 1.0);
                if t >= 1.0 { to } else { from + (to - from) * ease_out_cubic(t) }
            }
            _ => self.rotation,
        }
    }

    /// Advances timers. Returns what was picked when a spin comes to rest.
    pub fn tick(&mut self, now: Instant, rng: &mut impl Rng) -> Option<Outcome> {
        match self.phase {
            Phase::Spinning { to, started, .. } if now.saturating_duration_since(started) >= SPIN_DURATION => {
                self.rotation = to;
                let index = index_at(to, self.segments.len());
                self.phase = Phase::Landed(index);
                match self.segments.get(index)?.clone() {
                    Segment::Platform(platform) => {
                        self.narrow_to(&platform);
                        self.phase = Phase::Respin { at: now + RESPIN_DELAY };
                        Some(Outcome::PlatformChosen(platform))
                    }
                    Segment::Game(game) => {
                        log::info!("wheel picked {:?} ({})", game.title, game.platform);
                        Some(Outcome::GameChosen(game))
                    }
                }
            }
            Phase::Respin { at } if now >= at => {
                self.phase = Phase::Idle;
                self.spin(now, rng);
                None
            }
            _ => None,
        }
    }

    fn narrow_to(&mut self, platform: &str) {
        self.candidates.retain(|g| g.platform.trim() == platform);
        self.narrowed_to = Some(platform.to_owned());
        self.stage = Stage::Game;
        self.rebuild_segments();
    }

    /// When the UI should wake up next.
    pub fn next_deadline(&self) -> Option<Instant> {
        match self.phase {
            Phase::Spinning { started, .. } => Some(started + SPIN_DURATION),
            Phase::Respin { at } => Some(at),
            Phase::Idle | Phase::Landed(_) => None,
        }
    }
}
