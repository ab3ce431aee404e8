use std::time::Instant;

use egui::{Align2, Color32, FontId, Pos2, Sense, Shape, Stroke, pos2, vec2};

use super::{Page, ShelfApp};
use crate::wheel::{Outcome, POINTER_ANGLE, Segment, Stage, segment_span};

/// Labels stop being readable past this many segments.
const MAX_LABELS: usize = 60;

fn on_circle(center: Pos2, radius: f32, degrees: f64) -> Pos2 {
    let rad = degrees.to_radians();
    pos2(center.x + radius * rad.cos() as f32, center.y + radius * rad.sin() as f32)
}

fn ellipsize(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        text.to_owned()
    } else {
        let mut out: String = text.chars().take(max.saturating_sub(1)).collect();
        out.push('…');
        out
    }
}

impl ShelfApp {
    pub(super) fn wheel_page(&mut self, ui: &mut egui::Ui) {
        let generation = self.games.generation();
        if self.wheel.generation != Some(generation) {
            let preset = self.games.filter().platform.clone();
            self.wheel.wheel.reset(self.games.filtered().to_vec(), preset.as_deref());
            self.wheel.generation = Some(generation);
            self.wheel.result = None;
        }

        let now = Instant::now();
        match self.wheel.wheel.tick(now, &mut self.rng) {
            Some(Outcome::PlatformChosen(platform)) => {
                self.wheel.result = Some(format!("{platform}! Now picking a game…"));
            }
            Some(Outcome::GameChosen(game)) => {
                self.notes.success(format!("Play {}!", game.title));
                self.wheel.result = Some(format!("{} ({})", game.title, game.platform));
            }
            None => {}
        }

        let wheel = &self.wheel.wheel;
        ui.horizontal(|ui| {
            ui.heading(match (wheel.stage(), wheel.narrowed_to()) {
                (Stage::Platform, _) => "Spin for a platform".to_owned(),
                (Stage::Game, Some(platform)) => format!("Spin for a {platform} game"),
                (Stage::Game, None) => "Spin for a game".to_owned(),
            });
            ui.weak(format!("{} on the wheel, from the current filters", wheel.segments().len()));
        });

        let mut spin = false;
        let mut open_landed = false;
        ui.horizontal(|ui| {
            spin = ui
                .add_enabled(!wheel.is_spinning() && !wheel.segments().is_empty(), egui::Button::new("🎡 Spin"))
                .clicked();
            if let Some(result) = &self.wheel.result {
                ui.strong(result);
            }
            if matches!(wheel.landed(), Some(Segment::Game(_))) {
                open_landed = ui.button("Open").clicked();
            }
        });

        if wheel.segments().is_empty() {
            ui.centered_and_justified(|ui| ui.label("No games match the current filters."));
        } else {
            let side = ui.available_width().min(ui.available_height()).clamp(200.0, 560.0);
            let (response, painter) = ui.allocate_painter(vec2(side, side), Sense::hover());
            let center = response.rect.center();
            let radius = side / 2.0 - 16.0;
            let rotation = wheel.rotation_at(now);
            let count = wheel.segments().len();

            if count == 1 {
                painter.circle_filled(center, radius, Color32::from_rgb(70, 120, 190));
            }
            for (i, segment) in wheel.segments().iter().enumerate() {
                let (start, end) = segment_span(i, count, rotation);
                let fill: Color32 = egui::ecolor::Hsva::new(i as f32 / count as f32, 0.55, 0.75, 1.0).into();
                if count > 1 {
                    let steps = ((end - start) / 4.0).ceil().max(1.0) as usize;
                    let mut points = Vec::with_capacity(steps + 2);
                    points.push(center);
                    for s in 0..=steps {
                        points.push(on_circle(center, radius, start + (end - start) * s as f64 / steps as f64));
                    }
                    painter.add(Shape::convex_polygon(points, fill, Stroke::new(1.0, Color32::from_gray(30))));
                }
                if count <= MAX_LABELS {
                    let at = on_circle(center, radius * 0.62, (start + end) / 2.0);
                    painter.text(at, Align2::CENTER_CENTER, ellipsize(segment.label(), 18), FontId::proportional(12.0), Color32::BLACK);
                }
            }
            painter.circle_stroke(center, radius, Stroke::new(2.0, Color32::from_gray(220)));

            let tip = on_circle(center, radius - 14.0, POINTER_ANGLE);
            let base = on_circle(center, radius + 8.0, POINTER_ANGLE);
            let across = vec2(10.0, 0.0);
            painter.add(Shape::convex_polygon(
                vec![tip, base + across, base - across],
                Color32::from_rgb(230, 60, 60),
                Stroke::new(1.0, Color32::WHITE),
            ));

            if wheel.is_spinning() {
                ui.ctx().request_repaint();
            }
        }

        if spin {
            self.wheel.result = None;
            self.wheel.wheel.spin(now, &mut self.rng);
        }
        if open_landed && let Some(Segment::Game(game)) = self.wheel.wheel.landed() {
            self.games.detail = Some(game.id);
            self.open_page(Page::Games);
        }
    }
}
