use egui::vec2;

use super::{Msg, ShelfApp, cover_widget, money};
use crate::model::TopKind;
use crate::stats::{self, TOP_CAP, TopPicker};

impl ShelfApp {
    pub(super) fn stats_page(&mut self, ui: &mut egui::Ui) {
        ui.horizontal(|ui| {
            ui.heading("Your collection");
            if ui.button("⟳").on_hover_text("Reload").clicked() {
                self.load_stats();
            }
            if self.stats.loading {
                ui.spinner();
            }
        });
        ui.separator();

        let Some(stats) = &self.stats.stats else {
            if !self.stats.loading {
                ui.label("No statistics yet.");
            }
            return;
        };

        egui::Grid::new("stats_counts").num_columns(2).striped(true).show(ui, |ui| {
            let rows = [
                ("Games", stats.total_games.to_string()),
                ("Physical", stats.physical_games.to_string()),
                ("Digital", stats.digital_games.to_string()),
                ("Played", stats.played_games.to_string()),
                ("Unplayed", stats.unplayed_games.to_string()),
                ("Consoles", stats.total_consoles.to_string()),
                ("Accessories", stats.total_accessories.to_string()),
                ("Completions", stats.total_completions.to_string()),
                ("Total paid", money(stats.total_paid)),
                ("Estimated value", money(stats.total_value)),
            ];
            for (label, value) in rows {
                ui.label(label);
                ui.strong(value);
                ui.end_row();
            }
        });

        let mut edit = None;
        for kind in TopKind::ALL {
            ui.add_space(10.0);
            ui.horizontal(|ui| {
                ui.heading(kind.label());
                if ui.small_button("✏").on_hover_text("Choose").clicked() {
                    edit = Some(kind);
                }
            });
            let entries = stats.top(kind);
            if entries.is_empty() {
                ui.weak("Nothing picked yet.");
                continue;
            }
            ui.horizontal(|ui| {
                for (rank, entry) in entries.iter().enumerate() {
                    ui.vertical(|ui| {
                        ui.set_width(110.0);
                        cover_widget(ui, &mut self.covers, entry.image.as_deref(), vec2(110.0, 140.0), &entry.title);
                        ui.add(egui::Label::new(format!("{}. {}", rank + 1, entry.title)).truncate());
                    });
                }
            });
        }

        if let Some(kind) = edit {
            self.stats.picker = Some(TopPicker::open(kind, stats));
        }
    }

    pub(super) fn stats_windows(&mut self, ctx: &egui::Context) {
        let Some(mut picker) = self.stats.picker.take() else { return };
        let pool = stats::candidates(picker.kind, self.games.all(), &self.stats.items);
        let mut open = true;
        let mut save = false;
        let mut cancel = false;
        let mut toggled = None;

        egui::Window::new(picker.kind.label())
            .id(egui::Id::new("top_picker"))
            .open(&mut open)
            .default_width(420.0)
            .show(ctx, |ui| {
                ui.label(format!("Pick up to {TOP_CAP}, in order."));
                ui.horizontal_wrapped(|ui| {
                    for (n, id) in picker.selected().iter().enumerate() {
                        let title = pool.iter().find(|c| c.id == *id).map_or("?", |c| c.title.as_str());
                        if ui.small_button(format!("{}. {title} ✖", n + 1)).clicked() {
                            toggled = Some(*id);
                        }
                    }
                });
                ui.separator();
                ui.add(egui::TextEdit::singleline(&mut picker.query).hint_text("Search"));
                egui::ScrollArea::vertical().max_height(320.0).show(ui, |ui| {
                    for candidate in picker.filter(&pool) {
                        let label = if candidate.platform.is_empty() {
                            candidate.title.clone()
                        } else {
                            format!("{} ({})", candidate.title, candidate.platform)
                        };
                        if ui.selectable_label(picker.is_selected(candidate.id), label).clicked() {
                            toggled = Some(candidate.id);
                        }
                    }
                });
                ui.separator();
                ui.horizontal(|ui| {
                    save = ui.button("💾 Save").clicked();
                    cancel = ui.button("Cancel").clicked();
                });
            });

        if let Some(id) = toggled
            && let Err(err) = picker.toggle(id)
        {
            self.notes.error(&err);
        }
        if save {
            let (kind, ids) = (picker.kind, picker.selected().to_vec());
            self.worker.spawn(move |b| Msg::TopSaved(kind, b.save_top(kind, &ids)));
        }
        if open && !cancel {
            self.stats.picker = Some(picker);
        }
    }
}
