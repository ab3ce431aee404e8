use std::time::Instant;

use egui::{Align2, Color32, Rect, Sense, Vec2, pos2, vec2};

use super::{ImageTarget, Msg, PendingDelete, ShelfApp, cover_widget, image_slot_ui, money, optional_number_ui, paint_cover};
use crate::api::LookupKind;
use crate::coverflow::{Event, Face, WINDOW_RADIUS};
use crate::filter::{self, FormatFilter, PlayedFilter, SortKey};
use crate::form::{CaseStyle, GameForm};
use crate::games;
use crate::model::{Game, Id};
use crate::prefs::ViewMode;
use crate::split;

const TILE: Vec2 = vec2(140.0, 190.0);
const ROW_HEIGHT: f32 = 22.0;

enum Action {
    Open(Id),
    Edit(Id),
    Delete(Id),
    Coverflow(Event),
}

impl ShelfApp {
    pub(super) fn games_page(&mut self, ui: &mut egui::Ui) {
        self.games_toolbar(ui);
        ui.separator();

        if !self.games.is_loaded() {
            ui.centered_and_justified(|ui| {
                if self.games.gate.is_busy() {
                    ui.spinner();
                } else {
                    ui.label("Could not load the collection. Use File → Reload to try again.");
                }
            });
            return;
        }
        if self.games.filtered().is_empty() {
            ui.centered_and_justified(|ui| ui.label("No games match these filters."));
            return;
        }

        let action = match self.games.view() {
            ViewMode::List => self.games_list(ui),
            ViewMode::Grid => self.games_grid(ui),
            ViewMode::Coverflow => self.games_coverflow(ui),
        };
        match action {
            Some(Action::Open(id)) => self.games.detail = Some(id),
            Some(Action::Edit(id)) => self.edit_game(id),
            Some(Action::Delete(id)) => self.ask_delete_game(id),
            Some(Action::Coverflow(event)) => self.games.coverflow_event(event, Instant::now()),
            None => {}
        }
    }

    fn games_toolbar(&mut self, ui: &mut egui::Ui) {
        let mut edited = self.games.filter().clone();
        let mut sort = self.games.sort();
        let mut view = self.games.view();
        let all = self.games.all();

        ui.horizontal_wrapped(|ui| {
            ui.add(egui::TextEdit::singleline(&mut edited.search).hint_text("Search title, platform, series").desired_width(220.0));

            let choices = |ui: &mut egui::Ui, salt: &str, current: &mut Option<String>, values: Vec<String>, any: &str| {
                egui::ComboBox::from_id_salt(salt)
                    .selected_text(current.clone().unwrap_or_else(|| any.to_owned()))
                    .show_ui(ui, |ui| {
                        ui.selectable_value(current, None, any);
                        for value in values {
                            ui.selectable_value(current, Some(value.clone()), value);
                        }
                    });
            };
            choices(ui, "platform_filter", &mut edited.platform, filter::platforms(all), "All platforms");
            choices(ui, "genre_filter", &mut edited.genre, filter::genres(all), "All genres");

            egui::ComboBox::from_id_salt("format_filter")
                .selected_text(match edited.format {
                    FormatFilter::Any => "Physical & digital",
                    FormatFilter::Physical => "Physical",
                    FormatFilter::Digital => "Digital",
                })
                .show_ui(ui, |ui| {
                    ui.selectable_value(&mut edited.format, FormatFilter::Any, "Physical & digital");
                    ui.selectable_value(&mut edited.format, FormatFilter::Physical, "Physical");
                    ui.selectable_value(&mut edited.format, FormatFilter::Digital, "Digital");
                });
            egui::ComboBox::from_id_salt("played_filter")
                .selected_text(match edited.played {
                    PlayedFilter::Any => "Played or not",
                    PlayedFilter::Played => "Played",
                    PlayedFilter::Unplayed => "Unplayed",
                })
                .show_ui(ui, |ui| {
                    ui.selectable_value(&mut edited.played, PlayedFilter::Any, "Played or not");
                    ui.selectable_value(&mut edited.played, PlayedFilter::Played, "Played");
                    ui.selectable_value(&mut edited.played, PlayedFilter::Unplayed, "Unplayed");
                });
            egui::ComboBox::from_id_salt("sort_key")
                .selected_text(sort.label())
                .show_ui(ui, |ui| {
                    for key in SortKey::ALL {
                        ui.selectable_value(&mut sort, key, key.label());
                    }
                });
            if !edited.is_empty() && ui.button("Clear filters").clicked() {
                edited = Default::default();
            }

            ui.separator();
            for mode in ViewMode::ALL {
                ui.selectable_value(&mut view, mode, mode.label());
            }
            ui.separator();
            ui.label(format!("{} of {}", self.games.filtered().len(), all.len()));
        });

        self.games.set_filter(edited);
        self.games.set_sort(sort);
        self.games.set_view(view);

        if ui.button("➕ Add game").clicked() {
            self.games.form = Some(GameForm::default());
        }
    }

    fn games_list(&mut self, ui: &mut egui::Ui) -> Option<Action> {
        let mut action = None;
        let games = self.games.filtered();
        egui::ScrollArea::vertical()
            .auto_shrink([false; 2])
            .show_rows(ui, ROW_HEIGHT, games.len(), |ui, range| {
                for game in games.get(range).unwrap_or_default() {
                    ui.horizontal(|ui| {
                        let cell = |ui: &mut egui::Ui, width: f32, text: String| {
                            ui.add_sized([width, ROW_HEIGHT], egui::Label::new(text).truncate());
                        };
                        if ui
                            .add_sized([280.0, ROW_HEIGHT], egui::Link::new(&game.title))
                            .clicked()
                        {
                            action = Some(Action::Open(game.id));
                        }
                        cell(ui, 120.0, game.platform.clone());
                        cell(ui, 110.0, game.genre.clone().unwrap_or_default());
                        cell(ui, 90.0, game.release_date.clone().unwrap_or_default());
                        cell(ui, 60.0, if game.played { "✔ played".to_owned() } else { String::new() });
                        cell(ui, 70.0, money(Some(game.market_price())));
                        if ui.small_button("Edit").clicked() {
                            action = Some(Action::Edit(game.id));
                        }
                        if ui.small_button("🗑").on_hover_text("Delete").clicked() {
                            action = Some(Action::Delete(game.id));
                        }
                    });
                }
            });
        action
    }

    fn games_grid(&mut self, ui: &mut egui::Ui) -> Option<Action> {
        let mut action = None;
        let games = self.games.filtered();
        let covers = &mut self.covers;
        let spacing = ui.spacing().item_spacing;
        let columns = ((ui.available_width() + spacing.x) / (TILE.x + spacing.x)).floor().max(1.0) as usize;
        let rows = games.len().div_ceil(columns);

        egui::ScrollArea::vertical()
            .auto_shrink([false; 2])
            .show_rows(ui, TILE.y + 18.0, rows, |ui, range| {
                for row in range {
                    let start = row * columns;
                    let Some(chunk) = games.get(start..games.len().min(start + columns)) else { continue };
                    ui.horizontal(|ui| {
                        for game in chunk {
                            ui.vertical(|ui| {
                                ui.set_width(TILE.x);
                                let response =
                                    cover_widget(ui, covers, game.front_cover_image.as_deref(), TILE, &game.title);
                                if response.clicked() {
                                    action = Some(Action::Open(game.id));
                                }
                                response.context_menu(|ui| {
                                    if ui.button("Edit").clicked() {
                                        action = Some(Action::Edit(game.id));
                                    }
                                    if ui.button("Delete").clicked() {
                                        action = Some(Action::Delete(game.id));
                                    }
                                });
                                ui.add(egui::Label::new(egui::RichText::new(&game.platform).small()).truncate());
                            });
                        }
                    });
                }
            });
        action
    }

    fn games_coverflow(&mut self, ui: &mut egui::Ui) -> Option<Action> {
        let now = Instant::now();
        if self.games.coverflow.next_tick().is_some_and(|due| due <= now) {
            self.games.coverflow_event(Event::Tick, now);
        }

        let mut action = None;
        let ctx = ui.ctx().clone();
        if ctx.memory(|m| m.focused().is_none()) {
            ctx.input(|i| {
                if i.key_pressed(egui::Key::ArrowLeft) {
                    action = Some(Action::Coverflow(Event::Prev));
                } else if i.key_pressed(egui::Key::ArrowRight) {
                    action = Some(Action::Coverflow(Event::Next));
                }
            });
        }

        let flow = &self.games.coverflow;
        let games = self.games.filtered();
        let height = (ui.available_height() - 70.0).max(260.0);
        let (response, painter) = ui.allocate_painter(vec2(ui.available_width(), height), Sense::click());
        let area = response.rect;
        let base = area.height() * 0.8;

        // Far cases first so the centre one is painted on top.
        let mut window = flow.window(WINDOW_RADIUS);
        window.sort_by_key(|(_, offset)| std::cmp::Reverse(offset.unsigned_abs()));
        let mut hits: Vec<(Rect, usize, isize)> = Vec::with_capacity(window.len());
        for (index, offset) in window {
            let Some(game) = games.get(index) else { continue };
            let distance = offset.unsigned_abs() as f32;
            let scale = 1.0 / (1.0 + 0.3 * distance);
            let size = vec2(base * scale * CaseStyle::for_platform(&game.platform).aspect(), base * scale);
            let x = area.center().x + offset as f32 * base * 0.42 / (1.0 + 0.15 * distance);
            let rect = Rect::from_center_size(pos2(x, area.center().y), size);

            let image = if offset == 0 && flow.face() == Face::Back {
                game.back_cover_image.as_deref()
            } else {
                game.front_cover_image.as_deref()
            };
            paint_cover(&painter, &mut self.covers, image, rect, &game.title);
            if offset != 0 {
                let shade = (distance * 45.0).min(170.0) as u8;
                painter.rect_filled(rect, 4.0, Color32::from_black_alpha(shade));
            }
            hits.push((rect, index, offset));
        }

        if response.clicked()
            && let Some(pointer) = response.interact_pointer_pos()
            && let Some((_, index, offset)) = hits.iter().rev().find(|(rect, ..)| rect.contains(pointer))
        {
            action = games.get(*index).map(|game| {
                if *offset == 0 { Action::Open(game.id) } else { Action::Coverflow(Event::Jump(*index)) }
            });
        }

        let centered = self.games.centered();
        if let Some(game) = centered {
            painter.text(
                pos2(area.center().x, area.bottom() - 4.0),
                Align2::CENTER_BOTTOM,
                format!("{}  ·  {}", game.title, game.platform),
                egui::FontId::proportional(16.0),
                ui.visuals().strong_text_color(),
            );
        }

        ui.horizontal(|ui| {
            if ui.button("◀").clicked() {
                action = Some(Action::Coverflow(Event::Prev));
            }
            let has_back = centered.is_some_and(Game::has_back_cover);
            if ui.add_enabled(has_back, egui::Button::new("Flip")).clicked() {
                action = Some(Action::Coverflow(Event::Flip { has_back }));
            }
            if ui.button("▶").clicked() {
                action = Some(Action::Coverflow(Event::Next));
            }
            let label = if self.games.coverflow.autoplay() { "⏸ Autoplay" } else { "▶ Autoplay" };
            if ui.selectable_label(self.games.coverflow.autoplay(), label).clicked() {
                action = Some(Action::Coverflow(Event::ToggleAutoplay));
            }
            ui.label(format!("{} / {}", self.games.coverflow.index() + 1, self.games.coverflow.len()));
        });
        action
    }

    fn edit_game(&mut self, id: Id) {
        if let Some(form) = self.games.get(id).map(GameForm::edit) {
            self.games.form = Some(form);
        }
    }

    fn ask_delete_game(&mut self, id: Id) {
        if let Some(game) = self.games.get(id) {
            self.confirm
                .ask(format!("Delete \"{}\"? This cannot be undone.", game.title), PendingDelete::Game(id));
        }
    }

    /// Detail and add/edit windows.
    pub(super) fn game_windows(&mut self, ctx: &egui::Context) {
        self.game_detail(ctx);
        self.game_form(ctx);
    }

    fn game_detail(&mut self, ctx: &egui::Context) {
        let Some(game) = self.games.detail.and_then(|id| self.games.get(id)).cloned() else {
            self.games.detail = None;
            return;
        };
        let mut open = true;
        let mut action = None;
        egui::Window::new(&game.title)
            .id(egui::Id::new("game_detail"))
            .open(&mut open)
            .default_width(560.0)
            .show(ctx, |ui| {
                ui.horizontal(|ui| {
                    let aspect = CaseStyle::for_platform(&game.platform).aspect();
                    let size = vec2(220.0 * aspect, 220.0);
                    cover_widget(ui, &mut self.covers, game.front_cover_image.as_deref(), size, "No front cover");
                    if game.has_back_cover() {
                        cover_widget(ui, &mut self.covers, game.back_cover_image.as_deref(), size, "No back cover");
                    }
                });
                ui.separator();

                egui::Grid::new("game_fields").num_columns(2).striped(true).show(ui, |ui| {
                    let mut row = |label: &str, value: Option<String>| {
                        if let Some(value) = value.filter(|v| !v.is_empty()) {
                            ui.label(label);
                            ui.label(value);
                            ui.end_row();
                        }
                    };
                    row("Platform", Some(game.platform.clone()));
                    row("Genre", game.genre.clone());
                    row("Series", game.series.clone());
                    row("Special edition", game.special_edition.clone());
                    row("Released", game.release_date.clone());
                    row("Condition", game.condition.clone());
                    row("Format", Some(if game.is_physical { "Physical".to_owned() } else {
                        format!("Digital{}", game.digital_store.as_deref().map(|s| format!(" ({s})")).unwrap_or_default())
                    }));
                    row("Played", Some(if game.played { "Yes" } else { "No" }.to_owned()));
                    row("Rating", game.star_rating.map(|r| "★".repeat(r.clamp(0.0, 5.0).round() as usize)));
                    row("Metacritic", game.metacritic_rating.map(|m| format!("{m:.0}")));
                    row("Price paid", game.price_paid.map(|p| money(Some(p))));
                    row("PriceCharting", game.pricecharting_price.map(|p| money(Some(p))));
                    row("Added", game.created().map(|d| d.format("%d %b %Y").to_string()));
                });

                for (heading, text) in [("Description", &game.description), ("Review", &game.review)] {
                    if let Some(text) = text {
                        ui.add_space(6.0);
                        ui.strong(heading);
                        ui.label(text);
                    }
                }

                if !game.extra_images.is_empty() {
                    ui.add_space(6.0);
                    ui.strong("More pictures");
                    egui::ScrollArea::horizontal().show(ui, |ui| {
                        ui.horizontal(|ui| {
                            for extra in &game.extra_images {
                                let caption = extra.caption.as_deref().unwrap_or("");
                                cover_widget(ui, &mut self.covers, Some(extra.image.as_str()), vec2(120.0, 120.0), caption);
                            }
                        });
                    });
                }

                ui.separator();
                ui.horizontal(|ui| {
                    if ui.button("✏ Edit").clicked() {
                        action = Some(Action::Edit(game.id));
                    }
                    if ui.button("🗑 Delete").clicked() {
                        action = Some(Action::Delete(game.id));
                    }
                });
            });

        if !open {
            self.games.detail = None;
        }
        match action {
            Some(Action::Edit(id)) => self.edit_game(id),
            Some(Action::Delete(id)) => self.ask_delete_game(id),
            _ => {}
        }
    }

    fn game_form(&mut self, ctx: &egui::Context) {
        let Some(mut form) = self.games.form.take() else { return };
        let mut open = true;
        let mut save = false;
        let mut cancel = false;
        let mut upload = None;
        let mut lookup = None;
        let mut split_cover = false;
        let saving = self.games.is_saving();

        let title = if form.id.is_some() { "Edit game" } else { "Add game" };
        egui::Window::new(title)
            .id(egui::Id::new("game_form"))
            .open(&mut open)
            .default_width(620.0)
            .show(ctx, |ui| {
                egui::ScrollArea::vertical().show(ui, |ui| {
                    egui::Grid::new("game_form_fields").num_columns(2).show(ui, |ui| {
                        let text = |ui: &mut egui::Ui, label: &str, value: &mut String| {
                            ui.label(label);
                            ui.text_edit_singleline(value);
                            ui.end_row();
                        };
                        text(ui, "Title *", &mut form.title);
                        text(ui, "Platform", &mut form.platform);
                        text(ui, "Genre", &mut form.genre);
                        text(ui, "Release date", &mut form.release_date);
                        text(ui, "Series", &mut form.series);
                        text(ui, "Special edition", &mut form.special_edition);
                        text(ui, "Condition", &mut form.condition);

                        ui.label("Rating");
                        ui.add(egui::Slider::new(&mut form.star_rating, 0..=5).text("stars"));
                        ui.end_row();
                        ui.label("Metacritic");
                        optional_number_ui(ui, &mut form.metacritic);
                        ui.end_row();
                        ui.label("Price paid");
                        optional_number_ui(ui, &mut form.price_paid);
                        ui.end_row();
                        ui.label("PriceCharting");
                        optional_number_ui(ui, &mut form.pricecharting);
                        ui.end_row();

                        ui.label("Format");
                        ui.horizontal(|ui| {
                            ui.radio_value(&mut form.is_physical, true, "Physical");
                            ui.radio_value(&mut form.is_physical, false, "Digital");
                            if !form.is_physical {
                                ui.add(egui::TextEdit::singleline(&mut form.digital_store).hint_text("Store"));
                            }
                        });
                        ui.end_row();
                        ui.label("");
                        ui.checkbox(&mut form.played, "Played");
                        ui.end_row();
                    });

                    ui.label("Description");
                    ui.add(egui::TextEdit::multiline(&mut form.description).desired_rows(3));
                    ui.label("Review");
                    ui.add(egui::TextEdit::multiline(&mut form.review).desired_rows(3));

                    ui.separator();
                    ui.horizontal(|ui| {
                        if image_slot_ui(ui, &mut self.covers, "Front cover", &mut form.front) {
                            upload = Some(ImageTarget::GameFront);
                        }
                        if image_slot_ui(ui, &mut self.covers, "Back cover", &mut form.back) {
                            upload = Some(ImageTarget::GameBack);
                        }
                    });
                    if ui
                        .button("✂ Split front image into front and back")
                        .on_hover_text("For scans that show both sides of the case")
                        .clicked()
                    {
                        split_cover = true;
                    }

                    ui.separator();
                    ui.horizontal_wrapped(|ui| {
                        ui.label("Look up:");
                        for kind in [LookupKind::Cover, LookupKind::Price, LookupKind::Metacritic, LookupKind::Details] {
                            if ui.button(kind.label()).clicked() {
                                lookup = Some(kind);
                            }
                        }
                    });

                    ui.separator();
                    ui.horizontal(|ui| {
                        save = ui.add_enabled(!saving, egui::Button::new("💾 Save")).clicked();
                        cancel = ui.button("Cancel").clicked();
                        if saving {
                            ui.spinner();
                        }
                    });
                });
            });

        if let Some(kind) = lookup {
            self.run_lookup(kind, &form);
        }
        if split_cover {
            self.open_split_tool(&form);
        }
        if save {
            self.save_game(&form);
        }
        if open && !cancel {
            self.games.form = Some(form);
        }
        if let Some(target) = upload {
            self.pick_and_upload(target);
        }
    }

    fn run_lookup(&mut self, kind: LookupKind, form: &GameForm) {
        let title = form.title.trim().to_owned();
        if title.is_empty() {
            self.notes.info("Enter a title to look it up");
            return;
        }
        let platform = form.platform.trim().to_owned();
        self.worker
            .spawn(move |b| Msg::Looked(kind, b.lookup(kind, &title, &platform)));
    }

    fn open_split_tool(&mut self, form: &GameForm) {
        let Some(value) = form.front.resolve() else {
            self.notes.info("Add a front image to split first");
            return;
        };
        let config = self.config.clone();
        self.worker.spawn(move |b| {
            let loaded = split::load_source(b, &value, &config);
            Msg::SplitSourceLoaded(value, loaded)
        });
    }

    fn save_game(&mut self, form: &GameForm) {
        let payload = match form.to_payload() {
            Ok(payload) => payload,
            Err(err) => {
                self.notes.error(&err);
                return;
            }
        };
        if !self.games.begin_save() {
            return;
        }
        let id = form.id;
        self.worker
            .spawn(move |b| Msg::GameSaved(games::save_game(b, id, &payload)));
    }
}
