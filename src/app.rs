use std::sync::Arc;
use std::time::{Duration, Instant};

use image::DynamicImage;
use rand::SeedableRng as _;
use rand::rngs::StdRng;
use serde_json::Value;

use crate::api::{Backend, LookupKind};
use crate::completions::CompletionsStore;
use crate::config::Config;
use crate::covers::CoverCache;
use crate::error::Result;
use crate::games::{GamesStore, Saved};
use crate::items::{self, ItemsStore};
use crate::loader::load_all_games;
use crate::model::{Completion, Game, Id, Item, Stats, TopKind, UploadedImage};
use crate::notify::{Confirm, Notifications};
use crate::prefs::Prefs;
use crate::stats::StatsStore;
use crate::wheel::SpinWheel;
use crate::worker::Worker;

mod completions_page;
mod games_page;
mod items_page;
mod split_tool;
mod stats_page;
mod wheel_page;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
enum Page {
    #[default]
    Games,
    Items,
    Completions,
    Stats,
    Wheel,
}

impl Page {
    const ALL: [Self; 5] = [Self::Games, Self::Items, Self::Completions, Self::Stats, Self::Wheel];

    fn label(self) -> &'static str {
        match self {
            Self::Games => "Games",
            Self::Items => "Consoles & accessories",
            Self::Completions => "Completions",
            Self::Stats => "Stats",
            Self::Wheel => "Spin the wheel",
        }
    }
}

/// Which form image field an upload lands in.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum ImageTarget {
    GameFront,
    GameBack,
    ItemFront,
    ItemBack,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum PendingDelete {
    Game(Id),
    Item(Id),
    Completion(Id),
}

/// Results coming back from the worker.
enum Msg {
    GamesLoaded(Result<Vec<Game>>),
    GameSaved(Result<Saved>),
    GameDeleted(Id, Result<()>),
    ItemsLoaded(Result<Vec<Item>>),
    ItemSaved(Result<()>),
    ItemDeleted(Id, Result<()>),
    CompletionsLoaded(Result<Vec<Completion>>),
    CompletionSaved(Result<()>),
    CompletionDeleted(Id, Result<()>),
    StatsLoaded(Result<(Stats, Vec<Item>)>),
    TopSaved(TopKind, Result<()>),
    Uploaded(ImageTarget, Result<UploadedImage>),
    SplitSourceLoaded(String, Result<DynamicImage>),
    Looked(LookupKind, Result<Option<Value>>),
}

#[derive(Default)]
struct WheelState {
    wheel: SpinWheel,
    /// Filter generation the wheel was last reset for.
    generation: Option<u64>,
    result: Option<String>,
}

pub struct ShelfApp {
    config: Config,
    worker: Worker<Msg>,
    covers: CoverCache,
    page: Page,
    games: GamesStore,
    items: ItemsStore,
    completions: CompletionsStore,
    stats: StatsStore,
    wheel: WheelState,
    split: Option<split_tool::SplitTool>,
    notes: Notifications,
    confirm: Confirm<PendingDelete>,
    rng: StdRng,
}

impl ShelfApp {
    /// Called once before the first frame.
    pub fn new(cc: &eframe::CreationContext<'_>, config: Config, backend: Arc<dyn Backend>) -> Self {
        let prefs = Prefs::load(cc.storage);
        log::info!("starting with view {:?} against {}", prefs.view, config.api_base);

        cc.egui_ctx.set_visuals(egui::Visuals::dark());

        let mut this = Self {
            covers: CoverCache::new(Arc::clone(&backend), config.clone(), &cc.egui_ctx),
            worker: Worker::new(backend).with_context(cc.egui_ctx.clone()),
            config,
            page: Page::default(),
            games: GamesStore::from_prefs(&prefs),
            items: ItemsStore::default(),
            completions: CompletionsStore::default(),
            stats: StatsStore::default(),
            wheel: WheelState::default(),
            split: None,
            notes: Notifications::default(),
            confirm: Confirm::default(),
            rng: StdRng::from_entropy(),
        };
        this.load_games();
        this
    }

    fn load_games(&mut self) {
        if !self.games.begin_load() {
            log::debug!("games load already running, queued another");
            return;
        }
        let (per_page, max_pages) = (self.config.per_page, self.config.max_pages);
        self.worker
            .spawn(move |b| Msg::GamesLoaded(load_all_games(b, per_page, max_pages)));
    }

    fn load_items(&mut self) {
        if !self.items.gate.try_begin() {
            return;
        }
        let categories = self.items.categories.clone();
        self.worker
            .spawn(move |b| Msg::ItemsLoaded(items::fetch_items(b, &categories)));
    }

    fn load_completions(&mut self) {
        if !self.completions.gate.try_begin() {
            return;
        }
        self.worker
            .spawn(|b| Msg::CompletionsLoaded(b.list_completions()));
    }

    fn load_stats(&mut self) {
        if self.stats.loading {
            return;
        }
        self.stats.loading = true;
        self.worker.spawn(|b| {
            Msg::StatsLoaded(b.stats().and_then(|s| Ok((s, b.list_items(None)?))))
        });
    }

    /// Applies everything the worker finished since last frame.
    fn apply_results(&mut self) {
        for msg in self.worker.drain() {
            self.apply(msg);
        }
    }

    fn apply(&mut self, msg: Msg) {
        match msg {
            Msg::GamesLoaded(result) => {
                if let Err(err) = self.games.finish_load(result) {
                    self.notes.error(&err);
                }
                if self.games.gate.take_pending() {
                    self.load_games();
                }
            }
            Msg::GameSaved(result) => match self.games.finish_save(result) {
                Ok(reload) => {
                    self.notes.success("Game saved");
                    if reload {
                        self.load_games();
                    }
                }
                Err(err) => self.notes.error(&err),
            },
            Msg::GameDeleted(id, result) => match self.games.finish_delete(id, result) {
                Ok(removed) => {
                    self.notes.success("Game deleted");
                    if let Some(game) = removed {
                        for value in [game.front_cover_image, game.back_cover_image].into_iter().flatten() {
                            self.covers.forget(&value);
                        }
                    }
                    self.load_games();
                }
                Err(err) => self.notes.error(&err),
            },
            Msg::ItemsLoaded(result) => {
                if let Err(err) = self.items.finish_load(result) {
                    self.notes.error(&err);
                }
                if self.items.gate.take_pending() {
                    self.load_items();
                }
            }
            Msg::ItemSaved(result) => match self.items.finish_save(result) {
                Ok(()) => {
                    self.notes.success("Item saved");
                    self.load_items();
                }
                Err(err) => self.notes.error(&err),
            },
            Msg::ItemDeleted(id, result) => match result {
                Ok(()) => {
                    self.notes.success("Item deleted");
                    self.items.remove(id);
                }
                Err(err) => self.notes.error(&err),
            },
            Msg::CompletionsLoaded(result) => {
                if let Err(err) = self.completions.finish_load(result) {
                    self.notes.error(&err);
                }
                if self.completions.gate.take_pending() {
                    self.load_completions();
                }
            }
            Msg::CompletionSaved(result) => match self.completions.finish_save(result) {
                Ok(()) => {
                    self.notes.success("Completion saved");
                    self.load_completions();
                }
                Err(err) => self.notes.error(&err),
            },
            Msg::CompletionDeleted(id, result) => match result {
                Ok(()) => {
                    self.notes.success("Completion deleted");
                    self.completions.remove(id);
                }
                Err(err) => self.notes.error(&err),
            },
            Msg::StatsLoaded(result) => {
                if let Err(err) = self.stats.finish_load(result) {
                    self.notes.error(&err);
                }
            }
            Msg::TopSaved(kind, result) => match result {
                Ok(()) => {
                    self.notes.success(format!("{} saved", kind.label()));
                    self.stats.picker = None;
                    self.load_stats();
                }
                Err(err) => self.notes.error(&err),
            },
            Msg::Uploaded(target, result) => match result {
                Ok(uploaded) => self.stage_image(target, uploaded.stored_value()),
                Err(err) => self.notes.error(&err),
            },
            Msg::SplitSourceLoaded(value, result) => match result {
                Ok(image) => {
                    let settings = crate::split::SplitSettings::for_source(&value, self.games.split_settings);
                    self.split = Some(split_tool::SplitTool::new(image, settings));
                }
                Err(err) => {
                    log::warn!("split source failed: {err}");
                    self.notes.push(crate::notify::ToastKind::Error, "Could not load the image to split");
                }
            },
            Msg::Looked(kind, result) => match result {
                Ok(Some(found)) => {
                    let applied = self
                        .games
                        .form
                        .as_mut()
                        .is_some_and(|form| crate::form::apply_lookup(form, kind, &found));
                    if applied {
                        self.notes.success(format!("Filled in {}", kind.label()));
                    } else {
                        self.notes.info(format!("No {} found", kind.label()));
                    }
                }
                Ok(None) => self.notes.info(format!("No {} found", kind.label())),
                Err(err) => self.notes.error(&err),
            },
        }
    }

    fn stage_image(&mut self, target: ImageTarget, value: String) {
        let slot = match target {
            ImageTarget::GameFront => self.games.form.as_mut().map(|f| &mut f.front),
            ImageTarget::GameBack => self.games.form.as_mut().map(|f| &mut f.back),
            ImageTarget::ItemFront => self.items.form.as_mut().map(|f| &mut f.front),
            ImageTarget::ItemBack => self.items.form.as_mut().map(|f| &mut f.back),
        };
        match slot {
            Some(slot) => {
                slot.stage(value);
                self.notes.success("Image uploaded");
            }
            None => log::debug!("upload finished after its form was closed"),
        }
    }

    /// Native file dialog, then a background upload.
    fn pick_and_upload(&mut self, target: ImageTarget) {
        let Some(path) = rfd::FileDialog::new()
            .add_filter("Image", &["png", "jpg", "jpeg", "webp", "gif"])
            .pick_file()
        else {
            return;
        };
        let bytes = match std::fs::read(&path) {
            Ok(bytes) => bytes,
            Err(err) => {
                self.notes.push(crate::notify::ToastKind::Error, format!("Could not read {}: {err}", path.display()));
                return;
            }
        };
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "image.jpg".to_owned());
        self.worker
            .spawn(move |b| Msg::Uploaded(target, b.upload_image(&name, bytes)));
    }

    fn run_confirmed_delete(&mut self, pending: PendingDelete) {
        match pending {
            PendingDelete::Game(id) => self.worker.spawn(move |b| Msg::GameDeleted(id, b.delete_game(id))),
            PendingDelete::Item(id) => self.worker.spawn(move |b| Msg::ItemDeleted(id, b.delete_item(id))),
            PendingDelete::Completion(id) => {
                self.worker
                    .spawn(move |b| Msg::CompletionDeleted(id, b.delete_completion(id)));
            }
        }
    }

    fn open_page(&mut self, page: Page) {
        self.page = page;
        match page {
            Page::Items if !self.items.is_loaded() => self.load_items(),
            Page::Completions if !self.completions.is_loaded() => self.load_completions(),
            Page::Stats => self.load_stats(),
            Page::Games | Page::Items | Page::Completions | Page::Wheel => {}
        }
    }

    /// Earliest timer the visible page is waiting on.
    fn schedule_repaint(&self, ctx: &egui::Context) {
        let now = Instant::now();
        let showing_coverflow = self.page == Page::Games && self.games.view() == crate::prefs::ViewMode::Coverflow;
        let deadlines = [
            self.games.coverflow.next_tick().filter(|_| showing_coverflow),
            self.wheel.wheel.next_deadline().filter(|_| self.page == Page::Wheel),
            self.completions.editor.as_ref().and_then(|e| e.linker.deadline()),
        ];
        if let Some(next) = deadlines.into_iter().flatten().min() {
            ctx.request_repaint_after(next.saturating_duration_since(now).max(Duration::from_millis(16)));
        }
    }
}

/// A cover texture, or a grey card with the title while it loads.
fn paint_cover(
    painter: &egui::Painter,
    covers: &mut CoverCache,
    value: Option<&str>,
    rect: egui::Rect,
    title: &str,
) {
    let uv = egui::Rect::from_min_max(egui::pos2(0.0, 0.0), egui::pos2(1.0, 1.0));
    match value.and_then(|v| covers.get(painter.ctx(), v)) {
        Some(texture) => {
            painter.image(texture.id(), rect, uv, egui::Color32::WHITE);
        }
        None => {
            painter.rect_filled(rect, 4.0, egui::Color32::from_gray(45));
            let galley = painter.layout(
                title.to_owned(),
                egui::FontId::proportional(13.0),
                egui::Color32::from_gray(200),
                rect.width() - 8.0,
            );
            let pos = rect.center() - galley.size() / 2.0;
            painter.galley(pos, galley, egui::Color32::from_gray(200));
        }
    }
}

fn cover_widget(
    ui: &mut egui::Ui,
    covers: &mut CoverCache,
    value: Option<&str>,
    size: egui::Vec2,
    title: &str,
) -> egui::Response {
    let (rect, response) = ui.allocate_exact_size(size, egui::Sense::click());
    if ui.is_rect_visible(rect) {
        paint_cover(ui.painter(), covers, value, rect, title);
        if response.hovered() {
            ui.painter().rect_stroke(
                rect,
                4.0,
                egui::Stroke::new(2.0, ui.visuals().selection.bg_fill),
                egui::StrokeKind::Outside,
            );
        }
    }
    response.on_hover_text(title)
}

/// Preview, URL box and upload button for one image field. Returns `true` when
/// an upload was requested.
fn image_slot_ui(
    ui: &mut egui::Ui,
    covers: &mut CoverCache,
    label: &str,
    slot: &mut crate::form::ImageSlot,
) -> bool {
    let mut upload = false;
    ui.vertical(|ui| {
        ui.strong(label);
        let current = slot.resolve();
        cover_widget(ui, covers, current.as_deref(), egui::vec2(120.0, 150.0), "No image");
        ui.add(egui::TextEdit::singleline(&mut slot.url_input).hint_text("Image URL").desired_width(160.0));
        ui.horizontal(|ui| {
            upload = ui.button("Upload…").clicked();
            if ui.button("Clear").clicked() {
                slot.clear();
            }
        });
    });
    upload
}

/// Text box plus "N/A" tick box.
fn optional_number_ui(ui: &mut egui::Ui, number: &mut crate::form::OptionalNumber) {
    ui.horizontal(|ui| {
        ui.add_enabled(
            !number.not_applicable,
            egui::TextEdit::singleline(&mut number.text).desired_width(80.0),
        );
        ui.checkbox(&mut number.not_applicable, "N/A");
    });
}

fn money(value: Option<f64>) -> String {
    value.map_or_else(|| "–".to_owned(), |v| format!("${v:.2}"))
}

impl eframe::App for ShelfApp {
    /// Called by the framework to save state before shutdown.
    fn save(&mut self, storage: &mut dyn eframe::Storage) {
        self.games.prefs().save(storage);
    }

    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.apply_results();

        egui::TopBottomPanel::top("top_panel").show(ctx, |ui| {
            egui::MenuBar::new().ui(ui, |ui| {
                ui.menu_button("File", |ui| {
                    if ui.button("Reload").clicked() {
                        self.load_games();
                    }
                    if ui.button("Quit").clicked() {
                        ctx.send_viewport_cmd(egui::ViewportCommand::Close);
                    }
                });
                ui.add_space(16.0);
                for page in Page::ALL {
                    if ui.selectable_label(self.page == page, page.label()).clicked() {
                        self.open_page(page);
                    }
                }
                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    egui::widgets::global_theme_preference_buttons(ui);
                    if self.games.gate.is_busy() {
                        ui.spinner();
                    }
                });
            });
        });

        egui::CentralPanel::default().show(ctx, |ui| match self.page {
            Page::Games => self.games_page(ui),
            Page::Items => self.items_page(ui),
            Page::Completions => self.completions_page(ui),
            Page::Stats => self.stats_page(ui),
            Page::Wheel => self.wheel_page(ui),
        });

        self.game_windows(ctx);
        self.item_windows(ctx);
        self.completion_windows(ctx);
        self.stats_windows(ctx);
        self.split_window(ctx);

        if let Some(pending) = self.confirm.show(ctx) {
            self.run_confirmed_delete(pending);
        }
        self.notes.show(ctx);
        self.schedule_repaint(ctx);
    }
}
