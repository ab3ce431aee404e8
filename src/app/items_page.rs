use egui::vec2;

use super::{ImageTarget, Msg, PendingDelete, ShelfApp, cover_widget, image_slot_ui, money, optional_number_ui};
use crate::form::ItemForm;
use crate::items::{self, CATEGORIES, ItemView};
use crate::model::Id;

enum Action {
    Edit(Id),
    Delete(Id),
}

impl ShelfApp {
    pub(super) fn items_page(&mut self, ui: &mut egui::Ui) {
        let mut reload = false;
        ui.horizontal_wrapped(|ui| {
            ui.label("Show:");
            for category in CATEGORIES {
                let on = self.items.categories.iter().any(|c| c == category);
                if ui.selectable_label(on, category).clicked() {
                    self.items.toggle_category(category);
                    reload = true;
                }
            }
            ui.separator();
            ui.add(egui::TextEdit::singleline(&mut self.items.search).hint_text("Search").desired_width(180.0));
            ui.selectable_value(&mut self.items.view, ItemView::List, "List");
            ui.selectable_value(&mut self.items.view, ItemView::Grid, "Grid");
            ui.separator();
            if ui.button("➕ Add item").clicked() {
                self.items.form = Some(ItemForm::default());
            }
            if ui.button("⟳").on_hover_text("Reload").clicked() {
                reload = true;
            }
            if self.items.gate.is_busy() {
                ui.spinner();
            }
        });
        ui.separator();
        if reload {
            self.load_items();
        }

        let visible = self.items.visible();
        if visible.is_empty() {
            if self.items.is_loaded() {
                ui.label("Nothing here yet.");
            }
            return;
        }

        let mut action = None;
        let covers = &mut self.covers;
        egui::ScrollArea::vertical().auto_shrink([false; 2]).show(ui, |ui| match self.items.view {
            ItemView::List => {
                egui::Grid::new("items_table").num_columns(6).striped(true).show(ui, |ui| {
                    for heading in ["Name", "Platform", "Category", "Condition", "Value", ""] {
                        ui.strong(heading);
                    }
                    ui.end_row();
                    for item in &visible {
                        if ui.link(&item.title).clicked() {
                            action = Some(Action::Edit(item.id));
                        }
                        ui.label(&item.platform);
                        ui.label(&item.category);
                        ui.label(item.condition.as_deref().unwrap_or(""));
                        ui.label(money(item.pricecharting_price.or(item.price_paid)));
                        ui.horizontal(|ui| {
                            if ui.small_button("Edit").clicked() {
                                action = Some(Action::Edit(item.id));
                            }
                            if ui.small_button("🗑").on_hover_text("Delete").clicked() {
                                action = Some(Action::Delete(item.id));
                            }
                        });
                        ui.end_row();
                    }
                });
            }
            ItemView::Grid => {
                ui.horizontal_wrapped(|ui| {
                    for item in &visible {
                        ui.vertical(|ui| {
                            ui.set_width(140.0);
                            let response =
                                cover_widget(ui, covers, item.front_image.as_deref(), vec2(140.0, 140.0), &item.title);
                            if response.clicked() {
                                action = Some(Action::Edit(item.id));
                            }
                            response.context_menu(|ui| {
                                if ui.button("Delete").clicked() {
                                    action = Some(Action::Delete(item.id));
                                }
                            });
                            ui.add(egui::Label::new(egui::RichText::new(&item.category).small()).truncate());
                        });
                    }
                });
            }
        });

        match action {
            Some(Action::Edit(id)) => {
                if let Some(form) = self.items.get(id).map(ItemForm::edit) {
                    self.items.form = Some(form);
                }
            }
            Some(Action::Delete(id)) => {
                if let Some(item) = self.items.get(id) {
                    self.confirm.ask(format!("Delete \"{}\"?", item.title), PendingDelete::Item(id));
                }
            }
            None => {}
        }
    }

    pub(super) fn item_windows(&mut self, ctx: &egui::Context) {
        let Some(mut form) = self.items.form.take() else { return };
        let mut open = true;
        let mut save = false;
        let mut cancel = false;
        let mut upload = None;
        let saving = self.items.is_saving();

        let title = if form.id.is_some() { "Edit item" } else { "Add item" };
        egui::Window::new(title)
            .id(egui::Id::new("item_form"))
            .open(&mut open)
            .default_width(520.0)
            .show(ctx, |ui| {
                egui::Grid::new("item_form_fields").num_columns(2).show(ui, |ui| {
                    ui.label("Name *");
                    ui.text_edit_singleline(&mut form.title);
                    ui.end_row();
                    ui.label("Platform");
                    ui.text_edit_singleline(&mut form.platform);
                    ui.end_row();
                    ui.label("Category");
                    egui::ComboBox::from_id_salt("item_category")
                        .selected_text(form.category.clone())
                        .show_ui(ui, |ui| {
                            for category in CATEGORIES {
                                ui.selectable_value(&mut form.category, category.to_owned(), category);
                            }
                        });
                    ui.end_row();
                    ui.label("Condition");
                    ui.text_edit_singleline(&mut form.condition);
                    ui.end_row();
                    ui.label("Price paid");
                    optional_number_ui(ui, &mut form.price_paid);
                    ui.end_row();
                    ui.label("PriceCharting");
                    optional_number_ui(ui, &mut form.pricecharting);
                    ui.end_row();
                });
                ui.label("Notes");
                ui.add(egui::TextEdit::multiline(&mut form.notes).desired_rows(3));
                ui.separator();
                ui.horizontal(|ui| {
                    if image_slot_ui(ui, &mut self.covers, "Front", &mut form.front) {
                        upload = Some(ImageTarget::ItemFront);
                    }
                    if image_slot_ui(ui, &mut self.covers, "Back", &mut form.back) {
                        upload = Some(ImageTarget::ItemBack);
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

        if save {
            match form.to_payload() {
                Ok(payload) => {
                    if self.items.begin_save() {
                        let id = form.id;
                        self.worker
                            .spawn(move |b| Msg::ItemSaved(items::save_item(b, id, &payload)));
                    }
                }
                Err(err) => self.notes.error(&err),
            }
        }
        if open && !cancel {
            self.items.form = Some(form);
        }
        if let Some(target) = upload {
            self.pick_and_upload(target);
        }
    }
}
