use std::time::Instant;

use super::{Msg, Page, PendingDelete, ShelfApp};
use crate::completions::{self, CompletionEditor, LinkResolution};
use crate::form::CompletionForm;
use crate::model::{CompletionStatus, Id};

enum Action {
    Edit(Id),
    Delete(Id),
    OpenGame(Id),
}

impl ShelfApp {
    pub(super) fn completions_page(&mut self, ui: &mut egui::Ui) {
        ui.horizontal(|ui| {
            if ui.button("➕ Log a completion").clicked() {
                self.completions.editor = Some(CompletionEditor::new(CompletionForm::default(), self.games.all()));
            }
            if ui.button("⟳").on_hover_text("Reload").clicked() {
                self.load_completions();
            }
            if self.completions.gate.is_busy() {
                ui.spinner();
            }
        });
        ui.separator();

        let mut action = None;
        let ordered = self.completions.ordered();
        egui::ScrollArea::vertical().auto_shrink([false; 2]).show(ui, |ui| {
            let mut heading = None;
            for completion in ordered {
                let status = completion.status();
                if heading != Some(status) {
                    heading = Some(status);
                    ui.add_space(8.0);
                    ui.heading(match status {
                        CompletionStatus::InProgress => "In progress",
                        CompletionStatus::Completed => "Completed",
                    });
                }
                ui.horizontal(|ui| {
                    if ui.link(&completion.title).clicked() {
                        action = Some(Action::Edit(completion.id));
                    }
                    if !completion.platform.is_empty() {
                        ui.weak(&completion.platform);
                    }
                    let dates = match (&completion.date_started, &completion.date_completed) {
                        (Some(start), Some(end)) => format!("{start} → {end}"),
                        (Some(start), None) => format!("since {start}"),
                        (None, Some(end)) => format!("finished {end}"),
                        (None, None) => String::new(),
                    };
                    ui.label(dates);
                    if let Some(time) = &completion.time_taken {
                        ui.label(format!("⏱ {time}"));
                    }
                    if let Some(game_id) = completion.game_id
                        && ui.small_button("🎮").on_hover_text("Open the linked game").clicked()
                    {
                        action = Some(Action::OpenGame(game_id));
                    }
                    if ui.small_button("🗑").on_hover_text("Delete").clicked() {
                        action = Some(Action::Delete(completion.id));
                    }
                });
                if let Some(notes) = &completion.notes {
                    ui.indent(completion.id, |ui| ui.weak(notes));
                }
            }
        });

        match action {
            Some(Action::Edit(id)) => {
                if let Some(form) = self.completions.get(id).map(CompletionForm::edit) {
                    self.completions.editor = Some(CompletionEditor::new(form, self.games.all()));
                }
            }
            Some(Action::Delete(id)) => {
                if let Some(c) = self.completions.get(id) {
                    self.confirm.ask(format!("Delete the completion of \"{}\"?", c.title), PendingDelete::Completion(id));
                }
            }
            Some(Action::OpenGame(id)) => {
                self.games.detail = Some(id);
                self.open_page(Page::Games);
            }
            None => {}
        }
    }

    pub(super) fn completion_windows(&mut self, ctx: &egui::Context) {
        let Some(mut editor) = self.completions.editor.take() else { return };
        let now = Instant::now();
        editor.linker.poll(now, self.games.all());

        let mut open = true;
        let mut save = false;
        let mut cancel = false;
        let mut auto_link = false;
        let mut answer = false;
        let saving = self.completions.is_saving();

        let title = if editor.form.id.is_some() { "Edit completion" } else { "Log a completion" };
        egui::Window::new(title)
            .id(egui::Id::new("completion_form"))
            .open(&mut open)
            .default_width(480.0)
            .show(ctx, |ui| {
                let form = &mut editor.form;
                egui::Grid::new("completion_fields").num_columns(2).show(ui, |ui| {
                    ui.label("Title *");
                    ui.text_edit_singleline(&mut form.title);
                    ui.end_row();
                    ui.label("Platform");
                    ui.text_edit_singleline(&mut form.platform);
                    ui.end_row();
                    ui.label("Started");
                    ui.add(egui::TextEdit::singleline(&mut form.date_started).hint_text("YYYY-MM-DD"));
                    ui.end_row();
                    ui.label("Completed");
                    ui.add(egui::TextEdit::singleline(&mut form.date_completed).hint_text("blank while playing"));
                    ui.end_row();
                    ui.label("Time taken");
                    ui.add(egui::TextEdit::singleline(&mut form.time_taken).hint_text("e.g. 42h"));
                    ui.end_row();
                });
                ui.label("Notes");
                ui.add(egui::TextEdit::multiline(&mut form.notes).desired_rows(3));

                ui.separator();
                ui.strong("Linked game");
                match editor.linked_title.clone() {
                    Some(linked) => {
                        ui.horizontal(|ui| {
                            ui.label(linked);
                            if ui.small_button("Unlink").clicked() {
                                editor.unlink();
                            }
                        });
                    }
                    None => {
                        ui.horizontal(|ui| {
                            let search = ui.add(
                                egui::TextEdit::singleline(&mut editor.linker.query).hint_text("Search your games"),
                            );
                            if search.changed() {
                                editor.linker.edited(now);
                            }
                            auto_link = ui.button("Match title").clicked();
                        });
                        let mut chosen = None;
                        for game in editor.linker.matches() {
                            if ui.selectable_label(false, format!("{} ({})", game.title, game.platform)).clicked() {
                                chosen = Some(game.clone());
                            }
                        }
                        if let Some(game) = chosen {
                            editor.link(&game);
                        }
                    }
                }

                if let Some(d) = &editor.disambiguation {
                    ui.separator();
                    ui.label(d.prompt());
                    ui.horizontal(|ui| {
                        let reply = ui.add(egui::TextEdit::singleline(&mut editor.answer).desired_width(60.0));
                        answer = ui.button("OK").clicked()
                            || (reply.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter)));
                    });
                }

                ui.separator();
                ui.horizontal(|ui| {
                    save = ui.add_enabled(!saving, egui::Button::new("💾 Save")).clicked();
                    cancel = ui.button("Cancel").clicked();
                    if saving {
                        ui.spinner();
                    }
                });
            });

        if auto_link {
            match editor.auto_link(self.games.all()) {
                LinkResolution::NoMatch => self.notes.info("No game in your collection has that title"),
                LinkResolution::Unique(game) => self.notes.success(format!("Linked to {}", game.title)),
                LinkResolution::Ambiguous(_) => {}
            }
        }
        if answer && let Err(err) = editor.answer_disambiguation() {
            self.notes.error(&err);
        }
        if save {
            match editor.form.to_payload() {
                Ok(payload) => {
                    if self.completions.begin_save() {
                        let id = editor.form.id;
                        self.worker
                            .spawn(move |b| Msg::CompletionSaved(completions::save_completion(b, id, &payload)));
                    }
                }
                Err(err) => self.notes.error(&err),
            }
        }
        if open && !cancel {
            self.completions.editor = Some(editor);
        }
    }
}
