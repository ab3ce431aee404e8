use egui::{TextureHandle, TextureOptions};
use image::DynamicImage;

use super::ShelfApp;
use crate::covers::to_color_image;
use crate::split::{SplitAxis, SplitSession, SplitSettings};

/// The split-cover window: one loaded image plus preview textures.
pub(super) struct SplitTool {
    session: SplitSession,
    previews: Option<(TextureHandle, TextureHandle)>,
    dirty: bool,
}

impl SplitTool {
    pub(super) fn new(image: DynamicImage, settings: SplitSettings) -> Self {
        Self { session: SplitSession::new(image, settings), previews: None, dirty: true }
    }

    fn refresh(&mut self, ctx: &egui::Context) -> crate::error::Result<()> {
        if !self.dirty {
            return Ok(());
        }
        self.dirty = false;
        let (front, back) = self.session.preview_halves()?;
        self.previews = Some((
            ctx.load_texture("split_front", to_color_image(&front), TextureOptions::LINEAR),
            ctx.load_texture("split_back", to_color_image(&back), TextureOptions::LINEAR),
        ));
        Ok(())
    }
}

fn preview(ui: &mut egui::Ui, label: &str, texture: &TextureHandle) {
    ui.vertical(|ui| {
        ui.strong(label);
        let size = texture.size_vec2();
        let scale = (240.0 / size.y).min(260.0 / size.x).min(1.0);
        ui.add(egui::Image::new((texture.id(), size * scale)));
    });
}

impl ShelfApp {
    pub(super) fn split_window(&mut self, ctx: &egui::Context) {
        let Some(mut tool) = self.split.take() else { return };
        if let Err(err) = tool.refresh(ctx) {
            self.notes.error(&err);
        }

        let mut open = true;
        let mut apply = false;
        let mut cancel = false;
        egui::Window::new("Split cover")
            .id(egui::Id::new("split_tool"))
            .open(&mut open)
            .default_width(560.0)
            .show(ctx, |ui| {
                let (w, h) = tool.session.source_size();
                ui.weak(format!("Source is {w}×{h}"));
                let settings = &mut tool.session.settings;
                let before = *settings;
                ui.horizontal(|ui| {
                    ui.radio_value(&mut settings.axis, SplitAxis::Vertical, "Side by side");
                    ui.radio_value(&mut settings.axis, SplitAxis::Horizontal, "Stacked");
                    ui.checkbox(&mut settings.swap, "Swap front and back");
                });
                ui.add(egui::Slider::new(settings.position_mut(), 5.0..=95.0).suffix("%").text("cut at"));
                if *settings != before {
                    tool.dirty = true;
                }

                if let Some((front, back)) = &tool.previews {
                    ui.horizontal(|ui| {
                        preview(ui, "Front", front);
                        ui.add_space(8.0);
                        preview(ui, "Back", back);
                    });
                }
                ui.separator();
                ui.horizontal(|ui| {
                    apply = ui.button("✔ Use these").clicked();
                    cancel = ui.button("Cancel").clicked();
                });
            });

        if apply {
            match tool.session.export() {
                Ok(result) => {
                    self.games.split_settings = tool.session.settings;
                    match self.games.form.as_mut() {
                        Some(form) => {
                            form.front.stage(result.front);
                            form.back.stage(result.back);
                            self.notes.success("Cover split into front and back");
                        }
                        None => log::debug!("split finished after the game form was closed"),
                    }
                    return;
                }
                Err(err) => self.notes.error(&err),
            }
        }
        if open && !cancel {
            self.split = Some(tool);
        }
    }
}
