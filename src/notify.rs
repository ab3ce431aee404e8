//! Toasts and confirmation dialogs shared by every page.

use std::time::{Duration, Instant};

use crate::error::ShelfError;

pub const TOAST_TTL: Duration = Duration::from_secs(4);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ToastKind {
    Info,
    Success,
    Error,
}

#[derive(Clone, Debug)]
pub struct Toast {
    pub kind: ToastKind,
    pub text: String,
    expires: Instant,
}

#[derive(Debug, Default)]
pub struct Notifications {
    toasts: Vec<Toast>,
}

impl Notifications {
    pub fn push(&mut self, kind: ToastKind, text: impl Into<String>) {
        let text = text.into();
        match kind {
            ToastKind::Error => log::warn!("{text}"),
            ToastKind::Info | ToastKind::Success => log::info!("{text}"),
        }
        self.toasts.push(Toast { kind, text, expires: Instant::now() + TOAST_TTL });
    }

    pub fn info(&mut self, text: impl Into<String>) {
        self.push(ToastKind::Info, text);
    }

    pub fn success(&mut self, text: impl Into<String>) {
        self.push(ToastKind::Success, text);
    }

    pub fn error(&mut self, err: &ShelfError) {
        self.push(ToastKind::Error, err.user_message());
    }

    pub fn prune(&mut self, now: Instant) {
        self.toasts.retain(|t| t.expires > now);
    }

    /// Newest first.
    pub fn visible(&self) -> impl Iterator<Item = &Toast> {
        self.toasts.iter().rev()
    }

    pub fn show(&mut self, ctx: &egui::Context) {
        self.prune(Instant::now());
        if self.toasts.is_empty() {
            return;
        }
        egui::Area::new(egui::Id::new("toasts"))
            .anchor(egui::Align2::RIGHT_BOTTOM, egui::vec2(-12.0, -12.0))
            .order(egui::Order::Foreground)
            .show(ctx, |ui| {
                for toast in self.visible() {
                    let color = match toast.kind {
                        ToastKind::Info => egui::Color32::from_rgb(60, 110, 180),
                        ToastKind::Success => egui::Color32::from_rgb(40, 140, 80),
                        ToastKind::Error => egui::Color32::from_rgb(180, 50, 50),
                    };
                    egui::Frame::new()
                        .fill(color)
                        .corner_radius(6.0)
                        .inner_margin(egui::Margin::symmetric(12, 8))
                        .show(ui, |ui| {
                            ui.colored_label(egui::Color32::WHITE, &toast.text);
                        });
                    ui.add_space(6.0);
                }
            });
        ctx.request_repaint_after(Duration::from_millis(250));
    }
}

/// An action waiting for the user to say yes.
#[derive(Debug)]
pub struct Confirm<T> {
    pending: Option<(String, T)>,
}

impl<T> Default for Confirm<T> {
    fn default() -> Self {
        Self { pending: None }
    }
}

impl<T> Confirm<T> {
    pub fn ask(&mut self, question: impl Into<String>, payload: T) {
        self.pending = Some((question.into(), payload));
    }

    pub fn cancel(&mut self) {
        self.pending = None;
    }

    /// Hands the payload back once confirmed.
    pub fn confirm(&mut self) -> Option<T> {
        self.pending.take().map(|(_, payload)| payload)
    }

    pub fn show(&mut self, ctx: &egui::Context) -> Option<T> {
        let (question, _) = self.pending.as_ref()?;
        let mut answer = None;
        egui::Window::new("Please confirm")
            .collapsible(false)
            .resizable(false)
            .anchor(egui::Align2::CENTER_CENTER, egui::Vec2::ZERO)
            .show(ctx, |ui| {
                ui.label(question.as_str());
                ui.add_space(8.0);
                ui.horizontal(|ui| {
                    if ui.button("Delete").clicked() {
                        answer = Some(true);
                    }
                    if ui.button("Cancel").clicked() {
                        answer = Some(false);
                    }
                });
            });
        match answer {
            Some(true) => self.confirm(),
            Some(false) => {
                self.cancel();
                None
            }
            None => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn toasts_expire() {
        let mut n = Notifications::default();
        n.info("Saved");
        n.error(&ShelfError::Rejected("Nope".to_owned()));
        let texts: Vec<_> = n.visible().map(|t| t.text.clone()).collect();
        assert_eq!(texts, vec!["Nope", "Saved"]);
        n.prune(Instant::now() + TOAST_TTL + Duration::from_millis(1));
        assert_eq!(n.visible().count(), 0);
    }

    #[test]
    fn confirm_returns_payload_once() {
        let mut c = Confirm::default();
        assert_eq!(c.confirm(), None);
        c.ask("Delete Okami?", 7_i64);
        assert_eq!(c.confirm(), Some(7));
        assert_eq!(c.confirm(), None);
        c.ask("Delete?", 8);
        c.cancel();
        assert_eq!(c.confirm(), None);
    }
}
