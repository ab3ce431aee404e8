//! Runs backend calls off the UI thread.
//!
//! Each job gets its own thread and reports back through a channel that the UI
//! drains once per frame, so results are applied on the UI thread in the order
//! they arrive.

use std::sync::Arc;
use std::sync::mpsc::{Receiver, Sender, channel};

use crate::api::Backend;

pub struct Worker<M> {
    backend: Arc<dyn Backend>,
    tx: Sender<M>,
    rx: Receiver<M>,
    ctx: Option<egui::Context>,
}

impl<M: Send + 'static> Worker<M> {
    pub fn new(backend: Arc<dyn Backend>) -> Self {
        let (tx, rx) = channel();
        Self { backend, tx, rx, ctx: None }
    }

    /// Lets finished jobs wake the UI up.
    pub fn with_context(mut self, ctx: egui::Context) -> Self {
        self.ctx = Some(ctx);
        self
    }

    pub fn spawn(&self, job: impl FnOnce(&dyn Backend) -> M + Send + 'static) {
        let backend = Arc::clone(&self.backend);
        let tx = self.tx.clone();
        let ctx = self.ctx.clone();
        std::thread::spawn(move || {
            let message = job(backend.as_ref());
            if tx.send(message).is_err() {
                log::debug!("worker result dropped, receiver is gone");
            }
            if let Some(ctx) = ctx {
                ctx.request_repaint();
            }
        });
    }

    /// Everything that finished since the last call.
    pub fn drain(&self) -> Vec<M> {
        self.rx.try_iter().collect()
    }

    #[cfg(test)]
    pub fn wait(&self, timeout: std::time::Duration) -> Option<M> {
        self.rx.recv_timeout(timeout).ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::load_all_games;
    use crate::testing::{Call, MockBackend, game};
    use std::time::Duration;

    #[test]
    fn results_come_back_through_the_channel() {
        let backend: Arc<dyn Backend> =
            Arc::new(MockBackend::with_games(vec![game(1, "Okami", "PS2"), game(2, "Ico", "PS2")]));
        let worker = Worker::new(backend).with_context(egui::Context::default());
        worker.spawn(|b| load_all_games(b, 1, 10).map(|g| g.len()));
        let result = worker.wait(Duration::from_secs(5)).expect("job finished");
        assert_eq!(result.unwrap(), 2);
        assert!(worker.drain().is_empty());
    }

    #[test]
    fn uploads_report_the_value_to_store() {
        let mock = Arc::new(MockBackend::default());
        let backend: Arc<dyn Backend> = mock.clone();
        let worker = Worker::new(backend);
        worker.spawn(|b| b.upload_image("okami_front.png", vec![0x89, b'P', b'N', b'G']));
        let uploaded = worker.wait(Duration::from_secs(5)).expect("job finished").unwrap();
        assert_eq!(uploaded.stored_value(), "okami_front.png");
        assert_eq!(mock.calls(), vec![Call::Upload("okami_front.png".to_owned())]);

        let url_only = crate::model::UploadedImage { url: "http://localhost/uploads/a.png".to_owned(), path: String::new() };
        assert_eq!(url_only.stored_value(), "http://localhost/uploads/a.png");
    }
}
