#![warn(clippy::all, rust_2018_idioms)]

pub mod api;
mod app;
pub mod completions;
pub mod config;
pub mod coverflow;
pub mod covers;
pub mod error;
pub mod filter;
pub mod form;
pub mod games;
pub mod images;
pub mod items;
pub mod loader;
pub mod model;
pub mod notify;
pub mod prefs;
pub mod split;
pub mod stats;
pub mod wheel;
pub mod worker;

#[cfg(test)]
mod testing;

pub use app::ShelfApp;

use std::sync::Arc;

use eframe::NativeOptions;

use crate::api::HttpBackend;
use crate::config::Config;

impl ShelfApp {
    /// Opens the window and runs until it is closed.
    pub fn run(options: NativeOptions, config: Config) -> Result<(), eframe::Error> {
        eframe::run_native(
            "Game Shelf",
            options,
            Box::new(move |cc| {
                let backend = HttpBackend::new(config.clone())?;
                Ok(Box::new(ShelfApp::new(cc, config, Arc::new(backend))))
            }),
        )
    }
}
