#![cfg_attr(not(debug_assertions), windows_subsystem = "windows")]

use std::env;
use std::path::PathBuf;

use anyhow::anyhow;
use eframe::egui::ViewportBuilder;
use eframe::NativeOptions;

mod files;
mod grid;
mod gui;
mod load;
mod view;

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let dir = env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("."));
    let files = files::discover(&dir)?;
    log::info!("{} images under {}", files.len(), dir.display());

    let opts = NativeOptions {
        viewport: ViewportBuilder::default().with_inner_size([800.0, 600.0]),
        ..Default::default()
    };
    eframe::run_native(
        "pictile",
        opts,
        Box::new(move |cc| Box::new(gui::BrowserApp::new(files, cc.egui_ctx.clone()))),
    )
    .map_err(|err| anyhow!("window setup failed: {err}"))
}
