use eframe::egui::{
    self, Color32, ColorImage, Key, Pos2, Rect, Stroke, TextureHandle, TextureOptions,
};

use crate::files::{FileEntry, ThumbState};
use crate::grid::{self, CellRect, GridView, SCROLL_STEP, TILE_BORDER, TILE_SIZE};
use crate::load::{LoadResult, Pipeline, Surface, RESULTS_PER_FRAME};
use crate::view::{self, ViewRect};

const BACKGROUND: Color32 = Color32::from_rgb(23, 36, 42);
const PLACEHOLDER: Color32 = Color32::from_rgb(58, 71, 80);

#[inline]
fn uv_full() -> Rect {
    Rect::from_min_max(Pos2::new(0.0, 0.0), Pos2::new(1.0, 1.0))
}

/* ───────────────────────── app state ────────────────────────────── */

/// Full-resolution image state for the current selection. Replaced
/// wholesale on navigation; the old texture is freed when its handle
/// drops.
#[derive(Default)]
enum FullState {
    #[default]
    Pending,
    Ready {
        tex: TextureHandle,
        w: u32,
        h: u32,
    },
    Failed,
}

pub struct BrowserApp {
    files: Vec<FileEntry>,
    current: usize,
    full: FullState,
    pipeline: Pipeline,

    win_w: f32,
    win_h: f32,
    display_rect: ViewRect,
    zooming: bool,
    cursor: Pos2,

    grid_mode: bool,
    grid: GridView,

    title_dirty: bool,
}

impl BrowserApp {
    /// `files` comes from discovery and is non-empty; its length never
    /// changes afterwards.
    pub fn new(files: Vec<FileEntry>, ctx: egui::Context) -> Self {
        let pipeline = Pipeline::start(files.len(), ctx);
        for (i, entry) in files.iter().enumerate() {
            pipeline.request_thumbnail(i, &entry.thumb_path);
        }
        pipeline.request_full_image(0, &files[0].source_path);

        let grid = GridView::new(files.len(), 800, 600);
        let mut app = BrowserApp {
            files,
            current: 0,
            full: FullState::Pending,
            pipeline,
            win_w: 800.0,
            win_h: 600.0,
            display_rect: view::letterbox(1, 1, 800.0, 600.0),
            zooming: false,
            cursor: Pos2::ZERO,
            grid_mode: false,
            grid,
            title_dirty: true,
        };
        app.update_display_rect();
        app
    }

    /* ─────────────────────── navigation ─────────────────────────── */

    fn next(&mut self) {
        if self.current + 1 < self.files.len() {
            self.current += 1;
            self.change_image();
        }
    }

    fn prev(&mut self) {
        if self.current > 0 {
            self.current -= 1;
            self.change_image();
        }
    }

    /// Select a new image: drop the old full texture, request the new one
    /// (bumping the generation), fall back to the thumbnail meanwhile.
    fn change_image(&mut self) {
        self.full = FullState::Pending;
        self.zooming = false;
        self.pipeline
            .request_full_image(self.current, &self.files[self.current].source_path);
        self.title_dirty = true;
        self.update_display_rect();
    }

    /* ─────────────────────── merge loop ─────────────────────────── */

    /// Drain up to `RESULTS_PER_FRAME` decode results, non-blocking. A
    /// landed full image short-circuits the drain; one swap per frame is
    /// enough.
    fn drain_results(&mut self, ctx: &egui::Context) {
        for _ in 0..RESULTS_PER_FRAME {
            let Some(result) = self.pipeline.try_recv() else { break };
            if !self.apply_result(ctx, result) {
                break;
            }
        }
    }

    /// Merge one result into per-file state. Returns false when draining
    /// should stop for this frame.
    fn apply_result(&mut self, ctx: &egui::Context, result: LoadResult) -> bool {
        match result {
            LoadResult::Thumb { index, surface } => {
                match surface {
                    Ok(surface) => {
                        let tex = upload(ctx, &self.files[index].name, &surface);
                        let layout = grid::tile_fit(surface.w, surface.h);
                        self.files[index].thumb = ThumbState::Ready {
                            tex,
                            w: surface.w,
                            h: surface.h,
                            layout,
                        };
                        // The thumbnail stands in full-screen until the real
                        // image lands; frame it properly.
                        if index == self.current && !matches!(self.full, FullState::Ready { .. }) {
                            self.update_display_rect();
                        }
                    }
                    Err(err) => {
                        log::warn!("thumbnail for {} failed: {err:#}", self.files[index].name);
                        self.files[index].thumb = ThumbState::Failed;
                    }
                }
                true
            }
            LoadResult::Full { index, surface } => {
                // Second gate on top of the worker's generation check: a
                // fast double-navigation can still outrun a completed decode.
                if index != self.current {
                    log::debug!("dropping full image for off-selection index {index}");
                    return true;
                }
                match surface {
                    Ok(surface) => {
                        let tex = upload(ctx, &self.files[index].name, &surface);
                        self.full = FullState::Ready { tex, w: surface.w, h: surface.h };
                        self.update_display_rect();
                        false
                    }
                    Err(err) => {
                        log::warn!("loading {} failed: {err:#}", self.files[index].name);
                        self.full = FullState::Failed;
                        true
                    }
                }
            }
        }
    }

    /* ─────────────────────── view state ─────────────────────────── */

    /// Current showable dimensions: full image, else thumbnail, else a
    /// 1x1 placeholder.
    fn showable_size(&self) -> (u32, u32) {
        match &self.full {
            FullState::Ready { w, h, .. } => (*w, *h),
            _ => self.files[self.current].thumb_size().unwrap_or((1, 1)),
        }
    }

    fn update_display_rect(&mut self) {
        let (w, h) = self.showable_size();
        let boxed = view::letterbox(w, h, self.win_w, self.win_h);
        self.display_rect = match &self.full {
            FullState::Ready { w, h, .. } if self.zooming => view::zoom_rect(
                &boxed,
                *w,
                *h,
                self.win_w,
                self.win_h,
                self.cursor.x,
                self.cursor.y,
            ),
            _ => boxed,
        };
    }

    fn sync_window_size(&mut self, ctx: &egui::Context) {
        let size = ctx.screen_rect().size();
        if size.x != self.win_w || size.y != self.win_h {
            self.win_w = size.x;
            self.win_h = size.y;
            self.grid.resize(size.x as i32, size.y as i32);
            self.update_display_rect();
        }
    }

    /* ─────────────────────── input ──────────────────────────────── */

    fn handle_input(&mut self, ctx: &egui::Context, input: &egui::InputState) {
        if input.key_pressed(Key::Escape) {
            ctx.send_viewport_cmd(egui::ViewportCommand::Close);
            return;
        }

        if !self.grid_mode {
            if input.key_pressed(Key::ArrowRight) {
                self.next();
            }
            if input.key_pressed(Key::ArrowLeft) {
                self.prev();
            }
        }

        // Wheel: grid scroll in grid view, navigation in single view.
        let scroll_y = input.raw_scroll_delta.y;
        if scroll_y != 0.0 {
            if self.grid_mode {
                let step = if scroll_y < 0.0 { SCROLL_STEP } else { -SCROLL_STEP };
                self.grid.scroll(step);
            } else if scroll_y < 0.0 {
                self.next();
            } else {
                self.prev();
            }
        }

        if input.pointer.primary_pressed() {
            if let Some(pos) = input.pointer.interact_pos() {
                if self.grid_mode {
                    if let Some(index) = self.grid.hit_test(pos.x as i32, pos.y as i32) {
                        self.current = index;
                        self.grid_mode = false;
                        self.change_image();
                    }
                } else if matches!(self.full, FullState::Ready { .. }) {
                    // Pan-to-point zoom; re-triggerable from any location.
                    self.zooming = !self.zooming;
                    self.cursor = pos;
                    self.update_display_rect();
                }
            }
        }

        if input.pointer.secondary_pressed() {
            self.grid_mode = !self.grid_mode;
            if self.grid_mode {
                self.grid.resize(self.win_w as i32, self.win_h as i32);
                self.grid.scroll_to(self.current);
            }
        }

        if self.zooming {
            if let Some(pos) = input.pointer.latest_pos() {
                if pos != self.cursor {
                    self.cursor = pos;
                    self.update_display_rect();
                }
            }
        }
    }

    /* ─────────────────────── painting ───────────────────────────── */

    /// Full texture if ready, else the thumbnail, else a placeholder once
    /// either load has failed (nothing while both are still pending).
    fn paint_single(&self, painter: &egui::Painter) {
        let dest = to_rect(&self.display_rect);
        if let FullState::Ready { tex, .. } = &self.full {
            painter.image(tex.id(), dest, uv_full(), Color32::WHITE);
            return;
        }
        match &self.files[self.current].thumb {
            ThumbState::Ready { tex, .. } => {
                painter.image(tex.id(), dest, uv_full(), Color32::WHITE);
            }
            ThumbState::Failed => paint_placeholder(painter, dest),
            ThumbState::Pending => {
                if matches!(self.full, FullState::Failed) {
                    paint_placeholder(painter, dest);
                }
            }
        }
    }

    fn paint_grid(&self, painter: &egui::Painter) {
        for (index, cell) in self.grid.visible_tiles() {
            match &self.files[index].thumb {
                ThumbState::Ready { tex, layout, .. } => {
                    let rect = Rect::from_min_size(
                        Pos2::new((cell.x + layout.dx) as f32, (cell.y + layout.dy) as f32),
                        egui::Vec2::new(layout.w as f32, layout.h as f32),
                    );
                    painter.image(tex.id(), rect, uv_full(), Color32::WHITE);
                }
                ThumbState::Failed => {
                    paint_placeholder(painter, inner_rect(&cell));
                }
                ThumbState::Pending => {}
            }
        }
    }
}

impl eframe::App for BrowserApp {
    fn update(&mut self, ctx: &egui::Context, _: &mut eframe::Frame) {
        self.sync_window_size(ctx);
        self.drain_results(ctx);

        let input = ctx.input(|i| i.clone());
        self.handle_input(ctx, &input);

        if self.title_dirty {
            let title = format!(
                "[{}/{}] {} - pictile",
                self.current + 1,
                self.files.len(),
                self.files[self.current].name
            );
            ctx.send_viewport_cmd(egui::ViewportCommand::Title(title));
            self.title_dirty = false;
        }

        egui::CentralPanel::default()
            .frame(egui::Frame::none().fill(BACKGROUND))
            .show(ctx, |ui| {
                let painter = ui.painter();
                if self.grid_mode {
                    self.paint_grid(painter);
                } else {
                    self.paint_single(painter);
                }
            });
    }
}

/* ───────────────────────── helpers ──────────────────────────────── */

/// Surface → GPU texture. The surface's pixel buffer drops right after
/// this call, success or not; textures are freed when their handle drops.
fn upload(ctx: &egui::Context, name: &str, surface: &Surface) -> TextureHandle {
    ctx.load_texture(
        name.to_owned(),
        ColorImage::from_rgba_unmultiplied(
            [surface.w as usize, surface.h as usize],
            &surface.rgba,
        ),
        TextureOptions::LINEAR,
    )
}

#[inline]
fn to_rect(rect: &ViewRect) -> Rect {
    Rect::from_min_size(Pos2::new(rect.x, rect.y), egui::Vec2::new(rect.w, rect.h))
}

#[inline]
fn inner_rect(cell: &CellRect) -> Rect {
    Rect::from_min_size(
        Pos2::new((cell.x + TILE_BORDER) as f32, (cell.y + TILE_BORDER) as f32),
        egui::Vec2::splat((TILE_SIZE - 2 * TILE_BORDER) as f32),
    )
}

fn paint_placeholder(painter: &egui::Painter, rect: Rect) {
    painter.rect_stroke(rect, 2.0, Stroke::new(1.0, PLACEHOLDER));
}

/* ───────────────────────────── tests ────────────────────────────── */
