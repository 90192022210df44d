/* ───────────────────────── grid tuneables ───────────────────────── */

/// Square tile cell edge, in pixels.
pub const TILE_SIZE: i32 = 200;
/// Pixels scrolled per wheel notch in grid view.
pub const SCROLL_STEP: i32 = 100;
/// Border inset between the cell edge and the thumbnail.
pub const TILE_BORDER: i32 = 2;

/* ───────────────────────── geometry types ───────────────────────── */

/// Placement of a thumbnail inside its tile cell: scaled size plus the
/// offset from the cell's top-left corner (border inset included).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TileLayout {
    pub w: i32,
    pub h: i32,
    pub dx: i32,
    pub dy: i32,
}

/// A tile cell in window pixel coordinates.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CellRect {
    pub x: i32,
    pub y: i32,
    pub w: i32,
    pub h: i32,
}

/* ───────────────────────── tile framing ─────────────────────────── */

/// Fit a `w × h` thumbnail into the border-inset inner square of a tile,
/// preserving aspect ratio and centering both axes. The longer natural
/// dimension maps to the inner edge; the shorter one scales with it.
pub fn tile_fit(w: u32, h: u32) -> TileLayout {
    let inner = (TILE_SIZE - 2 * TILE_BORDER) as i64;
    let (w, h) = (w.max(1) as i64, h.max(1) as i64);
    let (tw, th) = if w > h {
        (inner, h * inner / w)
    } else if w < h {
        (w * inner / h, inner)
    } else {
        (inner, inner)
    };
    TileLayout {
        w: tw as i32,
        h: th as i32,
        dx: TILE_BORDER + (inner - tw) as i32 / 2,
        dy: TILE_BORDER + (inner - th) as i32 / 2,
    }
}

/* ───────────────────────── virtualized grid ─────────────────────── */

/// Scroll/layout state for the gallery view. Everything here is derived
/// from the window size and the file count; only `scroll_y` carries user
/// intent, and it is clamped to `[0, max_scroll_y]` on every mutation.
pub struct GridView {
    count: usize,
    win_h: i32,
    pub scroll_y: i32,
    pub cols: i32,
    pub rows: i32,
    pub visible_rows: i32,
    pub max_scroll_y: i32,
    pub pad_x: i32,
}

#[inline]
fn ceil_div(a: i32, b: i32) -> i32 {
    (a + b - 1) / b
}

impl GridView {
    pub fn new(count: usize, win_w: i32, win_h: i32) -> Self {
        let mut grid = GridView {
            count,
            win_h: 1,
            scroll_y: 0,
            cols: 1,
            rows: 1,
            visible_rows: 1,
            max_scroll_y: 0,
            pad_x: 0,
        };
        grid.resize(win_w, win_h);
        grid
    }

    /// Recompute the layout for a new window size. The tile that was at the
    /// top of the viewport stays at the top: its index is carried across the
    /// column-count change and a new row-aligned `scroll_y` derived from it.
    pub fn resize(&mut self, win_w: i32, win_h: i32) {
        let top = self.top_index();
        self.win_h = win_h;
        self.cols = (win_w / TILE_SIZE).max(1);
        self.rows = ceil_div(self.count.max(1) as i32, self.cols);
        self.visible_rows = ceil_div(win_h, TILE_SIZE) + 1;
        self.pad_x = (win_w - self.cols * TILE_SIZE) / 2;
        self.max_scroll_y = (self.rows * TILE_SIZE - win_h).max(0);
        self.scroll_y = top as i32 / self.cols * TILE_SIZE;
        self.clamp_scroll();
    }

    /// Index of the first tile in the topmost visible row.
    #[inline]
    fn top_index(&self) -> usize {
        (self.scroll_y / TILE_SIZE * self.cols) as usize
    }

    pub fn scroll(&mut self, delta: i32) {
        self.scroll_y += delta;
        self.clamp_scroll();
    }

    /// Center the row containing `index` vertically in the viewport.
    pub fn scroll_to(&mut self, index: usize) {
        let row = index as i32 / self.cols;
        self.scroll_y = row * TILE_SIZE + TILE_SIZE / 2 - self.win_h / 2;
        self.clamp_scroll();
    }

    #[inline]
    fn clamp_scroll(&mut self) {
        self.scroll_y = self.scroll_y.clamp(0, self.max_scroll_y);
    }

    /// Tiles intersecting the viewport, in row-major order, as
    /// `(file index, cell rect)` pairs. Pure function of the current state;
    /// restartable on every call.
    pub fn visible_tiles(&self) -> impl Iterator<Item = (usize, CellRect)> {
        let start_row = self.scroll_y / TILE_SIZE;
        let y_off = start_row * TILE_SIZE - self.scroll_y;
        let (cols, pad_x, count) = (self.cols, self.pad_x, self.count);
        (0..self.visible_rows)
            .flat_map(move |r| {
                (0..cols).map(move |c| {
                    let index = ((start_row + r) * cols + c) as usize;
                    let rect = CellRect {
                        x: pad_x + c * TILE_SIZE,
                        y: y_off + r * TILE_SIZE,
                        w: TILE_SIZE,
                        h: TILE_SIZE,
                    };
                    (index, rect)
                })
            })
            .take_while(move |(index, _)| *index < count)
    }

    /// File index under a window-space pointer position, or `None` outside
    /// the grid's horizontal band or past the last file.
    pub fn hit_test(&self, x: i32, y: i32) -> Option<usize> {
        if x < self.pad_x || x >= self.pad_x + self.cols * TILE_SIZE {
            return None;
        }
        let scrolled_y = y + self.scroll_y;
        if scrolled_y < 0 {
            return None;
        }
        let col = (x - self.pad_x) / TILE_SIZE;
        let row = scrolled_y / TILE_SIZE;
        let index = (row * self.cols + col) as usize;
        (index < self.count).then_some(index)
    }
}

/* ───────────────────────────── tests ────────────────────────────── */
