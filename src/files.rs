use std::ffi::OsStr;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context as _, Result};
use eframe::egui::TextureHandle;
use walkdir::WalkDir;

use crate::grid::TileLayout;

/// Subdirectory holding pre-rendered thumbnails, one per source image.
pub const PREVIEW_DIR: &str = "_preview";

const SUPPORTED_EXTENSIONS: &[&str] = &[
    "cur", "ico", "bmp", "pnm", "xpm", "xcf", "pcx", "gif", "jpg", "jpeg",
    "tif", "tiff", "png", "tga", "lbm", "xv", "webp",
];

/* ───────────────────────── per-file state ───────────────────────── */

/// Thumbnail lifecycle for one file. The texture handle owns the GPU
/// texture; replacing or dropping the state frees it.
#[derive(Default)]
pub enum ThumbState {
    #[default]
    Pending,
    Ready {
        tex: TextureHandle,
        w: u32,
        h: u32,
        layout: TileLayout,
    },
    Failed,
}

/// One discovered image. Identity fields are immutable after discovery;
/// only `thumb` changes, and only from the merge loop on the UI thread.
pub struct FileEntry {
    pub name: String,
    pub source_path: PathBuf,
    pub thumb_path: PathBuf,
    pub thumb: ThumbState,
}

impl FileEntry {
    fn new(path: PathBuf) -> FileEntry {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let thumb_path = path
            .parent()
            .unwrap_or_else(|| Path::new(""))
            .join(PREVIEW_DIR)
            .join(&name);
        FileEntry {
            name,
            source_path: path,
            thumb_path,
            thumb: ThumbState::Pending,
        }
    }

    /// Natural thumbnail dimensions once loaded.
    pub fn thumb_size(&self) -> Option<(u32, u32)> {
        match &self.thumb {
            ThumbState::Ready { w, h, .. } => Some((*w, *h)),
            _ => None,
        }
    }
}

/* ───────────────────────── discovery ────────────────────────────── */

#[inline]
fn is_supported(path: &Path) -> bool {
    path.extension()
        .and_then(OsStr::to_str)
        .map(|ext| {
            let ext = ext.to_ascii_lowercase();
            SUPPORTED_EXTENSIONS.contains(&ext.as_str())
        })
        .unwrap_or(false)
}

/// Flat scan of `dir` for supported image files, sorted by name. Depth 1
/// only: `_preview/` and any other subdirectory are never entered.
pub fn discover(dir: &Path) -> Result<Vec<FileEntry>> {
    let mut files: Vec<FileEntry> = Vec::new();
    for entry in WalkDir::new(dir).min_depth(1).max_depth(1) {
        let entry = entry.with_context(|| format!("reading {}", dir.display()))?;
        if entry.file_type().is_file() && is_supported(entry.path()) {
            files.push(FileEntry::new(entry.into_path()));
        }
    }
    if files.is_empty() {
        bail!("no supported images in {}", dir.display());
    }
    files.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(files)
}

/* ───────────────────────────── tests ────────────────────────────── */

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn extension_filter() {
        assert!(is_supported(Path::new("a/b/photo.JPG")));
        assert!(is_supported(Path::new("x.webp")));
        assert!(!is_supported(Path::new("notes.txt")));
        assert!(!is_supported(Path::new("no_extension")));
    }

    #[test]
    fn entry_paths() {
        let entry = FileEntry::new(PathBuf::from("pics/cat.png"));
        assert_eq!(entry.name, "cat.png");
        assert_eq!(entry.source_path, PathBuf::from("pics/cat.png"));
        assert_eq!(entry.thumb_path, PathBuf::from("pics/_preview/cat.png"));
        assert!(entry.thumb_size().is_none());
    }

    #[test]
    fn discover_is_flat_and_sorted() {
        let dir = std::env::temp_dir().join(format!("pictile-discover-{}", std::process::id()));
        let preview = dir.join(PREVIEW_DIR);
        fs::create_dir_all(&preview).unwrap();
        for name in ["b.png", "a.jpg", "skip.txt"] {
            fs::write(dir.join(name), b"x").unwrap();
        }
        // A thumbnail with a supported extension must not be picked up.
        fs::write(preview.join("b.png"), b"x").unwrap();

        let files = discover(&dir).unwrap();
        let names: Vec<_> = files.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, ["a.jpg", "b.png"]);

        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn discover_empty_dir_is_an_error() {
        let dir = std::env::temp_dir().join(format!("pictile-empty-{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        assert!(discover(&dir).is_err());
        fs::remove_dir_all(&dir).unwrap();
    }
}
