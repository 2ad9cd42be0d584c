//! Media file classification and renaming.

use std::path::Path;

use super::beautify;

/// Extensions (lower-case, without the dot) treated as playable media.
pub const MEDIA_EXTENSIONS: &[&str] = &[
    "mkv", "mp4", "avi", "mov", "wmv", "flv", "webm", "m4v", "mpg", "mpeg", "ts", "m2ts", "mts",
    "3gp", "3g2", "ogv", "vob", "asf", "rm", "rmvb", "divx", "f4v", "mxf", "mpv", "qt", "dat",
    "amv", "y4m",
];

/// Whether the path ends in an allow-listed media extension (case-insensitive).
pub fn is_media_file(path: impl AsRef<Path>) -> bool {
    path.as_ref()
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| MEDIA_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}

/// Compute the library name for a media file: beautified stem plus the
/// original extension.
///
/// Non-media names and names whose stem beautifies to nothing are returned
/// unchanged.
pub fn media_file_name(file_name: &str) -> String {
    if !is_media_file(file_name) {
        return file_name.to_string();
    }

    let path = Path::new(file_name);
    let (Some(stem), Some(ext)) = (
        path.file_stem().and_then(|s| s.to_str()),
        path.extension().and_then(|e| e.to_str()),
    ) else {
        return file_name.to_string();
    };

    let pretty = beautify(stem);
    if pretty.is_empty() {
        return file_name.to_string();
    }

    format!("{}.{}", pretty, ext)
}
