// Human-readable descriptions for candidate items, derived from the category
// and the shape of the path

use std::path::Path;

use super::category::Category;

/// Coarse class of a downloaded file, by extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DownloadKind {
    DiskImage,
    Archive,
    Installer,
    Video,
    Audio,
    Image,
    Document,
    Other,
}

impl DownloadKind {
    fn label(self) -> &'static str {
        match self {
            Self::DiskImage => "Disk image",
            Self::Archive => "Archive",
            Self::Installer => "Installer package",
            Self::Video => "Video",
            Self::Audio => "Audio file",
            Self::Image => "Image",
            Self::Document => "Document",
            Self::Other => "Downloaded file",
        }
    }
}

pub fn classify_download(path: &Path) -> DownloadKind {
    let Some(ext) = path.extension().and_then(|ext| ext.to_str()) else {
        return DownloadKind::Other;
    };

    let ext = ext.to_ascii_lowercase();

    match ext.as_str() {
        "dmg" | "iso" | "img" | "vhd" | "vmdk" | "qcow2" => DownloadKind::DiskImage,
        "zip" | "tar" | "gz" | "tgz" | "bz2" | "xz" | "7z" | "rar" | "zst" => DownloadKind::Archive,
        "pkg" | "deb" | "rpm" | "appimage" | "flatpakref" | "exe" | "msi" => DownloadKind::Installer,
        "mp4" | "mkv" | "webm" | "mov" | "avi" | "m4v" => DownloadKind::Video,
        "mp3" | "wav" | "flac" | "aac" | "ogg" | "m4a" | "opus" => DownloadKind::Audio,
        "jpg" | "jpeg" | "png" | "gif" | "bmp" | "webp" | "heic" | "tiff" => DownloadKind::Image,
        "pdf" | "doc" | "docx" | "odt" | "rtf" | "xls" | "xlsx" | "ppt" | "pptx" | "epub" => {
            DownloadKind::Document
        }
        _ => DownloadKind::Other,
    }
}

/// Describe a candidate item for display.
pub fn describe(category: Category, path: &Path, is_dir: bool) -> String {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();

    let cache_like = matches!(
        category,
        Category::DeveloperCaches | Category::UserCaches | Category::SystemCaches
    );
    if cache_like {
        if let Some(tool) = developer_tool(path) {
            return tool.to_string();
        }
    }

    match category {
        Category::SystemCaches => format!("System cache: {}", name),
        Category::UserCaches => format!("Application cache: {}", name),
        Category::BrowserData => format!("{} cache: {}", browser(path), name),
        Category::Logs => describe_log(&name, is_dir),
        Category::Trash if is_dir => format!("Trashed folder: {}", name),
        Category::Trash => format!("Trashed file: {}", name),
        Category::Downloads if is_dir => format!("Downloaded folder: {}", name),
        Category::Downloads => classify_download(path).label().to_string(),
        Category::DeveloperCaches => format!("Developer cache: {}", name),
    }
}

fn developer_tool(path: &Path) -> Option<&'static str> {
    let has = |segment: &str| path.iter().any(|c| c == segment);
    let has_pair = |first: &str, second: &str| {
        let parts: Vec<_> = path.iter().collect();
        parts.windows(2).any(|w| w[0] == first && w[1] == second)
    };

    if has("DerivedData") && has("Xcode") {
        Some("Xcode build products (DerivedData)")
    } else if has("CoreSimulator") {
        Some("iOS simulator caches")
    } else if has(".npm") {
        Some("npm package cache")
    } else if has(".yarn") || has("yarn") {
        Some("Yarn package cache")
    } else if has(".pnpm-store") {
        Some("pnpm content store")
    } else if has(".bun") {
        Some("Bun install cache")
    } else if has_pair(".cargo", "registry") {
        Some("Cargo registry cache")
    } else if has_pair(".gradle", "caches") {
        Some("Gradle build cache")
    } else if has_pair(".m2", "repository") {
        Some("Maven local repository")
    } else if has("pip") {
        Some("pip download cache")
    } else if has("go-build") {
        Some("Go build cache")
    } else {
        None
    }
}

fn browser(path: &Path) -> &'static str {
    let text = path.to_string_lossy().to_ascii_lowercase();
    if text.contains("chrome") {
        "Chrome"
    } else if text.contains("chromium") {
        "Chromium"
    } else if text.contains("firefox") || text.contains("mozilla") {
        "Firefox"
    } else {
        "Browser"
    }
}

fn describe_log(name: &str, is_dir: bool) -> String {
    if is_dir {
        return format!("Log directory: {}", name);
    }
    let rotated = name.ends_with(".gz")
        || name.ends_with(".bz2")
        || name.ends_with(".xz")
        || name.ends_with(".old")
        || name
            .rsplit('.')
            .next()
            .is_some_and(|suffix| !suffix.is_empty() && suffix.chars().all(|c| c.is_ascii_digit()));
    if rotated {
        format!("Rotated log: {}", name)
    } else {
        format!("Log file: {}", name)
    }
}
