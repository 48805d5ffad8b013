use std::fmt;
use url::Url;

/// Download category of a linked resource
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ResourceCategory {
    Document,
    Image,
    Audio,
    Video,
}

/// Extension table, lowercase and without the leading dot
const EXTENSION_TABLE: &[(ResourceCategory, &[&str])] = &[
    (
        ResourceCategory::Document,
        &[
            "pdf", "doc", "docx", "xls", "xlsx", "ppt", "pptx", "odt", "ods", "odp", "rtf", "txt",
            "csv", "epub",
        ],
    ),
    (
        ResourceCategory::Image,
        &[
            "jpg", "jpeg", "png", "gif", "bmp", "webp", "svg", "tif", "tiff", "ico",
        ],
    ),
    (
        ResourceCategory::Audio,
        &["mp3", "wav", "ogg", "oga", "flac", "aac", "m4a", "wma", "opus"],
    ),
    (
        ResourceCategory::Video,
        &[
            "mp4", "mkv", "avi", "mov", "webm", "wmv", "flv", "m4v", "mpg", "mpeg",
        ],
    ),
];

impl ResourceCategory {
    /// Subdirectory of the session directory holding this category
    pub fn dir_name(&self) -> &'static str {
        match self {
            Self::Document => "documents",
            Self::Image => "images",
            Self::Audio => "audio",
            Self::Video => "video",
        }
    }

    /// Looks up the category of a bare extension (case-insensitive)
    pub fn from_extension(extension: &str) -> Option<Self> {
        let extension = extension.to_ascii_lowercase();

        EXTENSION_TABLE
            .iter()
            .find(|(_, extensions)| extensions.contains(&extension.as_str()))
            .map(|(category, _)| *category)
    }

    /// Returns all categories
    pub fn all() -> [Self; 4] {
        [Self::Document, Self::Image, Self::Audio, Self::Video]
    }

    /// Returns the extensions mapped to this category
    pub fn extensions(&self) -> &'static [&'static str] {
        EXTENSION_TABLE
            .iter()
            .find(|(category, _)| category == self)
            .map(|(_, extensions)| *extensions)
            .unwrap_or(&[])
    }
}

impl fmt::Display for ResourceCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.dir_name())
    }
}

/// Extracts the extension of a URL's final path segment
///
/// Query and fragment are ignored. Returns None for segments without a dot
/// or with nothing after the last dot.
pub fn path_extension(url_str: &str) -> Option<String> {
    let path = match Url::parse(url_str) {
        Ok(url) => url.path().to_string(),
        Err(_) => url_str
            .split(['?', '#'])
            .next()
            .unwrap_or_default()
            .to_string(),
    };

    let segment = path.rsplit('/').next()?;
    let (stem, extension) = segment.rsplit_once('.')?;

    if stem.is_empty() || extension.is_empty() {
        return None;
    }

    Some(extension.to_ascii_lowercase())
}

/// Classifies a URL by its path extension
///
/// # Examples
///
/// ```
/// use creeper::resource::{classify, ResourceCategory};
///
/// assert_eq!(classify("https://x.test/report.pdf"), Some(ResourceCategory::Document));
/// assert_eq!(classify("https://x.test/photo.JPG"), Some(ResourceCategory::Image));
/// assert_eq!(classify("https://x.test/notes"), None);
/// ```
pub fn classify(url_str: &str) -> Option<ResourceCategory> {
    path_extension(url_str).and_then(|ext| ResourceCategory::from_extension(&ext))
}
