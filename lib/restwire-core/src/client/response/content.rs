use mime::Mime;
use tracing::warn;

/// How a response body should be treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentKind {
    /// Textual payload (JSON, XML, text, forms...).
    Text,
    /// Binary payload (images, archives, documents...).
    Binary,
    /// Unknown or absent content type, handled as text.
    Unknown,
}

impl ContentKind {
    /// Returns `true` only for known binary content.
    pub fn is_binary(self) -> bool {
        self == Self::Binary
    }
}

const TEXT_TYPES: &[&str] = &[
    "application/json",
    "application/xml",
    "application/javascript",
    "application/x-www-form-urlencoded",
];

const BINARY_PREFIXES: &[&str] = &[
    "application/octet-stream",
    "application/pdf",
    "image/",
    "audio/",
    "video/",
    "application/zip",
    "application/x-rar-compressed",
    "application/x-tar",
];

/// Classifies a parsed media type.
pub fn classify(mime: &Mime) -> ContentKind {
    if mime.type_() == mime::TEXT
        || mime
            .suffix()
            .is_some_and(|suffix| suffix == mime::JSON || suffix == mime::XML)
    {
        return ContentKind::Text;
    }
    let essence = mime.essence_str();
    if TEXT_TYPES.contains(&essence) {
        return ContentKind::Text;
    }
    if BINARY_PREFIXES.iter().any(|prefix| essence.starts_with(prefix)) {
        return ContentKind::Binary;
    }
    ContentKind::Unknown
}

/// Classifies a raw `Content-Type` header value.
///
/// Values that do not parse as a media type fall back to a prefix match on the lowercased text.
pub fn classify_header(content_type: Option<&str>) -> ContentKind {
    let Some(content_type) = content_type else {
        return ContentKind::Unknown;
    };
    match content_type.parse::<Mime>() {
        Ok(mime) => classify(&mime),
        Err(err) => {
            warn!(?content_type, %err, "malformed content type");
            let lowered = content_type.trim().to_ascii_lowercase();
            if BINARY_PREFIXES.iter().any(|prefix| lowered.starts_with(prefix)) {
                ContentKind::Binary
            } else {
                ContentKind::Unknown
            }
        }
    }
}

/// Returns `true` if the content type is JSON (`application/json` or `+json`).
pub fn is_json(content_type: Option<&str>) -> bool {
    content_type
        .and_then(|content_type| content_type.parse::<Mime>().ok())
        .is_some_and(|mime| {
            mime.essence_str() == "application/json"
                || mime.suffix().is_some_and(|suffix| suffix == mime::JSON)
        })
}
