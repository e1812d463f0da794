//! Content-kind classification from MIME types.

use std::fmt;

/// Coarse content kind driving delivery-channel choice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Kind {
    /// Any `image/*` type.
    Image,
    /// `application/pdf`.
    Pdf,
    /// Everything else, including unknown or malformed types.
    Other,
}

impl Kind {
    /// `true` for kinds rendered inline instead of downloaded.
    pub fn is_previewable(self) -> bool {
        matches!(self, Kind::Image | Kind::Pdf)
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Kind::Image => "image",
            Kind::Pdf => "pdf",
            Kind::Other => "other",
        };
        f.write_str(name)
    }
}

/// Map a MIME type to its coarse kind.
///
/// Total over all inputs: parameters (`; charset=...`) are stripped, ASCII
/// case is ignored, and anything unrecognized — including the empty
/// string — classifies as [`Kind::Other`].
pub fn classify(mime_type: &str) -> Kind {
    let essence = mime_type
        .split(';')
        .next()
        .unwrap_or("")
        .trim()
        .to_ascii_lowercase();

    if essence.starts_with("image/") {
        Kind::Image
    } else if essence == "application/pdf" {
        Kind::Pdf
    } else {
        Kind::Other
    }
}
