//! Inline favicon encoding.
//!
//! Icons are stored on the bookmark row as text. The current form is a
//! `data:` URI; older databases hold bare base64 PNG data, which is still
//! accepted everywhere an icon is read.

use crate::error::{BkmError, Result};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::{Deserialize, Serialize};

/// Generic globe shown for bookmarks whose icon has not been fetched yet
pub const FALLBACK_ICON: &str = "data:image/png;base64,iVBORw0KGgoAAAANSUhEUgAAABAAAAAQCAYAAAAf8/9hAAAACXBIWXMAAAsSAAALEgHS3X78AAACiElEQVQ4EaVTzU8TURCf2tJuS7tQtlRb6UKBIkQwkRRSEzkQgyEc6lkOKgcOph78Y+CgjXjDs2i44FXY9AMTlQRUELZapVlouy3d7kKtb0Zr0MSLTvL2zb75eL838xtTvV6H/xELBptMJojeXLCXyobnyog4YhzXYvmCFi6qVSfaeRdXdrfaU1areV5KykmX06rcvzumjY/1ggkR3Jh+bNf1mr8v1D5bLuvR3qDgFbvbBJYIrE1mCIoCrKxsHuzK+Rzvsi29+6DEbTZz9unijEYI8ObBgXOzlcrx9OAlXyDYKUCzwwrDQx1wVDGg089Dt+gR3mxmhcUnaWeoxwMbm/vzDFzmDEKMMNhquRqduT1KwXiGt0vre6iSeAUHNDE0d26NBtAXY9BACQyjFusKuL2Ry+IPb/Y9ZglwuVscdHaknUChqLF/O4jn3V5dP4mhgRJgwSYm+gV0Oi3XrvYB30yvhGa7BS70eGFHPoTJyQHhMK+F0ZesRVVznvXw5Ixv7/C10moEo6OZXbWvlFAF9FVZDOqEABUMRIkMd8GnLwVWg9/RkJF9sA4oDfYQAuzzjqzwvnaRUFxn/X2ZlmGLXAE7AL52B4xHgqAUqrC1nSNuoJkQtLkdqReszz/9aRvq90NOKdOS1nch8TpL555WDp49f3uAMXhACRjD5j4ykuCtf5PP7Fm1b0DIsl/VHGezzP1KwOiZQobFF9YyjSRYQETRENSlVzI8iK9mWlzckpSSCQHVALmN9Az1euDho9Xo8vKGd2rqooA8yBcrwHgCqYR0kMkWci08t/R+W4ljDCanWTg9TJGwGNaNk3vYZ7VUdeKsYJGFNkfSzjXNrSX20s4/h6kB81/271ghG17l+rPTAAAAAElFTkSuQmCC";

const LEGACY_CONTENT_TYPE: &str = "image/png";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FaviconMode {
    /// `data:<content-type>;base64,<payload>`
    #[default]
    DataUri,
    /// Bare base64, as written by older versions
    Legacy,
}

pub fn encode(content_type: &str, bytes: &[u8], mode: FaviconMode) -> String {
    let payload = STANDARD.encode(bytes);
    match mode {
        FaviconMode::DataUri => format!("data:{};base64,{}", content_type, payload),
        FaviconMode::Legacy => payload,
    }
}

/// Normalize a stored icon to a `data:` URI; empty stays empty
pub fn to_data_uri(icon: &str) -> String {
    if icon.is_empty() || icon.starts_with("data:") {
        icon.to_string()
    } else {
        format!("data:{};base64,{}", LEGACY_CONTENT_TYPE, icon)
    }
}

/// Stored icon, or [`FALLBACK_ICON`] when none was fetched
pub fn display_icon(icon: &str) -> String {
    if icon.is_empty() {
        FALLBACK_ICON.to_string()
    } else {
        to_data_uri(icon)
    }
}

/// Split a stored icon into content type and raw bytes
pub fn decode(icon: &str) -> Result<(String, Vec<u8>)> {
    let (content_type, payload) = match icon.strip_prefix("data:") {
        Some(rest) => {
            let (header, payload) = rest
                .split_once(',')
                .ok_or_else(|| BkmError::Decode("data URI without payload".to_string()))?;
            let content_type = header
                .strip_suffix(";base64")
                .ok_or_else(|| BkmError::Decode("data URI is not base64 encoded".to_string()))?;
            (content_type, payload)
        }
        None => (LEGACY_CONTENT_TYPE, icon),
    };

    let bytes = STANDARD
        .decode(payload.trim())
        .map_err(|e| BkmError::Decode(format!("invalid base64 icon: {}", e)))?;
    Ok((content_type.to_string(), bytes))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(FaviconMode::DataUri, "data:image/x-icon;base64,AAEC")]
    #[case(FaviconMode::Legacy, "AAEC")]
    fn test_encode(#[case] mode: FaviconMode, #[case] expected: &str) {
        assert_eq!(encode("image/x-icon", &[0, 1, 2], mode), expected);
    }

    #[rstest]
    #[case("", "")]
    #[case("AAEC", "data:image/png;base64,AAEC")]
    #[case("data:image/gif;base64,AAEC", "data:image/gif;base64,AAEC")]
    fn test_to_data_uri(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(to_data_uri(input), expected);
    }

    #[test]
    fn test_display_icon_falls_back() {
        assert_eq!(display_icon(""), FALLBACK_ICON);
        assert_eq!(display_icon("AAEC"), "data:image/png;base64,AAEC");
    }

    #[test]
    fn test_decode_both_forms() {
        let (ct, bytes) = decode("data:image/x-icon;base64,AAEC").unwrap();
        assert_eq!(ct, "image/x-icon");
        assert_eq!(bytes, vec![0, 1, 2]);

        let (ct, bytes) = decode("AAEC").unwrap();
        assert_eq!(ct, "image/png");
        assert_eq!(bytes, vec![0, 1, 2]);
    }

    #[test]
    fn test_fallback_icon_is_a_png() {
        let (ct, bytes) = decode(FALLBACK_ICON).unwrap();
        assert_eq!(ct, "image/png");
        assert_eq!(&bytes[1..4], b"PNG");
    }

    #[rstest]
    #[case("data:image/png;base64")]
    #[case("data:image/svg+xml,<svg/>")]
    #[case("not base64 at all!")]
    fn test_decode_rejects(#[case] input: &str) {
        assert!(matches!(decode(input), Err(BkmError::Decode(_))));
    }
}
