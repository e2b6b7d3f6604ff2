use once_cell::sync::Lazy;
use percent_encoding::percent_decode_str;
use regex::Regex;
use tracing::debug;

/// Path segment that carries opaque listing state; everything from here on is
/// safe to drop for navigation.
const DETAIL_BLOB_MARKER: &str = "/data=";

/// `@lat,lng,17z` style zoom suffix. The marker itself positions the map, so
/// it is kept; anything after it is not.
static ZOOM_MARKER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r",\d+(?:\.\d+)?z").expect("Failed to compile zoom regex"));

/// Clean a listing URL before handing it to the browser.
///
/// Never fails: input that cannot be percent-decoded is returned unchanged.
pub fn normalize_listing_url(raw: &str) -> String {
    let decoded = match percent_decode_str(raw).decode_utf8() {
        Ok(decoded) => decoded.into_owned(),
        Err(e) => {
            debug!(error = %e, "listing url is not valid utf-8 once decoded, keeping input");
            return raw.to_string();
        }
    };

    let mut cleaned = match decoded.find(DETAIL_BLOB_MARKER) {
        Some(pos) => decoded[..pos].to_string(),
        None => decoded,
    };

    if let Some(zoom) = ZOOM_MARKER.find(&cleaned) {
        cleaned.truncate(zoom.end());
    }

    cleaned
}


#[cfg(all(test, feature = "fuzz"))]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn output_is_prefix_of_decoded_input(path in "[a-zA-Z0-9/+@.,]{0,40}", blob in "[a-z0-9!]{0,20}") {
            let raw = format!("https://maps.example.com/{path}/data={blob}");
            let decoded = percent_decode_str(&raw).decode_utf8().unwrap().into_owned();
            let out = normalize_listing_url(&raw);
            prop_assert!(decoded.starts_with(&out));
            prop_assert!(!out.contains(DETAIL_BLOB_MARKER));
        }

        #[test]
        fn never_panics(raw in ".{0,80}") {
            let _ = normalize_listing_url(&raw);
        }
    }
}
