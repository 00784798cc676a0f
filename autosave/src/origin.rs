use tracing::debug;
use url::Url;

/// Returns the `scheme://host[:port]` origin of an http(s) URL.
///
/// Internal pages (`chrome://`, `about:`, `file://`) and malformed input have
/// no manageable origin.
pub fn origin_from_url(url: &str) -> Option<String> {
    let parsed = match Url::parse(url) {
        Ok(parsed) => parsed,
        Err(err) => {
            debug!(url, "could not parse url: {err}");
            return None;
        }
    };

    if !matches!(parsed.scheme(), "http" | "https") {
        debug!(url, scheme = parsed.scheme(), "url has no manageable origin");
        return None;
    }

    let origin = parsed.origin();
    if !origin.is_tuple() {
        return None;
    }

    Some(origin.ascii_serialization())
}
