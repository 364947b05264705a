use std::path::Path;

const KNOWN_SCHEMES: &[&str] = &["http://", "https://", "file://", "data:", "about:", "chrome://"];

/// Turn a user-typed form address into something the browser can navigate to
///
/// Complete URLs pass through unchanged, local files become `file://` URLs,
/// localhost addresses get `http://`, and anything else is assumed to be a
/// host name served over `https://`.
pub fn normalize_url(url: &str) -> String {
    let trimmed = url.trim();

    if KNOWN_SCHEMES.iter().any(|scheme| trimmed.starts_with(scheme)) {
        return trimmed.to_string();
    }

    let path = Path::new(trimmed);
    if (trimmed.starts_with('/') || trimmed.starts_with("./") || trimmed.starts_with("../")) && path.exists() {
        let absolute = path.canonicalize().unwrap_or_else(|_| path.to_path_buf());
        return format!("file://{}", absolute.display());
    }

    if trimmed.starts_with("localhost") || trimmed.starts_with("127.0.0.1") {
        return format!("http://{}", trimmed);
    }

    format!("https://{}", trimmed)
}
