pub mod http;

use url::Url;

/// Joins a path onto a base URL, treating the base as a directory even when it
/// lacks a trailing slash.
pub fn join(base: &Url, path: &str) -> Result<Url, url::ParseError> {
    let mut base = base.clone();
    if !base.path().ends_with('/') {
        base.set_path(&format!("{}/", base.path()));
    }
    base.join(path.trim_start_matches('/'))
}
