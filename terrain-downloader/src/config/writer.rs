//! INI serialization logic for converting `ConfigFile` → INI string.

use std::path::Path;

use super::file::ConfigFile;

/// Convert a `ConfigFile` to a commented INI string for saving.
pub(super) fn to_config_string(config: &ConfigFile) -> String {
    let token = config.service.token.as_deref().unwrap_or("");

    format!(
        r#"[service]
; Developer token from your terrain service account
token = {}
; Token exchange endpoint
auth_endpoint = {}

[download]
; Where tiles, layer.json and auth.json are stored
directory = {}
; Number of tiles downloaded at once
concurrency = {}
; Per-tile timeout in seconds
timeout = {}

[logging]
file = {}
"#,
        token,
        config.service.auth_endpoint,
        path_to_string(&config.download.directory),
        config.download.concurrency,
        config.download.timeout,
        path_to_string(&config.logging.file),
    )
}

fn path_to_string(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}
