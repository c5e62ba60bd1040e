/// Build description looked up in the working directory when none is given.
pub const DEFAULT_CONFIG_FILE: &str = "jsbuild.toml";

/// Environment variable overriding the build description path.
pub const CONFIG_ENV_VAR: &str = "JSBUILD_CONFIG";

/// Extension of compilable source files.
pub const SOURCE_EXTENSION: &str = "js";

/// Namespace reserved for host-platform references (`js/document.title`).
pub const HOST_BRIDGE_NAMESPACE: &str = "js";

/// Comment tag that keeps the following declaration callable from outside.
pub const EXPORT_MARKER: &str = "@export";

/// Quiet window a watch session waits for before recompiling.
pub const DEFAULT_WATCH_DEBOUNCE_MS: u64 = 100;

/// Extension appended to `output-to` for the generated source map.
pub const SOURCE_MAP_EXTENSION: &str = "map";
