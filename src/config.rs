//! Connection settings resolved from the environment, a `.env` file and
//! built-in defaults.
//!
//! Every setting is looked up with the same precedence:
//!
//! 1. process environment variable, if set and non-empty;
//! 2. the key in the parsed `.env` file;
//! 3. the built-in default.
//!
//! Resolution never fails. A missing `.env` file contributes nothing, a
//! malformed line is skipped, and an unparsable number (or a zero port or
//! timeout) falls back to its default with a warning.

use std::collections::HashMap;
use std::path::Path;

pub const DEFAULT_ENV_PATH: &str = ".env";

pub const DEFAULT_HOST: &str = "localhost";
pub const DEFAULT_PORT: u16 = 8000;
pub const DEFAULT_COLLECTION: &str = "articulos";
pub const DEFAULT_TENANT: &str = "default_tenant";
pub const DEFAULT_DATABASE: &str = "default_database";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

pub const HOST_VAR: &str = "CHROMA_HOST";
pub const PORT_VAR: &str = "CHROMA_PORT";
pub const COLLECTION_VAR: &str = "CHROMA_COLLECTION";
pub const TENANT_VAR: &str = "CHROMA_TENANT";
pub const DATABASE_VAR: &str = "CHROMA_DATABASE";
pub const TIMEOUT_VAR: &str = "CHROMA_TIMEOUT_SECS";

/// Effective settings for one run. Built once, never mutated.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub collection: String,
    pub tenant: String,
    pub database: String,
    pub timeout_secs: u64,
    pub embedding: EmbeddingConfig,
}

/// Client-side embedding settings used by the Chroma store.
#[derive(Debug, Clone, PartialEq)]
pub struct EmbeddingConfig {
    /// `local`, `ollama` or `openai`.
    pub provider: String,
    pub model: Option<String>,
    /// Base URL for the Ollama provider.
    pub url: Option<String>,
    pub api_key: Option<String>,
    pub batch_size: usize,
    pub max_retries: u32,
    pub timeout_secs: u64,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            model: None,
            url: None,
            api_key: None,
            batch_size: 64,
            max_retries: 3,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

fn default_provider() -> String {
    "local".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            collection: DEFAULT_COLLECTION.to_string(),
            tenant: DEFAULT_TENANT.to_string(),
            database: DEFAULT_DATABASE.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            embedding: EmbeddingConfig::default(),
        }
    }
}

impl Config {
    /// Resolve settings from the process environment and the `.env` file at
    /// `env_path`.
    pub fn load(env_path: &Path) -> Self {
        let file_values = load_env_file(env_path);
        Self::resolve(|key| std::env::var(key).ok(), &file_values)
    }

    /// Resolve settings from an arbitrary environment lookup and parsed file
    /// values.
    pub fn resolve<F>(env: F, file_values: &HashMap<String, String>) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str, default: &str| resolve_from(env(key), key, default, file_values);
        let get_opt = |key: &str| {
            let value = get(key, "");
            (!value.is_empty()).then_some(value)
        };

        let port_raw = get(PORT_VAR, &DEFAULT_PORT.to_string());
        let port = parse_port(&port_raw).unwrap_or_else(|| {
            tracing::warn!(
                "Invalid port in {}: '{}'. Using {}.",
                PORT_VAR,
                port_raw,
                DEFAULT_PORT
            );
            DEFAULT_PORT
        });

        let timeout_raw = get(TIMEOUT_VAR, "");
        let timeout_secs = match parse_number(TIMEOUT_VAR, &timeout_raw, DEFAULT_TIMEOUT_SECS) {
            0 => {
                tracing::warn!(
                    "Invalid value in {}: '{}'. Using {}.",
                    TIMEOUT_VAR,
                    timeout_raw,
                    DEFAULT_TIMEOUT_SECS
                );
                DEFAULT_TIMEOUT_SECS
            }
            secs => secs,
        };

        let defaults = EmbeddingConfig::default();
        let embedding = EmbeddingConfig {
            provider: get("EMBEDDING_PROVIDER", &defaults.provider).to_lowercase(),
            model: get_opt("EMBEDDING_MODEL"),
            url: get_opt("EMBEDDING_URL"),
            api_key: get_opt("OPENAI_API_KEY"),
            batch_size: parse_number(
                "EMBEDDING_BATCH_SIZE",
                &get("EMBEDDING_BATCH_SIZE", ""),
                defaults.batch_size,
            )
            .max(1),
            max_retries: parse_number(
                "EMBEDDING_MAX_RETRIES",
                &get("EMBEDDING_MAX_RETRIES", ""),
                defaults.max_retries,
            ),
            timeout_secs,
        };

        Self {
            host: get(HOST_VAR, DEFAULT_HOST),
            port,
            collection: get(COLLECTION_VAR, DEFAULT_COLLECTION),
            tenant: get(TENANT_VAR, DEFAULT_TENANT),
            database: get(DATABASE_VAR, DEFAULT_DATABASE),
            timeout_secs,
            embedding,
        }
    }

    /// Base URL of the Chroma server.
    ///
    /// A host that already carries a scheme (`https://chroma.internal`) is
    /// used as given; otherwise plain HTTP is assumed.
    pub fn base_url(&self) -> String {
        let host = self.host.trim_end_matches('/');
        if host.starts_with("http://") || host.starts_with("https://") {
            format!("{}:{}", host, self.port)
        } else {
            format!("http://{}:{}", host, self.port)
        }
    }
}

/// Look up `key` in the process environment, then in `file_values`, then
/// fall back to `default`.
pub fn resolve_setting(key: &str, default: &str, file_values: &HashMap<String, String>) -> String {
    resolve_from(std::env::var(key).ok(), key, default, file_values)
}

/// Precedence rule behind [`resolve_setting`], with the environment value
/// passed in explicitly. Empty environment values count as unset.
pub fn resolve_from(
    env_value: Option<String>,
    key: &str,
    default: &str,
    file_values: &HashMap<String, String>,
) -> String {
    env_value
        .filter(|v| !v.is_empty())
        .or_else(|| file_values.get(key).cloned())
        .unwrap_or_else(|| default.to_string())
}

/// Parse a port number. Zero and anything outside `u16` are rejected.
pub fn parse_port(raw: &str) -> Option<u16> {
    raw.trim().parse::<u16>().ok().filter(|p| *p > 0)
}

fn parse_number<T>(key: &str, raw: &str, default: T) -> T
where
    T: std::str::FromStr + std::fmt::Display + Copy,
{
    if raw.trim().is_empty() {
        return default;
    }
    raw.trim().parse().unwrap_or_else(|_| {
        tracing::warn!("Invalid value in {}: '{}'. Using {}.", key, raw, default);
        default
    })
}

/// Read a `.env` file into a key/value map.
///
/// A missing file yields an empty map. An unreadable file is logged and also
/// yields an empty map.
pub fn load_env_file(path: &Path) -> HashMap<String, String> {
    match std::fs::read_to_string(path) {
        Ok(content) => parse_env_file(&content),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!("No env file at {}", path.display());
            HashMap::new()
        }
        Err(e) => {
            tracing::warn!("Could not read env file {}: {}", path.display(), e);
            HashMap::new()
        }
    }
}

/// Parse `KEY=VALUE` lines.
///
/// Blank lines, `#` comments and lines without `=` are skipped. The first `=`
/// splits key from value; both are trimmed. A value wrapped in matching
/// quotes has them removed. Later duplicates win.
pub fn parse_env_file(content: &str) -> HashMap<String, String> {
    let mut values = HashMap::new();

    for line in content.lines() {
        let stripped = line.trim();
        if stripped.is_empty() || stripped.starts_with('#') {
            continue;
        }
        let Some((key, value)) = stripped.split_once('=') else {
            continue;
        };
        let key = key.trim();
        if key.is_empty() {
            continue;
        }
        values.insert(key.to_string(), unquote(value.trim()).to_string());
    }

    values
}

fn unquote(value: &str) -> &str {
    for quote in ['"', '\''] {
        if value.len() >= 2 && value.starts_with(quote) && value.ends_with(quote) {
            return &value[1..value.len() - 1];
        }
    }
    value
}

#[cfg(test)]
mod tests {
    use super::*;

    fn file(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn env_of<'a>(
        pairs: &'a [(&'static str, &'static str)],
    ) -> impl Fn(&str) -> Option<String> + 'a {
        move |key: &str| {
            pairs
                .iter()
                .find(|(k, _)| *k == key)
                .map(|(_, v)| v.to_string())
        }
    }

    #[test]
    fn test_parse_env_file() {
        let content = "# comment\n\nFOO=bar\nBADLINE\n KEY = value with spaces \n";
        let values = parse_env_file(content);
        assert_eq!(values.len(), 2);
        assert_eq!(values.get("FOO").map(String::as_str), Some("bar"));
        assert_eq!(
            values.get("KEY").map(String::as_str),
            Some("value with spaces")
        );
        assert!(!values.contains_key("BADLINE"));
        assert!(!values.contains_key("# comment"));
    }

    #[test]
    fn test_parse_env_file_first_equals_splits() {
        let values = parse_env_file("URL=http://x?a=b\nQUOTED=\"hello world\"\nEMPTY=\n=nokey");
        assert_eq!(values["URL"], "http://x?a=b");
        assert_eq!(values["QUOTED"], "hello world");
        assert_eq!(values["EMPTY"], "");
        assert_eq!(values.len(), 3);
    }

    #[test]
    fn test_precedence() {
        let f = file(&[("CHROMA_PORT", "7000")]);

        let cfg = Config::resolve(env_of(&[("CHROMA_PORT", "9000")]), &f);
        assert_eq!(cfg.port, 9000);

        let cfg = Config::resolve(env_of(&[]), &f);
        assert_eq!(cfg.port, 7000);

        let cfg = Config::resolve(env_of(&[]), &HashMap::new());
        assert_eq!(cfg.port, 8000);
    }

    #[test]
    fn test_empty_env_value_falls_through() {
        let f = file(&[("CHROMA_HOST", "chroma")]);
        assert_eq!(resolve_from(Some(String::new()), "CHROMA_HOST", "localhost", &f), "chroma");
        assert_eq!(resolve_from(None, "OTHER", "fallback", &f), "fallback");
    }

    #[test]
    fn test_resolve_setting_reads_process_env() {
        let key = "CHROMA_HARNESS_TEST_RESOLVE_SETTING";
        let f = file(&[(key, "from-file")]);
        assert_eq!(resolve_setting(key, "default", &f), "from-file");
        std::env::set_var(key, "from-env");
        assert_eq!(resolve_setting(key, "default", &f), "from-env");
        std::env::remove_var(key);
    }

    #[test]
    fn test_invalid_port_falls_back() {
        for bad in ["abc", "0", "70000", "-1", ""] {
            let cfg = Config::resolve(env_of(&[]), &file(&[("CHROMA_PORT", bad)]));
            assert_eq!(cfg.port, DEFAULT_PORT, "port '{}' should fall back", bad);
        }
        assert_eq!(parse_port(" 8080 "), Some(8080));
    }

    #[test]
    fn test_defaults() {
        let cfg = Config::resolve(env_of(&[]), &HashMap::new());
        assert_eq!(cfg, Config::default());
        assert_eq!(cfg.base_url(), "http://localhost:8000");
        assert_eq!(cfg.collection, "articulos");
        assert_eq!(cfg.embedding.provider, "local");
    }

    #[test]
    fn test_embedding_settings() {
        let f = file(&[
            ("EMBEDDING_PROVIDER", "Ollama"),
            ("EMBEDDING_MODEL", "nomic-embed-text"),
            ("EMBEDDING_MAX_RETRIES", "oops"),
            ("CHROMA_TIMEOUT_SECS", "5"),
        ]);
        let cfg = Config::resolve(env_of(&[]), &f);
        assert_eq!(cfg.embedding.provider, "ollama");
        assert_eq!(cfg.embedding.model.as_deref(), Some("nomic-embed-text"));
        assert_eq!(cfg.embedding.max_retries, 3);
        assert_eq!(cfg.embedding.timeout_secs, 5);
        assert_eq!(cfg.timeout_secs, 5);
    }

    #[test]
    fn test_zero_timeout_falls_back() {
        for bad in ["0", " 0 ", "-5", "soon"] {
            let cfg = Config::resolve(env_of(&[]), &file(&[("CHROMA_TIMEOUT_SECS", bad)]));
            assert_eq!(cfg.timeout_secs, DEFAULT_TIMEOUT_SECS, "timeout '{}' should fall back", bad);
            assert_eq!(cfg.embedding.timeout_secs, DEFAULT_TIMEOUT_SECS);
        }
        let cfg = Config::resolve(env_of(&[("CHROMA_TIMEOUT_SECS", "1")]), &HashMap::new());
        assert_eq!(cfg.timeout_secs, 1);
    }

    #[test]
    fn test_base_url_with_scheme() {
        let cfg = Config {
            host: "https://chroma.example.com/".to_string(),
            port: 443,
            ..Config::default()
        };
        assert_eq!(cfg.base_url(), "https://chroma.example.com:443");
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let values = load_env_file(&dir.path().join("missing.env"));
        assert!(values.is_empty());
    }

    #[test]
    fn test_load_file_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(".env");
        std::fs::write(&path, "CHROMA_COLLECTION=pruebas\n").unwrap();
        let values = load_env_file(&path);
        assert_eq!(values["CHROMA_COLLECTION"], "pruebas");
    }
}
