//! API keys: environment first, then one file per key in the config directory.

use std::fmt;
use std::path::Path;

use askweb_client::BackendKind;

pub const GOOGLE_API_KEY: &str = "GOOGLE_API_KEY";
pub const GOOGLE_CSE_ID: &str = "GOOGLE_CSE_ID";
pub const BING_API_KEY: &str = "BING_API_KEY";
pub const BING_CONFIG_KEY: &str = "BING_CONFIG_KEY";
pub const OPENAI_API_KEY: &str = "OPENAI_API_KEY";
pub const GEMINI_API_KEY: &str = "GEMINI_API_KEY";

/// Resolved credentials. An empty string means "not configured", which
/// disables whatever needs the key.
#[derive(Clone, Default)]
pub struct Credentials {
    pub google_api_key: String,
    pub google_cse_id: String,
    pub bing_api_key: String,
    pub bing_config_key: String,
    pub openai_api_key: String,
    pub gemini_api_key: String,
}

impl Credentials {
    pub fn resolve(config_dir: &Path) -> Self {
        Self::from_lookup(|name| std::env::var(name).ok(), config_dir)
    }

    /// Resolve every key through `env`, falling back to the key file.
    pub fn from_lookup(env: impl Fn(&str) -> Option<String>, config_dir: &Path) -> Self {
        let key = |name: &str| read_key(name, &env, config_dir);
        Self {
            google_api_key: key(GOOGLE_API_KEY),
            google_cse_id: key(GOOGLE_CSE_ID),
            bing_api_key: key(BING_API_KEY),
            bing_config_key: key(BING_CONFIG_KEY),
            openai_api_key: key(OPENAI_API_KEY),
            gemini_api_key: key(GEMINI_API_KEY),
        }
    }

    /// `(api key, engine id)` when both Google keys are present.
    pub fn google(&self) -> Option<(&str, &str)> {
        both(&self.google_api_key, &self.google_cse_id)
    }

    /// `(api key, custom config id)` when both Bing keys are present.
    pub fn bing(&self) -> Option<(&str, &str)> {
        both(&self.bing_api_key, &self.bing_config_key)
    }

    pub fn llm_key(&self, kind: BackendKind) -> &str {
        match kind {
            BackendKind::ChatGpt => &self.openai_api_key,
            BackendKind::Gemini => &self.gemini_api_key,
        }
    }

    pub fn entries(&self) -> [(&'static str, &str); 6] {
        [
            (GOOGLE_API_KEY, &self.google_api_key),
            (GOOGLE_CSE_ID, &self.google_cse_id),
            (BING_API_KEY, &self.bing_api_key),
            (BING_CONFIG_KEY, &self.bing_config_key),
            (OPENAI_API_KEY, &self.openai_api_key),
            (GEMINI_API_KEY, &self.gemini_api_key),
        ]
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut s = f.debug_struct("Credentials");
        for (name, value) in self.entries() {
            s.field(name, &mask(value));
        }
        s.finish()
    }
}

fn both<'a>(a: &'a str, b: &'a str) -> Option<(&'a str, &'a str)> {
    (!a.is_empty() && !b.is_empty()).then_some((a, b))
}

/// `GOOGLE_API_KEY` is stored in a file called `google-api-key`.
pub fn key_file_name(name: &str) -> String {
    name.to_ascii_lowercase().replace('_', "-")
}

fn read_key(name: &str, env: &impl Fn(&str) -> Option<String>, config_dir: &Path) -> String {
    if let Some(value) = env(name).map(|v| v.trim().to_string()) {
        if !value.is_empty() {
            return value;
        }
    }

    let path = config_dir.join(key_file_name(name));
    match std::fs::read_to_string(&path) {
        Ok(content) => content.lines().next().unwrap_or_default().trim().to_string(),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => String::new(),
        Err(e) => {
            tracing::warn!(key = name, path = %path.display(), error = %e, "Could not read key file");
            String::new()
        }
    }
}

/// Everything but the last four characters replaced with `*`.
pub fn mask(secret: &str) -> String {
    if secret.is_empty() {
        return "(not set)".to_string();
    }
    let chars: Vec<char> = secret.chars().collect();
    let visible = chars.len().saturating_sub(4);
    let tail: String = chars[visible..].iter().collect();
    if visible == 0 {
        "*".repeat(chars.len())
    } else {
        format!("{}{tail}", "*".repeat(visible))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env_of(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn test_key_file_name() {
        assert_eq!(key_file_name("GOOGLE_API_KEY"), "google-api-key");
        assert_eq!(key_file_name("BING_CONFIG_KEY"), "bing-config-key");
    }

    #[test]
    fn test_env_wins_over_file() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("openai-api-key"), "from-file\n").unwrap();

        let creds = Credentials::from_lookup(env_of(&[("OPENAI_API_KEY", "from-env")]), dir.path());
        assert_eq!(creds.openai_api_key, "from-env");
    }

    #[test]
    fn test_file_fallback_reads_first_line_trimmed() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("google-api-key"), "  g-key  \nsecond line\n").unwrap();
        std::fs::write(dir.path().join("google-cse-id"), "cse").unwrap();

        let creds = Credentials::from_lookup(env_of(&[("GOOGLE_API_KEY", "")]), dir.path());
        assert_eq!(creds.google(), Some(("g-key", "cse")));
        assert_eq!(creds.bing(), None);
        assert_eq!(creds.gemini_api_key, "");
    }

    #[test]
    fn test_provider_needs_both_keys() {
        let dir = tempfile::tempdir().unwrap();
        let creds = Credentials::from_lookup(env_of(&[("BING_API_KEY", "b")]), dir.path());
        assert_eq!(creds.bing(), None);

        let creds = Credentials::from_lookup(
            env_of(&[("BING_API_KEY", "b"), ("BING_CONFIG_KEY", "c")]),
            dir.path(),
        );
        assert_eq!(creds.bing(), Some(("b", "c")));
    }

    #[test]
    fn test_llm_key_by_backend() {
        let creds = Credentials {
            openai_api_key: "sk".into(),
            gemini_api_key: "gm".into(),
            ..Credentials::default()
        };
        assert_eq!(creds.llm_key(BackendKind::ChatGpt), "sk");
        assert_eq!(creds.llm_key(BackendKind::Gemini), "gm");
    }

    #[test]
    fn test_mask() {
        assert_eq!(mask(""), "(not set)");
        assert_eq!(mask("abc"), "***");
        assert_eq!(mask("sk-1234567890"), "*********7890");
    }

    #[test]
    fn test_debug_never_shows_secrets() {
        let creds = Credentials {
            openai_api_key: "sk-super-secret-value".into(),
            ..Credentials::default()
        };
        let debug = format!("{creds:?}");
        assert!(!debug.contains("super-secret"));
        assert!(debug.contains("alue"));
        assert!(debug.contains("(not set)"));
    }
}
