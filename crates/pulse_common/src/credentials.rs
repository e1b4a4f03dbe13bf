//! Model credential resolution
//!
//! Order: explicit argument, then the secrets file, then the environment.
//! A missing credential is not an error; the assistant answers offline.

use serde::Deserialize;
use std::path::Path;
use tracing::{debug, warn};

/// Environment variable and secrets-file key holding the API key
pub const API_KEY_ENV: &str = "OPENAI_API_KEY";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialSource {
    Explicit,
    SecretsFile,
    Environment,
}

#[derive(Clone, PartialEq, Eq)]
pub struct Credential {
    pub key: String,
    pub source: CredentialSource,
}

impl std::fmt::Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credential")
            .field("key", &redact(&self.key))
            .field("source", &self.source)
            .finish()
    }
}

#[derive(Deserialize)]
struct SecretsFile {
    #[serde(rename = "OPENAI_API_KEY")]
    openai_api_key: Option<String>,
}

/// Resolve the API key from all sources
pub fn resolve_credential(explicit: Option<&str>, secrets_path: Option<&Path>) -> Option<Credential> {
    let secrets = secrets_path.and_then(read_secrets_file);
    let env = std::env::var(API_KEY_ENV).ok();
    resolve_from(explicit, secrets.as_deref(), env.as_deref())
}

/// Pick the first non-blank candidate in precedence order
pub fn resolve_from(
    explicit: Option<&str>,
    secrets: Option<&str>,
    env: Option<&str>,
) -> Option<Credential> {
    let candidates = [
        (explicit, CredentialSource::Explicit),
        (secrets, CredentialSource::SecretsFile),
        (env, CredentialSource::Environment),
    ];
    let resolved = candidates.into_iter().find_map(|(value, source)| {
        let key = value?.trim();
        if key.is_empty() {
            None
        } else {
            Some(Credential {
                key: key.to_string(),
                source,
            })
        }
    });
    match &resolved {
        Some(credential) => debug!(source = ?credential.source, "resolved model credential"),
        None => debug!("no model credential configured"),
    }
    resolved
}

/// Read `OPENAI_API_KEY` from a TOML secrets file, if present and readable
pub fn read_secrets_file(path: &Path) -> Option<String> {
    if !path.exists() {
        return None;
    }
    let contents = match std::fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "cannot read secrets file");
            return None;
        }
    };
    match toml::from_str::<SecretsFile>(&contents) {
        Ok(secrets) => secrets.openai_api_key,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "cannot parse secrets file");
            None
        }
    }
}

/// Show only the last four characters of a key
pub fn redact(key: &str) -> String {
    let chars: Vec<char> = key.chars().collect();
    if chars.len() <= 4 {
        return "****".to_string();
    }
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("****{}", tail)
}
