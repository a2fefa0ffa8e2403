//! Session - the single owner of the user's credential
//!
//! Components never read the credential file directly. They get a
//! `&Session` and ask it: `current()` to read, `login()` / `logout()` to
//! change it. The backing store is a trait so tests run in memory.

use std::fs;
use std::io::Write;
use std::path::PathBuf;
use std::sync::{Mutex, MutexGuard, PoisonError};

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use chrono::{DateTime, TimeZone, Utc};
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, info};
use url::Url;

use crate::api::{decode_role, id_string};
use crate::config::TaskflowConfig;
use crate::error::{Result, TaskflowError};
use crate::model::Claims;

/// Durable key-value slot for one opaque token
pub trait CredentialStore: Send + Sync {
    fn load(&self) -> Result<Option<String>>;
    fn save(&self, token: &str) -> Result<()>;
    fn clear(&self) -> Result<()>;
}

/// Token kept in a file under the config directory
pub struct FileCredentialStore {
    path: PathBuf,
}

impl FileCredentialStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// `~/.config/taskflow/credential`
    pub fn default_location() -> Self {
        Self::new(TaskflowConfig::config_dir().join("credential"))
    }
}

impl CredentialStore for FileCredentialStore {
    fn load(&self) -> Result<Option<String>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let token = fs::read_to_string(&self.path)?;
        let token = token.trim();
        Ok((!token.is_empty()).then(|| token.to_string()))
    }

    fn save(&self, token: &str) -> Result<()> {
        if let Some(dir) = self.path.parent() {
            fs::create_dir_all(dir)?;
        }
        let mut options = fs::OpenOptions::new();
        options.write(true).create(true).truncate(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            options.mode(0o600);
        }
        let mut file = options.open(&self.path)?;
        // mode only applies on creation; tighten a file left by an older version
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            file.set_permissions(fs::Permissions::from_mode(0o600))?;
        }
        file.write_all(token.as_bytes())?;
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        if self.path.exists() {
            fs::remove_file(&self.path)?;
        }
        Ok(())
    }
}

/// In-memory store for tests and one-shot tokens
#[derive(Default)]
pub struct MemoryCredentialStore {
    token: Mutex<Option<String>>,
}

impl MemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// The slot is a plain value, so a panic while it was held leaves
    /// nothing half-written
    fn slot(&self) -> MutexGuard<'_, Option<String>> {
        self.token.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl CredentialStore for MemoryCredentialStore {
    fn load(&self) -> Result<Option<String>> {
        Ok(self.slot().clone())
    }

    fn save(&self, token: &str) -> Result<()> {
        *self.slot() = Some(token.to_string());
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        *self.slot() = None;
        Ok(())
    }
}

/// A token together with what it claims
#[derive(Debug, Clone, PartialEq)]
pub struct Credential {
    pub token: String,
    pub claims: Claims,
}

impl Credential {
    pub fn parse(token: &str) -> Result<Self> {
        Ok(Self {
            token: token.to_string(),
            claims: decode_claims(token)?,
        })
    }
}

pub struct Session {
    store: Box<dyn CredentialStore>,
    credential: Option<Credential>,
}

impl Session {
    /// Open a session over `store`, restoring any saved credential
    ///
    /// A saved token that no longer decodes is discarded.
    pub fn open(store: Box<dyn CredentialStore>) -> Result<Self> {
        let credential = match store.load()? {
            Some(token) => match Credential::parse(&token) {
                Ok(c) => Some(c),
                Err(e) => {
                    debug!(error = %e, "discarding unreadable stored credential");
                    store.clear()?;
                    None
                }
            },
            None => None,
        };
        Ok(Self { store, credential })
    }

    /// Empty in-memory session
    pub fn in_memory() -> Self {
        Self {
            store: Box::new(MemoryCredentialStore::new()),
            credential: None,
        }
    }

    /// The live credential; an expired token reads as logged out
    pub fn current(&self) -> Option<&Credential> {
        self.current_at(Utc::now())
    }

    pub fn current_at(&self, now: DateTime<Utc>) -> Option<&Credential> {
        self.credential
            .as_ref()
            .filter(|c| !c.claims.is_expired(now))
    }

    pub fn token(&self) -> Option<&str> {
        self.current().map(|c| c.token.as_str())
    }

    pub fn claims(&self) -> Option<&Claims> {
        self.current().map(|c| &c.claims)
    }

    pub fn require(&self) -> Result<&Credential> {
        self.current().ok_or(TaskflowError::NotLoggedIn)
    }

    /// Replace the credential; the token must decode before it is stored
    pub fn login(&mut self, token: &str) -> Result<&Claims> {
        let credential = Credential::parse(token.trim())?;
        self.store.save(&credential.token)?;
        info!(
            username = credential.claims.username.as_deref().unwrap_or("?"),
            "logged in"
        );
        Ok(&self.credential.insert(credential).claims)
    }

    pub fn logout(&mut self) -> Result<()> {
        self.store.clear()?;
        self.credential = None;
        info!("logged out");
        Ok(())
    }
}

/// Pull the `token` query parameter out of a magic link
///
/// A bare token (no URL) is passed through.
pub fn magic_link_token(link: &str) -> Result<String> {
    let trimmed = link.trim();
    match Url::parse(trimmed) {
        Ok(url) => url
            .query_pairs()
            .find(|(k, _)| k == "token")
            .map(|(_, v)| v.into_owned())
            .filter(|t| !t.is_empty())
            .ok_or(TaskflowError::MissingMagicToken),
        Err(_) if trimmed.matches('.').count() == 2 => Ok(trimmed.to_string()),
        Err(_) => Err(TaskflowError::MissingMagicToken),
    }
}

#[derive(Deserialize)]
struct RawClaims {
    #[serde(default)]
    username: Option<String>,
    #[serde(default, alias = "id", alias = "sub")]
    user_id: Option<Value>,
    #[serde(default, alias = "user_role")]
    role: Option<Value>,
    #[serde(default)]
    exp: Option<i64>,
}

/// Decode (not verify) the payload segment of a JWT
pub fn decode_claims(token: &str) -> Result<Claims> {
    let mut parts = token.split('.');
    let payload = match (parts.next(), parts.next(), parts.next(), parts.next()) {
        (Some(_), Some(payload), Some(_), None) => payload,
        _ => {
            return Err(TaskflowError::InvalidToken {
                reason: "expected three dot-separated segments".into(),
            })
        }
    };

    let bytes = URL_SAFE_NO_PAD
        .decode(payload.trim_end_matches('='))
        .map_err(|e| TaskflowError::InvalidToken {
            reason: format!("payload is not base64url: {}", e),
        })?;
    let raw: RawClaims = serde_json::from_slice(&bytes).map_err(|e| TaskflowError::InvalidToken {
        reason: format!("payload is not a JSON object: {}", e),
    })?;

    Ok(Claims {
        username: raw.username,
        user_id: raw.user_id.as_ref().and_then(id_string),
        role: raw.role.as_ref().and_then(decode_role),
        expires_at: raw.exp.and_then(|exp| Utc.timestamp_opt(exp, 0).single()),
    })
}
