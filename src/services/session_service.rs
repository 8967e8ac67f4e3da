use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use rand::Rng;
use tracing::{info, warn};

use crate::errors::AppError;
use crate::models::{AuthProvider, User};
use crate::store::SessionStore;

/// Key under which the signed-in user is persisted.
pub const SESSION_KEY: &str = "roshnet_user";

const DEMO_NAME: &str = "Demo User";
const DEMO_EMAIL: &str = "demo@roshnet.ai";
const ID_ALPHABET: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";

#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub session_dir: String,
    pub login_delay_ms: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            session_dir: ".roshnet".to_string(),
            login_delay_ms: 1000,
        }
    }
}

impl SessionConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            session_dir: std::env::var("SESSION_DIR").unwrap_or(defaults.session_dir),
            login_delay_ms: std::env::var("LOGIN_DELAY_MS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.login_delay_ms),
        }
    }
}

/// The signed-in user, with explicit load and save against a [`SessionStore`].
pub struct Session {
    store: Arc<dyn SessionStore>,
    login_delay: Duration,
    user: Option<User>,
}

impl Session {
    pub fn new(store: Arc<dyn SessionStore>, config: &SessionConfig) -> Self {
        Self {
            store,
            login_delay: Duration::from_millis(config.login_delay_ms),
            user: None,
        }
    }

    /// Restores the user saved by a previous login. A corrupt entry is
    /// discarded rather than treated as an error.
    pub fn load(&mut self) -> Result<Option<&User>, AppError> {
        self.user = match self.store.get(SESSION_KEY)? {
            Some(raw) => match serde_json::from_str::<User>(&raw) {
                Ok(user) => {
                    info!("Restored session for {}", user.email);
                    Some(user)
                }
                Err(e) => {
                    warn!("Discarding unreadable session entry: {}", e);
                    self.store.remove(SESSION_KEY)?;
                    None
                }
            },
            None => None,
        };
        Ok(self.user.as_ref())
    }

    pub fn user(&self) -> Option<&User> {
        self.user.as_ref()
    }

    pub fn is_authenticated(&self) -> bool {
        self.user.is_some()
    }

    /// Signs in with a mock profile and persists it.
    pub async fn login(&mut self, provider: AuthProvider, email: Option<&str>) -> Result<&User, AppError> {
        if self.login_delay > Duration::ZERO {
            tokio::time::sleep(self.login_delay).await;
        }

        let user = mock_user(email)?;
        self.save(&user)?;
        info!("Signed in {} via {:?}", user.email, provider);
        Ok(&*self.user.insert(user))
    }

    /// Forgets the persisted user first; on a store error the session stays
    /// signed in.
    pub fn logout(&mut self) -> Result<(), AppError> {
        self.store.remove(SESSION_KEY)?;
        if let Some(user) = self.user.take() {
            info!("Signed out {}", user.email);
        }
        Ok(())
    }

    fn save(&self, user: &User) -> Result<(), AppError> {
        let raw = serde_json::to_string(user)?;
        self.store.set(SESSION_KEY, &raw)
    }
}

fn mock_user(email: Option<&str>) -> Result<User, AppError> {
    let email = email.map(str::trim).filter(|e| !e.is_empty());

    let (name, email) = match email {
        Some(email) => {
            let local = email.split('@').next().unwrap_or_default();
            if local.is_empty() {
                return Err(AppError::Validation(format!("Invalid email address: {}", email)));
            }
            (local.to_string(), email.to_string())
        }
        None => (DEMO_NAME.to_string(), DEMO_EMAIL.to_string()),
    };

    Ok(User {
        id: format!("usr_{}", random_id(9)),
        name,
        email,
        avatar: Some(format!(
            "https://api.dicebear.com/7.x/avataaars/svg?seed={}",
            Utc::now().timestamp_millis()
        )),
    })
}

fn random_id(len: usize) -> String {
    let mut rng = rand::rng();
    (0..len)
        .map(|_| ID_ALPHABET[rng.random_range(0..ID_ALPHABET.len())] as char)
        .collect()
}
