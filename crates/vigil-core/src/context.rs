//! Request Context: identity and time passed explicitly into every call
use chrono::{DateTime, Duration, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::error::{Result, VigilError};

/// Role granted by the identity collaborator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Admin,
    #[default]
    Public,
}

/// The party performing an operation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Actor {
    pub id: Option<String>,
    pub role: Role,
}

impl Actor {
    pub fn is_admin(&self) -> bool {
        self.id.is_some() && self.role == Role::Admin
    }

    pub fn is_authenticated(&self) -> bool {
        self.id.is_some()
    }
}

/// Per-request identity, as resolved by the session collaborator
#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    pub actor: Actor,
    /// Stable reporter identity; None for anonymous submissions
    pub reporter_id: Option<String>,
    /// Opaque client fingerprint used for flood control of anonymous reporters
    pub client_key: Option<String>,
}

impl RequestContext {
    /// Unauthenticated request
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn admin(id: impl Into<String>) -> Self {
        Self {
            actor: Actor {
                id: Some(id.into()),
                role: Role::Admin,
            },
            ..Default::default()
        }
    }

    /// Authenticated citizen; the actor and reporter identities coincide
    pub fn reporter(id: impl Into<String>) -> Self {
        let id = id.into();
        Self {
            actor: Actor {
                id: Some(id.clone()),
                role: Role::Public,
            },
            reporter_id: Some(id),
            client_key: None,
        }
    }

    pub fn with_client_key(mut self, key: impl Into<String>) -> Self {
        self.client_key = Some(key.into());
        self
    }

    /// Fail unless the actor is an authenticated admin
    pub fn require_admin(&self) -> Result<&str> {
        match (&self.actor.id, self.actor.role) {
            (None, _) => Err(VigilError::Authentication(
                "an authenticated identity is required".to_string(),
            )),
            (Some(_), Role::Public) => Err(VigilError::Authorization(
                "admin role required".to_string(),
            )),
            (Some(id), Role::Admin) => Ok(id),
        }
    }

    /// Name recorded in history entries for this actor
    pub fn actor_label(&self) -> String {
        self.actor
            .id
            .clone()
            .unwrap_or_else(|| "anonymous".to_string())
    }
}

/// Time source; injected so scoring and rate limiting are reproducible
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Manually driven clock for tests and replays
#[derive(Debug, Clone)]
pub struct FixedClock {
    now: Arc<Mutex<DateTime<Utc>>>,
}

impl FixedClock {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            now: Arc::new(Mutex::new(now)),
        }
    }

    pub fn set(&self, now: DateTime<Utc>) {
        *self.now.lock() = now;
    }

    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock();
        *now += by;
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock()
    }
}
