//! Request identity and cross-origin policy
//!
//! Authentication happens upstream; the gateway forwards the resolved
//! identity in `x-actor-*` headers, which are turned into a
//! [`RequestContext`] here.
use axum::{extract::FromRequestParts, http::request::Parts};
use std::convert::Infallible;
use tower_http::cors::CorsLayer;
use vigil_core::{Actor, RequestContext, Role};

pub const ACTOR_ID: &str = "x-actor-id";
pub const ACTOR_ROLE: &str = "x-actor-role";
pub const REPORTER_ID: &str = "x-reporter-id";
pub const CLIENT_KEY: &str = "x-client-key";

pub fn cors() -> CorsLayer {
    CorsLayer::permissive()
}

/// Caller identity extracted from headers
#[derive(Debug, Clone)]
pub struct Identity(pub RequestContext);

fn header(parts: &Parts, name: &str) -> Option<String> {
    parts
        .headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

impl<S> FromRequestParts<S> for Identity
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let actor_id = header(parts, ACTOR_ID);
        let role = match header(parts, ACTOR_ROLE).as_deref() {
            Some(r) if r.eq_ignore_ascii_case("admin") => Role::Admin,
            _ => Role::Public,
        };
        // A signed-in citizen reports under their own identity unless the
        // gateway says otherwise
        let reporter_id = header(parts, REPORTER_ID).or_else(|| match role {
            Role::Public => actor_id.clone(),
            Role::Admin => None,
        });

        Ok(Identity(RequestContext {
            actor: Actor { id: actor_id, role },
            reporter_id,
            client_key: header(parts, CLIENT_KEY),
        }))
    }
}
