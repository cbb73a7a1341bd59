//! Bearer-token identity resolution for FOLIO.
//!
//! Authentication happens entirely at the HTTP boundary: handlers that take
//! a [`Caller`] parameter never run for unauthenticated requests. The domain
//! logic receives only the resolved user id and trusts it.

use std::collections::HashMap;

use async_trait::async_trait;
use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use uuid::Uuid;

use folio_http::error::AppError;
use folio_kernel::settings::AuthSettings;
use folio_kernel::{AppState, IdentityResolver};

/// The authenticated caller, extracted from the `Authorization` header.
#[derive(Debug, Clone, Copy)]
pub struct Caller {
    pub user_id: Uuid,
}

impl FromRequestParts<AppState> for Caller {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts)
            .ok_or_else(|| AppError::unauthorized("authentication required"))?;

        // Unknown tokens get the same answer as missing ones; the response
        // reveals nothing about which tokens exist.
        let Some(user_id) = state.identity.resolve(token).await else {
            tracing::debug!("bearer token did not resolve to a known principal");
            return Err(AppError::unauthorized("authentication required"));
        };

        Ok(Caller { user_id })
    }
}

fn bearer_token(parts: &Parts) -> Option<&str> {
    parts
        .headers
        .get(AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

/// Identity resolver backed by the static token map in settings.
pub struct StaticTokenResolver {
    tokens: HashMap<String, Uuid>,
}

impl StaticTokenResolver {
    pub fn from_settings(auth: &AuthSettings) -> Self {
        Self {
            tokens: auth
                .tokens
                .iter()
                .map(|(token, principal)| (token.clone(), principal.id))
                .collect(),
        }
    }
}

#[async_trait]
impl IdentityResolver for StaticTokenResolver {
    async fn resolve(&self, credentials: &str) -> Option<Uuid> {
        self.tokens.get(credentials).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;
    use folio_kernel::settings::Principal;

    fn parts_with_auth(value: Option<&str>) -> Parts {
        let mut builder = Request::builder().uri("/");
        if let Some(value) = value {
            builder = builder.header(AUTHORIZATION, value);
        }
        let (parts, ()) = builder.body(()).unwrap().into_parts();
        parts
    }

    #[test]
    fn bearer_token_requires_the_scheme_prefix() {
        assert_eq!(
            bearer_token(&parts_with_auth(Some("Bearer dev-alice"))),
            Some("dev-alice")
        );
        assert_eq!(bearer_token(&parts_with_auth(Some("dev-alice"))), None);
        assert_eq!(bearer_token(&parts_with_auth(Some("Bearer "))), None);
        assert_eq!(bearer_token(&parts_with_auth(None)), None);
    }

    #[tokio::test]
    async fn missing_and_unknown_tokens_get_the_same_rejection() {
        use folio_db::memory::MemoryDb;
        use folio_kernel::settings::Settings;
        use folio_kernel::Stores;
        use std::sync::Arc;

        let state = AppState {
            settings: Arc::new(Settings::default()),
            stores: Stores::memory(Arc::new(MemoryDb::new())),
            identity: Arc::new(StaticTokenResolver::from_settings(&AuthSettings::default())),
        };

        let mut missing = parts_with_auth(None);
        let mut unknown = parts_with_auth(Some("Bearer who-dis"));

        for parts in [&mut missing, &mut unknown] {
            let err = Caller::from_request_parts(parts, &state).await.unwrap_err();
            match err {
                AppError::Unauthorized { message, .. } => {
                    assert_eq!(message, "authentication required");
                }
                other => panic!("expected Unauthorized, got {other:?}"),
            }
        }
    }

    #[tokio::test]
    async fn static_resolver_maps_known_tokens_only() {
        let alice = Uuid::from_u128(1);
        let mut auth = AuthSettings::default();
        auth.tokens.insert(
            "dev-alice".to_string(),
            Principal {
                id: alice,
                name: "Alice".to_string(),
            },
        );

        let resolver = StaticTokenResolver::from_settings(&auth);
        assert_eq!(resolver.resolve("dev-alice").await, Some(alice));
        assert_eq!(resolver.resolve("who-dis").await, None);
    }
}
