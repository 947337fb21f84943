//! Caller identity extraction and role-based capability checks.
//!
//! Verifying the caller's identity is outside this service; an upstream
//! gateway is trusted to set the `x-user-id` header. Capabilities are
//! modeled as an injected [`Authorizer`] predicate so the transaction
//! core never hardcodes identity comparisons.

use std::collections::HashSet;

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use common::UserId;

use crate::config::Config;
use crate::error::ApiError;

/// Header carrying the authenticated caller's identity.
pub const USER_HEADER: &str = "x-user-id";

/// The authenticated caller, extracted from [`USER_HEADER`].
#[derive(Debug, Clone)]
pub struct CurrentUser(pub UserId);

impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let user = parts
            .headers
            .get(USER_HEADER)
            .and_then(|value| value.to_str().ok())
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .ok_or_else(|| ApiError::Unauthorized(format!("Missing {USER_HEADER} header")))?;

        Ok(CurrentUser(UserId::new(user)))
    }
}

/// Role-based capability checks consumed by the order routes.
pub trait Authorizer: Send + Sync {
    /// May this user force-set an order's status?
    fn can_update_status(&self, user: &UserId) -> bool;

    /// May this user adjust a product's stock level?
    fn can_adjust_stock(&self, user: &UserId) -> bool;
}

/// Authorizer backed by configured user-id lists.
#[derive(Debug, Default)]
pub struct RoleTable {
    cashiers: HashSet<String>,
    storekeepers: HashSet<String>,
}

impl RoleTable {
    /// Creates a role table from explicit user-id lists.
    pub fn new(
        cashiers: impl IntoIterator<Item = String>,
        storekeepers: impl IntoIterator<Item = String>,
    ) -> Self {
        Self {
            cashiers: cashiers.into_iter().collect(),
            storekeepers: storekeepers.into_iter().collect(),
        }
    }

    /// Creates a role table from the loaded configuration.
    pub fn from_config(config: &Config) -> Self {
        Self::new(config.cashiers.clone(), config.storekeepers.clone())
    }
}

impl Authorizer for RoleTable {
    fn can_update_status(&self, user: &UserId) -> bool {
        self.cashiers.contains(user.as_str())
    }

    fn can_adjust_stock(&self, user: &UserId) -> bool {
        self.storekeepers.contains(user.as_str())
    }
}
