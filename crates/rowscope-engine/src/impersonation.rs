//! Role impersonation.
//!
//! Lets a console user preview what another database role would see. The
//! statement is prefixed with transaction-local `set_config` calls that switch
//! the role and install PostgREST-style request settings, so row level
//! security policies evaluate as they would for that role. The executor runs
//! the batch as one implicit transaction, so nothing leaks past it.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};

use rowscope_common::ExecutionError;
use rowscope_core::quote_literal;

use crate::executor::{QueryRows, SqlExecutor, SqlRequest};

/// The role a statement should run as.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ImpersonationRole {
    /// The unauthenticated API role.
    Anon,
    /// The API role that bypasses row level security.
    ServiceRole,
    /// A signed-in user.
    Authenticated {
        /// The user's id, exposed as the `sub` claim.
        user_id: String,
    },
    /// Any other database role.
    Custom {
        /// Role name.
        role: String,
    },
}

impl ImpersonationRole {
    /// Returns the database role name.
    #[must_use]
    pub fn role_name(&self) -> &str {
        match self {
            Self::Anon => "anon",
            Self::ServiceRole => "service_role",
            Self::Authenticated { .. } => "authenticated",
            Self::Custom { role } => role,
        }
    }

    /// Returns a stable identity for cache keys.
    ///
    /// Two authenticated users see different rows, so the user id is part
    /// of it.
    #[must_use]
    pub fn cache_identity(&self) -> String {
        match self {
            Self::Authenticated { user_id } => format!("authenticated:{user_id}"),
            other => other.role_name().to_string(),
        }
    }

    /// Returns the JWT claims the impersonated request carries.
    #[must_use]
    pub fn claims(&self) -> Value {
        match self {
            Self::Authenticated { user_id } => json!({
                "aud": "authenticated",
                "role": "authenticated",
                "sub": user_id,
            }),
            other => {
                let mut claims = Map::new();
                claims.insert("role".to_string(), Value::from(other.role_name()));
                Value::Object(claims)
            }
        }
    }
}

/// Prefixes `sql` with the settings that make it run as `role`.
#[must_use]
pub fn wrap_with_role_impersonation(sql: &str, role: &ImpersonationRole) -> String {
    let settings = [
        ("role", role.role_name().to_string()),
        ("request.jwt.claims", role.claims().to_string()),
        ("request.method", "TRACE".to_string()),
        ("request.path", "/impersonation-example-request-path".to_string()),
        ("request.headers", r#"{"accept": "*/*"}"#.to_string()),
    ];
    let calls = settings
        .iter()
        .map(|(name, value)| {
            format!(
                "set_config({}, {}, true)",
                quote_literal(name),
                quote_literal(value)
            )
        })
        .collect::<Vec<_>>()
        .join(", ");

    let mut wrapped = format!("select {calls};\n\n{}", sql.trim_end());
    if !wrapped.ends_with(';') {
        wrapped.push(';');
    }
    wrapped
}

/// Executor layer that rewrites every statement to run as a role.
///
/// With no role set, requests pass through untouched.
pub struct RoleImpersonationLayer<E> {
    inner: E,
    role: Option<ImpersonationRole>,
}

impl<E> RoleImpersonationLayer<E> {
    /// Wraps `inner`, impersonating `role` when one is given.
    pub fn new(inner: E, role: Option<ImpersonationRole>) -> Self {
        Self { inner, role }
    }

    /// Returns the impersonated role.
    #[must_use]
    pub fn role(&self) -> Option<&ImpersonationRole> {
        self.role.as_ref()
    }
}

#[async_trait]
impl<E: SqlExecutor> SqlExecutor for RoleImpersonationLayer<E> {
    async fn execute(&self, mut request: SqlRequest) -> Result<QueryRows, ExecutionError> {
        if let Some(role) = &self.role {
            tracing::trace!(role = role.role_name(), "impersonating role");
            request.sql = wrap_with_role_impersonation(&request.sql, role);
            request.is_role_impersonation_enabled = true;
        }
        self.inner.execute(request).await
    }
}
