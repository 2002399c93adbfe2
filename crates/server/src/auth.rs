//! Authentication gate and authorization policy.
//!
//! The gate runs as middleware on every route. It resolves the caller to a
//! [`Principal`] (or rejects with 401) and stores it in the request
//! extensions. Handlers then check the principal against the route's
//! [`RoleRequirement`] with [`authorize`], which yields 403 on a mismatch.

use crate::error::{ApiError, ApiResult};
use crate::handlers::common::{CREDENTIAL_STORE, with_timeout};
use crate::metrics;
use crate::state::AppState;
use aumeta_core::{PasswordDigest, Role, RoleRequirement};
use axum::extract::{Request, State};
use axum::http::{HeaderMap, Method};
use axum::http::header::AUTHORIZATION;
use axum::middleware::Next;
use axum::response::Response;
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use std::collections::HashSet;
use tracing::Instrument;
use uuid::Uuid;

/// Maximum length for trace IDs.
/// Longer trace IDs are truncated to prevent log bloat and potential log injection.
const MAX_TRACE_ID_LEN: usize = 128;

/// Path prefixes for API documentation, served without credentials.
const DOC_PATH_PREFIXES: &[&str] = &["/api-docs", "/swagger-ui", "/v3/api-docs"];

/// Trace ID for request correlation.
#[derive(Clone, Debug)]
pub struct TraceId(pub String);

impl TraceId {
    /// Generate a new random trace ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Create a trace ID from a client-provided value.
    /// The value is truncated to MAX_TRACE_ID_LEN characters and non-printable characters removed.
    pub fn from_client(value: &str) -> Self {
        let sanitized: String = value
            .chars()
            .take(MAX_TRACE_ID_LEN)
            .filter(|c| c.is_ascii_graphic() || *c == ' ')
            .collect();

        if sanitized.is_empty() {
            Self::new()
        } else {
            Self(sanitized)
        }
    }

    /// Get the trace ID as a string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for TraceId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for TraceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The caller of a request, as established by the gate.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Principal {
    /// `None` for anonymous principals.
    pub username: Option<String>,
    /// Granted roles.
    pub roles: HashSet<Role>,
}

impl Principal {
    /// Principal for public routes and for deployments with authentication off.
    pub fn anonymous() -> Self {
        Self {
            username: None,
            roles: HashSet::from([Role::Unauthenticated]),
        }
    }

    /// Principal for a verified user.
    pub fn user(username: impl Into<String>, roles: HashSet<Role>) -> Self {
        Self {
            username: Some(username.into()),
            roles,
        }
    }

    pub fn is_anonymous(&self) -> bool {
        self.username.is_none()
    }

    /// Name used in log fields.
    pub fn display_name(&self) -> &str {
        self.username.as_deref().unwrap_or("anonymous")
    }
}

/// Check whether a route is reachable without credentials.
pub fn is_public(method: &Method, path: &str) -> bool {
    if method != Method::GET && method != Method::HEAD {
        return false;
    }
    if path == "/status" || path == "/metrics" {
        return true;
    }
    DOC_PATH_PREFIXES.iter().any(|prefix| {
        path.strip_prefix(prefix)
            .is_some_and(|rest| rest.is_empty() || rest.starts_with('/'))
    })
}

/// Decode an `Authorization: Basic` header value into `(username, password)`.
///
/// The scheme is case-insensitive. The decoded credentials must be exactly two
/// non-empty fields separated by a single `:`.
pub fn parse_basic_credentials(header: &str) -> ApiResult<(String, String)> {
    let encoded = header
        .get(..6)
        .filter(|scheme| scheme.eq_ignore_ascii_case("basic "))
        .map(|_| header[6..].trim())
        .ok_or(ApiError::MalformedCredentials)?;

    let decoded = STANDARD
        .decode(encoded)
        .map_err(|_| ApiError::MalformedCredentials)?;
    let decoded = String::from_utf8(decoded).map_err(|_| ApiError::MalformedCredentials)?;

    let mut fields = decoded.split(':');
    match (fields.next(), fields.next(), fields.next()) {
        (Some(user), Some(password), None) if !user.is_empty() && !password.is_empty() => {
            Ok((user.to_string(), password.to_string()))
        }
        _ => Err(ApiError::MalformedCredentials),
    }
}

/// Extract trace ID from X-Trace-Id header or generate a new one.
fn extract_or_generate_trace_id(req: &Request) -> TraceId {
    req.headers()
        .get("x-trace-id")
        .and_then(|v| v.to_str().ok())
        .map(TraceId::from_client)
        .unwrap_or_else(TraceId::new)
}

/// Resolve the caller of a request.
async fn authenticate(
    state: &AppState,
    method: &Method,
    path: &str,
    headers: &HeaderMap,
) -> ApiResult<Principal> {
    if !state.config.auth.required || is_public(method, path) {
        return Ok(Principal::anonymous());
    }

    let header = headers
        .get(AUTHORIZATION)
        .ok_or(ApiError::MissingCredentials)?
        .to_str()
        .map_err(|_| ApiError::MalformedCredentials)?;
    let (username, password) = parse_basic_credentials(header)?;

    let user = with_timeout(state, CREDENTIAL_STORE, state.metadata.get_user(&username)).await?;

    let Some(user) = user else {
        // Same work as a wrong password, then the same rejection.
        let _ = state.dummy_digest.verify(&password);
        tracing::debug!(username = %username, "Unknown user");
        return Err(ApiError::BadCredentials);
    };

    let digest = match PasswordDigest::parse(&user.password_hash) {
        Ok(digest) => digest,
        Err(e) => {
            tracing::error!(
                username = %username,
                error = %e,
                "Stored password digest is unreadable"
            );
            return Err(ApiError::BadCredentials);
        }
    };
    if !digest.verify(&password) {
        return Err(ApiError::BadCredentials);
    }

    let names: Vec<String> = serde_json::from_str(&user.roles)
        .map_err(|e| ApiError::Internal(format!("invalid stored roles: {e}")))?;
    let roles: HashSet<Role> = names
        .iter()
        .filter_map(|name| match Role::parse(name) {
            Ok(role) => Some(role),
            Err(_) => {
                tracing::warn!(
                    username = %username,
                    invalid_role = %name,
                    "User has an unknown role, ignoring"
                );
                None
            }
        })
        .collect();

    Ok(Principal::user(username, roles))
}

/// Authentication middleware: assigns a trace ID, resolves the principal, and
/// runs the rest of the request inside a span carrying the trace ID.
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let trace_id = extract_or_generate_trace_id(&req);
    let span = tracing::info_span!("request", trace_id = %trace_id);
    req.extensions_mut().insert(trace_id);

    async move {
        let authenticated =
            authenticate(&state, req.method(), req.uri().path(), req.headers()).await;
        let principal = match authenticated {
            Ok(principal) => principal,
            Err(err) => {
                if let Some(reason) = err.auth_failure_reason() {
                    metrics::record_auth_failure(reason);
                    tracing::warn!(
                        reason,
                        method = %req.method(),
                        path = %req.uri().path(),
                        "Authentication rejected"
                    );
                }
                return Err(err);
            }
        };

        if !principal.is_anonymous() {
            tracing::debug!(username = %principal.display_name(), "Authenticated");
        }
        req.extensions_mut().insert(principal);
        Ok(next.run(req).await)
    }
    .instrument(span)
    .await
}

/// Get the principal the gate attached to the request.
pub fn require_principal(req: &Request) -> ApiResult<&Principal> {
    req.extensions()
        .get::<Principal>()
        .ok_or(ApiError::MissingCredentials)
}

/// Check a principal against a route's role requirement.
pub fn authorize(principal: &Principal, requirement: RoleRequirement) -> ApiResult<()> {
    if requirement.is_satisfied_by(&principal.roles) {
        return Ok(());
    }

    metrics::AUTHZ_DENIALS.inc();
    tracing::info!(
        username = %principal.display_name(),
        required = %requirement,
        "Authorization denied"
    );
    Err(ApiError::InsufficientRole(format!("requires {requirement}")))
}
