//! Authentication middleware
//!
//! Verifies bearer JWTs issued by the session service and exposes the
//! acting user to handlers.

use axum::{
    extract::{Request, State},
    http::{header::AUTHORIZATION, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use uuid::Uuid;

use crate::error::{AppError, AppResult, ErrorDetail, ErrorResponse};
use crate::AppState;

/// Authenticated user information extracted from JWT
#[derive(Clone, Debug)]
pub struct AuthUser {
    pub user_id: Uuid,
    pub permissions: Vec<String>,
}

impl AuthUser {
    /// Check if user has a specific permission
    pub fn has_permission(&self, resource: &str, action: &str) -> bool {
        let permission = format!("{}:{}", resource, action);
        self.permissions.contains(&permission)
    }

    /// Fail with 403 unless the user holds `resource:action`
    pub fn require(&self, resource: &str, action: &str) -> AppResult<()> {
        if self.has_permission(resource, action) {
            Ok(())
        } else {
            Err(AppError::InsufficientPermissions(format!(
                "{}:{}",
                resource, action
            )))
        }
    }
}

/// Authentication middleware that validates JWT tokens
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let auth_header = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok());

    let token = match auth_header.and_then(|h| h.strip_prefix("Bearer ")) {
        Some(token) => token,
        None => {
            return unauthorized_response("Missing or invalid Authorization header");
        }
    };

    let claims = match decode_jwt(token, &state.config.jwt.secret) {
        Ok(claims) => claims,
        Err(msg) => {
            return unauthorized_response(&msg);
        }
    };

    let user_id = match Uuid::parse_str(&claims.sub) {
        Ok(id) => id,
        Err(_) => return unauthorized_response("Invalid user ID in token"),
    };

    request.extensions_mut().insert(AuthUser {
        user_id,
        permissions: claims.permissions,
    });

    next.run(request).await
}

/// JWT claims structure
#[derive(Debug, serde::Serialize, serde::Deserialize)]
struct Claims {
    sub: String,
    #[serde(default)]
    permissions: Vec<String>,
    exp: i64,
}

/// Decode and validate JWT token
fn decode_jwt(token: &str, secret: &str) -> Result<Claims, String> {
    use jsonwebtoken::{decode, DecodingKey, Validation};

    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|e| format!("Invalid token: {}", e))
}

fn unauthorized_response(message: &str) -> Response {
    let error = ErrorResponse {
        error: ErrorDetail::new("UNAUTHORIZED", message),
    };

    (StatusCode::UNAUTHORIZED, Json(error)).into_response()
}

/// Extractor for authenticated user
/// Use this in handlers to get the current user
#[derive(Clone, Debug)]
pub struct CurrentUser(pub AuthUser);

#[axum::async_trait]
impl<S> axum::extract::FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut axum::http::request::Parts,
        _state: &S,
    ) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthUser>()
            .cloned()
            .map(CurrentUser)
            .ok_or_else(|| AppError::Unauthorized("Authentication required".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::{encode, EncodingKey, Header};

    fn token(secret: &str, exp: i64) -> String {
        let claims = Claims {
            sub: Uuid::nil().to_string(),
            permissions: vec!["stock:write".to_string()],
            exp,
        };
        encode(&Header::default(), &claims, &EncodingKey::from_secret(secret.as_bytes())).unwrap()
    }

    #[test]
    fn test_decode_valid_token() {
        let exp = chrono::Utc::now().timestamp() + 3600;
        let claims = decode_jwt(&token("secret", exp), "secret").unwrap();
        assert_eq!(claims.permissions, vec!["stock:write".to_string()]);
    }

    #[test]
    fn test_decode_rejects_wrong_secret() {
        let exp = chrono::Utc::now().timestamp() + 3600;
        assert!(decode_jwt(&token("secret", exp), "other").is_err());
    }

    #[test]
    fn test_require_permission() {
        let user = AuthUser {
            user_id: Uuid::nil(),
            permissions: vec!["purchase_orders:receive".to_string()],
        };
        assert!(user.require("purchase_orders", "receive").is_ok());
        assert!(matches!(
            user.require("stock", "write"),
            Err(AppError::InsufficientPermissions(_))
        ));
    }
}
