use actix_web::{HttpRequest, HttpResponse};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::models::User;

const TOKEN_LIFETIME_SECS: i64 = 60 * 60;

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub name: String,
    pub user_id: String,
    pub iat: usize,
    pub exp: usize,
}

/// Signs a 1-hour bearer token for the given user. Tokens are valid
/// until expiry; there is no revocation.
pub fn issue(secret: &str, user: &User) -> Result<String, jsonwebtoken::errors::Error> {
    let now = chrono::Utc::now().timestamp();
    let claims = Claims {
        name: user.name.clone(),
        user_id: user.id.clone(),
        iat: now as usize,
        exp: (now + TOKEN_LIFETIME_SECS) as usize,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
}

pub fn verify(secret: &str, token: &str) -> Result<Claims, jsonwebtoken::errors::Error> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
}

/// Gate for protected routes: pulls the bearer token out of the
/// Authorization header and verifies it. Handlers early-return the
/// error response.
pub fn authenticate(req: &HttpRequest, secret: &str) -> Result<Claims, HttpResponse> {
    let token = req
        .headers()
        .get("Authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "));

    let token = match token {
        Some(t) => t,
        None => {
            return Err(HttpResponse::Unauthorized().json(json!({
                "message": "Auth Failed"
            })))
        }
    };

    verify(secret, token).map_err(|_| {
        HttpResponse::Unauthorized().json(json!({
            "message": "Auth Failed"
        }))
    })
}
