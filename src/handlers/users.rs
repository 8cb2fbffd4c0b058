use actix_multipart::{Field, Multipart};
use actix_web::{web, HttpRequest, HttpResponse};
use bcrypt;
use futures_util::TryStreamExt;
use serde_json::json;
use sqlx::Row;
use std::collections::HashMap;
use tracing::error;
use uuid::Uuid;

use crate::config::Config;
use crate::models::{Conversation, LoginRequest, UpdateProfileRequest, User};
use crate::services::discover;
use crate::services::image_host::{ImageHost, StagedFile};
use crate::services::token;
use crate::state::AppState;

fn internal_error() -> HttpResponse {
    HttpResponse::InternalServerError().json(json!({
        "message": "Internal Server Error"
    }))
}

async fn read_field(field: &mut Field) -> Result<Vec<u8>, actix_multipart::MultipartError> {
    let mut data = Vec::new();
    while let Some(chunk) = field.try_next().await? {
        data.extend_from_slice(&chunk);
    }
    Ok(data)
}

fn user_from_row(row: &sqlx::sqlite::SqliteRow) -> User {
    User {
        id: row.get::<String, _>("id"),
        name: row.get::<String, _>("name"),
        email: row.get::<String, _>("email"),
        password: row.get::<String, _>("password"),
        avatar: row.get::<String, _>("avatar"),
        created_at: row.get::<String, _>("created_at"),
    }
}

/// Stages the uploaded bytes, forwards them to the image host and
/// returns the public URL. The staged file is removed when the guard
/// drops, on every exit path.
async fn upload_avatar(config: &Config, data: Vec<u8>, filename: &str) -> Option<String> {
    let staged = match StagedFile::stage(&std::env::temp_dir(), filename, &data).await {
        Ok(staged) => staged,
        Err(e) => {
            error!("failed to stage avatar upload: {}", e);
            return None;
        }
    };

    let host = match ImageHost::from_config(config) {
        Ok(host) => host,
        Err(e) => {
            error!("image host is not configured: {}", e);
            return None;
        }
    };

    match host.upload(&staged).await {
        Ok(url) => Some(url),
        Err(e) => {
            error!("avatar upload failed: {}", e);
            None
        }
    }
}

pub async fn signup(mut payload: Multipart, state: web::Data<AppState>) -> HttpResponse {
    let pool = &state.pool;

    let mut name: Option<String> = None;
    let mut email: Option<String> = None;
    let mut password: Option<String> = None;
    let mut image: Option<(Vec<u8>, String)> = None;

    while let Ok(Some(mut field)) = payload.try_next().await {
        let field_name = field.name().to_string();
        let filename = match field_name.as_str() {
            "image" => Some(
                field
                    .content_disposition()
                    .get_filename()
                    .unwrap_or("avatar.jpg")
                    .to_string(),
            ),
            _ => None,
        };

        // an aborted upload must not be stored as truncated field bytes
        let data = match read_field(&mut field).await {
            Ok(data) => data,
            Err(e) => {
                return HttpResponse::BadRequest().json(json!({
                    "message": format!("Invalid form data: {}", e)
                }))
            }
        };

        match field_name.as_str() {
            "name" => name = String::from_utf8(data).ok(),
            "email" => email = String::from_utf8(data).ok(),
            "password" => password = String::from_utf8(data).ok(),
            "image" => {
                if !data.is_empty() {
                    if let Some(filename) = filename {
                        image = Some((data, filename));
                    }
                }
            }
            _ => {}
        }
    }

    let (name, email, password) = match (
        name.filter(|v| !v.is_empty()),
        email.filter(|v| !v.is_empty()),
        password.filter(|v| !v.is_empty()),
    ) {
        (Some(name), Some(email), Some(password)) => (name, email, password),
        _ => {
            return HttpResponse::BadRequest().json(json!({
                "message": "Fill up all the fields"
            }))
        }
    };

    let hashed_password = match bcrypt::hash(&password, bcrypt::DEFAULT_COST) {
        Ok(hash) => hash,
        Err(e) => {
            error!("password hashing failed: {}", e);
            return internal_error();
        }
    };

    let avatar = match image {
        Some((data, filename)) => match upload_avatar(&state.config, data, &filename).await {
            Some(url) => url,
            None => return internal_error(),
        },
        None => state.config.default_avatar_url.clone(),
    };

    let user = User {
        id: Uuid::new_v4().to_string(),
        name,
        email,
        password: hashed_password,
        avatar,
        created_at: chrono::Utc::now().to_rfc3339(),
    };

    if let Err(e) = sqlx::query(
        "INSERT INTO users (id, name, email, password, avatar, created_at) VALUES (?, ?, ?, ?, ?, ?)",
    )
    .bind(&user.id)
    .bind(&user.name)
    .bind(&user.email)
    .bind(&user.password)
    .bind(&user.avatar)
    .bind(&user.created_at)
    .execute(pool)
    .await
    {
        // a duplicate email trips the UNIQUE constraint and lands here
        error!("failed to create user: {}", e);
        return internal_error();
    }

    HttpResponse::Created().json(json!({
        "message": "User Created"
    }))
}

pub async fn login(data: web::Json<LoginRequest>, state: web::Data<AppState>) -> HttpResponse {
    let login_req = data.into_inner();
    let pool = &state.pool;

    let row = sqlx::query(
        "SELECT id, name, email, password, avatar, created_at FROM users WHERE email = ? LIMIT 1",
    )
    .bind(&login_req.email)
    .fetch_optional(pool)
    .await;

    let user = match row {
        Ok(Some(r)) => user_from_row(&r),
        Ok(None) => {
            return HttpResponse::BadRequest().json(json!({
                "message": "User not found"
            }))
        }
        Err(e) => {
            return HttpResponse::InternalServerError().json(json!({
                "message": e.to_string()
            }))
        }
    };

    let is_valid = match bcrypt::verify(&login_req.password, &user.password) {
        Ok(valid) => valid,
        Err(_) => false,
    };
    if !is_valid {
        return HttpResponse::BadRequest().json(json!({
            "message": "Wrong Password"
        }));
    }

    let token = match token::issue(&state.config.jwt_secret, &user) {
        Ok(token) => token,
        Err(e) => {
            error!("failed to sign token: {}", e);
            return internal_error();
        }
    };

    HttpResponse::Ok().json(json!({
        "message": "Auth Successful",
        "token": token
    }))
}

pub async fn details(req: HttpRequest, state: web::Data<AppState>) -> HttpResponse {
    let claims = match token::authenticate(&req, &state.config.jwt_secret) {
        Ok(claims) => claims,
        Err(resp) => return resp,
    };
    let pool = &state.pool;

    let row = sqlx::query(
        "SELECT id, name, email, password, avatar, created_at FROM users WHERE id = ? LIMIT 1",
    )
    .bind(&claims.user_id)
    .fetch_optional(pool)
    .await;

    match row {
        Ok(Some(r)) => HttpResponse::Ok().json(json!({
            "message": "User Details",
            "user": user_from_row(&r)
        })),
        Ok(None) => {
            error!("token subject {} has no user row", claims.user_id);
            internal_error()
        }
        Err(e) => HttpResponse::InternalServerError().json(json!({
            "message": e.to_string()
        })),
    }
}

pub async fn all_users(req: HttpRequest, state: web::Data<AppState>) -> HttpResponse {
    let claims = match token::authenticate(&req, &state.config.jwt_secret) {
        Ok(claims) => claims,
        Err(resp) => return resp,
    };
    let pool = &state.pool;

    let user_rows =
        sqlx::query("SELECT id, name, email, password, avatar, created_at FROM users")
            .fetch_all(pool)
            .await;
    let users: Vec<User> = match user_rows {
        Ok(rows) => rows.iter().map(user_from_row).collect(),
        Err(e) => {
            return HttpResponse::InternalServerError().json(json!({
                "message": e.to_string()
            }))
        }
    };

    // every participant row of every conversation the requester is in
    let participant_rows = sqlx::query(
        "SELECT conversation_id, user_id FROM conversation_participants \
         WHERE conversation_id IN \
         (SELECT conversation_id FROM conversation_participants WHERE user_id = ?)",
    )
    .bind(&claims.user_id)
    .fetch_all(pool)
    .await;

    let rows = match participant_rows {
        Ok(rows) => rows,
        Err(e) => {
            return HttpResponse::InternalServerError().json(json!({
                "message": e.to_string()
            }))
        }
    };

    let mut by_conversation: HashMap<String, Vec<String>> = HashMap::new();
    for row in rows {
        by_conversation
            .entry(row.get::<String, _>("conversation_id"))
            .or_default()
            .push(row.get::<String, _>("user_id"));
    }
    let conversations: Vec<Conversation> = by_conversation
        .into_iter()
        .map(|(id, participants)| Conversation { id, participants })
        .collect();

    let users = discover::discoverable_users(&claims.user_id, users, &conversations);

    HttpResponse::Ok().json(json!({
        "message": "All Users",
        "users": users
    }))
}

pub async fn picture(
    req: HttpRequest,
    mut payload: Multipart,
    state: web::Data<AppState>,
) -> HttpResponse {
    let claims = match token::authenticate(&req, &state.config.jwt_secret) {
        Ok(claims) => claims,
        Err(resp) => return resp,
    };
    let pool = &state.pool;

    let mut image: Option<(Vec<u8>, String)> = None;
    while let Ok(Some(mut field)) = payload.try_next().await {
        let is_image = field.name() == "image";
        let filename = if is_image {
            field
                .content_disposition()
                .get_filename()
                .unwrap_or("avatar.jpg")
                .to_string()
        } else {
            String::new()
        };

        let data = match read_field(&mut field).await {
            Ok(data) => data,
            Err(e) => {
                return HttpResponse::BadRequest().json(json!({
                    "message": format!("Invalid form data: {}", e)
                }))
            }
        };

        if is_image && !data.is_empty() {
            image = Some((data, filename));
        }
    }

    let (data, filename) = match image {
        Some(image) => image,
        None => {
            error!("picture update without an image file");
            return internal_error();
        }
    };

    let avatar = match upload_avatar(&state.config, data, &filename).await {
        Some(url) => url,
        None => return internal_error(),
    };

    if let Err(e) = sqlx::query("UPDATE users SET avatar = ? WHERE id = ?")
        .bind(&avatar)
        .bind(&claims.user_id)
        .execute(pool)
        .await
    {
        error!("failed to store avatar: {}", e);
        return internal_error();
    }

    HttpResponse::Ok().json(json!({
        "message": "Profile Picture Updated"
    }))
}

pub async fn update(
    req: HttpRequest,
    data: web::Json<UpdateProfileRequest>,
    state: web::Data<AppState>,
) -> HttpResponse {
    let claims = match token::authenticate(&req, &state.config.jwt_secret) {
        Ok(claims) => claims,
        Err(resp) => return resp,
    };
    let pool = &state.pool;
    let update_req = data.into_inner();

    // An absent or empty password only renames; the stored hash stays
    // untouched.
    let result = match update_req.password.as_deref() {
        None | Some("") => {
            sqlx::query("UPDATE users SET name = ? WHERE id = ?")
                .bind(&update_req.name)
                .bind(&claims.user_id)
                .execute(pool)
                .await
        }
        Some(password) => {
            let hashed_password = match bcrypt::hash(password, bcrypt::DEFAULT_COST) {
                Ok(hash) => hash,
                Err(e) => {
                    error!("password hashing failed: {}", e);
                    return internal_error();
                }
            };
            sqlx::query("UPDATE users SET name = ?, password = ? WHERE id = ?")
                .bind(&update_req.name)
                .bind(&hashed_password)
                .bind(&claims.user_id)
                .execute(pool)
                .await
        }
    };

    match result {
        Ok(_) => HttpResponse::Ok().json(json!({
            "message": "Profile Updated"
        })),
        Err(e) => HttpResponse::InternalServerError().json(json!({
            "message": e.to_string()
        })),
    }
}
