use std::env;

#[derive(Clone)]
pub struct Config {
    pub port: u16,
    pub database_url: String,
    pub jwt_secret: String,
    pub default_avatar_url: String,
    pub image_upload_url: Option<String>,
    pub image_upload_preset: Option<String>,
}

impl Config {
    /// Reads configuration from the environment. JWT_SECRET is required;
    /// everything else has a workable default.
    pub fn from_env() -> Result<Self, Box<dyn std::error::Error>> {
        let port = env::var("PORT")
            .unwrap_or_else(|_| "8080".to_string())
            .parse::<u16>()
            .unwrap_or(8080);
        let database_url =
            env::var("DATABASE_URL").unwrap_or_else(|_| "sqlite://app.db".to_string());
        let jwt_secret = env::var("JWT_SECRET").map_err(|_| "JWT_SECRET must be set")?;
        let default_avatar_url = env::var("DEFAULT_AVATAR_URL")
            .unwrap_or_else(|_| "https://ui-avatars.com/api/?name=User".to_string());
        // only required once an avatar is actually uploaded
        let image_upload_url = env::var("IMAGE_UPLOAD_URL").ok();
        let image_upload_preset = env::var("IMAGE_UPLOAD_PRESET").ok();

        Ok(Config {
            port,
            database_url,
            jwt_secret,
            default_avatar_url,
            image_upload_url,
            image_upload_preset,
        })
    }
}
