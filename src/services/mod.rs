pub mod discover;
pub mod image_host;
pub mod token;
