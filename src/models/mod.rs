pub mod conversation;
pub mod user;

pub use conversation::Conversation;
pub use user::{LoginRequest, UpdateProfileRequest, User};
