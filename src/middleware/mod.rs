pub mod auth;
pub mod gate;
pub mod security;

pub use auth::AuthUser;
