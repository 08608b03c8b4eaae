pub mod admin;
pub mod auth;
pub mod bookmark;
pub mod category;
pub mod comment;
pub mod forum;
pub mod health;
pub mod like;
pub mod post;
pub mod report;
pub mod upload;
pub mod user;

use chrono::NaiveDateTime;

/// Wall-clock time as stored in the database (UTC, no offset).
pub(crate) fn now() -> NaiveDateTime {
    chrono::Utc::now().naive_utc()
}
