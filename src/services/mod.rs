pub mod admin;
pub mod auth;
pub mod bookmark;
pub mod bootstrap_admin;
pub mod category;
pub mod comment;
pub mod email;
pub mod forum;
pub mod like;
pub mod post;
pub mod report;
pub mod upload;
pub mod user;
pub mod workflow;
