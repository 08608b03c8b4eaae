pub mod cookie;
pub mod jwt;
pub mod markdown;
pub mod password;
pub mod text;

pub use jwt::{encode_access_token, encode_refresh_token};
pub use markdown::{render_markdown, sanitize_html};
pub use password::{hash_password, verify_password};
pub use text::{excerpt, reading_time, slugify};
