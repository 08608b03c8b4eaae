pub mod bookmark;
pub mod category;
pub mod category_request;
pub mod comment;
pub mod forum_category;
pub mod forum_reply;
pub mod forum_reply_vote;
pub mod forum_thread;
pub mod like;
pub mod post;
pub mod refresh_token;
pub mod report;
pub mod user;

pub use bookmark::Entity as Bookmark;
pub use category::{Entity as Category, Model as CategoryModel};
pub use category_request::{Entity as CategoryRequest, Model as CategoryRequestModel};
pub use comment::{Entity as Comment, Model as CommentModel};
pub use forum_category::{Entity as ForumCategory, Model as ForumCategoryModel};
pub use forum_reply::{Entity as ForumReply, Model as ForumReplyModel};
pub use forum_reply_vote::{Entity as ForumReplyVote, VoteType};
pub use forum_thread::{Entity as ForumThread, Model as ForumThreadModel};
pub use like::Entity as Like;
pub use post::{Entity as Post, Model as PostModel, PostStatus};
pub use refresh_token::Entity as RefreshToken;
pub use report::{ContentType, Entity as Report, Model as ReportModel, ReportStatus};
pub use user::{Entity as User, Model as UserModel, Role};
