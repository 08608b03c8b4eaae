use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Stored as +1 / -1 and exchanged as the same integers over JSON.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "i16", try_from = "i16")]
pub enum VoteType {
    Up,
    Down,
}

impl From<VoteType> for i16 {
    fn from(vote: VoteType) -> Self {
        match vote {
            VoteType::Up => 1,
            VoteType::Down => -1,
        }
    }
}

impl TryFrom<i16> for VoteType {
    type Error = String;

    fn try_from(value: i16) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(VoteType::Up),
            -1 => Ok(VoteType::Down),
            other => Err(format!("vote_type must be 1 or -1, got {other}")),
        }
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "forum_reply_votes")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub reply_id: i32,
    pub user_id: i32,
    pub vote_type: i16,
    pub created_at: DateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    pub fn vote(&self) -> Option<VoteType> {
        VoteType::try_from(self.vote_type).ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vote_type_json_is_signed_integer() {
        assert_eq!(serde_json::to_string(&VoteType::Down).unwrap(), "-1");
        let up: VoteType = serde_json::from_str("1").unwrap();
        assert_eq!(up, VoteType::Up);
        assert!(serde_json::from_str::<VoteType>("0").is_err());
    }
}
