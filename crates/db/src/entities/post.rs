//! Post entity.
//!
//! A post is either an original post, a reply (`parent_id` set) or a repost
//! (`is_repost` with `original_post_id`). The two self references carry
//! different delete policies: replies cascade with their parent, reposts are
//! detached (`original_post_id` becomes NULL) when their original goes away.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Maximum post length, in characters.
pub const MAX_CONTENT_CHARS: u64 = 280;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "post")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    /// Author user ID
    #[sea_orm(indexed)]
    pub user_id: String,

    #[sea_orm(column_type = "Text")]
    pub content: String,

    /// Opaque reference to attached media in external storage
    #[sea_orm(nullable)]
    pub media_ref: Option<String>,

    /// Reply target post ID
    #[sea_orm(nullable, indexed)]
    pub parent_id: Option<String>,

    #[sea_orm(default_value = false)]
    pub is_repost: bool,

    /// Reposted post ID (only for reposts; NULL once the original is deleted)
    #[sea_orm(nullable, indexed)]
    pub original_post_id: Option<String>,

    pub created_at: DateTimeWithTimeZone,

    pub updated_at: DateTimeWithTimeZone,
}

impl Model {
    /// A repost whose original has been deleted.
    #[must_use]
    pub const fn is_orphaned_repost(&self) -> bool {
        self.is_repost && self.original_post_id.is_none()
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::UserId",
        to = "super::user::Column::Id",
        on_delete = "Cascade"
    )]
    User,

    #[sea_orm(
        belongs_to = "Entity",
        from = "Column::ParentId",
        to = "Column::Id",
        on_delete = "Cascade"
    )]
    Parent,

    #[sea_orm(
        belongs_to = "Entity",
        from = "Column::OriginalPostId",
        to = "Column::Id",
        on_delete = "SetNull"
    )]
    OriginalPost,

    #[sea_orm(has_many = "super::comment::Entity")]
    Comments,

    #[sea_orm(has_many = "super::post_like::Entity")]
    Likes,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl Related<super::comment::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Comments.def()
    }
}

impl Related<super::post_like::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Likes.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
