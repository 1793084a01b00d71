//! User profile entity (public profile fields and the password hash).

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "user_profile")]
pub struct Model {
    /// Same as user.id (1:1 relationship)
    #[sea_orm(primary_key, auto_increment = false)]
    pub user_id: String,

    /// Password hash (Argon2 PHC string)
    #[sea_orm(nullable)]
    #[serde(skip_serializing)]
    pub password: Option<String>,

    #[sea_orm(column_type = "Text")]
    pub bio: String,

    pub location: String,

    pub website: String,

    /// Birth date (YYYY-MM-DD)
    #[sea_orm(nullable)]
    pub birth_date: Option<Date>,

    /// Opaque reference to the avatar image in external storage
    #[sea_orm(nullable)]
    pub avatar_ref: Option<String>,

    #[sea_orm(nullable)]
    pub updated_at: Option<DateTimeWithTimeZone>,
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
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
