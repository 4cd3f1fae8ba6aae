use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// A resume row. The `file_path`/`file_type`/`file_size` triple is written
/// in a single update and is either fully present or fully absent.
/// `ats_report` holds the cached ATS analysis JSON that backs `ats_score`.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "resumes")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    #[sea_orm(indexed)]
    pub user_id: String,
    pub title: String,
    pub file_path: Option<String>,
    pub file_type: Option<String>,
    pub file_size: Option<i64>,
    pub extracted_data_path: Option<String>,
    pub ats_score: i32,
    pub thumbnail_color: String,
    #[sea_orm(column_type = "Text", nullable)]
    pub ats_report: Option<String>,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::users::Entity",
        from = "Column::UserId",
        to = "super::users::Column::Id",
        on_delete = "Cascade"
    )]
    Users,
}

impl Related<super::users::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Users.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
