//! 家长-学生关系实体

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "family_ties")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub parent_id: i64,
    pub student_id: i64,
    pub access_level: String,
    pub is_confirmed: bool,
    pub created_at: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::users::Entity",
        from = "Column::ParentId",
        to = "super::users::Column::Id"
    )]
    Parent,
    #[sea_orm(
        belongs_to = "super::students::Entity",
        from = "Column::StudentId",
        to = "super::students::Column::Id"
    )]
    Student,
}

impl Related<super::users::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Parent.def()
    }
}

impl Related<super::students::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Student.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    pub fn into_family_tie(self) -> crate::models::relations::FamilyTie {
        use crate::models::relations::{AccessLevel, FamilyTie};

        FamilyTie {
            id: self.id,
            parent_id: self.parent_id,
            student_id: self.student_id,
            access_level: self
                .access_level
                .parse::<AccessLevel>()
                .unwrap_or(AccessLevel::ScheduleOnly),
            is_confirmed: self.is_confirmed,
            created_at: super::from_ts(self.created_at),
        }
    }
}
