//! 课程实体

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "lessons")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub student_id: i64,
    pub tutor_id: Option<i64>,
    pub lesson_type: String,
    /// UTC 秒
    pub starts_at: i64,
    pub duration_minutes: i32,
    pub status: String,
    pub topic: Option<String>,
    #[sea_orm(column_type = "Text", nullable)]
    pub notes: Option<String>,
    #[sea_orm(column_type = "Text", nullable)]
    pub homework: Option<String>,
    pub created_at: i64,
    pub updated_at: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::students::Entity",
        from = "Column::StudentId",
        to = "super::students::Column::Id"
    )]
    Student,
}

impl Related<super::students::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Student.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    pub fn into_lesson(self) -> crate::models::lessons::entities::Lesson {
        use crate::models::lessons::entities::{Lesson, LessonStatus, LessonType};

        Lesson {
            id: self.id,
            student_id: self.student_id,
            tutor_id: self.tutor_id,
            lesson_type: self
                .lesson_type
                .parse::<LessonType>()
                .unwrap_or_default(),
            starts_at: super::from_ts(self.starts_at),
            duration_minutes: self.duration_minutes,
            status: self.status.parse::<LessonStatus>().unwrap_or_default(),
            topic: self.topic,
            notes: self.notes,
            homework: self.homework,
            created_at: super::from_ts(self.created_at),
            updated_at: super::from_ts(self.updated_at),
        }
    }
}
