//! 学生与导师、家长之间的关系

use serde::{Deserialize, Serialize};

/// 默认科目
pub const GENERAL_SUBJECT: &str = "GENERAL";

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum EnrollmentStatus {
    #[default]
    Active,
    Paused,
    Archived,
}

impl EnrollmentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            EnrollmentStatus::Active => "active",
            EnrollmentStatus::Paused => "paused",
            EnrollmentStatus::Archived => "archived",
        }
    }
}

impl std::str::FromStr for EnrollmentStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(EnrollmentStatus::Active),
            "paused" => Ok(EnrollmentStatus::Paused),
            "archived" => Ok(EnrollmentStatus::Archived),
            _ => Err(format!("Invalid enrollment status: {s}")),
        }
    }
}

/// 学生-导师-科目
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Enrollment {
    pub id: i64,
    pub student_id: i64,
    pub tutor_id: i64,
    pub subject: String,
    pub status: EnrollmentStatus,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum AccessLevel {
    #[default]
    Full,
    ScheduleOnly,
}

impl AccessLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            AccessLevel::Full => "full",
            AccessLevel::ScheduleOnly => "schedule_only",
        }
    }
}

impl std::str::FromStr for AccessLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "full" => Ok(AccessLevel::Full),
            "schedule_only" => Ok(AccessLevel::ScheduleOnly),
            _ => Err(format!("Invalid access level: {s}")),
        }
    }
}

/// 家长-学生
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FamilyTie {
    pub id: i64,
    pub parent_id: i64,
    pub student_id: i64,
    pub access_level: AccessLevel,
    pub is_confirmed: bool,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateEnrollmentRequest {
    pub student_id: i64,
    pub tutor_id: i64,
    pub subject: Option<String>,
    pub status: Option<EnrollmentStatus>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateEnrollmentRequest {
    pub tutor_id: Option<i64>,
    pub subject: Option<String>,
    pub status: Option<EnrollmentStatus>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateFamilyTieRequest {
    pub parent_id: i64,
    pub student_id: i64,
    pub access_level: Option<AccessLevel>,
    pub is_confirmed: Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateFamilyTieRequest {
    pub access_level: Option<AccessLevel>,
    pub is_confirmed: Option<bool>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_round_trip_strings() {
        for status in [
            EnrollmentStatus::Active,
            EnrollmentStatus::Paused,
            EnrollmentStatus::Archived,
        ] {
            assert_eq!(status.as_str().parse::<EnrollmentStatus>().unwrap(), status);
        }
        assert!("deleted".parse::<EnrollmentStatus>().is_err());
    }

    #[test]
    fn test_access_level_serde() {
        let level: AccessLevel = serde_json::from_str("\"schedule_only\"").unwrap();
        assert_eq!(level, AccessLevel::ScheduleOnly);
        assert_eq!(AccessLevel::default(), AccessLevel::Full);
    }
}
