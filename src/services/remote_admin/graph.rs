use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use super::RemoteAdminService;
use crate::errors::Result;
use crate::models::ApiResponse;
use crate::models::relations::{Enrollment, EnrollmentStatus, FamilyTie};
use crate::models::remote_admin::{
    EnrollmentEdge, FamilyTieEdge, UserGraph, UserGraphNode, UserGraphParams,
};
use crate::models::students::entities::Student;
use crate::models::users::entities::{User, UserRole};
use crate::services::internal_error;
use crate::storage::Storage;

const DEFAULT_ROLES: [UserRole; 3] = [UserRole::Tutor, UserRole::Student, UserRole::Parent];

/// 逗号分隔的角色；全部无效时回退到默认角色
fn parse_roles(raw: Option<&str>) -> Vec<UserRole> {
    let mut roles: Vec<UserRole> = raw
        .unwrap_or_default()
        .split(',')
        .filter_map(|r| r.trim().parse::<UserRole>().ok())
        .collect();
    roles.sort_unstable();
    roles.dedup();
    if roles.is_empty() {
        DEFAULT_ROLES.to_vec()
    } else {
        roles
    }
}

fn status_rank(status: EnrollmentStatus) -> u8 {
    match status {
        EnrollmentStatus::Active => 2,
        EnrollmentStatus::Paused => 1,
        EnrollmentStatus::Archived => 0,
    }
}

/// 同一对导师和学生只保留一条：状态优先，其次最近更新
fn best_per_pair(enrollments: Vec<Enrollment>) -> Vec<Enrollment> {
    let mut best: HashMap<(i64, i64), Enrollment> = HashMap::new();
    for e in enrollments {
        let key = (e.tutor_id, e.student_id);
        let better = best.get(&key).is_none_or(|cur| {
            (status_rank(e.status), e.updated_at) > (status_rank(cur.status), cur.updated_at)
        });
        if better {
            best.insert(key, e);
        }
    }
    let mut kept: Vec<Enrollment> = best.into_values().collect();
    kept.sort_unstable_by_key(|e| e.id);
    kept
}

/// 只保留两端都在节点集合内的边
pub(crate) fn build_graph(
    mut users: Vec<User>,
    students: &[Student],
    enrollments: Vec<Enrollment>,
    ties: Vec<FamilyTie>,
    all_enrollments: bool,
) -> UserGraph {
    users.sort_by(|a, b| a.username.cmp(&b.username));
    let node_ids: HashSet<i64> = users.iter().map(|u| u.id).collect();

    // 学生档案 → 学生账号
    let account_of: HashMap<i64, i64> = students
        .iter()
        .filter_map(|s| s.user_id.map(|uid| (s.id, uid)))
        .collect();
    let profile_of: HashMap<i64, i64> = account_of.iter().map(|(&sid, &uid)| (uid, sid)).collect();

    let linked = |from_id: i64, student_id: i64| {
        account_of
            .get(&student_id)
            .copied()
            .filter(|to_id| node_ids.contains(&from_id) && node_ids.contains(to_id))
    };

    let enrollments = if all_enrollments {
        enrollments
    } else {
        best_per_pair(enrollments)
    };

    let enrollment_edges = enrollments
        .into_iter()
        .filter_map(|e| {
            linked(e.tutor_id, e.student_id).map(|to_id| EnrollmentEdge {
                enrollment_id: e.id,
                from_id: e.tutor_id,
                to_id,
                student_id: e.student_id,
                subject: e.subject,
                status: e.status,
            })
        })
        .collect();

    let family_edges = ties
        .into_iter()
        .filter_map(|t| {
            linked(t.parent_id, t.student_id).map(|to_id| FamilyTieEdge {
                tie_id: t.id,
                from_id: t.parent_id,
                to_id,
                student_id: t.student_id,
                access_level: t.access_level,
                is_confirmed: t.is_confirmed,
            })
        })
        .collect();

    let nodes = users
        .into_iter()
        .map(|u| UserGraphNode {
            id: u.id,
            student_id: profile_of.get(&u.id).copied(),
            is_active: u.is_active(),
            username: u.username,
            email: u.email,
            role: u.role,
            display_name: u.display_name,
        })
        .collect();

    UserGraph {
        nodes,
        enrollments: enrollment_edges,
        family_ties: family_edges,
    }
}

pub(crate) async fn load_graph(
    storage: &Arc<dyn Storage>,
    params: &UserGraphParams,
) -> Result<UserGraph> {
    let roles = parse_roles(params.roles.as_deref());
    let include_inactive = params.include_inactive.unwrap_or(true);

    let users: Vec<User> = storage
        .list_users(None, (!include_inactive).then_some(true))
        .await?
        .into_iter()
        .filter(|u| roles.contains(&u.role))
        .collect();

    let enrollments = storage.list_enrollments(false).await?;
    let ties = storage.list_all_family_ties().await?;

    let mut student_ids: Vec<i64> = enrollments
        .iter()
        .map(|e| e.student_id)
        .chain(ties.iter().map(|t| t.student_id))
        .collect();
    student_ids.sort_unstable();
    student_ids.dedup();
    let students = storage.get_students_by_ids(&student_ids).await?;

    Ok(build_graph(
        users,
        &students,
        enrollments,
        ties,
        params.all_enrollments.unwrap_or(false),
    ))
}

pub async fn users_graph(
    service: &RemoteAdminService,
    params: UserGraphParams,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    let storage = service.get_storage(request)?;
    match load_graph(&storage, &params).await {
        Ok(graph) => Ok(HttpResponse::Ok().json(ApiResponse::success(
            graph,
            "User graph retrieved successfully",
        ))),
        Err(e) => Ok(internal_error("Failed to build user graph", e)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::relations::{CreateEnrollmentRequest, CreateFamilyTieRequest};
    use crate::models::students::requests::CreateStudentRequest;
    use crate::models::users::entities::UserStatus;
    use crate::models::users::requests::UpdateUserRequest;
    use crate::storage::sea_orm_storage::SeaOrmStorage;
    use crate::storage::sea_orm_storage::test_support::{seed_student, seed_user};

    #[test]
    fn test_parse_roles() {
        assert_eq!(parse_roles(None), DEFAULT_ROLES.to_vec());
        assert_eq!(parse_roles(Some(" , janitor")), DEFAULT_ROLES.to_vec());
        assert_eq!(
            parse_roles(Some("admin, tutor,admin")),
            vec![UserRole::Admin, UserRole::Tutor]
        );
    }

    #[tokio::test]
    async fn test_graph_nodes_and_edges() {
        let db = SeaOrmStorage::in_memory().await;
        let tutor = seed_user(&db, "tutor", UserRole::Tutor).await;
        let mom = seed_user(&db, "mom", UserRole::Parent).await;
        let kid = seed_user(&db, "kid", UserRole::Student).await;
        let admin = seed_user(&db, "boss", UserRole::Admin).await;
        let profile = db
            .create_student_impl(CreateStudentRequest {
                name: "Kid".to_string(),
                user_id: Some(kid.id),
                ..Default::default()
            })
            .await
            .unwrap();
        // 没有账号的学生档案不会出现在图里
        let orphan = seed_student(&db, "Orphan").await;

        let general = db
            .create_enrollment_impl(CreateEnrollmentRequest {
                student_id: profile.id,
                tutor_id: tutor.id,
                subject: None,
                status: Some(EnrollmentStatus::Paused),
            })
            .await
            .unwrap();
        let math = db
            .create_enrollment_impl(CreateEnrollmentRequest {
                student_id: profile.id,
                tutor_id: tutor.id,
                subject: Some("math".to_string()),
                status: None,
            })
            .await
            .unwrap();
        db.create_enrollment_impl(CreateEnrollmentRequest {
            student_id: orphan.id,
            tutor_id: tutor.id,
            subject: None,
            status: None,
        })
        .await
        .unwrap();
        let tie = db
            .create_family_tie_impl(CreateFamilyTieRequest {
                parent_id: mom.id,
                student_id: profile.id,
                access_level: None,
                is_confirmed: Some(true),
            })
            .await
            .unwrap();
        db.update_user_impl(
            mom.id,
            UpdateUserRequest {
                status: Some(UserStatus::Inactive),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        let storage: Arc<dyn Storage> = Arc::new(db);

        let graph = load_graph(&storage, &UserGraphParams::default())
            .await
            .unwrap();
        let names: Vec<&str> = graph.nodes.iter().map(|n| n.username.as_str()).collect();
        assert_eq!(names, vec!["kid", "mom", "tutor"]);
        assert!(graph.nodes.iter().all(|n| n.id != admin.id));
        let kid_node = graph.nodes.iter().find(|n| n.id == kid.id).unwrap();
        assert_eq!(kid_node.student_id, Some(profile.id));

        // 默认每对导师和学生只留状态最好的一条
        assert_eq!(graph.enrollments.len(), 1);
        assert_eq!(graph.enrollments[0].enrollment_id, math.id);
        assert_eq!(graph.enrollments[0].from_id, tutor.id);
        assert_eq!(graph.enrollments[0].to_id, kid.id);

        assert_eq!(graph.family_ties.len(), 1);
        assert_eq!(graph.family_ties[0].tie_id, tie.id);
        assert_eq!(graph.family_ties[0].to_id, kid.id);

        let params = UserGraphParams {
            all_enrollments: Some(true),
            include_inactive: Some(false),
            ..Default::default()
        };
        let graph = load_graph(&storage, &params).await.unwrap();
        let mut ids: Vec<i64> = graph.enrollments.iter().map(|e| e.enrollment_id).collect();
        ids.sort_unstable();
        assert_eq!(ids, vec![general.id, math.id]);
        // 停用的家长不在节点里，关系边一并去掉
        assert!(graph.nodes.iter().all(|n| n.id != mom.id));
        assert!(graph.family_ties.is_empty());
    }
}
