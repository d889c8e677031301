//! 从另一环境拉取课程
//!
//! 同一时刻只允许一个任务；按 platform_id 匹配学生，本地已有同一开始时间与时长的课程则跳过。

use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use once_cell::sync::Lazy;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::RwLock;
use tracing::{error, info, warn};

use super::{ENVIRONMENTS, RemoteClient, remote_error};
use crate::errors::Result;
use crate::models::lessons::entities::{LessonStatus, LessonType, NewLesson};
use crate::models::remote_admin::{RemoteLesson, SyncLessonsRequest, SyncStatus};
use crate::models::{ApiResponse, ErrorCode};
use crate::services::audit;
use crate::storage::Storage;

static RUNNING: AtomicBool = AtomicBool::new(false);
static STATUS: Lazy<RwLock<SyncStatus>> = Lazy::new(|| RwLock::new(SyncStatus::default()));

/// 任务结束（包括 panic）时释放运行标记
struct RunningGuard;

impl Drop for RunningGuard {
    fn drop(&mut self) {
        RUNNING.store(false, Ordering::Release);
    }
}

pub async fn status() -> SyncStatus {
    let mut status = STATUS.read().await.clone();
    status.running = RUNNING.load(Ordering::Acquire);
    status
}

pub async fn start(
    storage: Arc<dyn Storage>,
    data: SyncLessonsRequest,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    let source = data.source.trim().to_string();
    if !ENVIRONMENTS.contains(&source.as_str()) {
        return Ok(HttpResponse::BadRequest().json(ApiResponse::error_empty(
            ErrorCode::ValidationFailed,
            format!("Unknown source environment: {source}"),
        )));
    }
    let client = match RemoteClient::for_environment(&source) {
        Ok(client) => client,
        Err(e) => return Ok(remote_error(e)),
    };

    if RUNNING
        .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
        .is_err()
    {
        return Ok(HttpResponse::Conflict().json(ApiResponse::error_empty(
            ErrorCode::SyncAlreadyRunning,
            "A lesson sync is already running",
        )));
    }
    let guard = RunningGuard;

    let initial = SyncStatus {
        running: true,
        source: Some(source.clone()),
        dry_run: data.dry_run,
        started_at: Some(chrono::Utc::now()),
        ..Default::default()
    };
    *STATUS.write().await = initial.clone();

    audit::record(
        audit::entry_for(request, "sync_lessons").metadata(serde_json::json!({
            "source": source,
            "dry_run": data.dry_run,
        })),
    );

    let dry_run = data.dry_run;
    tokio::spawn(async move {
        let _guard = guard;
        run(storage, client, dry_run).await;
    });

    Ok(HttpResponse::Accepted().json(ApiResponse::success(initial, "Lesson sync started")))
}

async fn run(storage: Arc<dyn Storage>, client: RemoteClient, dry_run: bool) {
    info!("Lesson sync from {} started (dry_run={})", client.display_name(), dry_run);

    let lessons = match client.get::<Vec<RemoteLesson>>("/api/lessons").await {
        Ok(lessons) => lessons,
        Err(e) => {
            error!("Lesson sync failed to fetch lessons: {}", e);
            finish(Some(e.to_string())).await;
            return;
        }
    };

    let result = import_lessons(&storage, &lessons, dry_run).await;
    let last_error = result.err().map(|e| {
        error!("Lesson sync aborted: {}", e);
        e.to_string()
    });
    finish(last_error).await;

    let status = STATUS.read().await;
    info!(
        "Lesson sync finished: processed {}, created {}, existing {}, unmatched {}",
        status.processed, status.created, status.skipped_existing, status.unmatched
    );
}

async fn finish(last_error: Option<String>) {
    let mut status = STATUS.write().await;
    status.running = false;
    status.finished_at = Some(chrono::Utc::now());
    status.last_error = last_error;
}

/// 逐条导入，进度写入全局状态
pub(crate) async fn import_lessons(
    storage: &Arc<dyn Storage>,
    lessons: &[RemoteLesson],
    dry_run: bool,
) -> Result<()> {
    for remote in lessons {
        let outcome = import_one(storage, remote, dry_run).await?;
        let mut status = STATUS.write().await;
        status.processed += 1;
        match outcome {
            Outcome::Created => status.created += 1,
            Outcome::Existing => status.skipped_existing += 1,
            Outcome::Unmatched => status.unmatched += 1,
        }
    }
    Ok(())
}

#[derive(Debug, PartialEq, Eq)]
enum Outcome {
    Created,
    Existing,
    Unmatched,
}

async fn import_one(
    storage: &Arc<dyn Storage>,
    remote: &RemoteLesson,
    dry_run: bool,
) -> Result<Outcome> {
    let Some(platform_id) = remote.platform_id.as_deref().filter(|p| !p.is_empty()) else {
        return Ok(Outcome::Unmatched);
    };
    let Some(student) = storage.get_student_by_platform_id(platform_id).await? else {
        warn!("No local student with platform_id {}", platform_id);
        return Ok(Outcome::Unmatched);
    };

    if storage
        .lesson_exists(student.id, remote.starts_at, remote.duration_minutes)
        .await?
    {
        return Ok(Outcome::Existing);
    }

    if !dry_run {
        storage
            .create_lesson(NewLesson {
                student_id: student.id,
                tutor_id: None,
                lesson_type: remote.lesson_type.parse().unwrap_or(LessonType::Regular),
                starts_at: remote.starts_at,
                duration_minutes: remote.duration_minutes,
                status: remote.status.parse().unwrap_or(LessonStatus::Planned),
                topic: remote.topic.clone(),
            })
            .await?;
    }
    Ok(Outcome::Created)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::students::requests::CreateStudentRequest;
    use crate::storage::sea_orm_storage::SeaOrmStorage;
    use chrono::{TimeZone, Utc};

    fn remote(id: i64, platform_id: Option<&str>) -> RemoteLesson {
        RemoteLesson {
            id,
            student_id: 100 + id,
            platform_id: platform_id.map(str::to_string),
            lesson_type: "exam".to_string(),
            starts_at: Utc.with_ymd_and_hms(2025, 3, 10, 12, 0, 0).unwrap(),
            duration_minutes: 60,
            status: "completed".to_string(),
            topic: Some("ОГЭ".to_string()),
        }
    }

    #[tokio::test]
    async fn test_import_one_outcomes() {
        let db = SeaOrmStorage::in_memory().await;
        db.create_student_impl(CreateStudentRequest {
            name: "Пётр".into(),
            platform_id: Some("321".into()),
            ..Default::default()
        })
        .await
        .unwrap();
        let storage: Arc<dyn Storage> = Arc::new(db);

        assert_eq!(
            import_one(&storage, &remote(1, None), false).await.unwrap(),
            Outcome::Unmatched
        );
        assert_eq!(
            import_one(&storage, &remote(2, Some("999")), false).await.unwrap(),
            Outcome::Unmatched
        );

        // dry run 不写库
        assert_eq!(
            import_one(&storage, &remote(3, Some("321")), true).await.unwrap(),
            Outcome::Created
        );
        assert_eq!(storage.count_lessons(None).await.unwrap(), 0);

        assert_eq!(
            import_one(&storage, &remote(3, Some("321")), false).await.unwrap(),
            Outcome::Created
        );
        assert_eq!(
            storage.count_lessons(Some(LessonStatus::Completed)).await.unwrap(),
            1
        );
        assert_eq!(
            import_one(&storage, &remote(3, Some("321")), false).await.unwrap(),
            Outcome::Existing
        );
    }

    #[test]
    fn test_guard_releases_flag() {
        RUNNING.store(true, Ordering::Release);
        drop(RunningGuard);
        assert!(!RUNNING.load(Ordering::Acquire));
    }
}
