use crate::{
    error::{AppError, AppResult},
    middleware::AuthUser,
    models::{
        report, Comment, ContentType, ForumReply, ForumThread, Post, Report, ReportModel,
        ReportStatus,
    },
};
use chrono::NaiveDateTime;
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, DatabaseConnection, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder,
};

const MAX_REASON_LEN: usize = 100;

pub struct ReportService {
    db: DatabaseConnection,
}

impl ReportService {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    pub async fn create_report(
        &self,
        actor: &AuthUser,
        content_type: ContentType,
        content_id: i32,
        reason: &str,
        description: Option<String>,
        now: NaiveDateTime,
    ) -> AppResult<ReportModel> {
        let reason = reason.trim();
        if reason.is_empty() {
            return Err(AppError::validation("A reason is required"));
        }
        if reason.chars().count() > MAX_REASON_LEN {
            return Err(AppError::validation(format!(
                "Reason must be at most {MAX_REASON_LEN} characters"
            )));
        }

        if !self.target_exists(content_type, content_id).await? {
            return Err(AppError::validation("Reported content not found"));
        }

        let saved = report::ActiveModel {
            reporter_id: Set(actor.user_id),
            content_type: Set(content_type),
            content_id: Set(content_id),
            reason: Set(reason.to_string()),
            description: Set(description.filter(|d| !d.trim().is_empty())),
            status: Set(ReportStatus::Pending),
            reviewed_by: Set(None),
            reviewed_at: Set(None),
            resolution_note: Set(None),
            created_at: Set(now),
            ..Default::default()
        }
        .insert(&self.db)
        .await?;
        Ok(saved)
    }

    async fn target_exists(&self, content_type: ContentType, id: i32) -> AppResult<bool> {
        let found = match content_type {
            ContentType::Post => Post::find_by_id(id).one(&self.db).await?.is_some(),
            ContentType::Comment => Comment::find_by_id(id).one(&self.db).await?.is_some(),
            ContentType::Thread => ForumThread::find_by_id(id).one(&self.db).await?.is_some(),
            ContentType::Reply => ForumReply::find_by_id(id).one(&self.db).await?.is_some(),
        };
        Ok(found)
    }

    /// Moderation queue: pending reports, oldest first.
    pub async fn list_pending(&self, actor: &AuthUser) -> AppResult<Vec<ReportModel>> {
        actor.require_staff()?;
        let reports = Report::find()
            .filter(report::Column::Status.eq(ReportStatus::Pending))
            .order_by_asc(report::Column::CreatedAt)
            .order_by_asc(report::Column::Id)
            .all(&self.db)
            .await?;
        Ok(reports)
    }

    pub async fn list_reports(
        &self,
        actor: &AuthUser,
        status: Option<ReportStatus>,
        page: u64,
        per_page: u64,
    ) -> AppResult<(Vec<ReportModel>, u64)> {
        actor.require_admin()?;
        let mut query = Report::find();

        if let Some(s) = status {
            query = query.filter(report::Column::Status.eq(s));
        }

        let paginator = query
            .order_by_desc(report::Column::CreatedAt)
            .order_by_desc(report::Column::Id)
            .paginate(&self.db, per_page);

        let total = paginator.num_items().await?;
        let reports = paginator.fetch_page(page.saturating_sub(1)).await?;
        Ok((reports, total))
    }

    pub async fn update_status(
        &self,
        actor: &AuthUser,
        report_id: i32,
        status: ReportStatus,
        note: Option<String>,
        now: NaiveDateTime,
    ) -> AppResult<ReportModel> {
        actor.require_staff()?;
        if status == ReportStatus::Pending {
            return Err(AppError::validation(
                "status must be 'reviewed' or 'resolved'",
            ));
        }

        let existing = Report::find_by_id(report_id)
            .one(&self.db)
            .await?
            .ok_or(AppError::NotFound)?;

        let note = note
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty());

        let mut active: report::ActiveModel = existing.into();
        active.status = Set(status);
        active.reviewed_by = Set(Some(actor.user_id));
        active.reviewed_at = Set(Some(now));
        if note.is_some() {
            active.resolution_note = Set(note);
        }

        let updated = active.update(&self.db).await?;
        tracing::info!(report_id, by = actor.user_id, status = ?status, "report status changed");
        Ok(updated)
    }

    /// Close a report. A resolution note is mandatory.
    pub async fn resolve(
        &self,
        actor: &AuthUser,
        report_id: i32,
        note: &str,
        now: NaiveDateTime,
    ) -> AppResult<ReportModel> {
        let note = note.trim();
        if note.is_empty() {
            return Err(AppError::validation("A resolution note is required"));
        }
        self.update_status(
            actor,
            report_id,
            ReportStatus::Resolved,
            Some(note.to_string()),
            now,
        )
        .await
    }
}
