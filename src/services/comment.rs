use crate::{
    error::{AppError, AppResult},
    middleware::AuthUser,
    models::{comment, Comment, CommentModel, Complaint, ComplaintModel},
};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder,
};

pub struct CommentService {
    db: DatabaseConnection,
}

/// A company may only speak on complaints filed against itself.
pub fn may_comment(author: &AuthUser, complaint: &ComplaintModel) -> bool {
    !author.role.is_company() || author.name == complaint.company
}

impl CommentService {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Pinned comments first, then oldest first.
    pub async fn list_by_complaint(&self, complaint_id: i32) -> AppResult<Vec<CommentModel>> {
        let comments = Comment::find()
            .filter(comment::Column::ComplaintId.eq(complaint_id))
            .order_by_desc(comment::Column::Pinned)
            .order_by_asc(comment::Column::CreatedAt)
            .order_by_asc(comment::Column::Id)
            .all(&self.db)
            .await?;
        Ok(comments)
    }

    /// Comments by company accounts are pinned.
    pub async fn create(
        &self,
        author: &AuthUser,
        complaint_id: i32,
        content: &str,
        anonymous: bool,
    ) -> AppResult<CommentModel> {
        let complaint = Complaint::find_by_id(complaint_id)
            .one(&self.db)
            .await?
            .ok_or(AppError::NotFound)?;

        if !may_comment(author, &complaint) {
            tracing::warn!(
                complaint_id,
                user_id = author.user_id,
                "company comment on another company's complaint rejected"
            );
            return Err(AppError::Forbidden);
        }

        let content = content.trim();
        if content.is_empty() {
            return Err(AppError::Validation("Comment text is required".to_string()));
        }

        let now = chrono::Utc::now().naive_utc();
        let new_comment = comment::ActiveModel {
            complaint_id: sea_orm::ActiveValue::Set(complaint_id),
            user_id: sea_orm::ActiveValue::Set(author.user_id),
            content: sea_orm::ActiveValue::Set(content.to_string()),
            author_role: sea_orm::ActiveValue::Set(author.role),
            pinned: sea_orm::ActiveValue::Set(author.role.is_company()),
            anonymous: sea_orm::ActiveValue::Set(anonymous),
            created_at: sea_orm::ActiveValue::Set(now),
            ..Default::default()
        };

        let comment = new_comment.insert(&self.db).await?;
        tracing::info!(
            complaint_id,
            comment_id = comment.id,
            pinned = comment.pinned,
            "comment added"
        );
        Ok(comment)
    }
}
