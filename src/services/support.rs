use crate::{
    error::{AppError, AppResult},
    middleware::AuthUser,
    models::{complaint, support, Complaint, Support},
    utils::locks::KeyedLocks,
};
use sea_orm::{
    sea_query::Expr, ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection,
    EntityTrait, PaginatorTrait, QueryFilter, SqlErr, TransactionTrait,
};
use serde::Serialize;
use utoipa::ToSchema;

/// One lock per (user_id, complaint_id), shared by every request.
pub type SupportLocks = KeyedLocks<(i32, i32)>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
pub struct SupportToggle {
    /// False when the caller may not support complaints and nothing changed.
    pub applied: bool,
    /// Whether the caller supports the complaint after the call.
    pub supported: bool,
    /// Support counter after the call.
    pub supports: i32,
}

pub struct SupportService {
    db: DatabaseConnection,
    locks: SupportLocks,
}

impl SupportService {
    pub fn new(db: DatabaseConnection, locks: SupportLocks) -> Self {
        Self { db, locks }
    }

    /// Flip the caller's support for a complaint.
    ///
    /// Company accounts get a no-op. Otherwise a missing Support record is
    /// created and the counter goes up by one, or the existing record is
    /// removed and the counter goes down by one without dropping below zero.
    pub async fn toggle(&self, user: &AuthUser, complaint_id: i32) -> AppResult<SupportToggle> {
        let complaint = Complaint::find_by_id(complaint_id)
            .one(&self.db)
            .await?
            .ok_or(AppError::NotFound)?;

        if user.role.is_company() {
            tracing::debug!(
                complaint_id,
                user_id = user.user_id,
                "support toggle by company account ignored"
            );
            let supported = self.is_supporting(user.user_id, complaint_id).await?;
            return Ok(SupportToggle {
                applied: false,
                supported,
                supports: complaint.supports,
            });
        }

        let _guard = self.locks.lock((user.user_id, complaint_id)).await;
        let txn = self.db.begin().await?;

        // The first statement writes, so SQLite takes the write lock up front
        // instead of upgrading a read lock held by this transaction.
        let removed = Support::delete_many()
            .filter(support::Column::UserId.eq(user.user_id))
            .filter(support::Column::ComplaintId.eq(complaint_id))
            .exec(&txn)
            .await?;

        let supported = if removed.rows_affected > 0 {
            decrement_supports(&txn, complaint_id).await?;
            false
        } else {
            let now = chrono::Utc::now().naive_utc();
            let record = support::ActiveModel {
                user_id: sea_orm::ActiveValue::Set(user.user_id),
                complaint_id: sea_orm::ActiveValue::Set(complaint_id),
                created_at: sea_orm::ActiveValue::Set(now),
                ..Default::default()
            };
            record.insert(&txn).await.map_err(|e| match e.sql_err() {
                Some(SqlErr::UniqueConstraintViolation(_)) => {
                    AppError::Conflict("Support already recorded".to_string())
                }
                _ => AppError::Database(e),
            })?;
            increment_supports(&txn, complaint_id).await?;
            true
        };

        let supports = Complaint::find_by_id(complaint_id)
            .one(&txn)
            .await?
            .ok_or(AppError::NotFound)?
            .supports;
        let records = Support::find()
            .filter(support::Column::ComplaintId.eq(complaint_id))
            .count(&txn)
            .await?;
        txn.commit().await?;

        if records != supports as u64 {
            tracing::warn!(
                complaint_id,
                counter = supports,
                records,
                "support counter drifted from support records"
            );
        }

        tracing::info!(
            complaint_id,
            user_id = user.user_id,
            supported,
            supports,
            "support toggled"
        );

        Ok(SupportToggle {
            applied: true,
            supported,
            supports,
        })
    }

    pub async fn is_supporting(&self, user_id: i32, complaint_id: i32) -> AppResult<bool> {
        let count = Support::find()
            .filter(support::Column::UserId.eq(user_id))
            .filter(support::Column::ComplaintId.eq(complaint_id))
            .count(&self.db)
            .await?;
        Ok(count > 0)
    }
}

async fn increment_supports<C: ConnectionTrait>(conn: &C, complaint_id: i32) -> AppResult<()> {
    Complaint::update_many()
        .col_expr(
            complaint::Column::Supports,
            Expr::col(complaint::Column::Supports).add(1),
        )
        .filter(complaint::Column::Id.eq(complaint_id))
        .exec(conn)
        .await?;
    Ok(())
}

/// Floors at zero. Hitting the floor means the counter and the Support
/// records were already out of sync.
async fn decrement_supports<C: ConnectionTrait>(conn: &C, complaint_id: i32) -> AppResult<()> {
    let result = Complaint::update_many()
        .col_expr(
            complaint::Column::Supports,
            Expr::col(complaint::Column::Supports).sub(1),
        )
        .filter(complaint::Column::Id.eq(complaint_id))
        .filter(complaint::Column::Supports.gt(0))
        .exec(conn)
        .await?;

    if result.rows_affected == 0 {
        tracing::warn!(
            complaint_id,
            "support counter already at zero while removing a support record"
        );
    }
    Ok(())
}
