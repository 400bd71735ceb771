use crate::{
    error::{AppError, AppResult},
    middleware::AuthUser,
    models::{
        comment, complaint, support, Comment, Complaint, ComplaintModel, Support, UNKNOWN_COMPANY,
    },
    utils::normalize_city,
};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder,
    TransactionTrait,
};

/// Trimmed complaint fields as submitted by the owner.
#[derive(Debug, Clone, Default)]
pub struct ComplaintInput {
    pub title: String,
    pub description: String,
    pub kind: String,
    pub company: Option<String>,
    pub work_area: Option<String>,
    pub city: Option<String>,
    pub anonymous: bool,
}

/// Values written to the store for a create or an edit.
#[derive(Debug, Clone, PartialEq, Eq)]
struct ComplaintFields {
    title: String,
    description: String,
    kind: String,
    company: String,
    work_area: Option<String>,
    city: String,
    anonymous: bool,
}

impl ComplaintInput {
    /// Apply the defaults shared by create and edit: missing company becomes
    /// the "not informed" label, missing work area falls back to the owner's
    /// area, the city is title-cased.
    fn resolve(self, owner_area: Option<&str>) -> AppResult<ComplaintFields> {
        let title = self.title.trim().to_string();
        let description = self.description.trim().to_string();
        if title.is_empty() || description.is_empty() {
            return Err(AppError::Validation(
                "Title and description are required".to_string(),
            ));
        }

        let company = non_empty(self.company).unwrap_or_else(|| UNKNOWN_COMPANY.to_string());
        let work_area = non_empty(self.work_area).or_else(|| owner_area.map(str::to_string));
        let city = normalize_city(self.city.as_deref().unwrap_or_default());

        Ok(ComplaintFields {
            title,
            description,
            kind: self.kind.trim().to_string(),
            company,
            work_area,
            city,
            anonymous: self.anonymous,
        })
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

pub struct ComplaintService {
    db: DatabaseConnection,
}

impl ComplaintService {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    pub async fn create(
        &self,
        owner: &AuthUser,
        input: ComplaintInput,
    ) -> AppResult<ComplaintModel> {
        if owner.role.is_company() {
            return Err(AppError::Forbidden);
        }

        let fields = input.resolve(owner.area.as_deref())?;
        let now = chrono::Utc::now().naive_utc();

        let model = complaint::ActiveModel {
            user_id: sea_orm::ActiveValue::Set(owner.user_id),
            title: sea_orm::ActiveValue::Set(fields.title),
            description: sea_orm::ActiveValue::Set(fields.description),
            kind: sea_orm::ActiveValue::Set(fields.kind),
            company: sea_orm::ActiveValue::Set(fields.company),
            work_area: sea_orm::ActiveValue::Set(fields.work_area),
            city: sea_orm::ActiveValue::Set(fields.city),
            user_area: sea_orm::ActiveValue::Set(owner.area.clone()),
            anonymous: sea_orm::ActiveValue::Set(fields.anonymous),
            supports: sea_orm::ActiveValue::Set(0),
            created_at: sea_orm::ActiveValue::Set(now),
            updated_at: sea_orm::ActiveValue::Set(now),
            ..Default::default()
        };

        let saved = model.insert(&self.db).await?;
        tracing::info!(
            complaint_id = saved.id,
            user_id = owner.user_id,
            company = %saved.company,
            "complaint filed"
        );
        Ok(saved)
    }

    pub async fn get_by_id(&self, id: i32) -> AppResult<ComplaintModel> {
        Complaint::find_by_id(id)
            .one(&self.db)
            .await?
            .ok_or(AppError::NotFound)
    }

    /// Owner-only edit. The support counter and area snapshot are untouched.
    pub async fn update(
        &self,
        editor: &AuthUser,
        id: i32,
        input: ComplaintInput,
    ) -> AppResult<ComplaintModel> {
        let existing = self.get_by_id(id).await?;
        if existing.user_id != editor.user_id {
            tracing::warn!(
                complaint_id = id,
                user_id = editor.user_id,
                "edit by non-owner rejected"
            );
            return Err(AppError::Forbidden);
        }

        let fields = input.resolve(editor.area.as_deref())?;
        let now = chrono::Utc::now().naive_utc();

        let mut active: complaint::ActiveModel = existing.into();
        active.title = sea_orm::ActiveValue::Set(fields.title);
        active.description = sea_orm::ActiveValue::Set(fields.description);
        active.kind = sea_orm::ActiveValue::Set(fields.kind);
        active.company = sea_orm::ActiveValue::Set(fields.company);
        active.work_area = sea_orm::ActiveValue::Set(fields.work_area);
        active.city = sea_orm::ActiveValue::Set(fields.city);
        active.anonymous = sea_orm::ActiveValue::Set(fields.anonymous);
        active.updated_at = sea_orm::ActiveValue::Set(now);

        let updated = active.update(&self.db).await?;
        tracing::info!(complaint_id = id, "complaint edited");
        Ok(updated)
    }

    /// Owner-only delete. Supports and comments go in the same transaction.
    pub async fn delete(&self, owner: &AuthUser, id: i32) -> AppResult<()> {
        let existing = self.get_by_id(id).await?;
        if existing.user_id != owner.user_id {
            tracing::warn!(
                complaint_id = id,
                user_id = owner.user_id,
                "delete by non-owner rejected"
            );
            return Err(AppError::Forbidden);
        }

        let txn = self.db.begin().await?;
        let supports = Support::delete_many()
            .filter(support::Column::ComplaintId.eq(id))
            .exec(&txn)
            .await?;
        let comments = Comment::delete_many()
            .filter(comment::Column::ComplaintId.eq(id))
            .exec(&txn)
            .await?;
        Complaint::delete_by_id(id).exec(&txn).await?;
        txn.commit().await?;

        tracing::info!(
            complaint_id = id,
            supports_removed = supports.rows_affected,
            comments_removed = comments.rows_affected,
            "complaint deleted"
        );
        Ok(())
    }

    pub async fn list_all(&self) -> AppResult<Vec<ComplaintModel>> {
        self.list_where(None).await
    }

    /// Exact, case-sensitive match on the owner's area snapshot.
    pub async fn list_by_area(&self, area: &str) -> AppResult<Vec<ComplaintModel>> {
        self.list_where(Some(complaint::Column::UserArea.eq(area)))
            .await
    }

    /// `city` is normalized the same way stored cities are.
    pub async fn list_by_city(&self, city: &str) -> AppResult<Vec<ComplaintModel>> {
        self.list_where(Some(complaint::Column::City.eq(normalize_city(city))))
            .await
    }

    pub async fn list_by_owner(&self, user_id: i32) -> AppResult<Vec<ComplaintModel>> {
        self.list_where(Some(complaint::Column::UserId.eq(user_id)))
            .await
    }

    pub async fn list_by_company(&self, company: &str) -> AppResult<Vec<ComplaintModel>> {
        self.list_where(Some(complaint::Column::Company.eq(company)))
            .await
    }

    async fn list_where(
        &self,
        condition: Option<sea_orm::sea_query::SimpleExpr>,
    ) -> AppResult<Vec<ComplaintModel>> {
        let mut query = Complaint::find();
        if let Some(condition) = condition {
            query = query.filter(condition);
        }
        let complaints = query
            .order_by_asc(complaint::Column::Id)
            .all(&self.db)
            .await?;
        Ok(complaints)
    }
}
