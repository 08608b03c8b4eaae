use crate::{
    error::{AppError, AppResult},
    middleware::AuthUser,
    models::{
        category, category_request::{self, RequestStatus},
        post, Category, CategoryModel, CategoryRequest, CategoryRequestModel, Post, PostModel,
        PostStatus,
    },
    utils::text::slug_base,
};
use chrono::NaiveDateTime;
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, DatabaseConnection, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, TransactionTrait,
};

#[derive(Debug, Clone)]
pub struct NewCategory {
    pub name: String,
    pub name_bn: String,
    pub slug: Option<String>,
    pub description: Option<String>,
    pub display_order: i32,
}

pub struct CategoryService {
    db: DatabaseConnection,
}

impl CategoryService {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    pub async fn list(&self) -> AppResult<Vec<CategoryModel>> {
        let categories = Category::find()
            .order_by_asc(category::Column::DisplayOrder)
            .order_by_asc(category::Column::Id)
            .all(&self.db)
            .await?;
        Ok(categories)
    }

    /// A category and its approved posts, newest first.
    pub async fn get_by_slug(&self, slug: &str) -> AppResult<(CategoryModel, Vec<PostModel>)> {
        let category = Category::find()
            .filter(category::Column::Slug.eq(slug))
            .one(&self.db)
            .await?
            .ok_or(AppError::NotFound)?;

        let posts = Post::find()
            .filter(post::Column::CategoryId.eq(category.id))
            .filter(post::Column::Status.eq(PostStatus::Approved))
            .order_by_desc(post::Column::PublishedAt)
            .all(&self.db)
            .await?;

        Ok((category, posts))
    }

    pub async fn create(
        &self,
        actor: &AuthUser,
        input: NewCategory,
        now: NaiveDateTime,
    ) -> AppResult<CategoryModel> {
        actor.require_admin()?;
        let category = insert_category(&self.db, input, now).await?;
        tracing::info!(category_id = category.id, by = actor.user_id, "category created");
        Ok(category)
    }

    /// Posts in the category keep existing with no category.
    pub async fn delete(&self, actor: &AuthUser, id: i32) -> AppResult<()> {
        actor.require_admin()?;
        let result = Category::delete_by_id(id).exec(&self.db).await?;
        if result.rows_affected == 0 {
            return Err(AppError::NotFound);
        }
        tracing::info!(category_id = id, by = actor.user_id, "category deleted");
        Ok(())
    }

    // ---- category requests ------------------------------------------------

    pub async fn submit_request(
        &self,
        actor: &AuthUser,
        name: &str,
        name_bn: &str,
        description: Option<String>,
        now: NaiveDateTime,
    ) -> AppResult<CategoryRequestModel> {
        actor.require_writer()?;
        actor.ensure_not_suspended(now)?;
        let (name, name_bn) = (name.trim(), name_bn.trim());
        if name.is_empty() || name_bn.is_empty() {
            return Err(AppError::validation("Both name and name_bn are required"));
        }

        let request = category_request::ActiveModel {
            requested_by: Set(actor.user_id),
            name: Set(name.to_string()),
            name_bn: Set(name_bn.to_string()),
            description: Set(description.filter(|d| !d.trim().is_empty())),
            status: Set(RequestStatus::Pending),
            reviewed_by: Set(None),
            reviewed_at: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(&self.db)
        .await?;
        Ok(request)
    }

    pub async fn list_requests(
        &self,
        actor: &AuthUser,
        status: Option<RequestStatus>,
    ) -> AppResult<Vec<CategoryRequestModel>> {
        actor.require_admin()?;
        let mut query = CategoryRequest::find();
        if let Some(status) = status {
            query = query.filter(category_request::Column::Status.eq(status));
        }
        let requests = query
            .order_by_desc(category_request::Column::CreatedAt)
            .order_by_desc(category_request::Column::Id)
            .all(&self.db)
            .await?;
        Ok(requests)
    }

    /// Approving creates the category and closes the request together.
    pub async fn approve_request(
        &self,
        actor: &AuthUser,
        id: i32,
        now: NaiveDateTime,
    ) -> AppResult<CategoryModel> {
        actor.require_admin()?;
        let txn = self.db.begin().await?;

        let request = pending_request(&txn, id).await?;
        let display_order = Category::find().count(&txn).await? as i32;
        let category = insert_category(
            &txn,
            NewCategory {
                name: request.name.clone(),
                name_bn: request.name_bn.clone(),
                slug: None,
                description: request.description.clone(),
                display_order,
            },
            now,
        )
        .await?;

        close_request(&txn, request, RequestStatus::Approved, actor.user_id, now).await?;
        txn.commit().await?;

        tracing::info!(request_id = id, category_id = category.id, "category request approved");
        Ok(category)
    }

    pub async fn reject_request(
        &self,
        actor: &AuthUser,
        id: i32,
        now: NaiveDateTime,
    ) -> AppResult<CategoryRequestModel> {
        actor.require_admin()?;
        let request = pending_request(&self.db, id).await?;
        let request =
            close_request(&self.db, request, RequestStatus::Rejected, actor.user_id, now).await?;
        tracing::info!(request_id = id, "category request rejected");
        Ok(request)
    }
}

async fn insert_category<C: sea_orm::ConnectionTrait>(
    conn: &C,
    input: NewCategory,
    now: NaiveDateTime,
) -> AppResult<CategoryModel> {
    let name = input.name.trim().to_string();
    let name_bn = input.name_bn.trim().to_string();
    if name.is_empty() || name_bn.is_empty() {
        return Err(AppError::validation("Both name and name_bn are required"));
    }

    let slug = slug_base(input.slug.as_deref().unwrap_or(&name));
    if slug.is_empty() {
        return Err(AppError::validation("Category slug must contain letters or digits"));
    }

    let taken = Category::find()
        .filter(category::Column::Slug.eq(slug.as_str()))
        .count(conn)
        .await?
        > 0;
    if taken {
        return Err(AppError::validation("A category with this slug already exists"));
    }

    let category = category::ActiveModel {
        name: Set(name),
        name_bn: Set(name_bn),
        slug: Set(slug),
        description: Set(input.description.filter(|d| !d.trim().is_empty())),
        display_order: Set(input.display_order),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(conn)
    .await?;
    Ok(category)
}

async fn pending_request<C: sea_orm::ConnectionTrait>(
    conn: &C,
    id: i32,
) -> AppResult<CategoryRequestModel> {
    let request = CategoryRequest::find_by_id(id)
        .one(conn)
        .await?
        .ok_or(AppError::NotFound)?;
    if request.status != RequestStatus::Pending {
        return Err(AppError::InvalidTransition(
            "Category request has already been reviewed".to_string(),
        ));
    }
    Ok(request)
}

async fn close_request<C: sea_orm::ConnectionTrait>(
    conn: &C,
    request: CategoryRequestModel,
    status: RequestStatus,
    reviewer: i32,
    now: NaiveDateTime,
) -> AppResult<CategoryRequestModel> {
    let mut active: category_request::ActiveModel = request.into();
    active.status = Set(status);
    active.reviewed_by = Set(Some(reviewer));
    active.reviewed_at = Set(Some(now));
    active.updated_at = Set(now);
    Ok(active.update(conn).await?)
}
