use chrono::Utc;
use sea_orm::ActiveValue::NotSet;
use sea_orm::sea_query::Expr;
use sea_orm::sea_query::extension::postgres::PgExpr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Set,
};
use uuid::Uuid;

use crate::{
    audit::log_audit,
    dto::menu::{
        CategoryList, CreateCategoryRequest, CreateMenuItemRequest, MenuItemList,
        UpdateMenuItemRequest,
    },
    entity::{
        categories::{ActiveModel as CategoryActive, Column as CategoryCol, Entity as Categories, Model as CategoryModel},
        menu_items::{ActiveModel as MenuItemActive, Column as MenuCol, Entity as MenuItems, Model as MenuItemModel},
    },
    error::{AppError, AppResult, is_orm_unique_violation},
    middleware::auth::{AuthUser, ensure_admin, ensure_manager},
    models::{Category, MenuItem},
    response::{ApiResponse, Meta},
    routes::params::{MenuItemQuery, MenuSortBy, SortOrder},
    state::AppState,
};

pub async fn list_menu_items(
    state: &AppState,
    query: MenuItemQuery,
) -> AppResult<ApiResponse<MenuItemList>> {
    let (page, limit, offset) = query.pagination.normalize();
    let mut condition = Condition::all();

    if let Some(search) = query.q.as_ref().filter(|s| !s.is_empty()) {
        let pattern = format!("%{}%", search);
        condition = condition.add(Expr::col(MenuCol::Title).ilike(pattern));
    }

    if let Some(category_id) = query.category_id {
        condition = condition.add(MenuCol::CategoryId.eq(category_id));
    }

    if let Some(featured) = query.featured {
        condition = condition.add(MenuCol::Featured.eq(featured));
    }

    let sort_by = query.sort_by.unwrap_or(MenuSortBy::CreatedAt);
    let sort_order = query.sort_order.unwrap_or(SortOrder::Desc);
    let sort_col = match sort_by {
        MenuSortBy::CreatedAt => MenuCol::CreatedAt,
        MenuSortBy::Price => MenuCol::PriceCents,
        MenuSortBy::Title => MenuCol::Title,
    };

    let mut finder = MenuItems::find().filter(condition);
    finder = match sort_order {
        SortOrder::Asc => finder.order_by_asc(sort_col),
        SortOrder::Desc => finder.order_by_desc(sort_col),
    };

    let total = finder.clone().count(&state.orm).await? as i64;

    let items = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(menu_item_from_entity)
        .collect();

    let meta = Meta::new(page, limit, total);
    let data = MenuItemList { items };
    Ok(ApiResponse::success("Menu items", data, Some(meta)))
}

pub async fn get_menu_item(state: &AppState, id: Uuid) -> AppResult<ApiResponse<MenuItem>> {
    let result = MenuItems::find_by_id(id)
        .one(&state.orm)
        .await?
        .map(menu_item_from_entity);
    let result = match result {
        Some(item) => item,
        None => return Err(AppError::NotFound),
    };
    Ok(ApiResponse::success("Menu item", result, None))
}

pub async fn create_menu_item(
    state: &AppState,
    user: &AuthUser,
    payload: CreateMenuItemRequest,
) -> AppResult<ApiResponse<MenuItem>> {
    ensure_admin(user)?;

    let category = Categories::find_by_id(payload.category_id)
        .one(&state.orm)
        .await?;
    if category.is_none() {
        return Err(AppError::BadRequest("category not found".into()));
    }

    let active = MenuItemActive {
        id: Set(Uuid::new_v4()),
        title: Set(payload.title),
        price_cents: Set(payload.price_cents),
        featured: Set(payload.featured),
        category_id: Set(payload.category_id),
        created_at: NotSet,
    };
    let item = active.insert(&state.orm).await?;

    if let Err(err) = log_audit(
        &state.pool,
        Some(user.user_id),
        "menu_item_create",
        Some("menu_items"),
        Some(serde_json::json!({ "menu_item_id": item.id })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success(
        "Menu item created",
        menu_item_from_entity(item),
        Some(Meta::empty()),
    ))
}

pub async fn update_menu_item(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: UpdateMenuItemRequest,
) -> AppResult<ApiResponse<MenuItem>> {
    ensure_admin(user)?;
    let existing = MenuItems::find_by_id(id).one(&state.orm).await?;
    let existing = match existing {
        Some(item) => item,
        None => return Err(AppError::NotFound),
    };

    let mut active: MenuItemActive = existing.into();
    if let Some(title) = payload.title {
        active.title = Set(title);
    }
    if let Some(price_cents) = payload.price_cents {
        active.price_cents = Set(price_cents);
    }
    if let Some(category_id) = payload.category_id {
        let category = Categories::find_by_id(category_id).one(&state.orm).await?;
        if category.is_none() {
            return Err(AppError::BadRequest("category not found".into()));
        }
        active.category_id = Set(category_id);
    }

    let item = active.update(&state.orm).await?;

    if let Err(err) = log_audit(
        &state.pool,
        Some(user.user_id),
        "menu_item_update",
        Some("menu_items"),
        Some(serde_json::json!({ "menu_item_id": item.id })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success(
        "Updated",
        menu_item_from_entity(item),
        Some(Meta::empty()),
    ))
}

/// PATCH semantics: flip the featured flag and report the new value.
pub async fn toggle_featured(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<MenuItem>> {
    ensure_manager(user)?;

    let existing = MenuItems::find_by_id(id).one(&state.orm).await?;
    let existing = match existing {
        Some(item) => item,
        None => return Err(AppError::NotFound),
    };

    let next = !existing.featured;
    let mut active: MenuItemActive = existing.into();
    active.featured = Set(next);
    let item = active.update(&state.orm).await?;

    if let Err(err) = log_audit(
        &state.pool,
        Some(user.user_id),
        "menu_item_toggle_featured",
        Some("menu_items"),
        Some(serde_json::json!({ "menu_item_id": item.id, "featured": item.featured })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    let message = format!(
        "Featured status of {} changed to {}",
        item.title, item.featured
    );
    Ok(ApiResponse::success(
        message,
        menu_item_from_entity(item),
        Some(Meta::empty()),
    ))
}

pub async fn delete_menu_item(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<serde_json::Value>> {
    ensure_admin(user)?;
    let result = MenuItems::delete_by_id(id).exec(&state.orm).await?;

    if result.rows_affected == 0 {
        return Err(AppError::NotFound);
    }

    if let Err(err) = log_audit(
        &state.pool,
        Some(user.user_id),
        "menu_item_delete",
        Some("menu_items"),
        Some(serde_json::json!({ "menu_item_id": id })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success(
        "Deleted",
        serde_json::json!({}),
        Some(Meta::empty()),
    ))
}

pub async fn list_categories(state: &AppState) -> AppResult<ApiResponse<CategoryList>> {
    let items = Categories::find()
        .order_by_asc(CategoryCol::Slug)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(category_from_entity)
        .collect();

    Ok(ApiResponse::success(
        "Categories",
        CategoryList { items },
        Some(Meta::empty()),
    ))
}

pub async fn create_category(
    state: &AppState,
    user: &AuthUser,
    payload: CreateCategoryRequest,
) -> AppResult<ApiResponse<Category>> {
    ensure_admin(user)?;

    let active = CategoryActive {
        id: Set(Uuid::new_v4()),
        slug: Set(payload.slug),
        title: Set(payload.title),
    };
    let category = active.insert(&state.orm).await.map_err(|err| {
        if is_orm_unique_violation(&err) {
            AppError::Conflict("Category slug already exists".to_string())
        } else {
            err.into()
        }
    })?;

    if let Err(err) = log_audit(
        &state.pool,
        Some(user.user_id),
        "category_create",
        Some("categories"),
        Some(serde_json::json!({ "category_id": category.id })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success(
        "Category created",
        category_from_entity(category),
        Some(Meta::empty()),
    ))
}

fn menu_item_from_entity(model: MenuItemModel) -> MenuItem {
    MenuItem {
        id: model.id,
        title: model.title,
        price_cents: model.price_cents,
        featured: model.featured,
        category_id: model.category_id,
        created_at: model.created_at.with_timezone(&Utc),
    }
}

fn category_from_entity(model: CategoryModel) -> Category {
    Category {
        id: model.id,
        slug: model.slug,
        title: model.title,
    }
}
