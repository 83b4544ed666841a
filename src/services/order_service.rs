use chrono::Utc;
use sea_orm::ActiveValue::NotSet;
use sea_orm::sea_query::LockType;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Set, TransactionTrait,
};
use uuid::Uuid;

use crate::{
    audit::log_audit,
    dto::orders::{AssignCrewRequest, OrderList, OrderWithItems},
    entity::{
        cart_items::{Column as CartCol, Entity as CartItems},
        order_items::{
            ActiveModel as OrderItemActive, Column as OrderItemCol, Entity as OrderItems,
            Model as OrderItemModel,
        },
        orders::{ActiveModel as OrderActive, Column as OrderCol, Entity as Orders, Model as OrderModel},
        users::{Column as UserCol, Entity as Users},
    },
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, Role, ensure_manager, ensure_staff},
    models::{Order, OrderItem},
    response::{ApiResponse, Meta},
    routes::params::OrderListQuery,
    state::AppState,
};

/// Converts the caller's cart into an order plus line snapshot. The whole
/// sequence runs in one transaction so a partial failure never leaves a
/// half-created order or a half-cleared cart.
pub async fn place_order(state: &AppState, user: &AuthUser) -> AppResult<ApiResponse<OrderWithItems>> {
    let txn = state.orm.begin().await?;

    let cart_rows = CartItems::find()
        .filter(CartCol::UserId.eq(user.user_id))
        .lock(LockType::Update)
        .all(&txn)
        .await?;

    if cart_rows.is_empty() {
        return Err(AppError::BadRequest("Cart is empty".into()));
    }

    // Row prices were snapshotted in cents at add-to-cart time; the total is
    // an exact integer sum, no floating point anywhere.
    let total_cents: i64 = cart_rows.iter().map(|row| row.price_cents).sum();

    let order = OrderActive {
        id: Set(Uuid::new_v4()),
        user_id: Set(user.user_id),
        delivery_crew_id: Set(None),
        delivered: Set(false),
        total_cents: Set(total_cents),
        placed_on: Set(Utc::now().date_naive()),
        created_at: NotSet,
    }
    .insert(&txn)
    .await?;

    let mut items: Vec<OrderItem> = Vec::with_capacity(cart_rows.len());
    for row in &cart_rows {
        let item = OrderItemActive {
            id: Set(Uuid::new_v4()),
            order_id: Set(order.id),
            menu_item_id: Set(row.menu_item_id),
            quantity: Set(row.quantity),
        }
        .insert(&txn)
        .await?;
        items.push(order_item_from_entity(item));
    }

    CartItems::delete_many()
        .filter(CartCol::UserId.eq(user.user_id))
        .exec(&txn)
        .await?;

    txn.commit().await?;

    if let Err(err) = log_audit(
        &state.pool,
        Some(user.user_id),
        "order_place",
        Some("orders"),
        Some(serde_json::json!({ "order_id": order.id, "total_cents": total_cents })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    let message = format!("Your order has been placed! Your order number is {}", order.id);
    Ok(ApiResponse::success(
        message,
        OrderWithItems {
            order: order_from_entity(order),
            items,
        },
        Some(Meta::empty()),
    ))
}

/// Managers and admins see everything, crew members see their assignments,
/// customers see their own orders.
pub async fn list_orders(
    state: &AppState,
    user: &AuthUser,
    query: OrderListQuery,
) -> AppResult<ApiResponse<OrderList>> {
    let (page, limit, offset) = query.pagination.normalize();

    let mut condition = Condition::all();
    condition = match user.role {
        Role::Admin | Role::Manager => condition,
        Role::DeliveryCrew => condition.add(OrderCol::DeliveryCrewId.eq(user.user_id)),
        Role::Customer => condition.add(OrderCol::UserId.eq(user.user_id)),
    };
    if let Some(delivered) = query.delivered {
        condition = condition.add(OrderCol::Delivered.eq(delivered));
    }

    let finder = Orders::find()
        .filter(condition)
        .order_by_desc(OrderCol::CreatedAt);

    let total = finder.clone().count(&state.orm).await? as i64;

    let orders = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(order_from_entity)
        .collect();

    let meta = Meta::new(page, limit, total);
    Ok(ApiResponse::success(
        "Orders",
        OrderList { items: orders },
        Some(meta),
    ))
}

pub async fn get_order(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<OrderWithItems>> {
    let order = Orders::find_by_id(id).one(&state.orm).await?;
    let order = match order {
        Some(o) => o,
        None => return Err(AppError::NotFound),
    };

    let allowed = match user.role {
        Role::Admin | Role::Manager => true,
        Role::DeliveryCrew => order.delivery_crew_id == Some(user.user_id),
        Role::Customer => order.user_id == user.user_id,
    };
    if !allowed {
        return Err(AppError::Forbidden);
    }

    let items = OrderItems::find()
        .filter(OrderItemCol::OrderId.eq(order.id))
        .all(&state.orm)
        .await?
        .into_iter()
        .map(order_item_from_entity)
        .collect();

    Ok(ApiResponse::success(
        "OK",
        OrderWithItems {
            order: order_from_entity(order),
            items,
        },
        Some(Meta::empty()),
    ))
}

/// Flips the delivered flag. Freely reversible; both directions are legal.
pub async fn toggle_delivered(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<Order>> {
    ensure_staff(user)?;

    let existing = Orders::find_by_id(id).one(&state.orm).await?;
    let existing = match existing {
        Some(o) => o,
        None => return Err(AppError::NotFound),
    };

    // Crew can only report on orders assigned to them.
    if user.role == Role::DeliveryCrew && existing.delivery_crew_id != Some(user.user_id) {
        return Err(AppError::Forbidden);
    }

    let next = !existing.delivered;
    let mut active: OrderActive = existing.into();
    active.delivered = Set(next);
    let order = active.update(&state.orm).await?;

    if let Err(err) = log_audit(
        &state.pool,
        Some(user.user_id),
        "order_status_toggle",
        Some("orders"),
        Some(serde_json::json!({ "order_id": order.id, "delivered": order.delivered })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    let message = format!(
        "Status of order #{} changed to {}",
        order.id, order.delivered
    );
    Ok(ApiResponse::success(
        message,
        order_from_entity(order),
        Some(Meta::empty()),
    ))
}

pub async fn assign_crew(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: AssignCrewRequest,
) -> AppResult<ApiResponse<Order>> {
    ensure_manager(user)?;

    let existing = Orders::find_by_id(id).one(&state.orm).await?;
    let existing = match existing {
        Some(o) => o,
        None => return Err(AppError::NotFound),
    };

    let crew = Users::find()
        .filter(UserCol::Id.eq(payload.delivery_crew_id))
        .one(&state.orm)
        .await?;
    let crew = match crew {
        Some(c) => c,
        None => return Err(AppError::NotFound),
    };
    if crew.role != Role::DeliveryCrew.as_str() {
        return Err(AppError::BadRequest(
            "assignee is not a delivery crew member".into(),
        ));
    }

    let mut active: OrderActive = existing.into();
    active.delivery_crew_id = Set(Some(crew.id));
    let order = active.update(&state.orm).await?;

    if let Err(err) = log_audit(
        &state.pool,
        Some(user.user_id),
        "order_assign_crew",
        Some("orders"),
        Some(serde_json::json!({ "order_id": order.id, "delivery_crew_id": crew.id })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    let message = format!("{} was assigned to order #{}", crew.email, order.id);
    Ok(ApiResponse::success(
        message,
        order_from_entity(order),
        Some(Meta::empty()),
    ))
}

/// Hard delete; order lines go with the order via the FK cascade.
pub async fn delete_order(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<serde_json::Value>> {
    ensure_manager(user)?;

    let result = Orders::delete_by_id(id).exec(&state.orm).await?;
    if result.rows_affected == 0 {
        return Err(AppError::NotFound);
    }

    if let Err(err) = log_audit(
        &state.pool,
        Some(user.user_id),
        "order_delete",
        Some("orders"),
        Some(serde_json::json!({ "order_id": id })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success(
        format!("Order #{id} was deleted"),
        serde_json::json!({}),
        Some(Meta::empty()),
    ))
}

fn order_from_entity(model: OrderModel) -> Order {
    Order {
        id: model.id,
        user_id: model.user_id,
        delivery_crew_id: model.delivery_crew_id,
        delivered: model.delivered,
        total_cents: model.total_cents,
        placed_on: model.placed_on,
        created_at: model.created_at.with_timezone(&Utc),
    }
}

fn order_item_from_entity(model: OrderItemModel) -> OrderItem {
    OrderItem {
        id: model.id,
        order_id: model.order_id,
        menu_item_id: model.menu_item_id,
        quantity: model.quantity,
    }
}
