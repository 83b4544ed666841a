use axum::{
    body::Body,
    http::{Request, StatusCode, header},
};
use axum_restaurant_api::{
    db::{create_orm_conn, create_pool, run_migrations},
    dto::{auth::Claims, cart::AddToCartRequest},
    entity::{
        categories::ActiveModel as CategoryActive, menu_items::ActiveModel as MenuItemActive,
        users::ActiveModel as UserActive,
    },
    middleware::auth::{AuthUser, Role},
    routes::create_api_router,
    services::cart_service,
    state::AppState,
};
use chrono::{Duration, Utc};
use jsonwebtoken::{EncodingKey, Header, encode};
use sea_orm::ActiveValue::NotSet;
use sea_orm::{ActiveModelTrait, Set};
use tokio::sync::OnceCell;
use tower::ServiceExt;
use uuid::Uuid;

// Tests in this binary run in parallel; apply migrations only once.
static MIGRATED: OnceCell<()> = OnceCell::const_new();

const TEST_SECRET: &str = "cart-http-test-secret";

// A DELETE with no body at all must clear the cart; the request must not be
// rejected before it reaches the handler.
#[tokio::test]
async fn bodyless_delete_clears_the_cart() -> anyhow::Result<()> {
    let state = match setup_state().await? {
        Some(state) => state,
        None => return Ok(()),
    };
    unsafe {
        std::env::set_var("JWT_SECRET", TEST_SECRET);
    }

    let customer = seed_user(&state, Role::Customer).await?;
    let category_id = seed_category(&state).await?;
    let item_id = seed_menu_item(&state, "Hummus", 450, category_id).await?;

    cart_service::add_to_cart(
        &state,
        &customer,
        AddToCartRequest {
            menu_item_id: item_id,
            quantity: 2,
        },
    )
    .await?;
    assert_eq!(cart_row_count(&state, customer.user_id).await?, 1);

    let token = bearer_token(&customer)?;
    let app = create_api_router().with_state(state.clone());
    let response = app
        .oneshot(
            Request::builder()
                .method("DELETE")
                .uri("/cart/menu-items")
                .header(header::AUTHORIZATION, token)
                .body(Body::empty())?,
        )
        .await?;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(cart_row_count(&state, customer.user_id).await?, 0);

    Ok(())
}

fn bearer_token(user: &AuthUser) -> anyhow::Result<String> {
    let expiration = Utc::now() + Duration::hours(1);
    let claims = Claims {
        sub: user.user_id.to_string(),
        role: user.role.as_str().to_string(),
        exp: expiration.timestamp() as usize,
    };
    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(TEST_SECRET.as_bytes()),
    )?;
    Ok(format!("Bearer {token}"))
}

async fn setup_state() -> anyhow::Result<Option<AppState>> {
    let database_url = match std::env::var("TEST_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
    {
        Ok(url) => url,
        Err(_) => {
            eprintln!(
                "Skipping test: set TEST_DATABASE_URL or DATABASE_URL to run integration flow tests."
            );
            return Ok(None);
        }
    };

    let pool = create_pool(&database_url).await?;
    let orm = create_orm_conn(&database_url).await?;
    MIGRATED
        .get_or_try_init(|| async { run_migrations(&orm).await })
        .await?;

    Ok(Some(AppState { pool, orm }))
}

async fn seed_user(state: &AppState, role: Role) -> anyhow::Result<AuthUser> {
    let user = UserActive {
        id: Set(Uuid::new_v4()),
        email: Set(format!("{}@example.com", Uuid::new_v4())),
        password_hash: Set("dummy".into()),
        role: Set(role.as_str().into()),
        created_at: NotSet,
    }
    .insert(&state.orm)
    .await?;

    Ok(AuthUser {
        user_id: user.id,
        role,
    })
}

async fn seed_category(state: &AppState) -> anyhow::Result<Uuid> {
    let category = CategoryActive {
        id: Set(Uuid::new_v4()),
        slug: Set(format!("slug-{}", Uuid::new_v4())),
        title: Set("Test Category".to_string()),
    }
    .insert(&state.orm)
    .await?;

    Ok(category.id)
}

async fn seed_menu_item(
    state: &AppState,
    title: &str,
    price_cents: i64,
    category_id: Uuid,
) -> anyhow::Result<Uuid> {
    let item = MenuItemActive {
        id: Set(Uuid::new_v4()),
        title: Set(title.to_string()),
        price_cents: Set(price_cents),
        featured: Set(false),
        category_id: Set(category_id),
        created_at: NotSet,
    }
    .insert(&state.orm)
    .await?;

    Ok(item.id)
}

async fn cart_row_count(state: &AppState, user_id: Uuid) -> anyhow::Result<i64> {
    let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM cart_items WHERE user_id = $1")
        .bind(user_id)
        .fetch_one(&state.pool)
        .await?;
    Ok(count.0)
}
