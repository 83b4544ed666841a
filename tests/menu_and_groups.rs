use axum_restaurant_api::{
    db::{create_orm_conn, create_pool, run_migrations},
    dto::{
        groups::AddGroupUserRequest,
        menu::{CreateCategoryRequest, CreateMenuItemRequest},
    },
    entity::users::ActiveModel as UserActive,
    error::AppError,
    middleware::auth::{AuthUser, Role},
    services::{group_service, menu_service},
    state::AppState,
};
use sea_orm::ActiveValue::NotSet;
use sea_orm::{ActiveModelTrait, Set};
use tokio::sync::OnceCell;
use uuid::Uuid;

// Tests in this binary run in parallel; apply migrations only once.
static MIGRATED: OnceCell<()> = OnceCell::const_new();

#[tokio::test]
async fn menu_item_lifecycle_with_featured_toggle() -> anyhow::Result<()> {
    let state = match setup_state().await? {
        Some(state) => state,
        None => return Ok(()),
    };

    let (_, admin) = seed_user(&state, Role::Admin).await?;
    let (_, manager) = seed_user(&state, Role::Manager).await?;
    let (_, customer) = seed_user(&state, Role::Customer).await?;

    let category = menu_service::create_category(
        &state,
        &admin,
        CreateCategoryRequest {
            slug: format!("slug-{}", Uuid::new_v4()),
            title: "Mains".into(),
        },
    )
    .await?;
    let category = category.data.expect("category");

    // The slug carries a unique constraint.
    let err = menu_service::create_category(
        &state,
        &admin,
        CreateCategoryRequest {
            slug: category.slug.clone(),
            title: "Duplicate".into(),
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)));

    // Customers cannot create menu items.
    let err = menu_service::create_menu_item(
        &state,
        &customer,
        CreateMenuItemRequest {
            title: "Pizza".into(),
            price_cents: 1200,
            featured: false,
            category_id: category.id,
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::Forbidden));

    let item = menu_service::create_menu_item(
        &state,
        &admin,
        CreateMenuItemRequest {
            title: "Lemon Herb Chicken".into(),
            price_cents: 1750,
            featured: false,
            category_id: category.id,
        },
    )
    .await?;
    let item = item.data.expect("menu item");
    assert!(!item.featured);

    // Managers may toggle featured; the message reports the new value.
    let toggled = menu_service::toggle_featured(&state, &manager, item.id).await?;
    assert!(toggled.data.expect("menu item").featured);
    assert!(toggled.message.contains("changed to true"));

    // But only admins may delete.
    let err = menu_service::delete_menu_item(&state, &manager, item.id)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Forbidden));
    menu_service::delete_menu_item(&state, &admin, item.id).await?;

    Ok(())
}

#[tokio::test]
async fn group_membership_grants_and_revokes() -> anyhow::Result<()> {
    let state = match setup_state().await? {
        Some(state) => state,
        None => return Ok(()),
    };

    let (_, manager) = seed_user(&state, Role::Manager).await?;
    let (email, target) = seed_user(&state, Role::Customer).await?;

    // Customers may not manage groups.
    let (_, customer) = seed_user(&state, Role::Customer).await?;
    let err = group_service::list_group(&state, &customer, Role::Manager)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Forbidden));

    // Grant the delivery-crew role by email.
    let granted = group_service::add_to_group(
        &state,
        &manager,
        Role::DeliveryCrew,
        AddGroupUserRequest {
            email: email.clone(),
        },
    )
    .await?;
    assert_eq!(granted.data.expect("staff user").role, "delivery_crew");

    let listed = group_service::list_group(&state, &manager, Role::DeliveryCrew).await?;
    assert!(
        listed
            .data
            .expect("staff list")
            .items
            .iter()
            .any(|u| u.id == target.user_id)
    );

    // Revoking demotes back to customer; a second revoke is a 404.
    group_service::remove_from_group(&state, &manager, Role::DeliveryCrew, target.user_id).await?;
    let err =
        group_service::remove_from_group(&state, &manager, Role::DeliveryCrew, target.user_id)
            .await
            .unwrap_err();
    assert!(matches!(err, AppError::NotFound));

    // Granting to an unknown email is a 404.
    let err = group_service::add_to_group(
        &state,
        &manager,
        Role::Manager,
        AddGroupUserRequest {
            email: format!("missing-{}@example.com", Uuid::new_v4()),
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::NotFound));

    Ok(())
}

#[tokio::test]
async fn admin_role_survives_group_grants() -> anyhow::Result<()> {
    let state = match setup_state().await? {
        Some(state) => state,
        None => return Ok(()),
    };

    let (_, manager) = seed_user(&state, Role::Manager).await?;
    let (admin_email, admin) = seed_user(&state, Role::Admin).await?;

    // A manager granting a staff role to an admin's email must be refused
    // for both groups and must leave the admin role untouched.
    for role in [Role::DeliveryCrew, Role::Manager] {
        let err = group_service::add_to_group(
            &state,
            &manager,
            role,
            AddGroupUserRequest {
                email: admin_email.clone(),
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
    }

    let stored: (String,) = sqlx::query_as("SELECT role FROM users WHERE id = $1")
        .bind(admin.user_id)
        .fetch_one(&state.pool)
        .await?;
    assert_eq!(stored.0, "admin");

    Ok(())
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

async fn seed_user(state: &AppState, role: Role) -> anyhow::Result<(String, AuthUser)> {
    let email = format!("{}@example.com", Uuid::new_v4());
    let user = UserActive {
        id: Set(Uuid::new_v4()),
        email: Set(email.clone()),
        password_hash: Set("dummy".into()),
        role: Set(role.as_str().into()),
        created_at: NotSet,
    }
    .insert(&state.orm)
    .await?;

    Ok((
        email,
        AuthUser {
            user_id: user.id,
            role,
        },
    ))
}
