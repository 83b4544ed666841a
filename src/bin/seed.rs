use axum_restaurant_api::{
    config::AppConfig, db::create_pool, services::auth_service::hash_password,
};
use uuid::Uuid;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = AppConfig::from_env()?;

    let pool = create_pool(&config.database_url).await?;
    // Ensure migrations are applied.
    sqlx::migrate!("./migrations").run(&pool).await?;

    let admin_id = ensure_user(&pool, "admin@littlelemon.test", "admin123", "admin").await?;
    let manager_id = ensure_user(&pool, "manager@littlelemon.test", "manager123", "manager").await?;
    ensure_user(&pool, "crew@littlelemon.test", "crew123", "delivery_crew").await?;
    ensure_user(&pool, "customer@littlelemon.test", "customer123", "customer").await?;
    seed_menu(&pool).await?;

    println!("Seed completed. Admin ID: {admin_id}, Manager ID: {manager_id}");
    Ok(())
}

async fn ensure_user(
    pool: &sqlx::PgPool,
    email: &str,
    password: &str,
    role: &str,
) -> anyhow::Result<Uuid> {
    let password_hash = hash_password(password).map_err(|e| anyhow::anyhow!(e.to_string()))?;

    let row: Option<(Uuid,)> = sqlx::query_as(
        r#"
        INSERT INTO users (id, email, password_hash, role)
        VALUES ($1, $2, $3, $4)
        ON CONFLICT (email) DO UPDATE SET role = EXCLUDED.role
        RETURNING id
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(email)
    .bind(password_hash)
    .bind(role)
    .fetch_optional(pool)
    .await?;

    let user_id = match row {
        Some((id,)) => id,
        None => {
            let existing: (Uuid,) = sqlx::query_as("SELECT id FROM users WHERE email = $1")
                .bind(email)
                .fetch_one(pool)
                .await?;
            existing.0
        }
    };

    println!("Ensured user {email} (role={role})");
    Ok(user_id)
}

async fn seed_menu(pool: &sqlx::PgPool) -> anyhow::Result<()> {
    let categories = vec![
        ("starters", "Starters"),
        ("mains", "Mains"),
        ("desserts", "Desserts"),
    ];

    for (slug, title) in &categories {
        sqlx::query(
            r#"
            INSERT INTO categories (id, slug, title)
            VALUES ($1, $2, $3)
            ON CONFLICT (slug) DO NOTHING
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(slug)
        .bind(title)
        .execute(pool)
        .await?;
    }

    // (title, price in cents, featured, category slug)
    let items = vec![
        ("Bruschetta", 650, false, "starters"),
        ("Greek Salad", 899, true, "starters"),
        ("Lemon Herb Chicken", 1750, true, "mains"),
        ("Grilled Branzino", 2250, false, "mains"),
        ("Lemon Cake", 595, false, "desserts"),
    ];

    for (title, price_cents, featured, slug) in items {
        sqlx::query(
            r#"
            INSERT INTO menu_items (id, title, price_cents, featured, category_id)
            SELECT $1, $2, $3, $4, c.id FROM categories c WHERE c.slug = $5
            ON CONFLICT DO NOTHING
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(title)
        .bind(price_cents as i64)
        .bind(featured)
        .bind(slug)
        .execute(pool)
        .await?;
    }

    println!("Seeded menu");
    Ok(())
}
