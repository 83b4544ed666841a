use crate::db::{DbPool, OrmConn};

/// Shared handler state. The sqlx pool backs the plain-query paths (cart,
/// groups, bookings, auth); the SeaORM connection backs the entity-based and
/// transactional paths (menu, orders).
#[derive(Clone)]
pub struct AppState {
    pub pool: DbPool,
    pub orm: OrmConn,
}
