use std::str::FromStr;

use axum_restaurant_api::{
    error::AppError,
    middleware::auth::{AuthUser, Role, ensure_admin, ensure_manager, ensure_staff},
    routes::params::Pagination,
};
use uuid::Uuid;

fn user_with(role: Role) -> AuthUser {
    AuthUser {
        user_id: Uuid::new_v4(),
        role,
    }
}

#[test]
fn role_round_trips_through_string_form() {
    for role in [Role::Admin, Role::Manager, Role::DeliveryCrew, Role::Customer] {
        assert_eq!(Role::from_str(role.as_str()).unwrap(), role);
    }
}

#[test]
fn unknown_role_string_is_rejected() {
    let err = Role::from_str("superuser").unwrap_err();
    assert!(matches!(err, AppError::Unauthorized));
}

#[test]
fn admin_gate_rejects_everyone_else() {
    assert!(ensure_admin(&user_with(Role::Admin)).is_ok());
    for role in [Role::Manager, Role::DeliveryCrew, Role::Customer] {
        assert!(matches!(
            ensure_admin(&user_with(role)),
            Err(AppError::Forbidden)
        ));
    }
}

#[test]
fn manager_gate_admits_admin_and_manager() {
    assert!(ensure_manager(&user_with(Role::Admin)).is_ok());
    assert!(ensure_manager(&user_with(Role::Manager)).is_ok());
    assert!(matches!(
        ensure_manager(&user_with(Role::DeliveryCrew)),
        Err(AppError::Forbidden)
    ));
    assert!(matches!(
        ensure_manager(&user_with(Role::Customer)),
        Err(AppError::Forbidden)
    ));
}

#[test]
fn staff_gate_rejects_customers_only() {
    for role in [Role::Admin, Role::Manager, Role::DeliveryCrew] {
        assert!(ensure_staff(&user_with(role)).is_ok());
    }
    assert!(matches!(
        ensure_staff(&user_with(Role::Customer)),
        Err(AppError::Forbidden)
    ));
}

#[test]
fn pagination_normalizes_out_of_range_input() {
    let pagination = Pagination {
        page: Some(0),
        per_page: Some(1000),
    };
    let (page, per_page, offset) = pagination.normalize();
    assert_eq!(page, 1);
    assert_eq!(per_page, 100);
    assert_eq!(offset, 0);

    let defaults = Pagination {
        page: None,
        per_page: None,
    };
    assert_eq!(defaults.normalize(), (1, 20, 0));
}
