//! Staff account administration, reachable by admins or the admin PIN.

use std::collections::HashMap;

use sea_orm::{
    ColumnTrait, EntityTrait, FromQueryResult, QueryFilter, QuerySelect, sea_query::Expr,
};
use uuid::Uuid;

use crate::{
    audit,
    dto::admin::{CreateStaffRequest, UpdatePasswordRequest, UserList, UserSummary},
    entity::orders::{Column as OrderCol, Entity as Orders},
    error::{AppError, AppResult},
    middleware::auth::AdminAccess,
    models::{Account, Role, UserProfile},
    response::{ApiResponse, Meta},
    services::{
        auth_service::hash_password,
        credential_store::{self, NewUser},
    },
    state::AppState,
};

const MIN_PASSWORD_LEN: usize = 4;

fn check_password(password: &str) -> AppResult<()> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(AppError::bad_request(format!(
            "Password must be at least {MIN_PASSWORD_LEN} characters"
        )));
    }
    Ok(())
}

#[derive(Debug, FromQueryResult)]
struct OrderCount {
    user_id: Option<Uuid>,
    orders: i64,
}

/// All users, most recently active first, each with their order count.
pub async fn list_users(state: &AppState) -> AppResult<ApiResponse<UserList>> {
    let users = credential_store::list_by_last_login(&state.orm).await?;

    let counts: HashMap<Uuid, u64> = Orders::find()
        .select_only()
        .column(OrderCol::UserId)
        .column_as(Expr::col(OrderCol::Id).count(), "orders")
        .filter(OrderCol::UserId.is_not_null())
        .group_by(OrderCol::UserId)
        .into_model::<OrderCount>()
        .all(&state.orm)
        .await?
        .into_iter()
        .filter_map(|row| Some((row.user_id?, u64::try_from(row.orders).unwrap_or(0))))
        .collect();

    let items: Vec<UserSummary> = users
        .into_iter()
        .map(|user| UserSummary {
            orders_count: counts.get(&user.id).copied().unwrap_or(0),
            profile: user.profile(),
        })
        .collect();

    let meta = Meta::total(items.len() as u64);
    Ok(ApiResponse::success("Users", UserList(items), Some(meta)))
}

pub async fn create_staff(
    state: &AppState,
    actor: &AdminAccess,
    payload: CreateStaffRequest,
) -> AppResult<ApiResponse<UserProfile>> {
    let CreateStaffRequest {
        name,
        username,
        password,
    } = payload;
    if name.trim().is_empty() || username.trim().is_empty() || password.is_empty() {
        return Err(AppError::bad_request(
            "Name, username and password are required",
        ));
    }
    check_password(&password)?;

    let password_hash = hash_password(&password)?;
    let user = credential_store::create(
        &state.orm,
        NewUser::staff(Role::Staff, name, username, password_hash),
    )
    .await?;

    tracing::info!(user_id = %user.id, username = user.username(), "staff account created");
    audit::record(
        &state.orm,
        actor.user_id(),
        "staff_created",
        Some("users"),
        serde_json::json!({ "user_id": user.id, "username": user.username() }),
    )
    .await;

    Ok(ApiResponse::success(
        "Staff account created",
        user.profile(),
        Some(Meta::empty()),
    ))
}

pub async fn update_staff_password(
    state: &AppState,
    actor: &AdminAccess,
    id: Uuid,
    payload: UpdatePasswordRequest,
) -> AppResult<ApiResponse<UserProfile>> {
    check_password(&payload.password)?;

    let mut user = credential_store::find_by_id(&state.orm, id)
        .await?
        .ok_or(AppError::NotFound)?;
    let Account::Staff(staff) = &mut user.account else {
        return Err(AppError::bad_request("Only staff accounts have passwords"));
    };
    staff.password_hash = Some(hash_password(&payload.password)?);

    let user = credential_store::save(&state.orm, &user).await?;

    audit::record(
        &state.orm,
        actor.user_id(),
        "staff_password_reset",
        Some("users"),
        serde_json::json!({ "user_id": user.id }),
    )
    .await;

    Ok(ApiResponse::success(
        "Password updated",
        user.profile(),
        Some(Meta::empty()),
    ))
}

/// Delete a staff account. Admins and customers cannot be removed here.
pub async fn delete_staff(
    state: &AppState,
    actor: &AdminAccess,
    id: Uuid,
) -> AppResult<ApiResponse<serde_json::Value>> {
    let user = credential_store::find_by_id(&state.orm, id)
        .await?
        .ok_or(AppError::NotFound)?;
    if user.role() != Role::Staff {
        return Err(AppError::bad_request("Only staff accounts can be deleted"));
    }

    credential_store::delete(&state.orm, id).await?;

    tracing::info!(user_id = %id, "staff account deleted");
    audit::record(
        &state.orm,
        actor.user_id(),
        "staff_deleted",
        Some("users"),
        serde_json::json!({ "user_id": id, "username": user.username() }),
    )
    .await;

    Ok(ApiResponse::success(
        "Staff account deleted",
        serde_json::json!({ "id": id }),
        Some(Meta::empty()),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_passwords_are_rejected() {
        assert!(check_password("abc").is_err());
        assert!(check_password("abcd").is_ok());
    }
}
