//! Persistence of user identities.

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder, Set,
};
use uuid::Uuid;

use crate::{
    entity::{
        user_orders::{ActiveModel as UserOrderActive, Column as UserOrderCol, Entity as UserOrders},
        users::{ActiveModel as UserActive, Column as UserCol, Entity as Users, Model as UserModel},
    },
    error::{AppError, AppResult},
    models::{Account, CustomerAccount, PendingCode, Role, StaffAccount, User},
};

/// Loosely typed creation input; which fields are required depends on `role`.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub role: Role,
    pub name: String,
    pub phone_number: Option<String>,
    pub username: Option<String>,
    pub password_hash: Option<String>,
}

impl NewUser {
    pub fn customer(name: impl Into<String>, phone_number: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            name: name.into(),
            phone_number: Some(phone_number.into()),
            username: None,
            password_hash: None,
        }
    }

    pub fn staff(
        role: Role,
        name: impl Into<String>,
        username: impl Into<String>,
        password_hash: impl Into<String>,
    ) -> Self {
        Self {
            role,
            name: name.into(),
            phone_number: None,
            username: Some(username.into()),
            password_hash: Some(password_hash.into()),
        }
    }

    /// Resolve the role-dependent fields into exactly one account kind.
    fn into_account(self) -> AppResult<(String, Account)> {
        let name = self.name.trim().to_string();
        if name.is_empty() {
            return Err(AppError::bad_request("Name is required"));
        }

        let account = match self.role {
            Role::User => {
                let phone_number = required(self.phone_number, "Phone number is required")?;
                Account::Customer(CustomerAccount {
                    phone_number,
                    is_verified: false,
                    pending_code: None,
                })
            }
            Role::Staff | Role::Admin => {
                let username = required(self.username, "Username is required")?;
                let password_hash = required(self.password_hash, "Password is required")?;
                Account::Staff(StaffAccount {
                    role: self.role,
                    username,
                    password_hash: Some(password_hash),
                })
            }
        };

        Ok((name, account))
    }
}

fn required(value: Option<String>, message: &str) -> AppResult<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .ok_or_else(|| AppError::bad_request(message))
}

pub async fn find_by_id<C: ConnectionTrait>(conn: &C, id: Uuid) -> AppResult<Option<User>> {
    Users::find_by_id(id)
        .one(conn)
        .await?
        .map(user_from_entity)
        .transpose()
}

pub async fn find_by_phone<C: ConnectionTrait>(
    conn: &C,
    phone_number: &str,
) -> AppResult<Option<User>> {
    Users::find()
        .filter(UserCol::PhoneNumber.eq(phone_number))
        .filter(UserCol::Role.eq(Role::User.as_str()))
        .one(conn)
        .await?
        .map(user_from_entity)
        .transpose()
}

pub async fn find_by_username<C: ConnectionTrait>(
    conn: &C,
    username: &str,
) -> AppResult<Option<User>> {
    Users::find()
        .filter(UserCol::Username.eq(username))
        .filter(UserCol::Role.ne(Role::User.as_str()))
        .one(conn)
        .await?
        .map(user_from_entity)
        .transpose()
}

pub async fn create<C: ConnectionTrait>(conn: &C, fields: NewUser) -> AppResult<User> {
    let (name, account) = fields.into_account()?;

    let conflict = match &account {
        Account::Customer(customer) => find_by_phone(conn, &customer.phone_number)
            .await?
            .map(|_| "Phone number already registered"),
        Account::Staff(staff) => find_by_username(conn, &staff.username)
            .await?
            .map(|_| "Username already exists"),
    };
    if let Some(message) = conflict {
        return Err(AppError::Conflict(message.into()));
    }

    let now = Utc::now();
    let user = User {
        id: Uuid::new_v4(),
        name,
        created_at: now,
        last_login: now,
        account,
    };

    // A concurrent insert that slips past the lookup still trips the unique
    // column and surfaces as `AppError::Conflict`.
    let model = to_active(&user).insert(conn).await?;
    user_from_entity(model)
}

/// Existing customer for `phone_number`, or a freshly created one.
pub async fn find_or_create_customer<C: ConnectionTrait>(
    conn: &C,
    phone_number: &str,
    name: &str,
) -> AppResult<User> {
    if let Some(user) = find_by_phone(conn, phone_number).await? {
        return Ok(user);
    }

    match create(conn, NewUser::customer(name, phone_number)).await {
        Ok(user) => {
            tracing::info!(user_id = %user.id, "customer created");
            Ok(user)
        }
        Err(AppError::Conflict(_)) => find_by_phone(conn, phone_number)
            .await?
            .ok_or_else(|| AppError::Conflict("Phone number already registered".into())),
        Err(err) => Err(err),
    }
}

pub async fn save<C: ConnectionTrait>(conn: &C, user: &User) -> AppResult<User> {
    let model = to_active(user).update(conn).await?;
    user_from_entity(model)
}

pub async fn delete<C: ConnectionTrait>(conn: &C, id: Uuid) -> AppResult<()> {
    let result = Users::delete_by_id(id).exec(conn).await?;
    if result.rows_affected == 0 {
        return Err(AppError::NotFound);
    }
    Ok(())
}

pub async fn list_by_last_login<C: ConnectionTrait>(conn: &C) -> AppResult<Vec<User>> {
    Users::find()
        .order_by_desc(UserCol::LastLogin)
        .all(conn)
        .await?
        .into_iter()
        .map(user_from_entity)
        .collect()
}

/// Append `order_id` to the user's order history.
pub async fn append_order<C: ConnectionTrait>(
    conn: &C,
    user_id: Uuid,
    order_id: Uuid,
) -> AppResult<()> {
    UserOrderActive {
        id: Set(Uuid::new_v4()),
        user_id: Set(user_id),
        order_id: Set(order_id),
        created_at: Set(Utc::now().into()),
    }
    .insert(conn)
    .await?;
    Ok(())
}

/// Order ids in the user's history, oldest first.
pub async fn order_history<C: ConnectionTrait>(conn: &C, user_id: Uuid) -> AppResult<Vec<Uuid>> {
    let rows = UserOrders::find()
        .filter(UserOrderCol::UserId.eq(user_id))
        .order_by_asc(UserOrderCol::CreatedAt)
        .all(conn)
        .await?;
    Ok(rows.into_iter().map(|row| row.order_id).collect())
}

fn to_active(user: &User) -> UserActive {
    let mut active = UserActive {
        id: Set(user.id),
        role: Set(user.role().as_str().to_string()),
        name: Set(user.name.clone()),
        phone_number: Set(None),
        username: Set(None),
        password_hash: Set(None),
        is_verified: Set(user.is_verified()),
        verification_code: Set(None),
        verification_expiry: Set(None),
        created_at: Set(user.created_at.into()),
        last_login: Set(user.last_login.into()),
    };

    match &user.account {
        Account::Customer(customer) => {
            active.phone_number = Set(Some(customer.phone_number.clone()));
            if let Some(pending) = &customer.pending_code {
                active.verification_code = Set(Some(pending.code.clone()));
                active.verification_expiry = Set(Some(pending.expires_at.into()));
            }
        }
        Account::Staff(staff) => {
            active.username = Set(Some(staff.username.clone()));
            active.password_hash = Set(staff.password_hash.clone());
        }
    }

    active
}

pub(crate) fn user_from_entity(model: UserModel) -> AppResult<User> {
    let role = Role::parse(&model.role).ok_or_else(|| {
        AppError::Internal(anyhow::anyhow!("user {} has unknown role {}", model.id, model.role))
    })?;

    let account = match role {
        Role::User => {
            let phone_number = model.phone_number.ok_or_else(|| {
                AppError::Internal(anyhow::anyhow!("customer {} has no phone number", model.id))
            })?;
            let pending_code = match (model.verification_code, model.verification_expiry) {
                (Some(code), Some(expiry)) => Some(PendingCode {
                    code,
                    expires_at: expiry.with_timezone(&Utc),
                }),
                _ => None,
            };
            Account::Customer(CustomerAccount {
                phone_number,
                is_verified: model.is_verified,
                pending_code,
            })
        }
        Role::Staff | Role::Admin => {
            let username = model.username.ok_or_else(|| {
                AppError::Internal(anyhow::anyhow!("staff {} has no username", model.id))
            })?;
            Account::Staff(StaffAccount {
                role,
                username,
                password_hash: model.password_hash.filter(|hash| !hash.is_empty()),
            })
        }
    };

    Ok(User {
        id: model.id,
        name: model.name,
        created_at: model.created_at.with_timezone(&Utc),
        last_login: model.last_login.with_timezone(&Utc),
        account,
    })
}
