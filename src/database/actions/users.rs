use crate::{
    authentication::{
        cryptography::{hash_password, verify_password},
        jwt::{generate_jwt_session, SessionData},
    },
    error::ApiError,
    form::{LoginForm, PasswordChange, UserWrite},
    pagination::{PageContext, PageRequest},
    schema::{User, UserRowPartial, Uuid},
};

use sqlx::{Pool, Postgres};

pub async fn get_user(pool: &Pool<Postgres>, email: &str) -> Result<Option<User>, ApiError> {
    let row: Option<User> = sqlx::query_as("SELECT * FROM users WHERE LOWER(email) = LOWER($1)")
        .bind(email)
        .fetch_optional(pool)
        .await?;

    Ok(row)
}

pub async fn get_user_by_id(pool: &Pool<Postgres>, user_id: Uuid) -> Result<Option<User>, ApiError> {
    let row: Option<User> = sqlx::query_as("SELECT * FROM users WHERE id = $1")
        .bind(user_id)
        .fetch_optional(pool)
        .await?;

    Ok(row)
}

pub async fn fetch_users(
    page: PageRequest,
    pool: &Pool<Postgres>,
) -> Result<PageContext<User>, ApiError> {
    let rows: Vec<UserRowPartial> =
        sqlx::query_as("SELECT u.*, COUNT(*) OVER() AS count FROM users u ORDER BY u.id LIMIT $1 OFFSET $2")
            .bind(page.limit)
            .bind(page.offset())
            .fetch_all(pool)
            .await?;

    let total_count = match rows.first() {
        Some(row) => row.count,
        None => {
            let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM users")
                .fetch_one(pool)
                .await?;
            count.0
        }
    };

    let rows: Vec<User> = rows.into_iter().map(User::from).collect();
    Ok(PageContext::from_rows(rows, total_count, page))
}

/// Creates a user from a registration form, storing the argon2 hash of the password.
pub async fn register_user(form: &UserWrite, pool: &Pool<Postgres>) -> Result<User, ApiError> {
    form.validate()?;
    let password = hash_password(&form.password)?;

    let user: Option<User> = sqlx::query_as(
        "
        INSERT INTO users (email, username, first_name, last_name, password)
        VALUES ($1, $2, $3, $4, $5)
        ON CONFLICT DO NOTHING RETURNING *;
    ",
    )
    .bind(form.email.trim())
    .bind(&form.username)
    .bind(&form.first_name)
    .bind(&form.last_name)
    .bind(password)
    .fetch_optional(pool)
    .await?;

    match user {
        Some(user) => {
            log::info!("Registered user {} ({})", user.username, user.id);
            Ok(user)
        }
        None => Err(ApiError::validation(
            "username",
            "A user with that email or username already exists",
        )),
    }
}

pub async fn login_user(
    form: &LoginForm,
    secret: &str,
    pool: &Pool<Postgres>,
) -> Result<String, ApiError> {
    let invalid = || ApiError::validation("non_field_errors", "Invalid credentials");

    let user = get_user(pool, form.email.trim()).await?.ok_or_else(invalid)?;

    if !verify_password(&form.password, &user.password)? {
        log::debug!("> Failed login for {}", user.username);
        return Err(invalid());
    }

    generate_jwt_session(&user, secret)
}

/// Replaces the caller's password after checking the current one.
pub async fn set_password(
    form: &PasswordChange,
    session: &SessionData,
    pool: &Pool<Postgres>,
) -> Result<(), ApiError> {
    form.validate()?;

    let user = get_user_by_id(pool, session.user_id)
        .await?
        .ok_or(ApiError::Unauthorized)?;

    if !verify_password(&form.current_password, &user.password)? {
        return Err(ApiError::validation("current_password", "Invalid password"));
    }

    let password = hash_password(&form.new_password)?;
    sqlx::query("UPDATE users SET password = $1 WHERE id = $2")
        .bind(password)
        .bind(user.id)
        .execute(pool)
        .await?;

    log::info!("{} changed their password", user.username);
    Ok(())
}

pub async fn get_users_by_ids(
    user_ids: &[Uuid],
    pool: &Pool<Postgres>,
) -> Result<Vec<User>, ApiError> {
    let rows: Vec<User> = sqlx::query_as("SELECT * FROM users WHERE id = ANY($1)")
        .bind(user_ids)
        .fetch_all(pool)
        .await?;

    Ok(rows)
}
