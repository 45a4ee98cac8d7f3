use std::collections::{HashMap, HashSet};

use crate::{
    authentication::permissions::ActionType,
    error::ApiError,
    jwt::SessionData,
    pagination::{PageContext, PageRequest},
    schema::{Recipe, User, UserRowPartial, Uuid},
};

use super::{collections::toggle_outcome, users::get_user_by_id};
use sqlx::{Pool, Postgres};

fn refuse_self(follow_id: Uuid, session: &SessionData) -> Result<(), ApiError> {
    if follow_id == session.user_id {
        return Err(ApiError::validation("errors", "You can not follow yourself!"));
    }
    Ok(())
}

pub async fn subscribe(
    follow_id: Uuid,
    session: &SessionData,
    pool: &Pool<Postgres>,
) -> Result<User, ApiError> {
    session.authenticate(ActionType::ManageOwnSubscriptions)?;
    refuse_self(follow_id, session)?;

    let follow = get_user_by_id(pool, follow_id)
        .await?
        .ok_or_else(|| ApiError::not_found("User"))?;

    let result = sqlx::query(
        "INSERT INTO subscriptions (follow_id, follower_id) VALUES ($1, $2) ON CONFLICT DO NOTHING",
    )
    .bind(follow_id)
    .bind(session.user_id)
    .execute(pool)
    .await?;

    toggle_outcome(result.rows_affected(), || {
        format!("User {} is already followed by {}", follow.username, session.username)
    })?;

    log::debug!("> {} follows {}", session.username, follow.username);
    Ok(follow)
}

pub async fn unsubscribe(
    follow_id: Uuid,
    session: &SessionData,
    pool: &Pool<Postgres>,
) -> Result<(), ApiError> {
    session.authenticate(ActionType::ManageOwnSubscriptions)?;
    refuse_self(follow_id, session)?;

    let follow = get_user_by_id(pool, follow_id)
        .await?
        .ok_or_else(|| ApiError::not_found("User"))?;

    let result = sqlx::query("DELETE FROM subscriptions WHERE follow_id = $1 AND follower_id = $2")
        .bind(follow_id)
        .bind(session.user_id)
        .execute(pool)
        .await?;

    toggle_outcome(result.rows_affected(), || {
        format!("User {} is not followed by {}", follow.username, session.username)
    })?;

    log::debug!("> {} unfollowed {}", session.username, follow.username);
    Ok(())
}

/// Authors followed by the session user, in subscription order.
pub async fn fetch_subscriptions(
    session: &SessionData,
    page: PageRequest,
    pool: &Pool<Postgres>,
) -> Result<PageContext<User>, ApiError> {
    let rows: Vec<UserRowPartial> = sqlx::query_as(
        "
        SELECT u.*, COUNT(*) OVER() AS count
        FROM subscriptions s
        INNER JOIN users u ON u.id = s.follow_id
        WHERE s.follower_id = $1
        ORDER BY s.id
        LIMIT $2 OFFSET $3
    ",
    )
    .bind(session.user_id)
    .bind(page.limit)
    .bind(page.offset())
    .fetch_all(pool)
    .await?;

    let total_count = match rows.first() {
        Some(row) => row.count,
        None => {
            let count: (i64,) =
                sqlx::query_as("SELECT COUNT(*) FROM subscriptions WHERE follower_id = $1")
                    .bind(session.user_id)
                    .fetch_one(pool)
                    .await?;
            count.0
        }
    };

    let rows: Vec<User> = rows.into_iter().map(User::from).collect();
    Ok(PageContext::from_rows(rows, total_count, page))
}

/// Which of `author_ids` the user follows.
pub async fn followed_among(
    follower_id: Uuid,
    author_ids: &[Uuid],
    pool: &Pool<Postgres>,
) -> Result<HashSet<Uuid>, ApiError> {
    let rows: Vec<(Uuid,)> = sqlx::query_as(
        "SELECT follow_id FROM subscriptions WHERE follower_id = $1 AND follow_id = ANY($2)",
    )
    .bind(follower_id)
    .bind(author_ids)
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().map(|r| r.0).collect())
}

/// Recipes of many authors grouped by author, newest first.
pub async fn list_author_recipes(
    author_ids: &[Uuid],
    pool: &Pool<Postgres>,
) -> Result<HashMap<Uuid, Vec<Recipe>>, ApiError> {
    let rows: Vec<Recipe> = sqlx::query_as(
        "SELECT * FROM recipes WHERE author_id = ANY($1) ORDER BY pub_date DESC, id DESC",
    )
    .bind(author_ids)
    .fetch_all(pool)
    .await?;

    let mut hashmap: HashMap<Uuid, Vec<Recipe>> = HashMap::new();
    rows.into_iter()
        .for_each(|recipe| hashmap.entry(recipe.author_id).or_default().push(recipe));

    Ok(hashmap)
}
