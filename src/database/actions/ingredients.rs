use crate::{
    error::ApiError,
    schema::{Ingredient, Uuid},
};

use sqlx::{PgConnection, Pool, Postgres};

/// Escapes LIKE wildcards so user input only ever matches literally.
fn like_pattern(search: &str) -> String {
    let escaped = search
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{escaped}%")
}

pub async fn list_ingredients(
    name: Option<&str>,
    pool: &Pool<Postgres>,
) -> Result<Vec<Ingredient>, ApiError> {
    let rows: Vec<Ingredient> = match name {
        Some(name) => {
            sqlx::query_as("SELECT * FROM ingredients WHERE name ILIKE $1 ORDER BY name, id")
                .bind(like_pattern(name))
                .fetch_all(pool)
                .await?
        }
        None => {
            sqlx::query_as("SELECT * FROM ingredients ORDER BY name, id")
                .fetch_all(pool)
                .await?
        }
    };

    Ok(rows)
}

pub async fn get_ingredient(
    id: Uuid,
    pool: &Pool<Postgres>,
) -> Result<Option<Ingredient>, ApiError> {
    let row: Option<Ingredient> = sqlx::query_as("SELECT * FROM ingredients WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await?;

    Ok(row)
}

/// Fails with not-found naming the first unknown ingredient id.
pub async fn ensure_ingredients_exist(
    ids: &[Uuid],
    conn: &mut PgConnection,
) -> Result<(), ApiError> {
    let found: Vec<(Uuid,)> = sqlx::query_as("SELECT id FROM ingredients WHERE id = ANY($1)")
        .bind(ids)
        .fetch_all(&mut *conn)
        .await?;

    if let Some(missing) = ids.iter().find(|id| !found.iter().any(|f| f.0 == **id)) {
        return Err(ApiError::NotFound(format!(
            "Ingredient with id {missing} not found."
        )));
    }

    Ok(())
}
