use crate::{
    error::ApiError,
    schema::{LinkedRecipeTag, Tag, Uuid},
};

use sqlx::{PgConnection, Pool, Postgres};

pub async fn get_tag(id: Uuid, pool: &Pool<Postgres>) -> Result<Option<Tag>, ApiError> {
    let tag: Option<Tag> = sqlx::query_as("SELECT * FROM tags WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await?;

    Ok(tag)
}

pub async fn list_tags(pool: &Pool<Postgres>) -> Result<Vec<Tag>, ApiError> {
    let list: Vec<Tag> = sqlx::query_as("SELECT * FROM tags ORDER BY id")
        .fetch_all(pool)
        .await?;

    Ok(list)
}

/// Tags of many recipes at once, in tag id order.
pub async fn list_recipe_tags(
    recipe_ids: &[Uuid],
    pool: &Pool<Postgres>,
) -> Result<Vec<LinkedRecipeTag>, ApiError> {
    let list: Vec<LinkedRecipeTag> = sqlx::query_as(
        "
        SELECT rt.recipe_id AS recipe_id, t.id AS id, t.name AS name, t.color AS color, t.slug AS slug
        FROM recipe_tags rt
        INNER JOIN tags t ON t.id = rt.tag_id
        WHERE rt.recipe_id = ANY($1)
        ORDER BY t.id
    ",
    )
    .bind(recipe_ids)
    .fetch_all(pool)
    .await?;

    Ok(list)
}

/// Fails with a validation error naming the first unknown tag id.
pub async fn ensure_tags_exist(ids: &[Uuid], conn: &mut PgConnection) -> Result<(), ApiError> {
    let found: Vec<(Uuid,)> = sqlx::query_as("SELECT id FROM tags WHERE id = ANY($1)")
        .bind(ids)
        .fetch_all(&mut *conn)
        .await?;

    if let Some(missing) = ids.iter().find(|id| !found.iter().any(|f| f.0 == **id)) {
        return Err(ApiError::validation(
            "tags",
            format!("Invalid pk \"{missing}\" - object does not exist."),
        ));
    }

    Ok(())
}

/// Replaces the tag set of a recipe.
pub async fn set_recipe_tags(
    recipe_id: Uuid,
    tag_ids: &[Uuid],
    conn: &mut PgConnection,
) -> Result<(), ApiError> {
    sqlx::query("DELETE FROM recipe_tags WHERE recipe_id = $1 AND NOT (tag_id = ANY($2))")
        .bind(recipe_id)
        .bind(tag_ids)
        .execute(&mut *conn)
        .await?;

    sqlx::query(
        "
        INSERT INTO recipe_tags (recipe_id, tag_id)
        SELECT $1, tag_id FROM UNNEST($2::INTEGER[]) AS tag_id
        ON CONFLICT DO NOTHING
    ",
    )
    .bind(recipe_id)
    .bind(tag_ids)
    .execute(&mut *conn)
    .await?;

    Ok(())
}
