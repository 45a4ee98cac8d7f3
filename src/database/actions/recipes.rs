use crate::{
    authentication::permissions::{authorize_recipe_change, ActionType},
    error::ApiError,
    form::{IngredientAmount, IngredientDiff, RecipeWrite},
    jwt::SessionData,
    pagination::{PageContext, PageRequest},
    schema::{Recipe, RecipePart, RecipeRowPartial, Uuid},
};

use super::{
    ingredients::ensure_ingredients_exist,
    tags::{ensure_tags_exist, set_recipe_tags},
};
use sqlx::{PgConnection, Pool, Postgres, QueryBuilder};

/// List filters of the recipe collection.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct RecipeFilter {
    pub author: Option<Uuid>,
    pub tags: Vec<String>,
    pub is_favorited: Option<bool>,
    pub is_in_shopping_cart: Option<bool>,
}

impl RecipeFilter {
    pub fn push_conditions(&self, query: &mut QueryBuilder<'_, Postgres>, user_id: Option<Uuid>) {
        if let Some(author) = self.author {
            query.push(" AND r.author_id = ").push_bind(author);
        }

        if !self.tags.is_empty() {
            query
                .push(
                    " AND EXISTS (SELECT 1 FROM recipe_tags rt INNER JOIN tags t ON t.id = rt.tag_id WHERE rt.recipe_id = r.id AND t.slug = ANY(",
                )
                .push_bind(self.tags.clone())
                .push("))");
        }

        push_membership(query, "favorites", self.is_favorited, user_id);
        push_membership(query, "shopping_cart", self.is_in_shopping_cart, user_id);
    }
}

// An anonymous requester has empty sets: "in" matches nothing, "not in" everything.
fn push_membership(
    query: &mut QueryBuilder<'_, Postgres>,
    table: &'static str,
    flag: Option<bool>,
    user_id: Option<Uuid>,
) {
    match (flag, user_id) {
        (None, _) | (Some(false), None) => {}
        (Some(true), None) => {
            query.push(" AND FALSE");
        }
        (Some(included), Some(user_id)) => {
            let negation = if included { "" } else { "NOT " };
            query
                .push(format!(
                    " AND {negation}EXISTS (SELECT 1 FROM {table} m WHERE m.recipe_id = r.id AND m.user_id = "
                ))
                .push_bind(user_id)
                .push(")");
        }
    }
}

fn recipe_list_query<'a>(
    filter: &RecipeFilter,
    page: PageRequest,
    user_id: Option<Uuid>,
) -> QueryBuilder<'a, Postgres> {
    let mut query =
        QueryBuilder::new("SELECT r.*, COUNT(*) OVER() AS count FROM recipes r WHERE TRUE");
    filter.push_conditions(&mut query, user_id);
    query
        .push(" ORDER BY r.pub_date DESC, r.id DESC LIMIT ")
        .push_bind(page.limit)
        .push(" OFFSET ")
        .push_bind(page.offset());
    query
}

pub async fn fetch_recipes(
    filter: &RecipeFilter,
    page: PageRequest,
    session: Option<&SessionData>,
    pool: &Pool<Postgres>,
) -> Result<PageContext<Recipe>, ApiError> {
    let user_id = session.map(|s| s.user_id);

    let rows: Vec<RecipeRowPartial> = recipe_list_query(filter, page, user_id)
        .build_query_as()
        .fetch_all(pool)
        .await?;

    let total_count = match rows.first() {
        Some(row) => row.count,
        // past the last page the window count is lost
        None if page.page > 1 => count_recipes(filter, user_id, pool).await?,
        None => 0,
    };

    let rows: Vec<Recipe> = rows.into_iter().map(Recipe::from).collect();
    Ok(PageContext::from_rows(rows, total_count, page))
}

async fn count_recipes(
    filter: &RecipeFilter,
    user_id: Option<Uuid>,
    pool: &Pool<Postgres>,
) -> Result<i64, ApiError> {
    let mut query = QueryBuilder::new("SELECT COUNT(*) FROM recipes r WHERE TRUE");
    filter.push_conditions(&mut query, user_id);

    let count: (i64,) = query.build_query_as().fetch_one(pool).await?;
    Ok(count.0)
}

pub async fn get_recipe(id: Uuid, pool: &Pool<Postgres>) -> Result<Option<Recipe>, ApiError> {
    let row: Option<Recipe> = sqlx::query_as("SELECT * FROM recipes WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await?;

    Ok(row)
}

/// Loads a recipe the session is allowed to change.
pub async fn get_recipe_mut(
    id: Uuid,
    session: &SessionData,
    pool: &Pool<Postgres>,
) -> Result<Recipe, ApiError> {
    match get_recipe(id, pool).await? {
        Some(recipe) => {
            authorize_recipe_change(session, recipe.author_id)?;
            Ok(recipe)
        }
        None => Err(ApiError::not_found("Recipe")),
    }
}

pub async fn list_recipe_parts(
    recipe_ids: &[Uuid],
    pool: &Pool<Postgres>,
) -> Result<Vec<RecipePart>, ApiError> {
    let rows: Vec<RecipePart> = sqlx::query_as("
        SELECT ri.recipe_id AS recipe_id, i.id AS ingredient_id, i.name AS name, i.measurement_unit AS measurement_unit, ri.amount AS amount
        FROM recipe_ingredients ri
        INNER JOIN ingredients i ON i.id = ri.ingredient_id
        WHERE ri.recipe_id = ANY($1)
        ORDER BY ri.id
    ")
    .bind(recipe_ids)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

async fn upsert_recipe_parts(
    recipe_id: Uuid,
    parts: &[IngredientAmount],
    conn: &mut PgConnection,
) -> Result<(), ApiError> {
    if parts.is_empty() {
        return Ok(());
    }

    let mut query =
        QueryBuilder::<Postgres>::new("INSERT INTO recipe_ingredients (recipe_id, ingredient_id, amount) ");
    query.push_values(parts, |mut row, part| {
        row.push_bind(recipe_id)
            .push_bind(part.id)
            .push_bind(part.amount);
    });
    query.push(" ON CONFLICT (recipe_id, ingredient_id) DO UPDATE SET amount = EXCLUDED.amount");

    query.build().execute(&mut *conn).await?;
    Ok(())
}

/// Creates a recipe with its tags and ingredients, all or nothing.
pub async fn create_recipe(
    form: &RecipeWrite,
    image: &str,
    session: &SessionData,
    pool: &Pool<Postgres>,
) -> Result<Uuid, ApiError> {
    session.authenticate(ActionType::CreateRecipes)?;
    form.validate()?;

    let mut tx = pool.begin().await?;

    ensure_tags_exist(&form.tags, &mut tx).await?;
    ensure_ingredients_exist(&form.ingredient_ids(), &mut tx).await?;

    let id: (Uuid,) = sqlx::query_as(
        "
        INSERT INTO recipes (author_id, name, text, cooking_time, image)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING id
    ",
    )
    .bind(session.user_id)
    .bind(form.name.trim())
    .bind(&form.text)
    .bind(form.cooking_time)
    .bind(image)
    .fetch_one(&mut *tx)
    .await?;

    set_recipe_tags(id.0, &form.tags, &mut tx).await?;
    upsert_recipe_parts(id.0, &form.ingredients, &mut tx).await?;

    tx.commit().await?;

    log::info!(
        "{} created recipe {} with {} ingredients",
        session.username,
        id.0,
        form.ingredients.len()
    );
    Ok(id.0)
}

/// Rewrites a recipe in place; `image` of `None` keeps the current one.
pub async fn update_recipe(
    recipe_id: Uuid,
    form: &RecipeWrite,
    image: Option<&str>,
    pool: &Pool<Postgres>,
) -> Result<(), ApiError> {
    form.validate()?;

    let mut tx = pool.begin().await?;

    ensure_tags_exist(&form.tags, &mut tx).await?;
    ensure_ingredients_exist(&form.ingredient_ids(), &mut tx).await?;

    let updated = sqlx::query(
        "UPDATE recipes SET name = $1, text = $2, cooking_time = $3, image = COALESCE($4, image) WHERE id = $5",
    )
    .bind(form.name.trim())
    .bind(&form.text)
    .bind(form.cooking_time)
    .bind(image)
    .bind(recipe_id)
    .execute(&mut *tx)
    .await?;

    if updated.rows_affected() == 0 {
        return Err(ApiError::not_found("Recipe"));
    }

    set_recipe_tags(recipe_id, &form.tags, &mut tx).await?;

    let existing: Vec<(Uuid, i32)> = sqlx::query_as(
        "SELECT ingredient_id, amount FROM recipe_ingredients WHERE recipe_id = $1 FOR UPDATE",
    )
    .bind(recipe_id)
    .fetch_all(&mut *tx)
    .await?;

    let diff = IngredientDiff::compute(&existing, &form.ingredients);
    log::debug!(
        "> Recipe {recipe_id}: {} upserted, {} removed, {} retained",
        diff.upsert.len(),
        diff.remove.len(),
        diff.retained.len()
    );

    if !diff.is_empty() {
        sqlx::query("DELETE FROM recipe_ingredients WHERE recipe_id = $1 AND ingredient_id = ANY($2)")
            .bind(recipe_id)
            .bind(&diff.remove)
            .execute(&mut *tx)
            .await?;
        upsert_recipe_parts(recipe_id, &diff.upsert, &mut tx).await?;
    }

    tx.commit().await?;
    Ok(())
}

pub async fn delete_recipe(recipe_id: Uuid, pool: &Pool<Postgres>) -> Result<(), ApiError> {
    let result = sqlx::query("DELETE FROM recipes WHERE id = $1")
        .bind(recipe_id)
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(ApiError::not_found("Recipe"));
    }

    Ok(())
}
