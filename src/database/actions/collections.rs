use std::collections::HashSet;

use crate::{
    authentication::permissions::ActionType,
    error::ApiError,
    jwt::SessionData,
    schema::{CartPart, Recipe, Uuid},
    shopping_list::ShoppingList,
};

use super::recipes::get_recipe;
use sqlx::{Pool, Postgres};

/// Per-user recipe sets that are toggled on and off.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecipeCollection {
    Favorites,
    ShoppingCart,
}

impl RecipeCollection {
    fn table(self) -> &'static str {
        match self {
            RecipeCollection::Favorites => "favorites",
            RecipeCollection::ShoppingCart => "shopping_cart",
        }
    }

    fn action(self) -> ActionType {
        match self {
            RecipeCollection::Favorites => ActionType::ManageOwnFavorites,
            RecipeCollection::ShoppingCart => ActionType::ManageOwnCart,
        }
    }

    fn label(self) -> &'static str {
        match self {
            RecipeCollection::Favorites => "favorites",
            RecipeCollection::ShoppingCart => "shopping cart",
        }
    }
}

/// Maps the affected row count of a toggle statement to its outcome.
pub fn toggle_outcome(rows_affected: u64, conflict: impl FnOnce() -> String) -> Result<(), ApiError> {
    if rows_affected == 0 {
        return Err(ApiError::Conflict(conflict()));
    }
    Ok(())
}

pub async fn add_to_collection(
    collection: RecipeCollection,
    recipe_id: Uuid,
    session: &SessionData,
    pool: &Pool<Postgres>,
) -> Result<Recipe, ApiError> {
    session.authenticate(collection.action())?;

    let recipe = get_recipe(recipe_id, pool)
        .await?
        .ok_or_else(|| ApiError::not_found("Recipe"))?;

    let result = sqlx::query(&format!(
        "INSERT INTO {} (user_id, recipe_id) VALUES ($1, $2) ON CONFLICT DO NOTHING",
        collection.table()
    ))
    .bind(session.user_id)
    .bind(recipe_id)
    .execute(pool)
    .await?;

    toggle_outcome(result.rows_affected(), || {
        format!(
            "Recipe '{}' is already in the {} of {}",
            recipe.name,
            collection.label(),
            session.username
        )
    })?;

    log::debug!("> {} added recipe {recipe_id} to {}", session.username, collection.label());
    Ok(recipe)
}

pub async fn remove_from_collection(
    collection: RecipeCollection,
    recipe_id: Uuid,
    session: &SessionData,
    pool: &Pool<Postgres>,
) -> Result<(), ApiError> {
    session.authenticate(collection.action())?;

    let recipe = get_recipe(recipe_id, pool)
        .await?
        .ok_or_else(|| ApiError::not_found("Recipe"))?;

    let result = sqlx::query(&format!(
        "DELETE FROM {} WHERE user_id = $1 AND recipe_id = $2",
        collection.table()
    ))
    .bind(session.user_id)
    .bind(recipe_id)
    .execute(pool)
    .await?;

    toggle_outcome(result.rows_affected(), || {
        format!(
            "Recipe '{}' is not in the {} of {}",
            recipe.name,
            collection.label(),
            session.username
        )
    })?;

    log::debug!("> {} removed recipe {recipe_id} from {}", session.username, collection.label());
    Ok(())
}

/// Which of `recipe_ids` are in the user's collection.
pub async fn collection_members(
    collection: RecipeCollection,
    user_id: Uuid,
    recipe_ids: &[Uuid],
    pool: &Pool<Postgres>,
) -> Result<HashSet<Uuid>, ApiError> {
    let rows: Vec<(Uuid,)> = sqlx::query_as(&format!(
        "SELECT recipe_id FROM {} WHERE user_id = $1 AND recipe_id = ANY($2)",
        collection.table()
    ))
    .bind(user_id)
    .bind(recipe_ids)
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().map(|r| r.0).collect())
}

pub async fn list_cart_parts(
    session: &SessionData,
    pool: &Pool<Postgres>,
) -> Result<Vec<CartPart>, ApiError> {
    let rows: Vec<CartPart> = sqlx::query_as("
        SELECT i.id AS ingredient_id, i.name AS name, i.measurement_unit AS measurement_unit, ri.amount AS amount
        FROM shopping_cart sc
        INNER JOIN recipe_ingredients ri ON ri.recipe_id = sc.recipe_id
        INNER JOIN ingredients i ON i.id = ri.ingredient_id
        WHERE sc.user_id = $1
        ORDER BY sc.pub_date DESC, sc.id DESC, ri.id
    ")
    .bind(session.user_id)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

pub async fn shopping_list(
    session: &SessionData,
    pool: &Pool<Postgres>,
) -> Result<ShoppingList, ApiError> {
    session.authenticate(ActionType::ManageOwnCart)?;

    let parts = list_cart_parts(session, pool).await?;
    let list = ShoppingList::from_parts(parts);

    log::debug!(
        "> Shopping list of {} has {} items",
        session.username,
        list.items().len()
    );
    Ok(list)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_rows_is_a_conflict() {
        assert!(matches!(
            toggle_outcome(0, || "already there".to_string()),
            Err(ApiError::Conflict(msg)) if msg == "already there"
        ));
        assert!(toggle_outcome(1, || unreachable!()).is_ok());
    }

    #[test]
    fn collections_map_to_their_tables() {
        assert_eq!(RecipeCollection::Favorites.table(), "favorites");
        assert_eq!(RecipeCollection::ShoppingCart.table(), "shopping_cart");
        assert_eq!(
            RecipeCollection::ShoppingCart.action(),
            ActionType::ManageOwnCart
        );
    }
}
