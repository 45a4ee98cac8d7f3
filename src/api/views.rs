//! Read representations. Write shapes live in [`crate::form`].

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::{
    actions::{
        collection_members, followed_among, get_users_by_ids, list_author_recipes,
        list_recipe_parts, list_recipe_tags, RecipeCollection,
    },
    error::ApiError,
    jwt::SessionData,
    media::image_url,
    schema::{Recipe, RecipePart, Tag, User, Uuid},
};

use super::state::State;

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct UserView {
    pub email: String,
    pub id: Uuid,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub is_subscribed: bool,
}

impl UserView {
    pub fn new(user: &User, is_subscribed: bool) -> Self {
        Self {
            email: user.email.to_owned(),
            id: user.id,
            username: user.username.to_owned(),
            first_name: user.first_name.to_owned(),
            last_name: user.last_name.to_owned(),
            is_subscribed,
        }
    }
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct RecipeIngredientView {
    pub id: Uuid,
    pub name: String,
    pub measurement_unit: String,
    pub amount: i32,
}

impl From<RecipePart> for RecipeIngredientView {
    fn from(value: RecipePart) -> Self {
        Self {
            id: value.ingredient_id,
            name: value.name,
            measurement_unit: value.measurement_unit,
            amount: value.amount,
        }
    }
}

#[derive(Serialize, Debug, Clone)]
pub struct RecipeView {
    pub id: Uuid,
    pub tags: Vec<Tag>,
    pub author: UserView,
    pub ingredients: Vec<RecipeIngredientView>,
    pub is_favorited: bool,
    pub is_in_shopping_cart: bool,
    pub name: String,
    pub image: String,
    pub text: String,
    pub cooking_time: i32,
    pub pub_date: DateTime<Utc>,
}

/// Short form returned by toggles and subscription previews.
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct RecipeSummary {
    pub id: Uuid,
    pub name: String,
    pub image: String,
    pub cooking_time: i32,
}

impl RecipeSummary {
    pub fn new(recipe: &Recipe, media_url: &str) -> Self {
        Self {
            id: recipe.id,
            name: recipe.name.to_owned(),
            image: image_url(media_url, &recipe.image),
            cooking_time: recipe.cooking_time,
        }
    }
}

#[derive(Serialize, Debug, Clone)]
pub struct SubscriptionView {
    #[serde(flatten)]
    pub user: UserView,
    pub recipes: Vec<RecipeSummary>,
    pub recipes_count: i64,
}

fn unique_ids(ids: impl Iterator<Item = Uuid>) -> Vec<Uuid> {
    let mut seen = HashSet::new();
    ids.filter(|id| seen.insert(*id)).collect()
}

async fn member_set(
    collection: RecipeCollection,
    viewer: Option<&SessionData>,
    recipe_ids: &[Uuid],
    state: &State,
) -> Result<HashSet<Uuid>, ApiError> {
    match viewer {
        Some(session) => {
            collection_members(collection, session.user_id, recipe_ids, &state.pool).await
        }
        None => Ok(HashSet::new()),
    }
}

/// Expands recipe rows into full views with a fixed number of queries.
pub async fn recipe_views(
    recipes: Vec<Recipe>,
    viewer: Option<&SessionData>,
    state: &State,
) -> Result<Vec<RecipeView>, ApiError> {
    if recipes.is_empty() {
        return Ok(vec![]);
    }

    let pool = &state.pool;
    let recipe_ids: Vec<Uuid> = recipes.iter().map(|r| r.id).collect();
    let author_ids = unique_ids(recipes.iter().map(|r| r.author_id));

    let mut tags: HashMap<Uuid, Vec<Tag>> = HashMap::new();
    for tag in list_recipe_tags(&recipe_ids, pool).await? {
        tags.entry(tag.recipe_id).or_default().push(tag.into());
    }

    let mut parts: HashMap<Uuid, Vec<RecipeIngredientView>> = HashMap::new();
    for part in list_recipe_parts(&recipe_ids, pool).await? {
        parts.entry(part.recipe_id).or_default().push(part.into());
    }

    let authors: HashMap<Uuid, User> = get_users_by_ids(&author_ids, pool)
        .await?
        .into_iter()
        .map(|u| (u.id, u))
        .collect();

    let followed = match viewer {
        Some(session) => followed_among(session.user_id, &author_ids, pool).await?,
        None => HashSet::new(),
    };
    let favorites = member_set(RecipeCollection::Favorites, viewer, &recipe_ids, state).await?;
    let cart = member_set(RecipeCollection::ShoppingCart, viewer, &recipe_ids, state).await?;

    recipes
        .into_iter()
        .map(|recipe| {
            let author = authors
                .get(&recipe.author_id)
                .ok_or_else(|| ApiError::Internal(format!("Author of recipe {} vanished", recipe.id)))?;

            Ok::<_, ApiError>(RecipeView {
                id: recipe.id,
                tags: tags.remove(&recipe.id).unwrap_or_default(),
                author: UserView::new(author, followed.contains(&author.id)),
                ingredients: parts.remove(&recipe.id).unwrap_or_default(),
                is_favorited: favorites.contains(&recipe.id),
                is_in_shopping_cart: cart.contains(&recipe.id),
                image: image_url(state.media_url(), &recipe.image),
                name: recipe.name,
                text: recipe.text,
                cooking_time: recipe.cooking_time,
                pub_date: recipe.pub_date,
            })
        })
        .collect()
}

pub async fn recipe_view(
    recipe: Recipe,
    viewer: Option<&SessionData>,
    state: &State,
) -> Result<RecipeView, ApiError> {
    recipe_views(vec![recipe], viewer, state)
        .await?
        .pop()
        .ok_or_else(|| ApiError::Internal("Recipe view was not built".to_string()))
}

pub async fn user_views(
    users: Vec<User>,
    viewer: Option<&SessionData>,
    state: &State,
) -> Result<Vec<UserView>, ApiError> {
    let followed = match viewer {
        Some(session) => {
            let ids: Vec<Uuid> = users.iter().map(|u| u.id).collect();
            followed_among(session.user_id, &ids, &state.pool).await?
        }
        None => HashSet::new(),
    };

    Ok(users
        .iter()
        .map(|user| UserView::new(user, followed.contains(&user.id)))
        .collect())
}

/// Followed authors with their recipe previews; the viewer follows all of them.
pub async fn subscription_views(
    users: Vec<User>,
    state: &State,
) -> Result<Vec<SubscriptionView>, ApiError> {
    let ids: Vec<Uuid> = users.iter().map(|u| u.id).collect();
    let mut recipes = list_author_recipes(&ids, &state.pool).await?;

    Ok(users
        .iter()
        .map(|user| {
            let own = recipes.remove(&user.id).unwrap_or_default();
            SubscriptionView {
                user: UserView::new(user, true),
                recipes_count: own.len() as i64,
                recipes: own
                    .iter()
                    .map(|r| RecipeSummary::new(r, state.media_url()))
                    .collect(),
            }
        })
        .collect())
}
