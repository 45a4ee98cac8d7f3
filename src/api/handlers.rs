use serde_json::json;
use warp::{
    http::{header, StatusCode},
    reply::{self, Reply, Response},
    Rejection,
};

use crate::{
    actions,
    actions::RecipeCollection,
    constants::{SHOPPING_LIST_FILENAME, SUBSCRIPTION_COUNT_PER_PAGE, USER_COUNT_PER_PAGE},
    error::ApiError,
    form::{LoginForm, PasswordChange, RecipeWrite, UserWrite},
    jwt::SessionData,
    media::{remove_image, store_image},
    pagination::PageRequest,
    permissions::ActionType,
    schema::{Recipe, Uuid},
};

use super::{
    query::{ingredient_search, page_request, QueryPairs, RecipeQuery},
    state::State,
    views::{recipe_view, recipe_views, subscription_views, user_views, RecipeSummary, UserView},
};

fn created(body: &impl serde::Serialize) -> Response {
    reply::with_status(reply::json(body), StatusCode::CREATED).into_response()
}

fn no_content() -> Response {
    StatusCode::NO_CONTENT.into_response()
}

fn fixed_page(pairs: &[(String, String)], limit: i64) -> PageRequest {
    let page = page_request(pairs);
    match pairs.iter().any(|(k, _)| k == "limit") {
        true => page,
        false => PageRequest { limit, ..page },
    }
}

async fn reload_recipe(id: Uuid, state: &State) -> Result<Recipe, ApiError> {
    actions::get_recipe(id, &state.pool)
        .await?
        .ok_or_else(|| ApiError::not_found("Recipe"))
}

// Tags and ingredients

pub async fn list_tags(state: State) -> Result<Response, Rejection> {
    let tags = actions::list_tags(&state.pool).await?;
    Ok(reply::json(&tags).into_response())
}

pub async fn get_tag(id: Uuid, state: State) -> Result<Response, Rejection> {
    let tag = actions::get_tag(id, &state.pool)
        .await?
        .ok_or_else(|| ApiError::not_found("Tag"))?;
    Ok(reply::json(&tag).into_response())
}

pub async fn list_ingredients(query: QueryPairs, state: State) -> Result<Response, Rejection> {
    let ingredients = actions::list_ingredients(ingredient_search(&query), &state.pool).await?;
    Ok(reply::json(&ingredients).into_response())
}

pub async fn get_ingredient(id: Uuid, state: State) -> Result<Response, Rejection> {
    let ingredient = actions::get_ingredient(id, &state.pool)
        .await?
        .ok_or_else(|| ApiError::not_found("Ingredient"))?;
    Ok(reply::json(&ingredient).into_response())
}

// Recipes

pub async fn list_recipes(
    query: QueryPairs,
    session: Option<SessionData>,
    state: State,
) -> Result<Response, Rejection> {
    let query = RecipeQuery::from_pairs(&query)?;
    let mut page = actions::fetch_recipes(&query.filter, query.page, session.as_ref(), &state.pool).await?;

    let views = recipe_views(std::mem::take(&mut page.results), session.as_ref(), &state).await?;
    Ok(reply::json(&page.with_results(views)).into_response())
}

pub async fn get_recipe(
    id: Uuid,
    session: Option<SessionData>,
    state: State,
) -> Result<Response, Rejection> {
    let recipe = reload_recipe(id, &state).await?;
    let view = recipe_view(recipe, session.as_ref(), &state).await?;
    Ok(reply::json(&view).into_response())
}

pub async fn create_recipe(
    session: SessionData,
    form: RecipeWrite,
    state: State,
) -> Result<Response, Rejection> {
    session.authenticate(ActionType::CreateRecipes)?;
    form.validate()?;

    let image = match form.image.as_deref() {
        Some(image) if !image.trim().is_empty() => image,
        _ => return Err(ApiError::validation("image", "This field is required.").into()),
    };
    let stored = store_image(&state.config.media_root, image).await?;

    let id = match actions::create_recipe(&form, &stored, &session, &state.pool).await {
        Ok(id) => id,
        Err(e) => {
            remove_image(&state.config.media_root, &stored).await;
            return Err(e.into());
        }
    };

    let recipe = reload_recipe(id, &state).await?;
    let view = recipe_view(recipe, Some(&session), &state).await?;
    Ok(created(&view))
}

pub async fn update_recipe(
    id: Uuid,
    session: SessionData,
    form: RecipeWrite,
    state: State,
) -> Result<Response, Rejection> {
    let current = actions::get_recipe_mut(id, &session, &state.pool).await?;
    form.validate()?;

    let stored = match form.image.as_deref() {
        Some(image) if !image.trim().is_empty() => {
            Some(store_image(&state.config.media_root, image).await?)
        }
        _ => None,
    };

    if let Err(e) = actions::update_recipe(id, &form, stored.as_deref(), &state.pool).await {
        if let Some(stored) = &stored {
            remove_image(&state.config.media_root, stored).await;
        }
        return Err(e.into());
    }

    if stored.is_some() {
        remove_image(&state.config.media_root, &current.image).await;
    }

    let recipe = reload_recipe(id, &state).await?;
    let view = recipe_view(recipe, Some(&session), &state).await?;
    Ok(reply::json(&view).into_response())
}

pub async fn delete_recipe(
    id: Uuid,
    session: SessionData,
    state: State,
) -> Result<Response, Rejection> {
    let recipe = actions::get_recipe_mut(id, &session, &state.pool).await?;
    actions::delete_recipe(id, &state.pool).await?;
    remove_image(&state.config.media_root, &recipe.image).await;

    log::info!("{} deleted recipe {id}", session.username);
    Ok(no_content())
}

// Favorites and shopping cart

pub async fn add_to_collection(
    collection: RecipeCollection,
    id: Uuid,
    session: SessionData,
    state: State,
) -> Result<Response, Rejection> {
    let recipe = actions::add_to_collection(collection, id, &session, &state.pool).await?;
    Ok(created(&RecipeSummary::new(&recipe, state.media_url())))
}

pub async fn remove_from_collection(
    collection: RecipeCollection,
    id: Uuid,
    session: SessionData,
    state: State,
) -> Result<Response, Rejection> {
    actions::remove_from_collection(collection, id, &session, &state.pool).await?;
    Ok(no_content())
}

pub async fn download_shopping_cart(
    session: SessionData,
    state: State,
) -> Result<Response, Rejection> {
    session.authenticate(ActionType::ManageOwnCart)?;
    let list = actions::shopping_list(&session, &state.pool).await?;

    let response = reply::with_header(
        reply::with_header(list.to_string(), header::CONTENT_TYPE, "text/plain; charset=utf-8"),
        header::CONTENT_DISPOSITION,
        format!("attachment; filename={SHOPPING_LIST_FILENAME}"),
    );
    Ok(response.into_response())
}

// Users

pub async fn list_users(
    query: QueryPairs,
    session: Option<SessionData>,
    state: State,
) -> Result<Response, Rejection> {
    let mut page = actions::fetch_users(fixed_page(&query, USER_COUNT_PER_PAGE), &state.pool).await?;

    let views = user_views(std::mem::take(&mut page.results), session.as_ref(), &state).await?;
    Ok(reply::json(&page.with_results(views)).into_response())
}

pub async fn register_user(form: UserWrite, state: State) -> Result<Response, Rejection> {
    let user = actions::register_user(&form, &state.pool).await?;
    Ok(created(&UserView::new(&user, false)))
}

pub async fn get_user(
    id: Uuid,
    session: Option<SessionData>,
    state: State,
) -> Result<Response, Rejection> {
    let user = actions::get_user_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| ApiError::not_found("User"))?;

    let mut views = user_views(vec![user], session.as_ref(), &state).await?;
    let view = views
        .pop()
        .ok_or_else(|| ApiError::Internal("User view was not built".to_string()))?;
    Ok(reply::json(&view).into_response())
}

pub async fn me(session: SessionData, state: State) -> Result<Response, Rejection> {
    let user = actions::get_user_by_id(&state.pool, session.user_id)
        .await?
        .ok_or(ApiError::Unauthorized)?;
    Ok(reply::json(&UserView::new(&user, false)).into_response())
}

pub async fn list_subscriptions(
    query: QueryPairs,
    session: SessionData,
    state: State,
) -> Result<Response, Rejection> {
    let page = fixed_page(&query, SUBSCRIPTION_COUNT_PER_PAGE);
    let mut page = actions::fetch_subscriptions(&session, page, &state.pool).await?;

    let views = subscription_views(std::mem::take(&mut page.results), &state).await?;
    Ok(reply::json(&page.with_results(views)).into_response())
}

pub async fn subscribe(id: Uuid, session: SessionData, state: State) -> Result<Response, Rejection> {
    let follow = actions::subscribe(id, &session, &state.pool).await?;
    let mut views = subscription_views(vec![follow], &state).await?;
    let view = views
        .pop()
        .ok_or_else(|| ApiError::Internal("Subscription view was not built".to_string()))?;
    Ok(created(&view))
}

pub async fn unsubscribe(id: Uuid, session: SessionData, state: State) -> Result<Response, Rejection> {
    actions::unsubscribe(id, &session, &state.pool).await?;
    Ok(no_content())
}

pub async fn login(form: LoginForm, state: State) -> Result<Response, Rejection> {
    let token = actions::login_user(&form, &state.secret, &state.pool).await?;
    Ok(reply::json(&json!({ "auth_token": token })).into_response())
}

pub async fn set_password(
    session: SessionData,
    form: PasswordChange,
    state: State,
) -> Result<Response, Rejection> {
    actions::set_password(&form, &session, &state.pool).await?;
    Ok(no_content())
}

/// Sessions are signed tokens with no server-side record, so there is nothing to revoke.
pub async fn logout(session: SessionData) -> Result<Response, Rejection> {
    log::debug!("> {} logged out", session.username);
    Ok(no_content())
}
