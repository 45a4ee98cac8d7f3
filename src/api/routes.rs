use std::convert::Infallible;

use serde::de::DeserializeOwned;
use warp::{filters::BoxedFilter, reply::Response, Filter, Reply};

use crate::{
    actions::RecipeCollection,
    constants::MAX_BODY_SIZE,
    error::handle_rejection,
    jwt::SessionData,
    middleware::{with_possible_session, with_session},
    schema::Uuid,
};

use super::{handlers, query::QueryPairs, state::State};

fn with_state(state: &State) -> impl Filter<Extract = (State,), Error = Infallible> + Clone {
    let state = state.clone();
    warp::any().map(move || state.clone())
}

fn session(state: &State) -> impl Filter<Extract = (SessionData,), Error = warp::Rejection> + Clone {
    with_session(state.secret.clone())
}

fn possible_session(
    state: &State,
) -> impl Filter<Extract = (Option<SessionData>,), Error = warp::Rejection> + Clone {
    with_possible_session(state.secret.clone())
}

fn json_body<T: DeserializeOwned + Send>() -> impl Filter<Extract = (T,), Error = warp::Rejection> + Clone {
    warp::body::content_length_limit(MAX_BODY_SIZE).and(warp::body::json())
}

fn query_pairs() -> impl Filter<Extract = (QueryPairs,), Error = warp::Rejection> + Copy {
    warp::query::<QueryPairs>()
}

fn catalog(state: &State) -> BoxedFilter<(Response,)> {
    let list_tags = warp::path!("tags")
        .and(warp::get())
        .and(with_state(state))
        .and_then(handlers::list_tags);

    let get_tag = warp::path!("tags" / Uuid)
        .and(warp::get())
        .and(with_state(state))
        .and_then(handlers::get_tag);

    let list_ingredients = warp::path!("ingredients")
        .and(warp::get())
        .and(query_pairs())
        .and(with_state(state))
        .and_then(handlers::list_ingredients);

    let get_ingredient = warp::path!("ingredients" / Uuid)
        .and(warp::get())
        .and(with_state(state))
        .and_then(handlers::get_ingredient);

    list_tags
        .or(get_tag)
        .unify()
        .or(list_ingredients)
        .unify()
        .or(get_ingredient)
        .unify()
        .boxed()
}

fn collection(state: &State, segment: &'static str, kind: RecipeCollection) -> BoxedFilter<(Response,)> {
    let path = warp::path("recipes")
        .and(warp::path::param::<Uuid>())
        .and(warp::path(segment))
        .and(warp::path::end());

    let add = path
        .clone()
        .and(warp::post())
        .and(session(state))
        .and(with_state(state))
        .and_then(move |id: Uuid, session: SessionData, state: State| {
            handlers::add_to_collection(kind, id, session, state)
        });

    let remove = path
        .and(warp::delete())
        .and(session(state))
        .and(with_state(state))
        .and_then(move |id: Uuid, session: SessionData, state: State| {
            handlers::remove_from_collection(kind, id, session, state)
        });

    add.or(remove).unify().boxed()
}

fn recipes(state: &State) -> BoxedFilter<(Response,)> {
    let download = warp::path!("recipes" / "download_shopping_cart")
        .and(warp::get())
        .and(session(state))
        .and(with_state(state))
        .and_then(handlers::download_shopping_cart);

    let list = warp::path!("recipes")
        .and(warp::get())
        .and(query_pairs())
        .and(possible_session(state))
        .and(with_state(state))
        .and_then(handlers::list_recipes);

    let create = warp::path!("recipes")
        .and(warp::post())
        .and(session(state))
        .and(json_body())
        .and(with_state(state))
        .and_then(handlers::create_recipe);

    let get = warp::path!("recipes" / Uuid)
        .and(warp::get())
        .and(possible_session(state))
        .and(with_state(state))
        .and_then(handlers::get_recipe);

    let update = warp::path!("recipes" / Uuid)
        .and(warp::patch())
        .and(session(state))
        .and(json_body())
        .and(with_state(state))
        .and_then(handlers::update_recipe);

    let delete = warp::path!("recipes" / Uuid)
        .and(warp::delete())
        .and(session(state))
        .and(with_state(state))
        .and_then(handlers::delete_recipe);

    download
        .or(list)
        .unify()
        .or(create)
        .unify()
        .or(get)
        .unify()
        .or(update)
        .unify()
        .or(delete)
        .unify()
        .or(collection(state, "favorite", RecipeCollection::Favorites))
        .unify()
        .or(collection(state, "shopping_cart", RecipeCollection::ShoppingCart))
        .unify()
        .boxed()
}

fn users(state: &State) -> BoxedFilter<(Response,)> {
    let me = warp::path!("users" / "me")
        .and(warp::get())
        .and(session(state))
        .and(with_state(state))
        .and_then(handlers::me);

    let subscriptions = warp::path!("users" / "subscriptions")
        .and(warp::get())
        .and(query_pairs())
        .and(session(state))
        .and(with_state(state))
        .and_then(handlers::list_subscriptions);

    let list = warp::path!("users")
        .and(warp::get())
        .and(query_pairs())
        .and(possible_session(state))
        .and(with_state(state))
        .and_then(handlers::list_users);

    let register = warp::path!("users")
        .and(warp::post())
        .and(json_body())
        .and(with_state(state))
        .and_then(handlers::register_user);

    let get = warp::path!("users" / Uuid)
        .and(warp::get())
        .and(possible_session(state))
        .and(with_state(state))
        .and_then(handlers::get_user);

    let subscribe = warp::path!("users" / Uuid / "subscribe")
        .and(warp::post())
        .and(session(state))
        .and(with_state(state))
        .and_then(handlers::subscribe);

    let unsubscribe = warp::path!("users" / Uuid / "subscribe")
        .and(warp::delete())
        .and(session(state))
        .and(with_state(state))
        .and_then(handlers::unsubscribe);

    let login = warp::path!("auth" / "token" / "login")
        .and(warp::post())
        .and(json_body())
        .and(with_state(state))
        .and_then(handlers::login);

    let set_password = warp::path!("users" / "set_password")
        .and(warp::post())
        .and(session(state))
        .and(json_body())
        .and(with_state(state))
        .and_then(handlers::set_password);

    let logout = warp::path!("auth" / "token" / "logout")
        .and(warp::post())
        .and(session(state))
        .and_then(handlers::logout);

    me.or(subscriptions)
        .unify()
        .or(list)
        .unify()
        .or(register)
        .unify()
        .or(get)
        .unify()
        .or(subscribe)
        .unify()
        .or(unsubscribe)
        .unify()
        .or(login)
        .unify()
        .or(set_password)
        .unify()
        .or(logout)
        .unify()
        .boxed()
}

/// The `/api` tree only, with rejections still pending.
pub fn api(state: &State) -> BoxedFilter<(Response,)> {
    warp::path("api")
        .and(catalog(state).or(recipes(state)).unify().or(users(state)).unify())
        .boxed()
}

/// Every route served by the application, including uploaded media.
pub fn routes(state: &State) -> impl Filter<Extract = (impl Reply,), Error = Infallible> + Clone {
    let media = warp::path("media")
        .and(warp::fs::dir(state.config.media_root.clone()))
        .map(|file: warp::fs::File| file.into_response());

    api(state)
        .or(media)
        .unify()
        .recover(handle_rejection)
        .unify()
        .with(warp::log("foodgram"))
}
