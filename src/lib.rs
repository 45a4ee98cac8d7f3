mod database {
    pub mod actions;
    pub mod error;
    pub mod fixtures;
    pub mod form;
    pub mod pagination;
    pub mod schema;
    pub mod shopping_list;
}
mod authentication {
    pub mod cryptography;
    pub mod jwt;
    pub mod middleware;
    pub mod permissions;
}
mod api {
    pub mod handlers;
    pub mod query;
    pub mod routes;
    pub mod state;
    pub mod views;
}
pub mod config;
mod constants;
pub mod media;

pub use api::*;
pub use authentication::*;
pub use constants::*;
pub use database::*;
