pub mod collections;
pub mod ingredients;
pub mod recipes;
pub mod subscriptions;
pub mod tags;
pub mod users;

pub use collections::*;
pub use ingredients::*;
pub use recipes::*;
pub use subscriptions::*;
pub use tags::*;
pub use users::*;
