use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub type Uuid = i32;

#[derive(
    Clone, Debug, PartialEq, PartialOrd, sqlx::Type, Serialize, Eq, Ord, Hash, Deserialize,
)]
#[sqlx(type_name = "user_role", rename_all = "lowercase")]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    User,
    Admin,
}

#[derive(sqlx::FromRow, Debug, Clone, Serialize)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    #[serde(skip_serializing)]
    pub password: String,
    pub role: UserRole,
}

#[derive(sqlx::FromRow, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tag {
    pub id: Uuid,
    pub name: String,
    pub color: String,
    pub slug: String,
}

#[derive(sqlx::FromRow, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ingredient {
    pub id: Uuid,
    pub name: String,
    pub measurement_unit: String,
}

#[derive(sqlx::FromRow, Debug, Clone, Serialize)]
pub struct Recipe {
    pub id: Uuid,
    pub author_id: Uuid,
    pub name: String,
    pub text: String,
    pub cooking_time: i32,
    pub image: String,
    pub pub_date: DateTime<Utc>,
}

/// Tag linked to a recipe, flattened with the tag columns.
#[derive(sqlx::FromRow, Debug, Clone)]
pub struct LinkedRecipeTag {
    pub recipe_id: Uuid,
    pub id: Uuid,
    pub name: String,
    pub color: String,
    pub slug: String,
}

impl From<LinkedRecipeTag> for Tag {
    fn from(value: LinkedRecipeTag) -> Self {
        Self {
            id: value.id,
            name: value.name,
            color: value.color,
            slug: value.slug,
        }
    }
}

/// An ingredient row of a recipe joined with the ingredient catalog.
#[derive(sqlx::FromRow, Debug, Clone, PartialEq)]
pub struct RecipePart {
    pub recipe_id: Uuid,
    pub ingredient_id: Uuid,
    pub name: String,
    pub measurement_unit: String,
    pub amount: i32,
}

/// One ingredient of one recipe sitting in a shopping cart.
#[derive(sqlx::FromRow, Debug, Clone, PartialEq)]
pub struct CartPart {
    pub ingredient_id: Uuid,
    pub name: String,
    pub measurement_unit: String,
    pub amount: i32,
}

#[derive(sqlx::FromRow, Debug, Clone)]
pub struct RecipeRowPartial {
    pub id: Uuid,
    pub author_id: Uuid,
    pub name: String,
    pub text: String,
    pub cooking_time: i32,
    pub image: String,
    pub pub_date: DateTime<Utc>,
    pub count: i64,
}

impl From<RecipeRowPartial> for Recipe {
    fn from(value: RecipeRowPartial) -> Self {
        Self {
            id: value.id,
            author_id: value.author_id,
            name: value.name,
            text: value.text,
            cooking_time: value.cooking_time,
            image: value.image,
            pub_date: value.pub_date,
        }
    }
}

#[derive(sqlx::FromRow, Debug, Clone)]
pub struct UserRowPartial {
    pub id: Uuid,
    pub email: String,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub password: String,
    pub role: UserRole,
    pub count: i64,
}

impl From<UserRowPartial> for User {
    fn from(value: UserRowPartial) -> Self {
        Self {
            id: value.id,
            email: value.email,
            username: value.username,
            first_name: value.first_name,
            last_name: value.last_name,
            password: value.password,
            role: value.role,
        }
    }
}
