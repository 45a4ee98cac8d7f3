use std::path::Path;

use serde::Deserialize;
use sqlx::{Pool, Postgres, QueryBuilder};

use crate::error::ApiError;

// keeps each INSERT well under the postgres bind parameter limit
const CHUNK_SIZE: usize = 1000;

#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct IngredientFixture {
    pub name: String,
    pub measurement_unit: String,
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct TagFixture {
    pub name: String,
    pub color: String,
    pub slug: String,
}

async fn read_fixture<T: for<'de> Deserialize<'de>>(path: &Path) -> Result<Vec<T>, ApiError> {
    let raw = tokio::fs::read(path)
        .await
        .map_err(|e| ApiError::Internal(format!("Failed to read {}: {e}", path.display())))?;

    serde_json::from_slice(&raw)
        .map_err(|e| ApiError::Internal(format!("Malformed fixture {}: {e}", path.display())))
}

pub async fn load_ingredients(path: &Path, pool: &Pool<Postgres>) -> Result<u64, ApiError> {
    let rows: Vec<IngredientFixture> = read_fixture(path).await?;
    let mut tx = pool.begin().await?;
    let mut inserted = 0;

    for chunk in rows.chunks(CHUNK_SIZE) {
        let mut query = QueryBuilder::<Postgres>::new("INSERT INTO ingredients (name, measurement_unit) ");
        query.push_values(chunk, |mut row, ingredient| {
            row.push_bind(&ingredient.name)
                .push_bind(&ingredient.measurement_unit);
        });
        inserted += query.build().execute(&mut *tx).await?.rows_affected();
    }

    tx.commit().await?;
    log::info!("Loaded {inserted} ingredients from {}", path.display());
    Ok(inserted)
}

/// Tags whose slug is already taken are skipped.
pub async fn load_tags(path: &Path, pool: &Pool<Postgres>) -> Result<u64, ApiError> {
    let rows: Vec<TagFixture> = read_fixture(path).await?;
    let mut tx = pool.begin().await?;
    let mut inserted = 0;

    for chunk in rows.chunks(CHUNK_SIZE) {
        let mut query = QueryBuilder::<Postgres>::new("INSERT INTO tags (name, color, slug) ");
        query.push_values(chunk, |mut row, tag| {
            row.push_bind(&tag.name)
                .push_bind(&tag.color)
                .push_bind(&tag.slug);
        });
        query.push(" ON CONFLICT (slug) DO NOTHING");
        inserted += query.build().execute(&mut *tx).await?.rows_affected();
    }

    tx.commit().await?;
    log::info!("Loaded {inserted} tags from {}", path.display());
    Ok(inserted)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn reads_bundled_fixtures() {
        let ingredients: Vec<IngredientFixture> =
            read_fixture(Path::new("data/ingredients.json")).await.unwrap();
        let tags: Vec<TagFixture> = read_fixture(Path::new("data/tags.json")).await.unwrap();

        assert!(!ingredients.is_empty());
        assert!(ingredients.iter().all(|i| i.measurement_unit.chars().count() <= 10));
        assert!(tags.iter().all(|t| t.color.starts_with('#') && t.color.len() == 7));
    }

    #[tokio::test]
    async fn missing_file_is_an_error() {
        let result: Result<Vec<TagFixture>, _> = read_fixture(Path::new("data/nope.json")).await;
        assert!(result.is_err());
    }
}
