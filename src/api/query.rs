use crate::{actions::RecipeFilter, error::ApiError, pagination::PageRequest};

/// Raw query pairs; repeated keys are kept.
pub type QueryPairs = Vec<(String, String)>;

fn first<'a>(pairs: &'a [(String, String)], key: &str) -> Option<&'a str> {
    pairs
        .iter()
        .find(|(k, _)| k == key)
        .map(|(_, v)| v.as_str())
}

fn flag(pairs: &[(String, String)], key: &str) -> Option<bool> {
    match first(pairs, key) {
        Some("1") => Some(true),
        Some("0") => Some(false),
        _ => None,
    }
}

pub fn page_request(pairs: &[(String, String)]) -> PageRequest {
    PageRequest::parse(first(pairs, "page"), first(pairs, "limit"))
}

#[derive(Debug, Clone, PartialEq)]
pub struct RecipeQuery {
    pub filter: RecipeFilter,
    pub page: PageRequest,
}

impl RecipeQuery {
    pub fn from_pairs(pairs: &[(String, String)]) -> Result<Self, ApiError> {
        let author = match first(pairs, "author") {
            Some(raw) if !raw.is_empty() => Some(raw.parse().map_err(|_| {
                ApiError::validation("author", format!("Select a valid choice. {raw} is not one of the available choices."))
            })?),
            _ => None,
        };

        let tags = pairs
            .iter()
            .filter(|(k, v)| k == "tags" && !v.is_empty())
            .map(|(_, v)| v.to_owned())
            .collect();

        Ok(Self {
            filter: RecipeFilter {
                author,
                tags,
                is_favorited: flag(pairs, "is_favorited"),
                is_in_shopping_cart: flag(pairs, "is_in_shopping_cart"),
            },
            page: page_request(pairs),
        })
    }
}

/// Case-insensitive substring searched in ingredient names.
pub fn ingredient_search(pairs: &[(String, String)]) -> Option<&str> {
    first(pairs, "name").filter(|name| !name.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pairs(raw: &[(&str, &str)]) -> QueryPairs {
        raw.iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn empty_query_has_no_filters() {
        let query = RecipeQuery::from_pairs(&[]).unwrap();
        assert_eq!(query.filter, RecipeFilter::default());
        assert_eq!(query.page, PageRequest::default());
    }

    #[test]
    fn repeated_tags_are_collected() {
        let query = RecipeQuery::from_pairs(&pairs(&[
            ("tags", "breakfast"),
            ("tags", "dinner"),
            ("author", "4"),
            ("page", "2"),
        ]))
        .unwrap();

        assert_eq!(query.filter.tags, vec!["breakfast", "dinner"]);
        assert_eq!(query.filter.author, Some(4));
        assert_eq!(query.page.page, 2);
    }

    #[test]
    fn only_zero_and_one_are_flags() {
        let query = RecipeQuery::from_pairs(&pairs(&[
            ("is_favorited", "1"),
            ("is_in_shopping_cart", "true"),
        ]))
        .unwrap();
        assert_eq!(query.filter.is_favorited, Some(true));
        assert_eq!(query.filter.is_in_shopping_cart, None);

        let query = RecipeQuery::from_pairs(&pairs(&[("is_in_shopping_cart", "0")])).unwrap();
        assert_eq!(query.filter.is_in_shopping_cart, Some(false));
    }

    #[test]
    fn non_numeric_author_is_rejected() {
        assert!(matches!(
            RecipeQuery::from_pairs(&pairs(&[("author", "me")])),
            Err(ApiError::Validation { .. })
        ));
    }

    #[test]
    fn ingredient_search_ignores_blank_name() {
        assert_eq!(ingredient_search(&pairs(&[("name", "")])), None);
        assert_eq!(ingredient_search(&pairs(&[("name", "сах")])), Some("сах"));
    }
}
