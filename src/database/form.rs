use std::collections::{HashMap, HashSet};

use serde::Deserialize;

use super::{error::ApiError, schema::Uuid};

const NAME_MAX_LENGTH: usize = 200;
const USERNAME_MAX_LENGTH: usize = 150;
const EMAIL_MAX_LENGTH: usize = 254;

#[derive(Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct IngredientAmount {
    pub id: Uuid,
    pub amount: i32,
}

/// Write shape of a recipe, used by both create and update.
#[derive(Deserialize, Debug, Clone)]
pub struct RecipeWrite {
    pub ingredients: Vec<IngredientAmount>,
    pub tags: Vec<Uuid>,
    #[serde(default)]
    pub image: Option<String>,
    pub name: String,
    pub text: String,
    pub cooking_time: i32,
}

impl RecipeWrite {
    pub fn validate(&self) -> Result<(), ApiError> {
        if self.tags.is_empty() {
            return Err(ApiError::validation("tags", "At least one tag is required"));
        }
        if has_duplicates(self.tags.iter()) {
            return Err(ApiError::validation("tags", "Tags must be unique"));
        }
        if self.ingredients.is_empty() {
            return Err(ApiError::validation(
                "ingredients",
                "At least one ingredient is required",
            ));
        }
        if has_duplicates(self.ingredients.iter().map(|i| &i.id)) {
            return Err(ApiError::validation(
                "ingredients",
                "Ingredients must be unique",
            ));
        }
        if self.ingredients.iter().any(|i| i.amount <= 0) {
            return Err(ApiError::validation(
                "amount",
                "Ingredient amount must be greater than zero",
            ));
        }
        if self.cooking_time <= 0 {
            return Err(ApiError::validation(
                "cooking_time",
                "Cooking time must be greater than zero",
            ));
        }
        if self.name.trim().is_empty() || self.name.chars().count() > NAME_MAX_LENGTH {
            return Err(ApiError::validation(
                "name",
                format!("Name must be between 1 and {NAME_MAX_LENGTH} characters"),
            ));
        }
        if self.text.trim().is_empty() {
            return Err(ApiError::validation("text", "This field may not be blank"));
        }
        Ok(())
    }

    pub fn ingredient_ids(&self) -> Vec<Uuid> {
        self.ingredients.iter().map(|i| i.id).collect()
    }
}

fn has_duplicates<'a, T: Eq + std::hash::Hash + 'a>(items: impl Iterator<Item = &'a T>) -> bool {
    let mut seen = HashSet::new();
    for item in items {
        if !seen.insert(item) {
            return true;
        }
    }
    false
}

/// Changes needed to move a recipe's ingredient rows to a new list.
///
/// Rows are keyed on the ingredient alone, so a changed amount is an
/// in-place update rather than a remove-and-insert.
#[derive(Debug, Default, PartialEq)]
pub struct IngredientDiff {
    pub upsert: Vec<IngredientAmount>,
    pub remove: Vec<Uuid>,
    pub retained: Vec<Uuid>,
}

impl IngredientDiff {
    pub fn compute(existing: &[(Uuid, i32)], incoming: &[IngredientAmount]) -> Self {
        let mut current: HashMap<Uuid, i32> = existing.iter().copied().collect();
        let mut diff = Self::default();

        for part in incoming {
            match current.remove(&part.id) {
                Some(amount) if amount == part.amount => diff.retained.push(part.id),
                _ => diff.upsert.push(*part),
            }
        }

        // keep removal order stable for logging and tests
        let mut remove: Vec<Uuid> = current.into_keys().collect();
        remove.sort_unstable();
        diff.remove = remove;

        diff
    }

    pub fn is_empty(&self) -> bool {
        self.upsert.is_empty() && self.remove.is_empty()
    }
}

/// Write shape of a user registration.
#[derive(Deserialize, Debug, Clone)]
pub struct UserWrite {
    pub email: String,
    pub username: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    pub password: String,
}

impl UserWrite {
    pub fn validate(&self) -> Result<(), ApiError> {
        let email = self.email.trim();
        if email.len() > EMAIL_MAX_LENGTH || !is_email(email) {
            return Err(ApiError::validation("email", "Enter a valid email address"));
        }
        if self.username.is_empty()
            || self.username.chars().count() > USERNAME_MAX_LENGTH
            || !self
                .username
                .chars()
                .all(|c| c.is_alphanumeric() || "@.+-_".contains(c))
        {
            return Err(ApiError::validation(
                "username",
                "Enter a valid username: letters, digits and @/./+/-/_ only",
            ));
        }
        for (field, value) in [("first_name", &self.first_name), ("last_name", &self.last_name)] {
            if value.chars().count() > USERNAME_MAX_LENGTH {
                return Err(ApiError::validation(
                    field,
                    format!("Ensure this field has no more than {USERNAME_MAX_LENGTH} characters"),
                ));
            }
        }
        if self.password.is_empty() {
            return Err(ApiError::validation(
                "password",
                "This field may not be blank",
            ));
        }
        Ok(())
    }
}

fn is_email(value: &str) -> bool {
    match value.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
                && !value.contains(char::is_whitespace)
        }
        None => false,
    }
}

#[derive(Deserialize, Debug, Clone)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
}

#[derive(Deserialize, Debug, Clone)]
pub struct PasswordChange {
    pub current_password: String,
    pub new_password: String,
}

impl PasswordChange {
    pub fn validate(&self) -> Result<(), ApiError> {
        if self.current_password.is_empty() {
            return Err(ApiError::validation(
                "current_password",
                "This field may not be blank",
            ));
        }
        if self.new_password.is_empty() {
            return Err(ApiError::validation(
                "new_password",
                "This field may not be blank",
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn part(id: Uuid, amount: i32) -> IngredientAmount {
        IngredientAmount { id, amount }
    }

    fn recipe() -> RecipeWrite {
        RecipeWrite {
            ingredients: vec![part(1, 100), part(2, 3)],
            tags: vec![1, 2],
            image: None,
            name: "Pancakes".to_string(),
            text: "Mix and fry".to_string(),
            cooking_time: 20,
        }
    }

    fn rejected_field(form: &RecipeWrite) -> String {
        match form.validate() {
            Err(ApiError::Validation { field, .. }) => field,
            other => panic!("expected a validation error, got {other:?}"),
        }
    }

    #[test]
    fn valid_recipe_passes() {
        assert!(recipe().validate().is_ok());
    }

    #[test]
    fn empty_and_duplicate_tags_are_rejected() {
        let mut form = recipe();
        form.tags.clear();
        assert_eq!(rejected_field(&form), "tags");

        form.tags = vec![1, 1];
        assert_eq!(rejected_field(&form), "tags");
    }

    #[test]
    fn empty_and_duplicate_ingredients_are_rejected() {
        let mut form = recipe();
        form.ingredients.clear();
        assert_eq!(rejected_field(&form), "ingredients");

        form.ingredients = vec![part(4, 10), part(4, 20)];
        assert_eq!(rejected_field(&form), "ingredients");
    }

    #[test]
    fn non_positive_amount_is_rejected() {
        let mut form = recipe();
        form.ingredients[1].amount = 0;
        assert_eq!(rejected_field(&form), "amount");

        form.ingredients[1].amount = -5;
        assert_eq!(rejected_field(&form), "amount");
    }

    #[test]
    fn non_positive_cooking_time_is_rejected() {
        let mut form = recipe();
        form.cooking_time = 0;
        assert_eq!(rejected_field(&form), "cooking_time");
    }

    #[test]
    fn tags_are_checked_before_everything_else() {
        let mut form = recipe();
        form.tags.clear();
        form.ingredients.clear();
        form.cooking_time = -1;
        assert_eq!(rejected_field(&form), "tags");

        form.tags = vec![3];
        assert_eq!(rejected_field(&form), "ingredients");
    }

    #[test]
    fn blank_name_is_rejected() {
        let mut form = recipe();
        form.name = "  ".to_string();
        assert_eq!(rejected_field(&form), "name");

        form.name = "x".repeat(NAME_MAX_LENGTH + 1);
        assert_eq!(rejected_field(&form), "name");
    }

    #[test]
    fn diff_retains_unchanged_rows() {
        let diff = IngredientDiff::compute(&[(1, 100), (2, 3)], &[part(1, 100), part(2, 3)]);
        assert!(diff.is_empty());
        assert_eq!(diff.retained, vec![1, 2]);
    }

    #[test]
    fn diff_updates_amount_in_place() {
        let diff = IngredientDiff::compute(&[(1, 100), (2, 3)], &[part(1, 150), part(2, 3)]);
        assert_eq!(diff.upsert, vec![part(1, 150)]);
        assert!(diff.remove.is_empty());
        assert_eq!(diff.retained, vec![2]);
    }

    #[test]
    fn diff_adds_and_removes() {
        let diff = IngredientDiff::compute(&[(1, 100), (2, 3), (5, 1)], &[part(2, 3), part(7, 40)]);
        assert_eq!(diff.upsert, vec![part(7, 40)]);
        assert_eq!(diff.remove, vec![1, 5]);
        assert_eq!(diff.retained, vec![2]);
    }

    #[test]
    fn user_registration_validation() {
        let mut user = UserWrite {
            email: "cook@example.com".to_string(),
            username: "cook_1".to_string(),
            first_name: "Julia".to_string(),
            last_name: "Child".to_string(),
            password: "butter".to_string(),
        };
        assert!(user.validate().is_ok());

        user.email = "not-an-email".to_string();
        assert!(matches!(
            user.validate(),
            Err(ApiError::Validation { ref field, .. }) if field == "email"
        ));

        user.email = "cook@example.com".to_string();
        user.username = "bad name".to_string();
        assert!(matches!(
            user.validate(),
            Err(ApiError::Validation { ref field, .. }) if field == "username"
        ));
    }

    #[test]
    fn overlong_names_are_reported_on_their_own_field() {
        let mut user = UserWrite {
            email: "cook@example.com".to_string(),
            username: "cook".to_string(),
            first_name: "Julia".to_string(),
            last_name: "x".repeat(USERNAME_MAX_LENGTH + 1),
            password: "butter".to_string(),
        };
        assert!(matches!(
            user.validate(),
            Err(ApiError::Validation { ref field, .. }) if field == "last_name"
        ));

        user.first_name = "y".repeat(USERNAME_MAX_LENGTH + 1);
        assert!(matches!(
            user.validate(),
            Err(ApiError::Validation { ref field, .. }) if field == "first_name"
        ));

        user.first_name = "y".repeat(USERNAME_MAX_LENGTH);
        user.last_name = "x".repeat(USERNAME_MAX_LENGTH);
        assert!(user.validate().is_ok());
    }

    #[test]
    fn password_change_needs_both_passwords() {
        let change = PasswordChange {
            current_password: "butter".to_string(),
            new_password: String::new(),
        };
        assert!(matches!(
            change.validate(),
            Err(ApiError::Validation { ref field, .. }) if field == "new_password"
        ));

        let change = PasswordChange {
            current_password: String::new(),
            new_password: "margarine".to_string(),
        };
        assert!(matches!(
            change.validate(),
            Err(ApiError::Validation { ref field, .. }) if field == "current_password"
        ));
    }
}
