use crate::{error::ApiError, jwt::SessionData, schema::{UserRole, Uuid}};

const ACTION_TABLE: &[(UserRole, &[ActionType])] = &[
    (
        UserRole::User,
        &[
            ActionType::CreateRecipes,
            ActionType::ManageOwnRecipes,
            ActionType::ManageOwnFavorites,
            ActionType::ManageOwnCart,
            ActionType::ManageOwnSubscriptions,
        ],
    ),
    (
        UserRole::Admin,
        &[
            ActionType::CreateRecipes,
            ActionType::ManageOwnRecipes,
            ActionType::ManageOwnFavorites,
            ActionType::ManageOwnCart,
            ActionType::ManageOwnSubscriptions,
            ActionType::ManageAllRecipes,
        ],
    ),
];

#[derive(Debug, Hash, PartialEq, Eq, PartialOrd, Ord, Clone, Copy)]
pub enum ActionType {
    CreateRecipes,

    ManageOwnRecipes,
    ManageOwnFavorites,
    ManageOwnCart,
    ManageOwnSubscriptions,

    ManageAllRecipes,
}

impl ActionType {
    pub fn authenticate(self, session: &SessionData) -> bool {
        let role = &session.role;

        ACTION_TABLE
            .iter()
            .find_map(|(r, actions)| {
                if role != r {
                    return None;
                }

                Some(actions.contains(&self))
            })
            .unwrap_or(false)
    }
}

/// Recipe mutation is reserved to the author and to admins.
pub fn authorize_recipe_change(session: &SessionData, author_id: Uuid) -> Result<(), ApiError> {
    session.authenticate(ActionType::ManageOwnRecipes)?;

    match session.authenticate(ActionType::ManageAllRecipes) {
        Ok(_) => Ok(()),
        Err(_) => {
            if author_id != session.user_id {
                Err(ApiError::Forbidden)
            } else {
                Ok(())
            }
        }
    }
}
