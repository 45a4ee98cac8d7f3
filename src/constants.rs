pub const DEFAULT_PAGE_SIZE: i64 = 6;
pub const MAX_PAGE_SIZE: i64 = 100;
pub const SUBSCRIPTION_COUNT_PER_PAGE: i64 = 6;
pub const USER_COUNT_PER_PAGE: i64 = 6;

/// Request bodies carry inline base64 images.
pub const MAX_BODY_SIZE: u64 = 16 * 1024 * 1024;

pub const SESSION_LIFETIME_HOURS: i64 = 24;

pub const RECIPE_IMAGE_DIR: &str = "recipes/images";

pub const IMAGE_FORMATS: &[(&str, &str)] = &[
    ("png", "png"),
    ("jpeg", "jpg"),
    ("jpg", "jpg"),
    ("gif", "gif"),
    ("webp", "webp"),
];

pub const SHOPPING_LIST_FILENAME: &str = "shopping_list.txt";
