//! Category models.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::AppError;

pub const MAX_CATEGORY_NAME_LEN: usize = 100;

/// A user-defined label referenced by transactions and goals.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Category {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
}

impl Category {
    pub fn new(user_id: Uuid, name: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            name,
        }
    }
}

/// Request body for creating or renaming a category.
///
/// ```json
/// { "name": "Groceries" }
/// ```
#[derive(Debug, Deserialize)]
pub struct CategoryRequest {
    pub name: String,
}

impl CategoryRequest {
    /// Validate and return the trimmed name.
    pub fn validated_name(&self) -> Result<String, AppError> {
        let name = self.name.trim();
        if name.is_empty() {
            return Err(AppError::InvalidRequest(
                "Category name is required".to_string(),
            ));
        }
        if name.chars().count() > MAX_CATEGORY_NAME_LEN {
            return Err(AppError::InvalidRequest(format!(
                "Category name can't be longer than {MAX_CATEGORY_NAME_LEN} characters"
            )));
        }
        Ok(name.to_string())
    }
}

#[derive(Debug, Serialize)]
pub struct CategoryResponse {
    pub id: Uuid,
    pub name: String,
}

impl From<Category> for CategoryResponse {
    fn from(category: Category) -> Self {
        Self {
            id: category.id,
            name: category.name,
        }
    }
}
