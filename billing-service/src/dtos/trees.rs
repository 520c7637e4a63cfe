use crate::models::TreeInput;
use serde::Deserialize;
use service_core::error::AppError;
use validator::Validate;

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct TreeForm {
    #[validate(length(min = 1, message = "tree_id is required"))]
    pub tree_id: String,
    #[validate(length(min = 1, message = "size is required"))]
    pub size: String,
    #[validate(length(min = 1, message = "description is required"))]
    pub description: String,
}

impl TreeForm {
    pub fn into_input(self) -> Result<TreeInput, AppError> {
        let form = Self {
            tree_id: self.tree_id.trim().to_string(),
            size: self.size.trim().to_string(),
            description: self.description.trim().to_string(),
        };
        form.validate()?;
        Ok(TreeInput {
            tree_id: form.tree_id,
            size: form.size,
            description: form.description,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_form_converts() {
        let input = TreeForm {
            tree_id: " T1 ".to_string(),
            size: "12ft".to_string(),
            description: "teak".to_string(),
        }
        .into_input()
        .unwrap();
        assert_eq!(input.tree_id, "T1");
    }

    #[test]
    fn blank_fields_are_rejected() {
        let result = TreeForm {
            tree_id: "T1".to_string(),
            size: "".to_string(),
            description: "teak".to_string(),
        }
        .into_input();
        assert!(matches!(result, Err(AppError::ValidationError(_))));
    }
}
