use serde::Deserialize;
use validator::{Validate, ValidationError};

use super::repo_types::{TransactionChanges, TransactionType};
use crate::validation::{
    not_null, patch_min_chars, patch_whole_number, whole_number, ApiDate, Patch,
};

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateTransactionRequest {
    #[serde(default)]
    #[validate(length(min = 1, message = "Name transaction is required"))]
    pub name_transaction: String,
    #[serde(default, deserialize_with = "whole_number")]
    #[validate(range(min = 1, message = "Price must be greater than 0"))]
    pub price: i32,
    pub type_transaction: TransactionType,
    /// Defaults to the time of creation.
    #[serde(default)]
    pub transaction_date: Option<ApiDate>,
    #[serde(default)]
    pub image: Option<String>,
}

#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTransactionRequest {
    #[serde(default)]
    #[validate(custom(function = "name_transaction_patch"))]
    pub name_transaction: Patch<String>,
    #[serde(default, deserialize_with = "patch_whole_number")]
    #[validate(custom(function = "price_patch"))]
    pub price: Patch<i32>,
    #[serde(default)]
    #[validate(custom(function = "not_null"))]
    pub type_transaction: Patch<TransactionType>,
    #[serde(default)]
    #[validate(custom(function = "not_null"))]
    pub transaction_date: Patch<ApiDate>,
    #[serde(default)]
    pub image: Patch<String>,
}

fn name_transaction_patch(value: &Patch<String>) -> Result<(), ValidationError> {
    patch_min_chars(value, 1, "Name transaction is required")
}

fn price_patch(value: &Patch<i32>) -> Result<(), ValidationError> {
    not_null(value)?;
    match value {
        Patch::Set(p) if *p < 1 => {
            let mut err = ValidationError::new("range");
            err.message = Some("Price must be greater than 0".into());
            Err(err)
        }
        _ => Ok(()),
    }
}

impl From<UpdateTransactionRequest> for TransactionChanges {
    fn from(r: UpdateTransactionRequest) -> Self {
        Self {
            name_transaction: r.name_transaction,
            price: r.price,
            type_transaction: r.type_transaction,
            transaction_date: r.transaction_date.map(|d| d.0),
            image: r.image,
        }
    }
}
