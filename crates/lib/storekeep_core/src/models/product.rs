//! Product catalog models.

use serde::{Deserialize, Serialize};

/// A catalog product. Name and price are nullable columns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    #[serde(rename = "productId")]
    pub id: i64,
    #[serde(rename = "productName")]
    pub name: Option<String>,
    #[serde(rename = "productPrice")]
    pub price: Option<f64>,
}

/// Create/update input. On update, `None` fields keep their stored value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProductDraft {
    #[serde(rename = "productName", default)]
    pub name: Option<String>,
    #[serde(rename = "productPrice", default)]
    pub price: Option<f64>,
}
