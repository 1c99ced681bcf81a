use serde::{Deserialize, Serialize};

/// A selectable eyewear product. `image_url` is the overlay asset reference.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub price: String,
    #[serde(default)]
    pub details: String,
    pub image_url: String,
}
