use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

use crate::catalog::product::Product;

#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("failed to read product list {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("malformed product list: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("duplicate product id {0}")]
    DuplicateId(i64),
}

/// Accepts a bare array or an object carrying a `products` array.
#[derive(Deserialize)]
#[serde(untagged)]
enum CatalogDocument {
    List(Vec<Product>),
    Wrapped {
        #[serde(default)]
        products: Option<Vec<Product>>,
    },
}

/// Ordered list of selectable products, unique by id.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ProductCatalog {
    products: Vec<Product>,
}

impl ProductCatalog {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn new(products: Vec<Product>) -> Result<Self, CatalogError> {
        let mut seen = HashSet::with_capacity(products.len());
        for product in &products {
            if !seen.insert(product.id) {
                return Err(CatalogError::DuplicateId(product.id));
            }
        }
        Ok(Self { products })
    }

    pub fn from_json(json: &str) -> Result<Self, CatalogError> {
        let products = match serde_json::from_str(json)? {
            CatalogDocument::List(products) => products,
            CatalogDocument::Wrapped { products } => products.unwrap_or_default(),
        };
        Self::new(products)
    }

    /// Loads a product list file. No path means no products.
    pub fn load(path: Option<&Path>) -> Result<Self, CatalogError> {
        let Some(path) = path else {
            log::info!("No product list supplied, catalog is empty");
            return Ok(Self::empty());
        };
        let json = fs::read_to_string(path).map_err(|source| CatalogError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let catalog = Self::from_json(&json)?;
        log::info!("Loaded {} products from {}", catalog.len(), path.display());
        Ok(catalog)
    }

    pub fn products(&self) -> &[Product] {
        &self.products
    }

    pub fn get(&self, id: i64) -> Option<&Product> {
        self.products.iter().find(|p| p.id == id)
    }

    pub fn len(&self) -> usize {
        self.products.len()
    }

    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use tempfile::TempDir;

    const TWO_PRODUCTS: &str = r#"[
        {"id": 1, "name": "Aviator", "price": "$120", "details": "Gold", "imageUrl": "aviator.png"},
        {"id": 2, "name": "Wayfarer", "price": "$90", "details": "Black", "imageUrl": "https://shop.test/wayfarer.png"}
    ]"#;

    #[test]
    fn test_parses_array_in_order() {
        let catalog = ProductCatalog::from_json(TWO_PRODUCTS).unwrap();
        let names: Vec<_> = catalog.products().iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, ["Aviator", "Wayfarer"]);
    }

    #[test]
    fn test_parses_wrapped_products() {
        let json = format!(r#"{{"products": {TWO_PRODUCTS}}}"#);
        assert_eq!(ProductCatalog::from_json(&json).unwrap().len(), 2);
    }

    #[rstest]
    #[case("{}")]
    #[case(r#"{"products": null}"#)]
    #[case("[]")]
    fn test_absent_products_degrade_to_empty(#[case] json: &str) {
        assert!(ProductCatalog::from_json(json).unwrap().is_empty());
    }

    #[test]
    fn test_duplicate_ids_rejected() {
        let json = r#"[
            {"id": 3, "name": "A", "imageUrl": "a.png"},
            {"id": 3, "name": "B", "imageUrl": "b.png"}
        ]"#;
        assert!(matches!(
            ProductCatalog::from_json(json),
            Err(CatalogError::DuplicateId(3))
        ));
    }

    #[test]
    fn test_malformed_json_is_parse_error() {
        assert!(matches!(
            ProductCatalog::from_json("[{"),
            Err(CatalogError::Parse(_))
        ));
    }

    #[test]
    fn test_get_by_id() {
        let catalog = ProductCatalog::from_json(TWO_PRODUCTS).unwrap();
        assert_eq!(catalog.get(2).unwrap().name, "Wayfarer");
        assert!(catalog.get(99).is_none());
    }

    #[test]
    fn test_load_without_path_is_empty() {
        assert!(ProductCatalog::load(None).unwrap().is_empty());
    }

    #[test]
    fn test_load_from_file() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("products.json");
        fs::write(&path, TWO_PRODUCTS).unwrap();
        assert_eq!(ProductCatalog::load(Some(&path)).unwrap().len(), 2);
    }

    #[test]
    fn test_load_missing_file_is_read_error() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("absent.json");
        assert!(matches!(
            ProductCatalog::load(Some(&path)),
            Err(CatalogError::Read { .. })
        ));
    }
}
