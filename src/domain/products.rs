//! Product catalogue domain types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::users::normalize_category;

/// Response DTO for product
#[derive(Debug, Clone, Serialize)]
pub struct ProductResponse {
    pub id: Uuid,
    pub supplier_id: Uuid,
    pub supplier_name: Option<String>,
    pub name: String,
    pub description: Option<String>,
    pub category: String,
    pub unit_price: i64, // paise
    pub unit: Option<String>,
    pub min_order_quantity: i64,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Request DTO for creating a product
#[derive(Debug, Clone, Deserialize)]
pub struct CreateProductRequest {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub category: String,
    pub unit_price: i64,
    #[serde(default)]
    pub unit: Option<String>,
    #[serde(default = "default_min_order_quantity")]
    pub min_order_quantity: i64,
}

fn default_min_order_quantity() -> i64 {
    1
}

impl CreateProductRequest {
    /// Validate and return the normalized category.
    pub fn validate(&self) -> Result<String, String> {
        if self.name.trim().is_empty() {
            return Err("name is required".into());
        }
        validate_price_and_moq(Some(self.unit_price), Some(self.min_order_quantity))?;
        let category = normalize_category(&self.category);
        if category.is_empty() {
            return Err("category is required".into());
        }
        Ok(category)
    }
}

/// Request DTO for updating a product
#[derive(Debug, Clone, Deserialize, Default)]
pub struct UpdateProductRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub unit_price: Option<i64>,
    #[serde(default)]
    pub unit: Option<String>,
    #[serde(default)]
    pub min_order_quantity: Option<i64>,
    #[serde(default)]
    pub is_active: Option<bool>,
}

impl UpdateProductRequest {
    /// Validate and return the normalized category, if one was supplied.
    pub fn validate(&self) -> Result<Option<String>, String> {
        if matches!(&self.name, Some(n) if n.trim().is_empty()) {
            return Err("name cannot be empty".into());
        }
        validate_price_and_moq(self.unit_price, self.min_order_quantity)?;
        match &self.category {
            Some(raw) => {
                let category = normalize_category(raw);
                if category.is_empty() {
                    return Err("category cannot be empty".into());
                }
                Ok(Some(category))
            }
            None => Ok(None),
        }
    }
}

fn validate_price_and_moq(unit_price: Option<i64>, moq: Option<i64>) -> Result<(), String> {
    if matches!(unit_price, Some(p) if p < 0) {
        return Err("unit_price cannot be negative".into());
    }
    if matches!(moq, Some(q) if q < 1) {
        return Err("min_order_quantity must be at least 1".into());
    }
    Ok(())
}

/// Query params for listing products
#[derive(Debug, Clone, Deserialize, Default)]
pub struct ProductQuery {
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub supplier_id: Option<Uuid>,
    #[serde(default)]
    pub search: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create(name: &str, price: i64, moq: i64) -> CreateProductRequest {
        CreateProductRequest {
            name: name.into(),
            description: None,
            category: " Industrial  Valves".into(),
            unit_price: price,
            unit: Some("piece".into()),
            min_order_quantity: moq,
        }
    }

    #[test]
    fn create_normalizes_category() {
        assert_eq!(create("Gate valve", 125_000, 10).validate().unwrap(), "industrial valves");
    }

    #[test]
    fn create_rejects_bad_input() {
        assert!(create("", 100, 1).validate().is_err());
        assert!(create("Gate valve", -1, 1).validate().is_err());
        assert!(create("Gate valve", 100, 0).validate().is_err());
    }

    #[test]
    fn free_products_are_allowed() {
        assert!(create("Sample kit", 0, 1).validate().is_ok());
    }

    #[test]
    fn update_checks_only_supplied_fields() {
        assert_eq!(UpdateProductRequest::default().validate().unwrap(), None);

        let req = UpdateProductRequest {
            category: Some("   ".into()),
            ..Default::default()
        };
        assert!(req.validate().is_err());
    }
}
