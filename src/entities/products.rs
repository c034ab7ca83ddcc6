use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use super::{Entity, EntityId, FieldValue};

#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct ProductBrand {
    pub id: EntityId,
    pub name: String,
}

#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct ProductType {
    pub id: EntityId,
    pub name: String,
}

#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct Product {
    pub id: EntityId,
    pub name: String,
    pub description: String,
    pub price_cents: i64,
    pub picture_url: String,
    pub product_type_id: EntityId,
    pub product_brand_id: EntityId,
    pub created_at: NaiveDateTime,
    /// Filled only when a specification includes `product_type`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product_type: Option<ProductType>,
    /// Filled only when a specification includes `product_brand`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product_brand: Option<ProductBrand>,
}

impl Product {
    pub const BRAND: &'static str = "product_brand";
    pub const TYPE: &'static str = "product_type";
}

impl Entity for ProductBrand {
    const KIND: &'static str = "product_brand";

    fn id(&self) -> EntityId {
        self.id
    }

    fn field(&self, name: &str) -> Option<FieldValue> {
        match name {
            "id" => Some(self.id.into()),
            "name" => Some(self.name.clone().into()),
            _ => None,
        }
    }
}

impl Entity for ProductType {
    const KIND: &'static str = "product_type";

    fn id(&self) -> EntityId {
        self.id
    }

    fn field(&self, name: &str) -> Option<FieldValue> {
        match name {
            "id" => Some(self.id.into()),
            "name" => Some(self.name.clone().into()),
            _ => None,
        }
    }
}

impl Entity for Product {
    const KIND: &'static str = "product";

    fn id(&self) -> EntityId {
        self.id
    }

    fn field(&self, name: &str) -> Option<FieldValue> {
        match name {
            "id" => Some(self.id.into()),
            "name" => Some(self.name.clone().into()),
            "description" => Some(self.description.clone().into()),
            "price_cents" => Some(self.price_cents.into()),
            "picture_url" => Some(self.picture_url.clone().into()),
            "product_type_id" => Some(self.product_type_id.into()),
            "product_brand_id" => Some(self.product_brand_id.into()),
            "created_at" => Some(self.created_at.into()),
            _ => None,
        }
    }
}
