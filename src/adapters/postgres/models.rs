use chrono::NaiveDateTime;
use diesel::prelude::*;

use crate::entities::{Product, ProductBrand, ProductType};

#[derive(Debug, Queryable, Selectable, PartialEq, Insertable)]
#[diesel(table_name = super::schema::product_brands)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct ProductBrandModel {
    pub id: i32,
    pub name: String,
}

#[derive(Debug, Queryable, Selectable, PartialEq, Insertable)]
#[diesel(table_name = super::schema::product_types)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct ProductTypeModel {
    pub id: i32,
    pub name: String,
}

#[derive(Debug, Queryable, Selectable, PartialEq, Insertable)]
#[diesel(table_name = super::schema::products)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct ProductModel {
    pub id: i32,
    pub name: String,
    pub description: String,
    pub price_cents: i64,
    pub picture_url: String,
    pub product_type_id: i32,
    pub product_brand_id: i32,
    pub created_at: NaiveDateTime,
}

impl ProductBrandModel {
    pub fn from_entity(entity: &ProductBrand) -> Self {
        Self {
            id: entity.id,
            name: entity.name.clone(),
        }
    }

    pub fn into_entity(self) -> ProductBrand {
        ProductBrand {
            id: self.id,
            name: self.name,
        }
    }
}

impl ProductTypeModel {
    pub fn from_entity(entity: &ProductType) -> Self {
        Self {
            id: entity.id,
            name: entity.name.clone(),
        }
    }

    pub fn into_entity(self) -> ProductType {
        ProductType {
            id: self.id,
            name: self.name,
        }
    }
}

impl ProductModel {
    pub fn from_entity(entity: &Product) -> Self {
        Self {
            id: entity.id,
            name: entity.name.clone(),
            description: entity.description.clone(),
            price_cents: entity.price_cents,
            picture_url: entity.picture_url.clone(),
            product_type_id: entity.product_type_id,
            product_brand_id: entity.product_brand_id,
            created_at: entity.created_at,
        }
    }

    /// Relations stay empty; they are attached only when a specification asks.
    pub fn into_entity(self) -> Product {
        Product {
            id: self.id,
            name: self.name,
            description: self.description,
            price_cents: self.price_cents,
            picture_url: self.picture_url,
            product_type_id: self.product_type_id,
            product_brand_id: self.product_brand_id,
            created_at: self.created_at,
            product_type: None,
            product_brand: None,
        }
    }
}
