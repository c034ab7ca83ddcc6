use std::sync::Arc;

use super::InMemoryRepository;
use crate::entities::{Product, ProductBrand, ProductType};

pub struct InMemoryCatalog {
    pub brands: Arc<InMemoryRepository<ProductBrand>>,
    pub types: Arc<InMemoryRepository<ProductType>>,
    pub products: Arc<InMemoryRepository<Product>>,
}

/// Builds the three catalog stores, with products able to include their
/// brand and type. A dangling reference leaves the relation empty.
pub fn in_memory_catalog(
    brands: Vec<ProductBrand>,
    types: Vec<ProductType>,
    products: Vec<Product>,
) -> InMemoryCatalog {
    let brands = Arc::new(InMemoryRepository::from_entities(brands));
    let types = Arc::new(InMemoryRepository::from_entities(types));

    let brand_source = Arc::clone(&brands);
    let type_source = Arc::clone(&types);
    let products = InMemoryRepository::from_entities(products)
        .with_relation(Product::BRAND, move |product: &mut Product| {
            product.product_brand = brand_source.lookup(product.product_brand_id)?;
            Ok(())
        })
        .with_relation(Product::TYPE, move |product: &mut Product| {
            product.product_type = type_source.lookup(product.product_type_id)?;
            Ok(())
        });

    InMemoryCatalog {
        brands,
        types,
        products: Arc::new(products),
    }
}
