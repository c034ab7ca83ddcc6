use super::{BaseSpecification, Criteria, Include, Specification};
use crate::entities::{EntityId, Product};

/// Products with their brand and type attached.
pub struct ProductsWithTypesAndBrands {
    inner: BaseSpecification<Product>,
}

impl ProductsWithTypesAndBrands {
    pub fn new() -> Self {
        Self::from_base(BaseSpecification::new())
    }

    pub fn by_id(id: EntityId) -> Self {
        Self::from_base(BaseSpecification::with_criteria(Criteria::eq("id", id)))
    }

    pub fn matching(criteria: Criteria<Product>) -> Self {
        Self::from_base(BaseSpecification::with_criteria(criteria))
    }

    fn from_base(base: BaseSpecification<Product>) -> Self {
        Self {
            inner: base.include(Product::TYPE).include(Product::BRAND),
        }
    }
}

impl Default for ProductsWithTypesAndBrands {
    fn default() -> Self {
        Self::new()
    }
}

impl Specification<Product> for ProductsWithTypesAndBrands {
    fn criteria(&self) -> Option<&Criteria<Product>> {
        self.inner.criteria()
    }

    fn includes(&self) -> &[Include] {
        self.inner.includes()
    }
}
