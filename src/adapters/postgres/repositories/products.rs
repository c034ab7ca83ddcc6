use std::collections::HashMap;

use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;

use super::session::{bounded, Session, SessionFactory};
use super::{int4, int8, text, timestamp, translate, unknown_column, Filter, SessionInternal};
use crate::adapters::postgres::models::{ProductBrandModel, ProductModel, ProductTypeModel};
use crate::adapters::postgres::schema::{product_brands, product_types, products};
use crate::entities::{EntityId, FieldValue, Product};
use crate::repositories::{GenericRepository, RepositoryError};
use crate::specifications::{CompType, Include, Specification};

type ProductFilter = Filter<products::table>;

#[derive(Clone)]
pub struct ProductsRepo {
    sessions: SessionFactory,
}

impl ProductsRepo {
    pub fn new(sessions: SessionFactory) -> Self {
        Self { sessions }
    }

    fn column(
        field: &'static str,
        comp: &CompType<FieldValue>,
    ) -> Result<ProductFilter, RepositoryError> {
        let filter = match field {
            "id" => compare!(ProductFilter, products::id, comp.try_map(int4(field))?),
            "name" => compare!(ProductFilter, products::name, comp.try_map(text(field))?),
            "description" => compare!(
                ProductFilter,
                products::description,
                comp.try_map(text(field))?
            ),
            "price_cents" => compare!(
                ProductFilter,
                products::price_cents,
                comp.try_map(int8(field))?
            ),
            "picture_url" => compare!(
                ProductFilter,
                products::picture_url,
                comp.try_map(text(field))?
            ),
            "product_type_id" => compare!(
                ProductFilter,
                products::product_type_id,
                comp.try_map(int4(field))?
            ),
            "product_brand_id" => compare!(
                ProductFilter,
                products::product_brand_id,
                comp.try_map(int4(field))?
            ),
            "created_at" => compare!(
                ProductFilter,
                products::created_at,
                comp.try_map(timestamp(field))?
            ),
            _ => return Err(unknown_column::<Product>(field)),
        };
        Ok(filter)
    }

    fn check_includes(includes: &[Include]) -> Result<(), RepositoryError> {
        match includes
            .iter()
            .find(|include| ![Product::BRAND, Product::TYPE].contains(&include.relation()))
        {
            Some(include) => Err(RepositoryError::Unsupported(format!(
                "product has no relation `{}`",
                include.relation()
            ))),
            None => Ok(()),
        }
    }

    async fn load(
        &self,
        spec: &dyn Specification<Product>,
        limit: Option<i64>,
    ) -> Result<Vec<Product>, RepositoryError> {
        Self::check_includes(spec.includes())?;
        let mut query = products::table
            .select(ProductModel::as_select())
            .order(products::id.asc())
            .into_boxed();
        if let Some(criteria) = spec.criteria() {
            query = query.filter(translate(criteria, &Self::column)?);
        }
        if let Some(limit) = limit {
            query = query.limit(limit);
        }

        let mut session = self.sessions.open().await?;
        let timeout = session.timeout();
        let rows: Vec<ProductModel> = bounded(timeout, query.load(session.get_conn())).await?;
        let mut found: Vec<Product> = rows.into_iter().map(ProductModel::into_entity).collect();
        Self::attach(&mut session, &mut found, spec.includes()).await?;
        Ok(found)
    }

    /// Resolves each include with one `IN` query and attaches the results.
    async fn attach(
        session: &mut Session,
        found: &mut [Product],
        includes: &[Include],
    ) -> Result<(), RepositoryError> {
        if found.is_empty() {
            return Ok(());
        }
        let timeout = session.timeout();
        for include in includes {
            match include.relation() {
                Product::BRAND => {
                    let ids: Vec<EntityId> = found.iter().map(|p| p.product_brand_id).collect();
                    let brands: HashMap<EntityId, _> = bounded(
                        timeout,
                        product_brands::table
                            .filter(product_brands::id.eq_any(ids))
                            .select(ProductBrandModel::as_select())
                            .load::<ProductBrandModel>(session.get_conn()),
                    )
                    .await?
                    .into_iter()
                    .map(|model| (model.id, model.into_entity()))
                    .collect();
                    for product in found.iter_mut() {
                        product.product_brand = brands.get(&product.product_brand_id).cloned();
                    }
                }
                Product::TYPE => {
                    let ids: Vec<EntityId> = found.iter().map(|p| p.product_type_id).collect();
                    let types: HashMap<EntityId, _> = bounded(
                        timeout,
                        product_types::table
                            .filter(product_types::id.eq_any(ids))
                            .select(ProductTypeModel::as_select())
                            .load::<ProductTypeModel>(session.get_conn()),
                    )
                    .await?
                    .into_iter()
                    .map(|model| (model.id, model.into_entity()))
                    .collect();
                    for product in found.iter_mut() {
                        product.product_type = types.get(&product.product_type_id).cloned();
                    }
                }
                other => {
                    return Err(RepositoryError::Unsupported(format!(
                        "product has no relation `{other}`"
                    )));
                }
            }
        }
        Ok(())
    }
}

#[async_trait]
impl GenericRepository<Product> for ProductsRepo {
    async fn get_by_id(&self, id: EntityId) -> Result<Option<Product>, RepositoryError> {
        let mut session = self.sessions.open().await?;
        let timeout = session.timeout();
        let conn = session.get_conn();
        let product = bounded(timeout, async move {
            products::table
                .find(id)
                .select(ProductModel::as_select())
                .first::<ProductModel>(conn)
                .await
                .optional()
        })
        .await?;
        tracing::debug!(id, found = product.is_some(), "product get_by_id");
        Ok(product.map(ProductModel::into_entity))
    }

    async fn list_all(&self) -> Result<Vec<Product>, RepositoryError> {
        let mut session = self.sessions.open().await?;
        let timeout = session.timeout();
        let rows = bounded(
            timeout,
            products::table
                .select(ProductModel::as_select())
                .order(products::id.asc())
                .load::<ProductModel>(session.get_conn()),
        )
        .await?;
        tracing::debug!(count = rows.len(), "product list_all");
        Ok(rows.into_iter().map(ProductModel::into_entity).collect())
    }

    async fn get_entity_with_spec(
        &self,
        spec: &dyn Specification<Product>,
    ) -> Result<Option<Product>, RepositoryError> {
        let found = self.load(spec, Some(1)).await?.into_iter().next();
        tracing::debug!(found = found.is_some(), "product get_entity_with_spec");
        Ok(found)
    }

    async fn list(
        &self,
        spec: &dyn Specification<Product>,
    ) -> Result<Vec<Product>, RepositoryError> {
        let found = self.load(spec, None).await?;
        tracing::debug!(count = found.len(), "product list");
        Ok(found)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::postgres::{apply_migrations, revert_migrations, ProductBrandsRepo};
    use crate::config::DatabaseSettings;
    use crate::entities::{ProductBrand, ProductType};
    use crate::specifications::{BaseSpecification, Criteria, ProductsWithTypesAndBrands};
    use crate::telemetry;
    use diesel_async::{AsyncConnection, AsyncPgConnection};
    use rstest::{fixture, rstest};
    use serial_test::serial;
    use tokio::runtime::{Builder, Runtime};

    // Fixtures stay sync: the runtime travels with the value, and the cleanup
    // closure runs on drop once the test is done with the database.
    struct WithCleanup<ValT> {
        pub closure: Box<dyn FnMut()>,
        pub val: ValT,
    }

    impl<ValT> Drop for WithCleanup<ValT> {
        fn drop(&mut self) {
            (*self.closure)();
        }
    }

    #[fixture]
    fn runtime() -> Runtime {
        Builder::new_current_thread().enable_all().build().unwrap()
    }

    #[fixture]
    fn settings() -> DatabaseSettings {
        DatabaseSettings::from_env().expect("DATABASE_URL must be set")
    }

    fn brand(id: EntityId, name: &str) -> ProductBrand {
        ProductBrand {
            id,
            name: name.to_string(),
        }
    }

    fn listed_on(id: EntityId) -> chrono::NaiveDateTime {
        chrono::NaiveDate::from_ymd_opt(2024, 7, 1)
            .and_then(|day| day.and_hms_opt(9, 0, 0))
            .unwrap()
            + chrono::Duration::days(id.into())
    }

    fn product(
        id: EntityId,
        name: &str,
        price_cents: i64,
        type_id: EntityId,
        brand_id: EntityId,
    ) -> Product {
        Product {
            id,
            name: name.to_string(),
            description: format!("{name}, as seen in the catalog"),
            price_cents,
            picture_url: format!("images/products/{id}.png"),
            product_type_id: type_id,
            product_brand_id: brand_id,
            created_at: listed_on(id),
            product_type: None,
            product_brand: None,
        }
    }

    #[fixture]
    fn catalog_db(
        runtime: Runtime,
        settings: DatabaseSettings,
    ) -> WithCleanup<(SessionFactory, Runtime)> {
        telemetry::init();
        apply_migrations(&settings.url).expect("Error applying migrations");

        let brands = [brand(1, "Angular"), brand(2, "React")];
        let types = [
            ProductType {
                id: 1,
                name: "Boards".to_string(),
            },
            ProductType {
                id: 2,
                name: "Hats".to_string(),
            },
        ];
        let products = [
            product(1, "Angular Speedster Board", 20000, 1, 1),
            product(2, "React Cap", 1500, 2, 2),
            product(3, "Angular Cap", 1000, 2, 1),
        ];

        runtime.block_on(async {
            let mut conn = AsyncPgConnection::establish(&settings.url)
                .await
                .expect("Error connecting to test database");
            diesel::insert_into(product_brands::table)
                .values(brands.iter().map(ProductBrandModel::from_entity).collect::<Vec<_>>())
                .execute(&mut conn)
                .await
                .expect("Error seeding brands");
            diesel::insert_into(product_types::table)
                .values(types.iter().map(ProductTypeModel::from_entity).collect::<Vec<_>>())
                .execute(&mut conn)
                .await
                .expect("Error seeding types");
            diesel::insert_into(products::table)
                .values(products.iter().map(ProductModel::from_entity).collect::<Vec<_>>())
                .execute(&mut conn)
                .await
                .expect("Error seeding products");
        });

        let sessions = SessionFactory::from_settings(&settings).expect("Error building pool");
        let url = settings.url.clone();
        WithCleanup {
            val: (sessions, runtime),
            closure: Box::new(move || {
                revert_migrations(&url).expect("Error reverting migrations");
            }),
        }
    }

    #[rstest]
    #[serial(catalog_db)]
    #[ignore = "needs DATABASE_URL pointing at a disposable PostgreSQL database"]
    fn test_lookup_scenario(catalog_db: WithCleanup<(SessionFactory, Runtime)>) {
        let (sessions, runtime) = &catalog_db.val;
        let repo = ProductsRepo::new(sessions.clone());

        let found = runtime.block_on(repo.get_by_id(2)).unwrap().unwrap();
        assert_eq!(found.name, "React Cap");
        assert!(found.product_brand.is_none());
        assert_eq!(runtime.block_on(repo.get_by_id(5)).unwrap(), None);

        let all = runtime.block_on(repo.list_all()).unwrap();
        assert_eq!(all.iter().map(|p| p.id).collect::<Vec<_>>(), vec![1, 2, 3]);
        let listed = runtime
            .block_on(repo.list(&BaseSpecification::<Product>::new()))
            .unwrap();
        assert_eq!(listed, all);
    }

    #[rstest]
    #[serial(catalog_db)]
    #[ignore = "needs DATABASE_URL pointing at a disposable PostgreSQL database"]
    fn test_spec_filters_and_includes(catalog_db: WithCleanup<(SessionFactory, Runtime)>) {
        let (sessions, runtime) = &catalog_db.val;
        let repo = ProductsRepo::new(sessions.clone());

        let spec = ProductsWithTypesAndBrands::matching(
            Criteria::eq("product_brand_id", 1)
                .and(Criteria::field("price_cents", CompType::Lt(FieldValue::Int(5000)))),
        );
        let caps = runtime.block_on(repo.list(&spec)).unwrap();
        assert_eq!(caps.len(), 1);
        assert_eq!(caps[0].id, 3);
        assert_eq!(caps[0].product_brand, Some(brand(1, "Angular")));
        assert_eq!(caps[0].product_type.as_ref().map(|t| t.name.as_str()), Some("Hats"));

        let first = runtime
            .block_on(repo.get_entity_with_spec(&ProductsWithTypesAndBrands::by_id(1)))
            .unwrap()
            .unwrap();
        assert_eq!(first.product_type.map(|t| t.id), Some(1));

        let none = runtime
            .block_on(repo.get_entity_with_spec(&ProductsWithTypesAndBrands::by_id(42)))
            .unwrap();
        assert_eq!(none, None);

        let recent = BaseSpecification::with_criteria(Criteria::field(
            "created_at",
            CompType::Gte(FieldValue::Timestamp(listed_on(2))),
        ));
        let found: Vec<EntityId> = runtime
            .block_on(repo.list(&recent))
            .unwrap()
            .into_iter()
            .map(|p| p.id)
            .collect();
        assert_eq!(found, vec![2, 3]);
    }

    #[test]
    fn test_timestamp_column_translation() {
        let recent = Criteria::<Product>::field(
            "created_at",
            CompType::Gte(FieldValue::Timestamp(listed_on(2))),
        );
        let filter = translate(&recent, &ProductsRepo::column).unwrap();
        let query = products::table.select(products::id).filter(filter);
        let out = diesel::debug_query::<diesel::pg::Pg, _>(&query).to_string();
        assert!(out.contains("\"products\".\"created_at\" >= $1"), "{out}");

        let wrong = Criteria::<Product>::field("created_at", CompType::Gte(FieldValue::Int(2)));
        assert!(matches!(
            translate(&wrong, &ProductsRepo::column),
            Err(RepositoryError::PredicateEvaluation { .. })
        ));
    }

    #[rstest]
    #[serial(catalog_db)]
    #[ignore = "needs DATABASE_URL pointing at a disposable PostgreSQL database"]
    fn test_untranslatable_spec_is_rejected(catalog_db: WithCleanup<(SessionFactory, Runtime)>) {
        let (sessions, runtime) = &catalog_db.val;
        let repo = ProductsRepo::new(sessions.clone());

        let opaque =
            BaseSpecification::with_criteria(Criteria::predicate(|p: &Product| p.price_cents > 0));
        assert!(matches!(
            runtime.block_on(repo.list(&opaque)),
            Err(RepositoryError::Unsupported(_))
        ));

        let bad_include = BaseSpecification::<Product>::new().include("reviews");
        assert!(matches!(
            runtime.block_on(repo.list(&bad_include)),
            Err(RepositoryError::Unsupported(_))
        ));

        let brands = ProductBrandsRepo::new(sessions.clone());
        let named = BaseSpecification::with_criteria(Criteria::<ProductBrand>::eq("name", "React"));
        let react = runtime.block_on(brands.list(&named)).unwrap();
        assert_eq!(react, vec![brand(2, "React")]);
    }
}
