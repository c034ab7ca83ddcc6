// Brands and types are flat `(id, name)` tables with no relations of their own,
// so both repositories come from one definition.

use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;

use super::session::{bounded, SessionFactory};
use super::{int4, text, translate, unknown_column, Filter, SessionInternal};
use crate::adapters::postgres::models::{ProductBrandModel, ProductTypeModel};
use crate::adapters::postgres::schema::{product_brands, product_types};
use crate::entities::{Entity, EntityId, FieldValue, ProductBrand, ProductType};
use crate::repositories::{GenericRepository, RepositoryError};
use crate::specifications::{CompType, Specification};

macro_rules! lookup_repository {
    ($repo:ident, $entity:ty, $model:ty, $table:ident) => {
        #[derive(Clone)]
        pub struct $repo {
            sessions: SessionFactory,
        }

        impl $repo {
            pub fn new(sessions: SessionFactory) -> Self {
                Self { sessions }
            }

            fn column(
                field: &'static str,
                comp: &CompType<FieldValue>,
            ) -> Result<Filter<$table::table>, RepositoryError> {
                let filter = match field {
                    "id" => compare!(Filter<$table::table>, $table::id, comp.try_map(int4(field))?),
                    "name" => compare!(
                        Filter<$table::table>,
                        $table::name,
                        comp.try_map(text(field))?
                    ),
                    _ => return Err(unknown_column::<$entity>(field)),
                };
                Ok(filter)
            }

            async fn load(
                &self,
                spec: &dyn Specification<$entity>,
                limit: Option<i64>,
            ) -> Result<Vec<$entity>, RepositoryError> {
                if let Some(include) = spec.includes().first() {
                    return Err(RepositoryError::Unsupported(format!(
                        "{} has no relation `{}`",
                        <$entity as Entity>::KIND,
                        include.relation()
                    )));
                }
                let mut query = $table::table
                    .select(<$model>::as_select())
                    .order($table::id.asc())
                    .into_boxed();
                if let Some(criteria) = spec.criteria() {
                    query = query.filter(translate(criteria, &Self::column)?);
                }
                if let Some(limit) = limit {
                    query = query.limit(limit);
                }

                let mut session = self.sessions.open().await?;
                let timeout = session.timeout();
                let rows: Vec<$model> = bounded(timeout, query.load(session.get_conn())).await?;
                Ok(rows.into_iter().map(<$model>::into_entity).collect())
            }
        }

        #[async_trait]
        impl GenericRepository<$entity> for $repo {
            async fn get_by_id(&self, id: EntityId) -> Result<Option<$entity>, RepositoryError> {
                let mut session = self.sessions.open().await?;
                let timeout = session.timeout();
                let conn = session.get_conn();
                let row = bounded(timeout, async move {
                    $table::table
                        .find(id)
                        .select(<$model>::as_select())
                        .first::<$model>(conn)
                        .await
                        .optional()
                })
                .await?;
                Ok(row.map(<$model>::into_entity))
            }

            async fn list_all(&self) -> Result<Vec<$entity>, RepositoryError> {
                let mut session = self.sessions.open().await?;
                let timeout = session.timeout();
                let rows = bounded(
                    timeout,
                    $table::table
                        .select(<$model>::as_select())
                        .order($table::id.asc())
                        .load::<$model>(session.get_conn()),
                )
                .await?;
                tracing::debug!(
                    entity = <$entity as Entity>::KIND,
                    count = rows.len(),
                    "list_all"
                );
                Ok(rows.into_iter().map(<$model>::into_entity).collect())
            }

            async fn get_entity_with_spec(
                &self,
                spec: &dyn Specification<$entity>,
            ) -> Result<Option<$entity>, RepositoryError> {
                Ok(self.load(spec, Some(1)).await?.into_iter().next())
            }

            async fn list(
                &self,
                spec: &dyn Specification<$entity>,
            ) -> Result<Vec<$entity>, RepositoryError> {
                let found = self.load(spec, None).await?;
                tracing::debug!(
                    entity = <$entity as Entity>::KIND,
                    count = found.len(),
                    "list"
                );
                Ok(found)
            }
        }
    };
}

lookup_repository!(
    ProductBrandsRepo,
    ProductBrand,
    ProductBrandModel,
    product_brands
);
lookup_repository!(ProductTypesRepo, ProductType, ProductTypeModel, product_types);
