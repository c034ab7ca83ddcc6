use diesel::expression::BoxableExpression;
use diesel::pg::Pg;
use diesel::prelude::*;
use diesel::sql_types::Bool;

use crate::entities::{Entity, FieldValue};
use crate::repositories::RepositoryError;
use crate::specifications::{CompType, Criteria};

// Builds a boxed filter comparing `$column` with an already converted `CompType`.
macro_rules! compare {
    ($filter:ty, $column:expr, $comp:expr) => {{
        let filter: $filter = match $comp {
            $crate::specifications::CompType::Equals(v) => Box::new($column.eq(v)),
            $crate::specifications::CompType::NotEquals(v) => Box::new($column.ne(v)),
            $crate::specifications::CompType::Gte(v) => Box::new($column.ge(v)),
            $crate::specifications::CompType::Lte(v) => Box::new($column.le(v)),
            $crate::specifications::CompType::Lt(v) => Box::new($column.lt(v)),
            $crate::specifications::CompType::Gt(v) => Box::new($column.gt(v)),
        };
        filter
    }};
}

mod lookups;
mod products;
mod session;

trait SessionInternal {
    fn get_conn(&mut self) -> &mut diesel_async::AsyncPgConnection;
}

pub use lookups::{ProductBrandsRepo, ProductTypesRepo};
pub use products::ProductsRepo;
pub use session::{Session, SessionFactory};

type Filter<Tab> = Box<dyn BoxableExpression<Tab, Pg, SqlType = Bool>>;

/// Turns criteria into a SQL filter, resolving field names through `column`.
///
/// Opaque predicates have no SQL form and are rejected.
fn translate<Tab, E, F>(
    criteria: &Criteria<E>,
    column: &F,
) -> Result<Filter<Tab>, RepositoryError>
where
    Tab: 'static,
    E: Entity,
    F: Fn(&'static str, &CompType<FieldValue>) -> Result<Filter<Tab>, RepositoryError>,
{
    match criteria {
        Criteria::Field { name, comp } => column(*name, comp),
        Criteria::All(items) => {
            let mut filter: Filter<Tab> = Box::new(true.into_sql::<Bool>());
            for item in items {
                filter = Box::new(filter.and(translate(item, column)?));
            }
            Ok(filter)
        }
        Criteria::Any(items) => {
            let mut filter: Filter<Tab> = Box::new(false.into_sql::<Bool>());
            for item in items {
                filter = Box::new(filter.or(translate(item, column)?));
            }
            Ok(filter)
        }
        Criteria::Not(inner) => Ok(Box::new(diesel::dsl::not(translate(inner, column)?))),
        Criteria::Predicate(_) => Err(RepositoryError::Unsupported(format!(
            "opaque predicates over {} cannot be translated to SQL",
            E::KIND
        ))),
    }
}

fn unknown_column<E: Entity>(field: &str) -> RepositoryError {
    RepositoryError::predicate(None, format!("{} has no column `{field}`", E::KIND))
}

fn mismatch(field: &str, expected: &str, value: &FieldValue) -> RepositoryError {
    RepositoryError::predicate(
        None,
        format!(
            "column `{field}` is {expected}, cannot compare with {} value {value}",
            value.type_name()
        ),
    )
}

fn int4(field: &'static str) -> impl Fn(&FieldValue) -> Result<i32, RepositoryError> {
    move |value| {
        value
            .as_int()
            .and_then(|v| i32::try_from(v).ok())
            .ok_or_else(|| mismatch(field, "int4", value))
    }
}

fn int8(field: &'static str) -> impl Fn(&FieldValue) -> Result<i64, RepositoryError> {
    move |value| value.as_int().ok_or_else(|| mismatch(field, "int8", value))
}

fn timestamp(
    field: &'static str,
) -> impl Fn(&FieldValue) -> Result<chrono::NaiveDateTime, RepositoryError> {
    move |value| {
        value
            .as_timestamp()
            .ok_or_else(|| mismatch(field, "timestamp", value))
    }
}

fn text(field: &'static str) -> impl Fn(&FieldValue) -> Result<String, RepositoryError> {
    move |value| {
        value
            .as_text()
            .map(str::to_string)
            .ok_or_else(|| mismatch(field, "text", value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::postgres::schema::product_brands;
    use crate::entities::ProductBrand;

    type BrandFilter = Filter<product_brands::table>;

    fn brand_column(
        field: &'static str,
        comp: &CompType<FieldValue>,
    ) -> Result<BrandFilter, RepositoryError> {
        match field {
            "id" => Ok(compare!(
                BrandFilter,
                product_brands::id,
                comp.try_map(int4(field))?
            )),
            "name" => Ok(compare!(
                BrandFilter,
                product_brands::name,
                comp.try_map(text(field))?
            )),
            _ => Err(unknown_column::<ProductBrand>(field)),
        }
    }

    fn sql(criteria: &Criteria<ProductBrand>) -> Result<String, RepositoryError> {
        let filter = translate(criteria, &brand_column)?;
        let query = product_brands::table
            .select(product_brands::id)
            .filter(filter);
        Ok(diesel::debug_query::<Pg, _>(&query).to_string())
    }

    #[test]
    fn test_translates_field_comparisons() {
        let out = sql(&Criteria::field("id", CompType::Gte(FieldValue::Int(2)))).unwrap();
        assert!(out.contains("\"product_brands\".\"id\" >= $1"), "{out}");

        let out = sql(&Criteria::eq("name", "Angular").negate()).unwrap();
        assert!(out.contains("NOT"), "{out}");
        assert!(out.contains("\"product_brands\".\"name\" = $1"), "{out}");
    }

    #[test]
    fn test_translates_combinators() {
        let out = sql(&Criteria::eq("id", 1).or(Criteria::eq("id", 2))).unwrap();
        assert!(out.contains(" OR "), "{out}");

        let out = sql(&Criteria::eq("id", 1).and(Criteria::eq("name", "x"))).unwrap();
        assert!(out.contains(" AND "), "{out}");
    }

    #[test]
    fn test_rejects_what_sql_cannot_express() {
        let opaque = Criteria::predicate(|b: &ProductBrand| b.id > 1);
        assert!(matches!(sql(&opaque), Err(RepositoryError::Unsupported(_))));

        assert!(matches!(
            sql(&Criteria::eq("colour", "red")),
            Err(RepositoryError::PredicateEvaluation {
                entity_id: None,
                ..
            })
        ));

        assert!(matches!(
            sql(&Criteria::eq("id", "one")),
            Err(RepositoryError::PredicateEvaluation { .. })
        ));

        assert!(matches!(
            sql(&Criteria::eq("id", i64::from(i32::MAX) + 1)),
            Err(RepositoryError::PredicateEvaluation { .. })
        ));
    }
}
