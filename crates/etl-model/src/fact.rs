//! Fact table construction.
//!
//! The fact table references each dimension by surrogate key and carries the
//! derived measures:
//!
//! - `gross_revenue = quantity * unit_price`
//! - `net_revenue   = gross_revenue - discount`
//! - `total_cost    = product_cost * quantity + shipping_cost`
//!
//! Surrogate keys are substituted by left-joining the source rows against
//! each dimension on its natural keys. Because the dimensions are derived
//! from the same source, every key must resolve; an unresolved key is an
//! `Integrity` error rather than a silent null.

use polars::prelude::{DataFrame, Expr, IntoLazy, JoinArgs, JoinType, col};
use tracing::info;

use etl_core::error::{EtlError, Result};

use crate::columns;
use crate::dimensions::{Dimension, build_date_dimension, build_dimension};

/// The modeled output: four dimensions and the fact table referencing them.
#[derive(Debug, Clone)]
pub struct StarSchema {
    pub customer: Dimension,
    pub product: Dimension,
    pub seller: Dimension,
    pub date: Dimension,
    pub fact: DataFrame,
}

impl StarSchema {
    pub fn dimensions(&self) -> [&Dimension; 4] {
        [&self.customer, &self.product, &self.seller, &self.date]
    }
}

/// Derive the dimensions and build the fact table from one flat sales table.
pub fn build_star_schema(source: &DataFrame) -> Result<StarSchema> {
    let customer = build_dimension(
        source,
        "customer",
        &[columns::CUSTOMER_ID],
        &[columns::CUSTOMER_COUNTRY, columns::CUSTOMER_SEGMENT],
    )?;
    let product = build_dimension(
        source,
        "product",
        &[columns::PRODUCT_ID],
        &[
            columns::PRODUCT_NAME,
            columns::PRODUCT_CATEGORY,
            columns::PRODUCT_COST,
        ],
    )?;
    let seller = build_dimension(
        source,
        "seller",
        &[columns::SELLER_ID],
        &[columns::SELLER_NAME, columns::SELLER_REGION],
    )?;
    let date = build_date_dimension(source)?;

    let fact = build_fact(source, [&customer, &product, &seller, &date])?;
    info!(
        facts = fact.height(),
        customers = customer.row_count(),
        products = product.row_count(),
        sellers = seller.row_count(),
        dates = date.row_count(),
        "star schema built"
    );
    Ok(StarSchema {
        customer,
        product,
        seller,
        date,
        fact,
    })
}

fn build_fact(source: &DataFrame, dimensions: [&Dimension; 4]) -> Result<DataFrame> {
    for name in [
        columns::TRANSACTION_ID,
        columns::QUANTITY,
        columns::UNIT_PRICE,
        columns::DISCOUNT,
        columns::SHIPPING_COST,
        columns::PRODUCT_COST,
    ] {
        if source.column(name).is_err() {
            return Err(EtlError::unknown_column(name));
        }
    }

    let mut lf = source.clone().lazy().with_columns([
        (col(columns::QUANTITY) * col(columns::UNIT_PRICE)).alias(columns::GROSS_REVENUE),
        (col(columns::QUANTITY) * col(columns::UNIT_PRICE) - col(columns::DISCOUNT))
            .alias(columns::NET_REVENUE),
        (col(columns::PRODUCT_COST) * col(columns::QUANTITY) + col(columns::SHIPPING_COST))
            .alias(columns::TOTAL_COST),
    ]);

    for dimension in dimensions {
        let keys: Vec<Expr> = dimension
            .natural_keys
            .iter()
            .map(|name| col(name.as_str()))
            .collect();
        let mut lookup_columns: Vec<String> = vec![dimension.key_column.clone()];
        lookup_columns.extend(dimension.natural_keys.iter().cloned());
        let lookup = dimension.data.select(lookup_columns)?.lazy();
        lf = lf.join(lookup, keys.clone(), keys, JoinArgs::new(JoinType::Left));
    }

    let joined = lf.collect()?;

    for dimension in dimensions {
        let unresolved = joined.column(&dimension.key_column)?.null_count();
        if unresolved > 0 {
            return Err(EtlError::Integrity(format!(
                "{unresolved} source rows did not match a {} dimension row",
                dimension.name
            )));
        }
    }

    let fact = joined.select([
        columns::TRANSACTION_ID.to_string(),
        "date_key".to_string(),
        "customer_key".to_string(),
        "product_key".to_string(),
        "seller_key".to_string(),
        columns::QUANTITY.to_string(),
        columns::UNIT_PRICE.to_string(),
        columns::DISCOUNT.to_string(),
        columns::SHIPPING_COST.to_string(),
        columns::GROSS_REVENUE.to_string(),
        columns::NET_REVENUE.to_string(),
        columns::TOTAL_COST.to_string(),
    ])?;
    Ok(fact)
}
