//! Canned summaries over the star schema.
//!
//! These are the modeled layer's stock queries: stable-ordered aggregations
//! joined back through the dimensions. Rendering them is someone else's job.

use polars::prelude::{
    DataFrame, IntoLazy, JoinArgs, JoinType, SortMultipleOptions, col,
};

use etl_core::error::Result;

use crate::columns;
use crate::fact::StarSchema;

/// Revenue per product category: order count, gross, and net revenue.
pub fn revenue_by_category(star: &StarSchema) -> Result<DataFrame> {
    let lookup = star
        .product
        .data
        .select([
            star.product.key_column.clone(),
            columns::PRODUCT_CATEGORY.to_string(),
        ])?
        .lazy();
    let out = star
        .fact
        .clone()
        .lazy()
        .join(
            lookup,
            [col(star.product.key_column.as_str())],
            [col(star.product.key_column.as_str())],
            JoinArgs::new(JoinType::Left),
        )
        .group_by_stable([col(columns::PRODUCT_CATEGORY)])
        .agg([
            col(columns::TRANSACTION_ID).count().alias("order_count"),
            col(columns::GROSS_REVENUE).sum().alias("gross_revenue"),
            col(columns::NET_REVENUE).sum().alias("net_revenue"),
        ])
        .collect()?;
    Ok(out)
}

/// Net revenue per calendar month, in chronological order.
pub fn revenue_by_month(star: &StarSchema) -> Result<DataFrame> {
    let lookup = star
        .date
        .data
        .select([
            star.date.key_column.clone(),
            "year".to_string(),
            "month".to_string(),
        ])?
        .lazy();
    let out = star
        .fact
        .clone()
        .lazy()
        .join(
            lookup,
            [col(star.date.key_column.as_str())],
            [col(star.date.key_column.as_str())],
            JoinArgs::new(JoinType::Left),
        )
        .group_by_stable([col("year"), col("month")])
        .agg([
            col(columns::TRANSACTION_ID).count().alias("order_count"),
            col(columns::NET_REVENUE).sum().alias("net_revenue"),
        ])
        .sort(["year", "month"], SortMultipleOptions::default())
        .collect()?;
    Ok(out)
}

/// The `limit` customers with the highest total net revenue.
pub fn top_customers(star: &StarSchema, limit: usize) -> Result<DataFrame> {
    let lookup = star
        .customer
        .data
        .select([
            star.customer.key_column.clone(),
            columns::CUSTOMER_ID.to_string(),
            columns::CUSTOMER_COUNTRY.to_string(),
        ])?
        .lazy();
    let out = star
        .fact
        .clone()
        .lazy()
        .join(
            lookup,
            [col(star.customer.key_column.as_str())],
            [col(star.customer.key_column.as_str())],
            JoinArgs::new(JoinType::Left),
        )
        .group_by_stable([
            col(columns::CUSTOMER_ID),
            col(columns::CUSTOMER_COUNTRY),
        ])
        .agg([
            col(columns::TRANSACTION_ID).count().alias("order_count"),
            col(columns::NET_REVENUE).sum().alias("net_revenue"),
        ])
        .sort(
            ["net_revenue"],
            SortMultipleOptions::default().with_order_descending(true),
        )
        .limit(limit as u32)
        .collect()?;
    Ok(out)
}
