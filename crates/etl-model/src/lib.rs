//! Dimensional modeling over one flat sales table.
//!
//! The modeler derives customer/product/seller/date dimensions (distinct
//! natural-key combinations with sequential surrogate keys) and a fact table
//! referencing them, with revenue and cost measures computed per row. The
//! expected source columns are listed in [`columns`].

pub mod dimensions;
pub mod fact;
pub mod reports;

/// Source column contract for the modeler.
pub mod columns {
    pub const TRANSACTION_ID: &str = "transaction_id";
    pub const DATE: &str = "date";
    pub const CUSTOMER_ID: &str = "customer_id";
    pub const CUSTOMER_COUNTRY: &str = "customer_country";
    pub const CUSTOMER_SEGMENT: &str = "customer_segment";
    pub const PRODUCT_ID: &str = "product_id";
    pub const PRODUCT_NAME: &str = "product_name";
    pub const PRODUCT_CATEGORY: &str = "product_category";
    pub const PRODUCT_COST: &str = "product_cost";
    pub const SELLER_ID: &str = "seller_id";
    pub const SELLER_NAME: &str = "seller_name";
    pub const SELLER_REGION: &str = "seller_region";
    pub const QUANTITY: &str = "quantity";
    pub const UNIT_PRICE: &str = "unit_price";
    pub const DISCOUNT: &str = "discount";
    pub const SHIPPING_COST: &str = "shipping_cost";

    // Derived measures
    pub const GROSS_REVENUE: &str = "gross_revenue";
    pub const NET_REVENUE: &str = "net_revenue";
    pub const TOTAL_COST: &str = "total_cost";
}

pub use dimensions::{Dimension, build_date_dimension, build_dimension};
pub use fact::{StarSchema, build_star_schema};
pub use reports::{revenue_by_category, revenue_by_month, top_customers};
