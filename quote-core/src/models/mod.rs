mod lookup;
mod material_table;
mod operation;
mod quote;
mod rate_table;
mod sales_order;

pub use lookup::{LookupKind, LookupMiss, LookupPolicy};
pub use material_table::MaterialTable;
pub use operation::{Operation, OperationParams, PricingMethod};
pub use quote::Quote;
pub use rate_table::{
    DEFAULT_PROFIT_MARGIN, DEFAULT_WIRE_EDM_AREA_RATE, DEFAULT_WIRE_EDM_HOURLY_RATE,
    PROFIT_MARGIN_KEY, RateTable, WIRE_EDM_AREA_RATE_KEY, WIRE_EDM_MACHINE,
};
pub use sales_order::{
    CONFIRMED_STATUS, Customer, NewSalesOrder, OrderLine, Product, SalesOrder, SalesOrderDraft,
    SalesOrderError,
};
