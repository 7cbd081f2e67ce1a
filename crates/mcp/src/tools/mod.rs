pub mod sales;
pub mod schema;
mod registry;

pub use registry::{
    json_schema_boolean, json_schema_integer, json_schema_number, json_schema_object,
    json_schema_string, RegistryError, ToolError, ToolHandler, ToolRegistry,
};
pub use sales::{
    register_sales_tools, CustomerOrdersTool, ShopPerformanceTool, TopSellingProductsTool,
    CUSTOMER_ORDERS, SHOP_PERFORMANCE, TOP_SELLING_PRODUCTS,
};
pub use schema::{Arguments, ParamSpec, ParamType, SchemaError, ToolDescriptor, ValidationError};
