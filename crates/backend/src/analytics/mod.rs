pub mod customers;
pub mod filters;
pub mod sales;
