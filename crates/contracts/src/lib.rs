pub mod sales;
pub mod shared;
