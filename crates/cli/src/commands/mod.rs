pub mod migrate;
pub mod products;
