pub mod domain;
pub mod interface;
