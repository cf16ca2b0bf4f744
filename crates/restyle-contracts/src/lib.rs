pub mod catalog;
pub mod context;
pub mod scene;
pub mod tables;
