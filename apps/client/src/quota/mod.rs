pub mod models;
pub mod panel;
