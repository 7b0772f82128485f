pub mod converter;
pub mod logging;
pub mod models;
pub mod preprocess;
pub mod source;
pub mod store;
