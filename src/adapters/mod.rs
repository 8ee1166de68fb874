pub mod csv_store;
pub mod http;

pub use http::PublicDataClient;
