mod error;
pub use error::ApiError;

mod handler;
pub use handler::ApiHandler;

mod adapter;
pub use adapter::CoreApiAdapter;

mod route;

mod http;
pub use http::{HttpApi, HttpConfig, MAX_REQUEST_BODY_BYTES};

pub use axum;
