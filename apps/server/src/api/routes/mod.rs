mod api;
mod sessions;

pub use api::api_routes;
pub use sessions::session_routes;
