pub mod routes;
pub mod uploads;

pub use routes::create_routes;
