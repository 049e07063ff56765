pub mod cache;
pub mod channels;
pub mod error;
pub mod events;
pub mod handlers;
pub mod middleware;
pub mod picon;
pub mod routes;

pub use routes::create_router;
