//! HTTP surface: the JSON API, the IP gate in front of it, and the
//! server-rendered dashboard.

mod dashboard;
mod error;
mod event_participants;
mod events;
mod gate;
mod ips;
mod locations;
mod participants;
mod resource;
mod routes;
mod validate;

pub use error::ApiError;
pub use routes::app;
