//! A thin CBOR/Problem-Details HTTP surface over the sharded queue (spec
//! §6.1), behind the `http` feature — analogous to the teacher's optional
//! `axum`-backed debugger sitting behind its own feature flag.

mod cbor;
mod problem;
mod routes;
mod state;

pub use routes::router;
pub use state::EngineState;
