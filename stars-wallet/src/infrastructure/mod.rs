//! Infrastructure layer
//!
//! Service wiring and orchestration

pub mod service_container;

pub use service_container::ServiceContainer;
