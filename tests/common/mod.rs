//! Common test utilities for misp-ioc-export integration tests

#[allow(dead_code)]
pub mod config;
#[allow(dead_code)]
pub mod mock_misp;

#[allow(unused_imports)]
pub use config::*;
#[allow(unused_imports)]
pub use mock_misp::*;
