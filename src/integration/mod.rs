//! Integration tests that run the full handler against a filesystem store
//! and scripted encoders.

pub mod e2e;
pub mod fixtures;
