//! Unit test module
//!
//! Middleware unit tests live here, separate from source files.
//! Tests interact with middleware via public and pub(crate) APIs.

mod middleware_test;
mod session_middleware_test;
mod throttling_test;
