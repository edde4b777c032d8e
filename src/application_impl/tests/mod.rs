//! Service-level tests over in-memory backends and a manual clock.

mod support;

mod auth_service_tests;
