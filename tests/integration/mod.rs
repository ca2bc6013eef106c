//! Integration tests for the asset loader

mod listener_lifecycle;
mod test_utils;
