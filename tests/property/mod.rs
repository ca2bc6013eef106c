//! Property-based tests for the sequencing combinators
