//! Property-based tests for query compilation and normalization.
