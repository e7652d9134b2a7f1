//! Property-based tests

mod mutation_log_proptest;
