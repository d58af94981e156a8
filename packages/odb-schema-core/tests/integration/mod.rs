//! Integration test suite for the schema evolution core.
//!
//! 1. Conversion registry behavior against native casts
//! 2. Relation schema persistence through files
//! 3. Migration of stored rows across schema versions

pub mod conversion_tests;
pub mod helpers;
pub mod migration_tests;
pub mod persistence_tests;
