// Quarantine store and deletion executor tests

mod store_tests;
