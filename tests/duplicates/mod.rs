// Duplicate detection tests

mod dedup_tests;
