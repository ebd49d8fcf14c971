// Request/reply contract tests

mod handle_tests;
