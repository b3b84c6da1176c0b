mod context_tests;
mod display_tests;
mod error_tests;
