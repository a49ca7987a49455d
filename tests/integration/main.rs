//! Integration tests for Gallery-Scrape
//!
//! These run the whole scrape against a wiremock wiki and check both outputs.

mod scrape_tests;
