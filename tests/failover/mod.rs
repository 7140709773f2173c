pub mod donation_tests;
pub mod key_tests;
pub mod runner_tests;
