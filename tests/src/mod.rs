#[cfg(test)]
pub mod admin_workflow_tests;
#[cfg(test)]
pub mod persistence_tests;
#[cfg(test)]
pub mod utils;
