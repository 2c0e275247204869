// Function invocation
pub mod run;
