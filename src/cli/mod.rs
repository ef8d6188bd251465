pub mod completions;
pub mod edit;
pub mod run;
