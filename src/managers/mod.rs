pub mod actions;
pub mod execute;
pub mod integrations;
pub mod knowledge;
