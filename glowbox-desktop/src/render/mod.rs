pub mod backend;
pub mod instance;
pub mod program;
