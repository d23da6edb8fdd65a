pub mod commands;
pub mod config;
pub mod engine;
pub mod layout;
pub mod scene;
pub mod studio;
#[doc(hidden)]
pub mod test_support;
pub mod tree;
