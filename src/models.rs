pub mod item;
pub mod template;
pub mod types;
