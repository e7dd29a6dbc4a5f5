pub mod context;
pub mod guard;
