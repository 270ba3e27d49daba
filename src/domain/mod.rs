pub mod constraints;
pub mod entity;
pub mod global_key;
pub mod status;
