pub mod callbacks;
pub mod duration;
pub mod gateway;
pub mod types;
