pub mod codec;
pub mod constants;
pub mod food;
pub mod occupancy;
pub mod session;
pub mod snake;
pub mod types;
