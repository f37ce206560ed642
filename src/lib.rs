pub mod app;
pub mod config;
pub mod features;
pub mod gfx;
pub mod scheduler;
pub mod storage;
pub mod surface;
