pub mod admin;
pub mod client;
pub mod failover;
pub mod network;
pub mod vision;

pub use client::KimaakaClient;
