// src/lib.rs

pub mod api;
pub mod core;
pub mod scoring;
pub mod storage;
