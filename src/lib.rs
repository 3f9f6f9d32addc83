//! Library exports for the internet clipboard application
//!
//! This module exposes internal components for testing and potential library usage.

pub mod config;
pub mod database;
pub mod error;
pub mod handler;
pub mod middleware;
pub mod model;
pub mod repository;
pub mod route;
pub mod storage;
pub mod validation;
pub mod view;
