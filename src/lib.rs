// Library root for the mesh broker proxy

pub mod api;
pub mod config;
pub mod core;
pub mod credentials;
pub mod interceptor;
pub mod mesh;
pub mod model;
pub mod proxy;
