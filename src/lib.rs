pub mod config;
pub mod controller;
pub mod geodesy;
pub mod location;
pub mod map_view;
pub mod session;
pub mod speech;
pub mod tour;
pub mod trigger;
