#![allow(clippy::too_many_arguments)]

pub mod app;
pub mod canvas;
pub mod cli;
pub mod controller;
pub mod exporter;
pub mod guide;
pub mod io;
pub mod logger;
pub mod planner;
pub mod session;
pub mod viewport;
