pub mod controller;
pub mod resolver;
