pub mod command;
pub mod pilot;
