pub mod config_cmd;
pub mod list;
pub mod seed;
pub mod serve;
