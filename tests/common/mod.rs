pub mod structs;
pub mod utils;
