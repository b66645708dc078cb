pub mod memory_lol;
pub mod oauth;
pub mod serper;
pub mod twitter;
