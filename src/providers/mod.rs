pub mod hpcloud;
pub(crate) mod utils;
pub mod vultr;
