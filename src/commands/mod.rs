pub mod extract;
pub mod migrate;
pub mod status;
