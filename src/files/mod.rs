pub mod filter;
pub mod paths;
pub mod plan;
pub mod record;
