pub mod portalnet;
pub mod utils;
