pub mod config;
pub mod features;
pub mod forecast;
pub mod price;
pub mod quality;
pub mod result;
pub mod signal;
