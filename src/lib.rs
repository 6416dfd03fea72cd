pub mod config;
pub mod errors;
pub mod gateway;
pub mod notifications;
pub mod pager;
pub mod session;
pub mod storefront;
