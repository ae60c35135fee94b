pub mod client_addr;
pub mod cookies;
pub mod middleware;
