pub mod dto;
pub mod handlers;
pub mod middleware;
pub mod policy;
pub mod router;
