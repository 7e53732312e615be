pub mod activate;
pub mod block;
pub mod config;
pub mod federated;
pub mod login;
pub mod refresh;
pub mod register;
pub mod reset_password;
pub mod token_codec;
pub mod users;
