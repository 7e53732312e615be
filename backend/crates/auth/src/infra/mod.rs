pub mod mailer;
pub mod oauth;
pub mod postgres;
