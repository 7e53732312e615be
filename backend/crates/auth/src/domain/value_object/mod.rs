pub mod activation_code;
pub mod email;
pub mod user_password;
pub mod user_role;

pub use activation_code::ActivationCode;
pub use email::Email;
pub use user_password::UserPassword;
pub use user_role::UserRole;
