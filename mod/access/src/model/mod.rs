mod permission;
mod role;
mod token;
mod user;

pub use permission::*;
pub use role::*;
pub use token::*;
pub use user::*;
