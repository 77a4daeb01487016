//! User accounts, password credentials and bearer tokens.

mod auth;
mod sqlite_user_store;
mod user_manager;
mod user_models;
mod user_store;

pub use auth::{hash_password, verify_password, TokenClaims, TokenIssuer, TokenKind};
pub use sqlite_user_store::SqliteUserStore;
pub use user_manager::{UserManager, TOKEN_TYPE};
pub use user_models::{
    LoginRequest, LoginResponse, RefreshRequest, RefreshResponse, Registration, User, UserId,
    UserView,
};
pub use user_store::UserStore;
