use super::user_models::{User, UserId};
use anyhow::Result;

pub trait UserStore: Send + Sync {
    /// Creates a new user and returns the user id.
    /// Uniqueness of email and username is enforced by the caller.
    fn create_user(&self, email: &str, username: &str, password_hash: &str) -> Result<UserId>;

    /// Returns Ok(None) if the user does not exist.
    fn get_user(&self, id: UserId) -> Result<Option<User>>;

    /// Returns Ok(None) if no user has this email.
    fn get_user_by_email(&self, email: &str) -> Result<Option<User>>;

    /// Returns any user whose email or username matches.
    fn find_by_email_or_username(&self, email: &str, username: &str) -> Result<Option<User>>;
}
