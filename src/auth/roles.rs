// src/auth/roles.rs
//! Role checks. There is no role column; the first registered account is
//! the administrator.

pub const ADMIN_USER_ID: i64 = 1;

pub fn is_admin(user_id: i64) -> bool {
    user_id == ADMIN_USER_ID
}
