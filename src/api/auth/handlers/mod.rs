mod account;
mod password;
mod users;

pub(super) use account::{get_profile, login, logout, register, update_profile, update_user};
pub(super) use password::{change_password, reset_password, send_otp, verify_otp};
pub(super) use users::{get_user, list_users};
