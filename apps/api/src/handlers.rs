pub mod health;
pub mod support_access;
