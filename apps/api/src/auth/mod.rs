//! Session identity and role gating.

pub mod guard;
pub mod password;
pub mod session;
