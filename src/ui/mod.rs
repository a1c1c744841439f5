//! Front ends driving a `SessionManager`.

pub mod console;
