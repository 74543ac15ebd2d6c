//! Session keys. The username stored here is the normalized form and is
//! the sender identity for everything the user does on a live connection.

pub const USERNAME: &str = "username";
