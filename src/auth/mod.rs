use std::fmt::{Debug, Formatter};

use serde::{Deserialize, Serialize};

pub use negotiator::*;
pub use prompt::*;

mod negotiator;
mod prompt;

/// The workgroup/user/password triple exchanged with the transport's authentication hook.
/// An empty username and password ask for anonymous access.
#[derive(Serialize, Deserialize, Clone, PartialEq, Eq, Default)]
pub struct Credentials {
    pub workgroup: String,
    pub username: String,
    pub password: String,
}

impl Credentials {
    pub fn new<W: Into<String>, U: Into<String>, P: Into<String>>(workgroup: W, username: U, password: P) -> Self {
        Self {
            workgroup: workgroup.into(),
            username: username.into(),
            password: password.into(),
        }
    }

    pub fn anonymous<W: Into<String>>(workgroup: W) -> Self {
        Self::new(workgroup, "", "")
    }

    pub fn is_anonymous(&self) -> bool {
        self.username.is_empty() && self.password.is_empty()
    }
}

impl Debug for Credentials {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("workgroup", &self.workgroup)
            .field("username", &self.username)
            .field("password", &if self.password.is_empty() { "" } else { "<redacted>" })
            .finish()
    }
}

/// The server and share the transport is trying to reach when it asks for credentials.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Default)]
pub struct AuthTarget {
    pub server: String,
    pub share: String,
}

/// The transport-facing authentication hook: `(server, share, workgroup, user, password)
/// -> (workgroup, user, password)`.
///
/// Transports call this whenever the server rejects a session or needs initial
/// credentials. `offered` holds whatever the transport currently has.
pub trait AuthCallback {
    fn authenticate(&mut self, server: &str, share: &str, offered: Credentials) -> Credentials;
}

impl<F: FnMut(&str, &str, Credentials) -> Credentials> AuthCallback for F {
    fn authenticate(&mut self, server: &str, share: &str, offered: Credentials) -> Credentials {
        self(server, share, offered)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn debug_output_redacts_password() {
        let creds = Credentials::new("WORKGROUP", "alice", "secret");
        let printed = format!("{:?}", creds);
        assert!(printed.contains("alice"));
        assert!(!printed.contains("secret"));
    }

    #[test]
    fn closures_are_callbacks() {
        let mut callback = |_server: &str, _share: &str, offered: Credentials| {
            Credentials::new(offered.workgroup, "bob", "hunter2")
        };
        let result = callback.authenticate("fileserver", "IPC$", Credentials::anonymous("WG"));
        assert_eq!(result, Credentials::new("WG", "bob", "hunter2"));
        assert!(Credentials::anonymous("WG").is_anonymous());
    }
}
