use serde::{Deserialize, Serialize};

use crate::auth::Credentials;

/// What the interactive step is asked to fill in. `username` and `domain` are prefilled
/// from the credentials of the round that just failed.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct PromptRequest {
    pub server: String,
    pub share: String,
    pub username: String,
    pub domain: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PromptResponse {
    Credentials(Credentials),
    Cancel,
}

/// Asks a human for `(username, domain, password)`.
///
/// Implementations may block for as long as the human takes. Returning
/// [`PromptResponse::Cancel`] ends the negotiation.
pub trait CredentialPrompt {
    fn prompt(&mut self, request: &PromptRequest) -> PromptResponse;
}

impl<F: FnMut(&PromptRequest) -> PromptResponse> CredentialPrompt for F {
    fn prompt(&mut self, request: &PromptRequest) -> PromptResponse {
        self(request)
    }
}

/// Login name of the local user, used in place of the guest account when prefilling.
pub fn local_username() -> Option<String> {
    ["USER", "LOGNAME", "USERNAME"].iter()
        .filter_map(|var| std::env::var(var).ok())
        .find(|name| !name.is_empty())
}
