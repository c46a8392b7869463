use serde::{Deserialize, Serialize};

use smbc_core::error::{SMBCConfigurationError, SMBCError};
use smbc_core::logging::{debug, trace, warn};
use smbc_core::SMBCResult;

use crate::auth::{local_username, AuthCallback, AuthTarget, Credentials, CredentialPrompt, PromptRequest, PromptResponse};

/// The escalation ladder: configured credentials, then the guest account, then the prompt.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct NegotiationPolicy {
    /// Rounds allowed per negotiation, the optimistic first round included.
    pub max_rounds: u32,
    /// Rounds spent on the guest account before prompting.
    pub guest_attempts: u32,
    pub guest_username: String,
}

impl Default for NegotiationPolicy {
    fn default() -> Self {
        Self {
            max_rounds: 10,
            guest_attempts: 1,
            guest_username: "guest".into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NegotiationPhase {
    Init,
    RetryCallback,
    GuestFallback,
    Prompt,
    Authenticated,
    Cancelled,
    Exhausted,
    Failed,
}

impl NegotiationPhase {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Authenticated | Self::Cancelled | Self::Exhausted | Self::Failed)
    }
}

/// Per-attempt bookkeeping. Created with the negotiator and dropped with it.
#[derive(Debug, Clone, Default)]
pub struct AuthState {
    attempt: u32,
    failed: bool,
    called_back: bool,
    guest_attempts: u32,
    credentials: Credentials,
    target: Option<AuthTarget>,
}

impl AuthState {
    pub fn attempt(&self) -> u32 {
        self.attempt
    }

    pub fn failed(&self) -> bool {
        self.failed
    }

    pub fn called_back(&self) -> bool {
        self.called_back
    }

    pub fn tried_guest(&self) -> bool {
        self.guest_attempts > 0
    }

    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    pub fn target(&self) -> Option<&AuthTarget> {
        self.target.as_ref()
    }
}

pub type InitialAuthentication<'p> = &'p mut dyn FnMut(&AuthTarget, &mut Credentials);

/// Drives repeated connection attempts for one listing.
///
/// ```
/// # use smbc::auth::{AuthNegotiator, Credentials, NegotiationPolicy};
/// let mut negotiator = AuthNegotiator::new(NegotiationPolicy::default(), Credentials::default());
/// while negotiator.begin_round()? {
///     // attempt the operation, handing `&mut negotiator` to the transport as its
///     // authentication callback, and call `mark_failed` when it is rejected
/// }
/// # Ok::<(), smbc_core::error::SMBCError>(())
/// ```
pub struct AuthNegotiator<'p> {
    policy: NegotiationPolicy,
    state: AuthState,
    phase: NegotiationPhase,
    prompt: Option<&'p mut dyn CredentialPrompt>,
    initial_authentication: Option<InitialAuthentication<'p>>,
    last_failure: Option<SMBCError>,
}

impl<'p> AuthNegotiator<'p> {
    pub fn new(policy: NegotiationPolicy, credentials: Credentials) -> Self {
        Self {
            policy,
            state: AuthState {
                credentials,
                ..AuthState::default()
            },
            phase: NegotiationPhase::Init,
            prompt: None,
            initial_authentication: None,
            last_failure: None,
        }
    }

    pub fn with_prompt(mut self, prompt: Option<&'p mut dyn CredentialPrompt>) -> Self {
        self.prompt = prompt;
        self
    }

    /// Hook run in the first round, before the configured credentials are handed out.
    pub fn with_initial_authentication(mut self, hook: Option<InitialAuthentication<'p>>) -> Self {
        self.initial_authentication = hook;
        self
    }

    pub fn state(&self) -> &AuthState {
        &self.state
    }

    pub fn phase(&self) -> NegotiationPhase {
        self.phase
    }

    pub fn is_authenticated(&self) -> bool {
        self.phase == NegotiationPhase::Authenticated
    }

    /// The rejection recorded by the most recent [`mark_failed`](Self::mark_failed).
    /// A permission-denied I/O error comes back as an
    /// [`SMBCError::AuthorizationError`] carrying it as the cause.
    pub fn take_last_failure(&mut self) -> Option<SMBCError> {
        self.last_failure.take()
    }

    /// Whether another attempt should be made.
    ///
    /// The first call always proceeds. Afterwards a round is started only if the previous
    /// one was marked failed; a round that was not marked failed ends the negotiation as
    /// authenticated. Between rounds the credentials escalate to the guest account and
    /// then to the prompt. A cancelled prompt is reported as [`SMBCError::Cancelled`].
    pub fn begin_round(&mut self) -> SMBCResult<bool> {
        match self.phase {
            NegotiationPhase::Authenticated | NegotiationPhase::Exhausted => return Ok(false),
            NegotiationPhase::Cancelled => return Err(SMBCError::cancelled(self.server_name())),
            NegotiationPhase::Failed => {
                return Err(SMBCError::configuration_error("negotiation already failed"));
            }
            _ => {}
        }

        self.state.attempt += 1;
        if self.state.attempt == 1 {
            trace!("starting optimistic first round");
            self.phase = NegotiationPhase::RetryCallback;
            return Ok(true);
        }

        if !self.state.failed {
            debug!(rounds = self.state.attempt - 1, "authenticated");
            self.phase = NegotiationPhase::Authenticated;
            return Ok(false);
        }

        if self.state.attempt > self.policy.max_rounds {
            warn!(max_rounds = self.policy.max_rounds, "giving up after too many rejected rounds");
            self.phase = NegotiationPhase::Exhausted;
            return Ok(false);
        }

        self.state.failed = false;
        if self.state.called_back && self.state.guest_attempts < self.policy.guest_attempts {
            self.state.guest_attempts += 1;
            self.state.credentials.username = self.policy.guest_username.clone();
            self.state.credentials.password = String::new();
            debug!(attempt = self.state.attempt, "falling back to guest account");
            self.phase = NegotiationPhase::GuestFallback;
            return Ok(true);
        }

        if !self.state.called_back {
            self.phase = NegotiationPhase::Failed;
            return Err(SMBCError::configuration_error(
                "credentials were rejected but the authentication callback was never invoked",
            ));
        }

        self.ask_prompt()
    }

    /// Records that the transport rejected the round. A rejection arriving before the
    /// callback was ever invoked means the transport is not consulting this negotiator,
    /// and is returned as a configuration error wrapping `cause`.
    pub fn mark_failed(&mut self, cause: Option<SMBCError>) -> SMBCResult<()> {
        self.state.failed = true;
        match cause {
            Some(cause) if !self.state.called_back => {
                self.phase = NegotiationPhase::Failed;
                Err(SMBCError::ConfigurationError(SMBCConfigurationError::with_cause(
                    "transport failed before invoking the authentication callback",
                    cause,
                )))
            }
            Some(cause) => {
                trace!(attempt = self.state.attempt, error = %cause, "round rejected");
                self.last_failure = Some(cause.into_authorization_error());
                Ok(())
            }
            None => Ok(()),
        }
    }

    /// The credentials to present for the current round.
    pub fn callback(&mut self, server: &str, share: &str, offered: Credentials) -> Credentials {
        self.state.called_back = true;
        let target = AuthTarget {
            server: server.into(),
            share: share.into(),
        };
        trace!(server, share, attempt = self.state.attempt, "authentication callback");
        if self.state.attempt == 1 {
            if let Some(hook) = self.initial_authentication.as_deref_mut() {
                hook(&target, &mut self.state.credentials);
            }
        }
        self.state.target = Some(target);

        let configured = &self.state.credentials;
        if configured.username.is_empty() {
            return Credentials::anonymous(offered.workgroup);
        }
        let workgroup = if configured.workgroup.is_empty() {
            offered.workgroup
        } else {
            configured.workgroup.clone()
        };
        Credentials::new(workgroup, configured.username.clone(), configured.password.clone())
    }

    fn ask_prompt(&mut self) -> SMBCResult<bool> {
        let Some(prompt) = self.prompt.as_mut() else {
            debug!("no prompt available, giving up");
            self.phase = NegotiationPhase::Exhausted;
            return Ok(false);
        };

        let target = self.state.target.clone().unwrap_or_default();
        let mut username = self.state.credentials.username.clone();
        if username == self.policy.guest_username {
            username = local_username().unwrap_or_default();
        }
        let request = PromptRequest {
            server: target.server,
            share: target.share,
            username,
            domain: self.state.credentials.workgroup.clone(),
        };

        debug!(server = request.server.as_str(), "prompting for credentials");
        match prompt.prompt(&request) {
            PromptResponse::Credentials(credentials) => {
                self.state.credentials = credentials;
                self.phase = NegotiationPhase::Prompt;
                Ok(true)
            }
            PromptResponse::Cancel => {
                debug!(server = request.server.as_str(), "prompt cancelled");
                self.phase = NegotiationPhase::Cancelled;
                Err(SMBCError::cancelled(request.server))
            }
        }
    }

    fn server_name(&self) -> String {
        self.state.target.as_ref().map(|x| x.server.clone()).unwrap_or_default()
    }
}

impl AuthCallback for AuthNegotiator<'_> {
    fn authenticate(&mut self, server: &str, share: &str, offered: Credentials) -> Credentials {
        self.callback(server, share, offered)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn alice() -> Credentials {
        Credentials::new("WG", "alice", "secret")
    }

    #[test]
    fn first_round_always_proceeds() {
        let mut negotiator = AuthNegotiator::new(NegotiationPolicy::default(), Credentials::default());
        assert!(negotiator.begin_round().unwrap());
        assert_eq!(negotiator.state().attempt(), 1);
    }

    #[test]
    fn round_without_failure_ends_authenticated() {
        let mut negotiator = AuthNegotiator::new(NegotiationPolicy::default(), alice());
        assert!(negotiator.begin_round().unwrap());
        negotiator.callback("fs", "share", Credentials::anonymous("WG"));
        assert!(!negotiator.begin_round().unwrap());
        assert!(negotiator.is_authenticated());
        assert!(!negotiator.begin_round().unwrap());
    }

    #[test]
    fn first_callback_returns_configured_credentials() {
        let mut negotiator = AuthNegotiator::new(NegotiationPolicy::default(), alice());
        negotiator.begin_round().unwrap();
        let creds = negotiator.callback("fs", "share", Credentials::anonymous("OTHER"));
        assert_eq!(creds, alice());
        assert!(negotiator.state().called_back());
    }

    #[test]
    fn unconfigured_user_is_anonymous_with_offered_workgroup() {
        let mut negotiator = AuthNegotiator::new(NegotiationPolicy::default(), Credentials::default());
        negotiator.begin_round().unwrap();
        let creds = negotiator.callback("fs", "share", Credentials::new("OFFERED", "x", "y"));
        assert_eq!(creds, Credentials::anonymous("OFFERED"));
    }

    #[test]
    fn initial_hook_runs_only_in_first_round() {
        let mut calls = 0;
        let mut hook = |_target: &AuthTarget, creds: &mut Credentials| {
            calls += 1;
            creds.username = "stored".into();
        };
        {
            let mut negotiator = AuthNegotiator::new(NegotiationPolicy::default(), Credentials::default())
                .with_initial_authentication(Some(&mut hook));
            negotiator.begin_round().unwrap();
            let creds = negotiator.callback("fs", "share", Credentials::default());
            assert_eq!(creds.username, "stored");
            negotiator.mark_failed(Some(SMBCError::authorization_error("no"))).unwrap();
            negotiator.begin_round().unwrap();
            negotiator.callback("fs", "share", Credentials::default());
        }
        assert_eq!(calls, 1);
    }

    #[test]
    fn second_round_falls_back_to_guest() {
        let mut negotiator = AuthNegotiator::new(NegotiationPolicy::default(), alice());
        negotiator.begin_round().unwrap();
        negotiator.callback("fs", "share", Credentials::default());
        negotiator.mark_failed(Some(SMBCError::authorization_error("rejected"))).unwrap();

        assert!(negotiator.begin_round().unwrap());
        assert_eq!(negotiator.phase(), NegotiationPhase::GuestFallback);
        let creds = negotiator.callback("fs", "share", Credentials::default());
        assert_eq!(creds, Credentials::new("WG", "guest", ""));
        assert!(negotiator.state().tried_guest());
    }

    #[test]
    fn failure_after_guest_without_prompt_exhausts() {
        let mut negotiator = AuthNegotiator::new(NegotiationPolicy::default(), alice());
        negotiator.begin_round().unwrap();
        negotiator.callback("fs", "share", Credentials::default());
        negotiator.mark_failed(Some(SMBCError::authorization_error("first"))).unwrap();
        negotiator.begin_round().unwrap();
        negotiator.callback("fs", "share", Credentials::default());
        negotiator.mark_failed(Some(SMBCError::authorization_error("second"))).unwrap();

        assert!(!negotiator.begin_round().unwrap());
        assert_eq!(negotiator.phase(), NegotiationPhase::Exhausted);
        assert!(negotiator.take_last_failure().unwrap().to_string().contains("second"));
    }

    #[test]
    fn permission_denied_is_recorded_as_authorization_error() {
        let mut negotiator = AuthNegotiator::new(NegotiationPolicy::default(), alice());
        negotiator.begin_round().unwrap();
        negotiator.callback("fs", "share", Credentials::default());
        let denied = SMBCError::io_error(std::io::Error::from(std::io::ErrorKind::PermissionDenied));
        negotiator.mark_failed(Some(denied)).unwrap();

        match negotiator.take_last_failure() {
            Some(SMBCError::AuthorizationError(x)) => assert!(matches!(x.cause(), Some(SMBCError::IOError(_)))),
            other => panic!("expected an authorization error, got {:?}", other),
        }
    }

    #[test]
    fn third_round_prompts_with_prefilled_request() {
        let mut requests = Vec::new();
        let mut prompt = |request: &PromptRequest| {
            requests.push(request.clone());
            PromptResponse::Credentials(Credentials::new("DOMAIN", "carol", "pw"))
        };
        {
            let mut negotiator = AuthNegotiator::new(NegotiationPolicy::default(), alice())
                .with_prompt(Some(&mut prompt));
            for _ in 0..2 {
                assert!(negotiator.begin_round().unwrap());
                negotiator.callback("fs", "share", Credentials::default());
                negotiator.mark_failed(Some(SMBCError::authorization_error("no"))).unwrap();
            }
            assert!(negotiator.begin_round().unwrap());
            assert_eq!(negotiator.phase(), NegotiationPhase::Prompt);
            let creds = negotiator.callback("fs", "share", Credentials::default());
            assert_eq!(creds, Credentials::new("DOMAIN", "carol", "pw"));
        }
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].server, "fs");
        assert_eq!(requests[0].share, "share");
        assert_eq!(requests[0].domain, "WG");
        assert_ne!(requests[0].username, "guest");
    }

    #[test]
    fn cancelled_prompt_stops_rounds() {
        let mut prompt = |_request: &PromptRequest| PromptResponse::Cancel;
        let mut negotiator = AuthNegotiator::new(NegotiationPolicy::default(), alice())
            .with_prompt(Some(&mut prompt));
        for _ in 0..2 {
            negotiator.begin_round().unwrap();
            negotiator.callback("fs", "share", Credentials::default());
            negotiator.mark_failed(Some(SMBCError::authorization_error("no"))).unwrap();
        }
        let err = negotiator.begin_round().unwrap_err();
        assert!(err.is_cancelled());
        assert_eq!(negotiator.phase(), NegotiationPhase::Cancelled);
        assert!(negotiator.begin_round().unwrap_err().is_cancelled());
    }

    #[test]
    fn failure_before_any_callback_is_a_configuration_error() {
        let mut negotiator = AuthNegotiator::new(NegotiationPolicy::default(), alice());
        negotiator.begin_round().unwrap();
        let err = negotiator.mark_failed(Some(SMBCError::authorization_error("no"))).unwrap_err();
        assert!(matches!(err, SMBCError::ConfigurationError(_)));
        assert_eq!(negotiator.phase(), NegotiationPhase::Failed);
    }

    #[test]
    fn escalation_without_callback_is_a_configuration_error() {
        let mut negotiator = AuthNegotiator::new(NegotiationPolicy::default(), alice());
        negotiator.begin_round().unwrap();
        negotiator.mark_failed(None).unwrap();
        assert!(matches!(negotiator.begin_round(), Err(SMBCError::ConfigurationError(_))));
    }

    #[test]
    fn round_limit_bounds_the_ladder() {
        let policy = NegotiationPolicy {
            max_rounds: 3,
            ..NegotiationPolicy::default()
        };
        let mut prompt = |_request: &PromptRequest| PromptResponse::Credentials(alice());
        let mut negotiator = AuthNegotiator::new(policy, alice()).with_prompt(Some(&mut prompt));
        let mut rounds = 0;
        while negotiator.begin_round().unwrap() {
            rounds += 1;
            negotiator.callback("fs", "share", Credentials::default());
            negotiator.mark_failed(Some(SMBCError::authorization_error("no"))).unwrap();
        }
        assert_eq!(rounds, 3);
        assert_eq!(negotiator.phase(), NegotiationPhase::Exhausted);
    }

    #[test]
    fn guest_budget_is_configurable() {
        let policy = NegotiationPolicy {
            guest_attempts: 2,
            ..NegotiationPolicy::default()
        };
        let mut negotiator = AuthNegotiator::new(policy, alice());
        let mut phases = Vec::new();
        for _ in 0..3 {
            negotiator.begin_round().unwrap();
            phases.push(negotiator.phase());
            negotiator.callback("fs", "share", Credentials::default());
            negotiator.mark_failed(Some(SMBCError::authorization_error("no"))).unwrap();
        }
        assert_eq!(phases, vec![
            NegotiationPhase::RetryCallback,
            NegotiationPhase::GuestFallback,
            NegotiationPhase::GuestFallback,
        ]);
    }
}
