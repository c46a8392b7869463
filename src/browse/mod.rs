use serde::{Deserialize, Serialize};

use smbc_core::error::SMBCError;
use smbc_core::logging::{debug, info};
use smbc_core::SMBCResult;

use crate::auth::{AuthCallback, AuthNegotiator, AuthTarget, Credentials, CredentialPrompt, NegotiationPolicy};
use crate::transport::{ContextFlags, Dirent, SMBCEntryType, Transport};
use crate::xattr::{self, SecurityDescriptor, XattrFlags, XattrName};

pub const SMB_ROOT_URI: &str = "smb://";

/// A namespace entry together with whatever was listed beneath it.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct NamespaceNode {
    pub entry: Dirent,
    pub children: Vec<NamespaceNode>,
}

type InitialHook = Box<dyn FnMut(&AuthTarget, &mut Credentials)>;

/// Lists the workgroup, server and share levels of the SMB namespace, negotiating
/// credentials afresh for every listing. Security descriptor reads and writes go
/// through the same negotiation.
pub struct NamespaceWalker<T: Transport> {
    transport: T,
    policy: NegotiationPolicy,
    credentials: Credentials,
    prompt: Option<Box<dyn CredentialPrompt>>,
    initial_authentication: Option<InitialHook>,
}

impl<T: Transport> NamespaceWalker<T> {
    /// Takes over `transport`, switching off its silent anonymous fallback so that every
    /// credential decision goes through the negotiator.
    pub fn new(mut transport: T, credentials: Credentials) -> Self {
        let options = transport.options_mut();
        let flags = options.flags() | ContextFlags::NO_AUTO_ANONYMOUS_LOGON;
        options.set_flags(flags);
        Self {
            transport,
            policy: NegotiationPolicy::default(),
            credentials,
            prompt: None,
            initial_authentication: None,
        }
    }

    pub fn with_policy(mut self, policy: NegotiationPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_prompt<P: CredentialPrompt + 'static>(mut self, prompt: P) -> Self {
        self.prompt = Some(Box::new(prompt));
        self
    }

    pub fn with_initial_authentication<F>(mut self, hook: F) -> Self
    where
        F: FnMut(&AuthTarget, &mut Credentials) + 'static,
    {
        self.initial_authentication = Some(Box::new(hook));
        self
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn into_transport(self) -> T {
        self.transport
    }

    /// Lists `uri`, retrying through a fresh negotiator while the transport rejects the
    /// credentials. Errors that are not about authorization are returned immediately.
    pub fn list(&mut self, uri: &str) -> SMBCResult<Vec<Dirent>> {
        let listing = self.negotiate(uri, |transport, auth| transport.list_directory(uri, auth))?;
        info!(uri, entries = listing.len(), "listed");
        Ok(listing)
    }

    /// Reads and parses the security descriptor attribute `name` of `uri`.
    pub fn read_security_descriptor(&mut self, uri: &str, name: &XattrName) -> SMBCResult<SecurityDescriptor> {
        let raw = self.negotiate(uri, |transport, auth| transport.get_xattr(uri, name, auth))?;
        xattr::parse(&raw)
    }

    /// Writes `descriptor` with masks in decimal.
    pub fn write_security_descriptor(&mut self, uri: &str, name: &XattrName, descriptor: &SecurityDescriptor, flags: XattrFlags) -> SMBCResult<()> {
        let value = xattr::serialize(descriptor);
        self.negotiate(uri, |transport, auth| transport.set_xattr(uri, name, &value, flags, auth))
    }

    /// Writes `descriptor`, reads it back and reports whether the server kept it.
    pub fn apply_security_descriptor(&mut self, uri: &str, name: &XattrName, descriptor: &SecurityDescriptor) -> SMBCResult<bool> {
        self.write_security_descriptor(uri, name, descriptor, XattrFlags::empty())?;
        let current = self.read_security_descriptor(uri, name)?;
        Ok(xattr::equivalent(descriptor, &current))
    }

    /// Runs `operation` until a round goes through without an authorization failure.
    fn negotiate<R, F>(&mut self, uri: &str, mut operation: F) -> SMBCResult<R>
    where
        F: FnMut(&mut T, &mut dyn AuthCallback) -> SMBCResult<R>,
    {
        let prompt = self.prompt.as_mut().map(|x| &mut **x as &mut dyn CredentialPrompt);
        let hook = self.initial_authentication.as_mut()
            .map(|x| &mut **x as &mut dyn FnMut(&AuthTarget, &mut Credentials));
        let mut negotiator = AuthNegotiator::new(self.policy.clone(), self.credentials.clone())
            .with_prompt(prompt)
            .with_initial_authentication(hook);

        let mut outcome = None;
        while negotiator.begin_round()? {
            match operation(&mut self.transport, &mut negotiator) {
                Ok(result) => outcome = Some(result),
                Err(err) if err.is_authorization_failure() => {
                    debug!(uri, error = %err, "rejected");
                    negotiator.mark_failed(Some(err))?;
                }
                Err(err) => return Err(err),
            }
        }

        match outcome {
            Some(result) if negotiator.is_authenticated() => {
                debug!(uri, rounds = negotiator.state().attempt() - 1, "authenticated");
                Ok(result)
            }
            _ => Err(negotiator.take_last_failure().unwrap_or_else(|| {
                SMBCError::authorization_error(format!("no credentials were accepted for {}", uri))
            })),
        }
    }

    pub fn workgroups(&mut self) -> SMBCResult<Vec<Dirent>> {
        self.list(SMB_ROOT_URI)
    }

    pub fn servers(&mut self, workgroup: &str) -> SMBCResult<Vec<Dirent>> {
        self.list(&format!("{}{}", SMB_ROOT_URI, workgroup))
    }

    pub fn shares(&mut self, server: &str) -> SMBCResult<Vec<Dirent>> {
        self.list(&format!("{}{}", SMB_ROOT_URI, server))
    }

    /// Walks workgroups, their servers and the servers' shares.
    ///
    /// The listed tags are trusted: only `Workgroup` entries are descended into for
    /// servers and only `Server` entries for shares.
    pub fn browse(&mut self) -> SMBCResult<Vec<NamespaceNode>> {
        let mut tree = Vec::new();
        for workgroup in self.workgroups()? {
            let mut node = NamespaceNode { entry: workgroup, children: Vec::new() };
            if node.entry.kind == SMBCEntryType::Workgroup {
                for server in self.servers(&node.entry.name)? {
                    let mut server_node = NamespaceNode { entry: server, children: Vec::new() };
                    if server_node.entry.kind == SMBCEntryType::Server {
                        server_node.children = self.shares(&server_node.entry.name)?
                            .into_iter()
                            .map(|entry| NamespaceNode { entry, children: Vec::new() })
                            .collect();
                    }
                    node.children.push(server_node);
                }
            }
            tree.push(node);
        }
        Ok(tree)
    }
}
