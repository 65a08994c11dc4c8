//! Session manager: maps polls to contract instances.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::{info, warn};

use votebox_contract::{
    ClientError, ConfirmationPolicy, ContractBackend, ContractClient, RemoteCallError,
};
use votebox_types::codec::encode;
use votebox_types::{Address, CandidateList, UserId};

use crate::error::{LookupError, SessionError};
use crate::outcome::FinalizeOutcome;
use crate::registry::SessionRegistry;
use crate::session::{decode_tally, Session};

/// Which addresses [`SessionManager::restore_session`] is willing to bind to.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RestorePolicy {
    /// Only contracts this manager deployed and that still hold code.
    #[default]
    Registered,
    /// Any address holding code. Used after a restart, when the registry
    /// is empty.
    CodeOnly,
}

/// Creates, restores, and finalizes voting sessions.
///
/// Cheap to clone; clones share the backend and the registry.
pub struct SessionManager<B> {
    inner: Arc<ManagerInner<B>>,
}

struct ManagerInner<B> {
    backend: Arc<B>,
    confirmation: ConfirmationPolicy,
    policy: RestorePolicy,
    registry: RwLock<SessionRegistry>,
}

impl<B> Clone for SessionManager<B> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<B: ContractBackend> SessionManager<B> {
    pub fn new(backend: Arc<B>, confirmation: ConfirmationPolicy, policy: RestorePolicy) -> Self {
        Self {
            inner: Arc::new(ManagerInner {
                backend,
                confirmation,
                policy,
                registry: RwLock::new(SessionRegistry::new()),
            }),
        }
    }

    pub fn policy(&self) -> RestorePolicy {
        self.inner.policy
    }

    /// Validate the candidates, deploy a contract for them, and register it.
    pub async fn create_session<I, S>(
        &self,
        candidates: I,
        owner: UserId,
    ) -> Result<Session<B>, SessionError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let list = CandidateList::from_names(candidates)?;
        let blob = encode(list.as_slice())?;
        let client = ContractClient::create(
            Arc::clone(&self.inner.backend),
            self.inner.confirmation,
            blob,
            owner,
        )
        .await
        .ok_or(SessionError::Creation)?;

        let address = client.address();
        self.inner.registry.write().await.insert(address);
        info!(%address, %owner, candidates = list.len(), "voting session created");
        Ok(Session::new(self.clone(), client))
    }

    /// Bind to an existing session.
    ///
    /// Returns `None` unless the address passes the restore policy and the
    /// remote environment reports live code there.
    pub async fn restore_session(&self, address: Address) -> Option<Session<B>> {
        self.lookup_session(address).await.ok()
    }

    /// Like [`SessionManager::restore_session`], but tells a closed poll apart
    /// from an unknown address and from an unreachable node.
    pub async fn lookup_session(&self, address: Address) -> Result<Session<B>, LookupError> {
        let registered = {
            let registry = self.inner.registry.read().await;
            if registry.is_closed(&address) {
                return Err(LookupError::Closed);
            }
            registry.contains(&address)
        };
        if self.inner.policy == RestorePolicy::Registered && !registered {
            warn!(%address, "refusing to restore unregistered address");
            return Err(LookupError::Unknown);
        }
        match ContractClient::bind(
            Arc::clone(&self.inner.backend),
            self.inner.confirmation,
            address,
        )
        .await
        {
            Ok(client) => Ok(Session::new(self.clone(), client)),
            Err(RemoteCallError::NoCode { .. }) if registered => {
                // destroyed by someone other than this manager
                self.inner.registry.write().await.close(address);
                Err(LookupError::Closed)
            }
            Err(RemoteCallError::NoCode { .. }) => Err(LookupError::Unknown),
            Err(_) => Err(LookupError::Unavailable),
        }
    }

    /// Read the final tally, then destroy the contract.
    ///
    /// The tally is read before `kill`: a destroyed contract can no longer be
    /// read. The address leaves the registry only after a confirmed kill, and
    /// is remembered as closed from then on.
    pub async fn finalize_session(&self, address: Address, requester: UserId) -> FinalizeOutcome {
        let session = match self.lookup_session(address).await {
            Ok(session) => session,
            Err(LookupError::Closed) => return FinalizeOutcome::Closed,
            Err(LookupError::Unknown | LookupError::Unavailable) => {
                return FinalizeOutcome::Unavailable
            }
        };
        let client = session.client();

        let raw = match client.get_candidates_and_votes().await {
            Ok(raw) => raw,
            Err(error) => return self.failed_finalize(address, &error).await,
        };
        let tally = match decode_tally(raw) {
            Ok(tally) => tally,
            Err(error) => {
                warn!(%address, %error, "contract returned undecodable candidates");
                return FinalizeOutcome::Unavailable;
            }
        };

        match client.kill(requester).await {
            Ok(true) => {
                self.inner.registry.write().await.close(address);
                info!(%address, %requester, "voting session finalized");
                FinalizeOutcome::Finalized(tally)
            }
            Ok(false) => FinalizeOutcome::Denied,
            Err(error) => self.failed_finalize(address, &error).await,
        }
    }

    async fn failed_finalize(&self, address: Address, error: &ClientError) -> FinalizeOutcome {
        if error.is_destroyed() {
            self.inner.registry.write().await.close(address);
            FinalizeOutcome::Closed
        } else {
            FinalizeOutcome::Unavailable
        }
    }

    /// Whether this manager has seen the contract at `address` destroyed.
    pub async fn is_closed(&self, address: &Address) -> bool {
        self.inner.registry.read().await.is_closed(address)
    }

    pub async fn is_registered(&self, address: &Address) -> bool {
        self.inner.registry.read().await.contains(address)
    }

    /// Addresses of sessions created by this manager and not yet finalized.
    pub async fn registered(&self) -> Vec<Address> {
        self.inner.registry.read().await.addresses()
    }
}
