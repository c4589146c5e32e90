//! Generic polling resource
//!
//! A [`Resource`] pairs one [`StateContainer`] with one device endpoint and a
//! [`ResourceKind`] that knows how to turn the endpoint's payload into state.

use crate::http_client::{DeviceClient, Method, Payload, ResponseFormat};
use crate::state::StateContainer;
use anyhow::Result;
use log::{debug, warn};

/// What distinguishes one resource from another
pub trait ResourceKind: Send + Sync + 'static {
    type State: Send + Sync + 'static;

    /// Name used in log lines
    const NAME: &'static str;
    const FORMAT: ResponseFormat;

    /// Endpoint to fetch for the current state
    fn endpoint(&self, state: &Self::State) -> String;

    /// Apply a fetched payload. Returns whether the state changed.
    ///
    /// On error the state must be left as it was.
    fn apply(&self, payload: Payload, state: &mut Self::State) -> Result<bool>;
}

/// Clears a resource's `fetching` flag when the update ends
struct FetchingGuard<'a>(&'a StateContainer<bool>);

impl Drop for FetchingGuard<'_> {
    fn drop(&mut self) {
        self.0.set(false);
    }
}

pub struct Resource<K: ResourceKind> {
    kind: K,
    state: StateContainer<K::State>,
    fetching: StateContainer<bool>,
}

impl<K: ResourceKind> Resource<K> {
    pub fn new(kind: K, initial: K::State) -> Self {
        Resource {
            kind,
            state: StateContainer::new(initial),
            fetching: StateContainer::new(false),
        }
    }

    pub fn state(&self) -> &StateContainer<K::State> {
        &self.state
    }

    pub fn fetching(&self) -> &StateContainer<bool> {
        &self.fetching
    }

    /// Fetch the endpoint once and apply the result.
    ///
    /// Failures are logged and swallowed; the state is left untouched and
    /// `false` is returned. `fetching` is cleared either way, also when the
    /// returned future is dropped before it completes.
    pub async fn update<C: DeviceClient + Sync>(&self, client: &C) -> bool {
        self.fetching.set(true);
        let _fetching = FetchingGuard(&self.fetching);

        let endpoint = self.state.read(|state| self.kind.endpoint(state));
        let applied = match client
            .fetch(&endpoint, Method::Get, None, K::FORMAT)
            .await
        {
            Ok(payload) => self.apply(payload),
            Err(e) => {
                warn!("{} update failed: {e:#}", K::NAME);
                false
            }
        };

        applied
    }

    fn apply(&self, payload: Payload) -> bool {
        let mut outcome = Ok(false);
        self.state.update(|state| {
            outcome = self.kind.apply(payload, state);
            matches!(outcome, Ok(true))
        });

        match outcome {
            Ok(changed) => {
                if !changed {
                    debug!("{} unchanged", K::NAME);
                }
                true
            }
            Err(e) => {
                warn!("{} payload rejected: {e:#}", K::NAME);
                false
            }
        }
    }
}
