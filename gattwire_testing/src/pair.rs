//! Two links wired back to back over in-memory transports.

use gattwire::{Inbox, Link, LinkConfig, LinkError, transport::memory_pair};
use tokio::task::JoinHandle;

/// One end of a [`LinkedPair`].
#[derive(Debug)]
pub struct LinkEnd {
    /// Handle used to send and to inspect state.
    pub link: Link,
    /// Events produced by frames arriving from the other end.
    pub inbox: Inbox,
}

/// Two links whose outbound frames are delivered to each other.
#[derive(Debug)]
pub struct LinkedPair {
    pub a: LinkEnd,
    pub b: LinkEnd,
    forwarders: [JoinHandle<()>; 2],
}

impl LinkedPair {
    /// Build both ends from the same configuration.
    ///
    /// Must be called from within a tokio runtime.
    ///
    /// # Errors
    ///
    /// Returns [`LinkError`] if either link cannot be created.
    pub fn new(config: &LinkConfig) -> Result<Self, LinkError> {
        let (to_b, frames_for_b) = memory_pair();
        let (to_a, frames_for_a) = memory_pair();
        let (a, a_inbox) = Link::new(to_b, config.clone())?;
        let (b, b_inbox) = Link::new(to_a, config.clone())?;
        let forwarders = [frames_for_b.forward_to(b.clone()), frames_for_a.forward_to(a.clone())];
        Ok(Self {
            a: LinkEnd {
                link: a,
                inbox: a_inbox,
            },
            b: LinkEnd {
                link: b,
                inbox: b_inbox,
            },
            forwarders,
        })
    }
}

impl Drop for LinkedPair {
    fn drop(&mut self) {
        for forwarder in &self.forwarders {
            forwarder.abort();
        }
    }
}
