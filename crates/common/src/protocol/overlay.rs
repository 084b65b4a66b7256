use tokio::sync::mpsc;

use super::{Cancellation, HashProtocol, ProtocolError};
use crate::roster::ServerIdentity;

/// Sending half of a root's fan-in channel, one clone per child edge
pub type ResponseSender<P> = mpsc::Sender<<P as HashProtocol>::Response>;

/// Carries announcements down a tree and responses back up.
///
/// `deliver` must not block: implementations spawn whatever work is needed
/// and drop `parent` once the child has answered or given up, which is how
/// the root learns an edge is closed.
pub trait Overlay<P: HashProtocol>: Send + Sync {
    fn deliver(
        &self,
        child: &ServerIdentity,
        announcement: P::Announcement,
        parent: ResponseSender<P>,
        cancel: Cancellation,
    ) -> Result<(), ProtocolError>;
}
