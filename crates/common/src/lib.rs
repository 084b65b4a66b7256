/**
 * Client-side request assembly and
 *  response verification/decryption.
 */
pub mod client;
/**
 * Cryptographic types and operations.
 *  - Server identity keys
 *  - Nonce-bound signatures
 *  - ECDH + HKDF + AES-GCM channel
 */
pub mod crypto;
pub mod encoding;
/**
 * How nodes obtain the content they hash.
 */
pub mod fetch;
/**
 * Leader-side handling of hash requests:
 *  tree construction, bounded waiting and
 *  translation into response bodies.
 */
pub mod orchestrator;
/**
 * The tree protocol engine and its
 *  public and private variants.
 */
pub mod protocol;
pub mod request;
pub mod roster;
/**
 * In-process overlay, fetcher and
 *  network for tests.
 */
pub mod testkit;
/**
 * Helper for setting build version information
 *  at compile time.
 */
pub mod version;

pub mod prelude {
    pub use crate::build_info;
    pub use crate::client::{HashTally, PrivateHashSession, PublicHashSession};
    pub use crate::crypto::{PublicKey, SecretKey};
    pub use crate::fetch::{Fetcher, Resource};
    pub use crate::orchestrator::{Orchestrator, OrchestratorConfig};
    pub use crate::protocol::{NodeContext, ProtocolError};
    pub use crate::request::{
        HashPrivateRequest, HashPrivateResponse, HashPublicRequest, HashPublicResponse,
    };
    pub use crate::roster::{Roster, ServerIdentity};
}
