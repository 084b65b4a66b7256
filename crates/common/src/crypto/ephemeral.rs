use std::collections::BTreeMap;

use super::keys::{PublicKey, SecretKey};

/// One-request keypair a client generates for a single server.
///
/// Shares the Ed25519 representation of long-term keys so the same
/// X25519 conversion applies on both ends of the channel.
#[derive(Debug, Clone)]
pub struct EphemeralKeyPair {
    secret: SecretKey,
    public: PublicKey,
}

impl EphemeralKeyPair {
    pub fn generate() -> Self {
        let secret = SecretKey::generate();
        let public = secret.public();
        Self { secret, public }
    }

    pub fn public(&self) -> &PublicKey {
        &self.public
    }

    pub fn secret(&self) -> &SecretKey {
        &self.secret
    }
}

/// Ephemeral keypairs indexed by the server identity each one was made for.
///
/// Only [`EphemeralKeys::public_keys`] ever leaves the client.
#[derive(Debug, Clone, Default)]
pub struct EphemeralKeys(BTreeMap<PublicKey, EphemeralKeyPair>);

impl EphemeralKeys {
    /// Generates a fresh, distinct keypair for every listed server.
    pub fn generate<'a>(servers: impl IntoIterator<Item = &'a PublicKey>) -> Self {
        Self(
            servers
                .into_iter()
                .map(|server| (*server, EphemeralKeyPair::generate()))
                .collect(),
        )
    }

    pub fn get(&self, server: &PublicKey) -> Option<&EphemeralKeyPair> {
        self.0.get(server)
    }

    pub fn public_keys(&self) -> BTreeMap<PublicKey, PublicKey> {
        self.0
            .iter()
            .map(|(server, pair)| (*server, *pair.public()))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use std::collections::BTreeSet;

    #[test]
    fn test_one_distinct_key_per_server() {
        let servers: Vec<PublicKey> = (0..5).map(|_| SecretKey::generate().public()).collect();
        let keys = EphemeralKeys::generate(&servers);

        assert_eq!(keys.len(), servers.len());
        let publics = keys.public_keys();
        let distinct: BTreeSet<_> = publics.values().collect();
        assert_eq!(distinct.len(), servers.len());

        for server in &servers {
            let pair = keys.get(server).unwrap();
            assert_eq!(pair.secret().public(), *pair.public());
            assert_eq!(publics[server], *pair.public());
        }
    }
}
