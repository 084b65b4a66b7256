use std::collections::{BTreeMap, BTreeSet};

use crate::crypto::PublicKey;
use crate::roster::ServerIdentity;

/// Contributions collected by the root of one run.
///
/// At most one response per child identity. Children that never answered
/// are listed in `missing`, so a partial aggregate is never mistaken for a
/// complete one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Aggregate<R> {
    pub responses: BTreeMap<PublicKey, R>,
    pub missing: BTreeSet<PublicKey>,
}

impl<R> Default for Aggregate<R> {
    fn default() -> Self {
        Self {
            responses: BTreeMap::new(),
            missing: BTreeSet::new(),
        }
    }
}

impl<R> Aggregate<R> {
    /// Records a response; returns false if `sender` already contributed.
    pub fn insert(&mut self, sender: PublicKey, response: R) -> bool {
        if self.responses.contains_key(&sender) {
            return false;
        }
        self.responses.insert(sender, response);
        true
    }

    /// Marks every expected child without a response as missing.
    pub fn close<'a>(&mut self, expected: impl IntoIterator<Item = &'a ServerIdentity>) {
        self.missing = expected
            .into_iter()
            .map(|child| child.public_key)
            .filter(|key| !self.responses.contains_key(key))
            .collect();
    }

    pub fn len(&self) -> usize {
        self.responses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.responses.is_empty()
    }

    pub fn is_complete(&self) -> bool {
        self.missing.is_empty()
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::crypto::SecretKey;

    #[test]
    fn test_first_response_wins() {
        let sender = SecretKey::generate().public();
        let mut aggregate = Aggregate::default();

        assert!(aggregate.insert(sender, 1));
        assert!(!aggregate.insert(sender, 2));
        assert_eq!(aggregate.responses[&sender], 1);
    }

    #[test]
    fn test_close_lists_silent_children() {
        let children: Vec<_> = (0..3)
            .map(|_| ServerIdentity::new(SecretKey::generate().public()))
            .collect();
        let mut aggregate = Aggregate::default();
        aggregate.insert(children[1].public_key, "ok");

        aggregate.close(&children);
        assert!(!aggregate.is_complete());
        assert_eq!(aggregate.len(), 1);
        assert_eq!(
            aggregate.missing,
            BTreeSet::from([children[0].public_key, children[2].public_key])
        );
    }
}
