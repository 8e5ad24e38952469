//! Identifier generation for stored files.

use uuid::Uuid;

/// The identifier pair assigned to a stored file.
///
/// `public_id` is the only handle given to clients. `private_id` names the
/// file on disk and never leaves the server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileIds {
    /// Externally exposed identifier.
    pub public_id: String,
    /// Internal storage identifier.
    pub private_id: String,
}

impl FileIds {
    /// Generate a fresh pair of random (v4) UUIDs in hyphenated form.
    ///
    /// The two identifiers are always distinct.
    pub fn generate() -> Self {
        let public_id = Uuid::new_v4();
        let mut private_id = Uuid::new_v4();
        while private_id == public_id {
            private_id = Uuid::new_v4();
        }

        Self {
            public_id: public_id.to_string(),
            private_id: private_id.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_generate_distinct_pair() {
        let ids = FileIds::generate();
        assert_ne!(ids.public_id, ids.private_id);
    }

    #[test]
    fn test_generate_canonical_format() {
        let ids = FileIds::generate();

        assert_eq!(ids.public_id.len(), 36);
        let parsed = Uuid::parse_str(&ids.public_id).unwrap();
        assert_eq!(parsed.get_version_num(), 4);
        assert_eq!(parsed.to_string(), ids.public_id);

        assert!(Uuid::parse_str(&ids.private_id).is_ok());
    }

    #[test]
    fn test_generate_unique_across_calls() {
        let mut seen = HashSet::new();
        for _ in 0..1000 {
            let ids = FileIds::generate();
            assert!(seen.insert(ids.public_id));
            assert!(seen.insert(ids.private_id));
        }
    }
}
