//! # Duplicate Detector
//!
//! Ranks other files that are byte-identical to a target file.
//!
//! A candidate must have the same size and the same content hash as the
//! target; size is compared first since it is free. Each candidate is
//! scored in whole percent:
//!
//! | Match              | Score |
//! |--------------------|-------|
//! | identical content  | 75    |
//! | + same name        | +15   |
//! | + same narration   | +10   |
//!
//! Nothing is merged or altered.

use crate::storage::Persistence;
use crate::vault::Vault;
use crate::{DocumentId, FileRecord, SatchelError};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Similarity of a candidate to its target, in percent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SimilarityScore(pub u8);

impl SimilarityScore {
    /// Score of a content-identical candidate.
    pub const BASE: u8 = 75;
    /// Added when file names match exactly.
    pub const NAME_BONUS: u8 = 15;
    /// Added when narrations match exactly.
    pub const NARRATION_BONUS: u8 = 10;

    /// Score `candidate` against `target`. Content identity is assumed.
    #[must_use]
    pub fn between(target: &FileRecord, candidate: &FileRecord) -> Self {
        let mut score = Self::BASE;
        if target.name == candidate.name {
            score = score.saturating_add(Self::NAME_BONUS);
        }
        if target.narration == candidate.narration {
            score = score.saturating_add(Self::NARRATION_BONUS);
        }
        Self(score)
    }

    #[must_use]
    pub const fn percent(self) -> u8 {
        self.0
    }
}

impl fmt::Display for SimilarityScore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:02}", self.0 / 100, self.0 % 100)
    }
}

/// Duplicate finder over the files of one vault.
pub struct DuplicateDetector<'a, P: Persistence> {
    vault: &'a Vault<P>,
}

impl<'a, P: Persistence> DuplicateDetector<'a, P> {
    pub(crate) fn new(vault: &'a Vault<P>) -> Self {
        Self { vault }
    }

    /// Every other file with the same size and hash as `file`, with its score.
    pub fn find_duplicates(
        &self,
        file: DocumentId,
    ) -> Result<BTreeMap<DocumentId, SimilarityScore>, SatchelError> {
        let target = self.vault.files().get(file)?;
        let candidates: BTreeMap<DocumentId, SimilarityScore> = self
            .vault
            .files()
            .list()?
            .iter()
            .filter(|c| c.id != target.id)
            .filter(|c| c.size == target.size)
            .filter(|c| c.content_hash == target.content_hash)
            .map(|c| (c.id, SimilarityScore::between(&target, c)))
            .collect();
        tracing::debug!(file = %file, candidates = candidates.len(), "duplicate scan");
        Ok(candidates)
    }
}
