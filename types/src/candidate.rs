//! Validated candidate names and candidate lists.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

use crate::codec::SEPARATOR;
use crate::error::ValidationError;

/// Maximum number of candidates in one poll.
pub const MAX_CANDIDATES: usize = 10;

/// Maximum length of a candidate name, in characters.
pub const MAX_CANDIDATE_LEN: usize = 30;

/// A non-empty candidate name of at most [`MAX_CANDIDATE_LEN`] characters.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Candidate(String);

impl Candidate {
    pub fn new(name: impl Into<String>) -> Result<Self, ValidationError> {
        let name = name.into();
        if name.is_empty() {
            return Err(ValidationError::EmptyCandidate);
        }
        let len = name.chars().count();
        if len > MAX_CANDIDATE_LEN {
            return Err(ValidationError::CandidateTooLong {
                len,
                max: MAX_CANDIDATE_LEN,
            });
        }
        if name.as_bytes().contains(&SEPARATOR) {
            return Err(ValidationError::SeparatorInCandidate);
        }
        Ok(Self(name))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for Candidate {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Candidate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for Candidate {
    type Error = ValidationError;

    fn try_from(name: String) -> Result<Self, Self::Error> {
        Self::new(name)
    }
}

impl From<Candidate> for String {
    fn from(c: Candidate) -> Self {
        c.0
    }
}

/// An ordered list of 1..=[`MAX_CANDIDATES`] distinct candidates.
///
/// Position in the list is the candidate's index on the contract.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CandidateList(Vec<Candidate>);

impl CandidateList {
    pub fn new(candidates: Vec<Candidate>) -> Result<Self, ValidationError> {
        if candidates.is_empty() {
            return Err(ValidationError::NoCandidates);
        }
        if candidates.len() > MAX_CANDIDATES {
            return Err(ValidationError::TooManyCandidates {
                count: candidates.len(),
                max: MAX_CANDIDATES,
            });
        }
        let mut seen = HashSet::with_capacity(candidates.len());
        for c in &candidates {
            if !seen.insert(c.as_str()) {
                return Err(ValidationError::DuplicateCandidate(c.0.clone()));
            }
        }
        Ok(Self(candidates))
    }

    /// Validate raw names into a list.
    pub fn from_names<I, S>(names: I) -> Result<Self, ValidationError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let candidates = names
            .into_iter()
            .map(Candidate::new)
            .collect::<Result<Vec<_>, _>>()?;
        Self::new(candidates)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_slice(&self) -> &[Candidate] {
        &self.0
    }

    pub fn iter(&self) -> impl Iterator<Item = &Candidate> {
        self.0.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_name_at_length_limit() {
        let name = "x".repeat(MAX_CANDIDATE_LEN);
        assert!(Candidate::new(name).is_ok());
    }

    #[test]
    fn length_counts_characters_not_bytes() {
        let name = "ё".repeat(MAX_CANDIDATE_LEN);
        assert!(name.len() > MAX_CANDIDATE_LEN);
        assert!(Candidate::new(name).is_ok());
    }

    #[test]
    fn rejects_overlong_name() {
        let err = Candidate::new("y".repeat(MAX_CANDIDATE_LEN + 1)).unwrap_err();
        assert_eq!(
            err,
            ValidationError::CandidateTooLong {
                len: MAX_CANDIDATE_LEN + 1,
                max: MAX_CANDIDATE_LEN
            }
        );
    }

    #[test]
    fn rejects_empty_and_separator() {
        assert_eq!(Candidate::new("").unwrap_err(), ValidationError::EmptyCandidate);
        assert_eq!(
            Candidate::new("a\0b").unwrap_err(),
            ValidationError::SeparatorInCandidate
        );
    }

    #[test]
    fn list_bounds() {
        assert_eq!(
            CandidateList::from_names(Vec::<String>::new()).unwrap_err(),
            ValidationError::NoCandidates
        );
        let eleven: Vec<String> = (0..11).map(|i| format!("c{i}")).collect();
        assert_eq!(
            CandidateList::from_names(eleven).unwrap_err(),
            ValidationError::TooManyCandidates { count: 11, max: 10 }
        );
        let ten: Vec<String> = (0..10).map(|i| format!("c{i}")).collect();
        assert_eq!(CandidateList::from_names(ten).unwrap().len(), 10);
    }

    #[test]
    fn list_rejects_duplicates() {
        let err = CandidateList::from_names(["A", "B", "A"]).unwrap_err();
        assert_eq!(err, ValidationError::DuplicateCandidate("A".into()));
    }

    #[test]
    fn list_keeps_order() {
        let list = CandidateList::from_names(["B", "A"]).unwrap();
        let names: Vec<_> = list.iter().map(Candidate::as_str).collect();
        assert_eq!(names, vec!["B", "A"]);
    }

    #[test]
    fn deserialization_validates() {
        let ok: Candidate = serde_json::from_str(r#""Carol""#).unwrap();
        assert_eq!(ok.as_str(), "Carol");
        assert!(serde_json::from_str::<Candidate>(r#""""#).is_err());
    }
}
