use proptest::prelude::*;

use votebox_types::codec::{decode, encode, SEPARATOR};
use votebox_types::{Candidate, CandidateList, MAX_CANDIDATES};

proptest! {
    /// decode is the exact inverse of encode for separator-free names.
    #[test]
    fn decode_inverts_encode(names in prop::collection::vec("[^\\x00]{0,30}", 1..=10)) {
        let blob = encode(&names).unwrap();
        prop_assert_eq!(decode(&blob).unwrap(), names);
    }

    /// The blob holds exactly one separator between consecutive names.
    #[test]
    fn separator_count_matches_list_length(names in prop::collection::vec("[a-z]{1,30}", 1..=10)) {
        let blob = encode(&names).unwrap();
        let separators = blob.iter().filter(|b| **b == SEPARATOR).count();
        prop_assert_eq!(separators, names.len() - 1);
    }

    /// Any name containing the separator is refused, wherever it sits.
    #[test]
    fn separator_anywhere_is_rejected(
        prefix in "[a-z]{0,10}",
        suffix in "[a-z]{0,10}",
        position in 0usize..MAX_CANDIDATES,
    ) {
        let mut names: Vec<String> = (0..MAX_CANDIDATES).map(|i| format!("n{i}")).collect();
        names[position] = format!("{prefix}\0{suffix}");
        prop_assert!(encode(&names).is_err());
    }

    /// Validated candidate lists always encode.
    #[test]
    fn valid_lists_always_encode(names in prop::collection::hash_set("[A-Za-z0-9 ]{1,30}", 1..=10)) {
        let list = CandidateList::from_names(names).unwrap();
        let blob = encode(list.as_slice()).unwrap();
        let decoded = decode(&blob).unwrap();
        let names: Vec<&str> = list.iter().map(Candidate::as_str).collect();
        prop_assert_eq!(decoded, names);
    }
}
