//! Unit tests for the identifier newtypes

use core_kernel::{ClaimId, LecturerId};
use std::collections::BTreeSet;

mod claim_id {
    use super::*;

    #[test]
    fn test_display_is_zero_padded() {
        assert_eq!(ClaimId::new(1).to_string(), "CLM-000001");
        assert_eq!(ClaimId::new(1234567).to_string(), "CLM-1234567");
    }

    #[test]
    fn test_parse_accepts_prefixed_and_bare() {
        assert_eq!("CLM-000015".parse::<ClaimId>().unwrap(), ClaimId::new(15));
        assert_eq!("15".parse::<ClaimId>().unwrap(), ClaimId::new(15));
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!("CLM-".parse::<ClaimId>().is_err());
        assert!("claim-1".parse::<ClaimId>().is_err());
        assert!("-1".parse::<ClaimId>().is_err());
    }

    #[test]
    fn test_display_parse_round_trip() {
        let id = ClaimId::new(42);
        assert_eq!(id.to_string().parse::<ClaimId>().unwrap(), id);
    }

    #[test]
    fn test_ordering_follows_sequence() {
        let ids: BTreeSet<ClaimId> = [3, 1, 2].into_iter().map(ClaimId::from).collect();
        let values: Vec<u64> = ids.iter().map(|id| id.value()).collect();
        assert_eq!(values, vec![1, 2, 3]);
    }

    #[test]
    fn test_serializes_as_number() {
        assert_eq!(serde_json::to_string(&ClaimId::new(9)).unwrap(), "9");
    }
}

mod lecturer_id {
    use super::*;

    #[test]
    fn test_blank_rejected() {
        assert!(LecturerId::new("").is_err());
        assert!("  ".parse::<LecturerId>().is_err());
    }

    #[test]
    fn test_serde_validates() {
        let id: LecturerId = serde_json::from_str("\"L7\"").unwrap();
        assert_eq!(id.as_str(), "L7");
        assert!(serde_json::from_str::<LecturerId>("\" \"").is_err());
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"L7\"");
    }

    #[test]
    fn test_into_string() {
        let id = LecturerId::new("lecturer@uni.ac.za").unwrap();
        let raw: String = id.clone().into();
        assert_eq!(raw, id.to_string());
    }
}
