use apikit::api::BodyError;
use apikit::{read_json, Runtime};
use proptest::prelude::*;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
struct Film {
    runtime: Runtime,
}

proptest! {
    #[test]
    fn every_minute_count_survives_the_wire(minutes in any::<i32>()) {
        let encoded = serde_json::to_string(&Runtime(minutes)).unwrap();
        prop_assert_eq!(&encoded, &format!("\"{minutes} mins\""));

        let decoded: Runtime = serde_json::from_str(&encoded).unwrap();
        prop_assert_eq!(decoded, Runtime(minutes));
    }

    #[test]
    fn bare_numbers_are_never_runtimes(minutes in any::<i64>()) {
        let body = format!(r#"{{"runtime": {minutes}}}"#);
        let err = read_json::<Film, _>(body.as_bytes()).unwrap_err();
        prop_assert_eq!(err, BodyError::Other("invalid runtime format".into()));
    }

    #[test]
    fn other_units_are_rejected(minutes in any::<i32>(), unit in "[a-z]{1,8}") {
        prop_assume!(unit != "mins");
        let text = format!("{minutes} {unit}");
        prop_assert!(text.parse::<Runtime>().is_err());
    }
}
