use proptest::prelude::*;
use serde_json::{json, Map, Value};

use bgv_protocol::normalizer::{fold_key, normalize_segment};

/// Re-spell `words` with a random separator and per-word casing.
fn spelled(words: &[&str], sep: &str, upper_mask: u8) -> String {
    words
        .iter()
        .enumerate()
        .map(|(i, w)| {
            if upper_mask & (1 << (i % 8)) != 0 {
                w.to_ascii_uppercase()
            } else {
                w.to_string()
            }
        })
        .collect::<Vec<_>>()
        .join(sep)
}

proptest! {
    /// Folding is idempotent.
    #[test]
    fn fold_is_idempotent(key in "[ -~]{0,40}") {
        let once = fold_key(&key);
        prop_assert_eq!(fold_key(&once), once);
    }

    /// Any spelling of a known key yields the same canonical segment bytes.
    #[test]
    fn spelling_does_not_change_output(
        sep in prop::sample::select(vec!["", " ", "_", "-"]),
        mask in any::<u8>(),
        name in "[A-Za-z][A-Za-z ]{0,20}[A-Za-z]",
    ) {
        let mut spelled_obj = Map::new();
        spelled_obj.insert(spelled(&["establishment", "name"], sep, mask), json!(name.clone()));
        spelled_obj.insert(spelled(&["date", "of", "joining"], sep, mask), json!("05-2021"));
        spelled_obj.insert(spelled(&["member", "id"], sep, mask), json!("M-1"));

        let reference = json!({
            "establishmentName": name,
            "dateOfJoining": "05-2021",
            "memberId": "M-1"
        });

        let a = serde_json::to_vec(&normalize_segment(&Value::Object(spelled_obj)).unwrap()).unwrap();
        let b = serde_json::to_vec(&normalize_segment(&reference).unwrap()).unwrap();
        prop_assert_eq!(a, b);
    }
}
