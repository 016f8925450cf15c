//! Matching registry segments to reported employers.
//!
//! Candidates type employer names freely ("Acme Corp", "ACME Corporation
//! Pvt. Ltd."), while the registry spells the establishment its own way.
//! Both sides are reduced to a comparison key before matching.

use bgv_types::{EmployeeRecord, NationalRegistryRecord, WorkHistoryEntry};

/// Legal-form and filler words that never distinguish two employers.
const NOISE_WORDS: &[&str] = &[
    "the",
    "pvt",
    "private",
    "ltd",
    "limited",
    "llp",
    "llc",
    "inc",
    "incorporated",
    "corp",
    "corporation",
    "co",
    "company",
    "india",
];

/// Lower-case, strip punctuation and legal-form words, collapse whitespace.
pub fn employer_key(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .map(|c| if c.is_alphanumeric() { c.to_ascii_lowercase() } else { ' ' })
        .collect();
    cleaned
        .split_whitespace()
        .filter(|word| !NOISE_WORDS.contains(word))
        .collect::<Vec<_>>()
        .join(" ")
}

/// The first segment whose establishment matches `entry`'s employer.
pub fn matching_segment<'a>(
    entry: &WorkHistoryEntry,
    segments: &'a [NationalRegistryRecord],
) -> Option<&'a NationalRegistryRecord> {
    let key = employer_key(&entry.employer_name);
    if key.is_empty() {
        return None;
    }
    segments
        .iter()
        .find(|segment| employer_key(&segment.establishment_name) == key)
}

/// The employee record a registry segment confirms for `entry`.
pub fn confirmed_record(entry: &WorkHistoryEntry, segment: &NationalRegistryRecord) -> EmployeeRecord {
    EmployeeRecord {
        employee_name: entry.employee_name.clone(),
        establishment_name: segment.establishment_name.clone(),
        member_id: segment.member_id.clone(),
        joined: segment.joined.clone(),
        exit: segment.exit.clone(),
    }
}
