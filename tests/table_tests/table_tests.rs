//! Table Tests
//!
//! Tests verify:
//! - Capacity rounding to primes
//! - put / get / remove semantics
//! - Duplicate key handling
//! - Count bookkeeping
//! - Iteration over all buckets

use hashlib::table::{next_prime, MAX_BUCKETS, MAX_CAPACITY};
use hashlib::{Config, HashlibError, Table};
use serde::Serialize;

// =============================================================================
// Helper Functions
// =============================================================================

#[derive(Debug, Serialize)]
struct Translation {
    english: &'static str,
    german: &'static str,
    french: &'static str,
    latin: &'static str,
}

fn table_with_entries(capacity: usize, count: u64) -> Table<u64> {
    let mut table = Table::new(capacity).unwrap();
    for i in 0..count {
        assert!(table.put(&format!("key{:05}", i), i));
    }
    table
}

// =============================================================================
// Capacity Tests
// =============================================================================

#[test]
fn test_capacity_rounds_up_to_prime() {
    let table: Table<u64> = Table::new(1000).unwrap();
    assert_eq!(table.capacity(), 1009);
}

#[test]
fn test_capacity_minimum_is_three() {
    assert_eq!(Table::<u64>::new(1).unwrap().capacity(), 3);
    assert_eq!(Table::<u64>::new(2).unwrap().capacity(), 3);
    assert_eq!(Table::<u64>::new(3).unwrap().capacity(), 3);
}

#[test]
fn test_capacity_even_requests_become_odd_primes() {
    assert_eq!(Table::<u64>::new(4).unwrap().capacity(), 5);
    assert_eq!(Table::<u64>::new(24).unwrap().capacity(), 29);
    assert_eq!(Table::<u64>::new(97).unwrap().capacity(), 97);
}

#[test]
fn test_capacity_skips_odd_squares() {
    assert_eq!(next_prime(25).unwrap(), 29);
    assert_eq!(next_prime(49).unwrap(), 53);
    assert_eq!(next_prime(121).unwrap(), 127);
}

#[test]
fn test_capacity_zero_rejected() {
    let result = Table::<u64>::new(0);
    assert!(matches!(result, Err(HashlibError::InvalidCapacity(0))));
}

#[test]
fn test_capacity_above_maximum_rejected() {
    assert_eq!(next_prime(MAX_CAPACITY).unwrap(), MAX_BUCKETS);
    assert!(matches!(
        next_prime(MAX_CAPACITY + 1),
        Err(HashlibError::InvalidCapacity(_))
    ));
}

#[test]
fn test_with_config_uses_configured_capacity() {
    let config = Config::builder().capacity(50).build();
    let table: Table<u64> = Table::with_config(config).unwrap();
    assert_eq!(table.capacity(), 53);
    assert_eq!(table.config().capacity, 50);
}

// =============================================================================
// Basic Operations Tests
// =============================================================================

#[test]
fn test_new_table_is_empty() {
    let table: Table<u64> = Table::new(17).unwrap();
    assert_eq!(table.count(), 0);
    assert!(table.is_empty());
    assert_eq!(table.iter().count(), 0);
}

#[test]
fn test_same_value_under_four_keys() {
    let example = Translation {
        english: "horse",
        german: "Pferd",
        french: "cheval",
        latin: "equus",
    };

    let mut table: Table<&Translation> = Table::new(1000).unwrap();
    assert_eq!(table.capacity(), 1009);

    assert!(table.put("horse", &example));
    assert!(table.put("Pferd", &example));
    assert!(table.put("equus", &example));
    assert!(table.put("cheval", &example));

    assert_eq!(table.count(), 4);

    let found = table.get("horse").unwrap();
    assert!(std::ptr::eq(*found, &example));
    assert_eq!(found.german, "Pferd");
}

#[test]
fn test_get_nonexistent_key() {
    let table = table_with_entries(17, 10);
    assert_eq!(table.get("missing"), None);
    assert!(!table.contains_key("missing"));
}

#[test]
fn test_get_is_exact_match_only() {
    let mut table: Table<u64> = Table::new(17).unwrap();
    table.put("prefix", 1);

    assert_eq!(table.get("pre"), None);
    assert_eq!(table.get("prefix-and-more"), None);
    assert_eq!(table.get("Prefix"), None);
    assert_eq!(table.get("prefix"), Some(&1));
}

#[test]
fn test_empty_key_is_a_valid_key() {
    let mut table: Table<u64> = Table::new(17).unwrap();
    assert!(table.put("", 7));
    assert_eq!(table.get(""), Some(&7));
    assert_eq!(table.remove(""), Some(7));
}

#[test]
fn test_key_is_copied() {
    let mut table: Table<u64> = Table::new(17).unwrap();
    let mut key = String::from("owned");
    table.put(&key, 1);

    key.push_str("-changed");
    assert_eq!(table.get("owned"), Some(&1));
    assert_eq!(table.get(&key), None);
}

#[test]
fn test_get_mut_updates_value() {
    let mut table = table_with_entries(17, 3);
    *table.get_mut("key00001").unwrap() += 100;
    assert_eq!(table.get("key00001"), Some(&101));
    assert!(table.get_mut("nope").is_none());
}

// =============================================================================
// Duplicate Key Tests
// =============================================================================

#[test]
fn test_duplicate_put_keeps_original() {
    let mut table: Table<u64> = Table::new(17).unwrap();

    assert!(table.put("key", 1));
    assert!(!table.put("key", 2));

    assert_eq!(table.count(), 1);
    assert_eq!(table.get("key"), Some(&1));
}

#[test]
fn test_try_put_hands_back_rejected_value() {
    let mut table: Table<String> = Table::new(17).unwrap();

    assert_eq!(table.try_put("key", "first".to_string()), Ok(()));
    assert_eq!(
        table.try_put("key", "second".to_string()),
        Err("second".to_string())
    );
    assert_eq!(table.get("key").map(String::as_str), Some("first"));
}

// =============================================================================
// Remove Tests
// =============================================================================

#[test]
fn test_remove_returns_value() {
    let mut table = table_with_entries(17, 5);

    assert_eq!(table.remove("key00003"), Some(3));
    assert_eq!(table.count(), 4);
    assert_eq!(table.get("key00003"), None);
}

#[test]
fn test_remove_nonexistent_key() {
    let mut table = table_with_entries(17, 5);

    assert_eq!(table.remove("missing"), None);
    assert_eq!(table.count(), 5);
}

#[test]
fn test_remove_twice() {
    let mut table = table_with_entries(17, 5);

    assert_eq!(table.remove("key00000"), Some(0));
    assert_eq!(table.remove("key00000"), None);
    assert_eq!(table.count(), 4);
}

#[test]
fn test_put_after_remove() {
    let mut table = table_with_entries(17, 5);

    table.remove("key00002");
    assert!(table.put("key00002", 42));
    assert_eq!(table.get("key00002"), Some(&42));
    assert_eq!(table.count(), 5);
}

// =============================================================================
// Collision Tests
// =============================================================================

#[test]
fn test_many_collisions_in_small_table() {
    // 3 buckets, 1000 keys: every bucket tree holds hundreds of entries
    let mut table = table_with_entries(3, 1000);
    assert_eq!(table.capacity(), 3);
    assert_eq!(table.count(), 1000);

    for i in 0..1000u64 {
        assert_eq!(table.get(&format!("key{:05}", i)), Some(&i));
    }

    for i in (0..1000u64).filter(|i| i % 2 == 0) {
        assert_eq!(table.remove(&format!("key{:05}", i)), Some(i));
    }
    assert_eq!(table.count(), 500);

    for i in 0..1000u64 {
        let expected = if i % 2 == 0 { None } else { Some(&i) };
        assert_eq!(table.get(&format!("key{:05}", i)), expected);
    }
}

// =============================================================================
// Iteration Tests
// =============================================================================

#[test]
fn test_iter_visits_every_entry_once() {
    let table = table_with_entries(31, 200);

    let mut keys: Vec<&str> = table.keys().collect();
    assert_eq!(keys.len(), 200);
    keys.sort();
    keys.dedup();
    assert_eq!(keys.len(), 200);

    let sum: u64 = table.iter().map(|(_, v)| *v).sum();
    assert_eq!(sum, (0..200).sum());
}

#[test]
fn test_iter_reports_exact_size() {
    let table = table_with_entries(31, 25);
    let mut iter = table.iter();
    assert_eq!(iter.len(), 25);
    iter.next();
    assert_eq!(iter.len(), 24);
}

#[test]
fn test_iter_is_ascending_within_single_bucket() {
    let table = table_with_entries(3, 60);

    // Collect keys per bucket in visiting order
    let mut per_bucket: Vec<Vec<&str>> = vec![Vec::new(); 3];
    for key in table.keys() {
        per_bucket[hashlib::hasher::bucket_index(key, 3)].push(key);
    }
    for bucket in per_bucket {
        assert!(bucket.windows(2).all(|w| w[0] < w[1]));
    }
}

#[test]
fn test_iter_visits_buckets_in_index_order() {
    let table = table_with_entries(7, 50);
    let slots: Vec<usize> = table
        .keys()
        .map(|key| hashlib::hasher::bucket_index(key, 7))
        .collect();
    assert!(slots.windows(2).all(|w| w[0] <= w[1]));
}

#[test]
fn test_debug_lists_entries() {
    let mut table: Table<u64> = Table::new(3).unwrap();
    table.put("only", 9);
    assert_eq!(format!("{:?}", table), r#"{"only": 9}"#);
}
