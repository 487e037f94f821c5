//! Record Model Tests
//!
//! Keys, bins, values, records and policies.

use std::collections::BTreeMap;
use std::time::Duration;

use recordkv::record::{NumericKind, MAX_NAMESPACE_LEN, MAX_SET_LEN};
use recordkv::{
    Bin, ClientConfig, ClientError, Consistency, Expiration, GenerationPolicy, Host, Key, Policy,
    Record, UserKey, Value,
};

// =============================================================================
// Key Tests
// =============================================================================

#[test]
fn test_key_identity_is_value_equality() {
    let a = Key::new("test", "myset", "mykey").unwrap();
    let b = Key::new("test", "myset", "mykey").unwrap();
    let c = Key::new("test", "myset", 1).unwrap();

    assert_eq!(a, b);
    assert_ne!(a, c);
    assert_eq!(a.digest(), b.digest());
    assert_eq!(a.to_string(), "test:myset:mykey");
}

#[test]
fn test_key_user_key_types_differ() {
    let s = Key::new("test", "myset", "1").unwrap();
    let i = Key::new("test", "myset", 1).unwrap();
    let b = Key::new("test", "myset", vec![b'1']).unwrap();

    assert_ne!(s.digest(), i.digest());
    assert_ne!(s.digest(), b.digest());
    assert_eq!(*i.user_key(), UserKey::Int(1));
}

#[test]
fn test_key_digest_ignores_namespace() {
    let a = Key::new("test", "myset", "k").unwrap();
    let b = Key::new("bar", "myset", "k").unwrap();
    assert_ne!(a, b);
    assert_eq!(a.digest(), b.digest());
}

#[test]
fn test_key_validation() {
    assert!(matches!(Key::new("", "myset", "k"), Err(ClientError::Validation(_))));
    assert!(Key::new("test", "", "k").is_ok());

    let long_ns = "n".repeat(MAX_NAMESPACE_LEN + 1);
    assert!(Key::new(long_ns, "myset", "k").is_err());
    let long_set = "s".repeat(MAX_SET_LEN + 1);
    assert!(Key::new("test", long_set, "k").is_err());
}

// =============================================================================
// Value Tests
// =============================================================================

#[test]
fn test_value_conversions() {
    assert_eq!(Value::from(42), Value::Int(42));
    assert_eq!(Value::from(7u32), Value::Int(7));
    assert_eq!(Value::from("x"), Value::String("x".to_string()));
    assert_eq!(Value::from(None::<i64>), Value::Null);
    assert_eq!(Value::from(Some(1.5)), Value::Float(1.5));
    assert_eq!(Value::from(&b"ab"[..]), Value::Bytes(vec![b'a', b'b']));
}

#[test]
fn test_value_numeric_kind() {
    assert_eq!(Value::Int(1).numeric_kind(), Some(NumericKind::Int));
    assert_eq!(Value::Float(1.0).numeric_kind(), Some(NumericKind::Float));
    assert_eq!(Value::from("1").numeric_kind(), None);
    assert_eq!(Value::Null.numeric_kind(), None);
    assert!(Value::Null.is_null());
}

#[test]
fn test_value_accessors() {
    assert_eq!(Value::Int(3).as_int(), Some(3));
    assert_eq!(Value::Int(3).as_str(), None);
    assert_eq!(Value::Float(2.5).as_float(), Some(2.5));
    assert_eq!(Value::from("hi").as_str(), Some("hi"));
}

// =============================================================================
// Bin & Record Tests
// =============================================================================

#[test]
fn test_bin_constructors() {
    let bin = Bin::new("age", 42);
    assert_eq!(bin.name, "age");
    assert_eq!(bin.value, Value::Int(42));
    assert!(Bin::null("gone").value.is_null());
}

#[test]
fn test_record_accessors() {
    let mut bins = BTreeMap::new();
    bins.insert("name".to_string(), Value::from("Lynn"));
    bins.insert("age".to_string(), Value::from(42));
    let record = Record::new(bins, 2, None);

    assert_eq!(record.get_str("name"), Some("Lynn"));
    assert_eq!(record.get_int("age"), Some(42));
    assert_eq!(record.get_int("name"), None);
    assert!(record.get("missing").is_none());
    assert_eq!(record.generation(), 2);
    assert_eq!(record.ttl(), None);
    assert!(!record.is_empty());
    assert_eq!(record.into_bins().len(), 2);
}

// =============================================================================
// Policy & Config Tests
// =============================================================================

#[test]
fn test_policy_builder_overrides_base() {
    let base = Policy::builder()
        .timeout_ms(300)
        .consistency(Consistency::Session)
        .build();
    let derived = Policy::builder()
        .expiration(Expiration::from_secs(2))
        .generation(GenerationPolicy::ExpectEqual(1))
        .build_from(&base);

    assert_eq!(derived.timeout(), Duration::from_millis(300));
    assert_eq!(derived.consistency(), Consistency::Session);
    assert_eq!(derived.expiration(), Expiration::Seconds(2));
    assert_eq!(derived.generation(), GenerationPolicy::ExpectEqual(1));
    assert_eq!(Expiration::from_secs(0), Expiration::Never);
}

#[test]
fn test_host_parsing() {
    let host: Host = "db1.local:3000".parse().unwrap();
    assert_eq!(host, Host::new("db1.local", 3000));
    assert_eq!(host.to_string(), "db1.local:3000");

    assert!("nohost".parse::<Host>().is_err());
    assert!("db:notaport".parse::<Host>().is_err());
    assert!(":3000".parse::<Host>().is_err());
}

#[test]
fn test_config_builder() {
    let config = ClientConfig::builder()
        .seed(Host::new("a", 3000))
        .seed(Host::new("b", 3000))
        .max_conns_per_node(4)
        .build();

    assert_eq!(config.seeds.len(), 2);
    assert_eq!(config.max_conns_per_node, 4);
    assert_eq!(config.default_policy, Policy::default());
}
