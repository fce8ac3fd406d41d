// URL builder tests: placement, ordering, signing

use chrono::{TimeZone, Utc};
use imagekit_url::url::{HmacSha1Signer, DEFAULT_EXPIRY};
use imagekit_url::{
    ImageKitError, Position, SrcOptions, TransformationStep, UrlBuilder, UrlSigner, Value,
};
use rstest::rstest;
use std::sync::Arc;

const ENDPOINT: &str = "https://ik.example.com/acct";

fn size_step() -> TransformationStep {
    TransformationStep::new()
        .with("width", 400)
        .with("height", 300)
}

#[test]
fn test_end_to_end_query_url() {
    let options = SrcOptions::new("/test.jpg", ENDPOINT).transformation(size_step());
    let url = UrlBuilder::new().build(&options).unwrap();
    assert_eq!(url, "https://ik.example.com/acct/test.jpg?tr=h-300,w-400");
}

#[test]
fn test_build_is_idempotent() {
    let builder = UrlBuilder::with_private_key("private_key_test");
    let now = Utc.timestamp_opt(1_700_000_000, 0).unwrap();
    let options = SrcOptions::new("/test.jpg", ENDPOINT)
        .transformation(size_step())
        .query("v", "3")
        .expire_seconds(600);

    let first = builder.build_at(&options, now).unwrap();
    let second = builder.build_at(&options, now).unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_chain_order_preserved_in_path() {
    let options = SrcOptions::new("/test.jpg", ENDPOINT)
        .transformation(TransformationStep::new().with("width", 400))
        .transformation(TransformationStep::new().with("rotation", 90))
        .position(Position::Path);
    let url = UrlBuilder::new().build(&options).unwrap();
    assert_eq!(url, "https://ik.example.com/acct/tr:w-400:rt-90/test.jpg");
}

#[rstest]
#[case(Position::Query)]
#[case(Position::Path)]
fn test_absolute_url_always_uses_query(#[case] position: Position) {
    let options = SrcOptions::new("https://host/x.jpg", ENDPOINT)
        .transformation(size_step())
        .position(position);
    let url = UrlBuilder::new().build(&options).unwrap();
    assert_eq!(url, "https://host/x.jpg?tr=h-300,w-400");
}

#[test]
fn test_user_query_parameters_come_before_tr() {
    let options = SrcOptions::new("/test.jpg", ENDPOINT)
        .transformation(size_step())
        .query("b", "2")
        .query("a", "1");
    let url = UrlBuilder::new().build(&options).unwrap();
    assert_eq!(
        url,
        "https://ik.example.com/acct/test.jpg?b=2&a=1&tr=h-300,w-400"
    );
}

#[test]
fn test_signature_parameters_are_last() {
    let builder = UrlBuilder::with_private_key("private_key_test");
    let now = Utc.timestamp_opt(1_700_000_000, 0).unwrap();
    let options = SrcOptions::new("/test.jpg", ENDPOINT)
        .transformation(size_step())
        .query("v", "1")
        .expire_seconds(60);

    let url = builder.build_at(&options, now).unwrap();
    let query = url.split_once('?').unwrap().1;
    let keys: Vec<&str> = query
        .split('&')
        .map(|pair| pair.split('=').next().unwrap())
        .collect();
    assert_eq!(keys, vec!["v", "tr", "ik-t", "ik-s"]);
    assert!(url.contains("ik-t=1700000060"));
}

#[test]
fn test_signature_matches_canonical_url() {
    let builder = UrlBuilder::with_private_key("private_key_test");
    let now = Utc.timestamp_opt(1_700_000_000, 0).unwrap();
    let options = SrcOptions::new("/test.jpg", ENDPOINT)
        .transformation(size_step())
        .expire_seconds(60);

    let url = builder.build_at(&options, now).unwrap();
    let signature = url.rsplit_once("ik-s=").unwrap().1;

    let signer = HmacSha1Signer::new("private_key_test");
    assert!(signer.verify("test.jpg?tr=h-300,w-400", 1_700_000_060, signature));
}

#[test]
fn test_signing_determinism_and_expiry_sensitivity() {
    let builder = UrlBuilder::with_private_key("private_key_test");
    let options = SrcOptions::new("/test.jpg", ENDPOINT).expire_seconds(100);
    let t0 = Utc.timestamp_opt(1_700_000_000, 0).unwrap();
    let t1 = Utc.timestamp_opt(1_700_000_001, 0).unwrap();

    let a = builder.build_at(&options, t0).unwrap();
    let b = builder.build_at(&options, t0).unwrap();
    let c = builder.build_at(&options, t1).unwrap();

    let sig = |url: &str| url.rsplit_once("ik-s=").unwrap().1.to_string();
    assert_eq!(sig(&a), sig(&b));
    assert_ne!(sig(&a), sig(&c));
}

#[test]
fn test_signed_without_expiry_uses_default_expiry() {
    let builder = UrlBuilder::with_private_key("private_key_test");
    let options = SrcOptions::new("/test.jpg", ENDPOINT).signed(true);
    let url = builder.build(&options).unwrap();

    assert!(!url.contains("ik-t="));
    let expected = HmacSha1Signer::new("private_key_test").sign("test.jpg", DEFAULT_EXPIRY);
    assert_eq!(
        url,
        format!("https://ik.example.com/acct/test.jpg?ik-s={}", expected)
    );
}

#[derive(Debug)]
struct FixedSigner;

impl UrlSigner for FixedSigner {
    fn sign(&self, canonical: &str, expiry: u64) -> String {
        format!("{}|{}", canonical.len(), expiry)
    }
}

#[test]
fn test_custom_signer() {
    let builder = UrlBuilder::new().signer(Arc::new(FixedSigner));
    let options = SrcOptions::new("/test.jpg", ENDPOINT).signed(true);
    let url = builder.build(&options).unwrap();
    assert_eq!(
        url,
        format!(
            "https://ik.example.com/acct/test.jpg?ik-s={}|{}",
            "test.jpg".len(),
            DEFAULT_EXPIRY
        )
    );
}

#[test]
fn test_unknown_keys_pass_through() {
    let step = TransformationStep::new()
        .with("width", 100)
        .with("e-brand-new", Value::Str("-".to_string()));
    let options = SrcOptions::new("/test.jpg", ENDPOINT).transformation(step);
    let url = UrlBuilder::new().build(&options).unwrap();
    assert_eq!(url, "https://ik.example.com/acct/test.jpg?tr=w-100,e-brand-new");
}

#[test]
fn test_overlay_layer_in_path() {
    let overlay = TransformationStep::new()
        .with("input", "logo.png")
        .with("width", 50);
    let step = TransformationStep::new()
        .with("width", 400)
        .with("image", overlay);
    let options = SrcOptions::new("/test.jpg", ENDPOINT)
        .transformation(step)
        .position(Position::Path);
    let url = UrlBuilder::new().build(&options).unwrap();
    assert_eq!(
        url,
        "https://ik.example.com/acct/tr:w-400,l-image,w-50,i-logo.png,l-end/test.jpg"
    );
}

#[rstest]
#[case("")]
#[case("   ")]
fn test_empty_path_is_invalid_input(#[case] path: &str) {
    let err = UrlBuilder::new()
        .build(&SrcOptions::new(path, ENDPOINT))
        .unwrap_err();
    assert!(matches!(err, ImageKitError::InvalidInput { .. }));
}

#[rstest]
#[case(Position::Query, "https://ik.example.com/acct/test.jpg?v=1&tr=w-100")]
#[case(Position::Path, "https://ik.example.com/acct/tr:w-100/test.jpg?v=1")]
fn test_relative_path_with_query_has_single_separator(
    #[case] position: Position,
    #[case] expected: &str,
) {
    let options = SrcOptions::new("/test.jpg?v=1", ENDPOINT)
        .transformation(TransformationStep::new().with("width", 100))
        .position(position);
    let url = UrlBuilder::new().build(&options).unwrap();
    assert_eq!(url, expected);
    assert_eq!(url.matches('?').count(), 1);
}

#[test]
fn test_relative_path_with_query_signed_path_placement() {
    let options = SrcOptions::new("/test.jpg?v=1", ENDPOINT)
        .transformation(TransformationStep::new().with("width", 100))
        .position(Position::Path)
        .signed(true);
    let url = UrlBuilder::with_private_key("private_key_test")
        .build(&options)
        .unwrap();

    let signature =
        HmacSha1Signer::new("private_key_test").sign("tr:w-100/test.jpg?v=1", DEFAULT_EXPIRY);
    assert_eq!(
        url,
        format!(
            "https://ik.example.com/acct/tr:w-100/test.jpg?v=1&ik-s={}",
            signature
        )
    );
}

#[test]
fn test_absolute_url_fragment_is_kept_last() {
    let options = SrcOptions::new("https://host/x.jpg#frag", ENDPOINT)
        .transformation(TransformationStep::new().with("width", 100));
    let url = UrlBuilder::new().build(&options).unwrap();
    assert_eq!(url, "https://host/x.jpg?tr=w-100#frag");
}

#[test]
fn test_sibling_of_endpoint_is_not_stripped_before_signing() {
    let sibling = "https://ik.example.com/acctX/y.jpg";
    let options = SrcOptions::new(sibling, ENDPOINT).signed(true);
    let url = UrlBuilder::with_private_key("private_key_test")
        .build(&options)
        .unwrap();

    let signer = HmacSha1Signer::new("private_key_test");
    assert_eq!(
        url,
        format!("{}?ik-s={}", sibling, signer.sign(sibling, DEFAULT_EXPIRY))
    );
    assert_ne!(
        url,
        format!("{}?ik-s={}", sibling, signer.sign("X/y.jpg", DEFAULT_EXPIRY))
    );
}
