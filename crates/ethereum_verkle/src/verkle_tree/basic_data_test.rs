use assert_matches::assert_matches;
use pretty_assertions::assert_eq;
use rstest::rstest;

use crate::verkle_tree::basic_data::{
    balance, balance_u128, code_size, code_size_u32, nonce, nonce_u64, set_balance,
    set_code_size, set_nonce, set_version, version, BasicDataError,
};
use crate::verkle_tree::types::TrieValue;

fn packed(
    version_bytes: &[u8],
    code_size_bytes: &[u8],
    nonce_bytes: &[u8],
    balance_bytes: &[u8],
) -> TrieValue {
    let value = set_version(TrieValue::ZERO, version_bytes).unwrap();
    let value = set_code_size(value, code_size_bytes).unwrap();
    let value = set_nonce(value, nonce_bytes).unwrap();
    set_balance(value, balance_bytes).unwrap()
}

/// Writing all four fields and reading them back returns the originals.
#[rstest]
#[case::zeroes(&[0], &[0; 3], &[0; 8], &[0; 16])]
#[case::max(&[0xFF], &[0xFF; 3], &[0xFF; 8], &[0xFF; 16])]
#[case::mixed(&[1], &[0x03, 0x02, 0x01], &[0x11, 0, 0xFF, 0xEE, 0xDD, 0xCC, 0xBB, 0xAA], &[0xFF, 0xEE, 0xDD, 0xCC, 0xBB, 0xAA, 0x99, 0x88, 0x77, 0x66, 0x55, 0x44, 0x33, 0x22, 0x11, 0])]
fn fields_round_trip(
    #[case] version_bytes: &[u8],
    #[case] code_size_bytes: &[u8],
    #[case] nonce_bytes: &[u8],
    #[case] balance_bytes: &[u8],
) {
    let value = packed(version_bytes, code_size_bytes, nonce_bytes, balance_bytes);
    assert_eq!(version(&value), version_bytes[0]);
    assert_eq!(code_size(&value), code_size_bytes);
    assert_eq!(nonce(&value), nonce_bytes);
    assert_eq!(balance(&value), balance_bytes);
}

/// The packed layout is the concatenation in field order with zero-filled
/// reserved bytes.
#[test]
fn packed_layout_matches_field_offsets() {
    let value = packed(
        &[1],
        &0x0001_0203_u32.to_le_bytes()[..3],
        &0xAABB_CCDD_EEFF_0011_u64.to_le_bytes(),
        &0x0011_2233_4455_6677_8899_AABB_CCDD_EEFF_u128.to_le_bytes(),
    );

    let mut expected = [0u8; 32];
    expected[0] = 1;
    // Bytes 1..5 stay reserved and zero.
    expected[5..8].copy_from_slice(&0x0001_0203_u32.to_le_bytes()[..3]);
    expected[8..16].copy_from_slice(&0xAABB_CCDD_EEFF_0011_u64.to_le_bytes());
    expected[16..32].copy_from_slice(&0x0011_2233_4455_6677_8899_AABB_CCDD_EEFF_u128.to_le_bytes());
    assert_eq!(value.0, expected);

    assert_eq!(code_size_u32(&value), 0x0001_0203);
    assert_eq!(nonce_u64(&value), 0xAABB_CCDD_EEFF_0011);
    assert_eq!(balance_u128(&value), 0x0011_2233_4455_6677_8899_AABB_CCDD_EEFF);
}

/// A setter replaces only its own window.
#[test]
fn setters_leave_other_fields_untouched() {
    let value = packed(&[3], &[1, 2, 3], &[9; 8], &[7; 16]);
    let updated = set_nonce(value, &[0x55; 8]).unwrap();

    assert_eq!(version(&updated), 3);
    assert_eq!(code_size(&updated), [1, 2, 3]);
    assert_eq!(nonce(&updated), [0x55; 8]);
    assert_eq!(balance(&updated), [7; 16]);
}

#[rstest]
#[case::version_too_long(set_version(TrieValue::ZERO, &[0, 0]), "version", 1, 2)]
#[case::code_size_too_short(set_code_size(TrieValue::ZERO, &[0; 2]), "code_size", 3, 2)]
#[case::nonce_too_long(set_nonce(TrieValue::ZERO, &[0; 9]), "nonce", 8, 9)]
#[case::balance_too_short(set_balance(TrieValue::ZERO, &[0; 15]), "balance", 16, 15)]
fn wrong_field_widths_are_rejected(
    #[case] result: Result<TrieValue, BasicDataError>,
    #[case] field: &'static str,
    #[case] expected: usize,
    #[case] actual: usize,
) {
    assert_matches!(
        result,
        Err(BasicDataError::FieldSize { field: f, expected: e, actual: a })
            if f == field && e == expected && a == actual
    );
}
