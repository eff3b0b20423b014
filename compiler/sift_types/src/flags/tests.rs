use super::*;

#[test]
fn accessors_read_single_bits() {
    let flags = TypeFlags::IS_VALUE_TYPE | TypeFlags::IS_REF_LIKE;
    assert!(flags.is_value_type());
    assert!(flags.is_ref_like());
    assert!(!flags.may_be_null());
}

#[test]
fn flags_are_distinct() {
    let all = [
        TypeFlags::IS_VALUE_TYPE,
        TypeFlags::IS_REFERENCE_TYPE,
        TypeFlags::MAY_BE_NULL,
        TypeFlags::IS_REF_LIKE,
        TypeFlags::IS_INTEGRAL,
        TypeFlags::IS_ORDERED,
        TypeFlags::IS_OPEN,
        TypeFlags::IS_SEQUENCE,
        TypeFlags::ACCEPTS_CONSTANTS,
        TypeFlags::IS_ERROR,
    ];
    let union = all.iter().fold(TypeFlags::empty(), |acc, f| acc | *f);
    assert_eq!(union.bits().count_ones() as usize, all.len());
}
