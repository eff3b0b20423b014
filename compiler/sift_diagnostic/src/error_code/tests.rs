use std::collections::HashSet;

use super::*;

#[test]
fn codes_are_unique() {
    let strings: HashSet<&str> = ErrorCode::ALL.iter().map(ErrorCode::as_str).collect();
    assert_eq!(strings.len(), ErrorCode::ALL.len());
}

#[test]
fn code_display() {
    assert_eq!(ErrorCode::PatternWrongType.to_string(), "E1001");
    assert_eq!(ErrorCode::SwitchCaseSubsumed.as_str(), "E2001");
    assert_eq!(ErrorCode::EscapeVariable.as_str(), "E3001");
}

#[test]
fn severities_follow_prefix() {
    assert_eq!(ErrorCode::SwitchArmSubsumed.default_severity(), Severity::Error);
    assert_eq!(ErrorCode::IsPatternImpossible.default_severity(), Severity::Error);
    assert_eq!(ErrorCode::IsPatternAlways.default_severity(), Severity::Warning);
    assert_eq!(ErrorCode::RedundantPattern.default_severity(), Severity::Warning);
    assert_eq!(
        ErrorCode::RedundantPatternHidden.default_severity(),
        Severity::Hidden
    );
    assert!(ErrorCode::SwitchExpressionNotExhaustive.is_warning());
}

#[test]
fn categories() {
    assert!(ErrorCode::NoSuchMember.is_binding_error());
    assert!(!ErrorCode::NoSuchMember.is_reachability());
    assert!(ErrorCode::IsAlwaysFalse.is_reachability());
    assert!(ErrorCode::RedundantPatternHidden.is_reachability());
    assert!(!ErrorCode::EscapeVariable.is_reachability());
}

#[test]
fn parse_round_trips() {
    for code in ErrorCode::ALL {
        assert_eq!(code.as_str().parse::<ErrorCode>(), Ok(code));
    }
    assert_eq!("E9999".parse::<ErrorCode>(), Err(()));
}
