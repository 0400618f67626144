//! Tests for shell-style option splitting.

use tlaplus_runner::tools::split_arguments;

#[test]
fn blank_input_has_no_arguments() {
    assert!(split_arguments("").is_empty());
    assert!(split_arguments("   ").is_empty());
}

#[test]
fn whitespace_separates_arguments() {
    assert_eq!(split_arguments("-a b"), vec!["-a", "b"]);
    assert_eq!(split_arguments("  -workers   4\t-deadlock "), vec!["-workers", "4", "-deadlock"]);
}

#[test]
fn empty_quotes_make_empty_argument() {
    assert_eq!(split_arguments("-foo \"\""), vec!["-foo", ""]);
    assert_eq!(split_arguments("''"), vec![""]);
}

#[test]
fn quotes_keep_whitespace() {
    assert_eq!(split_arguments("-cp 'a b/c.jar'"), vec!["-cp", "a b/c.jar"]);
    assert_eq!(
        split_arguments("-Dtlc2.tool.fp.FPSet.impl=\"x y\" -Xmx2g"),
        vec!["-Dtlc2.tool.fp.FPSet.impl=x y", "-Xmx2g"]
    );
}

#[test]
fn other_quote_kind_is_literal_inside_quotes() {
    assert_eq!(split_arguments("\"it's\" 'say \"hi\"'"), vec!["it's", "say \"hi\""]);
}
