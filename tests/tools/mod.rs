//! Argument building and tokenizing tests.

mod split_test;

/// Verify the public tool types are exported from the library.
#[test]
fn test_tool_types_exported() {
    use tlaplus_runner::tools::{
        build_java_invocation_args, build_tool_args, java_command_line, split_arguments,
        SpecError, SpecFiles, ToolKind, CLASSPATH_SEPARATOR, DEFAULT_GC_ARG,
    };

    let _ = (build_java_invocation_args, build_tool_args, java_command_line, split_arguments);
    let err = SpecFiles::discover("/specs/Foo.txt").unwrap_err();
    assert!(matches!(err, SpecError::NotASpec(_)));
    let _ = (ToolKind::Transpiler, ToolKind::Analyzer, ToolKind::ModelChecker);
    assert!(DEFAULT_GC_ARG.starts_with("-XX:+Use"));
    assert!(CLASSPATH_SEPARATOR == ':' || CLASSPATH_SEPARATOR == ';');
}
