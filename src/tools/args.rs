//! Argument vectors for the tools and for the Java process that hosts them.
//!
//! Everything here is pure: no I/O, no environment lookups. Flag order is
//! part of each tool's command-line contract and must be preserved.

use std::path::Path;

use super::ToolKind;

/// Garbage collector used when the user does not pick one.
pub const DEFAULT_GC_ARG: &str = "-XX:+UseParallelGC";

/// Separator between classpath entries on this platform.
#[cfg(windows)]
pub const CLASSPATH_SEPARATOR: char = ';';
/// Separator between classpath entries on this platform.
#[cfg(not(windows))]
pub const CLASSPATH_SEPARATOR: char = ':';

const SPEC_NAME_VAR: &str = "${specName}";
const MODEL_NAME_VAR: &str = "${modelName}";

/// Build the tool arguments (everything after the Java main class).
///
/// - Transpiler: user arguments, then the module file name.
/// - Analyzer: the module file name only.
/// - Model checker: module file name, `-tool -modelcheck -config <cfg>`,
///   then user arguments. A user `-config <value>` pair replaces the
///   default model path instead of being appended.
#[must_use]
pub fn build_tool_args(
    kind: ToolKind,
    tla_path: &Path,
    cfg_path: &Path,
    user_args: &[String],
) -> Vec<String> {
    let module = file_name(tla_path);
    match kind {
        ToolKind::Transpiler => {
            let mut args = user_args.to_vec();
            args.push(module);
            args
        }
        ToolKind::Analyzer => vec![module],
        ToolKind::ModelChecker => build_tlc_args(module, tla_path, cfg_path, user_args),
    }
}

fn build_tlc_args(
    module: String,
    tla_path: &Path,
    cfg_path: &Path,
    user_args: &[String],
) -> Vec<String> {
    let spec_name = file_stem(tla_path);
    let model_name = file_stem(cfg_path);
    let substitute = |arg: &str| {
        arg.replace(SPEC_NAME_VAR, &spec_name)
            .replace(MODEL_NAME_VAR, &model_name)
    };

    let mut config = cfg_path.display().to_string();
    let mut rest = Vec::with_capacity(user_args.len());
    let mut i = 0;
    while i < user_args.len() {
        if user_args[i] == "-config" && i + 1 < user_args.len() {
            config = substitute(&user_args[i + 1]);
            i += 2;
            continue;
        }
        rest.push(substitute(&user_args[i]));
        i += 1;
    }

    let mut args = vec![
        module,
        "-tool".to_string(),
        "-modelcheck".to_string(),
        "-config".to_string(),
        config,
    ];
    args.extend(rest);
    args
}

/// Build the JVM options: user options with the tools archive merged into
/// the classpath and a default GC added when none is chosen.
#[must_use]
pub fn build_java_invocation_args(user_java_opts: &[String], tools_jar: &Path) -> Vec<String> {
    let jar = tools_jar.display().to_string();
    let jar_name = file_name(tools_jar);
    let mut opts = user_java_opts.to_vec();

    match opts.iter().position(|o| o == "-cp" || o == "-classpath") {
        Some(idx) if idx + 1 < opts.len() => {
            let classpath = &mut opts[idx + 1];
            let has_jar = classpath
                .split(CLASSPATH_SEPARATOR)
                .any(|entry| Path::new(entry).file_name().and_then(|n| n.to_str()) == Some(jar_name.as_str()));
            if !has_jar {
                classpath.push(CLASSPATH_SEPARATOR);
                classpath.push_str(&jar);
            }
        }
        // Dangling flag is left for the JVM to reject.
        _ => {
            opts.push("-cp".to_string());
            opts.push(jar);
        }
    }

    let has_gc = opts
        .iter()
        .any(|o| o.starts_with("-XX:+Use") && o.ends_with("GC"));
    if !has_gc {
        opts.push(DEFAULT_GC_ARG.to_string());
    }
    opts
}

/// Full argument vector passed to the `java` executable.
#[must_use]
pub fn java_command_line(
    user_java_opts: &[String],
    tools_jar: &Path,
    kind: ToolKind,
    tool_args: &[String],
) -> Vec<String> {
    let mut args = build_java_invocation_args(user_java_opts, tools_jar);
    args.push(kind.main_class().to_string());
    args.extend_from_slice(tool_args);
    args
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}
