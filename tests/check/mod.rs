//! End-to-end workflow tests against a scripted stand-in for the Java tools.

#![cfg(unix)]

mod cancel_test;
mod workflow_test;

use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use tempfile::TempDir;
use tlaplus_runner::check::Workflow;
use tlaplus_runner::config::ToolsConfig;
use tlaplus_runner::process::ToolRunner;
use tlaplus_runner::tools::SpecFiles;

/// Shell script that answers `-version` and mimics each tool by main class.
///
/// TLC hangs inside an open progress message when `-hang` is passed,
/// reports an invariant violation with exit code 12 for `-violate`, fails
/// like a broken JVM launch for `-crash`, and runs out of memory after
/// reporting one error for `-oom`.
const FAKE_JAVA: &str = r#"#!/bin/sh
if [ "$1" = "-version" ]; then
  echo 'openjdk version "17.0.2" 2022-01-18' >&2
  exit 0
fi
tool=""
hang=""
violate=""
oom=""
for a in "$@"; do
  case "$a" in
    pcal.trans|tla2sany.SANY|tlc2.TLC) tool="$a" ;;
    -hang) hang=1 ;;
    -violate) violate=1 ;;
    -oom) oom=1 ;;
    -crash) echo "Error: Could not find or load main class tlc2.TLC" >&2; exit 75 ;;
  esac
done
case "$tool" in
  pcal.trans)
    echo "pcal.trans Version 1.11 of 31 December 2020"
    echo "Parsing completed."
    echo "Translation completed."
    ;;
  tla2sany.SANY)
    echo "Parsing file Foo.tla"
    echo "Semantic processing of module Foo"
    echo ""
    echo "*** Errors: 1"
    echo ""
    echo "line 5, col 10 to line 5, col 12 of module Foo"
    echo ""
    echo "Unknown operator: \`bar'."
    echo ""
    echo "Picked up JAVA_TOOL_OPTIONS: -Xss4m" >&2
    exit 255
    ;;
  tlc2.TLC)
    echo "args: $*"
    echo "@!@!@STARTMSG 2262:0 @!@!@"
    echo "TLC2 Version 2.18 of 20 March 2023"
    echo "@!@!@ENDMSG 2262 @!@!@"
    if [ -n "$hang" ]; then
      # One write, so the open message is readable once Starting is seen.
      printf '%s\n' "@!@!@STARTMSG 2185:0 @!@!@" "Starting... (2024-03-01 10:00:00)" \
        "@!@!@ENDMSG 2185 @!@!@" "@!@!@STARTMSG 2200:0 @!@!@"
      exec sleep 30
    fi
    echo "@!@!@STARTMSG 2185:0 @!@!@"
    echo "Starting... (2024-03-01 10:00:00)"
    echo "@!@!@ENDMSG 2185 @!@!@"
    if [ -n "$oom" ]; then
      echo "@!@!@STARTMSG 1000:1 @!@!@"
      echo "TLC threw an unexpected exception."
      echo "@!@!@ENDMSG 1000 @!@!@"
      echo 'Exception in thread "main" java.lang.OutOfMemoryError: Java heap space' >&2
      exit 75
    fi
    if [ -n "$violate" ]; then
      echo "Picked up JAVA_TOOL_OPTIONS: -Xss4m" >&2
      echo "@!@!@STARTMSG 2110:1 @!@!@"
      echo "Invariant TypeOK is violated."
      echo "@!@!@ENDMSG 2110 @!@!@"
      echo "@!@!@STARTMSG 2186:0 @!@!@"
      echo "Finished in 01s at (2024-03-01 10:00:01)"
      echo "@!@!@ENDMSG 2186 @!@!@"
      exit 12
    fi
    echo "@!@!@STARTMSG 2193:0 @!@!@"
    echo "Model checking completed. No error has been found."
    echo "@!@!@ENDMSG 2193 @!@!@"
    echo "@!@!@STARTMSG 2186:0 @!@!@"
    echo "Finished in 01s at (2024-03-01 10:00:01)"
    echo "@!@!@ENDMSG 2186 @!@!@"
    ;;
esac
"#;

/// Java home shared by every test so the script is written only once.
fn fake_java_home() -> &'static Path {
    static HOME: OnceLock<TempDir> = OnceLock::new();
    HOME.get_or_init(|| {
        let dir = tempfile::tempdir().unwrap();
        let bin = dir.path().join("bin");
        std::fs::create_dir(&bin).unwrap();
        let java = bin.join("java");
        std::fs::write(&java, FAKE_JAVA).unwrap();
        std::fs::set_permissions(&java, std::fs::Permissions::from_mode(0o755)).unwrap();
        dir
    })
    .path()
}

/// A spec directory holding `Foo.tla` and `Foo.cfg`.
pub struct SpecDir {
    pub dir: TempDir,
    pub spec: SpecFiles,
}

impl SpecDir {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let tla = dir.path().join("Foo.tla");
        let cfg = dir.path().join("Foo.cfg");
        std::fs::write(&tla, "---- MODULE Foo ----\nVARIABLE x\nInit == x = 0\n====\n").unwrap();
        std::fs::write(&cfg, "INIT Init\n").unwrap();
        let spec = SpecFiles::discover(&tla).unwrap();
        Self { dir, spec }
    }

    pub fn tla_path(&self) -> PathBuf {
        self.spec.tla_path().to_path_buf()
    }
}

pub fn workflow() -> Workflow {
    workflow_with(ToolsConfig::default())
}

pub fn workflow_with(config: ToolsConfig) -> Workflow {
    Workflow::new(ToolRunner::new(ToolsConfig {
        java_home: Some(fake_java_home().to_path_buf()),
        tools_jar: Some(PathBuf::from("/opt/tla/tla2tools.jar")),
        ..config
    }))
}

pub fn hang() -> Vec<String> {
    vec!["-hang".to_string()]
}
