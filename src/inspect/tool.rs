//! Inspector backed by binutils.
//!
//! `objdump -p` understands both ELF (`NEEDED` entries in the dynamic
//! section) and PE (`DLL Name:` entries in the import tables), so it is the
//! default. `readelf -d` only reads ELF but ships on every Linux system with
//! binutils. Neither tool executes the binary, so cross-built targets can be
//! inspected on the build host.

use std::collections::BTreeSet;
use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use super::{DependencyInspector, InspectError};
use crate::util::process::{find_executable, ProcessBuilder};

static OBJDUMP_NEEDED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*NEEDED\s+(\S+)\s*$").expect("valid regex"));

static OBJDUMP_DLL_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*DLL Name:\s*(\S(?:.*\S)?)\s*$").expect("valid regex"));

static READELF_NEEDED: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\(NEEDED\)\s+Shared library:\s*\[([^\]]+)\]").expect("valid regex")
});

/// Stderr fragments meaning "this file is not a binary", as opposed to a
/// tool malfunction.
const UNRECOGNIZED_MARKERS: &[&str] = &[
    "file format not recognized",
    "not an elf file",
    "not a dynamic executable",
    "file truncated",
    "wrong magic bytes",
];

/// Which external tool reads the import tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InspectorTool {
    /// `objdump -p` (ELF and PE)
    #[default]
    Objdump,
    /// `readelf -d` (ELF only)
    Readelf,
}

impl InspectorTool {
    /// Executable name looked up in PATH.
    pub fn program_name(self) -> &'static str {
        match self {
            InspectorTool::Objdump => "objdump",
            InspectorTool::Readelf => "readelf",
        }
    }

    fn args(self) -> &'static [&'static str] {
        match self {
            InspectorTool::Objdump => &["-p"],
            InspectorTool::Readelf => &["-d", "-W"],
        }
    }

    fn parse(self, output: &str) -> BTreeSet<String> {
        match self {
            InspectorTool::Objdump => parse_objdump_output(output),
            InspectorTool::Readelf => parse_readelf_output(output),
        }
    }
}

impl fmt::Display for InspectorTool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program_name())
    }
}

impl FromStr for InspectorTool {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "objdump" => Ok(InspectorTool::Objdump),
            "readelf" => Ok(InspectorTool::Readelf),
            _ => Err(format!(
                "invalid inspector '{}'; expected 'objdump' or 'readelf'",
                s
            )),
        }
    }
}

/// Inspector that shells out to `objdump` or `readelf`.
///
/// The tool is located lazily, so constructing an inspector never fails and
/// packaging runs without binaries don't need binutils installed.
#[derive(Debug, Clone, Default)]
pub struct ToolInspector {
    tool: InspectorTool,
    program: Option<PathBuf>,
}

impl ToolInspector {
    /// Create an inspector for the given tool, found in PATH.
    pub fn new(tool: InspectorTool) -> Self {
        ToolInspector {
            tool,
            program: None,
        }
    }

    /// Use an explicit tool executable instead of searching PATH.
    pub fn with_program(mut self, program: impl Into<PathBuf>) -> Self {
        self.program = Some(program.into());
        self
    }

    /// Tool in use.
    pub fn tool(&self) -> InspectorTool {
        self.tool
    }

    fn program(&self) -> Result<PathBuf, InspectError> {
        if let Some(ref program) = self.program {
            return Ok(program.clone());
        }
        find_executable(self.tool.program_name()).ok_or_else(|| InspectError::ToolUnavailable {
            tool: self.tool.program_name().to_string(),
        })
    }
}

impl DependencyInspector for ToolInspector {
    fn declared_dependencies(&self, binary: &Path) -> Result<BTreeSet<String>, InspectError> {
        if !binary.is_file() {
            return Err(InspectError::NotFound {
                path: binary.to_path_buf(),
            });
        }

        let pb = ProcessBuilder::new(self.program()?)
            .args(self.tool.args())
            .arg(binary)
            .env("LC_ALL", "C");

        let output = pb.exec().map_err(|source| {
            if source.kind() == io::ErrorKind::NotFound {
                InspectError::ToolUnavailable {
                    tool: pb.get_program().display().to_string(),
                }
            } else {
                InspectError::Io {
                    command: pb.display_command(),
                    source,
                }
            }
        })?;

        let stderr = String::from_utf8_lossy(&output.stderr);
        if !output.status.success() {
            let lowered = stderr.to_lowercase();
            if UNRECOGNIZED_MARKERS.iter().any(|m| lowered.contains(m)) {
                return Err(InspectError::UnrecognizedFormat {
                    path: binary.to_path_buf(),
                    detail: stderr.trim().to_string(),
                });
            }
            return Err(InspectError::ToolFailed {
                command: pb.display_command(),
                status: output.status.code(),
                stderr: stderr.into_owned(),
            });
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        let deps = self.tool.parse(&stdout);
        tracing::debug!(
            "{} declares {} dependencies",
            binary.display(),
            deps.len()
        );
        Ok(deps)
    }
}

/// Parse `objdump -p` output into imported library names.
///
/// Example ELF output:
/// ```text
/// Dynamic Section:
///   NEEDED               libfoo.so
///   NEEDED               libc.so.6
///   SONAME               libapp.so
/// ```
///
/// Example PE output:
/// ```text
/// The Import Tables (interpreted .idata section contents)
///  vma:            Hint    Time      Forward  DLL       First
///  ...
///         DLL Name: KERNEL32.dll
/// ```
pub fn parse_objdump_output(output: &str) -> BTreeSet<String> {
    output
        .lines()
        .filter_map(|line| {
            OBJDUMP_NEEDED
                .captures(line)
                .or_else(|| OBJDUMP_DLL_NAME.captures(line))
                .map(|caps| caps[1].to_string())
        })
        .collect()
}

/// Parse `readelf -d` output into imported library names.
///
/// ```text
///  0x0000000000000001 (NEEDED)             Shared library: [libtinfo.so.6]
///  0x0000000000000001 (NEEDED)             Shared library: [libc.so.6]
/// ```
pub fn parse_readelf_output(output: &str) -> BTreeSet<String> {
    output
        .lines()
        .filter_map(|line| READELF_NEEDED.captures(line).map(|caps| caps[1].to_string()))
        .collect()
}
