//! Metadata header generation.
//!
//! Renders application metadata as a C++ header of string constants, for
//! inclusion by the application's own sources.

use std::path::{Path, PathBuf};

use miette::Diagnostic as MietteDiagnostic;
use thiserror::Error;

use crate::core::AppMetadata;
use crate::util::diagnostic::Diagnostic;
use crate::util::fs::write_if_changed;

/// Include guard used unless configured otherwise.
pub const DEFAULT_GUARD: &str = "APP_METADATA_HH";

const BANNER: &str = "// GENERATED FILE - DO NOT EDIT";

/// Identifiers the header declares; a guard macro with one of these names
/// would break the declarations.
const DECLARED_NAMES: [&str; 3] = ["name", "app_version_string", "release_type_string"];

/// Options for header rendering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderOptions {
    /// Preprocessor include guard
    pub guard: String,
}

impl Default for HeaderOptions {
    fn default() -> Self {
        HeaderOptions {
            guard: DEFAULT_GUARD.to_string(),
        }
    }
}

impl HeaderOptions {
    /// Set the include guard.
    pub fn with_guard(mut self, guard: impl Into<String>) -> Self {
        self.guard = guard.into();
        self
    }
}

/// Error while rendering or writing the header.
#[derive(Debug, Error, MietteDiagnostic)]
pub enum EmbedError {
    #[error("metadata field `{field}` contains {character:?}, which cannot appear in a C string literal")]
    #[diagnostic(
        code(distpack::embed::interpolation_hazard),
        help("remove quotes, backslashes and control characters from the value")
    )]
    InterpolationHazard {
        field: &'static str,
        value: String,
        character: char,
    },

    #[error("`{guard}` is not a valid include guard")]
    #[diagnostic(
        code(distpack::embed::invalid_guard),
        help("use letters, digits and underscores, not starting with a digit or naming a generated constant")
    )]
    InvalidGuard { guard: String },

    #[error("failed to write header {}", path.display())]
    #[diagnostic(code(distpack::embed::write))]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl EmbedError {
    /// Convert to a user-friendly diagnostic.
    pub fn to_diagnostic(&self) -> Diagnostic {
        match self {
            EmbedError::InterpolationHazard {
                field,
                value,
                character,
            } => Diagnostic::error(format!(
                "metadata field `{}` cannot be embedded",
                field
            ))
            .with_context(format!("value: {:?}", value))
            .with_context(format!("contains {:?}", character))
            .with_suggestion("Remove quotes, backslashes and control characters from the value"),

            EmbedError::InvalidGuard { guard } => {
                Diagnostic::error(format!("`{}` is not a valid include guard", guard))
                    .with_context(format!("generated constants: {}", DECLARED_NAMES.join(", ")))
                    .with_suggestion("Use a C identifier such as `APP_METADATA_HH`")
            }

            EmbedError::Write { path, source } => {
                Diagnostic::error(format!("failed to write header {}", path.display()))
                    .with_context(source.to_string())
                    .with_suggestion("Check that the output directory is writable")
            }
        }
    }
}

/// Check that every field can be placed between double quotes as-is.
pub fn validate(metadata: &AppMetadata) -> Result<(), EmbedError> {
    for (field, value) in metadata.fields() {
        if let Some(character) = value
            .chars()
            .find(|c| *c == '"' || *c == '\\' || c.is_control())
        {
            return Err(EmbedError::InterpolationHazard {
                field,
                value: value.to_string(),
                character,
            });
        }
    }
    Ok(())
}

fn is_c_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Render the header text.
pub fn render(metadata: &AppMetadata, options: &HeaderOptions) -> Result<String, EmbedError> {
    if !is_c_identifier(&options.guard) || DECLARED_NAMES.contains(&options.guard.as_str()) {
        return Err(EmbedError::InvalidGuard {
            guard: options.guard.clone(),
        });
    }
    validate(metadata)?;

    let guard = &options.guard;
    let mut out = String::new();
    out.push_str(BANNER);
    out.push('\n');
    out.push_str(&format!("#ifndef {}\n", guard));
    out.push_str(&format!("#define {}\n", guard));
    out.push_str(&format!(
        "static constexpr char name[] = \"{}\";\n",
        metadata.name
    ));
    out.push_str(&format!(
        "static constexpr char app_version_string[] = \"{}\";\n",
        metadata.version
    ));
    out.push_str(&format!(
        "static constexpr char release_type_string[] = \"{}\";\n",
        metadata.release_type
    ));
    out.push_str(&format!("#endif // {}\n", guard));

    Ok(out)
}

/// Render the header and write it to `output_path`.
///
/// Returns `false` when the file already held the same text and was left
/// untouched.
pub fn embed(
    metadata: &AppMetadata,
    output_path: &Path,
    options: &HeaderOptions,
) -> Result<bool, EmbedError> {
    let header = render(metadata, options)?;

    let written = write_if_changed(output_path, &header).map_err(|source| EmbedError::Write {
        path: output_path.to_path_buf(),
        source,
    })?;

    if written {
        tracing::info!("wrote {}", output_path.display());
    } else {
        tracing::debug!("{} is up to date", output_path.display());
    }
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn demo() -> AppMetadata {
        AppMetadata::new("demo", "1.2.3", "beta")
    }

    #[test]
    fn test_render_demo() {
        let header = render(&demo(), &HeaderOptions::default()).unwrap();

        assert!(header.starts_with("// GENERATED FILE - DO NOT EDIT\n"));
        assert!(header.contains("static constexpr char name[] = \"demo\";"));
        assert!(header.contains("static constexpr char app_version_string[] = \"1.2.3\";"));
        assert!(header.contains("static constexpr char release_type_string[] = \"beta\";"));
        assert_eq!(header.matches("#ifndef APP_METADATA_HH\n").count(), 1);
        assert_eq!(header.matches("#define APP_METADATA_HH\n").count(), 1);
        assert_eq!(header.matches("#endif // APP_METADATA_HH\n").count(), 1);
        assert!(header.ends_with("#endif // APP_METADATA_HH\n"));
    }

    #[test]
    fn test_render_line_order() {
        let header = render(&demo(), &HeaderOptions::default()).unwrap();
        let lines: Vec<&str> = header.lines().collect();

        assert_eq!(lines.len(), 7);
        assert_eq!(lines[1], "#ifndef APP_METADATA_HH");
        assert_eq!(lines[2], "#define APP_METADATA_HH");
        assert!(lines[3].contains("name[]"));
        assert!(lines[4].contains("app_version_string[]"));
        assert!(lines[5].contains("release_type_string[]"));
    }

    #[test]
    fn test_custom_guard() {
        let opts = HeaderOptions::default().with_guard("DEMO_META_H");
        let header = render(&demo(), &opts).unwrap();

        assert!(header.contains("#ifndef DEMO_META_H\n"));
        assert!(!header.contains("APP_METADATA_HH"));
    }

    #[test]
    fn test_invalid_guard() {
        for guard in ["", "1ABC", "APP-META", "APP META"] {
            let opts = HeaderOptions::default().with_guard(guard);
            assert!(
                matches!(render(&demo(), &opts), Err(EmbedError::InvalidGuard { .. })),
                "guard {:?} should be rejected",
                guard
            );
        }
    }

    #[test]
    fn test_guard_cannot_name_a_constant() {
        for guard in ["name", "app_version_string", "release_type_string"] {
            let opts = HeaderOptions::default().with_guard(guard);
            assert!(
                matches!(render(&demo(), &opts), Err(EmbedError::InvalidGuard { .. })),
                "guard {:?} should be rejected",
                guard
            );
        }

        // Only exact names collide
        let opts = HeaderOptions::default().with_guard("NAME");
        assert!(render(&demo(), &opts).is_ok());
    }

    #[test]
    fn test_interpolation_hazards() {
        let cases = [
            (AppMetadata::new("de\"mo", "1.2.3", "beta"), "name", '"'),
            (AppMetadata::new("demo", "1.2\\3", "beta"), "version", '\\'),
            (AppMetadata::new("demo", "1.2.3", "be\nta"), "release_type", '\n'),
        ];

        for (metadata, expected_field, expected_char) in cases {
            match render(&metadata, &HeaderOptions::default()) {
                Err(EmbedError::InterpolationHazard {
                    field, character, ..
                }) => {
                    assert_eq!(field, expected_field);
                    assert_eq!(character, expected_char);
                }
                other => panic!("expected interpolation hazard, got {:?}", other),
            }
        }
    }

    #[test]
    fn test_unicode_values_are_allowed() {
        let metadata = AppMetadata::new("Démo ✓", "1.2.3-rc.1+build.5", "release candidate");
        assert!(validate(&metadata).is_ok());
    }

    #[test]
    fn test_embed_skips_identical_content() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("generated/app_metadata.hh");
        let opts = HeaderOptions::default();

        assert!(embed(&demo(), &path, &opts).unwrap());
        assert!(!embed(&demo(), &path, &opts).unwrap());

        let updated = AppMetadata::new("demo", "1.2.4", "beta");
        assert!(embed(&updated, &path, &opts).unwrap());
        assert!(std::fs::read_to_string(&path)
            .unwrap()
            .contains("\"1.2.4\""));
    }

    #[test]
    fn test_embed_rejects_before_writing() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("app_metadata.hh");

        let bad = AppMetadata::new("demo", "1.2.3", "beta\"; int x = 0; //");
        assert!(embed(&bad, &path, &HeaderOptions::default()).is_err());
        assert!(!path.exists());
    }
}
