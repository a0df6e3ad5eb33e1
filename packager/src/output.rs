//! Human-readable output for the packager CLI.
//!
//! Progress and summaries go to stderr; nothing here touches stdout except
//! through the writer the caller passes in.

use crate::artefact::catalogue::ArtifactPair;
use crate::compiler_config::CompilerConfig;
use crate::platform::PlatformDescriptor;
use camino::Utf8Path;
use std::io::Write;

/// Write one line to `stderr`, ignoring write failures.
pub fn write_stderr_line(stderr: &mut dyn Write, message: impl std::fmt::Display) {
    if writeln!(stderr, "{message}").is_err() {
        // Best-effort logging; ignore write failures.
    }
}

/// Format the artefact pair as one line per archive.
///
/// # Example
///
/// ```
/// use glib_packager::artefact::catalogue::select_artifacts;
/// use glib_packager::output::artifact_lines;
/// use glib_packager::platform::CpuArch;
///
/// let pair = select_artifacts(CpuArch::X86_64).expect("supported");
/// let lines = artifact_lines(&pair);
/// assert!(lines[0].starts_with("runtime"));
/// assert!(lines[1].contains("libglib2.0-dev"));
/// ```
#[must_use]
pub fn artifact_lines(artifacts: &ArtifactPair) -> Vec<String> {
    ["runtime", "development"]
        .into_iter()
        .zip(artifacts.iter())
        .map(|(role, spec)| format!("{role:<12} {} sha256:{}", spec.url, spec.expected_checksum))
        .collect()
}

/// Format a success message after packaging.
#[must_use]
pub fn success_message(file_count: usize, package_root: &Utf8Path) -> String {
    let plural = if file_count == 1 { "file" } else { "files" };
    format!("Packaged GLib ({file_count} library {plural}) into {package_root}")
}

/// Compiler flags for consumers of a finished package.
#[derive(Debug, Clone)]
pub struct FlagSummary {
    /// `-I` flags.
    pub cflags: String,
    /// `-L` and `-l` flags.
    pub libs: String,
}

impl FlagSummary {
    /// Split a compiler configuration into compile and link flags.
    ///
    /// # Example
    ///
    /// ```
    /// use camino::Utf8PathBuf;
    /// use glib_packager::compiler_config::CompilerConfig;
    /// use glib_packager::output::FlagSummary;
    ///
    /// let summary = FlagSummary::new(&CompilerConfig {
    ///     library_dirs: vec![Utf8PathBuf::from("/pkg/lib")],
    ///     include_dirs: vec![Utf8PathBuf::from("/pkg/include")],
    ///     library_names: vec!["glib-2.0".to_owned()],
    /// });
    /// assert_eq!(summary.cflags, "-I/pkg/include");
    /// assert_eq!(summary.libs, "-L/pkg/lib -lglib-2.0");
    /// ```
    #[must_use]
    pub fn new(config: &CompilerConfig) -> Self {
        let (cflags, libs): (Vec<String>, Vec<String>) = config
            .flags()
            .into_iter()
            .partition(|flag| flag.starts_with("-I"));
        Self {
            cflags: cflags.join(" "),
            libs: libs.join(" "),
        }
    }

    /// Format the summary for display to the user.
    #[must_use]
    pub fn display_text(&self) -> String {
        format!("  CFLAGS: {}\n  LIBS:   {}", self.cflags, self.libs)
    }
}

/// Configuration information for dry-run output.
///
/// # Example
///
/// ```
/// use camino::Utf8PathBuf;
/// use glib_packager::artefact::catalogue::select_artifacts;
/// use glib_packager::output::DryRunInfo;
/// use glib_packager::platform::{CpuArch, OperatingSystem, PlatformDescriptor};
///
/// let platform = PlatformDescriptor::new(OperatingSystem::Linux, CpuArch::Armv8);
/// let artifacts = select_artifacts(CpuArch::Armv8).expect("supported");
/// let output_dir = Utf8PathBuf::from("/opt/glib");
///
/// let info = DryRunInfo {
///     platform: &platform,
///     artifacts: &artifacts,
///     triplet: "aarch64-linux-gnu",
///     copy_pattern: "*",
///     output_dir: &output_dir,
///     replace_existing: false,
/// };
///
/// let output = info.display_text();
/// assert!(output.contains("Dry run"));
/// assert!(output.contains("arm64.deb"));
/// ```
#[derive(Debug)]
pub struct DryRunInfo<'a> {
    /// Target platform.
    pub platform: &'a PlatformDescriptor,
    /// Archives that would be fetched.
    pub artifacts: &'a ArtifactPair,
    /// Triplet the library roots would be resolved with.
    pub triplet: &'a str,
    /// Glob applied under the library roots.
    pub copy_pattern: &'a str,
    /// Final package directory.
    pub output_dir: &'a Utf8Path,
    /// Whether an existing package would be replaced.
    pub replace_existing: bool,
}

impl DryRunInfo<'_> {
    /// Format the dry-run information for display.
    #[must_use]
    pub fn display_text(&self) -> String {
        let mut lines = vec![
            "Dry run - no files will be downloaded or written".to_owned(),
            String::new(),
            format!("Platform: {}", self.platform),
            format!("Triplet: {}", self.triplet),
            format!("Library pattern: {}", self.copy_pattern),
            format!("Output directory: {}", self.output_dir),
            format!("Replace existing: {}", self.replace_existing),
            String::new(),
            "Artefacts:".to_owned(),
        ];
        lines.extend(
            artifact_lines(self.artifacts)
                .into_iter()
                .map(|line| format!("  {line}")),
        );
        lines.join("\n")
    }
}
