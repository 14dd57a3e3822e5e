//!
//! # Format Conversion
//!
//! Moves layout documents between the native structured formats and
//! foreign binary formats. Native formats go through [SerdeFile]
//! directly; foreign formats are delegated to external converter
//! commands run as subprocesses with a hard timeout.
//!

// Std-Lib
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::time::{Duration, Instant};

// Crates.io
use log::{debug, info};
use serde::{Deserialize, Serialize};
use tempfile::TempDir;

// Local Imports
use crate::data::LayoutDocument;
use crate::error::{LayoutError, LayoutResult};
use crate::tech::TechnologyDatabase;
use crate::utils::{SerdeFile, SerializationFormat};

///
/// # Converter Interface
///
/// Implemented per source/target format. Covers both layout documents
/// and technology databases; many foreign formats bundle the two.
///
pub trait FormatConverter {
    /// Read a [LayoutDocument] from `path`
    fn import(&self, path: &Path) -> LayoutResult<LayoutDocument>;
    /// Write `doc` to `path`
    fn export(&self, doc: &LayoutDocument, path: &Path) -> LayoutResult<()>;
    /// Read a [TechnologyDatabase] from `path`
    fn import_tech(&self, path: &Path) -> LayoutResult<TechnologyDatabase>;
    /// Write `tech` to `path`
    fn export_tech(&self, tech: &TechnologyDatabase, path: &Path) -> LayoutResult<()>;
}

/// Resolve a native serialization format from a path's extension
pub fn format_of(path: &Path) -> LayoutResult<SerializationFormat> {
    path.extension()
        .and_then(|e| e.to_str())
        .and_then(SerializationFormat::from_tag)
        .ok_or_else(|| {
            LayoutError::UnsupportedFormat(path.to_string_lossy().to_string())
        })
}

///
/// # Native Converter
///
/// Serializes through one of the first-class structured formats.
///
#[derive(Debug, Clone, Copy)]
pub struct NativeConverter {
    pub format: SerializationFormat,
}
impl NativeConverter {
    pub fn new(format: SerializationFormat) -> Self {
        Self { format }
    }
    /// Construct from a path's extension
    pub fn from_path(path: &Path) -> LayoutResult<Self> {
        Ok(Self::new(format_of(path)?))
    }
}
impl FormatConverter for NativeConverter {
    fn import(&self, path: &Path) -> LayoutResult<LayoutDocument> {
        Ok(LayoutDocument::open(path, self.format)?)
    }
    fn export(&self, doc: &LayoutDocument, path: &Path) -> LayoutResult<()> {
        Ok(doc.save(self.format, path)?)
    }
    fn import_tech(&self, path: &Path) -> LayoutResult<TechnologyDatabase> {
        Ok(TechnologyDatabase::open(path, self.format)?)
    }
    fn export_tech(&self, tech: &TechnologyDatabase, path: &Path) -> LayoutResult<()> {
        Ok(tech.save(self.format, path)?)
    }
}

/// Default wall-clock limit for external converter commands
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);
/// Completion polling interval
const POLL_INTERVAL: Duration = Duration::from_millis(20);

///
/// # External Converter
///
/// Delegates a foreign format to an external command. Command templates
/// are argument vectors in which `{input}` and `{output}` are replaced
/// with concrete paths. The import command must convert the foreign
/// file to native JSON; the export command the reverse.
///
/// Commands run under a wall-clock timeout, polled cooperatively; on
/// expiry the process is killed and the conversion fails.
///
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ExternalConverter {
    /// Converter name, for diagnostics
    pub name: String,
    /// Import command template, e.g. `["gds2json", "{input}", "{output}"]`
    pub import_cmd: Vec<String>,
    /// Export command template
    pub export_cmd: Vec<String>,
    /// Wall-clock limit per invocation
    pub timeout: Duration,
}
impl ExternalConverter {
    pub fn new(
        name: impl Into<String>,
        import_cmd: Vec<String>,
        export_cmd: Vec<String>,
    ) -> Self {
        Self {
            name: name.into(),
            import_cmd,
            export_cmd,
            timeout: DEFAULT_TIMEOUT,
        }
    }
    fn scratch_path(dir: &TempDir) -> PathBuf {
        dir.path()
            .join("native")
            .with_extension(SerializationFormat::Json.extension())
    }
}
impl FormatConverter for ExternalConverter {
    fn import(&self, path: &Path) -> LayoutResult<LayoutDocument> {
        let dir = TempDir::new()?;
        let native = Self::scratch_path(&dir);
        run_command(&self.import_cmd, path, &native, self.timeout)?;
        info!("{}: imported {}", self.name, path.display());
        NativeConverter::new(SerializationFormat::Json).import(&native)
    }
    fn export(&self, doc: &LayoutDocument, path: &Path) -> LayoutResult<()> {
        let dir = TempDir::new()?;
        let native = Self::scratch_path(&dir);
        NativeConverter::new(SerializationFormat::Json).export(doc, &native)?;
        run_command(&self.export_cmd, &native, path, self.timeout)?;
        info!("{}: exported {}", self.name, path.display());
        Ok(())
    }
    fn import_tech(&self, path: &Path) -> LayoutResult<TechnologyDatabase> {
        let dir = TempDir::new()?;
        let native = Self::scratch_path(&dir);
        run_command(&self.import_cmd, path, &native, self.timeout)?;
        info!("{}: imported technology {}", self.name, path.display());
        NativeConverter::new(SerializationFormat::Json).import_tech(&native)
    }
    fn export_tech(&self, tech: &TechnologyDatabase, path: &Path) -> LayoutResult<()> {
        let dir = TempDir::new()?;
        let native = Self::scratch_path(&dir);
        NativeConverter::new(SerializationFormat::Json).export_tech(tech, &native)?;
        run_command(&self.export_cmd, &native, path, self.timeout)?;
        info!("{}: exported technology {}", self.name, path.display());
        Ok(())
    }
}

/// Substitute the `{input}` and `{output}` placeholders in `template`
fn substitute(template: &[String], input: &Path, output: &Path) -> Vec<String> {
    template
        .iter()
        .map(|arg| {
            arg.replace("{input}", &input.to_string_lossy())
                .replace("{output}", &output.to_string_lossy())
        })
        .collect()
}

/// Read one of the child's pipes to completion on its own thread. The
/// polling loop must not own the pipes: a child filling an undrained
/// pipe buffer blocks, and would read as a timeout.
fn drain_pipe<R: std::io::Read + Send + 'static>(
    pipe: Option<R>,
) -> std::thread::JoinHandle<String> {
    std::thread::spawn(move || {
        let mut text = String::new();
        if let Some(mut pipe) = pipe {
            let _ = pipe.read_to_string(&mut text);
        }
        text
    })
}

/// Run one converter command, polling for completion under `timeout`.
/// Returns the combined stdout and stderr text on success.
pub fn run_command(
    template: &[String],
    input: &Path,
    output: &Path,
    timeout: Duration,
) -> LayoutResult<String> {
    let args = substitute(template, input, output);
    let (program, rest) = args
        .split_first()
        .ok_or_else(|| LayoutError::msg("empty converter command"))?;
    debug!("running converter: {} {:?}", program, rest);
    let mut child = Command::new(program)
        .args(rest)
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()?;
    let stdout = drain_pipe(child.stdout.take());
    let stderr = drain_pipe(child.stderr.take());

    let started = Instant::now();
    let status = loop {
        if let Some(status) = child.try_wait()? {
            break status;
        }
        if started.elapsed() > timeout {
            child.kill()?;
            child.wait()?;
            // Killing closes the pipes; the drain threads finish
            let mut output = stdout.join().unwrap_or_default();
            output.push_str(&stderr.join().unwrap_or_default());
            return Err(LayoutError::Conversion {
                message: format!("{} timed out after {:?}", program, timeout),
                output,
            });
        }
        std::thread::sleep(POLL_INTERVAL);
    };
    let mut combined = stdout.join().unwrap_or_default();
    combined.push_str(&stderr.join().unwrap_or_default());
    if !status.success() {
        return Err(LayoutError::Conversion {
            message: format!("{} exited with {}", program, status),
            output: combined,
        });
    }
    Ok(combined)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::Cell;

    fn doc() -> LayoutDocument {
        let mut doc = LayoutDocument::new("convtest");
        let key = doc.add_cell(Cell::new("top"));
        doc.top = Some(key);
        doc
    }
    fn strs(args: &[&str]) -> Vec<String> {
        args.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn native_roundtrip_json_and_yaml() {
        let dir = TempDir::new().unwrap();
        for (fmt, name) in [
            (SerializationFormat::Json, "d.json"),
            (SerializationFormat::Yaml, "d.yaml"),
        ] {
            let path = dir.path().join(name);
            let conv = NativeConverter::new(fmt);
            conv.export(&doc(), &path).unwrap();
            let back = conv.import(&path).unwrap();
            assert_eq!(back, doc());
        }
    }
    #[test]
    fn technology_roundtrips_through_converters() {
        let tech = TechnologyDatabase::example();
        let dir = TempDir::new().unwrap();

        let native = NativeConverter::new(SerializationFormat::Json);
        let path = dir.path().join("tech.json");
        native.export_tech(&tech, &path).unwrap();
        assert_eq!(native.import_tech(&path).unwrap(), tech);

        let external = ExternalConverter::new(
            "copy",
            strs(&["cp", "{input}", "{output}"]),
            strs(&["cp", "{input}", "{output}"]),
        );
        let foreign = dir.path().join("tech.bin");
        external.export_tech(&tech, &foreign).unwrap();
        assert_eq!(external.import_tech(&foreign).unwrap(), tech);
    }
    #[test]
    fn format_from_extension() {
        assert_eq!(
            format_of(Path::new("x.json")).unwrap(),
            SerializationFormat::Json
        );
        assert_eq!(
            format_of(Path::new("x.YAML")).unwrap(),
            SerializationFormat::Yaml
        );
        assert!(matches!(
            format_of(Path::new("x.gds")),
            Err(LayoutError::UnsupportedFormat(_))
        ));
    }
    #[test]
    fn external_copy_roundtrip() {
        // `cp` stands in for a real converter: the "foreign" format is
        // native JSON copied byte-for-byte
        let conv = ExternalConverter::new(
            "copy",
            strs(&["cp", "{input}", "{output}"]),
            strs(&["cp", "{input}", "{output}"]),
        );
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("foreign.bin");
        conv.export(&doc(), &path).unwrap();
        let back = conv.import(&path).unwrap();
        assert_eq!(back, doc());
    }
    #[test]
    fn failing_command_carries_output() {
        let result = run_command(
            &strs(&["ls", "/nonexistent-converter-input"]),
            Path::new("in"),
            Path::new("out"),
            DEFAULT_TIMEOUT,
        );
        match result {
            Err(LayoutError::Conversion { output, .. }) => {
                assert!(!output.is_empty());
            }
            other => panic!("expected conversion failure, got {:?}", other),
        }
    }
    #[test]
    fn timeout_kills_process() {
        let result = run_command(
            &strs(&["sleep", "5"]),
            Path::new("in"),
            Path::new("out"),
            Duration::from_millis(50),
        );
        match result {
            Err(LayoutError::Conversion { message, .. }) => {
                assert!(message.contains("timed out"));
            }
            other => panic!("expected timeout, got {:?}", other),
        }
    }
    #[test]
    fn chatty_command_output_is_drained() {
        // Far more output than an OS pipe buffer holds; the command
        // must still run to completion
        let result = run_command(
            &strs(&["sh", "-c", "yes chatty | head -n 100000"]),
            Path::new("in"),
            Path::new("out"),
            Duration::from_secs(30),
        )
        .unwrap();
        assert!(result.len() > 500_000);
    }
    #[test]
    fn missing_program_is_io_error() {
        let result = run_command(
            &strs(&["definitely-not-a-real-converter"]),
            Path::new("in"),
            Path::new("out"),
            DEFAULT_TIMEOUT,
        );
        assert!(result.is_err());
    }
}
