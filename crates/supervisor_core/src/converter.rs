//! Robot-description to scene-fragment conversion.
//!
//! The conversion algorithm lives outside the supervisor. [`FragmentConverter`]
//! is the calling contract; [`CommandConverter`] satisfies it by running an
//! external converter program.

use std::path::{Path, PathBuf};
use std::process::Command;

use tracing::debug;
use uuid::Uuid;

/// Default converter program.
pub const DEFAULT_CONVERTER: &str = "urdf2webots";

/// Default initial translation of a converted robot.
pub const DEFAULT_TRANSLATION: &str = "0 0 0";

/// Default initial rotation (axis-angle) of a converted robot.
pub const DEFAULT_ROTATION: &str = "0 0 1 0";

/// Errors that can occur while converting a robot description.
#[derive(Debug, thiserror::Error)]
pub enum ConvertError {
    /// Reading or writing a conversion file failed, or the program could not start.
    #[error("converter I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The converter program exited unsuccessfully.
    #[error("converter exited with {status}: {stderr}")]
    Failed { status: String, stderr: String },

    /// The converter succeeded but produced no fragment.
    #[error("converter produced an empty fragment")]
    EmptyOutput,
}

/// Placement and geometry options forwarded to the converter.
#[derive(Debug, Clone, PartialEq)]
pub struct ConversionOptions {
    /// Initial translation, three space-separated numbers.
    pub translation: String,
    /// Initial rotation, axis-angle as four space-separated numbers.
    pub rotation: String,
    /// Whether to compute normals for meshes.
    pub normal: bool,
    /// Whether to approximate collision geometry with boxes.
    pub box_collision: bool,
    /// Initial joint positions.
    pub init_pos: Option<String>,
}

impl Default for ConversionOptions {
    fn default() -> Self {
        Self {
            translation: DEFAULT_TRANSLATION.to_string(),
            rotation: DEFAULT_ROTATION.to_string(),
            normal: false,
            box_collision: false,
            init_pos: None,
        }
    }
}

/// Converts a robot description into a fragment in the simulator's syntax.
pub trait FragmentConverter {
    /// Convert the robot description stored at `path`.
    ///
    /// # Errors
    ///
    /// Returns a [`ConvertError`] if the description cannot be converted.
    fn convert_file(
        &self,
        path: &Path,
        name: &str,
        options: &ConversionOptions,
    ) -> Result<String, ConvertError>;

    /// Convert an inline robot description. Relative resource paths in the
    /// description are resolved against `relative_path_prefix` when given.
    ///
    /// # Errors
    ///
    /// Returns a [`ConvertError`] if the description cannot be converted.
    fn convert_content(
        &self,
        content: &str,
        name: &str,
        options: &ConversionOptions,
        relative_path_prefix: Option<&str>,
    ) -> Result<String, ConvertError>;
}

/// Runs an external converter program once per conversion.
///
/// The program is called as
/// `<program> <args..> --input=<file> --output=<file> --robot-name=<name> ...`
/// and must write the fragment to the output file.
#[derive(Debug, Clone)]
pub struct CommandConverter {
    program: PathBuf,
    args: Vec<String>,
    work_dir: PathBuf,
}

impl CommandConverter {
    /// Create a converter running `program`, with temporary files in the
    /// system temporary directory.
    #[must_use]
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            work_dir: std::env::temp_dir(),
        }
    }

    /// Arguments placed before the conversion arguments, e.g.
    /// `["-m", "urdf2webots.importer"]` when the program is `python3`.
    #[must_use]
    pub fn with_args(mut self, args: Vec<String>) -> Self {
        self.args = args;
        self
    }

    /// Directory for temporary input and output files.
    #[must_use]
    pub fn with_work_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.work_dir = dir.into();
        self
    }

    /// Temporary file names never contain the robot name.
    fn temp_path(&self, extension: &str) -> PathBuf {
        self.work_dir
            .join(format!("robot-{}.{extension}", Uuid::new_v4()))
    }

    /// Build the full argument list for one conversion.
    fn command_args(
        &self,
        input: &Path,
        output: &Path,
        name: &str,
        options: &ConversionOptions,
        relative_path_prefix: Option<&str>,
    ) -> Vec<String> {
        let mut args = self.args.clone();
        args.push(format!("--input={}", input.display()));
        args.push(format!("--output={}", output.display()));
        args.push(format!("--robot-name={name}"));
        args.push(format!("--translation={}", options.translation));
        args.push(format!("--rotation={}", options.rotation));
        if options.normal {
            args.push("--normal".to_string());
        }
        if options.box_collision {
            args.push("--box-collision".to_string());
        }
        if let Some(init_pos) = &options.init_pos {
            args.push(format!("--init-pos={init_pos}"));
        }
        if let Some(prefix) = relative_path_prefix {
            args.push(format!("--relative-path-prefix={prefix}"));
        }
        args
    }

    fn run(
        &self,
        input: &Path,
        name: &str,
        options: &ConversionOptions,
        relative_path_prefix: Option<&str>,
    ) -> Result<String, ConvertError> {
        let output_path = self.temp_path("wbo");
        let args = self.command_args(input, &output_path, name, options, relative_path_prefix);
        debug!(program = %self.program.display(), ?args, "running converter");

        let output = Command::new(&self.program).args(&args).output()?;
        let result = if output.status.success() {
            std::fs::read_to_string(&output_path).map_err(ConvertError::from)
        } else {
            Err(ConvertError::Failed {
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            })
        };
        remove_temp_file(&output_path);

        let fragment = result?;
        if fragment.trim().is_empty() {
            return Err(ConvertError::EmptyOutput);
        }
        Ok(fragment)
    }
}

/// Delete a temporary file. A missing file is expected after a failed run.
fn remove_temp_file(path: &Path) {
    if let Err(e) = std::fs::remove_file(path)
        && e.kind() != std::io::ErrorKind::NotFound
    {
        debug!(path = %path.display(), %e, "failed to remove temporary file");
    }
}

impl Default for CommandConverter {
    fn default() -> Self {
        Self::new(DEFAULT_CONVERTER)
    }
}

impl FragmentConverter for CommandConverter {
    fn convert_file(
        &self,
        path: &Path,
        name: &str,
        options: &ConversionOptions,
    ) -> Result<String, ConvertError> {
        self.run(path, name, options, None)
    }

    fn convert_content(
        &self,
        content: &str,
        name: &str,
        options: &ConversionOptions,
        relative_path_prefix: Option<&str>,
    ) -> Result<String, ConvertError> {
        let input_path = self.temp_path("urdf");
        std::fs::write(&input_path, content)?;
        let result = self.run(&input_path, name, options, relative_path_prefix);
        remove_temp_file(&input_path);
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_options() {
        let options = ConversionOptions::default();
        assert_eq!(options.translation, "0 0 0");
        assert_eq!(options.rotation, "0 0 1 0");
        assert!(!options.normal);
        assert!(!options.box_collision);
        assert_eq!(options.init_pos, None);
    }

    #[test]
    fn test_command_args_minimal() {
        let converter = CommandConverter::new("urdf2webots");
        let args = converter.command_args(
            Path::new("/tmp/in.urdf"),
            Path::new("/tmp/out.wbo"),
            "arm",
            &ConversionOptions::default(),
            None,
        );
        assert_eq!(
            args,
            vec![
                "--input=/tmp/in.urdf",
                "--output=/tmp/out.wbo",
                "--robot-name=arm",
                "--translation=0 0 0",
                "--rotation=0 0 1 0",
            ]
        );
    }

    #[test]
    fn test_command_args_all_options() {
        let converter = CommandConverter::new("python3")
            .with_args(vec!["-m".to_string(), "urdf2webots.importer".to_string()]);
        let options = ConversionOptions {
            translation: "1 2 3".to_string(),
            rotation: "0 1 0 1.57".to_string(),
            normal: true,
            box_collision: true,
            init_pos: Some("[0.1, 0.2]".to_string()),
        };
        let args = converter.command_args(
            Path::new("in.urdf"),
            Path::new("out.wbo"),
            "arm",
            &options,
            Some("package://arm/"),
        );
        assert_eq!(&args[..2], ["-m", "urdf2webots.importer"]);
        assert!(args.contains(&"--normal".to_string()));
        assert!(args.contains(&"--box-collision".to_string()));
        assert!(args.contains(&"--init-pos=[0.1, 0.2]".to_string()));
        assert_eq!(
            args.last().map(String::as_str),
            Some("--relative-path-prefix=package://arm/")
        );
    }

    #[test]
    fn test_missing_program_is_io_error() {
        let converter = CommandConverter::new("/nonexistent/converter-program");
        let err = converter
            .convert_content("<robot name=\"r\"/>", "r", &ConversionOptions::default(), None)
            .unwrap_err();
        assert!(matches!(err, ConvertError::Io(_)));
    }

    #[cfg(unix)]
    #[test]
    fn test_failing_program_reports_status() {
        let converter = CommandConverter::new("false");
        let err = converter
            .convert_file(Path::new("robot.urdf"), "r", &ConversionOptions::default())
            .unwrap_err();
        assert!(matches!(err, ConvertError::Failed { .. }));
    }

    #[cfg(unix)]
    #[test]
    fn test_program_output_read_back() {
        // `sh -c '...' sh <args>` writes a fixed fragment to the --output path.
        let script = r#"for a in "$@"; do case "$a" in --output=*) printf 'Robot { name "arm" }' > "${a#--output=}";; esac; done"#;
        let converter = CommandConverter::new("sh")
            .with_args(vec!["-c".to_string(), script.to_string(), "sh".to_string()]);
        let fragment = converter
            .convert_file(Path::new("robot.urdf"), "arm", &ConversionOptions::default())
            .unwrap();
        assert_eq!(fragment, r#"Robot { name "arm" }"#);
    }

    #[cfg(unix)]
    #[test]
    fn test_empty_output_rejected() {
        let script = r#"for a in "$@"; do case "$a" in --output=*) : > "${a#--output=}";; esac; done"#;
        let converter = CommandConverter::new("sh")
            .with_args(vec!["-c".to_string(), script.to_string(), "sh".to_string()]);
        let err = converter
            .convert_file(Path::new("robot.urdf"), "arm", &ConversionOptions::default())
            .unwrap_err();
        assert!(matches!(err, ConvertError::EmptyOutput));
    }

    /// Fresh, empty work directory under the system temporary directory.
    #[cfg(unix)]
    fn work_dir(label: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("converter-test-{label}-{}", Uuid::new_v4()));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[cfg(unix)]
    fn entries(dir: &Path) -> Vec<PathBuf> {
        std::fs::read_dir(dir)
            .unwrap()
            .map(|entry| entry.unwrap().path())
            .collect()
    }

    #[cfg(unix)]
    fn writing_converter(work_dir: &Path) -> CommandConverter {
        let script = r#"for a in "$@"; do case "$a" in --output=*) printf 'Robot { name "r" }' > "${a#--output=}";; esac; done"#;
        CommandConverter::new("sh")
            .with_args(vec!["-c".to_string(), script.to_string(), "sh".to_string()])
            .with_work_dir(work_dir)
    }

    #[cfg(unix)]
    #[test]
    fn test_name_with_slash_converts() {
        let dir = work_dir("slash");
        let converter = writing_converter(&dir);
        let fragment = converter
            .convert_content("<robot/>", "fleet/arm", &ConversionOptions::default(), None)
            .unwrap();
        assert_eq!(fragment, r#"Robot { name "r" }"#);
        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[cfg(unix)]
    #[test]
    fn test_name_cannot_escape_work_dir() {
        let root = work_dir("escape");
        let dir = root.join("work");
        std::fs::create_dir_all(&dir).unwrap();
        // Record every file the converter sees as input.
        let script = r#"for a in "$@"; do case "$a" in --input=*) echo "${a#--input=}" >> "$LOG";; --output=*) printf 'Robot { name "r" }' > "${a#--output=}";; esac; done"#;
        let log = root.join("inputs.log");
        let script = script.replace("$LOG", &log.display().to_string());
        let converter = CommandConverter::new("sh")
            .with_args(vec!["-c".to_string(), script, "sh".to_string()])
            .with_work_dir(&dir);

        converter
            .convert_content("<robot/>", "../escaped", &ConversionOptions::default(), None)
            .unwrap();

        let input = std::fs::read_to_string(&log).unwrap();
        let input = PathBuf::from(input.trim());
        assert_eq!(input.parent(), Some(dir.as_path()));
        assert!(!input.display().to_string().contains("escaped"));
        let mut names: Vec<_> = entries(&root)
            .into_iter()
            .filter_map(|path| path.file_name().map(|n| n.to_string_lossy().into_owned()))
            .collect();
        names.sort();
        assert_eq!(names, vec!["inputs.log", "work"]);
        assert!(entries(&dir).is_empty());
        std::fs::remove_dir_all(&root).unwrap();
    }

    #[cfg(unix)]
    #[test]
    fn test_temp_files_removed_after_success() {
        let dir = work_dir("success");
        let converter = writing_converter(&dir);
        converter
            .convert_content("<robot/>", "arm", &ConversionOptions::default(), None)
            .unwrap();
        assert!(entries(&dir).is_empty());
        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[cfg(unix)]
    #[test]
    fn test_temp_files_removed_after_failure() {
        let dir = work_dir("failure");
        // Writes the output file, then exits unsuccessfully.
        let script = r#"for a in "$@"; do case "$a" in --output=*) printf 'partial' > "${a#--output=}";; esac; done; exit 1"#;
        let converter = CommandConverter::new("sh")
            .with_args(vec!["-c".to_string(), script.to_string(), "sh".to_string()])
            .with_work_dir(&dir);
        let err = converter
            .convert_content("<robot/>", "arm", &ConversionOptions::default(), None)
            .unwrap_err();
        assert!(matches!(err, ConvertError::Failed { .. }));
        assert!(entries(&dir).is_empty());
        std::fs::remove_dir_all(&dir).unwrap();
    }
}
