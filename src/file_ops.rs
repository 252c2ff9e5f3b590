/**
 * Transfer engine: plans destination paths for every dated file and
 * copies or moves them, together with sidecars and an optional
 * post-transfer command
 */

use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use log::{debug, error, info, warn};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use crate::config::{Options, TransferMode};
use crate::discovery::discover;
use crate::error::OrganizeError;
use crate::exif::{CaptureDate, DateResolver};
use crate::extensions::{self, SIDECAR_EXTENSIONS};
use crate::grouping::{group_by_date, DateGroups, SkippedFile};
use crate::naming::{sequence_width, NameContext, Template};

/// One file's planned destination.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferTask {
    pub source: PathBuf,
    pub date: CaptureDate,
    pub dest_folder: PathBuf,
    pub dest_name: String,
    pub sequence: u64,
}

impl TransferTask {
    pub fn target(&self) -> PathBuf {
        self.dest_folder.join(&self.dest_name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferOutcome {
    Transferred,
    /// Destination already existed (or is the source itself) and was kept.
    Skipped,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileStatus {
    Transferred,
    Skipped,
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandOutcome {
    Success,
    /// Exit code, if the process was not killed by a signal.
    Failed(Option<i32>),
    SpawnFailed(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SidecarResult {
    pub source: PathBuf,
    pub target: PathBuf,
    pub status: FileStatus,
}

#[derive(Debug, Clone)]
pub struct ProcessResult {
    pub task: TransferTask,
    pub status: FileStatus,
    pub sidecars: Vec<SidecarResult>,
    pub command: Option<CommandOutcome>,
}

#[derive(Debug, Clone, Default)]
pub struct RunSummary {
    pub discovered: usize,
    pub undated: Vec<SkippedFile>,
    /// Destination folders, in the order they were first used.
    pub folders: Vec<PathBuf>,
    pub results: Vec<ProcessResult>,
}

impl RunSummary {
    pub fn transferred(&self) -> usize {
        self.count(|s| *s == FileStatus::Transferred)
    }

    pub fn skipped(&self) -> usize {
        self.count(|s| *s == FileStatus::Skipped)
    }

    pub fn failed(&self) -> usize {
        self.count(|s| matches!(s, FileStatus::Failed(_)))
    }

    pub fn command_failures(&self) -> usize {
        self.results
            .iter()
            .filter(|r| matches!(r.command, Some(ref c) if *c != CommandOutcome::Success))
            .count()
    }

    fn count(&self, pred: impl Fn(&FileStatus) -> bool) -> usize {
        self.results.iter().filter(|r| pred(&r.status)).count()
    }
}

/// Assign destinations and sequence numbers to every grouped file.
///
/// Groups are walked in ascending date order and members in insertion
/// order; numbering is global and starts at `offset + 1`. Fails when the
/// last number would not fit in a `u64`.
pub fn plan_tasks(
    groups: &DateGroups,
    options: &Options,
) -> Result<Vec<TransferTask>, OrganizeError> {
    let file_count = groups.file_count();
    u64::try_from(file_count)
        .ok()
        .and_then(|count| options.offset.checked_add(count))
        .ok_or(OrganizeError::OffsetOverflow {
            offset: options.offset,
            files: file_count,
        })?;

    let folder_template = Template::parse(&options.output_template);
    let name_template = Template::parse(&options.name_template);
    let width = sequence_width(options.digits, options.offset, groups.file_count());

    let mut tasks = Vec::with_capacity(groups.file_count());
    let mut sequence = options.offset;

    for (date, files) in groups.iter() {
        let dest_folder = PathBuf::from(folder_template.render_date(*date));
        for source in files {
            sequence += 1;
            let original_name = file_name_of(source);
            let dest_name = name_template.render(&NameContext {
                date: *date,
                original_name: &original_name,
                sequence,
                width,
            });
            tasks.push(TransferTask {
                source: source.clone(),
                date: *date,
                dest_folder: dest_folder.clone(),
                dest_name,
                sequence,
            });
        }
    }

    Ok(tasks)
}

/// Render the post-transfer command for a task; `%f` is the rendered
/// destination name.
pub fn render_command(template: &Template, task: &TransferTask, width: usize) -> String {
    template.render(&NameContext {
        date: task.date,
        original_name: &task.dest_name,
        sequence: task.sequence,
        width,
    })
}

/// Copy or move `source` to `dest_folder/dest_name`.
///
/// An existing destination is kept unless `overwrite` is set.
pub fn transfer_file(
    source: &Path,
    dest_folder: &Path,
    dest_name: &str,
    mode: TransferMode,
    overwrite: bool,
) -> Result<TransferOutcome> {
    let target = dest_folder.join(dest_name);

    if is_same_file(source, &target) {
        debug!("Source and destination are the same: {}", source.display());
        return Ok(TransferOutcome::Skipped);
    }

    if target.exists() && !overwrite {
        debug!("Destination exists, keeping it: {}", target.display());
        return Ok(TransferOutcome::Skipped);
    }

    perform_file_operation(source, &target, mode)?;
    Ok(TransferOutcome::Transferred)
}

/// Transfer every `<source>.<sidecar ext>` that exists into `dest_folder`,
/// keeping the sidecar's own file name.
pub fn transfer_sidecars(
    source: &Path,
    dest_folder: &Path,
    mode: TransferMode,
    overwrite: bool,
) -> Vec<SidecarResult> {
    let mut results = Vec::new();

    for ext in SIDECAR_EXTENSIONS {
        let mut sidecar = source.as_os_str().to_owned();
        sidecar.push(".");
        sidecar.push(ext);
        let sidecar = PathBuf::from(sidecar);
        if !sidecar.is_file() {
            continue;
        }

        let name = file_name_of(&sidecar);
        let status = match transfer_file(&sidecar, dest_folder, &name, mode, overwrite) {
            Ok(TransferOutcome::Transferred) => FileStatus::Transferred,
            Ok(TransferOutcome::Skipped) => FileStatus::Skipped,
            Err(e) => {
                error!("Sidecar {} failed: {:#}", sidecar.display(), e);
                FileStatus::Failed(format!("{:#}", e))
            }
        };
        results.push(SidecarResult {
            target: dest_folder.join(&name),
            source: sidecar,
            status,
        });
    }

    results
}

/// Run `command` through the platform shell inside `working_dir` and
/// wait for it.
pub fn run_command(command: &str, working_dir: &Path) -> CommandOutcome {
    debug!("Running '{}' in {}", command, working_dir.display());

    let mut cmd = if cfg!(windows) {
        let mut c = Command::new("cmd");
        c.args(["/C", command]);
        c
    } else {
        let mut c = Command::new("sh");
        c.args(["-c", command]);
        c
    };

    match cmd.current_dir(working_dir).status() {
        Ok(status) if status.success() => CommandOutcome::Success,
        Ok(status) => CommandOutcome::Failed(status.code()),
        Err(e) => CommandOutcome::SpawnFailed(e.to_string()),
    }
}

/// Perform file operation based on mode
fn perform_file_operation(source_path: &Path, target_path: &Path, mode: TransferMode) -> Result<()> {
    debug!("Attempting {:?}: '{}' -> '{}'", mode, source_path.display(), target_path.display());

    if !source_path.exists() {
        anyhow::bail!("Source file does not exist: {}", source_path.display());
    }

    if let Some(parent) = target_path.parent() {
        if !parent.exists() {
            debug!("Creating target directory: {}", parent.display());
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create target directory: {}", parent.display()))?;
        }
    }

    match mode {
        TransferMode::Move => {
            // rename replaces an existing target, so a failed move never loses it
            match fs::rename(source_path, target_path) {
                Ok(_) => debug!("Move operation successful"),
                Err(e) if e.kind() == std::io::ErrorKind::CrossesDevices => {
                    debug!("Cross-device move detected, using copy+delete strategy");
                    copy_preserving_mtime(source_path, target_path)?;
                    fs::remove_file(source_path)
                        .with_context(|| format!("Failed to remove original file: {}", source_path.display()))?;
                    debug!("Cross-device move operation successful");
                }
                Err(e) => {
                    return Err(e).with_context(|| {
                        format!(
                            "Failed to move file from '{}' to '{}'",
                            source_path.display(),
                            target_path.display()
                        )
                    });
                }
            }
        }
        TransferMode::Copy => {
            copy_preserving_mtime(source_path, target_path)?;
            debug!("Copy operation successful");
        }
    }
    Ok(())
}

/// `fs::copy` keeps permissions; the modification time is carried over
/// separately.
fn copy_preserving_mtime(source_path: &Path, target_path: &Path) -> Result<()> {
    fs::copy(source_path, target_path).with_context(|| {
        format!(
            "Failed to copy file from '{}' to '{}'",
            source_path.display(),
            target_path.display()
        )
    })?;

    let metadata = fs::metadata(source_path)
        .with_context(|| format!("Failed to read metadata of {}", source_path.display()))?;
    let mtime = filetime::FileTime::from_last_modification_time(&metadata);
    if let Err(e) = filetime::set_file_mtime(target_path, mtime) {
        warn!("Could not preserve modification time on {}: {}", target_path.display(), e);
    }
    Ok(())
}

fn is_same_file(a: &Path, b: &Path) -> bool {
    match (a.canonicalize(), b.canonicalize()) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}

fn file_name_of(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

fn arrow(mode: TransferMode, status: &FileStatus) -> &'static str {
    match (status, mode) {
        (FileStatus::Skipped, _) => "==",
        (FileStatus::Failed(_), _) => "!!",
        (FileStatus::Transferred, TransferMode::Copy) => "=>",
        (FileStatus::Transferred, TransferMode::Move) => "->",
    }
}

pub struct FileProcessor<'a> {
    options: &'a Options,
    progress: ProgressBar,
}

impl<'a> FileProcessor<'a> {
    pub fn new(options: &'a Options) -> Self {
        let progress = if options.quiet {
            ProgressBar::hidden()
        } else {
            ProgressBar::new(0)
        };
        progress.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("#>-"),
        );
        Self { options, progress }
    }

    /// Run the whole pipeline: discovery, grouping, planning, transfer.
    ///
    /// Only configuration problems are returned as errors; per-file
    /// problems end up in the summary.
    pub fn process<R>(&self, resolver: &R) -> Result<RunSummary, OrganizeError>
    where
        R: DateResolver + ?Sized,
    {
        self.options.validate()?;
        let extensions = extensions::resolve(&self.options.categories)?;
        let files = discover(&self.options.input_dir, &extensions, self.options.recursive)?;

        let (groups, undated) = group_by_date(&files, resolver);
        info!(
            "{} files in {} date groups, {} without date",
            groups.file_count(),
            groups.len(),
            undated.len()
        );

        let tasks = plan_tasks(&groups, self.options)?;
        let (results, folders) = self.execute(&tasks);

        Ok(RunSummary {
            discovered: files.len(),
            undated,
            folders,
            results,
        })
    }

    /// Transfer planned tasks in order, creating each destination folder
    /// before its first file. Returns the per-file results and the
    /// distinct destination folders in the order they were prepared.
    pub fn execute(&self, tasks: &[TransferTask]) -> (Vec<ProcessResult>, Vec<PathBuf>) {
        let width = sequence_width(self.options.digits, self.options.offset, tasks.len());
        let command_template = self.options.command_template.as_deref().map(Template::parse);

        self.progress.set_length(tasks.len() as u64);
        let mut results = Vec::with_capacity(tasks.len());
        // several dates may render to the same folder, e.g. `/out/%d`
        let mut folder_errors: HashMap<PathBuf, Option<String>> = HashMap::new();
        let mut folders = Vec::new();

        for task in tasks {
            let folder_error = folder_errors
                .entry(task.dest_folder.clone())
                .or_insert_with(|| {
                    folders.push(task.dest_folder.clone());
                    self.prepare_folder(&task.dest_folder)
                })
                .clone();

            let result = match folder_error {
                Some(e) => ProcessResult {
                    task: task.clone(),
                    status: FileStatus::Failed(e),
                    sidecars: Vec::new(),
                    command: None,
                },
                None => self.process_task(task, command_template.as_ref(), width),
            };

            self.progress.set_message(file_name_of(&task.source));
            self.progress.inc(1);
            results.push(result);
        }

        self.progress.finish_and_clear();
        if !tasks.is_empty() {
            self.overview();
        }
        (results, folders)
    }

    fn prepare_folder(&self, folder: &Path) -> Option<String> {
        self.report("");
        if folder.is_dir() {
            let header = format!("{}:", folder.display());
            self.report(&header);
            self.report(&"-".repeat(header.chars().count()));
        } else {
            self.report(&format!("Create folder {}", folder.display()));
        }

        match fs::create_dir_all(folder) {
            Ok(()) => None,
            Err(e) => {
                let msg = format!("Failed to create directory {}: {}", folder.display(), e);
                error!("{}", msg);
                Some(msg)
            }
        }
    }

    fn process_task(
        &self,
        task: &TransferTask,
        command_template: Option<&Template>,
        width: usize,
    ) -> ProcessResult {
        let mode = self.options.mode;
        let overwrite = self.options.replace;

        let status = match transfer_file(&task.source, &task.dest_folder, &task.dest_name, mode, overwrite) {
            Ok(TransferOutcome::Transferred) => FileStatus::Transferred,
            Ok(TransferOutcome::Skipped) => {
                info!("{} already exists, not replaced", task.target().display());
                FileStatus::Skipped
            }
            Err(e) => {
                error!("{}: {:#}", task.source.display(), e);
                FileStatus::Failed(format!("{:#}", e))
            }
        };
        self.report_transfer(&task.source, &task.target(), &status);

        let sidecars = if self.options.sidecar {
            let sidecars = transfer_sidecars(&task.source, &task.dest_folder, mode, overwrite);
            for sidecar in &sidecars {
                self.report_transfer(&sidecar.source, &sidecar.target, &sidecar.status);
            }
            sidecars
        } else {
            Vec::new()
        };

        let command = match (command_template, &status) {
            (Some(template), FileStatus::Transferred) => {
                let command = render_command(template, task, width);
                let outcome = run_command(&command, &task.dest_folder);
                match &outcome {
                    CommandOutcome::Success => debug!("Command succeeded: {}", command),
                    CommandOutcome::Failed(code) => warn!(
                        "Command '{}' failed with exit code {}",
                        command,
                        code.map_or_else(|| "none".to_string(), |c| c.to_string())
                    ),
                    CommandOutcome::SpawnFailed(e) => {
                        warn!("Command '{}' could not be started: {}", command, e)
                    }
                }
                Some(outcome)
            }
            _ => None,
        };

        ProcessResult {
            task: task.clone(),
            status,
            sidecars,
            command,
        }
    }

    fn report_transfer(&self, source: &Path, target: &Path, status: &FileStatus) {
        let line = format!(
            "  {}  {}  {}",
            source.display(),
            arrow(self.options.mode, status),
            target.display()
        );
        self.report(&line);
    }

    fn overview(&self) {
        self.report("");
        self.report(" == : file already existed; not replaced");
        self.report(" => : file was copied");
        self.report(" -> : file was moved");
        self.report(" !! : transfer failed");
    }

    fn report(&self, line: &str) {
        if !self.options.quiet {
            self.progress.suspend(|| println!("{}", line));
        }
    }
}
