//! Session setup: validates the environment file and its media folder, opens
//! the data log and collects the options the engine runs with.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use log::{debug, info};

use crate::data_log::DataLog;
use crate::environment::{DisplayType, Environment};

/// Options derived from the command line rather than the environment file.
#[derive(Debug, Clone, PartialEq)]
pub struct RunOptions {
    pub media_path: PathBuf,
    pub play_media: bool,
    pub tts_enabled: bool,
    pub save_data: bool,
    pub user: String,
    pub debug: bool,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            media_path: PathBuf::from("."),
            play_media: true,
            tts_enabled: true,
            save_data: false,
            user: "User1".to_string(),
            debug: false,
        }
    }
}

#[derive(Debug, Clone)]
pub struct SessionArgs {
    pub file: PathBuf,
    pub user: String,
    pub skip_data: bool,
    pub overwrite: bool,
    pub debug: bool,
    pub skip_media: bool,
    pub fullscreen: bool,
    /// Where data files go; `$HOME/Documents/GEMS/Data` when unset.
    pub data_dir: Option<PathBuf>,
}

/// Everything the engine needs to start.
#[derive(Debug)]
pub struct Session {
    pub environment: Environment,
    pub run: RunOptions,
    pub data_log: DataLog,
}

impl Session {
    pub fn new(environment: Environment, run: RunOptions) -> Self {
        Self {
            environment,
            run,
            data_log: DataLog::in_memory(),
        }
    }

    pub fn setup(args: &SessionArgs) -> Result<Self> {
        if !args.file.is_file() {
            bail!("unable to read environment file {}", args.file.display());
        }
        let mut environment = Environment::load(&args.file)?;
        let media_path = verify_media_folder(&args.file)?;

        let missing = missing_images(&environment, &media_path);
        if !missing.is_empty() {
            bail!(
                "the media folder {} is missing files the environment needs: {}",
                media_path.display(),
                missing.join(", ")
            );
        }
        if environment.view(environment.options.start_view).is_none() {
            bail!(
                "start view {} does not exist in {}",
                environment.options.start_view,
                args.file.display()
            );
        }

        let data_log = if args.skip_data {
            DataLog::in_memory()
        } else {
            let dir = match &args.data_dir {
                Some(dir) => dir.clone(),
                None => default_data_dir()?,
            };
            DataLog::create(&dir, &args.user, args.overwrite)?
        };
        if let Some(path) = data_log.path() {
            info!("writing data to {}", path.display());
        }

        if args.fullscreen {
            environment.options.display_type = DisplayType::Fullscreen;
        }
        if args.debug {
            environment.options.object_hover.push_str("+Frame+Name");
        }

        let play_media = !args.skip_media;
        let run = RunOptions {
            media_path,
            play_media,
            tts_enabled: play_media,
            save_data: !args.skip_data,
            user: args.user.clone(),
            debug: args.debug,
        };
        debug!("session options: {run:?}");

        Ok(Self {
            environment,
            run,
            data_log,
        })
    }
}

/// `<stem>_media` beside the environment file. It must exist and hold files.
pub fn verify_media_folder(file: &Path) -> Result<PathBuf> {
    let stem = file
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .with_context(|| format!("{} has no file name", file.display()))?;
    let folder = file
        .parent()
        .unwrap_or_else(|| Path::new("."))
        .join(format!("{stem}_media"));
    if !folder.is_dir() {
        bail!(
            "there is no folder called {} beside {}",
            folder.display(),
            file.display()
        );
    }
    let has_files = fs::read_dir(&folder)
        .with_context(|| format!("listing media folder {}", folder.display()))?
        .filter_map(|entry| entry.ok())
        .any(|entry| entry.path().is_file());
    if !has_files {
        bail!("the media folder {} appears to be empty", folder.display());
    }
    Ok(folder)
}

/// Images named by views and options that are not in `media_path`.
pub fn missing_images(environment: &Environment, media_path: &Path) -> Vec<String> {
    environment
        .referenced_images()
        .into_iter()
        .filter(|name| !media_path.join(name).is_file())
        .map(str::to_string)
        .collect()
}

fn default_data_dir() -> Result<PathBuf> {
    let home = env::var_os("HOME")
        .or_else(|| env::var_os("USERPROFILE"))
        .context("no home folder to put data files in; pass --data-dir")?;
    Ok(PathBuf::from(home).join("Documents").join("GEMS").join("Data"))
}
