use std::path::PathBuf;

use anyhow::{bail, Result};
use clap::Parser;

use crate::session::SessionArgs;

#[derive(Parser, Debug)]
#[command(
    name = "gems_run",
    about = "Runs a GEMS environment headlessly, replaying scripted input",
    version
)]
pub struct Args {
    /// Environment file to run (a `<name>_media` folder must sit beside it)
    #[arg(short = 'f', long)]
    pub file: Option<PathBuf>,

    /// Participant id used in the data file name
    #[arg(short = 'u', long, default_value = "User1")]
    pub user: String,

    /// Do not write a data file
    #[arg(short = 's', long)]
    pub skipdata: bool,

    /// Replace an existing data file with the same name
    #[arg(short = 'o', long)]
    pub overwrite: bool,

    /// Verbose diagnostics and object frames on hover
    #[arg(short = 'd', long)]
    pub debug: bool,

    /// Disable sound, video and speech
    #[arg(short = 'k', long)]
    pub skipmedia: bool,

    /// Ask the host for a fullscreen window regardless of the environment setting
    #[arg(short = 'F', long)]
    pub fullscreen: bool,

    /// JSON or YAML list of input events to replay
    #[arg(short = 'e', long)]
    pub events: Option<PathBuf>,

    /// Folder for data files (default: $HOME/Documents/GEMS/Data)
    #[arg(long)]
    pub data_dir: Option<PathBuf>,

    /// Path to write the recorded host requests as JSON
    #[arg(long)]
    pub host_log_json: Option<PathBuf>,

    /// Let time pass on the wall clock instead of jumping
    #[arg(long)]
    pub realtime: bool,

    /// Print every condition, trigger and action with its signature and exit
    #[arg(long)]
    pub list_api: bool,
}

#[derive(Debug)]
pub enum Command {
    ListApi,
    Run(RunArgs),
}

#[derive(Debug)]
pub struct RunArgs {
    pub session: SessionArgs,
    pub events: Option<PathBuf>,
    pub host_log_json: Option<PathBuf>,
    pub realtime: bool,
}

impl Args {
    pub fn into_command(self) -> Result<Command> {
        if self.list_api {
            return Ok(Command::ListApi);
        }
        let Some(file) = self.file else {
            bail!("--file is required unless --list-api is given");
        };
        if self.user.trim().is_empty() {
            bail!("--user must not be empty");
        }
        if self.overwrite && self.skipdata {
            log::warn!("--overwrite has no effect with --skipdata");
        }

        Ok(Command::Run(RunArgs {
            session: SessionArgs {
                file,
                user: self.user,
                skip_data: self.skipdata,
                overwrite: self.overwrite,
                debug: self.debug,
                skip_media: self.skipmedia,
                fullscreen: self.fullscreen,
                data_dir: self.data_dir,
            },
            events: self.events,
            host_log_json: self.host_log_json,
            realtime: self.realtime,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_flags_map_onto_session_args() {
        let args = Args::try_parse_from(["gems_run", "-f", "env.yaml", "-u", "P7", "-s", "-k", "-F", "-d"])
            .expect("parse");
        let Command::Run(run) = args.into_command().expect("command") else {
            panic!("expected a run command");
        };
        assert_eq!(run.session.file, PathBuf::from("env.yaml"));
        assert_eq!(run.session.user, "P7");
        assert!(run.session.skip_data);
        assert!(run.session.skip_media);
        assert!(run.session.fullscreen);
        assert!(run.session.debug);
        assert!(!run.realtime);
    }

    #[test]
    fn file_is_required_to_run() {
        let args = Args::try_parse_from(["gems_run"]).expect("parse");
        assert!(args.into_command().is_err());

        let args = Args::try_parse_from(["gems_run", "--list-api"]).expect("parse");
        assert!(matches!(args.into_command(), Ok(Command::ListApi)));
    }
}
