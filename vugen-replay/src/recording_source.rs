use crate::{error::Error, recording::Recording};
use log::error;
use std::{
    fmt::Debug,
    fs,
    path::{Path, PathBuf},
};

const PLACEHOLDER_FILE: &str = "copy_only_one_vugen_script_to_this_folder.php";

/// Where recordings come from. Every call loads the recording again from scratch.
pub trait RecordingSource: Debug {
    fn load_recording(&self) -> Result<Recording, Error>;
}

/// A single, explicitly given script folder.
#[derive(Debug, Clone)]
pub struct ScriptDirectory {
    path: PathBuf,
}

impl ScriptDirectory {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl RecordingSource for ScriptDirectory {
    fn load_recording(&self) -> Result<Recording, Error> {
        Recording::load(&self.path)
    }
}

/// A folder the developer copies exactly one script into.
#[derive(Debug, Clone)]
pub struct VuGenFolder {
    path: PathBuf,
}

impl VuGenFolder {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self { path: path.into() }
    }

    /// The one script folder inside. A missing folder is created so the script can be copied in.
    pub fn script_folder(&self) -> Result<PathBuf, Error> {
        if !self.path.is_dir() {
            if let Err(e) = fs::create_dir_all(&self.path) {
                error!("could not create {}: {}", self.path.display(), e);
            }
            return Err(Error::ScriptFolderNotFound(self.path.clone()));
        }

        let mut scripts = Vec::new();
        for entry in fs::read_dir(&self.path)? {
            let entry = entry?;
            if entry.file_name() != PLACEHOLDER_FILE {
                scripts.push(entry.path());
            }
        }

        if scripts.len() != 1 {
            return Err(Error::InvalidScriptFolder {
                path: self.path.clone(),
                found: scripts.len(),
            });
        }

        Ok(scripts.remove(0))
    }
}

impl RecordingSource for VuGenFolder {
    fn load_recording(&self) -> Result<Recording, Error> {
        Recording::load(self.script_folder()?)
    }
}
