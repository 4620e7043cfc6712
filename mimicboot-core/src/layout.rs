//! External repository layout
//!
//! The bootstrapper consumes a handful of files from the two external
//! repositories by fixed relative-path convention. This module owns those
//! conventions so the setup phases never spell out a relative path
//! themselves.

use std::path::{Path, PathBuf};

/// Relative path to the Postgres build makefile inside mimic-code.
const BUILD_DIR: &str = "mimic-iii/buildmimic/postgres";

/// Relative path to the Postgres function definitions inside mimic-code.
const FUNCTIONS_SCRIPT: &str = "mimic-iii/concepts_postgres/postgres-functions.sql";

/// Relative path to the concept materialization script inside mimic-code.
const CONCEPTS_SCRIPT: &str = "mimic-iii/concepts_postgres/postgres-make-concepts.sql";

/// Relative path to the utilities directory inside MIMIC-Extract.
const UTILS_DIR: &str = "utils";

/// Relative path to the extended-concepts shell script inside MIMIC-Extract.
const EXTENDED_CONCEPTS_SCRIPT: &str = "utils/postgres_make_extended_concepts.sh";

/// Relative path to the ventilation-duration script inside MIMIC-Extract.
const DURATIONS_SCRIPT: &str = "utils/niv-durations.sql";

/// Path layout of a mimic-code checkout
#[derive(Debug, Clone)]
pub struct CodeRepoLayout {
    root: PathBuf,
}

impl CodeRepoLayout {
    /// Creates a layout rooted at the given checkout
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Directory holding the makefile that creates the user and loads data
    pub fn build_dir(&self) -> PathBuf {
        self.root.join(BUILD_DIR)
    }

    /// SQL script defining the functions the concept scripts depend on
    pub fn functions_script(&self) -> PathBuf {
        self.root.join(FUNCTIONS_SCRIPT)
    }

    /// SQL script materializing the derived concept tables
    pub fn concepts_script(&self) -> PathBuf {
        self.root.join(CONCEPTS_SCRIPT)
    }
}

/// Path layout of a MIMIC-Extract checkout
#[derive(Debug, Clone)]
pub struct ExtractRepoLayout {
    root: PathBuf,
}

impl ExtractRepoLayout {
    /// Creates a layout rooted at the given checkout
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Directory holding the extraction utilities
    ///
    /// The extended-concepts script resolves its SQL files relative to this
    /// directory, so it is used as the working directory when invoking it.
    pub fn utils_dir(&self) -> PathBuf {
        self.root.join(UTILS_DIR)
    }

    /// Shell script that generates the extended concept views
    pub fn extended_concepts_script(&self) -> PathBuf {
        self.root.join(EXTENDED_CONCEPTS_SCRIPT)
    }

    /// SQL script computing ventilation durations
    pub fn durations_script(&self) -> PathBuf {
        self.root.join(DURATIONS_SCRIPT)
    }
}

/// Returns a path as a plain string argument for an external tool
pub fn path_arg(path: &Path) -> String {
    path.display().to_string()
}
