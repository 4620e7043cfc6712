//! Setup phases
//!
//! The four-phase sequence that turns a compressed MIMIC-III dump into a
//! ready research database:
//! - Build: make target that creates the user and loads the dump
//! - Concepts: function definitions, then concept materialization
//! - Extended concepts: MIMIC-Extract shell script
//! - Durations: ventilation-duration computation
//!
//! Phases run strictly in order and the run aborts on the first failure.
//! Nothing is rolled back; the error names the phase that failed.

use anyhow::{Context, Result, bail};
use colored::*;
use std::fs;
use std::path::Path;
use tracing::info;

use mimicboot_core::config::SetupConfig;
use mimicboot_core::executor::SqlBatchExecutor;
use mimicboot_core::layout::{CodeRepoLayout, ExtractRepoLayout, path_arg};
use mimicboot_core::process::{Invocation, ProcessRunner};

const SEPARATOR_WIDTH: usize = 50;

/// Runs the full setup sequence
///
/// Preconditions (path validation, connectivity probe) have already been
/// checked by the caller; everything from here on mutates the target
/// server.
///
/// # Arguments
/// * `config` - The resolved invocation configuration
/// * `runner` - Process runner for the make and shell-script phases
/// * `executor` - Batch executor for the SQL phases
pub async fn run_setup(
    config: &SetupConfig,
    runner: &dyn ProcessRunner,
    executor: &dyn SqlBatchExecutor,
) -> Result<()> {
    let code = CodeRepoLayout::new(&config.code_repo);
    let extract = ExtractRepoLayout::new(&config.extract_repo);

    banner("Building MIMIC-III database");
    build_database(config, &code, runner)?;

    banner("Building concept tables");
    execute_script(executor, &code.functions_script()).await?;
    execute_script(executor, &code.concepts_script()).await?;

    banner("Generating extended concepts");
    generate_extended_concepts(&extract, runner)?;

    banner("Computing ventilation durations");
    execute_script(executor, &extract.durations_script()).await?;

    print_completion(config);
    Ok(())
}

/// Prints a phase banner framed with separator lines
fn banner(title: &str) {
    let line = "-".repeat(SEPARATOR_WIDTH);
    println!("{line}");
    println!("{}", title.bold());
    println!("{line}");
}

/// Invokes the mimic-code makefile target that creates the database user
/// and loads the compressed dump
fn build_database(
    config: &SetupConfig,
    code: &CodeRepoLayout,
    runner: &dyn ProcessRunner,
) -> Result<()> {
    let invocation = Invocation::new("make")
        .arg("-C")
        .arg_path(&code.build_dir())
        .arg("create-user")
        .arg("mimic-gz")
        .arg(format!("datadir={}", path_arg(&config.dump_dir)))
        .arg(format!("DBNAME={}", config.db.name))
        .arg(format!("DBUSER={}", config.db.user))
        .arg(format!("DBPASS={}", config.db.password))
        .arg(format!("DBHOST={}", config.db.host))
        .arg(format!("DBPORT={}", config.db.port));

    let exit_code = runner.run(&invocation)?;
    if exit_code != 0 {
        bail!("Database build failed: make exited with code {exit_code}");
    }

    Ok(())
}

/// Reads a fixed SQL script and executes it as one batch
async fn execute_script(executor: &dyn SqlBatchExecutor, path: &Path) -> Result<()> {
    info!("Executing SQL script {}", path.display());

    let script = fs::read_to_string(path)
        .with_context(|| format!("Failed to read SQL script {}", path.display()))?;

    executor
        .execute_batch(&script)
        .await
        .with_context(|| format!("SQL script {} failed", path.display()))
}

/// Invokes the MIMIC-Extract shell script that generates extended
/// concept views
///
/// The script resolves its SQL files relative to the utils directory, so
/// that directory is used as the working directory.
fn generate_extended_concepts(
    extract: &ExtractRepoLayout,
    runner: &dyn ProcessRunner,
) -> Result<()> {
    let script = extract.extended_concepts_script();

    let invocation = Invocation::new("bash")
        .arg_path(&script)
        .current_dir(extract.utils_dir());

    let exit_code = runner.run(&invocation)?;
    if exit_code != 0 {
        bail!(
            "Extended concept generation failed: {} exited with code {exit_code}",
            script.display()
        );
    }

    Ok(())
}

/// Prints the final success message
///
/// Only reached when every phase completed; points the user at the
/// downstream extraction entry point, which is outside this tool's scope.
fn print_completion(config: &SetupConfig) {
    println!();
    println!("{}", "✓ MIMIC-III environment ready!".green().bold());
    println!();
    println!("{}", "Next steps:".bold());
    println!(
        "  Run {} from the MIMIC-Extract repository against database {}",
        "mimic_direct_extract.py".cyan(),
        config.db.name.bold()
    );
    println!("  to produce the extraction output.");
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use mimicboot_core::config::DbConfig;
    use std::sync::Mutex;
    use tempfile::TempDir;

    /// Process runner that records invocations instead of spawning
    struct FakeRunner {
        calls: Mutex<Vec<Invocation>>,
        /// Program whose invocation reports a non-zero exit code
        fail_program: Option<&'static str>,
    }

    impl FakeRunner {
        fn new() -> Self {
            Self {
                calls: Mutex::new(Vec::new()),
                fail_program: None,
            }
        }

        fn failing(program: &'static str) -> Self {
            Self {
                calls: Mutex::new(Vec::new()),
                fail_program: Some(program),
            }
        }

        fn calls(&self) -> Vec<Invocation> {
            self.calls.lock().unwrap().clone()
        }
    }

    impl ProcessRunner for FakeRunner {
        fn run(&self, invocation: &Invocation) -> Result<i32> {
            self.calls.lock().unwrap().push(invocation.clone());
            if self.fail_program == Some(invocation.program.as_str()) {
                Ok(2)
            } else {
                Ok(0)
            }
        }
    }

    /// Executor that records scripts instead of touching a database
    struct FakeExecutor {
        scripts: Mutex<Vec<String>>,
        /// Substring that makes a batch fail when present in the script
        fail_marker: Option<&'static str>,
    }

    impl FakeExecutor {
        fn new() -> Self {
            Self {
                scripts: Mutex::new(Vec::new()),
                fail_marker: None,
            }
        }

        fn failing_on(marker: &'static str) -> Self {
            Self {
                scripts: Mutex::new(Vec::new()),
                fail_marker: Some(marker),
            }
        }

        fn scripts(&self) -> Vec<String> {
            self.scripts.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl SqlBatchExecutor for FakeExecutor {
        async fn execute_batch(&self, script: &str) -> Result<()> {
            if let Some(marker) = self.fail_marker {
                if script.contains(marker) {
                    bail!("batch rejected");
                }
            }
            self.scripts.lock().unwrap().push(script.to_string());
            Ok(())
        }
    }

    /// Fabricates the directory trees the phases read from
    fn fabricate_repos() -> (TempDir, TempDir, TempDir) {
        let dump = TempDir::new().unwrap();
        let code = TempDir::new().unwrap();
        let extract = TempDir::new().unwrap();

        let concepts = code.path().join("mimic-iii/concepts_postgres");
        fs::create_dir_all(&concepts).unwrap();
        fs::write(
            concepts.join("postgres-functions.sql"),
            "-- functions batch",
        )
        .unwrap();
        fs::write(
            concepts.join("postgres-make-concepts.sql"),
            "-- concepts batch",
        )
        .unwrap();

        let utils = extract.path().join("utils");
        fs::create_dir_all(&utils).unwrap();
        fs::write(
            utils.join("postgres_make_extended_concepts.sh"),
            "#!/bin/bash\n",
        )
        .unwrap();
        fs::write(utils.join("niv-durations.sql"), "-- durations batch").unwrap();

        (dump, code, extract)
    }

    fn config_for(dump: &TempDir, code: &TempDir, extract: &TempDir) -> SetupConfig {
        SetupConfig::new(
            dump.path().to_str().unwrap(),
            code.path().to_str().unwrap(),
            extract.path().to_str().unwrap(),
            DbConfig {
                host: "localhost".to_string(),
                name: "mimic".to_string(),
                user: "mimicuser".to_string(),
                password: "secret".to_string(),
                port: 5432,
            },
        )
    }

    #[tokio::test]
    async fn test_full_sequence_runs_in_order() {
        let (dump, code, extract) = fabricate_repos();
        let config = config_for(&dump, &code, &extract);
        let runner = FakeRunner::new();
        let executor = FakeExecutor::new();

        run_setup(&config, &runner, &executor).await.unwrap();

        let calls = runner.calls();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0].program, "make");
        assert_eq!(calls[1].program, "bash");

        let scripts = executor.scripts();
        assert_eq!(
            scripts,
            vec![
                "-- functions batch".to_string(),
                "-- concepts batch".to_string(),
                "-- durations batch".to_string(),
            ]
        );
    }

    #[tokio::test]
    async fn test_make_invocation_carries_connection_settings() {
        let (dump, code, extract) = fabricate_repos();
        let config = config_for(&dump, &code, &extract);
        let runner = FakeRunner::new();
        let executor = FakeExecutor::new();

        run_setup(&config, &runner, &executor).await.unwrap();

        let calls = runner.calls();
        let make = &calls[0];
        let build_dir = code.path().join("mimic-iii/buildmimic/postgres");

        assert_eq!(make.args[0], "-C");
        assert_eq!(make.args[1], build_dir.display().to_string());
        assert_eq!(make.args[2], "create-user");
        assert_eq!(make.args[3], "mimic-gz");
        assert!(
            make.args
                .contains(&format!("datadir={}", dump.path().display()))
        );
        assert!(make.args.contains(&"DBNAME=mimic".to_string()));
        assert!(make.args.contains(&"DBUSER=mimicuser".to_string()));
        assert!(make.args.contains(&"DBPASS=secret".to_string()));
        assert!(make.args.contains(&"DBHOST=localhost".to_string()));
        assert!(make.args.contains(&"DBPORT=5432".to_string()));
    }

    #[tokio::test]
    async fn test_extended_concepts_run_from_utils_directory() {
        let (dump, code, extract) = fabricate_repos();
        let config = config_for(&dump, &code, &extract);
        let runner = FakeRunner::new();
        let executor = FakeExecutor::new();

        run_setup(&config, &runner, &executor).await.unwrap();

        let calls = runner.calls();
        let bash = &calls[1];
        let utils = extract.path().join("utils");
        assert_eq!(
            bash.args,
            vec![
                utils
                    .join("postgres_make_extended_concepts.sh")
                    .display()
                    .to_string()
            ]
        );
        assert_eq!(bash.cwd, Some(utils));
    }

    #[tokio::test]
    async fn test_build_failure_stops_before_any_sql_runs() {
        let (dump, code, extract) = fabricate_repos();
        let config = config_for(&dump, &code, &extract);
        let runner = FakeRunner::failing("make");
        let executor = FakeExecutor::new();

        let err = run_setup(&config, &runner, &executor).await.unwrap_err();

        assert!(err.to_string().contains("make exited with code 2"));
        assert_eq!(runner.calls().len(), 1);
        assert!(executor.scripts().is_empty());
    }

    #[tokio::test]
    async fn test_sql_failure_stops_the_sequence() {
        let (dump, code, extract) = fabricate_repos();
        let config = config_for(&dump, &code, &extract);
        let runner = FakeRunner::new();
        let executor = FakeExecutor::failing_on("functions");

        let err = run_setup(&config, &runner, &executor).await.unwrap_err();

        assert!(err.to_string().contains("postgres-functions.sql"));
        // The shell script phase is never reached
        assert_eq!(runner.calls().len(), 1);
        assert!(executor.scripts().is_empty());
    }

    #[tokio::test]
    async fn test_missing_script_is_reported_with_its_path() {
        let (dump, code, extract) = fabricate_repos();
        fs::remove_file(
            code.path()
                .join("mimic-iii/concepts_postgres/postgres-functions.sql"),
        )
        .unwrap();

        let config = config_for(&dump, &code, &extract);
        let runner = FakeRunner::new();
        let executor = FakeExecutor::new();

        let err = run_setup(&config, &runner, &executor).await.unwrap_err();

        assert!(err.to_string().contains("Failed to read SQL script"));
        assert!(err.to_string().contains("postgres-functions.sql"));
    }

    #[tokio::test]
    async fn test_shell_script_failure_skips_durations() {
        let (dump, code, extract) = fabricate_repos();
        let config = config_for(&dump, &code, &extract);
        let runner = FakeRunner::failing("bash");
        let executor = FakeExecutor::new();

        let err = run_setup(&config, &runner, &executor).await.unwrap_err();

        assert!(err.to_string().contains("Extended concept generation failed"));
        // Both concept batches ran, the durations batch did not
        assert_eq!(
            executor.scripts(),
            vec![
                "-- functions batch".to_string(),
                "-- concepts batch".to_string(),
            ]
        );
    }
}
