//! Airbyte platform bootstrap

use std::fs;
use std::path::Path;
use std::process::Command;

use log::info;

use crate::error::{Result, StackError};

pub const AIRBYTE_REPO: &str = "https://github.com/airbytehq/airbyte.git";

/// Commands run in order, stopping at the first failure
pub const AIRBYTE_STEPS: [&str; 3] = [
    "git clone https://github.com/airbytehq/airbyte.git",
    "cd airbyte",
    "./run-ab-platform.sh",
];

pub fn airbyte_script() -> String {
    AIRBYTE_STEPS.join(" && ")
}

/// Run `script` with `sh -c` inside `dir`, failing on a non-zero exit
pub fn run_shell_chain(dir: &Path, script: &str) -> Result<()> {
    fs::create_dir_all(dir)?;
    info!("Running `{}` in {}", script, dir.display());
    let status = Command::new("sh").arg("-c").arg(script).current_dir(dir).status()?;
    if !status.success() {
        return Err(StackError::Command(format!("`{}` exited with {}", script, status)));
    }
    Ok(())
}

/// Clone Airbyte into `destination` and start its platform
pub fn run_dli_airbyte(destination: &Path) -> Result<()> {
    run_shell_chain(destination, &airbyte_script())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_airbyte_script() {
        assert_eq!(
            airbyte_script(),
            "git clone https://github.com/airbytehq/airbyte.git && cd airbyte && ./run-ab-platform.sh"
        );
        assert!(AIRBYTE_STEPS[0].ends_with(AIRBYTE_REPO));
    }

    #[test]
    fn test_shell_chain_runs_in_dir() {
        let temp = TempDir::new().unwrap();
        let dest = temp.path().join("work");
        run_shell_chain(&dest, "mkdir sub && cd sub && touch marker").unwrap();
        assert!(dest.join("sub").join("marker").exists());
    }

    #[test]
    fn test_shell_chain_failure() {
        let temp = TempDir::new().unwrap();
        let err = run_shell_chain(temp.path(), "true && false && touch never").unwrap_err();
        assert!(matches!(err, StackError::Command(_)));
        assert!(!temp.path().join("never").exists());
    }
}
