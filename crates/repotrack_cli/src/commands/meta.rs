use std::io::Write;

use clap::CommandFactory;

use crate::Cli;
use crate::commands::shared::CliResult;

fn completion_script(shell: clap_complete::Shell) -> Vec<u8> {
    let mut cmd = Cli::command();
    let mut out = Vec::new();
    clap_complete::generate(shell, &mut cmd, "repotrack", &mut out);
    out
}

pub(crate) fn handle_completions(shell: clap_complete::Shell) -> CliResult {
    let out = completion_script(shell);
    std::io::stdout().write_all(&out)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn completion_script_contains_binary_name() {
        let script = completion_script(clap_complete::Shell::Bash);
        let script = String::from_utf8(script).expect("completion output should be UTF-8");
        assert!(script.contains("repotrack"));
    }

    #[test]
    fn completion_script_lists_subcommands() {
        let script = completion_script(clap_complete::Shell::Zsh);
        let script = String::from_utf8(script).expect("completion output should be UTF-8");
        for sub in ["add", "pull", "authors", "watch"] {
            assert!(script.contains(sub), "missing {sub}");
        }
    }

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }
}
