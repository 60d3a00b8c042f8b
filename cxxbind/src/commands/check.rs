use std::path::PathBuf;

use clap::Args;
use cxxbind_manifest::CxxbindToml;
use eyre::Result;

use super::UnwrapOrExit;
use crate::{
    ops,
    reports::{Report, TerminalOutput},
};

#[derive(Args)]
pub struct CheckCommand {
    /// Path to cxxbind.toml (defaults to ./cxxbind.toml)
    #[arg(short, long, default_value = "cxxbind.toml")]
    pub config: PathBuf,
}

impl CheckCommand {
    /// Run the check command
    pub fn run(&self) -> Result<()> {
        let toml = CxxbindToml::open(&self.config).unwrap_or_exit();
        let (graph, options) = toml.load().unwrap_or_exit();

        let report = ops::check(graph, options, &self.config)?;
        report.render(&mut TerminalOutput::new());

        if !report.is_valid() {
            std::process::exit(1);
        }
        Ok(())
    }
}
