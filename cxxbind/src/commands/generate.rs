use std::path::PathBuf;

use clap::Args;
use cxxbind_manifest::CxxbindToml;
use eyre::Result;

use super::UnwrapOrExit;
use crate::{
    ops::{self, GenerateOptions},
    reports::{Report, TerminalOutput},
};

#[derive(Args)]
pub struct GenerateCommand {
    /// Path to cxxbind.toml (defaults to ./cxxbind.toml)
    #[arg(short, long, default_value = "cxxbind.toml")]
    pub config: PathBuf,

    /// Module source to write (defaults to `[module] output` next to cxxbind.toml)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Preview generated code without writing to disk
    #[arg(long)]
    pub dry_run: bool,
}

impl GenerateCommand {
    /// Run the generate command
    pub fn run(&self) -> Result<()> {
        let toml = CxxbindToml::open(&self.config).unwrap_or_exit();
        let (graph, options) = toml.load().unwrap_or_exit();
        let output = self.output.clone().unwrap_or_else(|| toml.output_path());

        let report = ops::generate(
            graph,
            options,
            GenerateOptions {
                output: &output,
                dry_run: self.dry_run,
            },
        )?;
        report.render(&mut TerminalOutput::new());
        Ok(())
    }
}
