use std::path::{Path, PathBuf};

use cxxbind_codegen::options::ModuleOptions;
use cxxbind_decl::DeclGraph;

use super::Manifest;
use crate::{Error, Result, error::SourceContext};

/// Represents a cxxbind.toml file with both raw content and parsed manifest.
pub struct CxxbindToml {
    path: PathBuf,
    content: String,
    manifest: Manifest,
}

impl CxxbindToml {
    /// Open and parse a cxxbind.toml file.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let content = std::fs::read_to_string(&path).map_err(|e| Error::io(&path, e))?;
        let filename = path.display().to_string();
        let manifest = Manifest::from_str_with_filename(&content, &filename)?;

        Ok(Self {
            path,
            content,
            manifest,
        })
    }

    /// Get the file path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Directory that relative paths in the manifest are resolved against.
    pub fn dir(&self) -> &Path {
        self.path.parent().unwrap_or_else(|| Path::new("."))
    }

    /// Get the raw content.
    pub fn content(&self) -> &str {
        &self.content
    }

    /// Get the parsed manifest.
    pub fn manifest(&self) -> &Manifest {
        &self.manifest
    }

    /// Path of the generated module source.
    pub fn output_path(&self) -> PathBuf {
        self.dir().join(self.manifest.module.output_file())
    }

    /// Read the declaration graph named by `[module] declarations`.
    pub fn load_graph(&self) -> Result<DeclGraph> {
        let declarations = self
            .manifest
            .module
            .declarations
            .as_deref()
            .ok_or_else(|| Box::new(Error::MissingDeclarations))?;
        let path = self.dir().join(declarations);
        let json = std::fs::read_to_string(&path).map_err(|e| Error::io(&path, e))?;
        DeclGraph::from_json(&json).map_err(|source| Box::new(Error::Graph { path, source }))
    }

    /// Load the declaration graph and apply every override table to it.
    ///
    /// Returns the graph ready for the pipeline together with the module
    /// options.
    pub fn load(&self) -> Result<(DeclGraph, ModuleOptions)> {
        let mut graph = self.load_graph()?;
        let src = SourceContext::new(self.content.clone(), self.path.display().to_string());
        self.manifest.apply_overrides(&mut graph, &src)?;
        Ok((graph, self.manifest.module.clone()))
    }

    /// Update content and re-parse the manifest.
    pub fn set_content(&mut self, content: String) -> Result<()> {
        let filename = self.path.display().to_string();
        let manifest = Manifest::from_str_with_filename(&content, &filename)?;
        self.content = content;
        self.manifest = manifest;
        Ok(())
    }

    /// Save the current content to disk.
    pub fn save(&self) -> Result<()> {
        std::fs::write(&self.path, &self.content).map_err(|e| Error::io(&self.path, e))?;
        Ok(())
    }
}
