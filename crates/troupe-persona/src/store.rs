use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::Persona;

/// Errors from loading persona definitions or resolving one for a request.
#[derive(Debug, Error)]
pub enum PersonaError {
    #[error("no persona configured for app id '{app_id}'")]
    NotFound { app_id: String },
    #[error("failed to read persona file {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse persona file {}: {source}", path.display())]
    Yaml {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
}

/// Read-only persona catalog, loaded once at startup and shared across
/// requests.
#[derive(Debug, Clone, Default)]
pub struct PersonaStore {
    personas: Vec<Persona>,
}

impl PersonaStore {
    pub fn from_personas(personas: Vec<Persona>) -> Self {
        Self { personas }
    }

    /// Loads every `*.yml` / `*.yaml` file in `dir` (non-recursive), sorted
    /// by file name so precedence is deterministic.
    pub fn load_dir(dir: impl AsRef<Path>) -> Result<Self, PersonaError> {
        let dir = dir.as_ref();
        let entries = std::fs::read_dir(dir).map_err(|source| PersonaError::Io {
            path: dir.to_path_buf(),
            source,
        })?;

        let mut paths = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|source| PersonaError::Io {
                path: dir.to_path_buf(),
                source,
            })?;
            let path = entry.path();
            let is_yaml = path
                .extension()
                .and_then(|ext| ext.to_str())
                .is_some_and(|ext| {
                    ext.eq_ignore_ascii_case("yml") || ext.eq_ignore_ascii_case("yaml")
                });
            if is_yaml && path.is_file() {
                paths.push(path);
            }
        }
        paths.sort();

        let mut personas = Vec::with_capacity(paths.len());
        for path in paths {
            let contents = std::fs::read_to_string(&path).map_err(|source| PersonaError::Io {
                path: path.clone(),
                source,
            })?;
            let persona = Persona::from_yaml(&contents).map_err(|source| PersonaError::Yaml {
                path: path.clone(),
                source,
            })?;
            personas.push(persona);
        }
        Ok(Self { personas })
    }

    /// First persona whose `app_id` matches, in load order.
    pub fn resolve(&self, app_id: &str) -> Result<&Persona, PersonaError> {
        self.personas
            .iter()
            .find(|persona| persona.app_id == app_id)
            .ok_or_else(|| PersonaError::NotFound {
                app_id: app_id.to_string(),
            })
    }

    pub fn personas(&self) -> &[Persona] {
        &self.personas
    }

    pub fn is_empty(&self) -> bool {
        self.personas.is_empty()
    }
}
