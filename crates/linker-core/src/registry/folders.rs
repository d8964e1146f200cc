//! Filesystem-backed category registry.

use super::AssetRegistry;
use crate::config::MODEL_EXTENSIONS;
use serde::{Deserialize, Serialize};
use std::path::{Component, Path, PathBuf};
use tracing::debug;

/// Directories and accepted extensions for one category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryFolders {
    pub category: String,
    pub paths: Vec<PathBuf>,
    /// Dot-prefixed, lowercase. Empty accepts every file.
    pub extensions: Vec<String>,
}

/// Ordered category → directories registry.
///
/// Iteration follows insertion order so reference resolution probes
/// categories the same way on every run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FolderPaths {
    entries: Vec<CategoryFolders>,
}

/// Standard ComfyUI layout: category and its directories under `models/`.
const COMFYUI_LAYOUT: &[(&str, &[&str])] = &[
    ("checkpoints", &["checkpoints"]),
    ("configs", &["configs"]),
    ("loras", &["loras"]),
    ("vae", &["vae"]),
    ("text_encoders", &["text_encoders", "clip"]),
    ("diffusion_models", &["unet", "diffusion_models"]),
    ("clip_vision", &["clip_vision"]),
    ("style_models", &["style_models"]),
    ("embeddings", &["embeddings"]),
    ("diffusers", &["diffusers"]),
    ("vae_approx", &["vae_approx"]),
    ("controlnet", &["controlnet", "t2i_adapter"]),
    ("gligen", &["gligen"]),
    ("upscale_models", &["upscale_models"]),
    ("hypernetworks", &["hypernetworks"]),
    ("photomaker", &["photomaker"]),
    ("classifiers", &["classifiers"]),
];

impl FolderPaths {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry for a ComfyUI install whose model root is `models_dir`.
    ///
    /// `custom_nodes` is registered as a sibling of `models_dir`.
    pub fn comfyui_defaults(models_dir: &Path) -> Self {
        let mut folders = Self::new();
        for (category, dirs) in COMFYUI_LAYOUT {
            let extensions: Vec<String> = match *category {
                "configs" => vec![".yaml".to_string()],
                _ => MODEL_EXTENSIONS.iter().map(|e| e.to_string()).collect(),
            };
            for dir in *dirs {
                folders.add_path(category, models_dir.join(dir));
            }
            folders.set_extensions(category, extensions);
        }

        let base = models_dir.parent().unwrap_or(models_dir);
        folders.add_path("custom_nodes", base.join("custom_nodes"));
        folders
    }

    /// Append a directory to a category, creating the category if needed.
    ///
    /// Returns false when the directory was already registered.
    pub fn add_path(&mut self, category: &str, path: impl Into<PathBuf>) -> bool {
        self.insert_path(category, path.into(), false)
    }

    /// Put a directory first in its category's probe order.
    pub fn prepend_path(&mut self, category: &str, path: impl Into<PathBuf>) -> bool {
        self.insert_path(category, path.into(), true)
    }

    fn insert_path(&mut self, category: &str, path: PathBuf, front: bool) -> bool {
        let entry = self.entry_mut(category);
        if entry.paths.contains(&path) {
            return false;
        }
        debug!("Registered {} -> {}", category, path.display());
        if front {
            entry.paths.insert(0, path);
        } else {
            entry.paths.push(path);
        }
        true
    }

    pub fn set_extensions(&mut self, category: &str, extensions: Vec<String>) {
        self.entry_mut(category).extensions = extensions
            .into_iter()
            .map(|e| e.to_lowercase())
            .collect();
    }

    fn entry_mut(&mut self, category: &str) -> &mut CategoryFolders {
        let index = match self.entries.iter().position(|e| e.category == category) {
            Some(index) => index,
            None => {
                self.entries.push(CategoryFolders {
                    category: category.to_string(),
                    paths: Vec::new(),
                    extensions: Vec::new(),
                });
                self.entries.len() - 1
            }
        };
        &mut self.entries[index]
    }

    pub fn get(&self, category: &str) -> Option<&CategoryFolders> {
        self.entries.iter().find(|e| e.category == category)
    }

    /// Directories registered for `category`, empty when unknown.
    pub fn paths(&self, category: &str) -> &[PathBuf] {
        self.get(category).map(|e| e.paths.as_slice()).unwrap_or(&[])
    }

    pub fn iter(&self) -> impl Iterator<Item = &CategoryFolders> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Turn a workflow value into a path that stays inside its base directory.
///
/// Absolute paths and `..` components are refused.
fn contained_relative_path(filename: &str) -> Option<PathBuf> {
    let trimmed = filename.trim();
    if trimmed.is_empty() {
        return None;
    }
    let path = Path::new(trimmed);
    let mut relative = PathBuf::new();
    for component in path.components() {
        match component {
            Component::Normal(part) => relative.push(part),
            Component::CurDir => {}
            Component::ParentDir | Component::RootDir | Component::Prefix(_) => return None,
        }
    }
    (!relative.as_os_str().is_empty()).then_some(relative)
}

impl AssetRegistry for FolderPaths {
    fn categories(&self) -> Vec<String> {
        self.entries.iter().map(|e| e.category.clone()).collect()
    }

    fn locate(&self, category: &str, filename: &str) -> Option<PathBuf> {
        let relative = contained_relative_path(filename)?;
        self.paths(category)
            .iter()
            .map(|dir| dir.join(&relative))
            .find(|candidate| candidate.is_file())
    }
}
