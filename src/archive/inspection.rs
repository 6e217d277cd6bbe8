//! Version resolution from published artifacts
//!
//! Pre-release uploads that only encode the SDK grain, and versions outside
//! the known grammar, do not carry the full product versions. The authoritative values live in the `.version` files shipped
//! inside the binary packages:
//!
//! ```text
//! <root>/<source-package-version>/usr/lib/dotnet/
//! ├── shared/Microsoft.NETCore.App/8.0.0-rc.2.23479.6/.version
//! ├── shared/Microsoft.AspNetCore.App/8.0.0-rc.2.23480.2/.version
//! └── sdk/8.0.100-rc.2.23502.2/.version
//! ```

use std::fs;
use std::path::{Path, PathBuf};

#[cfg(test)]
use mockall::automock;
use tracing::debug;

use crate::archive::error::ResolutionError;
use crate::version::error::VersionError;
use crate::version::product::ProductVersion;

const RUNTIME_DIR: &str = "usr/lib/dotnet/shared/Microsoft.NETCore.App";
const ASPNETCORE_DIR: &str = "usr/lib/dotnet/shared/Microsoft.AspNetCore.App";
const SDK_DIR: &str = "usr/lib/dotnet/sdk";
const VERSION_FILE_NAME: &str = ".version";

/// Product versions read from the artifacts of a publication
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedVersions {
    pub runtime: ProductVersion,
    pub aspnetcore_runtime: Option<ProductVersion>,
    pub sdk: ProductVersion,
}

/// Trait for resolving product versions a package version does not encode
#[cfg_attr(test, automock)]
#[async_trait::async_trait]
pub trait VersionInspector: Send + Sync {
    /// Resolve the product versions shipped by `source_package_version`
    async fn resolve_versions(
        &self,
        source_package_version: &str,
    ) -> Result<ResolvedVersions, ResolutionError>;
}

/// Contents of a `.version` file
///
/// Line 1 is the source commit, line 2 the product version. Further lines
/// (the RID on older builds) are ignored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DotVersionFile {
    pub commit_sha: String,
    pub version: String,
}

impl DotVersionFile {
    pub fn parse(text: &str) -> Option<Self> {
        let mut lines = text.lines().map(str::trim);
        let commit_sha = lines.next().filter(|line| !line.is_empty())?;
        let version = lines.next().filter(|line| !line.is_empty())?;

        Some(Self {
            commit_sha: commit_sha.to_string(),
            version: version.to_string(),
        })
    }

    /// Product version with the build qualifier removed
    /// (`8.0.0-rc.2.23479.6` -> `8.0.0-rc.2`).
    pub fn product_version(&self) -> Result<ProductVersion, VersionError> {
        let text = match self.version.split_once('-') {
            Some((core, qualifier)) => {
                let qualifier: Vec<&str> = qualifier.splitn(3, '.').take(2).collect();
                format!("{}-{}", core, qualifier.join("."))
            }
            None => self.version.clone(),
        };

        text.parse()
            .map_err(|_| VersionError::MalformedVersion(self.version.clone()))
    }
}

/// Reads `.version` files from binary packages extracted below a root
/// directory, one sub-directory per source package version.
pub struct ExtractedTreeInspector {
    root: PathBuf,
}

impl ExtractedTreeInspector {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

#[async_trait::async_trait]
impl VersionInspector for ExtractedTreeInspector {
    async fn resolve_versions(
        &self,
        source_package_version: &str,
    ) -> Result<ResolvedVersions, ResolutionError> {
        let tree = self.root.join(source_package_version);
        debug!("Inspecting extracted packages in {}", tree.display());

        tokio::task::spawn_blocking(move || read_tree(&tree))
            .await
            .map_err(|e| ResolutionError::Io(std::io::Error::other(e)))?
    }
}

fn read_tree(tree: &Path) -> Result<ResolvedVersions, ResolutionError> {
    let runtime = read_component(&tree.join(RUNTIME_DIR), Component::Runtime)?;
    let sdk = read_component(&tree.join(SDK_DIR), Component::Sdk)?;

    let aspnetcore_dir = tree.join(ASPNETCORE_DIR);
    let aspnetcore_runtime = if aspnetcore_dir.is_dir() {
        Some(read_component(&aspnetcore_dir, Component::Runtime)?)
    } else {
        None
    };

    Ok(ResolvedVersions {
        runtime,
        aspnetcore_runtime,
        sdk,
    })
}

#[derive(Debug, Clone, Copy)]
enum Component {
    Runtime,
    Sdk,
}

impl Component {
    fn accepts(self, version: &ProductVersion) -> bool {
        match self {
            Component::Runtime => version.is_runtime(),
            Component::Sdk => version.is_sdk(),
        }
    }
}

fn read_component(dir: &Path, component: Component) -> Result<ProductVersion, ResolutionError> {
    let path = find_version_file(dir)?
        .ok_or_else(|| ResolutionError::MissingVersionFile(dir.to_path_buf()))?;

    let text = fs::read_to_string(&path)?;
    let file = DotVersionFile::parse(&text).ok_or_else(|| ResolutionError::InvalidVersionFile {
        path: path.clone(),
        reason: "expected commit and version lines".to_string(),
    })?;

    let version = file
        .product_version()
        .map_err(|e| ResolutionError::InvalidVersionFile {
            path: path.clone(),
            reason: e.to_string(),
        })?;

    if !component.accepts(&version) {
        return Err(ResolutionError::InvalidVersionFile {
            path,
            reason: format!("{} is not a {:?} version", version, component),
        });
    }

    Ok(version)
}

/// Depth-first search for the first `.version` file, visiting entries in
/// name order.
fn find_version_file(dir: &Path) -> Result<Option<PathBuf>, ResolutionError> {
    if !dir.is_dir() {
        return Ok(None);
    }

    let candidate = dir.join(VERSION_FILE_NAME);
    if candidate.is_file() {
        return Ok(Some(candidate));
    }

    let mut children: Vec<PathBuf> = fs::read_dir(dir)?
        .map(|entry| entry.map(|e| e.path()))
        .collect::<Result<_, _>>()?;
    children.sort();

    for child in children.into_iter().filter(|path| path.is_dir()) {
        if let Some(found) = find_version_file(&child)? {
            return Ok(Some(found));
        }
    }

    Ok(None)
}

/// Inspector for hosts without access to package artifacts
pub struct NoInspection;

#[async_trait::async_trait]
impl VersionInspector for NoInspection {
    async fn resolve_versions(
        &self,
        source_package_version: &str,
    ) -> Result<ResolvedVersions, ResolutionError> {
        Err(ResolutionError::Unavailable(
            source_package_version.to_string(),
        ))
    }
}
