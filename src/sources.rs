//! The individual places an asset can be loaded from.

use std::{
    collections::HashMap,
    fs, io,
    path::{Path, PathBuf},
    rc::Rc,
};

use log::info;
use thiserror::Error;

use crate::assets::{AssetRequest, SourceKind};

/// name of the component namespace in the embedded bundle
pub const COMPONENT: &str = env!("CARGO_PKG_NAME");

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("{0} is not embedded")]
    NotEmbedded(String),
    #[error("no {0} directory is available")]
    NoDirectory(&'static str),
    #[error("file not found: {}", .0.display())]
    FileNotFound(PathBuf),
    #[error("couldn't read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("couldn't decode image: {0}")]
    Decode(#[from] image::ImageError),
    #[error("resource is empty")]
    Empty,
}

/// One strategy for locating an asset.
pub trait AssetSource {
    fn kind(&self) -> SourceKind;

    /// where `request` would be looked up, for diagnostics
    fn locate(&self, request: &AssetRequest) -> String;

    /// # Errors
    /// if this source doesn't have the asset or can't read it
    fn fetch(&self, request: &AssetRequest) -> Result<Vec<u8>, SourceError>;
}

/// the two halves of the embedded bundle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Namespace {
    /// resources compiled into this library, addressed relative to it
    Component,
    /// resources registered by the application, addressed from the root
    Root,
}

macro_rules! embed {
    ($file:literal) => {
        (
            concat!("resources/", $file),
            include_bytes!(concat!("../assets/resources/", $file)).as_slice(),
        )
    };
}

const BUILTIN: [(&str, &[u8]); 12] = [
    embed!("face_1.png"),
    embed!("face_2.png"),
    embed!("face_3.png"),
    embed!("hour_hand_1.png"),
    embed!("hour_hand_2.png"),
    embed!("hour_hand_3.png"),
    embed!("minute_hand_1.png"),
    embed!("minute_hand_2.png"),
    embed!("minute_hand_3.png"),
    embed!("alarm_1.wav"),
    embed!("alarm_2.wav"),
    embed!("alarm_3.wav"),
];

/// Resources compiled into the executable, keyed by `folder/filename`.
#[derive(Debug, Clone, Default)]
pub struct EmbeddedBundle {
    component: HashMap<String, &'static [u8]>,
    root: HashMap<String, &'static [u8]>,
}

impl EmbeddedBundle {
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// the faces, hands and alarm sounds that ship with the clock
    #[must_use]
    pub fn builtin() -> Self {
        BUILTIN
            .into_iter()
            .fold(Self::empty(), |bundle, (id, bytes)| {
                bundle.with_resource(Namespace::Component, id, bytes)
            })
    }

    #[must_use]
    pub fn with_resource(mut self, namespace: Namespace, id: &str, bytes: &'static [u8]) -> Self {
        self.namespace_mut(namespace).insert(id.to_string(), bytes);
        self
    }

    #[must_use]
    pub fn get(&self, namespace: Namespace, id: &str) -> Option<&'static [u8]> {
        self.namespace(namespace).get(id).copied()
    }

    pub fn resources(&self, namespace: Namespace) -> impl Iterator<Item = (&str, &'static [u8])> {
        self.namespace(namespace)
            .iter()
            .map(|(id, bytes)| (id.as_str(), *bytes))
    }

    const fn namespace(&self, namespace: Namespace) -> &HashMap<String, &'static [u8]> {
        match namespace {
            Namespace::Component => &self.component,
            Namespace::Root => &self.root,
        }
    }

    fn namespace_mut(&mut self, namespace: Namespace) -> &mut HashMap<String, &'static [u8]> {
        match namespace {
            Namespace::Component => &mut self.component,
            Namespace::Root => &mut self.root,
        }
    }
}

/// Looks a request up in one namespace of the embedded bundle.
#[derive(Debug)]
pub struct EmbeddedSource {
    namespace: Namespace,
    bundle: Rc<EmbeddedBundle>,
}

impl EmbeddedSource {
    #[must_use]
    pub const fn new(namespace: Namespace, bundle: Rc<EmbeddedBundle>) -> Self {
        Self { namespace, bundle }
    }
}

impl AssetSource for EmbeddedSource {
    fn kind(&self) -> SourceKind {
        match self.namespace {
            Namespace::Component => SourceKind::EmbeddedComponent,
            Namespace::Root => SourceKind::EmbeddedPack,
        }
    }

    fn locate(&self, request: &AssetRequest) -> String {
        match self.namespace {
            Namespace::Component => format!("{COMPONENT}/{request}"),
            Namespace::Root => format!("/{request}"),
        }
    }

    fn fetch(&self, request: &AssetRequest) -> Result<Vec<u8>, SourceError> {
        self.bundle
            .get(self.namespace, &request.to_string())
            .map(<[u8]>::to_vec)
            .ok_or_else(|| SourceError::NotEmbedded(self.locate(request)))
    }
}

/// Files under the directory the application was deployed to.
#[derive(Debug)]
pub struct SiteOfOrigin {
    origin: Option<PathBuf>,
}

impl SiteOfOrigin {
    #[must_use]
    pub const fn new(origin: Option<PathBuf>) -> Self {
        Self { origin }
    }
}

impl AssetSource for SiteOfOrigin {
    fn kind(&self) -> SourceKind {
        SourceKind::SiteOfOrigin
    }

    fn locate(&self, request: &AssetRequest) -> String {
        self.origin.as_ref().map_or_else(
            || request.to_string(),
            |origin| path_for(origin, request).display().to_string(),
        )
    }

    fn fetch(&self, request: &AssetRequest) -> Result<Vec<u8>, SourceError> {
        let origin = self
            .origin
            .as_ref()
            .ok_or(SourceError::NoDirectory("site of origin"))?;
        read(&path_for(origin, request))
    }
}

/// Files next to the running executable.
#[derive(Debug)]
pub struct LocalFile {
    base_dir: Option<PathBuf>,
}

impl LocalFile {
    #[must_use]
    pub const fn new(base_dir: Option<PathBuf>) -> Self {
        Self { base_dir }
    }
}

impl AssetSource for LocalFile {
    fn kind(&self) -> SourceKind {
        SourceKind::LocalFile
    }

    fn locate(&self, request: &AssetRequest) -> String {
        self.base_dir.as_ref().map_or_else(
            || request.to_string(),
            |base| path_for(base, request).display().to_string(),
        )
    }

    fn fetch(&self, request: &AssetRequest) -> Result<Vec<u8>, SourceError> {
        let base = self
            .base_dir
            .as_ref()
            .ok_or(SourceError::NoDirectory("executable"))?;
        let path = path_for(base, request);
        if !path.is_file() {
            return Err(SourceError::FileNotFound(path));
        }
        read(&path)
    }
}

fn path_for(dir: &Path, request: &AssetRequest) -> PathBuf {
    dir.join(request.folder()).join(request.filename())
}

fn read(path: &Path) -> Result<Vec<u8>, SourceError> {
    fs::read(path).map_err(|source| SourceError::Read {
        path: path.to_path_buf(),
        source,
    })
}

/// the directory holding the running executable
///
/// # Errors
/// if the executable path can't be determined
pub fn executable_base_dir() -> io::Result<PathBuf> {
    let exe = std::env::current_exe()?;
    exe.parent()
        .map(Path::to_path_buf)
        .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, "executable has no parent directory"))
}

/// Writes the bundle's component resources under `origin` so the site of
/// origin source can find them. Existing files are only replaced with `force`.
///
/// Returns how many files were written.
///
/// # Errors
/// if a directory or file can't be written
pub fn install_assets(bundle: &EmbeddedBundle, origin: &Path, force: bool) -> io::Result<usize> {
    let mut written = 0;
    for (id, bytes) in bundle.resources(Namespace::Component) {
        let path = origin.join(id);
        if path.exists() && !force {
            continue;
        }
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, bytes)?;
        info!("installed {}", path.display());
        written += 1;
    }
    Ok(written)
}
