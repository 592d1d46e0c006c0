//! Asset lookup through an ordered chain of fallback sources.
//!
//! Every lookup walks the configured [`AssetSource`]s in priority order and
//! stops at the first one that both finds and decodes the resource. Each try is
//! written to a [`Trace`] so a failed lookup can be shown to the user.

use std::{fmt, path::PathBuf, rc::Rc, sync::Arc};

use log::{debug, warn};

use crate::sources::{
    AssetSource, EmbeddedBundle, EmbeddedSource, LocalFile, Namespace, SiteOfOrigin, SourceError,
};

/// one logical resource, `folder/filename`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AssetRequest {
    folder: String,
    filename: String,
}

impl AssetRequest {
    #[must_use]
    pub fn new(folder: impl Into<String>, filename: impl Into<String>) -> Self {
        Self {
            folder: folder.into(),
            filename: filename.into(),
        }
    }

    #[must_use]
    pub fn folder(&self) -> &str {
        &self.folder
    }

    #[must_use]
    pub fn filename(&self) -> &str {
        &self.filename
    }
}

impl fmt::Display for AssetRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.folder, self.filename)
    }
}

/// The places an asset can come from, in the order they are tried.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SourceKind {
    EmbeddedComponent,
    EmbeddedPack,
    SiteOfOrigin,
    LocalFile,
}

impl SourceKind {
    pub const ALL: [Self; 4] = [
        Self::EmbeddedComponent,
        Self::EmbeddedPack,
        Self::SiteOfOrigin,
        Self::LocalFile,
    ];

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::EmbeddedComponent => "component",
            Self::EmbeddedPack => "pack",
            Self::SiteOfOrigin => "siteoforigin",
            Self::LocalFile => "file",
        }
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// what the caller wants back from a lookup
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssetKind {
    Image,
    AudioBytes,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Success,
    Failure(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolutionAttempt {
    pub source: SourceKind,
    /// where the source looked, e.g. an embedded id or a file path
    pub location: String,
    pub outcome: Outcome,
}

impl ResolutionAttempt {
    #[must_use]
    pub const fn succeeded(&self) -> bool {
        matches!(self.outcome, Outcome::Success)
    }
}

impl fmt::Display for ResolutionAttempt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.outcome {
            Outcome::Success => write!(f, "OK {}:{}", self.source, self.location),
            Outcome::Failure(message) => write!(f, "x {}: {message}", self.source),
        }
    }
}

/// Every attempt made for one request, in the order they were made.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Trace(Vec<ResolutionAttempt>);

impl Trace {
    #[must_use]
    pub fn attempts(&self) -> &[ResolutionAttempt] {
        &self.0
    }

    pub fn failures(&self) -> impl Iterator<Item = &ResolutionAttempt> {
        self.0.iter().filter(|attempt| !attempt.succeeded())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    fn push(&mut self, attempt: ResolutionAttempt) {
        self.0.push(attempt);
    }
}

impl fmt::Display for Trace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, attempt) in self.0.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{attempt}")?;
        }
        Ok(())
    }
}

/// A fully decoded RGBA8 image.
///
/// Decoding happens when the asset is resolved, never lazily, and the pixel
/// buffer is immutable afterwards so clones are cheap and can be shared freely.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedImage {
    width: u32,
    height: u32,
    rgba: Arc<[u8]>,
}

impl DecodedImage {
    /// # Errors
    /// if the bytes are not an image format we can read
    pub fn decode(bytes: &[u8]) -> Result<Self, image::ImageError> {
        let image = image::load_from_memory(bytes)?.to_rgba8();
        let (width, height) = image.dimensions();
        Ok(Self {
            width,
            height,
            rgba: image.into_raw().into(),
        })
    }

    #[must_use]
    pub const fn width(&self) -> u32 {
        self.width
    }

    #[must_use]
    pub const fn height(&self) -> u32 {
        self.height
    }

    /// `[width, height]`, the shape egui wants for a `ColorImage`
    #[must_use]
    pub const fn size(&self) -> [usize; 2] {
        [self.width as usize, self.height as usize]
    }

    #[must_use]
    pub fn pixels(&self) -> &[u8] {
        &self.rgba
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssetData {
    Image(DecodedImage),
    /// fully materialized, so it can be reloaded without touching the source again
    Audio(Vec<u8>),
}

/// A loaded asset, owned by the caller, tagged with the source that produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedAsset {
    pub source: SourceKind,
    pub data: AssetData,
}

impl ResolvedAsset {
    #[must_use]
    pub fn into_image(self) -> Option<DecodedImage> {
        match self.data {
            AssetData::Image(image) => Some(image),
            AssetData::Audio(_) => None,
        }
    }

    #[must_use]
    pub fn into_audio(self) -> Option<Vec<u8>> {
        match self.data {
            AssetData::Audio(bytes) => Some(bytes),
            AssetData::Image(_) => None,
        }
    }
}

/// The result of [`AssetResolver::resolve`]: the asset if any source produced
/// it, and the trace either way.
#[derive(Debug, Clone)]
pub struct Resolution {
    pub asset: Option<ResolvedAsset>,
    pub trace: Trace,
}

pub struct AssetResolver {
    sources: Vec<Box<dyn AssetSource>>,
}

impl fmt::Debug for AssetResolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.sources.iter().map(|source| source.kind()))
            .finish()
    }
}

impl AssetResolver {
    /// A resolver over an arbitrary chain, tried front to back.
    #[must_use]
    pub fn new(sources: Vec<Box<dyn AssetSource>>) -> Self {
        Self { sources }
    }

    /// The usual four sources: the bundle's component namespace, the bundle's
    /// root namespace, the site of origin and the executable's directory.
    #[must_use]
    pub fn standard(
        bundle: EmbeddedBundle,
        origin: Option<PathBuf>,
        base_dir: Option<PathBuf>,
    ) -> Self {
        let bundle = Rc::new(bundle);
        Self::new(vec![
            Box::new(EmbeddedSource::new(Namespace::Component, Rc::clone(&bundle))),
            Box::new(EmbeddedSource::new(Namespace::Root, bundle)),
            Box::new(SiteOfOrigin::new(origin)),
            Box::new(LocalFile::new(base_dir)),
        ])
    }

    #[must_use]
    pub fn resolve(&self, request: &AssetRequest, kind: AssetKind) -> Resolution {
        let mut trace = Trace::default();
        for source in &self.sources {
            let location = source.locate(request);
            match source.fetch(request).and_then(|bytes| decode(bytes, kind)) {
                Ok(data) => {
                    debug!("resolved {request} from {} ({location})", source.kind());
                    trace.push(ResolutionAttempt {
                        source: source.kind(),
                        location,
                        outcome: Outcome::Success,
                    });
                    return Resolution {
                        asset: Some(ResolvedAsset {
                            source: source.kind(),
                            data,
                        }),
                        trace,
                    };
                }
                Err(e) => {
                    debug!("{} couldn't provide {request}: {e}", source.kind());
                    trace.push(ResolutionAttempt {
                        source: source.kind(),
                        location,
                        outcome: Outcome::Failure(e.to_string()),
                    });
                }
            }
        }
        warn!("couldn't resolve {request} from any source:\n{trace}");
        Resolution { asset: None, trace }
    }
}

fn decode(bytes: Vec<u8>, kind: AssetKind) -> Result<AssetData, SourceError> {
    match kind {
        AssetKind::Image => Ok(AssetData::Image(DecodedImage::decode(&bytes)?)),
        AssetKind::AudioBytes if bytes.is_empty() => Err(SourceError::Empty),
        AssetKind::AudioBytes => Ok(AssetData::Audio(bytes)),
    }
}
