use std::{fmt, sync::Arc};

use crate::error::{AulasError, AulasResult};

/// A rendition advertised by a master manifest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariantPlaylist {
    pub uri: String,
    /// `(width, height)`
    pub resolution: Option<(u64, u64)>,
}

impl VariantPlaylist {
    pub fn new<S: Into<String>>(uri: S, resolution: Option<(u64, u64)>) -> Self {
        Self {
            uri: uri.into(),
            resolution,
        }
    }

    /// Ranking key. Variants without a resolution rank as `0x0`.
    pub fn pixels(&self) -> u64 {
        self.resolution.map(|(w, h)| w.saturating_mul(h)).unwrap_or(0)
    }
}

impl From<&m3u8_rs::VariantStream> for VariantPlaylist {
    fn from(variant: &m3u8_rs::VariantStream) -> Self {
        Self {
            uri: variant.uri.clone(),
            resolution: variant.resolution.map(|r| (r.width, r.height)),
        }
    }
}

impl fmt::Display for VariantPlaylist {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.resolution {
            Some((w, h)) => write!(f, "{w} x {h}"),
            None => write!(f, "{} (unknown resolution)", self.uri),
        }
    }
}

/// Asks an operator which variant to download.
pub trait VariantChooser: Send + Sync {
    /// Returns a 1-based index into `variants`, or `None` to give up.
    fn choose(&self, variants: &[VariantPlaylist]) -> Option<usize>;
}

#[derive(Clone, Default)]
pub enum SelectionPolicy {
    /// Largest `width * height`, the first one wins on ties.
    #[default]
    Best,
    /// Second entry when ranked by `width * height`, or the only one.
    SecondBest,
    Interactive(Arc<dyn VariantChooser>),
}

impl fmt::Debug for SelectionPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Best => write!(f, "Best"),
            Self::SecondBest => write!(f, "SecondBest"),
            Self::Interactive(_) => write!(f, "Interactive"),
        }
    }
}

impl SelectionPolicy {
    pub fn select<'a>(&self, variants: &'a [VariantPlaylist]) -> AulasResult<&'a VariantPlaylist> {
        if variants.is_empty() {
            return Err(AulasError::EmptyPlaylist(
                "master playlist has no variants".to_string(),
            ));
        }

        match self {
            Self::Best => {
                let mut best = &variants[0];
                for variant in &variants[1..] {
                    if variant.pixels() > best.pixels() {
                        best = variant;
                    }
                }
                Ok(best)
            }
            Self::SecondBest => {
                let mut ranked: Vec<_> = variants.iter().collect();
                // stable, so equal resolutions keep manifest order
                ranked.sort_by(|a, b| b.pixels().cmp(&a.pixels()));
                Ok(ranked.get(1).copied().unwrap_or(ranked[0]))
            }
            Self::Interactive(chooser) => {
                let choice = chooser.choose(variants).unwrap_or(0);
                if choice == 0 || choice > variants.len() {
                    return Err(AulasError::InvalidVariantChoice(choice));
                }
                Ok(&variants[choice - 1])
            }
        }
    }
}
