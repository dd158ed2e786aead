use std::borrow::Cow;
use crate::core::{Error, ErrorKind, Result};
use super::{MX_MUL, MX_MUL_SOURCE};

/// Parameters of a matrix multiplication offload.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct OffloadConfig {
    /// Local work group extent, in both dimensions. Row and column counts must be multiples of it.
    pub tile: usize,
    /// Kernel entry point.
    pub entry: Cow<'static, str>,
    /// Build options, passed through unmodified.
    pub options: Option<String>,
    /// Kernel source text.
    pub source: Cow<'static, str>
}

impl OffloadConfig {
    #[inline(always)]
    pub fn with_tile (self, tile: usize) -> Self {
        Self { tile, ..self }
    }

    #[inline(always)]
    pub fn with_entry (self, entry: impl Into<Cow<'static, str>>) -> Self {
        Self { entry: entry.into(), ..self }
    }

    #[inline(always)]
    pub fn with_options (self, options: impl Into<String>) -> Self {
        Self { options: Some(options.into()), ..self }
    }

    #[inline(always)]
    pub fn with_source (self, source: impl Into<Cow<'static, str>>) -> Self {
        Self { source: source.into(), ..self }
    }

    pub fn validate (&self) -> Result<()> {
        if self.tile == 0 {
            return Err(Error::new(ErrorKind::ShapeUnsupported, "tile size must be positive"))
        }
        Ok(())
    }
}

impl Default for OffloadConfig {
    #[inline]
    fn default() -> Self {
        Self {
            tile: 8,
            entry: Cow::Borrowed(MX_MUL),
            options: None,
            source: Cow::Borrowed(MX_MUL_SOURCE)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults () {
        let config = OffloadConfig::default();
        assert_eq!(config.tile, 8);
        assert_eq!(config.entry, "mx_mul");
        assert_eq!(config.options, None);
        assert!(config.source.contains("__kernel void mx_mul"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn zero_tile_is_rejected () {
        let err = OffloadConfig::default().with_tile(0).validate().unwrap_err();
        assert_eq!(err.kind, ErrorKind::ShapeUnsupported);
    }
}
