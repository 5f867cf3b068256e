//! Options injected into every archive opened from one root.

use std::sync::Arc;

use pakscope_gfx::Platform;

use crate::decompress::{Decompressor, StandardDecompressor};

/// Per-open configuration passed down to decoders and nested archives.
#[derive(Debug, Clone)]
pub struct PakConfig {
    /// Target platform handed to texture `begin`.
    pub platform: Platform,
    pub decompressor: Arc<dyn Decompressor>,
    /// Check VPK MD5 sections and signature while building the catalog.
    pub verify_signatures: bool,
    /// Check stored CRCs when resolving payloads.
    pub verify_crc: bool,
}

impl Default for PakConfig {
    fn default() -> Self {
        Self {
            platform: Platform::OpenGL,
            decompressor: Arc::new(StandardDecompressor),
            verify_signatures: true,
            verify_crc: true,
        }
    }
}

impl PakConfig {
    pub fn with_platform(mut self, platform: Platform) -> Self {
        self.platform = platform;
        self
    }

    pub fn with_decompressor(mut self, decompressor: Arc<dyn Decompressor>) -> Self {
        self.decompressor = decompressor;
        self
    }

    /// Skip checksum and signature work, both at open and on read.
    pub fn unverified(mut self) -> Self {
        self.verify_signatures = false;
        self.verify_crc = false;
        self
    }
}
