/// A decoded eyewear image: RGBA pixels plus the URI it was loaded from.
///
/// Intrinsic size is only known once the image is decoded, so placement is
/// always computed from an `OverlayAsset`, never from a bare URI.
#[derive(Clone, Debug, PartialEq)]
pub struct OverlayAsset {
    uri: String,
    width: u32,
    height: u32,
    rgba: Vec<u8>,
}

impl OverlayAsset {
    pub fn new(
        uri: impl Into<String>,
        width: u32,
        height: u32,
        rgba: Vec<u8>,
    ) -> Result<Self, String> {
        if rgba.len() != width as usize * height as usize * 4 {
            return Err(format!(
                "RGBA buffer of {} bytes does not match {width}x{height}",
                rgba.len()
            ));
        }
        Ok(Self {
            uri: uri.into(),
            width,
            height,
            rgba,
        })
    }

    pub fn uri(&self) -> &str {
        &self.uri
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn rgba(&self) -> &[u8] {
        &self.rgba
    }
}
