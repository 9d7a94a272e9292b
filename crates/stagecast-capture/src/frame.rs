//! Video frame types delivered to the preview sink.

use bytes::Bytes;

/// A video frame from a local capture device.
#[derive(Debug, Clone)]
pub struct VideoFrame {
    /// NV12 pixel data.
    pub data: Bytes,

    /// Frame width in pixels.
    pub width: u32,

    /// Frame height in pixels.
    pub height: u32,

    /// Monotonically increasing sequence number.
    pub sequence: u64,
}

impl VideoFrame {
    /// Calculate expected NV12 buffer size for given dimensions.
    pub fn nv12_buffer_size(width: u32, height: u32) -> usize {
        // NV12: Y plane (width * height) + UV plane (width * height / 2)
        let y_size = (width * height) as usize;
        let uv_size = y_size / 2;
        y_size + uv_size
    }

    /// A frame is decodable when it has real dimensions and a full buffer.
    pub fn is_decodable(&self) -> bool {
        self.width > 0
            && self.height > 0
            && self.data.len() == Self::nv12_buffer_size(self.width, self.height)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_dimension_frame_is_not_decodable() {
        let frame = VideoFrame {
            data: Bytes::new(),
            width: 0,
            height: 0,
            sequence: 0,
        };
        assert!(!frame.is_decodable());
    }

    #[test]
    fn test_full_buffer_frame_is_decodable() {
        let frame = VideoFrame {
            data: Bytes::from(vec![0x80; VideoFrame::nv12_buffer_size(64, 48)]),
            width: 64,
            height: 48,
            sequence: 1,
        };
        assert!(frame.is_decodable());
    }
}
