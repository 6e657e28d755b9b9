//! Shared sample-plane buffer model.
//!
//! A `SamplePlane` is an owned 2-D grid of signed integer samples for a
//! single image component. It centralizes the interleave/de-interleave and
//! level-shift bookkeeping that each codec family otherwise duplicates
//! around its own encode/decode loops.

use crate::error::JpeglsError;
use crate::FrameInfo;

/// One component's samples, stored row-major.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SamplePlane {
    pub width: u32,
    pub height: u32,
    pub data: Vec<i32>,
}

impl SamplePlane {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            data: vec![0i32; (width * height) as usize],
        }
    }

    pub fn get(&self, x: u32, y: u32) -> i32 {
        self.data[(y * self.width + x) as usize]
    }

    pub fn set(&mut self, x: u32, y: u32, value: i32) {
        self.data[(y * self.width + x) as usize] = value;
    }

    /// Shifts unsigned samples down into a range centered on zero, e.g. an
    /// 8-bit sample of 200 becomes 200 - 128 = 72.
    pub fn level_shift_down(&mut self, bits_per_sample: u8) {
        let shift = 1i32 << (bits_per_sample - 1);
        for v in &mut self.data {
            *v -= shift;
        }
    }

    /// Inverse of `level_shift_down`, restoring the unsigned sample range.
    pub fn level_shift_up(&mut self, bits_per_sample: u8) {
        let shift = 1i32 << (bits_per_sample - 1);
        for v in &mut self.data {
            *v += shift;
        }
    }

    /// Splits an interleaved sample buffer (`c0,c1,c2, c0,c1,c2, ...`) into
    /// one plane per component. Samples are packed as `u8` at 8 bits or
    /// below, native-endian `u16` above that, matching the convention
    /// `jpegls::encoder`/`jpeg1::decoder` already use for wide samples.
    pub fn split_interleaved(
        source: &[u8],
        frame_info: &FrameInfo,
    ) -> Result<Vec<SamplePlane>, JpeglsError> {
        let width = frame_info.width;
        let height = frame_info.height;
        let components = frame_info.component_count as usize;
        let pixel_count = (width * height) as usize;
        let bits = frame_info.bits_per_sample as u8;

        let mut planes: Vec<SamplePlane> = (0..components)
            .map(|_| SamplePlane::new(width, height))
            .collect();

        if bits <= 8 {
            if source.len() < pixel_count * components {
                return Err(JpeglsError::InvalidData);
            }
            for i in 0..pixel_count {
                for (c, plane) in planes.iter_mut().enumerate() {
                    plane.data[i] = source[i * components + c] as i32;
                }
            }
        } else {
            let (head, body, tail) = unsafe { source.align_to::<u16>() };
            if !head.is_empty() || !tail.is_empty() || body.len() < pixel_count * components {
                return Err(JpeglsError::InvalidData);
            }
            for i in 0..pixel_count {
                for (c, plane) in planes.iter_mut().enumerate() {
                    plane.data[i] = body[i * components + c] as i32;
                }
            }
        }
        Ok(planes)
    }

    /// Inverse of `split_interleaved`: interleaves planes back into a byte
    /// buffer, clamping each sample into its component's unsigned range.
    pub fn interleave(
        planes: &[SamplePlane],
        frame_info: &FrameInfo,
        destination: &mut [u8],
    ) -> Result<(), JpeglsError> {
        let components = frame_info.component_count as usize;
        if planes.len() != components {
            return Err(JpeglsError::InvalidData);
        }
        let pixel_count = (frame_info.width * frame_info.height) as usize;
        let bits = frame_info.bits_per_sample as u8;
        let max_val = (1i32 << bits) - 1;

        if bits <= 8 {
            if destination.len() < pixel_count * components {
                return Err(JpeglsError::InvalidData);
            }
            for i in 0..pixel_count {
                for (c, plane) in planes.iter().enumerate() {
                    destination[i * components + c] = plane.data[i].clamp(0, max_val) as u8;
                }
            }
        } else {
            let (head, body, tail) = unsafe { destination.align_to_mut::<u16>() };
            if !head.is_empty() || !tail.is_empty() || body.len() < pixel_count * components {
                return Err(JpeglsError::InvalidData);
            }
            for i in 0..pixel_count {
                for (c, plane) in planes.iter().enumerate() {
                    body[i * components + c] = plane.data[i].clamp(0, max_val) as u16;
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_and_interleave_roundtrip_rgb8() {
        let frame_info = FrameInfo {
            width: 4,
            height: 3,
            bits_per_sample: 8,
            component_count: 3,
        };
        let mut source = vec![0u8; 4 * 3 * 3];
        for (i, b) in source.iter_mut().enumerate() {
            *b = (i % 256) as u8;
        }

        let planes = SamplePlane::split_interleaved(&source, &frame_info).unwrap();
        assert_eq!(planes.len(), 3);
        assert_eq!(planes[0].width, 4);
        assert_eq!(planes[0].height, 3);

        let mut roundtripped = vec![0u8; source.len()];
        SamplePlane::interleave(&planes, &frame_info, &mut roundtripped).unwrap();
        assert_eq!(source, roundtripped);
    }

    #[test]
    fn split_interleaved_16_bit_native_endian() {
        let frame_info = FrameInfo {
            width: 2,
            height: 2,
            bits_per_sample: 12,
            component_count: 1,
        };
        let samples: [u16; 4] = [0, 1000, 2000, 4095];
        let bytes: Vec<u8> = samples.iter().flat_map(|s| s.to_ne_bytes()).collect();

        let planes = SamplePlane::split_interleaved(&bytes, &frame_info).unwrap();
        assert_eq!(planes[0].data, vec![0, 1000, 2000, 4095]);
    }

    #[test]
    fn level_shift_roundtrip() {
        let mut plane = SamplePlane::new(2, 1);
        plane.set(0, 0, 0);
        plane.set(1, 0, 255);

        plane.level_shift_down(8);
        assert_eq!(plane.data, vec![-128, 127]);

        plane.level_shift_up(8);
        assert_eq!(plane.data, vec![0, 255]);
    }
}
