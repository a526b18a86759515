//! The only contract the stacked RAG builder needs from a label volume: a strided
//! read-subarray accessor. Grounded on `original_source/include/nifty/tools/array_tools.hxx`'s
//! `readSubarray`; the actual storage (in-memory, chunked, HDF5/Z5-backed) is out of scope
//! (see spec §1/§6) and referenced only through this trait.
use crate::error::{Error, Result};

/// A read-only view onto a 3D (Z, Y, X) label volume.
pub trait LabelVolume {
    /// `[z, y, x]` extent of the full volume.
    fn shape(&self) -> [usize; 3];

    /// Fills `out` (row-major, shape `end - begin`) with the labels in
    /// `[begin[i], end[i])` along each axis.
    fn read_subarray(&self, begin: [usize; 3], end: [usize; 3], out: &mut [u64]) -> Result<()>;

    /// Convenience accessor for a single voxel.
    fn get(&self, z: usize, y: usize, x: usize) -> u64 {
        let mut out = [0u64; 1];
        self.read_subarray([z, y, x], [z + 1, y + 1, x + 1], &mut out)
            .expect("single-voxel read within bounds");
        out[0]
    }
}

/// A dense, flat, in-memory label volume — the common case for already-loaded segmentation
/// output.
pub struct InMemoryLabelVolume {
    shape: [usize; 3],
    data: Vec<u64>,
}

impl InMemoryLabelVolume {
    pub fn new(shape: [usize; 3], data: Vec<u64>) -> Result<Self> {
        let expected = shape[0] * shape[1] * shape[2];
        if data.len() != expected {
            return Err(Error::PrecondViolation(format!(
                "label volume data length {} does not match shape {:?} ({} voxels)",
                data.len(),
                shape,
                expected
            )));
        }
        Ok(InMemoryLabelVolume { shape, data })
    }

    fn stride(&self) -> [usize; 3] {
        [self.shape[1] * self.shape[2], self.shape[2], 1]
    }
}

impl LabelVolume for InMemoryLabelVolume {
    fn shape(&self) -> [usize; 3] {
        self.shape
    }

    fn read_subarray(&self, begin: [usize; 3], end: [usize; 3], out: &mut [u64]) -> Result<()> {
        for d in 0..3 {
            if end[d] < begin[d] || end[d] > self.shape[d] {
                return Err(Error::PrecondViolation(format!(
                    "read_subarray range {:?}..{:?} out of bounds for shape {:?}",
                    begin, end, self.shape
                )));
            }
        }
        let extent = [end[0] - begin[0], end[1] - begin[1], end[2] - begin[2]];
        let expected = extent[0] * extent[1] * extent[2];
        if out.len() != expected {
            return Err(Error::PrecondViolation(format!(
                "out buffer length {} does not match requested extent {:?} ({} voxels)",
                out.len(),
                extent,
                expected
            )));
        }
        let stride = self.stride();
        let mut i = 0;
        for z in begin[0]..end[0] {
            for y in begin[1]..end[1] {
                for x in begin[2]..end[2] {
                    out[i] = self.data[z * stride[0] + y * stride[1] + x * stride[2]];
                    i += 1;
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
    fn reads_full_slice() {
        // shape (2,2,2), values 0..8
        let vol = InMemoryLabelVolume::new([2, 2, 2], (0..8).collect()).unwrap();
        let mut out = vec![0u64; 4];
        vol.read_subarray([0, 0, 0], [1, 2, 2], &mut out).unwrap();
        assert_eq!(out, vec![0, 1, 2, 3]);
        vol.read_subarray([1, 0, 0], [2, 2, 2], &mut out).unwrap();
        assert_eq!(out, vec![4, 5, 6, 7]);
    }

    #[test]
    fn get_reads_single_voxel() {
        let vol = InMemoryLabelVolume::new([1, 2, 2], vec![10, 11, 12, 13]).unwrap();
        assert_eq!(vol.get(0, 1, 0), 12);
    }

    #[test]
    fn rejects_mismatched_data_length() {
        assert!(InMemoryLabelVolume::new([2, 2, 2], vec![0, 1, 2]).is_err());
    }

    #[test]
    fn rejects_out_of_bounds_read() {
        let vol = InMemoryLabelVolume::new([1, 1, 1], vec![0]).unwrap();
        let mut out = vec![0u64; 1];
        assert!(vol.read_subarray([0, 0, 0], [2, 1, 1], &mut out).is_err());
    }
}
