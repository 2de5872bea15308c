//! Decompressor backed by the external `meshcodec` C library (feature `native`).
//! Without the feature every call fails, so each matched file counts as a failure.

use crate::codec::DecompressBackend;

#[cfg(feature = "native")]
mod ffi {
    use std::os::raw::c_int;

    #[link(name = "meshcodec")]
    extern "C" {
        pub fn mc_decompress_mc(
            output: *mut u8,
            output_len: usize,
            input: *const u8,
            input_len: usize,
            work: *mut u8,
            work_len: usize,
        ) -> c_int;

        pub fn mc_decompress_chunk(
            output: *mut u8,
            output_len: usize,
            input: *const u8,
            input_len: usize,
            work: *mut u8,
            work_len: usize,
        ) -> c_int;
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct NativeBackend;

#[cfg(feature = "native")]
impl NativeBackend {
    pub fn is_available() -> bool {
        true
    }
}

#[cfg(feature = "native")]
impl DecompressBackend for NativeBackend {
    fn decompress_general(&self, output: &mut [u8], input: &[u8], work: &mut [u8]) -> bool {
        // SAFETY: every pointer comes from a live slice paired with its own length.
        let rc = unsafe {
            ffi::mc_decompress_mc(
                output.as_mut_ptr(),
                output.len(),
                input.as_ptr(),
                input.len(),
                work.as_mut_ptr(),
                work.len(),
            )
        };
        rc != 0
    }

    fn decompress_chunk(&self, output: &mut [u8], input: &[u8], work: &mut [u8]) -> bool {
        // SAFETY: as above.
        let rc = unsafe {
            ffi::mc_decompress_chunk(
                output.as_mut_ptr(),
                output.len(),
                input.as_ptr(),
                input.len(),
                work.as_mut_ptr(),
                work.len(),
            )
        };
        rc != 0
    }
}

#[cfg(not(feature = "native"))]
impl NativeBackend {
    pub fn is_available() -> bool {
        false
    }
}

#[cfg(not(feature = "native"))]
impl DecompressBackend for NativeBackend {
    fn decompress_general(&self, _output: &mut [u8], _input: &[u8], _work: &mut [u8]) -> bool {
        false
    }

    fn decompress_chunk(&self, _output: &mut [u8], _input: &[u8], _work: &mut [u8]) -> bool {
        false
    }
}

#[cfg(all(test, not(feature = "native")))]
mod tests {
    use super::*;

    #[test]
    fn stub_rejects_everything() {
        assert!(!NativeBackend::is_available());
        let mut out = [0u8; 4];
        let mut work = [0u8; 4];
        assert!(!NativeBackend.decompress_general(&mut out, &[0; 12], &mut work));
        assert!(!NativeBackend.decompress_chunk(&mut out, &[4, 0, 0, 0], &mut work));
    }
}
