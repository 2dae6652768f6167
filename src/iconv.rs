//! A minimal binding to the host's `iconv(3)` character set converter,
//! which is where the HFS+ flavored `UTF-8-MAC` charset lives when the
//! host has it at all.

use core::ffi::CStr;
use core::ptr;
use std::io;

use libc::{c_char, c_int, c_void, size_t};

#[allow(non_camel_case_types)]
type iconv_t = *mut c_void;

#[cfg_attr(target_vendor = "apple", link(name = "iconv"))]
unsafe extern "C" {
    fn iconv_open(tocode: *const c_char, fromcode: *const c_char) -> iconv_t;
    fn iconv(
        cd: iconv_t,
        inbuf: *mut *mut c_char,
        inbytesleft: *mut size_t,
        outbuf: *mut *mut c_char,
        outbytesleft: *mut size_t,
    ) -> size_t;
    fn iconv_close(cd: iconv_t) -> c_int;
}

pub(crate) const UTF8: &CStr = c"UTF-8";
pub(crate) const UTF8_MAC: &CStr = c"UTF-8-MAC";

/// An open conversion descriptor, closed on drop.
///
/// A descriptor carries shift state between calls. Each
/// [`Converter::convert`] call resets that state first and so converts its
/// input as a complete text.
pub(crate) struct Converter {
    cd: iconv_t,
}

impl Converter {
    /// Opens a converter from charset `from` to charset `to`.
    ///
    /// Fails when the host doesn't know one of the charsets.
    pub(crate) fn open(from: &CStr, to: &CStr) -> io::Result<Self> {
        // Safety: both arguments are valid NUL-terminated strings.
        let cd = unsafe { iconv_open(to.as_ptr(), from.as_ptr()) };
        if cd as isize == -1 {
            return Err(io::Error::last_os_error());
        }
        Ok(Converter { cd })
    }

    /// Converts all of `input`, returning the converted bytes.
    pub(crate) fn convert(&mut self, input: &[u8]) -> io::Result<Vec<u8>> {
        self.reset();

        let mut out: Vec<u8> = Vec::with_capacity(input.len() + input.len() / 2 + 16);
        let mut in_ptr = input.as_ptr() as *mut c_char;
        let mut in_left: size_t = input.len();

        loop {
            let written = out.len();
            let spare = out.capacity() - written;
            // Safety: `out_ptr` addresses the `spare` uninitialized bytes at
            // the end of `out`, which iconv only ever writes to.
            let mut out_ptr = unsafe { out.as_mut_ptr().add(written) } as *mut c_char;
            let mut out_left: size_t = spare;
            let ret = unsafe {
                iconv(
                    self.cd,
                    &mut in_ptr,
                    &mut in_left,
                    &mut out_ptr,
                    &mut out_left,
                )
            };
            let err = (ret as isize == -1).then(io::Error::last_os_error);
            // Safety: iconv initialized exactly `spare - out_left` bytes.
            unsafe { out.set_len(written + spare - out_left) };

            match err {
                None if in_left == 0 => break,
                None => {
                    return Err(io::Error::new(
                        io::ErrorKind::InvalidData,
                        "incomplete conversion",
                    ));
                }
                Some(e) if e.raw_os_error() == Some(libc::E2BIG) => {
                    out.reserve(out.capacity().max(16));
                }
                Some(e) => return Err(e),
            }
        }

        self.flush_shift_state(&mut out)?;
        Ok(out)
    }

    fn reset(&mut self) {
        // Safety: null buffers ask iconv to return to the initial state.
        unsafe {
            iconv(
                self.cd,
                ptr::null_mut(),
                ptr::null_mut(),
                ptr::null_mut(),
                ptr::null_mut(),
            );
        }
    }

    /// Emits whatever the converter still holds back, such as a pending
    /// composition in a `UTF-8-MAC` decoder.
    fn flush_shift_state(&mut self, out: &mut Vec<u8>) -> io::Result<()> {
        loop {
            out.reserve(16);
            let written = out.len();
            let spare = out.capacity() - written;
            let mut out_ptr = unsafe { out.as_mut_ptr().add(written) } as *mut c_char;
            let mut out_left: size_t = spare;
            // Safety: a null input buffer with a valid output buffer flushes
            // the shift sequence into the output.
            let ret = unsafe {
                iconv(
                    self.cd,
                    ptr::null_mut(),
                    ptr::null_mut(),
                    &mut out_ptr,
                    &mut out_left,
                )
            };
            let err = (ret as isize == -1).then(io::Error::last_os_error);
            unsafe { out.set_len(written + spare - out_left) };
            match err {
                None => return Ok(()),
                Some(e) if e.raw_os_error() == Some(libc::E2BIG) => continue,
                Some(e) => return Err(e),
            }
        }
    }
}

impl Drop for Converter {
    fn drop(&mut self) {
        // Safety: `cd` came from a successful `iconv_open` and is closed
        // exactly once.
        unsafe {
            iconv_close(self.cd);
        }
    }
}

/// Converts `input` in one shot with a freshly-opened converter.
pub(crate) fn transliterate(from: &CStr, to: &CStr, input: &[u8]) -> io::Result<Vec<u8>> {
    Converter::open(from, to)?.convert(input)
}
