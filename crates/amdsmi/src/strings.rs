use std::ffi::c_char;

/// Decodes a fixed-capacity C character buffer.
///
/// Stops at the first NUL inside the buffer, or at the end of the buffer when
/// the library filled it completely. Nothing past `buf` is ever read.
pub fn from_fixed(buf: &[c_char]) -> String {
    let bytes: Vec<u8> = buf
        .iter()
        .take_while(|&&c| c != 0)
        .map(|&c| c as u8)
        .collect();
    String::from_utf8_lossy(&bytes).into_owned()
}
