//! Narrow/wide string shims
//!
//! Everything inside the crate works on `String`. Narrow host strings are
//! single-byte Latin-1, wide host strings are UTF-16; both are NUL-terminated.
//! Incoming strings are read up to their terminator (bounded by
//! [`MAX_INPUT_UNITS`]); outgoing strings are truncated to the host's fixed
//! buffer and always terminated.

use std::os::raw::c_char;

/// Upper bound when scanning a host string for its terminator
pub const MAX_INPUT_UNITS: usize = 32 * 1024;

/// Replacement for characters a narrow buffer cannot carry
const NARROW_REPLACEMENT: u8 = b'?';

/// Decode a Latin-1 byte string, stopping at the first NUL
pub fn narrow_to_string(bytes: &[u8]) -> String {
    bytes
        .iter()
        .take_while(|&&b| b != 0)
        .map(|&b| char::from(b))
        .collect()
}

/// Decode a UTF-16 string, stopping at the first NUL; unpaired surrogates become U+FFFD
pub fn wide_to_string(units: &[u16]) -> String {
    let end = units.iter().position(|&u| u == 0).unwrap_or(units.len());
    String::from_utf16_lossy(&units[..end])
}

/// Encode into a fixed narrow buffer, truncating and NUL-terminating
pub fn encode_narrow(text: &str, dst: &mut [u8]) {
    let Some(capacity) = dst.len().checked_sub(1) else {
        return;
    };
    let mut len = 0;
    for ch in text.chars().take(capacity) {
        dst[len] = u8::try_from(u32::from(ch)).unwrap_or(NARROW_REPLACEMENT);
        len += 1;
    }
    dst[len] = 0;
}

/// Encode into a fixed wide buffer, truncating on a code-point boundary and NUL-terminating
pub fn encode_wide(text: &str, dst: &mut [u16]) {
    let Some(capacity) = dst.len().checked_sub(1) else {
        return;
    };
    let mut len = 0;
    let mut units = [0u16; 2];
    for ch in text.chars() {
        let encoded = ch.encode_utf16(&mut units);
        if len + encoded.len() > capacity {
            break;
        }
        dst[len..len + encoded.len()].copy_from_slice(encoded);
        len += encoded.len();
    }
    dst[len] = 0;
}

/// Split a list of NUL-terminated names that ends with an empty name
pub fn split_list<T: Copy + Default + PartialEq>(units: &[T]) -> Vec<&[T]> {
    let zero = T::default();
    units
        .split(|&u| u == zero)
        .take_while(|item| !item.is_empty())
        .collect()
}

/// Length of a NUL-terminated host string, bounded by [`MAX_INPUT_UNITS`]
///
/// # Safety
/// `ptr` must be non-null and readable up to its terminator or the bound.
unsafe fn terminated_len<T: Copy + Default + PartialEq>(ptr: *const T) -> usize {
    let zero = T::default();
    let mut len = 0;
    while len < MAX_INPUT_UNITS && *ptr.add(len) != zero {
        len += 1;
    }
    len
}

/// Length of a double-NUL-terminated host list including the final terminator
///
/// # Safety
/// `ptr` must be non-null and readable up to its double terminator or the bound.
unsafe fn list_len<T: Copy + Default + PartialEq>(ptr: *const T) -> usize {
    let zero = T::default();
    let mut len = 0;
    while len + 1 < MAX_INPUT_UNITS {
        if *ptr.add(len) == zero && (len == 0 || *ptr.add(len - 1) == zero) {
            return len + 1;
        }
        len += 1;
    }
    len
}

/// # Safety
/// `ptr` must be null or point at a NUL-terminated narrow string.
pub unsafe fn narrow_from_ptr(ptr: *const c_char) -> Option<String> {
    if ptr.is_null() {
        return None;
    }
    let bytes = std::slice::from_raw_parts(ptr as *const u8, terminated_len(ptr as *const u8));
    Some(narrow_to_string(bytes))
}

/// # Safety
/// `ptr` must be null or point at a NUL-terminated wide string.
pub unsafe fn wide_from_ptr(ptr: *const u16) -> Option<String> {
    if ptr.is_null() {
        return None;
    }
    let units = std::slice::from_raw_parts(ptr, terminated_len(ptr));
    Some(wide_to_string(units))
}

/// # Safety
/// `ptr` must be null or point at a double-NUL-terminated narrow list.
pub unsafe fn narrow_list_from_ptr(ptr: *const c_char) -> Vec<String> {
    if ptr.is_null() {
        return Vec::new();
    }
    let bytes = std::slice::from_raw_parts(ptr as *const u8, list_len(ptr as *const u8));
    split_list(bytes).into_iter().map(narrow_to_string).collect()
}

/// # Safety
/// `ptr` must be null or point at a double-NUL-terminated wide list.
pub unsafe fn wide_list_from_ptr(ptr: *const u16) -> Vec<String> {
    if ptr.is_null() {
        return Vec::new();
    }
    let units = std::slice::from_raw_parts(ptr, list_len(ptr));
    split_list(units).into_iter().map(wide_to_string).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_narrow_is_latin1() {
        assert_eq!(narrow_to_string(b"caf\xe9\0junk"), "café");
    }

    #[test]
    fn test_encode_narrow_replaces_and_truncates() {
        let mut buf = [0xAAu8; 6];
        encode_narrow("añ€bcdef", &mut buf);
        assert_eq!(&buf, b"a\xf1?bc\0");
    }

    #[test]
    fn test_encode_wide_keeps_surrogate_pairs_whole() {
        let mut buf = [0xFFFFu16; 4];
        encode_wide("ab😀", &mut buf);
        assert_eq!(&buf, &[b'a' as u16, b'b' as u16, 0, 0xFFFF]);

        let mut buf = [0u16; 8];
        encode_wide("ab😀", &mut buf);
        assert_eq!(wide_to_string(&buf), "ab😀");
    }

    #[test]
    fn test_split_list() {
        let list = b"one.txt\0two.txt\0\0";
        let items = split_list(&list[..]);
        assert_eq!(items, vec![&b"one.txt"[..], &b"two.txt"[..]]);

        assert!(split_list(&b"\0\0"[..]).is_empty());
    }

    #[test]
    fn test_list_from_ptr_stops_at_double_nul() {
        let wide: Vec<u16> = "a.txt\0b.txt\0\0trailing".encode_utf16().collect();
        let items = unsafe { wide_list_from_ptr(wide.as_ptr()) };
        assert_eq!(items, vec!["a.txt".to_string(), "b.txt".to_string()]);

        let narrow = b"only.bin\0\0";
        let items = unsafe { narrow_list_from_ptr(narrow.as_ptr() as *const c_char) };
        assert_eq!(items, vec!["only.bin".to_string()]);

        let empty = b"\0\0";
        assert!(unsafe { narrow_list_from_ptr(empty.as_ptr() as *const c_char) }.is_empty());
    }

    #[test]
    fn test_null_pointers() {
        assert!(unsafe { narrow_from_ptr(std::ptr::null()) }.is_none());
        assert!(unsafe { wide_list_from_ptr(std::ptr::null()) }.is_empty());
    }
}
