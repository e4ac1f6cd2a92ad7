//! Exported packer plug-in entry points
//!
//! Thin `extern "system"` wrappers: validate pointers, convert strings, call
//! into [`crate::host::adapter`], and copy results back into host structs.
#![allow(non_snake_case)]

use crate::archive::EntryMetadata;
use crate::error::codes;
use crate::host::adapter::{self, CallbackRegistration, ProcessDataProc, ProcessDataProcW, Token};
use crate::host::strings::{
    encode_narrow, encode_wide, narrow_from_ptr, narrow_list_from_ptr, narrow_to_string,
    wide_from_ptr, wide_list_from_ptr,
};
use crate::host::{BACKGROUND_PACK, BACKGROUND_UNPACK, PK_CAPS_BY_CONTENT, PK_CAPS_NEW, PK_CAPS_SEARCHTEXT};
use std::ffi::c_void;
use std::os::raw::{c_char, c_int, c_uint};
use std::ptr;

pub type ChangeVolProc = extern "system" fn(arc_name: *mut c_char, mode: c_int) -> c_int;
pub type ChangeVolProcW = extern "system" fn(arc_name: *mut u16, mode: c_int) -> c_int;

#[repr(C)]
pub struct OpenArchiveData {
    pub arc_name: *const c_char,
    pub open_mode: c_int,
    pub open_result: c_int,
    pub cmt_buf: *mut c_char,
    pub cmt_buf_size: c_int,
    pub cmt_size: c_int,
    pub cmt_state: c_int,
}

#[repr(C)]
pub struct OpenArchiveDataW {
    pub arc_name: *const u16,
    pub open_mode: c_int,
    pub open_result: c_int,
    pub cmt_buf: *mut u16,
    pub cmt_buf_size: c_int,
    pub cmt_size: c_int,
    pub cmt_state: c_int,
}

#[repr(C)]
pub struct HeaderData {
    pub arc_name: [c_char; 260],
    pub file_name: [c_char; 260],
    pub flags: c_int,
    pub pack_size: c_int,
    pub unp_size: c_int,
    pub host_os: c_int,
    pub file_crc: c_int,
    pub file_time: c_int,
    pub unp_ver: c_int,
    pub method: c_int,
    pub file_attr: c_int,
    pub cmt_buf: *mut c_char,
    pub cmt_buf_size: c_int,
    pub cmt_size: c_int,
    pub cmt_state: c_int,
}

#[repr(C)]
pub struct HeaderDataEx {
    pub arc_name: [c_char; 1024],
    pub file_name: [c_char; 1024],
    pub flags: c_int,
    pub pack_size: c_uint,
    pub pack_size_high: c_uint,
    pub unp_size: c_uint,
    pub unp_size_high: c_uint,
    pub host_os: c_int,
    pub file_crc: c_int,
    pub file_time: c_int,
    pub unp_ver: c_int,
    pub method: c_int,
    pub file_attr: c_int,
    pub cmt_buf: *mut c_char,
    pub cmt_buf_size: c_int,
    pub cmt_size: c_int,
    pub cmt_state: c_int,
    pub reserved: [c_char; 1024],
}

#[repr(C)]
pub struct HeaderDataExW {
    pub arc_name: [u16; 1024],
    pub file_name: [u16; 1024],
    pub flags: c_int,
    pub pack_size: c_uint,
    pub pack_size_high: c_uint,
    pub unp_size: c_uint,
    pub unp_size_high: c_uint,
    pub host_os: c_int,
    pub file_crc: c_int,
    pub file_time: c_int,
    pub unp_ver: c_int,
    pub method: c_int,
    pub file_attr: c_int,
    pub cmt_buf: *mut c_char,
    pub cmt_buf_size: c_int,
    pub cmt_size: c_int,
    pub cmt_state: c_int,
    pub reserved: [c_char; 1024],
}

#[repr(C)]
pub struct PackDefaultParamStruct {
    pub size: c_int,
    pub plugin_interface_version_low: u32,
    pub plugin_interface_version_hi: u32,
    pub default_ini_name: [c_char; 260],
}

fn as_bytes(buf: &[c_char]) -> &[u8] {
    // c_char and u8 share size and alignment
    unsafe { std::slice::from_raw_parts(buf.as_ptr() as *const u8, buf.len()) }
}

fn as_bytes_mut(buf: &mut [c_char]) -> &mut [u8] {
    // c_char and u8 share size and alignment
    unsafe { std::slice::from_raw_parts_mut(buf.as_mut_ptr() as *mut u8, buf.len()) }
}

fn token_result(result: Result<Token, i32>, open_result: &mut c_int) -> isize {
    match result {
        Ok(token) => {
            *open_result = codes::SUCCESS;
            token
        }
        Err(code) => {
            *open_result = code;
            0
        }
    }
}

// ----------------------------------------------------------------------------
// Open / close
// ----------------------------------------------------------------------------

#[no_mangle]
pub unsafe extern "system" fn OpenArchive(data: *mut OpenArchiveData) -> isize {
    let Some(data) = data.as_mut() else { return 0 };
    let Some(path) = narrow_from_ptr(data.arc_name) else {
        data.open_result = codes::E_EOPEN;
        return 0;
    };
    token_result(adapter::open_archive(&path), &mut data.open_result)
}

#[no_mangle]
pub unsafe extern "system" fn OpenArchiveW(data: *mut OpenArchiveDataW) -> isize {
    let Some(data) = data.as_mut() else { return 0 };
    let Some(path) = wide_from_ptr(data.arc_name) else {
        data.open_result = codes::E_EOPEN;
        return 0;
    };
    token_result(adapter::open_archive(&path), &mut data.open_result)
}

#[no_mangle]
pub extern "system" fn CloseArchive(handle: isize) -> c_int {
    adapter::close_archive(handle)
}

#[no_mangle]
pub unsafe extern "system" fn CanYouHandleThisFile(file_name: *const c_char) -> c_int {
    narrow_from_ptr(file_name).map_or(0, |path| adapter::can_handle(&path) as c_int)
}

#[no_mangle]
pub unsafe extern "system" fn CanYouHandleThisFileW(file_name: *const u16) -> c_int {
    wide_from_ptr(file_name).map_or(0, |path| adapter::can_handle(&path) as c_int)
}

// ----------------------------------------------------------------------------
// Headers
// ----------------------------------------------------------------------------

#[no_mangle]
pub unsafe extern "system" fn ReadHeader(handle: isize, header: *mut HeaderData) -> c_int {
    let Some(header) = header.as_mut() else { return codes::E_EABORTED };
    match adapter::read_header(handle) {
        Ok(meta) => {
            encode_narrow(&meta.archive_name, as_bytes_mut(&mut header.arc_name));
            encode_narrow(&meta.entry_name, as_bytes_mut(&mut header.file_name));
            header.pack_size = meta.packed_size as c_int;
            header.unp_size = meta.unpacked_size_raw() as c_int;
            header.file_time = meta.file_time.0 as c_int;
            codes::SUCCESS
        }
        Err(code) => code,
    }
}

macro_rules! fill_sizes {
    ($header:expr, $meta:expr) => {{
        let meta: &EntryMetadata = $meta;
        let (low, high) = meta.packed_size_split();
        $header.pack_size = low;
        $header.pack_size_high = high;
        let (low, high) = meta.unpacked_size_split();
        $header.unp_size = low;
        $header.unp_size_high = high;
        $header.file_time = meta.file_time.0 as c_int;
    }};
}

#[no_mangle]
pub unsafe extern "system" fn ReadHeaderEx(handle: isize, header: *mut HeaderDataEx) -> c_int {
    let Some(header) = header.as_mut() else { return codes::E_EABORTED };
    match adapter::read_header(handle) {
        Ok(meta) => {
            encode_narrow(&meta.archive_name, as_bytes_mut(&mut header.arc_name));
            encode_narrow(&meta.entry_name, as_bytes_mut(&mut header.file_name));
            fill_sizes!(header, &meta);
            codes::SUCCESS
        }
        Err(code) => code,
    }
}

#[no_mangle]
pub unsafe extern "system" fn ReadHeaderExW(handle: isize, header: *mut HeaderDataExW) -> c_int {
    let Some(header) = header.as_mut() else { return codes::E_EABORTED };
    match adapter::read_header(handle) {
        Ok(meta) => {
            encode_wide(&meta.archive_name, &mut header.arc_name);
            encode_wide(&meta.entry_name, &mut header.file_name);
            fill_sizes!(header, &meta);
            codes::SUCCESS
        }
        Err(code) => code,
    }
}

// ----------------------------------------------------------------------------
// Processing
// ----------------------------------------------------------------------------

/// Host passes either a full destination in `dest_name`, or a directory in
/// `dest_path` plus a file name in `dest_name`.
fn destination(dest_path: Option<String>, dest_name: Option<String>) -> Option<String> {
    match (dest_path, dest_name) {
        (Some(dir), Some(name)) if !dir.is_empty() => {
            Some(std::path::Path::new(&dir).join(name).to_string_lossy().into_owned())
        }
        (_, name) => name,
    }
}

#[no_mangle]
pub unsafe extern "system" fn ProcessFile(
    handle: isize,
    operation: c_int,
    dest_path: *const c_char,
    dest_name: *const c_char,
) -> c_int {
    let dest = destination(narrow_from_ptr(dest_path), narrow_from_ptr(dest_name));
    adapter::process_file(handle, operation, dest.as_deref())
}

#[no_mangle]
pub unsafe extern "system" fn ProcessFileW(
    handle: isize,
    operation: c_int,
    dest_path: *const u16,
    dest_name: *const u16,
) -> c_int {
    let dest = destination(wide_from_ptr(dest_path), wide_from_ptr(dest_name));
    adapter::process_file(handle, operation, dest.as_deref())
}

#[no_mangle]
pub extern "system" fn SetProcessDataProc(handle: isize, callback: Option<ProcessDataProc>) {
    adapter::set_process_data_proc(handle, CallbackRegistration::Narrow(callback));
}

#[no_mangle]
pub extern "system" fn SetProcessDataProcW(handle: isize, callback: Option<ProcessDataProcW>) {
    adapter::set_process_data_proc(handle, CallbackRegistration::Wide(callback));
}

#[no_mangle]
pub extern "system" fn SetChangeVolProc(_handle: isize, _callback: Option<ChangeVolProc>) {}

#[no_mangle]
pub extern "system" fn SetChangeVolProcW(_handle: isize, _callback: Option<ChangeVolProcW>) {}

// ----------------------------------------------------------------------------
// Packing
// ----------------------------------------------------------------------------

#[no_mangle]
pub unsafe extern "system" fn PackFiles(
    packed_file: *const c_char,
    _sub_path: *const c_char,
    src_path: *const c_char,
    add_list: *const c_char,
    flags: c_int,
) -> c_int {
    let items = narrow_list_from_ptr(add_list);
    let Some(archive) = narrow_from_ptr(packed_file) else { return codes::E_ECREATE };
    let source_dir = narrow_from_ptr(src_path).unwrap_or_default();
    adapter::pack_files(&archive, &source_dir, &items, flags)
}

#[no_mangle]
pub unsafe extern "system" fn PackFilesW(
    packed_file: *const u16,
    _sub_path: *const u16,
    src_path: *const u16,
    add_list: *const u16,
    flags: c_int,
) -> c_int {
    let items = wide_list_from_ptr(add_list);
    let Some(archive) = wide_from_ptr(packed_file) else { return codes::E_ECREATE };
    let source_dir = wide_from_ptr(src_path).unwrap_or_default();
    adapter::pack_files(&archive, &source_dir, &items, flags)
}

#[no_mangle]
pub extern "system" fn DeleteFiles(_packed_file: *const c_char, _delete_list: *const c_char) -> c_int {
    codes::E_NOT_SUPPORTED
}

#[no_mangle]
pub extern "system" fn DeleteFilesW(_packed_file: *const u16, _delete_list: *const u16) -> c_int {
    codes::E_NOT_SUPPORTED
}

#[no_mangle]
pub extern "system" fn StartMemPack(_options: c_int, _file_name: *const c_char) -> *mut c_void {
    ptr::null_mut()
}

#[no_mangle]
pub extern "system" fn PackToMem(
    _mem_pack: *mut c_void,
    _buf_in: *mut c_char,
    _in_len: c_int,
    _taken: *mut c_int,
    _buf_out: *mut c_char,
    _out_len: c_int,
    _written: *mut c_int,
    _seek_by: *mut c_int,
) -> c_int {
    0
}

#[no_mangle]
pub extern "system" fn DoneMemPack(_mem_pack: *mut c_void) -> c_int {
    0
}

// ----------------------------------------------------------------------------
// Capabilities and defaults
// ----------------------------------------------------------------------------

#[no_mangle]
pub extern "system" fn GetPackerCaps() -> c_int {
    PK_CAPS_NEW | PK_CAPS_BY_CONTENT | PK_CAPS_SEARCHTEXT
}

#[no_mangle]
pub extern "system" fn GetBackgroundFlags() -> c_int {
    BACKGROUND_UNPACK | BACKGROUND_PACK
}

/// Decoded in place; an unterminated name stops at the end of the array
fn default_ini_name(params: &PackDefaultParamStruct) -> String {
    narrow_to_string(as_bytes(&params.default_ini_name))
}

#[no_mangle]
pub unsafe extern "system" fn PackSetDefaultParams(params: *const PackDefaultParamStruct) {
    let Some(params) = params.as_ref() else { return };
    let ini = default_ini_name(params);
    if !ini.is_empty() {
        adapter::set_default_params(&ini);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wide(text: &str) -> Vec<u16> {
        text.encode_utf16().chain(std::iter::once(0)).collect()
    }

    #[test]
    fn test_default_ini_name_stays_inside_its_array() {
        let mut params = PackDefaultParamStruct {
            size: std::mem::size_of::<PackDefaultParamStruct>() as c_int,
            plugin_interface_version_low: 0,
            plugin_interface_version_hi: 2,
            default_ini_name: [b'a' as c_char; 260],
        };
        assert_eq!(default_ini_name(&params), "a".repeat(260));

        params.default_ini_name[..9].copy_from_slice(&b"host.ini\0".map(|b| b as c_char));
        assert_eq!(default_ini_name(&params), "host.ini");
    }

    #[test]
    fn test_destination_joining() {
        assert_eq!(destination(None, Some("a.txt".into())).as_deref(), Some("a.txt"));
        assert_eq!(destination(Some(String::new()), Some("a.txt".into())).as_deref(), Some("a.txt"));
        assert_eq!(
            destination(Some("out".into()), Some("a.txt".into())),
            Some(std::path::Path::new("out").join("a.txt").to_string_lossy().into_owned())
        );
        assert_eq!(destination(Some("out".into()), None), None);
    }

    #[test]
    fn test_unsupported_surface_is_stable() {
        assert_eq!(DeleteFiles(ptr::null(), ptr::null()), codes::E_NOT_SUPPORTED);
        assert_eq!(DeleteFilesW(ptr::null(), ptr::null()), codes::E_NOT_SUPPORTED);
        assert!(StartMemPack(0, ptr::null()).is_null());
        assert_eq!(
            PackToMem(
                ptr::null_mut(),
                ptr::null_mut(),
                0,
                ptr::null_mut(),
                ptr::null_mut(),
                0,
                ptr::null_mut(),
                ptr::null_mut()
            ),
            0
        );
        assert_eq!(DoneMemPack(ptr::null_mut()), 0);
    }

    #[test]
    fn test_caps_exclude_multi_entry_features() {
        let caps = GetPackerCaps();
        assert_ne!(caps & PK_CAPS_NEW, 0);
        assert_eq!(caps & crate::host::PK_CAPS_MULTIPLE, 0);
        assert_eq!(caps & crate::host::PK_CAPS_DELETE, 0);
        assert_eq!(caps & crate::host::PK_CAPS_MEMPACK, 0);
    }

    #[test]
    fn test_open_missing_archive_reports_open_error() {
        let name = wide("/definitely/not/here.zst");
        let mut data = OpenArchiveDataW {
            arc_name: name.as_ptr(),
            open_mode: 0,
            open_result: -1,
            cmt_buf: ptr::null_mut(),
            cmt_buf_size: 0,
            cmt_size: 0,
            cmt_state: 0,
        };
        assert_eq!(unsafe { OpenArchiveW(&mut data) }, 0);
        assert_eq!(data.open_result, codes::E_EOPEN);
    }

    #[test]
    fn test_pack_list_validation_through_exports() {
        let archive = wide("/tmp/never-created.zst");
        let src = wide("/tmp/");
        let empty: Vec<u16> = vec![0, 0];
        let two: Vec<u16> = "a\0b\0\0".encode_utf16().collect();
        unsafe {
            assert_eq!(
                PackFilesW(archive.as_ptr(), ptr::null(), src.as_ptr(), empty.as_ptr(), 0),
                codes::E_NO_FILES
            );
            assert_eq!(
                PackFilesW(archive.as_ptr(), ptr::null(), src.as_ptr(), two.as_ptr(), 0),
                codes::E_TOO_MANY_FILES
            );
            assert_eq!(
                PackFiles(
                    b"/tmp/never.zst\0".as_ptr() as *const c_char,
                    ptr::null(),
                    b"/tmp/\0".as_ptr() as *const c_char,
                    ptr::null(),
                    0
                ),
                codes::E_NO_FILES
            );
        }
    }
}
