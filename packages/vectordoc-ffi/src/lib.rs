//! C ABI bridge for embedding `vectordoc-core` in a host that speaks only C
//! strings and doubles. Holds the one piece of mutable global state the core
//! itself refuses to own: a process-wide [`Manager`] behind explicit
//! `manager_create` / `manager_default` / `manager_reset` entry points.
//!
//! Every heap string this crate hands back crosses the boundary via
//! [`vectordoc_free_string`]; the core never retains the pointer, and this
//! crate never lets a raw pointer outlive the call that produced it without
//! handing ownership to the caller explicitly.

use std::ffi::{CStr, CString};
use std::os::raw::{c_char, c_int};
use std::str::FromStr;
use std::sync::{Mutex, OnceLock};

use vectordoc_core::{FrameView, Id, Manager, RectangleView, TextBoxView};

static MANAGER: OnceLock<Mutex<Option<Manager>>> = OnceLock::new();

fn cell() -> &'static Mutex<Option<Manager>> {
    MANAGER.get_or_init(|| Mutex::new(None))
}

/// Runs `f` against the live manager, or `default` if none has been created yet.
fn with_manager<R>(default: R, f: impl FnOnce(&mut Manager) -> R) -> R {
    let mut guard = cell().lock().unwrap_or_else(|e| e.into_inner());
    match guard.as_mut() {
        Some(manager) => f(manager),
        None => default,
    }
}

unsafe fn read_cstr<'a>(ptr: *const c_char) -> Option<&'a str> {
    if ptr.is_null() {
        return None;
    }
    CStr::from_ptr(ptr).to_str().ok()
}

fn parse_id(raw: &str) -> Option<Id> {
    Id::from_str(raw).ok()
}

fn leak_string(s: impl Into<Vec<u8>>) -> *mut c_char {
    CString::new(s).map(CString::into_raw).unwrap_or(std::ptr::null_mut())
}

fn write_csv(ids: &[Id], out_buf: *mut c_char, cap: c_int) {
    if out_buf.is_null() || cap <= 0 {
        return;
    }
    let joined = ids.iter().map(Id::to_string).collect::<Vec<_>>().join(",");
    let bytes = joined.as_bytes();
    let cap = cap as usize;
    let copy_len = bytes.len().min(cap - 1);
    unsafe {
        std::ptr::copy_nonoverlapping(bytes.as_ptr(), out_buf as *mut u8, copy_len);
        *out_buf.add(copy_len) = 0;
    }
}

/// Replaces the global manager with a fresh one stamped with `site_id`.
///
/// # Safety
/// `site_id` must be a valid, NUL-terminated C string for the duration of the call.
#[no_mangle]
pub unsafe extern "C" fn vectordoc_manager_create(site_id: *const c_char) {
    let site = read_cstr(site_id).unwrap_or("default").to_string();
    *cell().lock().unwrap_or_else(|e| e.into_inner()) = Some(Manager::new(site));
}

/// Ensures a manager exists, creating one with site `"default"` if not.
#[no_mangle]
pub extern "C" fn vectordoc_manager_default() {
    let mut guard = cell().lock().unwrap_or_else(|e| e.into_inner());
    if guard.is_none() {
        *guard = Some(Manager::new("default"));
    }
}

/// Tears down the global manager. A subsequent call into any other entry
/// point behaves as if no manager had ever been created.
#[no_mangle]
pub extern "C" fn vectordoc_manager_reset() {
    *cell().lock().unwrap_or_else(|e| e.into_inner()) = None;
}

/// Releases a string previously returned by this crate. Passing a pointer
/// not obtained from this crate, or freeing one twice, is undefined behavior.
///
/// # Safety
/// `ptr` must either be null or have been returned by one of this crate's
/// `*_get_*` / `create_*` functions, and must not have been freed already.
#[no_mangle]
pub unsafe extern "C" fn vectordoc_free_string(ptr: *mut c_char) {
    if !ptr.is_null() {
        drop(CString::from_raw(ptr));
    }
}

// ---- Frame ----

/// # Safety
/// Same contract as the other `*_create_*` entry points: no input pointers to validate here.
#[no_mangle]
pub extern "C" fn vectordoc_create_frame(x: f64, y: f64, width: f64, height: f64) -> *mut c_char {
    with_manager(std::ptr::null_mut(), |m| {
        let id = m.create_frame(x, y, width, height);
        leak_string(id.to_string())
    })
}

/// # Safety
/// `id` must be a valid NUL-terminated C string.
#[no_mangle]
pub unsafe extern "C" fn vectordoc_frame_get_x(id: *const c_char) -> f64 {
    frame_numeric(id, FrameView::get_x)
}

/// # Safety
/// `id` must be a valid NUL-terminated C string.
#[no_mangle]
pub unsafe extern "C" fn vectordoc_frame_get_y(id: *const c_char) -> f64 {
    frame_numeric(id, FrameView::get_y)
}

/// # Safety
/// `id` must be a valid NUL-terminated C string.
#[no_mangle]
pub unsafe extern "C" fn vectordoc_frame_get_width(id: *const c_char) -> f64 {
    frame_numeric(id, FrameView::get_width)
}

/// # Safety
/// `id` must be a valid NUL-terminated C string.
#[no_mangle]
pub unsafe extern "C" fn vectordoc_frame_get_height(id: *const c_char) -> f64 {
    frame_numeric(id, FrameView::get_height)
}

unsafe fn frame_numeric(
    id: *const c_char,
    read: impl Fn(&FrameView, &vectordoc_core::Document) -> Option<f64>,
) -> f64 {
    let Some(id) = read_cstr(id).and_then(parse_id) else {
        return 0.0;
    };
    with_manager(0.0, |m| {
        m.frame(&id).and_then(|v| read(v, m.document())).unwrap_or(0.0)
    })
}

/// # Safety
/// `id` must be a valid NUL-terminated C string.
#[no_mangle]
pub unsafe extern "C" fn vectordoc_frame_set_position(id: *const c_char, x: f64, y: f64) {
    let Some(id) = read_cstr(id).and_then(parse_id) else {
        return;
    };
    with_manager((), |m| {
        if let Some(view) = m.frame(&id).cloned() {
            view.set_position(m.document_mut(), x, y);
        }
    });
}

/// # Safety
/// `id` must be a valid NUL-terminated C string.
#[no_mangle]
pub unsafe extern "C" fn vectordoc_frame_set_size(id: *const c_char, width: f64, height: f64) {
    let Some(id) = read_cstr(id).and_then(parse_id) else {
        return;
    };
    with_manager((), |m| {
        if let Some(view) = m.frame(&id).cloned() {
            view.set_size(m.document_mut(), width, height);
        }
    });
}

/// # Safety
/// `id` must be a valid NUL-terminated C string.
#[no_mangle]
pub unsafe extern "C" fn vectordoc_frame_delete(id: *const c_char) {
    let Some(id) = read_cstr(id).and_then(parse_id) else {
        return;
    };
    with_manager((), |m| m.delete_frame(&id));
}

/// Writes a comma-separated, NUL-terminated list of frame ids into `out_buf`,
/// truncating to `cap` bytes including the terminator.
///
/// # Safety
/// `out_buf` must point to at least `cap` writable bytes.
#[no_mangle]
pub unsafe extern "C" fn vectordoc_get_all_frames(out_buf: *mut c_char, cap: c_int) {
    with_manager((), |m| {
        let ids: Vec<Id> = m.all_frames().iter().map(|v| v.id.clone()).collect();
        write_csv(&ids, out_buf, cap);
    });
}

// ---- Rectangle ----

/// Creates a rectangle under the frame named by `frame_id`, or under the
/// document root when `frame_id` is null or unparseable.
///
/// # Safety
/// `frame_id` must be null or a valid NUL-terminated C string.
#[no_mangle]
pub unsafe extern "C" fn vectordoc_create_rectangle(
    frame_id: *const c_char,
    x: f64,
    y: f64,
    width: f64,
    height: f64,
) -> *mut c_char {
    let parent = read_cstr(frame_id).and_then(parse_id);
    with_manager(std::ptr::null_mut(), |m| {
        let id = m.create_rectangle(parent.as_ref(), x, y, width, height);
        leak_string(id.to_string())
    })
}

/// # Safety
/// `id` must be a valid NUL-terminated C string.
#[no_mangle]
pub unsafe extern "C" fn vectordoc_rectangle_get_x(id: *const c_char) -> f64 {
    rectangle_numeric(id, RectangleView::get_x)
}

/// # Safety
/// `id` must be a valid NUL-terminated C string.
#[no_mangle]
pub unsafe extern "C" fn vectordoc_rectangle_get_y(id: *const c_char) -> f64 {
    rectangle_numeric(id, RectangleView::get_y)
}

/// # Safety
/// `id` must be a valid NUL-terminated C string.
#[no_mangle]
pub unsafe extern "C" fn vectordoc_rectangle_get_width(id: *const c_char) -> f64 {
    rectangle_numeric(id, RectangleView::get_width)
}

/// # Safety
/// `id` must be a valid NUL-terminated C string.
#[no_mangle]
pub unsafe extern "C" fn vectordoc_rectangle_get_height(id: *const c_char) -> f64 {
    rectangle_numeric(id, RectangleView::get_height)
}

unsafe fn rectangle_numeric(
    id: *const c_char,
    read: impl Fn(&RectangleView, &vectordoc_core::Document) -> Option<f64>,
) -> f64 {
    let Some(id) = read_cstr(id).and_then(parse_id) else {
        return 0.0;
    };
    with_manager(0.0, |m| {
        m.rectangle(&id).and_then(|v| read(v, m.document())).unwrap_or(0.0)
    })
}

/// # Safety
/// `id` must be a valid NUL-terminated C string.
#[no_mangle]
pub unsafe extern "C" fn vectordoc_rectangle_set_position(id: *const c_char, x: f64, y: f64) {
    let Some(id) = read_cstr(id).and_then(parse_id) else {
        return;
    };
    with_manager((), |m| {
        if let Some(view) = m.rectangle(&id).cloned() {
            view.set_position(m.document_mut(), x, y);
        }
    });
}

/// # Safety
/// `id` must be a valid NUL-terminated C string.
#[no_mangle]
pub unsafe extern "C" fn vectordoc_rectangle_set_size(
    id: *const c_char,
    width: f64,
    height: f64,
) {
    let Some(id) = read_cstr(id).and_then(parse_id) else {
        return;
    };
    with_manager((), |m| {
        if let Some(view) = m.rectangle(&id).cloned() {
            view.set_size(m.document_mut(), width, height);
        }
    });
}

/// Returns a heap-allocated copy of the rectangle's `fill`, or null when the
/// id is unknown or the property was never set. Release with [`vectordoc_free_string`].
///
/// # Safety
/// `id` must be a valid NUL-terminated C string.
#[no_mangle]
pub unsafe extern "C" fn vectordoc_rectangle_get_fill(id: *const c_char) -> *mut c_char {
    let Some(id) = read_cstr(id).and_then(parse_id) else {
        return std::ptr::null_mut();
    };
    with_manager(std::ptr::null_mut(), |m| {
        m.rectangle(&id)
            .and_then(|v| v.get_fill(m.document()))
            .map(leak_string)
            .unwrap_or(std::ptr::null_mut())
    })
}

/// # Safety
/// `id` and `fill` must be valid NUL-terminated C strings.
#[no_mangle]
pub unsafe extern "C" fn vectordoc_rectangle_set_fill(id: *const c_char, fill: *const c_char) {
    let Some(id) = read_cstr(id).and_then(parse_id) else {
        return;
    };
    let fill = read_cstr(fill).unwrap_or("").to_string();
    with_manager((), |m| {
        if let Some(view) = m.rectangle(&id).cloned() {
            view.set_fill(m.document_mut(), fill);
        }
    });
}

/// # Safety
/// `id` must be a valid NUL-terminated C string.
#[no_mangle]
pub unsafe extern "C" fn vectordoc_rectangle_delete(id: *const c_char) {
    let Some(id) = read_cstr(id).and_then(parse_id) else {
        return;
    };
    with_manager((), |m| m.delete_rectangle(&id));
}

/// # Safety
/// `out_buf` must point to at least `cap` writable bytes.
#[no_mangle]
pub unsafe extern "C" fn vectordoc_get_all_rectangles(out_buf: *mut c_char, cap: c_int) {
    with_manager((), |m| {
        let ids: Vec<Id> = m.all_rectangles().iter().map(|v| v.id.clone()).collect();
        write_csv(&ids, out_buf, cap);
    });
}

// ---- Text box ----

/// # Safety
/// `frame_id` must be null or a valid NUL-terminated C string; `text` must be
/// a valid NUL-terminated C string or null (treated as empty).
#[no_mangle]
pub unsafe extern "C" fn vectordoc_create_textbox(
    frame_id: *const c_char,
    x: f64,
    y: f64,
    width: f64,
    height: f64,
    text: *const c_char,
) -> *mut c_char {
    let parent = read_cstr(frame_id).and_then(parse_id);
    let text = read_cstr(text).unwrap_or("").to_string();
    with_manager(std::ptr::null_mut(), |m| {
        let id = m.create_text_box(parent.as_ref(), x, y, width, height, text);
        leak_string(id.to_string())
    })
}

/// # Safety
/// `id` and `text` must be valid NUL-terminated C strings.
#[no_mangle]
pub unsafe extern "C" fn vectordoc_textbox_set_text(id: *const c_char, text: *const c_char) {
    let Some(id) = read_cstr(id).and_then(parse_id) else {
        return;
    };
    let text = read_cstr(text).unwrap_or("").to_string();
    with_manager((), |m| {
        if let Some(view) = m.text_box(&id).cloned() {
            view.set_text(m.document_mut(), text);
        }
    });
}

/// Returns a heap-allocated copy of the text box's `text`, or null when the
/// id is unknown. Release with [`vectordoc_free_string`].
///
/// # Safety
/// `id` must be a valid NUL-terminated C string.
#[no_mangle]
pub unsafe extern "C" fn vectordoc_textbox_get_text(id: *const c_char) -> *mut c_char {
    let Some(id) = read_cstr(id).and_then(parse_id) else {
        return std::ptr::null_mut();
    };
    with_manager(std::ptr::null_mut(), |m| {
        m.text_box(&id)
            .and_then(|v| v.get_text(m.document()))
            .map(leak_string)
            .unwrap_or(std::ptr::null_mut())
    })
}

unsafe fn textbox_numeric(
    id: *const c_char,
    read: impl Fn(&TextBoxView, &vectordoc_core::Document) -> Option<f64>,
) -> f64 {
    let Some(id) = read_cstr(id).and_then(parse_id) else {
        return 0.0;
    };
    with_manager(0.0, |m| {
        m.text_box(&id).and_then(|v| read(v, m.document())).unwrap_or(0.0)
    })
}

/// # Safety
/// `id` must be a valid NUL-terminated C string.
#[no_mangle]
pub unsafe extern "C" fn vectordoc_textbox_get_x(id: *const c_char) -> f64 {
    textbox_numeric(id, TextBoxView::get_x)
}

/// # Safety
/// `id` must be a valid NUL-terminated C string.
#[no_mangle]
pub unsafe extern "C" fn vectordoc_textbox_get_y(id: *const c_char) -> f64 {
    textbox_numeric(id, TextBoxView::get_y)
}

/// # Safety
/// `id` must be a valid NUL-terminated C string.
#[no_mangle]
pub unsafe extern "C" fn vectordoc_textbox_get_width(id: *const c_char) -> f64 {
    textbox_numeric(id, TextBoxView::get_width)
}

/// # Safety
/// `id` must be a valid NUL-terminated C string.
#[no_mangle]
pub unsafe extern "C" fn vectordoc_textbox_get_height(id: *const c_char) -> f64 {
    textbox_numeric(id, TextBoxView::get_height)
}

/// # Safety
/// `id` must be a valid NUL-terminated C string.
#[no_mangle]
pub unsafe extern "C" fn vectordoc_textbox_set_position(id: *const c_char, x: f64, y: f64) {
    let Some(id) = read_cstr(id).and_then(parse_id) else {
        return;
    };
    with_manager((), |m| {
        if let Some(view) = m.text_box(&id).cloned() {
            view.set_position(m.document_mut(), x, y);
        }
    });
}

/// # Safety
/// `id` must be a valid NUL-terminated C string.
#[no_mangle]
pub unsafe extern "C" fn vectordoc_textbox_set_size(
    id: *const c_char,
    width: f64,
    height: f64,
) {
    let Some(id) = read_cstr(id).and_then(parse_id) else {
        return;
    };
    with_manager((), |m| {
        if let Some(view) = m.text_box(&id).cloned() {
            view.set_size(m.document_mut(), width, height);
        }
    });
}

/// # Safety
/// `id` must be a valid NUL-terminated C string.
#[no_mangle]
pub unsafe extern "C" fn vectordoc_textbox_delete(id: *const c_char) {
    let Some(id) = read_cstr(id).and_then(parse_id) else {
        return;
    };
    with_manager((), |m| m.delete_text_box(&id));
}

/// # Safety
/// `out_buf` must point to at least `cap` writable bytes.
#[no_mangle]
pub unsafe extern "C" fn vectordoc_get_all_textboxes(out_buf: *mut c_char, cap: c_int) {
    with_manager((), |m| {
        let ids: Vec<Id> = m.all_text_boxes().iter().map(|v| v.id.clone()).collect();
        write_csv(&ids, out_buf, cap);
    });
}

// ---- Path (supplemental shape, not named by the binding surface above but
// exposed the same way for hosts that model free-form vector paths). ----

/// # Safety
/// `frame_id` must be null or a valid NUL-terminated C string.
#[no_mangle]
pub unsafe extern "C" fn vectordoc_create_path(frame_id: *const c_char) -> *mut c_char {
    let parent = read_cstr(frame_id).and_then(parse_id);
    with_manager(std::ptr::null_mut(), |m| {
        let id = m.create_path(parent.as_ref());
        leak_string(id.to_string())
    })
}

/// # Safety
/// `id` must be a valid NUL-terminated C string.
#[no_mangle]
pub unsafe extern "C" fn vectordoc_path_set_point(id: *const c_char, index: c_int, x: f64, y: f64) {
    if index < 0 {
        return;
    }
    let Some(id) = read_cstr(id).and_then(parse_id) else {
        return;
    };
    with_manager((), |m| {
        if let Some(view) = m.path(&id).cloned() {
            view.set_point(m.document_mut(), index as usize, x, y);
        }
    });
}

/// # Safety
/// `id` must be a valid NUL-terminated C string.
#[no_mangle]
pub unsafe extern "C" fn vectordoc_path_set_closed(id: *const c_char, closed: c_int) {
    let Some(id) = read_cstr(id).and_then(parse_id) else {
        return;
    };
    with_manager((), |m| {
        if let Some(view) = m.path(&id).cloned() {
            view.set_closed(m.document_mut(), closed != 0);
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::ffi::CString;

    fn reset() {
        vectordoc_manager_reset();
    }

    #[test]
    fn create_and_read_frame_round_trips_through_c_strings() {
        reset();
        let site = CString::new("A").unwrap();
        unsafe { vectordoc_manager_create(site.as_ptr()) };

        let id_ptr = vectordoc_create_frame(1.0, 2.0, 3.0, 4.0);
        assert!(!id_ptr.is_null());

        let x = unsafe { vectordoc_frame_get_x(id_ptr) };
        assert_eq!(x, 1.0);

        unsafe {
            vectordoc_frame_set_position(id_ptr, 9.0, 9.0);
            assert_eq!(vectordoc_frame_get_x(id_ptr), 9.0);
            vectordoc_free_string(id_ptr);
        }
    }

    #[test]
    fn no_manager_reads_as_zero_not_a_crash() {
        reset();
        let id = CString::new("A:1").unwrap();
        let x = unsafe { vectordoc_frame_get_x(id.as_ptr()) };
        assert_eq!(x, 0.0);
    }

    #[test]
    fn enumeration_truncates_to_buffer_and_nul_terminates() {
        reset();
        vectordoc_manager_default();
        unsafe {
            vectordoc_free_string(vectordoc_create_rectangle(
                std::ptr::null(),
                0.0,
                0.0,
                1.0,
                1.0,
            ));
            vectordoc_free_string(vectordoc_create_rectangle(
                std::ptr::null(),
                0.0,
                0.0,
                1.0,
                1.0,
            ));
        }
        let mut buf = [0 as c_char; 4];
        unsafe { vectordoc_get_all_rectangles(buf.as_mut_ptr(), buf.len() as c_int) };
        assert_eq!(*buf.last().unwrap(), 0);
    }

    #[test]
    fn rectangle_defaults_to_white_fill_over_ffi() {
        reset();
        vectordoc_manager_default();
        let id_ptr = unsafe { vectordoc_create_rectangle(std::ptr::null(), 0.0, 0.0, 1.0, 1.0) };
        let fill_ptr = unsafe { vectordoc_rectangle_get_fill(id_ptr) };
        assert!(!fill_ptr.is_null());
        let fill = unsafe { CStr::from_ptr(fill_ptr) }.to_str().unwrap();
        assert_eq!(fill, "#FFFFFF");
        unsafe {
            vectordoc_free_string(id_ptr);
            vectordoc_free_string(fill_ptr);
        }
    }

    #[test]
    fn malformed_id_is_a_silent_no_op_not_a_panic() {
        reset();
        vectordoc_manager_default();
        let bogus = CString::new("not-an-id").unwrap();
        unsafe {
            vectordoc_frame_set_position(bogus.as_ptr(), 1.0, 1.0);
        }
        assert_eq!(unsafe { vectordoc_frame_get_x(bogus.as_ptr()) }, 0.0);
    }
}
