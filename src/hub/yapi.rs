// Yocto Exporter - Sensor hub collection core
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! Native hub access through the vendor YAPI library
//!
//! Binds the C wrapper in `csrc/`, which the build script compiles against
//! the vendor headers (`YOCTO_API_DIR`) and links with the vendor library
//! (`YOCTO_LIB_DIR`). YAPI keeps its state in process-wide globals, so
//! at most one [`YapiHub`] may exist at a time.
//!
//! # Safety
//!
//! Sensor handles are raw pointers owned by YAPI. They stay valid until
//! `yocto_FreeAPI` is called, which only happens when the hub is dropped.

use super::native::{buffer_to_bytes, buffer_to_string, checked_value, BUFFER_SIZE};
use super::{SensorHandle, SensorHub};
use crate::error::{HubError, Result};
use std::ffi::{c_char, c_int, c_void, CString};
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{debug, info};

/// Set while a session is registered
static REGISTERED: AtomicBool = AtomicBool::new(false);

type RawSensor = *mut c_void;

#[allow(non_snake_case)]
mod sys {
    use std::ffi::{c_char, c_double, c_int, c_void};

    extern "C" {
        pub fn yocto_RegisterHub(url: *const c_char, err_msg: *mut c_char, err_size: c_int) -> c_int;
        pub fn yocto_AllSensorsInit();
        pub fn yocto_FreeAPI();
        pub fn yocto_UpdateCheck(err_msg: *mut c_char, err_size: c_int) -> c_int;
        pub fn yocto_FirstSensor() -> *mut c_void;
        pub fn yocto_NextSensor(sensor: *mut c_void) -> *mut c_void;
        pub fn yocto_GetFunctionId(sensor: *mut c_void, buffer: *mut c_char, size: c_int) -> c_int;
        pub fn yocto_GetUnit(sensor: *mut c_void, buffer: *mut c_char, size: c_int) -> c_int;
        pub fn yocto_GetHardwareId(sensor: *mut c_void, buffer: *mut c_char, size: c_int) -> c_int;
        pub fn yocto_GetCurrentValue(sensor: *mut c_void) -> c_double;
    }
}

/// Signature shared by the string getters of the wrapper
type StringGetter = unsafe extern "C" fn(*mut c_void, *mut c_char, c_int) -> c_int;

/// Registered YAPI session
///
/// Created with [`YapiHub::connect`]; the API is freed on drop.
#[derive(Debug)]
pub struct YapiHub {
    url: String,
}

impl YapiHub {
    /// Register the hub at `url` (`usb`, `host` or `host:port`)
    ///
    /// # Errors
    ///
    /// Returns [`HubError::Connect`] with the vendor diagnostic if
    /// registration fails or a session already exists.
    pub fn connect(url: &str) -> Result<Self> {
        let connect_err = |reason: String| HubError::Connect {
            url: url.to_string(),
            reason,
        };

        let c_url = CString::new(url).map_err(|e| connect_err(e.to_string()))?;

        if REGISTERED.swap(true, Ordering::SeqCst) {
            return Err(connect_err("a hub session is already registered".to_string()));
        }

        let mut err_buf = [0 as c_char; BUFFER_SIZE];
        // SAFETY: both pointers are valid for the duration of the call and the
        // wrapper writes at most BUFFER_SIZE bytes including the terminator.
        let res = unsafe {
            sys::yocto_RegisterHub(c_url.as_ptr(), err_buf.as_mut_ptr(), BUFFER_SIZE as c_int)
        };
        if res != 0 {
            REGISTERED.store(false, Ordering::SeqCst);
            return Err(connect_err(buffer_to_string(&err_buf)));
        }

        // SAFETY: registration succeeded.
        unsafe { sys::yocto_AllSensorsInit() };
        info!("YAPI session opened for {}", url);

        Ok(Self {
            url: url.to_string(),
        })
    }

    fn read_string(&self, handle: SensorHandle, getter: StringGetter, attribute: &'static str) -> Result<Vec<u8>> {
        let sensor = to_raw(handle)?;
        let mut buf = [0 as c_char; BUFFER_SIZE];
        // SAFETY: `sensor` came from YAPI during this session and `buf` holds
        // BUFFER_SIZE bytes.
        let res = unsafe { getter(sensor, buf.as_mut_ptr(), BUFFER_SIZE as c_int) };
        if res != 0 {
            return Err(HubError::read(attribute, format!("wrapper returned {}", res)));
        }
        Ok(buffer_to_bytes(&buf))
    }
}

fn to_raw(handle: SensorHandle) -> Result<RawSensor> {
    if handle.raw() == 0 {
        return Err(HubError::StaleHandle(0));
    }
    Ok(handle.raw() as RawSensor)
}

fn from_raw(sensor: RawSensor) -> Option<SensorHandle> {
    if sensor.is_null() {
        None
    } else {
        Some(SensorHandle::new(sensor as usize))
    }
}

fn into_utf8(attribute: &'static str, bytes: Vec<u8>) -> Result<String> {
    String::from_utf8(bytes).map_err(|e| HubError::read(attribute, e.to_string()))
}

impl SensorHub for YapiHub {
    fn refresh(&mut self) -> Result<()> {
        let mut err_buf = [0 as c_char; BUFFER_SIZE];
        // SAFETY: the buffer outlives the call and its size is passed along.
        let res = unsafe { sys::yocto_UpdateCheck(err_buf.as_mut_ptr(), BUFFER_SIZE as c_int) };
        if res != 0 {
            return Err(HubError::Refresh(buffer_to_string(&err_buf)));
        }
        Ok(())
    }

    fn first_sensor(&mut self) -> Option<SensorHandle> {
        // SAFETY: the session is registered for the lifetime of `self`.
        from_raw(unsafe { sys::yocto_FirstSensor() })
    }

    fn next_sensor(&mut self, handle: SensorHandle) -> Option<SensorHandle> {
        let sensor = to_raw(handle).ok()?;
        // SAFETY: `sensor` was produced by YAPI during this session.
        from_raw(unsafe { sys::yocto_NextSensor(sensor) })
    }

    fn function_id(&mut self, handle: SensorHandle) -> Result<String> {
        let bytes = self.read_string(handle, sys::yocto_GetFunctionId, "function id")?;
        into_utf8("function id", bytes)
    }

    fn hardware_id(&mut self, handle: SensorHandle) -> Result<String> {
        let bytes = self.read_string(handle, sys::yocto_GetHardwareId, "hardware id")?;
        into_utf8("hardware id", bytes)
    }

    fn unit(&mut self, handle: SensorHandle) -> Result<Vec<u8>> {
        self.read_string(handle, sys::yocto_GetUnit, "unit")
    }

    fn current_value(&mut self, handle: SensorHandle) -> Result<f64> {
        let sensor = to_raw(handle)?;
        // SAFETY: `sensor` was produced by YAPI during this session.
        checked_value(unsafe { sys::yocto_GetCurrentValue(sensor) })
    }
}

impl Drop for YapiHub {
    fn drop(&mut self) {
        // SAFETY: no handle outlives the session; the collector drops all of
        // them before the hub.
        unsafe { sys::yocto_FreeAPI() };
        REGISTERED.store(false, Ordering::SeqCst);
        debug!("YAPI session for {} released", self.url);
    }
}
