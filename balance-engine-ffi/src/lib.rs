//! FFI bindings for Stereo Balance.
//!
//! This crate provides C ABI functions for use from C# via P/Invoke.
//! All functions use panic::catch_unwind to prevent Rust panics from
//! unwinding across the FFI boundary.

use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::ffi::{c_char, c_void, CStr, CString};
use std::panic::{self, AssertUnwindSafe};
use std::ptr;
use stereo_balance::{BalanceCodec, BalanceError, ChannelMap, DeviceRole};

// ============================================================================
// Error Handling
// ============================================================================

/// Error codes returned by FFI functions.
#[repr(i32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    Success = 0,
    InvalidHandle = -1,
    InvalidArgument = -2,
    DeviceNotFound = -3,
    ComError = -4,
    JsonError = -5,
    VolumeNotAvailable = -6,
    NullInput = -7,
    UnsupportedChannelLayout = -8,
    NoDefaultDevice = -9,
    PlatformUnsupported = -10,
    Panic = -99,
}

impl From<&BalanceError> for ErrorCode {
    fn from(err: &BalanceError) -> Self {
        match err {
            BalanceError::NullInput => ErrorCode::NullInput,
            BalanceError::UnsupportedChannelLayout { .. } => ErrorCode::UnsupportedChannelLayout,
            BalanceError::NoDefaultDevice => ErrorCode::NoDefaultDevice,
            BalanceError::DeviceNotFound { .. } => ErrorCode::DeviceNotFound,
            BalanceError::VolumeNotAvailable => ErrorCode::VolumeNotAvailable,
            BalanceError::StringConversion(_) => ErrorCode::InvalidArgument,
            BalanceError::PlatformUnsupported => ErrorCode::PlatformUnsupported,
            #[allow(unreachable_patterns)]
            _ => ErrorCode::ComError,
        }
    }
}

/// Thread-local storage for the last error.
thread_local! {
    static LAST_ERROR: RefCell<Option<(ErrorCode, String)>> = const { RefCell::new(None) };
}

fn set_last_error(code: ErrorCode, message: impl Into<String>) {
    let message = message.into();
    tracing::warn!(?code, %message, "balance engine call failed");
    LAST_ERROR.with(|e| {
        *e.borrow_mut() = Some((code, message));
    });
}

fn clear_last_error() {
    LAST_ERROR.with(|e| {
        *e.borrow_mut() = None;
    });
}

/// Record a library error and return its code.
fn report(err: &BalanceError) -> i32 {
    let code = ErrorCode::from(err);
    set_last_error(code, err.to_string());
    code as i32
}

// ============================================================================
// Data Types for JSON Serialization
// ============================================================================

/// Configuration for engine creation.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct EngineConfig {
    /// tracing filter directive, e.g. "debug" or "stereo_balance=trace"
    #[serde(default)]
    pub log_level: Option<String>,

    /// 0 = Console, 1 = Multimedia (default), 2 = Communications
    #[serde(default)]
    pub role: Option<u32>,

    #[serde(default)]
    pub left_channel: Option<u32>,

    #[serde(default)]
    pub right_channel: Option<u32>,
}

impl EngineConfig {
    fn parse(json: &str) -> Self {
        serde_json::from_str(json).unwrap_or_else(|e| {
            tracing::warn!(error = %e, "invalid engine config, using defaults");
            EngineConfig::default()
        })
    }

    fn role(&self) -> DeviceRole {
        self.role
            .and_then(DeviceRole::from_u32)
            .unwrap_or_default()
    }

    fn channel_map(&self) -> ChannelMap {
        let default = ChannelMap::default();
        ChannelMap::new(
            self.left_channel.unwrap_or(default.left()),
            self.right_channel.unwrap_or(default.right()),
        )
        .unwrap_or_else(|| {
            tracing::warn!("left and right channel are identical, using stereo default");
            default
        })
    }
}

/// State of an endpoint as seen by the balance engine.
#[derive(Debug, Serialize, Deserialize)]
pub struct EndpointDto {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub channel_count: u32,
    pub master_volume: f32,
    pub balance: f32,
}

/// Response containing the default endpoint.
#[derive(Debug, Serialize, Deserialize)]
pub struct EndpointResponse {
    pub device: EndpointDto,
}

// ============================================================================
// Engine Handle Type
// ============================================================================

/// Opaque handle to the balance engine. Actually points to a BalanceEngine struct.
pub type BalanceEngineHandle = *mut c_void;

/// Internal engine state.
struct BalanceEngine {
    // COM objects are created per call; only configuration is kept.
    role: DeviceRole,
    codec: BalanceCodec,
}

impl BalanceEngine {
    fn new(config: &EngineConfig) -> Self {
        Self {
            role: config.role(),
            codec: BalanceCodec::new(config.channel_map()),
        }
    }
}

// ============================================================================
// Helper Functions
// ============================================================================

/// Allocate a C string from a Rust string. Caller must free with balance_engine_free_string.
fn alloc_c_string(s: &str) -> *mut c_char {
    // A string with an interior null byte is replaced by an empty one.
    CString::new(s).unwrap_or_default().into_raw()
}

/// Parse a C string to a Rust string slice.
unsafe fn parse_c_str<'a>(ptr: *const c_char) -> Option<&'a str> {
    if ptr.is_null() {
        return None;
    }
    CStr::from_ptr(ptr).to_str().ok()
}

/// Borrow the engine behind a handle.
unsafe fn engine_ref<'a>(handle: BalanceEngineHandle) -> Option<&'a BalanceEngine> {
    (handle as *const BalanceEngine).as_ref()
}

fn init_logging(filter: &str) {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new(filter))
        .try_init();
}

#[cfg(windows)]
mod platform {
    use super::BalanceEngine;
    use stereo_balance::{
        BalanceError, ChannelVolume, DefaultDevice, DeviceEnumerator, Endpoint,
        MasterRelativeVolume, RenderEndpoint, VolumeControl,
    };
    use windows::Win32::System::Com::{CoInitializeEx, CoUninitialize, COINIT_APARTMENTTHREADED};

    /// Execute a closure with COM initialized for the current thread.
    fn with_com<T, F: FnOnce() -> Result<T, BalanceError>>(f: F) -> Result<T, BalanceError> {
        unsafe {
            CoInitializeEx(None, COINIT_APARTMENTTHREADED)
                .ok()
                .map_err(BalanceError::ComInitFailed)?;
        }

        let result = f();

        unsafe {
            CoUninitialize();
        }

        result
    }

    fn with_endpoint<T>(
        engine: &BalanceEngine,
        device_id: Option<&str>,
        f: impl FnOnce(&RenderEndpoint) -> Result<T, BalanceError>,
    ) -> Result<T, BalanceError> {
        with_com(|| {
            let enumerator = DeviceEnumerator::new()?;
            match device_id {
                Some(id) => f(&enumerator.get_device(id)?),
                None => {
                    let device = DefaultDevice::with_role(enumerator, engine.role);
                    f(device.handle()?)
                }
            }
        })
    }

    pub fn get_balance(engine: &BalanceEngine, device_id: Option<&str>) -> Result<f32, BalanceError> {
        with_endpoint(engine, device_id, |endpoint| {
            let volume = endpoint.volume_control()?;
            engine
                .codec
                .get_balance(Some(VolumeControl::MasterRelative(&volume)))
        })
    }

    pub fn set_balance(
        engine: &BalanceEngine,
        device_id: Option<&str>,
        balance: f32,
    ) -> Result<(), BalanceError> {
        with_endpoint(engine, device_id, |endpoint| {
            let volume = endpoint.volume_control()?;
            engine
                .codec
                .set_balance(Some(VolumeControl::MasterRelative(&volume)), balance)
        })
    }

    pub fn describe_default(engine: &BalanceEngine) -> Result<super::EndpointDto, BalanceError> {
        with_endpoint(engine, None, |endpoint| {
            let volume = endpoint.volume_control()?;
            let balance = engine
                .codec
                .get_balance(Some(VolumeControl::MasterRelative(&volume)))?;
            Ok(super::EndpointDto {
                id: endpoint.id()?,
                name: endpoint.name(),
                channel_count: volume.channel_count()?,
                master_volume: volume.master_volume()?,
                balance,
            })
        })
    }
}

#[cfg(not(windows))]
mod platform {
    use super::BalanceEngine;
    use stereo_balance::BalanceError;

    pub fn get_balance(_engine: &BalanceEngine, _device_id: Option<&str>) -> Result<f32, BalanceError> {
        Err(BalanceError::PlatformUnsupported)
    }

    pub fn set_balance(
        _engine: &BalanceEngine,
        _device_id: Option<&str>,
        _balance: f32,
    ) -> Result<(), BalanceError> {
        Err(BalanceError::PlatformUnsupported)
    }

    pub fn describe_default(_engine: &BalanceEngine) -> Result<super::EndpointDto, BalanceError> {
        Err(BalanceError::PlatformUnsupported)
    }
}

/// Shared body of the get-balance entry points.
fn get_balance_into(
    handle: BalanceEngineHandle,
    device_id: Option<*const c_char>,
    out_balance: *mut f32,
    context: &str,
) -> i32 {
    clear_last_error();

    let result = panic::catch_unwind(AssertUnwindSafe(|| {
        let Some(engine) = (unsafe { engine_ref(handle) }) else {
            set_last_error(ErrorCode::InvalidHandle, "Invalid engine handle");
            return ErrorCode::InvalidHandle as i32;
        };
        if out_balance.is_null() {
            set_last_error(ErrorCode::InvalidArgument, "Output pointer is null");
            return ErrorCode::InvalidArgument as i32;
        }
        let device_id = match device_id {
            Some(raw) => match unsafe { parse_c_str(raw) } {
                Some(s) => Some(s),
                None => {
                    set_last_error(ErrorCode::InvalidArgument, "Invalid device ID");
                    return ErrorCode::InvalidArgument as i32;
                }
            },
            None => None,
        };

        match platform::get_balance(engine, device_id) {
            Ok(balance) => {
                unsafe { *out_balance = balance };
                ErrorCode::Success as i32
            }
            Err(e) => report(&e),
        }
    }));

    result.unwrap_or_else(|_| {
        set_last_error(ErrorCode::Panic, format!("Panic during {context}"));
        ErrorCode::Panic as i32
    })
}

/// Shared body of the set-balance entry points.
fn set_balance_from(
    handle: BalanceEngineHandle,
    device_id: Option<*const c_char>,
    balance: f32,
    context: &str,
) -> i32 {
    clear_last_error();

    let result = panic::catch_unwind(AssertUnwindSafe(|| {
        let Some(engine) = (unsafe { engine_ref(handle) }) else {
            set_last_error(ErrorCode::InvalidHandle, "Invalid engine handle");
            return ErrorCode::InvalidHandle as i32;
        };
        let device_id = match device_id {
            Some(raw) => match unsafe { parse_c_str(raw) } {
                Some(s) => Some(s),
                None => {
                    set_last_error(ErrorCode::InvalidArgument, "Invalid device ID");
                    return ErrorCode::InvalidArgument as i32;
                }
            },
            None => None,
        };

        match platform::set_balance(engine, device_id, balance) {
            Ok(()) => ErrorCode::Success as i32,
            Err(e) => report(&e),
        }
    }));

    result.unwrap_or_else(|_| {
        set_last_error(ErrorCode::Panic, format!("Panic during {context}"));
        ErrorCode::Panic as i32
    })
}

// ============================================================================
// FFI Functions - Lifecycle
// ============================================================================

/// Create a new balance engine instance.
///
/// # Arguments
/// * `config_json` - JSON configuration string (can be null for defaults)
///
/// # Returns
/// Handle to the engine, or null on failure. Check balance_engine_last_error_code() on failure.
///
/// # Safety
/// The returned handle must be freed with balance_engine_destroy().
#[no_mangle]
pub extern "C" fn balance_engine_create(config_json: *const c_char) -> BalanceEngineHandle {
    clear_last_error();

    let result = panic::catch_unwind(|| {
        let config = unsafe { parse_c_str(config_json) }
            .map(EngineConfig::parse)
            .unwrap_or_default();

        if let Some(filter) = config.log_level.as_deref() {
            init_logging(filter);
        }

        let engine = Box::new(BalanceEngine::new(&config));
        tracing::debug!(role = ?engine.role, channels = ?engine.codec.channel_map(), "balance engine created");
        Box::into_raw(engine) as BalanceEngineHandle
    });

    match result {
        Ok(handle) => handle,
        Err(_) => {
            set_last_error(ErrorCode::Panic, "Panic during engine creation");
            ptr::null_mut()
        }
    }
}

/// Destroy a balance engine instance.
///
/// # Safety
/// The handle must have been created by balance_engine_create() and must not be used after this call.
#[no_mangle]
pub extern "C" fn balance_engine_destroy(handle: BalanceEngineHandle) {
    if handle.is_null() {
        return;
    }

    let _ = panic::catch_unwind(|| unsafe {
        let _ = Box::from_raw(handle as *mut BalanceEngine);
    });
}

// ============================================================================
// FFI Functions - Balance Operations
// ============================================================================

/// Get the balance of the default render endpoint.
///
/// # Arguments
/// * `handle` - Engine handle
/// * `out_balance` - Receives the balance (-1 left .. 1 right)
///
/// # Returns
/// 0 on success, negative error code on failure.
#[no_mangle]
pub extern "C" fn balance_engine_get_balance(
    handle: BalanceEngineHandle,
    out_balance: *mut f32,
) -> i32 {
    get_balance_into(handle, None, out_balance, "get balance")
}

/// Set the balance of the default render endpoint.
///
/// # Arguments
/// * `handle` - Engine handle
/// * `balance` - Balance (-1 left .. 1 right); out-of-range values are clamped
///
/// # Returns
/// 0 on success, negative error code on failure.
#[no_mangle]
pub extern "C" fn balance_engine_set_balance(handle: BalanceEngineHandle, balance: f32) -> i32 {
    set_balance_from(handle, None, balance, "set balance")
}

/// Get the balance of a specific endpoint.
///
/// # Arguments
/// * `handle` - Engine handle
/// * `device_id` - The device ID (UTF-8 string)
/// * `out_balance` - Receives the balance
///
/// # Returns
/// 0 on success, negative error code on failure.
#[no_mangle]
pub extern "C" fn balance_engine_get_device_balance(
    handle: BalanceEngineHandle,
    device_id: *const c_char,
    out_balance: *mut f32,
) -> i32 {
    get_balance_into(handle, Some(device_id), out_balance, "get device balance")
}

/// Set the balance of a specific endpoint.
///
/// # Arguments
/// * `handle` - Engine handle
/// * `device_id` - The device ID (UTF-8 string)
/// * `balance` - Balance (-1 left .. 1 right)
///
/// # Returns
/// 0 on success, negative error code on failure.
#[no_mangle]
pub extern "C" fn balance_engine_set_device_balance(
    handle: BalanceEngineHandle,
    device_id: *const c_char,
    balance: f32,
) -> i32 {
    set_balance_from(handle, Some(device_id), balance, "set device balance")
}

/// Describe the default render endpoint.
///
/// # Returns
/// JSON string with id, name, channel count, master volume and balance.
/// Caller must free with balance_engine_free_string(). Returns null on failure.
#[no_mangle]
pub extern "C" fn balance_engine_get_default_device(handle: BalanceEngineHandle) -> *mut c_char {
    clear_last_error();

    let result = panic::catch_unwind(AssertUnwindSafe(|| {
        let Some(engine) = (unsafe { engine_ref(handle) }) else {
            set_last_error(ErrorCode::InvalidHandle, "Invalid engine handle");
            return ptr::null_mut();
        };

        let device = match platform::describe_default(engine) {
            Ok(device) => device,
            Err(e) => {
                report(&e);
                return ptr::null_mut();
            }
        };

        match serde_json::to_string(&EndpointResponse { device }) {
            Ok(json) => alloc_c_string(&json),
            Err(e) => {
                set_last_error(ErrorCode::JsonError, e.to_string());
                ptr::null_mut()
            }
        }
    }));

    result.unwrap_or_else(|_| {
        set_last_error(ErrorCode::Panic, "Panic during default device query");
        ptr::null_mut()
    })
}

// ============================================================================
// FFI Functions - Memory Management
// ============================================================================

/// Free a string allocated by this library.
///
/// # Safety
/// The pointer must have been returned by one of the balance_engine_* functions.
/// Do not call this on strings from other sources.
#[no_mangle]
pub extern "C" fn balance_engine_free_string(ptr: *mut c_char) {
    if ptr.is_null() {
        return;
    }

    let _ = panic::catch_unwind(|| unsafe {
        let _ = CString::from_raw(ptr);
    });
}

// ============================================================================
// FFI Functions - Error Handling
// ============================================================================

/// Get the last error code.
///
/// # Returns
/// The error code from the last failed operation, or 0 if no error.
#[no_mangle]
pub extern "C" fn balance_engine_last_error_code() -> i32 {
    LAST_ERROR.with(|e| {
        e.borrow()
            .as_ref()
            .map(|(code, _)| *code as i32)
            .unwrap_or(0)
    })
}

/// Get the last error message.
///
/// # Returns
/// Error message string. Caller must free with balance_engine_free_string().
/// Returns null if no error.
#[no_mangle]
pub extern "C" fn balance_engine_last_error_message() -> *mut c_char {
    LAST_ERROR.with(|e| {
        e.borrow()
            .as_ref()
            .map(|(_, msg)| alloc_c_string(msg))
            .unwrap_or(ptr::null_mut())
    })
}

// ============================================================================
// FFI Functions - Utility
// ============================================================================

/// Get the library version.
///
/// # Returns
/// Version string. Caller must free with balance_engine_free_string().
#[no_mangle]
pub extern "C" fn balance_engine_version() -> *mut c_char {
    alloc_c_string(env!("CARGO_PKG_VERSION"))
}

// ============================================================================
// Tests
// ============================================================================
