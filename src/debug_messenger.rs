use ash::vk;
use serde::Deserialize;
use std::borrow::Cow;
use std::ffi::{self, CStr};

/// Severity selector as it appears in configuration files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageSeverity {
    Verbose,
    Info,
    Warning,
    Error,
}

impl From<MessageSeverity> for vk::DebugUtilsMessageSeverityFlagsEXT {
    fn from(severity: MessageSeverity) -> Self {
        match severity {
            MessageSeverity::Verbose => vk::DebugUtilsMessageSeverityFlagsEXT::VERBOSE,
            MessageSeverity::Info => vk::DebugUtilsMessageSeverityFlagsEXT::INFO,
            MessageSeverity::Warning => vk::DebugUtilsMessageSeverityFlagsEXT::WARNING,
            MessageSeverity::Error => vk::DebugUtilsMessageSeverityFlagsEXT::ERROR,
        }
    }
}

pub fn severity_mask<I: IntoIterator<Item = MessageSeverity>>(
    severities: I,
) -> vk::DebugUtilsMessageSeverityFlagsEXT {
    severities
        .into_iter()
        .fold(vk::DebugUtilsMessageSeverityFlagsEXT::empty(), |mask, s| {
            mask | s.into()
        })
}

pub fn severity_label(severity: vk::DebugUtilsMessageSeverityFlagsEXT) -> &'static str {
    match severity {
        vk::DebugUtilsMessageSeverityFlagsEXT::ERROR => "ERROR",
        vk::DebugUtilsMessageSeverityFlagsEXT::WARNING => "WARNING",
        vk::DebugUtilsMessageSeverityFlagsEXT::INFO => "INFO",
        vk::DebugUtilsMessageSeverityFlagsEXT::VERBOSE => "VERBOSE",
        _ => "",
    }
}

pub fn message_type_label(message_type: vk::DebugUtilsMessageTypeFlagsEXT) -> &'static str {
    match message_type {
        vk::DebugUtilsMessageTypeFlagsEXT::GENERAL => "GENERAL",
        vk::DebugUtilsMessageTypeFlagsEXT::VALIDATION => "VALIDATION",
        vk::DebugUtilsMessageTypeFlagsEXT::PERFORMANCE => "PERFORMANCE",
        vk::DebugUtilsMessageTypeFlagsEXT::DEVICE_ADDRESS_BINDING => "DEVICE_ADDRESS_BINDING",
        _ => "",
    }
}

/// Owned copy of the strings carried by one callback invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DebugMessage {
    pub severity: vk::DebugUtilsMessageSeverityFlagsEXT,
    pub message_type: vk::DebugUtilsMessageTypeFlagsEXT,
    pub message_id_name: String,
    pub message_id_number: i32,
    pub message: String,
}

impl DebugMessage {
    /// # Safety
    /// `p_callback_data` must be null or point to callback data whose string
    /// pointers are null or nul-terminated for the duration of the call.
    pub unsafe fn from_raw(
        severity: vk::DebugUtilsMessageSeverityFlagsEXT,
        message_type: vk::DebugUtilsMessageTypeFlagsEXT,
        p_callback_data: *const vk::DebugUtilsMessengerCallbackDataEXT<'_>,
    ) -> Self {
        let (message_id_name, message_id_number, message) = match unsafe { p_callback_data.as_ref() }
        {
            Some(callback_data) => unsafe {
                (
                    lossy(callback_data.p_message_id_name),
                    callback_data.message_id_number,
                    lossy(callback_data.p_message),
                )
            },
            None => (Cow::from(""), 0, Cow::from("")),
        };

        Self {
            severity,
            message_type,
            message_id_name: message_id_name.into_owned(),
            message_id_number,
            message: message.into_owned(),
        }
    }
}

impl std::fmt::Display for DebugMessage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}, {}: [{} ({})] {}",
            severity_label(self.severity),
            message_type_label(self.message_type),
            self.message_id_name,
            self.message_id_number,
            self.message
        )
    }
}

unsafe fn lossy<'a>(ptr: *const ffi::c_char) -> Cow<'a, str> {
    if ptr.is_null() {
        Cow::from("")
    } else {
        unsafe { CStr::from_ptr(ptr) }.to_string_lossy()
    }
}

/// Prints every validation message to stdout.
pub unsafe extern "system" fn vulkan_debug_callback(
    message_severity: vk::DebugUtilsMessageSeverityFlagsEXT,
    message_type: vk::DebugUtilsMessageTypeFlagsEXT,
    p_callback_data: *const vk::DebugUtilsMessengerCallbackDataEXT<'_>,
    _user_data: *mut ffi::c_void,
) -> vk::Bool32 {
    let message = unsafe { DebugMessage::from_raw(message_severity, message_type, p_callback_data) };
    println!("{message}");

    vk::FALSE
}
