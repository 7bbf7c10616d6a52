use crate::debug_messenger::{DebugMessage, message_type_label};
use ash::vk;
use ash::vk::DebugUtilsMessageSeverityFlagsEXT;
use std::ffi;

pub unsafe extern "system" fn vulkan_tracing_callback(
    message_severity: DebugUtilsMessageSeverityFlagsEXT,
    message_type: vk::DebugUtilsMessageTypeFlagsEXT,
    p_callback_data: *const vk::DebugUtilsMessengerCallbackDataEXT<'_>,
    _user_data: *mut ffi::c_void,
) -> vk::Bool32 {
    let DebugMessage {
        message_id_name,
        message_id_number,
        message,
        ..
    } = unsafe { DebugMessage::from_raw(message_severity, message_type, p_callback_data) };
    let kind = message_type_label(message_type);

    match message_severity {
        DebugUtilsMessageSeverityFlagsEXT::VERBOSE => {
            tracing::trace!("{kind} [{message_id_name} ({message_id_number})]: {message}");
        }
        DebugUtilsMessageSeverityFlagsEXT::INFO => {
            tracing::info!("{kind} [{message_id_name} ({message_id_number})]: {message}");
        }
        DebugUtilsMessageSeverityFlagsEXT::ERROR => {
            tracing::error!("{kind} [{message_id_name} ({message_id_number})]: {message}");
        }
        DebugUtilsMessageSeverityFlagsEXT::WARNING => {
            tracing::warn!("{kind} [{message_id_name} ({message_id_number})]: {message}");
        }
        _ => tracing::debug!("{kind} [{message_id_name} ({message_id_number})]: {message}"),
    }

    vk::FALSE
}
