mod app;
mod config;
mod debug_messenger;
mod device;
mod error;
mod instance;
mod system_info;
#[cfg(feature = "enable_tracing")]
mod tracing;
mod version;

pub use app::{App, VulkanContext, run};
pub use config::{
    ApplicationConfig, Config, DEFAULT_CONFIG_PATH, ValidationConfig, WindowConfig,
};
pub use debug_messenger::{
    DebugMessage, MessageSeverity, message_type_label, severity_label, severity_mask,
    vulkan_debug_callback,
};
pub use device::{
    Device, DeviceBuilder, PhysicalDevice, PhysicalDeviceSelector, PreferredDeviceType,
    QueueFamilyIndices, QueueType, Suitable,
};
pub use error::*;
pub use instance::{Instance, InstanceBuilder, WindowTraits};
pub use system_info::{DEBUG_UTILS_EXT_NAME, SystemInfo, VALIDATION_LAYER_NAME};
#[cfg(feature = "enable_tracing")]
pub use crate::tracing::vulkan_tracing_callback;
pub use version::{ParseVersionError, Version};
