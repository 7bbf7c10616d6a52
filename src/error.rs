use std::ffi::CString;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Instance error: {0}")]
    Instance(#[from] InstanceError),
    #[error("Physical device error: {0}")]
    PhysicalDevice(#[from] PhysicalDeviceError),
    #[error("Queue error: {0}")]
    Queue(#[from] QueueError),
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),
    #[error("Vulkan loading error: {0}")]
    AshLoading(#[from] ash::LoadingError),
    #[error("Vulkan error: {0}")]
    Vulkan(#[from] ash::vk::Result),
    #[error("Event loop error: {0}")]
    EventLoop(#[from] winit::error::EventLoopError),
    #[error("Window error: {0}")]
    Window(#[from] winit::error::OsError),
    #[error("Window handle error: {0}")]
    WindowHandle(#[from] raw_window_handle::HandleError),
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

#[derive(Debug, PartialOrd, PartialEq, Eq, Ord, Error)]
pub enum InstanceError {
    #[error("Vulkan unavailable")]
    VulkanUnavailable,
    #[error("Vulkan version {0} unavailable")]
    VulkanVersionUnavailable(String),
    #[error("Vulkan 1.1 unavailable")]
    VulkanVersion11Unavailable,
    #[error("Vulkan 1.2 unavailable")]
    VulkanVersion12Unavailable,
    #[error("Vulkan 1.3 unavailable")]
    VulkanVersion13Unavailable,
    #[error("Vulkan 1.4 unavailable")]
    VulkanVersion14Unavailable,
    #[error("Failed to create instance")]
    FailedCreateInstance,
    #[error("Failed to create debug messenger")]
    FailedCreateDebugMessenger,
    #[error("Failed to find requested layers: {0:#?}")]
    RequestedLayersNotPresent(Vec<CString>),
    #[error("Failed to find requested extensions: {0:#?}")]
    RequestedExtensionsNotPresent(Vec<CString>),
    #[error("Failed to find windowing extensions: {0:#?}")]
    WindowingExtensionsNotPresent(Vec<CString>),
}

#[derive(Debug, PartialOrd, PartialEq, Eq, Ord, Error)]
pub enum PhysicalDeviceError {
    #[error("Failed to enumerate physical devices")]
    FailedToEnumeratePhysicalDevices,
    #[error("No physical devices found")]
    NoPhysicalDevicesFound,
    #[error("No suitable device")]
    NoSuitableDevice,
}

#[derive(Debug, PartialOrd, PartialEq, Eq, Ord, Error)]
pub enum QueueError {
    #[error("Graphics unavailable")]
    GraphicsUnavailable,
    #[error("Compute unavailable")]
    ComputeUnavailable,
    #[error("Transfer unavailable")]
    TransferUnavailable,
    #[error("Invalid queue family index")]
    InvalidQueueFamilyIndex,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path:?}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to parse config file {path:?}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
    #[error("Name {0:?} contains an interior nul byte")]
    InvalidName(String),
}

pub type Result<T> = std::result::Result<T, Error>;
