use crate::Version;
use crate::debug_messenger::vulkan_debug_callback;
use crate::system_info::{
    DEBUG_UTILS_EXT_NAME, PORTABILITY_ENUMERATION_EXT_NAME, SystemInfo, VALIDATION_LAYER_NAME,
};
use crate::{ConfigError, InstanceError};
use ash::{Entry, vk};
use raw_window_handle::{HasDisplayHandle, HasWindowHandle};
use std::ffi::{CStr, CString, c_char};
use std::fmt::{Debug, Formatter};
use std::sync::Arc;

pub trait WindowTraits: HasDisplayHandle + HasWindowHandle + Debug {}
impl<T> WindowTraits for T where T: HasDisplayHandle + HasWindowHandle + Debug {}

/// Removes repeated names while keeping the first occurrence in place.
pub(crate) fn dedup_names(names: &mut Vec<CString>) {
    let mut seen = Vec::with_capacity(names.len());
    names.retain(|name| {
        if seen.contains(name) {
            false
        } else {
            seen.push(name.clone());
            true
        }
    });
}

/// The API version to request given what the loader reports.
pub(crate) fn resolve_api_version(
    instance_version: Version,
    required: Version,
    minimum: Version,
) -> Result<Version, InstanceError> {
    let wanted = required.max(minimum);
    if instance_version >= wanted {
        return Ok(wanted);
    }

    Err(match (wanted.major, wanted.minor) {
        (1, 1) => InstanceError::VulkanVersion11Unavailable,
        (1, 2) => InstanceError::VulkanVersion12Unavailable,
        (1, 3) => InstanceError::VulkanVersion13Unavailable,
        (1, 4) => InstanceError::VulkanVersion14Unavailable,
        (major, minor) => InstanceError::VulkanVersionUnavailable(format!("{major}.{minor}")),
    })
}

#[derive(Debug)]
pub struct InstanceBuilder {
    // VkApplicationInfo
    app_name: String,
    engine_name: String,
    application_version: Version,
    engine_version: Version,
    minimum_instance_version: Version,
    required_instance_version: Version,

    // VkInstanceCreateInfo
    layers: Vec<CString>,
    extensions: Vec<CString>,
    flags: vk::InstanceCreateFlags,

    // debug callback
    debug_callback: vk::PFN_vkDebugUtilsMessengerCallbackEXT,
    debug_message_severity: vk::DebugUtilsMessageSeverityFlagsEXT,
    debug_message_type: vk::DebugUtilsMessageTypeFlagsEXT,

    request_validation_layers: bool,
    enable_validation_layers: bool,
    use_debug_messenger: bool,
    headless_context: bool,

    window: Option<Arc<dyn WindowTraits>>,
}

impl InstanceBuilder {
    pub fn new(window: Option<Arc<dyn WindowTraits>>) -> Self {
        Self {
            app_name: "".to_string(),
            engine_name: "".to_string(),
            application_version: Version::new(0, 0, 0),
            engine_version: Version::new(0, 0, 0),
            minimum_instance_version: Version::V1_0_0,
            required_instance_version: Version::V1_0_0,
            layers: vec![],
            extensions: vec![],
            flags: Default::default(),
            debug_callback: None,
            debug_message_severity: vk::DebugUtilsMessageSeverityFlagsEXT::WARNING
                | vk::DebugUtilsMessageSeverityFlagsEXT::ERROR,
            debug_message_type: vk::DebugUtilsMessageTypeFlagsEXT::GENERAL
                | vk::DebugUtilsMessageTypeFlagsEXT::VALIDATION
                | vk::DebugUtilsMessageTypeFlagsEXT::PERFORMANCE,
            request_validation_layers: false,
            enable_validation_layers: false,
            use_debug_messenger: false,
            headless_context: false,
            window,
        }
    }

    pub fn app_name(mut self, app_name: impl Into<String>) -> Self {
        self.app_name = app_name.into();
        self
    }

    pub fn engine_name(mut self, engine_name: impl Into<String>) -> Self {
        self.engine_name = engine_name.into();
        self
    }

    pub fn app_version(mut self, version: Version) -> Self {
        self.application_version = version;
        self
    }

    pub fn engine_version(mut self, version: Version) -> Self {
        self.engine_version = version;
        self
    }

    pub fn require_api_version(mut self, version: Version) -> Self {
        self.required_instance_version = version;
        self
    }

    pub fn minimum_instance_version(mut self, version: Version) -> Self {
        self.minimum_instance_version = version;
        self
    }

    pub fn enable_layer(mut self, layer: &CStr) -> Self {
        self.layers.push(layer.to_owned());
        self
    }

    pub fn enable_extension(mut self, extension: &CStr) -> Self {
        self.extensions.push(extension.to_owned());
        self
    }

    pub fn flags(mut self, flags: vk::InstanceCreateFlags) -> Self {
        self.flags = flags;
        self
    }

    /// Fails the build when the Khronos validation layer is missing.
    pub fn enable_validation_layers(mut self, enable: bool) -> Self {
        self.enable_validation_layers = enable;
        self
    }

    /// Uses the Khronos validation layer only if the system has it.
    pub fn request_validation_layers(mut self, request: bool) -> Self {
        self.request_validation_layers = request;
        self
    }

    pub fn use_default_debug_messenger(mut self) -> Self {
        self.use_debug_messenger = true;
        self.debug_callback = Some(vulkan_debug_callback);
        self
    }

    #[cfg(feature = "enable_tracing")]
    pub fn use_default_tracing_messenger(mut self) -> Self {
        self.use_debug_messenger = true;
        self.debug_callback = Some(crate::tracing::vulkan_tracing_callback);
        self
    }

    pub fn set_debug_messenger(
        mut self,
        callback: vk::PFN_vkDebugUtilsMessengerCallbackEXT,
    ) -> Self {
        self.use_debug_messenger = true;
        self.debug_callback = callback;
        self
    }

    pub fn headless(mut self, headless: bool) -> Self {
        self.headless_context = headless;
        self
    }

    pub fn debug_messenger_severity(
        mut self,
        severity: vk::DebugUtilsMessageSeverityFlagsEXT,
    ) -> Self {
        self.debug_message_severity = severity;
        self
    }

    pub fn add_debug_messenger_severity(
        mut self,
        severity: vk::DebugUtilsMessageSeverityFlagsEXT,
    ) -> Self {
        self.debug_message_severity |= severity;
        self
    }

    pub fn debug_messenger_type(mut self, message_type: vk::DebugUtilsMessageTypeFlagsEXT) -> Self {
        self.debug_message_type = message_type;
        self
    }

    pub fn add_debug_messenger_type(
        mut self,
        message_type: vk::DebugUtilsMessageTypeFlagsEXT,
    ) -> Self {
        self.debug_message_type |= message_type;
        self
    }

    fn wants_debug_messenger(&self) -> bool {
        self.use_debug_messenger && self.debug_callback.is_some()
    }

    fn surface_extensions(&self) -> crate::Result<Vec<CString>> {
        let Some(window) = self.window.as_ref().filter(|_| !self.headless_context) else {
            return Ok(vec![]);
        };

        let display_handle = window.display_handle()?.as_raw();
        let required = ash_window::enumerate_required_extensions(display_handle)?;

        Ok(required
            .iter()
            .map(|&ptr| unsafe { CStr::from_ptr(ptr) }.to_owned())
            .collect())
    }

    pub(crate) fn enabled_extensions(
        &self,
        system_info: &SystemInfo,
        api_version: Version,
        surface_extensions: &[CString],
    ) -> Result<Vec<CString>, InstanceError> {
        let mut enabled_extensions = self.extensions.clone();

        if self.wants_debug_messenger() && system_info.debug_utils_available {
            enabled_extensions.push(DEBUG_UTILS_EXT_NAME.to_owned());
        }

        let properties2 = ash::khr::get_physical_device_properties2::NAME;
        if api_version < Version::V1_1_0 && system_info.is_extension_available(properties2) {
            enabled_extensions.push(properties2.to_owned());
        }

        #[cfg(feature = "portability")]
        if system_info.is_extension_available(PORTABILITY_ENUMERATION_EXT_NAME) {
            enabled_extensions.push(PORTABILITY_ENUMERATION_EXT_NAME.to_owned());
        }

        let missing_surface =
            system_info.missing_extensions(surface_extensions.iter().map(CString::as_c_str));
        if !missing_surface.is_empty() {
            return Err(InstanceError::WindowingExtensionsNotPresent(missing_surface));
        }
        enabled_extensions.extend_from_slice(surface_extensions);
        dedup_names(&mut enabled_extensions);

        let missing =
            system_info.missing_extensions(enabled_extensions.iter().map(CString::as_c_str));
        if !missing.is_empty() {
            return Err(InstanceError::RequestedExtensionsNotPresent(missing));
        }

        Ok(enabled_extensions)
    }

    pub(crate) fn enabled_layers(
        &self,
        system_info: &SystemInfo,
    ) -> Result<Vec<CString>, InstanceError> {
        let mut enabled_layers = self.layers.clone();

        if self.enable_validation_layers
            || (self.request_validation_layers && system_info.validation_layers_available)
        {
            enabled_layers.push(VALIDATION_LAYER_NAME.to_owned());
        }
        dedup_names(&mut enabled_layers);

        let missing = system_info.missing_layers(enabled_layers.iter().map(CString::as_c_str));
        if !missing.is_empty() {
            return Err(InstanceError::RequestedLayersNotPresent(missing));
        }

        Ok(enabled_layers)
    }

    #[cfg_attr(feature = "enable_tracing", tracing::instrument(skip(self)))]
    pub fn build(self) -> crate::Result<Arc<Instance>> {
        #[cfg(feature = "enable_tracing")]
        tracing::trace!("Loading entry...");
        let entry = unsafe { Entry::load() }?;
        #[cfg(feature = "enable_tracing")]
        tracing::trace!("Entry loaded.");

        let system_info = SystemInfo::get_system_info(&entry)?;

        #[cfg(feature = "enable_tracing")]
        {
            tracing::info!("Supported Vulkan extensions:");
            for name in system_info.extension_names() {
                tracing::info!("\t{}", name.to_string_lossy());
            }
        }

        let instance_version = Version::from(system_info.instance_api_version);
        let api_version = resolve_api_version(
            instance_version,
            self.required_instance_version,
            self.minimum_instance_version,
        )?;

        #[cfg(feature = "enable_tracing")]
        {
            tracing::info!("Instance version: {}", instance_version);
            tracing::info!("api_version: {}", api_version);
        }

        let surface_extensions = self.surface_extensions()?;
        let enabled_extensions =
            self.enabled_extensions(&system_info, api_version, &surface_extensions)?;
        let enabled_layers = self.enabled_layers(&system_info)?;

        #[cfg(feature = "enable_tracing")]
        {
            tracing::info!("Required Vulkan extensions:");
            for name in &enabled_extensions {
                tracing::info!("\t{}", name.to_string_lossy());
            }
            tracing::debug!(?enabled_layers);
        }

        let properties2_ext_enabled = enabled_extensions
            .iter()
            .any(|ext| ext.as_c_str() == ash::khr::get_physical_device_properties2::NAME);
        let portability_enabled = enabled_extensions
            .iter()
            .any(|ext| ext.as_c_str() == PORTABILITY_ENUMERATION_EXT_NAME);

        let use_debug_messenger = self.wants_debug_messenger() && system_info.debug_utils_available;
        #[cfg(feature = "enable_tracing")]
        if self.wants_debug_messenger() && !use_debug_messenger {
            tracing::warn!("VK_EXT_debug_utils is unavailable, skipping debug messenger");
        }

        let app_name = CString::new(self.app_name.as_str())
            .map_err(|_| ConfigError::InvalidName(self.app_name.clone()))?;
        let engine_name = CString::new(self.engine_name.as_str())
            .map_err(|_| ConfigError::InvalidName(self.engine_name.clone()))?;

        let app_info = vk::ApplicationInfo::default()
            .application_name(&app_name)
            .application_version(self.application_version.into())
            .engine_name(&engine_name)
            .engine_version(self.engine_version.into())
            .api_version(api_version.into());

        #[cfg(feature = "enable_tracing")]
        tracing::debug!(
            app_name = %self.app_name,
            app_version = %self.application_version,
            engine_name = %self.engine_name,
            engine_version = %self.engine_version,
            %api_version,
            "Creating vkInstance with application info..."
        );

        let instance_create_flags = if portability_enabled {
            self.flags | vk::InstanceCreateFlags::ENUMERATE_PORTABILITY_KHR
        } else {
            self.flags
        };

        let enabled_extension_ptr = enabled_extensions
            .iter()
            .map(|e| e.as_ptr())
            .collect::<Vec<*const c_char>>();

        let enabled_layers_ptr = enabled_layers
            .iter()
            .map(|e| e.as_ptr())
            .collect::<Vec<*const c_char>>();

        let mut messenger_create_info = vk::DebugUtilsMessengerCreateInfoEXT::default()
            .message_severity(self.debug_message_severity)
            .message_type(self.debug_message_type)
            .pfn_user_callback(self.debug_callback);

        let mut instance_create_info = vk::InstanceCreateInfo::default()
            .flags(instance_create_flags)
            .application_info(&app_info)
            .enabled_extension_names(&enabled_extension_ptr)
            .enabled_layer_names(&enabled_layers_ptr);

        // Covers vkCreateInstance/vkDestroyInstance, which the messenger cannot see.
        if use_debug_messenger {
            instance_create_info = instance_create_info.push_next(&mut messenger_create_info);
        }

        let instance = unsafe { entry.create_instance(&instance_create_info, None) }
            .map_err(|_| InstanceError::FailedCreateInstance)?;

        #[cfg(feature = "enable_tracing")]
        tracing::info!("Created vkInstance");

        let debug_messenger = if use_debug_messenger {
            let debug_utils = ash::ext::debug_utils::Instance::new(&entry, &instance);
            match unsafe { debug_utils.create_debug_utils_messenger(&messenger_create_info, None) }
            {
                Ok(messenger) => Some((debug_utils, messenger)),
                Err(_) => {
                    unsafe { instance.destroy_instance(None) };
                    return Err(InstanceError::FailedCreateDebugMessenger.into());
                }
            }
        } else {
            None
        };

        #[cfg(feature = "enable_tracing")]
        if debug_messenger.is_some() {
            tracing::trace!(?self.debug_callback, "Using debug messenger");
        }

        Ok(Arc::new(Instance {
            instance,
            debug_messenger,
            instance_version,
            api_version,
            properties2_ext_enabled,
            headless: self.headless_context || self.window.is_none(),
            system_info,
            _entry: entry,
        }))
    }
}

pub struct Instance {
    pub(crate) instance: ash::Instance,
    pub(crate) debug_messenger: Option<(ash::ext::debug_utils::Instance, vk::DebugUtilsMessengerEXT)>,
    pub(crate) instance_version: Version,
    pub api_version: Version,
    pub(crate) properties2_ext_enabled: bool,
    pub(crate) headless: bool,
    system_info: SystemInfo,
    // Keeps the loader library mapped for as long as the instance lives.
    _entry: Entry,
}

impl Instance {
    pub fn instance_version(&self) -> Version {
        self.instance_version
    }

    pub fn system_info(&self) -> &SystemInfo {
        &self.system_info
    }

    pub fn has_debug_messenger(&self) -> bool {
        self.debug_messenger.is_some()
    }

    pub fn is_headless(&self) -> bool {
        self.headless
    }

    pub fn properties2_ext_enabled(&self) -> bool {
        self.properties2_ext_enabled
    }
}

impl Debug for Instance {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Instance")
            .field("handle", &self.instance.handle())
            .field(
                "debug_messenger",
                &self.debug_messenger.as_ref().map(|(_, messenger)| messenger),
            )
            .field("instance_version", &self.instance_version)
            .field("api_version", &self.api_version)
            .field("properties2_ext_enabled", &self.properties2_ext_enabled)
            .field("headless", &self.headless)
            .finish()
    }
}

impl Drop for Instance {
    fn drop(&mut self) {
        unsafe {
            if let Some((debug_utils, messenger)) = self.debug_messenger.take() {
                debug_utils.destroy_debug_utils_messenger(messenger, None);
            }
            self.instance.destroy_instance(None);
        }
        #[cfg(feature = "enable_tracing")]
        tracing::info!("Destroyed vkInstance");
    }
}

impl AsRef<ash::Instance> for Instance {
    fn as_ref(&self) -> &ash::Instance {
        &self.instance
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::system_info::tests::system_info;

    #[test]
    fn dedup_keeps_first_occurrence() {
        let mut names = vec![
            c"VK_KHR_surface".to_owned(),
            c"VK_EXT_debug_utils".to_owned(),
            c"VK_KHR_surface".to_owned(),
        ];
        dedup_names(&mut names);
        assert_eq!(
            names,
            vec![c"VK_KHR_surface".to_owned(), c"VK_EXT_debug_utils".to_owned()]
        );
    }

    #[test]
    fn api_version_is_the_larger_request() {
        assert_eq!(
            resolve_api_version(Version::V1_3_0, Version::V1_2_0, Version::V1_1_0),
            Ok(Version::V1_2_0)
        );
        assert_eq!(
            resolve_api_version(Version::new(1, 3, 280), Version::V1_0_0, Version::V1_0_0),
            Ok(Version::V1_0_0)
        );
    }

    #[test]
    fn api_version_above_loader_fails() {
        assert_eq!(
            resolve_api_version(Version::new(1, 1, 100), Version::V1_2_0, Version::V1_0_0),
            Err(InstanceError::VulkanVersion12Unavailable)
        );
        assert_eq!(
            resolve_api_version(Version::V1_3_0, Version::V1_0_0, Version::V1_4_0),
            Err(InstanceError::VulkanVersion14Unavailable)
        );
        assert_eq!(
            resolve_api_version(Version::V1_3_0, Version::new(2, 0, 0), Version::V1_0_0),
            Err(InstanceError::VulkanVersionUnavailable("2.0".to_string()))
        );
    }

    #[test]
    fn required_validation_layer_must_exist() {
        let info = system_info(&[], &[]);
        let builder = InstanceBuilder::new(None).enable_validation_layers(true);

        assert_eq!(
            builder.enabled_layers(&info),
            Err(InstanceError::RequestedLayersNotPresent(vec![
                VALIDATION_LAYER_NAME.to_owned()
            ]))
        );
    }

    #[test]
    fn requested_validation_layer_is_optional() {
        let builder = InstanceBuilder::new(None).request_validation_layers(true);

        assert_eq!(builder.enabled_layers(&system_info(&[], &[])), Ok(vec![]));
        assert_eq!(
            builder.enabled_layers(&system_info(&["VK_LAYER_KHRONOS_validation"], &[])),
            Ok(vec![VALIDATION_LAYER_NAME.to_owned()])
        );
    }

    #[test]
    fn explicit_validation_layer_is_not_duplicated() {
        let info = system_info(&["VK_LAYER_KHRONOS_validation"], &[]);
        let builder = InstanceBuilder::new(None)
            .enable_layer(VALIDATION_LAYER_NAME)
            .enable_validation_layers(true);

        assert_eq!(
            builder.enabled_layers(&info),
            Ok(vec![VALIDATION_LAYER_NAME.to_owned()])
        );
    }

    #[test]
    fn debug_utils_follows_messenger() {
        let info = system_info(&[], &["VK_EXT_debug_utils"]);

        let plain = InstanceBuilder::new(None);
        assert_eq!(plain.enabled_extensions(&info, Version::V1_2_0, &[]), Ok(vec![]));

        let with_messenger = InstanceBuilder::new(None).use_default_debug_messenger();
        assert_eq!(
            with_messenger.enabled_extensions(&info, Version::V1_2_0, &[]),
            Ok(vec![DEBUG_UTILS_EXT_NAME.to_owned()])
        );
    }

    #[test]
    fn messenger_without_debug_utils_is_skipped() {
        let info = system_info(&[], &["VK_KHR_surface"]);
        let builder = InstanceBuilder::new(None).use_default_debug_messenger();

        assert_eq!(builder.enabled_extensions(&info, Version::V1_2_0, &[]), Ok(vec![]));
    }

    #[cfg(feature = "portability")]
    #[test]
    fn portability_enumeration_when_available() {
        let builder = InstanceBuilder::new(None);

        assert_eq!(
            builder.enabled_extensions(
                &system_info(&[], &["VK_KHR_portability_enumeration"]),
                Version::V1_2_0,
                &[]
            ),
            Ok(vec![PORTABILITY_ENUMERATION_EXT_NAME.to_owned()])
        );
        assert_eq!(
            builder.enabled_extensions(&system_info(&[], &[]), Version::V1_2_0, &[]),
            Ok(vec![])
        );
    }

    #[test]
    fn properties2_only_below_vulkan_1_1() {
        let info = system_info(&[], &["VK_KHR_get_physical_device_properties2"]);
        let builder = InstanceBuilder::new(None);

        assert_eq!(
            builder.enabled_extensions(&info, Version::V1_0_0, &[]),
            Ok(vec![c"VK_KHR_get_physical_device_properties2".to_owned()])
        );
        assert_eq!(builder.enabled_extensions(&info, Version::V1_1_0, &[]), Ok(vec![]));
    }

    #[test]
    fn missing_surface_extensions_are_windowing_errors() {
        let info = system_info(&[], &["VK_KHR_surface"]);
        let surface = [c"VK_KHR_surface".to_owned(), c"VK_KHR_xlib_surface".to_owned()];

        assert_eq!(
            InstanceBuilder::new(None).enabled_extensions(&info, Version::V1_2_0, &surface),
            Err(InstanceError::WindowingExtensionsNotPresent(vec![
                c"VK_KHR_xlib_surface".to_owned()
            ]))
        );
    }

    #[test]
    fn unsupported_user_extension_is_reported() {
        let info = system_info(&[], &["VK_KHR_surface"]);
        let builder = InstanceBuilder::new(None)
            .enable_extension(c"VK_KHR_surface")
            .enable_extension(c"VK_EXT_swapchain_colorspace");

        assert_eq!(
            builder.enabled_extensions(&info, Version::V1_2_0, &[]),
            Err(InstanceError::RequestedExtensionsNotPresent(vec![
                c"VK_EXT_swapchain_colorspace".to_owned()
            ]))
        );
    }
}
