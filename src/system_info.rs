use ash::{Entry, vk};
use std::ffi::{CStr, CString};

pub const VALIDATION_LAYER_NAME: &CStr = c"VK_LAYER_KHRONOS_validation";
pub const DEBUG_UTILS_EXT_NAME: &CStr = ash::ext::debug_utils::NAME;
pub const PORTABILITY_ENUMERATION_EXT_NAME: &CStr = c"VK_KHR_portability_enumeration";

/// Layers, extensions and loader version reported before any instance exists.
#[derive(Debug, Clone)]
pub struct SystemInfo {
    pub available_layers: Vec<vk::LayerProperties>,
    pub available_extensions: Vec<vk::ExtensionProperties>,
    pub validation_layers_available: bool,
    pub debug_utils_available: bool,
    pub instance_api_version: u32,
}

impl SystemInfo {
    #[cfg_attr(feature = "enable_tracing", tracing::instrument(skip(entry)))]
    pub fn get_system_info(entry: &Entry) -> crate::Result<Self> {
        let available_layers = unsafe { entry.enumerate_instance_layer_properties() }?;
        let mut available_extensions =
            unsafe { entry.enumerate_instance_extension_properties(None) }?;

        for layer in &available_layers {
            let Ok(layer_name) = layer.layer_name_as_c_str() else {
                continue;
            };
            let layer_extensions =
                unsafe { entry.enumerate_instance_extension_properties(Some(layer_name)) }?;

            available_extensions.extend_from_slice(&layer_extensions);
        }

        let instance_api_version = unsafe { entry.try_enumerate_instance_version() }?
            .unwrap_or(vk::API_VERSION_1_0);

        let system_info =
            Self::from_properties(available_layers, available_extensions, instance_api_version);

        #[cfg(feature = "enable_tracing")]
        tracing::trace!(
            system_info.validation_layers_available,
            system_info.debug_utils_available
        );

        Ok(system_info)
    }

    pub fn from_properties(
        available_layers: Vec<vk::LayerProperties>,
        available_extensions: Vec<vk::ExtensionProperties>,
        instance_api_version: u32,
    ) -> Self {
        // Layers re-advertise extensions the loader already reports.
        let mut unique_extensions: Vec<vk::ExtensionProperties> =
            Vec::with_capacity(available_extensions.len());
        for ext in available_extensions {
            let name = ext.extension_name_as_c_str();
            if !unique_extensions
                .iter()
                .any(|kept| kept.extension_name_as_c_str() == name)
            {
                unique_extensions.push(ext);
            }
        }
        let available_extensions = unique_extensions;

        let validation_layers_available = available_layers
            .iter()
            .any(|layer| layer.layer_name_as_c_str() == Ok(VALIDATION_LAYER_NAME));
        let debug_utils_available = available_extensions
            .iter()
            .any(|ext| ext.extension_name_as_c_str() == Ok(DEBUG_UTILS_EXT_NAME));

        Self {
            available_layers,
            available_extensions,
            validation_layers_available,
            debug_utils_available,
            instance_api_version,
        }
    }

    pub fn extension_names(&self) -> impl Iterator<Item = &CStr> {
        self.available_extensions
            .iter()
            .filter_map(|ext| ext.extension_name_as_c_str().ok())
    }

    pub fn layer_names(&self) -> impl Iterator<Item = &CStr> {
        self.available_layers
            .iter()
            .filter_map(|layer| layer.layer_name_as_c_str().ok())
    }

    pub fn is_extension_available(&self, extension: &CStr) -> bool {
        self.extension_names().any(|name| name == extension)
    }

    pub fn are_extensions_available<'a, I: IntoIterator<Item = &'a CStr>>(
        &self,
        extensions: I,
    ) -> bool {
        extensions
            .into_iter()
            .all(|ext| self.is_extension_available(ext))
    }

    pub fn missing_extensions<'a, I: IntoIterator<Item = &'a CStr>>(
        &self,
        extensions: I,
    ) -> Vec<CString> {
        extensions
            .into_iter()
            .filter(|ext| !self.is_extension_available(ext))
            .map(CStr::to_owned)
            .collect()
    }

    pub fn is_layer_available(&self, layer: &CStr) -> bool {
        self.layer_names().any(|name| name == layer)
    }

    pub fn are_layers_available<'a, I: IntoIterator<Item = &'a CStr>>(&self, layers: I) -> bool {
        layers.into_iter().all(|layer| self.is_layer_available(layer))
    }

    pub fn missing_layers<'a, I: IntoIterator<Item = &'a CStr>>(&self, layers: I) -> Vec<CString> {
        layers
            .into_iter()
            .filter(|layer| !self.is_layer_available(layer))
            .map(CStr::to_owned)
            .collect()
    }
}
