use crate::{Instance, PhysicalDeviceError, QueueError, Version};
use ash::vk;
use std::ffi::{CStr, CString, c_char};
use std::fmt::{Debug, Formatter};
use std::sync::Arc;

pub const PORTABILITY_SUBSET_EXT_NAME: &CStr = c"VK_KHR_portability_subset";

#[repr(u8)]
#[derive(Default, Debug, Clone, Copy, Eq, PartialEq, Ord, PartialOrd)]
pub enum PreferredDeviceType {
    Other = 0,
    Integrated = 1,
    #[default]
    Discrete = 2,
    VirtualGpu = 3,
    Cpu = 4,
}

impl PreferredDeviceType {
    pub fn is_gpu(self) -> bool {
        matches!(self, Self::Integrated | Self::Discrete | Self::VirtualGpu)
    }
}

impl From<vk::PhysicalDeviceType> for PreferredDeviceType {
    fn from(device_type: vk::PhysicalDeviceType) -> Self {
        match device_type {
            vk::PhysicalDeviceType::INTEGRATED_GPU => Self::Integrated,
            vk::PhysicalDeviceType::DISCRETE_GPU => Self::Discrete,
            vk::PhysicalDeviceType::VIRTUAL_GPU => Self::VirtualGpu,
            vk::PhysicalDeviceType::CPU => Self::Cpu,
            _ => Self::Other,
        }
    }
}

#[derive(Default, Debug, Clone, Copy, Eq, PartialEq, Ord, PartialOrd)]
pub enum Suitable {
    #[default]
    Yes,
    Partial,
    No,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QueueType {
    Graphics,
    Compute,
    Transfer,
}

/// Index of the first family that has every `required` bit and none of the
/// `forbidden` ones.
fn first_family(
    families: &[vk::QueueFamilyProperties],
    required: vk::QueueFlags,
    forbidden: vk::QueueFlags,
) -> Option<u32> {
    families
        .iter()
        .position(|family| {
            family.queue_count > 0
                && family.queue_flags.contains(required)
                && !family.queue_flags.intersects(forbidden)
        })
        .map(|index| index as u32)
}

pub fn separate_compute_queue_index(families: &[vk::QueueFamilyProperties]) -> Option<u32> {
    first_family(families, vk::QueueFlags::COMPUTE, vk::QueueFlags::GRAPHICS)
}

pub fn dedicated_compute_queue_index(families: &[vk::QueueFamilyProperties]) -> Option<u32> {
    first_family(
        families,
        vk::QueueFlags::COMPUTE,
        vk::QueueFlags::GRAPHICS | vk::QueueFlags::TRANSFER,
    )
}

pub fn separate_transfer_queue_index(families: &[vk::QueueFamilyProperties]) -> Option<u32> {
    first_family(families, vk::QueueFlags::TRANSFER, vk::QueueFlags::GRAPHICS)
}

pub fn dedicated_transfer_queue_index(families: &[vk::QueueFamilyProperties]) -> Option<u32> {
    first_family(
        families,
        vk::QueueFlags::TRANSFER,
        vk::QueueFlags::GRAPHICS | vk::QueueFlags::COMPUTE,
    )
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct QueueFamilyIndices {
    pub graphics: Option<u32>,
    pub compute: Option<u32>,
    pub transfer: Option<u32>,
}

impl QueueFamilyIndices {
    pub fn from_properties(families: &[vk::QueueFamilyProperties]) -> Self {
        let graphics = first_family(families, vk::QueueFlags::GRAPHICS, vk::QueueFlags::empty());
        let compute = separate_compute_queue_index(families).or_else(|| {
            first_family(families, vk::QueueFlags::COMPUTE, vk::QueueFlags::empty())
        });
        let transfer = dedicated_transfer_queue_index(families)
            .or_else(|| separate_transfer_queue_index(families))
            .or_else(|| first_family(families, vk::QueueFlags::TRANSFER, vk::QueueFlags::empty()));

        Self {
            graphics,
            compute,
            transfer,
        }
    }

    pub fn is_complete(&self) -> bool {
        self.graphics.is_some()
    }

    pub fn get(&self, queue_type: QueueType) -> Result<u32, QueueError> {
        match queue_type {
            QueueType::Graphics => self.graphics.ok_or(QueueError::GraphicsUnavailable),
            QueueType::Compute => self.compute.ok_or(QueueError::ComputeUnavailable),
            QueueType::Transfer => self.transfer.ok_or(QueueError::TransferUnavailable),
        }
    }

    /// Distinct family indices, ascending.
    pub fn unique_families(&self) -> Vec<u32> {
        let mut families: Vec<u32> = [self.graphics, self.compute, self.transfer]
            .into_iter()
            .flatten()
            .collect();
        families.sort_unstable();
        families.dedup();
        families
    }
}

#[derive(Default, Debug, Clone)]
pub struct PhysicalDevice {
    name: String,
    physical_device: vk::PhysicalDevice,

    features: vk::PhysicalDeviceFeatures,
    properties: vk::PhysicalDeviceProperties,
    memory_properties: vk::PhysicalDeviceMemoryProperties,

    available_extensions: Vec<String>,
    queue_families: Vec<vk::QueueFamilyProperties>,
    queue_family_indices: QueueFamilyIndices,
    suitable: Suitable,
}

impl PhysicalDevice {
    fn describe(
        instance: &ash::Instance,
        physical_device: vk::PhysicalDevice,
    ) -> crate::Result<Self> {
        let properties = unsafe { instance.get_physical_device_properties(physical_device) };
        let features = unsafe { instance.get_physical_device_features(physical_device) };
        let memory_properties =
            unsafe { instance.get_physical_device_memory_properties(physical_device) };
        let queue_families =
            unsafe { instance.get_physical_device_queue_family_properties(physical_device) };
        let available_extensions =
            unsafe { instance.enumerate_device_extension_properties(physical_device) }?
                .iter()
                .filter_map(|ext| ext.extension_name_as_c_str().ok())
                .map(|name| name.to_string_lossy().into_owned())
                .collect();

        let name = properties
            .device_name_as_c_str()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();

        Ok(Self {
            name,
            physical_device,
            features,
            properties,
            memory_properties,
            available_extensions,
            queue_family_indices: QueueFamilyIndices::from_properties(&queue_families),
            queue_families,
            suitable: Suitable::No,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn handle(&self) -> vk::PhysicalDevice {
        self.physical_device
    }

    pub fn features(&self) -> &vk::PhysicalDeviceFeatures {
        &self.features
    }

    pub fn properties(&self) -> &vk::PhysicalDeviceProperties {
        &self.properties
    }

    pub fn memory_properties(&self) -> &vk::PhysicalDeviceMemoryProperties {
        &self.memory_properties
    }

    pub fn queue_families(&self) -> &[vk::QueueFamilyProperties] {
        &self.queue_families
    }

    pub fn queue_family_indices(&self) -> QueueFamilyIndices {
        self.queue_family_indices
    }

    pub fn suitable(&self) -> Suitable {
        self.suitable
    }

    pub fn device_type(&self) -> PreferredDeviceType {
        self.properties.device_type.into()
    }

    pub fn api_version(&self) -> Version {
        Version::from(self.properties.api_version)
    }

    pub fn driver_version(&self) -> Version {
        Version::from(self.properties.driver_version)
    }

    pub fn is_extension_available(&self, extension: &str) -> bool {
        self.available_extensions.iter().any(|ext| ext == extension)
    }

    /// Size of the largest device-local heap.
    pub fn device_local_memory(&self) -> vk::DeviceSize {
        let heap_count = self.memory_properties.memory_heap_count as usize;
        self.memory_properties.memory_heaps[..heap_count.min(vk::MAX_MEMORY_HEAPS)]
            .iter()
            .filter(|heap| heap.flags.contains(vk::MemoryHeapFlags::DEVICE_LOCAL))
            .map(|heap| heap.size)
            .max()
            .unwrap_or(0)
    }
}

#[derive(Debug)]
struct SelectionCriteria {
    name: String,
    preferred_device_type: PreferredDeviceType,
    allow_any_type: bool,
    require_dedicated_transfer_queue: bool,
    require_dedicated_compute_queue: bool,
    require_separate_transfer_queue: bool,
    require_separate_compute_queue: bool,
    required_mem_size: vk::DeviceSize,
    required_version: Version,
    use_first_gpu_unconditionally: bool,
}

impl Default for SelectionCriteria {
    fn default() -> Self {
        Self {
            name: String::new(),
            preferred_device_type: PreferredDeviceType::Discrete,
            allow_any_type: true,
            require_dedicated_transfer_queue: false,
            require_dedicated_compute_queue: false,
            require_separate_transfer_queue: false,
            require_separate_compute_queue: false,
            required_mem_size: 0,
            required_version: Version::V1_0_0,
            use_first_gpu_unconditionally: false,
        }
    }
}

impl SelectionCriteria {
    fn is_device_suitable(&self, device: &PhysicalDevice) -> Suitable {
        if !self.name.is_empty() && self.name != device.name {
            return Suitable::No;
        }

        if device.api_version() < self.required_version {
            return Suitable::No;
        }

        if !device.queue_family_indices.is_complete() {
            return Suitable::No;
        }

        let families = device.queue_families.as_slice();
        if (self.require_dedicated_compute_queue
            && dedicated_compute_queue_index(families).is_none())
            || (self.require_dedicated_transfer_queue
                && dedicated_transfer_queue_index(families).is_none())
            || (self.require_separate_compute_queue
                && separate_compute_queue_index(families).is_none())
            || (self.require_separate_transfer_queue
                && separate_transfer_queue_index(families).is_none())
        {
            return Suitable::No;
        }

        if device.device_local_memory() < self.required_mem_size {
            return Suitable::No;
        }

        let device_type = device.device_type();
        if device_type == self.preferred_device_type {
            Suitable::Yes
        } else if self.allow_any_type && device_type.is_gpu() {
            Suitable::Partial
        } else {
            Suitable::No
        }
    }

    /// First fully suitable device, else the first partially suitable one.
    fn pick(&self, devices: Vec<PhysicalDevice>) -> Result<PhysicalDevice, PhysicalDeviceError> {
        if self.use_first_gpu_unconditionally {
            return devices
                .into_iter()
                .next()
                .map(|mut device| {
                    device.suitable = Suitable::Yes;
                    device
                })
                .ok_or(PhysicalDeviceError::NoPhysicalDevicesFound);
        }

        devices
            .into_iter()
            .map(|mut device| {
                device.suitable = self.is_device_suitable(&device);
                device
            })
            .filter(|device| device.suitable != Suitable::No)
            .min_by_key(|device| device.suitable)
            .ok_or(PhysicalDeviceError::NoSuitableDevice)
    }
}

pub struct PhysicalDeviceSelector {
    instance: Arc<Instance>,
    selection_criteria: SelectionCriteria,
}

impl PhysicalDeviceSelector {
    pub fn new(instance: Arc<Instance>) -> PhysicalDeviceSelector {
        let required_version = instance.api_version;
        Self {
            instance,
            selection_criteria: SelectionCriteria {
                required_version,
                ..Default::default()
            },
        }
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.selection_criteria.name = name.into();
        self
    }

    pub fn preferred_device_type(mut self, device_type: PreferredDeviceType) -> Self {
        self.selection_criteria.preferred_device_type = device_type;
        self
    }

    pub fn allow_any_gpu_device_type(mut self, allow: bool) -> Self {
        self.selection_criteria.allow_any_type = allow;
        self
    }

    pub fn required_version(mut self, version: Version) -> Self {
        self.selection_criteria.required_version = version;
        self
    }

    pub fn require_dedicated_transfer_queue(mut self, require: bool) -> Self {
        self.selection_criteria.require_dedicated_transfer_queue = require;
        self
    }

    pub fn require_dedicated_compute_queue(mut self, require: bool) -> Self {
        self.selection_criteria.require_dedicated_compute_queue = require;
        self
    }

    pub fn require_separate_transfer_queue(mut self, require: bool) -> Self {
        self.selection_criteria.require_separate_transfer_queue = require;
        self
    }

    pub fn require_separate_compute_queue(mut self, require: bool) -> Self {
        self.selection_criteria.require_separate_compute_queue = require;
        self
    }

    pub fn required_device_memory_size(mut self, required: vk::DeviceSize) -> Self {
        self.selection_criteria.required_mem_size = required;
        self
    }

    pub fn select_first_device_unconditionally(mut self, select: bool) -> Self {
        self.selection_criteria.use_first_gpu_unconditionally = select;
        self
    }

    #[cfg_attr(feature = "enable_tracing", tracing::instrument(skip(self)))]
    pub fn select(self) -> crate::Result<PhysicalDevice> {
        let instance = &self.instance.instance;
        let physical_devices = unsafe { instance.enumerate_physical_devices() }
            .map_err(|_| PhysicalDeviceError::FailedToEnumeratePhysicalDevices)?;
        if physical_devices.is_empty() {
            return Err(PhysicalDeviceError::NoPhysicalDevicesFound.into());
        }

        let devices = physical_devices
            .into_iter()
            .map(|physical_device| PhysicalDevice::describe(instance, physical_device))
            .collect::<crate::Result<Vec<_>>>()?;

        #[cfg(feature = "enable_tracing")]
        for device in &devices {
            tracing::debug!(
                name = device.name(),
                device_type = ?device.device_type(),
                suitable = ?self.selection_criteria.is_device_suitable(device),
                "Found physical device"
            );
        }

        let selected = self.selection_criteria.pick(devices)?;

        #[cfg(feature = "enable_tracing")]
        {
            tracing::info!("Vulkan Physical Device Information:");
            tracing::info!("\tAPI Version: {}", selected.api_version());
            tracing::info!("\tDriver Version: {}", selected.driver_version());
            tracing::info!("\tDevice Name: {}", selected.name());
        }

        Ok(selected)
    }
}

pub struct DeviceBuilder {
    instance: Arc<Instance>,
    physical_device: PhysicalDevice,
    extensions: Vec<CString>,
    features: vk::PhysicalDeviceFeatures,
}

impl DeviceBuilder {
    pub fn new(physical_device: PhysicalDevice, instance: Arc<Instance>) -> Self {
        Self {
            instance,
            physical_device,
            extensions: vec![],
            features: vk::PhysicalDeviceFeatures::default(),
        }
    }

    pub fn enable_extension(mut self, extension: &CStr) -> Self {
        self.extensions.push(extension.to_owned());
        self
    }

    pub fn features(mut self, features: vk::PhysicalDeviceFeatures) -> Self {
        self.features = features;
        self
    }

    #[cfg_attr(feature = "enable_tracing", tracing::instrument(skip(self)))]
    pub fn build(self) -> crate::Result<Device> {
        let queue_family_indices = self.physical_device.queue_family_indices;
        if !queue_family_indices.is_complete() {
            return Err(QueueError::GraphicsUnavailable.into());
        }

        let queue_priorities = [1.0_f32];
        let queue_create_infos = queue_family_indices
            .unique_families()
            .into_iter()
            .map(|family| {
                vk::DeviceQueueCreateInfo::default()
                    .queue_family_index(family)
                    .queue_priorities(&queue_priorities)
            })
            .collect::<Vec<_>>();

        let mut extensions = self.extensions;
        if self
            .physical_device
            .is_extension_available(&PORTABILITY_SUBSET_EXT_NAME.to_string_lossy())
            && !extensions.iter().any(|ext| ext.as_c_str() == PORTABILITY_SUBSET_EXT_NAME)
        {
            extensions.push(PORTABILITY_SUBSET_EXT_NAME.to_owned());
        }

        #[cfg(feature = "enable_tracing")]
        tracing::debug!(?extensions, ?queue_family_indices, "Creating vkDevice");

        let extension_ptrs = extensions
            .iter()
            .map(|ext| ext.as_ptr())
            .collect::<Vec<*const c_char>>();

        let device_create_info = vk::DeviceCreateInfo::default()
            .queue_create_infos(&queue_create_infos)
            .enabled_extension_names(&extension_ptrs)
            .enabled_features(&self.features);

        let device = unsafe {
            self.instance.instance.create_device(
                self.physical_device.physical_device,
                &device_create_info,
                None,
            )
        }?;

        #[cfg(feature = "enable_tracing")]
        tracing::info!("Created vkDevice on {}", self.physical_device.name());

        Ok(Device {
            device,
            physical_device: self.physical_device,
            instance: self.instance,
        })
    }
}

pub struct Device {
    device: ash::Device,
    physical_device: PhysicalDevice,
    // Outlives the device so the instance is destroyed last.
    instance: Arc<Instance>,
}

impl Device {
    pub fn physical_device(&self) -> &PhysicalDevice {
        &self.physical_device
    }

    pub fn instance(&self) -> &Arc<Instance> {
        &self.instance
    }

    pub fn get_queue(&self, queue_type: QueueType) -> crate::Result<(u32, vk::Queue)> {
        let index = self.physical_device.queue_family_indices.get(queue_type)?;
        if index as usize >= self.physical_device.queue_families.len() {
            return Err(QueueError::InvalidQueueFamilyIndex.into());
        }

        let queue = unsafe { self.device.get_device_queue(index, 0) };
        Ok((index, queue))
    }
}

impl Debug for Device {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Device")
            .field("handle", &self.device.handle())
            .field("physical_device", &self.physical_device.name)
            .finish()
    }
}

impl Drop for Device {
    fn drop(&mut self) {
        unsafe { self.device.destroy_device(None) };
        #[cfg(feature = "enable_tracing")]
        tracing::info!("Destroyed vkDevice");
    }
}

impl AsRef<ash::Device> for Device {
    fn as_ref(&self) -> &ash::Device {
        &self.device
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn family(flags: vk::QueueFlags) -> vk::QueueFamilyProperties {
        vk::QueueFamilyProperties {
            queue_flags: flags,
            queue_count: 1,
            ..Default::default()
        }
    }

    fn fake_device(
        name: &str,
        device_type: vk::PhysicalDeviceType,
        families: Vec<vk::QueueFamilyProperties>,
    ) -> PhysicalDevice {
        let properties = vk::PhysicalDeviceProperties {
            device_type,
            api_version: vk::API_VERSION_1_3,
            ..Default::default()
        };
        let mut memory_properties = vk::PhysicalDeviceMemoryProperties {
            memory_heap_count: 1,
            ..Default::default()
        };
        memory_properties.memory_heaps[0] = vk::MemoryHeap {
            size: 4 << 30,
            flags: vk::MemoryHeapFlags::DEVICE_LOCAL,
        };

        PhysicalDevice {
            name: name.to_string(),
            properties,
            memory_properties,
            queue_family_indices: QueueFamilyIndices::from_properties(&families),
            queue_families: families,
            suitable: Suitable::No,
            ..Default::default()
        }
    }

    fn graphics_only() -> Vec<vk::QueueFamilyProperties> {
        vec![family(vk::QueueFlags::GRAPHICS | vk::QueueFlags::COMPUTE | vk::QueueFlags::TRANSFER)]
    }

    #[test]
    fn graphics_family_is_first_match() {
        let families = [
            family(vk::QueueFlags::TRANSFER),
            family(vk::QueueFlags::GRAPHICS | vk::QueueFlags::COMPUTE),
            family(vk::QueueFlags::GRAPHICS),
        ];
        let indices = QueueFamilyIndices::from_properties(&families);
        assert_eq!(indices.graphics, Some(1));
        assert!(indices.is_complete());
    }

    #[test]
    fn empty_families_are_skipped() {
        let families = [
            vk::QueueFamilyProperties {
                queue_flags: vk::QueueFlags::GRAPHICS,
                ..Default::default()
            },
            family(vk::QueueFlags::GRAPHICS),
        ];
        assert_eq!(QueueFamilyIndices::from_properties(&families).graphics, Some(1));
    }

    #[test]
    fn no_graphics_is_incomplete() {
        let families = [family(vk::QueueFlags::COMPUTE | vk::QueueFlags::TRANSFER)];
        let indices = QueueFamilyIndices::from_properties(&families);
        assert!(!indices.is_complete());
        assert_eq!(indices.compute, Some(0));
        assert_eq!(
            indices.get(QueueType::Graphics),
            Err(QueueError::GraphicsUnavailable)
        );
    }

    #[test]
    fn prefers_separate_compute_and_transfer() {
        let families = [
            family(vk::QueueFlags::GRAPHICS | vk::QueueFlags::COMPUTE | vk::QueueFlags::TRANSFER),
            family(vk::QueueFlags::COMPUTE | vk::QueueFlags::TRANSFER),
            family(vk::QueueFlags::TRANSFER | vk::QueueFlags::SPARSE_BINDING),
        ];
        let indices = QueueFamilyIndices::from_properties(&families);
        assert_eq!(indices.graphics, Some(0));
        assert_eq!(indices.compute, Some(1));
        assert_eq!(indices.transfer, Some(2));
        assert_eq!(indices.unique_families(), vec![0, 1, 2]);
        assert_eq!(dedicated_compute_queue_index(&families), None);
        assert_eq!(separate_transfer_queue_index(&families), Some(1));
    }

    #[test]
    fn transfer_needs_the_transfer_flag() {
        let indices = QueueFamilyIndices::from_properties(&[family(vk::QueueFlags::GRAPHICS)]);
        assert_eq!(indices.graphics, Some(0));
        assert_eq!(indices.transfer, None);
        assert_eq!(
            indices.get(QueueType::Transfer),
            Err(QueueError::TransferUnavailable)
        );
        assert_eq!(indices.get(QueueType::Compute), Err(QueueError::ComputeUnavailable));
        assert_eq!(indices.unique_families(), vec![0]);
    }

    #[test]
    fn single_universal_family_serves_everything() {
        let indices = QueueFamilyIndices::from_properties(&graphics_only());
        assert_eq!(indices.get(QueueType::Graphics), Ok(0));
        assert_eq!(indices.get(QueueType::Compute), Ok(0));
        assert_eq!(indices.get(QueueType::Transfer), Ok(0));
        assert_eq!(indices.unique_families(), vec![0]);
    }

    #[test]
    fn device_type_from_vulkan() {
        assert_eq!(
            PreferredDeviceType::from(vk::PhysicalDeviceType::DISCRETE_GPU),
            PreferredDeviceType::Discrete
        );
        assert_eq!(
            PreferredDeviceType::from(vk::PhysicalDeviceType::CPU),
            PreferredDeviceType::Cpu
        );
        assert!(!PreferredDeviceType::Cpu.is_gpu());
        assert!(PreferredDeviceType::VirtualGpu.is_gpu());
    }

    #[test]
    fn preferred_type_is_fully_suitable() {
        let criteria = SelectionCriteria::default();
        let discrete = fake_device("dGPU", vk::PhysicalDeviceType::DISCRETE_GPU, graphics_only());
        let integrated =
            fake_device("iGPU", vk::PhysicalDeviceType::INTEGRATED_GPU, graphics_only());

        assert_eq!(criteria.is_device_suitable(&discrete), Suitable::Yes);
        assert_eq!(criteria.is_device_suitable(&integrated), Suitable::Partial);
    }

    #[test]
    fn cpu_and_other_are_rejected_unless_preferred() {
        let criteria = SelectionCriteria::default();
        let cpu = fake_device("llvmpipe", vk::PhysicalDeviceType::CPU, graphics_only());
        let other = fake_device("other", vk::PhysicalDeviceType::OTHER, graphics_only());
        assert_eq!(criteria.is_device_suitable(&cpu), Suitable::No);
        assert_eq!(criteria.is_device_suitable(&other), Suitable::No);

        let wants_cpu = SelectionCriteria {
            preferred_device_type: PreferredDeviceType::Cpu,
            ..Default::default()
        };
        assert_eq!(wants_cpu.is_device_suitable(&cpu), Suitable::Yes);
    }

    #[test]
    fn strict_type_rejects_other_gpus() {
        let criteria = SelectionCriteria {
            allow_any_type: false,
            ..Default::default()
        };
        let integrated =
            fake_device("iGPU", vk::PhysicalDeviceType::INTEGRATED_GPU, graphics_only());
        assert_eq!(criteria.is_device_suitable(&integrated), Suitable::No);
    }

    #[test]
    fn device_without_graphics_is_unsuitable() {
        let criteria = SelectionCriteria::default();
        let compute_only = fake_device(
            "compute",
            vk::PhysicalDeviceType::DISCRETE_GPU,
            vec![family(vk::QueueFlags::COMPUTE)],
        );
        assert_eq!(criteria.is_device_suitable(&compute_only), Suitable::No);
    }

    #[test]
    fn version_memory_and_name_filters() {
        let device = fake_device("dGPU", vk::PhysicalDeviceType::DISCRETE_GPU, graphics_only());

        let newer = SelectionCriteria {
            required_version: Version::V1_4_0,
            ..Default::default()
        };
        assert_eq!(newer.is_device_suitable(&device), Suitable::No);

        let hungry = SelectionCriteria {
            required_mem_size: 8 << 30,
            ..Default::default()
        };
        assert_eq!(hungry.is_device_suitable(&device), Suitable::No);
        assert_eq!(device.device_local_memory(), 4 << 30);

        let named = SelectionCriteria {
            name: "other GPU".to_string(),
            ..Default::default()
        };
        assert_eq!(named.is_device_suitable(&device), Suitable::No);
    }

    #[test]
    fn dedicated_queue_requirements() {
        let criteria = SelectionCriteria {
            require_dedicated_transfer_queue: true,
            ..Default::default()
        };
        let plain = fake_device("plain", vk::PhysicalDeviceType::DISCRETE_GPU, graphics_only());
        let mut families = graphics_only();
        families.push(family(vk::QueueFlags::TRANSFER));
        let rich = fake_device("rich", vk::PhysicalDeviceType::DISCRETE_GPU, families);

        assert_eq!(criteria.is_device_suitable(&plain), Suitable::No);
        assert_eq!(criteria.is_device_suitable(&rich), Suitable::Yes);
    }

    #[test]
    fn pick_prefers_full_match_over_order() {
        let criteria = SelectionCriteria::default();
        let devices = vec![
            fake_device("llvmpipe", vk::PhysicalDeviceType::CPU, graphics_only()),
            fake_device("iGPU", vk::PhysicalDeviceType::INTEGRATED_GPU, graphics_only()),
            fake_device("dGPU", vk::PhysicalDeviceType::DISCRETE_GPU, graphics_only()),
            fake_device("dGPU 2", vk::PhysicalDeviceType::DISCRETE_GPU, graphics_only()),
        ];

        let picked = criteria.pick(devices).unwrap();
        assert_eq!(picked.name(), "dGPU");
        assert_eq!(picked.suitable(), Suitable::Yes);
    }

    #[test]
    fn pick_falls_back_to_partial() {
        let criteria = SelectionCriteria::default();
        let devices = vec![
            fake_device("llvmpipe", vk::PhysicalDeviceType::CPU, graphics_only()),
            fake_device("virtio", vk::PhysicalDeviceType::VIRTUAL_GPU, graphics_only()),
            fake_device("iGPU", vk::PhysicalDeviceType::INTEGRATED_GPU, graphics_only()),
        ];

        let picked = criteria.pick(devices).unwrap();
        assert_eq!(picked.name(), "virtio");
        assert_eq!(picked.suitable(), Suitable::Partial);
    }

    #[test]
    fn pick_without_candidates_fails() {
        let criteria = SelectionCriteria::default();
        let devices = vec![fake_device(
            "llvmpipe",
            vk::PhysicalDeviceType::CPU,
            graphics_only(),
        )];
        assert_eq!(
            criteria.pick(devices).unwrap_err(),
            PhysicalDeviceError::NoSuitableDevice
        );
    }

    #[test]
    fn pick_first_unconditionally() {
        let criteria = SelectionCriteria {
            use_first_gpu_unconditionally: true,
            ..Default::default()
        };
        let devices = vec![
            fake_device("llvmpipe", vk::PhysicalDeviceType::CPU, vec![]),
            fake_device("dGPU", vk::PhysicalDeviceType::DISCRETE_GPU, graphics_only()),
        ];
        assert_eq!(criteria.pick(devices).unwrap().name(), "llvmpipe");
    }
}
