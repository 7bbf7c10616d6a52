use crate::config::Config;
use crate::instance::WindowTraits;
use crate::{
    Device, DeviceBuilder, Instance, InstanceBuilder, PhysicalDeviceSelector, PreferredDeviceType,
    QueueType,
};
use ash::vk;
use std::sync::Arc;
use winit::application::ApplicationHandler;
use winit::dpi::LogicalSize;
use winit::event::WindowEvent;
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::window::{Window, WindowAttributes, WindowId};

/// Everything created for one window: instance, selected GPU, logical device.
pub struct VulkanContext {
    // Field order is drop order.
    device: Device,
    instance: Arc<Instance>,
    graphics_queue: (u32, vk::Queue),
}

impl VulkanContext {
    #[cfg_attr(feature = "enable_tracing", tracing::instrument(skip_all))]
    pub fn new(window: Arc<Window>, config: &Config) -> crate::Result<Self> {
        let application = &config.application;
        let mut builder = InstanceBuilder::new(Some(window as Arc<dyn WindowTraits>))
            .app_name(application.app_name.as_str())
            .app_version(application.app_version)
            .engine_name(application.engine_name.as_str())
            .engine_version(application.engine_version)
            .require_api_version(application.api_version);

        if config.validation.enabled {
            for layer in config.validation.layer_names()? {
                builder = builder.enable_layer(&layer);
            }
            builder = builder.debug_messenger_severity(config.validation.severity_flags());

            #[cfg(feature = "enable_tracing")]
            {
                builder = builder.use_default_tracing_messenger();
            }
            #[cfg(not(feature = "enable_tracing"))]
            {
                builder = builder.use_default_debug_messenger();
            }
        }

        let instance = builder.build()?;

        let physical_device = PhysicalDeviceSelector::new(instance.clone())
            .preferred_device_type(PreferredDeviceType::Discrete)
            .select()?;

        let device = DeviceBuilder::new(physical_device, instance.clone()).build()?;
        let graphics_queue = device.get_queue(QueueType::Graphics)?;

        Ok(Self {
            device,
            instance,
            graphics_queue,
        })
    }

    pub fn device(&self) -> &Device {
        &self.device
    }

    pub fn instance(&self) -> &Arc<Instance> {
        &self.instance
    }

    pub fn graphics_queue(&self) -> (u32, vk::Queue) {
        self.graphics_queue
    }
}

pub struct App {
    config: Config,
    context: Option<VulkanContext>,
    window: Option<Arc<Window>>,
    error: Option<crate::Error>,
}

impl App {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            context: None,
            window: None,
            error: None,
        }
    }

    pub fn context(&self) -> Option<&VulkanContext> {
        self.context.as_ref()
    }

    pub fn take_error(&mut self) -> Option<crate::Error> {
        self.error.take()
    }

    fn window_attributes(&self) -> WindowAttributes {
        let window = &self.config.window;
        WindowAttributes::default()
            .with_title(window.title.clone())
            .with_inner_size(LogicalSize::new(window.width, window.height))
    }

    fn init(&mut self, event_loop: &ActiveEventLoop) -> crate::Result<()> {
        let window = Arc::new(event_loop.create_window(self.window_attributes())?);
        // Stored first so the window outlives a context that fails half-way.
        self.window = Some(window.clone());
        self.context = Some(VulkanContext::new(window, &self.config)?);
        Ok(())
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }

        event_loop.set_control_flow(ControlFlow::Wait);

        if let Err(err) = self.init(event_loop) {
            #[cfg(feature = "enable_tracing")]
            tracing::error!("Vulkan initialization failed: {err}");
            self.error = Some(err);
            event_loop.exit();
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        if let WindowEvent::CloseRequested = event {
            #[cfg(feature = "enable_tracing")]
            tracing::info!("Close requested, shutting down");
            event_loop.exit();
        }
    }

    fn exiting(&mut self, _event_loop: &ActiveEventLoop) {
        self.context.take();
        self.window.take();
    }
}

/// Opens the configured window, bootstraps Vulkan and waits until the window
/// is closed. Returns the first initialization error, if any.
pub fn run(config: Config) -> crate::Result<()> {
    let event_loop = EventLoop::new()?;
    let mut app = App::new(config);
    event_loop.run_app(&mut app)?;

    match app.take_error() {
        Some(err) => Err(err),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use winit::dpi::Size;

    #[test]
    fn window_attributes_follow_config() {
        let mut config = Config::default();
        config.window.title = "Vulkan Triangle".to_string();
        config.window.width = 800;
        config.window.height = 600;

        let attributes = App::new(config).window_attributes();
        assert_eq!(attributes.title, "Vulkan Triangle");
        assert_eq!(
            attributes.inner_size,
            Some(Size::Logical(LogicalSize::new(800.0, 600.0)))
        );
    }

    #[test]
    fn fresh_app_has_no_context_or_error() {
        let mut app = App::new(Config::default());
        assert!(app.context().is_none());
        assert!(app.take_error().is_none());
    }
}
