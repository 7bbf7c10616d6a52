use std::sync::Arc;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt};
use vkinit::{Config, SystemInfo};
use winit::application::ApplicationHandler;
use winit::dpi::LogicalSize;
use winit::event::WindowEvent;
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::window::{Window, WindowAttributes, WindowId};

#[derive(Default, Debug)]
struct App {
    window: Option<Arc<Window>>,
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }

        let config = Config::default();
        let attributes = WindowAttributes::default()
            .with_title("Vulkan Build Test")
            .with_inner_size(LogicalSize::new(config.window.width, config.window.height));

        match event_loop.create_window(attributes) {
            Ok(window) => {
                self.window.replace(Arc::new(window));
            }
            Err(err) => {
                tracing::error!("Could not create window: {err}");
                event_loop.exit();
            }
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        if let WindowEvent::CloseRequested = event {
            event_loop.exit();
        }
    }
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::from_default_env())
        .init();

    let entry = unsafe { ash::Entry::load() }?;
    let system_info = SystemInfo::get_system_info(&entry)?;

    println!("{} extensions supported", system_info.available_extensions.len());
    for name in system_info.extension_names() {
        println!("\t{}", name.to_string_lossy());
    }

    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Wait);
    let mut app = App::default();
    event_loop.run_app(&mut app)?;

    Ok(())
}
