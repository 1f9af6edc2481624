//! WgpuContext - Device and Queue wrapper
//!
//! Adapter and device selection for both the windowed and the headless
//! backend. The surface, when there is one, must come from the same
//! instance the adapter is requested from.

use anyhow::Context as _;
use std::sync::Arc;

/// Device and queue shared by every GPU resource of the renderer.
#[derive(Clone)]
pub struct WgpuContext {
    pub device: Arc<wgpu::Device>,
    pub queue: Arc<wgpu::Queue>,
    /// Name and backend of the selected adapter.
    pub adapter_info: wgpu::AdapterInfo,
}

impl WgpuContext {
    /// Instance with every backend enabled.
    pub fn instance() -> wgpu::Instance {
        wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        })
    }

    /// Request an adapter and device from `instance`.
    pub async fn request(
        instance: &wgpu::Instance,
        compatible_surface: Option<&wgpu::Surface<'_>>,
    ) -> anyhow::Result<(Self, wgpu::Adapter)> {
        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface,
                force_fallback_adapter: false,
            })
            .await
            .context("no suitable GPU adapter")?;

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("umbra device"),
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::default(),
                memory_hints: wgpu::MemoryHints::Performance,
                trace: Default::default(),
                experimental_features: Default::default(),
            })
            .await
            .context("failed to create GPU device")?;

        let adapter_info = adapter.get_info();
        tracing::info!(
            adapter = %adapter_info.name,
            backend = ?adapter_info.backend,
            "GPU device ready"
        );

        let context = Self {
            device: Arc::new(device),
            queue: Arc::new(queue),
            adapter_info,
        };
        Ok((context, adapter))
    }

    /// Blocking context without a presentable surface.
    pub fn headless() -> anyhow::Result<Self> {
        let instance = Self::instance();
        let (context, _) = pollster::block_on(Self::request(&instance, None))?;
        Ok(context)
    }

    pub fn submit<I: IntoIterator<Item = wgpu::CommandBuffer>>(&self, command_buffers: I) {
        self.queue.submit(command_buffers);
    }

    pub fn create_encoder(&self, label: Option<&str>) -> wgpu::CommandEncoder {
        self.device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor { label })
    }
}

impl std::fmt::Debug for WgpuContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WgpuContext")
            .field("adapter", &self.adapter_info.name)
            .finish()
    }
}
