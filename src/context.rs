use anyhow::Context as _;

use crate::{config::ComputeDevice, pipelines, resources::texture::material_layout};

/// Bind group layouts shared by every scene uploaded on a [`Context`].
#[derive(Debug)]
pub struct Layouts {
    pub material: wgpu::BindGroupLayout,
    pub camera: wgpu::BindGroupLayout,
    pub light: wgpu::BindGroupLayout,
}

/// Headless GPU context: adapter, device, queue and the scene pipeline.
///
/// There is no window or surface. Everything is rendered into offscreen
/// textures and read back.
#[derive(Debug)]
pub struct Context {
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,
    pub adapter_info: wgpu::AdapterInfo,
    pub layouts: Layouts,
    pub pipeline: wgpu::RenderPipeline,
    pub clear_colour: wgpu::Color,
}

impl Context {
    pub async fn new(compute_device: ComputeDevice) -> anyhow::Result<Self> {
        // The instance is a handle to our GPU
        // Backends::PRIMARY => Vulkan + Metal + DX12 + Browser WebGPU
        log::debug!("WGPU setup");
        let instance = wgpu::Instance::new(wgpu::InstanceDescriptor {
            backends: wgpu::Backends::PRIMARY,
            ..wgpu::InstanceDescriptor::new_without_display_handle()
        });

        let (power_preference, force_fallback_adapter) = match compute_device {
            ComputeDevice::Gpu => (wgpu::PowerPreference::HighPerformance, false),
            ComputeDevice::Cpu => (wgpu::PowerPreference::LowPower, true),
        };
        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference,
                compatible_surface: None,
                force_fallback_adapter,
            })
            .await
            .with_context(|| format!("no {compute_device:?} adapter available"))?;
        let adapter_info = adapter.get_info();
        log::info!(
            "Rendering on {} ({:?}, {:?})",
            adapter_info.name,
            adapter_info.device_type,
            adapter_info.backend
        );

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("grasp-synth device"),
                required_features: wgpu::Features::empty(),
                // Large renders need big readback buffers as well as big textures
                required_limits: wgpu::Limits {
                    max_buffer_size: adapter.limits().max_buffer_size,
                    ..wgpu::Limits::default().using_resolution(adapter.limits())
                },
                memory_hints: Default::default(),
                trace: wgpu::Trace::Off,
                experimental_features: wgpu::ExperimentalFeatures::disabled(),
            })
            .await
            .context("request device")?;

        let camera = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            }],
            label: Some("camera_bind_group_layout"),
        });
        let material = material_layout(&device);
        let light = pipelines::light::mk_bind_group_layout(&device);
        let pipeline = pipelines::basic::mk_basic_pipeline(&device, &material, &camera, &light);
        let [r, g, b] = pipelines::light::WORLD_COLOR.map(f64::from);

        Ok(Self {
            device,
            queue,
            adapter_info,
            layouts: Layouts {
                material,
                camera,
                light,
            },
            pipeline,
            clear_colour: wgpu::Color { r, g, b, a: 1.0 },
        })
    }

    /// Largest square image the device can render.
    pub fn max_resolution(&self) -> u32 {
        self.device.limits().max_texture_dimension_2d
    }
}
