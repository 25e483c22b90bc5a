use bytemuck::Zeroable;
use wgpu::util::DeviceExt;

use crate::scene::light::{LightKind, LightSpec, SPOT_BLEND, SPOT_SIZE_DEG};

/// Upper bound of lights the shader iterates over.
pub const MAX_LIGHTS: usize = 8;
/// Linear grey of the world background, also used as ambient light.
pub const WORLD_COLOR: [f32; 3] = [0.05, 0.05, 0.05];

pub struct LightResources {
    pub uniform: LightUniform,
    pub buffer: wgpu::Buffer,
    pub bind_group: wgpu::BindGroup,
}

impl LightResources {
    pub fn new(
        uniform: LightUniform,
        device: &wgpu::Device,
        bind_group_layout: &wgpu::BindGroupLayout,
    ) -> Self {
        let buffer = mk_buffer(device, uniform);
        let bind_group = mk_bind_group(device, bind_group_layout, &buffer);
        Self {
            uniform,
            buffer,
            bind_group,
        }
    }
}

#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct LightRaw {
    position: [f32; 3],
    kind: u32,
    color: [f32; 3],
    energy: f32,
    direction: [f32; 3],
    spot_cos_outer: f32,
    spot_cos_inner: f32,
    // Due to uniforms requiring 16 byte (4 float) spacing, we need to use padding fields here
    _padding: [f32; 3],
}

impl From<&LightSpec> for LightRaw {
    fn from(spec: &LightSpec) -> Self {
        let half_angle = (SPOT_SIZE_DEG * 0.5).to_radians();
        Self {
            position: spec.position,
            kind: spec.kind.shader_id(),
            color: spec.color,
            energy: spec.energy,
            direction: spec.direction(),
            spot_cos_outer: half_angle.cos(),
            spot_cos_inner: (half_angle * (1.0 - SPOT_BLEND)).cos(),
            _padding: [0.0; 3],
        }
    }
}

#[repr(C)]
#[derive(Debug, Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
pub struct LightUniform {
    lights: [LightRaw; MAX_LIGHTS],
    count: u32,
    _padding: [u32; 3],
    ambient: [f32; 4],
}

impl LightUniform {
    pub fn from_specs(specs: &[LightSpec]) -> anyhow::Result<Self> {
        anyhow::ensure!(
            specs.len() <= MAX_LIGHTS,
            "{} lights requested but at most {} are supported",
            specs.len(),
            MAX_LIGHTS
        );
        let mut lights = [LightRaw::zeroed(); MAX_LIGHTS];
        for (slot, spec) in lights.iter_mut().zip(specs) {
            *slot = spec.into();
        }
        Ok(Self {
            lights,
            count: specs.len() as u32,
            _padding: [0; 3],
            ambient: [WORLD_COLOR[0], WORLD_COLOR[1], WORLD_COLOR[2], 1.0],
        })
    }

    pub fn count(&self) -> usize {
        self.count as usize
    }

    pub fn kinds(&self) -> impl Iterator<Item = LightKind> + '_ {
        self.lights[..self.count()].iter().map(|l| match l.kind {
            1 => LightKind::Sun,
            2 => LightKind::Spot,
            _ => LightKind::Point,
        })
    }
}

pub fn mk_buffer(device: &wgpu::Device, light_uniform: LightUniform) -> wgpu::Buffer {
    device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
        label: Some("Light Buffer"),
        contents: bytemuck::cast_slice(&[light_uniform]),
        usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
    })
}

pub fn mk_bind_group_layout(device: &wgpu::Device) -> wgpu::BindGroupLayout {
    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
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
        label: Some("light_bind_group_layout"),
    })
}

pub fn mk_bind_group(
    device: &wgpu::Device,
    bind_group_layout: &wgpu::BindGroupLayout,
    light_buffer: &wgpu::Buffer,
) -> wgpu::BindGroup {
    device.create_bind_group(&wgpu::BindGroupDescriptor {
        layout: bind_group_layout,
        entries: &[wgpu::BindGroupEntry {
            binding: 0,
            resource: light_buffer.as_entire_binding(),
        }],
        label: Some("light_bind_group"),
    })
}
