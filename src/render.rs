//! Offscreen rendering, sample accumulation and image output.
//!
//! Every sample renders the whole scene into an offscreen sRGB texture with
//! the projection shifted by a sub-pixel offset. The texture is copied into a
//! mappable buffer, decoded to linear light and summed. The average of all
//! samples is encoded back to sRGB and written as PNG.

use std::{iter, path::Path, time::Duration};

use anyhow::{Context as _, ensure};
use wgpu::util::DeviceExt;

use crate::{
    camera::{CameraUniform, Projection, sample_jitter},
    context::Context,
    data_structures::{model::DrawModel, texture::Texture},
    scene::Scene,
};

/// Upper bound for waiting on the GPU to finish a single sample.
const SAMPLE_TIMEOUT: Duration = Duration::from_secs(60);

/// Where and how an image was written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderOutput {
    pub path: std::path::PathBuf,
    pub width: u32,
    pub height: u32,
    pub samples: u32,
}

/// Rows copied out of a texture have to be aligned to 256 bytes.
pub fn padded_bytes_per_row(width: u32) -> u32 {
    let unpadded = width * 4;
    let align = wgpu::COPY_BYTES_PER_ROW_ALIGNMENT;
    unpadded.div_ceil(align) * align
}

pub fn srgb_to_linear(v: u8) -> f32 {
    let c = v as f32 / 255.0;
    if c <= 0.04045 {
        c / 12.92
    } else {
        ((c + 0.055) / 1.055).powf(2.4)
    }
}

pub fn linear_to_srgb(v: f32) -> u8 {
    let c = v.clamp(0.0, 1.0);
    let encoded = if c <= 0.003_130_8 {
        c * 12.92
    } else {
        1.055 * c.powf(1.0 / 2.4) - 0.055
    };
    (encoded * 255.0).round() as u8
}

/// Running sum of rendered samples in linear light.
pub struct Accumulator {
    width: u32,
    height: u32,
    sums: Vec<f32>,
    frames: u32,
    srgb_lut: [f32; 256],
}

impl Accumulator {
    pub fn new(width: u32, height: u32) -> Self {
        let mut srgb_lut = [0.0; 256];
        for (i, v) in srgb_lut.iter_mut().enumerate() {
            *v = srgb_to_linear(i as u8);
        }
        Self {
            width,
            height,
            sums: vec![0.0; (width * height * 4) as usize],
            frames: 0,
            srgb_lut,
        }
    }

    /// Adds one frame of sRGB-encoded RGBA rows, each `bytes_per_row` long.
    pub fn add_padded(&mut self, data: &[u8], bytes_per_row: u32) {
        let row_len = (self.width * 4) as usize;
        for y in 0..self.height as usize {
            let row = &data[y * bytes_per_row as usize..][..row_len];
            let sums = &mut self.sums[y * row_len..][..row_len];
            for (i, (sum, &byte)) in sums.iter_mut().zip(row).enumerate() {
                // Alpha is stored linearly
                *sum += if i % 4 == 3 {
                    byte as f32 / 255.0
                } else {
                    self.srgb_lut[byte as usize]
                };
            }
        }
        self.frames += 1;
    }

    pub fn frames(&self) -> u32 {
        self.frames
    }

    pub fn finish(&self) -> image::RgbaImage {
        let n = self.frames.max(1) as f32;
        let pixels = self
            .sums
            .iter()
            .enumerate()
            .map(|(i, sum)| {
                let mean = sum / n;
                if i % 4 == 3 {
                    (mean.clamp(0.0, 1.0) * 255.0).round() as u8
                } else {
                    linear_to_srgb(mean)
                }
            })
            .collect();
        image::RgbaImage::from_raw(self.width, self.height, pixels)
            .unwrap_or_else(|| image::RgbaImage::new(self.width, self.height))
    }
}

/// Size in bytes of the buffer a `width`x`height` frame is read back into.
pub fn readback_size(width: u32, height: u32) -> u64 {
    padded_bytes_per_row(width) as u64 * height as u64
}

/// Rejects sizes the device cannot render or read back.
pub fn check_resolution(size: [u32; 2], limits: &wgpu::Limits) -> anyhow::Result<()> {
    let [width, height] = size;
    ensure!(width > 0 && height > 0, "resolution must not be zero, got {width}x{height}");
    let max = limits.max_texture_dimension_2d;
    ensure!(
        width <= max && height <= max,
        "resolution {width}x{height} exceeds the device limit of {max}"
    );
    let bytes = readback_size(width, height);
    ensure!(
        bytes <= limits.max_buffer_size,
        "resolution {width}x{height} needs a {bytes} byte readback buffer, the device allows {}",
        limits.max_buffer_size
    );
    Ok(())
}

/// Renders `scene` at `size` with `samples` jittered passes.
pub async fn render_image(
    ctx: &Context,
    scene: &Scene,
    size: [u32; 2],
    samples: u32,
) -> anyhow::Result<image::RgbaImage> {
    let [width, height] = size;
    check_resolution(size, &ctx.device.limits())?;

    let projection = Projection::new(width, height);
    let color = Texture::create_render_target(&ctx.device, size, "Render Target");
    let depth = Texture::create_depth_texture(&ctx.device, size, "Render Depth");

    let mut camera_uniform = CameraUniform::new();
    camera_uniform.update_view_proj(&scene.description().camera, &projection, [0.0, 0.0]);
    let camera_buffer = ctx
        .device
        .create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Camera Buffer"),
            contents: bytemuck::cast_slice(&[camera_uniform]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });
    let camera_bind_group = ctx.device.create_bind_group(&wgpu::BindGroupDescriptor {
        layout: &ctx.layouts.camera,
        entries: &[wgpu::BindGroupEntry {
            binding: 0,
            resource: camera_buffer.as_entire_binding(),
        }],
        label: Some("camera_bind_group"),
    });

    let bytes_per_row = padded_bytes_per_row(width);
    let output_buffer = ctx.device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("Render Readback Buffer"),
        size: readback_size(width, height),
        usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
        mapped_at_creation: false,
    });

    let mut accumulator = Accumulator::new(width, height);
    for sample in 0..samples {
        camera_uniform.update_view_proj(
            &scene.description().camera,
            &projection,
            sample_jitter(sample, samples),
        );
        ctx.queue
            .write_buffer(&camera_buffer, 0, bytemuck::cast_slice(&[camera_uniform]));

        let mut encoder = ctx
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Render Encoder"),
            });
        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Render Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &color.view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(ctx.clear_colour),
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &depth.view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                occlusion_query_set: None,
                timestamp_writes: None,
                multiview_mask: None,
            });

            render_pass.set_pipeline(&ctx.pipeline);
            for placed in &scene.objects {
                render_pass.set_vertex_buffer(1, placed.transform.slice(..));
                render_pass.draw_model_instanced(
                    &placed.model,
                    0..1,
                    &camera_bind_group,
                    &scene.light.bind_group,
                );
            }
        }

        encoder.copy_texture_to_buffer(
            wgpu::TexelCopyTextureInfo {
                aspect: wgpu::TextureAspect::All,
                texture: &color.texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
            },
            wgpu::TexelCopyBufferInfo {
                buffer: &output_buffer,
                layout: wgpu::TexelCopyBufferLayout {
                    offset: 0,
                    bytes_per_row: Some(bytes_per_row),
                    rows_per_image: Some(height),
                },
            },
            wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
        );
        ctx.queue.submit(iter::once(encoder.finish()));

        read_back(ctx, &output_buffer, |data| {
            accumulator.add_padded(data, bytes_per_row)
        })
        .await
        .with_context(|| format!("read back sample {} of {}", sample + 1, samples))?;

        if samples >= 16 && (sample + 1) % (samples / 4) == 0 {
            log::info!("Rendered {}/{} samples", sample + 1, samples);
        }
    }

    Ok(accumulator.finish())
}

/// Maps `buffer`, hands its contents to `f` and unmaps it again.
async fn read_back(
    ctx: &Context,
    buffer: &wgpu::Buffer,
    f: impl FnOnce(&[u8]),
) -> anyhow::Result<()> {
    let (tx, rx) = futures_intrusive::channel::shared::oneshot_channel();
    let buffer_slice = buffer.slice(..);
    buffer_slice.map_async(wgpu::MapMode::Read, move |result| {
        // The receiver only disappears if the render was abandoned
        let _ = tx.send(result);
    });
    ctx.device
        .poll(wgpu::PollType::Wait {
            submission_index: None,
            timeout: Some(SAMPLE_TIMEOUT),
        })
        .context("wait for the GPU")?;
    rx.receive()
        .await
        .context("mapping callback was dropped")?
        .context("map readback buffer")?;
    {
        let data = buffer_slice.get_mapped_range();
        f(&data);
    }
    buffer.unmap();
    Ok(())
}

pub fn write_png(image: &image::RgbaImage, path: &Path) -> anyhow::Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create output directory {}", parent.display()))?;
    }
    image
        .save_with_format(path, image::ImageFormat::Png)
        .with_context(|| format!("write {}", path.display()))
}
