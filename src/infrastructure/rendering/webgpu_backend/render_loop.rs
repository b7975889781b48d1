use super::*;
use crate::domain::errors::{BenchError, BenchResult};
use crate::domain::scene::ClipDepth;
use crate::infrastructure::rendering::gpu_structures::SceneUniforms;
use crate::infrastructure::rendering::timing::timestamps_to_millis;

const CLEAR_COLOR: wgpu::Color = wgpu::Color { r: 0.07, g: 0.08, b: 0.1, a: 1.0 };

impl WebGpuBackend {
    /// Settle a finished timestamp mapping, if any. Never waits.
    pub(super) fn poll_readback(&mut self) {
        let Some(state) = self.state.as_ref() else {
            return;
        };
        let _ = state.device.poll(wgpu::PollType::Poll);

        let Some(pending) = self.pending.as_mut() else {
            return;
        };
        let mapped = match pending.done.try_recv() {
            Ok(None) => return,
            Ok(Some(result)) => result.is_ok(),
            Err(_canceled) => false,
        };
        let token = pending.token;
        self.pending = None;

        let millis = match state.timestamps.as_ref() {
            Some(timestamps) if mapped => {
                let millis = {
                    let data = timestamps.readback_buffer.slice(..).get_mapped_range();
                    let read = |i: usize| {
                        data.get(i * 8..i * 8 + 8)
                            .and_then(|bytes| <[u8; 8]>::try_from(bytes).ok())
                            .map(u64::from_le_bytes)
                    };
                    match (read(0), read(1)) {
                        (Some(begin), Some(end)) => timestamps_to_millis(begin, end, timestamps.period_ns),
                        _ => None,
                    }
                };
                timestamps.readback_buffer.unmap();
                millis
            }
            _ => None,
        };

        if let Err(err) = self.readback.complete(token, millis) {
            crate::log_debug!(COMPONENT, "timestamp readback dropped: {}", err);
        }
    }

    /// Record and submit this frame's pass. Starts a timestamp readback when
    /// none is outstanding.
    pub(super) fn encode_and_submit(&mut self, scene: &dyn Scene) -> BenchResult<()> {
        let Some(state) = self.state.as_mut() else {
            return Ok(());
        };

        let frame = scene.frame();
        let aspect = state.config.width as f32 / state.config.height as f32;
        let uniforms = SceneUniforms::new(
            frame.projection(aspect, ClipDepth::ZeroToOne),
            frame.view(),
            frame.rotation,
            state.shading_iterations,
            self.elapsed_seconds as f32,
        );
        state.queue.write_buffer(&state.uniform_buffer, 0, bytemuck::cast_slice(&[uniforms]));

        let output = match state.surface.get_current_texture() {
            Ok(output) => output,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                state.surface.configure(&state.device, &state.config);
                return Err(BenchError::Rendering("surface lost, reconfigured".to_string()));
            }
            Err(e) => return Err(BenchError::Rendering(format!("surface texture: {}", e))),
        };
        let view = output.texture.create_view(&wgpu::TextureViewDescriptor::default());

        let token = match state.timestamps {
            Some(_) => self.readback.start(),
            None => None,
        };
        let timed = token.and(state.timestamps.as_ref());

        let mut encoder = state.device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("Bench Encoder"),
        });
        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Scene Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(CLEAR_COLOR),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &state.depth_view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Discard,
                    }),
                    stencil_ops: None,
                }),
                occlusion_query_set: None,
                timestamp_writes: timed.map(|timestamps| wgpu::RenderPassTimestampWrites {
                    query_set: &timestamps.query_set,
                    beginning_of_pass_write_index: Some(0),
                    end_of_pass_write_index: Some(1),
                }),
            });

            pass.set_pipeline(&state.pipeline);
            pass.set_bind_group(0, &state.uniform_bind_group, &[]);
            for mesh in state.meshes.iter().filter(|m| m.vertex_count > 0 && m.instance_count > 0) {
                pass.set_vertex_buffer(0, mesh.vertex_buffer.slice(..));
                pass.set_vertex_buffer(1, mesh.instance_buffer.slice(..));
                match state.draw {
                    DrawStrategy::Instanced => pass.draw(0..mesh.vertex_count, 0..mesh.instance_count),
                    DrawStrategy::PerObject => {
                        for i in 0..mesh.instance_count {
                            pass.draw(0..mesh.vertex_count, i..i + 1);
                        }
                    }
                }
            }
        }

        if let Some(timestamps) = timed {
            encoder.resolve_query_set(&timestamps.query_set, 0..2, &timestamps.resolve_buffer, 0);
            encoder.copy_buffer_to_buffer(
                &timestamps.resolve_buffer,
                0,
                &timestamps.readback_buffer,
                0,
                timestamps.resolve_buffer.size(),
            );
        }

        state.queue.submit(std::iter::once(encoder.finish()));
        output.present();

        if let (Some(token), Some(timestamps)) = (token, timed) {
            let (sender, done) = oneshot::channel();
            timestamps
                .readback_buffer
                .slice(..)
                .map_async(wgpu::MapMode::Read, move |result| {
                    let _ = sender.send(result);
                });
            self.pending = Some(PendingReadback { token, done });
        }
        Ok(())
    }
}
