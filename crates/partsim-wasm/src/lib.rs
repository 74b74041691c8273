use glam::Vec4;
use partsim_core::{RunMode, Scene, World};
use wasm_bindgen::prelude::*;

const ACTIVE: &str = "active";

/// GPU-compatible vertex: 48 bytes, matches the renderer's attribute layout.
#[repr(C)]
#[derive(Clone, Copy, bytemuck::Pod, bytemuck::Zeroable)]
struct RenderVertex {
    position: [f32; 4],  // 16 bytes
    color: [f32; 4],     // 16 bytes
    diameter: f32,       //  4 bytes
    render_mode: f32,    //  4 bytes
    _pad: [f32; 2],      //  8 bytes
}

#[wasm_bindgen]
pub struct ParticleWorld {
    world: World,
    vertices: Vec<RenderVertex>,
    lines: Vec<u32>,
}

#[wasm_bindgen]
impl ParticleWorld {
    /// Build one of the named demo scenes (`bouncy`, `cloth`, `reeves_fire`,
    /// `tornado`, `boids`, `falling`) with about `particle_count` particles.
    #[wasm_bindgen(constructor)]
    pub fn new(scene: &str, particle_count: usize) -> Result<ParticleWorld, JsError> {
        let kind = Scene::from_name(scene)
            .ok_or_else(|| JsError::new(&format!("unknown scene '{scene}'")))?;
        let mut system = kind
            .build(particle_count)
            .map_err(|e| JsError::new(&e.to_string()))?;

        let mut seed = [0u8; 8];
        if getrandom::getrandom(&mut seed).is_ok() {
            system.reseed(u64::from_le_bytes(seed));
        }

        web_sys::console::log_1(
            &format!(
                "WASM ParticleWorld created: {} ({} particles)",
                kind.name(),
                system.particle_count()
            )
            .into(),
        );
        for err in system.diagnostics() {
            web_sys::console::warn_1(&err.to_string().into());
        }

        let lines = system.line_indices().to_vec();
        let vertices = vec![bytemuck::Zeroable::zeroed(); system.particle_count()];
        let mut world = World::new();
        world.insert(ACTIVE, system);

        let mut out = ParticleWorld {
            world,
            vertices,
            lines,
        };
        out.write_vertices();
        Ok(out)
    }

    /// Advance by `dt_ms` milliseconds of wall time. Returns the time spent,
    /// in milliseconds.
    #[wasm_bindgen]
    pub fn step(&mut self, dt_ms: f32) -> f32 {
        let start = js_sys::Date::now();
        self.world.advance(dt_ms);
        self.write_vertices();
        let elapsed = js_sys::Date::now() - start;
        elapsed as f32
    }

    #[wasm_bindgen]
    pub fn pause(&mut self) {
        self.world.set_mode(ACTIVE, RunMode::Pause);
    }

    #[wasm_bindgen]
    pub fn resume(&mut self) {
        self.world.set_mode(ACTIVE, RunMode::Run);
    }

    /// Advance exactly one tick on the next `step`, then pause.
    #[wasm_bindgen]
    pub fn step_once(&mut self) {
        self.world.set_mode(ACTIVE, RunMode::StepOnce);
    }

    #[wasm_bindgen]
    pub fn reset(&mut self) {
        self.world.set_mode(ACTIVE, RunMode::Reset);
    }

    #[wasm_bindgen]
    pub fn is_paused(&self) -> bool {
        self.world.mode(ACTIVE) == Some(RunMode::Pause)
    }

    #[wasm_bindgen]
    pub fn get_vertex_buffer_ptr(&self) -> *const f32 {
        self.vertices.as_ptr() as *const f32
    }

    #[wasm_bindgen]
    pub fn get_vertex_buffer_byte_length(&self) -> usize {
        self.vertices.len() * std::mem::size_of::<RenderVertex>()
    }

    #[wasm_bindgen]
    pub fn get_line_index_ptr(&self) -> *const u32 {
        self.lines.as_ptr()
    }

    #[wasm_bindgen]
    pub fn get_line_index_count(&self) -> usize {
        self.lines.len()
    }

    #[wasm_bindgen]
    pub fn particle_count(&self) -> usize {
        self.vertices.len()
    }
}

// ---------- helper functions ----------

impl ParticleWorld {
    fn write_vertices(&mut self) {
        let Some(system) = self.world.get(ACTIVE) else {
            return;
        };
        let state = system.state();
        for (i, v) in self.vertices.iter_mut().enumerate() {
            let position: Vec4 = state.position4(i);
            let color: Vec4 = state.color(i);
            v.position = position.to_array();
            v.color = color.to_array();
            v.diameter = state.diameter(i);
            v.render_mode = f32::from(state.render_mode(i));
        }
    }
}
