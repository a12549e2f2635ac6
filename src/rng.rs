//! PCG32 RNG for all procedural jitter.
//!
//! Shape generation is "seed-free" from the user's point of view: every
//! shuffle produces fresh values. Tests seed explicitly to stay
//! deterministic, and the wasm entry point seeds from browser entropy.

const PCG_MULT: u64 = 6364136223846793005;
const PCG_INC: u64 = 0x853c49e6748fea9b;

/// Small PCG32 stream, one per mounted renderer.
#[derive(Debug, Clone)]
pub struct Pcg32 {
    state: u64,
}

impl Pcg32 {
    pub fn new(seed: u64) -> Self {
        let mut rng = Self { state: 0 };
        rng.next_u32();
        rng.state = rng.state.wrapping_add(PCG_INC.wrapping_add(seed));
        rng.next_u32();
        rng
    }

    /// Seed from browser entropy (time + Math.random bits).
    #[cfg(target_arch = "wasm32")]
    pub fn from_entropy() -> Self {
        let now = js_sys::Date::now() as u64;
        let jitter = (js_sys::Math::random() * f64::from(u32::MAX)) as u64;
        Self::new(now ^ (jitter << 20))
    }

    pub fn next_u32(&mut self) -> u32 {
        let old = self.state;
        self.state = old.wrapping_mul(PCG_MULT).wrapping_add(PCG_INC | 1);
        let xorshifted = (((old >> 18) ^ old) >> 27) as u32;
        let rot = (old >> 59) as u32;
        xorshifted.rotate_right(rot)
    }

    /// Uniform float in [0, 1).
    pub fn next_f32(&mut self) -> f32 {
        let bits = (self.next_u32() >> 9) | 0x3f80_0000;
        f32::from_bits(bits) - 1.0
    }

    /// Uniform float in [lo, hi).
    pub fn uniform(&mut self, lo: f32, hi: f32) -> f32 {
        lo + self.next_f32() * (hi - lo)
    }

    /// Uniform integer in [lo, hi).
    pub fn uniform_usize(&mut self, lo: usize, hi: usize) -> usize {
        lo + (self.next_f32() * (hi - lo) as f32) as usize
    }
}
