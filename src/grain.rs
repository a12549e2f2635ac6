//! Static film-grain noise field.
//!
//! Generated once per resolution change and sampled every frame by the
//! shader at the undistorted screen UV. Re-randomizing per frame would read
//! as TV static instead of grain, so the field is deliberately stable.

use crate::raster::{RasterError, RasterSurface};
use crate::rng::Pcg32;

/// Per-pixel uniform luminance noise, opaque alpha.
pub fn generate_grain(width: u32, height: u32, rng: &mut Pcg32) -> Result<RasterSurface, RasterError> {
    let mut surface = RasterSurface::new(width, height)?;
    for px in surface.data_mut().chunks_exact_mut(4) {
        let noise = (rng.next_f32() * 255.0) as u8;
        px[0] = noise;
        px[1] = noise;
        px[2] = noise;
        px[3] = 0xff;
    }
    Ok(surface)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grain_is_gray_and_opaque() {
        let mut rng = Pcg32::new(123);
        let grain = generate_grain(32, 32, &mut rng).unwrap();
        for px in grain.data().chunks_exact(4) {
            assert_eq!(px[0], px[1]);
            assert_eq!(px[1], px[2]);
            assert_eq!(px[3], 0xff);
        }
    }

    #[test]
    fn grain_covers_the_value_range() {
        let mut rng = Pcg32::new(9);
        let grain = generate_grain(64, 64, &mut rng).unwrap();
        let values: Vec<u8> = grain.data().chunks_exact(4).map(|px| px[0]).collect();
        assert!(values.iter().any(|&v| v < 32));
        assert!(values.iter().any(|&v| v > 224));
    }

    #[test]
    fn zero_size_is_an_error() {
        let mut rng = Pcg32::new(9);
        assert!(generate_grain(0, 10, &mut rng).is_err());
    }
}
