//! Pure calculation functions for downscale dimensions.
//!
//! All functions here are pure and testable without any I/O or images.

/// Calculate output dimensions for a downscale to a fixed target width,
/// preserving aspect ratio.
///
/// Height is rounded to the nearest pixel and never drops below 1 even for
/// extreme panoramas.
///
/// # Examples
/// ```
/// # use chalkboard::imaging::scaled_dimensions;
/// // 800x600 down to width 640 → 640x480
/// assert_eq!(scaled_dimensions((800, 600), 640), (640, 480));
/// ```
pub fn scaled_dimensions(source: (u32, u32), target_width: u32) -> (u32, u32) {
    let (src_w, src_h) = source;
    let ratio = target_width as f64 / src_w as f64;
    let h = (src_h as f64 * ratio).round() as u32;
    (target_width, h.max(1))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn landscape_exact_ratio() {
        // 800x600 (4:3) → 640x480
        assert_eq!(scaled_dimensions((800, 600), 640), (640, 480));
    }

    #[test]
    fn portrait_preserves_ratio() {
        // 1280x1920 (2:3) → 640x960
        assert_eq!(scaled_dimensions((1280, 1920), 640), (640, 960));
    }

    #[test]
    fn height_rounds_to_nearest() {
        // 1000x333 → 640x213.12 → 640x213
        assert_eq!(scaled_dimensions((1000, 333), 640), (640, 213));
    }

    #[test]
    fn square_stays_square() {
        assert_eq!(scaled_dimensions((2000, 2000), 640), (640, 640));
    }

    #[test]
    fn extreme_panorama_clamps_height_to_one() {
        // 100000x10 → height would round to 0 without the clamp
        assert_eq!(scaled_dimensions((100_000, 10), 640), (640, 1));
    }

    #[test]
    fn same_width_is_identity() {
        assert_eq!(scaled_dimensions((640, 427), 640), (640, 427));
    }
}
