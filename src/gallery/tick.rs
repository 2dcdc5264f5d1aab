//! One frame of gallery motion
//!
//! Order per frame:
//! 1. Apply the smoothed scroll sample (offset + rotation impulse)
//! 2. Move the camera opposite to the scroll offset
//! 3. Advance the spin

use super::state::{GalleryState, TickInput};

/// Advance the gallery by one frame
///
/// Rotation is per frame, like the display cadence that drives it. The
/// camera and the spin are updated together so a cancelled loop never
/// observes half a frame.
pub fn tick(state: &mut GalleryState, input: &TickInput) {
    if let Some(event) = input.scroll {
        let impulse = state.scroll.on_scroll(event);
        state.rotation.set_impulse(impulse);
    }

    state.camera.position.y = -state.scroll.camera_offset();
    state.rotation.advance();
    state.frame += 1;
}
