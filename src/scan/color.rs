use image::{imageops, RgbImage};

const THUMBNAIL_WIDTH: u32 = 64;

/// Mean RGB of a frame. Large frames are downscaled first.
pub fn average_color(frame: &RgbImage) -> Option<[u8; 3]> {
    let (width, height) = frame.dimensions();
    if width == 0 || height == 0 {
        return None;
    }

    let scaled;
    let frame = if width > THUMBNAIL_WIDTH {
        let thumb_height = (u64::from(height) * u64::from(THUMBNAIL_WIDTH) / u64::from(width)).max(1);
        scaled = imageops::thumbnail(frame, THUMBNAIL_WIDTH, thumb_height as u32);
        &scaled
    } else {
        frame
    };

    let mut sums = [0u64; 3];
    for pixel in frame.pixels() {
        for (sum, channel) in sums.iter_mut().zip(pixel.0) {
            *sum += u64::from(channel);
        }
    }

    let count = u64::from(frame.width()) * u64::from(frame.height());
    Some(sums.map(|sum| ((sum + count / 2) / count) as u8))
}
