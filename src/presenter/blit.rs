//! Letterboxed composition of a page surface into a window buffer

use crate::pdf::{PixelSize, Surface, Viewport};

/// Where a surface lands inside a window
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Placement {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

/// Center `size` in `window`. Oversized surfaces are anchored at the origin
/// and cropped.
pub fn center(size: PixelSize, window: Viewport) -> Placement {
    let width = size.width.min(window.width);
    let height = size.height.min(window.height);
    Placement {
        x: (window.width - width) / 2,
        y: (window.height - height) / 2,
        width,
        height,
    }
}

/// Paint `background` over the whole buffer, then the surface centered in it.
///
/// `buffer` is row-major `0x00RRGGBB`, `window.width * window.height` long.
pub fn compose(
    surface: Option<&Surface>,
    window: Viewport,
    background: u32,
    buffer: &mut [u32],
) -> Option<Placement> {
    buffer.fill(background);

    let surface = surface?;
    let placement = center(surface.size(), window);
    let stride = window.width as usize;

    for row in 0..placement.height {
        let start = (placement.y + row) as usize * stride + placement.x as usize;
        let Some(line) = buffer.get_mut(start..start + placement.width as usize) else {
            break;
        };
        for (col, px) in line.iter_mut().enumerate() {
            *px = surface.xrgb_at(col as u32, row);
        }
    }

    Some(placement)
}

/// Parse `#RRGGBB` (leading `#` optional) into `0x00RRGGBB`
pub fn parse_colour(text: &str) -> Option<u32> {
    let hex = text.trim().trim_start_matches('#');
    if hex.len() != 6 {
        return None;
    }
    u32::from_str_radix(hex, 16).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn centers_with_letterbox_on_free_axis() {
        let placement = center(PixelSize::new(464, 600), Viewport::new(800, 600));
        assert_eq!(
            placement,
            Placement {
                x: 168,
                y: 0,
                width: 464,
                height: 600
            }
        );
    }

    #[test]
    fn compose_fills_bars_with_background() {
        let surface = Surface::filled(PixelSize::new(2, 2), [0xFF, 0xFF, 0xFF]);
        let window = Viewport::new(4, 2);
        let mut buffer = vec![0xDEAD_BEEF; 8];

        compose(Some(&surface), window, 0x0000_0000, &mut buffer);

        assert_eq!(
            buffer,
            vec![0, 0xFFFFFF, 0xFFFFFF, 0, 0, 0xFFFFFF, 0xFFFFFF, 0]
        );
    }

    #[test]
    fn compose_without_surface_is_blank() {
        let mut buffer = vec![1; 6];
        assert!(compose(None, Viewport::new(3, 2), 0x101010, &mut buffer).is_none());
        assert!(buffer.iter().all(|&px| px == 0x101010));
    }

    #[test]
    fn parses_hex_colours() {
        assert_eq!(parse_colour("#000000"), Some(0));
        assert_eq!(parse_colour("1a2B3c"), Some(0x1A2B3C));
        assert_eq!(parse_colour("#fff"), None);
        assert_eq!(parse_colour("#gggggg"), None);
    }
}
