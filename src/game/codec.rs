use super::types::Coordinate;

pub type Key = u32;

const AXIS_BITS: u32 = 16;
const AXIS_MASK: u32 = (1 << AXIS_BITS) - 1;

/// Packs x into the high 16 bits and y into the low 16 bits.
///
/// Axes outside `0..=65535` are masked and alias onto in-range cells.
pub fn encode(x: i32, y: i32) -> Key {
    ((x as u32 & AXIS_MASK) << AXIS_BITS) | (y as u32 & AXIS_MASK)
}

pub fn decode(key: Key) -> (i32, i32) {
    ((key >> AXIS_BITS) as i32, (key & AXIS_MASK) as i32)
}

pub fn encode_point(point: Coordinate) -> Key {
    encode(point.x, point.y)
}

pub fn decode_point(key: Key) -> Coordinate {
    let (x, y) = decode(key);
    Coordinate { x, y }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_inverts_encode_across_axis_range() {
        for x in (0..=65535).step_by(257) {
            for y in (0..=65535).step_by(509) {
                assert_eq!(decode(encode(x, y)), (x, y));
            }
        }
        assert_eq!(decode(encode(65535, 65535)), (65535, 65535));
        assert_eq!(decode(encode(0, 0)), (0, 0));
    }

    #[test]
    fn x_lands_in_high_bits() {
        assert_eq!(encode(1, 0), 1 << 16);
        assert_eq!(encode(0, 1), 1);
        assert_eq!(encode(40, 30), (40 << 16) | 30);
    }

    #[test]
    fn out_of_range_axes_alias() {
        assert_eq!(encode(65536, 3), encode(0, 3));
        assert_eq!(decode(encode(-1, 0)), (65535, 0));
    }
}
