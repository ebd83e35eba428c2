/// Convert (x, y) grid coordinates to a Hilbert curve index.
#[must_use]
pub fn xy_to_hilbert(x: u16, y: u16) -> u32 {
    let n = 1u32 << 16;
    let mut x = u32::from(x);
    let mut y = u32::from(y);
    let mut d = 0u32;

    let mut s = n / 2;
    while s > 0 {
        let rx = u32::from(x & s != 0);
        let ry = u32::from(y & s != 0);
        d += s * s * ((3 * rx) ^ ry);

        // Rotate the quadrant so the sub-curve has canonical orientation.
        if ry == 0 {
            if rx == 1 {
                x = n - 1 - x;
                y = n - 1 - y;
            }
            std::mem::swap(&mut x, &mut y);
        }
        s /= 2;
    }
    d
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn corners_are_distinct() {
        let corners = [
            xy_to_hilbert(0, 0),
            xy_to_hilbert(0, u16::MAX),
            xy_to_hilbert(u16::MAX, 0),
            xy_to_hilbert(u16::MAX, u16::MAX),
        ];
        for i in 0..4 {
            for j in i + 1..4 {
                assert_ne!(corners[i], corners[j]);
            }
        }
    }

    #[test]
    fn curve_starts_at_origin() {
        assert_eq!(xy_to_hilbert(0, 0), 0);
    }

    #[test]
    fn neighbours_stay_close() {
        let h = xy_to_hilbert(1000, 1000);
        let near = xy_to_hilbert(1001, 1000).abs_diff(h);
        let far = xy_to_hilbert(50000, 50000).abs_diff(h);
        assert!(near < far);
    }
}
