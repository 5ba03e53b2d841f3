/// Out-of-range texel policy of a [`crate::Texture`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum AddressMode {
    /// Repeat the edge texel.
    #[default]
    Clamp,
    /// Reflect around the edge, repeating the edge texel (`cba|abc|cba`).
    Mirror,
    /// Every out-of-range texel reads as the given value on all channels.
    Border(u16),
}

/// Maps a possibly out-of-range texel index into `[0, len)`.
///
/// Returns `None` for an empty axis or when `mode` is [`AddressMode::Border`]
/// and `i` falls outside the plane.
pub fn map_index(i: isize, len: usize, mode: AddressMode) -> Option<usize> {
    if len == 0 {
        return None;
    }

    match mode {
        AddressMode::Border(_) => {
            if i < 0 || i >= len as isize {
                None
            } else {
                Some(i as usize)
            }
        }
        AddressMode::Clamp => {
            if i < 0 {
                Some(0)
            } else {
                Some((i as usize).min(len - 1))
            }
        }
        AddressMode::Mirror => {
            let period = (2 * len) as isize;
            let r = i.rem_euclid(period) as usize;
            if r < len {
                Some(r)
            } else {
                Some(2 * len - 1 - r)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{AddressMode, map_index};

    #[test]
    fn clamp_mapping_handles_negative_and_overflow() {
        let mode = AddressMode::Clamp;

        assert_eq!(map_index(-3, 5, mode), Some(0));
        assert_eq!(map_index(-1, 5, mode), Some(0));
        assert_eq!(map_index(0, 5, mode), Some(0));
        assert_eq!(map_index(4, 5, mode), Some(4));
        assert_eq!(map_index(5, 5, mode), Some(4));
        assert_eq!(map_index(99, 5, mode), Some(4));
    }

    #[test]
    fn mirror_repeats_edge_texel() {
        let mode = AddressMode::Mirror;

        for i in -6..=6 {
            assert_eq!(map_index(i, 1, mode), Some(0));
        }

        let cases_len3 = [
            (-4, 2),
            (-3, 2),
            (-2, 1),
            (-1, 0),
            (0, 0),
            (1, 1),
            (2, 2),
            (3, 2),
            (4, 1),
            (5, 0),
            (6, 0),
        ];
        for (i, expected) in cases_len3 {
            assert_eq!(map_index(i, 3, mode), Some(expected), "index {i}");
        }
    }

    #[test]
    fn border_and_empty_axes_have_no_mapping() {
        let mode = AddressMode::Border(7);

        assert_eq!(map_index(-1, 4, mode), None);
        assert_eq!(map_index(4, 4, mode), None);
        assert_eq!(map_index(2, 4, mode), Some(2));
        assert_eq!(map_index(0, 0, AddressMode::Clamp), None);
    }
}
