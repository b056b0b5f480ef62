use glam::IVec2;
use homestead_common::{GridPos, ItemRotation};

/// Largest width or height an item may have, in cells.
pub const MAX_ITEM_EXTENT: u32 = 1024;

/// Errors from footprint computation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GeometryError {
    #[error("item has no size: {width}x{height}")]
    DegenerateItem { width: u32, height: u32 },
    #[error("item is too large: {width}x{height} (max {} per side)", MAX_ITEM_EXTENT)]
    OversizedItem { width: u32, height: u32 },
}

/// Compute the cell offsets an item of `width` x `height` covers when rotated.
///
/// Offsets are relative to the item's anchor cell. Cells are emitted in
/// row-major order of the loop below so the result is stable across calls.
pub fn footprint(
    width: u32,
    height: u32,
    rotation: ItemRotation,
) -> Result<Vec<IVec2>, GeometryError> {
    if width == 0 || height == 0 {
        return Err(GeometryError::DegenerateItem { width, height });
    }

    if width == 1 && height == 1 {
        return Ok(vec![IVec2::ZERO]);
    }

    let oversized = || GeometryError::OversizedItem { width, height };
    if width > MAX_ITEM_EXTENT || height > MAX_ITEM_EXTENT {
        return Err(oversized());
    }
    let w = i32::try_from(width).map_err(|_| oversized())?;
    let h = i32::try_from(height).map_err(|_| oversized())?;
    let count = width.checked_mul(height).ok_or_else(oversized)?;
    let mut cells = Vec::with_capacity(count as usize);

    match rotation {
        ItemRotation::North => {
            for x in 0..w {
                for y in 0..h {
                    cells.push(IVec2::new(x, y));
                }
            }
        }
        ItemRotation::South => {
            for x in 0..w {
                for y in 0..h {
                    cells.push(IVec2::new(x, -y));
                }
            }
        }
        ItemRotation::East => {
            for x in 0..h {
                for y in 0..w {
                    cells.push(IVec2::new(x, y));
                }
            }
        }
        ItemRotation::West => {
            for x in 0..h {
                for y in 0..w {
                    cells.push(IVec2::new(-x, y));
                }
            }
        }
    }

    Ok(cells)
}

/// Translate footprint offsets by an anchor cell.
pub fn global_cells(anchor: GridPos, footprint: &[IVec2]) -> Vec<GridPos> {
    footprint.iter().map(|offset| anchor + *offset).collect()
}

/// Footprint of an item anchored at `anchor`, in world grid cells.
pub fn footprint_cells(
    anchor: GridPos,
    width: u32,
    height: u32,
    rotation: ItemRotation,
) -> Result<Vec<GridPos>, GeometryError> {
    let offsets = footprint(width, height, rotation)?;
    Ok(global_cells(anchor, &offsets))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::collections::HashSet;

    fn set(cells: Vec<IVec2>) -> HashSet<(i32, i32)> {
        cells.into_iter().map(|c| (c.x, c.y)).collect()
    }

    #[test]
    fn single_cell_ignores_rotation() {
        for rotation in ItemRotation::ALL {
            assert_eq!(footprint(1, 1, rotation).unwrap(), vec![IVec2::ZERO]);
        }
    }

    #[test]
    fn north_covers_positive_quadrant() {
        let cells = set(footprint(2, 3, ItemRotation::North).unwrap());
        let expected: HashSet<_> = [(0, 0), (0, 1), (0, 2), (1, 0), (1, 1), (1, 2)]
            .into_iter()
            .collect();
        assert_eq!(cells, expected);
    }

    #[test]
    fn south_mirrors_only_y() {
        let cells = set(footprint(2, 2, ItemRotation::South).unwrap());
        let expected: HashSet<_> = [(0, 0), (0, -1), (1, 0), (1, -1)].into_iter().collect();
        assert_eq!(cells, expected);
    }

    #[test]
    fn east_swaps_extents() {
        let cells = set(footprint(3, 1, ItemRotation::East).unwrap());
        let expected: HashSet<_> = [(0, 0), (0, 1), (0, 2)].into_iter().collect();
        assert_eq!(cells, expected);
    }

    #[test]
    fn west_swaps_extents_and_mirrors_x() {
        let cells = set(footprint(1, 2, ItemRotation::West).unwrap());
        let expected: HashSet<_> = [(0, 0), (-1, 0)].into_iter().collect();
        assert_eq!(cells, expected);
    }

    #[test]
    fn zero_extent_is_degenerate() {
        assert_eq!(
            footprint(0, 2, ItemRotation::North),
            Err(GeometryError::DegenerateItem {
                width: 0,
                height: 2
            })
        );
        assert!(footprint(2, 0, ItemRotation::West).is_err());
        assert!(footprint_cells(IVec2::ZERO, 0, 0, ItemRotation::South).is_err());
    }

    #[test]
    fn oversized_extent_is_rejected() {
        for (w, h) in [(u32::MAX, 1), (1, u32::MAX), (u32::MAX, u32::MAX), (MAX_ITEM_EXTENT + 1, 2)] {
            assert_eq!(
                footprint(w, h, ItemRotation::East),
                Err(GeometryError::OversizedItem { width: w, height: h })
            );
        }
        let widest = footprint(MAX_ITEM_EXTENT, 1, ItemRotation::North).unwrap();
        assert_eq!(widest.len(), MAX_ITEM_EXTENT as usize);
    }

    #[test]
    fn global_cells_translate_by_anchor() {
        let cells = footprint_cells(IVec2::new(10, -4), 2, 1, ItemRotation::North).unwrap();
        assert_eq!(cells, vec![IVec2::new(10, -4), IVec2::new(11, -4)]);
    }

    proptest! {
        #[test]
        fn footprint_is_never_empty(w in 1u32..12, h in 1u32..12, r in 0usize..4) {
            let cells = footprint(w, h, ItemRotation::ALL[r]).unwrap();
            prop_assert!(!cells.is_empty());
        }

        #[test]
        fn footprint_has_no_duplicate_cells(w in 1u32..12, h in 1u32..12, r in 0usize..4) {
            let cells = footprint(w, h, ItemRotation::ALL[r]).unwrap();
            let unique = set(cells.clone());
            prop_assert_eq!(unique.len(), cells.len());
        }

        #[test]
        fn east_matches_swapped_north_cardinality(w in 1u32..12, h in 1u32..12) {
            let east = footprint(w, h, ItemRotation::East).unwrap();
            let north = footprint(h, w, ItemRotation::North).unwrap();
            prop_assert_eq!(east.len(), north.len());
        }

        #[test]
        fn anchor_is_always_covered(w in 1u32..12, h in 1u32..12, r in 0usize..4) {
            let cells = footprint(w, h, ItemRotation::ALL[r]).unwrap();
            prop_assert!(cells.contains(&IVec2::ZERO));
        }
    }
}
