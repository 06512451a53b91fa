//! Packs a fractional machine count into a grid of unit cells.
//!
//! Rows are grouped in pairs: every second row boundary gets an extra
//! `row_padding` gap, and the column count is tuned so that multi-row grids
//! have an even number of rows.

use serde::Serialize;

/// Biases the initial column estimate towards wider-than-tall grids.
const COLUMN_BIAS: f32 = 1.5;

/// Pixel parameters for one packing run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridSpec {
    pub unit_width: f32,
    pub unit_height: f32,
    pub unit_padding: f32,
    pub row_padding: f32,
    pub outer_padding: f32,
    pub top_padding: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct UnitCell {
    pub index: usize,
    pub column: usize,
    pub row: usize,
    /// Filled fraction of this unit, in `(0, 1]`.
    pub occupancy: f32,
    pub width: f32,
    pub height: f32,
    pub x: f32,
    pub y: f32,
}

impl UnitCell {
    pub fn is_partial(&self) -> bool {
        self.occupancy < 1.0
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GridPacking {
    pub columns: usize,
    pub rows: usize,
    pub cells: Vec<UnitCell>,
    pub width: f32,
    pub height: f32,
}

/// Column count for `cell_count` units, including the row-parity correction.
pub fn grid_columns(cell_count: usize) -> usize {
    if cell_count == 0 {
        return 0;
    }
    let estimate = ((cell_count as f32).sqrt() * COLUMN_BIAS).ceil() as usize;
    let mut columns = cell_count.min(estimate.max(1));

    let rows = cell_count.div_ceil(columns);
    if rows > 1 && rows % 2 == 1 {
        columns = cell_count.div_ceil(rows - 1);
    } else if rows == 2 && cell_count % columns == 1 {
        // A lone unit on the second row reads badly; collapse to one row.
        // Tuning heuristic: large counts that hit this branch get very wide.
        columns = cell_count;
    }
    columns
}

pub fn pack_units(count: f32, spec: &GridSpec) -> GridPacking {
    let count = if count.is_finite() { count.max(0.0) } else { 0.0 };
    let cell_count = count.ceil() as usize;
    if cell_count == 0 {
        return GridPacking {
            columns: 0,
            rows: 0,
            cells: Vec::new(),
            width: spec.outer_padding * 2.0,
            height: spec.top_padding + spec.outer_padding,
        };
    }

    let columns = grid_columns(cell_count);
    let rows = cell_count.div_ceil(columns);
    let step_x = spec.unit_width + spec.unit_padding;
    let step_y = spec.unit_height + spec.unit_padding;

    let cells = (0..cell_count)
        .map(|index| {
            let column = index % columns;
            let row = index / columns;
            UnitCell {
                index,
                column,
                row,
                occupancy: (count - index as f32).min(1.0),
                width: spec.unit_width,
                height: spec.unit_height,
                x: spec.outer_padding + column as f32 * step_x,
                y: spec.top_padding + row as f32 * step_y + (row / 2) as f32 * spec.row_padding,
            }
        })
        .collect();

    let width = step_x * columns as f32 + spec.outer_padding * 2.0;
    let height = step_y * rows as f32 - spec.unit_padding
        + spec.top_padding
        + spec.outer_padding
        + ((rows - 1) / 2) as f32 * spec.row_padding;

    GridPacking {
        columns,
        rows,
        cells,
        width,
        height,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::collections::HashSet;

    fn spec() -> GridSpec {
        GridSpec {
            unit_width: 100.0,
            unit_height: 100.0,
            unit_padding: 15.0,
            row_padding: 30.0,
            outer_padding: 10.0,
            top_padding: 40.0,
        }
    }

    #[test]
    fn zero_count_is_empty() {
        let packed = pack_units(0.0, &spec());
        assert!(packed.cells.is_empty());
        assert_eq!(packed.columns, 0);
        assert_eq!(packed.width, 20.0);
        assert_eq!(packed.height, 50.0);
    }

    #[test]
    fn fractional_count_gets_partial_last_unit() {
        let packed = pack_units(2.5, &spec());
        let occupancies: Vec<f32> = packed.cells.iter().map(|c| c.occupancy).collect();
        assert_eq!(occupancies, vec![1.0, 1.0, 0.5]);
        assert_eq!(packed.columns, 3);
        assert_eq!(packed.rows, 1);
        assert!(packed.cells[2].is_partial());
    }

    #[test]
    fn single_row_dimensions() {
        let packed = pack_units(3.0, &spec());
        assert_eq!(packed.width, 115.0 * 3.0 + 20.0);
        assert_eq!(packed.height, 100.0 + 40.0 + 10.0);
        assert_eq!(packed.cells[1].x, 10.0 + 115.0);
        assert_eq!(packed.cells[1].y, 40.0);
    }

    #[test]
    fn lone_trailing_unit_collapses_to_one_row() {
        // 5 units: estimate 4 columns leaves one unit on row two.
        assert_eq!(grid_columns(5), 5);
    }

    #[test]
    fn odd_row_count_is_corrected() {
        // 13 units: estimate 6 columns gives 3 rows, corrected to 7 columns / 2 rows.
        assert_eq!(grid_columns(13), 7);
        let packed = pack_units(13.0, &spec());
        assert_eq!(packed.rows, 2);
    }

    #[test]
    fn row_pairs_are_separated_by_row_padding() {
        // 50 units: 11 columns give 5 rows, corrected to 13 columns / 4 rows.
        let packed = pack_units(50.0, &spec());
        assert_eq!(packed.rows, 4);
        let row_y = |row: usize| {
            packed
                .cells
                .iter()
                .find(|c| c.row == row)
                .map(|c| c.y)
                .unwrap()
        };
        assert_eq!(row_y(1) - row_y(0), 115.0);
        assert_eq!(row_y(2) - row_y(1), 115.0 + 30.0);
    }

    proptest! {
        #[test]
        fn packs_exactly_ceil_count_cells(count in 0.0f32..400.0) {
            let packed = pack_units(count, &spec());
            let expected = count.ceil() as usize;
            prop_assert_eq!(packed.cells.len(), expected);

            let positions: HashSet<(usize, usize)> =
                packed.cells.iter().map(|c| (c.column, c.row)).collect();
            prop_assert_eq!(positions.len(), expected);

            for (idx, cell) in packed.cells.iter().enumerate() {
                prop_assert!(cell.occupancy > 0.0 && cell.occupancy <= 1.0);
                if idx + 1 < packed.cells.len() {
                    prop_assert_eq!(cell.occupancy, 1.0);
                }
            }
        }

        #[test]
        fn cells_fit_inside_the_box(count in 0.01f32..400.0) {
            let packed = pack_units(count, &spec());
            prop_assert!(packed.columns >= 1);
            for cell in &packed.cells {
                prop_assert!(cell.x >= 0.0 && cell.y >= 0.0);
                prop_assert!(cell.x + cell.width <= packed.width);
                prop_assert!(cell.y + cell.height <= packed.height);
            }
        }

        #[test]
        fn corrected_rows_are_even(cell_count in 1usize..2000) {
            let columns = grid_columns(cell_count);
            let rows = cell_count.div_ceil(columns);
            let collapsed = columns == cell_count;
            prop_assert!(rows == 1 || rows % 2 == 0 || collapsed);
        }
    }
}
