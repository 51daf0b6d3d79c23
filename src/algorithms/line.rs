use crate::geometry::cell::CellXY;

/// Cells crossed by the straight segment between two cells, sampled once per
/// step of the dominant axis. Both endpoints are included.
pub fn line_cells(from: CellXY, to: CellXY) -> Vec<CellXY> {
    let dr = to.row as i64 - from.row as i64;
    let dc = to.col as i64 - from.col as i64;
    let steps = dr.unsigned_abs().max(dc.unsigned_abs());
    if steps == 0 {
        return vec![from];
    }
    (0..=steps)
        .map(|i| {
            let t = i as f64 / steps as f64;
            CellXY::new(
                (from.row as f64 + dr as f64 * t).round() as usize,
                (from.col as f64 + dc as f64 * t).round() as usize,
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use crate::algorithms::line::line_cells;
    use crate::geometry::cell::CellXY;

    #[test]
    fn test_single_cell() {
        assert_eq!(line_cells(CellXY::new(2, 2), CellXY::new(2, 2)), vec![CellXY::new(2, 2)]);
    }

    #[test]
    fn test_axis_aligned() {
        assert_eq!(
            line_cells(CellXY::new(1, 1), CellXY::new(1, 4)),
            vec![
                CellXY::new(1, 1),
                CellXY::new(1, 2),
                CellXY::new(1, 3),
                CellXY::new(1, 4),
            ]
        );
    }

    #[test]
    fn test_diagonal() {
        assert_eq!(
            line_cells(CellXY::new(0, 0), CellXY::new(3, 3)),
            vec![
                CellXY::new(0, 0),
                CellXY::new(1, 1),
                CellXY::new(2, 2),
                CellXY::new(3, 3),
            ]
        );
    }

    #[test]
    fn test_shallow_slope_samples_dominant_axis() {
        let cells = line_cells(CellXY::new(0, 0), CellXY::new(1, 4));
        assert_eq!(cells.len(), 5);
        assert_eq!(cells[0], CellXY::new(0, 0));
        assert_eq!(cells[4], CellXY::new(1, 4));
        assert!(cells.windows(2).all(|w| w[1].col == w[0].col + 1));
    }
}
