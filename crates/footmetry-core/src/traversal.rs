//! Serpentine traversal order for mesh strips.
//!
//! Downstream mesh writers consume the grid as one continuous triangle/line
//! strip. The order alternates direction per angular column (boustrophedon)
//! and, for the curved grid, closes the φ loop. The final index depends on
//! the parity of the traversed column count: an even total ends at the
//! bottom-right cell, an odd total at the top-right cell. Changing that rule
//! produces a self-intersecting strip, so it is load-bearing, not cosmetic.

/// Generate the serpentine strip over a `u_count` × `phi_count` grid.
///
/// With `cyclic` set the strip also stitches the last φ column back to the
/// first one. Indices follow the grid's linear layout `u * phi_count + phi`.
pub fn strip_indices(u_count: usize, phi_count: usize, cyclic: bool) -> Vec<u32> {
    assert!(u_count > 0 && phi_count > 0, "grid dimensions must be positive");

    let index = |i: usize, j: usize| (i * phi_count + j) as u32;

    let up_down = |j: usize, out: &mut Vec<u32>| {
        let jn = if cyclic { (j + 1) % phi_count } else { j + 1 };
        for i in 0..u_count - 1 {
            out.push(index(i, j));
            out.push(index(i, jn));
        }
        out.push(index(u_count - 1, j));
    };

    let down_up = |j: usize, out: &mut Vec<u32>| {
        let jn = if cyclic { (j + 1) % phi_count } else { j + 1 };
        for i in (1..u_count).rev() {
            out.push(index(i, j));
            out.push(index(i, jn));
        }
        out.push(index(0, j));
    };

    let closing = usize::from(cyclic);
    let mut indices = Vec::new();
    for j in 0..phi_count - 1 + closing {
        if j % 2 == 0 {
            up_down(j, &mut indices);
        } else {
            down_up(j, &mut indices);
        }
    }

    // Parity rule for the strip terminator.
    let end = if (phi_count + closing) % 2 == 0 {
        index(u_count - 1, phi_count - 1)
    } else {
        index(0, phi_count - 1)
    };
    indices.push(end);

    indices
}
