// Copyright (c) 2025 Felix Kahle.
//
// Permission is hereby granted, free of charge, to any person obtaining
// a copy of this software and associated documentation files (the
// "Software"), to deal in the Software without restriction, including
// without limitation the rights to use, copy, modify, merge, publish,
// distribute, sublicense, and/or sell copies of the Software, and to
// permit persons to whom the Software is furnished to do so, subject to
// the following conditions:
//
// The above copyright notice and this permission notice shall be
// included in all copies or substantial portions of the Software.
//
// THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND,
// EXPRESS OR IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF
// MERCHANTABILITY, FITNESS FOR A PARTICULAR PURPOSE AND
// NONINFRINGEMENT. IN NO EVENT SHALL THE AUTHORS OR COPYRIGHT HOLDERS BE
// LIABLE FOR ANY CLAIM, DAMAGES OR OTHER LIABILITY, WHETHER IN AN ACTION
// OF CONTRACT, TORT OR OTHERWISE, ARISING FROM, OUT OF OR IN CONNECTION
// WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN THE SOFTWARE.

//! Bounded-branching tree sizing.
//!
//! A hop-bounded, degree-bounded tree can contain at most a fixed number of
//! nodes: the root, plus one population per depth level, each level the
//! product of the branch factors applied so far. Both the model's implicit
//! sizing and the verifier's component-size check rely on this bound.

/// Returns the maximum node count of a rooted tree with `max_depth` levels
/// below the root and the given branching factor.
///
/// With `decreasing` set, the effective branch factor drops by one at each
/// successive depth level; expansion stops early once it reaches zero.
///
/// # Examples
///
/// ```rust
/// use canopy_core::math::tree::max_tree_size;
///
/// // 1 + 3 + 9 = 13
/// assert_eq!(max_tree_size(2, 3, false), 13);
/// // 1 + 2 + 4 + 8 = 15
/// assert_eq!(max_tree_size(3, 2, false), 15);
/// // 1 + 3 + 3*2 + 3*2*1 = 16
/// assert_eq!(max_tree_size(3, 3, true), 16);
/// ```
pub fn max_tree_size(max_depth: usize, branch_factor: u64, decreasing: bool) -> u64 {
    let mut nodes: u64 = 1;
    let mut level_nodes: u64 = 1;
    let mut degree = branch_factor;

    for _ in 1..=max_depth {
        if degree == 0 {
            break;
        }
        level_nodes *= degree;
        if decreasing {
            degree -= 1;
        }
        nodes += level_nodes;
    }

    nodes
}

/// Sign-convention wrapper over [`max_tree_size`].
///
/// A negative `branch_factor` means "decreasing mode, starting from the
/// absolute value" — the same encoding the degree-bound parameter uses
/// throughout the model.
///
/// # Examples
///
/// ```rust
/// use canopy_core::math::tree::max_tree_size_signed;
///
/// assert_eq!(max_tree_size_signed(3, -3), 16);
/// assert_eq!(max_tree_size_signed(2, 3), 13);
/// ```
#[inline]
pub fn max_tree_size_signed(max_depth: usize, branch_factor: i64) -> u64 {
    max_tree_size(
        max_depth,
        branch_factor.unsigned_abs(),
        branch_factor < 0,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constant_branching() {
        assert_eq!(max_tree_size(2, 3, false), 13);
        assert_eq!(max_tree_size(3, 2, false), 15);
        assert_eq!(max_tree_size(4, 1, false), 5); // a chain
    }

    #[test]
    fn test_decreasing_branching() {
        // 1 + 3 + 6 + 6 = 16; the factor hits zero at depth 4.
        assert_eq!(max_tree_size(3, 3, true), 16);
        assert_eq!(max_tree_size(10, 3, true), 16);
        // 1 + 2 + 2 = 5
        assert_eq!(max_tree_size(3, 2, true), 5);
    }

    #[test]
    fn test_sign_convention() {
        assert_eq!(max_tree_size_signed(3, -3), 16);
        assert_eq!(max_tree_size_signed(3, 2), 15);
        assert_eq!(max_tree_size_signed(3, -1), 2);
    }

    #[test]
    fn test_degenerate_inputs() {
        // Depth zero: just the root.
        assert_eq!(max_tree_size(0, 5, false), 1);
        // Branch factor zero: nothing can be attached.
        assert_eq!(max_tree_size(4, 0, false), 1);
    }
}
