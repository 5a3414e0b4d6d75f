//! Growing binary-tree rectangle packer.
//!
//! The tree starts as a single free node sized to the first rectangle. Each
//! placement splits a free node into a used region plus a right and a down
//! remainder. When nothing fits, the root grows right or down (whichever keeps
//! the sheet closer to square) by wrapping the old root in a larger one.
//!
//! Nodes live in an arena and refer to each other by index. Feed rectangles
//! largest-first (see [`sort_for_packing`]); with that order every non-empty
//! rectangle is guaranteed a place.

/// A placed rectangle in sheet pixel space.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct PackedRect {
    pub x: u32,
    pub y: u32,
    pub w: u32,
    pub h: u32,
}

impl PackedRect {
    /// Returns true if the two rectangles share any pixel.
    pub fn overlaps(&self, other: &PackedRect) -> bool {
        self.x < other.x + other.w
            && other.x < self.x + self.w
            && self.y < other.y + other.h
            && other.y < self.y + self.h
    }

    pub fn area(&self) -> u64 {
        self.w as u64 * self.h as u64
    }
}

#[derive(Clone, Copy, Debug)]
struct Node {
    x: u32,
    y: u32,
    w: u32,
    h: u32,
    used: bool,
    right: Option<usize>,
    down: Option<usize>,
}

impl Node {
    fn free(x: u32, y: u32, w: u32, h: u32) -> Self {
        Self {
            x,
            y,
            w,
            h,
            used: false,
            right: None,
            down: None,
        }
    }
}

/// Incremental packer whose sheet grows as rectangles are added.
#[derive(Clone, Debug, Default)]
pub struct GrowingPacker {
    nodes: Vec<Node>,
    root: Option<usize>,
}

impl GrowingPacker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current sheet width.
    pub fn width(&self) -> u32 {
        self.root.map_or(0, |r| self.nodes[r].w)
    }

    /// Current sheet height.
    pub fn height(&self) -> u32 {
        self.root.map_or(0, |r| self.nodes[r].h)
    }

    /// Number of arena nodes, for diagnostics.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Places a `w × h` rectangle, growing the sheet if needed.
    ///
    /// Returns `None` for empty rectangles, or when neither growth direction
    /// can hold the rectangle (only possible when input is not sorted
    /// largest-first).
    pub fn fit(&mut self, w: u32, h: u32) -> Option<PackedRect> {
        if w == 0 || h == 0 {
            return None;
        }
        let root = match self.root {
            Some(root) => root,
            None => {
                let root = self.push(Node::free(0, 0, w, h));
                self.root = Some(root);
                root
            }
        };
        match self.find_node(root, w, h) {
            Some(node) => Some(self.split_node(node, w, h)),
            None => self.grow_node(w, h),
        }
    }

    fn push(&mut self, node: Node) -> usize {
        self.nodes.push(node);
        self.nodes.len() - 1
    }

    /// Depth-first search of the free leaves under `start`, returning the one
    /// that fits with the least leftover area. Ties go to the first found.
    fn find_node(&self, start: usize, w: u32, h: u32) -> Option<usize> {
        let needed = w as u64 * h as u64;
        let mut best: Option<(usize, u64)> = None;
        let mut stack = vec![start];
        while let Some(i) = stack.pop() {
            let node = &self.nodes[i];
            if node.used {
                // Pushed in reverse so `right` is visited before `down`.
                stack.extend(node.down);
                stack.extend(node.right);
            } else if w <= node.w && h <= node.h {
                let slack = node.w as u64 * node.h as u64 - needed;
                if best.is_none_or(|(_, s)| slack < s) {
                    best = Some((i, slack));
                }
            }
        }
        best.map(|(i, _)| i)
    }

    fn split_node(&mut self, i: usize, w: u32, h: u32) -> PackedRect {
        let Node {
            x,
            y,
            w: nw,
            h: nh,
            ..
        } = self.nodes[i];
        let down = self.push(Node::free(x, y + h, nw, nh - h));
        let right = self.push(Node::free(x + w, y, nw - w, h));
        let node = &mut self.nodes[i];
        node.used = true;
        node.down = Some(down);
        node.right = Some(right);
        PackedRect { x, y, w, h }
    }

    fn grow_node(&mut self, w: u32, h: u32) -> Option<PackedRect> {
        let root = self.root?;
        let (rw, rh) = (self.nodes[root].w, self.nodes[root].h);

        let can_grow_down = w <= rw;
        let can_grow_right = h <= rh;

        // Keep the sheet roughly square.
        let should_grow_right = can_grow_right && rh >= rw + w;
        let should_grow_down = can_grow_down && rw >= rh + h;

        if should_grow_right {
            self.grow_right(w, h)
        } else if should_grow_down {
            self.grow_down(w, h)
        } else if can_grow_right {
            self.grow_right(w, h)
        } else if can_grow_down {
            self.grow_down(w, h)
        } else {
            None
        }
    }

    fn grow_right(&mut self, w: u32, h: u32) -> Option<PackedRect> {
        let old = self.root?;
        let (rw, rh) = (self.nodes[old].w, self.nodes[old].h);
        let right = self.push(Node::free(rw, 0, w, rh));
        let root = self.push(Node {
            x: 0,
            y: 0,
            w: rw + w,
            h: rh,
            used: true,
            right: Some(right),
            down: Some(old),
        });
        self.root = Some(root);
        let node = self.find_node(root, w, h)?;
        Some(self.split_node(node, w, h))
    }

    fn grow_down(&mut self, w: u32, h: u32) -> Option<PackedRect> {
        let old = self.root?;
        let (rw, rh) = (self.nodes[old].w, self.nodes[old].h);
        let down = self.push(Node::free(0, rh, rw, h));
        let root = self.push(Node {
            x: 0,
            y: 0,
            w: rw,
            h: rh + h,
            used: true,
            right: Some(old),
            down: Some(down),
        });
        self.root = Some(root);
        let node = self.find_node(root, w, h)?;
        Some(self.split_node(node, w, h))
    }
}

/// Orders `(w, h)` sizes largest side first, then by area, keeping input
/// order for ties. Returns the permutation as indices into `sizes`.
pub fn sort_for_packing(sizes: &[(u32, u32)]) -> Vec<usize> {
    let mut order: Vec<usize> = (0..sizes.len()).collect();
    order.sort_by(|&a, &b| {
        let (aw, ah) = sizes[a];
        let (bw, bh) = sizes[b];
        bw.max(bh)
            .cmp(&aw.max(ah))
            .then((bw as u64 * bh as u64).cmp(&(aw as u64 * ah as u64)))
    });
    order
}

/// Packs every size, largest first. Entry `i` of the result is the placement
/// of `sizes[i]` (`None` if it could not be placed). Also returns the sheet size.
pub fn pack(sizes: &[(u32, u32)]) -> (Vec<Option<PackedRect>>, u32, u32) {
    let mut packer = GrowingPacker::new();
    let mut placed = vec![None; sizes.len()];
    for i in sort_for_packing(sizes) {
        let (w, h) = sizes[i];
        placed[i] = packer.fit(w, h);
    }
    (placed, packer.width(), packer.height())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_valid_packing(rects: &[PackedRect], width: u32, height: u32) {
        for (i, a) in rects.iter().enumerate() {
            assert!(a.x + a.w <= width, "rect {i} exceeds width: {a:?} in {width}");
            assert!(a.y + a.h <= height, "rect {i} exceeds height: {a:?} in {height}");
            for b in &rects[i + 1..] {
                assert!(!a.overlaps(b), "overlap: {a:?} and {b:?}");
            }
        }
    }

    #[test]
    fn test_first_rect_sizes_root() {
        let mut packer = GrowingPacker::new();
        let r = packer.fit(16, 8).unwrap();
        assert_eq!(r, PackedRect { x: 0, y: 0, w: 16, h: 8 });
        assert_eq!((packer.width(), packer.height()), (16, 8));
    }

    #[test]
    fn test_grows_toward_square() {
        let mut packer = GrowingPacker::new();
        packer.fit(16, 16).unwrap();
        // Square root: neither "should" rule holds, so it grows right first.
        let second = packer.fit(16, 16).unwrap();
        assert_eq!(second, PackedRect { x: 16, y: 0, w: 16, h: 16 });
        assert_eq!((packer.width(), packer.height()), (32, 16));
        // Now wide: should grow down.
        let third = packer.fit(16, 16).unwrap();
        assert_eq!(third, PackedRect { x: 0, y: 16, w: 16, h: 16 });
        assert_eq!((packer.width(), packer.height()), (32, 32));
        // The hole left by growing down is reused without growth.
        let fourth = packer.fit(16, 16).unwrap();
        assert_eq!(fourth, PackedRect { x: 16, y: 16, w: 16, h: 16 });
        assert_eq!((packer.width(), packer.height()), (32, 32));
    }

    #[test]
    fn test_prefers_smallest_slack() {
        let mut packer = GrowingPacker::new();
        packer.fit(16, 16).unwrap();
        let a = packer.fit(4, 4).unwrap();
        assert_eq!(a, PackedRect { x: 16, y: 0, w: 4, h: 4 });
        assert_eq!((packer.width(), packer.height()), (20, 16));

        let b = packer.fit(8, 2).unwrap();
        assert_eq!(b, PackedRect { x: 0, y: 16, w: 8, h: 2 });
        assert_eq!((packer.width(), packer.height()), (20, 18));

        // Both the 4x12 column under `a` and the 12x2 strip beside `b` fit;
        // the strip wastes less.
        let c = packer.fit(4, 2).unwrap();
        assert_eq!(c, PackedRect { x: 8, y: 16, w: 4, h: 2 });
        assert_eq!((packer.width(), packer.height()), (20, 18));
    }

    #[test]
    fn test_zero_size_rejected() {
        let mut packer = GrowingPacker::new();
        assert!(packer.fit(0, 4).is_none());
        assert!(packer.fit(4, 0).is_none());
        assert_eq!(packer.width(), 0);
    }

    #[test]
    fn test_unsorted_input_can_fail() {
        let mut packer = GrowingPacker::new();
        packer.fit(2, 2).unwrap();
        assert!(packer.fit(16, 16).is_none());
    }

    #[test]
    fn test_power_of_two_squares_pack_without_overlap() {
        let sizes = [(2, 2), (4, 4), (8, 8), (16, 16)];
        let (placed, width, height) = pack(&sizes);
        assert!(width >= 16 && height >= 16);
        let rects: Vec<PackedRect> = placed.iter().map(|r| r.unwrap()).collect();
        assert_valid_packing(&rects, width, height);
        for (rect, &(w, h)) in rects.iter().zip(&sizes) {
            assert_eq!((rect.w, rect.h), (w, h));
        }
    }

    #[test]
    fn test_mixed_sizes_pack_without_overlap() {
        let mut sizes = Vec::new();
        for i in 0..40u32 {
            sizes.push((1 + (i * 7) % 13, 1 + (i * 5) % 11));
        }
        sizes.push((32, 3));
        sizes.push((3, 32));
        let (placed, width, height) = pack(&sizes);
        let rects: Vec<PackedRect> = placed
            .iter()
            .map(|r| r.expect("sorted input always fits"))
            .collect();
        assert_valid_packing(&rects, width, height);

        let used: u64 = rects.iter().map(PackedRect::area).sum();
        assert!(used <= width as u64 * height as u64);
    }

    #[test]
    fn test_sort_for_packing_is_stable_on_ties() {
        let order = sort_for_packing(&[(4, 4), (16, 2), (4, 4), (2, 16)]);
        assert_eq!(order, vec![1, 3, 0, 2]);
    }
}
