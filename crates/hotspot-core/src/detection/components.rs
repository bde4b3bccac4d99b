use ndarray::Array2;

/// Label image produced by connected component analysis.
#[derive(Clone, Debug)]
pub struct Labeling {
    /// 0 = background; components are numbered 1..=count.
    pub labels: Array2<u32>,
    pub count: u32,
}

/// Label connected foreground components of a binary mask using two-pass
/// labeling with union-find and 8-connectivity.
///
/// Final labels are consecutive and ordered by each component's first pixel
/// in raster order, so the labeling is deterministic.
pub fn label_components(mask: &Array2<bool>) -> Labeling {
    let (h, w) = mask.dim();
    let mut labels = Array2::<u32>::zeros((h, w));
    if h == 0 || w == 0 {
        return Labeling { labels, count: 0 };
    }

    let mut next_label: u32 = 1;
    // Union-find parent array. Index 0 unused; labels start at 1.
    let mut parent: Vec<u32> = vec![0; h * w / 2 + 2];

    // Pass 1: assign provisional labels from the already-visited neighbours
    // (left, upper-left, up, upper-right).
    for row in 0..h {
        for col in 0..w {
            if !mask[[row, col]] {
                continue;
            }

            let mut neighbours = [0u32; 4];
            if col > 0 {
                neighbours[0] = labels[[row, col - 1]];
            }
            if row > 0 {
                if col > 0 {
                    neighbours[1] = labels[[row - 1, col - 1]];
                }
                neighbours[2] = labels[[row - 1, col]];
                if col + 1 < w {
                    neighbours[3] = labels[[row - 1, col + 1]];
                }
            }

            let smallest = neighbours.iter().copied().filter(|&l| l > 0).min();
            match smallest {
                None => {
                    if next_label as usize >= parent.len() {
                        parent.resize(parent.len() * 2, 0);
                    }
                    parent[next_label as usize] = next_label;
                    labels[[row, col]] = next_label;
                    next_label += 1;
                }
                Some(smallest) => {
                    labels[[row, col]] = smallest;
                    for &other in neighbours.iter().filter(|&&l| l > 0 && l != smallest) {
                        union(&mut parent, smallest, other);
                    }
                }
            }
        }
    }

    // Pass 2: resolve roots and renumber in raster order of first appearance.
    let mut remap = vec![0u32; next_label as usize];
    let mut count = 0u32;
    for lbl in labels.iter_mut() {
        if *lbl == 0 {
            continue;
        }
        let root = find(&parent, *lbl) as usize;
        if remap[root] == 0 {
            count += 1;
            remap[root] = count;
        }
        *lbl = remap[root];
    }

    Labeling { labels, count }
}

fn find(parent: &[u32], mut x: u32) -> u32 {
    while parent[x as usize] != x {
        x = parent[x as usize];
    }
    x
}

fn union(parent: &mut [u32], a: u32, b: u32) {
    let ra = find(parent, a);
    let rb = find(parent, b);
    if ra != rb {
        // Merge larger root into smaller root to keep labels consistent.
        let (small, big) = if ra < rb { (ra, rb) } else { (rb, ra) };
        parent[big as usize] = small;
    }
}
